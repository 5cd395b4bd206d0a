use super::*;
use chrono::TimeZone;

#[test]
fn month_bounds_mid_month() {
    let t = Utc.ymd(2018, 6, 15).and_hms(12, 0, 0);
    assert_eq!(month_start(t), Utc.ymd(2018, 6, 1).and_hms(0, 0, 0));
    assert_eq!(next_month_start(t), Utc.ymd(2018, 7, 1).and_hms(0, 0, 0));
}

#[test]
fn month_bounds_wrap_december() {
    let t = Utc.ymd(2019, 12, 31).and_hms(23, 59, 59);
    assert_eq!(month_start(t), Utc.ymd(2019, 12, 1).and_hms(0, 0, 0));
    assert_eq!(next_month_start(t), Utc.ymd(2020, 1, 1).and_hms(0, 0, 0));
}

#[test]
fn stem_round_trip() {
    let t = Utc.ymd(2018, 6, 1).and_hms(0, 0, 0);
    assert_eq!(month_stem(t), "2018-06");
    assert_eq!(parse_month_stem("2018-06"), Some(t));
}

#[test]
fn stem_rejects_garbage() {
    assert_eq!(parse_month_stem("not-a-month"), None);
    assert_eq!(parse_month_stem("2018-13"), None);
    assert_eq!(parse_month_stem("2018-06-extra"), None);
}
