use super::*;
use chrono::TimeZone;
use tempfile::tempdir;

fn ts(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::Utc.datetime_from_str(s, crate::interval::TIMESTAMP_FORMAT).unwrap()
}

fn iv(start: &str, end: Option<&str>) -> Interval {
    Interval::new(ts(start), end.map(ts))
}

#[test]
fn name_and_range_from_new() {
    let dir = tempdir().unwrap();
    let df = Datafile::new(dir.path(), ts("20180615T000000Z"));
    assert_eq!(df.name(), "2018-06.data");
    assert_eq!(df.range().start, ts("20180601T000000Z"));
    assert_eq!(df.range().end, Some(ts("20180701T000000Z")));
}

#[test]
fn from_name_rejects_non_matching_file() {
    let dir = tempdir().unwrap();
    assert!(Datafile::from_name(dir.path(), "tags.data").is_none());
    assert!(Datafile::from_name(dir.path(), "2018-13.data").is_none());
    assert!(Datafile::from_name(dir.path(), "2018-06.data").is_some());
}

#[test]
fn insert_keeps_sorted_order() {
    let dir = tempdir().unwrap();
    let mut df = Datafile::new(dir.path(), ts("20180601T000000Z"));

    let a = iv("20180603T010000Z", Some("20180603T020000Z"));
    let b = iv("20180602T010000Z", Some("20180602T020000Z"));
    let c = iv("20180605T010000Z", Some("20180605T020000Z"));

    assert!(df.add_interval(&a).unwrap());
    assert!(df.add_interval(&b).unwrap());
    assert!(df.add_interval(&c).unwrap());

    let lines = df.all_lines().unwrap().to_vec();
    let parsed: Vec<_> = lines.iter().map(|l| Interval::from_line(l).unwrap().start).collect();
    let mut sorted = parsed.clone();
    sorted.sort();
    assert_eq!(parsed, sorted);
    assert_eq!(lines.len(), 3);
}

#[test]
fn duplicate_insert_is_a_no_op() {
    let dir = tempdir().unwrap();
    let mut df = Datafile::new(dir.path(), ts("20180601T000000Z"));
    let a = iv("20180603T010000Z", Some("20180603T020000Z"));

    assert!(df.add_interval(&a).unwrap());
    assert!(!df.add_interval(&a).unwrap());
    assert_eq!(df.all_lines().unwrap().len(), 1);
}

#[test]
fn delete_tolerates_absence() {
    let dir = tempdir().unwrap();
    let mut df = Datafile::new(dir.path(), ts("20180601T000000Z"));
    let a = iv("20180603T010000Z", Some("20180603T020000Z"));

    assert!(!df.delete_interval(&a).unwrap());
    df.add_interval(&a).unwrap();
    assert!(df.delete_interval(&a).unwrap());
    assert!(df.all_lines().unwrap().is_empty());
}

#[test]
fn commit_then_reload_round_trips() {
    let dir = tempdir().unwrap();
    let month = ts("20180601T000000Z");
    let a = iv("20180603T010000Z", Some("20180603T020000Z"));

    {
        let mut df = Datafile::new(dir.path(), month);
        df.add_interval(&a).unwrap();
        df.commit().unwrap();
        assert!(!df.is_dirty());
    }

    let df2 = Datafile::new(dir.path(), month);
    assert_eq!(df2.all_lines().unwrap().to_vec(), vec![a.to_line()]);
}

#[test]
fn open_interval_sorts_after_closed_same_start() {
    let dir = tempdir().unwrap();
    let mut df = Datafile::new(dir.path(), ts("20180601T000000Z"));
    let start = ts("20180603T010000Z");
    let closed = Interval::new(start, Some(ts("20180603T020000Z")));
    let open = Interval::new(start, None);

    df.add_interval(&open).unwrap();
    df.add_interval(&closed).unwrap();

    let lines = df.all_lines().unwrap().to_vec();
    assert_eq!(lines[0], closed.to_line());
    assert_eq!(lines[1], open.to_line());
}
