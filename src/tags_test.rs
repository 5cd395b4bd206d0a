use super::*;
use tempfile::tempdir;

#[test]
fn increment_then_decrement_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tags.data");
    let mut idx = TagIndex::open(&path, std::iter::empty()).unwrap();

    assert_eq!(idx.increment_tag("a"), -1);
    assert_eq!(idx.increment_tag("a"), 0);
    assert_eq!(idx.count("a"), 2);

    idx.decrement_tag("a");
    assert_eq!(idx.count("a"), 1);
    idx.decrement_tag("a");
    idx.decrement_tag("a"); // clamps at zero, never negative
    assert_eq!(idx.count("a"), 0);
    assert!(idx.tags().contains(&"a".to_string()));
}

#[test]
fn flush_then_reload_preserves_counts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tags.data");

    {
        let mut idx = TagIndex::open(&path, std::iter::empty()).unwrap();
        idx.increment_tag("work");
        idx.increment_tag("work");
        idx.increment_tag("home");
        idx.flush().unwrap();
    }

    let idx2 = TagIndex::open(&path, std::iter::empty()).unwrap();
    assert_eq!(idx2.count("work"), 2);
    assert_eq!(idx2.count("home"), 1);
    assert!(!idx2.is_modified());
}

#[test]
fn missing_sidecar_rebuilds_from_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tags.data");

    let lines = vec![
        "inc 20180601T010000Z - 20180601T020000Z # a b".to_string(),
        "inc 20180602T010000Z - 20180602T020000Z # b c".to_string(),
    ];
    let idx = TagIndex::open(&path, lines.iter().map(|s| s.as_str())).unwrap();

    assert_eq!(idx.count("a"), 1);
    assert_eq!(idx.count("b"), 2);
    assert_eq!(idx.count("c"), 1);
    assert!(atomic::exists(&path));
}

#[test]
fn corrupt_sidecar_triggers_rebuild_not_fatal_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tags.data");
    std::fs::write(&path, b"not json at all").unwrap();

    let lines = vec!["inc 20180601T010000Z - 20180601T020000Z # a".to_string()];
    let idx = TagIndex::open(&path, lines.iter().map(|s| s.as_str())).unwrap();
    assert_eq!(idx.count("a"), 1);
}

#[test]
fn unknown_keys_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tags.data");
    std::fs::write(
        &path,
        br#"{"a": {"count": 3, "note": "kept"}}"#,
    )
    .unwrap();

    let mut idx = TagIndex::open(&path, std::iter::empty()).unwrap();
    assert_eq!(idx.count("a"), 3);
    idx.increment_tag("a");
    let json = idx.to_json().unwrap();
    assert!(json.contains("\"note\""));
}

#[test]
fn tag_key_with_quote_is_escaped_in_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tags.data");
    let mut idx = TagIndex::open(&path, std::iter::empty()).unwrap();
    idx.increment_tag("say \"hi\"");
    let json = idx.to_json().unwrap();
    assert!(json.contains("say \\\"hi\\\""));
}
