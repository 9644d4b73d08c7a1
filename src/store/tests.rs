use super::*;
use crate::media::{ItemRecord, ReadyState};

fn record(id: &str, item_type: &str, title: &str, path: Option<&str>, tags: &[&str]) -> ItemRecord {
    ItemRecord {
        id: id.to_string(),
        item_type: item_type.to_string(),
        title: title.to_string(),
        path: path.map(str::to_string),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        keywords: format!("{} {}", title, path.unwrap_or_default()).to_lowercase(),
        duration: 1.0,
        ready: ReadyState::Yes,
        ..ItemRecord::default()
    }
}

fn seeded() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    for r in [
        record("c", "file", "Take Five", Some("Jazz/take five.mp3"), &["jazz", "live"]),
        record("a", "file", "So What", Some("Jazz/so what.mp3"), &["jazz"]),
        record("b", "file", "Paranoid", Some("Rock/paranoid.mp3"), &["rock", "live"]),
        record("d", "radio", "Jazz FM", None, &["jazz", "live"]),
    ] {
        store.save(&r).unwrap();
    }
    store
}

fn ids(records: &[ItemRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn empty_condition_returns_everything_in_insertion_order() {
    let store = seeded();
    assert_eq!(ids(&store.query(&Condition::new()).unwrap()), vec!["c", "a", "b", "d"]);
}

#[test]
fn equality_and_prefix_like() {
    let store = seeded();
    let files = store
        .query(&Condition::new().and_equal(Field::Type, "file"))
        .unwrap();
    assert_eq!(ids(&files), vec!["c", "a", "b"]);

    let jazz = store
        .query(
            &Condition::new()
                .and_equal(Field::Type, "file")
                .and_like(Field::Path, "Jazz/%", true),
        )
        .unwrap();
    assert_eq!(ids(&jazz), vec!["c", "a"]);
}

#[test]
fn like_honours_case_sensitivity() {
    let store = seeded();
    let sensitive = store
        .query(&Condition::new().and_like(Field::Path, "%jazz%", true))
        .unwrap();
    assert!(sensitive.is_empty());

    let insensitive = store
        .query(&Condition::new().and_like(Field::Path, "%jazz%", false))
        .unwrap();
    assert_eq!(ids(&insensitive), vec!["c", "a"]);
}

#[test]
fn explicit_order_by_is_deterministic() {
    let store = seeded();
    let by_path = store
        .query(
            &Condition::new()
                .and_equal(Field::Type, "file")
                .order_by(Field::Path),
        )
        .unwrap();
    assert_eq!(ids(&by_path), vec!["a", "c", "b"]);

    let by_title_desc = store
        .query(&Condition::new().order_by_desc(Field::Title).limit(2))
        .unwrap();
    assert_eq!(ids(&by_title_desc), vec!["c", "a"]);
}

#[test]
fn tag_query_requires_every_tag_and_keeps_store_order() {
    let store = seeded();
    let hits = store.query_by_tags(&strings(&["jazz", "live"])).unwrap();
    assert_eq!(ids(&hits), vec!["c", "d"]);

    assert!(store.query_by_tags(&strings(&["Jazz"])).unwrap().is_empty());
    assert!(store.query_by_tags(&[]).unwrap().is_empty());

    let combined = store
        .query(
            &Condition::new()
                .and_equal(Field::Type, "file")
                .and_tags(["live"]),
        )
        .unwrap();
    assert_eq!(ids(&combined), vec!["c", "b"]);
}

#[test]
fn keyword_query_ands_words_case_insensitively() {
    let store = seeded();
    let hits = store.query_by_keywords(&strings(&["JAZZ"])).unwrap();
    // Ordered by title.
    assert_eq!(ids(&hits), vec!["d", "a", "c"]);

    let hits = store.query_by_keywords(&strings(&["jazz", "five"])).unwrap();
    assert_eq!(ids(&hits), vec!["c"]);

    assert!(store.query_by_keywords(&strings(&["  ", ""])).unwrap().is_empty());
}

#[test]
fn save_replaces_in_place_and_round_trips_fields() {
    let store = seeded();
    let mut updated = store.fetch("a").unwrap().unwrap();
    updated.tags.push("modal".into());
    updated.version = 3;
    updated.artist = Some("Miles Davis".into());
    updated.ready = ReadyState::Failed;
    store.save(&updated).unwrap();

    assert_eq!(store.fetch("a").unwrap().unwrap(), updated);
    assert_eq!(ids(&store.query(&Condition::new()).unwrap()), vec!["c", "a", "b", "d"]);
}

#[test]
fn delete_and_fetch_missing() {
    let store = seeded();
    store.delete("b").unwrap();
    assert!(store.fetch("b").unwrap().is_none());
    store.delete("b").unwrap();
    assert_eq!(store.query(&Condition::new()).unwrap().len(), 3);
}

#[test]
fn queue_round_trips_and_drops_out_of_range_cursor() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.load_queue().unwrap(), (Vec::new(), None));

    let queue = strings(&["a", "b", "a"]);
    store.save_queue(&queue, Some(2)).unwrap();
    assert_eq!(store.load_queue().unwrap(), (queue.clone(), Some(2)));

    store.save_queue(&queue[..1], None).unwrap();
    assert_eq!(store.load_queue().unwrap(), (strings(&["a"]), None));

    store.save_queue(&[], Some(0)).unwrap();
    assert_eq!(store.load_queue().unwrap(), (Vec::new(), None));
}

#[test]
fn on_disk_catalog_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("music.db");
    {
        let store = SqliteStore::open(&path).unwrap();
        store
            .save(&record("x", "file", "X", Some("x.mp3"), &["t"]))
            .unwrap();
        store.save_queue(&strings(&["x"]), Some(0)).unwrap();
    }
    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.fetch("x").unwrap().unwrap().tags, strings(&["t"]));
    assert_eq!(store.load_queue().unwrap(), (strings(&["x"]), Some(0)));
}

#[test]
fn escaped_patterns_match_wildcard_characters_literally() {
    let store = SqliteStore::open_in_memory().unwrap();
    for r in [
        record("u", "file", "Under", Some("a_b/x.mp3"), &[]),
        record("x", "file", "Cross", Some("axb/y.mp3"), &[]),
        record("p", "file", "100% Pure", Some("pure.mp3"), &[]),
    ] {
        store.save(&r).unwrap();
    }

    let folder = format!("{}/%", escape_like("a_b"));
    for case_sensitive in [true, false] {
        let hits = store
            .query(&Condition::new().and_like(Field::Path, folder.as_str(), case_sensitive))
            .unwrap();
        assert_eq!(ids(&hits), vec!["u"]);
    }
    let loose = store
        .query(&Condition::new().and_like(Field::Path, "a_b/%", true))
        .unwrap();
    assert_eq!(ids(&loose), vec!["u", "x"]);

    assert_eq!(ids(&store.query_by_keywords(&strings(&["100%"])).unwrap()), vec!["p"]);
    assert!(store.query_by_keywords(&strings(&["1_0"])).unwrap().is_empty());
}
