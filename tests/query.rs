use std::sync::Arc;
use linescope::query::executor::QueryEngine;
use linescope::reader::line_source::{IterFeed, LineFeed};
use linescope::storage::record_store::RecordStore;
use linescope::{Config, Explorer, MatchMode, QuerySpec, Record};
use serde_json::{Value, json};

fn loaded(lines: &[&str]) -> Explorer {
    let feed: Box<dyn LineFeed> = Box::new(IterFeed::from_lines(lines));

    let mut explorer = Explorer::new(Config::default());
    explorer.open_feed("fixture", feed).unwrap();
    explorer.wait().unwrap();
    explorer
}

fn indices(explorer: &Explorer, spec: &QuerySpec) -> Vec<usize> {
    explorer.query(spec).unwrap().collect()
}

#[test]
fn case_insensitive_substring_over_whole_record() {
    let explorer = loaded(&[r#"{"x":"CAT"}"#, r#"{"x":"dog"}"#]);
    assert_eq!(indices(&explorer, &QuerySpec::substring("cat")), vec![0]);
}

#[test]
fn repeated_queries_return_the_same_indices() {
    let explorer = loaded(&[
        r#"{"level":"info","msg":"started"}"#,
        r#"{"level":"error","msg":"disk full"}"#,
        r#"[1,2,3]"#,
        r#"{"level":"ERROR","msg":"again"}"#,
    ]);
    let spec = QuerySpec::substring("error").in_field("level");

    let first = indices(&explorer, &spec);
    let second = indices(&explorer, &spec);
    assert_eq!(first, vec![1, 3]);
    assert_eq!(first, second);
    assert_eq!(*explorer.query_all(&spec).unwrap(), first);
    assert_eq!(*explorer.query_all(&spec).unwrap(), first);
    assert_eq!(explorer.cache_stats().hit_count, 1);
}

#[test]
fn regex_modes_and_case_flag() {
    let explorer = loaded(&[
        r#"{"id":"ABC-001"}"#,
        r#"{"id":"abc-002"}"#,
        r#"{"id":"xyz"}"#,
    ]);

    let loose = QuerySpec::regex(r"^abc-\d{3}$").in_field("id");
    assert_eq!(indices(&explorer, &loose), vec![0, 1]);

    let strict = loose.clone().case_sensitive(true);
    assert_eq!(indices(&explorer, &strict), vec![1]);
}

#[test]
fn non_string_fields_match_their_json_text() {
    let explorer = loaded(&[
        r#"{"n":1024,"tags":["a","b"]}"#,
        r#"{"n":12,"tags":[]}"#,
        r#"{"n":null}"#,
    ]);

    assert_eq!(indices(&explorer, &QuerySpec::substring("102").in_field("n")), vec![0]);
    assert_eq!(indices(&explorer, &QuerySpec::substring("[\"a\"").in_field("tags")), vec![0]);
    assert_eq!(indices(&explorer, &QuerySpec::substring("null").in_field("n")), vec![2]);
}

#[test]
fn empty_pattern_selects_everything_or_presence() {
    let explorer = loaded(&[r#"{"a":1}"#, "7", r#"{"b":2}"#, r#"{"a":null}"#]);

    assert_eq!(indices(&explorer, &QuerySpec::substring("")), vec![0, 1, 2, 3]);
    assert_eq!(indices(&explorer, &QuerySpec::substring("").in_field("a")), vec![0, 3]);
}

#[test]
fn search_uses_config_default() {
    let explorer = loaded(&[r#"{"m":"Hello"}"#]);
    let found: Vec<usize> = explorer.search("hello", MatchMode::Substring).unwrap().collect();
    assert_eq!(found, vec![0]);
}

#[test]
fn lazy_results_can_be_taken_partially() {
    let lines: Vec<String> = (0..1000).map(|i| format!("{{\"i\":{}}}", i)).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let explorer = loaded(&refs);

    let sevens: Vec<usize> = explorer
        .query(&QuerySpec::regex(r"7$").in_field("i"))
        .unwrap()
        .take(3)
        .collect();
    assert_eq!(sevens, vec![7, 17, 27]);
}

#[test]
fn queries_during_load_see_a_growing_prefix() {
    let store = Arc::new(RecordStore::unbounded());
    let spec = QuerySpec::substring("hit");

    let writer = {
        let store = store.clone();
        std::thread::spawn(move || {
            for line in 1..=50_000u64 {
                let value: Value = if line % 10 == 0 { json!({"k": "hit"}) } else { json!({"k": "miss"}) };
                store.append(Record::new(line, value)).unwrap();
            }
        })
    };

    let mut previous: Vec<usize> = Vec::new();
    for _ in 0..50 {
        let current: Vec<usize> = QueryEngine::query(&store, &spec).unwrap().collect();
        assert!(current.starts_with(&previous));
        assert!(current.iter().all(|i| (i + 1) % 10 == 0));
        previous = current;
    }

    writer.join().unwrap();
    assert_eq!(QueryEngine::query(&store, &spec).unwrap().count(), 5_000);
}

#[test]
fn export_round_trips_selected_records() {
    let explorer = loaded(&[r#"{"a":"keep"}"#, r#"{"a":"drop"}"#, r#"{"a":"keep","b":[1]}"#]);
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("out.jsonl");

    let file = std::fs::File::create(&path).unwrap();
    let written = explorer
        .export_jsonl(&QuerySpec::substring("keep").in_field("a"), file)
        .unwrap();
    assert_eq!(written, 2);

    let text = std::fs::read_to_string(&path).unwrap();
    let values: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(values, vec![json!({"a":"keep"}), json!({"a":"keep","b":[1]})]);
}
