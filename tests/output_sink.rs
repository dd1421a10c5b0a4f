// tests/output_sink.rs
mod common;

use std::fs;

use serde_json::Value as Json;
use tariff_post_classifier::classify::ClassificationResult;
use tariff_post_classifier::output::{OutputSink, CSV_COLUMNS};
use tariff_post_classifier::{partition, EnrichedPost};

fn batch() -> Vec<EnrichedPost> {
    let ok = |i: usize, related: bool, rate: Option<&str>| EnrichedPost {
        post: common::raw_post(i),
        classification: serde_json::from_str(&common::analysis_json(related, rate, "t")).unwrap(),
    };
    vec![
        ok(0, true, Some("25%")),
        ok(1, false, None),
        EnrichedPost {
            post: common::raw_post(2),
            classification: ClassificationResult::error("internal server error"),
        },
        ok(3, true, None),
    ]
}

#[test]
fn writes_six_files_into_created_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("outputs");
    let sink = OutputSink::new(&dir);
    let posts = batch();

    let written = sink.write_tiers(&partition(&posts)).unwrap();

    assert_eq!(written.len(), 6);
    for name in [
        "posts.json",
        "posts.csv",
        "tariff_posts.json",
        "tariff_posts.csv",
        "official_tariff_posts.json",
        "official_tariff_posts.csv",
    ] {
        assert!(dir.join(name).is_file(), "missing {name}");
    }
    assert!(fs::read_dir(&dir)
        .unwrap()
        .flatten()
        .all(|e| !e.file_name().to_string_lossy().ends_with(".tmp")));
}

#[test]
fn json_documents_hold_full_records_per_tier() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = OutputSink::new(tmp.path());
    let posts = batch();
    sink.write_tiers(&partition(&posts)).unwrap();

    let all: Json = serde_json::from_str(&fs::read_to_string(tmp.path().join("posts.json")).unwrap()).unwrap();
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0]["content"], "post-0");
    assert_eq!(all[0]["classification"]["tariff_rate"], "25%");
    assert_eq!(all[2]["classification"], serde_json::json!({"error": "internal server error"}));

    let relevant: Vec<EnrichedPost> = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("tariff_posts.json")).unwrap(),
    )
    .unwrap();
    let contents: Vec<&str> = relevant.iter().map(|p| p.post.content.as_str()).collect();
    assert_eq!(contents, vec!["post-0", "post-3"]);

    let rated: Json = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("official_tariff_posts.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(rated.as_array().unwrap().len(), 1);
}

#[test]
fn csv_has_fixed_header_and_empty_error_columns() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = OutputSink::new(tmp.path());
    let posts = batch();
    sink.write_tiers(&partition(&posts)).unwrap();

    let mut rdr = csv::Reader::from_path(tmp.path().join("posts.csv")).unwrap();
    let header: Vec<String> = rdr.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(header, CSV_COLUMNS.to_vec());

    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(&rows[0][3], "true");
    assert_eq!(&rows[0][6], "steel, aluminum");
    assert_eq!(&rows[2][1], "post-2");
    assert!((3..11).all(|c| rows[2][c].is_empty()));
}

#[test]
fn empty_tiers_still_get_header_only_files() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = OutputSink::new(tmp.path());
    sink.write_tiers(&partition(&[])).unwrap();

    let json = fs::read_to_string(tmp.path().join("tariff_posts.json")).unwrap();
    assert_eq!(json.trim(), "[]");
    let csv = fs::read_to_string(tmp.path().join("tariff_posts.csv")).unwrap();
    assert_eq!(csv.lines().count(), 1);
}
