// crates/swing_io/tests/loaders.rs
use std::fs;

use swing_core::Party;
use swing_io::prelude::*;

const DATASET: &str = r#"{"constituencies":[
  {"name":"Alpha","region":"North",
   "prev2":{"votes":{"Conservative":20000,"Labour":15000},"total_votes":35000},
   "prev1":{"votes":{"Conservative":18000,"Labour":17000},"total_votes":35000}}
]}"#;

#[test]
fn load_dataset_reports_digest_of_raw_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    fs::write(&path, DATASET).unwrap();

    let loaded = load_dataset(&path).unwrap();
    assert_eq!(loaded.dataset.len(), 1);
    assert_eq!(loaded.sha256, sha256_hex(DATASET.as_bytes()));
    assert_eq!(loaded.sha256, sha256_file(&path).unwrap());
    assert_eq!(loaded.sha256.len(), 64);
}

#[test]
fn missing_file_is_a_path_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_dataset(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, IoError::Path(_)));
}

#[test]
fn params_and_polls_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let params = dir.path().join("params.json");
    fs::write(&params, r#"{"iterations": 25, "seed": 9}"#).unwrap();
    let p = load_params(&params).unwrap();
    assert_eq!((p.iterations, p.seed), (25, 9));

    let polls = dir.path().join("polls.json");
    fs::write(
        &polls,
        r#"{"polls":[{"date":"2015-05-01","pollster":"ICM","shares":{"Labour":35,"Conservative":34}}]}"#,
    )
    .unwrap();
    let recs = load_polls(&polls).unwrap();
    assert_eq!(recs[0].shares[Party::Labour], 35.0);
}

#[test]
fn written_report_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("r.json");
    write_canonical_file(&out, &serde_json::json!({"b": [2, 1], "a": null})).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), r#"{"a":null,"b":[2,1]}"#);
}
