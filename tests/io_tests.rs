//! Loading sources from disk and writing results back out.


use std::fs;

use lazypipe::lazypipe_io::{self, Input, JsonlWriter, Registry};
use lazypipe::prelude::*;
use serde_json::{json, Value};
use test_data_gen::{cleanup, people, temp_dir, write_jsonl, write_people_csv};

#[test]
fn test_jsonl_file_through_pipeline() {
    let dir = temp_dir("jsonl-pipeline");
    let path = dir.join("people.jsonl");
    write_jsonl(&path, &people(20));

    let config = PipeConfig::default();
    let seq = lazypipe_io::open(path.as_path(), &config).expect("Failed to open source");
    let mut pipe = Pipeline::with_context(seq, Context::new(config))
        .keep_where("city", json!("NY"), "=")
        .expect("keep_where failed")
        .keep_where("age", json!(30), ">=")
        .expect("keep_where failed")
        .pluck("id");

    let ids: Vec<i64> = pipe.collect_as().expect("collect failed");
    assert_eq!(ids, vec![10, 12, 14, 16, 18]);
    cleanup(&dir);
}

#[test]
fn test_csv_file_is_cast_and_keyed() {
    let dir = temp_dir("csv-cast");
    let path = dir.join("people.csv");
    write_people_csv(&path, 4);

    let config = PipeConfig::default();
    let seq = Registry::with_defaults(&config)
        .load(Input::path(&path))
        .expect("Failed to load CSV");
    let mut pipe = Pipeline::new(seq)
        .cast(Decoder::new().integer("id").integer("age"))
        .key("name");

    let item = pipe.get("Person3").expect("missing Person3").into_value();
    assert_eq!(item["age"], json!(23));
    assert_eq!(item["id"], json!(3));
    assert_eq!(item["city"], json!("LA"));
    cleanup(&dir);
}

#[test]
fn test_detection_by_extension_and_content() {
    let dir = temp_dir("detect");
    let csv = dir.join("rows.csv");
    let sniffed = dir.join("rows.data");
    let plain = dir.join("notes.txt");
    write_people_csv(&csv, 1);
    write_jsonl(&sniffed, &[json!({"a": 1})]);
    fs::write(&plain, "just some words\n").expect("Failed to write notes");

    let registry = Registry::default();
    assert_eq!(registry.detect(&Input::path(&csv)), Some("csv"));
    assert_eq!(registry.detect(&Input::path(&sniffed)), Some("jsonl"));
    assert_eq!(registry.detect(&Input::path(&plain)), None);
    assert!(registry.load(Input::path(&plain)).is_err());
    cleanup(&dir);
}

#[test]
fn test_generic_fallback_for_decoded_json() {
    let registry = Registry::default();
    let mut pipe = Pipeline::new(
        registry
            .load(Input::from(json!({"a": 1, "b": 2})))
            .expect("Failed to wrap JSON"),
    );
    assert_eq!(pipe.get("b").expect("missing b").into_value(), json!(2));
}

#[test]
fn test_bad_line_fails_at_its_pull() {
    let seq = Registry::default()
        .load(Input::Text("{\"n\": 1}\n\n{\"n\": 2}\nnot json\n".into()))
        .expect("Failed to load text");
    let results: Vec<_> = Pipeline::new(seq).into_iter().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(matches!(results[2], Err(Error::Source(_))));
}

#[test]
fn test_limit_stops_reading_early() {
    let seq = Registry::default()
        .load(Input::Text("{\"n\": 1}\n{\"n\": 2}\nnot json\n".into()))
        .expect("Failed to load text");
    let mut pipe = Pipeline::new(seq).limit(2);
    assert_eq!(pipe.count().expect("bad line should not be reached"), 2);
}

#[test]
fn test_write_pipeline_as_jsonl() {
    let dir = temp_dir("write");
    let out = dir.join("out.jsonl");

    let pipe = Pipeline::from_json(json!([{"n": 1}, {"n": 2}, {"n": 3}]))
        .expect("from_json failed")
        .keep_where("n", json!(1), ">")
        .expect("keep_where failed");
    let written = JsonlWriter::to_path(&out)
        .expect("Failed to create output")
        .write_entries(pipe)
        .expect("Failed to write entries");
    assert_eq!(written, 2);

    let text = fs::read_to_string(&out).expect("Failed to read output");
    let lines: Vec<Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).expect("invalid output line"))
        .collect();
    assert_eq!(lines, vec![json!({"n": 2}), json!({"n": 3})]);
    cleanup(&dir);
}

#[test]
fn test_round_trip_through_files() {
    let dir = temp_dir("round-trip");
    let input = dir.join("in.ndjson");
    let output = dir.join("out.jsonl");
    write_jsonl(&input, &people(6));

    let config = PipeConfig::default();
    let pipe = Pipeline::new(lazypipe_io::open(input.as_path(), &config).expect("open input"))
        .map(|a| Ok(json!({"who": a.value()["name"]})));
    JsonlWriter::to_path(&output)
        .expect("create output")
        .write_entries(pipe)
        .expect("write output");

    let mut reread = Pipeline::new(lazypipe_io::open(output.as_path(), &config).expect("open output"));
    let names: Vec<String> = reread
        .iter()
        .map(|e| {
            let value = e.expect("pull failed").1.into_value();
            value["who"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(names.len(), 6);
    assert_eq!(names[5], "Person5");
    cleanup(&dir);
}

#[test]
fn test_to_json_retry_keeps_records_before_a_bad_line() {
    let seq = Registry::default()
        .load(Input::Text("{\"a\": 1}\n{oops\n{\"a\": 3}\n".into()))
        .expect("Failed to load text");
    let mut pipe = Pipeline::new(seq);

    assert!(matches!(pipe.to_json(), Err(Error::Source(_))));
    assert_eq!(
        pipe.to_json().expect("retry failed"),
        json!([{"a": 1}, {"a": 3}])
    );
}
