//! Joins, merges, zips and key intersections across pipelines.


use lazypipe::prelude::*;
use serde_json::{json, Value};

fn keyed(entries: Vec<(i64, Value)>) -> Pipeline {
    Pipeline::new(Sequence::from_entries(entries))
}

fn people() -> Pipeline {
    keyed(vec![(1, json!({"name": "x", "age": 5}))]).label("people")
}

fn people_by_age() -> Pipeline {
    keyed(vec![(5, json!({"city": "NY"}))]).label("byAge")
}

#[test]
fn test_inner_join_on_property() {
    let mut joined = people().join(vec![("age", people_by_age())], JoinType::Inner);
    assert_eq!(
        joined.to_json().expect("join failed"),
        json!({"1": {"people": {"name": "x", "age": 5}, "byAge": {"city": "NY"}}})
    );
}

#[test]
fn test_inner_join_drops_unmatched_primaries() {
    let primary = keyed(vec![
        (1, json!({"name": "x", "age": 5})),
        (2, json!({"name": "y", "age": 9})),
    ])
    .label("people");

    let mut inner = primary.join(vec![("age", people_by_age())], JoinType::Inner);
    assert_eq!(inner.count().expect("inner failed"), 1);
}

#[test]
fn test_left_join_keeps_unmatched_primaries() {
    let primary = keyed(vec![
        (1, json!({"name": "x", "age": 5})),
        (2, json!({"name": "y", "age": 9})),
    ])
    .label("people");

    let mut left = primary.join(vec![("age", people_by_age())], JoinType::Left);
    let out = left.to_json().expect("left failed");
    assert_eq!(out["1"]["byAge"], json!({"city": "NY"}));
    assert_eq!(out["2"], json!({"people": {"name": "y", "age": 9}}));
}

#[test]
fn test_identity_join_on_keys() {
    let a = keyed(vec![(1, json!("a1")), (2, json!("a2"))]).label("a");
    let b = keyed(vec![(2, json!("b2")), (3, json!("b3"))]).label("b");

    let mut full = a.join(vec![(JoinOn::Key, b)], JoinType::Full);
    assert_eq!(
        full.to_json().expect("full failed"),
        json!({
            "1": {"a": "a1"},
            "2": {"a": "a2", "b": "b2"},
            "3": {"b": "b3"},
        })
    );
}

#[test]
fn test_right_join_keeps_secondary_records() {
    let a = keyed(vec![(1, json!("a1")), (2, json!("a2"))]).label("a");
    let b = keyed(vec![(2, json!("b2")), (3, json!("b3"))]).label("b");

    let mut right = a.join(vec![(JoinOn::Key, b)], JoinType::Right);
    let keys: Vec<Key> = right
        .iter()
        .map(|e| e.expect("pull failed").0)
        .collect();
    assert_eq!(keys, vec![Key::Int(2), Key::Int(3)]);
}

#[test]
fn test_join_without_property_fails() {
    let primary = keyed(vec![(1, json!({"name": "x"}))]).label("people");
    let mut joined = primary.join(vec![("age", people_by_age())], JoinType::Inner);
    assert!(matches!(
        joined.to_json(),
        Err(Error::PropertyNotFound { .. })
    ));
}

#[test]
fn test_merge_writes_matches_into_records() {
    let users = Pipeline::from_json(json!([
        {"name": "ann", "city_id": 1},
        {"name": "bob", "city_id": 7},
    ]))
    .expect("users");
    let cities = Pipeline::from_json(json!([
        {"id": 1, "name": "NY"},
    ]))
    .expect("cities");

    let spec = MergeSpec::new().on("city_id", "id").into_path("city");
    let mut merged = users.merge(cities, spec);
    assert_eq!(
        merged.to_json().expect("merge failed"),
        json!([
            {"name": "ann", "city_id": 1, "city": {"id": 1, "name": "NY"}},
            {"name": "bob", "city_id": 7},
        ])
    );
}

#[test]
fn test_inner_merge_defaults_target_to_label() {
    let users = Pipeline::from_json(json!([
        {"name": "ann", "city_id": 1},
        {"name": "bob", "city_id": 7},
    ]))
    .expect("users");
    let cities = Pipeline::from_json(json!([{"id": 1, "name": "NY"}]))
        .expect("cities")
        .label("town");

    let spec = MergeSpec::new()
        .on("city_id", "id")
        .kind(JoinType::Inner);
    let mut merged = users.merge(cities, spec);
    let out = merged.to_array().expect("merge failed");
    assert_eq!(out.len(), 1);
    let record = out.values().next().expect("one record").as_value().into_owned();
    assert_eq!(record["town"]["name"], json!("NY"));
}

#[test]
fn test_zip_by_key() {
    let mut zipped = keyed(vec![(1, json!("a")), (2, json!("b"))])
        .zip(vec![Sequence::from_entries(vec![(1, json!("A")), (2, json!("B"))])]);
    assert_eq!(
        zipped.to_json().expect("zip failed"),
        json!({"1": ["a", "A"], "2": ["b", "B"]})
    );
}

#[test]
fn test_zip_missing_key_fails() {
    let mut zipped = keyed(vec![(1, json!("a")), (2, json!("b"))])
        .zip(vec![Sequence::from_entries(vec![(1, json!("A"))])]);
    let results: Vec<_> = zipped.iter().collect();
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::KeyNotFound(Key::Int(2)))));
}

#[test]
fn test_zip_rows_feed_later_stages() {
    let mut pipe = keyed(vec![(1, json!(2)), (2, json!(3))])
        .zip(vec![Sequence::from_entries(vec![(1, json!(10)), (2, json!(100))])])
        .map(|a| {
            let row = a.value();
            let x = row[0].as_i64().unwrap_or_default();
            let y = row[1].as_i64().unwrap_or_default();
            Ok(json!(x * y))
        });
    let products: Vec<i64> = pipe.collect_as().expect("collect failed");
    assert_eq!(products, vec![20, 300]);
}

#[test]
fn test_intersect_key() {
    let a = keyed(vec![(1, json!("x")), (2, json!("y"))]);
    let b = Sequence::from_entries(vec![(1, json!("p")), (3, json!("q"))]);

    let mut both = a.intersect_key(vec![b]);
    assert_eq!(both.to_json().expect("intersect failed"), json!({"1": "x"}));
}

#[test]
fn test_intersect_key_with_several_sources() {
    let a = keyed(vec![(1, json!("x")), (2, json!("y")), (3, json!("z"))]);
    let b = Sequence::from_entries(vec![(3, json!(0)), (1, json!(0))]);
    let c = Sequence::from_entries(vec![(3, json!(0)), (2, json!(0))]);

    let mut all = a.intersect_key(vec![b, c]);
    assert_eq!(all.to_json().expect("intersect failed"), json!({"3": "z"}));
}

#[test]
fn test_intersect_with_no_sources_is_identity() {
    let mut same = keyed(vec![(4, json!("x"))]).intersect_key(Vec::<Sequence>::new());
    assert_eq!(same.to_json().expect("intersect failed"), json!({"4": "x"}));
}
