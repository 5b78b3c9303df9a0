use chrono::DateTime;
use csv::StringRecord;
use pretty_assertions::assert_eq;

use iot_batch_ingest::coerce::EpochUnit;
use iot_batch_ingest::identity::build_id;
use iot_batch_ingest::normalize::{RawRow, UNKNOWN_DEVICE, normalize_row};

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn normalize(cols: &[String], values: &[&str], keep_raw: bool) -> Option<iot_batch_ingest::document::Measurement> {
    let record = StringRecord::from(values.to_vec());
    let row = RawRow::new(cols, &record);
    normalize_row(&row, EpochUnit::Auto, keep_raw)
}

#[test]
fn full_row_becomes_canonical_document() {
    let cols = columns(&["device", "ts", "temp", "motion"]);
    let doc = normalize(&cols, &["dev-A", "1700000000", "22.5", "yes"], false).unwrap();

    // sha1("dev-A|1700000000")
    assert_eq!(doc.id, "a3f58d09066c3f29c6c8bc833aa8aaea40f9bfaa");
    assert_eq!(doc.device, "dev-A");
    assert_eq!(doc.timestamp, DateTime::from_timestamp(1_700_000_000, 0).unwrap());
    assert_eq!(doc.temp, Some(22.5));
    assert_eq!(doc.motion, Some(true));
    assert_eq!(doc.humidity, None);
    assert_eq!(doc.raw, None);
}

#[test]
fn missing_device_falls_back_to_sentinel() {
    let cols = columns(&["device", "ts"]);
    let doc = normalize(&cols, &["", "1700000000"], false).unwrap();

    assert_eq!(doc.device, UNKNOWN_DEVICE);
    // sha1("unknown|1700000000")
    assert_eq!(doc.id, "690bc874bb7df148da55add8eb2a999df73ced3f");
}

#[test]
fn row_without_timestamp_is_dropped() {
    let cols = columns(&["device", "ts"]);
    assert_eq!(normalize(&cols, &["dev-B", ""], false), None);
    assert_eq!(normalize(&cols, &["dev-B", "not-a-number"], false), None);
}

#[test]
fn build_id_is_deterministic_and_input_sensitive() {
    let id = build_id("sensor-1", Some(1_700_000_000)).unwrap();
    assert_eq!(id, "b46590ff17f6e99b3612a1970e608e701ea7fde6");
    assert_eq!(build_id("sensor-1", Some(1_700_000_000)).unwrap(), id);

    assert_ne!(build_id("sensor-2", Some(1_700_000_000)).unwrap(), id);
    assert_ne!(build_id("sensor-1", Some(1_700_000_001)).unwrap(), id);
}

#[test]
fn build_id_requires_device_and_timestamp() {
    assert_eq!(build_id("", Some(1_700_000_000)), None);
    assert_eq!(build_id("sensor-1", None), None);
}

#[test]
fn second_and_millisecond_spellings_share_an_id() {
    let cols = columns(&["device", "ts"]);
    let seconds = normalize(&cols, &["dev-A", "1700000000"], false).unwrap();
    let millis = normalize(&cols, &["dev-A", "1700000000000"], false).unwrap();

    assert_eq!(seconds.id, millis.id);
    assert_eq!(seconds.timestamp, millis.timestamp);
}

#[test]
fn uncoercible_field_is_absent_not_null() {
    let cols = columns(&["device", "ts", "temp", "motion"]);
    let doc = normalize(&cols, &["dev-A", "1700000000", "warm", "yes"], false).unwrap();
    assert_eq!(doc.temp, None);

    // The serialized document must not contain the key at all.
    let bson_doc = bson::to_document(&doc).unwrap();
    assert!(!bson_doc.contains_key("temp"));
    assert_eq!(bson_doc.get_bool("motion").unwrap(), true);
    assert!(matches!(
        bson_doc.get("timestamp"),
        Some(bson::Bson::DateTime(_))
    ));
}

#[test]
fn na_cells_are_treated_as_missing() {
    let cols = columns(&["device", "ts", "temp"]);
    let doc = normalize(&cols, &["NA", "1700000000", "NaN"], false).unwrap();

    assert_eq!(doc.device, UNKNOWN_DEVICE);
    assert_eq!(doc.temp, None);
}

#[test]
fn keep_raw_collects_only_unmapped_nonempty_cells() {
    let cols = columns(&["device", "ts", "temp", "firmware", "note"]);
    let doc = normalize(
        &cols,
        &["dev-A", "1700000000", "22.5", "v1.2.3", ""],
        true,
    )
    .unwrap();

    let raw = doc.raw.unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw.get("firmware").map(String::as_str), Some("v1.2.3"));
}

#[test]
fn raw_submapping_is_absent_when_empty_or_disabled() {
    let cols = columns(&["device", "ts", "note"]);

    // keep_raw on, but the only unmapped cell is empty.
    let doc = normalize(&cols, &["dev-A", "1700000000", ""], true).unwrap();
    assert_eq!(doc.raw, None);

    // keep_raw off, unmapped cell present.
    let doc = normalize(&cols, &["dev-A", "1700000000", "checked"], false).unwrap();
    assert_eq!(doc.raw, None);
}
