mod helpers;

use helpers::{as_json, new_ds};
use serde_json::json;
use timelex_core::err::Error;
use timelex_core::key::entry;
use timelex_core::key::Series;
use timelex_core::ql::Value;

#[test_log::test(tokio::test)]
async fn add_returns_the_timestamp() {
	let ds = new_ds();
	let out = ds.execute("tx", "add", &["1000", "value", "20"]).await.unwrap();
	assert_eq!(out, Value::from(1000));
}

#[tokio::test]
async fn add_then_get_round_trips() {
	let ds = new_ds();
	ds.execute(
		"tx",
		"add",
		&["1564632000000", "item_id", "cat-987H1", "cust_id", "9A12YK2", "amount", "2500"],
	)
	.await
	.unwrap();
	let out = ds
		.execute("tx", "get", &["1564632000000", "FORMAT", "json"])
		.await
		.unwrap();
	assert_eq!(
		as_json(out),
		json!({"item_id": "cat-987H1", "cust_id": "9A12YK2", "amount": 2500})
	);
}

#[tokio::test]
async fn get_respects_labels_projection() {
	let ds = new_ds();
	ds.execute(
		"tx",
		"add",
		&["1564632000000", "item_id", "cat-987H1", "cust_id", "9A12YK2", "amount", "2500"],
	)
	.await
	.unwrap();
	// Scenario: LABELS keeps exactly the named fields
	let out = ds
		.execute(
			"tx",
			"get",
			&["1564632000000", "LABELS", "item_id", "amount", "FORMAT", "json"],
		)
		.await
		.unwrap();
	assert_eq!(as_json(out), json!({"item_id": "cat-987H1", "amount": 2500}));
	// REDACT removes the named fields instead
	let out = ds
		.execute("tx", "get", &["1564632000000", "REDACT", "cust_id", "FORMAT", "json"])
		.await
		.unwrap();
	assert_eq!(as_json(out), json!({"item_id": "cat-987H1", "amount": 2500}));
}

#[tokio::test]
async fn get_missing_entry_is_empty_not_an_error() {
	let ds = new_ds();
	let out = ds.execute("tx", "get", &["42"]).await.unwrap();
	assert_eq!(out, Value::Null);
}

#[tokio::test]
async fn get_native_output_flattens_and_stringifies() {
	let ds = new_ds();
	ds.execute("tx", "add", &["1", "ratio", "2.5", "count", "7"]).await.unwrap();
	let out = ds.execute("tx", "get", &["1"]).await.unwrap();
	// Fields surface alphabetically as a flat name/value sequence, and
	// the non-integer float is stringified
	assert_eq!(
		out,
		Value::from(vec![
			Value::from("count"),
			Value::from(7),
			Value::from("ratio"),
			Value::from("2.5"),
		])
	);
}

#[tokio::test]
async fn add_accepts_the_star_token() {
	use timelex_core::kvs::{FakeClock, SizedClock};
	let ds = new_ds().with_clock(SizedClock::Fake(FakeClock::new(1488823384)));
	let out = ds.execute("tx", "add", &["*", "value", "1"]).await.unwrap();
	assert_eq!(out, Value::from(1488823384));
	assert_eq!(ds.execute("tx", "exists", &["1488823384"]).await.unwrap(), Value::from(1));
}

#[tokio::test]
async fn second_add_overwrites() {
	let ds = new_ds();
	// Scenario: add 1000 value 20, twice
	ds.execute("tx", "add", &["1000", "value", "20"]).await.unwrap();
	ds.execute("tx", "add", &["1000", "value", "30"]).await.unwrap();
	let out = ds.execute("tx", "size", &[]).await.unwrap();
	assert_eq!(out, Value::from(1));
	let out = ds.execute("tx", "get", &["1000", "FORMAT", "json"]).await.unwrap();
	assert_eq!(as_json(out), json!({"value": 30}));
}

#[tokio::test]
async fn stored_entry_layout_is_byte_exact() {
	let ds = new_ds();
	ds.execute("tx", "add", &["1000", "value", "20"]).await.unwrap();
	// Inspect the raw ordered key behind the engine's back
	let series = Series::new("tx");
	let mut txn = ds.transaction(false).await.unwrap();
	let keys = txn.keys(series.prefix()..series.suffix(), 10).await.unwrap();
	assert_eq!(keys.len(), 1);
	assert!(txn.exists(keys[0].clone()).await.unwrap());
	// The entry lives entirely in the key; the stored value is empty
	let kvs = txn.scan(series.prefix()..series.suffix(), 10).await.unwrap();
	assert_eq!(kvs[0].1, Vec::<u8>::new());
	txn.cancel().await.unwrap();
	let member = series.member(&keys[0]);
	// decimal timestamp, 0x7C, flag byte, then the packed record
	assert_eq!(&member[..4], b"1000");
	assert_eq!(member[4], 0x7C);
	assert_eq!(member[5], b'n');
	let decoded = entry::decode(member).unwrap();
	assert_eq!(decoded.ts, 1000);
	assert_eq!(decoded.fields.get("value"), Some(&Value::from(20)));
}

#[tokio::test]
async fn float_flag_tracks_record_contents() {
	let ds = new_ds();
	ds.execute("tx", "add", &["1", "value", "2.5"]).await.unwrap();
	ds.execute("tx", "add", &["2", "value", "20"]).await.unwrap();
	let series = Series::new("tx");
	let mut txn = ds.transaction(false).await.unwrap();
	let keys = txn.keys(series.prefix()..series.suffix(), 10).await.unwrap();
	txn.cancel().await.unwrap();
	assert_eq!(entry::decode(series.member(&keys[0])).unwrap().flag, b'f');
	assert_eq!(entry::decode(series.member(&keys[1])).unwrap().flag, b'n');
}

#[tokio::test]
async fn set_merges_fields() {
	let ds = new_ds();
	ds.execute("tx", "add", &["1000", "active", "1", "failed", "4"]).await.unwrap();
	ds.execute("tx", "set", &["1000", "failed", "5", "state", "up"]).await.unwrap();
	let out = ds.execute("tx", "get", &["1000", "FORMAT", "json"]).await.unwrap();
	assert_eq!(as_json(out), json!({"active": 1, "failed": 5, "state": "up"}));
}

#[tokio::test]
async fn set_with_null_removes_a_field() {
	let ds = new_ds();
	ds.execute("tx", "add", &["1000", "active", "1", "failed", "4"]).await.unwrap();
	ds.execute("tx", "set", &["1000", "failed", "null"]).await.unwrap();
	let out = ds.execute("tx", "get", &["1000", "FORMAT", "json"]).await.unwrap();
	assert_eq!(as_json(out), json!({"active": 1}));
}

#[tokio::test]
async fn set_creates_a_missing_entry() {
	let ds = new_ds();
	ds.execute("tx", "set", &["1000", "value", "20"]).await.unwrap();
	assert_eq!(ds.execute("tx", "size", &[]).await.unwrap(), Value::from(1));
}

#[tokio::test]
async fn incrby_returns_new_values_stringified() {
	let ds = new_ds();
	// Scenario: incrBy 1000 active 2.5 failed 1.5 against {active: 1, failed: 4}
	ds.execute("tx", "add", &["1000", "active", "1", "failed", "4"]).await.unwrap();
	let out = ds
		.execute("tx", "incrby", &["1000", "active", "2.5", "failed", "1.5"])
		.await
		.unwrap();
	assert_eq!(out, Value::from(vec![Value::from("3.5"), Value::from("5.5")]));
}

#[tokio::test]
async fn incrby_keeps_native_numbers_in_json() {
	let ds = new_ds();
	ds.execute("tx", "add", &["1000", "active", "1"]).await.unwrap();
	ds.execute("tx", "incrby", &["1000", "active", "2.5"]).await.unwrap();
	let out = ds.execute("tx", "get", &["1000", "FORMAT", "json"]).await.unwrap();
	assert_eq!(as_json(out), json!({"active": 3.5}));
}

#[tokio::test]
async fn incrby_starts_from_zero() {
	let ds = new_ds();
	let out = ds.execute("tx", "incrby", &["1000", "hits", "2"]).await.unwrap();
	assert_eq!(out, Value::from(vec![Value::from(2)]));
	assert_eq!(ds.execute("tx", "size", &[]).await.unwrap(), Value::from(1));
}

#[tokio::test]
async fn incrby_rejects_non_numeric_fields() {
	let ds = new_ds();
	ds.execute("tx", "add", &["1000", "state", "active"]).await.unwrap();
	let err = ds.execute("tx", "incrby", &["1000", "state", "1"]).await.unwrap_err();
	assert_eq!(err.to_string(), "INCRBY: field state is not a number");
	// The failed invocation left the store unchanged
	let out = ds.execute("tx", "get", &["1000", "FORMAT", "json"]).await.unwrap();
	assert_eq!(as_json(out), json!({"state": "active"}));
}

#[tokio::test]
async fn del_counts_removed_entries() {
	let ds = new_ds();
	ds.execute("tx", "add", &["1", "value", "1"]).await.unwrap();
	ds.execute("tx", "add", &["2", "value", "2"]).await.unwrap();
	let out = ds.execute("tx", "del", &["1", "2", "3"]).await.unwrap();
	assert_eq!(out, Value::from(2));
	assert_eq!(ds.execute("tx", "size", &[]).await.unwrap(), Value::from(0));
}

#[tokio::test]
async fn pop_returns_and_removes() {
	let ds = new_ds();
	ds.execute("tx", "add", &["1000", "value", "20"]).await.unwrap();
	let out = ds.execute("tx", "pop", &["1000", "FORMAT", "json"]).await.unwrap();
	assert_eq!(as_json(out), json!({"value": 20}));
	assert_eq!(ds.execute("tx", "exists", &["1000"]).await.unwrap(), Value::from(0));
}

#[tokio::test]
async fn exists_is_zero_or_one() {
	let ds = new_ds();
	ds.execute("tx", "add", &["1000", "value", "20"]).await.unwrap();
	assert_eq!(ds.execute("tx", "exists", &["1000"]).await.unwrap(), Value::from(1));
	assert_eq!(ds.execute("tx", "exists", &["2000"]).await.unwrap(), Value::from(0));
}

#[tokio::test]
async fn span_and_times_agree() {
	let ds = new_ds();
	for ts in [5, 9, 2, 7] {
		ds.execute("tx", "add", &[&ts.to_string(), "value", "1"]).await.unwrap();
	}
	let times = ds.execute("tx", "times", &[]).await.unwrap();
	assert_eq!(
		times,
		Value::from(vec![Value::from(2), Value::from(5), Value::from(7), Value::from(9)])
	);
	let span = ds.execute("tx", "span", &[]).await.unwrap();
	assert_eq!(span, Value::from(vec![Value::from(2), Value::from(9)]));
}

#[tokio::test]
async fn span_of_an_empty_series_is_empty() {
	let ds = new_ds();
	let out = ds.execute("tx", "span", &[]).await.unwrap();
	assert_eq!(out, Value::from(Vec::<Value>::new()));
}

#[tokio::test]
async fn unknown_command_is_fatal() {
	let ds = new_ds();
	let err = ds.execute("tx", "truncate", &[]).await.unwrap_err();
	assert_eq!(err.to_string(), "Timeseries: unknown command truncate");
}

#[tokio::test]
async fn verbs_are_case_insensitive() {
	let ds = new_ds();
	ds.execute("tx", "ADD", &["1000", "value", "20"]).await.unwrap();
	assert_eq!(ds.execute("tx", "SIZE", &[]).await.unwrap(), Value::from(1));
}

#[tokio::test]
async fn arity_errors() {
	let ds = new_ds();
	assert!(matches!(
		ds.execute("tx", "add", &["1000", "value"]).await.unwrap_err(),
		Error::Arity("ADD")
	));
	assert!(matches!(
		ds.execute("tx", "exists", &[]).await.unwrap_err(),
		Error::Arity("EXISTS")
	));
	assert!(matches!(ds.execute("tx", "span", &["1"]).await.unwrap_err(), Error::Arity("SPAN")));
}

#[tokio::test]
async fn invalid_field_names_are_fatal() {
	let ds = new_ds();
	let err = ds.execute("tx", "add", &["1000", "9lives", "1"]).await.unwrap_err();
	assert_eq!(err.to_string(), "Timeseries: invalid field name 9lives");
}
