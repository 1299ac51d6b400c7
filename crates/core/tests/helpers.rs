#![allow(dead_code)]

use timelex_core::kvs::Datastore;
use timelex_core::ql::Value;

/// Create a new in-memory datastore
pub fn new_ds() -> Datastore {
	Datastore::new()
}

/// Unwrap a JSON-formatted response into a comparable JSON value
pub fn as_json(val: Value) -> serde_json::Value {
	match val {
		Value::Strand(s) => serde_json::from_str(&s).unwrap(),
		v => panic!("expected a JSON string response, got {v:?}"),
	}
}

/// Insert the value table used by the aggregation scenarios: for each
/// `i` in `[10, 50)`, an entry at timestamp `i` holding
/// `value = (i / 10) * 100 + table[i % 10]`.
pub async fn seed_table(ds: &Datastore, series: &str) {
	const TABLE: [i64; 10] = [31, 41, 59, 26, 53, 58, 97, 93, 23, 84];
	for i in 10..50i64 {
		let v = (i / 10) * 100 + TABLE[(i % 10) as usize];
		ds.execute(series, "add", &[&i.to_string(), "value", &v.to_string()])
			.await
			.unwrap();
	}
}
