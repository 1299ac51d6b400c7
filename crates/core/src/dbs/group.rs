use crate::err::Error;
use crate::fnc::util::math::welford::Welford;
use crate::ql::aggregate::{Aggregation, Kind};
use crate::ql::array::Array;
use crate::ql::number::Number;
use crate::ql::object::Object;
use crate::ql::value::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Collects decoded entries into tumbling-window buckets.
///
/// A bucket only exists once a point has landed in it, so empty buckets
/// are never emitted. Buckets are keyed by their aligned timestamp and
/// surface in ascending order.
pub(crate) struct BucketCollector<'a> {
	agg: &'a Aggregation,
	grp: BTreeMap<i64, Vec<Aggregator>>,
}

impl<'a> BucketCollector<'a> {
	pub(crate) fn new(agg: &'a Aggregation) -> Self {
		Self {
			agg,
			grp: BTreeMap::new(),
		}
	}

	/// Fold one entry into its bucket
	pub(crate) fn push(&mut self, ts: i64, obj: &Object) {
		let bucket = self.agg.align(ts);
		let aggrs = self
			.grp
			.entry(bucket)
			.or_insert_with(|| self.agg.fields.iter().map(|(_, k)| Aggregator::new(*k)).collect());
		for ((field, _), aggr) in self.agg.fields.iter().zip(aggrs.iter_mut()) {
			aggr.push(obj.get(field));
		}
	}

	/// Produce the query output shape: one `[ts, {field: {kind: value}}]`
	/// element per bucket, ascending.
	pub(crate) fn output(self) -> Array {
		let bucket = self.agg.bucket;
		let fields = &self.agg.fields;
		self.grp
			.into_iter()
			.map(|(ts, aggrs)| {
				let mut out: BTreeMap<String, Object> = BTreeMap::new();
				for ((field, kind), aggr) in fields.iter().zip(aggrs) {
					out.entry(field.clone())
						.or_default()
						.insert(kind.to_str().to_owned(), aggr.finalize(bucket));
				}
				let obj: Object =
					out.into_iter().map(|(k, v)| (k, Value::Object(v))).collect();
				Value::from(vec![Value::from(ts), Value::Object(obj)])
			})
			.collect()
	}

	/// Produce the copy output shape: one flattened record per bucket,
	/// with `field_kind` and `field_kind_subfield` keys.
	pub(crate) fn output_flat(self) -> Result<Vec<(i64, Object)>, Error> {
		let bucket = self.agg.bucket;
		let fields = &self.agg.fields;
		let mut res = Vec::with_capacity(self.grp.len());
		for (ts, aggrs) in self.grp {
			let mut obj = Object::new();
			for ((field, kind), aggr) in fields.iter().zip(aggrs) {
				aggr.flatten(bucket, field, *kind, &mut obj)?;
			}
			res.push((ts, obj));
		}
		Ok(res)
	}
}

/// The per-bucket accumulator state of one (field, kind) pair
enum Aggregator {
	Count(usize),
	Rate(usize),
	Sum(Number),
	Avg(Welford),
	Min(Option<Value>),
	Max(Option<Value>),
	First(Option<Value>),
	Last(Option<Value>),
	Range(Option<(f64, f64)>),
	Stats(Stats),
	Distinct(BTreeSet<String>),
	CountDistinct(BTreeMap<String, i64>),
	Data(Vec<Value>),
}

/// The accumulator behind the stats reduction
#[derive(Default)]
struct Stats {
	welford: Welford,
	sum: f64,
	min: f64,
	max: f64,
}

impl Stats {
	fn push(&mut self, x: f64) {
		if self.welford.count() == 0 {
			self.min = x;
			self.max = x;
		} else {
			self.min = self.min.min(x);
			self.max = self.max.max(x);
		}
		self.sum += x;
		self.welford.push(x);
	}
}

/// Order two scalars, numerically where both are numeric, and by their
/// string forms otherwise
fn compare(a: &Value, b: &Value) -> Ordering {
	match (a.as_number(), b.as_number()) {
		(Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
		_ => a.stringify().cmp(&b.stringify()),
	}
}

impl Aggregator {
	fn new(kind: Kind) -> Self {
		match kind {
			Kind::Count => Self::Count(0),
			Kind::Rate => Self::Rate(0),
			Kind::Sum => Self::Sum(Number::Int(0)),
			Kind::Avg => Self::Avg(Welford::new()),
			Kind::Min => Self::Min(None),
			Kind::Max => Self::Max(None),
			Kind::First => Self::First(None),
			Kind::Last => Self::Last(None),
			Kind::Range => Self::Range(None),
			Kind::Stats => Self::Stats(Stats::default()),
			Kind::Distinct => Self::Distinct(BTreeSet::new()),
			Kind::CountDistinct => Self::CountDistinct(BTreeMap::new()),
			Kind::Data => Self::Data(Vec::new()),
		}
	}

	/// Fold one point into the accumulator. An absent field behaves as
	/// an explicit null.
	fn push(&mut self, val: Option<&Value>) {
		let val = match val {
			Some(Value::Null) | None => None,
			Some(v) => Some(v),
		};
		match self {
			Self::Count(n) | Self::Rate(n) => *n += 1,
			Self::Sum(acc) => {
				// Non-numeric values add nothing
				if let Some(v) = val.and_then(Value::as_number) {
					*acc = acc.add(v);
				}
			}
			Self::Avg(w) => {
				if let Some(v) = val.and_then(Value::as_number) {
					w.push(v.as_float());
				}
			}
			Self::Min(slot) => {
				if let Some(v) = val {
					match slot {
						Some(m) if compare(m, v) != Ordering::Greater => (),
						_ => *slot = Some(v.clone()),
					}
				}
			}
			Self::Max(slot) => {
				if let Some(v) = val {
					match slot {
						Some(m) if compare(m, v) != Ordering::Less => (),
						_ => *slot = Some(v.clone()),
					}
				}
			}
			// The first non-null value wins
			Self::First(slot) => {
				if slot.is_none() {
					if let Some(v) = val {
						*slot = Some(v.clone());
					}
				}
			}
			// The last value wins, nulls included
			Self::Last(slot) => {
				*slot = Some(val.cloned().unwrap_or(Value::Null));
			}
			Self::Range(slot) => {
				if let Some(v) = val.and_then(Value::as_number) {
					let v = v.as_float();
					*slot = match *slot {
						Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
						None => Some((v, v)),
					};
				}
			}
			Self::Stats(s) => {
				if let Some(v) = val.and_then(Value::as_number) {
					s.push(v.as_float());
				}
			}
			Self::Distinct(set) => {
				if let Some(v) = val {
					set.insert(v.stringify());
				}
			}
			Self::CountDistinct(map) => {
				if let Some(v) = val {
					*map.entry(v.stringify()).or_insert(0) += 1;
				}
			}
			Self::Data(list) => {
				list.push(val.cloned().unwrap_or(Value::Null));
			}
		}
	}

	/// Finish the accumulator into its output value
	fn finalize(self, bucket: i64) -> Value {
		match self {
			Self::Count(n) => Value::from(n),
			Self::Rate(n) => Value::from(n as f64 / bucket as f64),
			Self::Sum(acc) => Value::Number(acc),
			Self::Avg(w) => match w.count() {
				0 => Value::Null,
				_ => Value::from(w.mean()),
			},
			Self::Min(slot) | Self::Max(slot) => slot.unwrap_or(Value::Null),
			Self::First(slot) => slot.unwrap_or(Value::Null),
			Self::Last(slot) => slot.unwrap_or(Value::Null),
			Self::Range(slot) => match slot {
				Some((lo, hi)) => Value::from(hi - lo),
				None => Value::Null,
			},
			Self::Stats(s) => {
				let mut obj = Object::new();
				obj.insert("count".to_owned(), Value::from(s.welford.count() as i64));
				match s.welford.count() {
					0 => {
						for key in ["sum", "min", "max", "mean", "std"] {
							obj.insert(key.to_owned(), Value::Null);
						}
					}
					_ => {
						obj.insert("sum".to_owned(), Value::from(s.sum));
						obj.insert("min".to_owned(), Value::from(s.min));
						obj.insert("max".to_owned(), Value::from(s.max));
						obj.insert("mean".to_owned(), Value::from(s.welford.mean()));
						obj.insert("std".to_owned(), Value::from(s.welford.std()));
					}
				}
				Value::Object(obj)
			}
			Self::Distinct(set) => {
				Value::Array(set.into_iter().map(Value::Strand).collect())
			}
			Self::CountDistinct(map) => {
				Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
			}
			Self::Data(list) => Value::Array(Array(list)),
		}
	}

	/// Finish the accumulator into flattened record fields
	fn flatten(self, bucket: i64, field: &str, kind: Kind, out: &mut Object) -> Result<(), Error> {
		let base = format!("{field}_{}", kind.to_str());
		match self.finalize(bucket) {
			// Compound reductions flatten into one key per subfield
			Value::Object(obj) => {
				for (sub, val) in obj {
					out.insert(format!("{base}_{sub}"), val);
				}
			}
			// List reductions flatten to their JSON text, since flat
			// records hold scalars only
			Value::Array(arr) => {
				let text = serde_json::to_string(&Value::Array(arr))?;
				out.insert(base, Value::Strand(text));
			}
			val => {
				out.insert(base, val);
			}
		}
		Ok(())
	}
}
