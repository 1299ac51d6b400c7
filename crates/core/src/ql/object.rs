use crate::ql::value::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;
use std::ops::DerefMut;

/// An unordered mapping from field names to scalar values.
///
/// This is the in-memory shape of one stored record. The map is keyed
/// alphabetically, so decoded field order is not the insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object(pub BTreeMap<String, Value>);

impl From<BTreeMap<String, Value>> for Object {
	fn from(v: BTreeMap<String, Value>) -> Self {
		Self(v)
	}
}

impl From<Object> for BTreeMap<String, Value> {
	fn from(s: Object) -> Self {
		s.0
	}
}

impl FromIterator<(String, Value)> for Object {
	fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl Deref for Object {
	type Target = BTreeMap<String, Value>;
	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl DerefMut for Object {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.0
	}
}

impl IntoIterator for Object {
	type Item = (String, Value);
	type IntoIter = std::collections::btree_map::IntoIter<String, Value>;
	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl Object {
	/// Create a new empty object
	pub fn new() -> Self {
		Self::default()
	}

	/// Keep only the named fields
	pub fn project(&self, labels: &[String]) -> Object {
		labels
			.iter()
			.filter_map(|l| self.0.get_key_value(l))
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}

	/// Remove the named fields
	pub fn redact(&self, labels: &[String]) -> Object {
		self.0
			.iter()
			.filter(|(k, _)| !labels.contains(k))
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}

	/// Merge another object into this one. A null value removes the
	/// field rather than storing an explicit null.
	pub fn merge(&mut self, other: Object) {
		for (k, v) in other {
			if v.is_null() {
				self.0.remove(&k);
			} else {
				self.0.insert(k, v);
			}
		}
	}
}

impl Serialize for Object {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.0.len()))?;
		for (k, v) in &self.0 {
			map.serialize_entry(k, v)?;
		}
		map.end()
	}
}

impl Display for Object {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		f.write_str("{")?;
		for (i, (k, v)) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{k}: {v}")?;
		}
		f.write_str("}")
	}
}

#[cfg(test)]
mod tests {

	use super::*;

	fn obj() -> Object {
		Object(map! {
			"item_id".to_string() => Value::from("cat-987H1"),
			"cust_id".to_string() => Value::from("9A12YK2"),
			"amount".to_string() => Value::from(2500),
		})
	}

	#[test]
	fn project_keeps_named_fields() {
		let out = obj().project(&["item_id".to_string(), "amount".to_string()]);
		assert_eq!(out.len(), 2);
		assert_eq!(out.get("amount"), Some(&Value::from(2500)));
		assert_eq!(out.get("cust_id"), None);
	}

	#[test]
	fn project_ignores_unknown_fields() {
		let out = obj().project(&["missing".to_string()]);
		assert!(out.is_empty());
	}

	#[test]
	fn redact_removes_named_fields() {
		let out = obj().redact(&["cust_id".to_string()]);
		assert_eq!(out.len(), 2);
		assert_eq!(out.get("cust_id"), None);
	}

	#[test]
	fn merge_with_null_removes() {
		let mut out = obj();
		out.merge(Object(map! {
			"amount".to_string() => Value::Null,
			"state".to_string() => Value::from("active"),
		}));
		assert_eq!(out.get("amount"), None);
		assert_eq!(out.get("state"), Some(&Value::from("active")));
	}
}
