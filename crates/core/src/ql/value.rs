use crate::err::Error;
use crate::ql::array::Array;
use crate::ql::number::Number;
use crate::ql::object::Object;
use serde::{Serialize, Serializer};
use std::fmt::{self, Display, Formatter};

/// A dynamically typed scalar value.
///
/// Stored records only ever hold the scalar variants (`Null`, `Bool`,
/// `Number`, `Strand`); the container variants exist for response shapes
/// such as aggregated buckets and formatted output.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Number(Number),
	Strand(String),
	Array(Array),
	Object(Object),
	Bytes(Vec<u8>),
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Bool(v)
	}
}

impl From<Number> for Value {
	fn from(v: Number) -> Self {
		Value::Number(v)
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Value::Number(Number::Int(v))
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Value::Number(Number::Int(v as i64))
	}
}

impl From<usize> for Value {
	fn from(v: usize) -> Self {
		Value::Number(Number::Int(v as i64))
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::Number(Number::Float(v))
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::Strand(v.to_owned())
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::Strand(v)
	}
}

impl From<Array> for Value {
	fn from(v: Array) -> Self {
		Value::Array(v)
	}
}

impl From<Vec<Value>> for Value {
	fn from(v: Vec<Value>) -> Self {
		Value::Array(Array(v))
	}
}

impl From<Object> for Value {
	fn from(v: Object) -> Self {
		Value::Object(v)
	}
}

impl Value {
	// -----------------------------------
	// Simple value detection
	// -----------------------------------

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	pub fn is_number(&self) -> bool {
		matches!(self, Value::Number(_))
	}

	pub fn is_strand(&self) -> bool {
		matches!(self, Value::Strand(_))
	}

	// -----------------------------------
	// Coercion
	// -----------------------------------

	/// View this value as a number where possible. Numbers convert
	/// directly; strings are parsed; everything else is not numeric.
	pub fn as_number(&self) -> Option<Number> {
		match self {
			Value::Number(v) => Some(*v),
			Value::Strand(v) => Number::try_from(v.as_str()).ok(),
			_ => None,
		}
	}

	/// Parse a textual verb argument into a scalar value
	pub fn parse_arg(arg: &str) -> Value {
		match arg {
			"null" => Value::Null,
			"true" => Value::Bool(true),
			"false" => Value::Bool(false),
			_ => match Number::try_from(arg) {
				Ok(v) => Value::Number(v),
				Err(_) => Value::Strand(arg.to_owned()),
			},
		}
	}

	/// Coerce a decoded value for reading. Strings which look numeric
	/// are returned as numbers.
	pub fn coerce(self) -> Value {
		match self {
			Value::Strand(v) => match Number::try_from(v.as_str()) {
				Ok(n) => Value::Number(n),
				Err(_) => Value::Strand(v),
			},
			v => v,
		}
	}

	/// Render this value as the string used for set membership,
	/// distinct sets, and string-typed comparisons.
	pub fn stringify(&self) -> String {
		match self {
			Value::Null => "null".to_owned(),
			Value::Bool(v) => v.to_string(),
			Value::Number(v) => v.to_string(),
			Value::Strand(v) => v.clone(),
			v => v.to_string(),
		}
	}

	// -----------------------------------
	// Binary packing
	// -----------------------------------

	/// Convert this value into its packed wire representation
	pub fn to_pack(&self) -> rmpv::Value {
		match self {
			Value::Null => rmpv::Value::Nil,
			Value::Bool(v) => rmpv::Value::Boolean(*v),
			Value::Number(Number::Int(v)) => rmpv::Value::Integer((*v).into()),
			Value::Number(Number::Float(v)) => rmpv::Value::F64(*v),
			Value::Strand(v) => rmpv::Value::String(v.clone().into()),
			Value::Array(v) => rmpv::Value::Array(v.iter().map(Value::to_pack).collect()),
			Value::Object(v) => rmpv::Value::Map(
				v.iter()
					.map(|(k, v)| (rmpv::Value::String(k.clone().into()), v.to_pack()))
					.collect(),
			),
			Value::Bytes(v) => rmpv::Value::Binary(v.clone()),
		}
	}

	/// Convert a packed wire value back into a scalar value
	pub fn try_from_pack(val: rmpv::Value) -> Result<Value, Error> {
		match val {
			rmpv::Value::Nil => Ok(Value::Null),
			rmpv::Value::Boolean(v) => Ok(Value::Bool(v)),
			rmpv::Value::Integer(v) => match v.as_i64() {
				Some(v) => Ok(Value::from(v)),
				None => match v.as_f64() {
					Some(v) => Ok(Value::from(v)),
					None => Err(Error::CorruptedPack("unrepresentable integer".to_owned())),
				},
			},
			rmpv::Value::F32(v) => Ok(Value::from(v as f64)),
			rmpv::Value::F64(v) => Ok(Value::from(v)),
			rmpv::Value::String(v) => match v.into_str() {
				Some(v) => Ok(Value::Strand(v)),
				None => Err(Error::CorruptedPack("invalid utf-8 string".to_owned())),
			},
			rmpv::Value::Binary(v) => Ok(Value::Bytes(v)),
			rmpv::Value::Array(v) => {
				let mut out = Array::with_capacity(v.len());
				for v in v {
					out.push(Value::try_from_pack(v)?);
				}
				Ok(Value::Array(out))
			}
			rmpv::Value::Map(v) => {
				let mut out = Object::new();
				for (k, v) in v {
					let k = match k {
						rmpv::Value::String(k) => match k.into_str() {
							Some(k) => k,
							None => {
								return Err(Error::CorruptedPack(
									"invalid utf-8 field name".to_owned(),
								))
							}
						},
						_ => {
							return Err(Error::CorruptedPack(
								"non-string field name".to_owned(),
							))
						}
					};
					out.insert(k, Value::try_from_pack(v)?);
				}
				Ok(Value::Object(out))
			}
			_ => Err(Error::CorruptedPack("unsupported packed type".to_owned())),
		}
	}
}

impl Serialize for Value {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Value::Null => serializer.serialize_unit(),
			Value::Bool(v) => serializer.serialize_bool(*v),
			Value::Number(v) => v.serialize(serializer),
			Value::Strand(v) => serializer.serialize_str(v),
			Value::Array(v) => v.serialize(serializer),
			Value::Object(v) => v.serialize(serializer),
			Value::Bytes(v) => serializer.serialize_bytes(v),
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		match self {
			Value::Null => f.write_str("null"),
			Value::Bool(v) => Display::fmt(v, f),
			Value::Number(v) => Display::fmt(v, f),
			Value::Strand(v) => write!(f, "{v:?}"),
			Value::Array(v) => Display::fmt(v, f),
			Value::Object(v) => Display::fmt(v, f),
			Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
		}
	}
}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn parse_arg_detects_types() {
		assert_eq!(Value::parse_arg("20"), Value::from(20));
		assert_eq!(Value::parse_arg("2.5"), Value::from(2.5));
		assert_eq!(Value::parse_arg("true"), Value::Bool(true));
		assert_eq!(Value::parse_arg("null"), Value::Null);
		assert_eq!(Value::parse_arg("cat-987H1"), Value::from("cat-987H1"));
	}

	#[test]
	fn coerce_numeric_strings() {
		assert_eq!(Value::from("2500").coerce(), Value::from(2500));
		assert_eq!(Value::from("2.5").coerce(), Value::from(2.5));
		assert_eq!(Value::from("9A12YK2").coerce(), Value::from("9A12YK2"));
	}

	#[test]
	fn pack_round_trip() {
		for val in [
			Value::Null,
			Value::Bool(true),
			Value::from(1564632000000i64),
			Value::from(2.5),
			Value::from("hello"),
		] {
			let mut buf = Vec::new();
			rmpv::encode::write_value(&mut buf, &val.to_pack()).unwrap();
			let out = rmpv::decode::read_value(&mut buf.as_slice()).unwrap();
			assert_eq!(Value::try_from_pack(out).unwrap(), val);
		}
	}

	#[test]
	fn stringify_scalars() {
		assert_eq!(Value::Null.stringify(), "null");
		assert_eq!(Value::Bool(true).stringify(), "true");
		assert_eq!(Value::from(2.5).stringify(), "2.5");
		assert_eq!(Value::from("a b").stringify(), "a b");
	}

	#[test]
	fn serialize_to_json() {
		let val = Value::from(vec![
			Value::from(10),
			Value::Object(Object(map! {
				"value".to_string() => Value::from(156.5),
			})),
		]);
		assert_eq!(serde_json::to_string(&val).unwrap(), r#"[10,{"value":156.5}]"#);
	}
}
