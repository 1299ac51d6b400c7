//! Response output formats.
//!
//! The default path returns the native ordered-sequence reply: records
//! flatten to alternating name/value sequences, and non-integer numbers
//! are stringified so that the host wire format cannot truncate them.
//! The JSON and msgpack paths keep records as maps and numbers native.

pub mod json;
pub mod msgpack;

use crate::err::Error;
use crate::ql::{Array, Format, Number, Value};

/// Apply an output format to a finished verb result
pub(crate) fn apply(format: Format, val: Value) -> Result<Value, Error> {
	match format {
		Format::Native => Ok(native(val)),
		Format::Json => Ok(Value::Strand(json::res(&val)?)),
		Format::Msgpack => Ok(Value::Bytes(msgpack::res(&val)?)),
	}
}

/// Rewrite a value tree into the native reply shape
fn native(val: Value) -> Value {
	match val {
		Value::Number(Number::Float(f)) => {
			// Whole floats surface as plain integers
			if f.is_finite() && f.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(&f)
			{
				Value::from(f as i64)
			} else {
				// Everything else is stringified to preserve precision
				Value::Strand(f.to_string())
			}
		}
		Value::Array(v) => Value::Array(v.into_iter().map(native).collect()),
		// Records flatten into alternating name/value sequences
		Value::Object(v) => {
			let mut out = Array::with_capacity(v.len() * 2);
			for (k, v) in v {
				out.push(Value::Strand(k));
				out.push(native(v));
			}
			Value::Array(out)
		}
		v => v,
	}
}
