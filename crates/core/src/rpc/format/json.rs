use crate::err::Error;
use crate::ql::Value;

/// Serialize a response as a single JSON string. Numbers stay native,
/// records become objects.
pub fn res(val: &Value) -> Result<String, Error> {
	Ok(serde_json::to_string(val)?)
}
