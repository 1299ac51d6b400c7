use crate::err::Error;
use crate::ql::Value;

/// Serialize a response into its binary packed form, with the same
/// logical shape as the JSON output.
pub fn res(val: &Value) -> Result<Vec<u8>, Error> {
	// Create a new vector for encoding output
	let mut out = Vec::new();
	// Serialize the value into packed binary data
	rmpv::encode::write_value(&mut out, &val.to_pack())
		.map_err(|e| Error::Serialize(e.to_string()))?;
	Ok(out)
}
