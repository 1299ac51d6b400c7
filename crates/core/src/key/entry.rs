//! The stored entry codec.
//!
//! One entry is one ordered byte-string of the form `T | F P`, where `T`
//! is the decimal text of the timestamp, `|` a fixed one-byte separator,
//! `F` a one-byte flag, and `P` the packed record: a single binary array
//! of alternating field names and scalar values. The layout is a wire
//! contract; existing deployments rely on it across migrations.

use crate::err::Error;
use crate::ql::object::Object;
use crate::ql::value::Value;

/// The byte separating the timestamp from the packed record
pub const SEPARATOR: u8 = b'|';

/// Flag marking a record holding at least one non-integer float
pub const FLAG_FLOAT: u8 = b'f';

/// Flag marking a record holding no non-integer floats
pub const FLAG_PLAIN: u8 = b'n';

/// One decoded entry
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
	/// The entry timestamp
	pub ts: i64,
	/// The cached float flag, recomputed on every mutation
	pub flag: u8,
	/// The decoded record
	pub fields: Object,
}

/// Compute the flag byte for a record
fn flag(fields: &Object) -> u8 {
	let float = fields.values().any(|v| match v {
		Value::Number(n) => n.is_float() && !n.is_integral(),
		_ => false,
	});
	match float {
		true => FLAG_FLOAT,
		false => FLAG_PLAIN,
	}
}

/// Encode a timestamp and record into an entry member.
///
/// Null-valued fields are omitted, since absence is equivalent to null.
/// Field order inside the pack is the record's map order, which callers
/// must not depend on after a round trip.
pub fn encode(ts: i64, fields: &Object) -> Result<Vec<u8>, Error> {
	let mut out = Vec::with_capacity(32);
	out.extend_from_slice(ts.to_string().as_bytes());
	out.push(SEPARATOR);
	out.push(flag(fields));
	let items = fields
		.iter()
		.filter(|(_, v)| !v.is_null())
		.flat_map(|(k, v)| [rmpv::Value::String(k.clone().into()), v.to_pack()])
		.collect();
	rmpv::encode::write_value(&mut out, &rmpv::Value::Array(items))
		.map_err(|e| Error::Encode(e.to_string()))?;
	Ok(out)
}

/// Decode an entry member back into a timestamp, flag and record.
///
/// Scalar values which look numeric but were stored as strings are
/// returned as numbers.
pub fn decode(member: &[u8]) -> Result<Entry, Error> {
	// Split on the first separator
	let sep = member
		.iter()
		.position(|b| *b == SEPARATOR)
		.ok_or(Error::MissingSeparator)?;
	// Parse the timestamp as decimal text
	let ts = std::str::from_utf8(&member[..sep])
		.ok()
		.and_then(|s| s.parse::<i64>().ok())
		.ok_or(Error::CorruptedTimestamp)?;
	// Read the flag byte
	let flag = *member.get(sep + 1).ok_or(Error::MissingFlag)?;
	// Unpack the record
	let mut rest = &member[sep + 2..];
	let packed = rmpv::decode::read_value(&mut rest)
		.map_err(|e| Error::CorruptedPack(e.to_string()))?;
	if !rest.is_empty() {
		return Err(Error::CorruptedPack("trailing bytes after pack".to_owned()));
	}
	let items = match packed {
		rmpv::Value::Array(items) => items,
		_ => return Err(Error::CorruptedPack("record is not an array".to_owned())),
	};
	if items.len() % 2 != 0 {
		return Err(Error::CorruptedPack("odd number of packed items".to_owned()));
	}
	let mut fields = Object::new();
	let mut iter = items.into_iter();
	while let (Some(name), Some(value)) = (iter.next(), iter.next()) {
		let name = match name {
			rmpv::Value::String(s) => match s.into_str() {
				Some(s) => s,
				None => {
					return Err(Error::CorruptedPack("invalid utf-8 field name".to_owned()))
				}
			},
			_ => return Err(Error::CorruptedPack("non-string field name".to_owned())),
		};
		fields.insert(name, Value::try_from_pack(value)?.coerce());
	}
	Ok(Entry {
		ts,
		flag,
		fields,
	})
}

/// Read just the timestamp prefix of an entry member, without unpacking
/// the record. Used by the raw copy fast path.
pub fn decode_ts(member: &[u8]) -> Result<i64, Error> {
	let sep = member
		.iter()
		.position(|b| *b == SEPARATOR)
		.ok_or(Error::MissingSeparator)?;
	std::str::from_utf8(&member[..sep])
		.ok()
		.and_then(|s| s.parse::<i64>().ok())
		.ok_or(Error::CorruptedTimestamp)
}
