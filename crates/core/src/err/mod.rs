use thiserror::Error;

/// An error originating from the timeseries engine.
///
/// Every fatal verb failure surfaces as exactly one of these variants,
/// carrying a single human-readable message prefixed by the verb or
/// sub-component which produced it. Per-entry coercion failures inside a
/// filter never surface here; they degrade to a false predicate instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// The dispatched verb is not part of the command table
	#[error("Timeseries: unknown command {0}")]
	UnknownCommand(String),

	/// A verb was invoked with the wrong number of arguments
	#[error("{0}: wrong number of arguments")]
	Arity(&'static str),

	/// A timestamp or bound argument could not be parsed
	#[error("TIMESTAMP: invalid timestamp {0}")]
	InvalidTimestamp(String),

	/// The offset of a LIMIT option was not numeric
	#[error("LIMIT: offset value must be a number")]
	LimitOffset,

	/// The count of a LIMIT option was not numeric
	#[error("LIMIT: count value must be a number")]
	LimitCount,

	/// An option keyword was supplied more than once
	#[error("{0}: option specified more than once")]
	DuplicateOption(&'static str),

	/// LABELS and REDACT were both supplied for one query
	#[error("LABELS: the LABELS and REDACT options are mutually exclusive")]
	ExclusiveProjection,

	/// An argument was not a recognised option keyword
	#[error("Timeseries: unknown option {0}")]
	UnknownOption(String),

	/// A filter expression did not match any operator form
	#[error("FILTER: unable to parse expression : {0}")]
	FilterParse(String),

	/// An aggregation kind was not one of the thirteen reductions
	#[error("AGGREGATION: unknown aggregation type {0}")]
	AggregationKind(String),

	/// The bucket width of an aggregation was missing or not positive
	#[error("AGGREGATION: invalid bucket width {0}")]
	AggregationBucket(String),

	/// A functional aggregation token was not of the form kind(field)
	#[error("AGGREGATION: invalid aggregation field {0}")]
	AggregationField(String),

	/// The FORMAT option named an unknown output format
	#[error("FORMAT: unknown output format {0}")]
	UnknownFormat(String),

	/// The STORAGE option named an unknown storage type
	#[error("STORAGE: unknown storage type {0}")]
	UnknownStorage(String),

	/// A field name did not match the identifier grammar
	#[error("Timeseries: invalid field name {0}")]
	InvalidFieldName(String),

	/// An increment was applied to a field holding a non-numeric value
	#[error("INCRBY: field {0} is not a number")]
	FieldNotANumber(String),

	/// An increment argument was not numeric
	#[error("INCRBY: increment value must be a number")]
	IncrementValue,

	/// More than one stored entry was found for a single timestamp
	#[error("Timeseries: more than one entry for timestamp {0}")]
	DuplicateEntry(i64),

	/// A stored key was missing the timestamp separator
	#[error("Timeseries: corrupted entry, missing separator")]
	MissingSeparator,

	/// A stored key held a non-numeric timestamp
	#[error("Timeseries: corrupted entry, invalid timestamp")]
	CorruptedTimestamp,

	/// A stored key was truncated before the flag byte
	#[error("Timeseries: corrupted entry, missing flag byte")]
	MissingFlag,

	/// The packed record of a stored key could not be decoded
	#[error("Timeseries: corrupted entry, {0}")]
	CorruptedPack(String),

	/// A record could not be packed into its stored form
	#[error("Timeseries: unable to encode entry, {0}")]
	Encode(String),

	/// A response could not be serialised into the requested format
	#[error("Timeseries: unable to serialise response, {0}")]
	Serialize(String),

	/// There was a problem with a datastore transaction
	#[error("There was a problem with a datastore transaction: {0}")]
	Tx(String),

	/// The transaction was already committed or cancelled
	#[error("Couldn't update a finished transaction")]
	TxFinished,

	/// The transaction is read-only
	#[error("Couldn't write to a read only transaction")]
	TxReadonly,
}

#[cfg(feature = "kv-mem")]
impl From<echodb::err::Error> for Error {
	fn from(e: echodb::err::Error) -> Error {
		Error::Tx(e.to_string())
	}
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Error {
		Error::Serialize(e.to_string())
	}
}
