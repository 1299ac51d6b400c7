use crate::err::Error;
use crate::ql::aggregate::Aggregation;
use crate::ql::filter::{is_ident, Filter};
use crate::ql::object::Object;

/// The output encoding of a query response
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
	/// The native ordered-sequence reply, with non-integer numbers
	/// stringified so the host wire format cannot truncate them
	#[default]
	Native,
	/// A single JSON string
	Json,
	/// The same logical shape encoded as a binary pack
	Msgpack,
}

/// The layout of a copy destination
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Storage {
	/// An ordered set in the same layout as the source series
	#[default]
	Timeseries,
	/// An unordered mapping keyed by decimal timestamp
	Hash,
}

/// The pagination window of a range query
#[derive(Clone, Copy, Debug, Default)]
pub struct Limit {
	/// Number of raw entries skipped before any are consumed
	pub offset: usize,
	/// Number of raw entries consumed, or all when unbounded
	pub count: Option<usize>,
}

/// The parsed query options trailing a verb's positional arguments.
///
/// Each option may appear at most once, keywords are case-insensitive,
/// and the LABELS and REDACT projections are mutually exclusive.
#[derive(Clone, Debug, Default)]
pub struct Options {
	pub limit: Option<Limit>,
	pub aggregation: Option<Aggregation>,
	pub filter: Option<Filter>,
	pub labels: Option<Vec<String>>,
	pub redact: Option<Vec<String>>,
	pub format: Format,
	pub storage: Storage,
}

/// Check whether a token is a recognized option keyword
fn is_keyword(token: &str) -> bool {
	matches!(
		token.to_lowercase().as_str(),
		"limit" | "aggregation" | "filter" | "labels" | "redact" | "format" | "storage"
	)
}

impl Options {
	/// Create a new default options struct
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse the option tokens trailing a verb's positional arguments
	pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Options, Error> {
		let args: Vec<&str> = args.iter().map(|s| s.as_ref()).collect();
		let mut opts = Options::new();
		let mut format = false;
		let mut storage = false;
		let mut limit = false;
		let mut i = 0;
		while i < args.len() {
			match args[i].to_lowercase().as_str() {
				"limit" => {
					if limit {
						return Err(Error::DuplicateOption("LIMIT"));
					}
					let offset = match args.get(i + 1).map(|t| t.parse::<i64>()) {
						Some(Ok(v)) => v.max(0) as usize,
						_ => return Err(Error::LimitOffset),
					};
					let count = match args.get(i + 2).map(|t| t.parse::<i64>()) {
						Some(Ok(v)) if v < 0 => None,
						Some(Ok(v)) => Some(v as usize),
						_ => return Err(Error::LimitCount),
					};
					opts.limit = Some(Limit {
						offset,
						count,
					});
					limit = true;
					i += 3;
				}
				"aggregation" => {
					if opts.aggregation.is_some() {
						return Err(Error::DuplicateOption("AGGREGATION"));
					}
					let end = scan_list(&args, i + 1);
					opts.aggregation = Some(Aggregation::parse(&args[i + 1..end])?);
					i = end;
				}
				"filter" => {
					if opts.filter.is_some() {
						return Err(Error::DuplicateOption("FILTER"));
					}
					let end = scan_list(&args, i + 1);
					opts.filter = Some(Filter::parse(&args[i + 1..end])?);
					i = end;
				}
				"labels" => {
					if opts.labels.is_some() {
						return Err(Error::DuplicateOption("LABELS"));
					}
					let end = scan_list(&args, i + 1);
					opts.labels = Some(parse_names(&args[i + 1..end])?);
					i = end;
				}
				"redact" => {
					if opts.redact.is_some() {
						return Err(Error::DuplicateOption("REDACT"));
					}
					let end = scan_list(&args, i + 1);
					opts.redact = Some(parse_names(&args[i + 1..end])?);
					i = end;
				}
				"format" => {
					if format {
						return Err(Error::DuplicateOption("FORMAT"));
					}
					opts.format = match args.get(i + 1).map(|t| t.to_lowercase()) {
						Some(v) if v == "json" => Format::Json,
						Some(v) if v == "msgpack" => Format::Msgpack,
						Some(v) => return Err(Error::UnknownFormat(v)),
						None => return Err(Error::UnknownFormat(String::new())),
					};
					format = true;
					i += 2;
				}
				"storage" => {
					if storage {
						return Err(Error::DuplicateOption("STORAGE"));
					}
					opts.storage = match args.get(i + 1).map(|t| t.to_lowercase()) {
						Some(v) if v == "timeseries" => Storage::Timeseries,
						Some(v) if v == "hash" => Storage::Hash,
						Some(v) => return Err(Error::UnknownStorage(v)),
						None => return Err(Error::UnknownStorage(String::new())),
					};
					storage = true;
					i += 2;
				}
				_ => return Err(Error::UnknownOption(args[i].to_owned())),
			}
		}
		// Include-only and exclude-only projections cannot be combined
		if opts.labels.is_some() && opts.redact.is_some() {
			return Err(Error::ExclusiveProjection);
		}
		Ok(opts)
	}

	/// Apply the configured projection to a decoded record
	pub fn project(&self, obj: &Object) -> Object {
		if let Some(labels) = &self.labels {
			obj.project(labels)
		} else if let Some(labels) = &self.redact {
			obj.redact(labels)
		} else {
			obj.clone()
		}
	}
}

/// Find the end of an option's token list
fn scan_list(args: &[&str], from: usize) -> usize {
	args.iter()
		.enumerate()
		.skip(from)
		.find(|(_, t)| is_keyword(t))
		.map(|(i, _)| i)
		.unwrap_or(args.len())
}

/// Validate a projection name list
fn parse_names(args: &[&str]) -> Result<Vec<String>, Error> {
	args.iter()
		.map(|t| match is_ident(t) {
			true => Ok(t.to_string()),
			false => Err(Error::InvalidFieldName(t.to_string())),
		})
		.collect()
}

#[cfg(test)]
mod tests {

	use super::*;
	use crate::ql::value::Value;

	#[test]
	fn parse_all_options() {
		let opts = Options::parse(&[
			"LIMIT",
			"0",
			"10",
			"FILTER",
			"state=active",
			"AND",
			"job=reaper",
			"LABELS",
			"state",
			"job",
			"FORMAT",
			"json",
			"STORAGE",
			"hash",
		])
		.unwrap();
		let limit = opts.limit.unwrap();
		assert_eq!(limit.offset, 0);
		assert_eq!(limit.count, Some(10));
		assert!(opts.filter.is_some());
		assert_eq!(opts.labels.as_deref(), Some(&["state".to_owned(), "job".to_owned()][..]));
		assert_eq!(opts.format, Format::Json);
		assert_eq!(opts.storage, Storage::Hash);
	}

	#[test]
	fn keywords_are_case_insensitive() {
		let opts = Options::parse(&["limit", "2", "5", "format", "MSGPACK"]).unwrap();
		assert_eq!(opts.limit.unwrap().offset, 2);
		assert_eq!(opts.format, Format::Msgpack);
	}

	#[test]
	fn negative_count_means_all() {
		let opts = Options::parse(&["LIMIT", "5", "-1"]).unwrap();
		assert_eq!(opts.limit.unwrap().count, None);
	}

	#[test]
	fn limit_requires_numbers() {
		assert!(matches!(Options::parse(&["LIMIT", "x", "10"]), Err(Error::LimitOffset)));
		assert!(matches!(Options::parse(&["LIMIT", "0", "x"]), Err(Error::LimitCount)));
		assert!(matches!(Options::parse(&["LIMIT", "0"]), Err(Error::LimitCount)));
		assert!(matches!(Options::parse(&["LIMIT"]), Err(Error::LimitOffset)));
	}

	#[test]
	fn duplicate_options_are_fatal() {
		assert!(matches!(
			Options::parse(&["LIMIT", "0", "1", "LIMIT", "0", "2"]),
			Err(Error::DuplicateOption("LIMIT"))
		));
		assert!(matches!(
			Options::parse(&["FILTER", "a=1", "FILTER", "b=2"]),
			Err(Error::DuplicateOption("FILTER"))
		));
	}

	#[test]
	fn labels_and_redact_are_exclusive() {
		assert!(matches!(
			Options::parse(&["LABELS", "a", "REDACT", "b"]),
			Err(Error::ExclusiveProjection)
		));
	}

	#[test]
	fn label_list_stops_at_next_keyword() {
		let opts = Options::parse(&["LABELS", "a", "b", "LIMIT", "0", "1"]).unwrap();
		assert_eq!(opts.labels.as_deref(), Some(&["a".to_owned(), "b".to_owned()][..]));
		assert!(opts.limit.is_some());
	}

	#[test]
	fn unknown_keyword_is_fatal() {
		assert!(matches!(Options::parse(&["EXPLAIN"]), Err(Error::UnknownOption(_))));
	}

	#[test]
	fn aggregation_tokens_are_consumed() {
		let opts =
			Options::parse(&["AGGREGATION", "10", "avg(value)", "LIMIT", "0", "5"]).unwrap();
		assert_eq!(opts.aggregation.unwrap().bucket, 10);
		assert!(opts.limit.is_some());
	}

	#[test]
	fn projection_applies() {
		let obj: Object = [
			("a".to_owned(), Value::from(1)),
			("b".to_owned(), Value::from(2)),
		]
		.into_iter()
		.collect();
		let opts = Options::parse(&["LABELS", "a"]).unwrap();
		assert_eq!(opts.project(&obj).len(), 1);
		let opts = Options::parse(&["REDACT", "a"]).unwrap();
		assert_eq!(opts.project(&obj).get("a"), None);
	}
}
