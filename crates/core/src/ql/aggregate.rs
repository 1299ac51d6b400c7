use crate::cnf::IMPLICIT_FIELD;
use crate::err::Error;
use crate::ql::filter::is_ident;

/// One of the thirteen supported reductions
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
	Count,
	Rate,
	Sum,
	Avg,
	Min,
	Max,
	First,
	Last,
	Range,
	Stats,
	Distinct,
	CountDistinct,
	Data,
}

impl Kind {
	/// Parse an aggregation kind name
	pub fn parse(s: &str) -> Option<Kind> {
		match s.to_lowercase().as_str() {
			"count" => Some(Self::Count),
			"rate" => Some(Self::Rate),
			"sum" => Some(Self::Sum),
			"avg" => Some(Self::Avg),
			"min" => Some(Self::Min),
			"max" => Some(Self::Max),
			"first" => Some(Self::First),
			"last" => Some(Self::Last),
			"range" => Some(Self::Range),
			"stats" => Some(Self::Stats),
			"distinct" => Some(Self::Distinct),
			"count_distinct" => Some(Self::CountDistinct),
			"data" => Some(Self::Data),
			_ => None,
		}
	}

	pub fn to_str(&self) -> &'static str {
		match self {
			Self::Count => "count",
			Self::Rate => "rate",
			Self::Sum => "sum",
			Self::Avg => "avg",
			Self::Min => "min",
			Self::Max => "max",
			Self::First => "first",
			Self::Last => "last",
			Self::Range => "range",
			Self::Stats => "stats",
			Self::Distinct => "distinct",
			Self::CountDistinct => "count_distinct",
			Self::Data => "data",
		}
	}
}

/// A tumbling-window aggregation specification.
///
/// Two surface syntaxes are accepted. The functional form leads with the
/// bucket width and names each target explicitly:
///
/// ```text
/// AGGREGATION 10 avg(value) max(value) distinct(job)
/// ```
///
/// The legacy form pairs a bare kind with the bucket width, in either
/// order, and targets the implicit field `value`:
///
/// ```text
/// AGGREGATION avg 10
/// AGGREGATION 10 avg
/// ```
///
/// The two are told apart by whether the first token parses as a number.
#[derive(Clone, Debug)]
pub struct Aggregation {
	/// The tumbling window width
	pub bucket: i64,
	/// The aggregated (field, kind) pairs, in specification order
	pub fields: Vec<(String, Kind)>,
}

impl Aggregation {
	/// Parse the token list following an AGGREGATION keyword
	pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Aggregation, Error> {
		let mut iter = tokens.iter().map(|t| t.as_ref()).peekable();
		let first = match iter.next() {
			Some(t) => t,
			None => return Err(Error::AggregationBucket(String::new())),
		};
		// A leading number is the bucket width
		if let Ok(bucket) = first.parse::<i64>() {
			if bucket <= 0 {
				return Err(Error::AggregationBucket(first.to_owned()));
			}
			// A bare kind is the legacy single-field form
			if let Some(&t) = iter.peek() {
				if !t.contains('(') {
					let kind = Kind::parse(t)
						.ok_or_else(|| Error::AggregationKind(t.to_owned()))?;
					iter.next();
					if let Some(t) = iter.next() {
						return Err(Error::AggregationField(t.to_owned()));
					}
					return Ok(Aggregation {
						bucket,
						fields: vec![(IMPLICIT_FIELD.to_owned(), kind)],
					});
				}
			}
			// Otherwise parse the functional kind(field) pairs
			let mut fields = Vec::new();
			for t in iter {
				fields.push(parse_pair(t)?);
			}
			if fields.is_empty() {
				return Err(Error::AggregationKind(String::new()));
			}
			return Ok(Aggregation {
				bucket,
				fields,
			});
		}
		// Otherwise the first token is a legacy kind, the second the bucket
		let kind = Kind::parse(first).ok_or_else(|| Error::AggregationKind(first.to_owned()))?;
		let bucket = match iter.next() {
			Some(t) => match t.parse::<i64>() {
				Ok(v) if v > 0 => v,
				_ => return Err(Error::AggregationBucket(t.to_owned())),
			},
			None => return Err(Error::AggregationBucket(String::new())),
		};
		if let Some(t) = iter.next() {
			return Err(Error::AggregationField(t.to_owned()));
		}
		Ok(Aggregation {
			bucket,
			fields: vec![(IMPLICIT_FIELD.to_owned(), kind)],
		})
	}

	/// Align a timestamp onto its bucket
	pub fn align(&self, ts: i64) -> i64 {
		ts - ts.rem_euclid(self.bucket)
	}
}

/// Parse a functional kind(field) token
fn parse_pair(token: &str) -> Result<(String, Kind), Error> {
	let (kind, rest) = match token.split_once('(') {
		Some(parts) => parts,
		None => return Err(Error::AggregationField(token.to_owned())),
	};
	let field = match rest.strip_suffix(')') {
		Some(f) => f,
		None => return Err(Error::AggregationField(token.to_owned())),
	};
	if !is_ident(field) {
		return Err(Error::AggregationField(token.to_owned()));
	}
	let kind = Kind::parse(kind).ok_or_else(|| Error::AggregationKind(kind.to_owned()))?;
	Ok((field.to_owned(), kind))
}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn functional_form() {
		let agg = Aggregation::parse(&["10", "avg(value)", "max(value)", "distinct(job)"])
			.unwrap();
		assert_eq!(agg.bucket, 10);
		assert_eq!(
			agg.fields,
			vec![
				("value".to_owned(), Kind::Avg),
				("value".to_owned(), Kind::Max),
				("job".to_owned(), Kind::Distinct),
			]
		);
	}

	#[test]
	fn legacy_kind_first() {
		let agg = Aggregation::parse(&["avg", "10"]).unwrap();
		assert_eq!(agg.bucket, 10);
		assert_eq!(agg.fields, vec![("value".to_owned(), Kind::Avg)]);
	}

	#[test]
	fn legacy_bucket_first() {
		let agg = Aggregation::parse(&["500", "count"]).unwrap();
		assert_eq!(agg.bucket, 500);
		assert_eq!(agg.fields, vec![("value".to_owned(), Kind::Count)]);
	}

	#[test]
	fn repeated_kinds_on_one_field() {
		let agg = Aggregation::parse(&["60", "min(value)", "max(value)"]).unwrap();
		assert_eq!(agg.fields.len(), 2);
	}

	#[test]
	fn unknown_kind() {
		assert!(matches!(
			Aggregation::parse(&["10", "median(value)"]),
			Err(Error::AggregationKind(_))
		));
		assert!(matches!(
			Aggregation::parse(&["median", "10"]),
			Err(Error::AggregationKind(_))
		));
	}

	#[test]
	fn invalid_bucket() {
		assert!(matches!(
			Aggregation::parse(&["avg", "x"]),
			Err(Error::AggregationBucket(_))
		));
		assert!(matches!(
			Aggregation::parse(&["0", "avg"]),
			Err(Error::AggregationBucket(_))
		));
		assert!(matches!(
			Aggregation::parse::<&str>(&[]),
			Err(Error::AggregationBucket(_))
		));
	}

	#[test]
	fn malformed_pair() {
		assert!(matches!(
			Aggregation::parse(&["10", "avg(value"]),
			Err(Error::AggregationField(_))
		));
		assert!(matches!(
			Aggregation::parse(&["10", "avg()"]),
			Err(Error::AggregationField(_))
		));
	}

	#[test]
	fn bucket_alignment() {
		let agg = Aggregation::parse(&["500", "count"]).unwrap();
		assert_eq!(agg.align(1488823384), 1488823000);
		assert_eq!(agg.align(1488823500), 1488823500);
		assert_eq!(agg.align(-3), -500);
	}
}
