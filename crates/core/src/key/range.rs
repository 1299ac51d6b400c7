//! Translation of user timestamp bounds into ordered-key scan ranges.
//!
//! Numeric bounds become prefix-shaped lexicographic brackets: the lower
//! bound `[T|` pins the timestamp prefix exactly, and the upper bound
//! `(T+1|` makes the numeric endpoint inclusive despite the exclusive
//! bracket. Lexicographic and numeric order agree for timestamps of equal
//! decimal width, which is what the prefix forms rely on.

use crate::err::Error;
use crate::key::entry::SEPARATOR;
use crate::key::Series;
use crate::kvs::Key;
use std::ops::Range;

/// One user-supplied range bound
#[derive(Clone, Debug, PartialEq)]
pub enum Bound {
	/// `-`, the smallest key of the series
	Min,
	/// `+`, the largest key of the series
	Max,
	/// `*`, the current wall-clock second
	Now,
	/// A caller-authored inclusive lexicographic bound, `[X`
	Incl(String),
	/// A caller-authored exclusive lexicographic bound, `(X`
	Excl(String),
	/// A decimal timestamp
	Ts(i64),
}

impl Bound {
	/// Parse a bound token
	pub fn parse(token: &str) -> Result<Bound, Error> {
		match token {
			"-" => Ok(Bound::Min),
			"+" => Ok(Bound::Max),
			"*" => Ok(Bound::Now),
			_ => match token.strip_prefix('[') {
				Some(rest) => Ok(Bound::Incl(rest.to_owned())),
				None => match token.strip_prefix('(') {
					Some(rest) => Ok(Bound::Excl(rest.to_owned())),
					None => match token.parse::<i64>() {
						Ok(ts) => Ok(Bound::Ts(ts)),
						Err(_) => Err(Error::InvalidTimestamp(token.to_owned())),
					},
				},
			},
		}
	}

	/// Substitute the current wall-clock second for `*`
	pub fn resolve(self, now: i64) -> Bound {
		match self {
			Bound::Now => Bound::Ts(now),
			b => b,
		}
	}
}

/// Render the lexicographic prefix of a numeric timestamp
fn ts_prefix(series: &Series, ts: i64) -> Key {
	let mut key = series.prefix();
	key.extend_from_slice(ts.to_string().as_bytes());
	key.push(SEPARATOR);
	key
}

/// Translate a resolved bound pair into a store scan range.
///
/// A numeric upper bound carries a +1 fudge so the endpoint stays
/// inclusive despite the exclusive bracket. A reversed numeric pair
/// scans nothing: the prefix forms cannot express emptiness across
/// mixed decimal widths, so the range is forced empty here.
pub fn translate(series: &Series, lo: &Bound, hi: &Bound) -> Range<Key> {
	// A reversed numeric pair short-circuits to an empty range
	if let (Bound::Ts(a), Bound::Ts(b)) = (lo, hi) {
		if a > b {
			let start = ts_prefix(series, *a);
			return start.clone()..start;
		}
	}
	let start = match lo {
		Bound::Min => series.prefix(),
		Bound::Max => series.suffix(),
		Bound::Incl(s) => {
			let mut key = series.prefix();
			key.extend_from_slice(s.as_bytes());
			key
		}
		Bound::Excl(s) => {
			let mut key = series.prefix();
			key.extend_from_slice(s.as_bytes());
			key.push(0x00);
			key
		}
		Bound::Ts(ts) => ts_prefix(series, *ts),
		// Resolved before translation
		Bound::Now => series.prefix(),
	};
	let end = match hi {
		Bound::Max => series.suffix(),
		Bound::Min => series.prefix(),
		Bound::Incl(s) => {
			let mut key = series.prefix();
			key.extend_from_slice(s.as_bytes());
			key.push(0x00);
			key
		}
		Bound::Excl(s) => {
			let mut key = series.prefix();
			key.extend_from_slice(s.as_bytes());
			key
		}
		Bound::Ts(ts) => match ts.checked_add(1) {
			Some(ts) => ts_prefix(series, ts),
			// The bound saturates at the end of the series
			None => series.suffix(),
		},
		// Resolved before translation
		Bound::Now => series.suffix(),
	};
	start..end
}

/// The scan range holding exactly one timestamp
pub fn point(series: &Series, ts: i64) -> Range<Key> {
	translate(series, &Bound::Ts(ts), &Bound::Ts(ts))
}
