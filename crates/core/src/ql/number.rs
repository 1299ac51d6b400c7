use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A numeric scalar, stored either as an integer or as a float.
///
/// Comparisons and arithmetic promote across the two variants, so an
/// `Int(3)` and a `Float(3.0)` are equal and ordered together.
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub enum Number {
	Int(i64),
	Float(f64),
}

impl Default for Number {
	fn default() -> Self {
		Self::Int(0)
	}
}

macro_rules! from_prim_ints {
	($($int: ty),*) => {
		$(
			impl From<$int> for Number {
				fn from(i: $int) -> Self {
					Self::Int(i as i64)
				}
			}
		)*
	};
}

from_prim_ints!(i8, i16, i32, i64, isize, u8, u16, u32, usize);

impl From<f32> for Number {
	fn from(f: f32) -> Self {
		Self::Float(f as f64)
	}
}

impl From<f64> for Number {
	fn from(f: f64) -> Self {
		Self::Float(f)
	}
}

impl TryFrom<&str> for Number {
	type Error = ();
	fn try_from(v: &str) -> Result<Self, Self::Error> {
		// Attempt to parse as i64
		match v.parse::<i64>() {
			// Store it as an i64
			Ok(v) => Ok(Self::Int(v)),
			// It wasn't parsed as a i64 so parse as a float
			_ => match f64::from_str(v) {
				// Store it as a float
				Ok(v) if v.is_finite() => Ok(Self::Float(v)),
				// It wasn't parsed as a number
				_ => Err(()),
			},
		}
	}
}

impl Display for Number {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		match self {
			Number::Int(v) => Display::fmt(v, f),
			Number::Float(v) => Display::fmt(v, f),
		}
	}
}

impl Serialize for Number {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Number::Int(v) => serializer.serialize_i64(*v),
			Number::Float(v) => serializer.serialize_f64(*v),
		}
	}
}

impl Number {
	// -----------------------------------
	// Simple number detection
	// -----------------------------------

	pub fn is_int(&self) -> bool {
		matches!(self, Number::Int(_))
	}

	pub fn is_float(&self) -> bool {
		matches!(self, Number::Float(_))
	}

	/// Check whether this number has no fractional part
	pub fn is_integral(&self) -> bool {
		match self {
			Number::Int(_) => true,
			Number::Float(v) => v.fract() == 0.0 && v.is_finite(),
		}
	}

	// -----------------------------------
	// Simple conversion of number
	// -----------------------------------

	pub fn as_int(self) -> i64 {
		match self {
			Number::Int(v) => v,
			Number::Float(v) => v as i64,
		}
	}

	pub fn as_float(self) -> f64 {
		match self {
			Number::Int(v) => v as f64,
			Number::Float(v) => v,
		}
	}

	// -----------------------------------
	// Arithmetic
	// -----------------------------------

	/// Add two numbers, keeping integer arithmetic where possible.
	/// An overflowing integer addition promotes the result to a float.
	pub fn add(self, other: Number) -> Number {
		match (self, other) {
			(Number::Int(a), Number::Int(b)) => match a.checked_add(b) {
				Some(v) => Number::Int(v),
				None => Number::Float(a as f64 + b as f64),
			},
			(a, b) => Number::Float(a.as_float() + b.as_float()),
		}
	}
}

impl PartialEq for Number {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Number::Int(a), Number::Int(b)) => a == b,
			(Number::Float(a), Number::Float(b)) => a == b,
			(Number::Int(a), Number::Float(b)) => (*a as f64) == *b,
			(Number::Float(a), Number::Int(b)) => *a == (*b as f64),
		}
	}
}

impl PartialOrd for Number {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		match (self, other) {
			(Number::Int(a), Number::Int(b)) => a.partial_cmp(b),
			(Number::Float(a), Number::Float(b)) => a.partial_cmp(b),
			(Number::Int(a), Number::Float(b)) => (*a as f64).partial_cmp(b),
			(Number::Float(a), Number::Int(b)) => a.partial_cmp(&(*b as f64)),
		}
	}
}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn parse_int() {
		assert_eq!(Number::try_from("2500"), Ok(Number::Int(2500)));
	}

	#[test]
	fn parse_float() {
		assert_eq!(Number::try_from("2.5"), Ok(Number::Float(2.5)));
	}

	#[test]
	fn parse_negative() {
		assert_eq!(Number::try_from("-13"), Ok(Number::Int(-13)));
	}

	#[test]
	fn parse_failure() {
		assert_eq!(Number::try_from("cat-987H1"), Err(()));
		assert_eq!(Number::try_from(""), Err(()));
		assert_eq!(Number::try_from("nan"), Err(()));
	}

	#[test]
	fn cross_variant_equality() {
		assert_eq!(Number::Int(3), Number::Float(3.0));
		assert_ne!(Number::Int(3), Number::Float(3.5));
	}

	#[test]
	fn cross_variant_ordering() {
		assert!(Number::Int(3) < Number::Float(3.5));
		assert!(Number::Float(4.5) > Number::Int(4));
	}

	#[test]
	fn add_promotes_on_overflow() {
		let out = Number::Int(i64::MAX).add(Number::Int(1));
		assert!(out.is_float());
	}

	#[test]
	fn add_keeps_integers() {
		assert_eq!(Number::Int(1).add(Number::Int(2)), Number::Int(3));
		assert_eq!(Number::Int(1).add(Number::Float(2.5)), Number::Float(3.5));
	}

	#[test]
	fn display_is_plain() {
		assert_eq!(Number::Int(42).to_string(), "42");
		assert_eq!(Number::Float(2.5).to_string(), "2.5");
		assert_eq!(Number::Float(3.0).to_string(), "3");
	}
}
