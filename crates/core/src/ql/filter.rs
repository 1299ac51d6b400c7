use crate::err::Error;
use crate::ql::number::Number;
use crate::ql::object::Object;
use crate::ql::value::Value;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// A compiled filter expression.
///
/// The surface grammar is a flat chain of conditions joined by `AND` and
/// `OR` with no precedence: the chain is applied as an in-order left fold
/// of the joins, so runs of a single join kind behave like an n-ary
/// conjunction or disjunction, and mixed chains evaluate strictly left to
/// right. Whether parenthesised grouping should be added remains open.
#[derive(Clone, Debug)]
pub struct Filter {
	head: Cond,
	tail: Vec<(Join, Cond)>,
}

#[derive(Clone, Copy, Debug)]
enum Join {
	And,
	Or,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Op {
	Eq,
	Ne,
	Gt,
	Ge,
	Lt,
	Le,
}

#[derive(Clone, Debug)]
enum Rhs {
	Scalar(String),
	Set(BTreeSet<String>),
}

#[derive(Clone, Debug)]
struct Cond {
	field: String,
	op: Op,
	rhs: Rhs,
}

/// Check whether a string is a valid field identifier
pub fn is_ident(s: &str) -> bool {
	let mut chars = s.chars();
	match chars.next() {
		Some(c) if c.is_ascii_alphabetic() || c == '_' => (),
		_ => return false,
	}
	chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Filter {
	/// Parse a filter expression token list
	pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Filter, Error> {
		let mut iter = tokens.iter().map(|t| t.as_ref());
		// The chain starts with a condition
		let head = match iter.next() {
			Some(t) => Cond::parse(t)?,
			None => return Err(Error::FilterParse(String::new())),
		};
		// Followed by any number of joined conditions
		let mut tail = Vec::new();
		while let Some(t) = iter.next() {
			let join = match t.to_lowercase().as_str() {
				"and" => Join::And,
				"or" => Join::Or,
				_ => return Err(Error::FilterParse(t.to_owned())),
			};
			let cond = match iter.next() {
				Some(t) => Cond::parse(t)?,
				None => return Err(Error::FilterParse(t.to_owned())),
			};
			tail.push((join, cond));
		}
		Ok(Filter {
			head,
			tail,
		})
	}

	/// Apply this filter to a decoded record
	pub fn matches(&self, obj: &Object) -> bool {
		let mut acc = self.head.matches(obj);
		for (join, cond) in &self.tail {
			acc = match join {
				Join::And => acc && cond.matches(obj),
				Join::Or => acc || cond.matches(obj),
			};
		}
		acc
	}
}

impl Cond {
	/// Parse a single condition token
	fn parse(token: &str) -> Result<Cond, Error> {
		// Scan the field identifier
		let idx = token
			.char_indices()
			.find(|(_, c)| !c.is_ascii_alphanumeric() && *c != '_')
			.map(|(i, _)| i)
			.unwrap_or(token.len());
		let field = &token[..idx];
		if !is_ident(field) {
			return Err(Error::FilterParse(token.to_owned()));
		}
		// Match the operator, longest first
		let rest = &token[idx..];
		let (op, rest) = if let Some(r) = rest.strip_prefix("!=") {
			(Op::Ne, r)
		} else if let Some(r) = rest.strip_prefix(">=") {
			(Op::Ge, r)
		} else if let Some(r) = rest.strip_prefix("<=") {
			(Op::Le, r)
		} else if let Some(r) = rest.strip_prefix('=') {
			(Op::Eq, r)
		} else if let Some(r) = rest.strip_prefix('>') {
			(Op::Gt, r)
		} else if let Some(r) = rest.strip_prefix('<') {
			(Op::Lt, r)
		} else {
			return Err(Error::FilterParse(token.to_owned()));
		};
		// A bracketed list forms a set membership condition
		let rhs = match (op, rest.strip_prefix('(').and_then(|r| r.strip_suffix(')'))) {
			(Op::Eq | Op::Ne, Some(list)) => Rhs::Set(parse_list(list, token)?),
			_ => Rhs::Scalar(rest.to_owned()),
		};
		Ok(Cond {
			field: field.to_owned(),
			op,
			rhs,
		})
	}

	/// Apply this condition to a decoded record
	fn matches(&self, obj: &Object) -> bool {
		// A missing field behaves as an explicit null
		let val = obj.get(&self.field).unwrap_or(&Value::Null);
		match &self.rhs {
			// Set membership stringifies the field value
			Rhs::Set(set) => match self.op {
				Op::Eq => set.contains(&val.stringify()),
				Op::Ne => !set.contains(&val.stringify()),
				_ => false,
			},
			// Null comparisons test for field absence
			Rhs::Scalar(rhs) if rhs == "null" => match self.op {
				Op::Eq => val.is_null(),
				Op::Ne => !val.is_null(),
				_ => false,
			},
			Rhs::Scalar(rhs) => {
				if val.is_null() {
					// Null never compares equal to a concrete scalar
					return self.op == Op::Ne;
				}
				// Numeric comparison when both sides parse as numbers
				let ord = match (val.as_number(), Number::try_from(rhs.as_str()).ok()) {
					(Some(a), Some(b)) => a.partial_cmp(&b),
					// Otherwise both sides compare as strings
					_ => Some(val.stringify().as_str().cmp(rhs.as_str())),
				};
				match ord {
					Some(ord) => match self.op {
						Op::Eq => ord == Ordering::Equal,
						Op::Ne => ord != Ordering::Equal,
						Op::Gt => ord == Ordering::Greater,
						Op::Ge => ord != Ordering::Less,
						Op::Lt => ord == Ordering::Less,
						Op::Le => ord != Ordering::Greater,
					},
					// Incomparable values fail the predicate
					None => false,
				}
			}
		}
	}
}

/// Parse a comma-separated membership list. Items may be double-quoted,
/// with a doubled quote escaping a literal quote character.
fn parse_list(list: &str, token: &str) -> Result<BTreeSet<String>, Error> {
	let mut out = BTreeSet::new();
	let mut chars = list.chars().peekable();
	loop {
		let mut item = String::new();
		match chars.peek() {
			// A quoted item runs to the closing quote
			Some('"') => {
				chars.next();
				loop {
					match chars.next() {
						Some('"') => match chars.peek() {
							// A doubled quote is a literal quote
							Some('"') => {
								chars.next();
								item.push('"');
							}
							_ => break,
						},
						Some(c) => item.push(c),
						None => return Err(Error::FilterParse(token.to_owned())),
					}
				}
				// Only a separator or the end may follow
				match chars.next() {
					Some(',') | None => (),
					Some(_) => return Err(Error::FilterParse(token.to_owned())),
				}
				out.insert(item);
				if chars.peek().is_none() {
					break;
				}
			}
			// An unquoted item runs to the next separator
			Some(_) => {
				let mut done = true;
				for c in chars.by_ref() {
					if c == ',' {
						done = false;
						break;
					}
					item.push(c);
				}
				out.insert(item);
				if done {
					break;
				}
			}
			None => break,
		}
	}
	Ok(out)
}
