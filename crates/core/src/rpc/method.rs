/// The verbs of the engine's command surface.
///
/// Dispatch goes through a single table keyed by the normalized verb
/// name; there is no other process-wide state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum Method {
	Unknown,
	Add,
	Del,
	Set,
	IncrBy,
	Get,
	Pop,
	Size,
	Exists,
	Span,
	Times,
	Count,
	Range,
	RevRange,
	PopRange,
	RemRange,
	Copy,
}

impl Method {
	/// Parse a case-insensitive verb name
	pub fn parse<S>(s: S) -> Self
	where
		S: AsRef<str>,
	{
		match s.as_ref().to_lowercase().as_str() {
			"add" => Self::Add,
			"del" => Self::Del,
			"set" => Self::Set,
			"incrby" => Self::IncrBy,
			"get" => Self::Get,
			"pop" => Self::Pop,
			"size" => Self::Size,
			"exists" => Self::Exists,
			"span" => Self::Span,
			"times" => Self::Times,
			"count" => Self::Count,
			"range" => Self::Range,
			"revrange" => Self::RevRange,
			"poprange" => Self::PopRange,
			"remrange" => Self::RemRange,
			"copy" => Self::Copy,
			_ => Self::Unknown,
		}
	}

	pub fn to_str(&self) -> &str {
		match self {
			Self::Unknown => "unknown",
			Self::Add => "add",
			Self::Del => "del",
			Self::Set => "set",
			Self::IncrBy => "incrby",
			Self::Get => "get",
			Self::Pop => "pop",
			Self::Size => "size",
			Self::Exists => "exists",
			Self::Span => "span",
			Self::Times => "times",
			Self::Count => "count",
			Self::Range => "range",
			Self::RevRange => "revrange",
			Self::PopRange => "poprange",
			Self::RemRange => "remrange",
			Self::Copy => "copy",
		}
	}

	/// Check whether this is a recognized verb
	pub fn is_valid(&self) -> bool {
		!matches!(self, Self::Unknown)
	}

	/// Check whether this verb can write to the store
	pub fn writeable(&self) -> bool {
		matches!(
			self,
			Self::Add
				| Self::Del | Self::Set
				| Self::IncrBy | Self::Pop
				| Self::PopRange | Self::RemRange
				| Self::Copy
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_is_case_insensitive() {
		assert_eq!(Method::parse("INCRBY"), Method::IncrBy);
		assert_eq!(Method::parse("RevRange"), Method::RevRange);
		assert_eq!(Method::parse("add"), Method::Add);
	}

	#[test]
	fn unknown_verbs_are_invalid() {
		assert!(!Method::parse("truncate").is_valid());
		assert!(Method::parse("span").is_valid());
	}

	#[test]
	fn destructive_verbs_are_writeable() {
		assert!(Method::parse("pop").writeable());
		assert!(Method::parse("poprange").writeable());
		assert!(!Method::parse("range").writeable());
		assert!(!Method::parse("count").writeable());
	}
}
