use once_cell::sync::Lazy;

/// Specifies the maximum number of keys fetched from the underlying
/// key-value store in a single range scan. Scans past this limit are
/// truncated, so this acts as a safety valve for runaway queries.
pub static MAX_SCAN_KEYS: Lazy<u32> = lazy_env_parse!("TIMELEX_MAX_SCAN_KEYS", u32, u32::MAX);

/// Store-side limit for point lookups. One extra key is always requested
/// so that a duplicate entry for a timestamp can be detected.
pub const POINT_LOOKUP_LIMIT: u32 = 2;

/// The field targeted by legacy aggregation specifications which do not
/// name a field explicitly.
pub const IMPLICIT_FIELD: &str = "value";
