use crate::cnf::{MAX_SCAN_KEYS, POINT_LOOKUP_LIMIT};
use crate::dbs::group::BucketCollector;
use crate::err::Error;
use crate::key::entry::{self, Entry};
use crate::key::range::{self, Bound};
use crate::key::{Hash, Series};
use crate::kvs::{Key, Transaction};
use crate::ql::filter::is_ident;
use crate::ql::{Array, Format, Limit, Number, Object, Options, Storage, Value};
use crate::rpc::format;
use crate::rpc::Method;

/// Executes one verb invocation against an open transaction.
///
/// Every verb runs the same linear pipeline: parse the arguments, issue
/// the minimal store call, then stream the raw entries through decode,
/// filter, project, aggregate and format, with an optional destructive
/// tail. Any fatal error aborts the whole verb; the caller cancels the
/// transaction so the store is left unchanged.
pub struct Executor<'a> {
	txn: &'a mut Transaction,
	/// The wall-clock second substituted for `*` tokens
	now: i64,
	/// The output format of this invocation
	format: Format,
}

impl<'a> Executor<'a> {
	pub fn new(txn: &'a mut Transaction, now: i64) -> Self {
		Self {
			txn,
			now,
			format: Format::Native,
		}
	}

	/// Route a parsed verb to its handler
	pub async fn dispatch(
		&mut self,
		method: Method,
		series: &str,
		args: &[&str],
	) -> Result<Value, Error> {
		let series = Series::new(series);
		let res = match method {
			Method::Add => self.add(&series, args).await,
			Method::Del => self.del(&series, args).await,
			Method::Set => self.set(&series, args).await,
			Method::IncrBy => self.incrby(&series, args).await,
			Method::Get => self.get(&series, args, false).await,
			Method::Pop => self.get(&series, args, true).await,
			Method::Size => self.size(&series, args).await,
			Method::Exists => self.exists(&series, args).await,
			Method::Span => self.span(&series, args).await,
			Method::Times => self.times(&series, args).await,
			Method::Count => self.count(&series, args).await,
			Method::Range => self.range(&series, args, false, false).await,
			Method::RevRange => self.range(&series, args, true, false).await,
			Method::PopRange => self.range(&series, args, false, true).await,
			Method::RemRange => self.remrange(&series, args).await,
			// Copy routes through its own entry point, and unknown
			// verbs are rejected before dispatch
			Method::Copy | Method::Unknown => {
				Err(Error::UnknownCommand(method.to_str().to_owned()))
			}
		}?;
		format::apply(self.format, res)
	}

	// -----------------------------------
	// Argument helpers
	// -----------------------------------

	/// Parse a timestamp argument. The `*` token resolves to the
	/// current wall-clock second.
	fn parse_ts(&self, token: &str) -> Result<i64, Error> {
		match token {
			"*" => Ok(self.now),
			_ => token
				.parse::<i64>()
				.map_err(|_| Error::InvalidTimestamp(token.to_owned())),
		}
	}

	/// Parse alternating field/value argument pairs, in argument order
	fn parse_pairs(args: &[&str], verb: &'static str) -> Result<Vec<(String, Value)>, Error> {
		if args.is_empty() || args.len() % 2 != 0 {
			return Err(Error::Arity(verb));
		}
		let mut out = Vec::with_capacity(args.len() / 2);
		for pair in args.chunks(2) {
			if !is_ident(pair[0]) {
				return Err(Error::InvalidFieldName(pair[0].to_owned()));
			}
			out.push((pair[0].to_owned(), Value::parse_arg(pair[1])));
		}
		Ok(out)
	}

	/// Parse a pair of range bound arguments
	fn parse_bounds(&self, lo: &str, hi: &str) -> Result<(Bound, Bound), Error> {
		let lo = Bound::parse(lo)?.resolve(self.now);
		let hi = Bound::parse(hi)?.resolve(self.now);
		Ok((lo, hi))
	}

	// -----------------------------------
	// Store helpers
	// -----------------------------------

	/// Fetch the raw entry keys of a translated range, in scan order
	async fn fetch(
		&mut self,
		series: &Series<'_>,
		lo: &Bound,
		hi: &Bound,
	) -> Result<Vec<Key>, Error> {
		let rng = range::translate(series, lo, hi);
		// A reversed pair translates to a degenerate range
		if rng.start >= rng.end {
			return Ok(Vec::new());
		}
		self.txn.keys(rng, *MAX_SCAN_KEYS).await
	}

	/// Look up the single entry key of a timestamp. More than one match
	/// violates the uniqueness invariant and is fatal.
	async fn point(&mut self, series: &Series<'_>, ts: i64) -> Result<Option<Key>, Error> {
		let rng = range::point(series, ts);
		let mut keys = self.txn.keys(rng, POINT_LOOKUP_LIMIT).await?;
		match keys.len() {
			0 => Ok(None),
			1 => Ok(Some(keys.remove(0))),
			_ => Err(Error::DuplicateEntry(ts)),
		}
	}

	/// Replace any existing entry for a timestamp with a new record
	async fn upsert(&mut self, series: &Series<'_>, ts: i64, fields: &Object) -> Result<(), Error> {
		if let Some(key) = self.point(series, ts).await? {
			self.txn.del(key).await?;
		}
		let member = entry::encode(ts, fields)?;
		self.txn.set(series.entry(&member), Vec::new()).await
	}

	/// Apply the pagination window to a raw scan, before any filtering
	fn window(keys: Vec<Key>, limit: Option<Limit>, rev: bool) -> Vec<Key> {
		let mut keys = keys;
		if rev {
			keys.reverse();
		}
		match limit {
			Some(l) => keys
				.into_iter()
				.skip(l.offset)
				.take(l.count.unwrap_or(usize::MAX))
				.collect(),
			None => keys,
		}
	}

	/// Decode a windowed key list, dropping entries the filter rejects.
	/// Returns each surviving raw key alongside its decoded entry.
	fn decode_filtered(
		series: &Series<'_>,
		keys: Vec<Key>,
		opts: &Options,
	) -> Result<Vec<(Key, Entry)>, Error> {
		let mut out = Vec::with_capacity(keys.len());
		for key in keys {
			let entry = entry::decode(series.member(&key))?;
			if let Some(filter) = &opts.filter {
				if !filter.matches(&entry.fields) {
					continue;
				}
			}
			out.push((key, entry));
		}
		Ok(out)
	}

	// -----------------------------------
	// Verb handlers
	// -----------------------------------

	/// add: insert or replace one entry, returning its timestamp
	async fn add(&mut self, series: &Series<'_>, args: &[&str]) -> Result<Value, Error> {
		let (ts, pairs) = match args.split_first() {
			Some((ts, pairs)) => (self.parse_ts(ts)?, Self::parse_pairs(pairs, "ADD")?),
			None => return Err(Error::Arity("ADD")),
		};
		let fields: Object = pairs.into_iter().collect();
		self.upsert(series, ts, &fields).await?;
		Ok(Value::from(ts))
	}

	/// del: remove entries by timestamp, returning how many existed
	async fn del(&mut self, series: &Series<'_>, args: &[&str]) -> Result<Value, Error> {
		if args.is_empty() {
			return Err(Error::Arity("DEL"));
		}
		let mut removed = 0;
		for token in args {
			let ts = self.parse_ts(token)?;
			if let Some(key) = self.point(series, ts).await? {
				self.txn.del(key).await?;
				removed += 1;
			}
		}
		Ok(Value::from(removed))
	}

	/// set: merge fields into an entry, creating it when missing
	async fn set(&mut self, series: &Series<'_>, args: &[&str]) -> Result<Value, Error> {
		let (ts, pairs) = match args.split_first() {
			Some((ts, pairs)) => (self.parse_ts(ts)?, Self::parse_pairs(pairs, "SET")?),
			None => return Err(Error::Arity("SET")),
		};
		// Start from the stored record where one exists
		let mut fields = match self.point(series, ts).await? {
			Some(key) => {
				let entry = entry::decode(series.member(&key))?;
				self.txn.del(key).await?;
				entry.fields
			}
			None => Object::new(),
		};
		fields.merge(pairs.into_iter().collect());
		let member = entry::encode(ts, &fields)?;
		self.txn.set(series.entry(&member), Vec::new()).await?;
		Ok(Value::Null)
	}

	/// incrBy: increment numeric fields, returning the new values in
	/// argument order
	async fn incrby(&mut self, series: &Series<'_>, args: &[&str]) -> Result<Value, Error> {
		let (ts, pairs) = match args.split_first() {
			Some((ts, pairs)) => (self.parse_ts(ts)?, Self::parse_pairs(pairs, "INCRBY")?),
			None => return Err(Error::Arity("INCRBY")),
		};
		// A missing entry increments from an empty record
		let (old, mut fields) = match self.point(series, ts).await? {
			Some(key) => {
				let entry = entry::decode(series.member(&key))?;
				(Some(key), entry.fields)
			}
			None => (None, Object::new()),
		};
		let mut out = Array::with_capacity(pairs.len());
		for (name, delta) in pairs {
			let delta = match delta.as_number() {
				Some(n) => n,
				None => return Err(Error::IncrementValue),
			};
			// A missing field increments from zero
			let current = match fields.get(&name) {
				Some(v) => match v.as_number() {
					Some(n) => n,
					None => return Err(Error::FieldNotANumber(name)),
				},
				None => Number::Int(0),
			};
			let next = current.add(delta);
			fields.insert(name, Value::Number(next));
			out.push(Value::Number(next));
		}
		if let Some(key) = old {
			self.txn.del(key).await?;
		}
		let member = entry::encode(ts, &fields)?;
		self.txn.set(series.entry(&member), Vec::new()).await?;
		Ok(Value::Array(out))
	}

	/// get / pop: point lookup, with pop removing the entry afterwards
	async fn get(
		&mut self,
		series: &Series<'_>,
		args: &[&str],
		pop: bool,
	) -> Result<Value, Error> {
		let (ts, rest) = match args.split_first() {
			Some((ts, rest)) => (self.parse_ts(ts)?, rest),
			None => return Err(Error::Arity(if pop { "POP" } else { "GET" })),
		};
		let opts = Options::parse(rest)?;
		self.format = opts.format;
		let key = match self.point(series, ts).await? {
			Some(key) => key,
			// A missing entry is empty, not an error
			None => return Ok(Value::Null),
		};
		let entry = entry::decode(series.member(&key))?;
		if pop {
			self.txn.del(key).await?;
		}
		Ok(Value::Object(opts.project(&entry.fields)))
	}

	/// size: the number of entries in the series
	async fn size(&mut self, series: &Series<'_>, args: &[&str]) -> Result<Value, Error> {
		if !args.is_empty() {
			return Err(Error::Arity("SIZE"));
		}
		let keys = self.fetch(series, &Bound::Min, &Bound::Max).await?;
		Ok(Value::from(keys.len()))
	}

	/// exists: whether an entry exists for a timestamp
	async fn exists(&mut self, series: &Series<'_>, args: &[&str]) -> Result<Value, Error> {
		let ts = match args {
			[ts] => self.parse_ts(ts)?,
			_ => return Err(Error::Arity("EXISTS")),
		};
		let found = self.point(series, ts).await?.is_some();
		Ok(Value::from(found as i64))
	}

	/// span: the smallest and largest stored timestamps
	async fn span(&mut self, series: &Series<'_>, args: &[&str]) -> Result<Value, Error> {
		if !args.is_empty() {
			return Err(Error::Arity("SPAN"));
		}
		let keys = self.fetch(series, &Bound::Min, &Bound::Max).await?;
		let (first, last) = match (keys.first(), keys.last()) {
			(Some(first), Some(last)) => (first, last),
			_ => return Ok(Value::Array(Array::new())),
		};
		let min = entry::decode_ts(series.member(first))?;
		let max = entry::decode_ts(series.member(last))?;
		Ok(Value::from(vec![Value::from(min), Value::from(max)]))
	}

	/// times: the timestamps of a range, oldest first
	async fn times(&mut self, series: &Series<'_>, args: &[&str]) -> Result<Value, Error> {
		let (lo, hi, rest) = match args {
			[] => (Bound::Min, Bound::Max, &[][..]),
			[lo, hi, rest @ ..] => {
				let (lo, hi) = self.parse_bounds(lo, hi)?;
				(lo, hi, rest)
			}
			_ => return Err(Error::Arity("TIMES")),
		};
		let opts = Options::parse(rest)?;
		self.format = opts.format;
		let keys = Self::window(self.fetch(series, &lo, &hi).await?, opts.limit, false);
		// Without a filter the timestamp prefix alone is enough
		let out: Array = match opts.filter.is_some() {
			true => Self::decode_filtered(series, keys, &opts)?
				.into_iter()
				.map(|(_, e)| Value::from(e.ts))
				.collect(),
			false => {
				let mut out = Array::with_capacity(keys.len());
				for key in &keys {
					out.push(Value::from(entry::decode_ts(series.member(key))?));
				}
				out
			}
		};
		Ok(Value::Array(out))
	}

	/// count: the number of entries in a range
	async fn count(&mut self, series: &Series<'_>, args: &[&str]) -> Result<Value, Error> {
		let (lo, hi, rest) = match args {
			[lo, hi, rest @ ..] => {
				let (lo, hi) = self.parse_bounds(lo, hi)?;
				(lo, hi, rest)
			}
			_ => return Err(Error::Arity("COUNT")),
		};
		let opts = Options::parse(rest)?;
		let keys = Self::window(self.fetch(series, &lo, &hi).await?, opts.limit, false);
		// Without a filter this is a bare key count
		let count = match opts.filter.is_some() {
			true => Self::decode_filtered(series, keys, &opts)?.len(),
			false => keys.len(),
		};
		Ok(Value::from(count))
	}

	/// range / revrange / poprange: the query pipeline over a range
	async fn range(
		&mut self,
		series: &Series<'_>,
		args: &[&str],
		rev: bool,
		destructive: bool,
	) -> Result<Value, Error> {
		let (lo, hi, rest) = match args {
			[lo, hi, rest @ ..] => {
				let (lo, hi) = self.parse_bounds(lo, hi)?;
				(lo, hi, rest)
			}
			_ => {
				return Err(Error::Arity(match (rev, destructive) {
					(true, _) => "REVRANGE",
					(_, true) => "POPRANGE",
					_ => "RANGE",
				}))
			}
		};
		let opts = Options::parse(rest)?;
		self.format = opts.format;
		// Fetch, window, decode and filter the raw entries
		let keys = Self::window(self.fetch(series, &lo, &hi).await?, opts.limit, rev);
		let entries = Self::decode_filtered(series, keys, &opts)?;
		// Project each record before output or aggregation
		let out = match &opts.aggregation {
			Some(agg) => {
				let mut col = BucketCollector::new(agg);
				for (_, entry) in &entries {
					col.push(entry.ts, &opts.project(&entry.fields));
				}
				Value::Array(col.output())
			}
			None => Value::Array(
				entries
					.iter()
					.map(|(_, entry)| {
						Value::from(vec![
							Value::from(entry.ts),
							Value::Object(opts.project(&entry.fields)),
						])
					})
					.collect(),
			),
		};
		// The destructive tail removes exactly the consumed raw keys,
		// after the result has been materialized
		if destructive {
			for (key, _) in entries {
				self.txn.del(key).await?;
			}
		}
		Ok(out)
	}

	/// remrange: remove the entries of a range, returning how many
	async fn remrange(&mut self, series: &Series<'_>, args: &[&str]) -> Result<Value, Error> {
		let (lo, hi, rest) = match args {
			[lo, hi, rest @ ..] => {
				let (lo, hi) = self.parse_bounds(lo, hi)?;
				(lo, hi, rest)
			}
			_ => return Err(Error::Arity("REMRANGE")),
		};
		let opts = Options::parse(rest)?;
		let keys = Self::window(self.fetch(series, &lo, &hi).await?, opts.limit, false);
		// Without a filter the raw keys are removed without decoding
		let targets: Vec<Key> = match opts.filter.is_some() {
			true => Self::decode_filtered(series, keys, &opts)?
				.into_iter()
				.map(|(key, _)| key)
				.collect(),
			false => keys,
		};
		let removed = targets.len();
		for key in targets {
			self.txn.del(key).await?;
		}
		Ok(Value::from(removed))
	}

	/// copy: materialize a queried slice of the source series into a
	/// destination key, returning how many entries were written
	pub async fn copy(
		&mut self,
		source: &str,
		dest: &str,
		args: &[&str],
	) -> Result<Value, Error> {
		let src = Series::new(source);
		let (lo, hi, rest) = match args {
			[lo, hi, rest @ ..] => {
				let (lo, hi) = self.parse_bounds(lo, hi)?;
				(lo, hi, rest)
			}
			_ => return Err(Error::Arity("COPY")),
		};
		let opts = Options::parse(rest)?;
		self.format = opts.format;
		let keys = Self::window(self.fetch(&src, &lo, &hi).await?, opts.limit, false);
		// A trivial timeseries copy moves the raw members undecoded
		let trivial = opts.filter.is_none()
			&& opts.aggregation.is_none()
			&& opts.labels.is_none()
			&& opts.redact.is_none();
		if trivial && opts.storage == Storage::Timeseries {
			let dst = Series::new(dest);
			let count = keys.len();
			for key in keys {
				let member = src.member(&key).to_vec();
				// Remove any destination entry with the same timestamp
				let ts = entry::decode_ts(&member)?;
				if let Some(old) = self.point(&dst, ts).await? {
					self.txn.del(old).await?;
				}
				self.txn.set(dst.entry(&member), Vec::new()).await?;
			}
			let out = Value::from(count);
			return format::apply(self.format, out);
		}
		// Otherwise run the full pipeline before writing
		let entries = Self::decode_filtered(&src, keys, &opts)?;
		let records: Vec<(i64, Object)> = match &opts.aggregation {
			Some(agg) => {
				let mut col = BucketCollector::new(agg);
				for (_, entry) in &entries {
					col.push(entry.ts, &opts.project(&entry.fields));
				}
				col.output_flat()?
			}
			None => entries
				.iter()
				.map(|(_, entry)| (entry.ts, opts.project(&entry.fields)))
				.collect(),
		};
		let count = records.len();
		match opts.storage {
			Storage::Timeseries => {
				let dst = Series::new(dest);
				for (ts, fields) in records {
					self.upsert(&dst, ts, &fields).await?;
				}
			}
			Storage::Hash => {
				let dst = Hash::new(dest);
				for (ts, fields) in records {
					let val = serde_json::to_string(&Value::Object(fields))?;
					self.txn.set(dst.field(&ts.to_string()), val.into_bytes()).await?;
				}
			}
		}
		let out = Value::from(count);
		format::apply(self.format, out)
	}
}
