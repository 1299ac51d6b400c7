//! The datastore layer: the host-store contract, the in-memory backend,
//! and the public entry points of the engine.

pub mod api;
mod clock;
mod mem;

pub use self::clock::FakeClock;
pub use self::clock::SizedClock;
pub use self::clock::SystemClock;

use self::api::Transaction as _;
use crate::dbs::Executor;
use crate::err::Error;
use crate::ql::Value;
use crate::rpc::Method;
use std::ops::Range;

/// The key part of a key-value pair. An alias for byte keys
pub type Key = Vec<u8>;

/// The value part of a key-value pair. An alias for byte values
pub type Val = Vec<u8>;

/// Behaviour when a writeable transaction is dropped unfinished
#[allow(dead_code)]
pub(crate) enum Check {
	None,
	Warn,
	Panic,
}

/// The datastore hosting one or more series.
///
/// This owns the underlying ordered key-value store and the wall clock,
/// and exposes the engine's command surface: every verb is invoked as
/// `(series_key, verb, *args)` through [`Datastore::execute`], except
/// `copy`, which takes two keys through [`Datastore::execute_copy`].
#[non_exhaustive]
pub struct Datastore {
	inner: Inner,
	clock: SizedClock,
}

enum Inner {
	#[cfg(feature = "kv-mem")]
	Mem(mem::Datastore),
}

/// A single transaction against the datastore
#[non_exhaustive]
pub struct Transaction {
	inner: InnerTx,
}

enum InnerTx {
	#[cfg(feature = "kv-mem")]
	Mem(mem::Transaction),
}

impl Datastore {
	/// Open a new in-memory datastore
	#[cfg(feature = "kv-mem")]
	pub fn new() -> Datastore {
		info!("Starting kvs store in memory");
		Datastore {
			inner: Inner::Mem(mem::Datastore::new()),
			clock: SizedClock::default(),
		}
	}

	/// Replace the wall clock, for deterministic `*` bounds in tests
	pub fn with_clock(mut self, clock: SizedClock) -> Datastore {
		self.clock = clock;
		self
	}

	/// Start a new transaction
	pub async fn transaction(&self, write: bool) -> Result<Transaction, Error> {
		match &self.inner {
			#[cfg(feature = "kv-mem")]
			Inner::Mem(v) => {
				let tx = v.transaction(write).await?;
				Ok(Transaction {
					inner: InnerTx::Mem(tx),
				})
			}
		}
	}

	/// Execute a verb against a series.
	///
	/// The invocation runs inside one transaction: it is committed when
	/// the verb succeeds, and cancelled, leaving the store unchanged,
	/// when any step fails.
	pub async fn execute(&self, series: &str, verb: &str, args: &[&str]) -> Result<Value, Error> {
		// Parse the verb name against the command table
		let method = Method::parse(verb);
		if !method.is_valid() {
			return Err(Error::UnknownCommand(verb.to_owned()));
		}
		// The copy verb takes two keys and has its own entry point
		if matches!(method, Method::Copy) {
			return Err(Error::Arity("COPY"));
		}
		debug!("Executing {} on series {series}", method.to_str());
		// Resolve the wall clock before the invocation begins
		let now = self.clock.now().await;
		// Create a new transaction for this invocation
		let mut txn = self.transaction(method.writeable()).await?;
		// Run the verb pipeline
		let res = Executor::new(&mut txn, now).dispatch(method, series, args).await;
		// Commit on success, or leave the store unchanged
		self.finish(txn, method.writeable(), res).await
	}

	/// Execute the copy verb, materializing a queried slice of a source
	/// series into a destination key.
	pub async fn execute_copy(
		&self,
		source: &str,
		dest: &str,
		args: &[&str],
	) -> Result<Value, Error> {
		debug!("Executing copy from series {source} to {dest}");
		// Resolve the wall clock before the invocation begins
		let now = self.clock.now().await;
		// Create a new transaction for this invocation
		let mut txn = self.transaction(true).await?;
		// Run the copy pipeline
		let res = Executor::new(&mut txn, now).copy(source, dest, args).await;
		// Commit on success, or leave the store unchanged
		self.finish(txn, true, res).await
	}

	/// Close out an invocation transaction
	async fn finish(
		&self,
		mut txn: Transaction,
		write: bool,
		res: Result<Value, Error>,
	) -> Result<Value, Error> {
		match res {
			Ok(val) => {
				match write {
					true => txn.commit().await?,
					false => txn.cancel().await?,
				}
				Ok(val)
			}
			Err(e) => {
				// Surface the original failure even if the rollback fails
				let _ = txn.cancel().await;
				Err(e)
			}
		}
	}
}

#[cfg(feature = "kv-mem")]
impl Default for Datastore {
	fn default() -> Self {
		Self::new()
	}
}

impl Transaction {
	/// Check if closed
	pub fn closed(&self) -> bool {
		match &self.inner {
			#[cfg(feature = "kv-mem")]
			InnerTx::Mem(v) => v.closed(),
		}
	}

	/// Cancel a transaction
	pub async fn cancel(&mut self) -> Result<(), Error> {
		match &mut self.inner {
			#[cfg(feature = "kv-mem")]
			InnerTx::Mem(v) => v.cancel().await,
		}
	}

	/// Commit a transaction
	pub async fn commit(&mut self) -> Result<(), Error> {
		match &mut self.inner {
			#[cfg(feature = "kv-mem")]
			InnerTx::Mem(v) => v.commit().await,
		}
	}

	/// Check if a key exists
	pub async fn exists<K>(&mut self, key: K) -> Result<bool, Error>
	where
		K: Into<Key>,
	{
		match &mut self.inner {
			#[cfg(feature = "kv-mem")]
			InnerTx::Mem(v) => v.exists(key).await,
		}
	}

	/// Fetch a key from the store
	pub async fn get<K>(&mut self, key: K) -> Result<Option<Val>, Error>
	where
		K: Into<Key>,
	{
		match &mut self.inner {
			#[cfg(feature = "kv-mem")]
			InnerTx::Mem(v) => v.get(key).await,
		}
	}

	/// Insert or update a key in the store
	pub async fn set<K, V>(&mut self, key: K, val: V) -> Result<(), Error>
	where
		K: Into<Key>,
		V: Into<Val>,
	{
		match &mut self.inner {
			#[cfg(feature = "kv-mem")]
			InnerTx::Mem(v) => v.set(key, val).await,
		}
	}

	/// Delete a key from the store
	pub async fn del<K>(&mut self, key: K) -> Result<(), Error>
	where
		K: Into<Key>,
	{
		match &mut self.inner {
			#[cfg(feature = "kv-mem")]
			InnerTx::Mem(v) => v.del(key).await,
		}
	}

	/// Retrieve an ordered range of keys from the store
	pub async fn keys<K>(&mut self, rng: Range<K>, limit: u32) -> Result<Vec<Key>, Error>
	where
		K: Into<Key>,
	{
		match &mut self.inner {
			#[cfg(feature = "kv-mem")]
			InnerTx::Mem(v) => v.keys(rng, limit).await,
		}
	}

	/// Retrieve an ordered range of keys and values from the store
	pub async fn scan<K>(&mut self, rng: Range<K>, limit: u32) -> Result<Vec<(Key, Val)>, Error>
	where
		K: Into<Key>,
	{
		match &mut self.inner {
			#[cfg(feature = "kv-mem")]
			InnerTx::Mem(v) => v.scan(rng, limit).await,
		}
	}
}
