use crate::err::Error;
use crate::kvs::Key;
use crate::kvs::Val;
use std::ops::Range;

/// The contract of the ordered key-value store hosting the engine.
///
/// Each verb invocation runs inside exactly one transaction, which the
/// host guarantees to be atomic against the series key. The engine only
/// ever suspends at these call boundaries.
pub trait Transaction {
	/// Check if closed
	fn closed(&self) -> bool;
	/// Cancel a transaction
	async fn cancel(&mut self) -> Result<(), Error>;
	/// Commit a transaction
	async fn commit(&mut self) -> Result<(), Error>;
	/// Check if a key exists
	async fn exists<K>(&mut self, key: K) -> Result<bool, Error>
	where
		K: Into<Key>;
	/// Fetch a key from the store
	async fn get<K>(&mut self, key: K) -> Result<Option<Val>, Error>
	where
		K: Into<Key>;
	/// Insert or update a key in the store
	async fn set<K, V>(&mut self, key: K, val: V) -> Result<(), Error>
	where
		K: Into<Key>,
		V: Into<Val>;
	/// Delete a key from the store
	async fn del<K>(&mut self, key: K) -> Result<(), Error>
	where
		K: Into<Key>;
	/// Retrieve an ordered range of keys from the store
	async fn keys<K>(&mut self, rng: Range<K>, limit: u32) -> Result<Vec<Key>, Error>
	where
		K: Into<Key>;
	/// Retrieve an ordered range of keys and values from the store
	async fn scan<K>(&mut self, rng: Range<K>, limit: u32) -> Result<Vec<(Key, Val)>, Error>
	where
		K: Into<Key>;
}
