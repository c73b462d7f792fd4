use std::{hash::Hash, num::NonZeroUsize, sync::Mutex};

use lru::LruCache;

/// Shared read-through cache for query results.
///
/// Values are handed out by clone, so `V` is expected to be a cheap shared handle such as
/// `Arc<[T]>`. Callers must copy out of the handle before changing anything.
pub struct QueryCache<K, V> {
	entries: Mutex<LruCache<K, V>>,
}
impl<K, V> QueryCache<K, V>
where
	K: Hash + Eq,
	V: Clone,
{
	pub fn new(max_entries: usize) -> Self {
		let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);

		Self { entries: Mutex::new(LruCache::new(capacity)) }
	}

	pub fn get(&self, key: &K) -> Option<V> {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.get(key).cloned()
	}

	pub fn insert(&self, key: K, value: V) {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.put(key, value);
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the cached value for `key`, or runs `load` and caches what it returns.
	///
	/// Concurrent misses on the same key may both load; the later insert wins.
	pub async fn get_or_load<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<V, E>>,
	{
		if let Some(value) = self.get(&key) {
			tracing::trace!("Query cache hit.");

			return Ok(value);
		}

		let value = load().await?;

		self.insert(key, value.clone());

		Ok(value)
	}
}
