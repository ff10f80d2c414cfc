use std::{
	collections::HashMap,
	future::Future,
	hash::Hash,
	sync::{Arc, Mutex},
	time::Duration,
};

use tokio::{sync::OnceCell, time::Instant};

/// Time-boxed memoization keyed by the exact call arguments.
///
/// Values expire `ttl` after they were produced. The map holds at most `capacity` keys; when it
/// is full, expired entries go first, then the least recently used one. Concurrent callers for
/// the same key share a single in-flight fill. Failed fills are not cached.
pub struct ResponseCache<K, V> {
	ttl: Duration,
	capacity: usize,
	state: Mutex<CacheState<K, V>>,
}

struct CacheState<K, V> {
	entries: HashMap<K, Slot<V>>,
	tick: u64,
}

struct Slot<V> {
	cell: Arc<OnceCell<(V, Instant)>>,
	last_used: u64,
}
impl<V> Slot<V> {
	fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
		self.cell.get().map(|(_, filled_at)| now.duration_since(*filled_at) >= ttl).unwrap_or(false)
	}
}

impl<K, V> ResponseCache<K, V>
where
	K: Hash + Eq + Clone,
	V: Clone,
{
	pub fn new(ttl: Duration, capacity: usize) -> Self {
		Self {
			ttl,
			capacity: capacity.max(1),
			state: Mutex::new(CacheState { entries: HashMap::new(), tick: 0 }),
		}
	}

	pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, fill: F) -> Result<V, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<V, E>>,
	{
		let cell = self.slot(key.clone());
		let filled = cell
			.get_or_try_init(|| async move { fill().await.map(|value| (value, Instant::now())) })
			.await;

		match filled {
			Ok((value, _)) => Ok(value.clone()),
			Err(err) => {
				self.discard_empty(&key, &cell);

				Err(err)
			},
		}
	}

	pub fn len(&self) -> usize {
		self.state.lock().unwrap_or_else(|err| err.into_inner()).entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	// A failed fill must not hold capacity. Another caller may have replaced or filled the slot
	// since, in which case it stays.
	fn discard_empty(&self, key: &K, cell: &Arc<OnceCell<(V, Instant)>>) {
		let mut state = self.state.lock().unwrap_or_else(|err| err.into_inner());

		if let Some(slot) = state.entries.get(key)
			&& Arc::ptr_eq(&slot.cell, cell)
			&& !slot.cell.initialized()
		{
			state.entries.remove(key);
		}
	}

	fn slot(&self, key: K) -> Arc<OnceCell<(V, Instant)>> {
		let now = Instant::now();
		let mut guard = self.state.lock().unwrap_or_else(|err| err.into_inner());
		let state = &mut *guard;

		state.tick += 1;

		let tick = state.tick;

		if let Some(slot) = state.entries.get_mut(&key)
			&& !slot.is_expired(now, self.ttl)
		{
			slot.last_used = tick;

			return slot.cell.clone();
		}

		state.entries.remove(&key);

		if state.entries.len() >= self.capacity {
			state.entries.retain(|_, slot| !slot.is_expired(now, self.ttl));
		}
		if state.entries.len() >= self.capacity
			&& let Some(oldest) = state
				.entries
				.iter()
				.min_by_key(|(_, slot)| slot.last_used)
				.map(|(key, _)| key.clone())
		{
			state.entries.remove(&oldest);
		}

		let cell = Arc::new(OnceCell::new());

		state.entries.insert(key, Slot { cell: cell.clone(), last_used: tick });

		cell
	}
}

#[cfg(test)]
mod tests {
	use std::{
		convert::Infallible,
		sync::atomic::{AtomicUsize, Ordering},
	};

	use super::*;

	async fn counted(
		cache: &ResponseCache<String, usize>,
		key: &str,
		calls: &AtomicUsize,
	) -> usize {
		cache
			.get_or_try_insert_with(key.to_string(), || async {
				Ok::<_, Infallible>(calls.fetch_add(1, Ordering::SeqCst) + 1)
			})
			.await
			.unwrap_or_else(|never| match never {})
	}

	#[tokio::test(start_paused = true)]
	async fn reuses_value_within_ttl_and_refills_after_expiry() {
		let cache = ResponseCache::new(Duration::from_secs(3_600), 8);
		let calls = AtomicUsize::new(0);

		assert_eq!(counted(&cache, "fever", &calls).await, 1);
		assert_eq!(counted(&cache, "fever", &calls).await, 1);

		tokio::time::advance(Duration::from_secs(3_599)).await;

		assert_eq!(counted(&cache, "fever", &calls).await, 1);

		tokio::time::advance(Duration::from_secs(1)).await;

		assert_eq!(counted(&cache, "fever", &calls).await, 2);
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn keys_match_exactly() {
		let cache = ResponseCache::new(Duration::from_secs(60), 8);
		let calls = AtomicUsize::new(0);

		counted(&cache, "fever", &calls).await;
		counted(&cache, "fever ", &calls).await;
		counted(&cache, "Fever", &calls).await;

		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn errors_are_not_cached() {
		let cache: ResponseCache<u8, u8> = ResponseCache::new(Duration::from_secs(60), 8);
		let calls = AtomicUsize::new(0);
		let first = cache
			.get_or_try_insert_with(1, || async {
				calls.fetch_add(1, Ordering::SeqCst);

				Err::<u8, &str>("boom")
			})
			.await;

		assert_eq!(first, Err("boom"));

		let second = cache
			.get_or_try_insert_with(1, || async {
				calls.fetch_add(1, Ordering::SeqCst);

				Ok::<u8, &str>(7)
			})
			.await;

		assert_eq!(second, Ok(7));
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn failed_fills_do_not_evict_cached_values() {
		let cache = ResponseCache::new(Duration::from_secs(60), 2);
		let calls = AtomicUsize::new(0);

		assert!(cache.is_empty());

		counted(&cache, "good", &calls).await;

		for key in ["bad1", "bad2"] {
			let failed = cache
				.get_or_try_insert_with(key.to_string(), || async { Err::<usize, &str>("down") })
				.await;

			assert_eq!(failed, Err("down"));
		}

		assert_eq!(cache.len(), 1);
		assert_eq!(counted(&cache, "good", &calls).await, 1);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn full_cache_drops_expired_entries_before_lru() {
		let cache = ResponseCache::new(Duration::from_secs(60), 2);
		let calls = AtomicUsize::new(0);

		counted(&cache, "old", &calls).await;
		tokio::time::advance(Duration::from_secs(30)).await;
		counted(&cache, "recent", &calls).await;
		tokio::time::advance(Duration::from_secs(31)).await;
		// "old" has expired; "recent" is now the least recently used live entry.
		counted(&cache, "new", &calls).await;

		assert_eq!(cache.len(), 2);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
		assert_eq!(counted(&cache, "recent", &calls).await, 2);
		assert_eq!(counted(&cache, "new", &calls).await, 3);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
		assert_eq!(counted(&cache, "old", &calls).await, 4);
	}

	#[tokio::test(start_paused = true)]
	async fn evicts_least_recently_used_when_full() {
		let cache = ResponseCache::new(Duration::from_secs(60), 2);
		let calls = AtomicUsize::new(0);

		counted(&cache, "a", &calls).await;
		counted(&cache, "b", &calls).await;
		counted(&cache, "a", &calls).await;
		counted(&cache, "c", &calls).await;

		assert_eq!(cache.len(), 2);
		assert_eq!(calls.load(Ordering::SeqCst), 3);

		// "b" was the least recently used entry.
		counted(&cache, "b", &calls).await;

		assert_eq!(calls.load(Ordering::SeqCst), 4);

		counted(&cache, "c", &calls).await;

		assert_eq!(calls.load(Ordering::SeqCst), 4);
	}

	#[tokio::test(start_paused = true)]
	async fn concurrent_callers_share_one_fill() {
		let cache = Arc::new(ResponseCache::new(Duration::from_secs(60), 8));
		let calls = Arc::new(AtomicUsize::new(0));
		let mut tasks = Vec::new();

		for _ in 0..4 {
			let cache = cache.clone();
			let calls = calls.clone();

			tasks.push(tokio::spawn(async move {
				cache
					.get_or_try_insert_with("q".to_string(), || async {
						calls.fetch_add(1, Ordering::SeqCst);
						tokio::time::sleep(Duration::from_millis(50)).await;

						Ok::<_, Infallible>(9_usize)
					})
					.await
			}));
		}

		for task in tasks {
			assert_eq!(task.await.expect("task panicked"), Ok(9));
		}

		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}
}
