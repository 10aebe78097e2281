//! Pull-through caching filesystem
//!
//! [`CachingFs`] sits in front of any [`FileStore`] and keeps whole-file
//! reads in a bounded in-memory cache keyed by the exact path string.
//!
//! - A miss loads the file once, no matter how many callers miss on the same
//!   path at the same time. Every waiter receives the same bytes or the same
//!   error.
//! - Misses on different paths load independently.
//! - A load runs on its own task. Dropping the caller that started it does
//!   not abandon it; later callers for the same path join it, and a
//!   successful result is cached even if nobody is waiting any more.
//! - Failed loads are never cached, so a transient error is retried on the
//!   next read.
//! - Eviction is size bounded by entry count, with TinyLFU admission and LRU
//!   eviction, so frequently and recently read files are retained.
//! - Streaming reads through [`FileStore::open`] bypass the cache.
//!
//! ## Staleness
//!
//! Entries are immutable once loaded. A file that changes in the backing
//! store keeps being served from the cache until its entry is evicted.

use crate::error::{AssetError, CacheError, Result, not_found};
use crate::store::{FileStore, FileStream};
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared};
use moka::future::Cache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default maximum number of cached files
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Default initial capacity of the cache
pub const DEFAULT_INITIAL_CAPACITY: usize = 100;

/// Cache sizing
///
/// A value of `0` selects the corresponding default.
///
/// # Example
///
/// ```rust
/// use reinhardt_assets::caching::CacheOptions;
///
/// let options = CacheOptions::new().with_max_entries(5000);
/// assert_eq!(options.effective_max_entries(), 5000);
/// assert_eq!(options.effective_initial_capacity(), 100);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
	/// Maximum number of cached files
	pub max_entries: usize,
	/// Initial capacity hint
	pub initial_capacity: usize,
}

impl CacheOptions {
	/// Creates options that use the defaults
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the maximum number of cached files
	pub fn with_max_entries(mut self, max_entries: usize) -> Self {
		self.max_entries = max_entries;
		self
	}

	/// Sets the initial capacity hint
	pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
		self.initial_capacity = initial_capacity;
		self
	}

	/// Maximum entry count after applying defaults
	pub fn effective_max_entries(&self) -> usize {
		if self.max_entries == 0 {
			DEFAULT_MAX_ENTRIES
		} else {
			self.max_entries
		}
	}

	/// Initial capacity after applying defaults
	///
	/// Never exceeds [`CacheOptions::effective_max_entries`].
	pub fn effective_initial_capacity(&self) -> usize {
		let requested = if self.initial_capacity == 0 {
			DEFAULT_INITIAL_CAPACITY
		} else {
			self.initial_capacity
		};
		requested.min(self.effective_max_entries())
	}
}

/// Snapshot of cache activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
	/// Whole-file reads served through the cache
	pub requests: u64,
	/// Loads issued to the backing store
	pub loads: u64,
	/// Loads that failed
	pub load_failures: u64,
	/// Entries currently cached (approximate while evictions are pending)
	pub entry_count: u64,
}

impl CacheStatistics {
	/// Fraction of requests answered without a backing store load
	pub fn hit_rate(&self) -> f64 {
		if self.requests == 0 {
			0.0
		} else {
			self.requests.saturating_sub(self.loads) as f64 / self.requests as f64
		}
	}
}

type LoadResult = std::result::Result<Bytes, Arc<CacheError>>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;
type InFlight = Arc<Mutex<HashMap<String, SharedLoad>>>;

#[derive(Debug, Default)]
struct Counters {
	requests: AtomicU64,
	loads: AtomicU64,
	load_failures: AtomicU64,
}

/// Filesystem wrapper caching whole-file reads
///
/// # Example
///
/// ```rust
/// use reinhardt_assets::caching::{CacheOptions, CachingFs};
/// use reinhardt_assets::store::{FileStore, MemoryStore};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = Arc::new(MemoryStore::new().with_file("app.css", "body {}"));
/// let cached = CachingFs::new(store, CacheOptions::default());
///
/// let first = cached.read("app.css").await.unwrap();
/// let second = cached.read("app.css").await.unwrap();
/// assert_eq!(first, second);
/// assert_eq!(cached.statistics().loads, 1);
/// # }
/// ```
pub struct CachingFs {
	store: Arc<dyn FileStore>,
	cache: Cache<String, Bytes>,
	options: CacheOptions,
	counters: Arc<Counters>,
	in_flight: InFlight,
}

impl CachingFs {
	/// Creates a caching filesystem in front of `store`
	pub fn new(store: Arc<dyn FileStore>, options: CacheOptions) -> Self {
		let max_entries = options.effective_max_entries();
		let initial_capacity = options.effective_initial_capacity();
		if options.initial_capacity > max_entries {
			tracing::warn!(
				requested = options.initial_capacity,
				max_entries,
				"cache initial capacity exceeds max entries, clamping"
			);
		}

		let cache = Cache::builder()
			.max_capacity(max_entries as u64)
			.initial_capacity(initial_capacity)
			.build();

		Self {
			store,
			cache,
			options: CacheOptions {
				max_entries,
				initial_capacity,
			},
			counters: Arc::default(),
			in_flight: Arc::default(),
		}
	}

	/// Creates a caching filesystem with [`DEFAULT_MAX_ENTRIES`] and
	/// [`DEFAULT_INITIAL_CAPACITY`]
	pub fn with_defaults(store: Arc<dyn FileStore>) -> Self {
		Self::new(store, CacheOptions::default())
	}

	/// Starts a builder
	pub fn builder() -> CachingFsBuilder {
		CachingFsBuilder::default()
	}

	/// Effective sizing of this cache
	pub fn options(&self) -> CacheOptions {
		self.options
	}

	/// Looks up `path`, loading it from the backing store on a miss
	///
	/// # Errors
	///
	/// Returns [`CacheError::NotFound`] if the backing store has no such file
	/// and [`CacheError::Store`] for any other backing store failure. Waiters
	/// coalesced onto the same load share the same error.
	pub async fn get(&self, path: &str) -> std::result::Result<Bytes, Arc<CacheError>> {
		self.counters.requests.fetch_add(1, Ordering::Relaxed);
		tracing::trace!(path, "asset cache lookup");

		self.cache
			.try_get_with_by_ref(path, async { self.load(path).await })
			.await
			.map_err(|err| (*err).clone())
	}

	/// Joins the in-flight load of `path`, starting one if there is none
	fn load(&self, path: &str) -> SharedLoad {
		let mut in_flight = self.in_flight.lock();
		if let Some(load) = in_flight.get(path) {
			tracing::trace!(path, "joining in-flight asset load");
			return load.clone();
		}

		let task = tokio::spawn(load_detached(
			Arc::clone(&self.store),
			self.cache.clone(),
			Arc::clone(&self.counters),
			Arc::clone(&self.in_flight),
			path.to_string(),
		));

		let registry = Arc::clone(&self.in_flight);
		let key = path.to_string();
		let load = async move {
			match task.await {
				Ok(result) => result,
				Err(err) => {
					// The task never reached its own cleanup
					registry.lock().remove(&key);
					Err(Arc::new(CacheError::Store(io::Error::other(err))))
				}
			}
		}
		.boxed()
		.shared();

		// Registered before the lock is released, so the task's removal
		// always comes after this insert
		in_flight.insert(path.to_string(), load.clone());
		load
	}

	/// Returns true if `path` is currently cached
	pub fn contains(&self, path: &str) -> bool {
		self.cache.contains_key(path)
	}

	/// Current activity counters
	pub fn statistics(&self) -> CacheStatistics {
		CacheStatistics {
			requests: self.counters.requests.load(Ordering::Relaxed),
			loads: self.counters.loads.load(Ordering::Relaxed),
			load_failures: self.counters.load_failures.load(Ordering::Relaxed),
			entry_count: self.cache.entry_count(),
		}
	}

	/// Applies pending evictions so [`CachingFs::statistics`] is exact
	pub async fn run_pending_tasks(&self) {
		self.cache.run_pending_tasks().await;
	}
}

impl std::fmt::Debug for CachingFs {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CachingFs")
			.field("options", &self.options)
			.field("entry_count", &self.cache.entry_count())
			.finish_non_exhaustive()
	}
}

async fn load_detached(
	store: Arc<dyn FileStore>,
	cache: Cache<String, Bytes>,
	counters: Arc<Counters>,
	in_flight: InFlight,
	path: String,
) -> LoadResult {
	counters.loads.fetch_add(1, Ordering::Relaxed);
	tracing::debug!(path = %path, "loading asset from backing store");

	let result = match store.read(&path).await {
		Ok(body) => {
			cache.insert(path.clone(), body.clone()).await;
			Ok(body)
		}
		Err(err) => {
			counters.load_failures.fetch_add(1, Ordering::Relaxed);
			tracing::debug!(path = %path, error = %err, "asset load failed");
			Err(Arc::new(CacheError::from_store(&path, err)))
		}
	};

	in_flight.lock().remove(&path);
	result
}

/// Converts a shared cache-layer error into the error [`FileStore::read`]
/// reports
///
/// The sole holder gets the backing store error back unchanged. When the
/// error is shared by coalesced waiters each receives an error of the same
/// kind wrapping the shared [`CacheError`], so the message and the `source()`
/// chain are kept.
fn into_io_error(path: &str, err: Arc<CacheError>) -> io::Error {
	match Arc::try_unwrap(err) {
		Ok(CacheError::Store(err)) => err,
		Ok(CacheError::NotFound(_)) => not_found(path),
		Err(shared) if shared.is_not_found() => not_found(path),
		Err(shared) => io::Error::new(shared.kind(), shared),
	}
}

#[async_trait]
impl FileStore for CachingFs {
	async fn open(&self, path: &str) -> io::Result<FileStream> {
		self.store.open(path).await
	}

	async fn read(&self, path: &str) -> io::Result<Bytes> {
		self.get(path).await.map_err(|err| into_io_error(path, err))
	}
}

/// Builder for [`CachingFs`]
#[derive(Default)]
pub struct CachingFsBuilder {
	store: Option<Arc<dyn FileStore>>,
	options: CacheOptions,
}

impl CachingFsBuilder {
	/// Sets the backing store
	pub fn store(mut self, store: Arc<dyn FileStore>) -> Self {
		self.store = Some(store);
		self
	}

	/// Sets the maximum number of cached files
	pub fn max_entries(mut self, max_entries: usize) -> Self {
		self.options.max_entries = max_entries;
		self
	}

	/// Sets the initial capacity hint
	pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
		self.options.initial_capacity = initial_capacity;
		self
	}

	/// Sets both sizing values
	pub fn options(mut self, options: CacheOptions) -> Self {
		self.options = options;
		self
	}

	/// Builds the caching filesystem
	///
	/// # Errors
	///
	/// Returns [`AssetError::MissingStore`] if no backing store was set.
	pub fn build(self) -> Result<CachingFs> {
		let store = self.store.ok_or(AssetError::MissingStore)?;
		Ok(CachingFs::new(store, self.options))
	}
}
