//! Specialized test fixtures for reinhardt-assets
//!
//! Provides mock asset bundles and an instrumented backing store.

// Not every test file uses every fixture.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reinhardt_assets::store::{FileStore, FileStream, MemoryStore};
use rstest::fixture;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

/// Backing store that counts reads and can inject failures or delays
///
/// - `with_delay` slows every read so concurrent callers overlap
/// - `with_fault` makes reads of one path fail with a given error kind
/// - `with_gate` blocks reads of one path until the gate is notified
pub struct CountingStore {
	inner: MemoryStore,
	reads: Mutex<HashMap<String, usize>>,
	opens: AtomicUsize,
	delay: Option<Duration>,
	faults: Mutex<HashMap<String, io::ErrorKind>>,
	gate: Option<(String, Arc<Notify>)>,
}

impl CountingStore {
	pub fn new(inner: MemoryStore) -> Self {
		Self {
			inner,
			reads: Mutex::new(HashMap::new()),
			opens: AtomicUsize::new(0),
			delay: None,
			faults: Mutex::new(HashMap::new()),
			gate: None,
		}
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	pub fn with_fault(self, path: &str, kind: io::ErrorKind) -> Self {
		self.faults.lock().insert(path.to_string(), kind);
		self
	}

	pub fn with_gate(mut self, path: &str, gate: Arc<Notify>) -> Self {
		self.gate = Some((path.to_string(), gate));
		self
	}

	/// Stops injecting a failure for `path`
	pub fn clear_fault(&self, path: &str) {
		self.faults.lock().remove(path);
	}

	/// Backing reads issued for `path`
	pub fn reads(&self, path: &str) -> usize {
		self.reads.lock().get(path).copied().unwrap_or(0)
	}

	/// Backing reads issued for every path
	pub fn total_reads(&self) -> usize {
		self.reads.lock().values().sum()
	}

	/// Streams opened
	pub fn opens(&self) -> usize {
		self.opens.load(Ordering::SeqCst)
	}

	/// Underlying files
	pub fn inner(&self) -> &MemoryStore {
		&self.inner
	}

	fn fault(&self, path: &str) -> Option<io::Error> {
		self.faults
			.lock()
			.get(path)
			.map(|kind| io::Error::new(*kind, format!("open {}: injected {:?}", path, kind)))
	}
}

#[async_trait]
impl FileStore for CountingStore {
	async fn open(&self, path: &str) -> io::Result<FileStream> {
		self.opens.fetch_add(1, Ordering::SeqCst);
		if let Some(err) = self.fault(path) {
			return Err(err);
		}
		self.inner.open(path).await
	}

	async fn read(&self, path: &str) -> io::Result<Bytes> {
		*self.reads.lock().entry(path.to_string()).or_insert(0) += 1;

		if let Some((gated, gate)) = &self.gate {
			if gated == path {
				gate.notified().await;
			}
		}
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		if let Some(err) = self.fault(path) {
			return Err(err);
		}
		self.inner.read(path).await
	}
}

/// Mock asset bundle served under `/assets/`
#[fixture]
pub fn asset_store() -> Arc<MemoryStore> {
	Arc::new(
		MemoryStore::new()
			.with_file("test.css", "body { color: blue; }")
			.with_file("test.js", "console.log('test');")
			.with_file("test.txt", "plain text")
			.with_file("test.json", r#"{"key": "value"}"#)
			.with_file("test.png", "mock-png-data")
			.with_file("test.woff", "mock-woff-data")
			.with_file("test.woff2", "mock-woff2-data")
			.with_file("test.jpg", "mock-jpg-data")
			.with_file("test.jpeg", "mock-jpeg-data")
			.with_file("test.unknown", "unknown type data")
			.with_file("test.css.br", "compressed-css-data")
			.with_file("prefix/nested/style.css", "prefixed css")
			.with_file("prefix/script.js", "prefixed js")
			.with_file("only-brotli.js.br", "only-brotli-content")
			.with_file("app.js", "plain")
			.with_file("app.js.br", "compressed")
			.with_file("only.js", "X")
			.with_file("public/img/a.png", "png-bytes"),
	)
}

/// Small bundle for caching filesystem tests
#[fixture]
pub fn caching_store() -> MemoryStore {
	MemoryStore::new()
		.with_file("cached.txt", "cached content")
		.with_file("test.css", "body { color: red; }")
		.with_file("large.js", "console.log('large file content');")
		.with_file("nested/file.js", "nested content")
}

/// `count` files named `file<i>.txt` holding `content of file <i>`
pub fn many_files_store(count: usize) -> MemoryStore {
	let store = MemoryStore::new();
	for i in 0..count {
		store.insert(format!("file{}.txt", i), format!("content of file {}", i));
	}
	store
}

/// Temporary directory with a small static tree
#[fixture]
pub fn static_dir() -> TempDir {
	let temp_dir = TempDir::new().unwrap();
	let root = temp_dir.path();

	fs::create_dir_all(root.join("public/css")).unwrap();
	fs::write(root.join("public/css/site.css"), "body { margin: 0; }").unwrap();
	fs::write(root.join("public/app.js"), "console.log('app');").unwrap();
	fs::write(root.join("public/app.js.br"), b"\x1b\x13\x00brotli").unwrap();
	fs::write(root.join("secret.txt"), "outside the prefix").unwrap();

	temp_dir
}
