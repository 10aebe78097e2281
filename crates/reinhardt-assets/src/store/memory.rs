//! In-memory backing store

use super::{FileStream, FileStore};
use crate::error::not_found;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;

/// Backing store holding every file in memory
///
/// Suited to asset bundles embedded in the binary and to tests.
///
/// # Example
///
/// ```rust
/// use reinhardt_assets::store::{FileStore, MemoryStore};
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new()
///     .with_file("app.js", "console.log('hi');")
///     .with_file("app.js.br", b"\x1b\x00".as_slice());
///
/// let data = store.read("app.js").await.unwrap();
/// assert_eq!(&data[..], b"console.log('hi');");
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
	files: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
	/// Creates an empty store
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a file and returns the store
	pub fn with_file(self, path: impl Into<String>, contents: impl Into<Bytes>) -> Self {
		self.insert(path, contents);
		self
	}

	/// Adds or replaces a file
	pub fn insert(&self, path: impl Into<String>, contents: impl Into<Bytes>) {
		self.files.write().insert(path.into(), contents.into());
	}

	/// Removes a file, returning its contents if it was present
	pub fn remove(&self, path: &str) -> Option<Bytes> {
		self.files.write().remove(path)
	}

	/// Number of files in the store
	pub fn len(&self) -> usize {
		self.files.read().len()
	}

	/// Returns true if the store holds no files
	pub fn is_empty(&self) -> bool {
		self.files.read().is_empty()
	}

	fn get(&self, path: &str) -> io::Result<Bytes> {
		self.files.read().get(path).cloned().ok_or_else(|| not_found(path))
	}
}

#[async_trait]
impl FileStore for MemoryStore {
	async fn open(&self, path: &str) -> io::Result<FileStream> {
		let data = self.get(path)?;
		Ok(Box::pin(io::Cursor::new(data)))
	}

	async fn read(&self, path: &str) -> io::Result<Bytes> {
		self.get(path)
	}
}
