//! Backing stores for static assets
//!
//! A [`FileStore`] is any read-only source of files addressed by a
//! `/`-separated relative path: a directory on disk, a bundle compiled into
//! the binary, a network store. Stores must report a missing file with
//! [`std::io::ErrorKind::NotFound`] and keep permission and other I/O
//! failures distinct.

pub mod local;
pub mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Streaming handle returned by [`FileStore::open`]
pub type FileStream = Pin<Box<dyn AsyncRead + Send>>;

/// Read-only file source
#[async_trait]
pub trait FileStore: Send + Sync {
	/// Opens `path` for streaming reads.
	///
	/// # Errors
	///
	/// Returns an error of kind [`io::ErrorKind::NotFound`] if the file does
	/// not exist, or the underlying I/O error otherwise.
	async fn open(&self, path: &str) -> io::Result<FileStream>;

	/// Reads the whole file at `path`.
	///
	/// # Errors
	///
	/// Same contract as [`FileStore::open`].
	async fn read(&self, path: &str) -> io::Result<Bytes>;
}

#[async_trait]
impl<T: FileStore + ?Sized> FileStore for Arc<T> {
	async fn open(&self, path: &str) -> io::Result<FileStream> {
		(**self).open(path).await
	}

	async fn read(&self, path: &str) -> io::Result<Bytes> {
		(**self).read(path).await
	}
}
