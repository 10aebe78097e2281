//! Local filesystem backing store

use super::{FileStream, FileStore};
use crate::error::not_found;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};

/// Backing store reading files below a root directory
///
/// Paths are `/`-separated and relative to the root. A path that is
/// absolute, empty, or contains `.`/`..` segments is rejected with
/// [`io::ErrorKind::InvalidInput`] before touching the disk, so a request can
/// never reach outside the root.
///
/// # Example
///
/// ```rust,ignore
/// use reinhardt_assets::store::LocalStore;
///
/// let store = LocalStore::new("static");
/// let css = store.read("css/site.css").await?;
/// ```
#[derive(Debug, Clone)]
pub struct LocalStore {
	root: PathBuf,
}

impl LocalStore {
	/// Creates a store rooted at `root`
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Root directory of the store
	pub fn root(&self) -> &Path {
		&self.root
	}

	fn resolve(&self, path: &str) -> io::Result<PathBuf> {
		let valid = !path.is_empty()
			&& !path.starts_with('/')
			&& path
				.split('/')
				.all(|segment| !segment.is_empty() && segment != "." && segment != "..");

		if !valid {
			tracing::warn!(path, "rejected asset path outside store root");
			return Err(io::Error::new(
				io::ErrorKind::InvalidInput,
				format!("open {}: invalid argument", path),
			));
		}

		Ok(self.root.join(path))
	}
}

fn open_error(path: &str, err: io::Error) -> io::Error {
	if err.kind() == io::ErrorKind::NotFound {
		not_found(path)
	} else {
		err
	}
}

#[async_trait]
impl FileStore for LocalStore {
	async fn open(&self, path: &str) -> io::Result<FileStream> {
		let file = tokio::fs::File::open(self.resolve(path)?)
			.await
			.map_err(|err| open_error(path, err))?;
		Ok(Box::pin(file))
	}

	async fn read(&self, path: &str) -> io::Result<Bytes> {
		let data = tokio::fs::read(self.resolve(path)?)
			.await
			.map_err(|err| open_error(path, err))?;
		Ok(Bytes::from(data))
	}
}
