//! Error types for asset serving
//!
//! Configuration and validation failures are reported through [`AssetError`].
//! Per-request failures stay [`std::io::Error`] so callers can compare them by
//! [`std::io::ErrorKind`] regardless of which layer produced them.

use std::io;
use thiserror::Error;

/// Result type for configuration and validation operations
pub type Result<T> = std::result::Result<T, AssetError>;

/// Configuration error raised while building or validating an asset server
#[derive(Debug, Error)]
pub enum AssetError {
	/// The route prefix is empty
	#[error("assets route is empty")]
	EmptyRoute,

	/// No backing store was supplied
	#[error("asset filesystem is missing")]
	MissingStore,

	/// The filesystem prefix starts with `/`
	#[error("filesystem prefix is an absolute path")]
	AbsoluteFsPrefix,

	/// The filesystem prefix does not end with `/`
	#[error("filesystem prefix does not end with '/'")]
	BadFsPrefix,

	/// The compressed-variant suffix does not start with `.`
	#[error("compressed suffix does not start with '.'")]
	BadCompressedSuffix,

	/// A media-type pattern from settings failed to compile
	#[error("invalid media type pattern for {media_type}: {source}")]
	InvalidPattern {
		/// Media type the pattern was registered for
		media_type: String,
		/// Underlying regex error
		#[source]
		source: regex::Error,
	},

	/// A media type from settings is already registered
	#[error("media type is already registered: {0}")]
	DuplicateMediaType(String),

	/// A configured header value is not a valid HTTP header value
	#[error("invalid header value: {0}")]
	InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

	/// Settings could not be parsed
	#[error("invalid asset settings: {0}")]
	Settings(#[from] toml::de::Error),
}

/// Failure of a cache-layer lookup
///
/// The cache reports a missing file as [`CacheError::NotFound`] and keeps any
/// other backing store error untouched in [`CacheError::Store`]. Neither is
/// ever stored in the cache.
#[derive(Debug, Error)]
pub enum CacheError {
	/// The backing store has no file at this path
	#[error("cache entry not found: {0}")]
	NotFound(String),

	/// Any other backing store failure
	#[error(transparent)]
	Store(io::Error),
}

impl CacheError {
	/// Classifies a backing store error for `path`
	pub(crate) fn from_store(path: &str, err: io::Error) -> Self {
		if err.kind() == io::ErrorKind::NotFound {
			Self::NotFound(path.to_string())
		} else {
			Self::Store(err)
		}
	}

	/// Returns the [`io::ErrorKind`] this error surfaces as
	pub fn kind(&self) -> io::ErrorKind {
		match self {
			Self::NotFound(_) => io::ErrorKind::NotFound,
			Self::Store(err) => err.kind(),
		}
	}

	/// Returns true if the backing store reported a missing file
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound(_))
	}
}

/// Builds the standard not-found error for `path`
pub(crate) fn not_found(path: &str) -> io::Error {
	io::Error::new(
		io::ErrorKind::NotFound,
		format!("open {}: file does not exist", path),
	)
}
