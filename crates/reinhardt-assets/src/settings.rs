//! Declarative asset server settings
//!
//! ```toml
//! route = "/static/"
//! fs_prefix = "public/"
//! compressed_suffix = ".br"
//! cache_control = "public, max-age=31536000"
//!
//! [cache]
//! max_entries = 2000
//! initial_capacity = 200
//!
//! [[media_types]]
//! pattern = '\.wasm$'
//! media_type = "application/wasm"
//! priority = true
//! ```

use crate::caching::CacheOptions;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Default route prefix
pub const DEFAULT_ROUTE: &str = "/static/";

/// Settings for an [`AssetServer`](crate::AssetServer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsSettings {
	/// Route prefix stripped from request paths
	pub route: String,
	/// Relative directory prepended to lookups, ending with `/`
	pub fs_prefix: String,
	/// Suffix of pre-compressed variants, such as `.br`; empty disables them
	pub compressed_suffix: String,
	/// `Cache-Control` value; `None` keeps the default, an empty string
	/// disables the header
	pub cache_control: Option<String>,
	/// In-memory caching of file contents; `None` disables it
	pub cache: Option<CacheOptions>,
	/// Extra media type rules
	pub media_types: Vec<MediaTypeSetting>,
}

impl Default for AssetsSettings {
	fn default() -> Self {
		Self {
			route: DEFAULT_ROUTE.to_string(),
			fs_prefix: String::new(),
			compressed_suffix: String::new(),
			cache_control: None,
			cache: None,
			media_types: Vec::new(),
		}
	}
}

impl AssetsSettings {
	/// Parses settings from TOML
	///
	/// # Errors
	///
	/// Returns [`AssetError::Settings`](crate::AssetError::Settings) if the
	/// document is malformed.
	///
	/// # Example
	///
	/// ```rust
	/// use reinhardt_assets::AssetsSettings;
	///
	/// let settings = AssetsSettings::from_toml_str(r#"
	///     route = "/assets/"
	///     compressed_suffix = ".br"
	/// "#).unwrap();
	/// assert_eq!(settings.route, "/assets/");
	/// assert!(settings.cache.is_none());
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self> {
		Ok(toml::from_str(source)?)
	}
}

/// A media type rule declared in settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTypeSetting {
	/// Regular expression matched against the file path
	pub pattern: String,
	/// Media type declared for matching paths
	pub media_type: String,
	/// Check before the built-in rules instead of after them
	#[serde(default)]
	pub priority: bool,
}
