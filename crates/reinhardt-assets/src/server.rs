//! Asset server: request path to response
//!
//! For a request path the server:
//!
//! 1. strips the route prefix,
//! 2. prepends the filesystem prefix, if any,
//! 3. tries `<path><suffix>` first when a compressed suffix is configured and
//!    the path does not already end with it,
//! 4. falls back to `<path>` itself,
//! 5. answers with the bytes, a `Content-Type` inferred from the request path
//!    after step 1 with the compressed suffix removed, and
//!    `Content-Encoding: br` for compressed variants.
//!
//! The filesystem prefix never takes part in media type inference.
//!
//! Configuration methods take `&mut self`. Configure the server fully, then
//! share it (for example through [`AssetServer::into_service`]) to serve.

use crate::caching::{CacheOptions, CachingFs};
use crate::error::{AssetError, Result};
use crate::media_type::{APPLICATION_OCTET_STREAM, MediaTypeTable, RulePosition};
use crate::policy::{CacheControlHeaders, ErrorResponder, HeaderPolicy, StatusErrorResponder};
use crate::service::AssetService;
use crate::settings::AssetsSettings;
use crate::store::FileStore;
use bytes::Bytes;
use http::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use regex::Regex;
use std::io;
use std::sync::Arc;

/// `Content-Encoding` value for compressed variants
pub const BROTLI_ENCODING: &str = "br";

/// Outcome of resolving a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
	/// Path looked up in the store, before any compressed suffix was added
	pub lookup_path: String,
	/// File contents
	pub body: Bytes,
	/// True if `body` is a compressed variant
	pub compressed: bool,
}

/// Serves static assets from a [`FileStore`]
///
/// # Example
///
/// ```rust
/// use reinhardt_assets::AssetServer;
/// use reinhardt_assets::store::MemoryStore;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = Arc::new(
///     MemoryStore::new()
///         .with_file("app.js", "plain")
///         .with_file("app.js.br", "compressed"),
/// );
/// let mut server = AssetServer::new("/assets/", store).unwrap();
/// server.set_compressed_suffix(".br");
/// server.check().unwrap();
///
/// let response = server.serve("/assets/app.js").await;
/// assert_eq!(response.status(), 200);
/// assert_eq!(response.headers()["content-encoding"], "br");
/// assert_eq!(response.headers()["content-type"], "text/javascript");
/// assert_eq!(&response.body()[..], b"compressed");
/// # }
/// ```
pub struct AssetServer {
	store: Arc<dyn FileStore>,
	route: String,
	fs_prefix: String,
	compressed_suffix: String,
	media_types: MediaTypeTable,
	error_responder: Option<Arc<dyn ErrorResponder>>,
	header_policy: Option<Arc<dyn HeaderPolicy>>,
}

impl AssetServer {
	/// Creates a server for requests under `route`
	///
	/// The server starts with the default media type rules,
	/// [`StatusErrorResponder`] and the default [`CacheControlHeaders`].
	///
	/// # Errors
	///
	/// Returns [`AssetError::EmptyRoute`] if `route` is empty.
	pub fn new(route: impl Into<String>, store: Arc<dyn FileStore>) -> Result<Self> {
		let route = route.into();
		if route.is_empty() {
			return Err(AssetError::EmptyRoute);
		}

		Ok(Self {
			store,
			route,
			fs_prefix: String::new(),
			compressed_suffix: String::new(),
			media_types: MediaTypeTable::default(),
			error_responder: Some(Arc::new(StatusErrorResponder)),
			header_policy: Some(Arc::new(CacheControlHeaders::default())),
		})
	}

	/// Starts a builder
	pub fn builder() -> AssetServerBuilder {
		AssetServerBuilder::default()
	}

	/// Creates a server from settings
	///
	/// When `settings.cache` is set, `store` is wrapped in a [`CachingFs`].
	///
	/// # Errors
	///
	/// Returns the first configuration error found in `settings`.
	pub fn from_settings(settings: &AssetsSettings, store: Arc<dyn FileStore>) -> Result<Self> {
		let mut builder = Self::builder()
			.route(settings.route.as_str())
			.store(store)
			.fs_prefix(settings.fs_prefix.as_str())
			.compressed_suffix(settings.compressed_suffix.as_str());

		if let Some(options) = settings.cache {
			builder = builder.cache(options);
		}

		match settings.cache_control.as_deref() {
			None => {}
			Some("") => builder = builder.no_header_policy(),
			Some(value) => builder = builder.header_policy(Arc::new(CacheControlHeaders::new(value)?)),
		}

		for rule in &settings.media_types {
			let pattern = Regex::new(&rule.pattern).map_err(|source| AssetError::InvalidPattern {
				media_type: rule.media_type.clone(),
				source,
			})?;
			let position = if rule.priority {
				RulePosition::Front
			} else {
				RulePosition::Back
			};
			builder = builder.media_type(pattern, rule.media_type.as_str(), position);
		}

		builder.build()
	}

	/// Validates the configuration
	///
	/// # Errors
	///
	/// - [`AssetError::EmptyRoute`] if the route is empty
	/// - [`AssetError::BadCompressedSuffix`] if a compressed suffix is set and
	///   does not start with `.`
	/// - [`AssetError::AbsoluteFsPrefix`] if the filesystem prefix starts
	///   with `/`
	/// - [`AssetError::BadFsPrefix`] if the filesystem prefix does not end
	///   with `/`
	pub fn check(&self) -> Result<()> {
		if self.route.is_empty() {
			return Err(AssetError::EmptyRoute);
		}
		if !self.compressed_suffix.is_empty() && !self.compressed_suffix.starts_with('.') {
			return Err(AssetError::BadCompressedSuffix);
		}
		if !self.fs_prefix.is_empty() {
			if self.fs_prefix.starts_with('/') {
				return Err(AssetError::AbsoluteFsPrefix);
			}
			if !self.fs_prefix.ends_with('/') {
				return Err(AssetError::BadFsPrefix);
			}
		}
		Ok(())
	}

	/// Route prefix
	pub fn route(&self) -> &str {
		&self.route
	}

	/// Filesystem prefix
	pub fn fs_prefix(&self) -> &str {
		&self.fs_prefix
	}

	/// Compressed-variant suffix
	pub fn compressed_suffix(&self) -> &str {
		&self.compressed_suffix
	}

	/// Store the server reads from
	pub fn store(&self) -> &Arc<dyn FileStore> {
		&self.store
	}

	/// Media type rules
	pub fn media_types(&self) -> &MediaTypeTable {
		&self.media_types
	}

	/// Sets the directory prepended to every lookup; must be relative and end
	/// with `/`
	pub fn set_fs_prefix(&mut self, prefix: impl Into<String>) {
		self.fs_prefix = prefix.into();
	}

	/// Sets the compressed-variant suffix; must start with `.`, empty disables
	/// compressed variants
	pub fn set_compressed_suffix(&mut self, suffix: impl Into<String>) {
		self.compressed_suffix = suffix.into();
	}

	/// Replaces the error responder; `None` leaves failed responses untouched
	pub fn set_error_responder(&mut self, responder: Option<Arc<dyn ErrorResponder>>) {
		self.error_responder = responder;
	}

	/// Replaces the header policy; `None` adds no extra headers
	pub fn set_header_policy(&mut self, policy: Option<Arc<dyn HeaderPolicy>>) {
		self.header_policy = policy;
	}

	/// Registers a media type rule
	///
	/// Returns `false` if `media_type` is already registered.
	pub fn register_media_type(
		&mut self,
		pattern: Regex,
		media_type: impl Into<String>,
		position: RulePosition,
	) -> bool {
		self.media_types.register(pattern, media_type, position)
	}

	/// Removes a media type rule
	///
	/// Returns `false` if `media_type` was not registered.
	pub fn remove_media_type(&mut self, media_type: &str) -> bool {
		self.media_types.remove(media_type)
	}

	/// Returns true if a rule for `media_type` is registered
	pub fn is_media_type_registered(&self, media_type: &str) -> bool {
		self.media_types.is_registered(media_type)
	}

	/// Infers the media type of `path`, ignoring a trailing compressed suffix
	pub fn infer_media_type(&self, path: &str) -> &str {
		let path = if self.compressed_suffix.is_empty() {
			path
		} else {
			path.strip_suffix(self.compressed_suffix.as_str())
				.unwrap_or(path)
		};
		self.media_types.infer(path)
	}

	/// Maps a request path to the store path it is looked up at
	///
	/// ```rust
	/// use reinhardt_assets::AssetServer;
	/// use reinhardt_assets::store::MemoryStore;
	/// use std::sync::Arc;
	///
	/// let mut server = AssetServer::new("/static/", Arc::new(MemoryStore::new())).unwrap();
	/// server.set_fs_prefix("public/");
	/// assert_eq!(server.lookup_path("/static/img/a.png"), "public/img/a.png");
	/// ```
	pub fn lookup_path(&self, request_path: &str) -> String {
		format!("{}{}", self.fs_prefix, self.relative_path(request_path))
	}

	// Request path with the route removed; paths outside the route pass through
	fn relative_path<'a>(&self, request_path: &'a str) -> &'a str {
		request_path
			.strip_prefix(self.route.as_str())
			.unwrap_or(request_path)
	}

	/// Reads the file a request path refers to, preferring a compressed
	/// variant
	///
	/// # Errors
	///
	/// Returns the store error from the final read attempt.
	pub async fn resolve(&self, request_path: &str) -> io::Result<ResolvedAsset> {
		let lookup_path = self.lookup_path(request_path);
		let suffix = self.compressed_suffix.as_str();
		let compressed_requested = !suffix.is_empty() && lookup_path.ends_with(suffix);

		if !suffix.is_empty() && !compressed_requested {
			let variant_path = format!("{}{}", lookup_path, suffix);
			match self.store.read(&variant_path).await {
				Ok(body) => {
					tracing::debug!(path = %variant_path, "serving compressed variant");
					return Ok(ResolvedAsset {
						lookup_path,
						body,
						compressed: true,
					});
				}
				Err(err) => {
					tracing::trace!(path = %variant_path, error = %err, "no compressed variant");
				}
			}
		}

		let body = self.store.read(&lookup_path).await?;
		Ok(ResolvedAsset {
			lookup_path,
			body,
			compressed: compressed_requested,
		})
	}

	/// Serves a request path
	///
	/// On failure the error responder, if any, writes the response; without
	/// one the response stays an empty `200 OK`.
	pub async fn serve(&self, request_path: &str) -> Response<Bytes> {
		let asset = match self.resolve(request_path).await {
			Ok(asset) => asset,
			Err(err) => return self.error_response(request_path, &err),
		};

		let mut response = Response::new(Bytes::new());

		if let Some(policy) = &self.header_policy {
			policy.apply(response.headers_mut(), &asset.body);
		}

		let relative = self.relative_path(request_path);
		let media_type = HeaderValue::from_str(self.infer_media_type(relative))
			.unwrap_or_else(|_| HeaderValue::from_static(APPLICATION_OCTET_STREAM));
		let headers = response.headers_mut();
		headers.insert(CONTENT_TYPE, media_type);
		if asset.compressed {
			headers.insert(CONTENT_ENCODING, HeaderValue::from_static(BROTLI_ENCODING));
		}

		*response.status_mut() = StatusCode::OK;
		*response.body_mut() = asset.body;
		response
	}

	/// Answers a failed request through the error responder
	///
	/// Without a responder the response is an empty `200 OK`.
	pub fn error_response(&self, request_path: &str, error: &io::Error) -> Response<Bytes> {
		tracing::debug!(path = request_path, error = %error, "asset request failed");
		let mut response = Response::new(Bytes::new());
		if let Some(responder) = &self.error_responder {
			responder.respond(&mut response, request_path, error);
		}
		response
	}

	/// Wraps the server in a hyper service
	pub fn into_service(self) -> AssetService {
		AssetService::new(Arc::new(self))
	}
}

impl std::fmt::Debug for AssetServer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AssetServer")
			.field("route", &self.route)
			.field("fs_prefix", &self.fs_prefix)
			.field("compressed_suffix", &self.compressed_suffix)
			.field("media_types", &self.media_types.len())
			.field("error_responder", &self.error_responder.is_some())
			.field("header_policy", &self.header_policy.is_some())
			.finish_non_exhaustive()
	}
}

/// Builder for [`AssetServer`]
///
/// # Example
///
/// ```rust
/// use reinhardt_assets::AssetServer;
/// use reinhardt_assets::caching::CacheOptions;
/// use reinhardt_assets::store::MemoryStore;
/// use std::sync::Arc;
///
/// let server = AssetServer::builder()
///     .route("/static/")
///     .store(Arc::new(MemoryStore::new()))
///     .fs_prefix("public/")
///     .compressed_suffix(".br")
///     .cache(CacheOptions::default())
///     .build()
///     .unwrap();
/// assert_eq!(server.compressed_suffix(), ".br");
/// ```
#[derive(Default)]
pub struct AssetServerBuilder {
	route: Option<String>,
	store: Option<Arc<dyn FileStore>>,
	fs_prefix: String,
	compressed_suffix: String,
	cache: Option<CacheOptions>,
	error_responder: Option<Option<Arc<dyn ErrorResponder>>>,
	header_policy: Option<Option<Arc<dyn HeaderPolicy>>>,
	media_types: Vec<(Regex, String, RulePosition)>,
}

impl AssetServerBuilder {
	/// Sets the route prefix
	pub fn route(mut self, route: impl Into<String>) -> Self {
		self.route = Some(route.into());
		self
	}

	/// Sets the backing store
	pub fn store(mut self, store: Arc<dyn FileStore>) -> Self {
		self.store = Some(store);
		self
	}

	/// Sets the filesystem prefix
	pub fn fs_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.fs_prefix = prefix.into();
		self
	}

	/// Sets the compressed-variant suffix
	pub fn compressed_suffix(mut self, suffix: impl Into<String>) -> Self {
		self.compressed_suffix = suffix.into();
		self
	}

	/// Caches whole-file reads in front of the store
	pub fn cache(mut self, options: CacheOptions) -> Self {
		self.cache = Some(options);
		self
	}

	/// Replaces the default error responder
	pub fn error_responder(mut self, responder: Arc<dyn ErrorResponder>) -> Self {
		self.error_responder = Some(Some(responder));
		self
	}

	/// Leaves failed responses untouched
	pub fn no_error_responder(mut self) -> Self {
		self.error_responder = Some(None);
		self
	}

	/// Replaces the default header policy
	pub fn header_policy(mut self, policy: Arc<dyn HeaderPolicy>) -> Self {
		self.header_policy = Some(Some(policy));
		self
	}

	/// Adds no extra headers to successful responses
	pub fn no_header_policy(mut self) -> Self {
		self.header_policy = Some(None);
		self
	}

	/// Registers an extra media type rule
	pub fn media_type(
		mut self,
		pattern: Regex,
		media_type: impl Into<String>,
		position: RulePosition,
	) -> Self {
		self.media_types.push((pattern, media_type.into(), position));
		self
	}

	/// Builds and validates the server
	///
	/// # Errors
	///
	/// Returns [`AssetError::MissingStore`] or [`AssetError::EmptyRoute`] for
	/// missing parts, [`AssetError::DuplicateMediaType`] for a media type
	/// registered twice, and any error from [`AssetServer::check`].
	pub fn build(self) -> Result<AssetServer> {
		let mut store = self.store.ok_or(AssetError::MissingStore)?;
		if let Some(options) = self.cache {
			store = Arc::new(CachingFs::new(store, options));
		}

		let mut server = AssetServer::new(self.route.unwrap_or_default(), store)?;
		server.set_fs_prefix(self.fs_prefix);
		server.set_compressed_suffix(self.compressed_suffix);
		if let Some(responder) = self.error_responder {
			server.set_error_responder(responder);
		}
		if let Some(policy) = self.header_policy {
			server.set_header_policy(policy);
		}
		for (pattern, media_type, position) in self.media_types {
			if !server.register_media_type(pattern, media_type.as_str(), position) {
				return Err(AssetError::DuplicateMediaType(media_type));
			}
		}

		server.check()?;
		tracing::debug!(server = ?server, "asset server configured");
		Ok(server)
	}
}
