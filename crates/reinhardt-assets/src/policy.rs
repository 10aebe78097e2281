//! Pluggable response policies
//!
//! An [`AssetServer`](crate::AssetServer) delegates two decisions:
//!
//! - [`ErrorResponder`] turns a failed read into a response.
//! - [`HeaderPolicy`] adds headers to every successful response, before the
//!   content headers are written.
//!
//! Both are implemented for plain closures.

use bytes::Bytes;
use http::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, Response, StatusCode};
use std::io;

/// Default `Cache-Control` value: clients cache assets for 7 days
pub const DEFAULT_CACHE_CONTROL: &str = "private, max-age=604800";

/// Translates read errors into responses
pub trait ErrorResponder: Send + Sync {
	/// Writes the error into `response`
	///
	/// `response` starts out as an empty `200 OK`.
	fn respond(&self, response: &mut Response<Bytes>, request_path: &str, error: &io::Error);
}

impl<F> ErrorResponder for F
where
	F: Fn(&mut Response<Bytes>, &str, &io::Error) + Send + Sync,
{
	fn respond(&self, response: &mut Response<Bytes>, request_path: &str, error: &io::Error) {
		self(response, request_path, error)
	}
}

/// Sets headers on successful responses
pub trait HeaderPolicy: Send + Sync {
	/// Adds headers for a response carrying `body`
	fn apply(&self, headers: &mut HeaderMap, body: &[u8]);
}

impl<F> HeaderPolicy for F
where
	F: Fn(&mut HeaderMap, &[u8]) + Send + Sync,
{
	fn apply(&self, headers: &mut HeaderMap, body: &[u8]) {
		self(headers, body)
	}
}

/// Maps read errors to status codes
///
/// | error kind           | status |
/// |----------------------|--------|
/// | `NotFound`           | 404    |
/// | `PermissionDenied`   | 403    |
/// | anything else        | 500    |
///
/// The body is the error message as `text/plain`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusErrorResponder;

impl StatusErrorResponder {
	/// Status code for an error kind
	pub fn status_for(kind: io::ErrorKind) -> StatusCode {
		match kind {
			io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
			io::ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl ErrorResponder for StatusErrorResponder {
	fn respond(&self, response: &mut Response<Bytes>, _request_path: &str, error: &io::Error) {
		*response.status_mut() = Self::status_for(error.kind());
		response
			.headers_mut()
			.append(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
		*response.body_mut() = Bytes::from(error.to_string());
	}
}

/// Adds a fixed `Cache-Control` header
#[derive(Debug, Clone)]
pub struct CacheControlHeaders {
	value: HeaderValue,
}

impl CacheControlHeaders {
	/// Uses `value` as the header
	///
	/// # Errors
	///
	/// Returns an error if `value` is not a valid header value.
	pub fn new(value: &str) -> Result<Self, http::header::InvalidHeaderValue> {
		Ok(Self {
			value: HeaderValue::from_str(value)?,
		})
	}

	/// `private, max-age=<seconds>`
	pub fn private_max_age(seconds: u64) -> Self {
		Self {
			value: HeaderValue::from_str(&format!("private, max-age={}", seconds))
				.unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CACHE_CONTROL)),
		}
	}

	/// Header value this policy sets
	pub fn value(&self) -> &HeaderValue {
		&self.value
	}
}

impl Default for CacheControlHeaders {
	fn default() -> Self {
		Self {
			value: HeaderValue::from_static(DEFAULT_CACHE_CONTROL),
		}
	}
}

impl HeaderPolicy for CacheControlHeaders {
	fn apply(&self, headers: &mut HeaderMap, _body: &[u8]) {
		headers.append(CACHE_CONTROL, self.value.clone());
	}
}
