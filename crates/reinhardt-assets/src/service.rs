//! hyper integration
//!
//! [`AssetService`] lets an [`AssetServer`] answer requests forwarded by a
//! hyper connection or router. Every method is served; only the decoded URI
//! path is consulted. A path that does not decode to UTF-8 is answered
//! through the error responder with an `InvalidInput` error.

use crate::server::AssetServer;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::service::Service;
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

/// Cloneable hyper service around a shared [`AssetServer`]
///
/// # Example
///
/// ```rust,ignore
/// use hyper::server::conn::http1;
/// use hyper_util::rt::TokioIo;
///
/// let service = server.into_service();
/// let (stream, _) = listener.accept().await?;
/// http1::Builder::new()
///     .serve_connection(TokioIo::new(stream), service.clone())
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct AssetService {
	server: Arc<AssetServer>,
}

impl AssetService {
	/// Wraps a shared server
	pub fn new(server: Arc<AssetServer>) -> Self {
		Self { server }
	}

	/// Underlying server
	pub fn server(&self) -> &Arc<AssetServer> {
		&self.server
	}
}

impl<B> Service<Request<B>> for AssetService {
	type Response = Response<Full<Bytes>>;
	type Error = Infallible;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

	fn call(&self, request: Request<B>) -> Self::Future {
		let server = Arc::clone(&self.server);
		let raw_path = request.uri().path();
		let path = match percent_decode_str(raw_path).decode_utf8() {
			Ok(path) => path.into_owned(),
			Err(err) => {
				let err = io::Error::new(
					io::ErrorKind::InvalidInput,
					format!("open {}: invalid argument: {}", raw_path, err),
				);
				let response = server.error_response(raw_path, &err);
				return Box::pin(async move { Ok(response.map(Full::new)) });
			}
		};

		Box::pin(async move {
			let response = server.serve(&path).await;
			Ok(response.map(Full::new))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryStore;
	use http::{Method, StatusCode};
	use http_body_util::BodyExt;
	use rstest::rstest;

	fn service() -> AssetService {
		let store = Arc::new(
			MemoryStore::new()
				.with_file("test.css", "body { color: blue; }")
				.with_file("my file.txt", "spaced"),
		);
		AssetServer::new("/assets/", store).unwrap().into_service()
	}

	async fn body_string(response: Response<Full<Bytes>>) -> String {
		let bytes = response.into_body().collect().await.unwrap().to_bytes();
		String::from_utf8(bytes.to_vec()).unwrap()
	}

	#[rstest]
	#[case(Method::GET)]
	#[case(Method::HEAD)]
	#[case(Method::POST)]
	#[tokio::test]
	async fn test_any_method_is_served(#[case] method: Method) {
		let request = Request::builder()
			.method(method)
			.uri("/assets/test.css")
			.body(())
			.unwrap();

		let response = service().call(request).await.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(response.headers()["content-type"], "text/css");
		assert_eq!(body_string(response).await, "body { color: blue; }");
	}

	#[rstest]
	#[tokio::test]
	async fn test_path_is_percent_decoded() {
		let request = Request::get("/assets/my%20file.txt").body(()).unwrap();

		let response = service().call(request).await.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(body_string(response).await, "spaced");
	}

	#[rstest]
	#[tokio::test]
	async fn test_undecodable_path_is_rejected() {
		let request = Request::get("/assets/%FF.css").body(()).unwrap();

		let response = service().call(request).await.unwrap();

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert!(body_string(response).await.contains("invalid argument"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_query_is_ignored() {
		let request = Request::get("/assets/test.css?v=3").body(()).unwrap();

		let response = service().call(request).await.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_file_is_404() {
		let request = Request::get("/assets/nope.css").body(()).unwrap();

		let response = service().call(request).await.unwrap();

		assert_eq!(response.status(), StatusCode::NOT_FOUND);
		assert_eq!(body_string(response).await, "open nope.css: file does not exist");
	}
}
