//! # Reinhardt Assets
//!
//! Static asset serving for Reinhardt from any read-only file store.
//!
//! This crate provides:
//! - A pull-through, bounded, in-memory file cache with coalesced loads
//! - Pre-compressed variant lookup (`app.js` served from `app.js.br`)
//! - Ordered, first-match-wins media type inference
//! - Pluggable error translation and response header policies
//! - A hyper [`Service`](hyper::service::Service) adapter
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reinhardt_assets::{AssetServer, caching::CacheOptions, store::LocalStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = AssetServer::builder()
//!         .route("/static/")
//!         .store(Arc::new(LocalStore::new("static")))
//!         .compressed_suffix(".br")
//!         .cache(CacheOptions::default())
//!         .build()?;
//!
//!     let service = server.into_service();
//!     // http1::Builder::new().serve_connection(io, service.clone())
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`store`] - Backing store trait with local and in-memory stores
//! - [`caching`] - Pull-through caching filesystem
//! - [`media_type`] - Media type rules
//! - [`policy`] - Error and header policies
//! - [`server`] - Request path resolution and responses
//! - [`service`] - hyper service adapter
//! - [`settings`] - Declarative configuration
//! - [`error`] - Error types

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod caching;
pub mod error;
pub mod media_type;
pub mod policy;
pub mod server;
pub mod service;
pub mod settings;
pub mod store;

// Re-export main types
pub use caching::{CacheOptions, CacheStatistics, CachingFs};
pub use error::{AssetError, CacheError, Result};
pub use media_type::{MediaTypeRule, MediaTypeTable, RulePosition};
pub use policy::{CacheControlHeaders, ErrorResponder, HeaderPolicy, StatusErrorResponder};
pub use server::{AssetServer, AssetServerBuilder, ResolvedAsset};
pub use service::AssetService;
pub use settings::AssetsSettings;
pub use store::{FileStore, FileStream, LocalStore, MemoryStore};
