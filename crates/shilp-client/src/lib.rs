//! # shilp-client
//!
//! HTTP client for the Shilp vector database.
//!
//! - [`ShilpClient`]: collections, records, ingestion, search, storage and
//!   debug introspection
//! - [`OplogClient`]: oplog paging and replica heartbeats
//! - [`DiscoveryClient`]: service registry and sync status
//!
//! All three share [`HttpTransport`] and report failures as
//! [`shilp_core::Error`].
//!
//! # Example
//!
//! ```rust,no_run
//! use shilp_client::{ClientConfig, ShilpClient};
//! use shilp_core::{CompoundFilter, FilterExpression, SearchRequest};
//!
//! # async fn run() -> shilp_core::Result<()> {
//! let client = ShilpClient::new(ClientConfig::new("http://localhost:3000"))?;
//!
//! let request = SearchRequest::new("articles", "rust async runtimes")
//!     .with_limit(10)
//!     .with_filters(CompoundFilter::new().and(FilterExpression::gte("year", 2020)));
//! let results = client.search(&request).await?;
//! println!("{} hits", results.data.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod collections;
pub mod config;
pub mod data;
pub mod debug;
pub mod discovery;
pub mod oplog;
pub mod streaming;
pub mod transport;

pub use client::ShilpClient;
pub use config::{ClientConfig, ConfigError};
pub use discovery::DiscoveryClient;
pub use oplog::{OplogClient, SyncStep};
pub use streaming::{ByteStream, EventSubscription};
pub use transport::HttpTransport;
