//! # Gremlin Driver
//!
//! A load-balanced, pooled client for Gremlin Server.
//!
//! ## Features
//!
//! - **Multiple endpoints** - Requests are spread round-robin across every configured server
//! - **Circuit breaking** - Failing endpoints are put on ice with a quadratic backoff
//! - **Connection Pooling** - Connections are reused across requests, bounded by a configurable pool size
//! - **Batched results** - Partial-content frames are folded into a single result
//! - **SASL authentication** - Authentication challenges are answered transparently
//! - **Async/Await** - Built on Tokio; one `Client` can be shared by many tasks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gremlin_driver::{AuthToken, Client, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new(
//!         "ws://server1:8182/gremlin, ws://server2:8182/gremlin",
//!         AuthToken::basic("username", "password"),
//!     )?;
//!     let client = Client::connect(config).await?;
//!
//!     let result = client.execute_query("g.V().hasLabel('person').values('name')").await?;
//!     println!("{}", result);
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Requests
//!
//! [`Request`] carries bindings, aliases and other script arguments:
//!
//! ```rust,no_run
//! # use gremlin_driver::{Client, Request};
//! # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
//! let request = Request::query("g.V(id).values('name')")
//!     .bind("id", 1)
//!     .with_batch_size(64);
//! let names = client.execute(&request).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Authentication
//!
//! ```rust,no_run
//! use gremlin_driver::AuthToken;
//!
//! // Explicit credentials
//! let auth = AuthToken::basic("username", "password");
//!
//! // GREMLIN_USER / GREMLIN_PASS
//! let auth = AuthToken::from_env().unwrap();
//!
//! // No authentication
//! let auth = AuthToken::none();
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use gremlin_driver::{AuthToken, ClientConfig};
//! use std::time::Duration;
//!
//! let config = ClientConfig::builder("ws://localhost:8182/gremlin", AuthToken::none())
//!     .unwrap()
//!     .with_max_pool_size(50)
//!     .with_connect_timeout(Duration::from_millis(500))
//!     .with_warmup(true)
//!     .build();
//! assert_eq!(config.pool.max_size, 50);
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`DriverResult`]:
//!
//! ```rust,no_run
//! # use gremlin_driver::{Client, DriverError};
//! # async fn example(client: &Client) {
//! match client.execute_query("g.V()").await {
//!     Ok(value) => println!("{}", value),
//!     Err(DriverError::ServiceUnavailable(msg)) => eprintln!("No endpoint available: {}", msg),
//!     Err(DriverError::Server { status, message }) => eprintln!("{}: {}", status, message),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`driver`] - Client, pool, routing and transport
//! - [`protocol`] - Wire messages, status codes, request codec and SASL
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod driver;
pub mod protocol;

// Re-exports for convenience
pub use driver::{
    AuthToken, Client, ClientConfig, ClientConfigBuilder, ClientMetrics,
    DriverError, DriverResult,
    PoolConfig, PoolMetrics,
};

pub use protocol::{Request, ResponseFrame, StatusCode};

/// Config alias for convenience
pub type Config = ClientConfig;
