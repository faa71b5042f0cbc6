//! Transport abstraction.
//!
//! A [`Dialer`] opens a [`Connection`] to one endpoint address. Each
//! connection carries whole frames: one `send` writes one request frame and
//! one `recv` yields one response frame.
//!
//! ```text
//! ConnectionFactory
//!   └── Dialer (WebSocketDialer in production)
//!         └── Connection (WebSocketConnection)
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use super::error::DriverResult;

pub mod websocket;

#[cfg(test)]
pub(crate) mod testing;

pub use websocket::{WebSocketConnection, WebSocketDialer};

/// A frame-oriented, bidirectional connection to one server.
#[async_trait]
pub trait Connection: Send {
    /// Write one frame.
    async fn send(&mut self, frame: Bytes) -> DriverResult<()>;

    /// Read the next frame.
    async fn recv(&mut self) -> DriverResult<Bytes>;

    /// Close the connection.
    async fn close(&mut self) -> DriverResult<()>;
}

/// Opens connections to endpoint addresses.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Dial `address`.
    async fn dial(&self, address: &Url) -> DriverResult<Box<dyn Connection>>;
}
