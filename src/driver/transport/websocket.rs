//! WebSocket transport.
//!
//! Request frames go out as binary messages. Responses may arrive as text
//! or binary messages; control messages are skipped.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use super::{Connection, Dialer};
use crate::driver::error::{DriverError, DriverResult};

/// WebSocket connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebSocketState {
    /// Open and usable
    Open,
    /// Closed by either side
    Closed,
}

/// Client-side WebSocket connection.
pub struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    state: WebSocketState,
    address: String,
}

impl WebSocketConnection {
    /// Connect to a WebSocket server.
    pub async fn connect(address: &Url) -> DriverResult<Self> {
        let (stream, _response) = connect_async(address.as_str())
            .await
            .map_err(|e| DriverError::connection(format!("Failed to connect to {}: {}", address, e)))?;

        Ok(Self {
            stream,
            state: WebSocketState::Open,
            address: address.to_string(),
        })
    }

    /// Connection state.
    pub fn state(&self) -> WebSocketState {
        self.state
    }

    /// Server address.
    pub fn address(&self) -> &str {
        &self.address
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.state != WebSocketState::Open {
            return Err(DriverError::connection(format!(
                "Connection to {} is closed",
                self.address
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn send(&mut self, frame: Bytes) -> DriverResult<()> {
        self.ensure_open()?;

        if let Err(e) = self.stream.send(Message::Binary(frame.to_vec())).await {
            self.state = WebSocketState::Closed;
            return Err(DriverError::connection(format!("Send failed: {}", e)));
        }
        Ok(())
    }

    async fn recv(&mut self) -> DriverResult<Bytes> {
        self.ensure_open()?;

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Bytes::from(data)),
                Some(Ok(Message::Text(text))) => return Ok(Bytes::from(text)),
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Close(_))) | None => {
                    self.state = WebSocketState::Closed;
                    return Err(DriverError::connection("Connection closed by server"));
                }
                Some(Err(e)) => {
                    self.state = WebSocketState::Closed;
                    return Err(DriverError::connection(format!("Read failed: {}", e)));
                }
            }
        }
    }

    async fn close(&mut self) -> DriverResult<()> {
        if self.state == WebSocketState::Closed {
            return Ok(());
        }
        self.state = WebSocketState::Closed;

        self.stream
            .close(None)
            .await
            .map_err(|e| DriverError::connection(format!("Close failed: {}", e)))
    }
}

/// Dials WebSocket connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketDialer;

#[async_trait]
impl Dialer for WebSocketDialer {
    async fn dial(&self, address: &Url) -> DriverResult<Box<dyn Connection>> {
        let connection = WebSocketConnection::connect(address).await?;
        Ok(Box::new(connection))
    }
}
