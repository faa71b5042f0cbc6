//! In-memory transport for tests.
//!
//! [`MockDialer`] hands out [`MockConnection`]s that decode every request
//! they receive and queue the replies produced by a shared handler, so a
//! test plays the server side with a plain closure.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use super::{Connection, Dialer};
use crate::driver::error::{DriverError, DriverResult};
use crate::protocol::{GraphSonCodec, Request, ResponseFrame};

/// One scripted server reply.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// A well-formed response frame
    Frame(ResponseFrame),
    /// Raw bytes, e.g. malformed JSON
    Raw(Bytes),
    /// Transport failure on read
    Fail(String),
}

impl Reply {
    pub(crate) fn success(request_id: Uuid, data: Value) -> Self {
        Reply::Frame(ResponseFrame::success(request_id, data))
    }

    pub(crate) fn partial(request_id: Uuid, data: Value) -> Self {
        Reply::Frame(ResponseFrame::partial(request_id, data))
    }

    pub(crate) fn no_content(request_id: Uuid) -> Self {
        Reply::Frame(ResponseFrame::no_content(request_id))
    }

    pub(crate) fn authenticate(challenge_id: Uuid) -> Self {
        Reply::Frame(ResponseFrame::authenticate(challenge_id))
    }

    pub(crate) fn error(request_id: Uuid, code: u16, message: &str) -> Self {
        Reply::Frame(ResponseFrame::error(request_id, code, message))
    }
}

/// Server behaviour: the replies to queue for each request received.
pub(crate) type Handler = Arc<dyn Fn(&Request) -> Vec<Reply> + Send + Sync>;

/// Shared observation state.
#[derive(Default)]
struct Journal {
    dials: Mutex<Vec<String>>,
    requests: Mutex<Vec<Request>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Scripted connection.
pub(crate) struct MockConnection {
    handler: Handler,
    codec: GraphSonCodec,
    pending: VecDeque<Reply>,
    journal: Arc<Journal>,
    fail_send: bool,
    closed: bool,
}

#[async_trait]
impl Connection for MockConnection {
    async fn send(&mut self, frame: Bytes) -> DriverResult<()> {
        if self.closed {
            return Err(DriverError::connection("connection closed"));
        }
        if self.fail_send {
            return Err(DriverError::connection("broken pipe"));
        }

        let request = self.codec.decode_request(&frame)?;
        self.pending.extend((self.handler)(&request));
        self.journal.requests.lock().push(request);
        Ok(())
    }

    async fn recv(&mut self) -> DriverResult<Bytes> {
        if self.closed {
            return Err(DriverError::connection("connection closed"));
        }

        match self.pending.pop_front() {
            Some(Reply::Frame(frame)) => Ok(self.codec.encode_response(&frame)?),
            Some(Reply::Raw(bytes)) => Ok(bytes),
            Some(Reply::Fail(msg)) => Err(DriverError::connection(msg)),
            None => Err(DriverError::connection("connection closed by server")),
        }
    }

    async fn close(&mut self) -> DriverResult<()> {
        if !self.closed {
            self.closed = true;
            self.journal.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Scripted dialer.
pub(crate) struct MockDialer {
    handler: Handler,
    journal: Arc<Journal>,
    failing_hosts: Mutex<HashSet<String>>,
    hanging_hosts: Mutex<HashSet<String>>,
    broken_send: bool,
}

impl MockDialer {
    pub(crate) fn new(handler: impl Fn(&Request) -> Vec<Reply> + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            journal: Arc::new(Journal::default()),
            failing_hosts: Mutex::new(HashSet::new()),
            hanging_hosts: Mutex::new(HashSet::new()),
            broken_send: false,
        }
    }

    /// Answer every query with `data` in a single 200 frame.
    pub(crate) fn answering(data: Value) -> Self {
        Self::new(move |req| vec![Reply::success(req.request_id(), data.clone())])
    }

    /// Refuse dials to `host`.
    pub(crate) fn fail_host(self, host: &str) -> Self {
        self.failing_hosts.lock().insert(host.to_string());
        self
    }

    /// Never complete dials to `host`.
    pub(crate) fn hang_host(self, host: &str) -> Self {
        self.hanging_hosts.lock().insert(host.to_string());
        self
    }

    /// Connections fail on every write.
    pub(crate) fn with_broken_send(mut self) -> Self {
        self.broken_send = true;
        self
    }

    /// Stop refusing dials to `host`.
    pub(crate) fn heal_host(&self, host: &str) {
        self.failing_hosts.lock().remove(host);
    }

    /// Hosts dialed so far, in order.
    pub(crate) fn dials(&self) -> Vec<String> {
        self.journal.dials.lock().clone()
    }

    /// Requests received so far, in order.
    pub(crate) fn requests(&self) -> Vec<Request> {
        self.journal.requests.lock().clone()
    }

    /// Connections successfully opened.
    pub(crate) fn opened(&self) -> usize {
        self.journal.opened.load(Ordering::SeqCst)
    }

    /// Connections closed by the client.
    pub(crate) fn closed(&self) -> usize {
        self.journal.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dialer for MockDialer {
    async fn dial(&self, address: &Url) -> DriverResult<Box<dyn Connection>> {
        let host = address.host_str().unwrap_or_default().to_string();
        self.journal.dials.lock().push(host.clone());

        let hangs = self.hanging_hosts.lock().contains(&host);
        if hangs {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let refused = self.failing_hosts.lock().contains(&host);
        if refused {
            return Err(DriverError::connection(format!("Failed to connect to {}: refused", address)));
        }

        self.journal.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            handler: Arc::clone(&self.handler),
            codec: GraphSonCodec::new(),
            pending: VecDeque::new(),
            journal: Arc::clone(&self.journal),
            fail_send: self.broken_send,
            closed: false,
        }))
    }
}

/// Address list for the given hosts on port 8182.
pub(crate) fn addresses(hosts: &[&str]) -> String {
    hosts
        .iter()
        .map(|h| format!("ws://{}:8182", h))
        .collect::<Vec<_>>()
        .join(", ")
}
