//! Connection Factory
//!
//! 건강한 엔드포인트를 골라 연결을 엽니다. 다이얼에 실패한 엔드포인트는
//! 냉각시키고 다른 엔드포인트로 다시 시도합니다.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::error::{DriverError, DriverResult};
use super::routing::{breaker, EndpointRegistry};
use super::transport::{Connection, Dialer};

/// 기본 연결 타임아웃
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// 새로 열린 연결과 그 연결이 속한 엔드포인트 주소
pub struct DialedConnection {
    /// 다이얼한 엔드포인트 주소
    pub address: String,
    /// 전송 연결
    pub connection: Box<dyn Connection>,
}

impl std::fmt::Debug for DialedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialedConnection")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// 연결 팩토리
pub struct ConnectionFactory {
    registry: Arc<EndpointRegistry>,
    dialer: Arc<dyn Dialer>,
    connect_timeout: Duration,
}

impl ConnectionFactory {
    /// 새 팩토리 생성
    pub fn new(registry: Arc<EndpointRegistry>, dialer: Arc<dyn Dialer>) -> Self {
        Self {
            registry,
            dialer,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// 연결 타임아웃 설정
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// 레지스트리
    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    /// 연결 생성
    ///
    /// 선택 → 다이얼을 반복합니다. 실패할 때마다 해당 엔드포인트가
    /// 냉각되므로 결국 성공하거나 [`DriverError::ServiceUnavailable`]로
    /// 끝납니다.
    pub async fn dial(&self) -> DriverResult<DialedConnection> {
        loop {
            let endpoint = self.registry.select_healthy()?;
            let address = endpoint.url();

            let failure = match tokio::time::timeout(self.connect_timeout, self.dialer.dial(address)).await {
                Ok(Ok(connection)) => {
                    debug!(endpoint = %address, "connection established");
                    return Ok(DialedConnection {
                        address: endpoint.address().to_string(),
                        connection,
                    });
                }
                Ok(Err(e)) => e,
                Err(_) => DriverError::timeout(format!(
                    "connect to {} timed out after {:?}",
                    address, self.connect_timeout
                )),
            };

            warn!(endpoint = %address, error = %failure, "dial failed");
            breaker::penalize(&endpoint);
        }
    }
}

impl std::fmt::Debug for ConnectionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionFactory")
            .field("endpoints", &self.registry.len())
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
