//! Driver Module
//!
//! 부하 분산 + 연결 풀링 Gremlin 클라이언트
//!
//! # 구성
//!
//! - 라우팅: 엔드포인트 레지스트리, 선택기, 서킷 브레이커 ([`routing`])
//! - 전송: `Dialer` / `Connection` 추상화와 WebSocket 구현 ([`transport`])
//! - 연결 팩토리 + 연결 풀 (ConnectionFactory, ConnectionPool, PoolConfig)
//! - 프로토콜 엔진: 응답 상태 머신, SASL 챌린지 처리 (ProtocolEngine)
//! - 클라이언트 (Client, ClientConfig, AuthToken)
//!
//! ```text
//! Client::execute
//!   └── ProtocolEngine
//!         ├── ConnectionPool::acquire
//!         │     └── ConnectionFactory → EndpointRegistry::select_healthy → Dialer
//!         ├── 요청 전송 / 응답 수신 (ResponseStateMachine)
//!         └── breaker::reward | breaker::penalize → release | discard
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gremlin_driver::driver::{AuthToken, Client, ClientConfig};
//!
//! # async fn example() -> gremlin_driver::driver::DriverResult<()> {
//! let config = ClientConfig::new(
//!     "ws://server1:8182/gremlin, ws://server2:8182/gremlin",
//!     AuthToken::from_env()?,
//! )?;
//! let client = Client::new(config)?;
//!
//! let count = client.execute_query("g.V().count()").await?;
//! println!("{}", count);
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod routing;
pub mod transport;
mod client;
mod engine;
mod error;
mod factory;
mod pool;

// Re-exports
pub use client::{
    AuthToken, Client, ClientConfig, ClientConfigBuilder, ClientMetrics, PASS_ENV_VAR, USER_ENV_VAR,
};
pub use engine::{ExchangeState, ProtocolEngine, ResponseStateMachine, Step};
pub use error::{DriverError, DriverResult};
pub use factory::{ConnectionFactory, DialedConnection, DEFAULT_CONNECT_TIMEOUT};
pub use pool::{ConnectionPool, ConnectionState, PoolConfig, PoolConfigBuilder, PoolMetrics, PooledConnection};
