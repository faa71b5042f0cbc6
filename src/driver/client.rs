//! Client
//!
//! 클라이언트 인스턴스 및 설정

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use url::Url;

use super::engine::ProtocolEngine;
use super::error::{DriverError, DriverResult};
use super::factory::{ConnectionFactory, DEFAULT_CONNECT_TIMEOUT};
use super::pool::{ConnectionPool, PoolConfig, PoolMetrics};
use super::routing::{parse_addresses, EndpointRegistry, EndpointSnapshot};
use super::transport::{Dialer, WebSocketDialer};
use crate::protocol::Request;

/// 사용자명 환경 변수 기본 이름
pub const USER_ENV_VAR: &str = "GREMLIN_USER";

/// 비밀번호 환경 변수 기본 이름
pub const PASS_ENV_VAR: &str = "GREMLIN_PASS";

// ============================================================================
// AuthToken - 인증 토큰
// ============================================================================

/// 인증 토큰
///
/// 서버가 407 챌린지를 보내면 SASL PLAIN으로 응답하는 데 쓰입니다.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum AuthToken {
    /// 인증 없음
    #[default]
    None,
    /// Basic 인증 (사용자명/비밀번호)
    Basic {
        /// 사용자명
        username: String,
        /// 비밀번호
        password: String,
    },
}

impl AuthToken {
    /// Basic 인증 토큰 생성
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// 인증 없음
    pub fn none() -> Self {
        Self::None
    }

    /// `GREMLIN_USER` / `GREMLIN_PASS` 환경 변수에서 읽기
    pub fn from_env() -> DriverResult<Self> {
        Self::from_env_vars(USER_ENV_VAR, PASS_ENV_VAR)
    }

    /// 지정한 환경 변수에서 읽기
    ///
    /// 변수가 없으면 설정 에러입니다.
    pub fn from_env_vars(user_var: &str, pass_var: &str) -> DriverResult<Self> {
        let read = |name: &str| {
            env::var(name).map_err(|_| {
                DriverError::configuration(format!("environment variable {} is not set", name))
            })
        };
        Ok(Self::basic(read(user_var)?, read(pass_var)?))
    }

    /// 인증 스킴
    pub fn scheme(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Basic { .. } => "basic",
        }
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

// ============================================================================
// ClientConfig - 클라이언트 설정
// ============================================================================

/// 클라이언트 설정
///
/// | 필드 | 기본값 | 설명 |
/// |------|--------|------|
/// | `pool.max_size` | 30 | 최대 연결 수 |
/// | `pool.min_idle` | 1 | 워밍업 연결 수 |
/// | `pool.acquisition_timeout` | 30초 | 연결 획득 타임아웃 |
/// | `connect_timeout` | 1초 | 엔드포인트 다이얼 타임아웃 |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 엔드포인트 주소 (입력 순서)
    pub addresses: Vec<Url>,
    /// 인증 토큰
    pub auth: AuthToken,
    /// 연결 풀 설정
    pub pool: PoolConfig,
    /// 연결 타임아웃
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// 쉼표로 구분된 주소 문자열로 설정 생성
    ///
    /// 예: `"ws://server1:8182, ws://server2:8182"`
    pub fn new(addresses: &str, auth: AuthToken) -> DriverResult<Self> {
        Self::from_list([addresses], auth)
    }

    /// 주소 문자열 목록으로 설정 생성
    ///
    /// 각 원소도 쉼표로 구분된 목록일 수 있습니다.
    pub fn from_list<I, S>(addresses: I, auth: AuthToken) -> DriverResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for item in addresses {
            parsed.extend(parse_addresses(item.as_ref())?);
        }

        if parsed.is_empty() {
            return Err(DriverError::configuration("no valid endpoints provided"));
        }

        Ok(Self {
            addresses: parsed,
            auth,
            pool: PoolConfig::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// 빌더 시작
    pub fn builder(addresses: &str, auth: AuthToken) -> DriverResult<ClientConfigBuilder> {
        let config = Self::new(addresses, auth)?;
        Ok(ClientConfigBuilder { config })
    }
}

// ============================================================================
// ClientConfigBuilder - 설정 빌더
// ============================================================================

/// 클라이언트 설정 빌더
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// 연결 풀 크기 설정
    pub fn with_max_pool_size(mut self, size: usize) -> Self {
        self.config.pool.max_size = size;
        self
    }

    /// 최소 유휴 연결 수 설정
    pub fn with_min_idle(mut self, size: usize) -> Self {
        self.config.pool.min_idle = size;
        self
    }

    /// 생성 시 워밍업 여부 설정
    pub fn with_warmup(mut self, enabled: bool) -> Self {
        self.config.pool.warmup_on_init = enabled;
        self
    }

    /// 연결 획득 타임아웃 설정
    pub fn with_acquisition_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool.acquisition_timeout = timeout;
        self
    }

    /// 연결 타임아웃 설정
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// 유휴 타임아웃 설정
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool.idle_timeout = timeout;
        self
    }

    /// 연결 최대 수명 설정
    pub fn with_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.config.pool.max_lifetime = lifetime;
        self
    }

    /// 인증 토큰 설정
    pub fn with_auth(mut self, auth: AuthToken) -> Self {
        self.config.auth = auth;
        self
    }

    /// 빌드
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

// ============================================================================
// Client - 클라이언트
// ============================================================================

/// 부하 분산 Gremlin 클라이언트
///
/// `Send + Sync`이므로 `Arc`로 감싸 여러 태스크에서 동시에 쓸 수 있습니다.
/// 요청마다 연결 하나를 빌려 씁니다.
pub struct Client {
    /// 설정
    config: ClientConfig,
    /// 엔드포인트 레지스트리
    registry: Arc<EndpointRegistry>,
    /// 연결 풀
    pool: Arc<ConnectionPool>,
    /// 프로토콜 엔진
    engine: ProtocolEngine,
    /// 열린 상태
    open: RwLock<bool>,
}

impl Client {
    /// WebSocket 전송으로 클라이언트 생성
    pub fn new(config: ClientConfig) -> DriverResult<Self> {
        Self::with_dialer(config, Arc::new(WebSocketDialer))
    }

    /// 지정한 다이얼러로 클라이언트 생성
    pub fn with_dialer(config: ClientConfig, dialer: Arc<dyn Dialer>) -> DriverResult<Self> {
        let registry = Arc::new(EndpointRegistry::new(config.addresses.iter().cloned())?);
        let factory = ConnectionFactory::new(Arc::clone(&registry), dialer)
            .with_connect_timeout(config.connect_timeout);
        let pool = Arc::new(ConnectionPool::new(config.pool.clone(), factory));
        let engine = ProtocolEngine::new(Arc::clone(&pool), Arc::clone(&registry), config.auth.clone());

        tracing::info!(endpoints = registry.len(), max_pool_size = config.pool.max_size, "client created");

        Ok(Self {
            config,
            registry,
            pool,
            engine,
            open: RwLock::new(true),
        })
    }

    /// 클라이언트 생성 후 설정에 따라 워밍업
    pub async fn connect(config: ClientConfig) -> DriverResult<Self> {
        let client = Self::new(config)?;
        client.pool.warmup_if_enabled().await?;
        Ok(client)
    }

    /// 스크립트 실행
    pub async fn execute_query(&self, gremlin: impl Into<String>) -> DriverResult<Value> {
        self.execute(&Request::query(gremlin)).await
    }

    /// 요청 실행
    pub async fn execute(&self, request: &Request) -> DriverResult<Value> {
        self.ensure_open()?;
        self.engine.execute(request).await
    }

    /// 연결 풀 워밍업 (min_idle 개수만큼)
    pub async fn warmup(&self) -> DriverResult<usize> {
        self.ensure_open()?;
        self.pool.warmup(0).await
    }

    /// 클라이언트 종료
    pub async fn close(&self) -> DriverResult<()> {
        {
            let mut open = self.open.write();
            if !*open {
                return Ok(());
            }
            *open = false;
        }

        self.pool.close_all().await
    }

    /// 열린 상태 여부
    pub fn is_open(&self) -> bool {
        *self.open.read()
    }

    /// 클라이언트 설정
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 엔드포인트 상태 스냅샷
    pub fn endpoints(&self) -> Vec<EndpointSnapshot> {
        self.registry.snapshots()
    }

    /// 메트릭 조회
    pub fn metrics(&self) -> ClientMetrics {
        ClientMetrics {
            pool: self.pool.metrics(),
            endpoints: self.endpoints(),
        }
    }

    /// 열린 상태 확인
    fn ensure_open(&self) -> DriverResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(DriverError::pool("Client is closed"))
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoints", &self.registry.len())
            .field("open", &self.is_open())
            .finish()
    }
}

// ============================================================================
// ClientMetrics - 클라이언트 메트릭
// ============================================================================

/// 클라이언트 메트릭
#[derive(Debug, Clone, Default)]
pub struct ClientMetrics {
    /// 연결 풀 메트릭
    pub pool: PoolMetrics,
    /// 엔드포인트별 상태
    pub endpoints: Vec<EndpointSnapshot>,
}

impl ClientMetrics {
    /// 냉각 중인 엔드포인트 수
    pub fn endpoints_on_ice(&self) -> usize {
        self.endpoints.iter().filter(|e| e.on_ice).count()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::transport::testing::{addresses, MockDialer, Reply};
    use serde_json::json;

    fn client(hosts: &[&str], dialer: Arc<MockDialer>) -> Client {
        let config = ClientConfig::new(&addresses(hosts), AuthToken::none()).unwrap();
        Client::with_dialer(config, dialer).unwrap()
    }

    #[test]
    fn test_auth_token_basic() {
        let auth = AuthToken::basic("gremlin", "password");
        assert_eq!(auth.scheme(), "basic");

        if let AuthToken::Basic { username, password } = &auth {
            assert_eq!(username, "gremlin");
            assert_eq!(password, "password");
        } else {
            panic!("Expected Basic auth");
        }

        let debug = format!("{:?}", auth);
        assert!(debug.contains("gremlin"));
        assert!(!debug.contains("password\""));
    }

    #[test]
    fn test_auth_token_none() {
        let auth = AuthToken::none();
        assert_eq!(auth.scheme(), "none");
        assert_eq!(auth, AuthToken::default());
    }

    #[test]
    fn test_auth_token_from_env_vars() {
        env::set_var("GREMLIN_DRIVER_TEST_USER", "env-user");
        env::set_var("GREMLIN_DRIVER_TEST_PASS", "env-pass");

        let auth = AuthToken::from_env_vars("GREMLIN_DRIVER_TEST_USER", "GREMLIN_DRIVER_TEST_PASS").unwrap();
        assert_eq!(auth, AuthToken::basic("env-user", "env-pass"));
    }

    #[test]
    fn test_auth_token_from_env_missing() {
        let err = AuthToken::from_env_vars("GREMLIN_DRIVER_TEST_UNSET_USER", "GREMLIN_DRIVER_TEST_UNSET_PASS")
            .unwrap_err();
        assert!(matches!(err, DriverError::Configuration(_)));
        assert!(err.to_string().contains("GREMLIN_DRIVER_TEST_UNSET_USER"));
    }

    #[test]
    fn test_client_config() {
        let config = ClientConfig::new("ws://a:8182, ws://b:8182", AuthToken::none()).unwrap();
        assert_eq!(config.addresses.len(), 2);
        assert_eq!(config.pool.max_size, 30);
        assert_eq!(config.pool.min_idle, 1);
        assert_eq!(config.pool.acquisition_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_client_config_from_list() {
        let config = ClientConfig::from_list(
            vec!["ws://a:8182", "ws://b:8182, ws://c:8182", ""],
            AuthToken::none(),
        )
        .unwrap();
        assert_eq!(config.addresses.len(), 3);
    }

    #[test]
    fn test_client_config_rejects_malformed() {
        let err = ClientConfig::new("ws://a:8182, a-host:8182", AuthToken::none()).unwrap_err();
        assert!(matches!(err, DriverError::Configuration(_)));
        assert!(err.to_string().contains("expected format"));

        let err = ClientConfig::new("  ", AuthToken::none()).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: no valid endpoints provided");
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::builder("ws://a:8182", AuthToken::none())
            .unwrap()
            .with_max_pool_size(4)
            .with_min_idle(2)
            .with_warmup(true)
            .with_connect_timeout(Duration::from_millis(250))
            .with_acquisition_timeout(Duration::from_secs(5))
            .with_auth(AuthToken::basic("u", "p"))
            .build();

        assert_eq!(config.pool.max_size, 4);
        assert_eq!(config.pool.min_idle, 2);
        assert!(config.pool.warmup_on_init);
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.pool.acquisition_timeout, Duration::from_secs(5));
        assert_eq!(config.auth.scheme(), "basic");
    }

    #[test]
    fn test_client_creation() {
        let config = ClientConfig::new("ws://localhost:8182/gremlin", AuthToken::none()).unwrap();
        let client = Client::new(config).unwrap();
        assert!(client.is_open());
        assert_eq!(client.endpoints().len(), 1);
    }

    #[test]
    fn test_client_deduplicates_endpoints() {
        let dialer = Arc::new(MockDialer::answering(json!([])));
        let client = client(&["a", "b", "a", "c", "b"], dialer);

        let endpoints = client.endpoints();
        assert_eq!(endpoints.len(), 3);
        assert!(endpoints.iter().all(|e| e.error_score == 0 && !e.on_ice));
    }

    #[tokio::test]
    async fn test_execute_query() {
        let dialer = Arc::new(MockDialer::answering(json!([{"@type": "g:Int64", "@value": 6}])));
        let client = client(&["a"], dialer.clone());

        let value = client.execute_query("g.V().count()").await.unwrap();
        assert_eq!(value[0]["@value"], 6);

        let requests = dialer.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].args().gremlin.as_deref(), Some("g.V().count()"));
    }

    #[tokio::test]
    async fn test_execute_request_with_bindings() {
        let dialer = Arc::new(MockDialer::new(|req| {
            let x = req.args().bindings.get("x").cloned().unwrap_or(Value::Null);
            vec![Reply::success(req.request_id(), json!([x]))]
        }));
        let client = client(&["a"], dialer);

        let request = Request::query("g.V(x)").bind("x", 7);
        assert_eq!(client.execute(&request).await.unwrap(), json!([7]));
    }

    #[tokio::test]
    async fn test_failover_to_next_endpoint() {
        let dialer = Arc::new(MockDialer::answering(json!(["ok"])).fail_host("a"));
        let client = client(&["a", "b"], dialer.clone());

        assert_eq!(client.execute_query("g.V()").await.unwrap(), json!(["ok"]));
        assert_eq!(dialer.dials(), vec!["a", "b"]);

        let endpoints = client.endpoints();
        let a = endpoints.iter().find(|e| e.address == "ws://a:8182/").unwrap();
        let b = endpoints.iter().find(|e| e.address == "ws://b:8182/").unwrap();
        assert_eq!(a.error_score, 1);
        assert!(a.on_ice);
        assert_eq!(b.error_score, 0);
        assert_eq!(client.metrics().endpoints_on_ice(), 1);
    }

    #[tokio::test]
    async fn test_all_endpoints_unavailable() {
        let dialer = Arc::new(MockDialer::answering(json!([])).fail_host("a").fail_host("b"));
        let client = client(&["a", "b"], dialer.clone());

        let err = client.execute_query("g.V()").await.unwrap_err();
        assert!(matches!(err, DriverError::ServiceUnavailable(_)));

        // Endpoints are on ice: fails without dialing again.
        dialer.heal_host("a");
        let err = client.execute_query("g.V()").await.unwrap_err();
        assert!(matches!(err, DriverError::ServiceUnavailable(_)));
        assert_eq!(dialer.dials().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_execute() {
        let dialer = Arc::new(MockDialer::new(|req| {
            let id = req.request_id();
            vec![Reply::partial(id, json!([1])), Reply::success(id, json!([2]))]
        }));
        let config = ClientConfig::builder(&addresses(&["a", "b", "c"]), AuthToken::none())
            .unwrap()
            .with_max_pool_size(4)
            .build();
        let client = Arc::new(Client::with_dialer(config, dialer.clone()).unwrap());

        let mut handles = Vec::new();
        for _ in 0..32 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move { client.execute_query("g.V()").await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), json!([1, 2]));
        }

        let metrics = client.metrics();
        assert_eq!(metrics.pool.in_use, 0);
        assert!(metrics.pool.size <= 4);
        assert_eq!(metrics.pool.total_acquisitions, 32);
        assert!(dialer.opened() <= 4);
        assert_eq!(dialer.requests().len(), 32);
    }

    #[tokio::test]
    async fn test_warmup() {
        let dialer = Arc::new(MockDialer::answering(json!([])));
        let config = ClientConfig::builder(&addresses(&["a", "b"]), AuthToken::none())
            .unwrap()
            .with_min_idle(2)
            .build();
        let client = Client::with_dialer(config, dialer.clone()).unwrap();

        assert_eq!(client.warmup().await.unwrap(), 2);
        assert_eq!(client.metrics().pool.idle, 2);
        assert_eq!(dialer.dials(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_close() {
        let dialer = Arc::new(MockDialer::answering(json!([])));
        let client = client(&["a"], dialer.clone());

        client.execute_query("g.V()").await.unwrap();
        client.close().await.unwrap();
        client.close().await.unwrap();

        assert!(!client.is_open());
        assert_eq!(dialer.closed(), 1);
        assert!(matches!(client.execute_query("g.V()").await, Err(DriverError::Pool(_))));
    }
}
