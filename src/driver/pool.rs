//! Connection Pool
//!
//! 연결 풀링

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::error::{DriverError, DriverResult};
use super::factory::ConnectionFactory;
use super::transport::Connection;

// ============================================================================
// PoolConfig - 풀 설정
// ============================================================================

/// 연결 풀 설정
///
/// 연결 풀의 동작을 제어하는 설정입니다.
///
/// # 필드
///
/// | 필드 | 기본값 | 설명 |
/// |------|--------|------|
/// | `max_size` | 30 | 동시에 대여 가능한 최대 연결 수 |
/// | `min_idle` | 1 | 최소 유휴 연결 수 (워밍업 기준) |
/// | `warmup_on_init` | false | 초기화 시 워밍업 여부 |
/// | `warmup_size` | 0 | 워밍업 연결 수 (0이면 min_idle 사용) |
/// | `max_lifetime` | 1시간 | 연결 최대 수명 |
/// | `idle_timeout` | 5분 | 유휴 타임아웃 |
/// | `acquisition_timeout` | 30초 | 연결 획득 대기 타임아웃 |
///
/// # 예시
///
/// ```rust
/// use gremlin_driver::driver::PoolConfig;
/// use std::time::Duration;
///
/// let config = PoolConfig {
///     max_size: 50,
///     min_idle: 5,
///     warmup_on_init: true,
///     acquisition_timeout: Duration::from_secs(5),
///     ..Default::default()
/// };
/// assert_eq!(config.warmup_size, 0);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// 최대 연결 수
    pub max_size: usize,
    /// 최소 유휴 연결 수
    pub min_idle: usize,
    /// 초기화 시 워밍업 수행 여부
    pub warmup_on_init: bool,
    /// 워밍업 시 생성할 연결 수 (0이면 min_idle 사용)
    pub warmup_size: usize,
    /// 연결 최대 수명
    pub max_lifetime: Duration,
    /// 유휴 타임아웃
    pub idle_timeout: Duration,
    /// 연결 획득 타임아웃
    pub acquisition_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 30,
            min_idle: 1,
            warmup_on_init: false,
            warmup_size: 0,
            max_lifetime: Duration::from_secs(3600),
            idle_timeout: Duration::from_secs(300),
            acquisition_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    /// 빌더 패턴으로 풀 설정 생성
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }
}

/// 풀 설정 빌더
#[derive(Debug, Clone, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// 최대 연결 수 설정
    pub fn max_size(mut self, size: usize) -> Self {
        self.config.max_size = size;
        self
    }

    /// 최소 유휴 연결 수 설정
    pub fn min_idle(mut self, size: usize) -> Self {
        self.config.min_idle = size;
        self
    }

    /// 워밍업 활성화 (min_idle 개수만큼)
    pub fn with_warmup(mut self) -> Self {
        self.config.warmup_on_init = true;
        self
    }

    /// 워밍업 활성화 (지정 개수)
    pub fn with_warmup_size(mut self, size: usize) -> Self {
        self.config.warmup_on_init = true;
        self.config.warmup_size = size;
        self
    }

    /// 연결 최대 수명 설정
    pub fn max_lifetime(mut self, duration: Duration) -> Self {
        self.config.max_lifetime = duration;
        self
    }

    /// 유휴 타임아웃 설정
    pub fn idle_timeout(mut self, duration: Duration) -> Self {
        self.config.idle_timeout = duration;
        self
    }

    /// 연결 획득 타임아웃 설정
    pub fn acquisition_timeout(mut self, duration: Duration) -> Self {
        self.config.acquisition_timeout = duration;
        self
    }

    /// 설정 빌드
    pub fn build(self) -> PoolConfig {
        self.config
    }
}

// ============================================================================
// ConnectionState - 연결 상태
// ============================================================================

/// 연결 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 유휴 상태 (풀 소유)
    Idle,
    /// 사용 중 (호출자 한 명 소유)
    InUse,
    /// 닫힘
    Closed,
    /// 사용 불가 (재사용 금지)
    Failed,
}

// ============================================================================
// PooledConnection - 풀링된 연결
// ============================================================================

#[derive(Debug, Default)]
struct PoolStats {
    size: AtomicUsize,
    in_use: AtomicUsize,
    total_created: AtomicU64,
    total_acquisitions: AtomicU64,
    total_closed: AtomicU64,
    total_discarded: AtomicU64,
    total_timeouts: AtomicU64,
}

/// 풀링된 연결
///
/// 다이얼 시점에 엔드포인트 주소가 붙습니다 ([`remote_address`]).
/// 대여 중인 연결은 풀 용량 허가(permit)를 하나 쥐고 있으며, 반환되지 않고
/// drop되면 전송 연결과 함께 닫히고 허가도 풀립니다.
///
/// [`remote_address`]: PooledConnection::remote_address
pub struct PooledConnection {
    /// 연결 ID
    id: u64,
    /// 엔드포인트 주소
    address: String,
    /// 생성 시간
    created_at: Instant,
    /// 마지막 사용 시간
    last_used: Instant,
    /// 상태
    state: ConnectionState,
    /// 전송 연결
    connection: Box<dyn Connection>,
    /// 풀 용량 허가 (대여 중에만)
    permit: Option<OwnedSemaphorePermit>,
    /// 풀 통계
    stats: Arc<PoolStats>,
}

impl PooledConnection {
    fn new(id: u64, address: String, connection: Box<dyn Connection>, stats: Arc<PoolStats>) -> Self {
        let now = Instant::now();
        stats.size.fetch_add(1, Ordering::Relaxed);
        stats.total_created.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            address,
            created_at: now,
            last_used: now,
            state: ConnectionState::Idle,
            connection,
            permit: None,
            stats,
        }
    }

    /// 연결 ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 이 연결을 다이얼한 엔드포인트 주소
    pub fn remote_address(&self) -> &str {
        &self.address
    }

    /// 생성 시간
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// 마지막 사용 시간
    pub fn last_used(&self) -> Instant {
        self.last_used
    }

    /// 연결 상태
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// 유효성 확인
    pub fn is_valid(&self, config: &PoolConfig) -> bool {
        if self.state == ConnectionState::Closed || self.state == ConnectionState::Failed {
            return false;
        }

        // 최대 수명 체크
        if self.created_at.elapsed() > config.max_lifetime {
            return false;
        }

        // 유휴 타임아웃 체크
        if self.state == ConnectionState::Idle && self.last_used.elapsed() > config.idle_timeout {
            return false;
        }

        true
    }

    /// 프레임 전송
    ///
    /// 전송 에러가 나면 연결은 사용 불가로 표시됩니다.
    pub async fn send(&mut self, frame: Bytes) -> DriverResult<()> {
        self.last_used = Instant::now();
        let result = self.connection.send(frame).await;
        if result.is_err() {
            self.mark_unusable();
        }
        result
    }

    /// 프레임 수신
    ///
    /// 전송 에러가 나면 연결은 사용 불가로 표시됩니다.
    pub async fn recv(&mut self) -> DriverResult<Bytes> {
        let result = self.connection.recv().await;
        self.last_used = Instant::now();
        if result.is_err() {
            self.mark_unusable();
        }
        result
    }

    /// 사용 불가로 표시
    pub fn mark_unusable(&mut self) {
        if self.state != ConnectionState::Closed {
            self.check_in(ConnectionState::Failed);
        }
    }

    /// 연결 닫기
    pub async fn close(&mut self) -> DriverResult<()> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }
        self.check_in(ConnectionState::Closed);
        self.permit = None;
        self.connection.close().await
    }

    fn check_out(&mut self, permit: OwnedSemaphorePermit) {
        self.permit = Some(permit);
        self.state = ConnectionState::InUse;
        self.last_used = Instant::now();
        self.stats.in_use.fetch_add(1, Ordering::Relaxed);
        self.stats.total_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    fn check_in(&mut self, next: ConnectionState) {
        if self.state == ConnectionState::InUse {
            self.stats.in_use.fetch_sub(1, Ordering::Relaxed);
        }
        self.state = next;
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("state", &self.state)
            .field("age", &self.created_at.elapsed())
            .finish()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        // 비동기 닫기가 불가능하므로 전송 연결은 drop으로 정리됨
        self.check_in(ConnectionState::Closed);
        self.stats.size.fetch_sub(1, Ordering::Relaxed);
        self.stats.total_closed.fetch_add(1, Ordering::Relaxed);
    }
}

// ============================================================================
// PoolMetrics - 풀 메트릭
// ============================================================================

/// 풀 메트릭
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    /// 현재 크기 (유휴 + 사용 중)
    pub size: usize,
    /// 유휴 연결 수
    pub idle: usize,
    /// 사용 중인 연결 수
    pub in_use: usize,
    /// 총 획득 횟수
    pub total_acquisitions: u64,
    /// 총 생성 횟수
    pub total_created: u64,
    /// 총 닫힌 연결 수
    pub total_closed: u64,
    /// 사용 불가로 폐기된 연결 수
    pub total_discarded: u64,
    /// 총 타임아웃 횟수
    pub total_timeouts: u64,
}

// ============================================================================
// ConnectionPool - 연결 풀
// ============================================================================

/// 연결 풀
///
/// 유휴 연결은 풀이 소유하고, 대여된 연결은 호출자 한 명이 소유합니다.
/// 동시에 대여 가능한 연결 수는 세마포어로 `max_size`까지 제한됩니다.
pub struct ConnectionPool {
    /// 풀 설정
    config: PoolConfig,
    /// 연결 팩토리
    factory: ConnectionFactory,
    /// 유휴 연결들
    idle_connections: Mutex<VecDeque<PooledConnection>>,
    /// 세마포어 (연결 수 제한)
    semaphore: Arc<Semaphore>,
    /// 통계
    stats: Arc<PoolStats>,
    /// 다음 연결 ID
    next_id: AtomicU64,
    /// 열린 상태
    open: RwLock<bool>,
}

impl ConnectionPool {
    /// 새 연결 풀 생성
    pub fn new(config: PoolConfig, factory: ConnectionFactory) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_size));

        Self {
            config,
            factory,
            idle_connections: Mutex::new(VecDeque::new()),
            semaphore,
            stats: Arc::new(PoolStats::default()),
            next_id: AtomicU64::new(1),
            open: RwLock::new(true),
        }
    }

    /// 풀 설정
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// 연결 팩토리
    pub fn factory(&self) -> &ConnectionFactory {
        &self.factory
    }

    /// 열린 상태 여부
    pub fn is_open(&self) -> bool {
        *self.open.read()
    }

    /// 연결 획득
    ///
    /// 유휴 연결이 있으면 재사용하고, 없으면 팩토리로 새로 엽니다.
    pub async fn acquire(&self) -> DriverResult<PooledConnection> {
        if !self.is_open() {
            return Err(DriverError::pool("Pool is closed"));
        }

        // 세마포어 획득 (타임아웃)
        let permit = match tokio::time::timeout(
            self.config.acquisition_timeout,
            self.semaphore.clone().acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(DriverError::pool("Pool is closed")),
            Err(_) => {
                self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
                return Err(DriverError::timeout("Connection acquisition timeout"));
            }
        };

        // 유휴 연결 확인
        if let Some(mut conn) = self.get_idle_connection().await {
            conn.check_out(permit);
            return Ok(conn);
        }

        // 새 연결 생성
        let mut conn = self.create_connection().await?;
        conn.check_out(permit);
        Ok(conn)
    }

    /// 유휴 연결 가져오기 (만료된 연결은 닫음)
    async fn get_idle_connection(&self) -> Option<PooledConnection> {
        let mut stale = Vec::new();
        let found = {
            let mut idle = self.idle_connections.lock();
            let mut found = None;
            while let Some(conn) = idle.pop_front() {
                if conn.is_valid(&self.config) {
                    found = Some(conn);
                    break;
                }
                stale.push(conn);
            }
            found
        };

        for mut conn in stale {
            tracing::debug!(id = conn.id(), endpoint = %conn.remote_address(), "closing expired connection");
            if let Err(e) = conn.close().await {
                tracing::debug!(id = conn.id(), error = %e, "error while closing expired connection");
            }
        }

        found
    }

    /// 새 연결 생성
    async fn create_connection(&self) -> DriverResult<PooledConnection> {
        let dialed = self.factory.dial().await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        Ok(PooledConnection::new(
            id,
            dialed.address,
            dialed.connection,
            Arc::clone(&self.stats),
        ))
    }

    /// 연결 반환 (재사용 가능)
    ///
    /// 유효하지 않거나 풀이 닫힌 경우 연결을 닫습니다.
    pub async fn release(&self, mut conn: PooledConnection) {
        // 허가는 유휴 큐에 넣은 뒤에 풀어야 대기자가 이 연결을 재사용함
        let permit = conn.permit.take();

        if self.is_open() && conn.is_valid(&self.config) {
            conn.check_in(ConnectionState::Idle);
            conn.last_used = Instant::now();
            self.idle_connections.lock().push_back(conn);
        } else if let Err(e) = conn.close().await {
            tracing::debug!(id = conn.id(), error = %e, "error while closing released connection");
        }

        drop(permit);
    }

    /// 연결 폐기 (사용 불가 표시 후 닫기)
    pub async fn discard(&self, mut conn: PooledConnection) {
        conn.mark_unusable();
        self.stats.total_discarded.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = conn.close().await {
            tracing::debug!(id = conn.id(), error = %e, "error while closing discarded connection");
        }
    }

    /// 풀 닫기
    ///
    /// 유휴 연결을 모두 닫고 이후 획득을 거부합니다. 대여 중인 연결은
    /// 반환될 때 닫힙니다.
    pub async fn close_all(&self) -> DriverResult<()> {
        *self.open.write() = false;
        self.semaphore.close();

        let drained: Vec<PooledConnection> = self.idle_connections.lock().drain(..).collect();
        for mut conn in drained {
            conn.close().await?;
        }

        Ok(())
    }

    /// 연결 풀 워밍업
    ///
    /// 지정된 수의 연결을 미리 생성하여 유휴 상태로 유지합니다.
    /// 첫 번째 요청의 지연 시간을 줄이는 데 유용합니다.
    ///
    /// # 인자
    ///
    /// - `count`: 생성할 연결 수 (0이면 config의 설정 사용)
    ///
    /// # 반환
    ///
    /// - `Ok(usize)`: 성공적으로 생성된 연결 수
    /// - `Err`: 첫 연결부터 실패 (부분 성공은 경고 로그 후 `Ok`)
    pub async fn warmup(&self, count: usize) -> DriverResult<usize> {
        if !self.is_open() {
            return Err(DriverError::pool("Pool is closed"));
        }

        // 워밍업 개수 결정
        let target = if count > 0 {
            count
        } else if self.config.warmup_size > 0 {
            self.config.warmup_size
        } else {
            self.config.min_idle
        };

        // max_size 초과 방지
        let target = target.min(self.config.max_size);

        let mut created = 0;
        while self.idle_count() < target && self.size() < self.config.max_size {
            match self.create_connection().await {
                Ok(mut conn) => {
                    conn.last_used = Instant::now();
                    self.idle_connections.lock().push_back(conn);
                    created += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, created, "warmup connection failed");
                    if created == 0 {
                        return Err(e);
                    }
                    break;
                }
            }
        }

        Ok(created)
    }

    /// 설정에 따른 자동 워밍업
    ///
    /// `warmup_on_init`이 true인 경우에만 워밍업을 수행합니다.
    pub async fn warmup_if_enabled(&self) -> DriverResult<Option<usize>> {
        if !self.config.warmup_on_init {
            return Ok(None);
        }

        let count = self.warmup(0).await?;
        Ok(Some(count))
    }

    /// 메트릭 조회
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            size: self.size(),
            idle: self.idle_count(),
            in_use: self.in_use_count(),
            total_acquisitions: self.stats.total_acquisitions.load(Ordering::Relaxed),
            total_created: self.stats.total_created.load(Ordering::Relaxed),
            total_closed: self.stats.total_closed.load(Ordering::Relaxed),
            total_discarded: self.stats.total_discarded.load(Ordering::Relaxed),
            total_timeouts: self.stats.total_timeouts.load(Ordering::Relaxed),
        }
    }

    /// 풀 크기
    pub fn size(&self) -> usize {
        self.stats.size.load(Ordering::Relaxed)
    }

    /// 유휴 연결 수
    pub fn idle_count(&self) -> usize {
        self.idle_connections.lock().len()
    }

    /// 사용 중인 연결 수
    pub fn in_use_count(&self) -> usize {
        self.stats.in_use.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("size", &self.size())
            .field("idle", &self.idle_count())
            .field("in_use", &self.in_use_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
