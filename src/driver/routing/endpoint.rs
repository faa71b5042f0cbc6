//! 엔드포인트
//!
//! 설정된 서버 주소 하나와 그 건강 상태를 나타냅니다.

use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use url::Url;
use uuid::Uuid;

/// 엔드포인트 건강 상태
#[derive(Debug, Clone, Copy)]
pub(crate) struct Health {
    /// 누적 에러 점수
    pub(crate) error_score: u32,
    /// 이 시각 이전에는 사용 불가 (냉각 중)
    pub(crate) ice_until: Instant,
}

/// 서버 엔드포인트
///
/// 클라이언트 생성 시 고유 주소마다 하나씩 만들어지며 클라이언트와
/// 수명을 같이합니다. 주소와 ID는 불변이고, 건강 상태는 서킷 브레이커가
/// 엔드포인트별 잠금 아래에서 갱신합니다.
#[derive(Debug)]
pub struct Endpoint {
    id: Uuid,
    address: Url,
    health: Mutex<Health>,
}

impl Endpoint {
    /// 새 엔드포인트 생성 (즉시 사용 가능)
    pub fn new(address: Url) -> Self {
        Self::created_at(address, Instant::now())
    }

    pub(crate) fn created_at(address: Url, now: Instant) -> Self {
        Self {
            id: Uuid::new_v4(),
            address,
            health: Mutex::new(Health {
                error_score: 0,
                ice_until: now,
            }),
        }
    }

    /// 엔드포인트 ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 정규화된 주소 문자열
    pub fn address(&self) -> &str {
        self.address.as_str()
    }

    /// 주소 URL
    pub fn url(&self) -> &Url {
        &self.address
    }

    /// 현재 에러 점수
    pub fn error_score(&self) -> u32 {
        self.health.lock().error_score
    }

    /// 냉각 종료 시각
    pub fn ice_until(&self) -> Instant {
        self.health.lock().ice_until
    }

    /// 지금 사용 가능한지 여부
    pub fn is_available(&self) -> bool {
        self.is_available_at(Instant::now())
    }

    /// `now` 시점에 사용 가능한지 여부
    pub fn is_available_at(&self, now: Instant) -> bool {
        now >= self.health.lock().ice_until
    }

    /// 상태 스냅샷
    pub fn snapshot(&self) -> EndpointSnapshot {
        let health = *self.health.lock();
        let now = Instant::now();
        EndpointSnapshot {
            id: self.id,
            address: self.address.to_string(),
            error_score: health.error_score,
            on_ice: now < health.ice_until,
            ice_remaining: health.ice_until.saturating_duration_since(now),
        }
    }

    pub(crate) fn health(&self) -> MutexGuard<'_, Health> {
        self.health.lock()
    }
}

/// 엔드포인트 상태 스냅샷
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSnapshot {
    /// 엔드포인트 ID
    pub id: Uuid,
    /// 주소
    pub address: String,
    /// 에러 점수
    pub error_score: u32,
    /// 냉각 중 여부
    pub on_ice: bool,
    /// 남은 냉각 시간
    pub ice_remaining: Duration,
}
