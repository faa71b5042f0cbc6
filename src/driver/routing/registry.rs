//! 엔드포인트 레지스트리
//!
//! 설정된 엔드포인트의 회전 링과 주소 역조회 맵을 관리하고, 링을 돌며
//! 사용 가능한 엔드포인트를 선택합니다.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use super::endpoint::{Endpoint, EndpointSnapshot};
use crate::driver::error::{DriverError, DriverResult};

/// 주소 형식 안내 메시지
pub const EXPECTED_FORMAT: &str = "connection string is not in expected format. \
     An example of the expected format is 'ws://server1:8182, ws://server2:8182'";

// ============================================================================
// AllEndpointsUnavailable
// ============================================================================

/// 링의 모든 엔드포인트가 냉각 중
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("all endpoints unavailable")]
pub struct AllEndpointsUnavailable;

impl From<AllEndpointsUnavailable> for DriverError {
    fn from(err: AllEndpointsUnavailable) -> Self {
        DriverError::service_unavailable(err.to_string())
    }
}

// ============================================================================
// 주소 파싱
// ============================================================================

/// 쉼표로 구분된 주소 목록 파싱
///
/// 각 세그먼트는 앞뒤 공백을 제거한 뒤 독립적으로 파싱됩니다. 빈
/// 세그먼트는 건너뛰며, 중복 제거는 [`EndpointRegistry::new`]가 합니다.
pub fn parse_addresses(input: &str) -> DriverResult<Vec<Url>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(parse_address)
        .collect()
}

/// 단일 주소 파싱 (`ws://` 또는 `wss://`, 호스트 필수)
pub fn parse_address(segment: &str) -> DriverResult<Url> {
    let invalid = || DriverError::configuration(format!("invalid address '{}': {}", segment, EXPECTED_FORMAT));

    let url = Url::parse(segment).map_err(|_| invalid())?;
    match url.scheme() {
        "ws" | "wss" => {}
        _ => return Err(invalid()),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid());
    }

    Ok(url)
}

// ============================================================================
// EndpointRegistry
// ============================================================================

/// 엔드포인트 레지스트리
///
/// 링은 삽입 순서를 유지하며 선택 단계마다 맨 앞 엔드포인트를 맨 뒤로
/// 보냅니다. 역조회 맵은 생성 후 변경되지 않습니다.
#[derive(Debug)]
pub struct EndpointRegistry {
    ring: Mutex<VecDeque<Arc<Endpoint>>>,
    by_address: HashMap<String, Arc<Endpoint>>,
}

impl EndpointRegistry {
    /// 주소 목록으로 레지스트리 생성
    ///
    /// 중복 주소는 첫 번째만 남깁니다. 남는 주소가 없으면 설정 에러입니다.
    pub fn new(addresses: impl IntoIterator<Item = Url>) -> DriverResult<Self> {
        let mut ring = VecDeque::new();
        let mut by_address = HashMap::new();

        for url in addresses {
            let key = url.as_str().to_string();
            if by_address.contains_key(&key) {
                continue;
            }
            let endpoint = Arc::new(Endpoint::new(url));
            ring.push_back(Arc::clone(&endpoint));
            by_address.insert(key, endpoint);
        }

        if ring.is_empty() {
            return Err(DriverError::configuration("no valid endpoints provided"));
        }

        Ok(Self {
            ring: Mutex::new(ring),
            by_address,
        })
    }

    /// 쉼표로 구분된 주소 문자열로 레지스트리 생성
    pub fn from_addresses(input: &str) -> DriverResult<Self> {
        Self::new(parse_addresses(input)?)
    }

    /// 엔드포인트 수
    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    /// 비어 있는지 여부 (생성 규칙상 항상 false)
    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }

    /// 현재 링 순서대로 엔드포인트 목록
    pub fn endpoints(&self) -> Vec<Arc<Endpoint>> {
        self.ring.lock().iter().cloned().collect()
    }

    /// 현재 링 순서대로 상태 스냅샷
    pub fn snapshots(&self) -> Vec<EndpointSnapshot> {
        self.endpoints().iter().map(|e| e.snapshot()).collect()
    }

    /// 주소로 엔드포인트 역조회
    pub fn by_remote_address(&self, address: &str) -> Option<Arc<Endpoint>> {
        self.by_address.get(address).cloned()
    }

    /// 사용 가능한 엔드포인트 선택
    pub fn select_healthy(&self) -> Result<Arc<Endpoint>, AllEndpointsUnavailable> {
        self.select_healthy_at(Instant::now())
    }

    /// `now` 시점 기준으로 사용 가능한 엔드포인트 선택
    ///
    /// 매 단계마다 링을 한 칸 회전시키고, 처음 만난 사용 불가 엔드포인트를
    /// 다시 만나면 한 바퀴를 돈 것으로 보고 실패합니다. 링 잠금은 한 번의
    /// 순회 내내 유지됩니다.
    pub fn select_healthy_at(&self, now: Instant) -> Result<Arc<Endpoint>, AllEndpointsUnavailable> {
        let mut ring = self.ring.lock();
        let size = ring.len();
        let mut first_unhealthy: Option<Uuid> = None;

        for _ in 0..=size {
            let endpoint = match ring.front() {
                Some(endpoint) => Arc::clone(endpoint),
                None => break,
            };
            if first_unhealthy == Some(endpoint.id()) {
                break;
            }

            ring.rotate_left(1);

            if endpoint.is_available_at(now) {
                return Ok(endpoint);
            }
            if size == 1 {
                break;
            }
            first_unhealthy.get_or_insert(endpoint.id());
        }

        tracing::debug!(endpoints = size, "no endpoint available");
        Err(AllEndpointsUnavailable)
    }
}
