//! 서킷 브레이커
//!
//! 엔드포인트의 에러 점수와 냉각 시간을 갱신합니다.
//!
//! | 이벤트 | 에러 점수 | 냉각 종료 시각 |
//! |--------|-----------|----------------|
//! | `penalize` | +1 | now + 점수² × 5초 |
//! | `reward` | -1 (최소 0) | 변경 없음 |

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::endpoint::Endpoint;

/// 냉각 시간 단위
pub const ICE_UNIT: Duration = Duration::from_secs(5);

/// 에러 점수에 대한 냉각 시간 (점수² × 5초)
pub fn ice_duration(error_score: u32) -> Duration {
    let score = u64::from(error_score);
    Duration::from_secs(score.saturating_mul(score).saturating_mul(ICE_UNIT.as_secs()))
}

/// 실패 기록: 점수를 올리고 엔드포인트를 냉각시킴
pub fn penalize(endpoint: &Endpoint) {
    penalize_at(endpoint, Instant::now());
}

/// `now` 기준으로 실패 기록
pub fn penalize_at(endpoint: &Endpoint, now: Instant) {
    let (error_score, ice) = {
        let mut health = endpoint.health();
        health.error_score = health.error_score.saturating_add(1);

        let ice = ice_duration(health.error_score);
        let fallback = health.ice_until.max(now);
        health.ice_until = now.checked_add(ice).unwrap_or(fallback);
        (health.error_score, ice)
    };

    warn!(
        endpoint = %endpoint.address(),
        error_score,
        ice_secs = ice.as_secs(),
        "endpoint put on ice"
    );
}

/// 성공 기록: 점수를 1 낮춤 (냉각 시각은 유지)
pub fn reward(endpoint: &Endpoint) {
    let decayed = {
        let mut health = endpoint.health();
        if health.error_score == 0 {
            None
        } else {
            health.error_score -= 1;
            Some(health.error_score)
        }
    };

    if let Some(error_score) = decayed {
        debug!(
            endpoint = %endpoint.address(),
            error_score,
            "endpoint error score decayed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn endpoint() -> Endpoint {
        Endpoint::new(Url::parse("ws://a:8182").unwrap())
    }

    #[test]
    fn test_ice_duration() {
        assert_eq!(ice_duration(0), Duration::ZERO);
        assert_eq!(ice_duration(1), Duration::from_secs(5));
        assert_eq!(ice_duration(2), Duration::from_secs(20));
        assert_eq!(ice_duration(3), Duration::from_secs(45));
        assert_eq!(ice_duration(u32::MAX), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_penalize_sets_exact_window() {
        let endpoint = endpoint();
        let now = Instant::now();

        for k in 0..4u32 {
            assert_eq!(endpoint.error_score(), k);
            penalize_at(&endpoint, now);
            assert_eq!(endpoint.error_score(), k + 1);
            assert_eq!(endpoint.ice_until(), now + Duration::from_secs(u64::from((k + 1) * (k + 1)) * 5));
        }

        assert!(!endpoint.is_available_at(now));
        assert!(endpoint.is_available_at(now + Duration::from_secs(80)));
    }

    #[test]
    fn test_reward_floors_at_zero() {
        let endpoint = endpoint();
        reward(&endpoint);
        assert_eq!(endpoint.error_score(), 0);
        reward(&endpoint);
        assert_eq!(endpoint.error_score(), 0);
    }

    #[test]
    fn test_reward_keeps_ice() {
        let endpoint = endpoint();
        let now = Instant::now();
        penalize_at(&endpoint, now);
        penalize_at(&endpoint, now);
        let iced_until = endpoint.ice_until();

        reward(&endpoint);
        assert_eq!(endpoint.error_score(), 1);
        assert_eq!(endpoint.ice_until(), iced_until);
        assert!(!endpoint.is_available_at(now));
    }
}
