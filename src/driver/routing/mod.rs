//! 라우팅 모듈
//!
//! 여러 서버 엔드포인트에 연결을 분산하고, 실패한 엔드포인트를 일정
//! 시간 동안 선택 대상에서 제외합니다.
//!
//! # 개요
//!
//! - [`Endpoint`]: 주소 하나와 건강 상태 (에러 점수, 냉각 종료 시각)
//! - [`EndpointRegistry`]: 회전 링 + 주소 역조회, 건강한 엔드포인트 선택
//! - [`breaker`]: 실패 시 냉각, 성공 시 점수 감소
//!
//! # 예시
//!
//! ```
//! use gremlin_driver::driver::routing::{breaker, EndpointRegistry};
//!
//! let registry = EndpointRegistry::from_addresses("ws://server1:8182, ws://server2:8182").unwrap();
//! let endpoint = registry.select_healthy().unwrap();
//! breaker::penalize(&endpoint);
//!
//! // 냉각 중인 엔드포인트는 건너뜀
//! let next = registry.select_healthy().unwrap();
//! assert_ne!(next.id(), endpoint.id());
//! ```

pub mod breaker;
mod endpoint;
mod registry;

pub use endpoint::{Endpoint, EndpointSnapshot};
pub use registry::{parse_address, parse_addresses, AllEndpointsUnavailable, EndpointRegistry, EXPECTED_FORMAT};
