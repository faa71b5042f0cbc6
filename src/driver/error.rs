//! Driver Error Types
//!
//! 드라이버 에러 정의

use std::io;
use thiserror::Error;

use crate::protocol::{ProtocolError, StatusCode};

// ============================================================================
// DriverError - 드라이버 에러
// ============================================================================

/// 드라이버 에러
#[derive(Error, Debug)]
pub enum DriverError {
    /// 설정 에러 (잘못된 주소 목록, 누락된 자격 증명 등)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 서비스 불가 (모든 엔드포인트가 냉각 중)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 연결 에러 (다이얼, 읽기, 쓰기)
    #[error("Connection error: {0}")]
    Connection(String),

    /// 인증 에러
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// 서버가 에러 상태 코드를 반환
    #[error("Server error: {status} - {message}")]
    Server {
        /// 상태 코드
        status: StatusCode,
        /// 서버 메시지
        message: String,
    },

    /// 상태 테이블에 없는 코드
    #[error("Unknown status code {code}: {message}")]
    UnknownStatus {
        /// 원본 상태 코드 값
        code: u16,
        /// 서버 메시지
        message: String,
    },

    /// 직렬화 에러
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 풀 에러
    #[error("Pool error: {0}")]
    Pool(String),

    /// 타임아웃 에러
    #[error("Timeout: {0}")]
    Timeout(String),

    /// I/O 에러
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DriverError {
    /// 설정 에러 생성
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// 서비스 불가 에러 생성
    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// 연결 에러 생성
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// 인증 에러 생성
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// 직렬화 에러 생성
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// 풀 에러 생성
    pub fn pool(msg: impl Into<String>) -> Self {
        Self::Pool(msg.into())
    }

    /// 타임아웃 에러 생성
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// 응답 상태 코드로부터 에러 생성
    ///
    /// 정적 테이블에 있는 코드는 [`DriverError::Server`], 없는 코드는
    /// [`DriverError::UnknownStatus`]가 됩니다.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match StatusCode::from_u16(code) {
            Some(status) => Self::Server { status, message },
            None => Self::UnknownStatus { code, message },
        }
    }

    /// 서버 상태 코드 (있는 경우)
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(status.as_u16()),
            Self::UnknownStatus { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// 재시도 가능 여부
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) | Self::ServiceUnavailable(_) => true,
            Self::Server { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// 클라이언트 에러 여부
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Authentication(_) | Self::Configuration(_) => true,
            Self::Server { status, .. } => matches!(
                status,
                StatusCode::Unauthorized
                    | StatusCode::MalformedRequest
                    | StatusCode::InvalidRequestArguments
            ),
            _ => false,
        }
    }
}

/// 재시도 가능한 상태 코드 확인
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status, StatusCode::ServerTimeout)
}

impl From<ProtocolError> for DriverError {
    fn from(err: ProtocolError) -> Self {
        DriverError::Serialization(err.to_string())
    }
}

// ============================================================================
// Result Type
// ============================================================================

/// 드라이버 결과 타입
pub type DriverResult<T> = Result<T, DriverError>;

// ============================================================================
// Tests
// ============================================================================
