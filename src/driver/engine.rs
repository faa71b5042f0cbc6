//! Protocol Engine
//!
//! 요청 하나를 연결 하나에서 처리합니다: 요청 전송, 응답 프레임 수신,
//! 부분 결과 누적, 인증 챌린지 응답, 그리고 끝난 뒤 엔드포인트 건강 상태
//! 갱신과 연결 반환/폐기.
//!
//! # 응답 상태 머신
//!
//! | 코드 | 동작 |
//! |------|------|
//! | 204 | 완료, 빈 결과 (`Value::Null`), 점수 변경 없음 |
//! | 407 | 같은 연결로 SASL 응답 전송 후 계속 수신 |
//! | 206 | `data` 항목을 버퍼에 추가하고 계속 수신 |
//! | 200 | 버퍼가 있으면 추가 후 버퍼 반환, 없으면 `data` 그대로 반환, 엔드포인트 점수 감소 |
//! | 그 외 | 상태 코드 에러, 연결 폐기, 엔드포인트 냉각 |

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::client::AuthToken;
use super::error::{DriverError, DriverResult};
use super::pool::{ConnectionPool, PooledConnection};
use super::routing::{breaker, EndpointRegistry};
use crate::protocol::{sasl, GraphSonCodec, Request, ResponseFrame, StatusCode};

// ============================================================================
// ResponseStateMachine - 응답 상태 머신
// ============================================================================

/// 응답 처리 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// 다음 프레임 대기
    ReceivingFrame,
    /// 챌린지에 응답하는 중
    Authenticating,
    /// 결과 확정
    Done,
    /// 실패
    Failed,
}

/// 프레임 하나를 처리한 뒤 엔진이 할 일
#[derive(Debug)]
pub enum Step {
    /// 다음 프레임을 읽음
    Continue,
    /// 주어진 챌린지 ID로 SASL 응답을 보낸 뒤 계속 읽음
    Authenticate(Uuid),
    /// 최종 결과
    Done(Value),
    /// 실패
    Failed(DriverError),
}

/// 응답 상태 머신
///
/// I/O 없이 프레임을 하나씩 받아 다음 동작을 결정합니다.
#[derive(Debug)]
pub struct ResponseStateMachine {
    state: ExchangeState,
    buffer: Vec<Value>,
    challenged: bool,
    completed_with: Option<StatusCode>,
}

impl ResponseStateMachine {
    /// 새 상태 머신
    pub fn new() -> Self {
        Self {
            state: ExchangeState::ReceivingFrame,
            buffer: Vec::new(),
            challenged: false,
            completed_with: None,
        }
    }

    /// 현재 상태
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// 응답을 끝낸 상태 코드 (200 또는 204)
    pub fn completed_with(&self) -> Option<StatusCode> {
        self.completed_with
    }

    /// 지금까지 누적된 부분 결과 수
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// 프레임 하나 처리
    pub fn advance(&mut self, frame: ResponseFrame) -> Step {
        if matches!(self.state, ExchangeState::Done | ExchangeState::Failed) {
            return self.fail(DriverError::serialization(
                "frame received after the response completed",
            ));
        }

        match frame.status_code() {
            Some(StatusCode::NoContent) => self.finish(StatusCode::NoContent, Value::Null),
            Some(StatusCode::Authenticate) if !self.challenged => match frame.request_id() {
                Some(challenge) => {
                    self.challenged = true;
                    self.state = ExchangeState::Authenticating;
                    Step::Authenticate(challenge)
                }
                None => self.fail(DriverError::serialization(
                    "authentication challenge without a request id",
                )),
            },
            Some(StatusCode::PartialContent) => {
                self.state = ExchangeState::ReceivingFrame;
                match frame.into_items() {
                    Ok(items) => {
                        self.buffer.extend(items);
                        Step::Continue
                    }
                    Err(e) => self.fail(e.into()),
                }
            }
            Some(StatusCode::Success) => {
                if self.buffer.is_empty() {
                    return self.finish(StatusCode::Success, frame.into_data());
                }
                match frame.into_items() {
                    Ok(items) => {
                        let mut buffer = std::mem::take(&mut self.buffer);
                        buffer.extend(items);
                        self.finish(StatusCode::Success, Value::Array(buffer))
                    }
                    Err(e) => self.fail(e.into()),
                }
            }
            _ => {
                let code = frame.code();
                let message = frame.status.message;
                self.fail(DriverError::status(code, message))
            }
        }
    }

    fn finish(&mut self, status: StatusCode, value: Value) -> Step {
        self.state = ExchangeState::Done;
        self.completed_with = Some(status);
        Step::Done(value)
    }

    fn fail(&mut self, error: DriverError) -> Step {
        self.state = ExchangeState::Failed;
        self.buffer.clear();
        Step::Failed(error)
    }
}

impl Default for ResponseStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// 엔드포인트를 냉각시킬 에러인지 여부
///
/// 전송 실패와 서버 에러 상태 코드만 해당합니다.
fn penalizes(error: &DriverError) -> bool {
    matches!(
        error,
        DriverError::Connection(_)
            | DriverError::Timeout(_)
            | DriverError::Io(_)
            | DriverError::Server { .. }
            | DriverError::UnknownStatus { .. }
    )
}

// ============================================================================
// ProtocolEngine - 프로토콜 엔진
// ============================================================================

/// 프로토콜 엔진
pub struct ProtocolEngine {
    pool: Arc<ConnectionPool>,
    registry: Arc<EndpointRegistry>,
    auth: AuthToken,
    codec: GraphSonCodec,
}

impl ProtocolEngine {
    /// 새 엔진 생성
    pub fn new(pool: Arc<ConnectionPool>, registry: Arc<EndpointRegistry>, auth: AuthToken) -> Self {
        Self {
            pool,
            registry,
            auth,
            codec: GraphSonCodec::new(),
        }
    }

    /// 요청 실행
    ///
    /// 연결을 하나 빌려 요청을 처리하고, 성공하면 연결을 반환합니다. 200으로
    /// 끝난 경우에만 엔드포인트 점수를 낮춥니다 (204는 반환만). 실패하면
    /// 연결을 폐기하고, 전송 실패나 서버 에러 상태였다면 엔드포인트를
    /// 냉각시킵니다.
    pub async fn execute(&self, request: &Request) -> DriverResult<Value> {
        let mut conn = self.pool.acquire().await?;
        let result = self.exchange(&mut conn, request).await;
        let endpoint = self.registry.by_remote_address(conn.remote_address());

        match result {
            Ok((value, status)) => {
                if status == StatusCode::Success {
                    if let Some(endpoint) = &endpoint {
                        breaker::reward(endpoint);
                    }
                }
                self.pool.release(conn).await;
                Ok(value)
            }
            Err(e) => {
                warn!(
                    request_id = %request.request_id(),
                    endpoint = %conn.remote_address(),
                    error = %e,
                    "request failed"
                );
                if penalizes(&e) {
                    if let Some(endpoint) = &endpoint {
                        breaker::penalize(endpoint);
                    }
                }
                self.pool.discard(conn).await;
                Err(e)
            }
        }
    }

    async fn exchange(
        &self,
        conn: &mut PooledConnection,
        request: &Request,
    ) -> DriverResult<(Value, StatusCode)> {
        self.send(conn, request).await?;

        let mut machine = ResponseStateMachine::new();
        loop {
            let bytes = conn.recv().await?;
            let frame = self.codec.decode_response(&bytes)?;

            match machine.advance(frame) {
                Step::Continue => {}
                Step::Authenticate(challenge) => {
                    debug!(
                        request_id = %request.request_id(),
                        endpoint = %conn.remote_address(),
                        "authentication challenge"
                    );
                    let answer = match &self.auth {
                        AuthToken::Basic { username, password } => {
                            sasl::authentication_request(challenge, username, password)
                        }
                        AuthToken::None => {
                            return Err(DriverError::authentication(
                                "server requested authentication but no credentials are configured",
                            ));
                        }
                    };
                    self.send(conn, &answer).await?;
                }
                Step::Done(value) => {
                    let status = machine.completed_with().unwrap_or(StatusCode::Success);
                    return Ok((value, status));
                }
                Step::Failed(e) => return Err(e),
            }
        }
    }

    async fn send(&self, conn: &mut PooledConnection, request: &Request) -> DriverResult<()> {
        let frame = self.codec.encode_request(request)?;
        conn.send(frame).await
    }
}

impl std::fmt::Debug for ProtocolEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolEngine")
            .field("pool", &self.pool)
            .field("endpoints", &self.registry.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
