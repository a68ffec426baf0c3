//! # Enrollment Service エラー定義
//!
//! サービス固有のエラーと、HTTP レスポンスへの変換を定義する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use enrollment_domain::DomainError;
use enrollment_infra::{InfraError, InfraErrorKind};
use enrollment_shared::ErrorResponse;
use thiserror::Error;

/// Enrollment Service で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 競合（一意制約違反など）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(InfraError),
}

impl From<InfraError> for CoreError {
    fn from(e: InfraError) -> Self {
        match e.kind() {
            InfraErrorKind::NotFound { .. } => CoreError::NotFound(e.to_string()),
            InfraErrorKind::Conflict { .. } => CoreError::Conflict(e.to_string()),
            _ => CoreError::Database(e),
        }
    }
}

impl From<DomainError> for CoreError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => CoreError::BadRequest(msg),
            DomainError::Conflict(msg) => CoreError::Conflict(msg),
        }
    }
}

impl CoreError {
    /// RFC 9457 形式のエラーボディに変換する
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            CoreError::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
            CoreError::BadRequest(msg) => ErrorResponse::bad_request(msg.clone()),
            CoreError::Conflict(msg) => ErrorResponse::conflict(msg.clone()),
            CoreError::Database(e) => {
                tracing::error!(
                    error.kind = "database",
                    span_trace = %e.span_trace(),
                    "データベースエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let body = self.to_error_response();
        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(body)).into_response()
    }
}
