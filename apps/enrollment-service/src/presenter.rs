//! # 結果プレゼンター
//!
//! ユースケースの結果（[`Outcome`]）を出力形式に変換する。
//!
//! ユースケースは成功時に名前付きフィールドの順序付きマップ（[`Fields`]）を、
//! 失敗時に [`CoreError`] を返す。どの形式で表現するかはプレゼンターが決める。
//!
//! ## 使用例
//!
//! ```rust
//! use enrollment_infra::Fields;
//! use enrollment_service::presenter::{JsonPresenter, Outcome};
//!
//! let mut fields = Fields::new();
//! fields.insert("courseId".to_string(), 1.into());
//!
//! let response = Outcome::Success(fields).present(&JsonPresenter);
//! assert_eq!(response.status(), 200);
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
pub use enrollment_infra::Fields;
use enrollment_shared::ApiResponse;

use crate::error::CoreError;

/// ユースケースの結果
#[derive(Debug)]
pub enum Outcome {
    /// 成功（順序付きの名前付きフィールド）
    Success(Fields),
    /// 失敗
    Failure(CoreError),
}

impl Outcome {
    /// プレゼンターで出力に変換する
    pub fn present<P: ResultPresenter + ?Sized>(self, presenter: &P) -> P::Output {
        match self {
            Outcome::Success(fields) => presenter.present_ok(fields),
            Outcome::Failure(e) => presenter.present_error(e),
        }
    }
}

/// 結果プレゼンター trait
pub trait ResultPresenter: Send + Sync {
    /// 出力形式
    type Output;

    /// 成功結果を表現する
    fn present_ok(&self, fields: Fields) -> Self::Output;

    /// 失敗結果を表現する
    fn present_error(&self, e: CoreError) -> Self::Output;
}

/// HTTP JSON レスポンスへのプレゼンター
///
/// - 成功: `200 {"data": fields}`
/// - 失敗: RFC 9457 Problem Details（[`CoreError`] の `IntoResponse`）
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPresenter;

impl ResultPresenter for JsonPresenter {
    type Output = Response;

    fn present_ok(&self, fields: Fields) -> Response {
        (StatusCode::OK, Json(ApiResponse::new(fields))).into_response()
    }

    fn present_error(&self, e: CoreError) -> Response {
        e.into_response()
    }
}
