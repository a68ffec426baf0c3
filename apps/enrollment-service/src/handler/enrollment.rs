//! # 受講登録ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /courses` - 講座作成（タイトルで冪等）
//! - `POST /students` - 受講者作成（氏名で冪等）
//! - `POST /enrollments` - 受講登録
//! - `GET /students/{student_id}/enrollments` - 受講者の受講登録一覧
//!
//! 成功・失敗の表現は [`JsonPresenter`] に委ねる。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use enrollment_domain::{course::CourseId, student::StudentId};
use serde::Deserialize;

use crate::{
    error::CoreError,
    presenter::{JsonPresenter, Outcome},
    usecase::EnrollmentUseCaseImpl,
};

/// 受講登録 API の共有状態
pub struct EnrollmentState {
    pub usecase:   EnrollmentUseCaseImpl,
    pub presenter: JsonPresenter,
}

// --- リクエスト型 ---

/// 講座作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
}

/// 受講者作成リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    pub full_name: String,
}

/// 受講登録リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub course_id:  i64,
    pub student_id: i64,
}

// --- ハンドラ ---

/// POST /courses
#[tracing::instrument(skip_all)]
pub async fn create_course(
    State(state): State<Arc<EnrollmentState>>,
    Json(req): Json<CreateCourseRequest>,
) -> Result<Response, CoreError> {
    let outcome = state.usecase.create_course(req.title).await?;
    Ok(outcome.present(&state.presenter))
}

/// POST /students
#[tracing::instrument(skip_all)]
pub async fn create_student(
    State(state): State<Arc<EnrollmentState>>,
    Json(req): Json<CreateStudentRequest>,
) -> Result<Response, CoreError> {
    let outcome = state.usecase.create_student(req.full_name).await?;
    Ok(outcome.present(&state.presenter))
}

/// POST /enrollments
///
/// 失敗もユースケースの結果として返るため、常にプレゼンター経由で応答する。
#[tracing::instrument(skip_all)]
pub async fn enroll(
    State(state): State<Arc<EnrollmentState>>,
    Json(req): Json<EnrollRequest>,
) -> Response {
    let outcome: Outcome = state
        .usecase
        .enroll(CourseId::new(req.course_id), StudentId::new(req.student_id))
        .await;
    outcome.present(&state.presenter)
}

/// GET /students/{student_id}/enrollments
#[tracing::instrument(skip_all)]
pub async fn find_enrollments(
    State(state): State<Arc<EnrollmentState>>,
    Path(student_id): Path<i64>,
) -> Result<Response, CoreError> {
    let outcome = state
        .usecase
        .find_enrollments_for_student(StudentId::new(student_id))
        .await?;
    Ok(outcome.present(&state.presenter))
}
