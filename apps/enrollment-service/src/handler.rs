//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲

pub mod enrollment;
pub mod health;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
pub use enrollment::{
    EnrollmentState,
    create_course,
    create_student,
    enroll,
    find_enrollments,
};
pub use health::health_check;

/// ルーターを構築する
pub fn router(state: Arc<EnrollmentState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/courses", post(create_course))
        .route("/students", post(create_student))
        .route("/enrollments", post(enroll))
        .route("/students/{student_id}/enrollments", get(find_enrollments))
        .with_state(state)
}
