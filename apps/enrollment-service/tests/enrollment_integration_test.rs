//! 受講登録 API 統合テスト
//!
//! インメモリストアを使い、ルーター全体を `oneshot` で呼び出して
//! 講座作成から受講登録一覧までの一連の流れを検証する。
//!
//! 実行方法:
//! ```bash
//! cargo test -p enrollment-service --test enrollment_integration_test
//! ```

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use enrollment_infra::gateway::InMemoryStore;
use enrollment_service::{
    handler::{EnrollmentState, router},
    presenter::JsonPresenter,
    usecase::EnrollmentUseCaseImpl,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

// =============================================================================
// ヘルパー
// =============================================================================

fn create_app() -> Router {
    let store = InMemoryStore::new();
    router(Arc::new(EnrollmentState {
        usecase:   EnrollmentUseCaseImpl::new(
            Arc::new(store.gateway()),
            Arc::new(store.transaction_manager()),
        ),
        presenter: JsonPresenter,
    }))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// テスト
// =============================================================================

#[tokio::test]
async fn test_講座作成から受講登録一覧までの一連の流れ() {
    let app = create_app();

    // 講座作成（2 回目は冪等）
    let (status, body) = call(&app, Method::POST, "/courses", Some(json!({ "title": "Algebra" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": { "courseId": 1 } }));
    let (_, body) = call(&app, Method::POST, "/courses", Some(json!({ "title": "Algebra" }))).await;
    assert_eq!(body, json!({ "data": { "exists": "already" } }));

    // 受講者作成
    let (_, body) = call(&app, Method::POST, "/students", Some(json!({ "fullName": "Ada" }))).await;
    assert_eq!(body, json!({ "data": { "studentId": 1 } }));

    // 受講登録（2 回目は新規ではない）
    let enroll = json!({ "courseId": 1, "studentId": 1 });
    let (_, body) = call(&app, Method::POST, "/enrollments", Some(enroll.clone())).await;
    assert_eq!(
        body,
        json!({ "data": { "studentId": 1, "newEnrollment": true, "coursesIds": [1] } })
    );
    let (_, body) = call(&app, Method::POST, "/enrollments", Some(enroll)).await;
    assert_eq!(
        body,
        json!({ "data": { "studentId": 1, "newEnrollment": false, "coursesIds": [1] } })
    );

    // 受講登録一覧
    let (status, body) = call(&app, Method::GET, "/students/1/enrollments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "data": {
                "studentId": 1,
                "fullName": "Ada",
                "courses": [{ "courseId": 1, "title": "Algebra" }],
            }
        })
    );
}

#[tokio::test]
async fn test_存在しない講座への受講登録は受講者を変更しない() {
    let app = create_app();
    call(&app, Method::POST, "/students", Some(json!({ "fullName": "Ada" }))).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/enrollments",
        Some(json!({ "courseId": 999, "studentId": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["type"], "https://enrollment.example.com/errors/not-found");

    let (_, body) = call(&app, Method::GET, "/students/1/enrollments", None).await;
    assert_eq!(body["data"]["courses"], json!([]));
}

#[tokio::test]
async fn test_存在しない受講者の受講登録一覧は404() {
    let app = create_app();

    let (status, body) = call(&app, Method::GET, "/students/42/enrollments", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_ヘルスチェックはhealthyを返す() {
    let app = create_app();

    let (status, body) = call(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
