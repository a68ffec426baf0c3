//! # インフラ層エラー定義
//!
//! データベースやインメモリストアとの通信で発生するエラーを表現する。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（Database, NotFound, Conflict, Unexpected）
//!
//! `From<sqlx::Error>` や convenience constructor でエラーを生成すると、
//! その時点の呼び出し経路（スパン）が自動的に記録される。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別に応じた処理には [`kind()`](InfraError::kind) を使用する:
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::NotFound { entity, id } => { /* 404 */ }
///     _ => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// データベースエラー
    ///
    /// SQL クエリの実行失敗、接続エラー、想定外の制約違反など。
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// 指定 ID のエンティティが存在しない
    #[error("{entity} が見つかりません: id={id}")]
    NotFound {
        /// エンティティ名（例: "Student"）
        entity: String,
        /// 検索に使用した ID
        id:     String,
    },

    /// 一意制約違反などの競合
    ///
    /// 自然キーの存在チェックをすり抜けた同時作成などで発生する。
    #[error("競合が発生しました: {entity}({key})")]
    Conflict {
        /// エンティティ名（例: "Course"）
        entity: String,
        /// 競合したキー
        key:    String,
    },

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// NotFound かどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, InfraErrorKind::NotFound { .. })
    }

    // ===== Convenience constructors =====

    /// エンティティ未存在エラーを生成する
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self {
            kind:       InfraErrorKind::NotFound {
                entity: entity.into(),
                id:     id.to_string(),
            },
            span_trace: SpanTrace::capture(),
        }
    }

    /// 競合エラーを生成する
    pub fn conflict(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Conflict {
                entity: entity.into(),
                key:    key.into(),
            },
            span_trace: SpanTrace::capture(),
        }
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Unexpected(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        Self {
            kind:       InfraErrorKind::Database(source),
            span_trace: SpanTrace::capture(),
        }
    }
}
