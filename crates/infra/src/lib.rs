//! # 受講登録サービス インフラ層
//!
//! 永続化の抽象（ゲートウェイ）とその実装、トランザクション管理を担当する。
//!
//! ## 依存関係
//!
//! ```text
//! enrollment-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層に依存しない。
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL 接続プールとトランザクション（[`TxContext`]）
//! - [`error`] - インフラ層エラー定義
//! - [`gateway`] - ゲートウェイ trait と PostgreSQL / インメモリ実装
//! - `mock` - テスト用ダブル（`test-utils` feature）

pub mod db;
pub mod error;
pub mod gateway;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use db::{TransactionManager, TxContext};
pub use error::{InfraError, InfraErrorKind};
pub use gateway::{EnrollmentGateway, Fields};
