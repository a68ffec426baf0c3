//! # ユースケース層
//!
//! Enrollment Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: ゲートウェイとトランザクションマネージャを `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//! - **結果の表現**: ユースケースは [`Outcome`](crate::presenter::Outcome) を返し、
//!   表現はプレゼンターに委ねる
//!
//! ## モジュール構成
//!
//! - `enrollment`: 講座・受講者の作成、受講登録、受講登録一覧

pub mod enrollment;

pub use enrollment::EnrollmentUseCaseImpl;
