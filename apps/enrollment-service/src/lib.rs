//! # Enrollment Service ライブラリ
//!
//! 受講登録サービスのユースケース、プレゼンター、ハンドラを公開する。
//! バイナリ（`main.rs`）と結合テストから利用する。

pub mod config;
pub mod error;
pub mod handler;
pub mod presenter;
pub mod usecase;
