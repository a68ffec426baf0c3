//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 講座タイトル・氏名の検証失敗 |
//! | `Conflict` | 409 Conflict | 受講者数の上限 |
//!
//! 講座・受講者の未存在はインフラ層（`InfraError`）が表現する。
//!
//! ## 使用例
//!
//! ```rust
//! use enrollment_domain::DomainError;
//!
//! fn check_title(title: &str) -> Result<(), DomainError> {
//!     if title.trim().is_empty() {
//!         return Err(DomainError::Validation("講座タイトルは必須です".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_title("  ").is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// サービス層でこのエラーを受け取り、`CoreError` を経由して
/// 適切なレスポンスに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 講座タイトル・氏名が空
    /// - 文字数制限の超過
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 競合エラー
    #[error("競合が発生しました: {0}")]
    Conflict(String),
}
