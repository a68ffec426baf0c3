//! # 受講登録ドメイン層
//!
//! 講座・受講者・受講登録のドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 永続化時に採番される ID を持つ（[`course::Course`], [`student::Student`]）
//! - **値オブジェクト**: 自然キーとなる講座タイトル・氏名（[`course::CourseTitle`], [`student::FullName`]）
//! - **不変な状態遷移**: 受講登録は既存インスタンスを書き換えず、新しいインスタンスを返す
//!
//! ## 依存関係の方向
//!
//! ```text
//! service → infra → domain
//!      ↘      ↓
//!        shared
//! ```
//!
//! ドメイン層はインフラ層（DB）に一切依存しない。
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use enrollment_domain::{
//!     course::CourseId,
//!     student::{FullName, Student, StudentId},
//! };
//!
//! let student = Student::from_db(
//!     StudentId::new(1),
//!     FullName::new("Ada Lovelace")?,
//!     Default::default(),
//! );
//!
//! let outcome = student.enroll_in_course(CourseId::new(1));
//! assert!(outcome.is_course_added());
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

pub mod course;
pub mod enrollment;
pub mod error;
pub mod student;

pub use error::DomainError;
