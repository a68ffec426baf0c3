//! # 講座
//!
//! 受講者が登録する講座を表現するドメインモデル。
//!
//! 講座タイトルは講座全体で一意な自然キー。一意性はユースケース層の
//! 存在チェックで担保し、ストレージの UNIQUE 制約は同時作成時の最終防衛線となる。
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use enrollment_domain::course::{Course, CourseTitle};
//!
//! let course = Course::new(CourseTitle::new("Algebra")?);
//! assert!(course.id().is_none());
//! assert_eq!(course.enrolled_count(), 0);
//!
//! let enrolled = course.enroll_student()?;
//! assert_eq!(enrolled.enrolled_count(), 1);
//! # Ok(())
//! # }
//! ```

use crate::DomainError;

define_serial_id! {
    /// 講座の一意識別子（永続化時に採番）
    pub struct CourseId;
}

define_validated_string! {
    /// 講座タイトル（値オブジェクト）
    ///
    /// 講座全体で一意な自然キー。1〜255 文字。
    pub struct CourseTitle {
        label: "講座タイトル",
        max_length: 255,
    }
}

/// 講座エンティティ
///
/// # 不変条件
///
/// - `id` は永続化されるまで `None`
/// - `enrolled_count` は新規の受講登録が成立した回数と一致する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id:             Option<CourseId>,
    title:          CourseTitle,
    enrolled_count: u32,
}

impl Course {
    /// 未永続化の講座を作成する（受講者数 0）
    pub fn new(title: CourseTitle) -> Self {
        Self {
            id: None,
            title,
            enrolled_count: 0,
        }
    }

    /// データベースから講座を復元する
    pub fn from_db(id: CourseId, title: CourseTitle, enrolled_count: u32) -> Self {
        Self {
            id: Some(id),
            title,
            enrolled_count,
        }
    }

    /// 受講者を 1 名追加した新しいインスタンスを返す
    ///
    /// 受講者数が `u32::MAX` に達している場合は `Conflict` を返す。
    pub fn enroll_student(&self) -> Result<Self, DomainError> {
        let enrolled_count = self.enrolled_count.checked_add(1).ok_or_else(|| {
            DomainError::Conflict(format!(
                "講座 {} の受講者数が上限に達しています",
                self.title
            ))
        })?;

        Ok(Self {
            id: self.id,
            title: self.title.clone(),
            enrolled_count,
        })
    }

    // --- ゲッター ---

    pub fn id(&self) -> Option<CourseId> {
        self.id
    }

    pub fn title(&self) -> &CourseTitle {
        &self.title
    }

    pub fn enrolled_count(&self) -> u32 {
        self.enrolled_count
    }
}
