//! # 受講者
//!
//! 講座に登録する受講者を表現するドメインモデル。
//!
//! 受講者は登録済み講座 ID の集合を持つ。集合なので同じ講座 ID を
//! 二度追加しても要素は増えない。受講登録は [`Student::enroll_in_course`] が
//! 新しいインスタンスと「集合が実際に増えたか」を [`EnrollmentOutcome`] として返す。

use std::collections::BTreeSet;

use crate::{course::CourseId, enrollment::EnrollmentOutcome};

define_serial_id! {
    /// 受講者の一意識別子（永続化時に採番）
    pub struct StudentId;
}

define_validated_string! {
    /// 氏名（値オブジェクト）
    ///
    /// 受講者全体で一意な自然キー。1〜255 文字。
    pub struct FullName {
        label: "氏名",
        max_length: 255,
        pii: true,
    }
}

/// 受講者エンティティ
///
/// # 不変条件
///
/// - `id` は永続化されるまで `None`
/// - `course_ids` は重複を含まない（`BTreeSet` で昇順に保持）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    id:         Option<StudentId>,
    full_name:  FullName,
    course_ids: BTreeSet<CourseId>,
}

impl Student {
    /// 未永続化の受講者を作成する（登録講座なし）
    pub fn new(full_name: FullName) -> Self {
        Self {
            id: None,
            full_name,
            course_ids: BTreeSet::new(),
        }
    }

    /// データベースから受講者を復元する
    pub fn from_db(id: StudentId, full_name: FullName, course_ids: BTreeSet<CourseId>) -> Self {
        Self {
            id: Some(id),
            full_name,
            course_ids,
        }
    }

    /// 講座への受講登録を試みる
    ///
    /// 自身は変更せず、講座 ID を追加した候補状態と、集合が実際に
    /// 増えたかどうかを返す。登録済みの講座なら `course_added` は `false`。
    pub fn enroll_in_course(&self, course_id: CourseId) -> EnrollmentOutcome {
        if self.is_enrolled_in(course_id) {
            return EnrollmentOutcome::new(self.clone(), false);
        }

        let mut course_ids = self.course_ids.clone();
        course_ids.insert(course_id);

        let student = Self {
            id: self.id,
            full_name: self.full_name.clone(),
            course_ids,
        };

        EnrollmentOutcome::new(student, true)
    }

    /// 指定の講座に登録済みかどうか
    pub fn is_enrolled_in(&self, course_id: CourseId) -> bool {
        self.course_ids.contains(&course_id)
    }

    // --- ゲッター ---

    pub fn id(&self) -> Option<StudentId> {
        self.id
    }

    pub fn full_name(&self) -> &FullName {
        &self.full_name
    }

    pub fn course_ids(&self) -> &BTreeSet<CourseId> {
        &self.course_ids
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ada() -> FullName {
        FullName::new("Ada Lovelace").unwrap()
    }

    #[test]
    fn test_氏名のdebug出力はマスクされる() {
        let debug = format!("{:?}", ada());

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("Ada"));
    }

    #[test]
    fn test_氏名は空白のみを拒否する() {
        assert!(FullName::new("  ").is_err());
    }

    #[test]
    fn test_新規受講者は登録講座なし() {
        let sut = Student::new(ada());

        assert_eq!(sut.id(), None);
        assert!(sut.course_ids().is_empty());
    }

    #[test]
    fn test_未登録の講座への受講登録は集合を増やす() {
        let sut = Student::from_db(StudentId::new(1), ada(), BTreeSet::new());

        let outcome = sut.enroll_in_course(CourseId::new(1));

        assert!(outcome.is_course_added());
        assert_eq!(
            outcome.student().course_ids(),
            &BTreeSet::from([CourseId::new(1)])
        );
        assert_eq!(outcome.student().id(), Some(StudentId::new(1)));
        // 元のインスタンスは変更されない
        assert!(sut.course_ids().is_empty());
    }

    #[test]
    fn test_登録済みの講座への受講登録は集合を変えない() {
        let sut = Student::from_db(
            StudentId::new(1),
            ada(),
            BTreeSet::from([CourseId::new(1), CourseId::new(2)]),
        );

        let outcome = sut.enroll_in_course(CourseId::new(2));

        assert!(!outcome.is_course_added());
        assert_eq!(outcome.student(), &sut);
    }

    #[test]
    fn test_course_idsは昇順に保持される() {
        let sut = Student::from_db(StudentId::new(1), ada(), BTreeSet::new())
            .enroll_in_course(CourseId::new(9))
            .into_student()
            .enroll_in_course(CourseId::new(2))
            .into_student();

        let ids: Vec<i64> = sut.course_ids().iter().map(CourseId::as_i64).collect();
        assert_eq!(ids, vec![2, 9]);
        assert!(sut.is_enrolled_in(CourseId::new(9)));
        assert!(!sut.is_enrolled_in(CourseId::new(3)));
    }
}
