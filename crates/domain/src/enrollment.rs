//! # 受講登録の結果
//!
//! 受講者の講座 ID 集合に講座を追加しようとした結果。永続化はされない。

use crate::student::Student;

/// 受講登録の結果
///
/// 追加を試みた後の受講者（候補状態）と、集合が実際に増えたかどうかを保持する。
/// ユースケース層は `course_added` を見てから講座側を永続化するか判断する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentOutcome {
    student:      Student,
    course_added: bool,
}

impl EnrollmentOutcome {
    pub fn new(student: Student, course_added: bool) -> Self {
        Self {
            student,
            course_added,
        }
    }

    pub fn student(&self) -> &Student {
        &self.student
    }

    /// 講座 ID 集合が実際に増えたか（登録済みなら `false`）
    pub fn is_course_added(&self) -> bool {
        self.course_added
    }

    pub fn into_student(self) -> Student {
        self.student
    }
}
