//! # 永続化ゲートウェイ
//!
//! 受講登録ユースケースが利用する永続化操作の抽象（[`EnrollmentGateway`]）と、
//! その実装を提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: ユースケース層はこの trait にのみ依存し、実装を外部から注入する
//! - **Unit of Work**: 存在チェック・取得・永続化は `&mut TxContext` を必須引数とする
//! - **自然キーの一意性**: 存在チェックはユースケース層の責務。ストレージ側の一意制約は
//!   同時作成時の最終防衛線で、違反は `InfraErrorKind::Conflict` として返す
//!
//! ## 実装
//!
//! - [`PostgresEnrollmentGateway`]: sqlx による PostgreSQL 実装
//! - [`InMemoryEnrollmentGateway`]: tokio Mutex によるインメモリ実装

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use enrollment_domain::{
    course::{Course, CourseId, CourseTitle},
    student::{FullName, Student, StudentId},
};
pub use memory::{InMemoryEnrollmentGateway, InMemoryStore, InMemoryTransactionManager};
pub use postgres::PostgresEnrollmentGateway;
use serde_json::{Value, json};

use crate::{db::TxContext, error::InfraError};

/// 名前付きフィールドの順序付きマップ
///
/// プレゼンターへ渡す成功結果の表現。挿入順が保持される。
pub type Fields = serde_json::Map<String, Value>;

/// 受講登録の永続化ゲートウェイ
///
/// 取得系は対象が存在しない場合 `InfraErrorKind::NotFound` を返す。
#[async_trait]
pub trait EnrollmentGateway: Send + Sync {
    /// 指定タイトルの講座が存在するか
    async fn course_exists_with_title(
        &self,
        tx: &mut TxContext,
        title: &CourseTitle,
    ) -> Result<bool, InfraError>;

    /// 指定氏名の受講者が存在するか
    async fn student_exists_with_full_name(
        &self,
        tx: &mut TxContext,
        full_name: &FullName,
    ) -> Result<bool, InfraError>;

    /// ID で受講者を取得する（書き換えのためロックする）
    async fn obtain_student_by_id(
        &self,
        tx: &mut TxContext,
        id: &StudentId,
    ) -> Result<Student, InfraError>;

    /// ID で講座を取得する（書き換えのためロックする）
    async fn obtain_course_by_id(
        &self,
        tx: &mut TxContext,
        id: &CourseId,
    ) -> Result<Course, InfraError>;

    /// 講座を永続化する
    ///
    /// `id` が `None` なら挿入して採番した ID を、そうでなければ更新して既存の ID を返す。
    async fn persist_course(
        &self,
        tx: &mut TxContext,
        course: &Course,
    ) -> Result<CourseId, InfraError>;

    /// 受講者を永続化する（登録講座 ID の集合も置き換える）
    ///
    /// `id` が `None` なら挿入して採番した ID を、そうでなければ更新して既存の ID を返す。
    async fn persist_student(
        &self,
        tx: &mut TxContext,
        student: &Student,
    ) -> Result<StudentId, InfraError>;

    /// 受講者の受講登録一覧を取得する
    ///
    /// 読み取り専用のためトランザクションを要求しない。
    async fn find_enrollments(&self, student_id: &StudentId) -> Result<Fields, InfraError>;
}

/// 受講登録一覧のフィールドを組み立てる
///
/// `{"studentId", "fullName", "courses": [{"courseId", "title"}]}` の形で、
/// 講座は渡された順に並ぶ。
pub(crate) fn enrollment_listing<'a>(
    student_id: StudentId,
    full_name: &FullName,
    courses: impl IntoIterator<Item = (CourseId, &'a CourseTitle)>,
) -> Fields {
    let courses: Vec<Value> = courses
        .into_iter()
        .map(|(id, title)| json!({ "courseId": id, "title": title.as_str() }))
        .collect();

    let mut fields = Fields::new();
    fields.insert("studentId".to_string(), json!(student_id));
    fields.insert("fullName".to_string(), json!(full_name.as_str()));
    fields.insert("courses".to_string(), Value::Array(courses));
    fields
}
