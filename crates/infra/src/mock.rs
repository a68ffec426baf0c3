//! # テスト用モック
//!
//! ユースケーステストで使用するトランザクションマネージャとゲートウェイのテストダブル。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! enrollment-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! 正常系のテストにはインメモリゲートウェイ（[`crate::gateway::InMemoryStore`]）を使い、
//! ここには異常系を再現するダブルと、呼び出しを記録するラッパーを置く。

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use enrollment_domain::{
    course::{Course, CourseId, CourseTitle},
    student::{FullName, Student, StudentId},
};

use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
    gateway::{EnrollmentGateway, Fields},
};

// ===== MockTransactionManager =====

/// モック TxContext を返す TransactionManager
///
/// 開始されたトランザクション数を記録する。
#[derive(Clone, Default)]
pub struct MockTransactionManager {
    begun: Arc<AtomicUsize>,
}

impl MockTransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// これまでに開始されたトランザクション数
    pub fn begun_count(&self) -> usize {
        self.begun.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        self.begun.fetch_add(1, Ordering::SeqCst);
        Ok(TxContext::mock())
    }
}

// ===== FailingTransactionManager =====

/// トランザクション開始が常に失敗する TransactionManager
#[derive(Clone, Default)]
pub struct FailingTransactionManager;

#[async_trait]
impl TransactionManager for FailingTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Err(InfraError::unexpected("トランザクションを開始できません"))
    }
}

// ===== FailingEnrollmentGateway =====

/// すべての操作が失敗するゲートウェイ
///
/// 呼び出された操作の数を記録する。
#[derive(Clone, Default)]
pub struct FailingEnrollmentGateway {
    calls: Arc<AtomicUsize>,
}

impl FailingEnrollmentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// これまでに呼び出された操作の数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self, operation: &str) -> Result<T, InfraError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(InfraError::unexpected(format!("{operation} に失敗しました")))
    }
}

#[async_trait]
impl EnrollmentGateway for FailingEnrollmentGateway {
    async fn course_exists_with_title(
        &self,
        _tx: &mut TxContext,
        _title: &CourseTitle,
    ) -> Result<bool, InfraError> {
        self.fail("course_exists_with_title")
    }

    async fn student_exists_with_full_name(
        &self,
        _tx: &mut TxContext,
        _full_name: &FullName,
    ) -> Result<bool, InfraError> {
        self.fail("student_exists_with_full_name")
    }

    async fn obtain_student_by_id(
        &self,
        _tx: &mut TxContext,
        _id: &StudentId,
    ) -> Result<Student, InfraError> {
        self.fail("obtain_student_by_id")
    }

    async fn obtain_course_by_id(
        &self,
        _tx: &mut TxContext,
        _id: &CourseId,
    ) -> Result<Course, InfraError> {
        self.fail("obtain_course_by_id")
    }

    async fn persist_course(
        &self,
        _tx: &mut TxContext,
        _course: &Course,
    ) -> Result<CourseId, InfraError> {
        self.fail("persist_course")
    }

    async fn persist_student(
        &self,
        _tx: &mut TxContext,
        _student: &Student,
    ) -> Result<StudentId, InfraError> {
        self.fail("persist_student")
    }

    async fn find_enrollments(&self, _student_id: &StudentId) -> Result<Fields, InfraError> {
        self.fail("find_enrollments")
    }
}

// ===== RecordingEnrollmentGateway =====

/// 呼び出された操作名を記録しながら内側のゲートウェイに委譲するラッパー
#[derive(Clone)]
pub struct RecordingEnrollmentGateway {
    inner: Arc<dyn EnrollmentGateway>,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingEnrollmentGateway {
    pub fn new(inner: Arc<dyn EnrollmentGateway>) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 呼び出された操作名（呼び出し順）
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// 記録をクリアする
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, operation: &'static str) {
        self.calls.lock().unwrap().push(operation);
    }
}

#[async_trait]
impl EnrollmentGateway for RecordingEnrollmentGateway {
    async fn course_exists_with_title(
        &self,
        tx: &mut TxContext,
        title: &CourseTitle,
    ) -> Result<bool, InfraError> {
        self.record("course_exists_with_title");
        self.inner.course_exists_with_title(tx, title).await
    }

    async fn student_exists_with_full_name(
        &self,
        tx: &mut TxContext,
        full_name: &FullName,
    ) -> Result<bool, InfraError> {
        self.record("student_exists_with_full_name");
        self.inner.student_exists_with_full_name(tx, full_name).await
    }

    async fn obtain_student_by_id(
        &self,
        tx: &mut TxContext,
        id: &StudentId,
    ) -> Result<Student, InfraError> {
        self.record("obtain_student_by_id");
        self.inner.obtain_student_by_id(tx, id).await
    }

    async fn obtain_course_by_id(
        &self,
        tx: &mut TxContext,
        id: &CourseId,
    ) -> Result<Course, InfraError> {
        self.record("obtain_course_by_id");
        self.inner.obtain_course_by_id(tx, id).await
    }

    async fn persist_course(
        &self,
        tx: &mut TxContext,
        course: &Course,
    ) -> Result<CourseId, InfraError> {
        self.record("persist_course");
        self.inner.persist_course(tx, course).await
    }

    async fn persist_student(
        &self,
        tx: &mut TxContext,
        student: &Student,
    ) -> Result<StudentId, InfraError> {
        self.record("persist_student");
        self.inner.persist_student(tx, student).await
    }

    async fn find_enrollments(&self, student_id: &StudentId) -> Result<Fields, InfraError> {
        self.record("find_enrollments");
        self.inner.find_enrollments(student_id).await
    }
}
