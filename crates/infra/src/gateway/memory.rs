//! # インメモリゲートウェイ
//!
//! プロセス内のストアで [`EnrollmentGateway`] を実装する。
//! `STORAGE_BACKEND=memory` での起動と、データベースなしの結合テストで使用する。
//!
//! ## トランザクション
//!
//! [`InMemoryTransactionManager::begin`] はストアの tokio Mutex を所有ガードで取得し、
//! 同時にスナップショットを保存する。コミットせずにドロップされた場合は
//! スナップショットに巻き戻す。トランザクション中はストア全体が排他されるため、
//! 分離レベルは実質 SERIALIZABLE となる。
//!
//! ## 使用例
//!
//! ```rust
//! use enrollment_infra::gateway::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! let gateway = store.gateway();
//! let tx_manager = store.transaction_manager();
//! # let _ = (gateway, tx_manager);
//! ```

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use enrollment_domain::{
    course::{Course, CourseId, CourseTitle},
    student::{FullName, Student, StudentId},
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{EnrollmentGateway, Fields, enrollment_listing};
use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
};

// =============================================================================
// MemoryStore
// =============================================================================

/// インメモリストアの中身
///
/// ID は 1 から採番する。
#[derive(Debug, Clone)]
pub(crate) struct MemoryStore {
    courses:         BTreeMap<i64, Course>,
    students:        BTreeMap<i64, Student>,
    next_course_id:  i64,
    next_student_id: i64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            courses:         BTreeMap::new(),
            students:        BTreeMap::new(),
            next_course_id:  1,
            next_student_id: 1,
        }
    }
}

impl MemoryStore {
    fn course_by_title(&self, title: &CourseTitle) -> Option<&Course> {
        self.courses.values().find(|c| c.title() == title)
    }

    fn student_by_full_name(&self, full_name: &FullName) -> Option<&Student> {
        self.students.values().find(|s| s.full_name() == full_name)
    }

    fn insert_course(&mut self, course: &Course) -> Result<CourseId, InfraError> {
        if self.course_by_title(course.title()).is_some() {
            return Err(InfraError::conflict(
                "Course",
                format!("title={}", course.title()),
            ));
        }

        let id = CourseId::new(self.next_course_id);
        self.next_course_id += 1;
        self.courses.insert(
            id.as_i64(),
            Course::from_db(id, course.title().clone(), course.enrolled_count()),
        );
        Ok(id)
    }

    fn update_course(&mut self, id: CourseId, course: &Course) -> Result<CourseId, InfraError> {
        if !self.courses.contains_key(&id.as_i64()) {
            return Err(InfraError::not_found("Course", id));
        }
        if self
            .course_by_title(course.title())
            .is_some_and(|other| other.id() != Some(id))
        {
            return Err(InfraError::conflict(
                "Course",
                format!("title={}", course.title()),
            ));
        }

        self.courses.insert(id.as_i64(), course.clone());
        Ok(id)
    }

    fn insert_student(&mut self, student: &Student) -> Result<StudentId, InfraError> {
        if self.student_by_full_name(student.full_name()).is_some() {
            return Err(InfraError::conflict("Student", "full_name"));
        }

        let id = StudentId::new(self.next_student_id);
        self.next_student_id += 1;
        self.students.insert(
            id.as_i64(),
            Student::from_db(
                id,
                student.full_name().clone(),
                student.course_ids().clone(),
            ),
        );
        Ok(id)
    }

    fn update_student(
        &mut self,
        id: StudentId,
        student: &Student,
    ) -> Result<StudentId, InfraError> {
        if !self.students.contains_key(&id.as_i64()) {
            return Err(InfraError::not_found("Student", id));
        }
        if self
            .student_by_full_name(student.full_name())
            .is_some_and(|other| other.id() != Some(id))
        {
            return Err(InfraError::conflict("Student", "full_name"));
        }

        self.students.insert(id.as_i64(), student.clone());
        Ok(id)
    }

    fn listing(&self, student_id: &StudentId) -> Result<Fields, InfraError> {
        let student = self
            .students
            .get(&student_id.as_i64())
            .ok_or_else(|| InfraError::not_found("Student", student_id))?;

        let courses = student.course_ids().iter().filter_map(|course_id| {
            self.courses
                .get(&course_id.as_i64())
                .map(|course| (*course_id, course.title()))
        });

        Ok(enrollment_listing(*student_id, student.full_name(), courses))
    }
}

// =============================================================================
// MemoryTx
// =============================================================================

/// インメモリストアのトランザクション
///
/// ストアのロックを保持し、ドロップ時にスナップショットが残っていれば巻き戻す。
pub(crate) struct MemoryTx {
    origin:   Arc<Mutex<MemoryStore>>,
    guard:    OwnedMutexGuard<MemoryStore>,
    snapshot: Option<MemoryStore>,
}

impl MemoryTx {
    async fn begin(origin: Arc<Mutex<MemoryStore>>) -> Self {
        let guard = Arc::clone(&origin).lock_owned().await;
        let snapshot = Some(guard.clone());
        Self {
            origin,
            guard,
            snapshot,
        }
    }

    /// 変更を確定する（スナップショットを破棄してロックを解放する）
    pub(crate) fn commit(mut self) {
        self.snapshot = None;
    }

    fn belongs_to(&self, store: &Arc<Mutex<MemoryStore>>) -> bool {
        Arc::ptr_eq(&self.origin, store)
    }

    fn store(&mut self) -> &mut MemoryStore {
        &mut self.guard
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

// =============================================================================
// InMemoryStore
// =============================================================================

/// インメモリストアのハンドル
///
/// 同じストアを共有するゲートウェイとトランザクションマネージャを生成する。
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<MemoryStore>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gateway(&self) -> InMemoryEnrollmentGateway {
        InMemoryEnrollmentGateway {
            store: Arc::clone(&self.inner),
        }
    }

    pub fn transaction_manager(&self) -> InMemoryTransactionManager {
        InMemoryTransactionManager {
            store: Arc::clone(&self.inner),
        }
    }
}

/// インメモリストア用 TransactionManager 実装
#[derive(Clone)]
pub struct InMemoryTransactionManager {
    store: Arc<Mutex<MemoryStore>>,
}

#[async_trait]
impl TransactionManager for InMemoryTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        let tx = MemoryTx::begin(Arc::clone(&self.store)).await;
        Ok(TxContext::from_memory(tx))
    }
}

// =============================================================================
// InMemoryEnrollmentGateway
// =============================================================================

/// インメモリ実装の EnrollmentGateway
#[derive(Clone)]
pub struct InMemoryEnrollmentGateway {
    store: Arc<Mutex<MemoryStore>>,
}

impl InMemoryEnrollmentGateway {
    /// TxContext からこのゲートウェイのストアを取り出す
    fn locked_store<'a>(&self, tx: &'a mut TxContext) -> Result<&'a mut MemoryStore, InfraError> {
        let memory = tx.memory()?;
        if !memory.belongs_to(&self.store) {
            return Err(InfraError::unexpected(
                "別のストアのトランザクションが渡されました",
            ));
        }
        Ok(memory.store())
    }
}

#[async_trait]
impl EnrollmentGateway for InMemoryEnrollmentGateway {
    async fn course_exists_with_title(
        &self,
        tx: &mut TxContext,
        title: &CourseTitle,
    ) -> Result<bool, InfraError> {
        Ok(self.locked_store(tx)?.course_by_title(title).is_some())
    }

    async fn student_exists_with_full_name(
        &self,
        tx: &mut TxContext,
        full_name: &FullName,
    ) -> Result<bool, InfraError> {
        Ok(self.locked_store(tx)?.student_by_full_name(full_name).is_some())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn obtain_student_by_id(
        &self,
        tx: &mut TxContext,
        id: &StudentId,
    ) -> Result<Student, InfraError> {
        self.locked_store(tx)?
            .students
            .get(&id.as_i64())
            .cloned()
            .ok_or_else(|| InfraError::not_found("Student", id))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn obtain_course_by_id(
        &self,
        tx: &mut TxContext,
        id: &CourseId,
    ) -> Result<Course, InfraError> {
        self.locked_store(tx)?
            .courses
            .get(&id.as_i64())
            .cloned()
            .ok_or_else(|| InfraError::not_found("Course", id))
    }

    async fn persist_course(
        &self,
        tx: &mut TxContext,
        course: &Course,
    ) -> Result<CourseId, InfraError> {
        let store = self.locked_store(tx)?;
        match course.id() {
            None => store.insert_course(course),
            Some(id) => store.update_course(id, course),
        }
    }

    async fn persist_student(
        &self,
        tx: &mut TxContext,
        student: &Student,
    ) -> Result<StudentId, InfraError> {
        let store = self.locked_store(tx)?;
        match student.id() {
            None => store.insert_student(student),
            Some(id) => store.update_student(id, student),
        }
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%student_id))]
    async fn find_enrollments(&self, student_id: &StudentId) -> Result<Fields, InfraError> {
        self.store.lock().await.listing(student_id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn algebra() -> CourseTitle {
        CourseTitle::new("Algebra").unwrap()
    }

    fn ada() -> FullName {
        FullName::new("Ada").unwrap()
    }

    #[tokio::test]
    async fn test_挿入した講座には1から連番が振られる() {
        let store = InMemoryStore::new();
        let sut = store.gateway();
        let mut tx = store.transaction_manager().begin().await.unwrap();

        let first = sut
            .persist_course(&mut tx, &Course::new(algebra()))
            .await
            .unwrap();
        let second = sut
            .persist_course(&mut tx, &Course::new(CourseTitle::new("Logic").unwrap()))
            .await
            .unwrap();

        assert_eq!(first, CourseId::new(1));
        assert_eq!(second, CourseId::new(2));
    }

    #[tokio::test]
    async fn test_同じタイトルの講座の挿入はconflict() {
        let store = InMemoryStore::new();
        let sut = store.gateway();
        let mut tx = store.transaction_manager().begin().await.unwrap();
        sut.persist_course(&mut tx, &Course::new(algebra()))
            .await
            .unwrap();

        let result = sut.persist_course(&mut tx, &Course::new(algebra())).await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::error::InfraErrorKind::Conflict { .. }
        ));
    }

    #[tokio::test]
    async fn test_存在しない受講者の更新はnot_found() {
        let store = InMemoryStore::new();
        let sut = store.gateway();
        let mut tx = store.transaction_manager().begin().await.unwrap();
        let student = Student::from_db(StudentId::new(42), ada(), BTreeSet::new());

        let result = sut.persist_student(&mut tx, &student).await;

        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_コミットせずにドロップすると変更が巻き戻る() {
        let store = InMemoryStore::new();
        let sut = store.gateway();
        let tx_manager = store.transaction_manager();

        {
            let mut tx = tx_manager.begin().await.unwrap();
            sut.persist_student(&mut tx, &Student::new(ada()))
                .await
                .unwrap();
        }

        let mut tx = tx_manager.begin().await.unwrap();
        assert!(!sut.student_exists_with_full_name(&mut tx, &ada()).await.unwrap());
        // 採番も巻き戻る
        let id = sut
            .persist_student(&mut tx, &Student::new(ada()))
            .await
            .unwrap();
        assert_eq!(id, StudentId::new(1));
    }

    #[tokio::test]
    async fn test_コミットした変更は次のトランザクションから見える() {
        let store = InMemoryStore::new();
        let sut = store.gateway();
        let tx_manager = store.transaction_manager();

        let mut tx = tx_manager.begin().await.unwrap();
        sut.persist_course(&mut tx, &Course::new(algebra()))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = tx_manager.begin().await.unwrap();
        assert!(sut.course_exists_with_title(&mut tx, &algebra()).await.unwrap());
    }

    #[tokio::test]
    async fn test_別ストアのトランザクションは拒否される() {
        let sut = InMemoryStore::new().gateway();
        let mut foreign_tx = InMemoryStore::new()
            .transaction_manager()
            .begin()
            .await
            .unwrap();

        let result = sut.course_exists_with_title(&mut foreign_tx, &algebra()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_モックのトランザクションは拒否される() {
        let sut = InMemoryStore::new().gateway();

        let result = sut
            .obtain_course_by_id(&mut TxContext::mock(), &CourseId::new(1))
            .await;

        assert!(!result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_受講登録一覧は講座id昇順で返る() {
        let store = InMemoryStore::new();
        let sut = store.gateway();
        let mut tx = store.transaction_manager().begin().await.unwrap();
        let algebra_id = sut
            .persist_course(&mut tx, &Course::new(algebra()))
            .await
            .unwrap();
        let logic_id = sut
            .persist_course(&mut tx, &Course::new(CourseTitle::new("Logic").unwrap()))
            .await
            .unwrap();
        let student_id = sut
            .persist_student(&mut tx, &Student::new(ada()))
            .await
            .unwrap();
        let student = Student::from_db(
            student_id,
            ada(),
            BTreeSet::from([logic_id, algebra_id]),
        );
        sut.persist_student(&mut tx, &student).await.unwrap();
        tx.commit().await.unwrap();

        let fields = sut.find_enrollments(&student_id).await.unwrap();

        assert_eq!(
            serde_json::Value::Object(fields),
            json!({
                "studentId": 1,
                "fullName": "Ada",
                "courses": [
                    { "courseId": 1, "title": "Algebra" },
                    { "courseId": 2, "title": "Logic" },
                ],
            })
        );
    }

    #[tokio::test]
    async fn test_存在しない受講者の受講登録一覧はnot_found() {
        let sut = InMemoryStore::new().gateway();

        let result = sut.find_enrollments(&StudentId::new(1)).await;

        assert!(result.unwrap_err().is_not_found());
    }
}
