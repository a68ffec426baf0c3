//! 受講登録ユースケース
//!
//! 講座・受講者の作成（自然キーで冪等）、受講登録、受講登録一覧を提供する。
//!
//! ## エラーの伝播
//!
//! - `create_course` / `create_student` / `find_enrollments_for_student`: 失敗は `Err` で返す
//! - `enroll`: 失敗も [`Outcome::Failure`] として返し、`Err` にはならない

use std::sync::Arc;

use enrollment_domain::{
    course::{Course, CourseId, CourseTitle},
    student::{FullName, Student, StudentId},
};
use enrollment_infra::{EnrollmentGateway, Fields, TransactionManager, TxContext};
use enrollment_shared::{event_log::event, log_business_event};
use serde_json::{Value, json};

use crate::{error::CoreError, presenter::Outcome};

/// 受講登録ユースケース
pub struct EnrollmentUseCaseImpl {
    gateway:    Arc<dyn EnrollmentGateway>,
    tx_manager: Arc<dyn TransactionManager>,
}

/// 自然キーが既に存在する場合の結果
fn already_exists() -> Fields {
    let mut fields = Fields::new();
    fields.insert("exists".to_string(), json!("already"));
    fields
}

impl EnrollmentUseCaseImpl {
    pub fn new(
        gateway: Arc<dyn EnrollmentGateway>,
        tx_manager: Arc<dyn TransactionManager>,
    ) -> Self {
        Self {
            gateway,
            tx_manager,
        }
    }

    /// トランザクションを開始する
    async fn begin_tx(&self) -> Result<TxContext, CoreError> {
        self.tx_manager.begin().await.map_err(CoreError::from)
    }

    /// 講座を作成する
    ///
    /// 同じタイトルの講座が存在すれば何も書き込まず `{"exists": "already"}` を、
    /// そうでなければ受講者数 0 の講座を作成して `{"courseId": id}` を返す。
    #[tracing::instrument(skip_all)]
    pub async fn create_course(&self, title: String) -> Result<Outcome, CoreError> {
        let title = CourseTitle::new(title)?;

        let mut tx = self.begin_tx().await?;
        if self
            .gateway
            .course_exists_with_title(&mut tx, &title)
            .await?
        {
            return Ok(Outcome::Success(already_exists()));
        }

        let course_id = self.gateway.persist_course(&mut tx, &Course::new(title)).await?;
        tx.commit().await?;

        log_business_event!(
            event.category = event::category::COURSE,
            event.action = event::action::COURSE_CREATED,
            event.entity_type = event::entity_type::COURSE,
            event.entity_id = %course_id,
            event.result = event::result::SUCCESS,
            "講座作成"
        );

        let mut fields = Fields::new();
        fields.insert("courseId".to_string(), json!(course_id));
        Ok(Outcome::Success(fields))
    }

    /// 受講者を作成する
    ///
    /// 同じ氏名の受講者が存在すれば何も書き込まず `{"exists": "already"}` を、
    /// そうでなければ登録講座なしの受講者を作成して `{"studentId": id}` を返す。
    #[tracing::instrument(skip_all)]
    pub async fn create_student(&self, full_name: String) -> Result<Outcome, CoreError> {
        let full_name = FullName::new(full_name)?;

        let mut tx = self.begin_tx().await?;
        if self
            .gateway
            .student_exists_with_full_name(&mut tx, &full_name)
            .await?
        {
            return Ok(Outcome::Success(already_exists()));
        }

        let student_id = self
            .gateway
            .persist_student(&mut tx, &Student::new(full_name))
            .await?;
        tx.commit().await?;

        log_business_event!(
            event.category = event::category::STUDENT,
            event.action = event::action::STUDENT_CREATED,
            event.entity_type = event::entity_type::STUDENT,
            event.entity_id = %student_id,
            event.result = event::result::SUCCESS,
            "受講者作成"
        );

        let mut fields = Fields::new();
        fields.insert("studentId".to_string(), json!(student_id));
        Ok(Outcome::Success(fields))
    }

    /// 受講者を講座に登録する
    ///
    /// 成功時は `{"studentId", "newEnrollment", "coursesIds"}` を返す。
    /// 受講者・講座が存在しない場合やゲートウェイの失敗は [`Outcome::Failure`] になり、
    /// トランザクションはロールバックされる。
    #[tracing::instrument(skip_all, fields(%course_id, %student_id))]
    pub async fn enroll(&self, course_id: CourseId, student_id: StudentId) -> Outcome {
        match self.try_enroll(course_id, student_id).await {
            Ok(fields) => Outcome::Success(fields),
            Err(e) => {
                log_business_event!(
                    event.category = event::category::ENROLLMENT,
                    event.action = event::action::STUDENT_ENROLLED,
                    event.entity_type = event::entity_type::STUDENT,
                    event.entity_id = %student_id,
                    event.course_id = %course_id,
                    event.result = event::result::FAILURE,
                    event.reason = %e,
                    "受講登録失敗"
                );
                Outcome::Failure(e)
            }
        }
    }

    async fn try_enroll(
        &self,
        course_id: CourseId,
        student_id: StudentId,
    ) -> Result<Fields, CoreError> {
        let mut tx = self.begin_tx().await?;

        // 1. 受講者を取得
        let student = self
            .gateway
            .obtain_student_by_id(&mut tx, &student_id)
            .await?;

        // 2. 講座 ID 集合への追加を試みる
        let outcome = student.enroll_in_course(course_id);
        let new_enrollment = outcome.is_course_added();
        let student = outcome.into_student();

        // 3. 登録済みなら書き込みなし
        if new_enrollment {
            // 4. 受講者 → 講座の順に書き換える
            self.gateway.persist_student(&mut tx, &student).await?;

            let course = self
                .gateway
                .obtain_course_by_id(&mut tx, &course_id)
                .await?
                .enroll_student()?;
            self.gateway.persist_course(&mut tx, &course).await?;

            tx.commit().await?;

            log_business_event!(
                event.category = event::category::ENROLLMENT,
                event.action = event::action::STUDENT_ENROLLED,
                event.entity_type = event::entity_type::STUDENT,
                event.entity_id = %student_id,
                event.course_id = %course_id,
                event.result = event::result::SUCCESS,
                "受講登録"
            );
        }

        let courses_ids: Vec<Value> = student.course_ids().iter().map(|id| json!(id)).collect();

        let mut fields = Fields::new();
        fields.insert("studentId".to_string(), json!(student_id));
        fields.insert("newEnrollment".to_string(), json!(new_enrollment));
        fields.insert("coursesIds".to_string(), Value::Array(courses_ids));
        Ok(fields)
    }

    /// 受講者の受講登録一覧を取得する
    ///
    /// ゲートウェイが返したフィールドをそのまま成功結果とする。
    #[tracing::instrument(skip_all, fields(%student_id))]
    pub async fn find_enrollments_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Outcome, CoreError> {
        let fields = self.gateway.find_enrollments(&student_id).await?;
        Ok(Outcome::Success(fields))
    }
}
