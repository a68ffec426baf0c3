//! # PostgreSQL ゲートウェイ
//!
//! sqlx で [`EnrollmentGateway`] を実装する。
//!
//! ## 設計方針
//!
//! - **行ロック**: 書き換え目的の取得は `SELECT ... FOR UPDATE` で行をロックし、
//!   同じ講座への同時受講登録で受講者数の更新が失われないようにする
//! - **一意制約**: `courses_title_key` / `students_full_name_key` 違反は
//!   `InfraErrorKind::Conflict` に変換する
//! - **講座 ID 集合**: `student_courses` の行で保持し、更新時は差分のみ削除・追加する

use async_trait::async_trait;
use enrollment_domain::{
    course::{Course, CourseId, CourseTitle},
    student::{FullName, Student, StudentId},
};
use sqlx::PgPool;

use super::{EnrollmentGateway, Fields, enrollment_listing};
use crate::{db::TxContext, error::InfraError};

const COURSES_TITLE_KEY: &str = "courses_title_key";
const STUDENTS_FULL_NAME_KEY: &str = "students_full_name_key";

/// PostgreSQL 実装の EnrollmentGateway
#[derive(Debug, Clone)]
pub struct PostgresEnrollmentGateway {
    pool: PgPool,
}

impl PostgresEnrollmentGateway {
    /// 新しいゲートウェイインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 指定の一意制約違反なら Conflict に、それ以外は Database エラーに変換する
fn map_unique_violation(
    err: sqlx::Error,
    constraint: &str,
    entity: &str,
    key: impl FnOnce() -> String,
) -> InfraError {
    let violated = err
        .as_database_error()
        .and_then(|d| d.constraint())
        .is_some_and(|c| c == constraint);

    if violated {
        InfraError::conflict(entity, key())
    } else {
        err.into()
    }
}

fn course_from_row(id: i64, title: String, enrolled_count: i64) -> Result<Course, InfraError> {
    let title = CourseTitle::new(title)
        .map_err(|e| InfraError::unexpected(format!("不正な講座タイトル: {e}")))?;
    let enrolled_count = u32::try_from(enrolled_count)
        .map_err(|e| InfraError::unexpected(format!("不正な受講者数: {e}")))?;

    Ok(Course::from_db(CourseId::new(id), title, enrolled_count))
}

fn full_name_from_row(full_name: String) -> Result<FullName, InfraError> {
    FullName::new(full_name).map_err(|e| InfraError::unexpected(format!("不正な氏名: {e}")))
}

#[async_trait]
impl EnrollmentGateway for PostgresEnrollmentGateway {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn course_exists_with_title(
        &self,
        tx: &mut TxContext,
        title: &CourseTitle,
    ) -> Result<bool, InfraError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM courses WHERE title = $1)",
        )
        .bind(title.as_str())
        .fetch_one(tx.conn()?)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn student_exists_with_full_name(
        &self,
        tx: &mut TxContext,
        full_name: &FullName,
    ) -> Result<bool, InfraError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM students WHERE full_name = $1)",
        )
        .bind(full_name.as_str())
        .fetch_one(tx.conn()?)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn obtain_student_by_id(
        &self,
        tx: &mut TxContext,
        id: &StudentId,
    ) -> Result<Student, InfraError> {
        let conn = tx.conn()?;

        let full_name = sqlx::query_scalar::<_, String>(
            "SELECT full_name FROM students WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| InfraError::not_found("Student", id))?;

        let course_ids = sqlx::query_scalar::<_, i64>(
            "SELECT course_id FROM student_courses WHERE student_id = $1",
        )
        .bind(id.as_i64())
        .fetch_all(&mut *conn)
        .await?;

        Ok(Student::from_db(
            *id,
            full_name_from_row(full_name)?,
            course_ids.into_iter().map(CourseId::new).collect(),
        ))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn obtain_course_by_id(
        &self,
        tx: &mut TxContext,
        id: &CourseId,
    ) -> Result<Course, InfraError> {
        let (id, title, enrolled_count) = sqlx::query_as::<_, (i64, String, i64)>(
            "SELECT id, title, enrolled_count FROM courses WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_i64())
        .fetch_optional(tx.conn()?)
        .await?
        .ok_or_else(|| InfraError::not_found("Course", id))?;

        course_from_row(id, title, enrolled_count)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = ?course.id()))]
    async fn persist_course(
        &self,
        tx: &mut TxContext,
        course: &Course,
    ) -> Result<CourseId, InfraError> {
        let conn = tx.conn()?;
        let conflict_key = || format!("title={}", course.title());

        let Some(id) = course.id() else {
            let id = sqlx::query_scalar::<_, i64>(
                "INSERT INTO courses (title, enrolled_count) VALUES ($1, $2) RETURNING id",
            )
            .bind(course.title().as_str())
            .bind(i64::from(course.enrolled_count()))
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| map_unique_violation(e, COURSES_TITLE_KEY, "Course", conflict_key))?;

            return Ok(CourseId::new(id));
        };

        let result =
            sqlx::query("UPDATE courses SET title = $2, enrolled_count = $3 WHERE id = $1")
                .bind(id.as_i64())
                .bind(course.title().as_str())
                .bind(i64::from(course.enrolled_count()))
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    map_unique_violation(e, COURSES_TITLE_KEY, "Course", conflict_key)
                })?;

        if result.rows_affected() == 0 {
            return Err(InfraError::not_found("Course", id));
        }

        Ok(id)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = ?student.id()))]
    async fn persist_student(
        &self,
        tx: &mut TxContext,
        student: &Student,
    ) -> Result<StudentId, InfraError> {
        let conn = tx.conn()?;
        let course_ids: Vec<i64> = student.course_ids().iter().map(CourseId::as_i64).collect();
        let conflict_key = || "full_name".to_string();

        let id = match student.id() {
            None => {
                let id = sqlx::query_scalar::<_, i64>(
                    "INSERT INTO students (full_name) VALUES ($1) RETURNING id",
                )
                .bind(student.full_name().as_str())
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| {
                    map_unique_violation(e, STUDENTS_FULL_NAME_KEY, "Student", conflict_key)
                })?;
                StudentId::new(id)
            }
            Some(id) => {
                let result = sqlx::query("UPDATE students SET full_name = $2 WHERE id = $1")
                    .bind(id.as_i64())
                    .bind(student.full_name().as_str())
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        map_unique_violation(e, STUDENTS_FULL_NAME_KEY, "Student", conflict_key)
                    })?;

                if result.rows_affected() == 0 {
                    return Err(InfraError::not_found("Student", id));
                }

                sqlx::query(
                    "DELETE FROM student_courses WHERE student_id = $1 AND NOT (course_id = ANY($2))",
                )
                .bind(id.as_i64())
                .bind(&course_ids)
                .execute(&mut *conn)
                .await?;

                id
            }
        };

        // course_id の外部キーは DEFERRABLE INITIALLY DEFERRED のためコミット時に検証される
        sqlx::query(
            r#"
            INSERT INTO student_courses (student_id, course_id)
            SELECT $1, unnest($2::bigint[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id.as_i64())
        .bind(&course_ids)
        .execute(&mut *conn)
        .await?;

        Ok(id)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%student_id))]
    async fn find_enrollments(&self, student_id: &StudentId) -> Result<Fields, InfraError> {
        let full_name =
            sqlx::query_scalar::<_, String>("SELECT full_name FROM students WHERE id = $1")
                .bind(student_id.as_i64())
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| InfraError::not_found("Student", student_id))?;

        let rows = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT c.id, c.title
            FROM student_courses sc
            JOIN courses c ON c.id = sc.course_id
            WHERE sc.student_id = $1
            ORDER BY c.id ASC
            "#,
        )
        .bind(student_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let courses = rows
            .into_iter()
            .map(|(id, title)| {
                CourseTitle::new(title)
                    .map(|title| (CourseId::new(id), title))
                    .map_err(|e| InfraError::unexpected(format!("不正な講座タイトル: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(enrollment_listing(
            *student_id,
            &full_name_from_row(full_name)?,
            courses.iter().map(|(id, title)| (*id, title)),
        ))
    }
}
