//! Teacher-student link repository.

use std::sync::Arc;

use crate::entities::{
    TeacherStudentLink, User,
    teacher_student_link as link,
    user::{self, UserStatus},
};
use classreg_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
    sea_query::{Expr, Func},
};

/// Teacher-student link repository for database operations.
#[derive(Clone)]
pub struct LinkRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl LinkRepository {
    /// Create a new link repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a batch of students with a teacher inside one transaction.
    ///
    /// Per student: a missing row is inserted, a retired row is reactivated,
    /// and an active row is left untouched (idempotent re-registration).
    /// Any failure rolls the whole batch back, so partial application
    /// cannot occur.
    pub async fn register_students(
        &self,
        teacher_id: &str,
        student_ids: &[String],
        actor_email: &str,
    ) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for student_id in student_ids {
            let existing = TeacherStudentLink::find()
                .filter(link::Column::StudentId.eq(student_id))
                .filter(link::Column::TeacherId.eq(teacher_id))
                .one(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            match existing {
                None => {
                    let model = link::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        student_id: Set(student_id.clone()),
                        teacher_id: Set(teacher_id.to_string()),
                        is_deleted: Set(false),
                        created_by: Set(actor_email.to_string()),
                        updated_by: Set(actor_email.to_string()),
                        ..Default::default()
                    };
                    model
                        .insert(&txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                }
                Some(row) if row.is_deleted => {
                    TeacherStudentLink::update_many()
                        .col_expr(link::Column::IsDeleted, Expr::value(false))
                        .col_expr(link::Column::UpdatedBy, Expr::value(actor_email))
                        .filter(link::Column::Id.eq(row.id))
                        .filter(link::Column::IsDeleted.eq(true))
                        .exec(&txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                }
                // Already actively registered: no-op.
                Some(_) => {}
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Emails of a teacher's actively linked, non-deleted students.
    pub async fn student_emails_for_teacher(&self, teacher_id: &str) -> AppResult<Vec<String>> {
        TeacherStudentLink::find()
            .select_only()
            .column(user::Column::Email)
            .inner_join(User)
            .filter(link::Column::TeacherId.eq(teacher_id))
            .filter(link::Column::IsDeleted.eq(false))
            .filter(user::Column::IsDeleted.eq(false))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Emails of students registered to every one of the given teachers.
    ///
    /// Groups active link rows by student email and keeps the groups whose
    /// distinct-teacher count equals the number of teachers queried, which is
    /// the intersection of the rosters. Suspended students are excluded.
    pub async fn common_student_emails(&self, teacher_ids: &[String]) -> AppResult<Vec<String>> {
        if teacher_ids.is_empty() {
            return Ok(vec![]);
        }

        let teacher_count = i64::try_from(teacher_ids.len())
            .map_err(|e| AppError::Internal(e.to_string()))?;

        TeacherStudentLink::find()
            .select_only()
            .column(user::Column::Email)
            .inner_join(User)
            .filter(link::Column::TeacherId.is_in(teacher_ids.to_vec()))
            .filter(link::Column::IsDeleted.eq(false))
            .filter(user::Column::Status.ne(UserStatus::Suspended))
            .group_by(user::Column::Email)
            .having(
                Expr::expr(Func::count_distinct(Expr::col((
                    TeacherStudentLink,
                    link::Column::TeacherId,
                ))))
                    .eq(teacher_count),
            )
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
