//! User repository.

use std::sync::Arc;

use crate::entities::{
    User,
    user::{self, UserStatus, UserType},
};
use classreg_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr, sea_query::Expr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a non-deleted user by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::IsDeleted.eq(false))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a non-deleted user by email and account type.
    pub async fn find_by_email_and_type(
        &self,
        email: &str,
        user_type: UserType,
    ) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::UserType.eq(user_type))
            .filter(user::Column::IsDeleted.eq(false))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by email and account type, including soft-deleted rows.
    ///
    /// Suspension marks an account deleted, so the suspension path needs to
    /// see those rows to report a repeat attempt correctly.
    pub async fn find_by_email_and_type_include_deleted(
        &self,
        email: &str,
        user_type: UserType,
    ) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::UserType.eq(user_type))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by bearer token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .filter(user::Column::IsDeleted.eq(false))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all non-deleted teachers matching the given emails.
    ///
    /// Returns fewer rows than emails when some addresses do not resolve;
    /// the caller decides whether that is an error.
    pub async fn find_teachers_by_emails(&self, emails: &[String]) -> AppResult<Vec<user::Model>> {
        if emails.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Email.is_in(emails.to_vec()))
            .filter(user::Column::UserType.eq(UserType::Teacher))
            .filter(user::Column::IsDeleted.eq(false))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    ///
    /// A unique-index violation (concurrent insert racing past the service's
    /// duplicate-email pre-check) is a conflict, not a server fault.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AppError::Conflict("Email already registered".to_string())
                }
                _ => AppError::Database(e.to_string()),
            })
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Suspend a user: status and soft-delete flag change in one UPDATE.
    pub async fn suspend(&self, id: &str) -> AppResult<()> {
        User::update_many()
            .col_expr(user::Column::Status, Expr::value(UserStatus::Suspended))
            .col_expr(user::Column::IsDeleted, Expr::value(true))
            .filter(user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Soft-delete a user.
    pub async fn soft_delete(&self, id: &str) -> AppResult<()> {
        User::update_many()
            .col_expr(user::Column::IsDeleted, Expr::value(true))
            .filter(user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Admin search over non-deleted users (paginated).
    pub async fn search(
        &self,
        name: Option<&str>,
        status: Option<UserStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        let mut query = User::find()
            .filter(user::Column::IsDeleted.eq(false))
            .order_by_desc(user::Column::CreatedAt);

        if let Some(name) = name {
            query = query.filter(
                Condition::any()
                    .add(user::Column::FirstName.contains(name))
                    .add(user::Column::LastName.contains(name)),
            );
        }

        if let Some(status) = status {
            query = query.filter(user::Column::Status.eq(status));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_user(id: &str, email: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            password_hash: None,
            token: None,
            user_type: UserType::Student,
            status: UserStatus::Active,
            is_deleted: false,
            last_login: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn find_by_email_returns_match() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user("u1", "s1@x.com")]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_email("s1@x.com").await.unwrap();
        assert_eq!(found.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn find_teachers_short_circuits_on_empty_input() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = UserRepository::new(db);
        let found = repo.find_teachers_by_emails(&[]).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn suspend_issues_single_update() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert!(repo.suspend("u1").await.is_ok());
    }
}
