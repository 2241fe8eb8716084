//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use classreg_common::{AppError, AppResult, IdGenerator, RoleCache, RoleStore};
use classreg_db::{
    entities::user::{self, UserStatus, UserType},
    repositories::{LinkRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    link_repo: LinkRepository,
    role_cache: Option<RoleCache>,
    id_gen: IdGenerator,
}

/// Input for creating a new account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAccountInput {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50))]
    pub last_name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    pub user_type: UserType,
}

/// Input for updating a user's own profile.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
}

/// Input for registering students with a teacher.
#[derive(Debug, Deserialize, Validate)]
pub struct TeacherRegisterInput {
    #[validate(email)]
    pub teacher: String,

    #[validate(length(min = 1), custom(function = validate_unique_emails))]
    pub students: Vec<String>,
}

/// Admin user-list query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersInput {
    pub search: Option<String>,
    pub status: Option<UserStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

fn validate_unique_emails(emails: &[String]) -> Result<(), validator::ValidationError> {
    let mut seen = std::collections::HashSet::new();
    for email in emails {
        if !validator::ValidateEmail::validate_email(email) {
            return Err(validator::ValidationError::new("email"));
        }
        if !seen.insert(email.as_str()) {
            return Err(validator::ValidationError::new("unique"));
        }
    }
    Ok(())
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, link_repo: LinkRepository) -> Self {
        Self {
            user_repo,
            link_repo,
            role_cache: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new user service with cache invalidation support.
    #[must_use]
    pub const fn with_cache(
        user_repo: UserRepository,
        link_repo: LinkRepository,
        role_cache: RoleCache,
    ) -> Self {
        Self {
            user_repo,
            link_repo,
            role_cache: Some(role_cache),
            id_gen: IdGenerator::new(),
        }
    }

    /// Look up a non-deleted user by email and check account guards.
    ///
    /// Missing (or soft-deleted) accounts, unverified accounts and inactive
    /// accounts each map to their own error kind.
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::UserNotFoundOrSuspended(email.to_string()))?;

        check_account_usable(&user)?;
        Ok(user)
    }

    /// Authenticate a user by bearer token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Create a new account.
    pub async fn register_account(&self, input: RegisterAccountInput) -> AppResult<user::Model> {
        input.validate()?;

        // Pre-check; the partial unique index on email is the backstop.
        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let token = self.id_gen.generate_token();

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            password_hash: Set(Some(password_hash)),
            token: Set(Some(token)),
            user_type: Set(input.user_type),
            status: Set(UserStatus::Unverified),
            is_deleted: Set(false),
            ..Default::default()
        };

        self.user_repo.create(model).await
    }

    /// Get a user's own profile.
    pub async fn get_profile(&self, user_id: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .filter(|u| !u.is_deleted)
            .ok_or_else(|| AppError::UserNotFoundOrSuspended(user_id.to_string()))?;

        check_account_usable(&user)?;
        Ok(user)
    }

    /// Update a user's own profile.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.get_profile(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name);
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Soft-delete a user and drop their cached entries.
    pub async fn delete_by_id(&self, user_id: &str) -> AppResult<()> {
        self.user_repo.soft_delete(user_id).await?;

        // Best effort: a stale cache entry only lives until its TTL.
        if let Some(ref cache) = self.role_cache
            && let Err(e) = cache.invalidate_user(user_id).await
        {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to invalidate user cache");
        }

        Ok(())
    }

    /// Admin search over users.
    pub async fn list(&self, input: ListUsersInput) -> AppResult<Vec<user::Model>> {
        let limit = input.limit.unwrap_or(20).min(100);
        let page = input.page.unwrap_or(1).max(1);
        let offset = (page - 1) * limit;

        self.user_repo
            .search(input.search.as_deref(), input.status, limit, offset)
            .await
    }

    /// Register a batch of students with a teacher.
    ///
    /// The teacher and every student must resolve to usable accounts of the
    /// right type before anything is written; the writes then happen in one
    /// transaction, so a failure cannot leave the batch half-applied.
    pub async fn teacher_register(
        &self,
        acting_email: &str,
        input: TeacherRegisterInput,
    ) -> AppResult<()> {
        input.validate()?;

        let teacher = self.get_user_by_email(&input.teacher).await?;
        if teacher.user_type != UserType::Teacher {
            return Err(AppError::UserNotTeacher(input.teacher));
        }

        let mut student_ids = Vec::with_capacity(input.students.len());
        for student_email in &input.students {
            let student = self.get_user_by_email(student_email).await?;
            if student.user_type != UserType::Student {
                return Err(AppError::UserNotStudent(student_email.clone()));
            }
            student_ids.push(student.id);
        }

        self.link_repo
            .register_students(&teacher.id, &student_ids, acting_email)
            .await
    }

    /// Students registered to every teacher in the given list.
    pub async fn common_students(&self, teacher_emails: &[String]) -> AppResult<Vec<String>> {
        let teachers = self
            .user_repo
            .find_teachers_by_emails(teacher_emails)
            .await?;

        // Which email failed is deliberately not reported.
        if teachers.len() != teacher_emails.len() {
            return Err(AppError::EmailTeacherNotFound);
        }

        let teacher_ids: Vec<String> = teachers.into_iter().map(|t| t.id).collect();
        self.link_repo.common_student_emails(&teacher_ids).await
    }

    /// Suspend a student account. This is a one-way transition.
    pub async fn suspend_student(&self, email: &str) -> AppResult<()> {
        // Includes soft-deleted rows so a repeat call reports the right error.
        let user = self
            .user_repo
            .find_by_email_and_type_include_deleted(email, UserType::Student)
            .await?
            .ok_or_else(|| AppError::UserNotStudent(email.to_string()))?;

        if user.status == UserStatus::Suspended || user.is_deleted {
            return Err(AppError::AccountAlreadySuspended(email.to_string()));
        }

        // Unverified and inactive accounts cannot transition to suspended.
        check_account_usable(&user)?;

        self.user_repo.suspend(&user.id).await
    }
}

/// Reject unverified and inactive accounts.
fn check_account_usable(user: &user::Model) -> AppResult<()> {
    match user.status {
        UserStatus::Unverified => Err(AppError::AccountUnverified(user.email.clone())),
        UserStatus::Inactive => Err(AppError::AccountInactive(user.email.clone())),
        UserStatus::Active | UserStatus::Suspended => Ok(()),
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}
