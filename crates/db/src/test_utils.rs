//! Integration-test support.
//!
//! Connection management plus seeding helpers for the three domain tables,
//! so integration tests can build a roster without going through the
//! services.

use std::sync::Arc;

use chrono::Utc;
use classreg_common::IdGenerator;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Set,
    Statement,
};
use tracing::info;

use crate::entities::{teacher_student_link, user};

/// Tables truncated between tests, children before parents.
const DOMAIN_TABLES: &[&str] = &["teacher_student_link", "notification", "user"];

/// Connection settings for the test database, read from `TEST_DB_*`
/// environment variables.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "classreg_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "classreg_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "classreg_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// URL of the test database itself.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// URL of the `postgres` maintenance database, used to create and drop
    /// per-test databases.
    #[must_use]
    pub fn maintenance_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/postgres",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A live connection to a test database plus seeding helpers.
pub struct TestDatabase {
    pub conn: Arc<DatabaseConnection>,
    pub config: TestDbConfig,
    id_gen: IdGenerator,
}

impl TestDatabase {
    /// Connect to the configured test database.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with explicit settings.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        info!(database = %config.database, "Connected to test database");
        Ok(Self {
            conn: Arc::new(conn),
            config,
            id_gen: IdGenerator::new(),
        })
    }

    /// Create a uniquely named database so tests can run in parallel.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("classreg_test_{}", &suffix[..8]);

        let maintenance = Database::connect(&config.maintenance_url()).await?;
        maintenance
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        maintenance.close().await?;

        info!(database = %config.database, "Created test database");
        Self::with_config(config).await
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.conn.as_ref()
    }

    /// Insert an active teacher account and return its row.
    pub async fn seed_teacher(&self, email: &str) -> Result<user::Model, DbErr> {
        self.seed_user(email, user::UserType::Teacher, user::UserStatus::Active)
            .await
    }

    /// Insert an active student account and return its row.
    pub async fn seed_student(&self, email: &str) -> Result<user::Model, DbErr> {
        self.seed_user(email, user::UserType::Student, user::UserStatus::Active)
            .await
    }

    /// Insert a user row with the given type and status.
    pub async fn seed_user(
        &self,
        email: &str,
        user_type: user::UserType,
        status: user::UserStatus,
    ) -> Result<user::Model, DbErr> {
        let id = self.id_gen.generate();
        user::ActiveModel {
            id: Set(id),
            first_name: Set("Seed".to_string()),
            last_name: Set("User".to_string()),
            email: Set(email.to_string()),
            password_hash: Set(None),
            token: Set(Some(self.id_gen.generate_token())),
            user_type: Set(user_type),
            status: Set(status),
            is_deleted: Set(false),
            last_login: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Register a student with a teacher directly at the table level.
    pub async fn seed_link(
        &self,
        teacher: &user::Model,
        student: &user::Model,
    ) -> Result<teacher_student_link::Model, DbErr> {
        teacher_student_link::ActiveModel {
            id: Set(self.id_gen.generate()),
            student_id: Set(student.id.clone()),
            teacher_id: Set(teacher.id.clone()),
            is_deleted: Set(false),
            created_by: Set("seeder@test".to_string()),
            updated_by: Set("seeder@test".to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Empty the domain tables, leaving the schema and migration history.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        for table in DOMAIN_TABLES {
            self.conn
                .execute(Statement::from_string(
                    DatabaseBackend::Postgres,
                    format!("TRUNCATE TABLE \"{table}\" CASCADE"),
                ))
                .await?;
        }
        info!("Cleaned up test database");
        Ok(())
    }

    /// Drop a database made by [`Self::create_unique`]. Consumes self
    /// because the connection must be closed first.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        self.conn.close_by_ref().await?;

        let maintenance = Database::connect(&self.config.maintenance_url()).await?;

        // Lingering connections block DROP DATABASE.
        maintenance
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
                    self.config.database
                ),
            ))
            .await
            .ok();

        maintenance
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", self.config.database),
            ))
            .await?;
        maintenance.close().await?;

        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }
}
