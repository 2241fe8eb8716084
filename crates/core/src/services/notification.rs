//! Notification recipient resolution.

use classreg_common::{AppError, AppResult, IdGenerator};
use classreg_db::{
    entities::{
        notification,
        user::{self, UserType},
    },
    repositories::{LinkRepository, NotificationRepository, UserRepository},
};
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use std::sync::LazyLock;
use validator::Validate;

/// Matches `@student@example.com` style mentions in notification text.
#[allow(clippy::unwrap_used)]
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([\w.+-]+@[\w-]+\.[\w.-]+)").unwrap());

/// Input for resolving notification recipients.
#[derive(Debug, Deserialize, Validate)]
pub struct RecipientsInput {
    #[validate(email)]
    pub teacher: String,

    #[validate(length(min = 1))]
    pub notification: String,
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    user_repo: UserRepository,
    link_repo: LinkRepository,
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        link_repo: LinkRepository,
        notification_repo: NotificationRepository,
    ) -> Self {
        Self {
            user_repo,
            link_repo,
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Resolve who can receive a notification and record that it was sent.
    ///
    /// Recipients are the teacher's active roster plus every student
    /// mentioned as `@<email>` in the text, deduplicated in order of first
    /// appearance. Suspended students never appear in the roster half; a
    /// mention of one is taken at face value, matching what the sender typed.
    pub async fn recipients(
        &self,
        sender: &user::Model,
        input: RecipientsInput,
    ) -> AppResult<Vec<String>> {
        input.validate()?;

        if sender.user_type != UserType::Teacher {
            return Err(AppError::Forbidden(format!(
                "Only teachers may send notifications: {}",
                sender.email
            )));
        }

        let teacher = self
            .user_repo
            .find_by_email_and_type(&input.teacher, UserType::Teacher)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Teacher not found: {}", input.teacher)))?;

        let roster = self.link_repo.student_emails_for_teacher(&teacher.id).await?;
        let mentioned = extract_mentions(&input.notification);

        let mut seen = std::collections::HashSet::new();
        let mut recipients = Vec::new();
        for email in roster.into_iter().chain(mentioned) {
            if seen.insert(email.clone()) {
                recipients.push(email);
            }
        }

        let record = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(format!(
                "Notification sent to students of {}",
                teacher.email
            )),
            content: Set(input.notification),
            emails: Set(recipients.join(", ")),
            created_by: Set(sender.email.clone()),
            updated_by: Set(sender.email.clone()),
            ..Default::default()
        };
        self.notification_repo.create(record).await?;

        Ok(recipients)
    }

    /// Notifications previously sent by a user, newest first.
    pub async fn sent_by(
        &self,
        sender_email: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_sender(sender_email, limit.min(100), offset)
            .await
    }
}

/// Extract `@<email>` mentions in order of appearance.
fn extract_mentions(text: &str) -> Vec<String> {
    MENTION_RE
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use classreg_db::entities::user::UserStatus;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::sync::Arc;

    fn test_user(id: &str, email: &str, user_type: UserType) -> user::Model {
        user::Model {
            id: id.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            password_hash: None,
            token: None,
            user_type,
            status: UserStatus::Active,
            is_deleted: false,
            last_login: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_notification(id: &str) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            title: "Notification sent to students of t@x.com".to_string(),
            content: "hello".to_string(),
            emails: String::new(),
            created_by: "t@x.com".to_string(),
            updated_by: "t@x.com".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(
        user_db: MockDatabase,
        link_db: MockDatabase,
        notification_db: MockDatabase,
    ) -> NotificationService {
        NotificationService::new(
            UserRepository::new(Arc::new(user_db.into_connection())),
            LinkRepository::new(Arc::new(link_db.into_connection())),
            NotificationRepository::new(Arc::new(notification_db.into_connection())),
        )
    }

    fn input(teacher: &str, notification: &str) -> RecipientsInput {
        RecipientsInput {
            teacher: teacher.to_string(),
            notification: notification.to_string(),
        }
    }

    #[test]
    fn mentions_are_extracted_in_order() {
        let mentions = extract_mentions(
            "Hello students! @studentagnes@gmail.com @studentmiche@gmail.com",
        );
        assert_eq!(
            mentions,
            vec![
                "studentagnes@gmail.com".to_string(),
                "studentmiche@gmail.com".to_string(),
            ]
        );
    }

    #[test]
    fn text_without_mentions_yields_nothing() {
        assert!(extract_mentions("Hey everybody, quiz on Friday").is_empty());
        assert!(extract_mentions("reach me at help@school.com, no at-prefix").is_empty());
    }

    #[tokio::test]
    async fn non_teacher_sender_is_forbidden() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let sender = test_user("s1", "s1@x.com", UserType::Student);
        let result = svc.recipients(&sender, input("t@x.com", "hello")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn unknown_teacher_is_not_found() {
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()]);
        let svc = service(
            user_db,
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let sender = test_user("t0", "sender@x.com", UserType::Teacher);
        let result = svc.recipients(&sender, input("ghost@x.com", "hello")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn recipients_union_roster_and_mentions_without_duplicates() {
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_user("t1", "t@x.com", UserType::Teacher)]]);
        let link_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![
            btreemap! { "email" => Value::from("a@x.com") },
            btreemap! { "email" => Value::from("b@x.com") },
        ]]);
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_notification("n1")]]);

        let svc = service(user_db, link_db, notification_db);
        let sender = test_user("t0", "sender@x.com", UserType::Teacher);
        let recipients = svc
            .recipients(&sender, input("t@x.com", "Hi @c@x.com and @a@x.com"))
            .await
            .unwrap();

        // Roster first, then mentions, duplicates dropped on first sighting.
        assert_eq!(
            recipients,
            vec![
                "a@x.com".to_string(),
                "b@x.com".to_string(),
                "c@x.com".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn empty_roster_still_honors_mentions() {
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_user("t1", "t@x.com", UserType::Teacher)]]);
        let link_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<std::collections::BTreeMap<&str, Value>>::new()]);
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_notification("n1")]]);

        let svc = service(user_db, link_db, notification_db);
        let sender = test_user("t0", "sender@x.com", UserType::Teacher);
        let recipients = svc
            .recipients(&sender, input("t@x.com", "Hey @lone@x.com"))
            .await
            .unwrap();

        assert_eq!(recipients, vec!["lone@x.com".to_string()]);
    }
}
