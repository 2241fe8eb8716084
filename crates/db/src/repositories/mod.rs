//! Database repositories.

mod notification;
mod teacher_student_link;
mod user;

pub use notification::NotificationRepository;
pub use teacher_student_link::LinkRepository;
pub use user::UserRepository;
