//! Database entities.

pub mod notification;
pub mod teacher_student_link;
pub mod user;

pub use notification::Entity as Notification;
pub use teacher_student_link::Entity as TeacherStudentLink;
pub use user::Entity as User;
