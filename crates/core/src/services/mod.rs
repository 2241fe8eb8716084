//! Business logic services.

pub mod notification;
pub mod user;

pub use notification::{NotificationService, RecipientsInput};
pub use user::{
    ListUsersInput, RegisterAccountInput, TeacherRegisterInput, UpdateProfileInput, UserService,
};
