pub mod domain;
pub mod ports;

pub use domain::{
    Course, Enrollment, EnrollmentOutcome, Lesson, LessonDraft, NewCourse, NewUser, SessionData,
    UniqueField, User, UserCredentials, WebSession,
};
pub use ports::{DatabaseService, PortError, PortResult, SessionStore};
