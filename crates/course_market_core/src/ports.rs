//! crates/course_market_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of a specific database or session backend.

use crate::domain::{
    Course, EnrollmentOutcome, Lesson, LessonDraft, NewCourse, NewUser, UniqueField, User,
    UserCredentials, WebSession,
};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A unique constraint on the named user column was violated.
    #[error("Unique constraint violated on {0}")]
    Conflict(UniqueField),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    /// Inserts a user. Fails with `PortError::Conflict` naming the duplicated column.
    async fn create_user(&self, user: NewUser) -> PortResult<User>;

    /// Finds the user whose username OR email equals `identifier`.
    async fn find_user_by_login(&self, identifier: &str) -> PortResult<Option<UserCredentials>>;

    // --- Course Management ---
    async fn create_course(&self, course: NewCourse) -> PortResult<Course>;

    async fn get_course(&self, course_id: i64) -> PortResult<Course>;

    async fn list_courses_by_creator(&self, creator_id: i64) -> PortResult<Vec<Course>>;

    /// Lists all courses, or only those whose title or description contains
    /// `query` (case-insensitive) when one is given.
    async fn search_courses(&self, query: Option<&str>) -> PortResult<Vec<Course>>;

    // --- Lesson Management ---
    /// Writes all drafts as lessons of `course_id` atomically, preserving order.
    async fn insert_lessons(&self, course_id: i64, drafts: &[LessonDraft])
        -> PortResult<Vec<Lesson>>;

    async fn list_lessons(&self, course_id: i64) -> PortResult<Vec<Lesson>>;

    // --- Enrollment Management ---
    async fn enroll(&self, user_id: i64, course_id: i64) -> PortResult<EnrollmentOutcome>;

    async fn enrolled_course_ids(&self, user_id: i64) -> PortResult<Vec<i64>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session that has not yet expired.
    async fn load_session(&self, session_id: &str) -> PortResult<Option<WebSession>>;

    /// Inserts or replaces the session row.
    async fn save_session(&self, session: &WebSession) -> PortResult<()>;

    async fn delete_session(&self, session_id: &str) -> PortResult<()>;
}
