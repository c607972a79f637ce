//! crates/course_market_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format,
//! with the exception of `SessionData`, which is persisted as a serialized blob.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account, as seen by the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

// Only used internally for login/registration - contains the password hash
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

/// The fields required to insert a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

/// A priced offering created by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub creator_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub creator_id: i64,
}

/// A scheduled unit of content that belongs to exactly one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub broadcast_date: String,
}

/// A lesson that has been staged for a course but not yet written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDraft {
    pub title: String,
    pub description: Option<String>,
    pub broadcast_date: String,
}

/// A record that a user has joined a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
}

/// Result of an enrollment attempt. A duplicate is an outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    Enrolled,
    AlreadyEnrolled,
}

/// Which unique user column a registration collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Username => f.write_str("username"),
            UniqueField::Email => f.write_str("email"),
        }
    }
}

/// The payload of a browser session.
///
/// `username` and `user_id` are set together on login and cleared together on
/// logout. `flashes` holds one-shot messages for the next rendered view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub username: Option<String>,
    pub user_id: Option<i64>,
    #[serde(default)]
    pub flashes: Vec<String>,
}

// Represents a browser session row (the `session` cookie points at `id`)
#[derive(Debug, Clone)]
pub struct WebSession {
    pub id: String,
    pub data: SessionData,
    pub expires_at: DateTime<Utc>,
}
