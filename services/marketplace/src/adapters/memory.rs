//! services/marketplace/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` and `SessionStore` ports.
//! It mirrors the constraints of the PostgreSQL schema (unique usernames and emails,
//! foreign keys, one enrollment per user and course) so the web layer can be
//! exercised without a database.

use async_trait::async_trait;
use chrono::Utc;
use course_market_core::domain::{
    Course, Enrollment, EnrollmentOutcome, Lesson, LessonDraft, NewCourse, NewUser, UniqueField,
    User, UserCredentials, WebSession,
};
use course_market_core::ports::{DatabaseService, PortError, PortResult, SessionStore};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    courses: Vec<Course>,
    lessons: Vec<Lesson>,
    enrollments: Vec<Enrollment>,
    sessions: HashMap<String, WebSession>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Stores every table in memory behind a single lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of enrollment rows for the pair, for asserting uniqueness in tests.
    pub async fn enrollment_count(&self, user_id: i64, course_id: i64) -> usize {
        let tables = self.tables.lock().await;
        tables
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id && e.course_id == course_id)
            .count()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl DatabaseService for MemoryStore {
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(PortError::Conflict(UniqueField::Username));
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(PortError::Conflict(UniqueField::Email));
        }
        let id = tables.next_id();
        tables.users.push(UserCredentials {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            hashed_password: user.hashed_password,
        });
        Ok(User {
            id,
            username: user.username,
            email: user.email,
        })
    }

    async fn find_user_by_login(&self, identifier: &str) -> PortResult<Option<UserCredentials>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email == identifier || u.username == identifier)
            .cloned())
    }

    async fn create_course(&self, course: NewCourse) -> PortResult<Course> {
        let mut tables = self.tables.lock().await;
        if !tables.users.iter().any(|u| u.id == course.creator_id) {
            return Err(PortError::Unexpected(format!(
                "foreign key violation: user {} does not exist",
                course.creator_id
            )));
        }
        let id = tables.next_id();
        let course = Course {
            id,
            title: course.title,
            description: course.description,
            price: course.price,
            creator_id: course.creator_id,
        };
        tables.courses.push(course.clone());
        Ok(course)
    }

    async fn get_course(&self, course_id: i64) -> PortResult<Course> {
        let tables = self.tables.lock().await;
        tables
            .courses
            .iter()
            .find(|c| c.id == course_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))
    }

    async fn list_courses_by_creator(&self, creator_id: i64) -> PortResult<Vec<Course>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .courses
            .iter()
            .filter(|c| c.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn search_courses(&self, query: Option<&str>) -> PortResult<Vec<Course>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .courses
            .iter()
            .filter(|c| match query {
                Some(q) => {
                    contains_ignore_case(&c.title, q)
                        || c.description
                            .as_deref()
                            .is_some_and(|d| contains_ignore_case(d, q))
                }
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn insert_lessons(
        &self,
        course_id: i64,
        drafts: &[LessonDraft],
    ) -> PortResult<Vec<Lesson>> {
        let mut tables = self.tables.lock().await;
        if !tables.courses.iter().any(|c| c.id == course_id) {
            return Err(PortError::NotFound(format!("Course {} not found", course_id)));
        }
        let mut lessons = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let id = tables.next_id();
            lessons.push(Lesson {
                id,
                course_id,
                title: draft.title.clone(),
                description: draft.description.clone(),
                broadcast_date: draft.broadcast_date.clone(),
            });
        }
        tables.lessons.extend(lessons.iter().cloned());
        Ok(lessons)
    }

    async fn list_lessons(&self, course_id: i64) -> PortResult<Vec<Lesson>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .lessons
            .iter()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn enroll(&self, user_id: i64, course_id: i64) -> PortResult<EnrollmentOutcome> {
        let mut tables = self.tables.lock().await;
        if !tables.courses.iter().any(|c| c.id == course_id) {
            return Err(PortError::NotFound(format!("Course {} not found", course_id)));
        }
        if tables
            .enrollments
            .iter()
            .any(|e| e.user_id == user_id && e.course_id == course_id)
        {
            return Ok(EnrollmentOutcome::AlreadyEnrolled);
        }
        let id = tables.next_id();
        tables.enrollments.push(Enrollment {
            id,
            user_id,
            course_id,
        });
        Ok(EnrollmentOutcome::Enrolled)
    }

    async fn enrolled_course_ids(&self, user_id: i64) -> PortResult<Vec<i64>> {
        let tables = self.tables.lock().await;
        let mut ids: Vec<i64> = tables
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.course_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load_session(&self, session_id: &str) -> PortResult<Option<WebSession>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .get(session_id)
            .filter(|s| s.expires_at > Utc::now())
            .cloned())
    }

    async fn save_session(&self, session: &WebSession) -> PortResult<()> {
        let mut tables = self.tables.lock().await;
        tables.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> PortResult<()> {
        let mut tables = self.tables.lock().await;
        tables.sessions.remove(session_id);
        Ok(())
    }
}
