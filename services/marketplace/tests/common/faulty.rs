//! A store wrapper that fails selected operations on demand, for driving the
//! handlers' recovery paths.

use async_trait::async_trait;
use course_market_core::domain::{
    Course, EnrollmentOutcome, Lesson, LessonDraft, NewCourse, NewUser, User, UserCredentials,
    WebSession,
};
use course_market_core::ports::{DatabaseService, PortError, PortResult, SessionStore};
use marketplace_lib::adapters::MemoryStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The detail carried by every injected failure. It must never reach a user.
pub const STORE_ERROR: &str = "connection reset by peer";

pub struct FaultyStore {
    inner: Arc<MemoryStore>,
    pub fail_course_inserts: AtomicBool,
    pub fail_lesson_inserts: AtomicBool,
    pub fail_session_loads: AtomicBool,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_course_inserts: AtomicBool::new(false),
            fail_lesson_inserts: AtomicBool::new(false),
            fail_session_loads: AtomicBool::new(false),
        }
    }

    pub fn set(flag: &AtomicBool, failing: bool) {
        flag.store(failing, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> PortResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected(STORE_ERROR.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseService for FaultyStore {
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        self.inner.create_user(user).await
    }

    async fn find_user_by_login(&self, identifier: &str) -> PortResult<Option<UserCredentials>> {
        self.inner.find_user_by_login(identifier).await
    }

    async fn create_course(&self, course: NewCourse) -> PortResult<Course> {
        Self::check(&self.fail_course_inserts)?;
        self.inner.create_course(course).await
    }

    async fn get_course(&self, course_id: i64) -> PortResult<Course> {
        self.inner.get_course(course_id).await
    }

    async fn list_courses_by_creator(&self, creator_id: i64) -> PortResult<Vec<Course>> {
        self.inner.list_courses_by_creator(creator_id).await
    }

    async fn search_courses(&self, query: Option<&str>) -> PortResult<Vec<Course>> {
        self.inner.search_courses(query).await
    }

    async fn insert_lessons(
        &self,
        course_id: i64,
        drafts: &[LessonDraft],
    ) -> PortResult<Vec<Lesson>> {
        Self::check(&self.fail_lesson_inserts)?;
        self.inner.insert_lessons(course_id, drafts).await
    }

    async fn list_lessons(&self, course_id: i64) -> PortResult<Vec<Lesson>> {
        self.inner.list_lessons(course_id).await
    }

    async fn enroll(&self, user_id: i64, course_id: i64) -> PortResult<EnrollmentOutcome> {
        self.inner.enroll(user_id, course_id).await
    }

    async fn enrolled_course_ids(&self, user_id: i64) -> PortResult<Vec<i64>> {
        self.inner.enrolled_course_ids(user_id).await
    }
}

#[async_trait]
impl SessionStore for FaultyStore {
    async fn load_session(&self, session_id: &str) -> PortResult<Option<WebSession>> {
        Self::check(&self.fail_session_loads)?;
        self.inner.load_session(session_id).await
    }

    async fn save_session(&self, session: &WebSession) -> PortResult<()> {
        self.inner.save_session(session).await
    }

    async fn delete_session(&self, session_id: &str) -> PortResult<()> {
        self.inner.delete_session(session_id).await
    }
}
