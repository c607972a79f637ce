//! services/marketplace/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` and `SessionStore` ports from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_market_core::domain::{
    Course, EnrollmentOutcome, Lesson, LessonDraft, NewCourse, NewUser, SessionData, UniqueField,
    User, UserCredentials, WebSession,
};
use course_market_core::ports::{DatabaseService, PortError, PortResult, SessionStore};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` and `SessionStore` ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Removes session rows whose expiry has passed.
    pub async fn purge_expired_sessions(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM web_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        let purged = result.rows_affected();
        if purged > 0 {
            info!("Purged {} expired sessions", purged);
        }
        Ok(purged)
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    password: String,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
        }
    }

    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            username: self.username,
            email: self.email,
            hashed_password: self.password,
        }
    }
}

#[derive(FromRow)]
struct CourseRecord {
    id: i64,
    title: String,
    description: Option<String>,
    price: f64,
    creator_id: i64,
}
impl CourseRecord {
    fn to_domain(self) -> Course {
        Course {
            id: self.id,
            title: self.title,
            description: self.description,
            price: self.price,
            creator_id: self.creator_id,
        }
    }
}

#[derive(FromRow)]
struct LessonRecord {
    id: i64,
    course_id: i64,
    title: String,
    description: Option<String>,
    broadcast_date: String,
}
impl LessonRecord {
    fn to_domain(self) -> Lesson {
        Lesson {
            id: self.id,
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            broadcast_date: self.broadcast_date,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: String,
    data: String,
    expires_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<WebSession> {
        let data: SessionData = serde_json::from_str(&self.data)
            .map_err(|e| PortError::Unexpected(format!("Corrupt session {}: {}", self.id, e)))?;
        Ok(WebSession {
            id: self.id,
            data,
            expires_at: self.expires_at,
        })
    }
}

//=========================================================================================
// Error Mapping Helpers
//=========================================================================================

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps a failed user insert to the column whose unique constraint was violated.
fn map_user_insert_error(e: sqlx::Error) -> PortError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("users_username_key") => return PortError::Conflict(UniqueField::Username),
                Some("users_email_key") => return PortError::Conflict(UniqueField::Email),
                other => warn!("Unique violation on unexpected constraint {:?}", other),
            }
        }
    }
    unexpected(e)
}

/// Escapes `LIKE` metacharacters so the query matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (username, password, email) VALUES ($1, $2, $3) \
             RETURNING id, username, password, email",
        )
        .bind(&user.username)
        .bind(&user.hashed_password)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_insert_error)?;
        Ok(record.to_domain())
    }

    async fn find_user_by_login(&self, identifier: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password, email FROM users \
             WHERE email = $1 OR username = $1 ORDER BY id LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_credentials))
    }

    async fn create_course(&self, course: NewCourse) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(
            "INSERT INTO courses (title, description, price, creator_id) VALUES ($1, $2, $3, $4) \
             RETURNING id, title, description, price, creator_id",
        )
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.price)
        .bind(course.creator_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_course(&self, course_id: i64) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(
            "SELECT id, title, description, price, creator_id FROM courses WHERE id = $1",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Course {} not found", course_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_courses_by_creator(&self, creator_id: i64) -> PortResult<Vec<Course>> {
        let records = sqlx::query_as::<_, CourseRecord>(
            "SELECT id, title, description, price, creator_id FROM courses \
             WHERE creator_id = $1 ORDER BY id ASC",
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn search_courses(&self, query: Option<&str>) -> PortResult<Vec<Course>> {
        let records = match query {
            Some(query) => {
                let pattern = format!("%{}%", escape_like(query));
                sqlx::query_as::<_, CourseRecord>(
                    "SELECT id, title, description, price, creator_id FROM courses \
                     WHERE title ILIKE $1 ESCAPE '\\' OR description ILIKE $1 ESCAPE '\\' \
                     ORDER BY id ASC",
                )
                .bind(pattern)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, CourseRecord>(
                    "SELECT id, title, description, price, creator_id FROM courses ORDER BY id ASC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn insert_lessons(
        &self,
        course_id: i64,
        drafts: &[LessonDraft],
    ) -> PortResult<Vec<Lesson>> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let mut lessons = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let record = sqlx::query_as::<_, LessonRecord>(
                "INSERT INTO lessons (course_id, title, description, broadcast_date) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING id, course_id, title, description, broadcast_date",
            )
            .bind(course_id)
            .bind(&draft.title)
            .bind(&draft.description)
            .bind(&draft.broadcast_date)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;
            lessons.push(record.to_domain());
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(lessons)
    }

    async fn list_lessons(&self, course_id: i64) -> PortResult<Vec<Lesson>> {
        let records = sqlx::query_as::<_, LessonRecord>(
            "SELECT id, course_id, title, description, broadcast_date FROM lessons \
             WHERE course_id = $1 ORDER BY id ASC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn enroll(&self, user_id: i64, course_id: i64) -> PortResult<EnrollmentOutcome> {
        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO enrollments (user_id, course_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, course_id) DO NOTHING RETURNING id",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_foreign_key_violation() {
                    return PortError::NotFound(format!("Course {} not found", course_id));
                }
            }
            unexpected(e)
        })?;

        Ok(match inserted {
            Some(_) => EnrollmentOutcome::Enrolled,
            None => EnrollmentOutcome::AlreadyEnrolled,
        })
    }

    async fn enrolled_course_ids(&self, user_id: i64) -> PortResult<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT course_id FROM enrollments WHERE user_id = $1 ORDER BY course_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)
    }
}

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionStore for DbAdapter {
    async fn load_session(&self, session_id: &str) -> PortResult<Option<WebSession>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, data, expires_at FROM web_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(SessionRecord::to_domain).transpose()
    }

    async fn save_session(&self, session: &WebSession) -> PortResult<()> {
        let data = serde_json::to_string(&session.data)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        sqlx::query(
            "INSERT INTO web_sessions (id, data, expires_at) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, expires_at = EXCLUDED.expires_at",
        )
        .bind(&session.id)
        .bind(data)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM web_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
