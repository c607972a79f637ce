//! services/marketplace/src/web/state.rs
//!
//! Defines the application state shared by all request handlers.

use crate::config::Config;
use crate::web::drafts::LessonDraftBuffer;
use course_market_core::ports::{DatabaseService, SessionStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub sessions: Arc<dyn SessionStore>,
    pub drafts: LessonDraftBuffer,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        sessions: Arc<dyn SessionStore>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            db,
            sessions,
            drafts: LessonDraftBuffer::new(),
            config,
        }
    }
}
