pub mod auth;
pub mod courses;
pub mod drafts;
pub mod editor;
pub mod forms;
pub mod home;
pub mod rest;
pub mod session;
pub mod state;
pub mod views;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use session::session_layer;
pub use state::AppState;

/// Builds the application router with the session layer installed.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home::home_handler))
        .route(
            "/register",
            get(auth::register_form).post(auth::register_handler),
        )
        .route("/login", get(auth::login_form).post(auth::login_handler))
        .route("/logout", get(auth::logout_handler))
        .route(
            "/create_course",
            get(courses::create_course_form).post(courses::create_course_handler),
        )
        .route(
            "/course_editor/{course_id}",
            get(editor::course_editor_view).post(editor::stage_lesson_handler),
        )
        .route(
            "/course_editor/{course_id}/publish",
            post(editor::publish_lessons_handler),
        )
        .route("/courses", get(courses::list_courses_handler))
        .route("/enroll/{course_id}", post(courses::enroll_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            session_layer,
        ))
        .with_state(state)
}
