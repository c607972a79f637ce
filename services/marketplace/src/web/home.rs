//! services/marketplace/src/web/home.rs

use crate::web::{session::SessionContext, state::AppState, views::CourseSummary};
use axum::{extract::State, response::Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HomeView {
    pub username: Option<String>,
    /// Courses created by the logged-in user.
    pub courses: Vec<CourseSummary>,
    pub flashes: Vec<String>,
}

/// GET / - Home page, listing the user's own courses when logged in
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Home view", body = HomeView))
)]
pub async fn home_handler(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
) -> Json<HomeView> {
    let Some(user) = session.current_user().await else {
        return Json(HomeView {
            username: None,
            courses: Vec::new(),
            flashes: session.take_flashes().await,
        });
    };

    let courses = match state.db.list_courses_by_creator(user.id).await {
        Ok(courses) => courses.into_iter().map(CourseSummary::from).collect(),
        Err(e) => {
            error!("Failed to list courses for user {}: {:?}", user.id, e);
            session.flash("Could not load your courses.").await;
            Vec::new()
        }
    };

    Json(HomeView {
        username: Some(user.username),
        courses,
        flashes: session.take_flashes().await,
    })
}
