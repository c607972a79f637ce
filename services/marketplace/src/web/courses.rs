//! services/marketplace/src/web/courses.rs
//!
//! Course creation, browsing/search and enrollment.

use crate::web::{
    drafts::DraftKey,
    forms::{optional, parse_price, required, PriceError},
    session::{CurrentUser, SessionContext},
    state::AppState,
    views::{CourseSummary, FormView},
};
use axum::{
    extract::{Form, Path, Query, State},
    response::{Json, Redirect},
};
use course_market_core::domain::{EnrollmentOutcome, NewCourse};
use course_market_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Request/View Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateCourseForm {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub price: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BrowseQuery {
    /// Case-insensitive substring matched against title and description.
    pub search_query: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CoursesView {
    pub username: String,
    pub search_query: Option<String>,
    pub courses: Vec<CourseSummary>,
    pub flashes: Vec<String>,
}

//=========================================================================================
// Course Creation
//=========================================================================================

/// GET /create_course - Show the course creation form
#[utoipa::path(
    get,
    path = "/create_course",
    responses(
        (status = 200, description = "Course creation form", body = FormView),
        (status = 303, description = "To /login when not logged in")
    )
)]
pub async fn create_course_form(user: CurrentUser, session: SessionContext) -> Json<FormView> {
    Json(FormView {
        username: Some(user.username),
        flashes: session.take_flashes().await,
    })
}

/// POST /create_course - Create a course owned by the current user
///
/// Lessons staged under the new course id for this user are written along with it.
#[utoipa::path(
    post,
    path = "/create_course",
    request_body(content = CreateCourseForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "To / on success, back to /create_course otherwise")
    )
)]
pub async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    session: SessionContext,
    Form(form): Form<CreateCourseForm>,
) -> Redirect {
    let price = match parse_price(&form.price) {
        Ok(price) => Some(price),
        Err(PriceError::Missing) => None,
        Err(PriceError::Invalid) => {
            session.flash("Price must be a non-negative number!").await;
            return Redirect::to("/create_course");
        }
    };
    let (Some(title), Some(price)) = (required(&form.title), price) else {
        session.flash("Title and price are required!").await;
        return Redirect::to("/create_course");
    };

    let course = match state
        .db
        .create_course(NewCourse {
            title,
            description: optional(form.description.as_deref()),
            price,
            creator_id: user.id,
        })
        .await
    {
        Ok(course) => course,
        Err(e) => {
            error!("Failed to create course: {:?}", e);
            session.flash("Error creating course. Please try again.").await;
            return Redirect::to("/create_course");
        }
    };
    info!("User {} created course {}", user.id, course.id);

    // Flush anything already staged under this id.
    let key = DraftKey::new(user.id, course.id);
    let drafts = state.drafts.take(key).await;
    if !drafts.is_empty() {
        if let Err(e) = state.db.insert_lessons(course.id, &drafts).await {
            error!("Failed to save staged lessons for course {}: {:?}", course.id, e);
            state.drafts.restore(key, drafts).await;
            session
                .flash("Course created, but its staged lessons could not be saved.")
                .await;
            return Redirect::to("/");
        }
        info!("Saved {} staged lessons for course {}", drafts.len(), course.id);
    }

    session.flash("Course created successfully!").await;
    Redirect::to("/")
}

//=========================================================================================
// Browsing & Search
//=========================================================================================

/// GET /courses - List all courses, optionally filtered by a search query
#[utoipa::path(
    get,
    path = "/courses",
    params(BrowseQuery),
    responses(
        (status = 200, description = "Matching courses", body = CoursesView),
        (status = 303, description = "To /login when not logged in")
    )
)]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    session: SessionContext,
    Query(query): Query<BrowseQuery>,
) -> Json<CoursesView> {
    let search_query = query.search_query.as_deref().and_then(required);

    let db = &state.db;
    let result = async {
        let courses = db.search_courses(search_query.as_deref()).await?;
        let enrolled: HashSet<i64> = db.enrolled_course_ids(user.id).await?.into_iter().collect();
        Ok::<_, PortError>((courses, enrolled))
    }
    .await;

    let courses = match result {
        Ok((courses, enrolled)) => courses
            .into_iter()
            .map(|course| {
                let is_enrolled = enrolled.contains(&course.id);
                CourseSummary {
                    enrolled: Some(is_enrolled),
                    ..CourseSummary::from(course)
                }
            })
            .collect(),
        Err(e) => {
            error!("Failed to list courses: {:?}", e);
            session.flash("Could not load courses.").await;
            Vec::new()
        }
    };

    Json(CoursesView {
        username: user.username,
        search_query,
        courses,
        flashes: session.take_flashes().await,
    })
}

//=========================================================================================
// Enrollment
//=========================================================================================

/// POST /enroll/{course_id} - Enroll the current user in a course
#[utoipa::path(
    post,
    path = "/enroll/{course_id}",
    params(("course_id" = i64, Path, description = "The course to join")),
    responses(
        (status = 303, description = "To /courses with the outcome, or /login when not logged in")
    )
)]
pub async fn enroll_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    session: SessionContext,
    Path(course_id): Path<i64>,
) -> Redirect {
    match state.db.enroll(user.id, course_id).await {
        Ok(EnrollmentOutcome::Enrolled) => {
            info!("User {} enrolled in course {}", user.id, course_id);
            session.flash("Successfully enrolled in the course!").await;
        }
        Ok(EnrollmentOutcome::AlreadyEnrolled) => {
            session.flash("You are already enrolled in this course!").await;
        }
        Err(PortError::NotFound(_)) => {
            session.flash("Course not found!").await;
        }
        Err(e) => {
            error!("Failed to enroll user {} in course {}: {:?}", user.id, course_id, e);
            session.flash("Enrollment failed. Please try again.").await;
        }
    }
    Redirect::to("/courses")
}
