//! services/marketplace/src/web/views.rs
//!
//! View models handed to the template renderer. Every view carries the flash
//! messages drained from the session for this render.

use course_market_core::domain::Course;
use serde::Serialize;
use utoipa::ToSchema;

/// The view behind the registration, login and course-creation forms.
#[derive(Debug, Serialize, ToSchema)]
pub struct FormView {
    pub username: Option<String>,
    pub flashes: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub creator_id: i64,
    /// Only present on the course browser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled: Option<bool>,
}

impl From<Course> for CourseSummary {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            price: course.price,
            creator_id: course.creator_id,
            enrolled: None,
        }
    }
}
