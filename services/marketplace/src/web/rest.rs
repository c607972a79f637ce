//! services/marketplace/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use crate::web::{auth, courses, editor, home, views};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        home::home_handler,
        auth::register_form,
        auth::register_handler,
        auth::login_form,
        auth::login_handler,
        auth::logout_handler,
        courses::create_course_form,
        courses::create_course_handler,
        courses::list_courses_handler,
        courses::enroll_handler,
        editor::course_editor_view,
        editor::stage_lesson_handler,
        editor::publish_lessons_handler,
    ),
    components(
        schemas(
            views::FormView,
            views::CourseSummary,
            home::HomeView,
            auth::RegisterForm,
            auth::LoginForm,
            courses::CreateCourseForm,
            courses::CoursesView,
            editor::LessonForm,
            editor::LessonEntry,
            editor::CourseEditorView,
        )
    ),
    tags(
        (name = "Course Marketplace", description = "Register, create courses and lessons, browse and enroll.")
    )
)]
pub struct ApiDoc;
