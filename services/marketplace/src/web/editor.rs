//! services/marketplace/src/web/editor.rs
//!
//! The course editor. Lessons posted here are staged in the pending-lesson
//! buffer and only reach the store when the course's drafts are published.

use crate::web::{
    drafts::DraftKey,
    forms::{optional, required},
    session::{CurrentUser, SessionContext},
    state::AppState,
};
use axum::{
    extract::{Form, Path, State},
    response::{IntoResponse, Json, Redirect, Response},
};
use course_market_core::domain::{Course, Lesson, LessonDraft};
use course_market_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

//=========================================================================================
// Request/View Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LessonForm {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub broadcast_date: String,
}

/// One row of the editor's lesson list. Staged drafts have no id yet.
#[derive(Debug, Serialize, ToSchema)]
pub struct LessonEntry {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub broadcast_date: String,
    pub staged: bool,
}

impl From<Lesson> for LessonEntry {
    fn from(lesson: Lesson) -> Self {
        Self {
            id: Some(lesson.id),
            title: lesson.title,
            description: lesson.description,
            broadcast_date: lesson.broadcast_date,
            staged: false,
        }
    }
}

impl From<LessonDraft> for LessonEntry {
    fn from(draft: LessonDraft) -> Self {
        Self {
            id: None,
            title: draft.title,
            description: draft.description,
            broadcast_date: draft.broadcast_date,
            staged: true,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CourseEditorView {
    pub course_id: i64,
    pub course_title: String,
    /// Persisted lessons first, then staged drafts in the order they were added.
    pub lessons: Vec<LessonEntry>,
    pub flashes: Vec<String>,
}

//=========================================================================================
// Ownership Check
//=========================================================================================

/// Loads the course when `user` created it. Otherwise flashes why and returns
/// the redirect home.
async fn owned_course(
    state: &AppState,
    session: &SessionContext,
    user: &CurrentUser,
    course_id: i64,
) -> Result<Course, Redirect> {
    match state.db.get_course(course_id).await {
        Ok(course) if course.creator_id == user.id => Ok(course),
        Ok(_) | Err(PortError::NotFound(_)) => {
            warn!("User {} tried to edit course {}", user.id, course_id);
            session.flash("You are not authorized to edit this course!").await;
            Err(Redirect::to("/"))
        }
        Err(e) => {
            error!("Failed to load course {}: {:?}", course_id, e);
            session.flash("Could not load the course.").await;
            Err(Redirect::to("/"))
        }
    }
}

fn editor_path(course_id: i64) -> String {
    format!("/course_editor/{}", course_id)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /course_editor/{course_id} - Persisted and staged lessons of an owned course
#[utoipa::path(
    get,
    path = "/course_editor/{course_id}",
    params(("course_id" = i64, Path, description = "The course being edited")),
    responses(
        (status = 200, description = "Editor view", body = CourseEditorView),
        (status = 303, description = "To / when the course is not owned, /login when not logged in")
    )
)]
pub async fn course_editor_view(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    session: SessionContext,
    Path(course_id): Path<i64>,
) -> Response {
    let course = match owned_course(&state, &session, &user, course_id).await {
        Ok(course) => course,
        Err(redirect) => return redirect.into_response(),
    };

    let mut lessons: Vec<LessonEntry> = match state.db.list_lessons(course_id).await {
        Ok(lessons) => lessons.into_iter().map(LessonEntry::from).collect(),
        Err(e) => {
            error!("Failed to list lessons for course {}: {:?}", course_id, e);
            session.flash("Could not load saved lessons.").await;
            Vec::new()
        }
    };
    let drafts = state.drafts.drafts(DraftKey::new(user.id, course_id)).await;
    lessons.extend(drafts.into_iter().map(LessonEntry::from));

    Json(CourseEditorView {
        course_id,
        course_title: course.title,
        lessons,
        flashes: session.take_flashes().await,
    })
    .into_response()
}

/// POST /course_editor/{course_id} - Stage a lesson for an owned course
#[utoipa::path(
    post,
    path = "/course_editor/{course_id}",
    params(("course_id" = i64, Path, description = "The course being edited")),
    request_body(content = LessonForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Back to the editor, or to / when the course is not owned")
    )
)]
pub async fn stage_lesson_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    session: SessionContext,
    Path(course_id): Path<i64>,
    Form(form): Form<LessonForm>,
) -> Redirect {
    if let Err(redirect) = owned_course(&state, &session, &user, course_id).await {
        return redirect;
    }

    let (Some(title), Some(broadcast_date)) =
        (required(&form.title), required(&form.broadcast_date))
    else {
        session.flash("Title and broadcast date are required!").await;
        return Redirect::to(&editor_path(course_id));
    };

    let draft = LessonDraft {
        title,
        description: optional(form.description.as_deref()),
        broadcast_date,
    };
    let staged = state
        .drafts
        .stage(DraftKey::new(user.id, course_id), draft)
        .await;
    info!("Course {} now has {} staged lessons", course_id, staged);

    session.flash("Lesson added successfully!").await;
    Redirect::to(&editor_path(course_id))
}

/// POST /course_editor/{course_id}/publish - Write all staged lessons to the store
#[utoipa::path(
    post,
    path = "/course_editor/{course_id}/publish",
    params(("course_id" = i64, Path, description = "The course being edited")),
    responses(
        (status = 303, description = "Back to the editor, or to / when the course is not owned")
    )
)]
pub async fn publish_lessons_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    session: SessionContext,
    Path(course_id): Path<i64>,
) -> Redirect {
    if let Err(redirect) = owned_course(&state, &session, &user, course_id).await {
        return redirect;
    }

    let key = DraftKey::new(user.id, course_id);
    let drafts = state.drafts.take(key).await;
    if drafts.is_empty() {
        session.flash("No staged lessons to publish.").await;
        return Redirect::to(&editor_path(course_id));
    }

    match state.db.insert_lessons(course_id, &drafts).await {
        Ok(lessons) => {
            info!("Published {} lessons for course {}", lessons.len(), course_id);
            session
                .flash(format!("{} lesson(s) published.", lessons.len()))
                .await;
        }
        Err(e) => {
            error!("Failed to publish lessons for course {}: {:?}", course_id, e);
            state.drafts.restore(key, drafts).await;
            session.flash("Could not publish lessons. Please try again.").await;
        }
    }
    Redirect::to(&editor_path(course_id))
}
