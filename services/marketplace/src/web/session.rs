//! services/marketplace/src/web/session.rs
//!
//! Server-side browser sessions.
//!
//! The `session_layer` middleware resolves the `session` cookie into a
//! `SessionContext` before the handler runs and persists it afterwards. Handlers
//! read the logged-in user, push flash messages and log users in or out through
//! the context; `CurrentUser` is the extractor for routes that need a login.

use crate::{error::ApiError, web::state::AppState};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use course_market_core::domain::{SessionData, WebSession};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

struct SessionSlot {
    id: String,
    data: SessionData,
    /// The data changed and must be written back.
    dirty: bool,
    /// The client does not hold a cookie for `id` yet.
    issue_cookie: bool,
    /// A previous id that must be deleted from the store (after login).
    retired_id: Option<String>,
}

/// Per-request handle on the browser session.
#[derive(Clone)]
pub struct SessionContext(Arc<Mutex<SessionSlot>>);

/// The authenticated user, as recorded in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl SessionContext {
    fn resume(session: WebSession) -> Self {
        Self(Arc::new(Mutex::new(SessionSlot {
            id: session.id,
            data: session.data,
            dirty: false,
            issue_cookie: false,
            retired_id: None,
        })))
    }

    fn start() -> Self {
        Self(Arc::new(Mutex::new(SessionSlot {
            id: Uuid::new_v4().to_string(),
            data: SessionData::default(),
            dirty: false,
            issue_cookie: true,
            retired_id: None,
        })))
    }

    /// The logged-in user, if both session keys are present.
    pub async fn current_user(&self) -> Option<CurrentUser> {
        let slot = self.0.lock().await;
        match (slot.data.user_id, slot.data.username.as_ref()) {
            (Some(id), Some(username)) => Some(CurrentUser {
                id,
                username: username.clone(),
            }),
            _ => None,
        }
    }

    /// Queues a message for the next rendered view.
    pub async fn flash(&self, message: impl Into<String>) {
        let mut slot = self.0.lock().await;
        slot.data.flashes.push(message.into());
        slot.dirty = true;
    }

    /// Drains the queued flash messages.
    pub async fn take_flashes(&self) -> Vec<String> {
        let mut slot = self.0.lock().await;
        if slot.data.flashes.is_empty() {
            return Vec::new();
        }
        slot.dirty = true;
        std::mem::take(&mut slot.data.flashes)
    }

    /// Records the user in the session under a fresh session id.
    pub async fn log_in(&self, user_id: i64, username: &str) {
        let mut slot = self.0.lock().await;
        let new_id = Uuid::new_v4().to_string();
        let old_id = std::mem::replace(&mut slot.id, new_id);
        if !slot.issue_cookie {
            slot.retired_id = Some(old_id);
        }
        slot.data.user_id = Some(user_id);
        slot.data.username = Some(username.to_string());
        slot.issue_cookie = true;
        slot.dirty = true;
    }

    /// Clears both user keys, keeping any queued flashes.
    pub async fn log_out(&self) {
        let mut slot = self.0.lock().await;
        slot.data.user_id = None;
        slot.data.username = None;
        slot.dirty = true;
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("session layer is not installed".to_string()))
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    /// Rejects anonymous requests with a redirect to the login page.
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = SessionContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        match session.current_user().await {
            Some(user) => Ok(user),
            None => {
                session.flash("You need to login first!").await;
                Err(Redirect::to("/login").into_response())
            }
        }
    }
}

/// Extracts the session id from a `Cookie` header value.
fn session_id_from_cookie(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|c| {
        let c = c.trim();
        c.strip_prefix(SESSION_COOKIE)?.strip_prefix('=')
    })
}

fn session_cookie(id: &str, max_age_secs: i64, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE,
        id,
        max_age_secs,
        if secure { "; Secure" } else { "" }
    )
}

/// Middleware that loads the browser session before the handler and writes it
/// back afterwards.
///
/// A missing, unknown, expired or unreadable cookie starts a new anonymous
/// session. Nothing is stored, and no cookie is issued, until the session holds
/// data.
pub async fn session_layer(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Resolve the cookie to a stored session
    let cookie_id = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_id_from_cookie)
        .map(str::to_string);

    let stored = match cookie_id {
        Some(id) => match state.sessions.load_session(&id).await {
            Ok(session) => session,
            Err(e) => {
                // Unreadable rows are dropped and the browser gets a fresh session.
                warn!("Failed to load session, starting a new one: {:?}", e);
                if let Err(e) = state.sessions.delete_session(&id).await {
                    warn!("Failed to delete unreadable session: {:?}", e);
                }
                None
            }
        },
        None => None,
    };
    let context = match stored {
        Some(session) => SessionContext::resume(session),
        None => SessionContext::start(),
    };

    // 2. Run the handler with the session available
    req.extensions_mut().insert(context.clone());
    let mut response = next.run(req).await;

    // 3. Persist changes and (re)issue the cookie
    let slot = context.0.lock().await;
    if let Some(retired) = &slot.retired_id {
        if let Err(e) = state.sessions.delete_session(retired).await {
            warn!("Failed to delete retired session: {:?}", e);
        }
    }
    if !slot.dirty {
        return Ok(response);
    }

    let ttl = state.config.session_ttl;
    let session = WebSession {
        id: slot.id.clone(),
        data: slot.data.clone(),
        expires_at: Utc::now() + ttl,
    };
    if let Err(e) = state.sessions.save_session(&session).await {
        error!("Failed to save session: {:?}", e);
        return Ok(response);
    }

    if slot.issue_cookie {
        let cookie = session_cookie(&slot.id, ttl.num_seconds(), state.config.cookie_secure);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!("Failed to build session cookie: {:?}", e),
        }
    }

    Ok(response)
}
