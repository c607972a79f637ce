//! services/marketplace/src/web/auth.rs
//!
//! Registration, login and logout.

use crate::adapters::password::{hash_password, verify_password, verify_unknown_user};
use crate::web::{
    forms::required,
    session::SessionContext,
    state::AppState,
    views::FormView,
};
use axum::{
    extract::{Form, State},
    response::{Json, Redirect},
};
use course_market_core::domain::{NewUser, UniqueField};
use course_market_core::ports::PortError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

const INVALID_CREDENTIALS: &str = "Invalid email/username or password!";

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    /// Either the username or the email address.
    #[serde(default)]
    pub email_or_username: String,
    #[serde(default)]
    pub password: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /register - Show the registration form
#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Registration form", body = FormView))
)]
pub async fn register_form(session: SessionContext) -> Json<FormView> {
    Json(FormView {
        username: None,
        flashes: session.take_flashes().await,
    })
}

/// POST /register - Create a new user account
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "To /login on success, back to /register otherwise")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Form(form): Form<RegisterForm>,
) -> Redirect {
    let (Some(username), Some(email)) = (required(&form.username), required(&form.email)) else {
        session.flash("All fields are required!").await;
        return Redirect::to("/register");
    };
    if form.password.is_empty() {
        session.flash("All fields are required!").await;
        return Redirect::to("/register");
    }

    // 1. Hash the password
    let hashed_password = match hash_password(&form.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to hash password: {:?}", e);
            session.flash("Registration failed. Please try again.").await;
            return Redirect::to("/register");
        }
    };

    // 2. Create user in database
    let result = state
        .db
        .create_user(NewUser {
            username,
            email,
            hashed_password,
        })
        .await;

    match result {
        Ok(user) => {
            info!("Registered user {} ({})", user.username, user.id);
            session.flash("Registration successful! Please log in.").await;
            Redirect::to("/login")
        }
        Err(PortError::Conflict(field)) => {
            let message = match field {
                UniqueField::Username => "Username already exists!",
                UniqueField::Email => "Email already registered!",
            };
            session.flash(message).await;
            Redirect::to("/register")
        }
        Err(e) => {
            error!("Failed to create user: {:?}", e);
            session.flash("Registration failed. Please try again.").await;
            Redirect::to("/register")
        }
    }
}

/// GET /login - Show the login form
#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login form", body = FormView))
)]
pub async fn login_form(session: SessionContext) -> Json<FormView> {
    Json(FormView {
        username: session.current_user().await.map(|u| u.username),
        flashes: session.take_flashes().await,
    })
}

/// POST /login - Login with a username or email address
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "To / on success, back to /login otherwise")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Form(form): Form<LoginForm>,
) -> Redirect {
    let identifier = form.email_or_username.trim();

    // 1. Get user by username or email
    let user_creds = match state.db.find_user_by_login(identifier).await {
        Ok(user_creds) => user_creds,
        Err(e) => {
            error!("Failed to get user: {:?}", e);
            session.flash("Login failed. Please try again.").await;
            return Redirect::to("/login");
        }
    };

    // 2. Verify password; unknown users and wrong passwords look the same
    let verified = match &user_creds {
        Some(creds) => verify_password(&form.password, &creds.hashed_password),
        None => verify_unknown_user(&form.password),
    };
    match user_creds {
        Some(creds) if verified => {
            session.log_in(creds.id, &creds.username).await;
            info!("User {} logged in", creds.id);
            session.flash("Logged in successfully!").await;
            Redirect::to("/")
        }
        _ => {
            warn!("Failed login attempt");
            session.flash(INVALID_CREDENTIALS).await;
            Redirect::to("/login")
        }
    }
}

/// GET /logout - Clear the session
#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "To /"))
)]
pub async fn logout_handler(session: SessionContext) -> Redirect {
    session.log_out().await;
    session.flash("You have been logged out.").await;
    Redirect::to("/")
}
