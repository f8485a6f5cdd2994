use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{LoginForm, RegisterRequest, TokenResponse},
        repo_types::User,
    },
    error::{AppError, AppResult},
    state::AppState,
};

const BAD_CREDENTIALS: &str = "Incorrect username or password";
const INVALID_TOKEN: &str = "Could not validate credentials";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_registration(req: &RegisterRequest) -> AppResult<()> {
    if req.username.is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if req.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

fn registration_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return if db_err.message().contains("users.email") {
                AppError::Conflict("Email already exists".into())
            } else {
                AppError::Conflict("Username already exists".into())
            };
        }
    }
    e.into()
}

pub async fn register(st: &AppState, mut req: RegisterRequest) -> AppResult<User> {
    req.username = req.username.trim().to_owned();
    req.email = req.email.trim().to_lowercase();
    validate_registration(&req)?;

    if User::find_by_username(&st.db, &req.username).await?.is_some() {
        warn!(username = %req.username, "username already registered");
        return Err(AppError::Conflict("Username already exists".into()));
    }
    if User::email_taken(&st.db, &req.email).await? {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::Conflict("Email already exists".into()));
    }

    let hasher = st.hasher.clone();
    let password = req.password;
    let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .context("join hash task")??;

    // The pre-checks above race with concurrent registrations; the unique
    // indexes settle it.
    let user = User::create(
        &st.db,
        &req.username,
        &req.email,
        &hash,
        st.config.policy.bootstrap_first_admin,
    )
    .await
    .map_err(registration_conflict)?;

    info!(user_id = user.id, username = %user.username, role = %user.role, "user registered");
    Ok(user)
}

pub async fn login(st: &AppState, form: LoginForm) -> AppResult<TokenResponse> {
    let user = User::find_by_username(&st.db, form.username.trim()).await?;

    let hasher = st.hasher.clone();
    let stored = user.as_ref().map(|u| u.password_hash.clone());
    let password = form.password;
    let verified = tokio::task::spawn_blocking(move || match stored {
        Some(hash) => hasher.verify(&password, &hash),
        None => {
            hasher.verify_decoy(&password);
            false
        }
    })
    .await
    .context("join verify task")?;

    let user = match user {
        Some(u) if verified => u,
        Some(u) => {
            warn!(user_id = u.id, "login invalid password");
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
        }
        None => {
            warn!(username = %form.username, "login unknown username");
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
        }
    };

    let token = st.keys.issue_access(&user.username)?;
    info!(user_id = user.id, "user logged in");
    Ok(TokenResponse::bearer(token))
}

/// Loads the account a token subject refers to.
pub async fn resolve_identity(st: &AppState, subject: &str) -> AppResult<User> {
    User::find_by_username(&st.db, subject)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn require_authenticated(st: &AppState, token: Option<&str>) -> AppResult<User> {
    let token = token.ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.into()))?;

    let claims = st.keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::Unauthorized(INVALID_TOKEN.into())
    })?;

    match resolve_identity(st, &claims.sub).await {
        Ok(user) => Ok(user),
        Err(AppError::NotFound(_)) => {
            warn!(subject = %claims.sub, "token subject no longer exists");
            Err(AppError::Unauthorized(INVALID_TOKEN.into()))
        }
        Err(e) => Err(e),
    }
}

pub async fn require_admin(st: &AppState, token: Option<&str>) -> AppResult<User> {
    let user = require_authenticated(st, token).await?;
    if !user.is_admin() {
        warn!(user_id = user.id, "admin role required");
        return Err(AppError::Forbidden(
            "Not enough permissions. Admin role required.".into(),
        ));
    }
    Ok(user)
}
