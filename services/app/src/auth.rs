//! services/app/src/auth.rs
//!
//! Signup, login and logout. These produce and clear the session pointer the
//! core keys off; the core itself never authenticates.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::Deserialize;
use study_focus_core::{CreateOutcome, PortError, Session, SessionPointer, UserRecord};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

//=========================================================================================
// Request Types and Errors
//=========================================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Validation failures surfaced to the user at this boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Email already registered")]
    EmailInUse,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Failed to hash password: {0}")]
    Hash(String),
    #[error(transparent)]
    Port(#[from] PortError),
}

//=========================================================================================
// Operations
//=========================================================================================

/// Creates an account and signs it in.
#[instrument(skip(session, req), fields(email = %req.email))]
pub async fn signup(session: &Session, req: SignupRequest) -> Result<SessionPointer, AuthError> {
    let name = req.name.trim();
    let email = req.email.trim();
    if name.is_empty() {
        return Err(AuthError::EmptyField("name"));
    }
    if email.is_empty() {
        return Err(AuthError::EmptyField("email"));
    }
    if req.password.is_empty() {
        return Err(AuthError::EmptyField("password"));
    }
    if req.password != req.confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    if session.users().find_by_email(email).await?.is_some() {
        return Err(AuthError::EmailInUse);
    }

    let password_hash = hash_password(&req.password)?;
    let user = UserRecord::new(
        Uuid::new_v4().to_string(),
        name,
        email,
        password_hash,
        session.now(),
    );
    let pointer = user.pointer();
    match session.users().create(user).await? {
        CreateOutcome::Created => {}
        CreateOutcome::DuplicateEmail => return Err(AuthError::EmailInUse),
        CreateOutcome::DuplicateId => {
            error!("generated user id collided with an existing one");
            return Err(AuthError::Port(PortError::Unexpected(
                "user id collision".to_string(),
            )));
        }
    }

    session.users().set_session_pointer(&pointer).await?;
    info!(user_id = %pointer.id, "signed up");
    Ok(pointer)
}

/// Verifies the credentials and signs the user in.
///
/// Records carrying a legacy plain-text password are accepted once and
/// re-saved with an argon2 hash.
#[instrument(skip(session, req), fields(email = %req.email))]
pub async fn login(session: &Session, req: LoginRequest) -> Result<SessionPointer, AuthError> {
    let Some(mut user) = session.users().find_by_email(req.email.trim()).await? else {
        warn!("login for unknown email");
        return Err(AuthError::InvalidCredentials);
    };
    if req.password.is_empty() || user.password_hash.is_empty() {
        warn!(user_id = %user.id, "login with an empty password or against a record without one");
        return Err(AuthError::InvalidCredentials);
    }

    match PasswordHash::new(&user.password_hash) {
        Ok(parsed) => {
            if Argon2::default()
                .verify_password(req.password.as_bytes(), &parsed)
                .is_err()
            {
                return Err(AuthError::InvalidCredentials);
            }
        }
        Err(_) => {
            if user.password_hash != req.password {
                return Err(AuthError::InvalidCredentials);
            }
            user.password_hash = hash_password(&req.password)?;
            session.users().save(&user).await?;
            info!(user_id = %user.id, "upgraded legacy password to argon2");
        }
    }

    let pointer = user.pointer();
    session.users().set_session_pointer(&pointer).await?;
    info!(user_id = %pointer.id, "logged in");
    Ok(pointer)
}

pub async fn logout(session: &Session) -> Result<(), AuthError> {
    session.users().clear_session_pointer().await?;
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            AuthError::Hash(e.to_string())
        })
}
