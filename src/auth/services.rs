use axum::extract::FromRef;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::NewUser,
    },
    db::StoreError,
    error::AppError,
    state::AppState,
};

const EMAIL_TAKEN: &str = "Email already registered";
const USERNAME_TAKEN: &str = "Username already taken";
const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Email uniqueness is checked before username; a racing insert that trips
/// the DB constraint reports the same messages.
pub async fn register(st: &AppState, req: RegisterRequest) -> Result<AuthResponse, AppError> {
    let req = req.validate()?;

    if st.users.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::validation(EMAIL_TAKEN));
    }
    if st.users.find_by_username(&req.username).await?.is_some() {
        warn!(username = %req.username, "username already taken");
        return Err(AppError::validation(USERNAME_TAKEN));
    }

    let password_hash = hash_password(&req.password)?;
    let user = st
        .users
        .create(NewUser {
            id: Uuid::new_v4(),
            email: req.email,
            username: req.username,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict("email") => AppError::validation(EMAIL_TAKEN),
            StoreError::Conflict("username") => AppError::validation(USERNAME_TAKEN),
            other => other.into(),
        })?;

    let token = JwtKeys::from_ref(st).sign(&user)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/// Unknown email and wrong password fail with the same message.
pub async fn login(st: &AppState, req: LoginRequest) -> Result<AuthResponse, AppError> {
    let req = req.validate()?;

    let Some(user) = st.users.find_by_email(&req.email).await? else {
        warn!(email = %req.email, "login unknown email");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let token = JwtKeys::from_ref(st).sign(&user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/// A valid token whose user was deleted is treated as unauthorized.
pub async fn current_user(st: &AppState, user_id: Uuid) -> Result<PublicUser, AppError> {
    st.users
        .find_by_id(user_id)
        .await?
        .map(PublicUser::from)
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))
}
