// src/handlers/auth.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::{Config, LOCKOUT_MINUTES, MAX_FAILED_LOGIN_ATTEMPTS},
    error::AppError,
    models::user::{
        AuthResponse, LoginRequest, RegisterRequest, ResendOtpRequest, Role, UpdateProfileRequest,
        User, VerifyEmailRequest, normalize_email, validate_email_format,
    },
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, clear_session_cookie, session_cookie, sign_jwt},
        mailer::Mailer,
        otp::{generate_otp, otp_expiry},
        sanitize::clean_html,
    },
};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, is_verified, otp_code, \
     otp_expires_at, failed_login_attempts, lock_until, bio, avatar, created_at";

async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

async fn find_user_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(user)
}

async fn dispatch_otp(mailer: &Arc<dyn Mailer>, email: &str, code: &str) {
    let body = format!(
        "Your SimplyLearn verification code is {}. It expires in 10 minutes.",
        code
    );
    // Account creation has already committed; a mail hiccup should not
    // fail the request. The code can be re-requested via resend-otp.
    if let Err(e) = mailer.send(email, "Verify your SimplyLearn account", &body).await {
        tracing::error!("Failed to send verification email to {}: {}", email, e);
    }
}

/// Minutes left in the lockout window, rounded up for display.
fn lock_remaining_minutes(lock_until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (lock_until - now).num_seconds().max(0);
    (secs + 59) / 60
}

/// Registers a new account.
///
/// Creates the user unverified, generates a 6-digit OTP valid for 10
/// minutes and dispatches it by email. Returns 201 and the user object
/// (excluding credentials).
pub async fn register(
    State(pool): State<PgPool>,
    State(mailer): State<Arc<dyn Mailer>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let name = payload.name.trim().to_string();
    let email = normalize_email(&payload.email);
    let role = payload.role.unwrap_or(Role::Student);
    let password_hash = hash_password(&payload.password)?;
    let otp = generate_otp();
    let expires = otp_expiry();

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, password_hash, role, otp_code, otp_expires_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .bind(role)
    .bind(&otp)
    .bind(expires)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Postgres error code for unique violation is 23505
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Email '{}' is already registered", email))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    dispatch_otp(&mailer, &user.email, &otp).await;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Verifies an account with the emailed OTP.
///
/// On success marks the account verified, clears the code and issues a
/// session (token JSON + httpOnly cookie).
pub async fn verify_email(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = normalize_email(&payload.email);
    let user = find_user_by_email(&pool, &email)
        .await?
        .ok_or(AppError::NotFound("No account with this email".to_string()))?;

    if user.is_verified {
        return Err(AppError::BadRequest("Email is already verified".to_string()));
    }

    let stored = user
        .otp_code
        .as_deref()
        .ok_or(AppError::BadRequest("No verification code pending".to_string()))?;

    if stored != payload.otp {
        return Err(AppError::BadRequest("Invalid verification code".to_string()));
    }

    // Expiry is checked even when the code matches.
    match user.otp_expires_at {
        Some(expires) if expires > Utc::now() => {}
        _ => {
            return Err(AppError::BadRequest(
                "Verification code has expired".to_string(),
            ));
        }
    }

    sqlx::query("UPDATE users SET is_verified = TRUE, otp_code = NULL, otp_expires_at = NULL WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await?;

    let token = sign_jwt(user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;
    let cookie = session_cookie(&token, config.jwt_expiration);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_verified: true,
            token,
        }),
    ))
}

/// Regenerates and re-sends the verification code.
pub async fn resend_otp(
    State(pool): State<PgPool>,
    State(mailer): State<Arc<dyn Mailer>>,
    Json(payload): Json<ResendOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = normalize_email(&payload.email);
    let user = find_user_by_email(&pool, &email)
        .await?
        .ok_or(AppError::NotFound("No account with this email".to_string()))?;

    if user.is_verified {
        return Err(AppError::BadRequest("Email is already verified".to_string()));
    }

    let otp = generate_otp();
    sqlx::query("UPDATE users SET otp_code = $1, otp_expires_at = $2 WHERE id = $3")
        .bind(&otp)
        .bind(otp_expiry())
        .bind(user.id)
        .execute(&pool)
        .await?;

    dispatch_otp(&mailer, &user.email, &otp).await;

    Ok(Json(json!({"message": "Verification code sent"})))
}

/// Authenticates a user and issues a session.
///
/// Lockout is checked before the password: while the lock window is
/// active every attempt fails, correct password or not. A failed attempt
/// increments the counter; at the threshold the account is locked for
/// five minutes. Success resets counter and lock.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.validate().is_err() || validate_email_format(&payload.email).is_err() {
        return Err(AppError::BadRequest("Invalid credentials".to_string()));
    }

    let email = normalize_email(&payload.email);
    let user = find_user_by_email(&pool, &email)
        .await?
        .ok_or(AppError::AuthError("Invalid email or password".to_string()))?;

    let now = Utc::now();
    if let Some(lock_until) = user.lock_until {
        if lock_until > now {
            return Err(AppError::AccountLocked(format!(
                "Account locked due to repeated failed logins. Try again in {} minute(s).",
                lock_remaining_minutes(lock_until, now)
            )));
        }
    }

    let is_valid = verify_password(&payload.password, &user.password_hash)?;

    if !is_valid {
        let attempts = user.failed_login_attempts + 1;
        let lock_until = (attempts >= MAX_FAILED_LOGIN_ATTEMPTS)
            .then(|| now + Duration::minutes(LOCKOUT_MINUTES));

        // Single statement so the counter bump and the lock land together.
        sqlx::query("UPDATE users SET failed_login_attempts = $1, lock_until = $2 WHERE id = $3")
            .bind(attempts)
            .bind(lock_until)
            .bind(user.id)
            .execute(&pool)
            .await?;

        if lock_until.is_some() {
            tracing::warn!("Account {} locked after {} failed logins", user.id, attempts);
        }

        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    if !user.is_verified {
        return Err(AppError::AuthError(
            "Please verify your email before logging in".to_string(),
        ));
    }

    sqlx::query("UPDATE users SET failed_login_attempts = 0, lock_until = NULL WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await?;

    let token = sign_jwt(user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;
    let cookie = session_cookie(&token, config.jwt_expiration);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
            token,
        }),
    ))
}

/// Clears the session cookie.
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(json!({"message": "Logged out"})),
    )
}

/// Get the current user's profile.
pub async fn get_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user_by_id(&pool, claims.user_id())
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Patches the current user's profile.
///
/// Fields are sanitized individually; a fresh token is issued so the
/// session reflects any identity change.
pub async fn update_profile(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();
    let _user = find_user_by_id(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    if let Some(name) = payload.name {
        sqlx::query("UPDATE users SET name = $1 WHERE id = $2")
            .bind(name.trim())
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(email) = payload.email {
        if validate_email_format(&email).is_err() {
            return Err(AppError::BadRequest("Invalid email format".to_string()));
        }
        let email = normalize_email(&email);
        sqlx::query("UPDATE users SET email = $1 WHERE id = $2")
            .bind(&email)
            .bind(user_id)
            .execute(&pool)
            .await
            .map_err(|e| {
                if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
                    AppError::Conflict(format!("Email '{}' is already registered", email))
                } else {
                    AppError::from(e)
                }
            })?;
    }

    if let Some(password) = payload.password {
        let hashed = hash_password(&password)?;
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(hashed)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(bio) = payload.bio {
        sqlx::query("UPDATE users SET bio = $1 WHERE id = $2")
            .bind(clean_html(&bio))
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(avatar) = payload.avatar {
        sqlx::query("UPDATE users SET avatar = $1 WHERE id = $2")
            .bind(avatar.trim())
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    let user = find_user_by_id(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let token = sign_jwt(user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;
    let cookie = session_cookie(&token, config.jwt_expiration);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
            token,
        }),
    ))
}
