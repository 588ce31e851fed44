use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::{
    config::JwtConfig,
    dto::auth::{
        AuthResponse, ChangePasswordRequest, Claims, ForgotPasswordRequest, LoginRequest,
        RegisterRequest, ResetPasswordRequest,
    },
    entity::{
        password_reset_tokens::{
            ActiveModel as ResetTokenActive, Column as ResetTokenCol, Entity as ResetTokens,
        },
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_CUSTOMER},
    response::ApiResponse,
    state::AppState,
};

const RESET_TOKEN_TTL_HOURS: i64 = 24;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(config: &JwtConfig, user: &UserModel) -> AppResult<(String, DateTime<Utc>)> {
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(Duration::days(config.expires_days))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.clone(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
        iss: config.issuer.clone(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok((token, expires_at))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn auth_response(state: &AppState, user: UserModel) -> AppResult<AuthResponse> {
    let (token, expires_at) = issue_token(&state.config.jwt, &user)?;
    Ok(AuthResponse {
        token,
        expires_at,
        user: user.into(),
    })
}

pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let email = normalize_email(&payload.email);
    let exists = Users::find()
        .filter(UserCol::Email.eq(email.clone()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::BadRequest("Email already exists".into()));
    }

    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        phone: Set(payload.phone),
        role: Set(ROLE_CUSTOMER.to_string()),
        is_active: Set(true),
        last_login_at: Set(Some(now.into())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(ApiResponse::success(
        "Registration successful",
        auth_response(state, user)?,
        None,
    ))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<AuthResponse>> {
    let invalid = || AppError::Unauthorized("Invalid email or password".into());

    let user = Users::find()
        .filter(UserCol::Email.eq(normalize_email(&payload.email)))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) if u.is_active => u,
        _ => return Err(invalid()),
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }

    let mut active: UserActive = user.into();
    active.last_login_at = Set(Some(Utc::now().into()));
    let user = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Login successful", auth_response(state, user)?, None))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if !verify_password(&payload.current_password, &existing.password_hash)? {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }

    let mut active: UserActive = existing.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    Ok(ApiResponse::empty("Password changed successfully"))
}

/// Always answers the same way so callers cannot tell which emails are registered.
pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = Users::find()
        .filter(UserCol::Email.eq(normalize_email(&payload.email)))
        .filter(UserCol::IsActive.eq(true))
        .one(&state.orm)
        .await?;

    if let Some(user) = user {
        let now = Utc::now();
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        ResetTokenActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            token: Set(token.clone()),
            expires_at: Set((now + Duration::hours(RESET_TOKEN_TTL_HOURS)).into()),
            is_used: Set(false),
            created_at: Set(now.into()),
        }
        .insert(&state.orm)
        .await?;

        let link = format!(
            "{}/reset-password?token={}",
            state.config.frontend_url.trim_end_matches('/'),
            token
        );
        tracing::info!(user_id = %user.id, %link, "password reset requested");
    }

    Ok(ApiResponse::empty(
        "If the email exists, a password reset link has been sent",
    ))
}

pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let invalid = || AppError::BadRequest("Invalid or expired reset token".into());

    let token = ResetTokens::find()
        .filter(ResetTokenCol::Token.eq(payload.token.clone()))
        .filter(ResetTokenCol::IsUsed.eq(false))
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;

    if token.expires_at.with_timezone(&Utc) <= Utc::now() {
        return Err(invalid());
    }

    let user = Users::find_by_id(token.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;

    let password_hash = hash_password(&payload.new_password)?;

    let txn = state.orm.begin().await?;
    let mut active_user: UserActive = user.into();
    active_user.password_hash = Set(password_hash);
    active_user.updated_at = Set(Utc::now().into());
    active_user.update(&txn).await?;

    let mut active_token: ResetTokenActive = token.into();
    active_token.is_used = Set(true);
    active_token.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::empty("Password has been reset successfully"))
}
