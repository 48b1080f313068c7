//! Account endpoints: registration, login, verification, profile

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::owner::{ProfileView, RegisterOwner, UpdateProfile},
};

use super::AuthenticatedUser;

/// Login request
#[derive(Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Login response with bearer token and profile
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub user: ProfileView,
}

/// Email verification request
#[derive(Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub token: String,
}

/// Password change request
#[derive(Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub new_password: String,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterOwner,
    responses(
        (status = 201, description = "Account created", body = ProfileView),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<RegisterOwner>,
) -> AppResult<(StatusCode, Json<ProfileView>)> {
    request
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let profile = state.services.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials or unverified account")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    request
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let (token, user) = state
        .services
        .users
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        user,
    }))
}

/// Confirm an email address from a verification token
#[utoipa::path(
    post,
    path = "/auth/verify",
    tag = "auth",
    request_body = VerifyRequest,
    responses(
        (status = 204, description = "Email verified"),
        (status = 400, description = "Token expired"),
        (status = 404, description = "Unknown token")
    )
)]
pub async fn verify_email(
    State(state): State<crate::AppState>,
    Json(request): Json<VerifyRequest>,
) -> AppResult<StatusCode> {
    state.services.users.verify_email(&request.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change the authenticated owner's password
#[utoipa::path(
    post,
    path = "/auth/change-password",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Current password incorrect")
    )
)]
pub async fn change_password(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    request
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    state
        .services
        .users
        .change_password(&claims.sub, &request.current_password, &request.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get the authenticated owner's profile
#[utoipa::path(
    get,
    path = "/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Owner profile", body = ProfileView),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ProfileView>> {
    let profile = state.services.users.profile(claims.owner_id).await?;
    Ok(Json(profile))
}

/// Update the authenticated owner's profile
#[utoipa::path(
    put,
    path = "/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = ProfileView),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn update_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateProfile>,
) -> AppResult<Json<ProfileView>> {
    request
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let profile = state
        .services
        .users
        .update_profile(&claims.sub, request)
        .await?;
    Ok(Json(profile))
}
