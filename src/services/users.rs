//! Account management service: registration, login, verification, profile

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::owner::{Owner, OwnerClaims, OwnerRegion, ProfileView, RegisterOwner, UpdateProfile},
    repository::OwnerStore,
    services::email::Notifier,
};

/// Hours a verification token stays valid
const VERIFICATION_TOKEN_VALIDITY_HOURS: i64 = 24;

#[derive(Clone)]
pub struct UsersService {
    owners: Arc<dyn OwnerStore>,
    notifier: Arc<dyn Notifier>,
    config: AuthConfig,
    frontend_url: String,
}

impl UsersService {
    pub fn new(
        owners: Arc<dyn OwnerStore>,
        notifier: Arc<dyn Notifier>,
        config: AuthConfig,
        frontend_url: String,
    ) -> Self {
        Self {
            owners,
            notifier,
            config,
            frontend_url,
        }
    }

    /// Register a new account and send the verification email
    pub async fn register(&self, request: RegisterOwner) -> AppResult<ProfileView> {
        if self.owners.exists_by_email(&request.email).await? {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let token = Uuid::new_v4().to_string();
        let owner = Owner {
            id: Uuid::new_v4(),
            name: request.name,
            email: request.email,
            password_hash: self.hash_password(&request.password)?,
            image: None,
            postal_code: None,
            phone: None,
            biography: None,
            interests: None,
            region: OwnerRegion {
                city: request.city,
                province: request.province,
                country: request.country,
                continent: request.continent,
            },
            is_verified: false,
            verification_token: Some(token.clone()),
            token_generated_at: Some(Utc::now()),
            token_verified_at: None,
            books: Vec::new(),
        };

        self.owners.save(&owner).await?;

        let notifier = Arc::clone(&self.notifier);
        let to = owner.email.clone();
        let link = format!("{}/verify?token={}", self.frontend_url, token);
        let body = format!(
            "Welcome to ShelfShare!\n\nPlease verify your email by opening the following link:\n{}",
            link
        );
        tokio::spawn(async move {
            if let Err(err) = notifier
                .send(&to, "Verify your ShelfShare account", &body)
                .await
            {
                tracing::error!("Failed to send verification email to {}: {}", to, err);
            }
        });

        Ok(owner.profile())
    }

    /// Authenticate by email and password, returning a JWT and the profile
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, ProfileView)> {
        let owner = self
            .owners
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&owner.password_hash, password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        if !owner.is_verified {
            return Err(AppError::Authentication(
                "Please verify your email before signing in".to_string(),
            ));
        }

        let token = self.create_token(&owner)?;
        Ok((token, owner.profile()))
    }

    /// Confirm an email address from a verification token
    pub async fn verify_email(&self, token: &str) -> AppResult<()> {
        let mut owner = self
            .owners
            .find_by_verification_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid verification token".to_string()))?;

        let generated_at = owner.token_generated_at.ok_or_else(|| {
            AppError::InvalidInput("Verification token expired".to_string())
        })?;
        if generated_at + Duration::hours(VERIFICATION_TOKEN_VALIDITY_HOURS) < Utc::now() {
            return Err(AppError::InvalidInput(
                "Verification token expired".to_string(),
            ));
        }

        owner.is_verified = true;
        owner.token_verified_at = Some(Utc::now());
        self.owners.save(&owner).await
    }

    /// Change the password after re-checking the current one
    pub async fn change_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let mut owner = self
            .owners
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", email)))?;

        if !self.verify_password(&owner.password_hash, current_password)? {
            return Err(AppError::Authentication(
                "Current password is incorrect".to_string(),
            ));
        }

        owner.password_hash = self.hash_password(new_password)?;
        self.owners.save(&owner).await
    }

    /// Overwrite the profile fields of the authenticated owner
    pub async fn update_profile(
        &self,
        email: &str,
        request: UpdateProfile,
    ) -> AppResult<ProfileView> {
        let mut owner = self
            .owners
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", email)))?;

        if !request.email.eq_ignore_ascii_case(&owner.email)
            && self.owners.exists_by_email(&request.email).await?
        {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        owner.name = request.name;
        owner.email = request.email;

        if let Some(image) = request.image {
            if image.starts_with("data:") {
                owner.image = Some(image);
            } else {
                tracing::warn!("Ignoring profile image that is not a data: URI");
            }
        }

        owner.postal_code = request.postal_code;
        owner.phone = request.phone;
        owner.biography = request.biography;
        owner.interests = request.interests;
        owner.region = OwnerRegion {
            city: request.city,
            province: request.province,
            country: request.country,
            continent: request.continent,
        };

        self.owners.save(&owner).await?;
        Ok(owner.profile())
    }

    /// Profile of the owner identified by the token claims
    pub async fn profile(&self, owner_id: Uuid) -> AppResult<ProfileView> {
        let owner = self
            .owners
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(owner.profile())
    }

    fn create_token(&self, owner: &Owner) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = OwnerClaims {
            sub: owner.email.clone(),
            owner_id: owner.id,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Hash a password using Argon2
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, hash: &str, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
