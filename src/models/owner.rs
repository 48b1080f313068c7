//! Owner (registered user) model and related types

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::book::Book;

/// Geographic location of an owner. Plain strings, no referential integrity
/// against the geography reference tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct OwnerRegion {
    pub city: String,
    pub province: String,
    pub country: String,
    pub continent: String,
}

/// A registered user holding zero or more books
#[derive(Debug, Clone)]
pub struct Owner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub image: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub biography: Option<String>,
    pub interests: Option<String>,
    pub region: OwnerRegion,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub token_generated_at: Option<DateTime<Utc>>,
    pub token_verified_at: Option<DateTime<Utc>>,
    pub books: Vec<Book>,
}

impl Owner {
    pub fn profile(&self) -> ProfileView {
        ProfileView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            image: self.image.clone(),
            postal_code: self.postal_code.clone(),
            phone: self.phone.clone(),
            biography: self.biography.clone(),
            interests: self.interests.clone(),
            city: self.region.city.clone(),
            province: self.region.province.clone(),
            country: self.region.country.clone(),
            continent: self.region.continent.clone(),
        }
    }
}

/// Owner profile as exposed over the API (never carries the password hash)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub biography: Option<String>,
    pub interests: Option<String>,
    pub city: String,
    pub province: String,
    pub country: String,
    pub continent: String,
}

/// Registration payload
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterOwner {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub continent: String,
}

/// Profile update payload
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    /// New profile image; accepted only as a `data:` URI
    pub image: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub biography: Option<String>,
    pub interests: Option<String>,
    pub city: String,
    pub province: String,
    pub country: String,
    pub continent: String,
}

/// JWT claims for an authenticated owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerClaims {
    /// Owner email (natural key used throughout the book flows)
    pub sub: String,
    pub owner_id: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl OwnerClaims {
    /// Create a signed JWT token from these claims
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Validate and decode a JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let data = decode::<OwnerClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_round_trip() {
        let now = Utc::now().timestamp();
        let claims = OwnerClaims {
            sub: "ana@x.com".into(),
            owner_id: Uuid::new_v4(),
            exp: now + 3600,
            iat: now,
        };

        let token = claims.create_token("test-secret").unwrap();
        let decoded = OwnerClaims::from_token(&token, "test-secret").unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.owner_id, claims.owner_id);

        assert!(OwnerClaims::from_token(&token, "other-secret").is_err());
    }
}
