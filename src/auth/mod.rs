use axum::{async_trait, extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Capability required to fetch remote pages and resolve bookmarks.
pub const EDIT_POSTS: &str = "edit_posts";

const ACCESS_TOKEN_MINUTES: i64 = 60;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (editor identity)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl Claims {
    pub fn new(subject: String, capabilities: Vec<String>, expiration_minutes: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::minutes(expiration_minutes);

        Claims {
            sub: subject,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            capabilities,
        }
    }
}

// ============================================================================
// JWT Operations
// ============================================================================

pub fn create_access_token(
    subject: &str,
    capabilities: &[&str],
    secret: &str,
) -> AppResult<String> {
    let claims = Claims::new(
        subject.to_string(),
        capabilities.iter().map(|c| c.to_string()).collect(),
        ACCESS_TOKEN_MINUTES,
    );

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Failed to create JWT: {:?}", e);
        AppError::Auth("Failed to create token".into())
    })
}

pub fn validate_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Token validation failed: {:?}", e);
        AppError::Auth("Invalid or expired token".into())
    })
}

// ============================================================================
// Auth Extractor
// ============================================================================

pub struct AuthUser {
    pub subject: String,
    pub capabilities: Vec<String>,
}

impl AuthUser {
    pub fn can(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    pub fn require_capability(&self, capability: &str) -> AppResult<()> {
        if self.can(capability) {
            Ok(())
        } else {
            tracing::debug!(subject = %self.subject, capability, "Capability check failed");
            Err(AppError::Forbidden(format!(
                "Missing required capability '{capability}'"
            )))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Auth("Missing or invalid Authorization header".into()))?;

        let claims = validate_token(bearer.token(), &state.jwt_secret)?;

        Ok(AuthUser {
            subject: claims.sub,
            capabilities: claims.capabilities,
        })
    }
}
