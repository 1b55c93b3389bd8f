//! Bearer token authentication.
//!
//! Tokens are issued by the Auth service and verified here against the
//! shared HS256 secret. The raw `Authorization` header is kept on the
//! authenticated user so it can be forwarded verbatim to the Profile
//! service; this service never mints or re-signs credentials.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use cyou_models::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Role carried in the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Applicant,
    Recruiter,
    Admin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Claims issued by the Auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// User ID
    #[serde(rename = "userId")]
    pub user_id: String,
    /// User role
    pub role: UserRole,
    /// Expiration
    pub exp: i64,
    /// Issued at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Authenticated user extracted from the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub role: UserRole,
    /// The original `Authorization` header value, for forwarding
    pub authorization: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// HS256 token verifier.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier from the shared secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a bearer token and return its claims.
    pub fn verify(&self, token: &str) -> Result<AuthClaims, ApiError> {
        let token_data = decode::<AuthClaims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::unauthorized("Token expired")
                }
                _ => ApiError::unauthorized("Token is invalid"),
            })?;

        Ok(token_data.claims)
    }
}

/// Axum extractor for authenticated users.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("No token, authorization denied"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Expected a bearer token"))?;

        let claims = state.verifier.verify(token)?;

        Ok(AuthUser {
            id: UserId::from_string(claims.user_id),
            role: claims.role,
            authorization: auth_header.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(claims: &AuthClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_round_trip() {
        let verifier = TokenVerifier::new("secret");
        let token = token_for(
            &AuthClaims {
                user_id: "user-1".into(),
                role: UserRole::Recruiter,
                exp: chrono::Utc::now().timestamp() + 3600,
                iat: None,
            },
            "secret",
        );

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.role, UserRole::Recruiter);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let verifier = TokenVerifier::new("secret");
        let token = token_for(
            &AuthClaims {
                user_id: "user-1".into(),
                role: UserRole::Applicant,
                exp: chrono::Utc::now().timestamp() + 3600,
                iat: None,
            },
            "other-secret",
        );

        assert!(matches!(
            verifier.verify(&token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let verifier = TokenVerifier::new("secret");
        let token = token_for(
            &AuthClaims {
                user_id: "user-1".into(),
                role: UserRole::Applicant,
                exp: chrono::Utc::now().timestamp() - 3600,
                iat: None,
            },
            "secret",
        );

        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(msg) if msg == "Token expired"));
    }
}
