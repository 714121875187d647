//! JWT service for token generation and validation
//!
//! Sessions are stateless: a short-lived access token travels in response
//! bodies and a longer-lived refresh token lives in an HTTP-only cookie.
//! Both are HS256-signed and carry the same identity subset; every token is
//! verified (signature, expiry and type) before any claim is trusted.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::{AuthError, AuthResult},
    models::User,
};

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret used to sign and verify tokens
    pub secret: String,
    /// Access token expiration time in seconds (default: 1 day)
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 3 days)
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: u64,
}

fn default_access_token_expiry() -> u64 {
    86_400
}

fn default_refresh_token_expiry() -> u64 {
    259_200
}

/// The identity subset embedded in every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

impl SessionUser {
    /// Build the token identity for a stored user
    pub fn from_user(user: &User, picture: Option<String>) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            picture,
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

impl Claims {
    /// The identity carried by these claims
    pub fn user(&self) -> SessionUser {
        SessionUser {
            id: self.sub,
            name: self.name.clone(),
            email: self.email.clone(),
            picture: self.picture.clone(),
        }
    }
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        if config.secret.trim().is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Ok(JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        })
    }

    fn now() -> Result<u64> {
        Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs())
    }

    fn generate(&self, user: &SessionUser, token_type: TokenType, lifetime: u64) -> Result<String> {
        let now = Self::now()?;

        let claims = Claims {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            picture: user.picture.clone(),
            iat: now,
            exp: now + lifetime,
            token_type,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &SessionUser) -> Result<String> {
        self.generate(user, TokenType::Access, self.config.access_token_expiry)
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user: &SessionUser) -> Result<String> {
        self.generate(user, TokenType::Refresh, self.config.refresh_token_expiry)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Validate a token and require it to be of the given type
    pub fn validate_token_of_type(&self, token: &str, expected: TokenType) -> AuthResult<Claims> {
        let claims = self.validate_token(token).map_err(|e| {
            warn!("Rejected {:?} token: {}", expected, e);
            AuthError::Unauthorized
        })?;

        if claims.token_type != expected {
            warn!(
                "Rejected token of type {:?} where {:?} was expected",
                claims.token_type, expected
            );
            return Err(AuthError::Unauthorized);
        }

        Ok(claims)
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry: 60,
            refresh_token_expiry: 120,
        }
    }

    fn test_user() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            picture: None,
        }
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let service = JwtService::new(test_config()).unwrap();
        let user = test_user();

        let token = service.generate_access_token(&user).unwrap();
        let claims = service
            .validate_token_of_type(&token, TokenType::Access)
            .unwrap();

        assert_eq!(claims.user(), user);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_refresh_token_lifetime_and_type() {
        let service = JwtService::new(test_config()).unwrap();
        let token = service.generate_refresh_token(&test_user()).unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(claims.exp - claims.iat, 120);
    }

    #[test]
    fn test_token_type_is_enforced() {
        let service = JwtService::new(test_config()).unwrap();
        let access = service.generate_access_token(&test_user()).unwrap();

        let result = service.validate_token_of_type(&access, TokenType::Refresh);
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn test_different_secret_fails() {
        let service = JwtService::new(test_config()).unwrap();
        let other = JwtService::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        })
        .unwrap();

        let token = other.generate_refresh_token(&test_user()).unwrap();
        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_fails() {
        let service = JwtService::new(test_config()).unwrap();
        let user = test_user();
        let now = JwtService::now().unwrap();

        // Well beyond the default 60 second leeway
        let claims = Claims {
            sub: user.id,
            name: user.name,
            email: user.email,
            picture: None,
            iat: now - 600,
            exp: now - 300,
            token_type: TokenType::Refresh,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(test_config().secret.as_bytes()),
        )
        .unwrap();

        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let result = JwtService::new(JwtConfig {
            secret: "  ".to_string(),
            ..test_config()
        });
        assert!(result.is_err());
    }
}
