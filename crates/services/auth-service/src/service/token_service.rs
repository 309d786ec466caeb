//! Bearer token issuing and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::{AppError, AppResult, JwtConfig};

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    /// User id the token was issued to
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl AuthClaims {
    pub fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Issues and checks bearer tokens.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Sign a token for `user_id`, valid for the configured lifetime.
    fn generate_token(&self, user_id: Uuid) -> AppResult<String>;

    /// Check signature and expiry and return the claims.
    ///
    /// # Errors
    /// `TokenExpired` once the token is past its expiry, `TokenInvalid` for
    /// anything else that does not verify.
    fn validate_token(&self, token: &str) -> AppResult<AuthClaims>;
}

/// HS256 tokens signed with one shared secret.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            config.secret.as_bytes(),
            Duration::hours(config.expiration_hours),
        )
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, user_id: Uuid) -> AppResult<String> {
        let now = Utc::now();
        let claims = AuthClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("token signing failed: {}", e)))
    }

    fn validate_token(&self, token: &str) -> AppResult<AuthClaims> {
        let claims = decode::<AuthClaims>(token, &self.decoding_key, &self.validation)?.claims;

        // jsonwebtoken still accepts a token whose exp equals the current second
        if claims.exp <= Utc::now().timestamp() {
            return Err(AppError::TokenExpired);
        }

        Ok(claims)
    }
}
