use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use platform_api::ApiError;
use products_hr::identity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::{AppState, hr_error};

#[derive(Clone)]
pub struct AuthConfig {
    secret: Vec<u8>,
    pub token_ttl_minutes: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(secret: Vec<u8>, token_ttl_minutes: i64) -> Self {
        Self {
            secret,
            token_ttl_minutes,
        }
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.secret)
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.secret)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

pub fn issue_token(user_id: Uuid, config: &AuthConfig) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.token_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp() as usize,
        exp,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &config.encoding_key())
}

pub fn decode_token(token: &str, config: &AuthConfig) -> jsonwebtoken::errors::Result<Claims> {
    jsonwebtoken::decode::<Claims>(token, &config.decoding_key(), &Validation::default())
        .map(|data| data.claims)
}

/// Attaches the caller's [`platform_authz::Principal`] when the request
/// carries a valid bearer token for an active account.
///
/// Requests without one pass through untouched; the permission layer answers
/// them with 401.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req.headers().typed_get::<Authorization<Bearer>>();
    if let Some(Authorization(bearer)) = bearer {
        match decode_token(bearer.token(), &state.config.auth) {
            Ok(claims) => {
                let principal = identity::load_principal(&state.pool, claims.sub)
                    .await
                    .map_err(hr_error)?;
                match principal {
                    Some(principal) => {
                        req.extensions_mut().insert(principal);
                    }
                    None => tracing::debug!(user_id = %claims.sub, "token subject is not an active user"),
                }
            }
            Err(err) => tracing::debug!(error = %err, "rejected bearer token"),
        }
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(vec![7u8; 32], 60)
    }

    #[test]
    fn token_round_trip_keeps_subject() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, &config()).unwrap();
        let claims = decode_token(&token, &config()).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), &config()).unwrap();
        let other = AuthConfig::new(vec![9u8; 32], 60);
        assert!(decode_token(&token, &other).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let stale = AuthConfig::new(vec![7u8; 32], -10);
        let token = issue_token(Uuid::new_v4(), &stale).unwrap();
        assert!(decode_token(&token, &config()).is_err());
    }
}
