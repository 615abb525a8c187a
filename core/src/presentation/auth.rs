// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Principal extraction from the bearer token.
//!
//! Token signatures are verified at the edge; this layer only decodes the
//! claim payload (`user_id`, `role`, optional `store_id`) into a
//! [`Principal`]. Both transports share [`principal_from_token`].

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::error::ServiceError;
use crate::domain::principal::{Principal, Role};
use crate::presentation::api::ApiError;

#[derive(Deserialize)]
struct TokenClaims {
    user_id: Value,
    role: String,
    #[serde(default)]
    store_id: Option<Value>,
}

/// Decode the (already verified) claim set out of a compact JWT.
pub fn principal_from_token(token: &str) -> Result<Principal, ServiceError> {
    let mut segments = token.split('.');
    let payload_b64 = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => {
            return Err(ServiceError::Unauthorized(
                "malformed bearer token".to_string(),
            ))
        }
    };

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| ServiceError::Unauthorized("undecodable token payload".to_string()))?;

    let claims: TokenClaims = serde_json::from_slice(&payload)
        .map_err(|_| ServiceError::Unauthorized("user not found in token".to_string()))?;

    let user_id = claim_i64(&claims.user_id)
        .ok_or_else(|| ServiceError::Unauthorized("user not found in token".to_string()))?;
    let role = Role::from_claim(&claims.role)
        .ok_or_else(|| ServiceError::Unauthorized("role is invalid".to_string()))?;
    let store_id = claims.store_id.as_ref().and_then(claim_i64);

    Ok(Principal {
        user_id,
        role,
        store_id,
    })
}

// Numeric claims may arrive as JSON numbers or strings.
fn claim_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::from(ServiceError::Unauthorized(
                    "missing Authorization header".to_string(),
                ))
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::from(ServiceError::Unauthorized(
                "Authorization header is not a bearer token".to_string(),
            ))
        })?;

        principal_from_token(token).map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_for(payload: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.c2ln",
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn merchant_claims_decode() {
        let token = token_for(r#"{"user_id": 7, "role": "merchant", "store_id": 9}"#);
        let principal = principal_from_token(&token).unwrap();
        assert_eq!(principal.user_id, 7);
        assert_eq!(principal.role, Role::Merchant);
        assert_eq!(principal.store_id, Some(9));
    }

    #[test]
    fn store_id_is_optional_and_string_ids_are_tolerated() {
        let token = token_for(r#"{"user_id": "12", "role": "customer"}"#);
        let principal = principal_from_token(&token).unwrap();
        assert_eq!(principal.user_id, 12);
        assert_eq!(principal.role, Role::Customer);
        assert_eq!(principal.store_id, None);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let token = token_for(r#"{"user_id": 1, "role": "superuser"}"#);
        assert!(matches!(
            principal_from_token(&token),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for token in ["", "only-one-part", "two.parts", "a.!!!.c"] {
            assert!(
                principal_from_token(token).is_err(),
                "token {token:?} should fail"
            );
        }
    }
}
