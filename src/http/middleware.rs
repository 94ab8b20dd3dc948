//! Authentication middleware and JWT verification

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::app::AppState;
use crate::util::time::unix_secs;

type HmacSha256 = Hmac<Sha256>;

/// Audience Supabase puts on tokens of signed-in users
const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// JWT claims from Supabase auth token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Audience
    #[serde(default)]
    pub aud: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: u64,
    /// Email (if available)
    #[serde(default)]
    pub email: Option<String>,
    /// Role
    #[serde(default)]
    pub role: Option<String>,
}

/// Verify a JWT token and extract claims
pub fn verify_jwt(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::InvalidToken);
    }

    let header_b64 = parts[0];
    let payload_b64 = parts[1];
    let signature_b64 = parts[2];

    // Verify signature (HMAC-SHA256)
    let message = format!("{}.{}", header_b64, payload_b64);

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(message.as_bytes());

    let provided_signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AuthError::InvalidToken)?;

    mac.verify_slice(&provided_signature)
        .map_err(|_| AuthError::InvalidToken)?;

    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AuthError::InvalidToken)?;

    let claims: JwtClaims =
        serde_json::from_slice(&payload_json).map_err(|_| AuthError::InvalidToken)?;

    if claims.exp < unix_secs() {
        return Err(AuthError::TokenExpired);
    }

    if claims
        .aud
        .as_deref()
        .is_some_and(|aud| aud != AUTHENTICATED_AUDIENCE)
    {
        return Err(AuthError::InvalidAudience);
    }

    Ok(claims)
}

/// Extract JWT from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Authentication error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid authorization header format")]
    InvalidFormat,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid audience")]
    InvalidAudience,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::InvalidFormat => StatusCode::BAD_REQUEST,
            AuthError::MissingHeader
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::InvalidAudience => StatusCode::UNAUTHORIZED,
        };

        let body = serde_json::json!({
            "error": "Please sign in to save items or contact suppliers",
            "reason": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

/// Authenticated user extractor result
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub claims: JwtClaims,
}

fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthenticatedUser, AuthError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingHeader)?;

    let token = extract_bearer_token(auth_header).ok_or(AuthError::InvalidFormat)?;
    let claims = verify_jwt(token, secret)?;

    Ok(AuthenticatedUser {
        user_id: claims.sub,
        claims,
    })
}

/// Middleware to require authentication
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_user = authenticate(request.headers(), &state.config.supabase_jwt_secret)?;

    // Insert into request extensions for handlers to access
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Signed-in user on public routes, if the token checks out
pub fn optional_user(headers: &HeaderMap, secret: &str) -> Option<Uuid> {
    authenticate(headers, secret).ok().map(|user| user.user_id)
}

#[cfg(test)]
pub(crate) fn sign_test_token(claims: &serde_json::Value, secret: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.{}", header, payload).as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{}.{}.{}", header, payload, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "jwt-secret";

    fn claims(exp: u64, aud: &str) -> serde_json::Value {
        json!({
            "sub": "9b2f6c1e-5d1a-4c59-9a7e-2f5c3b8d4e10",
            "aud": aud,
            "exp": exp,
            "email": "buyer@example.com"
        })
    }

    #[test]
    fn accepts_valid_token() {
        let token = sign_test_token(&claims(unix_secs() + 3600, "authenticated"), SECRET);
        let verified = verify_jwt(&token, SECRET).unwrap();
        assert_eq!(
            verified.sub.to_string(),
            "9b2f6c1e-5d1a-4c59-9a7e-2f5c3b8d4e10"
        );
        assert_eq!(verified.email.as_deref(), Some("buyer@example.com"));
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = sign_test_token(&claims(unix_secs() + 3600, "authenticated"), "other");
        assert!(matches!(verify_jwt(&token, SECRET), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn rejects_expired_token() {
        let token = sign_test_token(&claims(unix_secs() - 10, "authenticated"), SECRET);
        assert!(matches!(verify_jwt(&token, SECRET), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn rejects_foreign_audience() {
        let token = sign_test_token(&claims(unix_secs() + 3600, "anon"), SECRET);
        assert!(matches!(verify_jwt(&token, SECRET), Err(AuthError::InvalidAudience)));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(matches!(verify_jwt("abc", SECRET), Err(AuthError::InvalidToken)));
        assert!(matches!(verify_jwt("a.b.c", SECRET), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn optional_user_is_none_without_header() {
        assert_eq!(optional_user(&HeaderMap::new(), SECRET), None);

        let mut headers = HeaderMap::new();
        let token = sign_test_token(&claims(unix_secs() + 60, "authenticated"), SECRET);
        headers.insert("Authorization", format!("Bearer {}", token).parse().unwrap());
        assert!(optional_user(&headers, SECRET).is_some());
    }
}
