//! Cookie-based admin session.
//!
//! `POST /api/login` checks the bcrypt hash and sets an HttpOnly `token`
//! cookie holding a short-lived JWT. Protected routes go through
//! [`require_admin`], which only accepts tokens issued to `admin`.

use super::{ApiError, AppState};
use anyhow::{Context, Result};
use axum::Json;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

pub const ADMIN_USERNAME: &str = "admin";
pub const AUTH_COOKIE: &str = "token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Signs and checks admin session tokens.
pub struct AdminAuth {
    secret: String,
    expiration_hours: i64,
}

impl AdminAuth {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            expiration_hours: 1,
        }
    }

    pub fn issue(&self, username: &str) -> Result<String> {
        let exp = Utc::now()
            .checked_add_signed(chrono::Duration::hours(self.expiration_hours))
            .context("Invalid timestamp")?
            .timestamp() as usize;

        let claims = Claims {
            sub: username.to_string(),
            exp,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate JWT")
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .context("Invalid or expired token")?;

        Ok(decoded.claims)
    }

    /// True when `token` is valid and was issued to the admin account.
    pub fn is_admin(&self, token: &str) -> bool {
        match self.verify(token) {
            Ok(claims) => claims.sub == ADMIN_USERNAME,
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                false
            }
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let Some(user) = state.store.find_admin(&req.username).await? else {
        warn!(username = %req.username, "Login attempt for unknown user");
        return Err(ApiError::InvalidCredentials);
    };

    let hash = user.password_hash.clone();
    let password = req.password;
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .unwrap_or(false);

    if !matches {
        warn!(username = %user.username, "Login attempt with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .auth
        .issue(&user.username)
        .map_err(|e| ApiError::Internal(format!("{:#}", e)))?;

    info!(username = %user.username, "🔑 Admin logged in");

    let cookie = Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/");

    Ok((jar.add(cookie), Json(json!({ "message": "Login successful" }))))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.remove(Cookie::build((AUTH_COOKIE, "")).path("/"));
    (jar, Json(json!({ "message": "Logged out successfully" })))
}

pub async fn check_auth() -> Json<Value> {
    Json(json!({ "authenticated": true }))
}

pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar.get(AUTH_COOKIE).ok_or(ApiError::Unauthorized)?;

    if !state.auth.is_admin(token.value()) {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_verifies() {
        let auth = AdminAuth::new("test-secret".to_string());
        let token = auth.issue(ADMIN_USERNAME).unwrap();

        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert!(claims.exp > Utc::now().timestamp() as usize);
        assert!(auth.is_admin(&token));
    }

    #[test]
    fn test_other_secret_rejects() {
        let token = AdminAuth::new("one".to_string()).issue(ADMIN_USERNAME).unwrap();
        assert!(!AdminAuth::new("two".to_string()).is_admin(&token));
    }

    #[test]
    fn test_non_admin_subject_rejected() {
        let auth = AdminAuth::new("test-secret".to_string());
        let token = auth.issue("bob").unwrap();
        assert!(auth.verify(&token).is_ok());
        assert!(!auth.is_admin(&token));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims {
            sub: ADMIN_USERNAME.to_string(),
            exp: (Utc::now().timestamp() - 7200) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(!AdminAuth::new("test-secret".to_string()).is_admin(&token));
    }
}
