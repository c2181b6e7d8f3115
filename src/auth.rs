use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    access::Session,
    config::{AppConfig, Env},
    repository::RepositoryState,
};

/// Cookie carrying the signed session token for browser navigations.
pub const SESSION_COOKIE: &str = "session_token";
/// Local-only header that authenticates as a known user id without a token.
pub const DEV_USER_HEADER: &str = "x-user-id";

/// Claims
///
/// Payload of a session token. The token proves identity only; the role is always
/// read from the repository so demotions take effect immediately.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the operator's user id.
    pub sub: Uuid,
    /// Expiration time (seconds since epoch). Always validated.
    pub exp: usize,
    /// Issued at (seconds since epoch).
    pub iat: usize,
}

/// AuthError
///
/// Why a request could not be tied to a user. The gate folds every variant into an
/// anonymous session; the `AuthUser` extractor maps every variant to 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no session credentials supplied")]
    MissingCredentials,
    #[error("session token is malformed or has a bad signature")]
    InvalidToken,
    #[error("session token has expired")]
    ExpiredToken,
    #[error("session refers to an unknown user")]
    UnknownUser,
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    /// 'admin', 'annotator' or 'reviewer'.
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// The evaluator's view of this identity.
    pub fn session(&self) -> Session {
        Session::authenticated(self.role.clone())
    }
}

/// issue_token
///
/// Signs a session token for `user_id` valid for the configured session lifetime.
pub fn issue_token(
    user_id: Uuid,
    config: &AppConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp().max(0) as usize;
    let ttl = usize::try_from(config.session_ttl_secs).unwrap_or(usize::MAX);

    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now.saturating_add(ttl),
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key)
}

/// decode_token
///
/// Verifies signature and expiry, returning the claims.
pub fn decode_token(token: &str, config: &AppConfig) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })
}

/// Cookie first (browser navigations), then a bearer header (programmatic callers).
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// authenticate
///
/// Resolves the caller's identity from request headers:
/// 1. Local bypass: a known user id in `x-user-id` (only in `Env::Local`).
/// 2. The session cookie or bearer token, verified and decoded.
/// 3. A repository lookup for the user's current role.
pub async fn authenticate(
    headers: &HeaderMap,
    repo: &RepositoryState,
    config: &AppConfig,
) -> Result<AuthUser, AuthError> {
    if config.env == Env::Local {
        let bypass_id = headers
            .get(DEV_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw).ok());

        if let Some(user_id) = bypass_id {
            if let Some(user) = repo.get_user(user_id).await {
                return Ok(AuthUser {
                    id: user.id,
                    email: user.email,
                    role: user.role,
                });
            }
        }
    }

    let token = token_from_headers(headers).ok_or(AuthError::MissingCredentials)?;
    let claims = decode_token(&token, config)?;

    let user = repo
        .get_user(claims.sub)
        .await
        .ok_or(AuthError::UnknownUser)?;

    Ok(AuthUser {
        id: user.id,
        email: user.email,
        role: user.role,
    })
}

/// resolve_identity
///
/// `authenticate` with every failure normalized to "no identity", for callers that
/// must always produce a session (the access gate).
pub async fn resolve_identity(
    headers: &HeaderMap,
    repo: &RepositoryState,
    config: &AppConfig,
) -> Option<AuthUser> {
    match authenticate(headers, repo, config).await {
        Ok(user) => Some(user),
        Err(AuthError::MissingCredentials) => None,
        Err(reason) => {
            tracing::debug!(%reason, "session rejected, continuing as anonymous");
            None
        }
    }
}

/// session_cookie
///
/// HttpOnly cookie holding a freshly issued session token.
pub fn session_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    let max_age = i64::try_from(config.session_ttl_secs).unwrap_or(i64::MAX);
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

/// clear_session_cookie
///
/// Expires the session cookie on the client.
pub fn clear_session_cookie(config: &AppConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(time::Duration::ZERO)
        .build()
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument. The access gate stores the identity it
/// resolved in the request extensions, so the common path costs no second token decode;
/// handlers mounted outside the gate fall back to resolving the headers themselves.
///
/// Rejection: `StatusCode::UNAUTHORIZED` on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        authenticate(&parts.headers, &repo, &config)
            .await
            .map_err(|reason| {
                tracing::debug!(%reason, "rejecting request without a valid session");
                StatusCode::UNAUTHORIZED
            })
    }
}
