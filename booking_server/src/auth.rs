//! Session tokens.
//!
//! A successful login issues an HS256-signed JWT carrying the user's id, email, name and role. The token travels in the
//! `auth-token` cookie; API clients can send it in an `Authorization: Bearer` header instead.
use std::future::{ready, Ready};

use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    dev::Payload,
    web,
    FromRequest,
    HttpMessage,
    HttpRequest,
};
use booking_engine::{
    db_types::{Role, UserId, UserProfile},
    Payer,
};
use chrono::Duration;
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    Token,
    UntrustedToken,
};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const AUTH_COOKIE: &str = "auth-token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id
    pub sub: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl JwtClaims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins can do everything a user can.
    pub fn has_role(&self, required: Role) -> bool {
        self.is_admin() || self.role == required
    }

    pub fn payer(&self) -> Payer {
        Payer { user_id: self.sub.clone(), email: self.email.clone(), name: self.name.clone() }
    }
}

impl From<UserProfile> for JwtClaims {
    fn from(user: UserProfile) -> Self {
        Self { sub: user.id, email: user.email, name: user.name, role: user.role }
    }
}

pub struct TokenIssuer {
    key: Hs256Key,
    duration: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = Hs256Key::new(config.jwt_secret.reveal().as_bytes());
        Self { key, duration: config.session_duration }
    }

    /// Issues a signed session token for the given claims.
    ///
    /// This method DOES NOT check that the claims are legitimate. The caller must have authenticated the user first.
    pub fn issue_token(&self, claims: JwtClaims) -> Result<String, AuthError> {
        let header = Header::empty().with_token_type("JWT");
        let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), self.duration);
        Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::TokenIssueError(e.to_string()))
    }

    /// Checks the signature and expiry of a session token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::ValidationError(e.to_string()))?;
        let token: Token<JwtClaims> =
            Hs256.validator(&self.key).validate(&untrusted).map_err(|e| AuthError::ValidationError(e.to_string()))?;
        token.claims().validate_expiration(&TimeOptions::default()).map_err(|e| {
            debug!("🔐️ Rejected token for {}. {e}", token.claims().custom.email);
            AuthError::ValidationError(e.to_string())
        })?;
        Ok(token.claims().custom.clone())
    }

    pub fn session_duration(&self) -> Duration {
        self.duration
    }
}

/// Finds the session token in the `auth-token` cookie, or failing that, in a bearer `Authorization` header.
pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(AUTH_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Authenticates a request. Claims that the ACL middleware has already validated are reused.
pub fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    if let Some(claims) = req.extensions().get::<JwtClaims>() {
        return Ok(claims.clone());
    }
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::ConfigurationError("No token issuer has been configured".into()))?;
    let token = token_from_request(req).ok_or(AuthError::MissingToken)?;
    let claims = issuer.validate_token(&token)?;
    trace!("🔐️ Authenticated {} ({})", claims.email, claims.role);
    Ok(claims)
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

pub fn session_cookie(token: String, duration: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, token)
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(CookieDuration::seconds(duration.num_seconds()))
        .secure(secure)
        .finish()
}

pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, "")
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(CookieDuration::ZERO)
        .secure(secure)
        .finish()
}
