//! Session verification and rate limiting middleware

use std::net::SocketAddr;

use auth::SessionUser;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    extract::CookieJar,
    headers::{Authorization, authorization::Bearer},
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::ApiError, rate_limiter::RateLimiter, routes::auth::REFRESH_COOKIE, state::AppState,
};

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<SessionUser> for AuthUser {
    fn from(user: SessionUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Reject requests without a valid session
///
/// A bearer header must carry an access token; without one, the refresh
/// cookie is accepted.
pub async fn require_session(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match (bearer, jar.get(REFRESH_COOKIE)) {
        (Some(TypedHeader(Authorization(bearer))), _) => {
            state.sessions.verify_access_token(bearer.token())
        }
        (None, Some(cookie)) => state.sessions.verify_refresh_token(cookie.value()),
        (None, None) => return Err(ApiError::Unauthorized),
    }
    .map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(AuthUser::from(user));

    Ok(next.run(req).await)
}

/// Count the request against a limiter, answering 429 once over quota
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&req, limiter.trusts_forwarded_for());

    if !limiter.is_allowed(&key).await {
        warn!("Throttled {} {} from {}", req.method(), req.uri().path(), key);
        return Err(ApiError::TooManyRequests(limiter.message().to_string()));
    }

    Ok(next.run(req).await)
}

/// Address a request is attributed to for rate limiting
fn client_key(req: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        if let Some(address) = forwarded {
            return address.to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
