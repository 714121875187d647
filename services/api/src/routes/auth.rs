//! Account and session routes

use auth::{AuthFlow, IssuedSession};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_extra::extract::{
    CookieJar, WithRejection,
    cookie::{Cookie, SameSite},
};
use serde_json::json;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::{LoginRequest, OAuthTokenQuery, SignupRequest},
    state::AppState,
};

/// Name of the cookie holding the refresh token
pub const REFRESH_COOKIE: &str = "jwt";

fn refresh_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let max_age = state.sessions.jwt().refresh_token_expiry() as i64;
    let same_site: SameSite = state.config.server.cookie_same_site.into();

    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .secure(state.config.server.cookie_secure)
        .same_site(same_site)
        .path("/")
        .max_age(time::Duration::seconds(max_age))
        .build()
}

fn with_session(state: &AppState, jar: CookieJar, session: &IssuedSession) -> CookieJar {
    jar.add(refresh_cookie(state, session.refresh_token.clone()))
}

/// Authorization URL for a login or signup round-trip
pub async fn oauth_url(
    State(state): State<AppState>,
    WithRejection(Path(flow), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let flow: AuthFlow = flow.parse()?;
    let url = state.sessions.oauth_redirect_url(flow)?;

    Ok(Json(json!({ "url": url })))
}

/// Exchange the OAuth callback code for a session
pub async fn oauth_token(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Query(query), _): WithRejection<Query<OAuthTokenQuery>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Authorization code must be provided".to_string()))?;
    let flow: AuthFlow = query.flow.as_deref().unwrap_or("signup").parse()?;

    let session = state.sessions.sign_in_with_oauth(&code, flow).await?;
    let message = match flow {
        AuthFlow::Login => "account login successful",
        AuthFlow::Signup => "account created successfully",
    };

    Ok((
        with_session(&state, jar, &session),
        Json(json!({
            "name": session.user.name,
            "email": session.user.email,
            "accessToken": session.access_token,
            "message": message,
        })),
    ))
}

/// Create an email account
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<SignupRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let session = state
        .sessions
        .signup_with_password(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok((
        with_session(&state, jar, &session),
        Json(json!({
            "message": "account created successfully",
            "accessToken": session.access_token,
        })),
    ))
}

/// Sign in an email account
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let session = state
        .sessions
        .login_with_password(&payload.email, &payload.password)
        .await?;

    Ok((
        with_session(&state, jar, &session),
        Json(json!({
            "message": "account login successful",
            "accessToken": session.access_token,
        })),
    ))
}

/// Mint a new access token from the refresh cookie
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let token = jar.get(REFRESH_COOKIE).map(|cookie| cookie.value());
    let refreshed = state.sessions.refresh(token).await?;

    Ok(Json(json!({
        "name": refreshed.user.name,
        "email": refreshed.user.email,
        "accessToken": refreshed.access_token,
    })))
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    info!("Clearing session cookie");
    (
        jar.remove(Cookie::build(REFRESH_COOKIE).path("/")),
        Json(json!({ "message": "Logged out" })),
    )
}
