use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service_core::authz::headers::SESSION_COOKIE_NAME;
use service_core::error::AppError;
use service_core::extract::ValidatedJson;

use crate::dtos::{
    LoginRequest, LoginResponse, LogoutRequest, LogoutResponse, WhoamiRequest, WhoamiResponse,
};
use crate::services::CheckRequest;
use crate::utils::Password;
use crate::AppState;

/// `POST /auth.v1.AuthService/Login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let outcome = state
        .auth
        .login(&req.login, Password::new(req.password))
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE_NAME, outcome.session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.session.secure_cookie);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            session_id: outcome.session_id,
            expires_at: outcome.expires_at,
        }),
    ))
}

/// `POST /auth.v1.AuthService/Logout`
///
/// The body is optional; without a `session_id` the session is taken from the
/// `sid` header or the session cookie.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(CookieJar, Json<LogoutResponse>), AppError> {
    let req: LogoutRequest = if body.iter().all(u8::is_ascii_whitespace) {
        LogoutRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Json parse error: {}", e)))?
    };

    let session_id = req
        .session_id
        .or_else(|| CheckRequest::from_header_map(&headers).session_id())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing session id")))?;

    state.auth.logout(session_id).await?;

    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/")),
        Json(LogoutResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// `POST /auth.v1.AuthService/Whoami`
pub async fn whoami(
    State(state): State<AppState>,
    Json(req): Json<WhoamiRequest>,
) -> Result<Json<WhoamiResponse>, AppError> {
    let identity = state.resolver.resolve(req.session_id).await?;
    Ok(Json(identity.into()))
}
