// Authentication HTTP routes
// Decision: Use the /api/auth/* paths the frontend already calls
// Decision: Failed sign-ins all look the same to the client: /auth/error?error=AccessDenied or a 401 AccessDenied body

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tuukaa_gateway_core::{Credentials, Provider, RequestContext, Role, SignedSession, Verdict};

use super::{
    middleware::{login_redirect_url, AuthRejection, OptionalSessionUser, SESSION_COOKIE},
    AuthState,
};

/// Landing page after sign-in when no usable callbackUrl was given
const DEFAULT_CALLBACK: &str = "/embed-admin";
/// Error page the frontend renders for denied sign-ins
pub const ACCESS_DENIED_URL: &str = "/auth/error?error=AccessDenied";
const SIGNED_OUT_URL: &str = "/login";

const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_CALLBACK_COOKIE: &str = "oauth_callback";
const OAUTH_COOKIE_PATH: &str = "/api/auth";
const OAUTH_COOKIE_MAX_AGE_SECS: i64 = 10 * 60;

/// Headers set on forward-auth responses for the upstream application
pub const USER_ID_HEADER: &str = "x-auth-user-id";
pub const ROLE_HEADER: &str = "x-auth-role";

/// Generate a random state string for OAuth (32 hex characters)
fn generate_oauth_state() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

/// Sign-in query parameters
#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// OAuth callback query parameters
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Portfolio login request
#[derive(Debug, Deserialize)]
pub struct PortfolioLoginRequest {
    pub username: String,
    pub password: String,
    #[serde(rename = "callbackUrl", default)]
    pub callback_url: Option<String>,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub url: String,
}

/// Sign-out response
#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub url: String,
}

/// Available sign-in methods
#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub google: bool,
    pub portfolio: bool,
}

/// Session info response
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: SessionUserInfo,
    pub expires: String,
}

#[derive(Debug, Serialize)]
pub struct SessionUserInfo {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
}

/// Admin login page access check request
#[derive(Debug, Deserialize)]
pub struct VerifyAccessRequest {
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyAccessResponse {
    pub authorized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/api/auth/providers", get(get_providers))
        .route("/api/auth/signin/google", get(google_signin))
        .route("/api/auth/callback/google", get(google_callback))
        .route("/api/auth/callback/portfolio", post(portfolio_login))
        .route("/api/auth/signout", post(signout))
        .route("/api/auth/session", get(get_session))
        .route("/api/auth/verify", get(verify_request))
        .route("/api/verify-admin-access", post(verify_admin_access))
        .with_state(state)
}

/// GET /api/auth/providers - Sign-in methods that can currently succeed
pub async fn get_providers(State(state): State<AuthState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        google: state.gateway.provider_enabled(Provider::Google),
        portfolio: state.gateway.provider_enabled(Provider::Portfolio),
    })
}

/// GET /api/auth/signin/google - Redirect to the Google consent screen
pub async fn google_signin(
    State(state): State<AuthState>,
    Query(query): Query<SignInQuery>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let google = match state.config.google.as_ref() {
        Some(google) if state.gateway.provider_enabled(Provider::Google) => google,
        _ => {
            tracing::error!(
                google_configured = state.config.google.is_some(),
                admin_emails = state.gateway.allowlist().len(),
                "google sign-in requested but unavailable"
            );
            return (jar, Redirect::to(ACCESS_DENIED_URL));
        }
    };

    let oauth_state = generate_oauth_state();
    let auth_url = match google.authorization_url(&oauth_state) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, "failed to build google authorization url");
            return (jar, Redirect::to(ACCESS_DENIED_URL));
        }
    };

    let callback = safe_callback(query.callback_url.as_deref());
    let secure = state.config.secure_cookies();
    let jar = jar
        .add(oauth_cookie(OAUTH_STATE_COOKIE, oauth_state, secure))
        .add(oauth_cookie(OAUTH_CALLBACK_COOKIE, hex::encode(callback), secure));

    (jar, Redirect::to(auth_url.as_str()))
}

/// GET /api/auth/callback/google - OAuth callback
pub async fn google_callback(
    State(state): State<AuthState>,
    Query(query): Query<OAuthCallbackQuery>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let callback = jar
        .get(OAUTH_CALLBACK_COOKIE)
        .and_then(|c| hex::decode(c.value()).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok());
    let callback = safe_callback(callback.as_deref());

    // The state cookies are single use
    let jar = jar
        .remove(Cookie::build(OAUTH_STATE_COOKIE).path(OAUTH_COOKIE_PATH))
        .remove(Cookie::build(OAUTH_CALLBACK_COOKIE).path(OAUTH_COOKIE_PATH));

    if let Some(error) = query.error {
        tracing::info!(error = %error, "google returned an oauth error");
        return (jar, Redirect::to(ACCESS_DENIED_URL));
    }

    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        tracing::info!("oauth callback without code or state");
        return (jar, Redirect::to(ACCESS_DENIED_URL));
    };

    if expected_state.as_deref() != Some(returned_state.as_str()) {
        tracing::warn!("oauth state mismatch, possible CSRF");
        return (jar, Redirect::to(ACCESS_DENIED_URL));
    }

    match state
        .gateway
        .sign_in(&Credentials::Google { code }, Utc::now())
        .await
    {
        Ok(signed) => {
            let jar = jar.add(session_cookie(&signed, state.config.secure_cookies()));
            (jar, Redirect::to(&callback))
        }
        Err(_) => (jar, Redirect::to(ACCESS_DENIED_URL)),
    }
}

/// POST /api/auth/callback/portfolio - Login with the portfolio account
pub async fn portfolio_login(
    State(state): State<AuthState>,
    jar: CookieJar,
    body: Result<Json<PortfolioLoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), AuthRejection> {
    let Json(req) = body.map_err(|e| {
        tracing::debug!(error = %e, "malformed portfolio login body");
        AuthRejection::access_denied()
    })?;

    let credentials = Credentials::Portfolio {
        username: req.username,
        password: req.password,
    };
    let signed = state
        .gateway
        .sign_in(&credentials, Utc::now())
        .await
        .map_err(AuthRejection::from)?;

    let jar = jar.add(session_cookie(&signed, state.config.secure_cookies()));

    Ok((
        jar,
        Json(LoginResponse {
            ok: true,
            url: safe_callback(req.callback_url.as_deref()),
        }),
    ))
}

/// POST /api/auth/signout - Clear the session cookie
pub async fn signout(jar: CookieJar) -> (CookieJar, Json<SignOutResponse>) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(SignOutResponse {
            url: SIGNED_OUT_URL.to_string(),
        }),
    )
}

/// GET /api/auth/session - Current session, or null
pub async fn get_session(
    OptionalSessionUser(session): OptionalSessionUser,
) -> Json<Option<SessionResponse>> {
    Json(session.map(|token| SessionResponse {
        user: SessionUserInfo {
            id: token.identity.id,
            name: token.identity.display_name,
            email: token.identity.email,
            role: token.role,
        },
        expires: token.expires_at.to_rfc3339(),
    }))
}

/// GET /api/auth/verify - Forward-auth check for an edge proxy.
/// The original request URI comes from `X-Forwarded-Uri`.
pub async fn verify_request(
    State(state): State<AuthState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let uri = headers
        .get("x-forwarded-uri")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<Uri>().ok())
        .unwrap_or_else(|| Uri::from_static("/"));

    let decision = state.gateway.authorize(&RequestContext::new(
        uri.path(),
        jar.get(SESSION_COOKIE).map(|c| c.value()),
    ));

    match decision.verdict {
        Verdict::Redirect(login_path) => {
            Redirect::temporary(&login_redirect_url(&login_path, &uri)).into_response()
        }
        Verdict::Allow | Verdict::AllowAlways => {
            let mut response = StatusCode::OK.into_response();
            if let Some(session) = decision.session {
                let headers = response.headers_mut();
                if let Ok(id) = HeaderValue::from_str(&session.identity.id) {
                    headers.insert(USER_ID_HEADER, id);
                }
                headers.insert(ROLE_HEADER, HeaderValue::from_static(session.role.as_str()));
            }
            response
        }
    }
}

/// POST /api/verify-admin-access - Check the key guarding the admin login page
pub async fn verify_admin_access(
    State(state): State<AuthState>,
    body: Result<Json<VerifyAccessRequest>, JsonRejection>,
) -> (StatusCode, Json<VerifyAccessResponse>) {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => {
            tracing::debug!(error = %e, "malformed admin access request");
            return (
                StatusCode::BAD_REQUEST,
                Json(VerifyAccessResponse {
                    authorized: false,
                    error: Some("Invalid request"),
                }),
            );
        }
    };

    // Unset key means the page is open; logged at startup
    let authorized = match state.config.admin_login_access_key.as_deref() {
        None => true,
        Some(expected) => req.key.as_deref() == Some(expected),
    };

    let status = if authorized {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    };
    (
        status,
        Json(VerifyAccessResponse {
            authorized,
            error: None,
        }),
    )
}

/// Accept only same-origin relative paths as post-login destinations
fn safe_callback(raw: Option<&str>) -> String {
    match raw {
        Some(url)
            if url.starts_with('/')
                && !url.starts_with("//")
                && !url.starts_with("/\\")
                && url.bytes().all(|b| b.is_ascii_graphic()) =>
        {
            url.to_string()
        }
        _ => DEFAULT_CALLBACK.to_string(),
    }
}

/// Helper: session cookie for a freshly signed session, living as long as the token
fn session_cookie(signed: &SignedSession, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, signed.encoded.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(
            signed.token.remaining_secs(signed.token.issued_at),
        ))
        .build()
}

/// Helper: short-lived cookie carrying OAuth round-trip state
fn oauth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(OAUTH_COOKIE_PATH)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(OAUTH_COOKIE_MAX_AGE_SECS))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_callback() {
        assert_eq!(safe_callback(Some("/chat-test")), "/chat-test");
        assert_eq!(
            safe_callback(Some("/embed-admin/settings?tab=1")),
            "/embed-admin/settings?tab=1"
        );

        for bad in [
            None,
            Some(""),
            Some("https://evil.example.com"),
            Some("//evil.example.com"),
            Some("/\\evil.example.com"),
            Some("/path with space"),
            Some("/line\nbreak"),
            Some("relative/path"),
        ] {
            assert_eq!(safe_callback(bad), DEFAULT_CALLBACK, "{bad:?}");
        }
    }

    #[test]
    fn test_generate_oauth_state() {
        let a = generate_oauth_state();
        let b = generate_oauth_state();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
