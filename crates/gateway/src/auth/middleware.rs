// Route guard middleware and session extractors
// Decision: Redirect verdicts become 307 to the login page with a callbackUrl back to the original request
// Decision: Every auth failure reaches the client as the same AccessDenied body

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::Serialize;
use tuukaa_gateway_core::{AuthError, RequestContext, SessionToken, Verdict};

use super::AuthState;

/// Cookie carrying the signed session token
pub const SESSION_COOKIE: &str = "session_token";

/// Authentication error
#[derive(Debug, Clone, Serialize)]
pub struct AuthRejection {
    pub error: &'static str,
    #[serde(skip)]
    pub status: StatusCode,
}

impl AuthRejection {
    pub fn access_denied() -> Self {
        Self {
            error: "AccessDenied",
            status: StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<AuthError> for AuthRejection {
    fn from(error: AuthError) -> Self {
        Self {
            error: error.public_code(),
            status: StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Session the guard decoded for this request; absent sessions are `None`
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<SessionToken>);

/// Apply the route guard to every request
pub async fn route_guard(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let decision = state.gateway.authorize(&RequestContext::new(
        request.uri().path(),
        jar.get(SESSION_COOKIE).map(|c| c.value()),
    ));

    match decision.verdict {
        Verdict::Redirect(login_path) => {
            let target = login_redirect_url(&login_path, request.uri());
            Redirect::temporary(&target).into_response()
        }
        Verdict::Allow | Verdict::AllowAlways => {
            request
                .extensions_mut()
                .insert(CurrentSession(decision.session));
            next.run(request).await
        }
    }
}

/// `/login?callbackUrl=<original path and query>`
pub fn login_redirect_url(login_path: &str, original: &Uri) -> String {
    let callback = original
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("callbackUrl", callback)
        .finish();
    format!("{}?{}", login_path, query)
}

/// Session for this request, reusing what the guard already decoded
fn extract_session(parts: &Parts, auth_state: &AuthState) -> Option<SessionToken> {
    if let Some(CurrentSession(session)) = parts.extensions.get::<CurrentSession>() {
        return session.clone();
    }

    let jar = CookieJar::from_headers(&parts.headers);
    auth_state
        .gateway
        .session(jar.get(SESSION_COOKIE).map(|c| c.value()), Utc::now())
}

/// Optional session extractor - `None` when not signed in
#[derive(Debug, Clone)]
pub struct OptionalSessionUser(pub Option<SessionToken>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalSessionUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        Ok(OptionalSessionUser(extract_session(parts, &auth_state)))
    }
}
