//! Authentication middleware
//!
//! Session validation and staff-only access control for the admin routes

use axum::{
    extract::{Request, State},
    http::{header::ACCEPT, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use uuid::Uuid;

use crate::error::{AppError, ErrorDetail, ErrorResponse};
use crate::services::AuthService;
use crate::AppState;

/// Authenticated user information extracted from the session token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Whether the client is a browser asking for a page
fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|h| h.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}

/// Requires a valid session from a staff user.
///
/// The token is read from the `Authorization: Bearer` header, falling back
/// to the session cookie. Browsers without a valid session are sent to the
/// login page; API clients get a 401.
pub async fn admin_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer
        .map(|TypedHeader(Authorization(b))| b.token().to_string())
        .or_else(|| {
            jar.get(&state.config.session.cookie_name)
                .map(|c| c.value().to_string())
        });

    let html = wants_html(request.headers());

    let Some(token) = token else {
        if html {
            return Redirect::to("/").into_response();
        }
        return AppError::Unauthorized("Authentication required".to_string()).into_response();
    };

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let claims = match auth_service.validate_token(&token) {
        Ok(claims) => claims,
        Err(_) if html => return Redirect::to("/").into_response(),
        Err(e) => return e.into_response(),
    };

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return AppError::InvalidToken.into_response(),
    };

    if !claims.is_staff {
        tracing::debug!(%user_id, "Non-staff user denied admin access");
        return AppError::InsufficientPermissions.into_response();
    }

    request.extensions_mut().insert(AuthUser {
        user_id,
        username: claims.username,
        is_staff: claims.is_staff,
        is_superuser: claims.is_superuser,
    });

    next.run(request).await
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message: "Authentication required".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}
