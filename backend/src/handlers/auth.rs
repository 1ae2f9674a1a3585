//! Login page and session handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::error::AppError;
use crate::services::AuthService;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

const LOGIN_ERROR: &str = "Invalid credentials";

fn render_login_page(error: Option<&str>) -> String {
    let error_html = error
        .map(|msg| format!(r#"<p class="error">{}</p>"#, msg))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Log in | ERP</title>
</head>
<body>
  <h1>ERP administration</h1>
  {}
  <form method="post" action="/">
    <label for="username">Username</label>
    <input type="text" id="username" name="username" autofocus required>
    <label for="password">Password</label>
    <input type="password" id="password" name="password" required>
    <button type="submit">Log in</button>
  </form>
</body>
</html>
"#,
        error_html
    )
}

/// Render the login form
pub async fn login_page() -> Html<String> {
    Html(render_login_page(None))
}

/// Check credentials, set the session cookie and go to the admin index.
///
/// Failed logins re-render the form with a generic message.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let auth_service = AuthService::new(state.db.clone(), &state.config);

    match auth_service.login(&form.username, &form.password).await {
        Ok(session) => {
            let cookie = Cookie::build((state.config.session.cookie_name.clone(), session.access_token))
                .path("/")
                .http_only(true)
                .secure(state.config.session.secure)
                .same_site(SameSite::Lax);
            (jar.add(cookie), Redirect::to("/admin/")).into_response()
        }
        Err(AppError::InvalidCredentials) => {
            tracing::info!(username = %form.username, "Failed login attempt");
            (StatusCode::OK, Html(render_login_page(Some(LOGIN_ERROR)))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Clear the session cookie and return to the login page
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let cookie = Cookie::build((state.config.session.cookie_name.clone(), "")).path("/");
    (jar.remove(cookie), Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_page_has_form_fields() {
        let Html(body) = tokio_test::block_on(login_page());
        assert!(body.contains(r#"name="username""#));
        assert!(body.contains(r#"name="password""#));
        assert!(body.contains(r#"method="post""#));
        assert!(!body.contains(LOGIN_ERROR));
    }

    #[test]
    fn test_login_error_is_generic() {
        let body = render_login_page(Some(LOGIN_ERROR));
        assert!(body.contains("Invalid credentials"));
    }
}
