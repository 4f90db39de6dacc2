use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

use crate::app::AppState;
use crate::error::ShopError;
use crate::session;
use crate::users::UserCredentials;

/// Serve the login page HTML
///
/// # Returns
/// * `Html<&'static str>` - The login page HTML
pub async fn serve_login_page() -> Html<&'static str> {
    Html(include_str!("./static/login.html"))
}

/// Serve the signup page HTML
///
/// # Returns
/// * `Html<&'static str>` - The signup page HTML
pub async fn serve_signup_page() -> Html<&'static str> {
    Html(include_str!("./static/signup.html"))
}

/// Handle user login requests
///
/// Validates the submitted credentials against the user store and creates a
/// session if they match.
///
/// # Arguments
/// * `state` - Application state holding the user store
/// * `jar` - Cookie jar for storing the session cookie
/// * `credentials` - Form data containing the username and password
///
/// # Returns
/// * `Response` - Redirect to the dashboard if successful, or error if not
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(credentials): Form<UserCredentials>,
) -> Response {
    match state
        .users
        .authenticate(&credentials.username, &credentials.password)
    {
        Ok(user) => {
            let token = session::create_session(&user);
            log::info!("user {} logged in", user.username);
            let cookie = Cookie::new("session", token);
            (jar.add(cookie), Redirect::to("/dashboard")).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Handle user registration
///
/// Creates a new user account from the signup form and redirects to the
/// login page.
///
/// # Arguments
/// * `state` - Application state holding the user store
/// * `credentials` - Form data containing the username and password
///
/// # Returns
/// * `Result<Redirect, ShopError>` - Redirect to login page or error
pub async fn handle_signup(
    State(state): State<Arc<AppState>>,
    Form(credentials): Form<UserCredentials>,
) -> Result<Redirect, ShopError> {
    let user = state
        .users
        .signup(&credentials.username, &credentials.password)?;
    log::info!("registered user {}", user.username);
    Ok(Redirect::to("/login?registered=true"))
}

/// Handle user logout
///
/// Destroys the server-side session, clears the session cookie, and
/// redirects to the login page.
///
/// # Arguments
/// * `jar` - Cookie jar containing the session cookie
///
/// # Returns
/// * `(CookieJar, Redirect)` - Modified cookie jar and redirect response
pub async fn handle_logout(jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get("session") {
        session::destroy_session(cookie.value());
    }

    let cookie = Cookie::new("session", "");
    (jar.add(cookie), Redirect::to("/login"))
}

/// Authentication middleware
///
/// Gate in front of every protected route: a valid session cookie yields a
/// request-scoped `AuthUser` in the request extensions; anything else is
/// redirected to the login page before the handler runs.
///
/// # Arguments
/// * `jar` - Cookie jar containing session information
/// * `request` - The incoming request
/// * `next` - Next middleware in the chain
///
/// # Returns
/// * `Response` - Either passes the request through or redirects to login
pub async fn require_auth(
    jar: CookieJar,
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    if let Some(session_cookie) = jar.get("session") {
        if let Some(auth_user) = session::validate_session(session_cookie.value()) {
            request.extensions_mut().insert(auth_user);
            return next.run(request).await;
        }
    }

    Redirect::to("/login").into_response()
}
