use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::info;

use agora_client::ApiError;
use agora_types::api::{
    LoginRequest, RegisterRequest, ResendVerificationRequest, VerifyEmailRequest,
};

use crate::error::PageResult;
use crate::guard::percent_encode;
use crate::render::{self, escape};
use crate::session::{clear_session_cookies, session_from_jar, set_session_cookies};
use crate::state::AppState;
use crate::validate;

#[derive(Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub redirect: Option<String>,
}

pub async fn login_form(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(render_login(query.redirect.as_deref(), "", None))
}

/// Handle the sign-in form. Bad credentials re-render inline; an account
/// whose email is unverified is routed to verification without a session.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> PageResult<Response> {
    let req = LoginRequest { email: form.email.trim().to_string(), password: form.password };

    let auth = match state.api().login(&req).await {
        Ok(auth) => auth,
        Err(ApiError::RequestFailed { message, .. }) => {
            return Ok(Html(render_login(form.redirect.as_deref(), &req.email, Some(&message)))
                .into_response());
        }
        Err(ApiError::AuthRequired) => {
            return Ok(Html(render_login(
                form.redirect.as_deref(),
                &req.email,
                Some("Invalid email or password"),
            ))
            .into_response());
        }
        Err(err) => return Err(err.into()),
    };

    if !auth.email_verified {
        // No session until the address is confirmed
        return Ok(
            Redirect::to(&format!("/verify-email?email={}", percent_encode(&req.email)))
                .into_response(),
        );
    }

    info!("{} ({}) signed in", auth.username, auth.user_id);
    let jar = set_session_cookies(jar, &auth);
    let target = form
        .redirect
        .filter(|r| r.starts_with('/') && !r.starts_with("//"))
        .unwrap_or_else(|| auth.role.home_path().to_string());
    Ok((jar, Redirect::to(&target)).into_response())
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

pub async fn register_form() -> Html<String> {
    Html(render_register(&RegisterForm {
        username: String::new(),
        display_name: String::new(),
        email: String::new(),
        password: String::new(),
        confirm_password: String::new(),
    }, &[]))
}

pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> PageResult<Response> {
    let errors = validate::validate_registration(
        &form.username,
        &form.email,
        &form.password,
        &form.confirm_password,
    );
    if !errors.is_empty() {
        return Ok(Html(render_register(&form, &errors)).into_response());
    }

    let display_name = if form.display_name.trim().is_empty() {
        form.username.trim().to_string()
    } else {
        form.display_name.trim().to_string()
    };
    let req = RegisterRequest {
        username: form.username.trim().to_string(),
        display_name,
        email: form.email.trim().to_string(),
        password: form.password.clone(),
    };

    match state.api().register(&req).await {
        Ok(auth) => {
            info!("{} ({}) registered", auth.username, auth.user_id);
            Ok(
                Redirect::to(&format!("/verify-email?email={}", percent_encode(&req.email)))
                    .into_response(),
            )
        }
        Err(ApiError::RequestFailed { message, .. }) => {
            let mut body = render::banner(&message);
            body.push_str(&register_form_html(&form));
            Ok(Html(render::layout("Register", None, &body)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Deserialize)]
pub struct VerifyQuery {
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyForm {
    pub email: String,
    pub code: String,
}

pub async fn verify_form(Query(query): Query<VerifyQuery>) -> Html<String> {
    Html(render_verify(query.email.as_deref().unwrap_or(""), None))
}

/// Confirm the emailed code. Success logs the user in with the fresh token.
pub async fn verify(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<VerifyForm>,
) -> PageResult<Response> {
    let req = VerifyEmailRequest {
        email: form.email.trim().to_string(),
        code: form.code.trim().to_string(),
    };

    match state.api().verify_email(&req).await {
        Ok(auth) => {
            info!("{} ({}) verified their email", auth.username, auth.user_id);
            let jar = set_session_cookies(jar, &auth);
            Ok((jar, Redirect::to(auth.role.home_path())).into_response())
        }
        Err(ApiError::RequestFailed { message, .. }) => {
            Ok(Html(render_verify(&req.email, Some(&message))).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Deserialize)]
pub struct ResendForm {
    pub email: String,
}

pub async fn resend_verification(
    State(state): State<AppState>,
    Form(form): Form<ResendForm>,
) -> PageResult<Redirect> {
    let email = form.email.trim().to_string();
    state
        .api()
        .resend_verification(&ResendVerificationRequest { email: email.clone() })
        .await?;
    Ok(Redirect::to(&format!("/verify-email?email={}", percent_encode(&email))))
}

/// Tear down the session: close the realtime channel, then drop the cookies.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(session) = session_from_jar(&jar) {
        info!("{} ({}) signed out", session.username, session.user_id);
        state.registry.remove(session.user_id).await;
    }
    let jar = clear_session_cookies(jar);
    (jar, Redirect::to("/")).into_response()
}

// -- form rendering --

fn render_login(redirect: Option<&str>, email: &str, error: Option<&str>) -> String {
    let mut body = String::from("<h1>Sign in</h1>");
    if let Some(message) = error {
        body.push_str(&render::banner(message));
    }
    let redirect_field = match redirect {
        Some(r) => format!(r#"<input type="hidden" name="redirect" value="{}">"#, escape(r)),
        None => String::new(),
    };
    body.push_str(&format!(
        r#"<form method="post" action="/login">
{redirect_field}
<label>Email <input type="email" name="email" value="{email}" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Sign in</button>
</form>
<p>No account? <a href="/register">Register</a></p>"#,
        email = escape(email),
    ));
    render::layout("Sign in", None, &body)
}

fn render_register(form: &RegisterForm, errors: &[validate::FieldError]) -> String {
    let mut body = String::from("<h1>Register</h1>");
    for e in errors {
        body.push_str(&render::banner(&e.message));
    }
    body.push_str(&register_form_html(form));
    render::layout("Register", None, &body)
}

fn register_form_html(form: &RegisterForm) -> String {
    format!(
        r#"<form method="post" action="/register">
<label>Username <input name="username" value="{username}" required></label>
<label>Display name <input name="display_name" value="{display_name}"></label>
<label>Email <input type="email" name="email" value="{email}" required></label>
<label>Password <input type="password" name="password" required></label>
<label>Confirm password <input type="password" name="confirm_password" required></label>
<button type="submit">Create account</button>
</form>"#,
        username = escape(&form.username),
        display_name = escape(&form.display_name),
        email = escape(&form.email),
    )
}

fn render_verify(email: &str, error: Option<&str>) -> String {
    let mut body = String::from(
        "<h1>Verify your email</h1><p>Enter the code we sent to your address.</p>",
    );
    if let Some(message) = error {
        body.push_str(&render::banner(message));
    }
    body.push_str(&format!(
        r#"<form method="post" action="/verify-email">
<label>Email <input type="email" name="email" value="{email}" required></label>
<label>Code <input name="code" required autocomplete="one-time-code"></label>
<button type="submit">Verify</button>
</form>
<form method="post" action="/resend-verification">
<input type="hidden" name="email" value="{email}">
<button type="submit">Resend code</button>
</form>"#,
        email = escape(email),
    ));
    render::layout("Verify email", None, &body)
}
