use crate::middleware::csrf::{validate_form, CsrfForm};
use crate::middleware::ClientCtx;
use crate::session::{start_session, verify_password};
use actix_session::Session;
use actix_web::{get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login).service(view_login);
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub client: ClientCtx,
    pub email: &'a str,
    pub next: &'a str,
}

#[derive(Deserialize, Validate)]
pub struct LoginForm {
    csrf_token: String,
    #[validate(email(message = "Enter a valid email address."))]
    email: String,
    #[validate(length(min = 1, message = "Enter your password."))]
    password: String,
    /// Checkbox; present only when ticked.
    remember_me: Option<String>,
    next: Option<String>,
}

impl CsrfForm for LoginForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

#[derive(Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginResultStatus {
    Success,
    BadEmail,
    BadPassword,
}

pub struct LoginResult {
    pub result: LoginResultStatus,
    pub user_id: Option<i32>,
}

impl LoginResult {
    fn success(user_id: i32) -> Self {
        Self {
            result: LoginResultStatus::Success,
            user_id: Some(user_id),
        }
    }
    fn fail(result: LoginResultStatus) -> Self {
        Self {
            result,
            user_id: None,
        }
    }
}

/// Checks credentials. Emails are matched case-insensitively.
pub async fn login(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<LoginResult, DbErr> {
    let user = match crate::user::find_by_email(db, email).await? {
        Some(user) => user,
        None => return Ok(LoginResult::fail(LoginResultStatus::BadEmail)),
    };

    if !verify_password(password, &user.password_hash) {
        return Ok(LoginResult::fail(LoginResultStatus::BadPassword));
    }

    Ok(LoginResult::success(user.id))
}

/// Only same-site absolute paths are followed after login.
pub fn is_local_path(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

#[post("/login")]
pub async fn post_login(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, Error> {
    validate_form(&cookies, &*form)?;

    let next = form.next.as_deref().unwrap_or("");
    let rerender = |client: ClientCtx| {
        LoginTemplate {
            client,
            email: &form.email,
            next,
        }
        .to_response()
    };

    if let Err(errors) = form.validate() {
        super::flash_validation(&cookies, &errors);
        return Ok(rerender(client));
    }

    let result = login(db.get_ref(), &form.email, &form.password)
        .await
        .map_err(super::db_error)?;

    let user_id = match (result.result, result.user_id) {
        (LoginResultStatus::Success, Some(user_id)) => user_id,
        (status, _) => {
            log::debug!("login failure: {:?} for {}", status, form.email);
            // Use generic message to avoid account enumeration
            crate::flash::flash(&cookies, "Invalid email or password.");
            return Ok(rerender(client));
        }
    };

    start_session(&cookies, user_id, form.remember_me.is_some())?;
    log::info!("user_id={} logged in", user_id);

    if is_local_path(next) {
        Ok(super::redirect(next))
    } else {
        Ok(super::redirect("/index"))
    }
}

#[get("/login")]
pub async fn view_login(
    client: ClientCtx,
    query: web::Query<NextQuery>,
) -> Result<impl Responder, Error> {
    Ok(LoginTemplate {
        client,
        email: "",
        next: query.next.as_deref().unwrap_or(""),
    }
    .to_response())
}
