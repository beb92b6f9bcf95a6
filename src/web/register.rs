use crate::middleware::csrf::{validate_form, CsrfForm};
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::permission::{default_role, find_role_by_name, ROLE_ADMINISTRATOR};
use crate::user::normalize_email;
use actix_session::Session;
use actix_web::{get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, TransactionTrait};
use serde::Deserialize;
use validator::{Validate, ValidationError};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_register).service(post_register);
}

/// Letters first, then letters, digits, dots or underscores.
pub static NICKNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.]*$").expect("nickname pattern"));

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate<'a> {
    pub client: ClientCtx,
    pub email: &'a str,
    pub nickname: &'a str,
}

#[derive(Deserialize, Validate)]
#[validate(schema(function = "validate_confirmation"))]
pub struct RegisterForm {
    csrf_token: String,
    #[validate(
        length(min = 1, max = 64, message = "Email must be 1 to 64 characters."),
        email(message = "Enter a valid email address.")
    )]
    email: String,
    #[validate(
        length(min = 1, max = 64, message = "Nickname must be 1 to 64 characters."),
        regex(
            path = "NICKNAME_RE",
            message = "Nicknames must start with a letter and contain only letters, numbers, dots or underscores."
        )
    )]
    nickname: String,
    #[validate(length(min = 1, message = "Enter a password."))]
    password: String,
    /// Confirmation field. Only compared when the form sends it.
    password2: Option<String>,
}

fn validate_confirmation(form: &RegisterForm) -> Result<(), ValidationError> {
    match &form.password2 {
        Some(password2) if *password2 != form.password => {
            let mut error = ValidationError::new("must_match");
            error.message = Some("Passwords must match.".into());
            Err(error)
        }
        _ => Ok(()),
    }
}

impl CsrfForm for RegisterForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RegisterResult {
    Created(i32),
    EmailTaken,
    NicknameTaken,
}

/// Creates an account. The configured admin email gets the Administrator role,
/// everyone else the default role.
pub async fn register(
    db: &DatabaseConnection,
    email: &str,
    nickname: &str,
    password: &str,
) -> Result<RegisterResult, DbErr> {
    let email = normalize_email(email);
    let password_hash = crate::session::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?;

    let txn = db.begin().await?;

    let email_taken = users::Entity::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .count(&txn)
        .await?;
    if email_taken > 0 {
        return Ok(RegisterResult::EmailTaken);
    }

    let nickname_taken = users::Entity::find()
        .filter(users::Column::Nickname.eq(nickname))
        .count(&txn)
        .await?;
    if nickname_taken > 0 {
        return Ok(RegisterResult::NicknameTaken);
    }

    let admin_email = normalize_email(&crate::app_config::admin().email);
    let role = if !admin_email.is_empty() && admin_email == email {
        match find_role_by_name(&txn, ROLE_ADMINISTRATOR).await? {
            Some(role) => role,
            None => default_role(&txn).await?,
        }
    } else {
        default_role(&txn).await?
    };

    let now = Utc::now().naive_utc();
    let user = users::ActiveModel {
        email: Set(email),
        nickname: Set(nickname.to_owned()),
        password_hash: Set(password_hash),
        role_id: Set(role.id),
        about_me: Set(None),
        member_since: Set(now),
        last_seen: Set(now),
        confirmed: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    log::info!(
        "registered user_id={} nickname={} role={}",
        user.id,
        user.nickname,
        role.name
    );
    Ok(RegisterResult::Created(user.id))
}

#[get("/register")]
pub async fn view_register(client: ClientCtx) -> Result<impl Responder, Error> {
    Ok(RegisterTemplate {
        client,
        email: "",
        nickname: "",
    }
    .to_response())
}

#[post("/register")]
pub async fn post_register(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, Error> {
    validate_form(&cookies, &*form)?;

    let rerender = |client: ClientCtx| {
        RegisterTemplate {
            client,
            email: &form.email,
            nickname: &form.nickname,
        }
        .to_response()
    };

    if let Err(errors) = form.validate() {
        super::flash_validation(&cookies, &errors);
        return Ok(rerender(client));
    }

    let result = register(db.get_ref(), &form.email, &form.nickname, &form.password)
        .await
        .map_err(super::db_error)?;

    match result {
        RegisterResult::Created(_) => {
            crate::flash::flash(&cookies, "You can now login.");
            Ok(super::redirect("/login"))
        }
        RegisterResult::EmailTaken => {
            crate::flash::flash(&cookies, "Email already registered.");
            Ok(rerender(client))
        }
        RegisterResult::NicknameTaken => {
            crate::flash::flash(&cookies, "Nickname already in use.");
            Ok(rerender(client))
        }
    }
}
