use super::register::NICKNAME_RE;
use crate::middleware::csrf::{validate_form, CsrfForm};
use crate::middleware::ClientCtx;
use crate::user::{get_url_for_nickname, ProfileUpdate};
use actix_session::Session;
use actix_web::{get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_change_password)
        .service(post_change_password)
        .service(view_edit_profile)
        .service(post_edit_profile);
}

#[derive(Template)]
#[template(path = "change_password.html")]
pub struct ChangePasswordTemplate {
    pub client: ClientCtx,
}

#[derive(Deserialize, Validate)]
pub struct ChangePasswordForm {
    csrf_token: String,
    #[validate(length(min = 1, message = "Enter your current password."))]
    old_password: String,
    #[validate(length(min = 1, message = "Enter a new password."))]
    password: String,
    #[validate(must_match(other = "password", message = "Passwords must match."))]
    password2: String,
}

impl CsrfForm for ChangePasswordForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

#[derive(Template)]
#[template(path = "editprofile.html")]
pub struct EditProfileTemplate<'a> {
    pub client: ClientCtx,
    pub nickname: &'a str,
    pub about_me: &'a str,
}

#[derive(Deserialize, Validate)]
pub struct EditProfileForm {
    csrf_token: String,
    #[validate(
        length(min = 1, max = 64, message = "Nickname must be 1 to 64 characters."),
        regex(
            path = "NICKNAME_RE",
            message = "Nicknames must start with a letter and contain only letters, numbers, dots or underscores."
        )
    )]
    nickname: String,
    #[serde(default)]
    about_me: String,
}

impl CsrfForm for EditProfileForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

#[get("/changepassword")]
pub async fn view_change_password(client: ClientCtx) -> Result<impl Responder, Error> {
    client.require_login()?;
    Ok(ChangePasswordTemplate { client }.to_response())
}

#[post("/changepassword")]
pub async fn post_change_password(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    form: web::Form<ChangePasswordForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    validate_form(&cookies, &*form)?;

    if let Err(errors) = form.validate() {
        super::flash_validation(&cookies, &errors);
        return Ok(ChangePasswordTemplate { client }.to_response());
    }

    let changed =
        crate::user::change_password(db.get_ref(), user_id, &form.old_password, &form.password)
            .await
            .map_err(super::db_error)?;

    if !changed {
        crate::flash::flash(&cookies, "Invalid password.");
        return Ok(ChangePasswordTemplate { client }.to_response());
    }

    log::info!("user_id={} changed their password", user_id);
    crate::flash::flash(&cookies, "Your password has been updated.");
    Ok(super::redirect("/index"))
}

#[get("/editprofile")]
pub async fn view_edit_profile(client: ClientCtx) -> Result<impl Responder, Error> {
    client.require_login()?;
    let (nickname, about_me) = match client.get_user() {
        Some(user) => (user.nickname.clone(), user.get_about_me().to_owned()),
        None => (String::new(), String::new()),
    };

    Ok(EditProfileTemplate {
        client,
        nickname: &nickname,
        about_me: &about_me,
    }
    .to_response())
}

#[post("/editprofile")]
pub async fn post_edit_profile(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    form: web::Form<EditProfileForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    validate_form(&cookies, &*form)?;

    let rerender = |client: ClientCtx| {
        EditProfileTemplate {
            client,
            nickname: &form.nickname,
            about_me: &form.about_me,
        }
        .to_response()
    };

    if let Err(errors) = form.validate() {
        super::flash_validation(&cookies, &errors);
        return Ok(rerender(client));
    }

    let nickname = form.nickname.trim();
    let result = crate::user::update_profile(db.get_ref(), user_id, nickname, form.about_me.trim())
        .await
        .map_err(super::db_error)?;

    match result {
        ProfileUpdate::Updated => {
            crate::flash::flash(&cookies, "Your profile has been updated.");
            Ok(super::redirect(&get_url_for_nickname(nickname)))
        }
        ProfileUpdate::NicknameTaken => {
            crate::flash::flash(&cookies, "Nickname already in use.");
            Ok(rerender(client))
        }
    }
}
