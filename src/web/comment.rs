use super::index::PageQuery;
use crate::comment::CommentForTemplate;
use crate::middleware::csrf::{validate_form, CsrfForm};
use crate::middleware::ClientCtx;
use crate::permission::Permission;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_reply)
        .service(create_reply)
        .service(disable_comment)
        .service(recover_comment);
}

#[derive(Deserialize, Validate)]
pub struct ReplyForm {
    csrf_token: String,
    #[validate(length(min = 1, message = "Replies cannot be empty."))]
    body: String,
}

impl CsrfForm for ReplyForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

#[derive(Template)]
#[template(path = "reply.html")]
pub struct ReplyTemplate {
    pub client: ClientCtx,
    pub parent: CommentForTemplate,
    pub page: i64,
}

fn post_url(post_id: i32, page: Option<i64>) -> String {
    format!(
        "/{}/{}?page={}",
        crate::post::RESOURCE_URL,
        post_id,
        page.unwrap_or(1)
    )
}

#[get("/reply/{comment_id}")]
pub async fn view_reply(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    client.require_login()?;
    client.require_permission(Permission::COMMENT)?;

    let db = db.get_ref();
    let parent = crate::comment::get_comment(db, path.into_inner().0)
        .await
        .map_err(super::db_error)?
        .ok_or_else(|| error::ErrorNotFound("Comment not found."))?;

    let author_nickname = crate::user::get_nicknames(db, vec![parent.author_id])
        .await
        .map_err(super::db_error)?
        .remove(&parent.author_id)
        .unwrap_or_else(|| crate::constants::GUEST_USERNAME.to_owned());

    Ok(ReplyTemplate {
        client,
        parent: CommentForTemplate {
            comment: parent,
            author_nickname,
        },
        page: query.requested().unwrap_or(1),
    }
    .to_response())
}

#[post("/reply/{comment_id}")]
pub async fn create_reply(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
    query: web::Query<PageQuery>,
    form: web::Form<ReplyForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    client.require_permission(Permission::COMMENT)?;
    validate_form(&cookies, &*form)?;

    let comment_id = path.into_inner().0;

    if let Err(errors) = form.validate() {
        super::flash_validation(&cookies, &errors);
        return Ok(super::redirect(&format!(
            "/reply/{}?page={}",
            comment_id,
            query.requested().unwrap_or(1)
        )));
    }

    let reply = crate::comment::create_reply(db.get_ref(), comment_id, user_id, &form.body)
        .await
        .map_err(super::db_error)?
        .ok_or_else(|| error::ErrorNotFound("Comment not found."))?;

    crate::flash::flash(&cookies, "Your reply has been published.");
    Ok(super::redirect(&post_url(reply.post_id, query.requested())))
}

async fn set_disabled(
    client: ClientCtx,
    db: &DatabaseConnection,
    comment_id: i32,
    page: Option<i64>,
    disabled: bool,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    client.require_permission(Permission::MODERATE_COMMENTS)?;

    let comment = crate::comment::set_disabled(db, comment_id, disabled)
        .await
        .map_err(super::db_error)?
        .ok_or_else(|| error::ErrorNotFound("Comment not found."))?;

    Ok(super::redirect(&post_url(comment.post_id, page)))
}

#[get("/delate/{comment_id}")]
pub async fn disable_comment(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    set_disabled(client, db.get_ref(), path.into_inner().0, query.requested(), true).await
}

#[get("/recover/{comment_id}")]
pub async fn recover_comment(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    set_disabled(client, db.get_ref(), path.into_inner().0, query.requested(), false).await
}
