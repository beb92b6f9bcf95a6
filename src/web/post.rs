use super::index::PageQuery;
use crate::comment::{CommentForTemplate, CommentPage};
use crate::middleware::csrf::{validate_form, CsrfForm};
use crate::middleware::ClientCtx;
use crate::permission::Permission;
use crate::post::PostForTemplate;
use crate::template::{Paginator, PaginatorToHtml};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_write)
        .service(create_post)
        .service(view_post)
        .service(create_comment)
        .service(edit_post)
        .service(update_post);
}

#[derive(Deserialize, Validate)]
pub struct PostForm {
    csrf_token: String,
    #[validate(length(min = 1, max = 128, message = "Title must be 1 to 128 characters."))]
    title: String,
    #[validate(length(min = 1, message = "Write something first."))]
    body: String,
}

impl CsrfForm for PostForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

#[derive(Deserialize, Validate)]
pub struct CommentForm {
    csrf_token: String,
    #[validate(length(min = 1, message = "Comments cannot be empty."))]
    body: String,
}

impl CsrfForm for CommentForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

#[derive(Template)]
#[template(path = "write.html")]
pub struct WriteTemplate<'a> {
    pub client: ClientCtx,
    pub title: &'a str,
    pub body: &'a str,
}

#[derive(Template)]
#[template(path = "editpost.html")]
pub struct EditPostTemplate<'a> {
    pub client: ClientCtx,
    pub post_id: i32,
    pub title: &'a str,
    pub body: &'a str,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub client: ClientCtx,
    pub post: PostForTemplate,
    pub comments: Vec<CommentForTemplate>,
    pub paginator: Paginator,
    pub can_edit: bool,
}

async fn get_post_or_404(
    db: &DatabaseConnection,
    id: i32,
) -> Result<crate::orm::posts::Model, Error> {
    crate::post::get_post(db, id)
        .await
        .map_err(super::db_error)?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))
}

#[get("/write")]
pub async fn view_write(client: ClientCtx) -> Result<impl Responder, Error> {
    client.require_login()?;
    client.require_permission(Permission::WRITE_ARTICLES)?;

    Ok(WriteTemplate {
        client,
        title: "",
        body: "",
    }
    .to_response())
}

#[post("/write")]
pub async fn create_post(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    client.require_permission(Permission::WRITE_ARTICLES)?;
    validate_form(&cookies, &*form)?;

    if let Err(errors) = form.validate() {
        super::flash_validation(&cookies, &errors);
        return Ok(WriteTemplate {
            client,
            title: &form.title,
            body: &form.body,
        }
        .to_response());
    }

    let post = crate::post::create_post(db.get_ref(), user_id, &form.title, &form.body)
        .await
        .map_err(super::db_error)?;

    crate::flash::flash(&cookies, "Your post has been published.");
    Ok(super::redirect(&format!(
        "/{}/{}",
        crate::post::RESOURCE_URL,
        post.id
    )))
}

/// Renders a post with one page of its comments. Does not count a view.
async fn render_post(
    client: ClientCtx,
    db: &DatabaseConnection,
    post: crate::orm::posts::Model,
    requested_page: i64,
) -> Result<HttpResponse, Error> {
    let post_id = post.id;
    let post = crate::post::with_authors(db, vec![post])
        .await
        .map_err(super::db_error)?
        .pop()
        .ok_or_else(|| error::ErrorNotFound("Post not found."))?;

    let per_page = crate::app_config::pagination().comments_per_page as usize;
    let CommentPage {
        comments,
        page,
        page_count,
    } = crate::comment::list_page(db, post_id, requested_page, per_page, client.can_moderate())
        .await
        .map_err(super::db_error)?;

    Ok(PostTemplate {
        can_edit: client.can_edit_post(post.post.author_id),
        paginator: Paginator::new(post.get_url(), page, page_count),
        client,
        post,
        comments,
    }
    .to_response())
}

#[get("/post/{post_id}")]
pub async fn view_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    let post_id = path.into_inner().0;
    let db = db.get_ref();

    let mut post = get_post_or_404(db, post_id).await?;
    crate::post::increment_view(db, post_id)
        .await
        .map_err(super::db_error)?;
    post.view_num += 1;

    render_post(client, db, post, query.requested().unwrap_or(1)).await
}

#[post("/post/{post_id}")]
pub async fn create_comment(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    client.require_permission(Permission::COMMENT)?;
    validate_form(&cookies, &*form)?;

    let post_id = path.into_inner().0;
    let post = get_post_or_404(db.get_ref(), post_id).await?;
    let post_url = format!("/{}/{}", crate::post::RESOURCE_URL, post.id);

    if let Err(errors) = form.validate() {
        super::flash_validation(&cookies, &errors);
        return render_post(client, db.get_ref(), post, 1).await;
    }

    crate::comment::create_comment(db.get_ref(), post.id, user_id, &form.body)
        .await
        .map_err(super::db_error)?;

    crate::flash::flash(&cookies, "Your comment has been published.");
    Ok(super::redirect(&format!(
        "{}?page={}",
        post_url,
        crate::constants::LAST_PAGE
    )))
}

#[get("/edit/{post_id}")]
pub async fn edit_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
) -> Result<impl Responder, Error> {
    client.require_login()?;
    let post = get_post_or_404(db.get_ref(), path.into_inner().0).await?;

    if !client.can_edit_post(post.author_id) {
        return Err(error::ErrorForbidden("You cannot edit this post."));
    }

    Ok(EditPostTemplate {
        client,
        post_id: post.id,
        title: &post.title,
        body: &post.body,
    }
    .to_response())
}

#[post("/edit/{post_id}")]
pub async fn update_post(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let post = get_post_or_404(db.get_ref(), path.into_inner().0).await?;

    if !client.can_edit_post(post.author_id) {
        return Err(error::ErrorForbidden("You cannot edit this post."));
    }

    validate_form(&cookies, &*form)?;

    if let Err(errors) = form.validate() {
        super::flash_validation(&cookies, &errors);
        return Ok(EditPostTemplate {
            client,
            post_id: post.id,
            title: &form.title,
            body: &form.body,
        }
        .to_response());
    }

    crate::post::update_post(db.get_ref(), post.id, &form.title, &form.body)
        .await
        .map_err(super::db_error)?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))?;

    log::info!("user_id={:?} edited post_id={}", client.get_id(), post.id);
    crate::flash::flash(&cookies, "The post has been updated.");
    Ok(super::redirect(&format!(
        "/{}/{}",
        crate::post::RESOURCE_URL,
        post.id
    )))
}
