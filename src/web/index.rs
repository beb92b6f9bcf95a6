use crate::middleware::ClientCtx;
use crate::post::{PostForTemplate, PostPage};
use crate::template::{Paginator, PaginatorToHtml};
use actix_web::{get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_root).service(view_index);
}

/// `?page=N` on listing routes. A missing or malformed value means page 1.
#[derive(Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// The page as sent, if it parses as an integer.
    pub fn requested(&self) -> Option<i64> {
        self.page.as_deref().and_then(|p| p.trim().parse().ok())
    }

    pub fn page(&self) -> usize {
        self.requested().unwrap_or(1).max(1) as usize
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub client: ClientCtx,
    pub posts: Vec<PostForTemplate>,
    pub paginator: Paginator,
}

async fn render_index(
    client: ClientCtx,
    db: &DatabaseConnection,
    page: usize,
) -> Result<impl Responder, Error> {
    let per_page = crate::app_config::pagination().posts_per_page as usize;
    let PostPage {
        posts,
        page,
        page_count,
    } = crate::post::list_page(db, page, per_page)
        .await
        .map_err(super::db_error)?;

    Ok(IndexTemplate {
        client,
        posts,
        paginator: Paginator::new("/index", page, page_count),
    }
    .to_response())
}

#[get("/")]
pub async fn view_root(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    render_index(client, db.get_ref(), query.page()).await
}

#[get("/index")]
pub async fn view_index(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    render_index(client, db.get_ref(), query.page()).await
}
