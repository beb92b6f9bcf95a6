use super::index::PageQuery;
use crate::middleware::csrf::{validate_form, CsrfForm};
use crate::middleware::ClientCtx;
use crate::post::{PostForTemplate, PostPage};
use crate::template::{Paginator, PaginatorToHtml};
use actix_session::Session;
use actix_web::{get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_search)
        .service(post_search)
        .service(view_search_results);
}

#[derive(Deserialize)]
pub struct SearchForm {
    csrf_token: String,
    #[serde(default)]
    search: String,
}

impl CsrfForm for SearchForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

#[derive(Template)]
#[template(path = "search_results.html")]
pub struct SearchResultsTemplate<'a> {
    pub client: ClientCtx,
    pub query: &'a str,
    pub posts: Vec<PostForTemplate>,
    pub paginator: Paginator,
}

/// Where a search submission lands. Blank queries go back to the index.
pub fn search_location(query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        "/index".to_owned()
    } else {
        format!("/search_results/{}", urlencoding::encode(query))
    }
}

/// The search box posts here; there is nothing to show on GET.
#[get("/search")]
pub async fn view_search() -> HttpResponse {
    super::redirect("/index")
}

#[post("/search")]
pub async fn post_search(
    cookies: Session,
    form: web::Form<SearchForm>,
) -> Result<HttpResponse, Error> {
    validate_form(&cookies, &*form)?;
    Ok(super::redirect(&search_location(&form.search)))
}

#[get("/search_results/{query}")]
pub async fn view_search_results(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String,)>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    let search = path.into_inner().0;
    let per_page = crate::app_config::pagination().posts_per_page as usize;

    let PostPage {
        posts,
        page,
        page_count,
    } = crate::post::search(db.get_ref(), &search, query.page(), per_page)
        .await
        .map_err(super::db_error)?;

    log::debug!("search {:?} matched page {} of {}", search, page, page_count);

    Ok(SearchResultsTemplate {
        paginator: Paginator::new(search_location(&search), page, page_count),
        client,
        query: &search,
        posts,
    }
    .to_response())
}
