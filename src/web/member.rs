use super::index::PageQuery;
use crate::middleware::ClientCtx;
use crate::post::{PostForTemplate, PostPage};
use crate::template::{Paginator, PaginatorToHtml};
use crate::user::Profile as UserProfile;
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_member);
}

/// Follow counts shown on a profile.
#[derive(Debug, Clone)]
pub struct FollowStatistics {
    pub followers: usize,
    pub followed: usize,
}

#[get("/user/{nickname}")]
pub async fn view_member(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String,)>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    #[derive(Template)]
    #[template(path = "user.html")]
    pub struct MemberTemplate {
        pub client: ClientCtx,
        pub user: UserProfile,
        pub stats: FollowStatistics,
        pub is_self: bool,
        pub is_following: bool,
        pub posts: Vec<PostForTemplate>,
        pub paginator: Paginator,
    }

    let nickname = path.into_inner().0;
    let db = db.get_ref();

    let user = UserProfile::get_by_nickname(db, &nickname)
        .await
        .map_err(super::db_error)?
        .ok_or_else(|| error::ErrorNotFound("User not found."))?;

    let stats = FollowStatistics {
        followers: crate::follow::count_followers(db, user.id)
            .await
            .map_err(super::db_error)?,
        followed: crate::follow::count_followed(db, user.id)
            .await
            .map_err(super::db_error)?,
    };

    let is_following = match client.get_id() {
        Some(viewer_id) if viewer_id != user.id => {
            crate::follow::is_following(db, viewer_id, user.id)
                .await
                .map_err(super::db_error)?
        }
        _ => false,
    };

    let per_page = crate::app_config::pagination().posts_per_page as usize;
    let PostPage {
        posts,
        page,
        page_count,
    } = crate::post::list_by_author_page(db, user.id, query.page(), per_page)
        .await
        .map_err(super::db_error)?;

    Ok(MemberTemplate {
        is_self: client.get_id() == Some(user.id),
        client,
        stats,
        is_following,
        posts,
        paginator: Paginator::new(user.get_url(), page, page_count),
        user,
    }
    .to_response())
}
