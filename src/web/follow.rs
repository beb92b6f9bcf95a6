use super::index::PageQuery;
use crate::constants::{SHOW_FOLLOWED_COOKIE, SHOW_FOLLOWED_MAX_AGE_DAYS};
use crate::follow::{Direction, FollowEntry, FollowResult, UnfollowResult};
use crate::middleware::ClientCtx;
use crate::permission::Permission;
use crate::post::PostForTemplate;
use crate::template::{Paginator, PaginatorToHtml};
use crate::user::{get_url_for_nickname, Profile as UserProfile};
use actix_session::Session;
use actix_web::cookie::{time::Duration, Cookie};
use actix_web::{error, get, http::header, web, Error, HttpRequest, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(follow_user)
        .service(unfollow_user)
        .service(view_follows)
        .service(show_followers)
        .service(show_followed);
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub client: ClientCtx,
    pub user: UserProfile,
    pub showing_followers: bool,
    pub entries: Vec<FollowEntry>,
    pub paginator: Paginator,
    pub posts: Vec<PostForTemplate>,
}

#[get("/follow/{nickname}")]
pub async fn follow_user(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    client.require_permission(Permission::FOLLOW)?;
    let nickname = path.into_inner().0;

    let result = crate::follow::follow(db.get_ref(), user_id, &nickname)
        .await
        .map_err(super::db_error)?;

    match result {
        FollowResult::Followed => {
            crate::flash::flash(&cookies, format!("You are now following {}.", nickname));
        }
        FollowResult::AlreadyFollowing => {
            crate::flash::flash(&cookies, "You are already following this user.");
        }
        FollowResult::InvalidUser => {
            crate::flash::flash(&cookies, "Invalid user.");
            return Ok(super::redirect("/index"));
        }
    }

    Ok(super::redirect(&get_url_for_nickname(&nickname)))
}

#[get("/unfollow/{nickname}")]
pub async fn unfollow_user(
    client: ClientCtx,
    cookies: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    client.require_permission(Permission::FOLLOW)?;
    let nickname = path.into_inner().0;

    let result = crate::follow::unfollow(db.get_ref(), user_id, &nickname)
        .await
        .map_err(super::db_error)?;

    match result {
        UnfollowResult::Unfollowed => {
            crate::flash::flash(&cookies, format!("You are not following {} anymore.", nickname));
        }
        UnfollowResult::NotFollowing => {
            crate::flash::flash(&cookies, "You are not following this user.");
        }
        UnfollowResult::InvalidUser => {
            crate::flash::flash(&cookies, "Invalid user.");
            return Ok(super::redirect("/index"));
        }
    }

    Ok(super::redirect(&get_url_for_nickname(&nickname)))
}

#[get("/follows/{nickname}")]
pub async fn view_follows(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String,)>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    let db = db.get_ref();
    let user = UserProfile::get_by_nickname(db, &path.into_inner().0)
        .await
        .map_err(super::db_error)?
        .ok_or_else(|| error::ErrorNotFound("User not found."))?;

    // The listing mode is a preference of logged in visitors only.
    let showing_followers = client.is_user()
        && req
            .cookie(SHOW_FOLLOWED_COOKIE)
            .map(|c| !c.value().is_empty())
            .unwrap_or(false);
    let direction = if showing_followers {
        Direction::Followers
    } else {
        Direction::Followed
    };

    let pagination = crate::app_config::pagination();
    let page = query.page();
    let (entries, page_count) = crate::follow::list_page(
        db,
        user.id,
        direction,
        page,
        pagination.followers_per_page as usize,
    )
    .await
    .map_err(super::db_error)?;

    let posts_per_page = pagination.posts_per_page as usize;
    let posts = match client.get_id() {
        Some(viewer_id) => {
            let posts = crate::follow::followed_posts(db, viewer_id, posts_per_page as u64)
                .await
                .map_err(super::db_error)?;
            crate::post::with_authors(db, posts)
                .await
                .map_err(super::db_error)?
        }
        None => {
            crate::post::list_page(db, 1, posts_per_page)
                .await
                .map_err(super::db_error)?
                .posts
        }
    };

    Ok(FollowTemplate {
        paginator: Paginator::new(
            format!("/follows/{}", urlencoding::encode(&user.nickname)),
            page,
            page_count,
        ),
        client,
        user,
        showing_followers,
        entries,
        posts,
    }
    .to_response())
}

fn set_mode(nickname: &str, value: &str) -> HttpResponse {
    let cookie = Cookie::build(SHOW_FOLLOWED_COOKIE, value.to_owned())
        .path("/")
        .max_age(Duration::days(SHOW_FOLLOWED_MAX_AGE_DAYS))
        .finish();

    HttpResponse::Found()
        .cookie(cookie)
        .append_header((
            header::LOCATION,
            format!("/follows/{}", urlencoding::encode(nickname)),
        ))
        .finish()
}

#[get("/followers/{nickname}")]
pub async fn show_followers(path: web::Path<(String,)>) -> HttpResponse {
    set_mode(&path.into_inner().0, "1")
}

#[get("/followed/{nickname}")]
pub async fn show_followed(path: web::Path<(String,)>) -> HttpResponse {
    set_mode(&path.into_inner().0, "")
}
