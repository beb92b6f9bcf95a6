//! Articles: creation, editing, listings and search.

use crate::orm::posts;
use crate::template::get_page_count;
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::Expr, Condition, DatabaseConnection, DbErr, Select};

/// Base URL fragment for resource.
pub static RESOURCE_URL: &str = "post";

/// A post with its author's nickname resolved for display.
#[derive(Clone, Debug)]
pub struct PostForTemplate {
    pub post: posts::Model,
    pub author_nickname: String,
}

impl PostForTemplate {
    pub fn get_url(&self) -> String {
        format!("/{}/{}", RESOURCE_URL, self.post.id)
    }

    pub fn get_edit_url(&self) -> String {
        format!("/edit/{}", self.post.id)
    }

    pub fn get_author_url(&self) -> String {
        crate::user::get_url_for_nickname(&self.author_nickname)
    }
}

/// One page of posts plus the total page count.
#[derive(Debug, Default)]
pub struct PostPage {
    pub posts: Vec<PostForTemplate>,
    pub page: usize,
    pub page_count: usize,
}

pub async fn create_post(
    db: &DatabaseConnection,
    author_id: i32,
    title: &str,
    body: &str,
) -> Result<posts::Model, DbErr> {
    let post = posts::ActiveModel {
        title: Set(title.trim().to_owned()),
        body: Set(body.to_owned()),
        timestamp: Set(Utc::now().naive_utc()),
        view_num: Set(0),
        author_id: Set(author_id),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("user_id={} wrote post_id={}", author_id, post.id);
    Ok(post)
}

pub async fn get_post(db: &DatabaseConnection, id: i32) -> Result<Option<posts::Model>, DbErr> {
    posts::Entity::find_by_id(id).one(db).await
}

/// Replaces title and body. Returns None when the post does not exist.
pub async fn update_post(
    db: &DatabaseConnection,
    id: i32,
    title: &str,
    body: &str,
) -> Result<Option<posts::Model>, DbErr> {
    let post = match get_post(db, id).await? {
        Some(post) => post,
        None => return Ok(None),
    };

    let mut post: posts::ActiveModel = post.into();
    post.title = Set(title.trim().to_owned());
    post.body = Set(body.to_owned());
    Ok(Some(post.update(db).await?))
}

/// Bumps the view counter in a single statement so concurrent readers never
/// overwrite each other's increments.
pub async fn increment_view(db: &DatabaseConnection, id: i32) -> Result<(), DbErr> {
    posts::Entity::update_many()
        .col_expr(posts::Column::ViewNum, Expr::cust("view_num + 1"))
        .filter(posts::Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

/// Attaches author nicknames, keeping the order of `posts`.
pub async fn with_authors(
    db: &DatabaseConnection,
    posts: Vec<posts::Model>,
) -> Result<Vec<PostForTemplate>, DbErr> {
    let nicknames =
        crate::user::get_nicknames(db, posts.iter().map(|p| p.author_id).collect()).await?;

    Ok(posts
        .into_iter()
        .map(|post| {
            let author_nickname = nicknames
                .get(&post.author_id)
                .cloned()
                .unwrap_or_else(|| crate::constants::GUEST_USERNAME.to_owned());
            PostForTemplate {
                post,
                author_nickname,
            }
        })
        .collect())
}

async fn fetch_page(
    db: &DatabaseConnection,
    select: Select<posts::Entity>,
    page: usize,
    per_page: usize,
) -> Result<PostPage, DbErr> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let paginator = select
        .order_by_desc(posts::Column::Timestamp)
        .order_by_desc(posts::Column::Id)
        .paginate(db, per_page);

    let page_count = get_page_count(paginator.num_items().await?, per_page);
    let posts = if page > page_count {
        Vec::new()
    } else {
        paginator.fetch_page(page - 1).await?
    };

    Ok(PostPage {
        posts: with_authors(db, posts).await?,
        page,
        page_count,
    })
}

/// Newest posts across the whole site.
pub async fn list_page(
    db: &DatabaseConnection,
    page: usize,
    per_page: usize,
) -> Result<PostPage, DbErr> {
    fetch_page(db, posts::Entity::find(), page, per_page).await
}

/// Newest posts written by one user.
pub async fn list_by_author_page(
    db: &DatabaseConnection,
    author_id: i32,
    page: usize,
    per_page: usize,
) -> Result<PostPage, DbErr> {
    let select = posts::Entity::find().filter(posts::Column::AuthorId.eq(author_id));
    fetch_page(db, select, page, per_page).await
}

/// Splits a query into distinct non-empty terms.
pub fn search_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in query.split_whitespace() {
        if !terms.iter().any(|t| t == term) {
            terms.push(term.to_owned());
        }
    }
    terms
}

/// Posts whose title or body contains every term, newest first.
/// A query without terms matches nothing.
pub async fn search(
    db: &DatabaseConnection,
    query: &str,
    page: usize,
    per_page: usize,
) -> Result<PostPage, DbErr> {
    let terms = search_terms(query);
    if terms.is_empty() {
        return Ok(PostPage {
            page: page.max(1),
            ..Default::default()
        });
    }

    let mut condition = Condition::all();
    for term in terms.iter() {
        condition = condition.add(
            Condition::any()
                .add(posts::Column::Title.contains(term))
                .add(posts::Column::Body.contains(term)),
        );
    }

    fetch_page(db, posts::Entity::find().filter(condition), page, per_page).await
}
