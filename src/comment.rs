//! Comments and replies under posts, plus their moderation flag.

use crate::orm::comments::{self, CommentType};
use crate::template::{get_page_count, resolve_page};
use chrono::Utc;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, TransactionTrait};

#[derive(Clone, Debug)]
pub struct CommentForTemplate {
    pub comment: comments::Model,
    pub author_nickname: String,
}

impl CommentForTemplate {
    pub fn is_reply(&self) -> bool {
        self.comment.comment_type == CommentType::Reply
    }

    pub fn get_reply_to(&self) -> &str {
        self.comment.reply_to.as_deref().unwrap_or("")
    }

    pub fn get_author_url(&self) -> String {
        crate::user::get_url_for_nickname(&self.author_nickname)
    }
}

#[derive(Debug, Default)]
pub struct CommentPage {
    pub comments: Vec<CommentForTemplate>,
    /// The resolved page, never negative.
    pub page: usize,
    pub page_count: usize,
}

/// Adds a top-level comment to a post.
pub async fn create_comment(
    db: &DatabaseConnection,
    post_id: i32,
    author_id: i32,
    body: &str,
) -> Result<comments::Model, DbErr> {
    comments::ActiveModel {
        body: Set(body.to_owned()),
        timestamp: Set(Utc::now().naive_utc()),
        disabled: Set(false),
        comment_type: Set(CommentType::Comment),
        reply_to: Set(None),
        author_id: Set(author_id),
        post_id: Set(post_id),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Adds a reply on the same post as `parent_id`, recording the nickname of the
/// parent's author. Returns None when the parent does not exist.
pub async fn create_reply(
    db: &DatabaseConnection,
    parent_id: i32,
    author_id: i32,
    body: &str,
) -> Result<Option<comments::Model>, DbErr> {
    let txn = db.begin().await?;

    let (parent, parent_author) = match comments::Entity::find_by_id(parent_id)
        .find_also_related(crate::orm::users::Entity)
        .one(&txn)
        .await?
    {
        Some((parent, Some(author))) => (parent, author),
        _ => return Ok(None),
    };

    let reply = comments::ActiveModel {
        body: Set(body.to_owned()),
        timestamp: Set(Utc::now().naive_utc()),
        disabled: Set(false),
        comment_type: Set(CommentType::Reply),
        reply_to: Set(Some(parent_author.nickname)),
        author_id: Set(author_id),
        post_id: Set(parent.post_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(Some(reply))
}

pub async fn get_comment(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<comments::Model>, DbErr> {
    comments::Entity::find_by_id(id).one(db).await
}

/// Sets the moderation flag. Returns the updated comment, or None if missing.
pub async fn set_disabled(
    db: &DatabaseConnection,
    id: i32,
    disabled: bool,
) -> Result<Option<comments::Model>, DbErr> {
    let comment = match get_comment(db, id).await? {
        Some(comment) => comment,
        None => return Ok(None),
    };

    let mut comment: comments::ActiveModel = comment.into();
    comment.disabled = Set(disabled);
    let comment = comment.update(db).await?;

    log::info!(
        "comment_id={} on post_id={} disabled={}",
        comment.id,
        comment.post_id,
        disabled
    );
    Ok(Some(comment))
}

/// Comments on a post in ascending time order.
///
/// `requested_page` is 1-based; negative values count from the end, so `-1`
/// is the last page. Disabled comments are left out unless `include_disabled`.
pub async fn list_page(
    db: &DatabaseConnection,
    post_id: i32,
    requested_page: i64,
    per_page: usize,
    include_disabled: bool,
) -> Result<CommentPage, DbErr> {
    let per_page = per_page.max(1);

    let mut select = comments::Entity::find().filter(comments::Column::PostId.eq(post_id));
    if !include_disabled {
        select = select.filter(comments::Column::Disabled.eq(false));
    }

    let paginator = select
        .order_by_asc(comments::Column::Timestamp)
        .order_by_asc(comments::Column::Id)
        .paginate(db, per_page);

    let page_count = get_page_count(paginator.num_items().await?, per_page);
    let page = resolve_page(requested_page, page_count);
    let comments = if page > page_count {
        Vec::new()
    } else {
        paginator.fetch_page(page - 1).await?
    };

    let nicknames =
        crate::user::get_nicknames(db, comments.iter().map(|c| c.author_id).collect()).await?;

    let comments = comments
        .into_iter()
        .map(|comment| {
            let author_nickname = nicknames
                .get(&comment.author_id)
                .cloned()
                .unwrap_or_else(|| crate::constants::GUEST_USERNAME.to_owned());
            CommentForTemplate {
                comment,
                author_nickname,
            }
        })
        .collect();

    Ok(CommentPage {
        comments,
        page,
        page_count,
    })
}
