//! The follow graph: directed edges between users.
//!
//! An edge is unique per (follower, followed) pair; the composite primary key
//! rejects a duplicate even when two requests race past the existence check.

use crate::orm::{follows, posts};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, TransactionTrait};

#[derive(Debug, PartialEq, Eq)]
pub enum FollowResult {
    Followed,
    AlreadyFollowing,
    /// Unknown nickname, or an attempt to follow oneself.
    InvalidUser,
}

#[derive(Debug, PartialEq, Eq)]
pub enum UnfollowResult {
    Unfollowed,
    NotFollowing,
    InvalidUser,
}

/// One row of a followers/followed listing.
#[derive(Clone, Debug)]
pub struct FollowEntry {
    pub user_id: i32,
    pub nickname: String,
    pub timestamp: NaiveDateTime,
}

impl FollowEntry {
    pub fn get_url(&self) -> String {
        crate::user::get_url_for_nickname(&self.nickname)
    }
}

/// Which side of the graph a listing walks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Users following the subject.
    Followers,
    /// Users the subject follows.
    Followed,
}

pub async fn is_following<C>(db: &C, follower_id: i32, followed_id: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    Ok(follows::Entity::find_by_id((follower_id, followed_id))
        .one(db)
        .await?
        .is_some())
}

pub async fn follow(
    db: &DatabaseConnection,
    follower_id: i32,
    nickname: &str,
) -> Result<FollowResult, DbErr> {
    let target = match crate::user::find_by_nickname(db, nickname).await? {
        Some(user) if user.id != follower_id => user,
        _ => return Ok(FollowResult::InvalidUser),
    };

    let txn = db.begin().await?;
    if is_following(&txn, follower_id, target.id).await? {
        return Ok(FollowResult::AlreadyFollowing);
    }

    follows::Entity::insert(follows::ActiveModel {
        follower_id: Set(follower_id),
        followed_id: Set(target.id),
        timestamp: Set(Utc::now().naive_utc()),
    })
    .exec(&txn)
    .await?;
    txn.commit().await?;

    log::debug!("user_id={} now follows user_id={}", follower_id, target.id);
    Ok(FollowResult::Followed)
}

pub async fn unfollow(
    db: &DatabaseConnection,
    follower_id: i32,
    nickname: &str,
) -> Result<UnfollowResult, DbErr> {
    let target = match crate::user::find_by_nickname(db, nickname).await? {
        Some(user) if user.id != follower_id => user,
        _ => return Ok(UnfollowResult::InvalidUser),
    };

    let res = follows::Entity::delete_many()
        .filter(follows::Column::FollowerId.eq(follower_id))
        .filter(follows::Column::FollowedId.eq(target.id))
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        Ok(UnfollowResult::NotFollowing)
    } else {
        Ok(UnfollowResult::Unfollowed)
    }
}

pub async fn count_followers(db: &DatabaseConnection, user_id: i32) -> Result<usize, DbErr> {
    follows::Entity::find()
        .filter(follows::Column::FollowedId.eq(user_id))
        .count(db)
        .await
}

pub async fn count_followed(db: &DatabaseConnection, user_id: i32) -> Result<usize, DbErr> {
    follows::Entity::find()
        .filter(follows::Column::FollowerId.eq(user_id))
        .count(db)
        .await
}

/// Returns one page (1-based) of a follow listing, newest edges first,
/// along with the total page count.
pub async fn list_page(
    db: &DatabaseConnection,
    user_id: i32,
    direction: Direction,
    page: usize,
    per_page: usize,
) -> Result<(Vec<FollowEntry>, usize), DbErr> {
    let per_page = per_page.max(1);
    let select = match direction {
        Direction::Followers => {
            follows::Entity::find().filter(follows::Column::FollowedId.eq(user_id))
        }
        Direction::Followed => {
            follows::Entity::find().filter(follows::Column::FollowerId.eq(user_id))
        }
    };

    let paginator = select
        .order_by_desc(follows::Column::Timestamp)
        .paginate(db, per_page);
    let page_count = crate::template::get_page_count(paginator.num_items().await?, per_page);
    let page = page.max(1);
    let edges = if page > page_count {
        Vec::new()
    } else {
        paginator.fetch_page(page - 1).await?
    };

    let other = |edge: &follows::Model| match direction {
        Direction::Followers => edge.follower_id,
        Direction::Followed => edge.followed_id,
    };

    let nicknames = crate::user::get_nicknames(db, edges.iter().map(other).collect()).await?;

    let entries = edges
        .iter()
        .filter_map(|edge| {
            let user_id = other(edge);
            nicknames.get(&user_id).map(|nickname| FollowEntry {
                user_id,
                nickname: nickname.to_owned(),
                timestamp: edge.timestamp,
            })
        })
        .collect();

    Ok((entries, page_count))
}

/// Posts written by the users `user_id` follows, newest first.
pub async fn followed_posts(
    db: &DatabaseConnection,
    user_id: i32,
    limit: u64,
) -> Result<Vec<posts::Model>, DbErr> {
    let followed_ids: Vec<i32> = follows::Entity::find()
        .filter(follows::Column::FollowerId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|edge| edge.followed_id)
        .collect();

    if followed_ids.is_empty() {
        return Ok(Vec::new());
    }

    posts::Entity::find()
        .filter(posts::Column::AuthorId.is_in(followed_ids))
        .order_by_desc(posts::Column::Timestamp)
        .limit(limit)
        .all(db)
        .await
}
