use crate::orm::{roles, users};
use crate::permission::Permission;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, sea_query::Expr, DatabaseConnection, DbErr, TransactionTrait};
use std::collections::HashMap;

/// Base URL fragment for resource.
pub static RESOURCE_URL: &str = "user";

/// A user together with the permissions of their role.
#[derive(Clone, Debug)]
pub struct Profile {
    pub id: i32,
    pub email: String,
    pub nickname: String,
    pub about_me: Option<String>,
    pub member_since: NaiveDateTime,
    pub last_seen: NaiveDateTime,
    pub confirmed: bool,
    pub role_name: String,
    pub permissions: Permission,
}

impl Profile {
    pub fn from_models(user: users::Model, role: Option<roles::Model>) -> Self {
        let (role_name, permissions) = match role {
            Some(role) => (role.name, Permission::from_mask(role.permissions)),
            None => (String::new(), Permission::empty()),
        };

        Self {
            id: user.id,
            email: user.email,
            nickname: user.nickname,
            about_me: user.about_me,
            member_since: user.member_since,
            last_seen: user.last_seen,
            confirmed: user.confirmed,
            role_name,
            permissions,
        }
    }

    /// Returns a user and their role by id.
    pub async fn get_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<Self>, DbErr> {
        Ok(users::Entity::find_by_id(id)
            .find_also_related(roles::Entity)
            .one(db)
            .await?
            .map(|(user, role)| Self::from_models(user, role)))
    }

    /// Returns a user and their role by nickname.
    pub async fn get_by_nickname(
        db: &DatabaseConnection,
        nickname: &str,
    ) -> Result<Option<Self>, DbErr> {
        Ok(users::Entity::find()
            .filter(users::Column::Nickname.eq(nickname))
            .find_also_related(roles::Entity)
            .one(db)
            .await?
            .map(|(user, role)| Self::from_models(user, role)))
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    pub fn is_administrator(&self) -> bool {
        self.can(Permission::ADMINISTER)
    }

    pub fn get_about_me(&self) -> &str {
        self.about_me.as_deref().unwrap_or("")
    }

    pub fn get_url(&self) -> String {
        get_url_for_nickname(&self.nickname)
    }

    /// `/<action>/<nickname>` for the per-user routes (follow, unfollow, ...).
    pub fn get_action_url(&self, action: &str) -> String {
        format!("/{}/{}", action, urlencoding::encode(&self.nickname))
    }
}

pub fn get_url_for_nickname(nickname: &str) -> String {
    format!("/{}/{}", RESOURCE_URL, urlencoding::encode(nickname))
}

pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await
}

pub async fn find_by_nickname(
    db: &DatabaseConnection,
    nickname: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Nickname.eq(nickname))
        .one(db)
        .await
}

/// Emails are compared trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn touch_last_seen(db: &DatabaseConnection, user_id: i32) -> Result<(), DbErr> {
    users::Entity::update_many()
        .col_expr(users::Column::LastSeen, Expr::value(Utc::now().naive_utc()))
        .filter(users::Column::Id.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Maps user ids to nicknames for listings that show authors.
pub async fn get_nicknames(
    db: &DatabaseConnection,
    ids: Vec<i32>,
) -> Result<HashMap<i32, String>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.nickname))
        .collect())
}

#[derive(Debug, PartialEq, Eq)]
pub enum ProfileUpdate {
    Updated,
    NicknameTaken,
}

/// Changes nickname and about_me. Nicknames stay unique across users.
pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: i32,
    nickname: &str,
    about_me: &str,
) -> Result<ProfileUpdate, DbErr> {
    let txn = db.begin().await?;

    let taken = users::Entity::find()
        .filter(users::Column::Nickname.eq(nickname))
        .filter(users::Column::Id.ne(user_id))
        .count(&txn)
        .await?;
    if taken > 0 {
        return Ok(ProfileUpdate::NicknameTaken);
    }

    let user = users::Entity::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| DbErr::Custom(format!("user_id={} vanished", user_id)))?;

    let mut user: users::ActiveModel = user.into();
    user.nickname = Set(nickname.to_owned());
    user.about_me = Set(if about_me.is_empty() {
        None
    } else {
        Some(about_me.to_owned())
    });
    user.update(&txn).await?;
    txn.commit().await?;

    Ok(ProfileUpdate::Updated)
}

/// Replaces the password hash after checking the current password.
/// Returns false when `old_password` is wrong.
pub async fn change_password(
    db: &DatabaseConnection,
    user_id: i32,
    old_password: &str,
    new_password: &str,
) -> Result<bool, DbErr> {
    use crate::session::{hash_password, verify_password};

    let user = match users::Entity::find_by_id(user_id).one(db).await? {
        Some(user) => user,
        None => return Ok(false),
    };

    if !verify_password(old_password, &user.password_hash) {
        return Ok(false);
    }

    let password_hash = hash_password(new_password)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?;

    let mut user: users::ActiveModel = user.into();
    user.password_hash = Set(password_hash);
    user.update(db).await?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_user_url_is_escaped() {
        assert_eq!(get_url_for_nickname("alice"), "/user/alice");
        assert_eq!(get_url_for_nickname("a b"), "/user/a%20b");
    }

    #[test]
    fn test_profile_without_role_has_no_permissions() {
        let now = Utc::now().naive_utc();
        let profile = Profile::from_models(
            users::Model {
                id: 1,
                email: "a@x.com".to_owned(),
                nickname: "alice".to_owned(),
                password_hash: String::new(),
                role_id: 0,
                about_me: None,
                member_since: now,
                last_seen: now,
                confirmed: false,
            },
            None,
        );
        assert!(!profile.can(Permission::FOLLOW));
        assert_eq!(profile.get_about_me(), "");
    }
}
