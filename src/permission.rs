//! Role based permissions.
//!
//! Every user belongs to exactly one role, and a role carries a bitmask of
//! [`Permission`] values. A permission check is a bitwise AND against that mask.
//! Guests have no role and therefore no permissions.

use crate::orm::roles;
use bitflags::bitflags;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

bitflags! {
    pub struct Permission: i32 {
        const FOLLOW = 0x01;
        const COMMENT = 0x02;
        const WRITE_ARTICLES = 0x04;
        const MODERATE_COMMENTS = 0x08;
        const ADMINISTER = 0x80;
    }
}

impl Permission {
    /// Interprets a stored role mask. Unknown bits are dropped.
    pub fn from_mask(mask: i32) -> Self {
        Self::from_bits_truncate(mask)
    }
}

pub const ROLE_USER: &str = "User";
pub const ROLE_MODERATOR: &str = "Moderator";
pub const ROLE_ADMINISTRATOR: &str = "Administrator";

/// Mask stored for administrators. Covers bits not yet assigned a name.
pub const ADMINISTRATOR_MASK: i32 = 0xff;

/// Roles seeded at startup as `(name, mask, is_default)`.
pub fn builtin_roles() -> [(&'static str, i32, bool); 3] {
    let user = Permission::FOLLOW | Permission::COMMENT | Permission::WRITE_ARTICLES;
    [
        (ROLE_USER, user.bits(), true),
        (
            ROLE_MODERATOR,
            (user | Permission::MODERATE_COMMENTS).bits(),
            false,
        ),
        (ROLE_ADMINISTRATOR, ADMINISTRATOR_MASK, false),
    ]
}

/// Creates or refreshes the built-in roles. Safe to call on every start.
pub async fn insert_roles<C>(db: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    for (name, mask, is_default) in builtin_roles() {
        let existing = roles::Entity::find()
            .filter(roles::Column::Name.eq(name))
            .one(db)
            .await?;

        match existing {
            Some(role) if role.permissions == mask && role.is_default == is_default => {}
            Some(role) => {
                log::info!("Updating role {} to mask {:#x}", name, mask);
                let mut role: roles::ActiveModel = role.into();
                role.permissions = Set(mask);
                role.is_default = Set(is_default);
                role.update(db).await?;
            }
            None => {
                log::info!("Creating role {} with mask {:#x}", name, mask);
                roles::ActiveModel {
                    name: Set(name.to_owned()),
                    permissions: Set(mask),
                    is_default: Set(is_default),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
        }
    }

    Ok(())
}

pub async fn find_role_by_name<C>(db: &C, name: &str) -> Result<Option<roles::Model>, DbErr>
where
    C: ConnectionTrait,
{
    roles::Entity::find()
        .filter(roles::Column::Name.eq(name))
        .one(db)
        .await
}

/// Returns the role flagged as default for new registrations.
pub async fn default_role<C>(db: &C) -> Result<roles::Model, DbErr>
where
    C: ConnectionTrait,
{
    roles::Entity::find()
        .filter(roles::Column::IsDefault.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::Custom("No default role. Were roles seeded?".to_owned()))
}
