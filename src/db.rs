//! Database connection and schema bootstrap.
//!
//! Tables are created from the entity definitions when missing. There are no
//! versioned migrations; changing an existing column needs manual SQL.

use crate::orm::{comments, follows, posts, roles, users};
use sea_orm::sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Index, Table};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
    Statement,
};
use std::time::Duration;

/// Opens a connection pool for `url`. Both `postgres://` and `sqlite://` urls work.
pub async fn connect(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(url.to_owned());
    opt.max_connections(16)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    log::info!("Connected to {:?} database", db.get_database_backend());
    Ok(db)
}

/// Creates every table that does not exist yet and seeds the roles.
pub async fn init_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let stmts = vec![
        create_table_for(db, roles::Entity),
        create_table_for(db, users::Entity),
        create_table_for(db, posts::Entity),
        create_table_for(db, comments::Entity),
        create_follows_table(db),
    ];

    for stmt in stmts {
        db.execute(stmt).await?;
    }

    crate::permission::insert_roles(db).await?;
    Ok(())
}

fn create_table_for<E>(db: &DatabaseConnection, entity: E) -> Statement
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    backend.build(stmt.if_not_exists())
}

/// `follows` references `users` twice, so both foreign keys need explicit names.
fn create_follows_table(db: &DatabaseConnection) -> Statement {
    let backend = db.get_database_backend();
    let stmt = Table::create()
        .table(follows::Entity)
        .if_not_exists()
        .col(
            ColumnDef::new(follows::Column::FollowerId)
                .integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(follows::Column::FollowedId)
                .integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(follows::Column::Timestamp)
                .date_time()
                .not_null(),
        )
        .primary_key(
            Index::create()
                .col(follows::Column::FollowerId)
                .col(follows::Column::FollowedId),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk-follows-follower_id")
                .from(follows::Entity, follows::Column::FollowerId)
                .to(users::Entity, users::Column::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk-follows-followed_id")
                .from(follows::Entity, follows::Column::FollowedId)
                .to(users::Entity, users::Column::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned();

    backend.build(&stmt)
}
