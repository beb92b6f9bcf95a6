//! Test database setup and management
#![allow(dead_code)]

use sea_orm::{DatabaseConnection, DbErr};
use std::ops::Deref;
use tempfile::TempDir;

/// A schema-initialised SQLite database that lives as long as this value.
pub struct TestDatabase {
    pub conn: DatabaseConnection,
    _dir: TempDir,
}

impl Deref for TestDatabase {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

/// Setup test database - a fresh file in its own temporary directory, with
/// the tables created and the roles seeded.
pub async fn setup_test_database() -> Result<TestDatabase, DbErr> {
    let dir = tempfile::tempdir().map_err(|e| DbErr::Custom(e.to_string()))?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

    let conn = quillboard::db::connect(&url).await?;
    quillboard::db::init_schema(&conn).await?;

    Ok(TestDatabase { conn, _dir: dir })
}
