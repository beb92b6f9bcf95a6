//! Test fixtures for creating test data
#![allow(dead_code)]

use quillboard::orm::{comments, posts, users};
use quillboard::web::register::{register, RegisterResult};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Test user fixture
pub struct TestUser {
    pub id: i32,
    pub email: String,
    pub nickname: String,
    pub password: String, // Plain text password for testing
}

/// Create a test user with known credentials and the default role.
/// The email is derived from the nickname.
pub async fn create_test_user(
    db: &DatabaseConnection,
    nickname: &str,
    password: &str,
) -> Result<TestUser, DbErr> {
    let email = format!("{}@test.com", nickname);

    match register(db, &email, nickname, password).await? {
        RegisterResult::Created(id) => Ok(TestUser {
            id,
            email,
            nickname: nickname.to_owned(),
            password: password.to_owned(),
        }),
        other => Err(DbErr::Custom(format!(
            "Could not create {}: {:?}",
            nickname, other
        ))),
    }
}

/// Moves a user to one of the seeded roles.
pub async fn set_user_role(
    db: &DatabaseConnection,
    user_id: i32,
    role_name: &str,
) -> Result<(), DbErr> {
    let role = quillboard::permission::find_role_by_name(db, role_name)
        .await?
        .ok_or_else(|| DbErr::Custom(format!("No role {}", role_name)))?;

    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::Custom(format!("No user {}", user_id)))?;

    let mut user: users::ActiveModel = user.into();
    user.role_id = Set(role.id);
    user.update(db).await?;
    Ok(())
}

pub async fn create_test_post(
    db: &DatabaseConnection,
    author_id: i32,
    title: &str,
    body: &str,
) -> Result<posts::Model, DbErr> {
    quillboard::post::create_post(db, author_id, title, body).await
}

pub async fn create_test_comment(
    db: &DatabaseConnection,
    post_id: i32,
    author_id: i32,
    body: &str,
) -> Result<comments::Model, DbErr> {
    quillboard::comment::create_comment(db, post_id, author_id, body).await
}

pub async fn get_post(db: &DatabaseConnection, post_id: i32) -> posts::Model {
    posts::Entity::find_by_id(post_id)
        .one(db)
        .await
        .expect("Query failed")
        .expect("Post not found")
}
