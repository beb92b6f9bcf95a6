//! Integration tests for registration, login and logout

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{database::*, fixtures::*, http::CookieJar};
use quillboard::orm::users;
use quillboard::permission::{ROLE_ADMINISTRATOR, ROLE_USER};
use quillboard::web::login::{login, LoginResultStatus};
use quillboard::web::register::{register, RegisterResult};
use sea_orm::{entity::*, query::*};
use serial_test::serial;

#[actix_rt::test]
async fn test_login_rejects_wrong_password() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let user = create_test_user(&db, "alice", "secret")
        .await
        .expect("Failed to create user");

    let result = login(&db, &user.email, "not-the-password")
        .await
        .expect("Login query failed");
    assert_eq!(result.result, LoginResultStatus::BadPassword);
    assert!(result.user_id.is_none());

    let result = login(&db, "nobody@test.com", "secret")
        .await
        .expect("Login query failed");
    assert_eq!(result.result, LoginResultStatus::BadEmail);

    let result = login(&db, &user.email, "secret")
        .await
        .expect("Login query failed");
    assert_eq!(result.result, LoginResultStatus::Success);
    assert_eq!(result.user_id, Some(user.id));
}

#[actix_rt::test]
async fn test_login_email_is_case_insensitive() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    create_test_user(&db, "alice", "secret")
        .await
        .expect("Failed to create user");

    let result = login(&db, "ALICE@Test.com", "secret")
        .await
        .expect("Login query failed");
    assert_eq!(result.result, LoginResultStatus::Success);
}

#[actix_rt::test]
async fn test_register_duplicate_email_fails() {
    let db = setup_test_database().await.expect("Failed to setup test database");

    let first = register(&db, "a@x.com", "alice", "secret")
        .await
        .expect("Register failed");
    assert!(matches!(first, RegisterResult::Created(_)));

    let second = register(&db, "A@X.com", "alice2", "secret")
        .await
        .expect("Register failed");
    assert_eq!(second, RegisterResult::EmailTaken);

    let count = users::Entity::find()
        .filter(users::Column::Email.eq("a@x.com"))
        .count(&*db)
        .await
        .expect("Count failed");
    assert_eq!(count, 1);
}

#[actix_rt::test]
async fn test_register_duplicate_nickname_fails() {
    let db = setup_test_database().await.expect("Failed to setup test database");

    register(&db, "a@x.com", "alice", "secret")
        .await
        .expect("Register failed");
    let second = register(&db, "b@x.com", "alice", "secret")
        .await
        .expect("Register failed");
    assert_eq!(second, RegisterResult::NicknameTaken);
}

#[actix_rt::test]
async fn test_password_is_stored_hashed() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let user = create_test_user(&db, "alice", "secret")
        .await
        .expect("Failed to create user");

    let stored = users::Entity::find_by_id(user.id)
        .one(&*db)
        .await
        .expect("Query failed")
        .expect("User not found");
    assert_ne!(stored.password_hash, "secret");
    assert!(stored.password_hash.starts_with("$argon2"));
}

async fn profile_of(
    db: &sea_orm::DatabaseConnection,
    result: Result<RegisterResult, sea_orm::DbErr>,
) -> quillboard::user::Profile {
    let id = match result.expect("Register failed") {
        RegisterResult::Created(id) => id,
        other => panic!("unexpected {:?}", other),
    };
    quillboard::user::Profile::get_by_id(db, id)
        .await
        .expect("Query failed")
        .expect("User not found")
}

#[actix_rt::test]
#[serial]
async fn test_admin_email_gets_administrator_role() {
    let db = setup_test_database().await.expect("Failed to setup test database");

    let mut config = quillboard::app_config::AppConfig::default();
    config.admin.email = "Root@Example.com".to_owned();
    quillboard::app_config::set_config(config);

    let admin = register(&db, "root@example.com", "root", "secret").await;
    let user = register(&db, "user@example.com", "user", "secret").await;

    quillboard::app_config::set_config(quillboard::app_config::AppConfig::default());

    let admin = profile_of(&db, admin).await;
    assert_eq!(admin.role_name, ROLE_ADMINISTRATOR);
    assert!(admin.is_administrator());

    let user = profile_of(&db, user).await;
    assert_eq!(user.role_name, ROLE_USER);
    assert!(!user.is_administrator());
}

#[actix_rt::test]
async fn test_register_then_login_over_http() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let app = init_app!(db.conn.clone());
    let mut jar = CookieJar::default();

    let page = send!(app, jar, test::TestRequest::get().uri("/register"));
    assert_eq!(page.status, StatusCode::OK);
    let token = page.csrf_token();

    let reply = send!(
        app,
        jar,
        test::TestRequest::post().uri("/register").set_form(&[
            ("csrf_token", token.as_str()),
            ("email", "a@x.com"),
            ("nickname", "alice"),
            ("password", "secret"),
        ])
    );
    reply.assert_redirect("/login");

    let page = send!(app, jar, test::TestRequest::get().uri("/login"));
    assert!(page.body.contains("You can now login."));
    let token = page.csrf_token();

    let reply = send!(
        app,
        jar,
        test::TestRequest::post().uri("/login").set_form(&[
            ("csrf_token", token.as_str()),
            ("email", "a@x.com"),
            ("password", "secret"),
        ])
    );
    reply.assert_redirect("/index");

    let page = send!(app, jar, test::TestRequest::get().uri("/index"));
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Hello, alice!"));
    assert!(page.body.contains("Log out"));
}

#[actix_rt::test]
async fn test_register_rejects_mismatched_confirmation() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let app = init_app!(db.conn.clone());
    let mut jar = CookieJar::default();

    let token = send!(app, jar, test::TestRequest::get().uri("/register")).csrf_token();
    let page = send!(
        app,
        jar,
        test::TestRequest::post().uri("/register").set_form(&[
            ("csrf_token", token.as_str()),
            ("email", "a@x.com"),
            ("nickname", "alice"),
            ("password", "secret"),
            ("password2", "secrets"),
        ])
    );
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Passwords must match."));

    let user = quillboard::user::find_by_email(&db, "a@x.com").await.unwrap();
    assert!(user.is_none());
}

#[actix_rt::test]
async fn test_login_over_http_follows_local_next_only() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    create_test_user(&db, "alice", "secret")
        .await
        .expect("Failed to create user");
    let app = init_app!(db.conn.clone());

    for (next, expected) in [("/write", "/write"), ("https://evil.example/", "/index")] {
        let mut jar = CookieJar::default();
        let token = send!(app, jar, test::TestRequest::get().uri("/login")).csrf_token();
        let reply = send!(
            app,
            jar,
            test::TestRequest::post().uri("/login").set_form(&[
                ("csrf_token", token.as_str()),
                ("email", "alice@test.com"),
                ("password", "secret"),
                ("next", next),
            ])
        );
        reply.assert_redirect(expected);
    }
}

#[actix_rt::test]
async fn test_wrong_password_over_http_rerenders_form() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    create_test_user(&db, "alice", "secret")
        .await
        .expect("Failed to create user");
    let app = init_app!(db.conn.clone());
    let mut jar = CookieJar::default();

    let token = send!(app, jar, test::TestRequest::get().uri("/login")).csrf_token();
    let reply = send!(
        app,
        jar,
        test::TestRequest::post().uri("/login").set_form(&[
            ("csrf_token", token.as_str()),
            ("email", "alice@test.com"),
            ("password", "wrong"),
        ])
    );
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Invalid email or password."));

    let page = send!(app, jar, test::TestRequest::get().uri("/index"));
    assert!(page.body.contains("Hello, Guest!"));
}

#[actix_rt::test]
async fn test_post_with_bad_csrf_token_is_forbidden() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    create_test_user(&db, "alice", "secret")
        .await
        .expect("Failed to create user");
    let app = init_app!(db.conn.clone());
    let mut jar = CookieJar::default();

    send!(app, jar, test::TestRequest::get().uri("/login"));
    let reply = send!(
        app,
        jar,
        test::TestRequest::post().uri("/login").set_form(&[
            ("csrf_token", "forged"),
            ("email", "alice@test.com"),
            ("password", "secret"),
        ])
    );
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert!(reply.body.contains("403 Forbidden"));
}

#[actix_rt::test]
async fn test_logout_clears_login() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let user = create_test_user(&db, "alice", "secret")
        .await
        .expect("Failed to create user");
    let app = init_app!(db.conn.clone());
    let mut jar = CookieJar::default();

    log_in!(app, jar, &user.email, &user.password);

    let reply = send!(app, jar, test::TestRequest::get().uri("/logout"));
    reply.assert_redirect("/index");

    let page = send!(app, jar, test::TestRequest::get().uri("/index"));
    assert!(page.body.contains("You have been logged out."));
    assert!(page.body.contains("Hello, Guest!"));
}
