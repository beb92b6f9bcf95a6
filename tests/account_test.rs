//! Integration tests for profile editing and password changes

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{database::*, fixtures::*, http::CookieJar};
use quillboard::user::{self, ProfileUpdate};
use quillboard::web::login::{login, LoginResultStatus};

#[actix_rt::test]
async fn test_change_password_checks_old_password() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let alice = create_test_user(&db, "alice", "secret").await.expect("Failed to create alice");

    assert!(!user::change_password(&db, alice.id, "wrong", "next").await.unwrap());
    assert!(user::change_password(&db, alice.id, "secret", "next").await.unwrap());

    let old = login(&db, &alice.email, "secret").await.unwrap();
    assert_eq!(old.result, LoginResultStatus::BadPassword);
    let new = login(&db, &alice.email, "next").await.unwrap();
    assert_eq!(new.result, LoginResultStatus::Success);
}

#[actix_rt::test]
async fn test_update_profile_keeps_nicknames_unique() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let alice = create_test_user(&db, "alice", "secret").await.expect("Failed to create alice");
    create_test_user(&db, "bob", "secret").await.expect("Failed to create bob");

    let taken = user::update_profile(&db, alice.id, "bob", "").await.unwrap();
    assert_eq!(taken, ProfileUpdate::NicknameTaken);

    // Keeping one's own nickname is fine.
    let same = user::update_profile(&db, alice.id, "alice", "Hi!").await.unwrap();
    assert_eq!(same, ProfileUpdate::Updated);

    let profile = user::Profile::get_by_id(&db, alice.id)
        .await
        .unwrap()
        .expect("User not found");
    assert_eq!(profile.get_about_me(), "Hi!");
}

#[actix_rt::test]
async fn test_edit_profile_over_http() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let alice = create_test_user(&db, "alice", "secret").await.expect("Failed to create alice");

    let app = init_app!(db.conn.clone());
    let mut jar = CookieJar::default();

    let reply = send!(app, jar, test::TestRequest::get().uri("/editprofile"));
    reply.assert_redirect("/login?next=%2Feditprofile");

    log_in!(app, jar, &alice.email, &alice.password);

    let page = send!(app, jar, test::TestRequest::get().uri("/editprofile"));
    assert_eq!(page.status, StatusCode::OK);
    let token = page.csrf_token();

    let reply = send!(
        app,
        jar,
        test::TestRequest::post().uri("/editprofile").set_form(&[
            ("csrf_token", token.as_str()),
            ("nickname", "not valid!"),
            ("about_me", ""),
        ])
    );
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Nicknames must start with a letter"));

    let reply = send!(
        app,
        jar,
        test::TestRequest::post().uri("/editprofile").set_form(&[
            ("csrf_token", token.as_str()),
            ("nickname", "alicia"),
            ("about_me", "Writes about gardens."),
        ])
    );
    reply.assert_redirect("/user/alicia");

    let page = send!(app, jar, test::TestRequest::get().uri("/user/alicia"));
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Writes about gardens."));
    assert!(page.body.contains("Your profile has been updated."));
}

#[actix_rt::test]
async fn test_change_password_over_http() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let alice = create_test_user(&db, "alice", "secret").await.expect("Failed to create alice");

    let app = init_app!(db.conn.clone());
    let mut jar = CookieJar::default();
    log_in!(app, jar, &alice.email, &alice.password);

    let token = send!(app, jar, test::TestRequest::get().uri("/changepassword")).csrf_token();

    let reply = send!(
        app,
        jar,
        test::TestRequest::post().uri("/changepassword").set_form(&[
            ("csrf_token", token.as_str()),
            ("old_password", "wrong"),
            ("password", "next"),
            ("password2", "next"),
        ])
    );
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Invalid password."));

    let reply = send!(
        app,
        jar,
        test::TestRequest::post().uri("/changepassword").set_form(&[
            ("csrf_token", token.as_str()),
            ("old_password", "secret"),
            ("password", "next"),
            ("password2", "next"),
        ])
    );
    reply.assert_redirect("/index");

    let result = login(&db, &alice.email, "next").await.unwrap();
    assert_eq!(result.result, LoginResultStatus::Success);
}
