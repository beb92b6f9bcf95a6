#![allow(dead_code)]
#![allow(unused_macros)]

pub mod database;
pub mod fixtures;
pub mod http;

/// Builds the full application around `$db`, wired like the server binary.
macro_rules! init_app {
    ($db:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db))
                .wrap(
                    actix_web::middleware::ErrorHandlers::new()
                        .handler(
                            actix_web::http::StatusCode::FORBIDDEN,
                            quillboard::web::error::render_403,
                        )
                        .handler(
                            actix_web::http::StatusCode::NOT_FOUND,
                            quillboard::web::error::render_404,
                        )
                        .handler(
                            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                            quillboard::web::error::render_500,
                        ),
                )
                .wrap(quillboard::middleware::ClientCtx::default())
                .wrap(
                    actix_session::SessionMiddleware::builder(
                        actix_session::storage::CookieSessionStore::default(),
                        actix_web::cookie::Key::from(common::http::TEST_KEY),
                    )
                    .cookie_secure(false)
                    .build(),
                )
                .configure(quillboard::web::configure),
        )
        .await
    };
}

/// Sends `$req` with the cookies in `$jar`, remembers any new cookies and
/// returns the buffered [`http::Reply`].
macro_rules! send {
    ($app:expr, $jar:expr, $req:expr) => {{
        let req = $jar.apply($req).to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        $jar.store(resp.response());
        common::http::Reply::read(resp).await
    }};
}

/// Logs in through the form and asserts the redirect to `/index`.
macro_rules! log_in {
    ($app:expr, $jar:expr, $email:expr, $password:expr) => {{
        let email: &str = $email;
        let password: &str = $password;
        let token = send!(
            $app,
            $jar,
            actix_web::test::TestRequest::get().uri("/login")
        )
        .csrf_token();
        let reply = send!(
            $app,
            $jar,
            actix_web::test::TestRequest::post()
                .uri("/login")
                .set_form(&[
                    ("csrf_token", token.as_str()),
                    ("email", email),
                    ("password", password),
                ])
        );
        reply.assert_redirect("/index");
    }};
}
