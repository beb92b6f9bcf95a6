//! Cookie handling and response helpers for driving the app like a browser.
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::test::TestRequest;
use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Session signing key for tests. Must be at least 64 bytes.
pub const TEST_KEY: &[u8] = &[7u8; 64];

static CSRF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="csrf_token" value="([A-Za-z0-9]+)""#).unwrap());

/// The cookies a browser would hold between requests.
#[derive(Default)]
pub struct CookieJar {
    cookies: HashMap<String, Cookie<'static>>,
}

impl CookieJar {
    pub fn apply(&self, mut req: TestRequest) -> TestRequest {
        for cookie in self.cookies.values() {
            req = req.cookie(cookie.clone());
        }
        req
    }

    pub fn store<B>(&mut self, res: &HttpResponse<B>) {
        for cookie in res.cookies() {
            self.cookies
                .insert(cookie.name().to_owned(), cookie.into_owned());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|c| c.value())
    }
}

/// A fully read response.
pub struct Reply {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl Reply {
    pub async fn read<B: MessageBody>(resp: ServiceResponse<B>) -> Self {
        let status = resp.status();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = actix_web::test::read_body(resp).await;

        Self {
            status,
            location,
            body: String::from_utf8_lossy(&body).into_owned(),
        }
    }

    /// The hidden CSRF field of the first form on the page.
    pub fn csrf_token(&self) -> String {
        CSRF_RE
            .captures(&self.body)
            .map(|c| c[1].to_owned())
            .expect("page has no csrf_token field")
    }

    pub fn assert_redirect(&self, location: &str) {
        assert_eq!(self.status, StatusCode::FOUND, "body: {}", self.body);
        assert_eq!(self.location.as_deref(), Some(location));
    }
}
