use crate::session::end_session;
use actix_session::Session;
use actix_web::{get, Error, HttpResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_logout);
}

#[get("/logout")]
pub async fn view_logout(cookies: Session) -> Result<HttpResponse, Error> {
    end_session(&cookies);
    crate::flash::flash(&cookies, "You have been logged out.");
    Ok(super::redirect("/index"))
}
