pub mod account;
pub mod comment;
pub mod error;
pub mod follow;
pub mod index;
pub mod login;
pub mod logout;
pub mod member;
pub mod post;
pub mod register;
pub mod search;

use actix_web::{error as web_error, http::header, Error, HttpResponse};
use sea_orm::DbErr;
use validator::ValidationErrors;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Descending order. Order is important.
    // Route resolution will stop at the first match.
    index::configure(conf);
    account::configure(conf);
    comment::configure(conf);
    follow::configure(conf);
    login::configure(conf);
    logout::configure(conf);
    member::configure(conf);
    post::configure(conf);
    register::configure(conf);
    search::configure(conf);
}

/// 302 to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location))
        .finish()
}

/// Logs a database error and turns it into a 500.
pub fn db_error(e: DbErr) -> Error {
    log::error!("error {:?}", e);
    web_error::ErrorInternalServerError("DB error")
}

/// Flattens validator output into messages for flashing, in field order.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("Invalid {}.", field),
            })
        })
        .collect()
}

/// Flashes every validation message onto the session.
pub fn flash_validation(session: &actix_session::Session, errors: &ValidationErrors) {
    for message in validation_messages(errors) {
        crate::flash::flash(session, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Title is required."))]
        title: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_validation_messages_fall_back_to_field_name() {
        let sample = Sample {
            title: String::new(),
            email: "nope".to_owned(),
        };
        let errors = sample.validate().unwrap_err();
        assert_eq!(
            validation_messages(&errors),
            vec!["Invalid email.".to_owned(), "Title is required.".to_owned()]
        );
    }

    #[test]
    fn test_redirect_sets_location() {
        let res = redirect("/index");
        assert_eq!(res.status(), actix_web::http::StatusCode::FOUND);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/index");
    }
}
