//! CSRF (Cross-Site Request Forgery) protection
//!
//! Every session gets one random token. Forms carry it in a hidden
//! `csrf_token` field and POST handlers compare it with the session copy
//! before touching any data:
//!
//! ```html,ignore
//! <form method="post">
//!     <input type="hidden" name="csrf_token" value="{{ client.get_csrf_token() }}">
//! </form>
//! ```
use actix_web::{error, Error};
use rand::{distributions::Alphanumeric, Rng};

pub const CSRF_TOKEN_LENGTH: usize = 32;
const CSRF_SESSION_KEY: &str = "csrf_token";

/// Form structs that carry a CSRF token.
pub trait CsrfForm {
    fn csrf_token(&self) -> &str;
}

/// Generate a new CSRF token
pub fn generate_csrf_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Get or create CSRF token for the current session.
/// Called by the client context middleware on every request.
pub fn get_or_create_csrf_token(session: &actix_session::Session) -> Result<String, Error> {
    match session.get::<String>(CSRF_SESSION_KEY) {
        Ok(Some(token)) => Ok(token),
        _ => {
            let token = generate_csrf_token();
            session
                .insert(CSRF_SESSION_KEY, token.clone())
                .map_err(|_| error::ErrorInternalServerError("Failed to store CSRF token"))?;
            Ok(token)
        }
    }
}

/// Validate CSRF token from form data. Mismatches are 403.
pub fn validate_csrf_token(
    session: &actix_session::Session,
    provided_token: &str,
) -> Result<(), Error> {
    let expected_token = session
        .get::<String>(CSRF_SESSION_KEY)
        .map_err(|_| error::ErrorInternalServerError("Failed to get CSRF token"))?
        .ok_or_else(|| error::ErrorForbidden("CSRF token not found in session"))?;

    if !tokens_match(provided_token, &expected_token) {
        log::warn!("CSRF token validation failed");
        return Err(error::ErrorForbidden("Invalid CSRF token"));
    }

    Ok(())
}

/// Shorthand for handlers taking a [`CsrfForm`].
pub fn validate_form<F: CsrfForm>(session: &actix_session::Session, form: &F) -> Result<(), Error> {
    validate_csrf_token(session, form.csrf_token())
}

/// Length-independent comparison so the check does not leak a matching prefix.
fn tokens_match(provided: &str, expected: &str) -> bool {
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    if a.len() != b.len() || a.is_empty() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
