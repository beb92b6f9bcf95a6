//! Password hashing and the login state kept in the signed session cookie.
//!
//! A login stores the user id and an absolute expiry. "Remember me" logins get
//! `security.remember_me_days`, others `security.session_timeout_minutes`.
//! An expired login is cleared the next time it is read.

use actix_session::Session;
use actix_web::{error, Error};
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::Utc;
use once_cell::sync::Lazy;

static ARGON2: Lazy<Argon2<'static>> = Lazy::new(Argon2::default);

const SESSION_USER_ID: &str = "user_id";
const SESSION_EXPIRES_AT: &str = "expires_at";

pub fn get_argon2() -> &'static Argon2<'static> {
    &ARGON2
}

/// Hashes a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    Ok(get_argon2()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))?
        .to_string())
}

/// Checks a password against a stored PHC string. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("verify_password: stored hash is malformed: {}", e);
            false
        }
    }
}

/// Binds the session to `user_id`.
pub fn start_session(session: &Session, user_id: i32, remember: bool) -> Result<(), Error> {
    let security = crate::app_config::security();
    let lifetime = if remember {
        chrono::Duration::days(i64::from(security.remember_me_days))
    } else {
        chrono::Duration::minutes(i64::from(security.session_timeout_minutes))
    };
    let expires_at = (Utc::now() + lifetime).timestamp();

    session.renew();
    session
        .insert(SESSION_USER_ID, user_id)
        .map_err(|_| error::ErrorInternalServerError("middleware error"))?;
    session
        .insert(SESSION_EXPIRES_AT, expires_at)
        .map_err(|_| error::ErrorInternalServerError("middleware error"))?;

    Ok(())
}

/// Forgets the login but keeps the rest of the session (CSRF token, flashes).
pub fn end_session(session: &Session) {
    session.remove(SESSION_USER_ID);
    session.remove(SESSION_EXPIRES_AT);
}

/// Returns the user id of a live login, clearing it when it has expired.
pub fn get_session_user_id(session: &Session) -> Option<i32> {
    let user_id = session.get::<i32>(SESSION_USER_ID).ok().flatten()?;
    let expires_at = session.get::<i64>(SESSION_EXPIRES_AT).ok().flatten()?;

    if expires_at < Utc::now().timestamp() {
        log::debug!("session for user_id={} expired", user_id);
        end_session(session);
        return None;
    }

    Some(user_id)
}
