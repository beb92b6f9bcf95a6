//! One-shot notices carried in the session to the next rendered page.

use actix_session::Session;

const FLASH_SESSION_KEY: &str = "_flashes";

/// Queues a message for the next page render.
pub fn flash<S: Into<String>>(session: &Session, message: S) {
    let mut messages = session
        .get::<Vec<String>>(FLASH_SESSION_KEY)
        .ok()
        .flatten()
        .unwrap_or_default();
    messages.push(message.into());

    if let Err(e) = session.insert(FLASH_SESSION_KEY, messages) {
        log::error!("flash: failed to store message: {}", e);
    }
}

/// Removes and returns every queued message.
pub fn take_flashes(session: &Session) -> Vec<String> {
    match session.remove_as::<Vec<String>>(FLASH_SESSION_KEY) {
        Some(Ok(messages)) => messages,
        Some(Err(raw)) => {
            log::warn!("take_flashes: discarding unreadable value {}", raw);
            Vec::new()
        }
        None => Vec::new(),
    }
}
