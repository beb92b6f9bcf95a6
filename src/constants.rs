//! Application-wide constants

/// Default username displayed for unauthenticated users
pub const GUEST_USERNAME: &str = "Guest";

/// Cookie selecting which side of the follow graph `/follows/<nickname>` lists.
/// A non-empty value lists followers, an empty value lists followed users.
pub const SHOW_FOLLOWED_COOKIE: &str = "show_followed";

/// Lifetime of the `show_followed` cookie in days
pub const SHOW_FOLLOWED_MAX_AGE_DAYS: i64 = 30;

/// Query value for `page` that selects the last page of comments
pub const LAST_PAGE: i64 = -1;
