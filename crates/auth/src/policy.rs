//! Credential syntax policy.
//!
//! Pure checks over a candidate username/password pair. A violation is a
//! normal outcome (`false`), never an error.

/// Minimum username length.
pub const USERNAME_MIN_LEN: usize = 4;
/// Maximum username length.
pub const USERNAME_MAX_LEN: usize = 30;
/// Minimum password length.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Validate a candidate username/password pair against the syntactic policy.
///
/// Rules:
/// - username: 4–30 characters, lowercase ASCII letters and `_` only;
/// - password: at least 8 characters, containing at least one ASCII letter
///   and at least one ASCII digit;
/// - the username must not equal the password.
#[must_use]
pub fn validate(username: &str, password: &str) -> bool {
    username != password && legal_username(username) && legal_password(password)
}

fn legal_username(username: &str) -> bool {
    let len = username.chars().count();
    (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len)
        && username.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}

fn legal_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN_LEN
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}
