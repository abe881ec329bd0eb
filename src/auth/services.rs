use lazy_static::lazy_static;
use regex::Regex;

use super::{
    dto::{AuthResponse, PublicUser},
    jwt::JwtKeys,
    repo_types::User,
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email regex");
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Sign a token for `user` and wrap it in the auth response.
pub(crate) fn issue_session(
    keys: &JwtKeys,
    user: User,
    message: &str,
) -> anyhow::Result<AuthResponse> {
    let token = keys.sign(user.id)?;
    Ok(AuthResponse {
        success: true,
        message: message.to_string(),
        token,
        user: PublicUser::from(user),
    })
}
