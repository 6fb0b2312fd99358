//! Reading and writing the private session cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    auth::{Token, UserID},
};

pub(crate) const COOKIE_TOKEN: &str = "token";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

/// Add a session cookie to the cookie jar, indicating that a user is logged in.
///
/// The token expires `duration` from now. The expiry is stored in the
/// `local_offset` timezone so that it reads naturally in the logs.
///
/// # Errors
///
/// Returns [Error::InvalidCookie] if the expiry overflows or the token
/// cannot be serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc()
        .to_offset(local_offset)
        .checked_add(duration)
        .ok_or_else(|| Error::InvalidCookie(format!("expiry overflowed adding {duration}")))?;

    set_token_cookie(
        jar,
        Token {
            user_id,
            expires_at,
        },
    )
}

fn set_token_cookie(jar: PrivateCookieJar, token: Token) -> Result<PrivateCookieJar, Error> {
    let token_string =
        serde_json::to_string(&token).map_err(|error| Error::InvalidCookie(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, token_string))
            .expires(token.expires_at)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Read the session token from `jar`.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if there is no session cookie.
/// - [Error::InvalidCookie] if the cookie cannot be decoded or the token has expired.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;

    let token: Token = serde_json::from_str(cookie.value_trimmed())
        .map_err(|error| Error::InvalidCookie(error.to_string()))?;

    if token.is_expired(OffsetDateTime::now_utc()) {
        return Err(Error::InvalidCookie("the session has expired".to_owned()));
    }

    Ok(token)
}

/// Push the session expiry out to `duration` from now, unless it already
/// expires later than that (e.g. the user chose to stay logged in).
///
/// The jar is returned unchanged when no extension is needed.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
/// Returns the errors of [get_token_from_cookies] and [set_auth_cookie].
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;

    let new_expiry = OffsetDateTime::now_utc()
        .to_offset(local_offset)
        .checked_add(duration)
        .ok_or_else(|| Error::InvalidCookie(format!("expiry overflowed adding {duration}")))?;

    if new_expiry <= token.expires_at {
        return Ok(jar);
    }

    set_token_cookie(
        jar,
        Token {
            user_id: token.user_id,
            expires_at: new_expiry,
        },
    )
}

/// Overwrite the session cookie with an expired, empty one so the client deletes it.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}
