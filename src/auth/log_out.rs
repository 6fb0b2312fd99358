//! Log-out route handler that ends the session and redirects to the log-in page.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    Error,
    auth::{cookie::COOKIE_TOKEN, invalidate_auth_cookie},
    endpoints,
};

/// End the session held in `jar`.
///
/// # Errors
///
/// Returns [Error::CookieMissing] if nobody is logged in. The jar is left untouched.
pub fn sign_out(jar: PrivateCookieJar) -> Result<PrivateCookieJar, Error> {
    if jar.get(COOKIE_TOKEN).is_none() {
        return Err(Error::CookieMissing);
    }

    Ok(invalidate_auth_cookie(jar))
}

/// Invalidate the session cookie and redirect the client to the log-in page.
///
/// The redirect happens even when there was no session to end.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    let jar = match sign_out(jar.clone()) {
        Ok(jar) => jar,
        Err(error) => {
            tracing::warn!("Could not sign out: {error}");
            jar
        }
    };

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}

#[cfg(test)]
mod log_out_tests {
    use axum::http::{StatusCode, header::SET_COOKIE};
    use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
    use time::{Duration, UtcOffset};

    use crate::{
        Error,
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, UserID, set_auth_cookie},
        endpoints,
    };

    use super::{get_log_out, sign_out};

    fn get_jar() -> PrivateCookieJar {
        PrivateCookieJar::new(create_cookie_key("42"))
    }

    #[tokio::test]
    async fn log_out_invalidates_cookie_and_redirects() {
        let jar = set_auth_cookie(
            get_jar(),
            UserID::new(1),
            DEFAULT_COOKIE_DURATION,
            UtcOffset::UTC,
        )
        .unwrap();

        let response = get_log_out(jar).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::LOG_IN_VIEW
        );
        let set_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|header| Cookie::parse(header.to_str().unwrap().to_owned()).unwrap())
            .find(|cookie| cookie.name() == COOKIE_TOKEN)
            .expect("session cookie not reset");
        assert_eq!(set_cookie.max_age(), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn log_out_without_session_still_redirects() {
        let response = get_log_out(get_jar()).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::LOG_IN_VIEW
        );
    }

    #[test]
    fn sign_out_without_session_is_an_error() {
        assert!(matches!(sign_out(get_jar()), Err(Error::CookieMissing)));
    }
}
