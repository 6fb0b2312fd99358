//! The registration page for setting the password for accessing the app.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    auth::{count_users, create_user, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner, log_in_register, password_input,
    },
    timezone::get_local_offset,
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

const PASSWORD_EXISTS_ERROR_MSG: &str =
    "Kata sandi sudah dibuat. Silakan masuk dengan kata sandi yang ada.";
const PASSWORD_MISMATCH_ERROR_MSG: &str = "Kata sandi tidak sama.";

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="confirm-password" class=(FORM_LABEL_STYLE)
            {
                "Ulangi Kata Sandi"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()];

            @if let Some(error_message) = error_message
            {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }
        }
    }
}

fn registration_form(
    password: &str,
    password_error_message: Option<&str>,
    confirm_password_error_message: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#password, #confirm-password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (password_input(password, PASSWORD_INPUT_MIN_LENGTH, password_error_message))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, confirm_password_error_message))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Buat Kata Sandi"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Sudah punya kata sandi? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                    "Masuk di sini"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", None, None);
    let content = log_in_register("Buat Kata Sandi", &registration_form);
    base("Daftar", &content).into_response()
}

/// The state needed for creating the password.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered in the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub password: String,
    pub confirm_password: String,
}

fn internal_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
        .into_response()
}

/// Set the password, log the user in and send them to the dashboard.
///
/// Only one password may exist. Weak or mismatched passwords re-render the
/// form with an error message.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let user_count = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| count_users(&connection));

    match user_count {
        Ok(0) => {}
        Ok(_) => {
            return registration_form(&user_data.password, None, Some(PASSWORD_EXISTS_ERROR_MSG))
                .into_response();
        }
        Err(error) => {
            tracing::error!("Could not count users: {error}");
            return internal_error_redirect();
        }
    }

    let validated_password = match ValidatedPassword::new(&user_data.password) {
        Ok(password) => password,
        Err(error) => {
            return registration_form(&user_data.password, Some(&error.to_string()), None)
                .into_response();
        }
    };

    if user_data.password != user_data.confirm_password {
        return registration_form(&user_data.password, None, Some(PASSWORD_MISMATCH_ERROR_MSG))
            .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("An error occurred while hashing a password: {error}");
            return internal_error_redirect();
        }
    };

    let local_offset = match get_local_offset(&state.local_timezone) {
        Ok(offset) => offset,
        Err(error) => return error.into_response(),
    };

    let user = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| create_user(password_hash, &connection));

    let user = match user {
        Ok(user) => user,
        Err(error) => {
            tracing::error!("An error occurred while inserting a new user: {error}");
            return internal_error_redirect();
        }
    };

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_offset) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            internal_error_redirect()
        }
    }
}


#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{FromRef, State},
        http::StatusCode,
    };
    use axum_extra::extract::PrivateCookieJar;
    use rusqlite::Connection;

    use crate::{
        AppState, PasswordHash,
        auth::{COOKIE_TOKEN, count_users, create_user},
        endpoints,
        test_utils::{
            assert_form_error_message, assert_hx_redirect, must_get_form, parse_html_fragment,
        },
    };

    use super::{
        PASSWORD_EXISTS_ERROR_MSG, PASSWORD_MISMATCH_ERROR_MSG, RegisterForm, RegistrationState,
        register_user,
    };

    fn get_test_state() -> RegistrationState {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "42", "Asia/Jakarta")
            .unwrap();

        RegistrationState::from_ref(&state)
    }

    fn form(password: &str, confirm_password: &str) -> Form<RegisterForm> {
        Form(RegisterForm {
            password: password.to_owned(),
            confirm_password: confirm_password.to_owned(),
        })
    }

    async fn post(state: &RegistrationState, form: Form<RegisterForm>) -> axum::response::Response {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        register_user(State(state.clone()), jar, form).await
    }

    #[tokio::test]
    async fn create_user_succeeds() {
        let state = get_test_state();

        let response = post(
            &state,
            form("tabungan-siswa-kelas-enam-b", "tabungan-siswa-kelas-enam-b"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
        let set_cookie = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .any(|header| header.to_str().unwrap().starts_with(COOKIE_TOKEN));
        assert!(set_cookie, "session cookie not set");
        assert_eq!(count_users(&state.db_connection.lock().unwrap()), Ok(1));
    }

    #[tokio::test]
    async fn create_user_fails_with_existing_user() {
        let state = get_test_state();
        create_user(
            PasswordHash::from_raw_password("celengan-ayam-jago-merah", 4).unwrap(),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = post(
            &state,
            form("tabungan-siswa-kelas-enam-b", "tabungan-siswa-kelas-enam-b"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let fragment = parse_html_fragment(response).await;
        assert_form_error_message(&must_get_form(&fragment), PASSWORD_EXISTS_ERROR_MSG);
        assert_eq!(count_users(&state.db_connection.lock().unwrap()), Ok(1));
    }

    #[tokio::test]
    async fn create_user_fails_when_password_is_weak() {
        let state = get_test_state();

        let response = post(&state, form("foo", "foo")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let fragment = parse_html_fragment(response).await;
        let error = fragment
            .select(&scraper::Selector::parse("p.text-red-500").unwrap())
            .next()
            .expect("no error message")
            .text()
            .collect::<String>()
            .to_lowercase();
        assert!(error.contains("password is too weak"), "got {error:?}");
        assert_eq!(count_users(&state.db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn create_user_fails_when_passwords_do_not_match() {
        let state = get_test_state();

        let response = post(
            &state,
            form("tabungan-siswa-kelas-enam-b", "ini-kata-sandi-yang-berbeda"),
        )
        .await;

        let fragment = parse_html_fragment(response).await;
        assert_form_error_message(&must_get_form(&fragment), PASSWORD_MISMATCH_ERROR_MSG);
        assert_eq!(count_users(&state.db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn database_error_redirects_to_error_page() {
        let mut state = get_test_state();
        // No tables, so counting users fails.
        state.db_connection = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));

        let response = post(
            &state,
            form("tabungan-siswa-kelas-enam-b", "tabungan-siswa-kelas-enam-b"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_hx_redirect(&response, endpoints::INTERNAL_ERROR_VIEW);
    }
}
