//! TabunganKu SD is a web app for tracking the savings of elementary school
//! students.
//!
//! Teachers log in with a single password, see every student's balance
//! (saldo) on the dashboard, add students, and record deposits (setor) and
//! withdrawals (tarik). Every balance change is recorded as an immutable
//! transaction.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod dashboard;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod student;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, ValidatedPassword, get_user_by_id};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;
pub use student::{
    Kelas, NewStudent, Student, StudentId, StudentName, create_student, get_student, list_students,
};
pub use timezone::get_local_offset;
pub use transaction::{
    ProcessedTransaction, Transaction, TransactionId, TransactionKind, TransactionRequest,
    list_student_transactions, process_transaction,
};

use crate::{
    alert::Alert, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The session token is missing from the cookie jar, i.e. nobody is
    /// logged in.
    #[error("no session cookie in the cookie jar")]
    CookieMissing,

    /// The session token could not be read or its expiry could not be
    /// computed.
    #[error("invalid session cookie: {0}")]
    InvalidCookie(String),

    /// An empty (or whitespace only) string was used as a student's name.
    #[error("student name cannot be empty")]
    EmptyStudentName,

    /// The class code is empty or not one of the classes in the school.
    #[error("\"{0}\" is not a valid class")]
    InvalidKelas(String),

    /// The initial balance for a new student is not a non-negative integer.
    #[error("\"{0}\" is not a valid initial balance")]
    InvalidInitialSaldo(String),

    /// The transaction amount is not a positive integer, or applying it
    /// would overflow the balance.
    #[error("\"{0}\" is not a valid transaction amount")]
    InvalidAmount(String),

    /// A withdrawal asked for more money than the student has saved.
    #[error("cannot withdraw {amount} from a balance of {saldo}")]
    InsufficientBalance {
        /// The student's balance when the withdrawal was attempted.
        saldo: i64,
        /// The amount that was requested.
        amount: i64,
    },

    /// The student's balance in the database no longer matches the balance
    /// the transaction was computed from.
    ///
    /// This happens when another transaction for the same student was
    /// committed after the form was opened. Nothing is written; the client
    /// should reload the balance and try again.
    #[error("the balance changed since it was read, expected {expected}")]
    StaleBalance {
        /// The balance the caller expected the student to have.
        expected: i64,
    },

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error, e.g. a failed write.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock, the store is unavailable.
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Zona Waktu Tidak Valid",
                fix: &format!(
                    "Zona waktu \"{timezone}\" tidak dikenal. Periksa pengaturan server dan \
                    pastikan zona waktu berupa nama kanonis, misalnya \"Asia/Jakarta\"."
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError {
                description: "Basis Data Tidak Tersedia",
                fix: "Coba lagi beberapa saat lagi.",
            }
            .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert {
                    message: "Data tidak ditemukan".to_owned(),
                    details: "Siswa tidak ditemukan. Muat ulang halaman lalu coba lagi.".to_owned(),
                },
            ),
            Error::DatabaseLockError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert {
                    message: "Basis data tidak tersedia".to_owned(),
                    details: "Coba lagi beberapa saat lagi.".to_owned(),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert {
                    message: "Zona waktu tidak valid".to_owned(),
                    details: format!(
                        "Zona waktu \"{timezone}\" tidak dikenal. Periksa pengaturan server."
                    ),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert {
                        message: "Terjadi kesalahan".to_owned(),
                        details: "Gagal menyimpan data, coba lagi.".to_owned(),
                    },
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}
