//! The deposit/withdrawal modal and the endpoint it submits to.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::{HxRedirect, HxRequest};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DEPOSIT_STYLE, BUTTON_SECONDARY_STYLE, BUTTON_WITHDRAW_STYLE, FORM_ERROR_STYLE,
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, format_rupiah, loading_spinner, modal,
    },
    navigation::NavBar,
    student::{Student, StudentId, get_student},
    transaction::{
        ProcessedTransaction, TransactionKind, TransactionRequest, domain::parse_amount,
        process_transaction,
    },
};

/// The state needed for depositing to and withdrawing from savings.
#[derive(Debug, Clone)]
pub struct TransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Which transaction modal to open. Defaults to a deposit.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionModalQuery {
    pub jenis: Option<TransactionKind>,
}

/// The values submitted from the transaction modal.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionForm {
    pub jenis: TransactionKind,
    /// The balance shown in the modal when it was opened.
    pub saldo: i64,
    pub jumlah: String,
    #[serde(default)]
    pub keterangan: String,
}

/// The student and kind of transaction a modal is for.
pub struct TransactionModal {
    pub student: Student,
    pub kind: TransactionKind,
}

impl TransactionModal {
    fn title(&self) -> &'static str {
        match self.kind {
            TransactionKind::Setor => "Setor Tabungan",
            TransactionKind::Tarik => "Tarik Tabungan",
        }
    }

    fn into_html(self) -> Markup {
        modal(self.title(), &self.form("", "", None))
    }

    fn form(&self, jumlah: &str, keterangan: &str, error_message: Option<&str>) -> Markup {
        let endpoint = format_endpoint(endpoints::STUDENT_TRANSACTIONS_API, self.student.id);
        let submit_style = match self.kind {
            TransactionKind::Setor => BUTTON_DEPOSIT_STYLE,
            TransactionKind::Tarik => BUTTON_WITHDRAW_STYLE,
        };

        html! {
            form
                hx-post=(endpoint)
                hx-swap="outerHTML"
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                class="w-full space-y-4"
            {
                dl class="grid grid-cols-2 gap-2 text-sm"
                {
                    dt class="text-gray-500 dark:text-gray-400" { "Nama" }
                    dd id="student-nama" class="font-semibold" { (self.student.nama.as_ref()) }
                    dt class="text-gray-500 dark:text-gray-400" { "Kelas" }
                    dd id="student-kelas" { (self.student.kelas.as_str()) }
                    dt class="text-gray-500 dark:text-gray-400" { "Saldo saat ini" }
                    dd id="student-saldo" class="font-semibold"
                    {
                        (format_rupiah(self.student.saldo as f64))
                    }
                }

                input type="hidden" name="jenis" value=(self.kind.as_str());
                input type="hidden" name="saldo" value=(self.student.saldo);

                div
                {
                    label for="jumlah" class=(FORM_LABEL_STYLE) { "Jumlah (Rp)" }

                    input
                        id="jumlah"
                        type="number"
                        name="jumlah"
                        min="1"
                        step="1"
                        max=[(self.kind == TransactionKind::Tarik).then_some(self.student.saldo)]
                        placeholder="0"
                        value=(jumlah)
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="keterangan" class=(FORM_LABEL_STYLE) { "Keterangan" }

                    input
                        id="keterangan"
                        type="text"
                        name="keterangan"
                        placeholder="Opsional"
                        value=(keterangan)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                @if let Some(error_message) = error_message {
                    p class=(FORM_ERROR_STYLE) { (error_message) }
                }

                div class="flex gap-x-3"
                {
                    a href=(endpoints::DASHBOARD_VIEW) class=(BUTTON_SECONDARY_STYLE) { "Batal" }

                    button type="submit" id="submit-button" class=(submit_style)
                    {
                        span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                        (self.kind.label())
                    }
                }
            }
        }
    }
}

/// Render the deposit or withdrawal modal for a student.
///
/// htmx requests get just the modal, anything else gets a full page.
pub async fn get_transaction_modal(
    State(state): State<TransactionState>,
    Path(student_id): Path<StudentId>,
    Query(query): Query<TransactionModalQuery>,
    HxRequest(is_htmx_request): HxRequest,
) -> Response {
    let student = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| get_student(student_id, &connection));

    let student = match student {
        Ok(student) => student,
        Err(error) => return error.into_response(),
    };

    let modal = TransactionModal {
        student,
        kind: query.jenis.unwrap_or(TransactionKind::Setor),
    };
    let title = modal.title();
    let modal = modal.into_html();

    if is_htmx_request {
        return modal.into_response();
    }

    let content = html! {
        (NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html())
        (modal)
    };

    base(title, &content).into_response()
}

/// Deposit to or withdraw from a student's savings, then send the client
/// back to the dashboard.
///
/// The balance is checked against the `saldo` the modal was opened with.
/// Invalid amounts, withdrawals larger than the balance and balances that
/// changed in the meantime re-render the form with an error message. Other
/// errors are rendered as an alert.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(student_id): Path<StudentId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let outcome = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| {
            let student = get_student(student_id, &connection)?;

            let result = parse_amount(&form.jumlah).and_then(|amount| {
                let snapshot = Student {
                    saldo: form.saldo,
                    ..student.clone()
                };
                let request = TransactionRequest {
                    kind: form.jenis,
                    amount,
                    keterangan: form.keterangan.clone(),
                };

                process_transaction(&snapshot, request, &connection)
            });

            Ok((student, result))
        });

    let (student, result) = match outcome {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::error!("Could not load student {student_id} for a transaction: {error}");
            return error.into_alert_response();
        }
    };

    match result {
        Ok(ProcessedTransaction {
            student,
            transaction,
        }) => {
            tracing::info!(
                "{} {} for {} ({}): {} -> {}",
                transaction.kind.label(),
                transaction.amount,
                student.nama,
                student.id,
                transaction.saldo_before,
                transaction.saldo_after
            );

            (
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::StaleBalance { .. }) => {
            tracing::warn!("Rejected transaction for student {student_id}: {error}");

            let message = stale_balance_message(student.saldo);
            let modal = TransactionModal {
                student,
                kind: form.jenis,
            };

            modal
                .form(&form.jumlah, &form.keterangan, Some(&message))
                .into_response()
        }
        Err(error @ (Error::InvalidAmount(_) | Error::InsufficientBalance { .. })) => {
            // The balance check ran against the submitted snapshot, so a
            // shortfall is only reported once the snapshot is current.
            let message = match error {
                Error::InsufficientBalance { .. } if form.saldo != student.saldo => {
                    stale_balance_message(student.saldo)
                }
                error => validation_message(&error, &form.jumlah),
            };
            let modal = TransactionModal {
                student,
                kind: form.jenis,
            };

            modal
                .form(&form.jumlah, &form.keterangan, Some(&message))
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not process transaction for student {student_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn stale_balance_message(saldo: i64) -> String {
    format!(
        "Saldo sudah berubah menjadi {}. Periksa kembali lalu kirim ulang.",
        format_rupiah(saldo as f64)
    )
}

fn validation_message(error: &Error, raw_amount: &str) -> String {
    match error {
        Error::InsufficientBalance { saldo, .. } => format!(
            "Saldo tidak mencukupi. Saldo saat ini {}.",
            format_rupiah(*saldo as f64)
        ),
        Error::InvalidAmount(_) => {
            let raw_amount = raw_amount.trim();

            match raw_amount.parse::<i64>() {
                Ok(amount) if amount <= 0 => "Jumlah harus lebih dari 0.".to_owned(),
                Ok(_) => "Jumlah terlalu besar.".to_owned(),
                // Whole numbers that do not fit in an i64.
                Err(_) if raw_amount.starts_with('-') && is_digits(&raw_amount[1..]) => {
                    "Jumlah harus lebih dari 0.".to_owned()
                }
                Err(_) if is_digits(raw_amount.strip_prefix('+').unwrap_or(raw_amount)) => {
                    "Jumlah terlalu besar.".to_owned()
                }
                Err(_) => "Jumlah harus berupa angka bulat.".to_owned(),
            }
        }
        _ => "Transaksi tidak valid.".to_owned(),
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit())
}
