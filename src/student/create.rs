//! The add-student modal and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::{HxRedirect, HxRequest};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base, loading_spinner, modal,
    },
    navigation::NavBar,
    student::{Kelas, NewStudent, create_student, domain::StudentFormData},
};

/// The state needed for adding a student.
#[derive(Debug, Clone)]
pub struct CreateStudentState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateStudentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the add-student modal.
///
/// htmx requests get just the modal for the dashboard's modal container,
/// anything else gets a full page.
pub async fn get_new_student_modal(HxRequest(is_htmx_request): HxRequest) -> Response {
    let modal = new_student_modal(&StudentFormData::default(), None);

    if is_htmx_request {
        return modal.into_response();
    }

    let content = html! {
        (NavBar::new(endpoints::NEW_STUDENT_VIEW).into_html())
        (modal)
    };

    base("Tambah Siswa", &content).into_response()
}

/// Validate and save a new student, then send the client back to the dashboard.
///
/// Invalid input re-renders the form with an error message. Database errors
/// are rendered as an alert.
pub async fn create_student_endpoint(
    State(state): State<CreateStudentState>,
    Form(form): Form<StudentFormData>,
) -> Response {
    let new_student = match NewStudent::parse(&form.nama, &form.kelas, &form.saldo) {
        Ok(new_student) => new_student,
        Err(error) => {
            return new_student_form(&form, Some(validation_message(&error))).into_response();
        }
    };

    let student = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| create_student(new_student, &connection));

    match student {
        Ok(student) => {
            tracing::info!(
                "Added student {} ({}) to kelas {} with saldo {}",
                student.nama,
                student.id,
                student.kelas,
                student.saldo
            );

            (
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while adding a student: {error}");

            error.into_alert_response()
        }
    }
}

fn validation_message(error: &Error) -> &'static str {
    match error {
        Error::EmptyStudentName => "Nama siswa wajib diisi.",
        Error::InvalidKelas(_) => "Pilih kelas yang tersedia.",
        Error::InvalidInitialSaldo(_) => "Saldo awal harus berupa angka bulat 0 atau lebih.",
        _ => "Data siswa tidak valid.",
    }
}

fn new_student_modal(form: &StudentFormData, error_message: Option<&str>) -> Markup {
    modal("Tambah Siswa Baru", &new_student_form(form, error_message))
}

fn new_student_form(form: &StudentFormData, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::STUDENTS_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4"
        {
            div
            {
                label for="nama" class=(FORM_LABEL_STYLE) { "Nama Siswa" }

                input
                    id="nama"
                    type="text"
                    name="nama"
                    placeholder="Nama lengkap siswa"
                    value=(form.nama)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="kelas" class=(FORM_LABEL_STYLE) { "Kelas" }

                select id="kelas" name="kelas" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" disabled selected[form.kelas.is_empty()] { "Pilih kelas" }

                    @for kelas in Kelas::ALL {
                        option value=(kelas.as_str()) selected[form.kelas == kelas.as_str()]
                        {
                            "Kelas " (kelas.as_str())
                        }
                    }
                }
            }

            div
            {
                label for="saldo" class=(FORM_LABEL_STYLE) { "Saldo Awal (Rp)" }

                input
                    id="saldo"
                    type="number"
                    name="saldo"
                    min="0"
                    step="1"
                    placeholder="0"
                    value=(form.saldo)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            div class="flex gap-x-3"
            {
                a href=(endpoints::DASHBOARD_VIEW) class=(BUTTON_SECONDARY_STYLE) { "Batal" }

                button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                    "Simpan"
                }
            }
        }
    }
}
