//! The dashboard page: the student table, the summary and the buttons that
//! open the add-student and transaction modals.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState,
    dashboard::summary::{StudentSummary, summary_view},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DEPOSIT_STYLE, BUTTON_WITHDRAW_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_rupiah,
    },
    navigation::NavBar,
    student::{Student, load_students},
    transaction::TransactionKind,
};

const ADD_STUDENT_BUTTON_STYLE: &str = "px-4 py-2 text-sm font-medium text-white rounded \
    bg-blue-600 hover:bg-blue-700 dark:bg-blue-600 dark:hover:bg-blue-700";

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display every student with their balance.
///
/// If the students cannot be loaded the error is logged and the page is
/// shown as if there were none.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Response {
    let students = load_students(&state.db_connection);

    dashboard_view(&students).into_response()
}

fn transaction_modal_url(student: &Student, kind: TransactionKind) -> String {
    format!(
        "{}?jenis={}",
        format_endpoint(endpoints::NEW_TRANSACTION_VIEW, student.id),
        kind.as_str()
    )
}

fn student_row(number: usize, student: &Student) -> Markup {
    let setor_url = transaction_modal_url(student, TransactionKind::Setor);
    let tarik_url = transaction_modal_url(student, TransactionKind::Tarik);

    html! {
        tr class=(TABLE_ROW_STYLE) data-student-id=(student.id)
        {
            td class=(TABLE_CELL_STYLE) { (number) }
            td class=(TABLE_CELL_STYLE) { (student.nama.as_ref()) }
            td class=(TABLE_CELL_STYLE) { (student.kelas.as_str()) }
            td class=(TABLE_CELL_STYLE) { (format_rupiah(student.saldo as f64)) }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-x-2"
                {
                    a
                        href=(setor_url)
                        hx-get=(setor_url)
                        hx-target="#modal-container"
                        class=(BUTTON_DEPOSIT_STYLE)
                    {
                        "Setor"
                    }

                    a
                        href=(tarik_url)
                        hx-get=(tarik_url)
                        hx-target="#modal-container"
                        class=(BUTTON_WITHDRAW_STYLE)
                    {
                        "Tarik"
                    }
                }
            }
        }
    }
}

fn student_table(students: &[Student]) -> Markup {
    html! {
        div class="w-full overflow-x-auto shadow-md rounded-lg"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        @for heading in ["No", "Nama Siswa", "Kelas", "Saldo", "Aksi"] {
                            th scope="col" class=(TABLE_CELL_STYLE) { (heading) }
                        }
                    }
                }

                tbody
                {
                    @for (index, student) in students.iter().enumerate() {
                        (student_row(index + 1, student))
                    }
                }
            }
        }
    }
}

fn empty_state_view() -> Markup {
    html! {
        div id="empty-state" class="w-full p-8 text-center bg-white rounded-lg shadow dark:bg-gray-800"
        {
            p class="text-lg font-semibold" { "Belum ada siswa." }
            p class="text-gray-500 dark:text-gray-400"
            {
                "Klik \"Tambah Siswa\" untuk menambahkan siswa pertama."
            }
        }
    }
}

fn dashboard_view(students: &[Student]) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let summary = StudentSummary::from_students(students);

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl"
            {
                div class="flex items-center justify-between mb-4"
                {
                    h1 class="text-xl font-bold" { "Daftar Siswa" }

                    a
                        id="add-student"
                        href=(endpoints::NEW_STUDENT_VIEW)
                        hx-get=(endpoints::NEW_STUDENT_VIEW)
                        hx-target="#modal-container"
                        class=(ADD_STUDENT_BUTTON_STYLE)
                    {
                        "Tambah Siswa"
                    }
                }

                @if students.is_empty() {
                    (empty_state_view())
                } @else {
                    (student_table(students))
                }

                @if let Some(summary) = summary {
                    (summary_view(&summary))
                }
            }
        }
    };

    base("Dashboard", &content)
}
