//! The totals shown under the student table.

use maud::{Markup, html};

use crate::{html::format_rupiah, student::Student};

/// Aggregate figures over every student.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct StudentSummary {
    pub count: usize,
    pub total_saldo: i64,
    pub average_saldo: f64,
}

impl StudentSummary {
    /// Summarise `students`, or `None` if there are none.
    pub fn from_students(students: &[Student]) -> Option<Self> {
        if students.is_empty() {
            return None;
        }

        let count = students.len();
        let total_saldo = students
            .iter()
            .fold(0_i64, |total, student| total.saturating_add(student.saldo));

        Some(Self {
            count,
            total_saldo,
            average_saldo: total_saldo as f64 / count as f64,
        })
    }
}

fn summary_card(id: &str, label: &str, value: &str) -> Markup {
    html! {
        div class="p-4 bg-white rounded-lg shadow dark:bg-gray-800"
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p id=(id) class="mt-1 text-2xl font-semibold" { (value) }
        }
    }
}

pub(super) fn summary_view(summary: &StudentSummary) -> Markup {
    html! {
        section id="summary" class="grid w-full grid-cols-1 gap-4 mt-6 sm:grid-cols-3"
        {
            (summary_card("total-siswa", "Total Siswa", &summary.count.to_string()))
            (summary_card("total-saldo", "Total Saldo", &format_rupiah(summary.total_saldo as f64)))
            (summary_card(
                "rata-rata-saldo",
                "Rata-rata Saldo",
                &format_rupiah(summary.average_saldo),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use crate::student::{Kelas, Student, StudentName};

    use super::StudentSummary;

    fn student(id: i64, saldo: i64) -> Student {
        Student {
            id,
            nama: StudentName::new_unchecked("Siswa"),
            kelas: Kelas::ThreeA,
            saldo,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn no_students_has_no_summary() {
        assert_eq!(StudentSummary::from_students(&[]), None);
    }

    #[test]
    fn summarises_count_total_and_average() {
        let students = [student(1, 10_000), student(2, 0), student(3, 5_000)];

        let summary = StudentSummary::from_students(&students).unwrap();

        assert_eq!(summary.count, 3);
        assert_eq!(summary.total_saldo, 15_000);
        assert_eq!(summary.average_saldo, 5_000.0);
    }

    #[test]
    fn total_saturates_instead_of_overflowing() {
        let students = [student(1, i64::MAX), student(2, 1)];

        let summary = StudentSummary::from_students(&students).unwrap();

        assert_eq!(summary.total_saldo, i64::MAX);
    }
}
