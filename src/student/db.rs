//! Database operations for students.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    student::{NewStudent, Student, StudentId, StudentName},
};

/// Save a new student and return it with its generated ID and creation time.
///
/// # Errors
///
/// Returns [Error::SqlError] if the insert failed.
pub fn create_student(new_student: NewStudent, connection: &Connection) -> Result<Student, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO student (nama, kelas, saldo, created_at) VALUES (?1, ?2, ?3, ?4);",
        (
            new_student.nama.as_ref(),
            new_student.kelas,
            new_student.saldo,
            created_at,
        ),
    )?;

    Ok(Student {
        id: connection.last_insert_rowid(),
        nama: new_student.nama,
        kelas: new_student.kelas,
        saldo: new_student.saldo,
        created_at,
    })
}

/// Retrieve a single student by ID.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no student with `student_id`.
pub fn get_student(student_id: StudentId, connection: &Connection) -> Result<Student, Error> {
    connection
        .prepare("SELECT id, nama, kelas, saldo, created_at FROM student WHERE id = :id;")?
        .query_row(&[(":id", &student_id)], map_row)
        .map_err(Error::from)
}

/// Retrieve every student ordered by class, then by name.
pub fn list_students(connection: &Connection) -> Result<Vec<Student>, Error> {
    connection
        .prepare(
            "SELECT id, nama, kelas, saldo, created_at FROM student
            ORDER BY kelas ASC, nama ASC;",
        )?
        .query_map([], map_row)?
        .map(|maybe_student| maybe_student.map_err(Error::from))
        .collect()
}

/// Get the students for the dashboard.
///
/// Errors are logged and an empty list is returned in their place, so the
/// page still renders when the database is unavailable.
pub fn load_students(db_connection: &Arc<Mutex<Connection>>) -> Vec<Student> {
    let students = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| list_students(&connection));

    students.unwrap_or_else(|error| {
        tracing::error!("Could not load students: {error}");
        Vec::new()
    })
}

/// Initialize the student table and indexes.
pub fn create_student_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS student (
            id INTEGER PRIMARY KEY,
            nama TEXT NOT NULL,
            kelas TEXT NOT NULL,
            saldo INTEGER NOT NULL DEFAULT 0 CHECK (saldo >= 0),
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_student_kelas_nama ON student(kelas, nama);",
    )?;

    Ok(())
}

pub(crate) fn map_row(row: &Row) -> Result<Student, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_nama: String = row.get(1)?;
    let kelas = row.get(2)?;
    let saldo = row.get(3)?;
    let created_at = row.get(4)?;

    Ok(Student {
        id,
        nama: StudentName::new_unchecked(&raw_nama),
        kelas,
        saldo,
        created_at,
    })
}

#[cfg(test)]
mod student_query_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::Duration;

    use crate::{
        Error,
        student::{Kelas, NewStudent, StudentName},
    };

    use super::{create_student, create_student_table, get_student, list_students, load_students};

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_student_table(&connection).expect("Could not create student table");
        connection
    }

    fn new_student(nama: &str, kelas: Kelas, saldo: i64) -> NewStudent {
        NewStudent {
            nama: StudentName::new_unchecked(nama),
            kelas,
            saldo,
        }
    }

    #[test]
    fn create_then_get_student() {
        let connection = get_test_db_connection();

        let created = create_student(new_student("Ahmad", Kelas::OneA, 10_000), &connection)
            .expect("Could not create student");
        let fetched = get_student(created.id, &connection).expect("Could not get student");

        assert!(created.id > 0);
        assert_eq!(fetched.nama.as_ref(), "Ahmad");
        assert_eq!(fetched.kelas, Kelas::OneA);
        assert_eq!(fetched.saldo, 10_000);
        assert!((fetched.created_at - created.created_at).abs() < Duration::seconds(1));
    }

    #[test]
    fn get_missing_student_returns_not_found() {
        let connection = get_test_db_connection();

        assert_eq!(get_student(42, &connection), Err(Error::NotFound));
    }

    #[test]
    fn negative_saldo_is_rejected_by_the_database() {
        let connection = get_test_db_connection();

        let result = create_student(new_student("Budi", Kelas::OneB, -1), &connection);

        assert!(matches!(result, Err(Error::SqlError(_))));
        assert_eq!(list_students(&connection), Ok(vec![]));
    }

    #[test]
    fn list_orders_by_kelas_then_nama() {
        let connection = get_test_db_connection();
        for (nama, kelas) in [
            ("Siti", Kelas::TwoB),
            ("Budi", Kelas::OneA),
            ("Ahmad", Kelas::TwoB),
            ("Citra", Kelas::OneA),
            ("Dewi", Kelas::SixA),
        ] {
            create_student(new_student(nama, kelas, 0), &connection).unwrap();
        }

        let got = list_students(&connection)
            .unwrap()
            .into_iter()
            .map(|student| (student.kelas, student.nama.to_string()))
            .collect::<Vec<_>>();

        assert_eq!(
            got,
            vec![
                (Kelas::OneA, "Budi".to_owned()),
                (Kelas::OneA, "Citra".to_owned()),
                (Kelas::TwoB, "Ahmad".to_owned()),
                (Kelas::TwoB, "Siti".to_owned()),
                (Kelas::SixA, "Dewi".to_owned()),
            ]
        );
    }

    #[test]
    fn load_students_swallows_errors() {
        // No student table, so the query fails.
        let connection = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));

        assert_eq!(load_students(&connection), vec![]);
    }
}
