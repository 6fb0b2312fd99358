//! Applies deposits and withdrawals to a student's balance.
//!
//! The balance update and the transaction record are written in one SQL
//! transaction. The update only succeeds if the stored balance still equals
//! the balance the caller read, so a transaction computed from a stale
//! balance is rejected instead of overwriting a newer one.

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior};
use time::OffsetDateTime;

use crate::{
    Error,
    student::{Student, StudentId, StudentName},
    transaction::{
        Transaction, TransactionKind, TransactionRequest, domain::normalize_keterangan,
    },
};

/// The result of a successful transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedTransaction {
    /// The student with their new balance.
    pub student: Student,
    /// The record of the change.
    pub transaction: Transaction,
}

/// Deposit to or withdraw from `student`'s savings.
///
/// `student.saldo` is the balance the request was made against. Nothing is
/// written unless the stored balance still matches it.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidAmount] if the amount is not positive or the new balance would overflow.
/// - [Error::InsufficientBalance] if a withdrawal is larger than the balance.
/// - [Error::StaleBalance] if the stored balance changed since `student` was read.
/// - [Error::NotFound] if the student no longer exists.
/// - [Error::SqlError] if either write failed. Both writes are rolled back.
pub fn process_transaction(
    student: &Student,
    request: TransactionRequest,
    connection: &Connection,
) -> Result<ProcessedTransaction, Error> {
    let new_saldo = apply(student.saldo, request.kind, request.amount)?;
    let keterangan = normalize_keterangan(&request.keterangan);
    let timestamp = OffsetDateTime::now_utc();

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let rows_affected = sql_transaction.execute(
        "UPDATE student SET saldo = ?1 WHERE id = ?2 AND saldo = ?3",
        (new_saldo, student.id, student.saldo),
    )?;

    if rows_affected == 0 {
        let exists: bool = sql_transaction.query_row(
            "SELECT EXISTS(SELECT 1 FROM student WHERE id = ?1)",
            [student.id],
            |row| row.get(0),
        )?;

        return Err(if exists {
            Error::StaleBalance {
                expected: student.saldo,
            }
        } else {
            Error::NotFound
        });
    }

    sql_transaction.execute(
        "INSERT INTO \"transaction\"
            (student_id, student_name, kelas, kind, amount, keterangan, saldo_before, saldo_after, timestamp)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        (
            student.id,
            student.nama.as_ref(),
            student.kelas,
            request.kind,
            request.amount,
            &keterangan,
            student.saldo,
            new_saldo,
            timestamp,
        ),
    )?;
    let transaction_id = sql_transaction.last_insert_rowid();

    sql_transaction.commit()?;

    Ok(ProcessedTransaction {
        student: Student {
            saldo: new_saldo,
            ..student.clone()
        },
        transaction: Transaction {
            id: transaction_id,
            student_id: student.id,
            student_name: student.nama.clone(),
            kelas: student.kelas,
            kind: request.kind,
            amount: request.amount,
            keterangan,
            saldo_before: student.saldo,
            saldo_after: new_saldo,
            timestamp,
        },
    })
}

/// Compute the balance after applying `amount` to `saldo`.
fn apply(saldo: i64, kind: TransactionKind, amount: i64) -> Result<i64, Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount(amount.to_string()));
    }

    match kind {
        TransactionKind::Setor => saldo
            .checked_add(amount)
            .ok_or_else(|| Error::InvalidAmount(amount.to_string())),
        TransactionKind::Tarik if amount > saldo => {
            Err(Error::InsufficientBalance { saldo, amount })
        }
        TransactionKind::Tarik => Ok(saldo - amount),
    }
}

/// Get a student's transactions, oldest first.
pub fn list_student_transactions(
    student_id: StudentId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, student_id, student_name, kelas, kind, amount, keterangan,
                saldo_before, saldo_after, timestamp
            FROM \"transaction\"
            WHERE student_id = :student_id
            ORDER BY id ASC;",
        )?
        .query_map(&[(":student_id", &student_id)], map_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Initialize the transaction table and indexes.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            student_id INTEGER NOT NULL,
            student_name TEXT NOT NULL,
            kelas TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('setor', 'tarik')),
            amount INTEGER NOT NULL CHECK (amount > 0),
            keterangan TEXT NOT NULL DEFAULT '-',
            saldo_before INTEGER NOT NULL CHECK (saldo_before >= 0),
            saldo_after INTEGER NOT NULL CHECK (saldo_after >= 0),
            timestamp TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_student_id ON \"transaction\"(student_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_student_name: String = row.get(2)?;

    Ok(Transaction {
        id: row.get(0)?,
        student_id: row.get(1)?,
        student_name: StudentName::new_unchecked(&raw_student_name),
        kelas: row.get(3)?,
        kind: row.get(4)?,
        amount: row.get(5)?,
        keterangan: row.get(6)?,
        saldo_before: row.get(7)?,
        saldo_after: row.get(8)?,
        timestamp: row.get(9)?,
    })
}

#[cfg(test)]
mod process_transaction_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        student::{Kelas, NewStudent, Student, StudentName, create_student, get_student},
        transaction::{TransactionKind, TransactionRequest},
    };

    use super::{list_student_transactions, process_transaction};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn create_test_student(nama: &str, kelas: Kelas, saldo: i64, connection: &Connection) -> Student {
        create_student(
            NewStudent {
                nama: StudentName::new_unchecked(nama),
                kelas,
                saldo,
            },
            connection,
        )
        .unwrap()
    }

    fn request(kind: TransactionKind, amount: i64, keterangan: &str) -> TransactionRequest {
        TransactionRequest {
            kind,
            amount,
            keterangan: keterangan.to_owned(),
        }
    }

    #[track_caller]
    fn assert_saldo(student: &Student, want: i64, connection: &Connection) {
        assert_eq!(get_student(student.id, connection).unwrap().saldo, want);
    }

    #[test]
    fn setor_adds_to_saldo() {
        let connection = get_test_connection();
        let ahmad = create_test_student("Ahmad", Kelas::OneA, 10_000, &connection);

        let result = process_transaction(
            &ahmad,
            request(TransactionKind::Setor, 5_000, "uang saku"),
            &connection,
        )
        .unwrap();

        assert_eq!(result.student.saldo, 15_000);
        assert_eq!(result.transaction.kind, TransactionKind::Setor);
        assert_eq!(result.transaction.amount, 5_000);
        assert_eq!(result.transaction.saldo_before, 10_000);
        assert_eq!(result.transaction.saldo_after, 15_000);
        assert_eq!(result.transaction.keterangan, "uang saku");
        assert_eq!(result.transaction.student_name.as_ref(), "Ahmad");
        assert_eq!(result.transaction.kelas, Kelas::OneA);
        assert_saldo(&ahmad, 15_000, &connection);
        let stored = list_student_transactions(ahmad.id, &connection).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, result.transaction.id);
        assert_eq!(stored[0].saldo_after, 15_000);
    }

    #[test]
    fn tarik_subtracts_from_saldo() {
        let connection = get_test_connection();
        let ahmad = create_test_student("Ahmad", Kelas::OneA, 10_000, &connection);

        let result =
            process_transaction(&ahmad, request(TransactionKind::Tarik, 4_000, ""), &connection)
                .unwrap();

        assert_eq!(result.student.saldo, 6_000);
        assert_eq!(result.transaction.saldo_before, 10_000);
        assert_eq!(result.transaction.saldo_after, 6_000);
        assert_saldo(&ahmad, 6_000, &connection);
    }

    #[test]
    fn tarik_entire_saldo_leaves_zero() {
        let connection = get_test_connection();
        let ahmad = create_test_student("Ahmad", Kelas::OneA, 10_000, &connection);

        let result =
            process_transaction(&ahmad, request(TransactionKind::Tarik, 10_000, ""), &connection)
                .unwrap();

        assert_eq!(result.student.saldo, 0);
        assert_eq!(result.transaction.saldo_before, 10_000);
        assert_eq!(result.transaction.saldo_after, 0);
        assert_saldo(&ahmad, 0, &connection);
    }

    #[test]
    fn tarik_more_than_saldo_is_rejected() {
        let connection = get_test_connection();
        let ahmad = create_test_student("Ahmad", Kelas::OneA, 10_000, &connection);

        let result =
            process_transaction(&ahmad, request(TransactionKind::Tarik, 20_000, ""), &connection);

        assert_eq!(
            result,
            Err(Error::InsufficientBalance {
                saldo: 10_000,
                amount: 20_000
            })
        );
        assert_saldo(&ahmad, 10_000, &connection);
        assert_eq!(list_student_transactions(ahmad.id, &connection), Ok(vec![]));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let connection = get_test_connection();
        let ahmad = create_test_student("Ahmad", Kelas::OneA, 10_000, &connection);

        for (kind, amount) in [
            (TransactionKind::Setor, 0),
            (TransactionKind::Setor, -5_000),
            (TransactionKind::Tarik, 0),
            (TransactionKind::Tarik, -1),
        ] {
            let result = process_transaction(&ahmad, request(kind, amount, ""), &connection);

            assert_eq!(result, Err(Error::InvalidAmount(amount.to_string())));
        }

        assert_saldo(&ahmad, 10_000, &connection);
        assert_eq!(list_student_transactions(ahmad.id, &connection), Ok(vec![]));
    }

    #[test]
    fn overflowing_setor_is_rejected() {
        let connection = get_test_connection();
        let ahmad = create_test_student("Ahmad", Kelas::OneA, i64::MAX - 1, &connection);

        let result =
            process_transaction(&ahmad, request(TransactionKind::Setor, 2, ""), &connection);

        assert_eq!(result, Err(Error::InvalidAmount("2".to_owned())));
        assert_saldo(&ahmad, i64::MAX - 1, &connection);
    }

    #[test]
    fn stale_saldo_is_rejected_and_nothing_is_written() {
        let connection = get_test_connection();
        let ahmad = create_test_student("Ahmad", Kelas::OneA, 10_000, &connection);
        process_transaction(&ahmad, request(TransactionKind::Setor, 5_000, ""), &connection)
            .unwrap();

        // `ahmad` still has the balance from before the deposit.
        let result =
            process_transaction(&ahmad, request(TransactionKind::Tarik, 10_000, ""), &connection);

        assert_eq!(result, Err(Error::StaleBalance { expected: 10_000 }));
        assert_saldo(&ahmad, 15_000, &connection);
        assert_eq!(
            list_student_transactions(ahmad.id, &connection).unwrap().len(),
            1
        );
    }

    #[test]
    fn missing_student_is_not_found() {
        let connection = get_test_connection();
        let ahmad = create_test_student("Ahmad", Kelas::OneA, 10_000, &connection);
        let ghost = Student {
            id: ahmad.id + 100,
            ..ahmad.clone()
        };

        let result =
            process_transaction(&ghost, request(TransactionKind::Setor, 5_000, ""), &connection);

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(list_student_transactions(ghost.id, &connection), Ok(vec![]));
    }

    #[test]
    fn empty_keterangan_is_stored_as_dash() {
        let connection = get_test_connection();
        let siti = create_test_student("Siti", Kelas::TwoB, 0, &connection);

        let result =
            process_transaction(&siti, request(TransactionKind::Setor, 2_000, "   "), &connection)
                .unwrap();

        assert_eq!(result.transaction.keterangan, "-");
        let stored = list_student_transactions(siti.id, &connection).unwrap();
        assert_eq!(stored[0].keterangan, "-");
    }

    #[test]
    fn saldo_matches_latest_saldo_after() {
        let connection = get_test_connection();
        let mut student = create_test_student("Siti", Kelas::TwoB, 0, &connection);

        for (kind, amount) in [
            (TransactionKind::Setor, 10_000),
            (TransactionKind::Setor, 2_500),
            (TransactionKind::Tarik, 7_000),
            (TransactionKind::Setor, 500),
        ] {
            student = process_transaction(&student, request(kind, amount, ""), &connection)
                .unwrap()
                .student;
        }

        let transactions = list_student_transactions(student.id, &connection).unwrap();
        let latest = transactions.last().unwrap();
        assert_eq!(transactions.len(), 4);
        assert_eq!(latest.saldo_after, 6_000);
        assert_saldo(&student, latest.saldo_after, &connection);
        for pair in transactions.windows(2) {
            assert_eq!(pair[0].saldo_after, pair[1].saldo_before);
        }
    }

    #[test]
    fn failed_insert_rolls_back_saldo_update() {
        let connection = get_test_connection();
        let ahmad = create_test_student("Ahmad", Kelas::OneA, 10_000, &connection);
        connection
            .execute("DROP TABLE \"transaction\"", ())
            .unwrap();

        let result =
            process_transaction(&ahmad, request(TransactionKind::Setor, 5_000, ""), &connection);

        assert!(matches!(result, Err(Error::SqlError(_))));
        assert_saldo(&ahmad, 10_000, &connection);
    }
}
