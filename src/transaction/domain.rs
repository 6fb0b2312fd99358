//! Core transaction domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    student::{Kelas, StudentId, StudentName},
};

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// The note stored when a transaction is saved without one.
pub const EMPTY_KETERANGAN: &str = "-";

/// Whether money goes into or out of a student's savings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// A deposit.
    Setor,
    /// A withdrawal.
    Tarik,
}

impl TransactionKind {
    /// The value used in URLs, forms and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Setor => "setor",
            TransactionKind::Tarik => "tarik",
        }
    }

    /// The capitalised name shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Setor => "Setor",
            TransactionKind::Tarik => "Tarik",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setor" => Ok(TransactionKind::Setor),
            "tarik" => Ok(TransactionKind::Tarik),
            other => Err(format!("unknown transaction kind \"{other}\"")),
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A recorded change to a student's balance. Never updated or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The transaction's ID in the database.
    pub id: TransactionId,
    /// The student whose balance changed.
    pub student_id: StudentId,
    /// The student's name when the transaction was made.
    pub student_name: StudentName,
    /// The student's class when the transaction was made.
    pub kelas: Kelas,
    /// Deposit or withdrawal.
    pub kind: TransactionKind,
    /// The amount in whole rupiah, always positive.
    pub amount: i64,
    /// A free-text note, "-" if none was given.
    pub keterangan: String,
    /// The balance before the transaction.
    pub saldo_before: i64,
    /// The balance after the transaction.
    pub saldo_after: i64,
    /// When the transaction was made, in UTC.
    pub timestamp: OffsetDateTime,
}

/// A request to deposit to or withdraw from a student's savings.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    /// Deposit or withdrawal.
    pub kind: TransactionKind,
    /// The amount in whole rupiah.
    pub amount: i64,
    /// An optional note, blank for none.
    pub keterangan: String,
}

/// Parse a transaction amount typed into a form.
///
/// Surrounding whitespace is ignored. Only whole numbers are accepted; the
/// sign is checked when the transaction is processed.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] if `raw` is empty or not a whole number.
pub fn parse_amount(raw: &str) -> Result<i64, Error> {
    let raw = raw.trim();

    raw.parse::<i64>()
        .map_err(|_| Error::InvalidAmount(raw.to_owned()))
}

/// Trim `keterangan`, replacing an empty note with [EMPTY_KETERANGAN].
pub fn normalize_keterangan(keterangan: &str) -> String {
    let keterangan = keterangan.trim();

    if keterangan.is_empty() {
        EMPTY_KETERANGAN.to_owned()
    } else {
        keterangan.to_owned()
    }
}
