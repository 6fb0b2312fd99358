//! Core student domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// Database identifier for a student.
pub type StudentId = i64;

/// A validated, non-empty student name with surrounding whitespace removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct StudentName(String);

impl StudentName {
    /// Create a student name.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyStudentName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyStudentName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a student name without validation.
    ///
    /// The caller should ensure that the string is trimmed and not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for StudentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for StudentName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StudentName::new(s)
    }
}

impl Display for StudentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The classes in the school: grades one to six, each with sections A and B.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kelas {
    /// Kelas 1A.
    OneA,
    /// Kelas 1B.
    OneB,
    /// Kelas 2A.
    TwoA,
    /// Kelas 2B.
    TwoB,
    /// Kelas 3A.
    ThreeA,
    /// Kelas 3B.
    ThreeB,
    /// Kelas 4A.
    FourA,
    /// Kelas 4B.
    FourB,
    /// Kelas 5A.
    FiveA,
    /// Kelas 5B.
    FiveB,
    /// Kelas 6A.
    SixA,
    /// Kelas 6B.
    SixB,
}

impl Kelas {
    /// Every class in display order.
    pub const ALL: [Kelas; 12] = [
        Kelas::OneA,
        Kelas::OneB,
        Kelas::TwoA,
        Kelas::TwoB,
        Kelas::ThreeA,
        Kelas::ThreeB,
        Kelas::FourA,
        Kelas::FourB,
        Kelas::FiveA,
        Kelas::FiveB,
        Kelas::SixA,
        Kelas::SixB,
    ];

    /// The class code, e.g. "1A".
    pub fn as_str(&self) -> &'static str {
        match self {
            Kelas::OneA => "1A",
            Kelas::OneB => "1B",
            Kelas::TwoA => "2A",
            Kelas::TwoB => "2B",
            Kelas::ThreeA => "3A",
            Kelas::ThreeB => "3B",
            Kelas::FourA => "4A",
            Kelas::FourB => "4B",
            Kelas::FiveA => "5A",
            Kelas::FiveB => "5B",
            Kelas::SixA => "6A",
            Kelas::SixB => "6B",
        }
    }
}

impl FromStr for Kelas {
    type Err = Error;

    /// Parse a class code such as "3B".
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidKelas] if `s` is empty or not a class in the school.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();

        Kelas::ALL
            .into_iter()
            .find(|kelas| kelas.as_str() == code)
            .ok_or_else(|| Error::InvalidKelas(code.to_owned()))
    }
}

impl Display for Kelas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Kelas {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Kelas {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A student and their current savings balance.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    /// The student's ID in the database.
    pub id: StudentId,
    /// The student's name.
    pub nama: StudentName,
    /// The student's class.
    pub kelas: Kelas,
    /// The balance in whole rupiah. Never negative.
    pub saldo: i64,
    /// When the student was added, in UTC.
    pub created_at: OffsetDateTime,
}

/// A validated student that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    /// The student's name.
    pub nama: StudentName,
    /// The student's class.
    pub kelas: Kelas,
    /// The opening balance in whole rupiah.
    pub saldo: i64,
}

impl NewStudent {
    /// Validate the raw values from the add-student form.
    ///
    /// The name is checked first, then the class, then the initial balance,
    /// and the first problem found is returned.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyStudentName], [Error::InvalidKelas] or
    /// [Error::InvalidInitialSaldo].
    pub fn parse(nama: &str, kelas: &str, saldo: &str) -> Result<Self, Error> {
        Ok(Self {
            nama: StudentName::new(nama)?,
            kelas: kelas.parse()?,
            saldo: parse_initial_saldo(saldo)?,
        })
    }
}

/// Parse the initial balance for a new student. An empty field means zero.
///
/// # Errors
///
/// Returns [Error::InvalidInitialSaldo] if `raw` is not a whole, non-negative number.
pub fn parse_initial_saldo(raw: &str) -> Result<i64, Error> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Ok(0);
    }

    match raw.parse::<i64>() {
        Ok(saldo) if saldo >= 0 => Ok(saldo),
        _ => Err(Error::InvalidInitialSaldo(raw.to_owned())),
    }
}

/// Form data for adding a student.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StudentFormData {
    #[serde(default)]
    pub nama: String,
    /// Empty when no class was chosen, since the placeholder option is never submitted.
    #[serde(default)]
    pub kelas: String,
    #[serde(default)]
    pub saldo: String,
}

#[cfg(test)]
mod student_name_tests {
    use crate::{Error, student::StudentName};

    #[test]
    fn new_fails_on_empty_string() {
        assert_eq!(StudentName::new(""), Err(Error::EmptyStudentName));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        assert_eq!(StudentName::new("\n\t \r"), Err(Error::EmptyStudentName));
    }

    #[test]
    fn new_trims_name() {
        let name = StudentName::new("  Ahmad  ").unwrap();

        assert_eq!(name.as_ref(), "Ahmad");
    }
}

#[cfg(test)]
mod kelas_tests {
    use crate::{Error, student::Kelas};

    #[test]
    fn parses_every_class_code() {
        for kelas in Kelas::ALL {
            assert_eq!(kelas.as_str().parse::<Kelas>(), Ok(kelas));
        }
    }

    #[test]
    fn codes_sort_in_the_same_order_as_classes() {
        let mut codes = Kelas::ALL.map(|kelas| kelas.as_str());
        codes.sort();

        assert_eq!(codes, Kelas::ALL.map(|kelas| kelas.as_str()));
    }

    #[test]
    fn rejects_unknown_class() {
        assert_eq!("7A".parse::<Kelas>(), Err(Error::InvalidKelas("7A".to_owned())));
        assert_eq!("1a".parse::<Kelas>(), Err(Error::InvalidKelas("1a".to_owned())));
    }

    #[test]
    fn rejects_empty_class() {
        assert_eq!("".parse::<Kelas>(), Err(Error::InvalidKelas(String::new())));
    }
}
