//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, auth::create_user_table, student::create_student_table,
    transaction::create_transaction_table,
};

/// Create the tables for all the domain models.
///
/// The tables are created inside a single exclusive transaction, so either
/// every table exists afterwards or none of them were created.
/// Calling this function on an already initialized database is a no-op.
///
/// # Errors
/// Returns [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_student_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
