use std::{error::Error, io, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;

use tabunganku::{PasswordHash, User, UserID, ValidatedPassword, get_user_by_id};

/// Set a new password for TabunganKu SD when the old one has been forgotten.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if !db_path.is_file() {
        print_error(format!("No database found at {db_path:#?}."));
        exit(1);
    }

    println!("Opening database at {db_path:#?}");
    let mut connection = Connection::open(db_path)?;

    let user = match get_user_by_id(UserID::new(1), &connection) {
        Ok(user) => user,
        Err(error) => {
            print_error(format!(
                "Could not load the account ({error}). Register a password in the app first."
            ));
            exit(1);
        }
    };

    let Some(password_hash) = prompt_new_password_hash() else {
        println!("Password unchanged.");
        return Ok(());
    };

    update_password(&mut connection, &user, &password_hash)?;
    println!("Password updated. Log in with the new password.");

    Ok(())
}

/// Read a password from stdin, returning `None` on end of input.
fn prompt(message: &str) -> Option<String> {
    match rpassword::prompt_password(message) {
        Ok(password) => Some(password),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

fn prompt_new_password_hash() -> Option<PasswordHash> {
    loop {
        println!();

        let password = prompt("New password: ")?;

        let validated_password = match ValidatedPassword::new(&password) {
            Ok(validated_password) => validated_password,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let confirm_password = prompt("Repeat the new password: ")?;

        if password != confirm_password {
            print_error("The passwords do not match, try again.");
            continue;
        }

        match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => print_error(format!("{error}, try again.")),
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string())
}

fn update_password(
    connection: &mut Connection,
    user: &User,
    password_hash: &PasswordHash,
) -> Result<(), rusqlite::Error> {
    let transaction = connection.transaction()?;

    let rows_affected = transaction.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.to_string(), user.id.as_i64()),
    )?;

    if rows_affected != 1 {
        print_error(format!(
            "Updating the password changed {rows_affected} rows instead of 1, rolling back."
        ));
        transaction.rollback()?;
        return Err(rusqlite::Error::StatementChangedRows(rows_affected));
    }

    transaction.commit()
}
