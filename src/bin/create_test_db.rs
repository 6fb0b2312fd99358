use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;

use tabunganku::{
    Kelas, NewStudent, PasswordHash, StudentName, TransactionKind, TransactionRequest,
    ValidatedPassword, create_student, initialize_db, process_transaction,
};

/// Create a TabunganKu SD database with demo data for manual testing.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const DEMO_STUDENTS: [(&str, Kelas, i64); 6] = [
    ("Ahmad Fauzi", Kelas::OneA, 25_000),
    ("Budi Santoso", Kelas::OneA, 0),
    ("Citra Lestari", Kelas::TwoB, 150_000),
    ("Dewi Anggraini", Kelas::ThreeA, 72_500),
    ("Eko Prasetyo", Kelas::FiveB, 10_000),
    ("Fitri Handayani", Kelas::SixA, 300_000),
];

const DEMO_TRANSACTIONS: [(usize, TransactionKind, i64, &str); 5] = [
    (0, TransactionKind::Setor, 5_000, "Uang jajan"),
    (1, TransactionKind::Setor, 2_000, ""),
    (2, TransactionKind::Tarik, 50_000, "Beli buku"),
    (3, TransactionKind::Setor, 7_500, "Hadiah lomba"),
    (5, TransactionKind::Tarik, 100_000, "Study tour"),
];

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'tabunganku.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;
    initialize_db(&connection)?;

    println!("Setting the password to \"test\"...");
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    connection.execute(
        "INSERT INTO user (password) VALUES (?1)",
        (password_hash.to_string(),),
    )?;

    println!("Adding {} students...", DEMO_STUDENTS.len());
    let mut students = Vec::with_capacity(DEMO_STUDENTS.len());
    for (nama, kelas, saldo) in DEMO_STUDENTS {
        let student = create_student(
            NewStudent {
                nama: StudentName::new_unchecked(nama),
                kelas,
                saldo,
            },
            &connection,
        )?;
        students.push(student);
    }

    println!("Recording {} transactions...", DEMO_TRANSACTIONS.len());
    for (index, kind, amount, keterangan) in DEMO_TRANSACTIONS {
        let request = TransactionRequest {
            kind,
            amount,
            keterangan: keterangan.to_owned(),
        };
        let processed = process_transaction(&students[index], request, &connection)?;
        students[index] = processed.student;
    }

    println!("Success!");

    Ok(())
}
