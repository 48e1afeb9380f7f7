use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime, Time};

use record_ledger::{
    TransactionInput, TransactionKind, UserId, create_transaction, initialize_db,
    list_categories,
};

/// A utility for creating a test database for the REST API server of record_ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The user to record the sample transactions for.
    #[arg(long, short, default_value_t = 1)]
    user_id: i64,

    /// The number of days of sample transactions to create, ending today.
    #[arg(long, short, default_value_t = 90)]
    days: i64,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating sample transactions...");

    let user_id = UserId::new(args.user_id);
    let income = list_categories(Some(TransactionKind::Income), &conn)?;
    let expenses = list_categories(Some(TransactionKind::Expense), &conn)?;
    let today = OffsetDateTime::now_utc().date();
    let mut count = 0;

    for day in 0..args.days {
        let date = today - Duration::days(day);
        let noon = date.with_time(Time::MIDNIGHT).assume_utc() + Duration::hours(12);

        if date.day() == 1
            && let Some(salary) = income.first()
        {
            let input = TransactionInput::new(salary.id, 5000.0, TransactionKind::Income)
                .record_time(noon)
                .description("Monthly salary");
            create_transaction(user_id, &input, &conn)?;
            count += 1;
        }

        if expenses.is_empty() {
            continue;
        }

        let category = &expenses[day as usize % expenses.len()];
        let amount = 5.0 + (day % 17) as f64 * 3.5;
        let input = TransactionInput::new(category.id, amount, TransactionKind::Expense)
            .record_time(noon)
            .description(&format!("Sample {} expense", category.name));
        create_transaction(user_id, &input, &conn)?;
        count += 1;
    }

    println!("Created {count} transactions for user {user_id}.");
    println!("Success!");

    Ok(())
}
