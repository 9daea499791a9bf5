//! Thin command-line harness over `Database::execute_sql` (§10.4): opens a
//! page file, runs either a `-c` one-shot statement or every non-blank line
//! read from stdin, and prints each result as a table.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use common::Config;
use common::pretty::format_value;
use database::{Database, ExecutionResult};
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Parser)]
#[command(name = "database-cli", about = "Run SQL against a single-file database")]
struct Args {
    /// Path to the page file backing the database. Created if it doesn't exist.
    #[arg(default_value = "database.heap")]
    path: PathBuf,

    /// Execute a single SQL statement and exit, instead of reading stdin.
    #[arg(short = 'c', long = "command")]
    command: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = Config::builder().path(args.path).build();

    let mut db = match Database::open(&config) {
        Ok(db) => db,
        Err(err) => {
            eprintln!("failed to open database: {err}");
            return ExitCode::FAILURE;
        }
    };

    let statements = match args.command {
        Some(sql) => vec![sql],
        None => match read_stdin_statements() {
            Ok(statements) => statements,
            Err(err) => {
                eprintln!("failed to read stdin: {err}");
                return ExitCode::FAILURE;
            }
        },
    };

    let mut any_failed = false;
    for sql in statements {
        let result = db.execute_sql(&sql);
        any_failed |= !result.success;
        print_result(&result);
    }

    if any_failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn read_stdin_statements() -> io::Result<Vec<String>> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn print_result(result: &ExecutionResult) {
    if !result.success {
        eprintln!("error: {}", result.message);
        return;
    }
    if result.columns.is_empty() {
        println!("{}", result.message);
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(result.columns.iter().cloned());
    for row in &result.rows {
        builder.push_record(
            result
                .columns
                .iter()
                .map(|col| row.get(col).map(format_value).unwrap_or_else(|| "NULL".to_string())),
        );
    }
    let mut table = builder.build();
    table.with(Style::modern());
    println!("{table}");
    println!("({} row(s), {:.4}s)", result.rows.len(), result.duration_seconds);
}
