//! `pagedb <file>` - an interactive prompt over a single table.
//!
//! ```text
//! db > insert 1 alice alice@example.com
//! Executed.
//! db > select
//! (1, alice, alice@example.com)
//! Executed.
//! db > .exit
//! ```

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use log::debug;

use pagedb::{Error, Row, RowSchema, Table};

/// What the loop should do after a line.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

#[derive(Debug, PartialEq, Eq)]
enum MetaCommand {
    Exit,
    BTree,
    Constants,
    Unrecognized(String),
}

#[derive(Debug, PartialEq, Eq)]
enum Statement {
    Insert(Row),
    Select,
}

#[derive(Debug, PartialEq, Eq)]
enum PrepareError {
    Syntax,
    NegativeId,
    StringTooLong,
    UnrecognizedStatement,
}

fn parse_meta_command(input: &str) -> MetaCommand {
    match input {
        ".exit" => MetaCommand::Exit,
        ".btree" => MetaCommand::BTree,
        ".constants" => MetaCommand::Constants,
        other => MetaCommand::Unrecognized(other.to_string()),
    }
}

fn prepare_statement(input: &str, schema: &RowSchema) -> Result<Statement, PrepareError> {
    if input.starts_with("insert") {
        return prepare_insert(input, schema);
    }
    if input == "select" {
        return Ok(Statement::Select);
    }
    Err(PrepareError::UnrecognizedStatement)
}

fn prepare_insert(input: &str, schema: &RowSchema) -> Result<Statement, PrepareError> {
    let mut tokens = input.split_whitespace().skip(1);
    let (Some(id), Some(username), Some(email)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(PrepareError::Syntax);
    };

    let id: i64 = id.parse().map_err(|_| PrepareError::Syntax)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }
    let id = u32::try_from(id).map_err(|_| PrepareError::Syntax)?;

    let row = Row::new(id, username, email);
    match schema.validate(&row) {
        Ok(()) => Ok(Statement::Insert(row)),
        Err(Error::FieldTooLong { .. }) => Err(PrepareError::StringTooLong),
        Err(_) => Err(PrepareError::Syntax),
    }
}

/// Message printed for an insert the engine refused.
fn rejection_message(e: &Error) -> String {
    match e {
        Error::DuplicateKey(_) => "Error: Duplicate key.".to_string(),
        Error::TableFull { .. } => "Error: Table full.".to_string(),
        Error::FieldTooLong { .. } => "String is too long.".to_string(),
        other => format!("Error: {}.", other),
    }
}

/// Run one statement, reporting rejected inserts to `out`.
///
/// Only fatal engine errors are returned.
fn execute<W: Write>(statement: Statement, table: &mut Table, out: &mut W) -> pagedb::Result<()> {
    match statement {
        Statement::Insert(row) => match table.insert(&row) {
            Ok(()) => writeln!(out, "Executed.")?,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => writeln!(out, "{}", rejection_message(&e))?,
        },
        Statement::Select => {
            for row in table.select_all()? {
                writeln!(out, "{}", row)?;
            }
            writeln!(out, "Executed.")?;
        }
    }
    Ok(())
}

/// Handle one line of input.
fn handle_line<W: Write>(input: &str, table: &mut Table, out: &mut W) -> pagedb::Result<Flow> {
    if input.starts_with('.') {
        match parse_meta_command(input) {
            MetaCommand::Exit => return Ok(Flow::Exit),
            MetaCommand::BTree => {
                writeln!(out, "Tree:")?;
                write!(out, "{}", table.describe_tree()?)?;
            }
            MetaCommand::Constants => {
                writeln!(out, "Constants:")?;
                writeln!(out, "{}", table.layout())?;
            }
            MetaCommand::Unrecognized(command) => {
                writeln!(out, "Unrecognized command '{}'", command)?;
            }
        }
        return Ok(Flow::Continue);
    }

    match prepare_statement(input, &table.schema()) {
        Ok(statement) => execute(statement, table, out)?,
        Err(PrepareError::Syntax) => writeln!(out, "Syntax error. Could not parse statement.")?,
        Err(PrepareError::NegativeId) => writeln!(out, "ID must be positive.")?,
        Err(PrepareError::StringTooLong) => writeln!(out, "String is too long.")?,
        Err(PrepareError::UnrecognizedStatement) => {
            writeln!(out, "Unrecognized keyword at start of '{}'.", input)?
        }
    }
    Ok(Flow::Continue)
}

/// Read lines until `.exit` or end of input, then close the table.
fn run<R: BufRead, W: Write>(mut table: Table, input: R, out: &mut W) -> pagedb::Result<()> {
    let mut lines = input.lines();
    loop {
        write!(out, "db > ")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            debug!("end of input");
            break;
        };
        let line = line?;

        if handle_line(line.trim_end(), &mut table, out)? == Flow::Exit {
            break;
        }
    }
    table.close()
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(filename) = std::env::args().nth(1) else {
        println!("Must supply a database filename.");
        return ExitCode::FAILURE;
    };

    let result = Table::open(&filename)
        .and_then(|table| run(table, io::stdin().lock(), &mut io::stdout().lock()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
