use std::io::Write;

use thiserror::Error;

use crate::{DbError, Result, Row, Table};

// Non-SQL statements like .exit are called “meta-commands”.
#[derive(Debug, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Unrecognized,
}

impl MetaCommand {
    pub fn parse(input: &str) -> Option<MetaCommand> {
        match input {
            ".exit" => Some(MetaCommand::Exit),
            _ if input.starts_with('.') => Some(MetaCommand::Unrecognized),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrepareError {
    #[error("Unrecognized command: {0}")]
    Unrecognized(String),

    #[error("Syntax error. Could not parse statement.")]
    SyntaxError,

    #[error("ID must be positive.")]
    NegativeId,

    #[error("String is too long.")]
    StringTooLong,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

impl Statement {
    pub fn prepare(input: &str) -> std::result::Result<Statement, PrepareError> {
        let mut words = input.split_whitespace();
        match words.next() {
            Some("insert") => Self::prepare_insert(words),
            Some("select") if words.next().is_none() => Ok(Statement::Select),
            Some("select") => Err(PrepareError::SyntaxError),
            _ => Err(PrepareError::Unrecognized(input.to_string())),
        }
    }

    fn prepare_insert<'a>(
        mut args: impl Iterator<Item = &'a str>,
    ) -> std::result::Result<Statement, PrepareError> {
        let (Some(id), Some(username), Some(email), None) =
            (args.next(), args.next(), args.next(), args.next())
        else {
            return Err(PrepareError::SyntaxError);
        };

        let id: i64 = id.parse().map_err(|_| PrepareError::SyntaxError)?;
        if id < 0 {
            return Err(PrepareError::NegativeId);
        }
        let id = u32::try_from(id).map_err(|_| PrepareError::SyntaxError)?;

        match Row::new(id, username, email) {
            Ok(row) => Ok(Statement::Insert(row)),
            Err(DbError::StringTooLong { .. }) => Err(PrepareError::StringTooLong),
            Err(_) => Err(PrepareError::SyntaxError),
        }
    }

    /// Runs the statement against `table`, writing any selected rows to `out`.
    pub fn execute<W: Write>(&self, table: &mut Table, out: &mut W) -> Result<()> {
        match self {
            Statement::Insert(row) => table.insert(row),
            Statement::Select => {
                for row in table.select() {
                    writeln!(out, "{}", row?)?;
                }
                Ok(())
            }
        }
    }
}
