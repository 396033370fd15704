use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use flatdb::{Config, DbError, MetaCommand, PrepareError, Statement, Table, TrailingBytes};
use tracing_subscriber::{EnvFilter, fmt};

/// Single-table record store with an interactive prompt
#[derive(Parser, Debug)]
#[command(name = "flatdb")]
#[command(version)]
struct Args {
    /// Database file, created if it does not exist
    filename: PathBuf,

    /// Maximum number of pages held in memory
    #[arg(long, default_value_t = flatdb::TABLE_MAX_PAGES, conflicts_with = "unbounded")]
    max_pages: usize,

    /// Let the table grow without a page limit
    #[arg(long)]
    unbounded: bool,

    /// Cut a trailing partial row instead of refusing to open the file
    #[arg(long)]
    truncate_trailing: bool,
}

impl Args {
    fn config(&self) -> Config {
        let builder = Config::builder();
        let builder = if self.unbounded {
            builder.unbounded()
        } else {
            builder.max_pages(self.max_pages)
        };
        let trailing = if self.truncate_trailing {
            TrailingBytes::Truncate
        } else {
            TrailingBytes::Reject
        };
        builder.trailing_bytes(trailing).build()
    }
}

struct InputBuffer {
    buffer: String,
}

impl InputBuffer {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Returns false once stdin is exhausted.
    fn read_input(&mut self, stdin: &io::Stdin) -> io::Result<bool> {
        self.buffer.clear();
        let read = stdin.lock().read_line(&mut self.buffer)?;
        self.buffer = self.buffer.trim().to_string();
        Ok(read > 0)
    }
}

enum InputType {
    Meta(MetaCommand),
    Statement(Result<Statement, PrepareError>),
}

impl InputType {
    fn parse(input: &str) -> InputType {
        if let Some(meta) = MetaCommand::parse(input) {
            InputType::Meta(meta)
        } else {
            InputType::Statement(Statement::prepare(input))
        }
    }
}

fn print_prompt(stdout: &mut io::Stdout) -> io::Result<()> {
    print!("db > ");
    stdout.flush()
}

fn repl(mut table: Table) -> Result<(), DbError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input_buffer = InputBuffer::new();

    loop {
        print_prompt(&mut stdout)?;
        if !input_buffer.read_input(&stdin)? {
            break;
        }
        if input_buffer.buffer.is_empty() {
            continue;
        }

        match InputType::parse(&input_buffer.buffer) {
            InputType::Meta(MetaCommand::Exit) => break,
            InputType::Meta(MetaCommand::Unrecognized) => {
                println!("Unrecognized meta-command: {}", input_buffer.buffer);
            }
            InputType::Statement(Err(e)) => println!("{}", e),
            InputType::Statement(Ok(statement)) => {
                match statement.execute(&mut table, &mut stdout) {
                    Ok(()) => println!("Executed."),
                    Err(e) if e.is_recoverable() => println!("Error: {}", e),
                    Err(e) => return Err(e),
                }
            }
        }
    }

    table.close()
}

fn main() -> ExitCode {
    // stdout belongs to the prompt, so logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let table = match Table::open(&args.filename, &args.config()) {
        Ok(table) => table,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", args.filename.display(), e);
            println!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match repl(table) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = ?e.kind(), "{}", e);
            println!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
