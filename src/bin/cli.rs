//! ChronoDB - CLI Client

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use chronodb::config::EngineConfig;
use chronodb::executor::{Executor, QueryResult};
use chronodb::storage::Record;

/// Print welcome banner
fn print_banner(config: &EngineConfig) {
    println!(
        r#"
  ____ _                          ____  ____
 / ___| |__  _ __ ___  _ __   ___|  _ \| __ )
| |   | '_ \| '__/ _ \| '_ \ / _ \ | | |  _ \
| |___| | | | | | (_) | | | | (_) | |_| | |_) |
 \____|_| |_|_|  \___/|_| |_|\___/|____/|____/

 Embedded relational store with undo/redo
 Data directory: {}
 Type '.help' for help, 'EXIT' to quit
"#,
        config.data_dir.display()
    );
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help message
  .tables            List all tables
  .schema <table>    Show table schema
  .clear             Clear screen
  EXIT | QUIT        Leave the shell

Statements (end with ';'):
  CREATE TABLE <name> [TYPE] (<col> <type>, ...) [USING <TYPE>]
  INSERT INTO <table> VALUES (<v1>, <v2>, ...)
  SELECT * FROM <table> [WHERE <col> <op> <value>]
  SELECT * FROM <table> WHERE ID <id> USING BFS|DFS   (BST tables)
  UPDATE <table> SET <col> <value> WHERE ID <id>
  DELETE FROM <table> WHERE ID <id>
  UNDO | REDO

Examples:
  CREATE TABLE students (id INT, name STRING, gpa FLOAT);
  INSERT INTO students VALUES (1, "Alice", 3.8);
  SELECT * FROM students WHERE gpa >= 3.0;
"#
    );
}

/// Format query results as a table
fn format_results(columns: &[String], rows: &[Record]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    // Calculate column widths
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in rows {
        for (i, value) in row.values().iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(value.to_string().len());
            }
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+\n", separator);

    let mut output = String::new();
    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!(" {:^width$} ", c, width = *w))
        .collect::<Vec<_>>()
        .join("|");
    output.push_str(&format!("|{}|\n", header));
    output.push_str(&separator);

    for row in rows {
        let row_str: String = row
            .values()
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!(" {:>width$} ", v.to_string(), width = *w))
            .collect::<Vec<_>>()
            .join("|");
        output.push_str(&format!("|{}|\n", row_str));
    }
    if !rows.is_empty() {
        output.push_str(&separator);
    }

    output.push_str(&format!("{} row(s) returned\n", rows.len()));
    output
}

fn print_result(result: &QueryResult) {
    if !result.rows.is_empty() {
        print!("{}", format_results(&result.columns, &result.rows));
    } else if let Some(msg) = &result.message {
        println!("[SUCCESS]: {}", msg);
    } else if result.affected_rows > 0 {
        println!("[SUCCESS]: {} row(s) affected", result.affected_rows);
    }
}

/// Handle special dot commands
fn handle_special_command(cmd: &str, executor: &Executor) {
    let parts: Vec<&str> = cmd.split_whitespace().collect();

    match parts.first().copied() {
        Some(".help") => print_help(),
        Some(".tables") => match executor.engine().list_tables() {
            Ok(tables) if tables.is_empty() => println!("No tables found."),
            Ok(tables) => {
                println!("Tables:");
                for table in tables {
                    println!("  {}", table);
                }
            }
            Err(e) => println!("[ERROR]: {}", e),
        },
        Some(".schema") => match parts.get(1) {
            Some(table) => match executor.engine().load_schema(table) {
                Ok(schema) => {
                    println!("Table: {} ({})", table, schema.structure);
                    for column in schema.columns() {
                        println!("  {} {}", column.name, column.column_type);
                    }
                    println!("  PRIMARY KEY: {}", schema.primary_key);
                }
                Err(e) => println!("[ERROR]: {}", e),
            },
            None => println!("[ERROR]: usage: .schema <table>"),
        },
        Some(".clear") => {
            // Clear screen (ANSI escape code)
            print!("\x1B[2J\x1B[1;1H");
        }
        Some(other) => {
            println!("[ERROR]: unknown command {}", other);
            println!("Type '.help' for available commands.");
        }
        None => {}
    }
}

/// Main REPL loop
fn run_repl(mut executor: Executor) -> Result<()> {
    let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "chronodb> " } else { "....> " };
        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(trimmed);

        if buffer.is_empty() {
            let word = trimmed.trim_end_matches(';');
            if word.eq_ignore_ascii_case("exit") || word.eq_ignore_ascii_case("quit") {
                break;
            }
            if trimmed.starts_with('.') {
                handle_special_command(trimmed, &executor);
                continue;
            }
        }

        // Accumulate until the statement is terminated
        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(trimmed);
        if !trimmed.ends_with(';') {
            continue;
        }

        let command = std::mem::take(&mut buffer);
        match executor.execute(&command) {
            Ok(result) => print_result(&result),
            Err(e) => println!("[ERROR]: {}", e),
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn main() -> Result<()> {
    let mut config = EngineConfig::from_env();

    // Simple argument parsing
    let args: Vec<String> = std::env::args().collect();
    for i in 1..args.len() {
        if args[i] == "--data-dir" || args[i] == "-d" {
            if let Some(dir) = args.get(i + 1) {
                config = config.data_dir(dir);
            }
        }
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let executor = Executor::open(&config)
        .with_context(|| format!("failed to open data directory {}", config.data_dir.display()))?;

    print_banner(&config);
    run_repl(executor)
}
