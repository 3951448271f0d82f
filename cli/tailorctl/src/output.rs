//! Output rendering for CLI commands.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format selected with the global `--format` flag.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
}

/// Print a list of rows, or `empty` when there are none.
pub fn print_rows<T: Serialize + Tabled>(rows: &[T], format: OutputFormat, empty: &str) {
    match format {
        OutputFormat::Table if rows.is_empty() => println!("{}", empty.dimmed()),
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Json => print_json(rows),
    }
}

/// Print one item, as a single-row table or as JSON.
pub fn print_item<T: Serialize + Tabled>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{}", Table::new([item])),
        OutputFormat::Json => print_json(item),
    }
}

/// Print a value as pretty JSON regardless of the selected format.
pub fn print_json<T: Serialize + ?Sized>(data: &T) {
    let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "null".to_string());
    println!("{}", json);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_flag_values() {
        assert!(matches!(
            OutputFormat::from_str("table", true),
            Ok(OutputFormat::Table)
        ));
        assert!(matches!(
            OutputFormat::from_str("json", true),
            Ok(OutputFormat::Json)
        ));
        assert!(OutputFormat::from_str("yaml", true).is_err());
    }
}
