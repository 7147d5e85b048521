//! Output formatting utilities

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

/// One field/value row for the status table
#[derive(Tabled)]
pub struct StatusRow {
    pub field: &'static str,
    pub value: String,
}

/// Print field/value rows as a rounded table
pub fn print_status_table(rows: Vec<StatusRow>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Pretty-print a JSON value
pub fn print_json<T: serde::Serialize>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{json}");
    }
}
