use clap::ValueEnum;
use colored::*;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn is_table(&self) -> bool {
        matches!(self, OutputFormat::Table)
    }
}

pub trait OutputFormatter {
    fn format<T: Serialize>(&self, data: T) -> String;
    fn format_table<T: Tabled + Serialize>(&self, data: Vec<T>) -> String;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, data: T) -> String {
        match self {
            // Catalog-shaped data reads better as YAML than as pretty JSON
            OutputFormat::Table | OutputFormat::Yaml => {
                serde_yaml::to_string(&data).unwrap_or_else(|e| e.to_string())
            }
            OutputFormat::Json => {
                serde_json::to_string_pretty(&data).unwrap_or_else(|e| e.to_string())
            }
        }
    }

    fn format_table<T: Tabled + Serialize>(&self, data: Vec<T>) -> String {
        match self {
            OutputFormat::Table => {
                if data.is_empty() {
                    "No data to display".to_string()
                } else {
                    Table::new(data).with(Style::rounded()).to_string()
                }
            }
            OutputFormat::Json => {
                serde_json::to_string_pretty(&data).unwrap_or_else(|e| e.to_string())
            }
            OutputFormat::Yaml => serde_yaml::to_string(&data).unwrap_or_else(|e| e.to_string()),
        }
    }
}

/// Prints a whole report in machine formats; table output is assembled by
/// each command.
pub fn emit<T: Serialize>(format: OutputFormat, data: T) {
    println!("{}", format.format(data));
}

pub fn status_cell(ok: bool, text: &str) -> String {
    if ok {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}
