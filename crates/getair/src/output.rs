//! Table rendering helpers shared by the command handlers.

use owo_colors::OwoColorize;
use tabled::Table;
use tabled::Tabled;
use tabled::settings::Style;

/// Render rows as a rounded table.
pub fn render_table<T, I>(rows: I) -> String
where
    T: Tabled,
    I: IntoIterator<Item = T>,
{
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Placeholder for absent values.
pub fn dash() -> String {
    "-".to_owned()
}

pub fn fmt_f64(value: Option<f64>) -> String {
    value.map_or_else(dash, |v| format!("{v}"))
}

pub fn fmt_i64(value: Option<i64>) -> String {
    value.map_or_else(dash, |v| v.to_string())
}

pub fn fmt_str(value: Option<&str>) -> String {
    value.map_or_else(dash, ToOwned::to_owned)
}

/// Confirmation line for successful writes.
pub fn ok(quiet: bool, message: &str) {
    if !quiet {
        eprintln!("{} {message}", "ok:".green().bold());
    }
}
