use crate::error::Error;

mod chart;
mod console;
mod csv;
mod ods;

pub use crate::output::csv::CsvOutput;
pub use chart::ChartOutput;
pub use console::ConsoleOutput;
pub use ods::OdsOutput;

pub const NOT_COMPUTED: &str = "N/A";

pub const REPORT_HEADERS: [&str; 8] = [
    "Ticker",
    "Quantity",
    "PurchasePrice",
    "CurrentPrice",
    "PurchaseValue",
    "CurrentValue",
    "ProfitLoss",
    "PercentageReturn",
];

pub trait Output {
    fn write(&mut self) -> Result<(), Error>;
}

fn round_2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        // too large to carry cents
        return value;
    }
    let rounded = scaled.round() / 100.0;
    // avoid printing -0.00
    if rounded == 0.0 { 0.0 } else { rounded }
}

pub fn format_decimal(value: f64) -> String {
    format!("{:.2}", round_2(value))
}

pub fn format_optional_decimal(value: Option<f64>) -> String {
    value
        .map(format_decimal)
        .unwrap_or_else(|| NOT_COMPUTED.to_string())
}

/// Fixed 2 decimals with thousands separators, e.g. `-1,234.50`.
pub fn format_amount(value: f64) -> String {
    let text = format_decimal(value);
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(unsigned) => ("-", unsigned),
        None => ("", text.as_str()),
    };
    let (integer, decimals) = unsigned.split_once('.').unwrap_or((unsigned, "00"));
    format!("{sign}{}.{decimals}", group_thousands(integer))
}

pub fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
