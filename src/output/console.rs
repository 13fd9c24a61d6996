use super::{NOT_COMPUTED, Output, format_amount, format_decimal};
use crate::error::Error;
use crate::pricer::PortfolioIndicators;

use std::io::Write;

const RULE_WIDTH: usize = 40;
const TITLE: &str = "PORTFOLIO SUMMARY";

pub struct ConsoleOutput<'a, W: Write> {
    output_stream: W,
    indicators: &'a PortfolioIndicators,
}

impl<'a, W: Write> ConsoleOutput<'a, W> {
    pub fn new(output_stream: W, indicators: &'a PortfolioIndicators) -> Self {
        Self {
            output_stream,
            indicators,
        }
    }

    fn write_summary(&mut self) -> std::io::Result<()> {
        let summary = &self.indicators.summary;
        let rule = "=".repeat(RULE_WIDTH);
        let percentage = summary
            .percentage_return
            .map(|value| format!("{}%", format_decimal(value)))
            .unwrap_or_else(|| NOT_COMPUTED.to_string());

        writeln!(self.output_stream)?;
        writeln!(self.output_stream, "{rule}")?;
        writeln!(self.output_stream, "{TITLE:^RULE_WIDTH$}")?;
        writeln!(self.output_stream, "{rule}")?;
        writeln!(
            self.output_stream,
            "Total Purchase Value: ${}",
            format_amount(summary.purchase_value)
        )?;
        writeln!(
            self.output_stream,
            "Total Portfolio Value: ${}",
            format_amount(summary.current_value)
        )?;
        writeln!(
            self.output_stream,
            "Total Profit/Loss: ${}",
            format_amount(summary.profit_loss)
        )?;
        writeln!(self.output_stream, "Total Portfolio Return: {percentage}")?;
        writeln!(self.output_stream, "{rule}")?;

        for failure in self.indicators.failures.iter() {
            writeln!(self.output_stream, "Skipped {failure}")?;
        }
        self.output_stream.flush()
    }
}

impl<W: Write> Output for ConsoleOutput<'_, W> {
    fn write(&mut self) -> Result<(), Error> {
        self.write_summary()
            .map_err(|error| Error::new_output(format!("unable to write summary : {error}")))
    }
}
