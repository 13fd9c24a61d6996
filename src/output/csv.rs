use super::{Output, REPORT_HEADERS, format_decimal, format_optional_decimal};
use crate::error::Error;
use crate::pricer::PortfolioIndicators;

use log::debug;
use std::fs::File;
use std::io::Write;

pub struct CsvOutput<'a> {
    output_filename: String,
    indicators: &'a PortfolioIndicators,
}

impl<'a> CsvOutput<'a> {
    pub fn new(output_filename: &str, indicators: &'a PortfolioIndicators) -> Self {
        Self {
            output_filename: output_filename.to_string(),
            indicators,
        }
    }

    fn write_position_indicators<W: Write>(&self, output_stream: W) -> Result<(), Error> {
        let mut writer = csv::Writer::from_writer(output_stream);
        let to_output_error =
            |error: csv::Error| Error::new_output(format!("unable to write report : {error}"));

        writer.write_record(REPORT_HEADERS).map_err(to_output_error)?;
        for position in self.indicators.positions.iter() {
            writer
                .write_record([
                    position.ticker.clone(),
                    format_decimal(position.quantity),
                    format_decimal(position.purchase_price),
                    format_decimal(position.current_price),
                    format_decimal(position.purchase_value),
                    format_decimal(position.current_value),
                    format_decimal(position.profit_loss),
                    format_optional_decimal(position.percentage_return),
                ])
                .map_err(to_output_error)?;
        }
        writer
            .flush()
            .map_err(|error| Error::new_output(format!("unable to write report : {error}")))?;
        Ok(())
    }
}

impl Output for CsvOutput<'_> {
    fn write(&mut self) -> Result<(), Error> {
        debug!("write csv report {}", self.output_filename);
        let output_stream = File::create(&self.output_filename).map_err(|error| {
            Error::new_output(format!(
                "unable to create {} : {error}",
                self.output_filename
            ))
        })?;
        self.write_position_indicators(output_stream)
    }
}
