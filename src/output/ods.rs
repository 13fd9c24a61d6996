use super::{NOT_COMPUTED, Output, REPORT_HEADERS, round_2};
use crate::error::Error;
use crate::pricer::{PortfolioIndicators, SummaryIndicator};

use log::debug;
use spreadsheet_ods::format::ValueFormatTrait;
use spreadsheet_ods::{CellStyleRef, Sheet, Value, ValueFormatCurrency, ValueFormatRef, WorkBook, currency};

const CURRENCY: &str = "USD";

impl From<spreadsheet_ods::OdsError> for Error {
    fn from(error: spreadsheet_ods::OdsError) -> Self {
        Error::new_output(format!("ods error : {error}"))
    }
}

fn set_optional_value(sheet: &mut Sheet, row: u32, col: u32, value: Option<f64>) {
    match value {
        Some(value) => sheet.set_value(row, col, round_2(value)),
        None => sheet.set_value(row, col, Value::Text(NOT_COMPUTED.to_string())),
    }
}

pub struct OdsOutput<'a> {
    output_filename: String,
    work_book: WorkBook,
    indicators: &'a PortfolioIndicators,
}

impl<'a> OdsOutput<'a> {
    pub fn new(output_filename: &str, indicators: &'a PortfolioIndicators) -> Result<Self, Error> {
        let path = std::path::Path::new(output_filename);
        let work_book = if path.exists() {
            spreadsheet_ods::read_ods(path)?
        } else {
            WorkBook::new_empty()
        };
        Ok(Self {
            output_filename: output_filename.to_string(),
            work_book,
            indicators,
        })
    }

    fn add_sheet(&mut self, sheet: Sheet) {
        for i in 0..self.work_book.num_sheets() {
            let i_sheet = self.work_book.sheet(i);
            if i_sheet.name() == sheet.name() {
                self.work_book.remove_sheet(i);
                self.work_book.insert_sheet(i, sheet);
                return;
            }
        }
        self.work_book.push_sheet(sheet);
    }

    fn save(&mut self) -> Result<(), Error> {
        spreadsheet_ods::write_ods(&mut self.work_book, &self.output_filename)?;
        Ok(())
    }

    fn write_performance(&mut self) -> Result<(), Error> {
        let mut sheet = Sheet::new("Performance");
        for (i, header_name) in REPORT_HEADERS.iter().enumerate() {
            sheet.set_value(0, i as u32, Value::Text(header_name.to_string()));
        }

        let currency_style_ref = self.get_currency_style()?;
        let mut row: u32 = 1;
        for position in self.indicators.positions.iter() {
            sheet.set_value(row, 0, &position.ticker);
            sheet.set_value(row, 1, round_2(position.quantity));
            for (col, value) in [
                position.purchase_price,
                position.current_price,
                position.purchase_value,
                position.current_value,
                position.profit_loss,
            ]
            .into_iter()
            .enumerate()
            {
                sheet.set_styled_value(
                    row,
                    col as u32 + 2,
                    currency!(CURRENCY, round_2(value)),
                    &currency_style_ref,
                );
            }
            set_optional_value(&mut sheet, row, 7, position.percentage_return);
            row += 1;
        }

        self.add_sheet(sheet);
        Ok(())
    }

    fn write_summary(&mut self) -> Result<(), Error> {
        let SummaryIndicator {
            purchase_value,
            current_value,
            profit_loss,
            percentage_return,
        } = self.indicators.summary;

        let mut sheet = Sheet::new("Summary");
        let currency_style_ref = self.get_currency_style()?;
        for (row, (name, value)) in [
            ("Total Purchase Value", purchase_value),
            ("Total Portfolio Value", current_value),
            ("Total Profit/Loss", profit_loss),
        ]
        .into_iter()
        .enumerate()
        {
            sheet.set_value(row as u32, 0, Value::Text(name.to_string()));
            sheet.set_styled_value(
                row as u32,
                1,
                currency!(CURRENCY, round_2(value)),
                &currency_style_ref,
            );
        }
        sheet.set_value(3, 0, Value::Text("Total Portfolio Return (%)".to_string()));
        set_optional_value(&mut sheet, 3, 1, percentage_return);

        self.add_sheet(sheet);
        Ok(())
    }

    fn get_currency_format(&mut self) -> ValueFormatRef {
        if let Some(value) = self.work_book.currency_format(CURRENCY) {
            return value.format_ref();
        }
        let mut format_currency = ValueFormatCurrency::new_named(CURRENCY);
        format_currency.part_currency().symbol("$").build();
        format_currency
            .part_number()
            .min_integer_digits(1)
            .decimal_places(2)
            .min_decimal_places(2)
            .grouping()
            .build();
        self.work_book.add_currency_format(format_currency)
    }

    fn get_currency_style(&mut self) -> Result<CellStyleRef, Error> {
        let style_name = format!("currency_style_{}", CURRENCY);
        if let Some(value) = self.work_book.cellstyle(&style_name) {
            return Ok(value.style_ref());
        }

        let value_format_ref = self.get_currency_format();
        let currency_style = spreadsheet_ods::CellStyle::new(&style_name, &value_format_ref);
        let currency_style_ref = self.work_book.add_cellstyle(currency_style);
        Ok(currency_style_ref)
    }
}

impl Output for OdsOutput<'_> {
    fn write(&mut self) -> Result<(), Error> {
        debug!("write performance");
        self.write_performance()?;

        debug!("write summary");
        self.write_summary()?;

        debug!("save {}", self.output_filename);
        self.save()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::{HoldingRecord, Portfolio};
    use std::collections::HashMap;

    #[test]
    fn write_ods() {
        let portfolio = Portfolio::new(
            "test",
            vec![
                HoldingRecord::new(1, "AAPL", "15", "170.50"),
                HoldingRecord::new(2, "MSFT", "10", "305.20"),
            ],
        );
        let prices: HashMap<String, f64> = [("AAPL".to_string(), 190.0)].into_iter().collect();
        let indicators = PortfolioIndicators::from_portfolio(&portfolio, &prices);

        let dir = tempfile::tempdir().unwrap();
        let filename = dir.path().join("report.ods");
        let filename = filename.to_str().unwrap();
        OdsOutput::new(filename, &indicators).unwrap().write().unwrap();
        // second run replaces the sheets instead of appending new ones
        OdsOutput::new(filename, &indicators).unwrap().write().unwrap();

        let work_book = spreadsheet_ods::read_ods(filename).unwrap();
        assert_eq!(work_book.num_sheets(), 2);
        let performance = work_book.sheet(0);
        assert_eq!(performance.name(), "Performance");
        assert!(matches!(performance.value(1, 0), Value::Text(text) if text == "AAPL"));
        assert!(
            matches!(performance.value(1, 7), Value::Number(value) if (*value - 11.44).abs() < 1e-9)
        );
        assert!(matches!(performance.value(2, 0), Value::Empty));
        assert_eq!(work_book.sheet(1).name(), "Summary");
    }
}
