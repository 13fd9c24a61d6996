use crate::error::Error;
use crate::portfolio::{HoldingRecord, Portfolio};

use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const TICKER_COLUMN: &str = "Ticker";
const QUANTITY_COLUMN: &str = "Quantity";
const PURCHASE_PRICE_COLUMN: &str = "PurchasePrice";
const PRICE_COLUMN: &str = "Price";

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new_referential(error.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Error::new_referential(format!("not csv format : {error}"))
    }
}

pub struct Referential;

impl Referential {
    pub fn load_portfolio<P: AsRef<Path>>(filename: P) -> Result<Portfolio, Error> {
        let path = Self::check_file(filename.as_ref())?;
        info!("loading portfolio from {}", path.display());
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::read_portfolio(name, File::open(path)?)
    }

    pub fn read_portfolio<N, R>(name: N, reader: R) -> Result<Portfolio, Error>
    where
        N: Into<String>,
        R: Read,
    {
        let mut reader = make_reader(reader);
        let headers = reader.headers()?.clone();
        let ticker = column_position(&headers, TICKER_COLUMN)?;
        let quantity = column_position(&headers, QUANTITY_COLUMN)?;
        let purchase_price = column_position(&headers, PURCHASE_PRICE_COLUMN)?;

        let mut records = Vec::new();
        for (position, record) in reader.records().enumerate() {
            let record = record?;
            let field = |index: usize| record.get(index).unwrap_or_default();
            records.push(HoldingRecord::new(
                position + 1,
                field(ticker),
                field(quantity),
                field(purchase_price),
            ));
        }
        let portfolio = Portfolio::new(name, records);
        debug!(
            "portfolio {} has {} holding(s)",
            portfolio.name,
            portfolio.records.len()
        );
        Ok(portfolio)
    }

    pub fn load_prices<P: AsRef<Path>>(filename: P) -> Result<HashMap<String, f64>, Error> {
        let path = Self::check_file(filename.as_ref())?;
        info!("loading prices from {}", path.display());
        Self::read_prices(File::open(path)?)
    }

    pub fn read_prices<R: Read>(reader: R) -> Result<HashMap<String, f64>, Error> {
        let mut reader = make_reader(reader);
        let headers = reader.headers()?.clone();
        let ticker = column_position(&headers, TICKER_COLUMN)?;
        let price = column_position(&headers, PRICE_COLUMN)?;

        let mut prices = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let ticker = record.get(ticker).unwrap_or_default();
            let raw_price = record.get(price).unwrap_or_default();
            match raw_price.parse::<f64>() {
                Ok(value) if !ticker.is_empty() => {
                    prices.insert(ticker.to_string(), value);
                }
                _ => warn!("skip price line ticker:'{ticker}' price:'{raw_price}'"),
            }
        }
        Ok(prices)
    }

    fn check_file(path: &Path) -> Result<&Path, Error> {
        if !path.is_file() {
            return Err(Error::new_referential(format!(
                "{} is not valid file",
                path.display()
            )));
        }
        Ok(path)
    }
}

fn make_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn column_position(headers: &csv::StringRecord, name: &str) -> Result<usize, Error> {
    headers.iter().position(|header| header == name).ok_or_else(|| {
        Error::new_referential(format!(
            "column {name} is mandatory, found columns: {}",
            headers.iter().collect::<Vec<_>>().join(", ")
        ))
    })
}
