use crate::alias::DateTime;
use crate::error::Error;
use crate::pricer::PriceLookup;
use crate::referential::Referential;

use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

mod yahoo;
pub use yahoo::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub ticker: String,
    pub price: f64,
    pub time: Option<DateTime>,
}

impl Quote {
    pub fn new<T: Into<String>>(ticker: T, price: f64, time: Option<DateTime>) -> Self {
        Self {
            ticker: ticker.into(),
            price,
            time,
        }
    }
}

pub trait Requester {
    fn request(&self, ticker: &str) -> Result<Quote, Error>;
}

pub struct NullRequester;
impl Requester for NullRequester {
    fn request(&self, ticker: &str) -> Result<Quote, Error> {
        Err(Error::new_marketdata(format!(
            "no spot source configured for {ticker}"
        )))
    }
}

/// Prices read once from a `Ticker,Price` file.
pub struct FileRequester {
    prices: HashMap<String, f64>,
}

impl FileRequester {
    pub fn new<P: AsRef<Path>>(filename: P) -> Result<Self, Error> {
        Ok(Self::from_prices(Referential::load_prices(filename)?))
    }

    pub fn from_prices(prices: HashMap<String, f64>) -> Self {
        Self { prices }
    }
}

impl Requester for FileRequester {
    fn request(&self, ticker: &str) -> Result<Quote, Error> {
        self.prices
            .get(ticker)
            .map(|price| Quote::new(ticker, *price, None))
            .ok_or_else(|| Error::new_marketdata(format!("unknown ticker {ticker}")))
    }
}

/// Fetches quotes through a requester, at most once per ticker.
pub struct QuoteProvider {
    requester: Box<dyn Requester>,
    cache: HashMap<String, Result<Quote, String>>,
}

impl QuoteProvider {
    pub fn new(requester: Box<dyn Requester>) -> Self {
        Self {
            requester,
            cache: Default::default(),
        }
    }

    pub fn fetch(&mut self, ticker: &str) {
        if self.cache.contains_key(ticker) {
            info!("quote for {} up to date.", ticker);
            return;
        }

        let result = match self.requester.request(ticker) {
            Ok(quote) if quote.price.is_finite() && quote.price > 0.0 => {
                match quote.time {
                    Some(time) => info!(
                        "quote for {} is {} at {}",
                        quote.ticker,
                        quote.price,
                        time.format("%Y-%m-%d %H:%M:%S")
                    ),
                    None => info!("quote for {} is {}", quote.ticker, quote.price),
                }
                Ok(quote)
            }
            Ok(quote) => Err(format!("non positive price {}", quote.price)),
            Err(error) => Err(error.message),
        };
        if let Err(cause) = &result {
            warn!("could not retrieve quote for {}: {}", ticker, cause);
        }
        self.cache.insert(ticker.to_string(), result);
    }

    pub fn fetch_all<I, T>(&mut self, tickers: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for ticker in tickers {
            self.fetch(ticker.as_ref());
        }
    }
}

impl PriceLookup for QuoteProvider {
    fn price(&self, ticker: &str) -> Result<f64, String> {
        match self.cache.get(ticker) {
            Some(Ok(quote)) => Ok(quote.price),
            Some(Err(cause)) => Err(cause.clone()),
            None => Err(format!("quote for {ticker} not fetched")),
        }
    }
}
