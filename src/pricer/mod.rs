use std::collections::HashMap;

mod failure;
mod portfolio;
mod position;

pub use failure::*;
pub use portfolio::*;
pub use position::PositionIndicator;

/// Current price of a ticker, or the reason it is not available.
pub trait PriceLookup {
    fn price(&self, ticker: &str) -> Result<f64, String>;
}

impl PriceLookup for HashMap<String, f64> {
    fn price(&self, ticker: &str) -> Result<f64, String> {
        self.get(ticker)
            .copied()
            .ok_or_else(|| format!("no quote for {ticker}"))
    }
}

impl<F> PriceLookup for F
where
    F: Fn(&str) -> Result<f64, String>,
{
    fn price(&self, ticker: &str) -> Result<f64, String> {
        self(ticker)
    }
}
