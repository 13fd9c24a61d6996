use super::position::{PositionIndicator, percentage_return};
use super::{Failure, FailureReason, PriceLookup};
use crate::portfolio::{Holding, Portfolio};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::Add;

use log::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummaryIndicator {
    pub purchase_value: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    /// `None` when nothing was bought, i.e. no priced holding.
    pub percentage_return: Option<f64>,
}

impl SummaryIndicator {
    fn from_values(purchase_value: f64, current_value: f64) -> Self {
        let profit_loss = current_value - purchase_value;
        Self {
            purchase_value,
            current_value,
            profit_loss,
            percentage_return: percentage_return(profit_loss, purchase_value),
        }
    }

    pub fn from_position(position: &PositionIndicator) -> Self {
        Self::from_values(position.purchase_value, position.current_value)
    }

    pub fn is_finite(&self) -> bool {
        self.purchase_value.is_finite()
            && self.current_value.is_finite()
            && self.profit_loss.is_finite()
    }
}

impl Add for SummaryIndicator {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::from_values(
            self.purchase_value + other.purchase_value,
            self.current_value + other.current_value,
        )
    }
}


#[derive(Debug, Default, PartialEq)]
pub struct PortfolioIndicators {
    pub positions: Vec<PositionIndicator>,
    pub summary: SummaryIndicator,
    pub failures: Vec<Failure>,
}

impl PortfolioIndicators {
    /// Prices every valid holding of `portfolio` with `lookup`.
    ///
    /// Invalid rows are never looked up and each distinct ticker is looked up once.
    /// Rows that fail validation or pricing end up in `failures` and are
    /// excluded from `positions` and from `summary`. Both keep the input order.
    pub fn from_portfolio(portfolio: &Portfolio, lookup: &dyn PriceLookup) -> Self {
        info!("compute indicators of portfolio {}", portfolio.name);

        let mut prices: HashMap<&str, Result<f64, String>> = HashMap::new();
        let mut positions = Vec::new();
        let mut failures = Vec::new();
        let mut summary = SummaryIndicator::default();

        for record in portfolio.records.iter() {
            let holding = match Holding::try_from(record) {
                Ok(holding) => holding,
                Err(reason) => {
                    failures.push(Failure::new(
                        record.row,
                        record.ticker.trim(),
                        FailureReason::Invalid(reason),
                    ));
                    continue;
                }
            };

            let price = match prices.entry(record.ticker.trim()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let price = lookup.price(&holding.ticker).and_then(check_price);
                    entry.insert(price)
                }
            };

            match price {
                Ok(price) => {
                    let position = PositionIndicator::from_holding(&holding, *price);
                    let total = summary + SummaryIndicator::from_position(&position);
                    if total.is_finite() {
                        summary = total;
                        positions.push(position);
                    } else {
                        failures.push(Failure::new(
                            holding.row,
                            holding.ticker,
                            FailureReason::OutOfRange(format!(
                                "current value at price {price} overflows the portfolio totals"
                            )),
                        ));
                    }
                }
                Err(cause) => failures.push(Failure::new(
                    holding.row,
                    holding.ticker,
                    FailureReason::PriceUnavailable(cause.clone()),
                )),
            }
        }

        debug!(
            "portfolio {} priced:{} failed:{}",
            portfolio.name,
            positions.len(),
            failures.len()
        );

        Self {
            positions,
            summary,
            failures,
        }
    }
}

/// Distinct tickers of the valid holdings, in order of first appearance.
pub fn tickers_to_price(portfolio: &Portfolio) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for holding in portfolio
        .records
        .iter()
        .filter_map(|record| Holding::try_from(record).ok())
    {
        if !tickers.contains(&holding.ticker) {
            tickers.push(holding.ticker);
        }
    }
    tickers
}

fn check_price(price: f64) -> Result<f64, String> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(format!("invalid price {price}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::{HoldingRecord, InvalidHolding};
    use assert_float_eq::*;
    use std::cell::RefCell;

    fn make_portfolio_(records: &[(&str, &str, &str)]) -> Portfolio {
        Portfolio::new(
            "test",
            records
                .iter()
                .enumerate()
                .map(|(position, (ticker, quantity, price))| {
                    HoldingRecord::new(position + 1, *ticker, *quantity, *price)
                })
                .collect(),
        )
    }

    fn make_prices_(prices: &[(&str, f64)]) -> HashMap<String, f64> {
        prices
            .iter()
            .map(|(ticker, price)| (ticker.to_string(), *price))
            .collect()
    }

    struct CountingLookup {
        prices: HashMap<String, f64>,
        calls: RefCell<Vec<String>>,
    }

    impl PriceLookup for CountingLookup {
        fn price(&self, ticker: &str) -> Result<f64, String> {
            self.calls.borrow_mut().push(ticker.to_string());
            self.prices.price(ticker)
        }
    }

    #[test]
    fn single_holding() {
        let portfolio = make_portfolio_(&[("AAPL", "15", "170.50")]);
        let prices = make_prices_(&[("AAPL", 190.0)]);
        let indicators = PortfolioIndicators::from_portfolio(&portfolio, &prices);

        assert!(indicators.failures.is_empty());
        assert_eq!(indicators.positions.len(), 1);
        let position = &indicators.positions[0];
        assert_float_absolute_eq!(position.current_price, 190.0, 1e-9);
        assert_float_absolute_eq!(position.purchase_value, 2557.5, 1e-9);
        assert_float_absolute_eq!(position.current_value, 2850.0, 1e-9);
        assert_float_absolute_eq!(position.profit_loss, 292.5, 1e-9);
        assert_float_absolute_eq!(position.percentage_return.unwrap(), 11.44, 5e-3);

        let summary = indicators.summary;
        assert_float_absolute_eq!(summary.purchase_value, 2557.5, 1e-9);
        assert_float_absolute_eq!(summary.current_value, 2850.0, 1e-9);
        assert_float_absolute_eq!(summary.profit_loss, 292.5, 1e-9);
        assert_float_absolute_eq!(summary.percentage_return.unwrap(), 11.44, 5e-3);
    }

    #[test]
    fn price_unavailable() {
        let portfolio = make_portfolio_(&[("MSFT", "10", "305.20")]);
        let lookup = |_: &str| -> Result<f64, String> { Err("network down".to_string()) };
        let indicators = PortfolioIndicators::from_portfolio(&portfolio, &lookup);

        assert!(indicators.positions.is_empty());
        assert_eq!(
            indicators.failures,
            vec![Failure::new(
                1,
                "MSFT",
                FailureReason::PriceUnavailable("network down".to_string())
            )]
        );
        assert!(indicators.failures[0].is_price_unavailable());
        assert_eq!(indicators.summary.purchase_value, 0.0);
        assert_eq!(indicators.summary.current_value, 0.0);
        assert_eq!(indicators.summary.profit_loss, 0.0);
        assert!(indicators.summary.percentage_return.is_none());
    }

    #[test]
    fn invalid_holding_is_not_priced() {
        let portfolio = make_portfolio_(&[("GOOGL", "7", "0")]);
        let lookup = CountingLookup {
            prices: make_prices_(&[("GOOGL", 140.0)]),
            calls: Default::default(),
        };
        let indicators = PortfolioIndicators::from_portfolio(&portfolio, &lookup);

        assert!(lookup.calls.borrow().is_empty());
        assert!(indicators.positions.is_empty());
        assert_eq!(
            indicators.failures,
            vec![Failure::new(
                1,
                "GOOGL",
                FailureReason::Invalid(InvalidHolding::PurchasePrice("0".to_string()))
            )]
        );
        assert!(tickers_to_price(&portfolio).is_empty());
    }

    #[test]
    fn empty_portfolio() {
        let portfolio = make_portfolio_(&[]);
        let indicators = PortfolioIndicators::from_portfolio(&portfolio, &make_prices_(&[]));
        assert!(indicators.positions.is_empty());
        assert!(indicators.failures.is_empty());
        assert_eq!(indicators.summary, SummaryIndicator::default());
        assert!(indicators.summary.percentage_return.is_none());
    }

    #[test]
    fn partial_pricing() {
        let portfolio = make_portfolio_(&[("AAPL", "15", "170.50"), ("MSFT", "10", "305.20")]);
        let prices = make_prices_(&[("AAPL", 190.0)]);
        let indicators = PortfolioIndicators::from_portfolio(&portfolio, &prices);

        assert_eq!(indicators.positions.len(), 1);
        assert_eq!(indicators.positions[0].ticker, "AAPL");
        assert_eq!(indicators.failures.len(), 1);
        assert_eq!(indicators.failures[0].ticker, "MSFT");
        assert!(indicators.failures[0].is_price_unavailable());
        assert_float_absolute_eq!(indicators.summary.purchase_value, 2557.5, 1e-9);
        assert_float_absolute_eq!(indicators.summary.current_value, 2850.0, 1e-9);
    }

    #[test]
    fn non_positive_price_is_unavailable() {
        let portfolio = make_portfolio_(&[
            ("AAPL", "15", "170.50"),
            ("ZERO", "1", "10"),
            ("NEG", "1", "10"),
            ("NAN", "1", "10"),
        ]);
        let prices = make_prices_(&[
            ("AAPL", 190.0),
            ("ZERO", 0.0),
            ("NEG", -4.0),
            ("NAN", f64::NAN),
        ]);
        let indicators = PortfolioIndicators::from_portfolio(&portfolio, &prices);

        assert_eq!(indicators.positions.len(), 1);
        let failed: Vec<_> = indicators
            .failures
            .iter()
            .map(|failure| failure.ticker.as_str())
            .collect();
        assert_eq!(failed, vec!["ZERO", "NEG", "NAN"]);
        assert!(indicators.failures.iter().all(Failure::is_price_unavailable));
    }

    #[test]
    fn out_of_range_values_are_excluded() {
        let portfolio = make_portfolio_(&[
            ("AAPL", "15", "170.50"),
            ("WIDE", "1e200", "1e200"),
            ("BIG", "1e200", "1"),
            ("HUGE", "1", "1e308"),
            ("HUGE", "1", "1e308"),
        ]);
        let prices = make_prices_(&[("AAPL", 190.0), ("BIG", 1e200), ("HUGE", 1.7e308)]);
        let indicators = PortfolioIndicators::from_portfolio(&portfolio, &prices);

        let priced: Vec<_> = indicators
            .positions
            .iter()
            .map(|position| position.ticker.as_str())
            .collect();
        assert_eq!(priced, vec!["AAPL", "HUGE"]);

        let failed: Vec<_> = indicators
            .failures
            .iter()
            .map(|failure| (failure.row, failure.ticker.as_str()))
            .collect();
        assert_eq!(failed, vec![(2, "WIDE"), (3, "BIG"), (5, "HUGE")]);
        assert!(matches!(
            indicators.failures[0].reason,
            FailureReason::Invalid(InvalidHolding::PurchaseValue(_))
        ));
        assert!(matches!(
            indicators.failures[1].reason,
            FailureReason::OutOfRange(_)
        ));
        assert!(matches!(
            indicators.failures[2].reason,
            FailureReason::OutOfRange(_)
        ));

        let summary = indicators.summary;
        assert!(summary.is_finite());
        assert_float_absolute_eq!(summary.purchase_value, 2557.5 + 1e308, 1e292);
        assert_float_absolute_eq!(summary.current_value, 2850.0 + 1.7e308, 1e292);
        assert!(summary.percentage_return.is_some());
    }

    #[test]
    fn order_and_sums() {
        let portfolio = make_portfolio_(&[
            ("TSLA", "3", "200"),
            ("AAPL", "15", "170.50"),
            ("BAD", "x", "1"),
            ("NVDA", "2", "400"),
            ("MSFT", "10", "305.20"),
        ]);
        let prices = make_prices_(&[("TSLA", 250.0), ("AAPL", 190.0), ("NVDA", 900.0)]);
        let indicators = PortfolioIndicators::from_portfolio(&portfolio, &prices);

        let tickers: Vec<_> = indicators
            .positions
            .iter()
            .map(|position| position.ticker.as_str())
            .collect();
        assert_eq!(tickers, vec!["TSLA", "AAPL", "NVDA"]);
        let rows: Vec<_> = indicators.failures.iter().map(|failure| failure.row).collect();
        assert_eq!(rows, vec![3, 5]);

        for position in indicators.positions.iter() {
            assert_eq!(
                position.profit_loss,
                position.current_value - position.purchase_value
            );
        }

        let purchase: f64 = indicators.positions.iter().map(|p| p.purchase_value).sum();
        let current: f64 = indicators.positions.iter().map(|p| p.current_value).sum();
        assert_float_absolute_eq!(indicators.summary.purchase_value, purchase, 1e-9);
        assert_float_absolute_eq!(indicators.summary.current_value, current, 1e-9);
        assert_float_absolute_eq!(
            indicators.summary.profit_loss,
            current - purchase,
            1e-9
        );
        assert_float_absolute_eq!(
            indicators.summary.percentage_return.unwrap(),
            (current - purchase) / purchase * 100.0,
            1e-9
        );
    }

    #[test]
    fn duplicate_tickers_are_looked_up_once() {
        let portfolio = make_portfolio_(&[
            ("AAPL", "15", "170.50"),
            ("MSFT", "10", "305.20"),
            ("AAPL", "5", "150"),
            ("MSFT", "0", "305.20"),
        ]);
        let lookup = CountingLookup {
            prices: make_prices_(&[("AAPL", 190.0), ("MSFT", 400.0)]),
            calls: Default::default(),
        };
        let indicators = PortfolioIndicators::from_portfolio(&portfolio, &lookup);

        assert_eq!(*lookup.calls.borrow(), vec!["AAPL", "MSFT"]);
        assert_eq!(indicators.positions.len(), 3);
        assert_eq!(indicators.positions[0].ticker, "AAPL");
        assert_eq!(indicators.positions[2].ticker, "AAPL");
        assert_float_absolute_eq!(indicators.positions[2].current_value, 950.0, 1e-9);
        assert_eq!(indicators.failures.len(), 1);
        assert_eq!(indicators.failures[0].row, 4);
    }

    #[test]
    fn idempotent() {
        let portfolio = make_portfolio_(&[
            ("AAPL", "15", "170.50"),
            ("MSFT", "10", "305.20"),
            ("", "1", "1"),
        ]);
        let prices = make_prices_(&[("AAPL", 190.0)]);
        let first = PortfolioIndicators::from_portfolio(&portfolio, &prices);
        let second = PortfolioIndicators::from_portfolio(&portfolio, &prices);
        assert_eq!(first, second);
    }

    #[test]
    fn distinct_tickers_to_price() {
        let portfolio = make_portfolio_(&[
            ("AAPL", "15", "170.50"),
            ("MSFT", "-1", "305.20"),
            (" AAPL", "5", "150"),
            ("NVDA", "2", "400"),
            ("MSFT", "1", "305.20"),
        ]);
        assert_eq!(tickers_to_price(&portfolio), vec!["AAPL", "NVDA", "MSFT"]);
    }

    #[test]
    fn summary_add() {
        let summary = SummaryIndicator::default()
            + SummaryIndicator::from_values(100.0, 150.0)
            + SummaryIndicator::from_values(300.0, 250.0);
        assert_float_absolute_eq!(summary.purchase_value, 400.0, 1e-9);
        assert_float_absolute_eq!(summary.current_value, 400.0, 1e-9);
        assert_float_absolute_eq!(summary.profit_loss, 0.0, 1e-9);
        assert_float_absolute_eq!(summary.percentage_return.unwrap(), 0.0, 1e-9);
    }
}
