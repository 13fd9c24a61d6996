use crate::portfolio::InvalidHolding;

#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    Invalid(InvalidHolding),
    PriceUnavailable(String),
    OutOfRange(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Invalid(reason) => write!(f, "invalid holding: {reason}"),
            FailureReason::PriceUnavailable(cause) => write!(f, "price unavailable: {cause}"),
            FailureReason::OutOfRange(cause) => write!(f, "value out of range: {cause}"),
        }
    }
}

/// A holding left out of the metrics and of the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub row: usize,
    pub ticker: String,
    pub reason: FailureReason,
}

impl Failure {
    pub fn new<T: Into<String>>(row: usize, ticker: T, reason: FailureReason) -> Self {
        Self {
            row,
            ticker: ticker.into(),
            reason,
        }
    }

    pub fn is_price_unavailable(&self) -> bool {
        matches!(self.reason, FailureReason::PriceUnavailable(_))
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ticker = if self.ticker.trim().is_empty() {
            "<no ticker>"
        } else {
            self.ticker.as_str()
        };
        write!(f, "{} (row {}): {}", ticker, self.row, self.reason)
    }
}
