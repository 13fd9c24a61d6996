/// Raw row of the holdings table, numeric columns are kept as text until validation.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingRecord {
    pub row: usize,
    pub ticker: String,
    pub quantity: String,
    pub purchase_price: String,
}

impl HoldingRecord {
    pub fn new<T, Q, P>(row: usize, ticker: T, quantity: Q, purchase_price: P) -> Self
    where
        T: Into<String>,
        Q: Into<String>,
        P: Into<String>,
    {
        Self {
            row,
            ticker: ticker.into(),
            quantity: quantity.into(),
            purchase_price: purchase_price.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvalidHolding {
    EmptyTicker,
    Quantity(String),
    PurchasePrice(String),
    PurchaseValue(String),
}

impl std::fmt::Display for InvalidHolding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidHolding::EmptyTicker => write!(f, "empty ticker"),
            InvalidHolding::Quantity(raw) => {
                write!(f, "quantity '{raw}' must be a positive number")
            }
            InvalidHolding::PurchasePrice(raw) => {
                write!(f, "purchase price '{raw}' must be a positive number")
            }
            InvalidHolding::PurchaseValue(raw) => {
                write!(f, "purchase value '{raw}' is out of range")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub row: usize,
    pub ticker: String,
    pub quantity: f64,
    pub purchase_price: f64,
}

impl TryFrom<&HoldingRecord> for Holding {
    type Error = InvalidHolding;

    fn try_from(record: &HoldingRecord) -> Result<Self, Self::Error> {
        let ticker = record.ticker.trim();
        if ticker.is_empty() {
            return Err(InvalidHolding::EmptyTicker);
        }
        let quantity = parse_positive(&record.quantity)
            .ok_or_else(|| InvalidHolding::Quantity(record.quantity.clone()))?;
        let purchase_price = parse_positive(&record.purchase_price)
            .ok_or_else(|| InvalidHolding::PurchasePrice(record.purchase_price.clone()))?;
        if !(quantity * purchase_price).is_finite() {
            return Err(InvalidHolding::PurchaseValue(format!(
                "{} x {}",
                record.quantity.trim(),
                record.purchase_price.trim()
            )));
        }
        Ok(Self {
            row: record.row,
            ticker: ticker.to_string(),
            quantity,
            purchase_price,
        })
    }
}

fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}
