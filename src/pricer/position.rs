use crate::portfolio::Holding;

use log::debug;

/// Metrics of one holding priced at `current_price`.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionIndicator {
    pub ticker: String,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: f64,
    pub purchase_value: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    /// `None` when the purchase value is zero.
    pub percentage_return: Option<f64>,
}

impl PositionIndicator {
    pub fn from_holding(holding: &Holding, current_price: f64) -> Self {
        debug!(
            "price holding {} (row {}) with spot:{}",
            holding.ticker, holding.row, current_price
        );

        let purchase_value = holding.quantity * holding.purchase_price;
        let current_value = holding.quantity * current_price;
        let profit_loss = current_value - purchase_value;

        Self {
            ticker: holding.ticker.clone(),
            quantity: holding.quantity,
            purchase_price: holding.purchase_price,
            current_price,
            purchase_value,
            current_value,
            profit_loss,
            percentage_return: percentage_return(profit_loss, purchase_value),
        }
    }
}

pub fn percentage_return(profit_loss: f64, purchase_value: f64) -> Option<f64> {
    if purchase_value == 0.0 {
        return None;
    }
    Some(profit_loss / purchase_value * 100.0).filter(|value| value.is_finite())
}
