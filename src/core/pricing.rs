use crate::core::error::ValidationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source of current stock prices.
///
/// Price lookup is an injected collaborator so the engine itself never does
/// network or file I/O. Any `Fn(&str) -> Option<Decimal>` closure works as a
/// price source.
pub trait PriceSource {
    /// Current price of one unit of `stock_id`, if known.
    fn price(&self, stock_id: &str) -> Option<Decimal>;
}

impl<F> PriceSource for F
where
    F: Fn(&str) -> Option<Decimal>,
{
    fn price(&self, stock_id: &str) -> Option<Decimal> {
        self(stock_id)
    }
}

/// In-memory stock price table.
///
/// # Examples
///
/// ```
/// use liquidation_engine::core::pricing::{PriceSource, PriceTable};
/// use rust_decimal_macros::dec;
///
/// let mut prices = PriceTable::new();
/// prices.set_price("RELIANCE", dec!(2_450.75)).unwrap();
///
/// assert_eq!(prices.price("RELIANCE"), Some(dec!(2_450.75)));
/// assert_eq!(prices.price("TCS"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable {
    prices: BTreeMap<String, Decimal>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the price of one unit of `stock_id`. Prices must be positive.
    pub fn set_price(
        &mut self,
        stock_id: impl Into<String>,
        price: Decimal,
    ) -> Result<(), ValidationError> {
        let stock_id = stock_id.into();
        if price <= Decimal::ZERO {
            return Err(ValidationError::InvalidPrice { stock_id, price });
        }
        self.prices.insert(stock_id, price);
        Ok(())
    }

    /// Builder-style variant of [`set_price`](Self::set_price).
    pub fn with_price(
        mut self,
        stock_id: impl Into<String>,
        price: Decimal,
    ) -> Result<Self, ValidationError> {
        self.set_price(stock_id, price)?;
        Ok(self)
    }

    /// Parse a JSON object of `stock_id -> price`, rejecting non-positive prices.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let raw: BTreeMap<String, Decimal> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for (stock_id, price) in raw {
            table.set_price(stock_id, price)?;
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.prices.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl PriceSource for PriceTable {
    fn price(&self, stock_id: &str) -> Option<Decimal> {
        self.prices.get(stock_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_lookup() {
        let table = PriceTable::new()
            .with_price("INFY", dec!(1_500))
            .unwrap();
        assert_eq!(table.price("INFY"), Some(dec!(1_500)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let mut table = PriceTable::new();
        assert!(table.set_price("ITC", Decimal::ZERO).is_err());
        assert!(matches!(
            table.set_price("ITC", dec!(-1)),
            Err(ValidationError::InvalidPrice { .. })
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_closure_price_source() {
        let flat = |_: &str| Some(dec!(100));
        assert_eq!(flat.price("ANYTHING"), Some(dec!(100)));
    }

    #[test]
    fn test_from_json_accepts_numbers_and_strings() {
        let table = PriceTable::from_json(r#"{"TCS": 3500.5, "WIPRO": "410"}"#).unwrap();
        assert_eq!(table.price("TCS"), Some(dec!(3500.5)));
        assert_eq!(table.price("WIPRO"), Some(dec!(410)));
    }

    #[test]
    fn test_from_json_rejects_bad_payloads() {
        assert!(matches!(
            PriceTable::from_json("[1, 2]"),
            Err(ValidationError::Malformed(_))
        ));
        assert!(PriceTable::from_json(r#"{"TCS": -3}"#).is_err());
    }
}
