use crate::core::member::MemberId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result alias for operations that validate caller input.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Malformed or out-of-domain input.
///
/// This is the only error the engine produces. It is always raised before
/// optimization begins; unsatisfiable needs are reported through the plan's
/// shortfall instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid value {value:?} for field `{field}` (expected one of: {expected})")]
    UnknownValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("amount_needed must not be negative, got {0}")]
    NegativeAmountNeeded(Decimal),

    #[error("negative {field} {value} for {member}/{asset_key}")]
    NegativeHolding {
        member: MemberId,
        asset_key: String,
        field: &'static str,
        value: Decimal,
    },

    #[error("no price available for stock {stock_id} held by {member}")]
    MissingPrice { member: MemberId, stock_id: String },

    #[error("price must be positive, got {price} for stock {stock_id}")]
    InvalidPrice { stock_id: String, price: Decimal },

    #[error("{field} out of range: {detail}")]
    ValueOutOfRange { field: &'static str, detail: String },

    #[error("priority member {0} does not appear in the portfolio")]
    UnknownPriorityMember(MemberId),

    #[error("malformed request: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::Malformed(err.to_string())
    }
}
