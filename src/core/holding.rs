use crate::core::error::{Result, ValidationError};
use crate::core::member::MemberId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of asset a holding represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    BankBalance,
    MutualFund,
    Stock,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::BankBalance => "bank_balance",
            AssetClass::MutualFund => "mutual_fund",
            AssetClass::Stock => "stock",
        }
    }

    /// How quickly this class of asset turns into cash.
    pub fn liquidity_tier(&self) -> LiquidityTier {
        match self {
            AssetClass::BankBalance => LiquidityTier::Instant,
            AssetClass::MutualFund => LiquidityTier::Medium,
            AssetClass::Stock => LiquidityTier::Variable,
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Liquidity tier, ordered from cheapest to most expensive to access.
///
/// The derived `Ord` is the order the optimizer walks holdings in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityTier {
    /// Bank balances: cash on hand.
    Instant,
    /// Mutual funds: redemption settles in a couple of working days.
    Medium,
    /// Stocks: settlement plus market-dependent exit price.
    Variable,
}

impl LiquidityTier {
    /// Estimated number of days before proceeds are available.
    pub fn estimated_days_to_cash(&self) -> u32 {
        match self {
            LiquidityTier::Instant => 0,
            LiquidityTier::Medium => 2,
            LiquidityTier::Variable => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LiquidityTier::Instant => "instant",
            LiquidityTier::Medium => "medium",
            LiquidityTier::Variable => "variable",
        }
    }
}

impl fmt::Display for LiquidityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single liquidatable position owned by one member.
///
/// Holdings are produced by [`Portfolio`](crate::core::portfolio::Portfolio)
/// normalization and are immutable afterwards. `value` is the estimated
/// worth in the base currency; for stocks it is `quantity * unit_price`,
/// for mutual funds and bank balances the quantity *is* the value.
///
/// # Examples
///
/// ```
/// use liquidation_engine::core::holding::{AssetClass, Holding, LiquidityTier};
/// use liquidation_engine::core::member::MemberId;
/// use rust_decimal_macros::dec;
///
/// let holding = Holding::new(MemberId::new("A"), AssetClass::MutualFund, "HDFC_FLEXICAP", dec!(25_000));
/// assert_eq!(holding.liquidity_tier(), LiquidityTier::Medium);
/// assert_eq!(holding.value(), dec!(25_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    member: MemberId,
    asset_class: AssetClass,
    asset_key: String,
    /// Units held. Equal to `value` for non-stock holdings.
    quantity: Decimal,
    /// Price per unit, only known for stocks.
    unit_price: Option<Decimal>,
    value: Decimal,
    /// Whether the holding backs a financial goal.
    goal_linked: bool,
}

impl Holding {
    /// Create a holding whose quantity is its value (funds, cash).
    pub fn new(
        member: MemberId,
        asset_class: AssetClass,
        asset_key: impl Into<String>,
        value: Decimal,
    ) -> Self {
        Self {
            member,
            asset_class,
            asset_key: asset_key.into(),
            quantity: value,
            unit_price: None,
            value,
            goal_linked: false,
        }
    }

    /// Create a stock holding valued at `quantity * unit_price`.
    ///
    /// Fails with [`ValidationError::ValueOutOfRange`] when the product does
    /// not fit in a `Decimal`.
    pub fn priced(
        member: MemberId,
        asset_key: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Result<Self> {
        let asset_key = asset_key.into();
        let value = quantity
            .checked_mul(unit_price)
            .ok_or_else(|| ValidationError::ValueOutOfRange {
                field: "value",
                detail: format!("{} x {} for {}/{}", quantity, unit_price, member, asset_key),
            })?;
        Ok(Self {
            member,
            asset_class: AssetClass::Stock,
            asset_key,
            quantity,
            unit_price: Some(unit_price),
            value,
            goal_linked: false,
        })
    }

    /// Mark the holding as backing a financial goal.
    pub fn with_goal_link(mut self, goal_linked: bool) -> Self {
        self.goal_linked = goal_linked;
        self
    }

    // --- Accessors ---

    pub fn member(&self) -> &MemberId {
        &self.member
    }

    pub fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    pub fn asset_key(&self) -> &str {
        &self.asset_key
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_price(&self) -> Option<Decimal> {
        self.unit_price
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn is_goal_linked(&self) -> bool {
        self.goal_linked
    }

    pub fn liquidity_tier(&self) -> LiquidityTier {
        self.asset_class.liquidity_tier()
    }

    pub fn estimated_days_to_cash(&self) -> u32 {
        self.liquidity_tier().estimated_days_to_cash()
    }
}

impl fmt::Display for Holding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}:{} = {}",
            self.member, self.asset_class, self.asset_key, self.value
        )
    }
}
