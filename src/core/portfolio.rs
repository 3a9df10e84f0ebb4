use crate::core::error::{Result, ValidationError};
use crate::core::holding::{AssetClass, Holding};
use crate::core::member::MemberId;
use crate::core::pricing::PriceSource;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Key used for a member's bank balance, which has no name of its own.
pub const BANK_ASSET_KEY: &str = "bank";

/// Raw portfolio as supplied by the caller.
///
/// ```json
/// {
///   "mutual_funds":  { "member": { "fund_name": 25000 } },
///   "stocks":        { "member": { "stock_id": 10 } },
///   "bank_balances": { "member": 5000 },
///   "goal_linked":   { "member": ["fund_name"] }
/// }
/// ```
///
/// Mutual funds are given by value, stocks by quantity (valued through a
/// [`PriceSource`]), bank balances by amount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioInput {
    #[serde(default)]
    pub mutual_funds: BTreeMap<MemberId, BTreeMap<String, Decimal>>,
    #[serde(default)]
    pub stocks: BTreeMap<MemberId, BTreeMap<String, Decimal>>,
    #[serde(default)]
    pub bank_balances: BTreeMap<MemberId, Decimal>,
    /// Funds and stocks that back a financial goal, per member.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub goal_linked: BTreeMap<MemberId, BTreeSet<String>>,
}

impl PortfolioInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mutual_fund(
        mut self,
        member: impl Into<MemberId>,
        name: impl Into<String>,
        value: Decimal,
    ) -> Self {
        self.mutual_funds
            .entry(member.into())
            .or_default()
            .insert(name.into(), value);
        self
    }

    pub fn with_stock(
        mut self,
        member: impl Into<MemberId>,
        stock_id: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        self.stocks
            .entry(member.into())
            .or_default()
            .insert(stock_id.into(), quantity);
        self
    }

    pub fn with_bank_balance(mut self, member: impl Into<MemberId>, amount: Decimal) -> Self {
        self.bank_balances.insert(member.into(), amount);
        self
    }

    pub fn with_goal_link(mut self, member: impl Into<MemberId>, asset_key: impl Into<String>) -> Self {
        self.goal_linked
            .entry(member.into())
            .or_default()
            .insert(asset_key.into());
        self
    }

    fn is_goal_linked(&self, member: &MemberId, asset_key: &str) -> bool {
        self.goal_linked
            .get(member)
            .is_some_and(|keys| keys.contains(asset_key))
    }
}

/// Normalized portfolio: a flat list of non-empty holdings.
///
/// Holdings are ordered bank balances, then mutual funds, then stocks; each
/// group by member id, then asset key. Zero-valued holdings are dropped, but
/// their owners still count as portfolio members.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    holdings: Vec<Holding>,
    members: BTreeSet<MemberId>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw portfolio, valuing stocks through `prices`.
    ///
    /// Fails on negative values or quantities, on stocks with no price, and
    /// when a stock value or the portfolio total does not fit in a `Decimal`.
    pub fn from_input(input: &PortfolioInput, prices: &dyn PriceSource) -> Result<Self> {
        let mut portfolio = Portfolio::new();
        let mut total = Decimal::ZERO;

        for (member, amount) in &input.bank_balances {
            portfolio.members.insert(member.clone());
            ensure_non_negative(member, BANK_ASSET_KEY, "balance", *amount)?;
            let holding = Holding::new(
                member.clone(),
                AssetClass::BankBalance,
                BANK_ASSET_KEY,
                *amount,
            );
            accumulate(&mut total, &holding)?;
            portfolio.push(holding);
        }

        for (member, funds) in &input.mutual_funds {
            portfolio.members.insert(member.clone());
            for (name, value) in funds {
                ensure_non_negative(member, name, "value", *value)?;
                let holding =
                    Holding::new(member.clone(), AssetClass::MutualFund, name.clone(), *value)
                        .with_goal_link(input.is_goal_linked(member, name));
                accumulate(&mut total, &holding)?;
                portfolio.push(holding);
            }
        }

        for (member, stocks) in &input.stocks {
            portfolio.members.insert(member.clone());
            for (stock_id, quantity) in stocks {
                ensure_non_negative(member, stock_id, "quantity", *quantity)?;
                if quantity.is_zero() {
                    continue;
                }
                let price = prices
                    .price(stock_id)
                    .ok_or_else(|| ValidationError::MissingPrice {
                        member: member.clone(),
                        stock_id: stock_id.clone(),
                    })?;
                if price <= Decimal::ZERO {
                    return Err(ValidationError::InvalidPrice {
                        stock_id: stock_id.clone(),
                        price,
                    });
                }
                let holding = Holding::priced(member.clone(), stock_id.clone(), *quantity, price)?
                    .with_goal_link(input.is_goal_linked(member, stock_id));
                accumulate(&mut total, &holding)?;
                portfolio.push(holding);
            }
        }

        log::debug!(
            "normalized portfolio: {} holdings across {} members, total value {}",
            portfolio.len(),
            portfolio.members.len(),
            portfolio.total_value()
        );
        Ok(portfolio)
    }

    /// Add a holding directly. Zero-valued holdings only register the member.
    pub fn push(&mut self, holding: Holding) {
        self.members.insert(holding.member().clone());
        if holding.value() > Decimal::ZERO {
            self.holdings.push(holding);
        }
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn members(&self) -> &BTreeSet<MemberId> {
        &self.members
    }

    pub fn contains_member(&self, member: &MemberId) -> bool {
        self.members.contains(member)
    }

    /// Verify every referenced member owns something in this portfolio.
    pub fn ensure_members<'a>(
        &self,
        referenced: impl IntoIterator<Item = &'a MemberId>,
    ) -> Result<()> {
        for member in referenced {
            if !self.contains_member(member) {
                return Err(ValidationError::UnknownPriorityMember(member.clone()));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Total estimated value of all holdings.
    ///
    /// Saturates at `Decimal::MAX` for hand-built portfolios; normalized
    /// ones are checked in [`from_input`](Self::from_input).
    pub fn total_value(&self) -> Decimal {
        saturating_sum(self.holdings.iter())
    }

    /// Total value held in one asset class.
    pub fn class_value(&self, class: AssetClass) -> Decimal {
        saturating_sum(self.holdings.iter().filter(|h| h.asset_class() == class))
    }

    /// Total value owned by one member.
    pub fn member_value(&self, member: &MemberId) -> Decimal {
        saturating_sum(self.holdings.iter().filter(|h| h.member() == member))
    }
}

impl FromIterator<Holding> for Portfolio {
    fn from_iter<T: IntoIterator<Item = Holding>>(iter: T) -> Self {
        let mut portfolio = Portfolio::new();
        for holding in iter {
            portfolio.push(holding);
        }
        portfolio
    }
}

fn saturating_sum<'a>(holdings: impl Iterator<Item = &'a Holding>) -> Decimal {
    holdings.fold(Decimal::ZERO, |acc, h| acc.saturating_add(h.value()))
}

fn accumulate(total: &mut Decimal, holding: &Holding) -> Result<()> {
    *total = total
        .checked_add(holding.value())
        .ok_or_else(|| ValidationError::ValueOutOfRange {
            field: "total_value",
            detail: format!("adding {} overflows the portfolio total", holding),
        })?;
    Ok(())
}

fn ensure_non_negative(
    member: &MemberId,
    asset_key: &str,
    field: &'static str,
    value: Decimal,
) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeHolding {
            member: member.clone(),
            asset_key: asset_key.to_string(),
            field,
            value,
        });
    }
    Ok(())
}
