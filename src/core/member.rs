use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A household member, as named in the portfolio maps.
///
/// The id is whatever key the caller used under `bank_balances`,
/// `mutual_funds` or `stocks` ("self", "spouse", "dad"). Priority members
/// in the questionnaire must use the same spelling; ids are compared
/// exactly, with no case folding or trimming.
///
/// Ordering is plain string order. Portfolio normalization and per-member
/// totals iterate members in that order, which keeps plans reproducible.
///
/// ```
/// use liquidation_engine::core::member::MemberId;
/// use std::collections::BTreeMap;
///
/// let mut raised = BTreeMap::new();
/// raised.insert(MemberId::new("spouse"), 40_000);
/// raised.insert(MemberId::new("dad"), 15_000);
///
/// assert_eq!(raised.get("spouse"), Some(&40_000));
/// assert_eq!(raised.keys().next().unwrap().as_str(), "dad");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// Lets member-keyed maps be queried with a plain `&str`.
impl Borrow<str> for MemberId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MemberId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
