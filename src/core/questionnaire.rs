use crate::config::EngineConfig;
use crate::core::error::{Result, ValidationError};
use crate::core::member::MemberId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Defines a closed questionnaire answer set with its wire names.
macro_rules! answer_enum {
    (
        $(#[$meta:meta])*
        $name:ident, field = $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ValidationError::UnknownValue {
                        field: $field,
                        value: other.to_string(),
                        expected: concat!($($wire, " "),+).trim_end(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

answer_enum! {
    /// Why the money is needed.
    Purpose, field = "purpose" {
        Emergency => "emergency",
        PlannedPurchase => "planned_purchase",
        LoanRepayment => "loan_repayment",
        Other => "other",
    }
}

answer_enum! {
    /// How soon the money is needed.
    Timeline, field = "timeline" {
        Today => "today",
        TwoToThreeDays => "2-3_days",
        WithinWeek => "within_week",
        OneToFourWeeks => "1-4_weeks",
        NoTimeline => "no_timeline",
    }
}

answer_enum! {
    RecurringNeed, field = "recurring_need" {
        OneTime => "one_time",
        Recurring => "recurring",
    }
}

answer_enum! {
    /// Whether the household has financial goals to protect.
    HasGoals, field = "has_goals" {
        Yes => "yes",
        No => "no",
    }
}

answer_enum! {
    /// Expected change in household income.
    IncomeChange, field = "income_change" {
        NoChange => "no_change",
        WillReduce => "will_reduce",
        WillIncrease => "will_increase",
    }
}

impl Timeline {
    /// Urgency tier driven by the timeline alone.
    pub fn base_urgency(&self) -> u8 {
        match self {
            Timeline::Today => 4,
            Timeline::TwoToThreeDays => 3,
            Timeline::WithinWeek => 2,
            Timeline::OneToFourWeeks => 1,
            Timeline::NoTimeline => 0,
        }
    }

    /// Money is needed within a few days.
    pub fn is_immediate(&self) -> bool {
        matches!(self, Timeline::Today | Timeline::TwoToThreeDays)
    }
}

/// Raw questionnaire answers as supplied by the caller.
///
/// Missing answers fall back to the least demanding choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireInput {
    #[serde(default = "default_purpose")]
    pub purpose: String,
    #[serde(default = "default_timeline")]
    pub timeline: String,
    #[serde(default)]
    pub amount_needed: Decimal,
    #[serde(default = "default_recurring_need")]
    pub recurring_need: String,
    #[serde(default = "default_has_goals")]
    pub has_goals: String,
    #[serde(default = "default_income_change")]
    pub income_change: String,
    #[serde(default)]
    pub priority_members: Vec<MemberId>,
}

fn default_purpose() -> String {
    Purpose::Other.as_str().to_string()
}

fn default_timeline() -> String {
    Timeline::NoTimeline.as_str().to_string()
}

fn default_recurring_need() -> String {
    RecurringNeed::OneTime.as_str().to_string()
}

fn default_has_goals() -> String {
    HasGoals::No.as_str().to_string()
}

fn default_income_change() -> String {
    IncomeChange::NoChange.as_str().to_string()
}

impl Default for QuestionnaireInput {
    fn default() -> Self {
        Self {
            purpose: default_purpose(),
            timeline: default_timeline(),
            amount_needed: Decimal::ZERO,
            recurring_need: default_recurring_need(),
            has_goals: default_has_goals(),
            income_change: default_income_change(),
            priority_members: Vec::new(),
        }
    }
}

impl From<&Questionnaire> for QuestionnaireInput {
    fn from(q: &Questionnaire) -> Self {
        Self {
            purpose: q.purpose.as_str().to_string(),
            timeline: q.timeline.as_str().to_string(),
            amount_needed: q.amount_needed,
            recurring_need: q.recurring_need.as_str().to_string(),
            has_goals: q.has_goals.as_str().to_string(),
            income_change: q.income_change.as_str().to_string(),
            priority_members: q.priority_members.clone(),
        }
    }
}

/// Validated questionnaire answers.
///
/// # Examples
///
/// ```
/// use liquidation_engine::core::questionnaire::{Questionnaire, Timeline};
/// use liquidation_engine::config::EngineConfig;
/// use rust_decimal_macros::dec;
///
/// let q = Questionnaire::new(dec!(500)).with_timeline(Timeline::Today);
/// let profile = q.profile(&EngineConfig::default());
/// assert_eq!(profile.urgency_tier(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questionnaire {
    purpose: Purpose,
    timeline: Timeline,
    recurring_need: RecurringNeed,
    has_goals: HasGoals,
    income_change: IncomeChange,
    priority_members: Vec<MemberId>,
    amount_needed: Decimal,
}

impl Questionnaire {
    /// Questionnaire with default answers for the given need.
    pub fn new(amount_needed: Decimal) -> Self {
        Self {
            purpose: Purpose::Other,
            timeline: Timeline::NoTimeline,
            recurring_need: RecurringNeed::OneTime,
            has_goals: HasGoals::No,
            income_change: IncomeChange::NoChange,
            priority_members: Vec::new(),
            amount_needed,
        }
    }

    /// Validate raw answers against the closed answer sets.
    pub fn from_input(input: &QuestionnaireInput) -> Result<Self> {
        if input.amount_needed < Decimal::ZERO {
            return Err(ValidationError::NegativeAmountNeeded(input.amount_needed));
        }
        if input.amount_needed.checked_mul(Decimal::ONE_HUNDRED).is_none() {
            return Err(ValidationError::ValueOutOfRange {
                field: "amount_needed",
                detail: format!("{} cannot be expressed as a percentage", input.amount_needed),
            });
        }
        let mut q = Self::new(input.amount_needed)
            .with_purpose(input.purpose.parse()?)
            .with_timeline(input.timeline.parse()?)
            .with_recurring_need(input.recurring_need.parse()?)
            .with_has_goals(input.has_goals.parse()?)
            .with_income_change(input.income_change.parse()?);
        for member in &input.priority_members {
            q = q.with_priority_member(member.clone());
        }
        Ok(q)
    }

    pub fn with_purpose(mut self, purpose: Purpose) -> Self {
        self.purpose = purpose;
        self
    }

    pub fn with_timeline(mut self, timeline: Timeline) -> Self {
        self.timeline = timeline;
        self
    }

    pub fn with_recurring_need(mut self, recurring_need: RecurringNeed) -> Self {
        self.recurring_need = recurring_need;
        self
    }

    pub fn with_has_goals(mut self, has_goals: HasGoals) -> Self {
        self.has_goals = has_goals;
        self
    }

    pub fn with_income_change(mut self, income_change: IncomeChange) -> Self {
        self.income_change = income_change;
        self
    }

    /// Add a priority member. Duplicates are ignored; order is kept.
    pub fn with_priority_member(mut self, member: impl Into<MemberId>) -> Self {
        let member = member.into();
        if !self.priority_members.contains(&member) {
            self.priority_members.push(member);
        }
        self
    }

    // --- Accessors ---

    pub fn purpose(&self) -> Purpose {
        self.purpose
    }

    pub fn timeline(&self) -> Timeline {
        self.timeline
    }

    pub fn recurring_need(&self) -> RecurringNeed {
        self.recurring_need
    }

    pub fn has_goals(&self) -> HasGoals {
        self.has_goals
    }

    pub fn income_change(&self) -> IncomeChange {
        self.income_change
    }

    pub fn priority_members(&self) -> &[MemberId] {
        &self.priority_members
    }

    pub fn amount_needed(&self) -> Decimal {
        self.amount_needed
    }

    /// Derive the urgency/preference profile the optimizer consumes.
    pub fn profile(&self, config: &EngineConfig) -> UrgencyProfile {
        let cap = config.max_urgency_tier;
        let mut tier = self.timeline.base_urgency().min(cap);
        if self.purpose == Purpose::Emergency {
            tier = tier.saturating_add(config.emergency_urgency_bump).min(cap);
        }
        if self.income_change == IncomeChange::WillReduce {
            tier = tier
                .saturating_add(config.income_reduction_urgency_bump)
                .min(cap);
        }

        let recurring = self.recurring_need == RecurringNeed::Recurring;
        let max_fraction = if recurring {
            config.recurring_max_fraction
        } else {
            config.one_time_max_fraction
        };

        UrgencyProfile {
            urgency_tier: tier,
            override_tier: config.urgency_override_tier,
            purpose: self.purpose,
            timeline: self.timeline,
            recurring,
            goal_preservation: self.has_goals == HasGoals::Yes,
            income_change: self.income_change,
            priority_members: self.priority_members.iter().cloned().collect(),
            max_fraction,
            bank_reserve_target: config.reserve_targets.target(self.purpose, self.timeline),
        }
    }
}

/// Structured urgency and preference profile derived from the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencyProfile {
    urgency_tier: u8,
    override_tier: u8,
    purpose: Purpose,
    timeline: Timeline,
    recurring: bool,
    goal_preservation: bool,
    income_change: IncomeChange,
    priority_members: BTreeSet<MemberId>,
    max_fraction: Decimal,
    bank_reserve_target: Decimal,
}

impl UrgencyProfile {
    /// Discrete urgency, 0 (no timeline) through the configured maximum.
    pub fn urgency_tier(&self) -> u8 {
        self.urgency_tier
    }

    /// Whether urgency is high enough to override goal preservation.
    pub fn is_urgent(&self) -> bool {
        self.urgency_tier >= self.override_tier
    }

    pub fn purpose(&self) -> Purpose {
        self.purpose
    }

    pub fn timeline(&self) -> Timeline {
        self.timeline
    }

    pub fn is_recurring(&self) -> bool {
        self.recurring
    }

    pub fn preserves_goals(&self) -> bool {
        self.goal_preservation
    }

    pub fn income_change(&self) -> IncomeChange {
        self.income_change
    }

    pub fn priority_members(&self) -> &BTreeSet<MemberId> {
        &self.priority_members
    }

    pub fn is_priority(&self, member: &MemberId) -> bool {
        self.priority_members.contains(member)
    }

    /// Largest share of any single holding the optimizer may draw.
    pub fn max_fraction(&self) -> Decimal {
        self.max_fraction
    }

    /// Advisory bank share to keep after liquidation.
    pub fn bank_reserve_target(&self) -> Decimal {
        self.bank_reserve_target
    }
}
