use crate::models::{Allocation, MemberId, Money};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Rule used to divide an expense between group members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SplitPolicy {
    Equal,
    Exact,
    Percent,
}

impl SplitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitPolicy::Equal => "EQUAL",
            SplitPolicy::Exact => "EXACT",
            SplitPolicy::Percent => "PERCENT",
        }
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absolute amount owed by one member under an `EXACT` split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactShare {
    pub member: MemberId,
    pub amount: Money,
}

/// Percentage owed by one member under a `PERCENT` split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentShare {
    pub member: MemberId,
    pub percent: Decimal,
}

/// A split policy together with the weights it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "weights", rename_all = "UPPERCASE")]
pub enum Split {
    Equal,
    Exact(Vec<ExactShare>),
    Percent(Vec<PercentShare>),
}

impl Split {
    pub fn policy(&self) -> SplitPolicy {
        match self {
            Split::Equal => SplitPolicy::Equal,
            Split::Exact(_) => SplitPolicy::Exact,
            Split::Percent(_) => SplitPolicy::Percent,
        }
    }

    pub fn exact<I, M>(weights: I) -> Self
    where
        I: IntoIterator<Item = (M, Money)>,
        M: Into<MemberId>,
    {
        Split::Exact(
            weights
                .into_iter()
                .map(|(member, amount)| ExactShare {
                    member: member.into(),
                    amount,
                })
                .collect(),
        )
    }

    pub fn percent<I, M>(weights: I) -> Self
    where
        I: IntoIterator<Item = (M, Decimal)>,
        M: Into<MemberId>,
    {
        Split::Percent(
            weights
                .into_iter()
                .map(|(member, percent)| PercentShare {
                    member: member.into(),
                    percent,
                })
                .collect(),
        )
    }
}

/// Spending category attached to an expense.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExpenseCategory {
    Food,
    Travel,
    Housing,
    Utilities,
    Entertainment,
    Shopping,
    Transport,
    #[default]
    Other,
}

impl ExpenseCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "Food & Drink",
            ExpenseCategory::Travel => "Travel",
            ExpenseCategory::Housing => "Housing",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::Entertainment => "Entertainment",
            ExpenseCategory::Shopping => "Shopping",
            ExpenseCategory::Transport => "Transport",
            ExpenseCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for ExpenseCategory {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FOOD" => Ok(ExpenseCategory::Food),
            "TRAVEL" => Ok(ExpenseCategory::Travel),
            "HOUSING" | "RENT" => Ok(ExpenseCategory::Housing),
            "UTILITIES" => Ok(ExpenseCategory::Utilities),
            "ENTERTAINMENT" => Ok(ExpenseCategory::Entertainment),
            "SHOPPING" => Ok(ExpenseCategory::Shopping),
            "TRANSPORT" => Ok(ExpenseCategory::Transport),
            "OTHER" => Ok(ExpenseCategory::Other),
            _ => Err(CategoryParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryParseError(String);

impl fmt::Display for CategoryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown expense category: {}", self.0)
    }
}

impl std::error::Error for CategoryParseError {}

/// A recorded expense with its stored allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub description: String,
    #[serde(default)]
    pub category: ExpenseCategory,
    pub amount: Money,
    pub payer: MemberId,
    pub split: Split,
    pub allocation: Allocation,
    pub date: DateTime<Utc>,
}

impl Expense {
    /// True if `member` paid this expense or appears in its allocation.
    pub fn references(&self, member: &MemberId) -> bool {
        &self.payer == member || self.allocation.contains(member)
    }
}

/// Validated input for a new expense, before allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub description: String,
    #[serde(default)]
    pub category: ExpenseCategory,
    pub amount: Money,
    pub payer: MemberId,
    pub split: Split,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl ExpenseDraft {
    pub fn new(description: impl Into<String>, amount: Money, payer: impl Into<MemberId>, split: Split) -> Self {
        Self {
            description: description.into(),
            category: ExpenseCategory::Other,
            amount,
            payer: payer.into(),
            split,
            date: None,
        }
    }

    pub fn with_category(mut self, category: ExpenseCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}

/// Partial edit of an existing expense. Changing `amount` or `split`
/// forces the allocation to be recomputed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub amount: Option<Money>,
    pub split: Option<Split>,
    pub date: Option<DateTime<Utc>>,
}

impl ExpenseUpdate {
    pub fn requires_reallocation(&self) -> bool {
        self.amount.is_some() || self.split.is_some()
    }
}
