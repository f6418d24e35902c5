use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Number of decimal places carried by a minor currency unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

const MINOR_PER_MAJOR: i64 = 100;

/// A signed amount of money stored as an integer count of minor units (cents).
///
/// All ledger arithmetic happens on the integer; `Decimal` only appears when
/// values cross the crate boundary, where they are rounded to two places.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates an amount from a count of minor units.
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates an amount from whole major units.
    pub fn from_major(major: i64) -> Self {
        Money(major.saturating_mul(MINOR_PER_MAJOR))
    }

    /// Converts a decimal amount, rounding half away from zero to the minor unit.
    pub fn from_decimal(value: Decimal) -> Result<Self, MoneyRangeError> {
        let rounded = value.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.to_i64())
            .map(Money)
            .ok_or(MoneyRangeError(value))
    }

    /// Renders the amount as a decimal with exactly two places.
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn abs(self) -> Self {
        Money(self.0.saturating_abs())
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Sums `amounts`, or `None` if the total leaves the `i64` range.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// True when the amount lies within `epsilon` of zero (inclusive).
    pub fn is_within(self, epsilon: Money) -> bool {
        self.0.unsigned_abs() <= epsilon.0.unsigned_abs()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.to_decimal()
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyRangeError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::from_decimal(value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_major = MINOR_PER_MAJOR as u64;
        write!(f, "{}{}.{:02}", sign, abs / per_major, abs % per_major)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| MoneyParseError(s.to_string()))?;
        Money::from_decimal(value).map_err(|_| MoneyParseError(s.to_string()))
    }
}

/// Decimal value too large to be held in minor units.
#[derive(Debug, Clone)]
pub struct MoneyRangeError(Decimal);

impl fmt::Display for MoneyRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount out of range: {}", self.0)
    }
}

impl std::error::Error for MoneyRangeError {}

#[derive(Debug, Clone)]
pub struct MoneyParseError(String);

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid money amount: {}", self.0)
    }
}

impl std::error::Error for MoneyParseError {}
