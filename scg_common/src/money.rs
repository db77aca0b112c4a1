use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "INR";
pub const CURRENCY_CODE_LOWER: &str = "inr";

//--------------------------------------       Money       -----------------------------------------------------------
/// An exact amount of currency, stored as a signed count of minor units (cents).
///
/// All order, coupon and payment arithmetic happens in this type. Percentage and basis-point scaling round half-up at
/// cent precision, which is what keeps checkout, invoices and admin views bit-for-bit identical.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);
op!(scalar Money, i64, Mul, mul);

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as Money: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {value} is too large to convert to Money")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

impl Money {
    pub const ZERO: Money = Money(0);

    /// The amount as a count of minor units.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Construct an amount from whole currency units, e.g. `from_major(200)` is 200.00.
    pub fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    /// `pct` percent of this amount, rounded half-up to the nearest cent. `pct` must not be negative.
    pub fn percent(&self, pct: i64) -> Money {
        debug_assert!(pct >= 0, "percent scaling is only defined for non-negative rates");
        let numerator = self.0 as i128 * pct as i128;
        #[allow(clippy::cast_possible_truncation)]
        let cents = ((numerator + 50) / 100) as i64;
        Money(cents)
    }

    /// Scale by a basis-point rate (10 000 bp = 100%), rounded half-up to the nearest cent.
    pub fn at_basis_points(&self, bp: i64) -> Money {
        debug_assert!(bp >= 0, "basis-point scaling is only defined for non-negative rates");
        let numerator = self.0 as i128 * bp as i128;
        #[allow(clippy::cast_possible_truncation)]
        let cents = ((numerator + 5_000) / 10_000) as i64;
        Money(cents)
    }

    /// Clamp negative results to zero. Discounts use this so a total can never go below zero.
    pub fn or_zero(&self) -> Money {
        Money(self.0.max(0))
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}
