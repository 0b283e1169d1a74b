use crate::value::{Float64, Value};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
};
use thiserror::Error as ThisError;

///
/// ValueFormatError
///
/// A supplied value could not be normalized into a (count, amount) pair.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValueFormatError {
    #[error("value is not numeric and not a (count, amount) pair: {value:?}")]
    NotNumeric { value: Value },

    #[error("non-finite amount")]
    NonFinite,

    #[error("pair must have exactly 2 elements, found {found}")]
    PairArity { found: usize },

    #[error("pair count is not a non-negative integer: {value:?}")]
    BadCount { value: Value },

    #[error("pair amount is not numeric: {value:?}")]
    BadAmount { value: Value },
}

///
/// Total
///
/// Accumulated (count, amount) for one bucket: how many observations were
/// merged in, and their summed numeric value. Count addition saturates;
/// amounts are finite by construction because observation normalization
/// rejects non-finite input.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Total {
    pub count: u64,
    pub amount: f64,
}

impl Total {
    pub const ZERO: Self = Self {
        count: 0,
        amount: 0.0,
    };

    #[must_use]
    pub const fn new(count: u64, amount: f64) -> Self {
        Self { count, amount }
    }
}

impl Add for Total {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            count: self.count.saturating_add(rhs.count),
            amount: self.amount + rhs.amount,
        }
    }
}

impl AddAssign for Total {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Total {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Total {
    /// Pair form: `(2, 15)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.count, self.amount)
    }
}

///
/// Observation
///
/// One accumulate call's payload: a bare amount standing for a single
/// observation, or an explicit (count, amount) pair. Everything fallible
/// about value intake happens in [`normalize`](Self::normalize) and
/// [`try_from_value`](Self::try_from_value), before any bucket is touched.
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Observation {
    Amount(f64),
    Pair { count: u64, amount: f64 },
}

impl Observation {
    /// Normalize to a [`Total`], rejecting non-finite amounts.
    ///
    /// A bare amount counts as one observation. The amount passes through
    /// [`Float64`] so -0.0 lands canonicalized.
    pub fn normalize(self) -> Result<Total, ValueFormatError> {
        let (count, amount) = match self {
            Self::Amount(amount) => (1, amount),
            Self::Pair { count, amount } => (count, amount),
        };

        let amount = Float64::try_new(amount).ok_or(ValueFormatError::NonFinite)?;

        Ok(Total::new(count, amount.get()))
    }

    /// Read an observation out of a raw [`Value`], the external-producer
    /// path: numeric scalars become bare amounts, 2-element numeric lists
    /// become explicit pairs, everything else is a format error.
    pub fn try_from_value(value: &Value) -> Result<Self, ValueFormatError> {
        match value {
            Value::List(items) => {
                let [count, amount] = items.as_slice() else {
                    return Err(ValueFormatError::PairArity { found: items.len() });
                };

                let count = count.to_count().ok_or_else(|| ValueFormatError::BadCount {
                    value: count.clone(),
                })?;
                let amount = amount
                    .to_f64_lossless()
                    .ok_or_else(|| ValueFormatError::BadAmount {
                        value: amount.clone(),
                    })?;

                Ok(Self::Pair { count, amount })
            }
            scalar => scalar
                .to_f64_lossless()
                .map(Self::Amount)
                .ok_or_else(|| ValueFormatError::NotNumeric {
                    value: scalar.clone(),
                }),
        }
    }
}

impl From<f64> for Observation {
    fn from(amount: f64) -> Self {
        Self::Amount(amount)
    }
}

impl From<f32> for Observation {
    fn from(amount: f32) -> Self {
        Self::Amount(f64::from(amount))
    }
}

impl From<i32> for Observation {
    fn from(amount: i32) -> Self {
        Self::Amount(f64::from(amount))
    }
}

impl From<u32> for Observation {
    fn from(amount: u32) -> Self {
        Self::Amount(f64::from(amount))
    }
}

impl From<(u64, f64)> for Observation {
    fn from((count, amount): (u64, f64)) -> Self {
        Self::Pair { count, amount }
    }
}

impl From<Total> for Observation {
    fn from(total: Total) -> Self {
        Self::Pair {
            count: total.count,
            amount: total.amount,
        }
    }
}

///
/// TESTS
///
