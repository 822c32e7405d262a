use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Div, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const RUPIAH_CURRENCY_CODE: &str = "IDR";

//--------------------------------------       Rupiah        ---------------------------------------------------------
/// A whole-rupiah amount. The gateway only accepts integer amounts, so there is no minor unit.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Rupiah(i64);

op!(binary Rupiah, Add, add);
op!(binary Rupiah, Sub, sub);
op!(inplace Rupiah, SubAssign, sub_assign);
op!(unary Rupiah, Neg, neg);
op!(scalar Rupiah, i64, Mul, mul);
op!(scalar Rupiah, i64, Div, div);

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in rupiah: {0}")]
pub struct RupiahConversionError(String);

impl From<i64> for Rupiah {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Rupiah {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Rupiah {}

impl TryFrom<u64> for Rupiah {
    type Error = RupiahConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(RupiahConversionError(format!("Value {} is too large to convert to Rupiah", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

/// Gateways send amounts as decimal strings, e.g. `"3000000.00"`. Fractional rupiah are not allowed.
impl TryFrom<&str> for Rupiah {
    type Error = RupiahConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim();
        let (whole, frac) = value.split_once('.').unwrap_or((value, ""));
        if !frac.chars().all(|c| c == '0') {
            return Err(RupiahConversionError(format!("{value} has a fractional part")));
        }
        whole.parse::<i64>().map(Self).map_err(|e| RupiahConversionError(format!("{value} is not an amount. {e}")))
    }
}

impl Display for Rupiah {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}Rp{grouped}")
    }
}

impl Rupiah {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
