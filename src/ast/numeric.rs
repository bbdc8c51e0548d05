//! Arbitrary-precision numeric values carried by literals.
//!
//! Integers are plain `BigInt`s. Floats wrap an `astro_float::BigFloat`
//! at a fixed working precision so literal folding never loses range.

use std::{cmp::Ordering, fmt::Display};

use astro_float::{BigFloat, RoundingMode};
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

/// Working precision, in bits, for folded float literals.
pub const FLOAT_PRECISION: usize = 256;

const ROUNDING: RoundingMode = RoundingMode::ToEven;

#[derive(Debug, Clone)]
pub struct FloatValue(BigFloat);

impl FloatValue {
    pub fn zero() -> Self {
        FloatValue(BigFloat::from_f64(0.0, FLOAT_PRECISION))
    }

    pub fn from_f64(value: f64) -> Self {
        FloatValue(BigFloat::from_f64(value, FLOAT_PRECISION))
    }

    /// Parses a decimal literal such as `3.25` or `1e-9`.
    pub fn parse(text: &str) -> Option<Self> {
        let value: BigFloat = text.parse().ok()?;
        if value.is_nan() {
            None
        } else {
            Some(FloatValue(value))
        }
    }

    pub fn from_int(value: &BigInt) -> Self {
        match FloatValue::parse(&value.to_string()) {
            Some(float) => float,
            None => FloatValue::from_f64(value.to_f64().unwrap_or(f64::NAN)),
        }
    }

    pub fn add(&self, other: &FloatValue) -> FloatValue {
        FloatValue(self.0.add(&other.0, FLOAT_PRECISION, ROUNDING))
    }

    pub fn sub(&self, other: &FloatValue) -> FloatValue {
        FloatValue(self.0.sub(&other.0, FLOAT_PRECISION, ROUNDING))
    }

    pub fn mul(&self, other: &FloatValue) -> FloatValue {
        FloatValue(self.0.mul(&other.0, FLOAT_PRECISION, ROUNDING))
    }

    pub fn div(&self, other: &FloatValue) -> FloatValue {
        FloatValue(self.0.div(&other.0, FLOAT_PRECISION, ROUNDING))
    }

    pub fn neg(&self) -> FloatValue {
        FloatValue(self.0.neg())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `None` only when either side is NaN.
    pub fn compare(&self, other: &FloatValue) -> Option<Ordering> {
        self.0.cmp(&other.0).map(|c| c.cmp(&0))
    }
}

impl PartialEq for FloatValue {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.compare(other), Some(Ordering::Equal))
    }
}

impl Display for FloatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn int_is_zero(value: &BigInt) -> bool {
    value.is_zero()
}
