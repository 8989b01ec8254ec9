///
/// log-domain probability calculation
/// implements log-sum (base 2)
///
use approx::AbsDiffEq;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::str::FromStr;

///
/// Wrapper of f64 that represents `log2 p` of a probability (or an
/// unnormalized count) `p >= 0`.
///
/// `p = 0` is the *absent* value, stored as `-inf`. It is a valid value
/// meaning "impossible" and propagates through `+` (log-sum) and `*`
/// (log-product) without raising.
///
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, SerializeDisplay, DeserializeFromStr)]
pub struct LogProb(f64);

///
/// short-hand of `LogProb::from_prob`
///
pub fn p(p: f64) -> LogProb {
    LogProb::from_prob(p)
}

///
/// short-hand of `LogProb::from_log_prob`
///
pub fn lp(lp: f64) -> LogProb {
    LogProb::from_log_prob(lp)
}

impl LogProb {
    ///
    /// From a probability-space value (`log2` is taken)
    ///
    pub fn from_prob(value: f64) -> LogProb {
        LogProb(value.log2())
    }
    ///
    /// From a base-2 log value
    ///
    pub fn from_log_prob(log_value: f64) -> LogProb {
        LogProb(log_value)
    }
    ///
    /// Get the value in probability space `2^lp`
    pub fn to_value(self) -> f64 {
        self.0.exp2()
    }
    ///
    /// Get the base-2 log value (`-inf` if absent)
    pub fn to_log_value(self) -> f64 {
        self.0
    }
    ///
    /// Get the base-2 log value, or `None` if absent
    pub fn to_option(self) -> Option<f64> {
        if self.is_absent() {
            None
        } else {
            Some(self.0)
        }
    }
    ///
    /// Is `p == 0` or not? (log p = -inf)
    ///
    pub fn is_absent(self) -> bool {
        self.0.is_infinite() && self.0.is_sign_negative()
    }
    ///
    /// Is `p == 1`? (log p = 0)
    ///
    pub fn is_one(self) -> bool {
        self.0 == 0.0
    }
    ///
    /// p=0.0
    ///
    pub fn absent() -> LogProb {
        LogProb(f64::NEG_INFINITY)
    }
    ///
    /// p=1.0
    ///
    pub fn one() -> LogProb {
        LogProb(0.0)
    }
    ///
    /// difference of two log values `log a - log b`, treating two absent
    /// values as equal (difference 0).
    ///
    pub fn log_delta(&self, other: LogProb) -> f64 {
        if self.is_absent() && other.is_absent() {
            0.0
        } else {
            self.0 - other.0
        }
    }
}

/// p=0 (LogProb(-inf)) as a default value
impl Default for LogProb {
    fn default() -> Self {
        LogProb::absent()
    }
}

impl num_traits::One for LogProb {
    fn one() -> Self {
        LogProb::one()
    }
}

impl num_traits::Zero for LogProb {
    fn zero() -> Self {
        LogProb::absent()
    }
    fn is_zero(&self) -> bool {
        self.is_absent()
    }
}

///
/// Plain log value, `{:?}` of f64 so that it always carries a decimal point
/// (`-1.0`, `-0.5`, `-inf`).
///
impl std::fmt::Display for LogProb {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl FromStr for LogProb {
    type Err = std::num::ParseFloatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<f64>().map(LogProb)
    }
}

///
/// `log(x+y)` from `log x` and `log y`, each possibly absent.
///
/// With `r = max(log x, log y)`:
///
/// ```text
/// log(x + y)
///  = r + log(2^(log x - r) + 2^(log y - r))
///  = r + log(1 + 2^(min - r))
/// ```
///
/// The reference must be the maximum: `2^(min - r) <= 1` then never
/// overflows and the larger term is exact.
///
pub fn log_sum(x: LogProb, y: LogProb) -> LogProb {
    let (hi, lo) = if x.0 >= y.0 { (x.0, y.0) } else { (y.0, x.0) };
    if lo == f64::NEG_INFINITY {
        // x + 0 = x (also 0 + 0 = 0)
        LogProb(hi)
    } else if hi == lo {
        // x + x = 2x
        LogProb(hi + 1.0)
    } else {
        LogProb(hi + (lo - hi).exp2().ln_1p() / std::f64::consts::LN_2)
    }
}

///
/// `log(x*y) = log x + log y`; absent if either operand is absent.
///
pub fn log_product(x: LogProb, y: LogProb) -> LogProb {
    if x.is_absent() || y.is_absent() {
        LogProb::absent()
    } else {
        LogProb(x.0 + y.0)
    }
}

/// Addition of two probabilities `px + py` in log space (`log_sum`)
impl std::ops::Add for LogProb {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        log_sum(self, other)
    }
}

/// Multiplication of two probabilities `px * py` in log space (`log_product`)
impl std::ops::Mul for LogProb {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        log_product(self, other)
    }
}

/// Division of two probabilities `px / py` in log space
///
/// ```text
/// log(px / py) = log(px) - log(py)
/// ```
///
/// An absent numerator stays absent. The denominator must not be absent.
impl std::ops::Div for LogProb {
    type Output = Self;
    fn div(self, other: Self) -> Self {
        debug_assert!(!other.is_absent(), "division by p=0");
        if self.is_absent() {
            LogProb::absent()
        } else {
            LogProb(self.0 - other.0)
        }
    }
}

// assign
impl std::ops::AddAssign for LogProb {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}
impl std::ops::MulAssign for LogProb {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}
// sum/prod
impl std::iter::Sum for LogProb {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(LogProb::absent(), |a, b| a + b)
    }
}
impl<'a> std::iter::Sum<&'a Self> for LogProb {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(LogProb::absent(), |a, b| a + *b)
    }
}
impl std::iter::Product for LogProb {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(LogProb::one(), |a, b| a * b)
    }
}
impl<'a> std::iter::Product<&'a Self> for LogProb {
    fn product<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(LogProb::one(), |a, b| a * *b)
    }
}

/// for approx `assert_abs_diff_eq`
///
/// two absent values are equal.
impl AbsDiffEq for LogProb {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        if self.is_absent() || other.is_absent() {
            self.is_absent() && other.is_absent()
        } else {
            f64::abs_diff_eq(&self.0, &other.0, epsilon)
        }
    }
}
