//! Double-double arithmetic: ~106-bit mantissa precision from two f64 values.
//!
//! Value = hi + lo, with |lo| ≤ 0.5 × ulp(hi) after every operation.
//! Provides the extended precision used by the CPU escape-time kernel, so
//! zooms stay sharp roughly 10^16 times deeper than plain f64.
//!
//! Error-free transforms follow Dekker/Knuth. The product error term uses
//! `libm::fma`, which is correctly rounded on every target, so results are
//! bit-identical regardless of hardware FMA support.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Largest decimal exponent accepted by the string parser.
const MAX_DECIMAL_EXPONENT: i32 = 330;

/// Extended-precision float stored as an unevaluated sum `hi + lo`.
///
/// Field order matters: the derived `PartialOrd` compares `hi` first, which is
/// the correct ordering for normalized values.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DoubleDouble {
    /// Leading component, equal to the value rounded to f64.
    pub hi: f64,
    /// Rounding error of `hi`.
    pub lo: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDoubleDoubleError {
    #[error("empty number")]
    Empty,
    #[error("invalid number: {0:?}")]
    Invalid(String),
    #[error("decimal exponent out of range: {0:?}")]
    OutOfRange(String),
}

impl DoubleDouble {
    pub const ZERO: Self = Self { hi: 0.0, lo: 0.0 };
    pub const ONE: Self = Self { hi: 1.0, lo: 0.0 };

    /// Create from an f64 (exact).
    #[inline]
    pub const fn from_f64(val: f64) -> Self {
        Self { hi: val, lo: 0.0 }
    }

    /// Round to the nearest f64.
    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.hi + self.lo
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.hi == 0.0
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.hi.is_finite() && self.lo.is_finite()
    }

    #[inline]
    pub fn neg(&self) -> Self {
        Self {
            hi: -self.hi,
            lo: -self.lo,
        }
    }

    #[inline]
    pub fn abs(&self) -> Self {
        if self.hi < 0.0 {
            self.neg()
        } else {
            *self
        }
    }

    #[inline]
    pub fn add(&self, other: &Self) -> Self {
        let (s, e) = two_sum(self.hi, other.hi);
        let (t, f) = two_sum(self.lo, other.lo);
        let (s, e) = quick_two_sum(s, e + t);
        let (hi, lo) = quick_two_sum(s, e + f);
        Self { hi, lo }
    }

    #[inline]
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    #[inline]
    pub fn mul(&self, other: &Self) -> Self {
        let (p, e) = two_prod(self.hi, other.hi);
        let e = e + (self.hi * other.lo + self.lo * other.hi);
        let (hi, lo) = quick_two_sum(p, e);
        Self { hi, lo }
    }

    /// Multiply by an f64 scalar.
    #[inline]
    pub fn mul_f64(&self, factor: f64) -> Self {
        let (p, e) = two_prod(self.hi, factor);
        let e = e + self.lo * factor;
        let (hi, lo) = quick_two_sum(p, e);
        Self { hi, lo }
    }

    /// Square (cheaper than `mul(self)`).
    #[inline]
    pub fn square(&self) -> Self {
        let (p, e) = two_prod(self.hi, self.hi);
        let e = e + 2.0 * self.hi * self.lo;
        let (hi, lo) = quick_two_sum(p, e);
        Self { hi, lo }
    }

    /// Long division with three quotient refinements.
    ///
    /// Division by zero yields a non-finite result; callers validate divisors.
    pub fn div(&self, other: &Self) -> Self {
        let q1 = self.hi / other.hi;
        let r = self.sub(&other.mul_f64(q1));
        let q2 = r.hi / other.hi;
        let r = r.sub(&other.mul_f64(q2));
        let q3 = r.hi / other.hi;
        let (hi, lo) = quick_two_sum(q1, q2);
        Self { hi, lo }.add(&Self::from_f64(q3))
    }

    /// Divide by an f64 scalar.
    #[inline]
    pub fn div_f64(&self, divisor: f64) -> Self {
        self.div(&Self::from_f64(divisor))
    }

    /// Midpoint of two values.
    #[inline]
    pub fn midpoint(&self, other: &Self) -> Self {
        self.add(other).mul_f64(0.5)
    }

    /// Multiply by 10^exp using repeated exact-ish scaling.
    fn scale_pow10(mut self, exp: i32) -> Self {
        let ten = Self::from_f64(10.0);
        if exp >= 0 {
            for _ in 0..exp {
                self = self.mul_f64(10.0);
            }
        } else {
            for _ in 0..(-exp) {
                self = self.div(&ten);
            }
        }
        self
    }
}

impl From<f64> for DoubleDouble {
    fn from(val: f64) -> Self {
        Self::from_f64(val)
    }
}

/// Parses decimal notation (`-0.7436438870371587047521915`, `1.5e-20`) keeping
/// digits beyond f64 precision.
impl FromStr for DoubleDouble {
    type Err = ParseDoubleDoubleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseDoubleDoubleError::Empty);
        }

        let (negative, body) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let (mantissa, exponent) = match body.find(|c| c == 'e' || c == 'E') {
            Some(i) => {
                let exp = body[i + 1..]
                    .parse::<i32>()
                    .map_err(|_| ParseDoubleDoubleError::Invalid(s.to_string()))?;
                (&body[..i], exp)
            }
            None => (body, 0),
        };

        let mut value = Self::ZERO;
        let mut digits = 0usize;
        let mut fraction_digits = 0i32;
        let mut seen_point = false;

        for ch in mantissa.chars() {
            match ch {
                '0'..='9' => {
                    let digit = f64::from(ch as u8 - b'0');
                    value = value.mul_f64(10.0).add(&Self::from_f64(digit));
                    digits += 1;
                    if seen_point {
                        fraction_digits += 1;
                    }
                }
                '.' if !seen_point => seen_point = true,
                _ => return Err(ParseDoubleDoubleError::Invalid(s.to_string())),
            }
        }

        if digits == 0 {
            return Err(ParseDoubleDoubleError::Invalid(s.to_string()));
        }

        let scale = exponent.saturating_sub(fraction_digits);
        if scale.abs() > MAX_DECIMAL_EXPONENT + fraction_digits {
            return Err(ParseDoubleDoubleError::OutOfRange(s.to_string()));
        }

        let value = value.scale_pow10(scale);
        Ok(if negative { value.neg() } else { value })
    }
}

/// Error-free sum: a + b = s + e exactly.
#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let e = (a - (s - bb)) + (b - bb);
    (s, e)
}

/// Error-free sum assuming |a| ≥ |b|.
#[inline]
fn quick_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let e = b - (s - a);
    (s, e)
}

/// Error-free product: a × b = p + e exactly.
#[inline]
fn two_prod(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    (p, libm::fma(a, b, -p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dd(v: f64) -> DoubleDouble {
        DoubleDouble::from_f64(v)
    }

    #[test]
    fn add_keeps_bits_lost_by_f64() {
        let tiny = dd(1e-20);
        let sum = dd(1.0).add(&tiny);
        // f64 would round 1 + 1e-20 back to 1
        assert_eq!(sum.hi, 1.0);
        let back = sum.sub(&dd(1.0));
        assert!((back.to_f64() - 1e-20).abs() < 1e-35);
    }

    #[test]
    fn one_third_times_three_is_one() {
        let third = dd(1.0).div(&dd(3.0));
        let one = third.mul(&dd(3.0));
        assert!(one.sub(&DoubleDouble::ONE).abs().to_f64() < 1e-31);
    }

    #[test]
    fn square_matches_mul() {
        let x = dd(1.0).div(&dd(7.0)).add(&dd(-0.75));
        let sq = x.square();
        let m = x.mul(&x);
        assert!(sq.sub(&m).abs().to_f64() < 1e-31);
    }

    #[test]
    fn mul_f64_matches_mul() {
        let x = dd(2.0).div(&dd(3.0));
        let a = x.mul_f64(0.1);
        let b = x.mul(&dd(0.1));
        assert!(a.sub(&b).abs().to_f64() < 1e-32);
    }

    #[test]
    fn ordering_uses_low_word() {
        let a = dd(1.0);
        let b = dd(1.0).add(&dd(1e-25));
        assert!(b > a);
        assert!(a < b);
        assert!(a.neg() < a);
    }

    #[test]
    fn parse_keeps_extra_digits() {
        let parsed: DoubleDouble = "0.1".parse().unwrap();
        let tenth = dd(1.0).div(&dd(10.0));
        assert!(parsed.sub(&tenth).abs().to_f64() < 1e-32);
        // 0.1 as f64 is not exactly 1/10; the low word captures the difference
        assert!(parsed.lo != 0.0);
    }

    #[test]
    fn parse_handles_sign_and_exponent() {
        let v: DoubleDouble = "-1.25e-3".parse().unwrap();
        assert!((v.to_f64() + 0.00125).abs() < 1e-18);
        let w: DoubleDouble = "+42".parse().unwrap();
        assert_eq!(w.to_f64(), 42.0);
        let x: DoubleDouble = "3.".parse().unwrap();
        assert_eq!(x.to_f64(), 3.0);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            "".parse::<DoubleDouble>(),
            Err(ParseDoubleDoubleError::Empty)
        );
        assert!("abc".parse::<DoubleDouble>().is_err());
        assert!("1.2.3".parse::<DoubleDouble>().is_err());
        assert!("-".parse::<DoubleDouble>().is_err());
        assert!("1e".parse::<DoubleDouble>().is_err());
        assert!(matches!(
            "1e999".parse::<DoubleDouble>(),
            Err(ParseDoubleDoubleError::OutOfRange(_))
        ));
    }

    #[test]
    fn division_by_zero_is_not_finite() {
        assert!(!dd(1.0).div(&DoubleDouble::ZERO).is_finite());
    }
}
