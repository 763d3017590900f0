//! Arbitrary-magnitude decimal number for health and damage
//!
//! Values whose decimal exponent fits comfortably in an f64 are stored as the
//! plain f64 (`exponent == 0`), so everyday arithmetic like `46 - 15` is exact.
//! Anything larger or smaller is kept as `mantissa × 10^exponent` with
//! `1 ≤ |mantissa| < 10`, bounded only by the i64 exponent.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exponent gap beyond which the smaller addend cannot change the result
const MAX_SIGNIFICANT_DIGITS: i64 = 17;

/// Decimal exponents up to this magnitude are stored natively
const NATIVE_EXPONENT_LIMIT: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BigNum {
    mantissa: f64,
    exponent: i64,
}

/// Split a finite non-zero f64 into `(m, e)` with `1 ≤ |m| < 10`
fn scientific(value: f64) -> (f64, i64) {
    let shift = value.abs().log10().floor() as i32;
    // Two halves so subnormal inputs never divide by an underflowed 10^shift
    let half = shift / 2;
    let mut m = value / 10f64.powi(half) / 10f64.powi(shift - half);
    let mut e = i64::from(shift);
    // log10 rounding can leave the mantissa a hair outside [1, 10)
    if m.abs() >= 10.0 {
        m /= 10.0;
        e += 1;
    } else if m.abs() < 1.0 {
        m *= 10.0;
        e -= 1;
    }
    (m, e)
}

impl BigNum {
    pub const ZERO: Self = Self {
        mantissa: 0.0,
        exponent: 0,
    };
    pub const ONE: Self = Self {
        mantissa: 1.0,
        exponent: 0,
    };

    /// Build from a mantissa and a power-of-ten exponent
    pub fn from_parts(mantissa: f64, exponent: i64) -> Self {
        Self::normalized(mantissa, exponent)
    }

    /// Build from a native float. NaN and infinities collapse to zero.
    pub fn from_f64(value: f64) -> Self {
        if value == 0.0 || !value.is_finite() {
            return Self::ZERO;
        }
        let (m, e) = scientific(value);
        if e.abs() <= NATIVE_EXPONENT_LIMIT {
            Self {
                mantissa: value,
                exponent: 0,
            }
        } else {
            Self {
                mantissa: m,
                exponent: e,
            }
        }
    }

    fn normalized(mantissa: f64, exponent: i64) -> Self {
        if mantissa == 0.0 || !mantissa.is_finite() {
            return Self::ZERO;
        }
        if exponent == 0 {
            return Self::from_f64(mantissa);
        }
        let (m, shift) = scientific(mantissa);
        let e = exponent.saturating_add(shift);
        if e.abs() <= NATIVE_EXPONENT_LIMIT {
            Self::from_f64(m * 10f64.powi(e as i32))
        } else {
            Self {
                mantissa: m,
                exponent: e,
            }
        }
    }

    fn from_log10(log: f64, negative: bool) -> Self {
        if !log.is_finite() {
            return Self::ZERO;
        }
        let e = log.floor();
        let m = 10f64.powf(log - e);
        Self::normalized(if negative { -m } else { m }, e as i64)
    }

    #[inline]
    fn is_native(&self) -> bool {
        self.exponent == 0
    }

    /// `(mantissa, exponent)` view with `1 ≤ |mantissa| < 10`
    fn sci(&self) -> (f64, i64) {
        if self.is_zero() {
            (0.0, 0)
        } else if self.is_native() {
            scientific(self.mantissa)
        } else {
            (self.mantissa, self.exponent)
        }
    }

    pub fn mantissa(&self) -> f64 {
        self.sci().0
    }

    pub fn exponent(&self) -> i64 {
        self.sci().1
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0.0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.mantissa < 0.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.mantissa > 0.0
    }

    pub fn abs(self) -> Self {
        Self {
            mantissa: self.mantissa.abs(),
            exponent: self.exponent,
        }
    }

    /// Lossy conversion; saturates to ±infinity past the f64 range
    pub fn to_f64(&self) -> f64 {
        if self.is_native() {
            return self.mantissa;
        }
        if self.exponent > 308 {
            return self.mantissa.signum() * f64::INFINITY;
        }
        if self.exponent < -324 {
            return 0.0;
        }
        self.mantissa * 10f64.powi(self.exponent as i32)
    }

    /// Base-10 logarithm of the magnitude
    pub fn log10(&self) -> f64 {
        if self.is_zero() {
            return f64::NEG_INFINITY;
        }
        if self.is_native() {
            return self.mantissa.abs().log10();
        }
        self.mantissa.abs().log10() + self.exponent as f64
    }

    /// Raise to a real power. Negative bases only support integral powers;
    /// anything else yields zero.
    pub fn powf(self, power: f64) -> Self {
        if power == 0.0 {
            return Self::ONE;
        }
        if self.is_zero() {
            return Self::ZERO;
        }
        let negative = if self.is_negative() {
            if power.fract() != 0.0 {
                return Self::ZERO;
            }
            power.rem_euclid(2.0) == 1.0
        } else {
            false
        };
        Self::from_log10(self.log10() * power, negative)
    }

    /// Render with `digits` decimals in scientific form, e.g. `1.23e6`
    pub fn to_exponential(&self, digits: usize) -> String {
        let (m, e) = self.sci();
        let scale = 10f64.powi(digits as i32);
        let mut m = (m * scale).round() / scale;
        let mut e = e;
        if m.abs() >= 10.0 {
            m /= 10.0;
            e += 1;
        }
        format!("{:.*}e{}", digits, m, e)
    }

    fn compare(&self, other: &Self) -> Ordering {
        let sign = |n: &Self| -> i8 {
            if n.mantissa > 0.0 {
                1
            } else if n.mantissa < 0.0 {
                -1
            } else {
                0
            }
        };
        let (sa, sb) = (sign(self), sign(other));
        if sa != sb {
            return sa.cmp(&sb);
        }
        if sa == 0 {
            return Ordering::Equal;
        }
        if self.is_native() && other.is_native() {
            return self.mantissa.total_cmp(&other.mantissa);
        }
        let (ma, ea) = self.sci();
        let (mb, eb) = other.sci();
        let magnitude = ea.cmp(&eb).then(ma.abs().total_cmp(&mb.abs()));
        if sa > 0 { magnitude } else { magnitude.reverse() }
    }
}

impl Default for BigNum {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f64> for BigNum {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<u32> for BigNum {
    fn from(value: u32) -> Self {
        Self::from_f64(f64::from(value))
    }
}

impl Eq for BigNum {}

impl PartialOrd for BigNum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigNum {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Add for BigNum {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.is_zero() {
            return rhs;
        }
        if rhs.is_zero() {
            return self;
        }
        if self.is_native() && rhs.is_native() {
            let sum = self.mantissa + rhs.mantissa;
            if sum.is_finite() {
                return Self::from_f64(sum);
            }
        }
        let (ma, ea) = self.sci();
        let (mb, eb) = rhs.sci();
        let ((big_m, big_e), (small_m, small_e)) = if ea >= eb {
            ((ma, ea), (mb, eb))
        } else {
            ((mb, eb), (ma, ea))
        };
        let gap = big_e - small_e;
        if gap > MAX_SIGNIFICANT_DIGITS {
            return Self::normalized(big_m, big_e);
        }
        Self::normalized(big_m + small_m / 10f64.powi(gap as i32), big_e)
    }
}

impl Sub for BigNum {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Mul for BigNum {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self::ZERO;
        }
        if self.is_native() && rhs.is_native() {
            let product = self.mantissa * rhs.mantissa;
            if product.is_finite() && product != 0.0 {
                return Self::from_f64(product);
            }
        }
        let (ma, ea) = self.sci();
        let (mb, eb) = rhs.sci();
        Self::normalized(ma * mb, ea.saturating_add(eb))
    }
}

impl Mul<f64> for BigNum {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self * Self::from_f64(rhs)
    }
}

impl Neg for BigNum {
    type Output = Self;

    fn neg(self) -> Self {
        if self.is_zero() {
            return self;
        }
        Self {
            mantissa: -self.mantissa,
            exponent: self.exponent,
        }
    }
}

impl fmt::Display for BigNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.mantissa.abs();
        if self.is_native() && (self.is_zero() || (1e-6..1e21).contains(&magnitude)) {
            write!(f, "{}", self.mantissa)
        } else {
            let (m, e) = self.sci();
            write!(f, "{}e{}", m, e)
        }
    }
}

/// Text that is neither a decimal nor `<mantissa>e<exponent>`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid number: {0:?}")]
pub struct ParseBigNumError(String);

impl FromStr for BigNum {
    type Err = ParseBigNumError;

    /// Accepts everything `Display` produces
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let err = || ParseBigNumError(s.to_string());
        match text.rsplit_once(['e', 'E']) {
            Some((m, e)) => {
                let mantissa: f64 = m.parse().map_err(|_| err())?;
                let exponent: i64 = e.trim_start_matches('+').parse().map_err(|_| err())?;
                if !mantissa.is_finite() {
                    return Err(err());
                }
                Ok(Self::from_parts(mantissa, exponent))
            }
            None => {
                let value: f64 = text.parse().map_err(|_| err())?;
                if !value.is_finite() {
                    return Err(err());
                }
                Ok(Self::from_f64(value))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        ((a - b) / b.abs().max(1e-12)).abs() < 1e-9
    }

    #[test]
    fn test_scientific_view() {
        let n = BigNum::from_f64(4600.0);
        assert!(approx(n.mantissa(), 4.6));
        assert_eq!(n.exponent(), 3);
        assert_eq!(n.to_f64(), 4600.0);

        let n = BigNum::from_f64(-0.025);
        assert!(approx(n.mantissa(), -2.5));
        assert_eq!(n.exponent(), -2);
    }

    #[test]
    fn test_small_integer_arithmetic_is_exact() {
        let hp = BigNum::from_f64(46.0);
        let hit = BigNum::from_f64(15.0);
        assert_eq!((hp - hit).to_f64(), 31.0);
        assert_eq!(hp - hp, BigNum::ZERO);
        assert_eq!((hit * BigNum::from_f64(3.0)).to_f64(), 45.0);
    }

    #[test]
    fn test_huge_magnitudes() {
        let a = BigNum::from_parts(5.0, 1000);
        let sum = a + a;
        assert_eq!(sum.exponent(), 1001);
        assert!(approx(sum.mantissa(), 1.0));

        // Tiny addend vanishes
        assert_eq!(a + BigNum::ONE, a);

        let product = a * a;
        assert_eq!(product.exponent(), 2001);
        assert!(approx(product.mantissa(), 2.5));
        assert_eq!(product.to_f64(), f64::INFINITY);

        // Crossing back into native range
        let tiny = BigNum::from_parts(2.0, -998);
        assert!(approx((a * tiny).to_f64(), 1000.0));
    }

    #[test]
    fn test_subnormal_input_keeps_finite_mantissa() {
        let tiny = BigNum::from_f64(5e-324);
        assert!(tiny.mantissa().is_finite());
        assert!(tiny.mantissa() >= 1.0 && tiny.mantissa() < 10.0);
        assert_eq!(tiny.exponent(), -324);
        assert!(tiny.is_positive());
        assert!(tiny < BigNum::from_f64(f64::MIN_POSITIVE));

        let neg = BigNum::from_f64(-3e-310);
        assert!(neg.mantissa().is_finite());
        assert!(neg.is_negative());
        assert_eq!(neg.exponent(), -310);
    }

    #[test]
    fn test_powf() {
        let g = BigNum::from_f64(1.18);
        assert!(approx(g.powf(19.0).to_f64(), 1.18f64.powi(19)));

        let big = BigNum::from_f64(10.0).powf(5000.0);
        assert_eq!(big.exponent(), 5000);

        assert_eq!(BigNum::ZERO.powf(0.0), BigNum::ONE);
        assert_eq!(BigNum::from_f64(-2.0).powf(3.0).to_f64().round(), -8.0);
        assert_eq!(BigNum::from_f64(-2.0).powf(0.5), BigNum::ZERO);
    }

    #[test]
    fn test_ordering_across_signs_and_exponents() {
        let values = [
            BigNum::from_parts(-3.0, 500),
            BigNum::from_parts(-3.0, 50),
            BigNum::from_f64(-2.0),
            BigNum::ZERO,
            BigNum::from_f64(0.5),
            BigNum::from_f64(9.0),
            BigNum::from_f64(10.0),
            BigNum::from_parts(1.0, 400),
        ];
        for pair in values.windows(2) {
            assert!(pair[0] < pair[1], "{} should be < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_display_and_exponential() {
        assert_eq!(BigNum::from_f64(31.0).to_string(), "31");
        assert_eq!(BigNum::ZERO.to_string(), "0");
        assert_eq!(BigNum::from_parts(1.5, 400).to_string(), "1.5e400");
        assert_eq!(BigNum::from_f64(1_234_567.0).to_exponential(2), "1.23e6");
        assert_eq!(BigNum::from_f64(9_999_000.0).to_exponential(2), "1.00e7");
    }

    #[test]
    fn test_parse_display_output() {
        for n in [
            BigNum::from_f64(31.0),
            BigNum::from_f64(-0.5),
            BigNum::from_parts(1.5, 400),
            BigNum::from_parts(-7.25, -512),
        ] {
            assert_eq!(n.to_string().parse::<BigNum>().unwrap(), n);
        }
        assert_eq!("2.5e+3".parse::<BigNum>().unwrap().to_f64(), 2500.0);
        assert!("dragon".parse::<BigNum>().is_err());
        assert!("1e".parse::<BigNum>().is_err());
        assert!("inf".parse::<BigNum>().is_err());
    }

    proptest! {
        #[test]
        fn prop_ordering_matches_f64(a in -1e12f64..1e12, b in -1e12f64..1e12) {
            let (x, y) = (BigNum::from_f64(a), BigNum::from_f64(b));
            prop_assert_eq!(x.cmp(&y), a.partial_cmp(&b).unwrap_or(Ordering::Equal));
        }

        #[test]
        fn prop_add_sub_roundtrip(a in 0.0f64..1e9, b in 0.0f64..1e9) {
            let x = BigNum::from_f64(a);
            let y = BigNum::from_f64(b);
            let back = (x + y - y).to_f64();
            prop_assert!((back - a).abs() <= 1e-6 * a.max(1.0));
        }
    }
}
