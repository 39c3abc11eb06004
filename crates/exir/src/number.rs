use core::f64;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Scalar payload carried by constant nodes.
///
/// Comparisons are value-exact: folding identities such as `a * 0` only
/// apply to a literal zero, never to values that merely round to it.
#[derive(Debug, Clone, PartialEq, Copy)]
pub struct Number(f64);

impl Number {
    /// Creates a new `Number` from an `f64` value.
    pub fn new(value: f64) -> Self {
        Number(value)
    }

    /// Returns the underlying `f64` value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns the underlying `i64` value, truncating any fractional part.
    pub fn to_int(self) -> i64 {
        self.0 as i64
    }

    /// Returns `true` if the number represents an integer value.
    pub fn is_int(&self) -> bool {
        (self.0 - self.0.trunc()).abs() < f64::EPSILON
    }

    /// Returns the absolute value of this number.
    pub fn abs(&self) -> Self {
        Number(self.0.abs())
    }

    /// Returns `true` for an exact zero (positive or negative).
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Returns `true` for an exact one.
    pub fn is_one(&self) -> bool {
        self.0 == 1.0
    }

    /// Returns `true` if the number is NaN (Not-a-Number).
    pub fn is_nan(&self) -> bool {
        self.0.is_nan()
    }
}

impl Default for Number {
    fn default() -> Self {
        Number(0.0)
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // 0.0 and -0.0 compare equal, so they must hash alike; every NaN
        // collapses to one bit pattern.
        let bits = if self.0 == 0.0 {
            0u64
        } else if self.0.is_nan() {
            f64::NAN.to_bits()
        } else {
            self.0.to_bits()
        };
        state.write_u64(bits);
    }
}

impl Neg for Number {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Number(-self.0)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number(value as f64)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number(value as f64)
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number(value as f64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_int() {
            write!(f, "{}", self.0 as i64)
        } else {
            let s = format!("{:.6}", self.0);
            let s = s.trim_end_matches('0').trim_end_matches('.');
            write!(f, "{}", s)
        }
    }
}

impl Add for Number {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Number(self.0 + other.0)
    }
}

impl Sub for Number {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Number(self.0 - other.0)
    }
}

impl Mul for Number {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Number(self.0 * other.0)
    }
}

impl Div for Number {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        Number(self.0 / other.0)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.is_nan(), other.0.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.0.partial_cmp(&other.0).unwrap_or(Ordering::Less),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(42.0, "42")]
    #[case(42.123, "42.123")]
    #[case(42.100, "42.1")]
    #[case(-42.0, "-42")]
    #[case(0.0, "0")]
    #[case(0.1, "0.1")]
    fn test_display_formatting(#[case] input: f64, #[case] expected: &str) {
        let num = Number::new(input);
        assert_eq!(format!("{}", num), expected);
    }

    #[rstest]
    #[case(5.0, 2.0, "7", "3", "10", "2.5")]
    #[case(10.0, 3.0, "13", "7", "30", "3.333333")]
    #[case(-5.0, 2.0, "-3", "-7", "-10", "-2.5")]
    fn test_operations(
        #[case] a: f64,
        #[case] b: f64,
        #[case] add_result: &str,
        #[case] sub_result: &str,
        #[case] mul_result: &str,
        #[case] div_result: &str,
    ) {
        let num_a = Number::new(a);
        let num_b = Number::new(b);

        assert_eq!(format!("{}", num_a + num_b), add_result);
        assert_eq!(format!("{}", num_a - num_b), sub_result);
        assert_eq!(format!("{}", num_a * num_b), mul_result);
        assert_eq!(format!("{}", num_a / num_b), div_result);
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(-0.0, true)]
    #[case(0.1, false)]
    #[case(1e-16, false)]
    fn test_is_zero_is_exact(#[case] value: f64, #[case] expected: bool) {
        assert_eq!(Number::new(value).is_zero(), expected);
    }

    #[rstest]
    #[case(5.0, 2.0, true, false)]
    #[case(2.0, 5.0, false, true)]
    #[case(5.0, 5.0, false, false)]
    fn test_comparisons(
        #[case] a: f64,
        #[case] b: f64,
        #[case] greater: bool,
        #[case] less: bool,
    ) {
        assert_eq!(Number::new(a) > Number::new(b), greater);
        assert_eq!(Number::new(a) < Number::new(b), less);
    }

    #[test]
    fn test_zero_hashes_like_negative_zero() {
        use rustc_hash::FxHasher;

        let hash = |n: Number| {
            let mut hasher = FxHasher::default();
            n.hash(&mut hasher);
            hasher.finish()
        };

        assert_eq!(Number::new(0.0), Number::new(-0.0));
        assert_eq!(hash(Number::new(0.0)), hash(Number::new(-0.0)));
    }
}
