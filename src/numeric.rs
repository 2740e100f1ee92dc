//! Exact-decimal helpers for the `multipleOf` keyword.
//!
//! `f64` remainder checks (`0.1 % 0.1 != 0.0`) reject values that are exact
//! multiples in decimal. Both operands are re-read from their source lexeme
//! as `(mantissa, scale)` pairs and compared with integer arithmetic instead.

use std::sync::OnceLock;

use regex::Regex;

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(-?\d+)(?:\.(\d+))?[eE]([+-]?\d+)$|^(-?\d+)(?:\.(\d+))?$").unwrap())
}

/// Decomposes a JSON number lexeme into `(mantissa, scale)` such that the
/// value equals `mantissa * 10^-scale`. Returns `None` if the lexeme can't be
/// parsed this way (callers fall back to a plain floating-point check).
pub fn decompose(raw: &str) -> Option<(i128, i32)> {
    let caps = decimal_pattern().captures(raw)?;
    if let Some(int_part) = caps.get(1) {
        let frac = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let exp: i32 = caps.get(3).map(|m| m.as_str().parse().ok()).flatten()?;
        let digits = format!("{}{}", int_part.as_str(), frac);
        let mantissa: i128 = digits.parse().ok()?;
        let scale = frac.len() as i32 - exp;
        Some(normalize(mantissa, scale))
    } else {
        let int_part = caps.get(4)?;
        let frac = caps.get(5).map(|m| m.as_str()).unwrap_or("");
        let digits = format!("{}{}", int_part.as_str(), frac);
        let mantissa: i128 = digits.parse().ok()?;
        let scale = frac.len() as i32;
        Some(normalize(mantissa, scale))
    }
}

fn normalize(mut mantissa: i128, mut scale: i32) -> (i128, i32) {
    while scale > 0 && mantissa % 10 == 0 {
        mantissa /= 10;
        scale -= 1;
    }
    (mantissa, scale)
}

/// True if `value` is an exact multiple of `divisor`, decomposed from their
/// original lexemes. Falls back to a floating-point remainder check if
/// either lexeme doesn't decompose cleanly.
pub fn is_multiple_of(value: f64, value_raw: &str, divisor: f64, divisor_raw: &str) -> bool {
    if divisor == 0.0 {
        return false;
    }
    match (decompose(value_raw), decompose(divisor_raw)) {
        (Some((vm, vs)), Some((dm, ds))) => {
            let scale = vs.max(ds);
            let vm = vm * 10i128.pow((scale - vs) as u32);
            let dm = dm * 10i128.pow((scale - ds) as u32);
            if dm == 0 {
                return false;
            }
            vm % dm == 0
        }
        _ => {
            let remainder = value / divisor;
            (remainder - remainder.round()).abs() < 1e-9
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_plain_decimal() {
        assert_eq!(decompose("0.1"), Some((1, 1)));
        assert_eq!(decompose("1.50"), Some((15, 1)));
        assert_eq!(decompose("-2.5"), Some((-25, 1)));
    }

    #[test]
    fn decomposes_exponent_form() {
        assert_eq!(decompose("1.5e2"), Some((150, 0)));
        assert_eq!(decompose("1e-2"), Some((1, 2)));
    }

    #[test]
    fn decimal_multiple_of_is_exact() {
        assert!(is_multiple_of(0.3, "0.3", 0.1, "0.1"));
        assert!(!is_multiple_of(0.31, "0.31", 0.1, "0.1"));
    }

    #[test]
    fn integers_still_work() {
        assert!(is_multiple_of(9.0, "9", 3.0, "3"));
        assert!(!is_multiple_of(10.0, "10", 3.0, "3"));
    }
}
