use std::fmt::Write as _;

use crate::math::{Point3, Vector3};

const SIGNIFICANT: i32 = 15;
const MANTISSA_DECIMALS: usize = 14;

/// Formats a value with 15 significant digits, like C's `%.15g`.
///
/// Fixed notation is used for decimal exponents in `-4..15`, scientific
/// notation (`1e+20`, `1.5e-07`) otherwise. Trailing zeros are dropped.
#[must_use]
pub fn fmt_g(value: f64) -> String {
    if value.is_nan() {
        return "nan".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.into();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.into();
    }

    // The exponent of the rounded value picks the notation.
    let sci = format!("{:.*e}", MANTISSA_DECIMALS, value);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return sci;
    };

    if exp < -4 || exp >= SIGNIFICANT {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    } else {
        #[allow(clippy::cast_sign_loss)]
        let decimals = (SIGNIFICANT - 1 - exp) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_owned()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// Space-separated `%.15g` values.
#[must_use]
pub fn fmt_list(values: impl IntoIterator<Item = f64>) -> String {
    let mut out = String::new();
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&fmt_g(v));
    }
    out
}

#[must_use]
pub fn fmt_point(p: &Point3) -> String {
    fmt_list([p.x, p.y, p.z])
}

#[must_use]
pub fn fmt_vector(v: &Vector3) -> String {
    fmt_list([v.x, v.y, v.z])
}

/// Space-separated integers.
#[must_use]
pub fn fmt_indices(values: &[u32]) -> String {
    let mut out = String::new();
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{v}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_notation_trims_zeros() {
        assert_eq!(fmt_g(0.5), "0.5");
        assert_eq!(fmt_g(10.0), "10");
        assert_eq!(fmt_g(-1.25), "-1.25");
        assert_eq!(fmt_g(0.1 + 0.2), "0.3");
        assert_eq!(fmt_g(0.0001), "0.0001");
        assert_eq!(fmt_g(999_999_999_999_999.0), "999999999999999");
    }

    #[test]
    fn scientific_notation_outside_the_fixed_range() {
        assert_eq!(fmt_g(1e20), "1e+20");
        assert_eq!(fmt_g(1e15), "1e+15");
        assert_eq!(fmt_g(1e-5), "1e-05");
        assert_eq!(fmt_g(-1.5e-7), "-1.5e-07");
        assert_eq!(fmt_g(123_456_789_012_345_678.0), "1.23456789012346e+17");
    }

    #[test]
    fn rounding_to_fifteen_digits() {
        assert_eq!(fmt_g(1.0 / 3.0), "0.333333333333333");
        assert_eq!(fmt_g(2.0_f64.sqrt()), "1.4142135623731");
        assert_eq!(fmt_g(6.123_233_995_736_766e-17), "6.12323399573677e-17");
    }

    #[test]
    fn zero_and_non_finite() {
        assert_eq!(fmt_g(0.0), "0");
        assert_eq!(fmt_g(-0.0), "-0");
        assert_eq!(fmt_g(f64::INFINITY), "inf");
        assert_eq!(fmt_g(f64::NAN), "nan");
    }

    #[test]
    fn lists() {
        assert_eq!(fmt_point(&Point3::new(1.0, 0.5, -2.0)), "1 0.5 -2");
        assert_eq!(fmt_indices(&[0, 1, 2]), "0 1 2");
    }
}
