//! Numeric kernels for the VM.
//!
//! Every function here is total: domain errors resolve to a fallback value
//! instead of infinity or NaN.

#![allow(clippy::float_cmp)]

use std::f64::consts::PI;

/// Converts a truth value to `1.0` or `0.0`.
pub(crate) fn truth(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Whether a value counts as true.
pub(crate) fn truthy(a: f64) -> bool {
    a != 0.0
}

/// `a / b`, 0 when `b` is 0.
pub(crate) fn divide(a: f64, b: f64) -> f64 {
    if b == 0.0 { 0.0 } else { a / b }
}

/// `1 / a`, 0 when `a` is 0.
pub(crate) fn reciprocal(a: f64) -> f64 {
    if a == 0.0 { 0.0 } else { 1.0 / a }
}

/// `floor(a / b)`, 0 when `b` is 0.
pub(crate) fn quotient(a: f64, b: f64) -> f64 {
    if b == 0.0 { 0.0 } else { (a / b).floor() }
}

/// Floored modulo: the result takes the sign of `b`. 0 when `b` is 0.
pub(crate) fn modulo(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a - b * (a / b).floor()
    }
}

/// `a ^ b`.
///
/// Exponents 2 through 8 use repeated multiplication. A negative base only
/// has a real result for (nearly) integer exponents; otherwise 0. A zero
/// base yields 1.
pub(crate) fn power(a: f64, b: f64) -> f64 {
    if b == 2.0 {
        a * a
    } else if b == 3.0 {
        a * a * a
    } else if b == 4.0 {
        let t = a * a;
        t * t
    } else if b == 5.0 {
        let t = a * a;
        t * t * a
    } else if b == 6.0 {
        let t = a * a * a;
        t * t
    } else if b == 7.0 {
        let t = a * a * a;
        t * t * a
    } else if b == 8.0 {
        let mut t = a * a;
        t *= t;
        t * t
    } else if a > 0.0 {
        a.powf(b)
    } else if a < 0.0 {
        let x = b.round_ties_even();
        if (b - x).abs() <= 1e-4 {
            (-a).powf(x) * (PI * x).cos()
        } else {
            0.0
        }
    } else {
        1.0
    }
}

/// `-1`, `0` or `1`; NaN maps to 0.
pub(crate) fn sign(a: f64) -> f64 {
    if a > 0.0 {
        1.0
    } else if a < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Natural logarithm, 0 for non-positive arguments.
pub(crate) fn log(a: f64) -> f64 {
    if a <= 0.0 { 0.0 } else { a.ln() }
}

/// Square root, 0 for negative arguments.
pub(crate) fn sqrt(a: f64) -> f64 {
    if a < 0.0 { 0.0 } else { a.sqrt() }
}

/// Tangent, 0 within rounding distance of a pole.
pub(crate) fn tan(x: f64) -> f64 {
    let c = x / PI;
    let d = c - c.floor() - 0.5;
    let e = x.abs().floor() * 1.384_626_433_832_79e-16;
    if d >= -e && d <= e { 0.0 } else { x.tan() }
}

/// `a < b ? a : b`.
pub(crate) fn min(a: f64, b: f64) -> f64 {
    if a < b { a } else { b }
}

/// `a > b ? a : b`.
pub(crate) fn max(a: f64, b: f64) -> f64 {
    if a > b { a } else { b }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(divide(5.0, 0.0), 0.0);
        assert_eq!(reciprocal(0.0), 0.0);
        assert_eq!(quotient(5.0, 0.0), 0.0);
        assert_eq!(modulo(5.0, 0.0), 0.0);
    }

    #[test]
    fn floored_division() {
        assert_eq!(quotient(7.0, 2.0), 3.0);
        assert_eq!(quotient(-7.0, 2.0), -4.0);
        assert_eq!(modulo(7.0, 3.0), 1.0);
        assert_eq!(modulo(-7.0, 3.0), 2.0);
        assert_eq!(modulo(7.0, -3.0), -2.0);
    }

    #[test]
    fn small_integer_powers_multiply() {
        for a in [0.3, -1.7, 2.5, 11.0] {
            assert_eq!(power(a, 2.0), a * a);
            assert_eq!(power(a, 3.0), a * a * a);
            assert_eq!(power(a, 4.0), (a * a) * (a * a));
            assert_eq!(power(a, 5.0), (a * a) * (a * a) * a);
            assert_eq!(power(a, 6.0), (a * a * a) * (a * a * a));
            assert_eq!(power(a, 7.0), (a * a * a) * (a * a * a) * a);
            let t = (a * a) * (a * a);
            assert_eq!(power(a, 8.0), t * t);
        }
    }

    #[test]
    fn general_powers() {
        assert_eq!(power(4.0, 0.5), 2.0);
        assert_eq!(power(-8.0, 0.5), 0.0);
        assert!((power(-2.0, 9.0) + 512.0).abs() < 1e-9);
        assert!((power(-2.0, 10.0) - 1024.0).abs() < 1e-9);
        assert_eq!(power(0.0, 0.5), 1.0);
        assert_eq!(power(0.0, -1.0), 1.0);
    }

    #[test]
    fn domain_fallbacks() {
        assert_eq!(log(0.0), 0.0);
        assert_eq!(log(-1.0), 0.0);
        assert_eq!(sqrt(-4.0), 0.0);
        assert_eq!(sqrt(9.0), 3.0);
        assert_eq!(tan(PI / 2.0), 0.0);
        assert!((tan(PI / 4.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sign_and_extrema() {
        assert_eq!(sign(-3.0), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(2.0), 1.0);
        assert_eq!(sign(f64::NAN), 0.0);
        assert_eq!(min(1.0, 2.0), 1.0);
        assert_eq!(max(1.0, 2.0), 2.0);
    }
}
