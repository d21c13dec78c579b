//! Normal distribution helpers shared by the rating update and the scorer.
//!
//! All functions are closed-form polynomial approximations: deterministic,
//! no iteration, accurate to roughly 1e-7.

use std::f64::consts::{PI, SQRT_2};

/// Inputs to [`inverse_normal_cdf`] are clamped to `[EPSILON, 1 - EPSILON]`.
pub const PROBABILITY_EPSILON: f64 = 1e-9;

// Abramowitz & Stegun 7.1.26
const ERF_A1: f64 = 0.254829592;
const ERF_A2: f64 = -0.284496736;
const ERF_A3: f64 = 1.421413741;
const ERF_A4: f64 = -1.453152027;
const ERF_A5: f64 = 1.061405429;
const ERF_P: f64 = 0.3275911;

// Rational approximation coefficients for the inverse CDF.
const INV_A: [f64; 6] = [
    -3.969683028665376e+01,
    2.209460984245205e+02,
    -2.759285104469687e+02,
    1.383577518672690e+02,
    -3.066479806614716e+01,
    2.506628277459239e+00,
];
const INV_B: [f64; 5] = [
    -5.447609879822406e+01,
    1.615858368580409e+02,
    -1.556989798598866e+02,
    6.680131188771972e+01,
    -1.328068155288572e+01,
];
const INV_C: [f64; 6] = [
    -7.784894002430293e-03,
    -3.223964580411365e-01,
    -2.400758277161838e+00,
    -2.549732539343734e+00,
    4.374664141464968e+00,
    2.938163982698783e+00,
];
const INV_D: [f64; 4] = [
    7.784695709041462e-03,
    3.224671290700398e-01,
    2.445134137142996e+00,
    3.754408661907416e+00,
];
const P_LOW: f64 = 0.02425;
const P_HIGH: f64 = 1.0 - P_LOW;

pub fn error_function(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + ERF_P * x);
    let poly = ((((ERF_A5 * t + ERF_A4) * t + ERF_A3) * t + ERF_A2) * t + ERF_A1) * t;
    let y = 1.0 - poly * (-x * x).exp();

    sign * y
}

pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + error_function(x / SQRT_2))
}

pub fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        return 0.5;
    }
    p.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON)
}

/// Quantile of the standard normal. `p` is clamped into the open unit
/// interval first so the result is always finite.
pub fn inverse_normal_cdf(p: f64) -> f64 {
    let p = clamp_probability(p);

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        lower_tail(q)
    } else if p <= P_HIGH {
        central_region(p)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -lower_tail(q)
    }
}

fn lower_tail(q: f64) -> f64 {
    let c = INV_C;
    let d = INV_D;
    (((((c[0] * q + c[1]) * q + c[2]) * q + c[3]) * q + c[4]) * q + c[5])
        / ((((d[0] * q + d[1]) * q + d[2]) * q + d[3]) * q + 1.0)
}

fn central_region(p: f64) -> f64 {
    let a = INV_A;
    let b = INV_B;
    let q = p - 0.5;
    let r = q * q;
    (((((a[0] * r + a[1]) * r + a[2]) * r + a[3]) * r + a[4]) * r + a[5]) * q
        / (((((b[0] * r + b[1]) * r + b[2]) * r + b[3]) * r + b[4]) * r + 1.0)
}
