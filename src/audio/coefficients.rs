//! Filter coefficient design
//!
//! Pure functions, no state. The biquad designs follow Robert Bristow-Johnson's
//! Audio EQ Cookbook at Butterworth Q. Coefficients are computed in f64 and
//! normalized so that a0 = 1.

use crate::audio::constants::{BUTTERWORTH_Q, MAX_CUTOFF_NYQUIST_RATIO, MIN_CUTOFF_HZ};
use nih_plug::{nih_debug_assert, nih_debug_assert_failure};
use std::f64::consts::PI;

/// Normalized second-order section coefficients
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoefficients {
    /// Passes the input through untouched
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    fn is_finite(&self) -> bool {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
            .iter()
            .all(|c| c.is_finite())
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Second-order high-pass at `cutoff_hz`
pub fn make_high_pass(sample_rate: f64, cutoff_hz: f64) -> BiquadCoefficients {
    design(sample_rate, cutoff_hz, |cos_omega| {
        let b0 = (1.0 + cos_omega) / 2.0;
        (b0, -(1.0 + cos_omega), b0)
    })
}

/// Second-order low-pass at `cutoff_hz`. Only used to measure what the high-pass removes.
pub fn make_low_pass(sample_rate: f64, cutoff_hz: f64) -> BiquadCoefficients {
    design(sample_rate, cutoff_hz, |cos_omega| {
        let b0 = (1.0 - cos_omega) / 2.0;
        (b0, 1.0 - cos_omega, b0)
    })
}

/// Exact pole location for a one-pole DC blocker: R = exp(-2π·fc/fs)
pub fn make_one_pole_coefficient(sample_rate: f64, cutoff_hz: f64) -> f32 {
    if !valid_sample_rate(sample_rate) {
        nih_debug_assert_failure!("Invalid sample rate {} for one-pole design", sample_rate);
        // R = 0 turns the blocker into a first difference, which still has no DC gain
        return 0.0;
    }

    let cutoff_hz = clamp_cutoff(sample_rate, cutoff_hz);
    libm::exp(-2.0 * PI * cutoff_hz / sample_rate) as f32
}

/// Shared cookbook skeleton. `numerator` maps cos(ω) to (b0, b1, b2) before normalization.
fn design(
    sample_rate: f64,
    cutoff_hz: f64,
    numerator: impl Fn(f64) -> (f64, f64, f64),
) -> BiquadCoefficients {
    if !valid_sample_rate(sample_rate) {
        nih_debug_assert_failure!("Invalid sample rate {} for biquad design", sample_rate);
        return BiquadCoefficients::IDENTITY;
    }

    let cutoff_hz = clamp_cutoff(sample_rate, cutoff_hz);
    let omega = 2.0 * PI * cutoff_hz / sample_rate;
    let cos_omega = libm::cos(omega);
    let alpha = libm::sin(omega) / (2.0 * BUTTERWORTH_Q);

    let (b0, b1, b2) = numerator(cos_omega);
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    let coefficients = BiquadCoefficients {
        b0: b0 / a0,
        b1: b1 / a0,
        b2: b2 / a0,
        a1: a1 / a0,
        a2: a2 / a0,
    };

    if coefficients.is_finite() {
        coefficients
    } else {
        nih_debug_assert_failure!("Non-finite biquad coefficients for {} Hz", cutoff_hz);
        BiquadCoefficients::IDENTITY
    }
}

fn valid_sample_rate(sample_rate: f64) -> bool {
    sample_rate.is_finite() && sample_rate > 0.0
}

/// Keeps the cutoff strictly inside (0, Nyquist)
fn clamp_cutoff(sample_rate: f64, cutoff_hz: f64) -> f64 {
    let max_cutoff = sample_rate * 0.5 * MAX_CUTOFF_NYQUIST_RATIO;
    nih_debug_assert!(
        cutoff_hz > 0.0 && cutoff_hz < sample_rate * 0.5,
        "Cutoff {} Hz is outside (0, {}) Hz",
        cutoff_hz,
        sample_rate * 0.5
    );

    if cutoff_hz.is_nan() {
        return MIN_CUTOFF_HZ;
    }
    cutoff_hz.clamp(MIN_CUTOFF_HZ.min(max_cutoff), max_cutoff)
}
