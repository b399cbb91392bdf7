use crate::audio::coefficients::BiquadCoefficients;

/// One second-order IIR section with its own history
///
/// Direct Form II Transposed. Coefficients and taps are f64 because the 10 Hz
/// design puts the poles very close to the unit circle; samples stay f32.
#[derive(Debug, Clone, Copy, Default)]
pub struct Biquad {
    coefficients: BiquadCoefficients,
    z1: f64,
    z2: f64,
}

impl Biquad {
    pub fn new(coefficients: BiquadCoefficients) -> Self {
        Self {
            coefficients,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Swap in new coefficients. The taps are left alone, call [`Biquad::reset`] if the
    /// old history must not carry over.
    pub fn set_coefficients(&mut self, coefficients: BiquadCoefficients) {
        self.coefficients = coefficients;
    }

    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coefficients
    }

    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        let c = &self.coefficients;
        let x = input as f64;
        let y = c.b0 * x + self.z1;
        self.z1 = c.b1 * x - c.a1 * y + self.z2;
        self.z2 = c.b2 * x - c.a2 * y;
        y as f32
    }

    pub fn process_block_inplace(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// The two delay taps (z1, z2)
    pub fn taps(&self) -> (f64, f64) {
        (self.z1, self.z2)
    }
}
