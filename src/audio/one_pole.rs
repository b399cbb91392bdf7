/// First-order DC blocker
///
/// Implements: y[n] = x[n] - x[n-1] + R * y[n-1]
///
/// The history (x_prev, y_prev) lives for the whole session. Changing R never
/// touches it, so switching modes does not restart DC tracking.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnePole {
    coefficient: f32,
    x_prev: f32,
    y_prev: f32,
}

impl OnePole {
    pub fn new(coefficient: f32) -> Self {
        Self {
            coefficient,
            x_prev: 0.0,
            y_prev: 0.0,
        }
    }

    pub fn set_coefficient(&mut self, coefficient: f32) {
        self.coefficient = coefficient;
    }

    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }

    #[inline]
    pub fn process_sample(&mut self, x: f32) -> f32 {
        let y = x - self.x_prev + self.coefficient * self.y_prev;
        self.x_prev = x;
        self.y_prev = y;
        y
    }

    pub fn process_block_inplace(&mut self, samples: &mut [f32]) {
        // Work on locals so the loop body stays branch-free
        let r = self.coefficient;
        let mut x_prev = self.x_prev;
        let mut y_prev = self.y_prev;

        for sample in samples.iter_mut() {
            let x = *sample;
            let y = x - x_prev + r * y_prev;
            *sample = y;
            x_prev = x;
            y_prev = y;
        }

        self.x_prev = x_prev;
        self.y_prev = y_prev;
    }

    /// Only for session (re)initialization
    pub fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }

    /// (x_prev, y_prev)
    pub fn history(&self) -> (f32, f32) {
        (self.x_prev, self.y_prev)
    }
}
