use crate::audio::biquad::Biquad;
use crate::audio::coefficients::{make_high_pass, make_low_pass, make_one_pole_coefficient};
use crate::audio::constants::{
    CUTOFF_10HZ, CUTOFF_20HZ, CUTOFF_ONE_POLE_HZ, DEFAULT_ANALYSIS_CUTOFF_HZ, DEFAULT_SAMPLE_RATE,
};
use crate::audio::one_pole::OnePole;
use nih_plug::nih_debug_assert;
use nih_plug::prelude::Enum;

/// The selectable processing paths. Exactly one is active at a time.
#[derive(Enum, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    #[id = "bypass"]
    #[name = "Bypass"]
    Bypass,
    #[id = "dc-1pole"]
    #[name = "1st-order DC blocker (6dB/oct)"]
    OnePoleDcBlocker,
    #[id = "2pole-10hz"]
    #[name = "2nd-order 10Hz (12dB/oct)"]
    TwoPoleHighPass10Hz,
    #[id = "2pole-20hz"]
    #[name = "2nd-order 20Hz (12dB/oct)"]
    #[default]
    TwoPoleHighPass20Hz,
}

impl FilterMode {
    /// Stable numeric encoding used for the cross-thread atomics
    pub fn as_u8(self) -> u8 {
        match self {
            FilterMode::Bypass => 0,
            FilterMode::OnePoleDcBlocker => 1,
            FilterMode::TwoPoleHighPass10Hz => 2,
            FilterMode::TwoPoleHighPass20Hz => 3,
        }
    }

    /// Out-of-range values fall back to bypass
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FilterMode::OnePoleDcBlocker,
            2 => FilterMode::TwoPoleHighPass10Hz,
            3 => FilterMode::TwoPoleHighPass20Hz,
            _ => FilterMode::Bypass,
        }
    }

    /// Cutoff of the 2-pole high-pass, `None` for the other paths
    pub fn two_pole_cutoff_hz(self) -> Option<f64> {
        match self {
            FilterMode::TwoPoleHighPass10Hz => Some(CUTOFF_10HZ),
            FilterMode::TwoPoleHighPass20Hz => Some(CUTOFF_20HZ),
            FilterMode::Bypass | FilterMode::OnePoleDcBlocker => None,
        }
    }

    /// The cutoff whose removed energy the analysis low-pass should quantify
    pub fn analysis_cutoff_hz(self) -> f64 {
        match self {
            FilterMode::Bypass => DEFAULT_ANALYSIS_CUTOFF_HZ,
            FilterMode::OnePoleDcBlocker => CUTOFF_ONE_POLE_HZ,
            FilterMode::TwoPoleHighPass10Hz => CUTOFF_10HZ,
            FilterMode::TwoPoleHighPass20Hz => CUTOFF_20HZ,
        }
    }
}

/// Which side of the filter a measurement is taken on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurePoint {
    Pre,
    Post,
}

/// Mode state machine plus all per-channel filter state
///
/// Everything is sized in [`FilterEngine::prepare`]. After that nothing here
/// allocates, locks or logs.
pub struct FilterEngine {
    mode: FilterMode,
    sample_rate: f64,
    prepared: bool,

    /// 1st-order DC blockers, one per channel. Never reset outside of `prepare`/`reset`.
    one_pole: Vec<OnePole>,
    /// 2nd-order high-pass sections, one per channel
    two_pole: Vec<Biquad>,

    /// Low-pass copies used to measure what the active path removes. One per
    /// measurement point so the pre pass never leaks history into the post pass.
    analysis_pre: Biquad,
    analysis_post: Biquad,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterEngine {
    pub fn new() -> Self {
        Self {
            mode: FilterMode::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            prepared: false,
            one_pole: Vec::new(),
            two_pole: Vec::new(),
            analysis_pre: Biquad::default(),
            analysis_post: Biquad::default(),
        }
    }

    /// Size all per-channel state, compute coefficients for the current mode and
    /// zero every filter. Allocates, so never call this from the audio thread.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize, num_channels: usize) {
        nih_debug_assert!(max_block_size > 0);
        self.sample_rate = sample_rate;

        let r = make_one_pole_coefficient(sample_rate, CUTOFF_ONE_POLE_HZ);
        self.one_pole = vec![OnePole::new(r); num_channels];
        self.two_pole = vec![Biquad::default(); num_channels];

        self.update_two_pole_coefficients();
        self.update_analysis_coefficients();
        self.reset();
        self.prepared = true;
    }

    /// Zero all filter history. Only for session (re)initialization.
    pub fn reset(&mut self) {
        self.one_pole.iter_mut().for_each(OnePole::reset);
        self.two_pole.iter_mut().for_each(Biquad::reset);
        self.analysis_pre.reset();
        self.analysis_post.reset();
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn num_channels(&self) -> usize {
        self.one_pole.len()
    }

    /// Switch paths. Does nothing if `mode` is already active.
    pub fn set_mode(&mut self, mode: FilterMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;

        match mode {
            // Bypass performs no mutation, so there is nothing to reset
            FilterMode::Bypass => {}
            FilterMode::OnePoleDcBlocker => {
                // Recompute R but keep the history running
                let r = make_one_pole_coefficient(self.sample_rate, CUTOFF_ONE_POLE_HZ);
                for stage in self.one_pole.iter_mut() {
                    stage.set_coefficient(r);
                }
            }
            FilterMode::TwoPoleHighPass10Hz | FilterMode::TwoPoleHighPass20Hz => {
                // History from another topology or cutoff would produce a transient
                self.update_two_pole_coefficients();
                self.two_pole.iter_mut().for_each(Biquad::reset);
            }
        }

        self.update_analysis_coefficients();
    }

    /// Filter `buffer` in place according to the active mode
    pub fn process(&mut self, buffer: &mut [&mut [f32]]) {
        nih_debug_assert!(self.prepared, "FilterEngine::process() called before prepare()");

        match self.mode {
            FilterMode::Bypass => {}
            FilterMode::OnePoleDcBlocker => {
                for (stage, channel) in self.one_pole.iter_mut().zip(buffer.iter_mut()) {
                    stage.process_block_inplace(channel);
                }
            }
            FilterMode::TwoPoleHighPass10Hz | FilterMode::TwoPoleHighPass20Hz => {
                for (stage, channel) in self.two_pole.iter_mut().zip(buffer.iter_mut()) {
                    stage.process_block_inplace(channel);
                }
            }
        }
    }

    /// The analysis low-pass for one measurement point
    pub fn analysis_filter_mut(&mut self, point: MeasurePoint) -> &mut Biquad {
        match point {
            MeasurePoint::Pre => &mut self.analysis_pre,
            MeasurePoint::Post => &mut self.analysis_post,
        }
    }

    pub fn one_pole_stages(&self) -> &[OnePole] {
        &self.one_pole
    }

    pub fn two_pole_stages(&self) -> &[Biquad] {
        &self.two_pole
    }

    fn update_two_pole_coefficients(&mut self) {
        // Bypass and the 1-pole path keep the last 2-pole design around untouched
        let Some(cutoff) = self.mode.two_pole_cutoff_hz() else {
            return;
        };

        let coefficients = make_high_pass(self.sample_rate, cutoff);
        for stage in self.two_pole.iter_mut() {
            stage.set_coefficients(coefficients);
        }
    }

    /// Retune both analysis filters together and drop their history
    fn update_analysis_coefficients(&mut self) {
        let coefficients = make_low_pass(self.sample_rate, self.mode.analysis_cutoff_hz());
        for filter in [&mut self.analysis_pre, &mut self.analysis_post] {
            filter.set_coefficients(coefficients);
            filter.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::coefficients::BiquadCoefficients;

    const SAMPLE_RATE: f64 = 48000.0;
    const BLOCK: usize = 64;

    fn prepared(mode: FilterMode, channels: usize) -> FilterEngine {
        let mut engine = FilterEngine::new();
        engine.set_mode(mode);
        engine.prepare(SAMPLE_RATE, BLOCK, channels);
        engine
    }

    fn run(engine: &mut FilterEngine, channels: &mut [Vec<f32>]) {
        let mut slices: Vec<&mut [f32]> = channels.iter_mut().map(|c| c.as_mut_slice()).collect();
        engine.process(&mut slices);
    }

    fn noise(len: usize, seed: u32) -> Vec<f32> {
        // Small LCG so the tests stay deterministic
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn test_filter_mode_round_trips_through_u8() {
        for mode in [
            FilterMode::Bypass,
            FilterMode::OnePoleDcBlocker,
            FilterMode::TwoPoleHighPass10Hz,
            FilterMode::TwoPoleHighPass20Hz,
        ] {
            assert_eq!(FilterMode::from_u8(mode.as_u8()), mode);
        }
        assert_eq!(FilterMode::from_u8(200), FilterMode::Bypass);
    }

    #[test]
    fn test_default_mode_is_two_pole_20hz() {
        assert_eq!(FilterMode::default(), FilterMode::TwoPoleHighPass20Hz);
        assert_eq!(FilterEngine::new().mode(), FilterMode::TwoPoleHighPass20Hz);
    }

    #[test]
    fn test_bypass_is_bit_identical() {
        let mut engine = prepared(FilterMode::Bypass, 2);
        let input = vec![noise(BLOCK, 1), noise(BLOCK, 2)];
        let mut channels = input.clone();
        channels[0][3] = f32::MIN_POSITIVE;
        channels[1][5] = -0.0;
        let input_bits: Vec<Vec<u32>> = channels
            .iter()
            .map(|c| c.iter().map(|s| s.to_bits()).collect())
            .collect();

        run(&mut engine, &mut channels);

        let output_bits: Vec<Vec<u32>> = channels
            .iter()
            .map(|c| c.iter().map(|s| s.to_bits()).collect())
            .collect();
        assert_eq!(input_bits, output_bits);
    }

    #[test]
    fn test_one_pole_state_survives_mode_toggles() {
        let mut reference = prepared(FilterMode::OnePoleDcBlocker, 1);
        let mut toggled = prepared(FilterMode::OnePoleDcBlocker, 1);

        let mut expected = Vec::new();
        for _ in 0..3 {
            let mut block = vec![vec![1.0f32; BLOCK]];
            run(&mut reference, &mut block);
            expected.push(block.remove(0));
        }

        let mut actual = Vec::new();
        let mut block = vec![vec![1.0f32; BLOCK]];
        run(&mut toggled, &mut block);
        actual.push(block.remove(0));

        for mode in [
            FilterMode::Bypass,
            FilterMode::TwoPoleHighPass10Hz,
            FilterMode::TwoPoleHighPass20Hz,
            FilterMode::Bypass,
        ] {
            toggled.set_mode(mode);
            let mut block = vec![noise(BLOCK, 7)];
            run(&mut toggled, &mut block);
        }

        toggled.set_mode(FilterMode::OnePoleDcBlocker);
        for _ in 0..2 {
            let mut block = vec![vec![1.0f32; BLOCK]];
            run(&mut toggled, &mut block);
            actual.push(block.remove(0));
        }

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_dc_rejection_in_every_filtering_mode() {
        for mode in [
            FilterMode::OnePoleDcBlocker,
            FilterMode::TwoPoleHighPass10Hz,
            FilterMode::TwoPoleHighPass20Hz,
        ] {
            let mut engine = prepared(mode, 2);
            let mut channels = vec![vec![1.0f32; 48000], vec![1.0f32; 48000]];
            run(&mut engine, &mut channels);

            for channel in &channels {
                let tail = &channel[channel.len() - 1024..];
                let mean = tail.iter().map(|&s| s as f64).sum::<f64>() / tail.len() as f64;
                assert!(mean.abs() < 1e-3, "{mode:?} left a mean of {mean}");
            }
        }
    }

    #[test]
    fn test_switching_two_pole_cutoff_resets_taps() {
        let mut engine = prepared(FilterMode::TwoPoleHighPass10Hz, 1);
        let mut history = vec![noise(BLOCK, 3)];
        run(&mut engine, &mut history);
        assert_ne!(engine.two_pole_stages()[0].taps(), (0.0, 0.0));

        engine.set_mode(FilterMode::TwoPoleHighPass20Hz);
        assert_eq!(engine.two_pole_stages()[0].taps(), (0.0, 0.0));

        let mut impulse = vec![vec![0.0f32; BLOCK]];
        impulse[0][0] = 1.0;
        run(&mut engine, &mut impulse);

        let mut fresh = Biquad::new(make_high_pass(SAMPLE_RATE, CUTOFF_20HZ));
        let mut expected = vec![0.0f32; BLOCK];
        expected[0] = 1.0;
        fresh.process_block_inplace(&mut expected);

        assert_eq!(impulse[0][0], fresh.coefficients().b0 as f32);
        assert_eq!(impulse[0], expected);
    }

    #[test]
    fn test_set_mode_is_idempotent() {
        let mut engine = prepared(FilterMode::TwoPoleHighPass20Hz, 1);
        let mut block = vec![noise(BLOCK, 4)];
        run(&mut engine, &mut block);
        let taps = engine.two_pole_stages()[0].taps();

        engine.set_mode(FilterMode::TwoPoleHighPass20Hz);
        assert_eq!(engine.two_pole_stages()[0].taps(), taps);
    }

    #[test]
    fn test_analysis_filter_tracks_mode() {
        let mut engine = prepared(FilterMode::Bypass, 1);
        for mode in [
            FilterMode::OnePoleDcBlocker,
            FilterMode::TwoPoleHighPass10Hz,
            FilterMode::TwoPoleHighPass20Hz,
            FilterMode::Bypass,
        ] {
            engine.set_mode(mode);
            let expected = make_low_pass(SAMPLE_RATE, mode.analysis_cutoff_hz());
            for point in [MeasurePoint::Pre, MeasurePoint::Post] {
                let filter = engine.analysis_filter_mut(point);
                assert_eq!(*filter.coefficients(), expected);
                assert_eq!(filter.taps(), (0.0, 0.0));
            }
        }
    }

    #[test]
    fn test_entering_one_pole_does_not_touch_history() {
        let mut engine = prepared(FilterMode::OnePoleDcBlocker, 2);
        let mut channels = vec![noise(BLOCK, 5), noise(BLOCK, 6)];
        run(&mut engine, &mut channels);
        let history: Vec<_> = engine.one_pole_stages().iter().map(OnePole::history).collect();

        engine.set_mode(FilterMode::Bypass);
        engine.set_mode(FilterMode::OnePoleDcBlocker);

        let after: Vec<_> = engine.one_pole_stages().iter().map(OnePole::history).collect();
        assert_eq!(history, after);
    }

    #[test]
    fn test_process_before_prepare_is_harmless() {
        let mut engine = FilterEngine::new();
        let mut channels = vec![vec![0.5f32; 8]];
        run(&mut engine, &mut channels);
        assert_eq!(channels[0], vec![0.5f32; 8]);
        assert!(!engine.is_prepared());
        assert_eq!(
            *engine.analysis_filter_mut(MeasurePoint::Pre).coefficients(),
            BiquadCoefficients::IDENTITY
        );
    }

    #[test]
    fn test_extra_buffer_channels_are_left_alone() {
        let mut engine = prepared(FilterMode::TwoPoleHighPass20Hz, 1);
        let mut channels = vec![vec![1.0f32; BLOCK], vec![1.0f32; BLOCK]];
        run(&mut engine, &mut channels);
        assert_ne!(channels[0], vec![1.0f32; BLOCK]);
        assert_eq!(channels[1], vec![1.0f32; BLOCK]);
    }
}
