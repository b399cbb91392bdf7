use crate::audio::constants::{CUTOFF_10HZ, CUTOFF_20HZ, CUTOFF_ONE_POLE_HZ, TAIL_LENGTH_SECONDS};
use crate::audio::error::SessionError;
use crate::audio::filter_engine::{FilterEngine, FilterMode, MeasurePoint};
use crate::audio::meter_communication::{create_session_channels, SessionMonitor, SessionProducer};
use crate::audio::metrics_engine::MetricsAggregator;
use nih_plug::nih_debug_assert;

/// Per-block orchestration of filtering, metering and the waveform preview
///
/// Owned by the audio thread. The UI only ever sees it through the
/// [`SessionMonitor`] handed out by [`AudioSessionController::monitor`].
pub struct AudioSessionController {
    producer: SessionProducer,
    engine: FilterEngine,
    metrics: MetricsAggregator,

    /// Channel 0 of the input, kept for the visualizer while bypassed
    bypass_snapshot: Vec<f32>,
    /// Filter decay in samples at the prepared sample rate
    tail_samples: u32,
}

impl Default for AudioSessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSessionController {
    /// Allocates the shared state and the waveform ring. Not real-time safe.
    pub fn new() -> Self {
        let initial_mode = FilterMode::default();
        let (producer, _monitor) = create_session_channels(initial_mode);

        let mut engine = FilterEngine::new();
        engine.set_mode(initial_mode);
        let metrics = MetricsAggregator::new(producer.pre_metrics(), producer.post_metrics());

        Self {
            producer,
            engine,
            metrics,
            bypass_snapshot: Vec::new(),
            tail_samples: 0,
        }
    }

    /// A UI handle onto this session's metrics, ring and toggles
    pub fn monitor(&self) -> SessionMonitor {
        self.producer.monitor()
    }

    pub fn engine(&self) -> &FilterEngine {
        &self.engine
    }

    /// How long the filters keep ringing after the input stops. Zero until prepared.
    pub fn tail_samples(&self) -> u32 {
        self.tail_samples
    }

    /// Size everything for a new stream and reset it to neutral. Must run before
    /// the first [`AudioSessionController::process`] and again whenever the
    /// sample rate or block size changes. Allocates.
    pub fn prepare(
        &mut self,
        sample_rate: f64,
        max_block_size: usize,
        num_channels: usize,
    ) -> Result<(), SessionError> {
        validate(sample_rate, max_block_size, num_channels)?;

        // Pick up whatever the UI selected while we were not running
        self.engine.set_mode(self.producer.requested_mode());
        self.engine.prepare(sample_rate, max_block_size, num_channels);
        self.metrics.prepare(max_block_size);
        self.bypass_snapshot = vec![0.0; max_block_size];
        self.tail_samples = (TAIL_LENGTH_SECONDS * sample_rate).round() as u32;
        self.producer.visualizer().clear();
        self.producer.publish_active_mode(self.engine.mode());

        Ok(())
    }

    /// Return all DSP and metric state to neutral without allocating
    pub fn reset(&mut self) {
        self.engine.reset();
        self.metrics.reset();
        self.bypass_snapshot.fill(0.0);
        self.producer.visualizer().clear();
    }

    /// Run one block. Channel-major, `buffer[channel][sample]`.
    pub fn process(&mut self, buffer: &mut [&mut [f32]]) {
        nih_debug_assert!(self.engine.is_prepared(), "process() called before prepare()");

        // 1. What came in
        self.metrics.capture_pre(buffer, self.engine.analysis_filter_mut(MeasurePoint::Pre));

        // 2. Mode changes take effect on block boundaries only
        let mode = self.producer.requested_mode();
        if mode != self.engine.mode() {
            self.engine.set_mode(mode);
            self.producer.publish_active_mode(mode);
        }

        // 3. Bypass leaves the buffer alone, but keep a copy so both paths feed the
        //    visualizer from a buffer of their own
        let visualize = self.producer.visualizer_enabled();
        let mut snapshot_len = 0;
        if visualize && mode == FilterMode::Bypass {
            if let Some(input) = buffer.first() {
                nih_debug_assert!(input.len() <= self.bypass_snapshot.len());
                snapshot_len = input.len().min(self.bypass_snapshot.len());
                self.bypass_snapshot[..snapshot_len].copy_from_slice(&input[..snapshot_len]);
            }
        }

        // 4. Filter in place
        self.engine.process(buffer);

        // 5. What you hear. Runs in every mode so bypass still shows live values.
        self.metrics.capture_post(buffer, self.engine.analysis_filter_mut(MeasurePoint::Post));

        // 6. Waveform preview
        if visualize {
            let samples: &[f32] = if mode == FilterMode::Bypass {
                &self.bypass_snapshot[..snapshot_len]
            } else {
                buffer.first().map(|channel| &**channel).unwrap_or(&[])
            };
            self.producer.visualizer().push_slice(samples);
        }
    }
}

fn validate(
    sample_rate: f64,
    max_block_size: usize,
    num_channels: usize,
) -> Result<(), SessionError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(SessionError::InvalidSampleRate(sample_rate));
    }

    let highest_cutoff = CUTOFF_ONE_POLE_HZ.max(CUTOFF_10HZ).max(CUTOFF_20HZ);
    if highest_cutoff >= sample_rate * 0.5 {
        return Err(SessionError::CutoffAboveNyquist {
            cutoff_hz: highest_cutoff,
            sample_rate,
        });
    }

    if num_channels == 0 {
        return Err(SessionError::InvalidChannelCount(num_channels));
    }
    if max_block_size == 0 {
        return Err(SessionError::InvalidBlockSize(max_block_size));
    }

    Ok(())
}
