use crate::audio::biquad::Biquad;
use crate::audio::constants::RMS_WINDOW_SAMPLES;
use atomic_float::AtomicF32;
use nih_plug::nih_debug_assert_failure;
use std::sync::{atomic::Ordering, Arc};

/// One consistent-looking read of a [`PublishedMetrics`]
///
/// The fields are loaded one by one, so they may come from different blocks.
/// That is fine for a diagnostic display.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Mean of the last block
    pub dc_offset: f32,
    /// Windowed root-mean-square
    pub rms: f32,
    /// Largest absolute sample of the last block
    pub peak: f32,
    /// Windowed RMS of the analysis low-pass output
    pub low_frequency_energy: f32,
}

/// Metric values shared with the UI thread, one atomic per field
///
/// The audio thread is the only writer.
pub struct PublishedMetrics {
    dc_offset: AtomicF32,
    rms: AtomicF32,
    peak: AtomicF32,
    low_frequency_energy: AtomicF32,
}

impl Default for PublishedMetrics {
    fn default() -> Self {
        Self {
            dc_offset: AtomicF32::new(0.0),
            rms: AtomicF32::new(0.0),
            peak: AtomicF32::new(0.0),
            low_frequency_energy: AtomicF32::new(0.0),
        }
    }
}

impl PublishedMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dc_offset: self.dc_offset.load(Ordering::Relaxed),
            rms: self.rms.load(Ordering::Relaxed),
            peak: self.peak.load(Ordering::Relaxed),
            low_frequency_energy: self.low_frequency_energy.load(Ordering::Relaxed),
        }
    }

    fn store_block(&self, dc_offset: f32, peak: f32) {
        self.dc_offset.store(dc_offset, Ordering::Relaxed);
        self.peak.store(peak, Ordering::Relaxed);
    }

    fn store_window(&self, rms: f32, low_frequency_energy: f32) {
        self.rms.store(rms, Ordering::Relaxed);
        self.low_frequency_energy
            .store(low_frequency_energy, Ordering::Relaxed);
    }

    fn clear(&self) {
        self.store_block(0.0, 0.0);
        self.store_window(0.0, 0.0);
    }
}

/// Accumulators for one measurement point (pre or post filter)
struct MeterTap {
    published: Arc<PublishedMetrics>,

    sum_of_squares: f64,
    low_frequency_sum_of_squares: f64,
    sample_count: usize,
}

impl MeterTap {
    fn new(published: Arc<PublishedMetrics>) -> Self {
        Self {
            published,
            sum_of_squares: 0.0,
            low_frequency_sum_of_squares: 0.0,
            sample_count: 0,
        }
    }

    fn reset(&mut self) {
        self.sum_of_squares = 0.0;
        self.low_frequency_sum_of_squares = 0.0;
        self.sample_count = 0;
        self.published.clear();
    }

    /// Scan channel 0 once. `scratch` receives a copy for the analysis filter so the
    /// measured buffer is never touched.
    fn capture(
        &mut self,
        buffer: &[&mut [f32]],
        analysis: &mut Biquad,
        scratch: &mut [f32],
        window_size: usize,
    ) {
        let Some(samples) = buffer.first() else {
            return;
        };
        if samples.is_empty() {
            return;
        }

        let mut sum = 0.0f64;
        let mut peak = 0.0f32;
        let mut sum_of_squares = 0.0f64;
        for &sample in samples.iter() {
            let x = sample as f64;
            sum += x;
            sum_of_squares += x * x;
            peak = peak.max(sample.abs());
        }

        let num_samples = samples.len();
        self.published.store_block((sum / num_samples as f64) as f32, peak);

        let mut low_frequency_sum_of_squares = 0.0f64;
        if scratch.is_empty() {
            nih_debug_assert_failure!("Metrics captured before prepare()");
        } else {
            let chunk_size = scratch.len();
            for chunk in samples.chunks(chunk_size) {
                let copy = &mut scratch[..chunk.len()];
                copy.copy_from_slice(chunk);
                analysis.process_block_inplace(copy);
                low_frequency_sum_of_squares += copy
                    .iter()
                    .map(|&s| (s as f64) * (s as f64))
                    .sum::<f64>();
            }
        }

        self.sum_of_squares += sum_of_squares;
        self.low_frequency_sum_of_squares += low_frequency_sum_of_squares;
        self.sample_count += num_samples;

        if self.sample_count >= window_size {
            // sample_count > 0 here, the empty-block case returned above
            let count = self.sample_count as f64;
            self.published.store_window(
                libm::sqrt(self.sum_of_squares / count) as f32,
                libm::sqrt(self.low_frequency_sum_of_squares / count) as f32,
            );
            self.sum_of_squares = 0.0;
            self.low_frequency_sum_of_squares = 0.0;
            self.sample_count = 0;
        }
    }
}

/// Pre- and post-filter measurements
///
/// DC offset and peak are published every block. RMS and low-frequency energy
/// are accumulated across blocks and published whenever a window of
/// [`RMS_WINDOW_SAMPLES`] samples has been reached.
pub struct MetricsAggregator {
    pre: MeterTap,
    post: MeterTap,
    window_size: usize,

    /// Copy of the block for the analysis filter. Sized in `prepare`.
    scratch: Vec<f32>,
}

impl MetricsAggregator {
    pub fn new(pre: Arc<PublishedMetrics>, post: Arc<PublishedMetrics>) -> Self {
        Self {
            pre: MeterTap::new(pre),
            post: MeterTap::new(post),
            window_size: RMS_WINDOW_SAMPLES,
            scratch: Vec::new(),
        }
    }

    /// Allocates the analysis scratch buffer. Not real-time safe.
    pub fn prepare(&mut self, max_block_size: usize) {
        self.scratch = vec![0.0; max_block_size];
        self.reset();
    }

    pub fn reset(&mut self) {
        self.pre.reset();
        self.post.reset();
        self.scratch.fill(0.0);
    }

    pub fn capture_pre(&mut self, buffer: &[&mut [f32]], analysis: &mut Biquad) {
        self.pre.capture(buffer, analysis, &mut self.scratch, self.window_size);
    }

    pub fn capture_post(&mut self, buffer: &[&mut [f32]], analysis: &mut Biquad) {
        self.post.capture(buffer, analysis, &mut self.scratch, self.window_size);
    }
}
