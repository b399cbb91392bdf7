use crate::audio::constants::VISUALIZER_CAPACITY;
use crate::audio::filter_engine::FilterMode;
use crate::audio::metrics_engine::{MetricsSnapshot, PublishedMetrics};
use crate::audio::sample_buffer_engine::VisualizerChannel;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Everything the audio thread and the UI thread both touch
///
/// Every logical scalar is its own atomic. Nothing here is ever updated as a
/// multi-field transaction.
struct SessionShared {
    /// UI -> audio: the mode the user selected
    requested_mode: AtomicU8,
    /// Audio -> UI: the mode the last processed block actually used
    active_mode: AtomicU8,
    /// UI -> audio: whether the waveform preview should be fed
    visualizer_enabled: AtomicBool,

    pre_metrics: Arc<PublishedMetrics>,
    post_metrics: Arc<PublishedMetrics>,
    visualizer: VisualizerChannel,
}

/// Audio-thread side of the session state
///
/// Reads the UI toggles once per block and owns the write side of the
/// metrics and the waveform ring.
pub struct SessionProducer {
    shared: Arc<SessionShared>,
}

impl SessionProducer {
    /// Plain load, never a read-modify-write
    pub fn requested_mode(&self) -> FilterMode {
        FilterMode::from_u8(self.shared.requested_mode.load(Ordering::Relaxed))
    }

    pub fn visualizer_enabled(&self) -> bool {
        self.shared.visualizer_enabled.load(Ordering::Relaxed)
    }

    pub fn publish_active_mode(&self, mode: FilterMode) {
        self.shared.active_mode.store(mode.as_u8(), Ordering::Relaxed);
    }

    pub fn pre_metrics(&self) -> Arc<PublishedMetrics> {
        self.shared.pre_metrics.clone()
    }

    pub fn post_metrics(&self) -> Arc<PublishedMetrics> {
        self.shared.post_metrics.clone()
    }

    pub fn visualizer(&self) -> &VisualizerChannel {
        &self.shared.visualizer
    }

    /// A UI handle onto the same state
    pub fn monitor(&self) -> SessionMonitor {
        SessionMonitor {
            shared: self.shared.clone(),
        }
    }
}

/// UI-thread side of the session state
///
/// Cheap to clone. None of these calls block, and the setters are single atomic stores,
/// so they are safe to call from any thread.
#[derive(Clone)]
pub struct SessionMonitor {
    shared: Arc<SessionShared>,
}

impl SessionMonitor {
    pub fn set_filter_mode(&self, mode: FilterMode) {
        self.shared.requested_mode.store(mode.as_u8(), Ordering::Relaxed);
    }

    pub fn set_visualizer_enabled(&self, enabled: bool) {
        self.shared.visualizer_enabled.store(enabled, Ordering::Relaxed);
    }

    /// The mode the audio thread last applied. Lags a requested change by up to one block.
    pub fn active_filter_mode(&self) -> FilterMode {
        FilterMode::from_u8(self.shared.active_mode.load(Ordering::Relaxed))
    }

    pub fn visualizer_enabled(&self) -> bool {
        self.shared.visualizer_enabled.load(Ordering::Relaxed)
    }

    pub fn pre_metrics(&self) -> MetricsSnapshot {
        self.shared.pre_metrics.snapshot()
    }

    pub fn post_metrics(&self) -> MetricsSnapshot {
        self.shared.post_metrics.snapshot()
    }

    pub fn visualizer_sample(&self, logical_index: usize) -> f32 {
        self.shared.visualizer.read_at(logical_index)
    }

    pub fn visualizer_cursor(&self) -> usize {
        self.shared.visualizer.cursor()
    }

    pub fn visualizer_capacity(&self) -> usize {
        self.shared.visualizer.capacity()
    }

    /// See [`VisualizerChannel::read_window`]
    pub fn read_visualizer_window(&self, dest: &mut [f32]) -> usize {
        self.shared.visualizer.read_window(dest)
    }
}

/// Factory function to create the session communication pair
/// Returns (producer for the audio thread, monitor for the UI thread)
///
/// Allocates the waveform ring, so call this once when the plugin is created.
pub fn create_session_channels(initial_mode: FilterMode) -> (SessionProducer, SessionMonitor) {
    let shared = Arc::new(SessionShared {
        requested_mode: AtomicU8::new(initial_mode.as_u8()),
        active_mode: AtomicU8::new(initial_mode.as_u8()),
        visualizer_enabled: AtomicBool::new(false),
        pre_metrics: Arc::new(PublishedMetrics::default()),
        post_metrics: Arc::new(PublishedMetrics::default()),
        visualizer: VisualizerChannel::new(VISUALIZER_CAPACITY),
    });

    let producer = SessionProducer {
        shared: shared.clone(),
    };
    let monitor = SessionMonitor { shared };

    (producer, monitor)
}

/// Utility functions for the metric readouts and the waveform preview
pub mod display_utils {
    use crate::audio::constants::{DC_DISPLAY_DECIMALS, LEVEL_DISPLAY_DECIMALS};
    use crate::audio::metrics_engine::MetricsSnapshot;

    fn percent(label: &str, value: f32, decimals: usize) -> String {
        format!("{label}: {:.*}%", decimals, value * 100.0)
    }

    pub fn format_dc_offset(value: f32) -> String {
        percent("DC", value, DC_DISPLAY_DECIMALS)
    }

    pub fn format_rms(value: f32) -> String {
        percent("RMS", value, LEVEL_DISPLAY_DECIMALS)
    }

    pub fn format_peak(value: f32) -> String {
        percent("Peak", value, LEVEL_DISPLAY_DECIMALS)
    }

    pub fn format_low_frequency(value: f32) -> String {
        percent("LF", value, LEVEL_DISPLAY_DECIMALS)
    }

    /// DC, RMS, Peak and LF readouts in display order
    pub fn metric_lines(metrics: &MetricsSnapshot) -> [String; 4] {
        [
            format_dc_offset(metrics.dc_offset),
            format_rms(metrics.rms),
            format_peak(metrics.peak),
            format_low_frequency(metrics.low_frequency_energy),
        ]
    }

    /// Map a sample in [-1, 1] to a pixel row, +1 at the top
    /// Out-of-range samples are clamped to the edges
    pub fn sample_to_y(sample: f32, height: f32) -> f32 {
        let normalized = (sample.clamp(-1.0, 1.0) + 1.0) * 0.5;
        height * (1.0 - normalized)
    }

    /// Spread `num_samples` points evenly from the left edge to the right edge
    pub fn sample_to_x(index: usize, num_samples: usize, width: f32) -> f32 {
        if num_samples < 2 {
            return 0.0;
        }
        width * index as f32 / (num_samples - 1) as f32
    }

    /// Sample levels that get a horizontal grid line, top to bottom
    pub const REFERENCE_LEVELS: [f32; 5] = [1.0, 0.5, 0.0, -0.5, -1.0];

    /// Vertical time divisions across the waveform preview
    pub const TIME_DIVISIONS: usize = 8;
}

#[cfg(test)]
mod tests {
    use super::display_utils::*;
    use super::*;

    #[test]
    fn test_toggles_round_trip() {
        let (producer, monitor) = create_session_channels(FilterMode::TwoPoleHighPass20Hz);
        assert_eq!(producer.requested_mode(), FilterMode::TwoPoleHighPass20Hz);
        assert!(!producer.visualizer_enabled());

        monitor.set_filter_mode(FilterMode::OnePoleDcBlocker);
        monitor.set_visualizer_enabled(true);
        assert_eq!(producer.requested_mode(), FilterMode::OnePoleDcBlocker);
        assert!(producer.visualizer_enabled());

        // The active mode only moves when the audio side says so
        assert_eq!(monitor.active_filter_mode(), FilterMode::TwoPoleHighPass20Hz);
        producer.publish_active_mode(FilterMode::OnePoleDcBlocker);
        assert_eq!(monitor.active_filter_mode(), FilterMode::OnePoleDcBlocker);
    }

    #[test]
    fn test_monitor_reads_the_producer_ring() {
        let (producer, monitor) = create_session_channels(FilterMode::Bypass);
        producer.visualizer().push_slice(&[0.25, -0.5]);

        assert_eq!(monitor.visualizer_capacity(), VISUALIZER_CAPACITY);
        assert_eq!(monitor.visualizer_cursor(), 2);
        assert_eq!(monitor.visualizer_sample(1), -0.5);
    }

    #[test]
    fn test_metric_text_format() {
        let lines = metric_lines(&MetricsSnapshot {
            dc_offset: 0.001234,
            rms: 0.5,
            peak: 1.0,
            low_frequency_energy: 0.0,
        });
        assert_eq!(lines, ["DC: 0.123%", "RMS: 50.00%", "Peak: 100.00%", "LF: 0.00%"]);
    }

    #[test]
    fn test_sample_to_y() {
        assert_eq!(sample_to_y(1.0, 200.0), 0.0);
        assert_eq!(sample_to_y(0.0, 200.0), 100.0);
        assert_eq!(sample_to_y(-1.0, 200.0), 200.0);
        assert_eq!(sample_to_y(3.0, 200.0), 0.0);
    }

    #[test]
    fn test_sample_to_x() {
        assert_eq!(sample_to_x(0, 1024, 400.0), 0.0);
        assert_eq!(sample_to_x(1023, 1024, 400.0), 400.0);
        assert_eq!(sample_to_x(2, 5, 400.0), 200.0);
        assert_eq!(sample_to_x(0, 1, 400.0), 0.0);
    }

    #[test]
    fn test_reference_levels_land_on_quarter_rows() {
        let rows: Vec<f32> = REFERENCE_LEVELS
            .iter()
            .map(|&level| sample_to_y(level, 200.0))
            .collect();
        assert_eq!(rows, [0.0, 50.0, 100.0, 150.0, 200.0]);
    }
}
