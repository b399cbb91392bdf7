use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lock-free waveform ring for the visualizer
///
/// Single producer (audio thread), single consumer (UI thread). The producer
/// never waits: old samples are simply overwritten. The only coordination is
/// the monotonically increasing write cursor, the last `min(cursor, capacity)`
/// logical indices are valid.
pub struct VisualizerChannel {
    // One atomic per slot so a concurrent read sees either the old or the new
    // sample, never a torn float
    samples: Box<[AtomicF32]>,
    mask: usize,
    cursor: AtomicUsize,
}

impl VisualizerChannel {
    /// `capacity` is rounded up to a power of two. Allocates, so create this
    /// once per session.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let samples = (0..capacity).map(|_| AtomicF32::new(0.0)).collect();

        Self {
            samples,
            mask: capacity - 1,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    // === Producer side (audio thread) ===

    /// Append one sample
    #[inline]
    pub fn push(&self, sample: f32) {
        let cursor = self.cursor.load(Ordering::Relaxed);
        self.samples[cursor & self.mask].store(sample, Ordering::Relaxed);
        // Release so a reader that sees the new cursor also sees the sample
        self.cursor.fetch_add(1, Ordering::Release);
    }

    /// Append a block of samples and publish them with a single cursor update
    pub fn push_slice(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }

        let cursor = self.cursor.load(Ordering::Relaxed);
        for (offset, &sample) in samples.iter().enumerate() {
            self.samples[cursor.wrapping_add(offset) & self.mask].store(sample, Ordering::Relaxed);
        }
        self.cursor.fetch_add(samples.len(), Ordering::Release);
    }

    /// Zero every slot and rewind the cursor. Only for session (re)initialization.
    pub fn clear(&self) {
        for slot in self.samples.iter() {
            slot.store(0.0, Ordering::Relaxed);
        }
        self.cursor.store(0, Ordering::Release);
    }

    // === Consumer side (UI thread) ===

    /// Total number of samples ever pushed
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// The sample at a logical index. Callers derive their window
    /// `[cursor - capacity, cursor)` from a single [`VisualizerChannel::cursor`]
    /// snapshot. Indices older than that window have been overwritten.
    #[inline]
    pub fn read_at(&self, logical_index: usize) -> f32 {
        self.samples[logical_index & self.mask].load(Ordering::Relaxed)
    }

    /// Copy the most recent samples into `dest`, oldest first
    ///
    /// Takes one cursor snapshot for the whole pass and returns how many samples
    /// were written, which is `min(cursor, capacity, dest.len())`.
    pub fn read_window(&self, dest: &mut [f32]) -> usize {
        let cursor = self.cursor();
        let count = cursor.min(self.capacity()).min(dest.len());
        let start = cursor - count;

        for (offset, slot) in dest[..count].iter_mut().enumerate() {
            *slot = self.read_at(start + offset);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_capacity_rounds_up_to_power_of_two() {
        assert_eq!(VisualizerChannel::new(1000).capacity(), 1024);
        assert_eq!(VisualizerChannel::new(1024).capacity(), 1024);
        assert_eq!(VisualizerChannel::new(0).capacity(), 1);
    }

    #[test]
    fn test_wraparound_keeps_last_capacity_samples() {
        let channel = VisualizerChannel::new(16);
        let k = 5;
        for i in 0..(16 + k) {
            channel.push(i as f32);
        }

        let cursor = channel.cursor();
        assert_eq!(cursor, 16 + k);

        let window: Vec<f32> = (cursor - channel.capacity()..cursor)
            .map(|i| channel.read_at(i))
            .collect();
        let expected: Vec<f32> = (k..16 + k).map(|i| i as f32).collect();
        assert_eq!(window, expected);
    }

    #[test]
    fn test_push_slice_matches_push() {
        let single = VisualizerChannel::new(8);
        let sliced = VisualizerChannel::new(8);
        let samples: Vec<f32> = (0..21).map(|i| i as f32 * 0.5).collect();

        samples.iter().for_each(|&s| single.push(s));
        sliced.push_slice(&samples[..7]);
        sliced.push_slice(&samples[7..]);

        assert_eq!(single.cursor(), sliced.cursor());
        for i in single.cursor() - 8..single.cursor() {
            assert_eq!(single.read_at(i), sliced.read_at(i));
        }
    }

    #[test]
    fn test_read_window_before_ring_is_full() {
        let channel = VisualizerChannel::new(8);
        channel.push_slice(&[1.0, 2.0, 3.0]);

        let mut dest = [0.0f32; 8];
        assert_eq!(channel.read_window(&mut dest), 3);
        assert_eq!(&dest[..3], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_read_window_after_wrap() {
        let channel = VisualizerChannel::new(4);
        channel.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let mut dest = [0.0f32; 4];
        assert_eq!(channel.read_window(&mut dest), 4);
        assert_eq!(dest, [3.0, 4.0, 5.0, 6.0]);

        let mut short = [0.0f32; 2];
        assert_eq!(channel.read_window(&mut short), 2);
        assert_eq!(short, [5.0, 6.0]);
    }

    #[test]
    fn test_clear_rewinds() {
        let channel = VisualizerChannel::new(4);
        channel.push_slice(&[1.0, 2.0]);
        channel.clear();

        assert_eq!(channel.cursor(), 0);
        assert_eq!(channel.read_at(0), 0.0);
        assert_eq!(channel.read_window(&mut [0.0; 4]), 0);
    }

    #[test]
    fn test_concurrent_reader_sees_ordered_window() {
        // Reads racing the producer may tear across a lap but never return garbage.
        // Once the producer is done the window must be the exact tail of the ramp.
        let channel = Arc::new(VisualizerChannel::new(1024));
        let producer = {
            let channel = channel.clone();
            thread::spawn(move || {
                for block in 0..2000 {
                    let start = block * 64;
                    let samples: Vec<f32> = (start..start + 64).map(|i| i as f32).collect();
                    channel.push_slice(&samples);
                }
            })
        };

        let mut dest = vec![0.0f32; 256];
        for _ in 0..500 {
            let count = channel.read_window(&mut dest);
            for sample in &dest[..count] {
                assert!(sample.is_finite());
                assert!(*sample >= 0.0);
            }
        }

        producer.join().unwrap();
        assert_eq!(channel.cursor(), 2000 * 64);

        let count = channel.read_window(&mut dest);
        let last = (2000 * 64 - 1) as f32;
        assert_eq!(count, 256);
        assert_eq!(dest[255], last);
        assert!(dest.windows(2).all(|w| w[1] == w[0] + 1.0));
    }
}
