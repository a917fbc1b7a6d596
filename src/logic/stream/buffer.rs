//! Channel Buffers - per-channel sample storage for a live session
//!
//! Indices are absolute (sample count since session start); samples
//! before the current window start are discarded as the cursor advances.

use serde::{Deserialize, Serialize};

use crate::logic::sample::{Sample, CHANNEL_COUNT};
use crate::logic::segment::WindowBounds;

/// Six equal-length channel buffers
#[derive(Debug, Clone, Default)]
pub struct ChannelBuffers {
    channels: [Vec<f64>; CHANNEL_COUNT],
    /// Absolute index of the first retained sample
    base: usize,
}

impl ChannelBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample to every channel
    pub fn push(&mut self, sample: &Sample) {
        for (buffer, value) in self.channels.iter_mut().zip(sample.channels.iter()) {
            buffer.push(*value);
        }
    }

    /// Total samples accepted (absolute length)
    pub fn len(&self) -> usize {
        self.base + self.retained()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples currently held in memory
    pub fn retained(&self) -> usize {
        self.channels[0].len()
    }

    /// Rebuild the samples of an absolute window
    pub fn window(&self, bounds: WindowBounds) -> Option<Vec<Sample>> {
        if bounds.start < self.base || bounds.end > self.len() {
            return None;
        }
        let (from, to) = (bounds.start - self.base, bounds.end - self.base);
        let samples = (from..to)
            .map(|i| {
                let mut values = [0.0; CHANNEL_COUNT];
                for (slot, buffer) in values.iter_mut().zip(self.channels.iter()) {
                    *slot = buffer[i];
                }
                Sample::new(values)
            })
            .collect();
        Some(samples)
    }

    /// Drop samples before absolute index `start`
    pub fn discard_before(&mut self, start: usize) {
        if start <= self.base {
            return;
        }
        let count = (start - self.base).min(self.retained());
        for buffer in self.channels.iter_mut() {
            buffer.drain(..count);
        }
        self.base += count;
    }

    pub fn status(&self, window_size: usize) -> BufferStatus {
        let current_size = self.len().min(window_size);
        BufferStatus {
            current_size,
            required_size: window_size,
            is_ready: self.len() >= window_size,
            fill_percent: if window_size > 0 {
                (current_size as f32 / window_size as f32 * 100.0).min(100.0)
            } else {
                0.0
            },
        }
    }
}

/// Warm-up status information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferStatus {
    pub current_size: usize,
    pub required_size: usize,
    pub is_ready: bool,
    pub fill_percent: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_operations() {
        let mut buffers = ChannelBuffers::new();
        assert!(buffers.is_empty());
        assert!(!buffers.status(4).is_ready);

        for i in 0..6 {
            buffers.push(&Sample::new([i as f64; CHANNEL_COUNT]));
        }
        assert_eq!(buffers.len(), 6);
        assert!(buffers.status(4).is_ready);
        assert_eq!(buffers.status(4).fill_percent, 100.0);

        let window = buffers.window(WindowBounds { start: 2, end: 5 }).unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].channels, [2.0; CHANNEL_COUNT]);
    }

    #[test]
    fn test_discard_keeps_absolute_indices() {
        let mut buffers = ChannelBuffers::new();
        for i in 0..10 {
            buffers.push(&Sample::new([i as f64; CHANNEL_COUNT]));
        }
        buffers.discard_before(4);
        assert_eq!(buffers.len(), 10);
        assert_eq!(buffers.retained(), 6);
        assert!(buffers.window(WindowBounds { start: 2, end: 5 }).is_none());

        let window = buffers.window(WindowBounds { start: 4, end: 7 }).unwrap();
        assert_eq!(window[0].channels[3], 4.0);
        assert!(buffers.window(WindowBounds { start: 8, end: 11 }).is_none());
    }

    #[test]
    fn test_warm_up_fill_percent() {
        let mut buffers = ChannelBuffers::new();
        buffers.push(&Sample::new([0.0; CHANNEL_COUNT]));
        let status = buffers.status(4);
        assert_eq!(status.current_size, 1);
        assert_eq!(status.fill_percent, 25.0);
    }
}
