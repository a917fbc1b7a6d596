//! Segmenter - Window planning shared by training, batch and streaming
//!
//! One stride progression (`[0, w)`, `[s, s + w)`, ...) with two explicit
//! edge policies for the trailing remainder:
//! - `DropRemainder`: samples after the last full window are dropped (training)
//! - `AnchorToEnd`: one extra window `[n - w, n)` covers the remainder (re-scoring)
//!
//! Streaming uses the same [`SlidingCursor`] over a growing buffer.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

// ============================================================================
// TYPES
// ============================================================================

/// Trailing-remainder policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgePolicy {
    DropRemainder,
    AnchorToEnd,
}

/// Half-open window `[start, end)` over the owning sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub start: usize,
    pub end: usize,
}

impl WindowBounds {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

// ============================================================================
// SLIDING CURSOR
// ============================================================================

/// Cursor advancing both bounds by `stride`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingCursor {
    start: usize,
    end: usize,
    stride: usize,
}

impl SlidingCursor {
    fn new(window_size: usize, stride: usize) -> Self {
        Self {
            start: 0,
            end: window_size,
            stride,
        }
    }

    /// Whether the current window is complete within `len` samples
    pub fn fits(&self, len: usize) -> bool {
        len >= self.end
    }

    pub fn bounds(&self) -> WindowBounds {
        WindowBounds {
            start: self.start,
            end: self.end,
        }
    }

    pub fn advance(&mut self) {
        self.start += self.stride;
        self.end += self.stride;
    }
}

// ============================================================================
// SEGMENTER
// ============================================================================

/// Fixed-size, fixed-stride window planner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    window_size: usize,
    stride: usize,
    edge: EdgePolicy,
}

impl Segmenter {
    pub fn new(window_size: usize, stride: usize, edge: EdgePolicy) -> PipelineResult<Self> {
        if window_size == 0 {
            return Err(PipelineError::InvalidConfig("window_size must be positive".to_string()));
        }
        if stride == 0 {
            return Err(PipelineError::InvalidConfig("stride must be positive".to_string()));
        }
        Ok(Self {
            window_size,
            stride,
            edge,
        })
    }

    /// Drop-remainder segmenter used for training
    pub fn finite(window_size: usize, stride: usize) -> PipelineResult<Self> {
        Self::new(window_size, stride, EdgePolicy::DropRemainder)
    }

    /// Anchor-to-end segmenter used for time-aware re-scoring
    pub fn time_aware(window_size: usize, stride: usize) -> PipelineResult<Self> {
        Self::new(window_size, stride, EdgePolicy::AnchorToEnd)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn edge(&self) -> EdgePolicy {
        self.edge
    }

    /// Fresh cursor at `[0, window_size)`
    pub fn cursor(&self) -> SlidingCursor {
        SlidingCursor::new(self.window_size, self.stride)
    }

    /// All windows over a sequence of length `n`.
    ///
    /// Empty when `n < window_size`; every returned window has length `window_size`.
    pub fn plan(&self, n: usize) -> Vec<WindowBounds> {
        let mut windows = Vec::with_capacity(self.count(n));
        let mut cursor = self.cursor();
        while cursor.fits(n) {
            windows.push(cursor.bounds());
            cursor.advance();
        }

        if self.edge == EdgePolicy::AnchorToEnd {
            if let Some(last) = windows.last() {
                if last.end < n {
                    windows.push(WindowBounds {
                        start: n - self.window_size,
                        end: n,
                    });
                }
            }
        }

        windows
    }

    /// Like [`plan`](Self::plan) but an empty plan is an error
    pub fn require_plan(&self, n: usize) -> PipelineResult<Vec<WindowBounds>> {
        let windows = self.plan(n);
        if windows.is_empty() {
            return Err(PipelineError::no_window(n, self.window_size));
        }
        Ok(windows)
    }

    /// Number of windows [`plan`](Self::plan) yields for length `n`
    pub fn count(&self, n: usize) -> usize {
        if n < self.window_size {
            return 0;
        }
        let regular = (n - self.window_size) / self.stride + 1;
        let last_end = (regular - 1) * self.stride + self.window_size;
        match self.edge {
            EdgePolicy::AnchorToEnd if last_end < n => regular + 1,
            _ => regular,
        }
    }

    /// Slice `items` into planned windows
    pub fn windows<'a, T>(&self, items: &'a [T]) -> impl Iterator<Item = (WindowBounds, &'a [T])> + 'a {
        self.plan(items.len())
            .into_iter()
            .map(move |b| (b, &items[b.start..b.end]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(windows: &[WindowBounds]) -> Vec<(usize, usize)> {
        windows.iter().map(|w| (w.start, w.end)).collect()
    }

    #[test]
    fn test_finite_seven_samples() {
        let seg = Segmenter::finite(3, 2).unwrap();
        assert_eq!(starts(&seg.plan(7)), vec![(0, 3), (2, 5), (4, 7)]);
    }

    #[test]
    fn test_time_aware_seven_samples_has_no_extra_window() {
        let seg = Segmenter::time_aware(3, 2).unwrap();
        assert_eq!(starts(&seg.plan(7)), vec![(0, 3), (2, 5), (4, 7)]);
    }

    #[test]
    fn test_eight_samples_edge_policies() {
        let finite = Segmenter::finite(3, 2).unwrap();
        let anchored = Segmenter::time_aware(3, 2).unwrap();
        assert_eq!(starts(&finite.plan(8)), vec![(0, 3), (2, 5), (4, 7)]);
        assert_eq!(starts(&anchored.plan(8)), vec![(0, 3), (2, 5), (4, 7), (5, 8)]);
    }

    #[test]
    fn test_finite_count_formula() {
        for window_size in 1..8 {
            for stride in 1..8 {
                let seg = Segmenter::finite(window_size, stride).unwrap();
                for n in window_size..40 {
                    let plan = seg.plan(n);
                    assert_eq!(plan.len(), (n - window_size) / stride + 1);
                    assert_eq!(plan.len(), seg.count(n));
                    for (k, w) in plan.iter().enumerate() {
                        assert_eq!(w.start, k * stride);
                        assert_eq!(w.len(), window_size);
                    }
                }
            }
        }
    }

    #[test]
    fn test_time_aware_always_reaches_end() {
        for window_size in 1..8 {
            for stride in 1..10 {
                let seg = Segmenter::time_aware(window_size, stride).unwrap();
                for n in window_size..40 {
                    let plan = seg.plan(n);
                    assert_eq!(plan.last().map(|w| w.end), Some(n));
                    assert_eq!(plan.len(), seg.count(n));
                    assert!(plan.iter().all(|w| w.len() == window_size));
                }
            }
        }
    }

    #[test]
    fn test_short_sequence_yields_nothing() {
        let finite = Segmenter::finite(5, 2).unwrap();
        let anchored = Segmenter::time_aware(5, 2).unwrap();
        assert!(finite.plan(4).is_empty());
        assert!(anchored.plan(4).is_empty());

        match finite.require_plan(4) {
            Err(PipelineError::InsufficientData { available, required, unit }) => {
                assert_eq!(available, 4);
                assert_eq!(required, 5);
                assert_eq!(unit, "samples");
            }
            other => panic!("Expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_parameters_rejected() {
        assert!(Segmenter::finite(0, 1).is_err());
        assert!(Segmenter::finite(3, 0).is_err());
    }

    #[test]
    fn test_windows_slices() {
        let data: Vec<u32> = (0..8).collect();
        let seg = Segmenter::time_aware(3, 2).unwrap();
        let last = seg.windows(&data).last().unwrap();
        assert_eq!(last.1, &[5, 6, 7]);
    }
}
