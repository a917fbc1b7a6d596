//! Batch Evaluator - time-aware re-scoring of a recording
//!
//! Anchor-to-end windowing so the trailing remainder is never lost.
//! All-or-nothing: any prediction failure aborts the run.

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;

use super::summary::DurationSummary;
use crate::error::PipelineResult;
use crate::logic::dataset::Recording;
use crate::logic::features::{FeatureExtractor, StatisticalExtractor};
use crate::logic::model::{classify, ActivityClassifier, Label};
use crate::logic::sample::{Sample, Timestamp};
use crate::logic::segment::Segmenter;

/// Accepted date-time layouts besides RFC 3339
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

// ============================================================================
// TIME NORMALIZATION
// ============================================================================

/// How `time` cells were turned into seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeSource {
    /// Numeric seconds, used as-is
    Numeric,
    /// Date-times, elapsed seconds since the first sample
    DateTime,
    /// Unreadable; sample index used as seconds
    Ordinal,
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Per-sample times in seconds.
///
/// A blank time is neither numeric nor a date-time, so it sends the whole
/// recording to the ordinal fallback.
pub fn normalize_times(samples: &[Sample]) -> (Vec<f64>, TimeSource) {
    let stamps: Vec<Option<&Timestamp>> = samples.iter().map(|s| s.time.as_ref()).collect();

    let numeric: Option<Vec<f64>> = stamps
        .iter()
        .map(|s| match s {
            Some(Timestamp::Seconds(v)) => Some(*v),
            _ => None,
        })
        .collect();
    if let Some(seconds) = numeric {
        return (seconds, TimeSource::Numeric);
    }

    let parsed: Option<Vec<NaiveDateTime>> = stamps
        .iter()
        .map(|s| match s {
            Some(Timestamp::Text(raw)) => parse_datetime(raw),
            _ => None,
        })
        .collect();
    if let Some(datetimes) = parsed {
        if let Some(&first) = datetimes.first() {
            let seconds = datetimes
                .iter()
                .map(|dt| {
                    let delta = *dt - first;
                    delta
                        .num_microseconds()
                        .map(|us| us as f64 / 1e6)
                        .unwrap_or(delta.num_seconds() as f64)
                })
                .collect();
            return (seconds, TimeSource::DateTime);
        }
    }

    log::warn!("time column is neither numeric nor date-time, using sample index as seconds");
    ((0..samples.len()).map(|i| i as f64).collect(), TimeSource::Ordinal)
}

// ============================================================================
// WINDOW RESULTS
// ============================================================================

/// One scored window with its time range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowResult {
    pub start_time_s: f64,
    pub end_time_s: f64,
    /// `max(0, end_time_s - start_time_s)`
    pub duration_s: f64,
    pub label: Label,
}

/// Full batch output
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub windows: Vec<WindowResult>,
    pub summary: DurationSummary,
    pub time_source: TimeSource,
}

/// Score every anchored window of `samples`
pub fn evaluate_samples<C: ActivityClassifier + ?Sized>(
    samples: &[Sample],
    window_size: usize,
    stride: usize,
    classifier: &C,
) -> PipelineResult<Evaluation> {
    let segmenter = Segmenter::time_aware(window_size, stride)?;
    let (times, time_source) = normalize_times(samples);
    let plan = segmenter.require_plan(samples.len())?;

    let extractor = StatisticalExtractor::new();
    let mut windows = Vec::with_capacity(plan.len());
    for bounds in plan {
        let vector = extractor.extract(&samples[bounds.start..bounds.end])?;
        let label = classify(classifier, &vector, Some(bounds))?;

        let start_time_s = times[bounds.start];
        let end_time_s = times[bounds.end - 1];
        windows.push(WindowResult {
            start_time_s,
            end_time_s,
            duration_s: (end_time_s - start_time_s).max(0.0),
            label,
        });
    }

    let summary = DurationSummary::from_results(&windows);
    log::info!(
        "Evaluated {} windows over {} samples ({:?} time), total {:.1}s",
        windows.len(),
        samples.len(),
        time_source,
        summary.total_s()
    );

    Ok(Evaluation {
        windows,
        summary,
        time_source,
    })
}

/// Score a recording; it must carry a `time` column
pub fn evaluate<C: ActivityClassifier + ?Sized>(
    recording: &Recording,
    window_size: usize,
    stride: usize,
    classifier: &C,
) -> PipelineResult<Evaluation> {
    recording.require_time()?;
    evaluate_samples(recording.samples(), window_size, stride, classifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(raw: &str) -> Sample {
        let mut sample = Sample::new([0.0; 6]);
        sample.time = Some(Timestamp::Text(raw.to_string()));
        sample
    }

    #[test]
    fn test_numeric_times_used_as_is() {
        let samples: Vec<Sample> = (0..3).map(|i| Sample::new([0.0; 6]).with_time(10.0 + i as f64)).collect();
        let (times, source) = normalize_times(&samples);
        assert_eq!(times, vec![10.0, 11.0, 12.0]);
        assert_eq!(source, TimeSource::Numeric);
    }

    #[test]
    fn test_datetimes_relative_to_first() {
        let samples = vec![
            text("2024-03-01 12:00:00.000"),
            text("2024-03-01 12:00:00.500"),
            text("2024-03-01 12:00:02"),
        ];
        let (times, source) = normalize_times(&samples);
        assert_eq!(source, TimeSource::DateTime);
        assert_eq!(times, vec![0.0, 0.5, 2.0]);

        let rfc = vec![text("2024-03-01T12:00:00Z"), text("2024-03-01T12:01:00Z")];
        assert_eq!(normalize_times(&rfc).0, vec![0.0, 60.0]);
    }

    #[test]
    fn test_unreadable_times_fall_back_to_index() {
        let samples = vec![text("a"), text("b"), text("c")];
        let (times, source) = normalize_times(&samples);
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_eq!(source, TimeSource::Ordinal);
    }

    #[test]
    fn test_blank_time_falls_back_to_index() {
        let samples = vec![
            Sample::new([0.0; 6]).with_time(5.0),
            Sample::new([0.0; 6]),
            Sample::new([0.0; 6]).with_time(7.0),
        ];
        let (times, source) = normalize_times(&samples);
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_eq!(source, TimeSource::Ordinal);
    }
}
