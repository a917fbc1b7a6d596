//! Duration Summary - total time per label across a batch run

use std::collections::BTreeMap;

use serde::Serialize;

use super::timeline::WindowResult;
use crate::logic::model::Label;

/// One label's share of the total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationEntry {
    pub label: String,
    pub duration_s: f64,
    /// Percentage of the grand total; 0 for every label when the total is 0
    pub share_pct: f64,
}

/// Per-label durations, longest first (ties by label name)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DurationSummary {
    entries: Vec<DurationEntry>,
    total_s: f64,
}

impl DurationSummary {
    pub fn from_results(results: &[WindowResult]) -> Self {
        let mut totals: BTreeMap<Label, f64> = BTreeMap::new();
        for result in results {
            *totals.entry(result.label).or_insert(0.0) += result.duration_s;
        }

        let total_s: f64 = totals.values().sum();
        let mut entries: Vec<DurationEntry> = totals
            .into_iter()
            .map(|(label, duration_s)| DurationEntry {
                label: label.name().into_owned(),
                duration_s,
                share_pct: if total_s > 0.0 {
                    duration_s / total_s * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        entries.sort_by(|a, b| {
            b.duration_s
                .total_cmp(&a.duration_s)
                .then_with(|| a.label.cmp(&b.label))
        });

        Self { entries, total_s }
    }

    pub fn entries(&self) -> &[DurationEntry] {
        &self.entries
    }

    pub fn total_s(&self) -> f64 {
        self.total_s
    }

    pub fn get(&self, label: &str) -> Option<&DurationEntry> {
        self.entries.iter().find(|e| e.label == label)
    }
}

/// `MM:SS`, rounded to whole seconds; minutes are not capped at 59
pub fn format_mm_ss(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(code: i64, duration_s: f64) -> WindowResult {
        WindowResult {
            start_time_s: 0.0,
            end_time_s: duration_s,
            duration_s,
            label: Label::from_code(code),
        }
    }

    #[test]
    fn test_shares_sum_to_hundred() {
        let summary = DurationSummary::from_results(&[result(0, 2.0), result(1, 3.0), result(0, 1.0), result(2, 4.0)]);
        let total: f64 = summary.entries().iter().map(|e| e.share_pct).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(summary.total_s(), 10.0);
        assert_eq!(summary.get("Stop").unwrap().duration_s, 3.0);
    }

    #[test]
    fn test_zero_total_gives_zero_shares() {
        let summary = DurationSummary::from_results(&[result(0, 0.0), result(1, 0.0)]);
        assert_eq!(summary.entries().len(), 2);
        assert!(summary.entries().iter().all(|e| e.share_pct == 0.0));
    }

    #[test]
    fn test_sorted_longest_first() {
        let summary = DurationSummary::from_results(&[result(0, 1.0), result(2, 5.0), result(1, 1.0)]);
        let labels: Vec<&str> = summary.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Not Distracted Walking", "Distracted Walking", "Stop"]);
    }

    #[test]
    fn test_format_mm_ss() {
        assert_eq!(format_mm_ss(0.0), "00:00");
        assert_eq!(format_mm_ss(59.6), "01:00");
        assert_eq!(format_mm_ss(125.0), "02:05");
        assert_eq!(format_mm_ss(3600.0), "60:00");
        assert_eq!(format_mm_ss(-3.0), "00:00");
    }
}
