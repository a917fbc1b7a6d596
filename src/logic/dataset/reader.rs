//! Recording Reader - tabular sensor recordings
//!
//! Header-driven CSV: `ax, ay, az, wx, wy, wz` are required, `time`,
//! `class` and `detail` are optional. Column order does not matter.

use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::error::{PipelineError, PipelineResult};
use crate::logic::sample::{Sample, Timestamp, CHANNELS, CHANNEL_COUNT};

/// Column positions resolved from the header row
struct ColumnIndex {
    channels: [usize; CHANNEL_COUNT],
    time: Option<usize>,
    class: Option<usize>,
    detail: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> PipelineResult<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let mut channels = [0usize; CHANNEL_COUNT];
        for (slot, channel) in channels.iter_mut().zip(CHANNELS.iter()) {
            *slot = find(channel.as_str()).ok_or_else(|| PipelineError::missing_column(channel.as_str()))?;
        }

        Ok(Self {
            channels,
            time: find("time"),
            class: find("class"),
            detail: find("detail"),
        })
    }
}

/// Ordered samples of one recording
#[derive(Debug, Clone, Default)]
pub struct Recording {
    samples: Vec<Sample>,
    has_time: bool,
    has_class: bool,
}

impl Recording {
    /// Recording from in-memory samples; a column counts as present if any sample carries it
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        let has_time = samples.iter().any(|s| s.time.is_some());
        let has_class = !samples.is_empty() && samples.iter().any(|s| s.class.is_some());
        Self {
            samples,
            has_time,
            has_class,
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn has_time(&self) -> bool {
        self.has_time
    }

    pub fn has_labels(&self) -> bool {
        self.has_class
    }

    /// Query data must carry a `time` column; blank cells are allowed
    pub fn require_time(&self) -> PipelineResult<()> {
        if !self.has_time {
            return Err(PipelineError::missing_column("time"));
        }
        Ok(())
    }

    /// Training data must carry a `class` column
    pub fn require_labels(&self) -> PipelineResult<()> {
        if !self.has_class {
            return Err(PipelineError::missing_column("class"));
        }
        Ok(())
    }
}

fn parse_channel(record: &StringRecord, index: usize, column: &str, row: usize) -> PipelineResult<f64> {
    let raw = record.get(index).unwrap_or("").trim();
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(PipelineError::bad_cell(column, row, raw)),
    }
}

fn parse_time(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() => Some(Timestamp::Seconds(seconds)),
        _ => Some(Timestamp::Text(raw.to_string())),
    }
}

/// Parse a recording from any CSV source.
///
/// Rows are numbered from 1 (first data row), matching spreadsheet views minus the header.
pub fn read_recording<R: Read>(reader: R) -> PipelineResult<Recording> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnIndex::resolve(csv_reader.headers()?)?;

    let mut samples = Vec::new();
    for (i, result) in csv_reader.records().enumerate() {
        let record = result?;
        let row = i + 1;

        let mut channels = [0.0; CHANNEL_COUNT];
        for (slot, (index, channel)) in channels
            .iter_mut()
            .zip(columns.channels.iter().zip(CHANNELS.iter()))
        {
            *slot = parse_channel(&record, *index, channel.as_str(), row)?;
        }

        let time = columns.time.and_then(|i| record.get(i)).and_then(parse_time);

        let class = match columns.class.and_then(|i| record.get(i)).map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(
                raw.parse::<i64>()
                    .or_else(|_| match raw.parse::<f64>() {
                        Ok(v) if v.fract() == 0.0 && v.is_finite() => Ok(v as i64),
                        _ => Err(PipelineError::bad_cell("class", row, raw)),
                    })?,
            ),
            _ => None,
        };

        let detail = columns
            .detail
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        samples.push(Sample {
            time,
            channels,
            class,
            detail,
        });
    }

    log::debug!(
        "Read recording: {} samples, time={}, class={}",
        samples.len(),
        columns.time.is_some(),
        columns.class.is_some()
    );

    Ok(Recording {
        has_time: columns.time.is_some(),
        has_class: columns.class.is_some(),
        samples,
    })
}

pub fn read_recording_path(path: impl AsRef<Path>) -> PipelineResult<Recording> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let recording = read_recording(file)?;
    log::info!("Loaded {} samples from {}", recording.len(), path.display());
    Ok(recording)
}
