//! Sample Sources - pull interface for live and replayed readings
//!
//! `Ok(None)` means "no data this tick" and is not an error.
//! `Err(SourceError)` is transient: the session logs it and polls again.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use thiserror::Error;

use crate::logic::dataset::Recording;
use crate::logic::sample::{ChannelMap, RawReading, Sample};

/// Failed poll; recovered inside the streaming loop
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("reading is missing channel '{0}'")]
    MissingChannel(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unreadable payload: {0}")]
    Parse(String),
}

/// Pull interface polled once per cycle
pub trait SampleSource {
    /// Block for at most `timeout` waiting for the next reading
    fn poll(&mut self, timeout: Duration) -> Result<Option<Sample>, SourceError>;

    /// No further readings will ever arrive
    fn is_closed(&self) -> bool {
        false
    }
}

// ============================================================================
// CHANNEL SOURCE
// ============================================================================

/// Raw readings pushed by a transport thread through an `mpsc` channel
pub struct ChannelSource {
    rx: Receiver<RawReading>,
    map: ChannelMap,
    closed: bool,
}

impl ChannelSource {
    pub fn new(rx: Receiver<RawReading>, map: ChannelMap) -> Self {
        Self {
            rx,
            map,
            closed: false,
        }
    }

    /// Sender for the transport side plus the source for the session
    pub fn channel(map: ChannelMap) -> (Sender<RawReading>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx, map))
    }

    pub fn map(&self) -> &ChannelMap {
        &self.map
    }
}

impl SampleSource for ChannelSource {
    fn poll(&mut self, timeout: Duration) -> Result<Option<Sample>, SourceError> {
        match self.rx.recv_timeout(timeout) {
            Ok(reading) => self.map.to_sample(&reading).map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                if !self.closed {
                    log::info!("Live source disconnected");
                }
                self.closed = true;
                Ok(None)
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

// ============================================================================
// REPLAY SOURCE
// ============================================================================

/// In-memory source for offline replays and deterministic tests
#[derive(Debug, Default)]
pub struct ReplaySource {
    queue: VecDeque<Result<Sample, SourceError>>,
}

impl ReplaySource {
    pub fn new(samples: impl IntoIterator<Item = Sample>) -> Self {
        Self::from_events(samples.into_iter().map(Ok))
    }

    /// Scripted sequence of readings and failed polls
    pub fn from_events(events: impl IntoIterator<Item = Result<Sample, SourceError>>) -> Self {
        Self {
            queue: events.into_iter().collect(),
        }
    }

    pub fn from_recording(recording: &Recording) -> Self {
        Self::new(recording.samples().iter().cloned())
    }

    /// Insert a transport failure before every `every`-th reading
    pub fn with_failures_every(self, every: usize) -> Self {
        if every == 0 {
            return self;
        }
        let mut queue = VecDeque::with_capacity(self.queue.len() + self.queue.len() / every);
        for (i, event) in self.queue.into_iter().enumerate() {
            if (i + 1) % every == 0 {
                queue.push_back(Err(SourceError::Transport(format!("injected failure before reading {}", i))));
            }
            queue.push_back(event);
        }
        Self { queue }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl SampleSource for ReplaySource {
    fn poll(&mut self, _timeout: Duration) -> Result<Option<Sample>, SourceError> {
        match self.queue.pop_front() {
            Some(event) => event.map(Some),
            None => Ok(None),
        }
    }

    fn is_closed(&self) -> bool {
        self.queue.is_empty()
    }
}
