//! Stream Module - live classification sessions
//!
//! A session owns its buffers, cursor, tally and alert state; nothing is
//! shared between sessions.

pub mod alert;
pub mod buffer;
pub mod session;
pub mod source;

#[cfg(test)]
mod tests;

// Re-export common types
pub use alert::{AlertEvent, AlertMode, AlertNotifier, AlertPolicy, LogNotifier, MemoryNotifier};
pub use buffer::{BufferStatus, ChannelBuffers};
pub use session::{SessionConfig, SessionReport, StopHandle, StreamState, StreamingPredictor};
pub use source::{ChannelSource, ReplaySource, SampleSource, SourceError};
