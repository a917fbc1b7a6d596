//! Dataset Module - recorded input and tabular exports

pub mod export;
pub mod reader;


pub use export::{export_summary, export_windows, write_summary, write_windows, ExportFormat};
pub use reader::{read_recording, read_recording_path, Recording};
