//! Test doubles for exercising the executor without a database.

mod recording;

pub use recording::{ExecutionRecord, FailAt, RecordingDriver, RecordingRows, RecordingStatement};

/// A [`crate::Connection`] over the recording driver.
pub type RecordingConnection = crate::Connection<RecordingDriver>;
