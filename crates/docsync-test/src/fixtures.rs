//! rstest fixtures and test doubles for the migration engine

pub mod doctypes;
pub mod mock;
pub mod recording;

pub use doctypes::*;
pub use mock::{MockDatabase, mock_database};
pub use recording::{DbCall, RecordingDatabase, recording_database};
