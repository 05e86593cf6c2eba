//! # docsync test
//!
//! Testing utilities for docsync.
//!
//! - [`fixtures::MockDatabase`]: mockall mock of the `Database` capability
//! - [`fixtures::RecordingDatabase`]: scripted in-memory database that records
//!   every call, for asserting statement order and transaction behavior
//! - DocType and table fixtures for rstest
//! - [`logging::init_test_logging`]: one-time tracing setup for tests
//!
//! ## Example
//!
//! ```rust
//! use docsync_test::fixtures::{RecordingDatabase, DbCall};
//! use docsync_db::backends::Database;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let db = RecordingDatabase::new().fail_on("DROP");
//! assert!(db.run("ALTER TABLE t ADD COLUMN c text").await.is_ok());
//! assert!(db.run("DROP TABLE t").await.is_err());
//! assert_eq!(db.run_count(), 2);
//! assert!(matches!(db.calls()[0], DbCall::Run(_)));
//! # }
//! ```

pub mod fixtures;
pub mod logging;

pub use fixtures::{DbCall, MockDatabase, RecordingDatabase};
pub use logging::init_test_logging;
