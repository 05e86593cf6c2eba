//! # Database Backends
//!
//! The migration engine talks to a database only through the narrow
//! [`Database`] capability defined here: column/index introspection,
//! transaction control, savepoints, and plain statement execution.
//!
//! A single exclusive connection is assumed. Backends do not retry failed
//! calls; every failure is returned as a [`DatabaseError`].
//!
//! ## Available backends
//!
//! - [`sqlite::SqliteDatabase`] (feature `sqlite`) - single in-process SQLite connection

pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;

pub use types::{
	ColumnInfo, DatabaseError, IndexInfo, IsolationLevel, Result, RunResult, Transaction,
	TransactionOptions,
};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

/// Database capability consumed by the migration engine
#[async_trait]
pub trait Database: Send + Sync {
	/// Read the columns of a table.
	///
	/// Backends report a missing table as [`DatabaseError::TableNotFound`].
	async fn get_columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;

	/// Read the indexes of a table
	async fn get_indexes(&self, table: &str) -> Result<Vec<IndexInfo>>;

	/// Open a transaction on the exclusive connection
	async fn begin(&self, options: &TransactionOptions) -> Result<Transaction>;

	async fn commit(&self, tx: &Transaction) -> Result<()>;

	async fn rollback(&self, tx: &Transaction) -> Result<()>;

	/// Create a named savepoint inside `tx`
	async fn savepoint(&self, tx: &Transaction, name: &str) -> Result<()>;

	async fn release_savepoint(&self, tx: &Transaction, name: &str) -> Result<()>;

	async fn rollback_to_savepoint(&self, tx: &Transaction, name: &str) -> Result<()>;

	/// Execute one statement
	async fn run(&self, sql: &str) -> Result<RunResult>;

	/// Execute a `SELECT COUNT(*)`-style query and return the scalar
	async fn query_count(&self, sql: &str) -> Result<u64>;
}

/// Quote an identifier for use in generated SQL
///
/// # Examples
///
/// ```
/// use docsync_db::backends::quote_identifier;
///
/// assert_eq!(quote_identifier("tabUser"), r#""tabUser""#);
/// assert_eq!(quote_identifier(r#"odd"name"#), r#""odd""name""#);
/// ```
pub fn quote_identifier(name: &str) -> String {
	format!("\"{}\"", name.replace('"', "\"\""))
}
