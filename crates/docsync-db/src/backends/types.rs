//! Core types shared by every database backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a database backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatabaseError {
	#[error("Table not found: {0}")]
	TableNotFound(String),

	#[error("Query error: {0}")]
	Query(String),

	#[error("Transaction error: {0}")]
	Transaction(String),

	#[error("Savepoint error: {0}")]
	Savepoint(String),

	#[error("Statement timed out after {0} ms")]
	Timeout(u64),

	#[error("Connection error: {0}")]
	Connection(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Column metadata discovered from a live table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
	/// Column name
	pub name: String,
	/// Storage type as reported by the database, including any length suffix
	pub column_type: String,
	/// Whether the column accepts NULL
	pub nullable: bool,
	/// Default value expression
	pub default: Option<String>,
	/// Whether the column is part of the primary key
	pub primary_key: bool,
	/// Whether the column is auto-incremented
	pub auto_increment: bool,
	/// Whether a single-column unique constraint covers the column
	pub unique: bool,
}

impl ColumnInfo {
	/// Create a nullable, non-unique column of the given type
	///
	/// # Examples
	///
	/// ```
	/// use docsync_db::backends::ColumnInfo;
	///
	/// let column = ColumnInfo::new("email", "varchar(140)").not_null().unique();
	/// assert_eq!(column.name, "email");
	/// assert!(!column.nullable);
	/// assert!(column.unique);
	/// ```
	pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			column_type: column_type.into(),
			nullable: true,
			default: None,
			primary_key: false,
			auto_increment: false,
			unique: false,
		}
	}

	pub fn not_null(mut self) -> Self {
		self.nullable = false;
		self
	}

	pub fn unique(mut self) -> Self {
		self.unique = true;
		self
	}

	pub fn primary_key(mut self) -> Self {
		self.primary_key = true;
		self.nullable = false;
		self
	}

	pub fn with_default(mut self, default: impl Into<String>) -> Self {
		self.default = Some(default.into());
		self
	}
}

/// Index metadata discovered from a live table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
	/// Index name
	pub name: String,
	/// Indexed columns in order
	pub columns: Vec<String>,
	/// Whether the index is unique
	pub unique: bool,
	/// Index type (e.g. BTREE)
	pub index_type: Option<String>,
	/// How the index was created: `c` (CREATE INDEX), `u` (UNIQUE constraint) or `pk`
	pub origin: Option<String>,
	/// Whether the index is partial
	pub partial: bool,
}

impl IndexInfo {
	pub fn new(name: impl Into<String>, columns: Vec<String>, unique: bool) -> Self {
		Self {
			name: name.into(),
			columns,
			unique,
			index_type: None,
			origin: None,
			partial: false,
		}
	}

	/// Indexes created implicitly by the storage engine for primary keys
	/// and inline UNIQUE constraints.
	pub fn is_implicit(&self) -> bool {
		self.name.starts_with("sqlite_autoindex_")
			|| matches!(self.origin.as_deref(), Some("pk") | Some("u"))
	}
}

/// Transaction isolation levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IsolationLevel {
	ReadUncommitted,
	ReadCommitted,
	RepeatableRead,
	Serializable,
}

impl IsolationLevel {
	/// Convert isolation level to SQL string
	///
	/// # Examples
	///
	/// ```
	/// use docsync_db::backends::IsolationLevel;
	///
	/// assert_eq!(IsolationLevel::Serializable.to_sql(), "SERIALIZABLE");
	/// assert_eq!(IsolationLevel::ReadCommitted.to_sql(), "READ COMMITTED");
	/// ```
	pub fn to_sql(&self) -> &'static str {
		match self {
			IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
			IsolationLevel::ReadCommitted => "READ COMMITTED",
			IsolationLevel::RepeatableRead => "REPEATABLE READ",
			IsolationLevel::Serializable => "SERIALIZABLE",
		}
	}
}

/// Options passed to [`Database::begin`](super::Database::begin)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
	pub isolation_level: Option<IsolationLevel>,
}

impl TransactionOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_isolation_level(mut self, level: IsolationLevel) -> Self {
		self.isolation_level = Some(level);
		self
	}
}

/// Handle to an open transaction
///
/// The handle is an identifier only; the backend owns the connection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
	pub id: Uuid,
	pub isolation_level: Option<IsolationLevel>,
	pub started_at: DateTime<Utc>,
}

impl Transaction {
	pub fn new(options: &TransactionOptions) -> Self {
		Self {
			id: Uuid::new_v4(),
			isolation_level: options.isolation_level,
			started_at: Utc::now(),
		}
	}
}

/// Outcome of a single `run` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
	/// Rows changed by the statement, when the backend reports it
	pub changes: Option<u64>,
}

impl RunResult {
	pub fn with_changes(changes: u64) -> Self {
		Self {
			changes: Some(changes),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("sqlite_autoindex_tabUser_1", None, true)]
	#[case("idx_user_email", Some("c"), false)]
	#[case("uniq_user_email", Some("u"), true)]
	#[case("pk_index", Some("pk"), true)]
	fn test_implicit_index_detection(
		#[case] name: &str,
		#[case] origin: Option<&str>,
		#[case] expected: bool,
	) {
		let mut index = IndexInfo::new(name, vec!["email".to_string()], true);
		index.origin = origin.map(str::to_string);
		assert_eq!(index.is_implicit(), expected);
	}

	#[rstest]
	fn test_transaction_carries_isolation_level() {
		let options = TransactionOptions::new().with_isolation_level(IsolationLevel::Serializable);
		let tx = Transaction::new(&options);
		assert_eq!(tx.isolation_level, Some(IsolationLevel::Serializable));
	}

	#[rstest]
	fn test_primary_key_column_is_not_null() {
		let column = ColumnInfo::new("name", "varchar(140)").primary_key();
		assert!(column.primary_key);
		assert!(!column.nullable);
	}
}
