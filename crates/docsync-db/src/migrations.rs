//! # DocType Schema Migrations
//!
//! Keeps database tables in sync with declared DocType schemas.
//!
//! - [`SchemaComparisonEngine`] diffs a declared schema against the live table
//! - [`analyzer`] derives risk, complexity and timing figures from a diff
//! - [`MigrationValidator`] scores a migration before it runs
//! - [`MigrationExecutor`] applies forward or rollback SQL under savepoints
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use docsync_db::backends::SqliteDatabase;
//! use docsync_db::migrations::{DocField, DocType, InMemoryRegistry, SchemaComparisonEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = InMemoryRegistry::new();
//! registry.register(DocType::new("User").with_field(DocField::new("email", "Data").unique()));
//!
//! let database = Arc::new(SqliteDatabase::in_memory().await?);
//! let engine = SchemaComparisonEngine::new(Arc::new(registry), database);
//!
//! let diff = engine.compare_schema("User", None, None).await?;
//! println!("{} columns to add", diff.added_columns.len());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod doctype;
pub mod engine;
pub mod executor;
pub mod field_comparator;
pub mod index_comparator;
pub mod migration;
pub mod schema_diff;
pub mod validator;

use thiserror::Error;

use crate::backends::DatabaseError;

pub use analyzer::DiffStatistics;
pub use cache::{CacheStats, SchemaCache};
pub use config::{ComparisonConfig, ConfigError, ExecutionConfig, MigrationConfig};
pub use doctype::{DocField, DocIndex, DocType, DocTypeRegistry, InMemoryRegistry};
pub use engine::{
	BatchComparisonResult, BatchItemError, ComparisonOptions, ComparisonProgress, ComparisonStage,
	ProgressCallback, SchemaComparisonEngine, TableStructure,
};
pub use executor::{
	ExecutionError, ExecutionMetrics, ExecutionOptions, ExecutionResult, MigrationExecutor,
	Savepoint,
};
pub use migration::{Migration, MigrationSql, MigrationStateError, MigrationStatus, MigrationValidation};
pub use schema_diff::{
	ColumnChange, ColumnDefinition, ColumnRename, FieldChange, FieldChanges, IndexChange,
	IndexDefinition, SchemaDiff, ValueChange,
};
pub use validator::{
	DataLossRisk, MigrationValidator, RiskSeverity, RiskType, RollbackAssessment,
	RollbackDifficulty, SqlValidationReport,
};

/// Errors raised while comparing a declared schema with its table
#[derive(Debug, Error)]
pub enum SchemaComparisonError {
	#[error("DocType not found: {doctype}")]
	DocTypeNotFound { doctype: String },

	#[error("Table not found: {table}")]
	TableNotFound {
		doctype: Option<String>,
		table: String,
	},

	#[error("Invalid schema: {details}")]
	SchemaValidation {
		doctype: Option<String>,
		details: String,
	},

	#[error("Field '{field}' cannot be compared: {details}")]
	FieldComparison {
		doctype: Option<String>,
		field: String,
		details: String,
	},

	#[error("Index '{index}' cannot be compared: {details}")]
	IndexComparison {
		doctype: Option<String>,
		index: String,
		details: String,
	},

	#[error("Database error while comparing {doctype}: {source}")]
	Database {
		doctype: String,
		#[source]
		source: DatabaseError,
	},
}

impl SchemaComparisonError {
	/// Stable machine-readable error code
	///
	/// # Examples
	///
	/// ```
	/// use docsync_db::migrations::SchemaComparisonError;
	///
	/// let err = SchemaComparisonError::DocTypeNotFound { doctype: "User".to_string() };
	/// assert_eq!(err.code(), "DOCTYPE_NOT_FOUND");
	/// assert_eq!(err.doctype(), Some("User"));
	/// ```
	pub fn code(&self) -> &'static str {
		match self {
			SchemaComparisonError::DocTypeNotFound { .. } => "DOCTYPE_NOT_FOUND",
			SchemaComparisonError::TableNotFound { .. } => "TABLE_NOT_FOUND",
			SchemaComparisonError::SchemaValidation { .. } => "SCHEMA_VALIDATION_ERROR",
			SchemaComparisonError::FieldComparison { .. } => "FIELD_COMPARISON_ERROR",
			SchemaComparisonError::IndexComparison { .. } => "INDEX_COMPARISON_ERROR",
			SchemaComparisonError::Database { .. } => "DATABASE_ERROR",
		}
	}

	/// DocType the error concerns, when known
	pub fn doctype(&self) -> Option<&str> {
		match self {
			SchemaComparisonError::DocTypeNotFound { doctype }
			| SchemaComparisonError::Database { doctype, .. } => Some(doctype),
			SchemaComparisonError::TableNotFound { doctype, .. }
			| SchemaComparisonError::SchemaValidation { doctype, .. }
			| SchemaComparisonError::FieldComparison { doctype, .. }
			| SchemaComparisonError::IndexComparison { doctype, .. } => doctype.as_deref(),
		}
	}

	/// Human-readable detail without the error kind prefix
	pub fn details(&self) -> String {
		match self {
			SchemaComparisonError::DocTypeNotFound { doctype } => {
				format!("no DocType named '{}' is registered", doctype)
			}
			SchemaComparisonError::TableNotFound { table, .. } => {
				format!("table '{}' does not exist", table)
			}
			SchemaComparisonError::SchemaValidation { details, .. }
			| SchemaComparisonError::FieldComparison { details, .. }
			| SchemaComparisonError::IndexComparison { details, .. } => details.clone(),
			SchemaComparisonError::Database { source, .. } => source.to_string(),
		}
	}
}

pub type Result<T> = std::result::Result<T, SchemaComparisonError>;
