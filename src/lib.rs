//! # docsync
//!
//! Keeps database tables in line with the DocType definitions that describe them.
//!
//! A DocType declares fields and indexes. docsync introspects the live table,
//! computes a [`SchemaDiff`], scores the risk of applying it and runs the
//! resulting SQL inside a transaction with per-statement savepoints.
//!
//! ## Feature Flags
//!
//! - `sqlite` (default): [`backends::SqliteDatabase`] backed by sqlx
//! - `test-utils`: fixtures, mock and recording databases from `docsync-test`
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use docsync::prelude::*;
//!
//! # async fn run(db: Arc<dyn Database>) -> Result<(), Box<dyn std::error::Error>> {
//! let registry: InMemoryRegistry = [DocType::new("Note")
//! 	.with_field(DocField::new("title", "Data").with_length(140).required())]
//! .into_iter()
//! .collect();
//!
//! let engine = SchemaComparisonEngine::new(Arc::new(registry), db);
//! let diff = engine.compare_schema("Note", None, None).await?;
//!
//! if !diff.is_empty() {
//! 	let validation = docsync::migrations::analyzer::validate_schema_diff(&diff);
//! 	println!("valid: {}, warnings: {:?}", validation.valid, validation.warnings);
//! }
//! # Ok(())
//! # }
//! ```

pub use docsync_db::{backends, migrations};

#[cfg(feature = "test-utils")]
pub use docsync_test as test;

pub use docsync_db::backends::{Database, DatabaseError, IsolationLevel, TransactionOptions};
#[cfg(feature = "sqlite")]
pub use docsync_db::backends::SqliteDatabase;
pub use docsync_db::migrations::{
	ComparisonOptions, DocField, DocIndex, DocType, DocTypeRegistry, ExecutionError,
	ExecutionOptions, ExecutionResult, InMemoryRegistry, Migration, MigrationConfig,
	MigrationExecutor, MigrationValidator, SchemaComparisonEngine, SchemaComparisonError,
	SchemaDiff,
};

/// Commonly used types
pub mod prelude {
	pub use crate::{
		ComparisonOptions, Database, DatabaseError, DocField, DocIndex, DocType, DocTypeRegistry,
		ExecutionError, ExecutionOptions, ExecutionResult, InMemoryRegistry, Migration,
		MigrationConfig, MigrationExecutor, MigrationValidator, SchemaComparisonEngine,
		SchemaComparisonError, SchemaDiff,
	};

	#[cfg(feature = "sqlite")]
	pub use crate::SqliteDatabase;
}
