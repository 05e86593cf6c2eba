//! # docsync database layer
//!
//! Reconciles declarative DocType schemas with the tables that store them.
//!
//! ## Modules
//!
//! - [`backends`]: the narrow [`Database`](backends::Database) capability and
//!   its SQLite implementation
//! - [`migrations`]: schema comparison, diff analysis, validation and
//!   transactional execution
//!
//! ## Feature flags
//!
//! - `sqlite` (default): [`SqliteDatabase`](backends::SqliteDatabase) backed by sqlx

pub mod backends;
pub mod migrations;

pub use backends::{Database, DatabaseError};
pub use migrations::{
	MigrationExecutor, MigrationValidator, SchemaComparisonEngine, SchemaComparisonError, SchemaDiff,
};
