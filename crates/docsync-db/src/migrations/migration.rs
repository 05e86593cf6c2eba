//! Migration record and validation report
//!
//! A [`Migration`] is assembled once from a [`SchemaDiff`] plus the forward
//! and rollback SQL generated for it. It ends either applied or failed and is
//! never changed after reaching one of those states.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::analyzer;
use super::schema_diff::SchemaDiff;

/// Forward or rollback SQL of a migration
///
/// Statement order is execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MigrationSql {
	Single(String),
	Many(Vec<String>),
}

impl MigrationSql {
	/// Statements in execution order
	///
	/// # Examples
	///
	/// ```
	/// use docsync_db::migrations::MigrationSql;
	///
	/// let single = MigrationSql::from("ALTER TABLE t ADD COLUMN c text");
	/// assert_eq!(single.statements().len(), 1);
	///
	/// let many = MigrationSql::from(vec!["SELECT 1".to_string(), "SELECT 2".to_string()]);
	/// assert_eq!(many.statements()[1], "SELECT 2");
	/// ```
	pub fn statements(&self) -> &[String] {
		match self {
			MigrationSql::Single(statement) => std::slice::from_ref(statement),
			MigrationSql::Many(statements) => statements,
		}
	}

	pub fn len(&self) -> usize {
		self.statements().len()
	}

	pub fn is_empty(&self) -> bool {
		self.statements().iter().all(|s| s.trim().is_empty())
	}
}

impl Default for MigrationSql {
	fn default() -> Self {
		MigrationSql::Many(Vec::new())
	}
}

impl From<String> for MigrationSql {
	fn from(statement: String) -> Self {
		MigrationSql::Single(statement)
	}
}

impl From<&str> for MigrationSql {
	fn from(statement: &str) -> Self {
		MigrationSql::Single(statement.to_string())
	}
}

impl From<Vec<String>> for MigrationSql {
	fn from(statements: Vec<String>) -> Self {
		MigrationSql::Many(statements)
	}
}

/// Errors raised when a migration is moved out of a terminal state
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MigrationStateError {
	#[error("Migration {0} is already applied")]
	AlreadyApplied(Uuid),

	#[error("Migration {id} already failed: {error}")]
	AlreadyFailed { id: Uuid, error: String },
}

/// Lifecycle state of a [`Migration`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
	Pending,
	Applied,
	Failed,
}

/// A schema change ready for validation and execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
	pub id: Uuid,
	pub doctype: String,
	pub table_name: String,
	pub timestamp: DateTime<Utc>,
	pub diff: SchemaDiff,
	pub sql: MigrationSql,
	pub rollback_sql: MigrationSql,
	pub applied: bool,
	pub version: u32,
	pub destructive: bool,
	pub requires_backup: bool,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub error: Option<String>,
	/// Estimated execution time in seconds
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub estimated_time: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub metadata: Option<HashMap<String, Value>>,
}

impl Migration {
	/// Build a pending migration, deriving its risk flags from `diff`
	///
	/// # Examples
	///
	/// ```
	/// use docsync_db::migrations::{ColumnChange, ColumnDefinition, Migration, SchemaDiff};
	///
	/// let mut diff = SchemaDiff::new();
	/// diff.removed_columns.push(ColumnChange::removed(ColumnDefinition::new("legacy", "text")));
	///
	/// let migration = Migration::new(
	///     "User",
	///     "tabUser",
	///     diff,
	///     r#"ALTER TABLE "tabUser" DROP COLUMN "legacy""#,
	///     r#"ALTER TABLE "tabUser" ADD COLUMN "legacy" text"#,
	/// );
	/// assert!(migration.destructive);
	/// assert!(migration.requires_backup);
	/// assert!(!migration.applied);
	/// ```
	pub fn new(
		doctype: impl Into<String>,
		table_name: impl Into<String>,
		diff: SchemaDiff,
		sql: impl Into<MigrationSql>,
		rollback_sql: impl Into<MigrationSql>,
	) -> Self {
		let destructive = analyzer::has_destructive_changes(&diff);
		let requires_backup = destructive || analyzer::requires_data_migration(&diff);
		let estimated_time = analyzer::estimate_execution_time(&diff);

		Self {
			id: Uuid::new_v4(),
			doctype: doctype.into(),
			table_name: table_name.into(),
			timestamp: Utc::now(),
			diff,
			sql: sql.into(),
			rollback_sql: rollback_sql.into(),
			applied: false,
			version: 1,
			destructive,
			requires_backup,
			error: None,
			estimated_time: Some(estimated_time),
			metadata: None,
		}
	}

	pub fn with_version(mut self, version: u32) -> Self {
		self.version = version;
		self
	}

	pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.metadata
			.get_or_insert_with(HashMap::new)
			.insert(key.into(), value.into());
		self
	}

	pub fn status(&self) -> MigrationStatus {
		if self.applied {
			MigrationStatus::Applied
		} else if self.error.is_some() {
			MigrationStatus::Failed
		} else {
			MigrationStatus::Pending
		}
	}

	pub fn is_terminal(&self) -> bool {
		self.status() != MigrationStatus::Pending
	}

	pub fn ensure_pending(&self) -> Result<(), MigrationStateError> {
		match (&self.error, self.applied) {
			(_, true) => Err(MigrationStateError::AlreadyApplied(self.id)),
			(Some(error), false) => Err(MigrationStateError::AlreadyFailed {
				id: self.id,
				error: error.clone(),
			}),
			(None, false) => Ok(()),
		}
	}

	/// Record a successful execution
	pub fn mark_applied(&mut self) -> Result<(), MigrationStateError> {
		self.ensure_pending()?;
		self.applied = true;
		Ok(())
	}

	/// Record a failed execution
	pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), MigrationStateError> {
		self.ensure_pending()?;
		self.error = Some(error.into());
		Ok(())
	}
}

/// Scored validation report
///
/// `score` is a 0-100 confidence value. The report is `valid` exactly when
/// it carries no errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationValidation {
	pub valid: bool,
	pub errors: Vec<String>,
	pub warnings: Vec<String>,
	pub recommendations: Vec<String>,
	pub score: u32,
}

impl Default for MigrationValidation {
	fn default() -> Self {
		Self {
			valid: true,
			errors: Vec::new(),
			warnings: Vec::new(),
			recommendations: Vec::new(),
			score: 100,
		}
	}
}

impl MigrationValidation {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_error(&mut self, error: impl Into<String>) {
		self.errors.push(error.into());
		self.valid = false;
	}

	pub fn add_warning(&mut self, warning: impl Into<String>) {
		self.warnings.push(warning.into());
	}

	/// Add a recommendation unless an identical one is already present
	pub fn add_recommendation(&mut self, recommendation: impl Into<String>) {
		let recommendation = recommendation.into();
		if !self.recommendations.contains(&recommendation) {
			self.recommendations.push(recommendation);
		}
	}

	/// Lower the score, never below zero
	pub fn penalize(&mut self, points: u32) {
		self.score = self.score.saturating_sub(points);
	}
}
