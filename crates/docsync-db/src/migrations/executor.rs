//! Migration executor
//!
//! Runs migration and rollback SQL inside one transaction on the exclusive
//! connection. Each statement can be wrapped in its own savepoint so that a
//! failing statement is undone without discarding the ones before it.
//!
//! Statements run strictly in order: a statement is awaited before the next
//! one is issued. Cancellation happens only between statements.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::config::ExecutionConfig;
use super::migration::{Migration, MigrationStateError};
use crate::backends::{
	Database, DatabaseError, IsolationLevel, RunResult, Transaction, TransactionOptions,
};

/// Errors raised by [`MigrationExecutor`]
#[derive(Debug, Error)]
pub enum ExecutionError {
	#[error("Transaction failed: {message}{}", rollback_suffix(.rollback_error))]
	TransactionFailed {
		message: String,
		rollback_error: Option<String>,
	},

	/// The first failing statement stopped the migration; the transaction was rolled back.
	#[error("Migration aborted at statement {statement}: {message}")]
	MigrationAborted {
		statement: usize,
		message: String,
		result: Box<ExecutionResult>,
	},

	#[error("Invalid savepoint name '{name}': {reason}")]
	InvalidSavepoint { name: String, reason: String },

	#[error("Savepoint '{0}' is no longer active")]
	SavepointNotActive(String),

	#[error("Statement timed out after {0:?}")]
	Timeout(Duration),

	#[error(transparent)]
	Database(#[from] DatabaseError),

	#[error(transparent)]
	State(#[from] MigrationStateError),
}

fn rollback_suffix(rollback_error: &Option<String>) -> String {
	rollback_error
		.as_ref()
		.map(|e| format!(" (rollback also failed: {})", e))
		.unwrap_or_default()
}

impl ExecutionError {
	/// Result collected before an aborted migration stopped
	pub fn partial_result(&self) -> Option<&ExecutionResult> {
		match self {
			ExecutionError::MigrationAborted { result, .. } => Some(&**result),
			_ => None,
		}
	}

	/// Wrap an error raised inside a transaction, keeping a rollback failure visible
	fn into_transaction_failure(self, rollback_error: Option<String>) -> Self {
		match self {
			ExecutionError::MigrationAborted {
				statement,
				message,
				mut result,
			} => {
				if let Some(rollback_error) = rollback_error {
					result
						.errors
						.push(format!("Transaction rollback failed: {}", rollback_error));
				}
				ExecutionError::MigrationAborted {
					statement,
					message,
					result,
				}
			}
			ExecutionError::TransactionFailed {
				message,
				rollback_error: earlier,
			} => ExecutionError::TransactionFailed {
				message,
				rollback_error: rollback_error.or(earlier),
			},
			other => ExecutionError::TransactionFailed {
				message: other.to_string(),
				rollback_error,
			},
		}
	}
}

pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Validate a savepoint name
///
/// Only alphanumeric characters and underscores are allowed, and the name
/// must not start with a digit.
pub fn validate_savepoint_name(name: &str) -> std::result::Result<(), String> {
	if name.is_empty() {
		return Err("Savepoint name cannot be empty".to_string());
	}

	if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
		return Err(
			"Only alphanumeric characters and underscores are allowed".to_string(),
		);
	}

	if name.starts_with(|c: char| c.is_ascii_digit()) {
		return Err("Savepoint name cannot start with a number".to_string());
	}

	Ok(())
}

/// A named rollback point inside the migration transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Savepoint {
	pub name: String,
	pub created_at: DateTime<Utc>,
	/// Cleared once the savepoint is released or rolled back to
	pub active: bool,
}

impl Savepoint {
	fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			created_at: Utc::now(),
			active: true,
		}
	}
}

/// Outcome of executing a statement list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
	pub success: bool,
	pub affected_rows: u64,
	pub execution_time: Duration,
	pub warnings: Vec<String>,
	pub errors: Vec<String>,
	/// Every savepoint created, in creation order
	pub savepoints: Vec<Savepoint>,
}

/// Options of a single execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
	pub use_savepoints: bool,
	pub continue_on_error: bool,
	pub savepoint_prefix: String,
	/// Bound applied to every statement
	pub statement_timeout: Option<Duration>,
	pub isolation_level: Option<IsolationLevel>,
}

impl Default for ExecutionOptions {
	fn default() -> Self {
		Self::from(&ExecutionConfig::default())
	}
}

impl From<&ExecutionConfig> for ExecutionOptions {
	fn from(config: &ExecutionConfig) -> Self {
		Self {
			use_savepoints: config.use_savepoints,
			continue_on_error: config.continue_on_error,
			savepoint_prefix: config.savepoint_prefix.clone(),
			statement_timeout: config.statement_timeout_ms.map(Duration::from_millis),
			isolation_level: config.isolation_level,
		}
	}
}

impl ExecutionOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_savepoints(mut self, use_savepoints: bool) -> Self {
		self.use_savepoints = use_savepoints;
		self
	}

	pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
		self.continue_on_error = continue_on_error;
		self
	}

	pub fn with_savepoint_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.savepoint_prefix = prefix.into();
		self
	}

	pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
		self.statement_timeout = Some(timeout);
		self
	}

	pub fn with_isolation_level(mut self, level: IsolationLevel) -> Self {
		self.isolation_level = Some(level);
		self
	}

	fn transaction_options(&self) -> TransactionOptions {
		TransactionOptions {
			isolation_level: self.isolation_level,
		}
	}
}

/// Cumulative executor counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
	pub statements_executed: u64,
	pub statements_failed: u64,
	pub savepoints_created: u64,
	pub savepoints_rolled_back: u64,
	pub migrations_executed: u64,
	pub rollbacks_executed: u64,
	pub total_execution_time: Duration,
}

/// Executes migration SQL transactionally
pub struct MigrationExecutor {
	database: Arc<dyn Database>,
	options: ExecutionOptions,
	metrics: Mutex<ExecutionMetrics>,
}

impl MigrationExecutor {
	pub fn new(database: Arc<dyn Database>) -> Self {
		Self::with_options(database, ExecutionOptions::default())
	}

	/// Executor whose calls default to `options`
	pub fn with_options(database: Arc<dyn Database>, options: ExecutionOptions) -> Self {
		Self {
			database,
			options,
			metrics: Mutex::new(ExecutionMetrics::default()),
		}
	}

	pub fn options(&self) -> &ExecutionOptions {
		&self.options
	}

	pub fn metrics(&self) -> ExecutionMetrics {
		self.metrics.lock().clone()
	}

	pub fn reset_metrics(&self) {
		*self.metrics.lock() = ExecutionMetrics::default();
	}

	/// Run `f` inside a transaction
	///
	/// Commits when `f` succeeds. When `f` fails the transaction is rolled
	/// back and the error is returned wrapped; a failing rollback is attached
	/// to that error.
	pub async fn execute_in_transaction<F, Fut, T>(&self, options: &TransactionOptions, f: F) -> Result<T>
	where
		F: FnOnce(Transaction) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let tx = self
			.database
			.begin(options)
			.await
			.map_err(|e| ExecutionError::TransactionFailed {
				message: format!("could not begin transaction: {}", e),
				rollback_error: None,
			})?;
		debug!(transaction = %tx.id, "transaction started");

		match f(tx.clone()).await {
			Ok(value) => {
				if let Err(e) = self.database.commit(&tx).await {
					let rollback_error = self.database.rollback(&tx).await.err().map(|e| e.to_string());
					return Err(ExecutionError::TransactionFailed {
						message: format!("commit failed: {}", e),
						rollback_error,
					});
				}
				debug!(transaction = %tx.id, "transaction committed");
				Ok(value)
			}
			Err(e) => {
				let rollback_error = match self.database.rollback(&tx).await {
					Ok(()) => {
						warn!(transaction = %tx.id, error = %e, "transaction rolled back");
						None
					}
					Err(rollback) => {
						error!(transaction = %tx.id, error = %e, rollback_error = %rollback, "transaction rollback failed");
						Some(rollback.to_string())
					}
				};
				Err(e.into_transaction_failure(rollback_error))
			}
		}
	}

	/// Execute migration statements in order
	///
	/// With `continue_on_error` the transaction is committed after the loop
	/// even if statements failed, and `success` reports whether any did.
	/// Otherwise the first failure rolls back the whole transaction and is
	/// returned as [`ExecutionError::MigrationAborted`] carrying the partial
	/// result.
	pub async fn execute_migration_sql(
		&self,
		statements: &[String],
		options: Option<&ExecutionOptions>,
	) -> Result<ExecutionResult> {
		let options = options.unwrap_or(&self.options);
		info!(statements = statements.len(), "executing migration SQL");
		let outcome = self.run_statements(statements, options).await;
		self.metrics.lock().migrations_executed += 1;
		outcome
	}

	/// Execute rollback statements in order
	///
	/// Always runs under `SERIALIZABLE` isolation with a savepoint per statement.
	pub async fn execute_rollback_sql(
		&self,
		statements: &[String],
		options: Option<&ExecutionOptions>,
	) -> Result<ExecutionResult> {
		let options = options
			.unwrap_or(&self.options)
			.clone()
			.with_savepoints(true)
			.with_isolation_level(IsolationLevel::Serializable);
		info!(statements = statements.len(), "executing rollback SQL");
		let outcome = self.run_statements(statements, &options).await;
		self.metrics.lock().rollbacks_executed += 1;
		outcome
	}

	/// Execute a migration and move it into its terminal state
	pub async fn apply_migration(&self, migration: &mut Migration) -> Result<ExecutionResult> {
		migration.ensure_pending()?;
		let statements = migration.sql.statements().to_vec();

		match self.execute_migration_sql(&statements, None).await {
			Ok(result) if result.success => {
				migration.mark_applied()?;
				info!(migration = %migration.id, doctype = %migration.doctype, "migration applied");
				Ok(result)
			}
			Ok(result) => {
				migration.mark_failed(result.errors.join("; "))?;
				warn!(migration = %migration.id, doctype = %migration.doctype, "migration applied with errors");
				Ok(result)
			}
			Err(e) => {
				migration.mark_failed(e.to_string())?;
				error!(migration = %migration.id, doctype = %migration.doctype, error = %e, "migration failed");
				Err(e)
			}
		}
	}

	async fn run_statements(&self, statements: &[String], options: &ExecutionOptions) -> Result<ExecutionResult> {
		let started = Instant::now();
		let outcome = self
			.execute_in_transaction(&options.transaction_options(), |tx| async move {
				self.run_statement_loop(&tx, statements, options).await
			})
			.await;
		let elapsed = started.elapsed();
		self.metrics.lock().total_execution_time += elapsed;

		match outcome {
			Ok(mut result) => {
				result.execution_time = elapsed;
				Ok(result)
			}
			Err(ExecutionError::MigrationAborted {
				statement,
				message,
				mut result,
			}) => {
				result.execution_time = elapsed;
				Err(ExecutionError::MigrationAborted {
					statement,
					message,
					result,
				})
			}
			Err(e) => Err(e),
		}
	}

	async fn run_statement_loop(
		&self,
		tx: &Transaction,
		statements: &[String],
		options: &ExecutionOptions,
	) -> Result<ExecutionResult> {
		let mut result = ExecutionResult::default();
		// Only the most recent active savepoint is a valid rollback target
		let mut stack: Vec<Savepoint> = Vec::new();

		for (index, statement) in statements.iter().enumerate() {
			if statement.trim().is_empty() {
				debug!(statement = index, "skipping empty statement");
				continue;
			}

			if options.use_savepoints {
				let name = format!("{}_{}", options.savepoint_prefix, index);
				stack.push(self.create_savepoint(tx, &name).await?);
			}

			match self.run_statement(statement, options.statement_timeout).await {
				Ok(run) => {
					result.affected_rows += run.changes.unwrap_or(0);
					self.metrics.lock().statements_executed += 1;
					if let Some(mut savepoint) = stack.pop() {
						self.release_savepoint(tx, &mut savepoint).await?;
						result.savepoints.push(savepoint);
					}
				}
				Err(e) => {
					self.metrics.lock().statements_failed += 1;
					error!(statement = index, error = %e, "migration statement failed");
					result
						.errors
						.push(format!("Statement {} failed: {}", index + 1, e));

					if let Some(mut savepoint) = stack.pop() {
						self.rollback_to_savepoint(tx, &mut savepoint).await?;
						self.database.release_savepoint(tx, &savepoint.name).await?;
						result.warnings.push(format!(
							"Rolled back to savepoint {} after statement {} failed",
							savepoint.name,
							index + 1
						));
						result.savepoints.push(savepoint);
					}

					if !options.continue_on_error {
						return Err(ExecutionError::MigrationAborted {
							statement: index + 1,
							message: e.to_string(),
							result: Box::new(result),
						});
					}
				}
			}
		}

		result.success = result.errors.is_empty();
		Ok(result)
	}

	async fn run_statement(&self, sql: &str, timeout: Option<Duration>) -> Result<RunResult> {
		match timeout {
			Some(timeout) => self.execute_with_timeout(sql, timeout).await,
			None => Ok(self.database.run(sql).await?),
		}
	}

	/// Run one statement, giving up after `timeout`
	///
	/// The statement is not interrupted on the database side; the caller
	/// stops waiting for it.
	pub async fn execute_with_timeout(&self, sql: &str, timeout: Duration) -> Result<RunResult> {
		match tokio::time::timeout(timeout, self.database.run(sql)).await {
			Ok(outcome) => Ok(outcome?),
			Err(_) => {
				warn!(timeout_ms = timeout.as_millis() as u64, "statement timed out");
				Err(ExecutionError::Timeout(timeout))
			}
		}
	}

	/// Create a savepoint inside `tx`
	pub async fn create_savepoint(&self, tx: &Transaction, name: &str) -> Result<Savepoint> {
		validate_savepoint_name(name).map_err(|reason| ExecutionError::InvalidSavepoint {
			name: name.to_string(),
			reason,
		})?;
		self.database.savepoint(tx, name).await?;
		self.metrics.lock().savepoints_created += 1;
		debug!(savepoint = name, "savepoint created");
		Ok(Savepoint::new(name))
	}

	/// Undo everything since `savepoint` and mark it inactive
	pub async fn rollback_to_savepoint(&self, tx: &Transaction, savepoint: &mut Savepoint) -> Result<()> {
		if !savepoint.active {
			return Err(ExecutionError::SavepointNotActive(savepoint.name.clone()));
		}
		self.database.rollback_to_savepoint(tx, &savepoint.name).await?;
		savepoint.active = false;
		self.metrics.lock().savepoints_rolled_back += 1;
		warn!(savepoint = %savepoint.name, "rolled back to savepoint");
		Ok(())
	}

	/// Release `savepoint` and mark it inactive
	pub async fn release_savepoint(&self, tx: &Transaction, savepoint: &mut Savepoint) -> Result<()> {
		if !savepoint.active {
			return Err(ExecutionError::SavepointNotActive(savepoint.name.clone()));
		}
		self.database.release_savepoint(tx, &savepoint.name).await?;
		savepoint.active = false;
		Ok(())
	}
}
