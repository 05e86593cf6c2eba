//! Integration tests for migration execution
//!
//! This test file verifies the integration between:
//! - MigrationExecutor statement loop
//! - Transactions and per-statement savepoints
//! - Migration lifecycle (pending, applied, failed)
//!
//! ## Testing Strategy
//!
//! `RecordingDatabase` records every call so tests can assert the exact
//! transaction protocol; `MockDatabase` verifies call counts.

use std::sync::Arc;
use std::time::Duration;

use docsync_db::backends::{
	DatabaseError, IsolationLevel, RunResult, Transaction, TransactionOptions,
};
use docsync_db::migrations::{
	ColumnChange, ColumnDefinition, ExecutionError, ExecutionOptions, Migration,
	MigrationExecutor, MigrationStateError, MigrationStatus, SchemaDiff,
};
use docsync_test::fixtures::*;
use docsync_test::init_test_logging;
use rstest::*;

// ========================================
// Helpers
// ========================================

fn statements(sql: &[&str]) -> Vec<String> {
	sql.iter().map(|s| s.to_string()).collect()
}

fn three_statements_second_failing() -> Vec<String> {
	statements(&[
		r#"ALTER TABLE "tabUser" ADD COLUMN "a" text"#,
		r#"ALTER TABLE "tabUser" ADD COLUMN "FAIL" text"#,
		r#"ALTER TABLE "tabUser" ADD COLUMN "c" text"#,
	])
}

fn executor(database: RecordingDatabase) -> (MigrationExecutor, Arc<RecordingDatabase>) {
	init_test_logging();
	let database = Arc::new(database);
	(MigrationExecutor::new(database.clone()), database)
}

fn add_column_migration(sql: Vec<String>) -> Migration {
	let mut diff = SchemaDiff::new();
	diff.added_columns
		.push(ColumnChange::added(ColumnDefinition::new("nickname", "text")));
	Migration::new(
		"User",
		"tabUser",
		diff,
		sql,
		r#"ALTER TABLE "tabUser" DROP COLUMN "nickname""#,
	)
}

// ========================================
// Statement Loop
// ========================================

/// Test Intent: Verify all statements commit with one released savepoint each
/// Integration Point: MigrationExecutor ↔ Database transaction protocol
#[rstest]
#[tokio::test]
async fn test_successful_execution_commits() {
	let (executor, db) = executor(RecordingDatabase::new());

	let result = executor
		.execute_migration_sql(&statements(&["SELECT 1", "SELECT 2"]), None)
		.await
		.unwrap();

	assert!(result.success);
	assert_eq!(result.affected_rows, 2);
	assert!(result.errors.is_empty());
	assert!(result.warnings.is_empty());
	let names: Vec<_> = result.savepoints.iter().map(|s| s.name.as_str()).collect();
	assert_eq!(names, vec!["sp_0", "sp_1"]);
	assert!(result.savepoints.iter().all(|s| !s.active));

	assert_eq!(
		db.calls(),
		vec![
			DbCall::Begin(None),
			DbCall::Savepoint("sp_0".to_string()),
			DbCall::Run("SELECT 1".to_string()),
			DbCall::ReleaseSavepoint("sp_0".to_string()),
			DbCall::Savepoint("sp_1".to_string()),
			DbCall::Run("SELECT 2".to_string()),
			DbCall::ReleaseSavepoint("sp_1".to_string()),
			DbCall::Commit,
		]
	);
}

/// Test Intent: Verify the first failure aborts, rolls back and skips the remaining statements
/// Integration Point: MigrationExecutor ↔ savepoint rollback ↔ transaction rollback
#[rstest]
#[tokio::test]
async fn test_failure_aborts_without_continue_on_error() {
	let (executor, db) = executor(RecordingDatabase::new().fail_on("FAIL"));
	let sql = three_statements_second_failing();

	let err = executor.execute_migration_sql(&sql, None).await.unwrap_err();

	let ExecutionError::MigrationAborted {
		statement, result, ..
	} = err
	else {
		panic!("expected an aborted migration");
	};
	assert_eq!(statement, 2);
	assert!(!result.success);
	assert_eq!(result.warnings.len(), 1);
	assert!(result.warnings[0].contains("sp_1"));
	assert_eq!(result.errors.len(), 1);

	assert_eq!(db.run_count(), 2);
	assert_eq!(db.statements(), sql[..2].to_vec());
	assert_eq!(
		db.calls()[5..].to_vec(),
		vec![
			DbCall::Run(sql[1].clone()),
			DbCall::RollbackToSavepoint("sp_1".to_string()),
			DbCall::ReleaseSavepoint("sp_1".to_string()),
			DbCall::Rollback,
		]
	);
	assert_eq!(db.count(|c| matches!(c, DbCall::Commit)), 0);
}

/// Test Intent: Verify the third statement never runs, counted on a mockall stub
/// Integration Point: MigrationExecutor ↔ MockDatabase run expectations
#[rstest]
#[tokio::test]
async fn test_abort_call_count_on_mock(mut mock_database: MockDatabase) {
	init_test_logging();
	mock_database
		.expect_run()
		.times(2)
		.returning(|sql| {
			if sql.contains("FAIL") {
				Err(DatabaseError::Query("no such column".to_string()))
			} else {
				Ok(RunResult::with_changes(0))
			}
		});
	let executor = MigrationExecutor::new(Arc::new(mock_database));

	let err = executor
		.execute_migration_sql(&three_statements_second_failing(), None)
		.await
		.unwrap_err();

	let result = err.partial_result().unwrap();
	assert!(!result.success);
	assert_eq!(result.warnings.len(), 1);
}

/// Test Intent: Verify continue_on_error runs every statement and commits
/// Integration Point: MigrationExecutor ↔ ExecutionOptions
#[rstest]
#[tokio::test]
async fn test_continue_on_error_runs_everything() {
	let (executor, db) = executor(RecordingDatabase::new().fail_on("FAIL"));
	let options = ExecutionOptions::new().with_continue_on_error(true);

	let result = executor
		.execute_migration_sql(&three_statements_second_failing(), Some(&options))
		.await
		.unwrap();

	assert!(!result.success);
	assert_eq!(result.errors.len(), 1);
	assert!(result.errors[0].starts_with("Statement 2 failed"));
	assert_eq!(result.warnings.len(), 1);
	assert_eq!(result.affected_rows, 2);
	assert_eq!(db.run_count(), 3);
	assert_eq!(db.calls().last(), Some(&DbCall::Commit));
}

/// Test Intent: Verify execution without savepoints issues no savepoint calls
/// Integration Point: MigrationExecutor ↔ ExecutionOptions::use_savepoints
#[rstest]
#[tokio::test]
async fn test_execution_without_savepoints() {
	let (executor, db) = executor(RecordingDatabase::new().fail_on("FAIL"));
	let options = ExecutionOptions::new().with_savepoints(false);

	let err = executor
		.execute_migration_sql(&three_statements_second_failing(), Some(&options))
		.await
		.unwrap_err();

	let result = err.partial_result().unwrap();
	assert!(result.warnings.is_empty());
	assert!(result.savepoints.is_empty());
	assert_eq!(
		db.calls(),
		vec![
			DbCall::Begin(None),
			DbCall::Run(three_statements_second_failing()[0].clone()),
			DbCall::Run(three_statements_second_failing()[1].clone()),
			DbCall::Rollback,
		]
	);
}

/// Test Intent: Verify blank statements are skipped and savepoints keep statement indexes
/// Integration Point: MigrationExecutor statement loop
#[rstest]
#[tokio::test]
async fn test_blank_statements_are_skipped() {
	let (executor, db) = executor(RecordingDatabase::new());

	let result = executor
		.execute_migration_sql(&statements(&["", "   ", "SELECT 1"]), None)
		.await
		.unwrap();

	assert!(result.success);
	assert_eq!(db.run_count(), 1);
	assert_eq!(result.savepoints.len(), 1);
	assert_eq!(result.savepoints[0].name, "sp_2");
}

/// Test Intent: Verify rollback SQL runs serializable with savepoints forced on
/// Integration Point: MigrationExecutor::execute_rollback_sql ↔ TransactionOptions
#[rstest]
#[tokio::test]
async fn test_rollback_sql_is_serializable() {
	let (executor, db) = executor(RecordingDatabase::new());
	let options = ExecutionOptions::new().with_savepoints(false);

	let result = executor
		.execute_rollback_sql(&statements(&[r#"ALTER TABLE "tabUser" DROP COLUMN "age""#]), Some(&options))
		.await
		.unwrap();

	assert!(result.success);
	assert_eq!(db.calls()[0], DbCall::Begin(Some(IsolationLevel::Serializable)));
	assert_eq!(db.count(|c| matches!(c, DbCall::Savepoint(_))), 1);
	assert_eq!(executor.metrics().rollbacks_executed, 1);
}

// ========================================
// Timeouts and Rollback Failures
// ========================================

/// Test Intent: Verify a statement exceeding its timeout aborts the migration
/// Integration Point: MigrationExecutor ↔ tokio::time::timeout
#[rstest]
#[tokio::test]
async fn test_statement_timeout_aborts() {
	let (executor, db) = executor(RecordingDatabase::new().with_run_delay(Duration::from_millis(500)));
	let options = ExecutionOptions::new().with_statement_timeout(Duration::from_millis(20));

	let err = executor
		.execute_migration_sql(&statements(&["SELECT 1", "SELECT 2"]), Some(&options))
		.await
		.unwrap_err();

	match &err {
		ExecutionError::MigrationAborted { statement, message, .. } => {
			assert_eq!(*statement, 1);
			assert!(message.contains("timed out"));
		}
		other => panic!("expected an aborted migration, got {:?}", other),
	}
	assert_eq!(db.run_count(), 1);
}

/// Test Intent: Verify execute_with_timeout reports the elapsed bound
/// Integration Point: MigrationExecutor::execute_with_timeout
#[rstest]
#[tokio::test]
async fn test_execute_with_timeout() {
	let (slow, _db) = executor(RecordingDatabase::new().with_run_delay(Duration::from_millis(500)));

	let err = slow
		.execute_with_timeout("SELECT 1", Duration::from_millis(10))
		.await
		.unwrap_err();
	assert!(matches!(err, ExecutionError::Timeout(d) if d == Duration::from_millis(10)));

	let (fast, _db) = executor(RecordingDatabase::new());
	let run = fast
		.execute_with_timeout("SELECT 1", Duration::from_secs(5))
		.await
		.unwrap();
	assert_eq!(run.changes, Some(1));
}

/// Test Intent: Verify a failing transaction rollback is attached to the abort
/// Integration Point: MigrationExecutor::execute_in_transaction error path
#[rstest]
#[tokio::test]
async fn test_rollback_failure_is_reported() {
	let (executor, _db) = executor(RecordingDatabase::new().fail_on("FAIL").fail_rollback());

	let err = executor
		.execute_migration_sql(&three_statements_second_failing(), None)
		.await
		.unwrap_err();

	let result = err.partial_result().unwrap();
	assert_eq!(result.errors.len(), 2);
	assert!(result.errors[1].contains("rollback refused"));
}

// ========================================
// Savepoints
// ========================================

/// Test Intent: Verify savepoint names are validated and savepoints cannot be reused
/// Integration Point: MigrationExecutor savepoint API
#[rstest]
#[tokio::test]
async fn test_savepoint_lifecycle() {
	let (executor, db) = executor(RecordingDatabase::new());
	let tx = Transaction::new(&TransactionOptions::new());

	let err = executor.create_savepoint(&tx, "1; DROP TABLE x").await.unwrap_err();
	assert!(matches!(err, ExecutionError::InvalidSavepoint { .. }));
	assert_eq!(db.count(|c| matches!(c, DbCall::Savepoint(_))), 0);

	let mut savepoint = executor.create_savepoint(&tx, "before_backfill").await.unwrap();
	assert!(savepoint.active);
	executor.rollback_to_savepoint(&tx, &mut savepoint).await.unwrap();
	assert!(!savepoint.active);

	let err = executor.release_savepoint(&tx, &mut savepoint).await.unwrap_err();
	assert!(matches!(err, ExecutionError::SavepointNotActive(ref name) if name == "before_backfill"));
}

// ========================================
// Migration Lifecycle and Metrics
// ========================================

/// Test Intent: Verify a migration is applied once and cannot be applied again
/// Integration Point: MigrationExecutor::apply_migration ↔ Migration state
#[rstest]
#[tokio::test]
async fn test_apply_migration_success() {
	let (executor, _db) = executor(RecordingDatabase::new());
	let mut migration = add_column_migration(statements(&[
		r#"ALTER TABLE "tabUser" ADD COLUMN "nickname" text"#,
	]));

	let result = executor.apply_migration(&mut migration).await.unwrap();
	assert!(result.success);
	assert_eq!(migration.status(), MigrationStatus::Applied);

	let err = executor.apply_migration(&mut migration).await.unwrap_err();
	assert!(matches!(err, ExecutionError::State(MigrationStateError::AlreadyApplied(id)) if id == migration.id));
}

/// Test Intent: Verify a failed migration records its error and becomes terminal
/// Integration Point: MigrationExecutor::apply_migration ↔ Migration state
#[rstest]
#[tokio::test]
async fn test_apply_migration_failure() {
	let (executor, db) = executor(RecordingDatabase::new().fail_on("FAIL"));
	let mut migration = add_column_migration(three_statements_second_failing());

	let err = executor.apply_migration(&mut migration).await.unwrap_err();
	assert!(matches!(err, ExecutionError::MigrationAborted { .. }));
	assert_eq!(migration.status(), MigrationStatus::Failed);
	assert!(migration.error.as_deref().unwrap_or_default().contains("statement 2"));

	db.clear_calls();
	assert!(executor.apply_migration(&mut migration).await.is_err());
	assert_eq!(db.run_count(), 0);
}

/// Test Intent: Verify executor counters accumulate and reset
/// Integration Point: MigrationExecutor ↔ ExecutionMetrics
#[rstest]
#[tokio::test]
async fn test_metrics_accumulate() {
	let (executor, _db) = executor(RecordingDatabase::new().fail_on("FAIL"));

	let _ = executor
		.execute_migration_sql(&three_statements_second_failing(), None)
		.await;

	let metrics = executor.metrics();
	assert_eq!(metrics.statements_executed, 1);
	assert_eq!(metrics.statements_failed, 1);
	assert_eq!(metrics.savepoints_created, 2);
	assert_eq!(metrics.savepoints_rolled_back, 1);
	assert_eq!(metrics.migrations_executed, 1);

	executor.reset_metrics();
	assert_eq!(executor.metrics().statements_executed, 0);
}
