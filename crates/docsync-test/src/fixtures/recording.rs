//! Scripted in-memory database
//!
//! [`RecordingDatabase`] serves table structure from fixtures, records every
//! call in order, and fails `run` for statements containing a configured
//! fragment. It does not interpret SQL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docsync_db::backends::{
	ColumnInfo, Database, DatabaseError, IndexInfo, IsolationLevel, Result, RunResult,
	Transaction, TransactionOptions,
};
use parking_lot::{Mutex, RwLock};
use rstest::*;

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbCall {
	GetColumns(String),
	GetIndexes(String),
	Begin(Option<IsolationLevel>),
	Commit,
	Rollback,
	Savepoint(String),
	ReleaseSavepoint(String),
	RollbackToSavepoint(String),
	Run(String),
	QueryCount(String),
}

#[derive(Default)]
pub struct RecordingDatabase {
	tables: RwLock<HashMap<String, (Vec<ColumnInfo>, Vec<IndexInfo>)>>,
	failing_fragments: RwLock<Vec<String>>,
	calls: Mutex<Vec<DbCall>>,
	fail_rollback: AtomicBool,
	fail_introspection: AtomicBool,
	row_count: AtomicU64,
	run_delay: RwLock<Option<Duration>>,
	introspection_delay: RwLock<Option<Duration>>,
	in_flight: AtomicUsize,
	peak_in_flight: AtomicUsize,
}

impl RecordingDatabase {
	pub fn new() -> Self {
		Self::default()
	}

	/// Serve `columns` and `indexes` for `table`
	pub fn with_table(self, table: impl Into<String>, columns: Vec<ColumnInfo>, indexes: Vec<IndexInfo>) -> Self {
		self.set_table(table, columns, indexes);
		self
	}

	/// Replace the structure served for `table`
	pub fn set_table(&self, table: impl Into<String>, columns: Vec<ColumnInfo>, indexes: Vec<IndexInfo>) {
		self.tables.write().insert(table.into(), (columns, indexes));
	}

	/// Fail every statement containing `fragment`
	pub fn fail_on(self, fragment: impl Into<String>) -> Self {
		self.failing_fragments.write().push(fragment.into());
		self
	}

	/// Make transaction rollback fail
	pub fn fail_rollback(self) -> Self {
		self.fail_rollback.store(true, Ordering::SeqCst);
		self
	}

	/// Fail introspection with a connection error
	pub fn fail_introspection(self) -> Self {
		self.fail_introspection.store(true, Ordering::SeqCst);
		self
	}

	/// Value returned by every `query_count`
	pub fn with_row_count(self, count: u64) -> Self {
		self.row_count.store(count, Ordering::SeqCst);
		self
	}

	/// Delay every `run` call
	pub fn with_run_delay(self, delay: Duration) -> Self {
		*self.run_delay.write() = Some(delay);
		self
	}

	/// Delay every `get_columns` call
	pub fn with_introspection_delay(self, delay: Duration) -> Self {
		*self.introspection_delay.write() = Some(delay);
		self
	}

	/// Most `get_columns` calls that were running at the same time
	pub fn peak_concurrent_introspections(&self) -> usize {
		self.peak_in_flight.load(Ordering::SeqCst)
	}

	pub fn calls(&self) -> Vec<DbCall> {
		self.calls.lock().clone()
	}

	pub fn clear_calls(&self) {
		self.calls.lock().clear();
	}

	/// Statements passed to `run`, in call order
	pub fn statements(&self) -> Vec<String> {
		self.calls
			.lock()
			.iter()
			.filter_map(|call| match call {
				DbCall::Run(sql) => Some(sql.clone()),
				_ => None,
			})
			.collect()
	}

	pub fn run_count(&self) -> usize {
		self.count(|call| matches!(call, DbCall::Run(_)))
	}

	/// `get_columns` calls made for `table`
	pub fn introspection_count(&self, table: &str) -> usize {
		self.count(|call| matches!(call, DbCall::GetColumns(t) if t == table))
	}

	pub fn count(&self, predicate: impl Fn(&DbCall) -> bool) -> usize {
		self.calls.lock().iter().filter(|call| predicate(call)).count()
	}

	fn record(&self, call: DbCall) {
		self.calls.lock().push(call);
	}

	fn table(&self, table: &str) -> Result<(Vec<ColumnInfo>, Vec<IndexInfo>)> {
		if self.fail_introspection.load(Ordering::SeqCst) {
			return Err(DatabaseError::Connection("connection reset".to_string()));
		}
		self.tables
			.read()
			.get(table)
			.cloned()
			.ok_or_else(|| DatabaseError::TableNotFound(table.to_string()))
	}
}

#[async_trait]
impl Database for RecordingDatabase {
	async fn get_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
		self.record(DbCall::GetColumns(table.to_string()));
		let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
		let delay = *self.introspection_delay.read();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		self.in_flight.fetch_sub(1, Ordering::SeqCst);
		self.table(table).map(|(columns, _)| columns)
	}

	async fn get_indexes(&self, table: &str) -> Result<Vec<IndexInfo>> {
		self.record(DbCall::GetIndexes(table.to_string()));
		self.table(table).map(|(_, indexes)| indexes)
	}

	async fn begin(&self, options: &TransactionOptions) -> Result<Transaction> {
		self.record(DbCall::Begin(options.isolation_level));
		Ok(Transaction::new(options))
	}

	async fn commit(&self, _tx: &Transaction) -> Result<()> {
		self.record(DbCall::Commit);
		Ok(())
	}

	async fn rollback(&self, _tx: &Transaction) -> Result<()> {
		self.record(DbCall::Rollback);
		if self.fail_rollback.load(Ordering::SeqCst) {
			return Err(DatabaseError::Transaction("rollback refused".to_string()));
		}
		Ok(())
	}

	async fn savepoint(&self, _tx: &Transaction, name: &str) -> Result<()> {
		self.record(DbCall::Savepoint(name.to_string()));
		Ok(())
	}

	async fn release_savepoint(&self, _tx: &Transaction, name: &str) -> Result<()> {
		self.record(DbCall::ReleaseSavepoint(name.to_string()));
		Ok(())
	}

	async fn rollback_to_savepoint(&self, _tx: &Transaction, name: &str) -> Result<()> {
		self.record(DbCall::RollbackToSavepoint(name.to_string()));
		Ok(())
	}

	async fn run(&self, sql: &str) -> Result<RunResult> {
		self.record(DbCall::Run(sql.to_string()));
		let delay = *self.run_delay.read();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		let failing = self
			.failing_fragments
			.read()
			.iter()
			.any(|fragment| sql.contains(fragment.as_str()));
		if failing {
			return Err(DatabaseError::Query(format!("statement rejected: {}", sql)));
		}
		Ok(RunResult::with_changes(1))
	}

	async fn query_count(&self, sql: &str) -> Result<u64> {
		self.record(DbCall::QueryCount(sql.to_string()));
		Ok(self.row_count.load(Ordering::SeqCst))
	}
}

/// Fixture providing an empty recording database
#[fixture]
pub fn recording_database() -> RecordingDatabase {
	RecordingDatabase::new()
}
