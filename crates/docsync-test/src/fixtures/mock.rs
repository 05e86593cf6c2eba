use docsync_db::backends::{
	ColumnInfo, Database as DatabaseTrait, IndexInfo, Result, RunResult, Transaction,
	TransactionOptions,
};
use mockall::mock;
use rstest::*;

// ============================================================================
// mockall-based Database Mock
// ============================================================================

mock! {
	/// Mock implementation of the `Database` trait using mockall
	///
	/// # Direct Usage Example
	///
	/// ```rust
	/// use docsync_test::fixtures::MockDatabase;
	/// use docsync_db::backends::{ColumnInfo, Database};
	///
	/// #[tokio::main]
	/// async fn main() {
	///     let mut mock = MockDatabase::new();
	///
	///     mock.expect_get_columns()
	///         .withf(|table| table.eq_ignore_ascii_case("tabUser"))
	///         .times(1)
	///         .returning(|_| Ok(vec![ColumnInfo::new("email", "varchar(140)")]));
	///
	///     let columns = mock.get_columns("tabUser").await.unwrap();
	///     assert_eq!(columns.len(), 1);
	/// }
	/// ```
	pub Database {}

	#[async_trait::async_trait]
	impl DatabaseTrait for Database {
		async fn get_columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;
		async fn get_indexes(&self, table: &str) -> Result<Vec<IndexInfo>>;
		async fn begin(&self, options: &TransactionOptions) -> Result<Transaction>;
		async fn commit(&self, tx: &Transaction) -> Result<()>;
		async fn rollback(&self, tx: &Transaction) -> Result<()>;
		async fn savepoint(&self, tx: &Transaction, name: &str) -> Result<()>;
		async fn release_savepoint(&self, tx: &Transaction, name: &str) -> Result<()>;
		async fn rollback_to_savepoint(&self, tx: &Transaction, name: &str) -> Result<()>;
		async fn run(&self, sql: &str) -> Result<RunResult>;
		async fn query_count(&self, sql: &str) -> Result<u64>;
	}
}

/// Fixture providing a mock whose transaction control always succeeds
///
/// Introspection, `run` and `query_count` carry no expectations; tests set
/// the ones they exercise.
#[fixture]
pub fn mock_database() -> MockDatabase {
	let mut mock = MockDatabase::new();

	mock.expect_begin()
		.returning(|options| Ok(Transaction::new(options)));
	mock.expect_commit().returning(|_| Ok(()));
	mock.expect_rollback().returning(|_| Ok(()));
	mock.expect_savepoint().returning(|_, _| Ok(()));
	mock.expect_release_savepoint().returning(|_, _| Ok(()));
	mock.expect_rollback_to_savepoint().returning(|_, _| Ok(()));

	mock
}

#[cfg(test)]
mod tests {
	use super::*;
	use docsync_db::backends::DatabaseError;

	#[rstest]
	#[tokio::test]
	async fn test_mock_database_fixture_transaction_control(mock_database: MockDatabase) {
		let tx = mock_database
			.begin(&TransactionOptions::new())
			.await
			.unwrap();
		mock_database.savepoint(&tx, "sp_0").await.unwrap();
		mock_database.release_savepoint(&tx, "sp_0").await.unwrap();
		mock_database.commit(&tx).await.unwrap();
	}

	#[rstest]
	#[tokio::test]
	async fn test_mock_run_with_verification() {
		let mut mock = MockDatabase::new();
		mock.expect_run()
			.withf(|sql| sql.starts_with("ALTER TABLE"))
			.times(1)
			.returning(|_| Ok(RunResult::with_changes(0)));
		mock.expect_run()
			.returning(|sql| Err(DatabaseError::Query(format!("unexpected: {}", sql))));

		assert!(mock.run("ALTER TABLE t ADD COLUMN c text").await.is_ok());
		assert!(mock.run("DROP TABLE t").await.is_err());
	}
}
