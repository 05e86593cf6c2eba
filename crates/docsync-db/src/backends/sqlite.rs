//! SQLite backend
//!
//! Wraps a single [`SqliteConnection`] behind an async mutex. Transactions and
//! savepoints are issued as plain SQL on that connection, which matches the
//! single-writer model the migration executor assumes.

use async_trait::async_trait;
use sqlx::{Connection, Row, SqliteConnection};
use tokio::sync::Mutex;
use tracing::debug;

use super::{
	ColumnInfo, Database, DatabaseError, IndexInfo, IsolationLevel, Result, RunResult,
	Transaction, TransactionOptions, quote_identifier,
};

impl From<sqlx::Error> for DatabaseError {
	fn from(err: sqlx::Error) -> Self {
		DatabaseError::Query(err.to_string())
	}
}

/// SQLite implementation of [`Database`]
pub struct SqliteDatabase {
	conn: Mutex<SqliteConnection>,
}

impl SqliteDatabase {
	/// Open a connection
	///
	/// # Examples
	///
	/// ```no_run
	/// use docsync_db::backends::SqliteDatabase;
	///
	/// # async fn example() {
	/// let db = SqliteDatabase::connect("sqlite::memory:").await.unwrap();
	/// # }
	/// ```
	pub async fn connect(url: &str) -> Result<Self> {
		let conn = SqliteConnection::connect(url)
			.await
			.map_err(|e| DatabaseError::Connection(e.to_string()))?;
		Ok(Self {
			conn: Mutex::new(conn),
		})
	}

	/// Open a private in-memory database
	pub async fn in_memory() -> Result<Self> {
		Self::connect("sqlite::memory:").await
	}

	async fn read_indexes(conn: &mut SqliteConnection, table: &str) -> Result<Vec<IndexInfo>> {
		let list_sql = format!("PRAGMA index_list({})", quote_identifier(table));
		let rows = sqlx::query(&list_sql).fetch_all(&mut *conn).await?;

		let mut indexes = Vec::with_capacity(rows.len());
		for row in rows {
			let name: String = row.try_get("name")?;
			let unique: i64 = row.try_get("unique")?;
			let origin: String = row.try_get("origin")?;
			let partial: i64 = row.try_get("partial")?;

			let info_sql = format!("PRAGMA index_info({})", quote_identifier(&name));
			let mut columns = Vec::new();
			for info in sqlx::query(&info_sql).fetch_all(&mut *conn).await? {
				// Expression indexes report a NULL column name
				if let Some(column) = info.try_get::<Option<String>, _>("name")? {
					columns.push(column);
				}
			}

			indexes.push(IndexInfo {
				name,
				columns,
				unique: unique != 0,
				index_type: None,
				origin: Some(origin),
				partial: partial != 0,
			});
		}

		Ok(indexes)
	}
}

#[async_trait]
impl Database for SqliteDatabase {
	async fn get_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
		let mut conn = self.conn.lock().await;

		let sql = format!("PRAGMA table_info({})", quote_identifier(table));
		let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
		if rows.is_empty() {
			return Err(DatabaseError::TableNotFound(table.to_string()));
		}

		let indexes = Self::read_indexes(&mut conn, table).await?;
		let unique_columns: Vec<&str> = indexes
			.iter()
			.filter(|idx| idx.unique && idx.columns.len() == 1 && idx.origin.as_deref() != Some("pk"))
			.map(|idx| idx.columns[0].as_str())
			.collect();

		let mut columns = Vec::with_capacity(rows.len());
		for row in rows {
			let name: String = row.try_get("name")?;
			let column_type: String = row.try_get("type")?;
			let not_null: i64 = row.try_get("notnull")?;
			let default: Option<String> = row.try_get("dflt_value")?;
			let pk: i64 = row.try_get("pk")?;

			let primary_key = pk > 0;
			// INTEGER PRIMARY KEY aliases the rowid and auto-increments
			let auto_increment = primary_key && column_type.eq_ignore_ascii_case("integer");
			let unique = unique_columns.contains(&name.as_str());

			columns.push(ColumnInfo {
				name,
				column_type,
				nullable: not_null == 0 && !primary_key,
				default,
				primary_key,
				auto_increment,
				unique,
			});
		}

		debug!(table = %table, columns = columns.len(), "introspected sqlite table");
		Ok(columns)
	}

	async fn get_indexes(&self, table: &str) -> Result<Vec<IndexInfo>> {
		let mut conn = self.conn.lock().await;
		Self::read_indexes(&mut conn, table).await
	}

	async fn begin(&self, options: &TransactionOptions) -> Result<Transaction> {
		let mut conn = self.conn.lock().await;
		// SQLite transactions are always serializable; IMMEDIATE takes the
		// write lock up front.
		let statement = match options.isolation_level {
			Some(IsolationLevel::Serializable) => "BEGIN IMMEDIATE",
			_ => "BEGIN",
		};
		sqlx::query(statement)
			.execute(&mut *conn)
			.await
			.map_err(|e| DatabaseError::Transaction(e.to_string()))?;
		Ok(Transaction::new(options))
	}

	async fn commit(&self, _tx: &Transaction) -> Result<()> {
		let mut conn = self.conn.lock().await;
		sqlx::query("COMMIT")
			.execute(&mut *conn)
			.await
			.map_err(|e| DatabaseError::Transaction(e.to_string()))?;
		Ok(())
	}

	async fn rollback(&self, _tx: &Transaction) -> Result<()> {
		let mut conn = self.conn.lock().await;
		sqlx::query("ROLLBACK")
			.execute(&mut *conn)
			.await
			.map_err(|e| DatabaseError::Transaction(e.to_string()))?;
		Ok(())
	}

	async fn savepoint(&self, _tx: &Transaction, name: &str) -> Result<()> {
		let mut conn = self.conn.lock().await;
		let sql = format!("SAVEPOINT {}", quote_identifier(name));
		sqlx::query(&sql)
			.execute(&mut *conn)
			.await
			.map_err(|e| DatabaseError::Savepoint(e.to_string()))?;
		Ok(())
	}

	async fn release_savepoint(&self, _tx: &Transaction, name: &str) -> Result<()> {
		let mut conn = self.conn.lock().await;
		let sql = format!("RELEASE SAVEPOINT {}", quote_identifier(name));
		sqlx::query(&sql)
			.execute(&mut *conn)
			.await
			.map_err(|e| DatabaseError::Savepoint(e.to_string()))?;
		Ok(())
	}

	async fn rollback_to_savepoint(&self, _tx: &Transaction, name: &str) -> Result<()> {
		let mut conn = self.conn.lock().await;
		let sql = format!("ROLLBACK TO SAVEPOINT {}", quote_identifier(name));
		sqlx::query(&sql)
			.execute(&mut *conn)
			.await
			.map_err(|e| DatabaseError::Savepoint(e.to_string()))?;
		Ok(())
	}

	async fn run(&self, sql: &str) -> Result<RunResult> {
		let mut conn = self.conn.lock().await;
		let result = sqlx::query(sql).execute(&mut *conn).await?;
		Ok(RunResult::with_changes(result.rows_affected()))
	}

	async fn query_count(&self, sql: &str) -> Result<u64> {
		let mut conn = self.conn.lock().await;
		let count: i64 = sqlx::query_scalar(sql).fetch_one(&mut *conn).await?;
		Ok(count.max(0) as u64)
	}
}
