//! Pool and transaction handles
//!
//! Statements are built with `sea-query` for SQLite and executed through
//! `sqlx`. Values travel as bound parameters, so one statement shape is one
//! SQL string and is prepared once per connection.

use crate::capture;
use crate::record::{Record, row_to_record};
use crate::{DbError, DbResult};
use sea_query::{QueryStatementWriter, SqliteQueryBuilder, Value, Values};
use sqlx::query::Query;
use sqlx::sqlite::{
	SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteQueryResult,
	SqliteRow,
};
use sqlx::{FromRow, Row, Sqlite, Transaction};
use std::str::FromStr;
use std::time::Instant;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_value(query: SqliteQuery<'_>, value: Value) -> DbResult<SqliteQuery<'_>> {
	let query = match value {
		Value::Bool(v) => query.bind(v),
		Value::TinyInt(v) => query.bind(v),
		Value::SmallInt(v) => query.bind(v),
		Value::Int(v) => query.bind(v),
		Value::BigInt(v) => query.bind(v),
		Value::TinyUnsigned(v) => query.bind(v.map(i64::from)),
		Value::SmallUnsigned(v) => query.bind(v.map(i64::from)),
		Value::Unsigned(v) => query.bind(v.map(i64::from)),
		Value::BigUnsigned(v) => {
			let v = v
				.map(i64::try_from)
				.transpose()
				.map_err(|_| DbError::Bind("unsigned value exceeds the SQLite integer range".into()))?;
			query.bind(v)
		}
		Value::Float(v) => query.bind(v),
		Value::Double(v) => query.bind(v),
		Value::String(v) => query.bind(v.map(|s| *s)),
		Value::Char(v) => query.bind(v.map(String::from)),
		Value::Bytes(v) => query.bind(v.map(|b| *b)),
		// Variants behind sea-query's optional `with-*` features
		#[allow(unreachable_patterns)]
		other => return Err(DbError::Bind(format!("unsupported value {:?}", other))),
	};
	Ok(query)
}

fn bind_values(sql: &str, values: Values) -> DbResult<SqliteQuery<'_>> {
	values
		.into_iter()
		.try_fold(sqlx::query(sql), bind_value)
}

async fn fetch_rows<'c, E>(executor: E, sql: &str, values: Values) -> DbResult<Vec<SqliteRow>>
where
	E: sqlx::Executor<'c, Database = Sqlite>,
{
	let query = bind_values(sql, values)?;
	let started = Instant::now();
	let result = query.fetch_all(executor).await;
	finish(sql, started);
	Ok(result?)
}

async fn execute_sql<'c, E>(executor: E, sql: &str, values: Values) -> DbResult<SqliteQueryResult>
where
	E: sqlx::Executor<'c, Database = Sqlite>,
{
	let query = bind_values(sql, values)?;
	let started = Instant::now();
	let result = query.execute(executor).await;
	finish(sql, started);
	Ok(result?)
}

fn finish(sql: &str, started: Instant) {
	let elapsed = started.elapsed();
	tracing::debug!(sql = %sql, elapsed_us = elapsed.as_micros() as u64, "query");
	capture::record(sql, elapsed);
}

fn to_records(rows: &[SqliteRow]) -> DbResult<Vec<Record>> {
	rows.iter().map(row_to_record).collect()
}

fn to_models<T>(rows: &[SqliteRow]) -> DbResult<Vec<T>>
where
	T: for<'r> FromRow<'r, SqliteRow>,
{
	rows.iter()
		.map(|row| T::from_row(row).map_err(DbError::from))
		.collect()
}

fn first_i64(rows: &[SqliteRow]) -> DbResult<i64> {
	match rows.first() {
		Some(row) => Ok(row.try_get::<i64, _>(0)?),
		None => Ok(0),
	}
}

/// Shared handle to the SQLite pool
#[derive(Debug, Clone)]
pub struct Database {
	pool: SqlitePool,
}

impl Database {
	/// Open (creating if missing) the database at `url`
	///
	/// # Examples
	///
	/// ```no_run
	/// # async fn run() -> storepify_db::DbResult<()> {
	/// let db = storepify_db::Database::connect("sqlite://storepify.db", 5).await?;
	/// # Ok(())
	/// # }
	/// ```
	pub async fn connect(url: &str, max_connections: u32) -> DbResult<Self> {
		let options = SqliteConnectOptions::from_str(url)?
			.create_if_missing(true)
			.foreign_keys(true);
		let pool = SqlitePoolOptions::new()
			.max_connections(max_connections.max(1))
			.connect_with(options)
			.await?;
		tracing::info!(url = %url, "database connected");
		Ok(Self { pool })
	}

	/// Private in-memory database
	///
	/// Uses a single long-lived connection: every connection to
	/// `sqlite::memory:` would otherwise see its own empty database.
	pub async fn connect_in_memory() -> DbResult<Self> {
		let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.min_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
			.connect_with(options)
			.await?;
		Ok(Self { pool })
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	pub async fn run_migrations(&self, migrator: &sqlx::migrate::Migrator) -> DbResult<()> {
		migrator.run(&self.pool).await?;
		tracing::info!("migrations applied");
		Ok(())
	}

	pub async fn fetch_all<S: QueryStatementWriter>(&self, statement: &S) -> DbResult<Vec<Record>> {
		let (sql, values) = statement.build(SqliteQueryBuilder);
		to_records(&fetch_rows(&self.pool, &sql, values).await?)
	}

	pub async fn fetch_optional<S: QueryStatementWriter>(
		&self,
		statement: &S,
	) -> DbResult<Option<Record>> {
		Ok(self.fetch_all(statement).await?.into_iter().next())
	}

	pub async fn fetch_all_as<T, S>(&self, statement: &S) -> DbResult<Vec<T>>
	where
		T: for<'r> FromRow<'r, SqliteRow>,
		S: QueryStatementWriter,
	{
		let (sql, values) = statement.build(SqliteQueryBuilder);
		to_models(&fetch_rows(&self.pool, &sql, values).await?)
	}

	pub async fn fetch_optional_as<T, S>(&self, statement: &S) -> DbResult<Option<T>>
	where
		T: for<'r> FromRow<'r, SqliteRow>,
		S: QueryStatementWriter,
	{
		Ok(self.fetch_all_as(statement).await?.into_iter().next())
	}

	/// First column of the first row as an integer; 0 when there are no rows
	pub async fn fetch_i64<S: QueryStatementWriter>(&self, statement: &S) -> DbResult<i64> {
		let (sql, values) = statement.build(SqliteQueryBuilder);
		first_i64(&fetch_rows(&self.pool, &sql, values).await?)
	}

	/// Run a statement and return the number of affected rows
	pub async fn execute<S: QueryStatementWriter>(&self, statement: &S) -> DbResult<u64> {
		let (sql, values) = statement.build(SqliteQueryBuilder);
		Ok(execute_sql(&self.pool, &sql, values).await?.rows_affected())
	}

	/// Run an INSERT and return the new row id
	pub async fn insert<S: QueryStatementWriter>(&self, statement: &S) -> DbResult<i64> {
		let (sql, values) = statement.build(SqliteQueryBuilder);
		Ok(execute_sql(&self.pool, &sql, values).await?.last_insert_rowid())
	}

	/// Run raw SQL, for schema setup in tools and tests
	pub async fn execute_raw(&self, sql: &str) -> DbResult<u64> {
		Ok(execute_sql(&self.pool, sql, Values(Vec::new())).await?.rows_affected())
	}

	pub async fn begin(&self) -> DbResult<DbTransaction> {
		let tx = self.pool.begin().await?;
		Ok(DbTransaction { tx })
	}
}

/// An open transaction; rolled back on drop unless committed
pub struct DbTransaction {
	tx: Transaction<'static, Sqlite>,
}

impl DbTransaction {
	pub async fn fetch_all<S: QueryStatementWriter>(
		&mut self,
		statement: &S,
	) -> DbResult<Vec<Record>> {
		let (sql, values) = statement.build(SqliteQueryBuilder);
		to_records(&fetch_rows(&mut *self.tx, &sql, values).await?)
	}

	pub async fn fetch_i64<S: QueryStatementWriter>(&mut self, statement: &S) -> DbResult<i64> {
		let (sql, values) = statement.build(SqliteQueryBuilder);
		first_i64(&fetch_rows(&mut *self.tx, &sql, values).await?)
	}

	pub async fn execute<S: QueryStatementWriter>(&mut self, statement: &S) -> DbResult<u64> {
		let (sql, values) = statement.build(SqliteQueryBuilder);
		Ok(execute_sql(&mut *self.tx, &sql, values).await?.rows_affected())
	}

	pub async fn insert<S: QueryStatementWriter>(&mut self, statement: &S) -> DbResult<i64> {
		let (sql, values) = statement.build(SqliteQueryBuilder);
		Ok(execute_sql(&mut *self.tx, &sql, values).await?.last_insert_rowid())
	}

	pub async fn commit(self) -> DbResult<()> {
		self.tx.commit().await?;
		Ok(())
	}

	pub async fn rollback(self) -> DbResult<()> {
		self.tx.rollback().await?;
		Ok(())
	}
}
