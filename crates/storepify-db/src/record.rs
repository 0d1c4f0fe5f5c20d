//! Dynamic rows
//!
//! A [`Record`] maps column names to JSON values so that generic code (the
//! admin change list, autocomplete) can work with any table. SQLite reports
//! the storage class of each value, which decides the JSON type.

use crate::{DbError, DbResult};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Column name → value
pub type Record = serde_json::Map<String, Value>;

/// Convert one result row into a [`Record`]
pub fn row_to_record(row: &SqliteRow) -> DbResult<Record> {
	let mut record = Record::new();

	for column in row.columns() {
		let index = column.ordinal();
		let raw = row.try_get_raw(index)?;

		let value = if raw.is_null() {
			Value::Null
		} else {
			let storage = raw.type_info().name().to_ascii_uppercase();
			match storage.as_str() {
				"INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(index)?),
				"REAL" | "NUMERIC" => Value::from(row.try_get::<f64, _>(index)?),
				"TEXT" | "DATE" | "TIME" | "DATETIME" => {
					Value::String(row.try_get::<String, _>(index)?)
				}
				"BLOB" => {
					let bytes: Vec<u8> = row.try_get(index)?;
					Value::String(String::from_utf8_lossy(&bytes).into_owned())
				}
				other => {
					return Err(DbError::Decode {
						column: column.name().to_string(),
						message: format!("unsupported storage class {}", other),
					});
				}
			}
		};

		record.insert(column.name().to_string(), value);
	}

	Ok(record)
}

/// Read an integer column from a record
pub fn get_i64(record: &Record, column: &str) -> DbResult<i64> {
	record
		.get(column)
		.and_then(Value::as_i64)
		.ok_or_else(|| DbError::Decode {
			column: column.to_string(),
			message: "expected an integer".into(),
		})
}
