//! SQL normalization for duplicate and N+1 detection

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use storepify_db::capture::CapturedQuery;

static COMMENT_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?m)--.*$").expect("valid comment pattern"));
static STRING_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"'(?:[^']|'')*'").expect("valid string literal pattern"));
static NUMERIC_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").expect("valid numeric pattern"));
static IN_LIST_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"IN \(\?(?:, \?)*\)").expect("valid IN list pattern"));
static WHITESPACE_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Reduce a statement to its shape: literals become `?`, whitespace and case collapse
///
/// # Examples
///
/// ```
/// use storepify_debug_toolbar::utils::sql_normalization::normalize_sql;
///
/// let a = r#"SELECT "title" FROM "store_product" WHERE "id" = 3"#;
/// let b = r#"SELECT "title" FROM "store_product" WHERE "id" = 41"#;
/// assert_eq!(normalize_sql(a), normalize_sql(b));
/// ```
pub fn normalize_sql(sql: &str) -> String {
	let sql = COMMENT_RE.replace_all(sql, "");
	let sql = STRING_RE.replace_all(&sql, "?");
	let sql = NUMERIC_RE.replace_all(&sql, "?");
	let sql = WHITESPACE_RE.replace_all(&sql, " ");
	let sql = sql.to_uppercase();
	// Batches of different sizes share one shape.
	IN_LIST_RE.replace_all(sql.trim(), "IN (?)").into_owned()
}

/// Occurrences of each normalized statement
pub fn shape_counts(queries: &[CapturedQuery]) -> HashMap<String, usize> {
	let mut counts = HashMap::new();
	for query in queries {
		*counts.entry(normalize_sql(&query.sql)).or_insert(0) += 1;
	}
	counts
}

/// Normalized statements repeated more than `threshold` times, in first-seen order
pub fn detect_n_plus_one(queries: &[CapturedQuery], threshold: usize) -> Vec<String> {
	let mut counts: HashMap<String, usize> = HashMap::new();
	let mut patterns = Vec::new();

	for query in queries {
		let normalized = normalize_sql(&query.sql);
		let count = counts.entry(normalized.clone()).or_insert(0);
		*count += 1;
		if *count > threshold && !patterns.contains(&normalized) {
			patterns.push(normalized);
		}
	}

	patterns
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::time::Duration;

	fn query(sql: &str) -> CapturedQuery {
		CapturedQuery {
			sql: sql.to_string(),
			duration: Duration::from_millis(1),
		}
	}

	#[rstest]
	#[case("SELECT * FROM users WHERE id = 123", "SELECT * FROM USERS WHERE ID = ?")]
	#[case("SELECT * FROM users WHERE name = 'O''Brien'", "SELECT * FROM USERS WHERE NAME = ?")]
	#[case("SELECT   *\n FROM\tusers -- note\nWHERE id = 1", "SELECT * FROM USERS WHERE ID = ?")]
	#[case("SELECT * FROM t WHERE price >= 10.50", "SELECT * FROM T WHERE PRICE >= ?")]
	#[case("SELECT * FROM t WHERE id IN (1, 2, 3)", "SELECT * FROM T WHERE ID IN (?)")]
	fn test_normalize_sql(#[case] sql: &str, #[case] expected: &str) {
		assert_eq!(normalize_sql(sql), expected);
	}

	#[rstest]
	fn test_identifiers_with_digits_survive() {
		assert_eq!(
			normalize_sql("SELECT col1 FROM t2"),
			"SELECT COL1 FROM T2"
		);
	}

	#[rstest]
	fn test_detect_n_plus_one() {
		let mut queries = vec![query("SELECT * FROM store_order")];
		for id in 1..=5 {
			queries.push(query(&format!(
				"SELECT * FROM store_customer WHERE id = {}",
				id
			)));
		}

		let patterns = detect_n_plus_one(&queries, 3);
		assert_eq!(patterns, ["SELECT * FROM STORE_CUSTOMER WHERE ID = ?"]);
		assert_eq!(shape_counts(&queries).len(), 2);
	}

	#[rstest]
	fn test_no_pattern_below_threshold() {
		let queries: Vec<_> = (1..=3)
			.map(|id| query(&format!("SELECT * FROM t WHERE id = {}", id)))
			.collect();
		assert!(detect_n_plus_one(&queries, 3).is_empty());
	}
}
