//! Migration safety validation
//!
//! [`MigrationValidator::validate_migration`] judges a [`Migration`] before
//! it is executed. It combines the structural checks of the analyzer with
//! three migration-level checks:
//!
//! - data-loss risks per removed, converted or rebuilt column
//! - keyword and pattern checks over the SQL statements
//! - rollback feasibility
//!
//! Every problem found is reported; nothing fails fast.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::analyzer::{can_apply_online, validate_schema_diff};
use super::migration::{Migration, MigrationValidation};
use super::schema_diff::SchemaDiff;
use crate::backends::{Database, quote_identifier};

const ERROR_PENALTY: u32 = 20;
const WARNING_PENALTY: u32 = 2;
const BLOCKER_PENALTY: u32 = 25;

/// Statement count above which a rollback stops being easy
const EASY_ROLLBACK_STATEMENTS: usize = 3;
const MODERATE_ROLLBACK_STATEMENTS: usize = 5;

const STATEMENT_KEYWORDS: [&str; 15] = [
	"CREATE", "ALTER", "DROP", "INSERT", "UPDATE", "DELETE", "SELECT", "PRAGMA", "BEGIN", "COMMIT",
	"ROLLBACK", "SAVEPOINT", "RELEASE", "REPLACE", "WITH",
];

static SELECT_STAR: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?i)\bSELECT\s+\*\s+FROM\b").expect("Invalid regex pattern"));
static WHERE_OR_LIMIT: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?i)\b(WHERE|LIMIT)\b").expect("Invalid regex pattern"));
static WHERE_CLAUSE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?i)\bWHERE\b").expect("Invalid regex pattern"));
static UPDATE_OR_DELETE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?i)^\s*(UPDATE|DELETE)\b").expect("Invalid regex pattern"));
static JOIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bJOIN\b").expect("Invalid regex pattern"));
static INDEX_HINT: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?i)\bINDEXED\s+BY\b").expect("Invalid regex pattern"));

/// `OR`/`AND` comparison right after a string literal; a tautology when both sides agree
static COMPARISON_AFTER_LITERAL: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"(?i)'\s*(?:OR|AND)\s+('?\w+'?)\s*=\s*('?\w+'?)").expect("Invalid regex pattern")
});

/// Patterns typical of string-concatenated, injected SQL
static INJECTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
	[
		(
			r"(?i)'\s*;\s*(DROP|DELETE|TRUNCATE|ALTER|UPDATE|INSERT)\b",
			"statement chained after a string literal",
		),
		(r"'\s*--", "comment after a string literal"),
		(r"(?i)\bUNION\s+(ALL\s+)?SELECT\b", "UNION SELECT"),
		(r"'\s*\|\|\s*'", "concatenated string literals"),
	]
	.into_iter()
	.map(|(pattern, label)| (Regex::new(pattern).expect("Invalid regex pattern"), label))
	.collect()
});

/// Kind of data-loss risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskType {
	ColumnRemoval,
	TypeConversion,
	TableRebuild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
	Low,
	Medium,
	High,
}

impl RiskSeverity {
	fn penalty(&self) -> u32 {
		match self {
			RiskSeverity::Low => 5,
			RiskSeverity::Medium => 10,
			RiskSeverity::High => 15,
		}
	}
}

/// A way the migration can lose existing data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLossRisk {
	pub risk_type: RiskType,
	pub severity: RiskSeverity,
	pub column: String,
	pub description: String,
	/// Rows holding data that would be affected, when it could be counted
	pub affected_rows: Option<u64>,
	pub mitigation: String,
}

/// Findings of the SQL statement checks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlValidationReport {
	pub errors: Vec<String>,
	pub warnings: Vec<String>,
	pub performance_issues: Vec<String>,
	pub security_issues: Vec<String>,
}

impl SqlValidationReport {
	/// No syntax or security problems
	pub fn is_valid(&self) -> bool {
		self.errors.is_empty() && self.security_issues.is_empty()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackDifficulty {
	Easy,
	Moderate,
	Hard,
	Impossible,
}

/// Whether and how easily a migration can be undone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackAssessment {
	pub possible: bool,
	pub difficulty: RollbackDifficulty,
	pub blockers: Vec<String>,
	pub warnings: Vec<String>,
}

/// Judges the safety of migrations before execution
#[derive(Clone, Default)]
pub struct MigrationValidator {
	database: Option<Arc<dyn Database>>,
}

impl MigrationValidator {
	/// Validator that counts affected rows through `database`
	pub fn new(database: Arc<dyn Database>) -> Self {
		Self {
			database: Some(database),
		}
	}

	/// Validator without database access; affected rows stay unknown
	pub fn offline() -> Self {
		Self::default()
	}

	/// Validate a migration
	///
	/// `valid` is true exactly when no errors were found. The score starts at
	/// 100 and drops for every error, warning, data-loss risk and rollback
	/// blocker.
	pub async fn validate_migration(&self, migration: &Migration) -> MigrationValidation {
		let mut validation = validate_schema_diff(&migration.diff);
		validation.score = 100;

		let statements = migration.sql.statements();
		if migration.sql.is_empty() && !migration.diff.is_empty() {
			validation.add_error("Migration has changes but no SQL statements");
		}

		let sql_report = Self::validate_sql_statements(statements);
		for error in &sql_report.errors {
			validation.add_error(error.clone());
		}
		for issue in &sql_report.security_issues {
			validation.add_error(format!("Security: {}", issue));
		}
		for issue in &sql_report.performance_issues {
			validation.add_warning(format!("Performance: {}", issue));
		}
		for warning in &sql_report.warnings {
			validation.add_warning(warning.clone());
		}

		let risks = self
			.check_data_loss_risks(&migration.table_name, &migration.diff)
			.await;
		let mut risk_penalty = 0;
		for risk in &risks {
			risk_penalty += risk.severity.penalty();
			let rows = risk
				.affected_rows
				.map(|n| format!(" ({} rows affected)", n))
				.unwrap_or_default();
			merge_risk_warning(&mut validation, risk, &rows);
			validation.add_recommendation(risk.mitigation.clone());
		}

		let rollback = Self::validate_rollback_possibility(migration);
		for blocker in &rollback.blockers {
			validation.add_warning(format!("Rollback blocked: {}", blocker));
		}
		for warning in &rollback.warnings {
			validation.add_warning(warning.clone());
		}
		if !rollback.possible {
			validation.add_recommendation("Take a full backup; this migration cannot be rolled back");
		}

		validation.penalize(
			ERROR_PENALTY * validation.errors.len() as u32
				+ WARNING_PENALTY * validation.warnings.len() as u32
				+ risk_penalty
				+ BLOCKER_PENALTY * rollback.blockers.len() as u32,
		);

		debug!(
			migration = %migration.id,
			doctype = %migration.doctype,
			valid = validation.valid,
			score = validation.score,
			"migration validated"
		);
		validation
	}

	/// Enumerate the ways a diff can lose data in `table`
	pub async fn check_data_loss_risks(&self, table: &str, diff: &SchemaDiff) -> Vec<DataLossRisk> {
		let mut risks = Vec::new();

		for removed in &diff.removed_columns {
			let affected_rows = self.count_populated_rows(table, &removed.fieldname).await;
			risks.push(DataLossRisk {
				risk_type: RiskType::ColumnRemoval,
				severity: RiskSeverity::High,
				column: removed.fieldname.clone(),
				description: format!("Dropping column '{}' deletes its data", removed.fieldname),
				affected_rows,
				mitigation: format!("Export column '{}' data first", removed.fieldname),
			});
		}

		for change in &diff.modified_columns {
			if change.destructive && change.changes.column_type.is_some() {
				risks.push(DataLossRisk {
					risk_type: RiskType::TypeConversion,
					severity: RiskSeverity::Medium,
					column: change.fieldname.clone(),
					description: format!(
						"Converting column '{}' may truncate or reject values",
						change.fieldname
					),
					affected_rows: None,
					mitigation: "Verify existing values convert cleanly before applying".to_string(),
				});
			}
		}

		let rebuilt = diff
			.renamed_columns
			.iter()
			.map(|r| r.to.as_str())
			.chain(
				diff.modified_columns
					.iter()
					.filter(|c| !can_apply_online(c))
					.map(|c| c.fieldname.as_str()),
			);
		for column in rebuilt {
			risks.push(DataLossRisk {
				risk_type: RiskType::TableRebuild,
				severity: RiskSeverity::Medium,
				column: column.to_string(),
				description: format!("Changing column '{}' rebuilds the table", column),
				affected_rows: None,
				mitigation: "Schedule a maintenance window".to_string(),
			});
		}

		risks
	}

	async fn count_populated_rows(&self, table: &str, column: &str) -> Option<u64> {
		let database = self.database.as_ref()?;
		let sql = format!(
			"SELECT COUNT(*) FROM {} WHERE {} IS NOT NULL",
			quote_identifier(table),
			quote_identifier(column)
		);
		match database.query_count(&sql).await {
			Ok(count) => Some(count),
			Err(e) => {
				warn!(table = %table, column = %column, error = %e, "could not count affected rows");
				None
			}
		}
	}

	/// Keyword and pattern checks over SQL statements
	///
	/// # Examples
	///
	/// ```
	/// use docsync_db::migrations::MigrationValidator;
	///
	/// let report = MigrationValidator::validate_sql_statements(&[
	///     "DELETE FROM \"tabUser\"".to_string(),
	/// ]);
	/// assert!(report.is_valid());
	/// assert_eq!(report.performance_issues.len(), 1);
	/// ```
	pub fn validate_sql_statements(statements: &[String]) -> SqlValidationReport {
		let mut report = SqlValidationReport::default();

		for (i, statement) in statements.iter().enumerate() {
			let n = i + 1;
			let trimmed = statement.trim();
			if trimmed.is_empty() {
				report.errors.push(format!("Statement {} is empty", n));
				continue;
			}

			let keyword = trimmed
				.split(|c: char| c.is_whitespace() || c == '(')
				.next()
				.unwrap_or_default()
				.to_ascii_uppercase();
			if !STATEMENT_KEYWORDS.contains(&keyword.as_str()) {
				report
					.errors
					.push(format!("Statement {} starts with unrecognized keyword '{}'", n, keyword));
			}

			let (quotes_balanced, parens_balanced, inner_terminators) = scan(trimmed);
			if !quotes_balanced {
				report
					.errors
					.push(format!("Statement {} has an unterminated string literal", n));
			}
			if !parens_balanced {
				report
					.errors
					.push(format!("Statement {} has unbalanced parentheses", n));
			}
			if inner_terminators {
				report
					.warnings
					.push(format!("Statement {} contains more than one SQL statement", n));
			}

			if SELECT_STAR.is_match(trimmed) && !WHERE_OR_LIMIT.is_match(trimmed) {
				report
					.performance_issues
					.push(format!("Statement {} selects every column of every row", n));
			}
			if UPDATE_OR_DELETE.is_match(trimmed) && !WHERE_CLAUSE.is_match(trimmed) {
				report
					.performance_issues
					.push(format!("Statement {} modifies every row (no WHERE clause)", n));
			}
			if JOIN.is_match(trimmed) && !INDEX_HINT.is_match(trimmed) {
				report
					.performance_issues
					.push(format!("Statement {} joins without an index hint", n));
			}

			if has_tautology(trimmed) {
				report
					.security_issues
					.push(format!("Statement {} contains tautology after a string literal", n));
			}
			for (pattern, label) in INJECTION_PATTERNS.iter() {
				if pattern.is_match(trimmed) {
					report
						.security_issues
						.push(format!("Statement {} contains {}", n, label));
				}
			}
		}

		report
	}

	/// Judge whether a migration can be undone
	pub fn validate_rollback_possibility(migration: &Migration) -> RollbackAssessment {
		let mut blockers = Vec::new();
		let mut warnings = Vec::new();

		let forward = migration.sql.statements().len();
		let backward = migration.rollback_sql.statements().len();
		let rebuild = !migration.diff.renamed_columns.is_empty()
			|| migration
				.diff
				.modified_columns
				.iter()
				.any(|c| !can_apply_online(c));

		if migration.destructive {
			blockers.push("Destructive changes discard data that rollback SQL cannot restore".to_string());
		}
		if migration.rollback_sql.is_empty() {
			if rebuild {
				blockers.push("Table rebuild has no rollback SQL and cannot be reversed".to_string());
			} else if !migration.diff.is_empty() {
				blockers.push("No rollback SQL provided".to_string());
			}
		} else if backward != forward {
			warnings.push(format!(
				"Rollback has {} statements for {} forward statements",
				backward, forward
			));
		}

		let difficulty = if !blockers.is_empty() {
			RollbackDifficulty::Impossible
		} else if rebuild || migration.requires_backup {
			if backward <= MODERATE_ROLLBACK_STATEMENTS {
				RollbackDifficulty::Moderate
			} else {
				RollbackDifficulty::Hard
			}
		} else if backward <= EASY_ROLLBACK_STATEMENTS {
			RollbackDifficulty::Easy
		} else {
			RollbackDifficulty::Moderate
		};

		RollbackAssessment {
			possible: blockers.is_empty(),
			difficulty,
			blockers,
			warnings,
		}
	}
}

/// Report a risk once
///
/// Removals and destructive conversions already carry a diff-level warning for
/// the column; the row count is appended to that warning instead.
fn merge_risk_warning(validation: &mut MigrationValidation, risk: &DataLossRisk, rows: &str) {
	let covered_by = match risk.risk_type {
		RiskType::ColumnRemoval => Some("Removing column"),
		RiskType::TypeConversion => Some("Modifying column"),
		RiskType::TableRebuild => None,
	};
	let column = format!("'{}'", risk.column);

	if let Some(prefix) = covered_by
		&& let Some(warning) = validation
			.warnings
			.iter_mut()
			.find(|w| w.starts_with(prefix) && w.contains(&column))
	{
		warning.push_str(rows);
		return;
	}
	validation.add_warning(format!("{}{}", risk.description, rows));
}

/// `' OR '1'='1'`-style comparisons whose two sides are the same token
fn has_tautology(statement: &str) -> bool {
	COMPARISON_AFTER_LITERAL.captures_iter(statement).any(|caps| {
		let left = caps[1].trim_matches('\'');
		let right = caps[2].trim_matches('\'');
		left.eq_ignore_ascii_case(right)
	})
}

/// Single pass over a statement: (quotes balanced, parentheses balanced,
/// a `;` followed by more SQL outside literals)
fn scan(statement: &str) -> (bool, bool, bool) {
	let mut in_single = false;
	let mut in_double = false;
	let mut depth: i64 = 0;
	let mut min_depth: i64 = 0;
	let mut terminator_at = None;

	for (i, c) in statement.char_indices() {
		match c {
			'\'' if !in_double => in_single = !in_single,
			'"' if !in_single => in_double = !in_double,
			'(' if !in_single && !in_double => depth += 1,
			')' if !in_single && !in_double => {
				depth -= 1;
				min_depth = min_depth.min(depth);
			}
			';' if !in_single && !in_double && terminator_at.is_none() => terminator_at = Some(i),
			_ => {}
		}
	}

	let inner = terminator_at.is_some_and(|i| !statement[i + 1..].trim().is_empty());
	(!in_single && !in_double, depth == 0 && min_depth == 0, inner)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::migrations::schema_diff::{
		ColumnChange, ColumnDefinition, ColumnRename, FieldChange, FieldChanges, ValueChange,
	};
	use rstest::rstest;

	fn statements(sql: &[&str]) -> Vec<String> {
		sql.iter().map(|s| s.to_string()).collect()
	}

	#[rstest]
	fn test_clean_ddl_passes() {
		let report = MigrationValidator::validate_sql_statements(&statements(&[
			r#"ALTER TABLE "tabUser" ADD COLUMN "email" varchar(140)"#,
			r#"CREATE INDEX "idx_user_email" ON "tabUser" ("email")"#,
			r#"UPDATE "tabUser" SET "email" = 'it''s' WHERE "email" IS NULL"#,
			r#"UPDATE "tabUser" SET status = 'Open' WHERE kind = 'lead' AND age = 1"#,
			r#"UPDATE "tabUser" SET status = 'Closed' WHERE kind = 'lead' OR kind = 'deal'"#,
		]));
		assert_eq!(report, SqlValidationReport::default());
	}

	#[rstest]
	#[case("", "empty")]
	#[case("FROBNICATE TABLE x", "unrecognized keyword")]
	#[case("ALTER TABLE x ADD COLUMN y varchar(10", "unbalanced parentheses")]
	#[case("UPDATE x SET y = 'open WHERE id = 1", "unterminated string literal")]
	fn test_syntax_errors(#[case] sql: &str, #[case] expected: &str) {
		let report = MigrationValidator::validate_sql_statements(&statements(&[sql]));
		assert!(
			report.errors.iter().any(|e| e.contains(expected)),
			"{:?} should contain {}",
			report.errors,
			expected
		);
	}

	#[rstest]
	#[case("SELECT * FROM x", "every column")]
	#[case("DELETE FROM x", "no WHERE clause")]
	#[case("SELECT a.id FROM a JOIN b ON a.id = b.a_id WHERE b.x = 1", "index hint")]
	fn test_performance_heuristics(#[case] sql: &str, #[case] expected: &str) {
		let report = MigrationValidator::validate_sql_statements(&statements(&[sql]));
		assert!(report.performance_issues.iter().any(|e| e.contains(expected)));
		assert!(report.is_valid());
	}

	#[rstest]
	#[case("SELECT id FROM x WHERE name = '' OR '1'='1'")]
	#[case("SELECT id FROM x WHERE name = 'a' OR name = name")]
	#[case("SELECT id FROM x WHERE name = 'a' OR 'x' = x")]
	#[case("UPDATE x SET y = 'a'; DROP TABLE users WHERE 1")]
	#[case("SELECT id FROM x WHERE name = 'admin'--'")]
	#[case("SELECT id FROM x WHERE 1 = 1 UNION SELECT password FROM users")]
	fn test_security_heuristics(#[case] sql: &str) {
		let report = MigrationValidator::validate_sql_statements(&statements(&[sql]));
		assert!(!report.security_issues.is_empty(), "{}", sql);
		assert!(!report.is_valid());
	}

	#[rstest]
	fn test_multiple_statements_in_one_string_warns() {
		let report = MigrationValidator::validate_sql_statements(&statements(&[
			"CREATE TABLE a (id integer); CREATE TABLE b (id integer)",
			"CREATE TABLE c (id integer);",
		]));
		assert_eq!(report.warnings.len(), 1);
		assert!(report.warnings[0].starts_with("Statement 1"));
	}

	fn migration(diff: SchemaDiff, forward: &[&str], backward: &[&str]) -> Migration {
		Migration::new("User", "tabUser", diff, statements(forward), statements(backward))
	}

	#[rstest]
	fn test_destructive_migration_cannot_be_rolled_back() {
		let mut diff = SchemaDiff::new();
		diff.removed_columns
			.push(ColumnChange::removed(ColumnDefinition::new("legacy", "text")));
		let migration = migration(
			diff,
			&[r#"ALTER TABLE "tabUser" DROP COLUMN "legacy""#],
			&[r#"ALTER TABLE "tabUser" ADD COLUMN "legacy" text"#],
		);

		let assessment = MigrationValidator::validate_rollback_possibility(&migration);
		assert!(!assessment.possible);
		assert_eq!(assessment.difficulty, RollbackDifficulty::Impossible);
		assert_eq!(assessment.blockers.len(), 1);
	}

	#[rstest]
	fn test_additive_migration_rolls_back_easily() {
		let mut diff = SchemaDiff::new();
		diff.added_columns
			.push(ColumnChange::added(ColumnDefinition::new("email", "text")));
		let migration = migration(
			diff,
			&[r#"ALTER TABLE "tabUser" ADD COLUMN "email" text"#],
			&[r#"ALTER TABLE "tabUser" DROP COLUMN "email""#],
		);

		let assessment = MigrationValidator::validate_rollback_possibility(&migration);
		assert!(assessment.possible);
		assert_eq!(assessment.difficulty, RollbackDifficulty::Easy);
		assert!(assessment.warnings.is_empty());
	}

	#[rstest]
	fn test_rebuild_without_rollback_sql_is_blocked() {
		let mut diff = SchemaDiff::new();
		diff.renamed_columns.push(ColumnRename {
			from: "mail".to_string(),
			to: "email".to_string(),
			column: ColumnDefinition::new("email", "text"),
		});
		let migration = migration(
			diff,
			&[r#"ALTER TABLE "tabUser" RENAME COLUMN "mail" TO "email""#],
			&[],
		);

		let assessment = MigrationValidator::validate_rollback_possibility(&migration);
		assert!(!assessment.possible);
		assert!(assessment.blockers[0].contains("rebuild"));
	}

	#[rstest]
	fn test_mismatched_rollback_length_warns() {
		let mut diff = SchemaDiff::new();
		diff.added_columns
			.push(ColumnChange::added(ColumnDefinition::new("a", "text")));
		diff.added_columns
			.push(ColumnChange::added(ColumnDefinition::new("b", "text")));
		let migration = migration(
			diff,
			&[
				r#"ALTER TABLE "tabUser" ADD COLUMN "a" text"#,
				r#"ALTER TABLE "tabUser" ADD COLUMN "b" text"#,
			],
			&[r#"ALTER TABLE "tabUser" DROP COLUMN "a""#],
		);

		let assessment = MigrationValidator::validate_rollback_possibility(&migration);
		assert!(assessment.possible);
		assert_eq!(assessment.warnings.len(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_offline_risks_for_conversion_and_rebuild() {
		let mut diff = SchemaDiff::new();
		diff.modified_columns.push(FieldChange {
			fieldname: "score".to_string(),
			changes: FieldChanges {
				column_type: Some(ValueChange::new("real".to_string(), "integer".to_string())),
				..Default::default()
			},
			requires_data_migration: true,
			destructive: true,
		});
		diff.removed_columns
			.push(ColumnChange::removed(ColumnDefinition::new("legacy", "text")));

		let risks = MigrationValidator::offline()
			.check_data_loss_risks("tabUser", &diff)
			.await;

		let kinds: Vec<RiskType> = risks.iter().map(|r| r.risk_type).collect();
		assert_eq!(kinds, vec![RiskType::ColumnRemoval, RiskType::TypeConversion]);
		assert_eq!(risks[0].severity, RiskSeverity::High);
		assert_eq!(risks[0].affected_rows, None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_validate_migration_scores_risks() {
		let mut diff = SchemaDiff::new();
		diff.removed_columns
			.push(ColumnChange::removed(ColumnDefinition::new("legacy", "text")));
		let migration = migration(
			diff,
			&[r#"ALTER TABLE "tabUser" DROP COLUMN "legacy""#],
			&[r#"ALTER TABLE "tabUser" ADD COLUMN "legacy" text"#],
		);

		let validation = MigrationValidator::offline().validate_migration(&migration).await;
		assert!(validation.valid);
		assert!(validation.score < 100);
		assert!(validation.warnings.iter().any(|w| w.starts_with("Rollback blocked")));
		assert_eq!(
			validation
				.warnings
				.iter()
				.filter(|w| w.contains("'legacy'"))
				.count(),
			1,
			"{:?}",
			validation.warnings
		);
		assert!(
			validation
				.recommendations
				.iter()
				.any(|r| r.contains("Export column 'legacy'"))
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_validate_migration_reports_sql_errors() {
		let mut diff = SchemaDiff::new();
		diff.added_columns
			.push(ColumnChange::added(ColumnDefinition::new("email", "text")));
		let migration = migration(diff, &["ALTER TABLE x ADD COLUMN (email"], &["SELECT 1"]);

		let validation = MigrationValidator::offline().validate_migration(&migration).await;
		assert!(!validation.valid);
		assert!(validation.score <= 100 - ERROR_PENALTY);
	}
}
