//! Schema diff analysis
//!
//! Pure functions over a completed [`SchemaDiff`]: statistics, complexity
//! and priority scores, destructive-change detection, structural validation,
//! and the warning and recommendation texts shown to an operator.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::field_comparator::{get_change_complexity, has_incompatible_type_change, is_system_field};
use super::index_comparator::is_valid_index_name;
use super::migration::MigrationValidation;
use super::schema_diff::{FieldChange, SchemaDiff};

/// Complexity above which a diff is considered large
pub const HIGH_COMPLEXITY_THRESHOLD: u32 = 50;

/// Column changes above which a diff is considered large
pub const LARGE_CHANGE_SET_THRESHOLD: usize = 10;

const ADD_COLUMN_SECS: f64 = 0.1;
const REMOVE_COLUMN_SECS: f64 = 0.2;
const MODIFY_COLUMN_SECS: f64 = 0.3;
const RENAME_COLUMN_SECS: f64 = 0.4;
const ADD_INDEX_SECS: f64 = 0.5;
const REMOVE_INDEX_SECS: f64 = 0.1;
const MIN_EXECUTION_SECS: f64 = 0.1;

const SENSITIVE_NAME_FRAGMENTS: [&str; 6] = ["password", "secret", "token", "api_key", "private_key", "credential"];

/// Per-category counts and flags of a diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStatistics {
	pub added_columns: usize,
	pub removed_columns: usize,
	pub modified_columns: usize,
	pub renamed_columns: usize,
	pub added_indexes: usize,
	pub removed_indexes: usize,
	pub has_changes: bool,
	pub requires_data_migration: bool,
	pub has_destructive_changes: bool,
	pub complexity_score: u32,
}

pub fn has_changes(diff: &SchemaDiff) -> bool {
	!diff.is_empty()
}

/// Whether applying the diff rewrites existing rows
///
/// Renames always do: the storage engine rebuilds the table.
pub fn requires_data_migration(diff: &SchemaDiff) -> bool {
	!diff.renamed_columns.is_empty()
		|| diff
			.modified_columns
			.iter()
			.any(|change| change.requires_data_migration)
}

fn is_risky_modification(change: &FieldChange) -> bool {
	change.destructive || has_incompatible_type_change(change)
}

/// Whether applying the diff can discard or reject existing data
pub fn has_destructive_changes(diff: &SchemaDiff) -> bool {
	diff.removed_columns.iter().any(|c| c.destructive)
		|| diff.removed_indexes.iter().any(|i| i.destructive)
		|| diff.modified_columns.iter().any(is_risky_modification)
}

pub fn get_diff_statistics(diff: &SchemaDiff) -> DiffStatistics {
	DiffStatistics {
		added_columns: diff.added_columns.len(),
		removed_columns: diff.removed_columns.len(),
		modified_columns: diff.modified_columns.len(),
		renamed_columns: diff.renamed_columns.len(),
		added_indexes: diff.added_indexes.len(),
		removed_indexes: diff.removed_indexes.len(),
		has_changes: has_changes(diff),
		requires_data_migration: requires_data_migration(diff),
		has_destructive_changes: has_destructive_changes(diff),
		complexity_score: get_complexity_score(diff),
	}
}

/// Weighted complexity of a whole diff; zero for an empty diff
pub fn get_complexity_score(diff: &SchemaDiff) -> u32 {
	let mut score = 0u32;

	for added in &diff.added_columns {
		score += 2;
		if added.column.unique {
			score += 3;
		}
		if !added.column.nullable {
			score += 2;
		}
	}

	for removed in &diff.removed_columns {
		score += if removed.destructive { 10 } else { 3 };
	}

	score += diff
		.modified_columns
		.iter()
		.map(get_change_complexity)
		.sum::<u32>();

	score += 5 * diff.renamed_columns.len() as u32;

	for added in &diff.added_indexes {
		score += 4 + added.index.columns.len() as u32;
		if added.index.unique {
			score += 3;
		}
	}

	for removed in &diff.removed_indexes {
		score += if removed.destructive { 8 } else { 2 };
	}

	score
}

/// Ordering key for scheduling migrations; higher runs under more scrutiny
pub fn get_migration_priority(diff: &SchemaDiff) -> u32 {
	let mut priority = get_complexity_score(diff);
	if has_destructive_changes(diff) {
		priority += 50;
	}
	if requires_data_migration(diff) {
		priority += 30;
	}
	priority += 100
		* diff
			.removed_columns
			.iter()
			.filter(|c| is_system_field(&c.fieldname))
			.count() as u32;
	priority
}

/// Whether a modification can be applied without an exclusive table rebuild
pub fn can_apply_online(change: &FieldChange) -> bool {
	!(change.changes.adds_uniqueness()
		|| change.changes.tightens_nullability()
		|| has_incompatible_type_change(change))
}

/// Rough execution time of a diff, in seconds
pub fn estimate_execution_time(diff: &SchemaDiff) -> f64 {
	let mut seconds = diff.added_columns.len() as f64 * ADD_COLUMN_SECS
		+ diff.removed_columns.len() as f64 * REMOVE_COLUMN_SECS
		+ diff.modified_columns.len() as f64 * MODIFY_COLUMN_SECS
		+ diff.renamed_columns.len() as f64 * RENAME_COLUMN_SECS
		+ diff.added_indexes.len() as f64 * ADD_INDEX_SECS
		+ diff.removed_indexes.len() as f64 * REMOVE_INDEX_SECS;

	if has_destructive_changes(diff) {
		seconds *= 1.5;
	}
	if requires_data_migration(diff) {
		seconds *= 2.0;
	}

	seconds.max(MIN_EXECUTION_SECS)
}

fn is_sensitive_name(name: &str) -> bool {
	let lower = name.to_ascii_lowercase();
	SENSITIVE_NAME_FRAGMENTS.iter().any(|f| lower.contains(f))
}

fn touched_column_names(diff: &SchemaDiff) -> impl Iterator<Item = &str> {
	diff.added_columns
		.iter()
		.map(|c| c.fieldname.as_str())
		.chain(diff.modified_columns.iter().map(|c| c.fieldname.as_str()))
		.chain(diff.renamed_columns.iter().map(|r| r.to.as_str()))
}

/// Structural validation of a diff
///
/// Errors make the diff unusable. Warnings and recommendations are advisory.
pub fn validate_schema_diff(diff: &SchemaDiff) -> MigrationValidation {
	let mut validation = MigrationValidation::new();

	let mut seen = HashSet::new();
	for name in touched_column_names(diff)
		.chain(diff.renamed_columns.iter().map(|r| r.from.as_str()))
	{
		if !seen.insert(name) {
			validation.add_error(format!("Duplicate column name in diff: '{}'", name));
		}
	}

	let mut seen_indexes = HashSet::new();
	for added in &diff.added_indexes {
		if !seen_indexes.insert(added.name.as_str()) {
			validation.add_error(format!("Duplicate index name in diff: '{}'", added.name));
		}
	}

	for added in &diff.added_columns {
		let column = &added.column;
		if column.name.trim().is_empty() {
			validation.add_error("Added column is missing a name");
		}
		if column.column_type.trim().is_empty() {
			validation.add_error(format!("Added column '{}' is missing a type", column.name));
		}
		if column.length == Some(0) {
			validation.add_error(format!("Added column '{}' has a non-positive length", column.name));
		}
		if column.precision == Some(0) {
			validation.add_error(format!(
				"Added column '{}' has a non-positive precision",
				column.name
			));
		}
	}

	for added in &diff.added_indexes {
		let index = &added.index;
		if index.name.trim().is_empty() {
			validation.add_error("Added index is missing a name");
		} else if !is_valid_index_name(&index.name) {
			validation.add_warning(format!("Index name '{}' is not a plain identifier", index.name));
		}
		if index.columns.is_empty() {
			validation.add_error(format!("Added index '{}' has no columns", index.name));
		}
	}

	if diff.column_change_count() > LARGE_CHANGE_SET_THRESHOLD {
		validation.add_warning(format!(
			"Large change set: {} column changes in one migration",
			diff.column_change_count()
		));
	}
	if diff.column_change_count() == 0 && diff.index_change_count() > 0 {
		validation.add_warning("Diff only changes indexes; consider applying it during low traffic");
	}

	for warning in get_warnings(diff) {
		validation.add_warning(warning);
	}
	for recommendation in get_recommendations(diff) {
		validation.add_recommendation(recommendation);
	}

	let penalty = 25 * validation.errors.len() as u32 + 5 * validation.warnings.len() as u32;
	validation.penalize(penalty);
	validation
}

/// Human-readable risk warnings
pub fn get_warnings(diff: &SchemaDiff) -> Vec<String> {
	let mut warnings = Vec::new();

	for removed in diff.removed_columns.iter().filter(|c| c.destructive) {
		warnings.push(format!(
			"Removing column '{}' will permanently delete its data",
			removed.fieldname
		));
	}

	for change in &diff.modified_columns {
		if change.destructive {
			warnings.push(format!(
				"Modifying column '{}' may truncate or reject existing data",
				change.fieldname
			));
		}
		if let Some(type_change) = &change.changes.column_type
			&& has_incompatible_type_change(change)
		{
			warnings.push(format!(
				"Column '{}' changes between incompatible types {} and {}",
				change.fieldname, type_change.from, type_change.to
			));
		}
		if change.changes.adds_uniqueness() {
			warnings.push(format!(
				"Adding a unique constraint to '{}' may fail if duplicate values exist",
				change.fieldname
			));
		}
		if change.changes.tightens_nullability() {
			warnings.push(format!(
				"Making '{}' required may fail if NULL values exist",
				change.fieldname
			));
		}
	}

	for removed in diff.removed_indexes.iter().filter(|i| i.destructive) {
		warnings.push(format!(
			"Dropping unique index '{}' removes a uniqueness guarantee",
			removed.name
		));
	}

	warnings
}

/// Operational recommendations for applying the diff
pub fn get_recommendations(diff: &SchemaDiff) -> Vec<String> {
	let mut recommendations = Vec::new();

	if has_destructive_changes(diff) {
		recommendations.push("Back up the table before applying this migration".to_string());
	}
	if requires_data_migration(diff) {
		recommendations.push("Test the data migration against a copy of production data".to_string());
	}
	if get_complexity_score(diff) > HIGH_COMPLEXITY_THRESHOLD {
		recommendations.push("Apply the migration in a staging environment first".to_string());
		recommendations.push("Consider splitting the change into incremental migrations".to_string());
	}
	if diff.modified_columns.iter().any(|c| !can_apply_online(c)) || !diff.renamed_columns.is_empty() {
		recommendations.push("Schedule a maintenance window for the table rebuild".to_string());
	}

	let sensitive: Vec<&str> = touched_column_names(diff).filter(|n| is_sensitive_name(n)).collect();
	if !sensitive.is_empty() {
		recommendations.push(format!(
			"Request a security review for sensitive columns: {}",
			sensitive.join(", ")
		));
	}

	recommendations
}
