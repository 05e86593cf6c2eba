//! Index comparison
//!
//! Indexes match on their column list and uniqueness. A storage engine cannot
//! alter an index in place, so any other difference is expressed as a
//! remove/add pair.

use once_cell::sync::Lazy;
use regex::Regex;

use super::doctype::DocIndex;
use super::schema_diff::{IndexChange, IndexDefinition};
use crate::backends::IndexInfo;

/// Longest index name accepted by [`is_valid_index_name`]
pub const MAX_INDEX_NAME_LENGTH: usize = 64;

static INDEX_NAME_PATTERN: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex pattern"));

/// Index replacement for a declared index whose definition drifted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReplacement {
	pub remove: IndexChange,
	pub add: IndexChange,
}

/// Generate the canonical name of a declared index
///
/// # Examples
///
/// ```
/// use docsync_db::migrations::index_comparator::generate_index_name;
///
/// let columns = vec!["first_name".to_string(), "last_name".to_string()];
/// assert_eq!(generate_index_name("Sales Invoice", &columns, false), "idx_sales_invoice_first_name_last_name");
/// assert_eq!(generate_index_name("User", &["email".to_string()], true), "uniq_user_email");
/// ```
pub fn generate_index_name(doctype: &str, columns: &[String], unique: bool) -> String {
	let prefix = if unique { "uniq" } else { "idx" };
	let mut parts = Vec::with_capacity(columns.len() + 2);
	parts.push(prefix.to_string());
	parts.push(sanitize(doctype));
	parts.extend(columns.iter().map(|c| sanitize(c)));
	parts.join("_")
}

fn sanitize(part: &str) -> String {
	part.trim()
		.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() {
				c.to_ascii_lowercase()
			} else {
				'_'
			}
		})
		.collect()
}

/// Check whether a name can be used for an index
///
/// Names must be plain identifiers, at most [`MAX_INDEX_NAME_LENGTH`] long,
/// and must not use the `sqlite_` prefix reserved by the storage engine.
pub fn is_valid_index_name(name: &str) -> bool {
	name.len() <= MAX_INDEX_NAME_LENGTH
		&& INDEX_NAME_PATTERN.is_match(name)
		&& !name.to_ascii_lowercase().starts_with("sqlite_")
}

/// Canonical definition of a declared index
pub fn doc_index_to_index_definition(doctype: &str, index: &DocIndex) -> IndexDefinition {
	let name = index
		.name
		.clone()
		.unwrap_or_else(|| generate_index_name(doctype, &index.columns, index.unique));
	IndexDefinition::new(name, index.columns.clone(), index.unique)
}

/// Canonical definition of a discovered index
pub fn index_info_to_index_definition(info: &IndexInfo) -> IndexDefinition {
	let mut definition = IndexDefinition::new(info.name.clone(), info.columns.clone(), info.unique);
	definition.index_type = info.index_type.clone();
	definition
}

fn same_columns(a: &IndexDefinition, b: &IndexDefinition) -> bool {
	a.unique == b.unique
		&& a.columns.len() == b.columns.len()
		&& a
			.columns
			.iter()
			.zip(&b.columns)
			.all(|(x, y)| x.eq_ignore_ascii_case(y))
}

/// Find the discovered index with the same column list and uniqueness
pub fn find_matching_index<'a>(
	index: &IndexDefinition,
	indexes: &'a [IndexDefinition],
) -> Option<&'a IndexDefinition> {
	indexes.iter().find(|candidate| same_columns(index, candidate))
}

/// Compare a declared index against a discovered one
///
/// Returns `None` when both cover the same columns with the same uniqueness,
/// otherwise the remove/add pair that replaces `discovered` with `declared`.
pub fn compare_index_to_index(
	declared: &IndexDefinition,
	discovered: &IndexDefinition,
) -> Option<IndexReplacement> {
	if same_columns(declared, discovered) {
		return None;
	}
	Some(IndexReplacement {
		remove: IndexChange::removed(discovered.clone()),
		add: IndexChange::added(declared.clone()),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn cols(names: &[&str]) -> Vec<String> {
		names.iter().map(|s| s.to_string()).collect()
	}

	#[rstest]
	#[case("idx_user_email", true)]
	#[case("_private", true)]
	#[case("1st_index", false)]
	#[case("idx-user", false)]
	#[case("sqlite_autoindex_x", false)]
	#[case("", false)]
	fn test_index_name_validation(#[case] name: &str, #[case] expected: bool) {
		assert_eq!(is_valid_index_name(name), expected);
	}

	#[rstest]
	fn test_overlong_index_name_is_invalid() {
		assert!(!is_valid_index_name(&"a".repeat(MAX_INDEX_NAME_LENGTH + 1)));
		assert!(is_valid_index_name(&"a".repeat(MAX_INDEX_NAME_LENGTH)));
	}

	#[rstest]
	fn test_generated_names_are_valid() {
		let name = generate_index_name("Sales Order-Item", &cols(&["item code"]), false);
		assert_eq!(name, "idx_sales_order_item_item_code");
		assert!(is_valid_index_name(&name));
	}

	#[rstest]
	fn test_doc_index_keeps_explicit_name() {
		let index = DocIndex::new(cols(&["email"])).unique().with_name("user_email_key");
		let definition = doc_index_to_index_definition("User", &index);
		assert_eq!(definition.name, "user_email_key");
		assert!(definition.unique);
	}

	#[rstest]
	fn test_matching_ignores_names() {
		let declared = IndexDefinition::new("idx_user_email", cols(&["email"]), false);
		let discovered = vec![
			IndexDefinition::new("email_unique", cols(&["email"]), true),
			IndexDefinition::new("legacy_email_idx", cols(&["EMAIL"]), false),
		];

		let found = find_matching_index(&declared, &discovered).unwrap();
		assert_eq!(found.name, "legacy_email_idx");
	}

	#[rstest]
	fn test_column_order_matters() {
		let declared = IndexDefinition::new("idx", cols(&["a", "b"]), false);
		let discovered = vec![IndexDefinition::new("idx", cols(&["b", "a"]), false)];
		assert!(find_matching_index(&declared, &discovered).is_none());
	}

	#[rstest]
	fn test_changed_index_becomes_remove_and_add() {
		let declared = IndexDefinition::new("idx_user_name", cols(&["first_name", "last_name"]), false);
		let discovered = IndexDefinition::new("idx_user_name", cols(&["first_name"]), false);

		let replacement = compare_index_to_index(&declared, &discovered).unwrap();
		assert_eq!(replacement.remove.index.columns, cols(&["first_name"]));
		assert_eq!(replacement.add.index.columns, cols(&["first_name", "last_name"]));
		assert!(!replacement.remove.destructive);

		assert!(compare_index_to_index(&discovered, &discovered).is_none());
	}
}
