//! Schema diff data model
//!
//! A [`SchemaDiff`] is the structured set of changes that reconciles a
//! discovered table with its declared DocType:
//! - Column additions/removals
//! - Column modifications (per-dimension `from`/`to` pairs)
//! - Index additions/removals
//! - Column renames
//!
//! A diff is produced fresh by every comparison and is not mutated after it
//! is returned.

use serde::{Deserialize, Serialize};

/// Canonical description of a storage column
///
/// Both declared fields and discovered columns are converted into this shape
/// before they are compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
	pub name: String,
	/// Base type plus optional length/precision suffix, e.g. `varchar(140)`
	#[serde(rename = "type")]
	pub column_type: String,
	pub nullable: bool,
	pub default_value: Option<String>,
	pub primary_key: bool,
	pub auto_increment: bool,
	pub unique: bool,
	pub length: Option<u32>,
	pub precision: Option<u32>,
	pub foreign_key: Option<String>,
	pub check: Option<String>,
	pub collation: Option<String>,
}

impl ColumnDefinition {
	/// Create a nullable column with no constraints
	pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			column_type: column_type.into(),
			nullable: true,
			default_value: None,
			primary_key: false,
			auto_increment: false,
			unique: false,
			length: None,
			precision: None,
			foreign_key: None,
			check: None,
			collation: None,
		}
	}

	/// Whether two definitions describe the same storage shape, ignoring
	/// the column name.
	///
	/// # Examples
	///
	/// ```
	/// use docsync_db::migrations::ColumnDefinition;
	///
	/// let old = ColumnDefinition::new("user_mail", "text");
	/// let new = ColumnDefinition::new("user_email", "text");
	/// assert!(old.same_shape(&new));
	/// assert!(!old.same_shape(&ColumnDefinition::new("user_email", "integer")));
	/// ```
	pub fn same_shape(&self, other: &ColumnDefinition) -> bool {
		self.column_type == other.column_type
			&& self.nullable == other.nullable
			&& defaults_match(self.default_value.as_deref(), other.default_value.as_deref())
			&& self.primary_key == other.primary_key
			&& self.auto_increment == other.auto_increment
			&& self.unique == other.unique
			&& self.length == other.length
			&& self.precision == other.precision
			&& self.foreign_key == other.foreign_key
			&& self.check == other.check
			&& self.collation == other.collation
	}
}

/// A `0` default and no default count as equal, as in field comparison
fn defaults_match(a: Option<&str>, b: Option<&str>) -> bool {
	match (a, b) {
		(Some("0"), None) | (None, Some("0")) => true,
		(a, b) => a == b,
	}
}

/// Addition or removal of a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnChange {
	pub fieldname: String,
	pub column: ColumnDefinition,
	pub destructive: bool,
}

impl ColumnChange {
	/// A column to add. Additions never lose data.
	pub fn added(column: ColumnDefinition) -> Self {
		Self {
			fieldname: column.name.clone(),
			column,
			destructive: false,
		}
	}

	/// A column to drop. Dropping always loses the column's data.
	pub fn removed(column: ColumnDefinition) -> Self {
		Self {
			fieldname: column.name.clone(),
			column,
			destructive: true,
		}
	}
}

/// A `from`/`to` pair for one changed dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChange<T> {
	pub from: T,
	pub to: T,
}

impl<T> ValueChange<T> {
	pub fn new(from: T, to: T) -> Self {
		Self { from, to }
	}
}

/// Per-dimension changes of a modified column
///
/// `from` is always the discovered value, `to` the declared one. Only
/// dimensions that differ are populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChanges {
	#[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
	pub column_type: Option<ValueChange<String>>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub length: Option<ValueChange<Option<u32>>>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub nullable: Option<ValueChange<bool>>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub unique: Option<ValueChange<bool>>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub default: Option<ValueChange<Option<String>>>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub precision: Option<ValueChange<Option<u32>>>,
}

impl FieldChanges {
	pub fn is_empty(&self) -> bool {
		self.column_type.is_none()
			&& self.length.is_none()
			&& self.nullable.is_none()
			&& self.unique.is_none()
			&& self.default.is_none()
			&& self.precision.is_none()
	}

	/// A nullable column becomes required
	pub fn tightens_nullability(&self) -> bool {
		matches!(self.nullable, Some(ValueChange { from: true, to: false }))
	}

	/// A non-unique column becomes unique
	pub fn adds_uniqueness(&self) -> bool {
		matches!(self.unique, Some(ValueChange { from: false, to: true }))
	}

	pub fn shrinks_length(&self) -> bool {
		shrinks(&self.length)
	}

	pub fn shrinks_precision(&self) -> bool {
		shrinks(&self.precision)
	}
}

fn shrinks(change: &Option<ValueChange<Option<u32>>>) -> bool {
	match change {
		Some(ValueChange {
			from: Some(from),
			to: Some(to),
		}) => to < from,
		_ => false,
	}
}

/// Modification of an existing column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
	pub fieldname: String,
	pub changes: FieldChanges,
	/// Existing rows must be rewritten (type conversion, new NOT NULL, new UNIQUE)
	pub requires_data_migration: bool,
	/// Existing data could be truncated or rejected
	pub destructive: bool,
}

/// Canonical description of an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
	pub name: String,
	pub columns: Vec<String>,
	pub unique: bool,
	#[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
	pub index_type: Option<String>,
	#[serde(rename = "where", skip_serializing_if = "Option::is_none", default)]
	pub where_clause: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub order: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub collation: Option<String>,
}

impl IndexDefinition {
	pub fn new(name: impl Into<String>, columns: Vec<String>, unique: bool) -> Self {
		Self {
			name: name.into(),
			columns,
			unique,
			index_type: None,
			where_clause: None,
			order: None,
			collation: None,
		}
	}
}

/// Addition or removal of an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexChange {
	pub name: String,
	pub index: IndexDefinition,
	pub destructive: bool,
}

impl IndexChange {
	pub fn added(index: IndexDefinition) -> Self {
		Self {
			name: index.name.clone(),
			index,
			destructive: false,
		}
	}

	/// Dropping a unique index removes a constraint existing writers may rely on
	pub fn removed(index: IndexDefinition) -> Self {
		Self {
			name: index.name.clone(),
			destructive: index.unique,
			index,
		}
	}
}

/// A column renamed in place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
	pub from: String,
	pub to: String,
	pub column: ColumnDefinition,
}

/// Structured difference between a declared schema and a live table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
	pub added_columns: Vec<ColumnChange>,
	pub removed_columns: Vec<ColumnChange>,
	pub modified_columns: Vec<FieldChange>,
	pub added_indexes: Vec<IndexChange>,
	pub removed_indexes: Vec<IndexChange>,
	pub renamed_columns: Vec<ColumnRename>,
}

impl SchemaDiff {
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether all six change lists are empty
	pub fn is_empty(&self) -> bool {
		self.added_columns.is_empty()
			&& self.removed_columns.is_empty()
			&& self.modified_columns.is_empty()
			&& self.added_indexes.is_empty()
			&& self.removed_indexes.is_empty()
			&& self.renamed_columns.is_empty()
	}

	/// Number of column-level changes (additions, removals, modifications, renames)
	pub fn column_change_count(&self) -> usize {
		self.added_columns.len()
			+ self.removed_columns.len()
			+ self.modified_columns.len()
			+ self.renamed_columns.len()
	}

	pub fn index_change_count(&self) -> usize {
		self.added_indexes.len() + self.removed_indexes.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_column_change_destructiveness() {
		let added = ColumnChange::added(ColumnDefinition::new("email", "text"));
		let removed = ColumnChange::removed(ColumnDefinition::new("legacy", "text"));

		assert!(!added.destructive);
		assert!(removed.destructive);
		assert_eq!(removed.fieldname, "legacy");
	}

	#[rstest]
	#[case(Some(140), Some(100), true)]
	#[case(Some(100), Some(140), false)]
	#[case(None, Some(140), false)]
	fn test_length_shrink_detection(
		#[case] from: Option<u32>,
		#[case] to: Option<u32>,
		#[case] expected: bool,
	) {
		let changes = FieldChanges {
			length: Some(ValueChange::new(from, to)),
			..Default::default()
		};
		assert_eq!(changes.shrinks_length(), expected);
	}

	#[rstest]
	fn test_field_changes_serialize_only_populated_dimensions() {
		let changes = FieldChanges {
			column_type: Some(ValueChange::new("integer".to_string(), "text".to_string())),
			..Default::default()
		};

		let json = serde_json::to_value(&changes).unwrap();
		assert_eq!(
			json,
			serde_json::json!({"type": {"from": "integer", "to": "text"}})
		);
	}

	#[rstest]
	fn test_removed_unique_index_is_destructive() {
		let unique = IndexChange::removed(IndexDefinition::new(
			"uniq_user_email",
			vec!["email".to_string()],
			true,
		));
		let plain = IndexChange::removed(IndexDefinition::new(
			"idx_user_age",
			vec!["age".to_string()],
			false,
		));

		assert!(unique.destructive);
		assert!(!plain.destructive);
	}
}
