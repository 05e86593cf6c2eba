//! Field-to-column comparison
//!
//! Compares a single declared [`DocField`] against a single discovered
//! [`ColumnInfo`], maps declared field types to storage types and scores
//! change complexity. Every function here is pure.

use std::collections::HashMap;

use serde_json::Value;

use super::doctype::DocField;
use super::engine::ComparisonOptions;
use super::schema_diff::{ColumnDefinition, FieldChange, FieldChanges, ValueChange};
use crate::backends::ColumnInfo;

/// Framework-managed columns present on every DocType table
pub const SYSTEM_FIELDS: [&str; 10] = [
	"name",
	"creation",
	"modified",
	"modified_by",
	"owner",
	"docstatus",
	"idx",
	"parent",
	"parentfield",
	"parenttype",
];

/// Declared field types that only shape the form and have no storage column
pub const NO_STORAGE_FIELD_TYPES: [&str; 9] = [
	"Section Break",
	"Column Break",
	"Tab Break",
	"HTML",
	"Button",
	"Heading",
	"Fold",
	"Table",
	"Table MultiSelect",
];

const TEXT_TYPES: [&str; 4] = ["text", "varchar", "char", "clob"];
const INTEGER_TYPES: [&str; 5] = ["integer", "int", "bigint", "smallint", "tinyint"];
const REAL_TYPES: [&str; 5] = ["real", "float", "double", "decimal", "numeric"];

/// Check whether a column name is framework-managed
///
/// # Examples
///
/// ```
/// use docsync_db::migrations::field_comparator::is_system_field;
///
/// assert!(is_system_field("modified_by"));
/// assert!(!is_system_field("email"));
/// ```
pub fn is_system_field(name: &str) -> bool {
	SYSTEM_FIELDS.contains(&name)
}

/// Whether a declared field type owns a storage column
pub fn has_storage(fieldtype: &str) -> bool {
	!NO_STORAGE_FIELD_TYPES.contains(&fieldtype)
}

/// Map a declared field type to its SQLite storage type
///
/// Custom mappings take precedence over the built-in table. Unrecognized
/// types fall back to `text`.
///
/// # Examples
///
/// ```
/// use docsync_db::migrations::DocField;
/// use docsync_db::migrations::field_comparator::map_field_type_to_sqlite_type;
///
/// assert_eq!(map_field_type_to_sqlite_type("Int", None, None), "integer");
/// let email = DocField::new("email", "Data").with_length(140);
/// assert_eq!(map_field_type_to_sqlite_type("Data", Some(&email), None), "varchar(140)");
/// assert_eq!(map_field_type_to_sqlite_type("Whatever", None, None), "text");
/// ```
pub fn map_field_type_to_sqlite_type(
	fieldtype: &str,
	field: Option<&DocField>,
	custom_mappings: Option<&HashMap<String, String>>,
) -> String {
	if let Some(mapped) = custom_mappings.and_then(|m| m.get(fieldtype)) {
		return mapped.clone();
	}

	let length = field.and_then(|f| f.length);
	let precision = field.and_then(|f| f.precision);

	match fieldtype {
		"Data" | "Link" | "Dynamic Link" | "Select" | "Password" | "Read Only" | "Phone"
		| "Autocomplete" | "Color" | "Attach" | "Attach Image" | "Barcode" => match length {
			Some(n) => format!("varchar({})", n),
			None => "text".to_string(),
		},
		"Small Text" | "Text" | "Long Text" | "Text Editor" | "Code" | "HTML Editor"
		| "Markdown Editor" | "JSON" | "Signature" | "Geolocation" => "text".to_string(),
		"Date" | "Datetime" | "Time" => "text".to_string(),
		"Int" | "Long Int" | "Check" => "integer".to_string(),
		"Float" | "Percent" | "Rating" | "Duration" => "real".to_string(),
		"Currency" => match precision {
			Some(p) => format!("decimal({})", p),
			None => "decimal".to_string(),
		},
		_ => "text".to_string(),
	}
}

/// Lowercased type name without any `(...)` suffix
///
/// # Examples
///
/// ```
/// use docsync_db::migrations::field_comparator::base_type;
///
/// assert_eq!(base_type("VARCHAR(140)"), "varchar");
/// assert_eq!(base_type("decimal(18, 6)"), "decimal");
/// ```
pub fn base_type(column_type: &str) -> String {
	column_type
		.split('(')
		.next()
		.unwrap_or_default()
		.trim()
		.to_ascii_lowercase()
}

fn type_arguments(column_type: &str) -> Vec<u32> {
	let Some(start) = column_type.find('(') else {
		return Vec::new();
	};
	let Some(end) = column_type[start..].find(')') else {
		return Vec::new();
	};
	column_type[start + 1..start + end]
		.split(',')
		.filter_map(|arg| arg.trim().parse().ok())
		.collect()
}

/// Length declared in a `varchar(N)`-style suffix
pub fn parse_length(column_type: &str) -> Option<u32> {
	match family(&base_type(column_type)) {
		TypeFamily::Text => type_arguments(column_type).first().copied(),
		_ => None,
	}
}

/// Precision declared in a `decimal(P[,S])`-style suffix
pub fn parse_precision(column_type: &str) -> Option<u32> {
	match family(&base_type(column_type)) {
		TypeFamily::Real => type_arguments(column_type).first().copied(),
		_ => None,
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeFamily {
	Text,
	Integer,
	Real,
	Other,
}

fn family(base: &str) -> TypeFamily {
	if TEXT_TYPES.contains(&base) {
		TypeFamily::Text
	} else if INTEGER_TYPES.contains(&base) {
		TypeFamily::Integer
	} else if REAL_TYPES.contains(&base) {
		TypeFamily::Real
	} else {
		TypeFamily::Other
	}
}

/// Base-type equivalence: suffixes are ignored and `text`/`varchar` are the same
fn base_types_equivalent(a: &str, b: &str) -> bool {
	let (a, b) = (base_type(a), base_type(b));
	if a == b {
		return true;
	}
	match (family(&a), family(&b)) {
		(TypeFamily::Text, TypeFamily::Text) | (TypeFamily::Integer, TypeFamily::Integer) => true,
		_ => false,
	}
}

/// Check whether two storage types can hold each other's values
///
/// # Examples
///
/// ```
/// use docsync_db::migrations::field_comparator::are_types_compatible;
///
/// assert!(are_types_compatible("varchar(140)", "text"));
/// assert!(are_types_compatible("integer", "real"));
/// assert!(!are_types_compatible("integer", "text"));
/// ```
pub fn are_types_compatible(a: &str, b: &str) -> bool {
	let (a, b) = (base_type(a), base_type(b));
	if a == b {
		return true;
	}
	match (family(&a), family(&b)) {
		(TypeFamily::Text, TypeFamily::Text)
		| (TypeFamily::Integer, TypeFamily::Integer)
		| (TypeFamily::Real, TypeFamily::Real)
		| (TypeFamily::Integer, TypeFamily::Real)
		| (TypeFamily::Real, TypeFamily::Integer) => true,
		_ => false,
	}
}

/// Whether converting stored values from `from` to `to` can lose or reject data
pub fn is_narrowing_type_change(from: &str, to: &str) -> bool {
	if base_types_equivalent(from, to) {
		return false;
	}
	match (family(&base_type(from)), family(&base_type(to))) {
		(_, TypeFamily::Text) => false,
		(TypeFamily::Integer, TypeFamily::Real) => false,
		(TypeFamily::Real, TypeFamily::Real) => false,
		(_, TypeFamily::Integer) => true,
		(TypeFamily::Text, TypeFamily::Real) => true,
		_ => !are_types_compatible(from, to),
	}
}

/// Expected storage type of a declared field
pub fn expected_column_type(field: &DocField, options: &ComparisonOptions) -> String {
	map_field_type_to_sqlite_type(
		&field.fieldtype,
		Some(field),
		Some(&options.custom_type_mappings),
	)
}

/// Normalize a declared default to the string form a database reports
pub fn normalize_declared_default(default: Option<&Value>) -> Option<String> {
	match default? {
		Value::Null => None,
		Value::String(s) if s.is_empty() => None,
		Value::String(s) => Some(s.clone()),
		Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
		other => Some(other.to_string()),
	}
}

/// Normalize a stored default expression: strip quotes, treat `NULL` as absent
pub fn normalize_stored_default(default: Option<&str>) -> Option<String> {
	let trimmed = default?.trim();
	if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
		return None;
	}
	let unquoted = trimmed
		.strip_prefix('\'')
		.and_then(|s| s.strip_suffix('\''))
		.or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
		.unwrap_or(trimmed);
	Some(unquoted.replace("''", "'"))
}

fn is_integer_zero(value: Option<&Value>) -> bool {
	matches!(value, Some(Value::Number(n)) if n.as_i64() == Some(0))
}

fn defaults_equal(declared: Option<&Value>, stored: Option<&str>) -> bool {
	let stored = normalize_stored_default(stored);
	// Checkbox convention: a declared 0 matches a column without default.
	// Applied to every field type.
	if stored.is_none() && is_integer_zero(declared) {
		return true;
	}
	normalize_declared_default(declared) == stored
}

/// Compare a declared field against a discovered column
///
/// Returns `None` when no dimension differs. Every `from` value is the
/// discovered one, every `to` value the declared one.
pub fn compare_field_to_column(
	field: &DocField,
	column: &ColumnInfo,
	options: &ComparisonOptions,
) -> Option<FieldChange> {
	let mut changes = FieldChanges::default();
	let mut destructive = false;

	let expected_type = expected_column_type(field, options);
	if !base_types_equivalent(&column.column_type, &expected_type) {
		destructive |= is_narrowing_type_change(&column.column_type, &expected_type);
		changes.column_type = Some(ValueChange::new(
			column.column_type.clone(),
			expected_type.clone(),
		));
	}

	let expected_nullable = !field.required;
	if column.nullable != expected_nullable {
		changes.nullable = Some(ValueChange::new(column.nullable, expected_nullable));
	}

	if column.unique != field.unique {
		changes.unique = Some(ValueChange::new(column.unique, field.unique));
	}

	if !defaults_equal(field.default.as_ref(), column.default.as_deref()) {
		changes.default = Some(ValueChange::new(
			normalize_stored_default(column.default.as_deref()),
			normalize_declared_default(field.default.as_ref()),
		));
	}

	// Only lengths and precisions the storage type actually carries count
	if let Some(length) = parse_length(&expected_type) {
		let current = parse_length(&column.column_type);
		if current != Some(length) {
			changes.length = Some(ValueChange::new(current, Some(length)));
		}
	}

	if let Some(precision) = parse_precision(&expected_type) {
		let current = parse_precision(&column.column_type);
		if current != Some(precision) {
			changes.precision = Some(ValueChange::new(current, Some(precision)));
		}
	}

	if changes.is_empty() {
		return None;
	}

	destructive |= changes.shrinks_length() || changes.shrinks_precision();
	let requires_data_migration = changes.column_type.is_some()
		|| changes.tightens_nullability()
		|| changes.adds_uniqueness();

	Some(FieldChange {
		fieldname: field.fieldname.clone(),
		changes,
		requires_data_migration,
		destructive,
	})
}

/// Find the discovered column that stores a declared field
///
/// Lookup order is exact name, case-insensitive name, then `old_fieldname`.
/// A name match, exact or not, is accepted regardless of type unless
/// `strict_type_matching` is set. A match through `old_fieldname` always
/// requires compatible types.
pub fn find_matching_column<'a>(
	field: &DocField,
	columns: &'a [ColumnInfo],
	options: &ComparisonOptions,
) -> Option<&'a ColumnInfo> {
	let expected_type = expected_column_type(field, options);
	let compatible = |column: &ColumnInfo| are_types_compatible(&column.column_type, &expected_type);
	let accepts = |column: &ColumnInfo| !options.strict_type_matching || compatible(column);

	if let Some(column) = columns.iter().find(|c| c.name == field.fieldname) {
		return accepts(column).then_some(column);
	}

	if let Some(column) = columns
		.iter()
		.find(|c| c.name.eq_ignore_ascii_case(&field.fieldname))
	{
		return accepts(column).then_some(column);
	}

	let old = field.old_fieldname.as_deref()?;
	columns
		.iter()
		.find(|c| c.name.eq_ignore_ascii_case(old) && compatible(*c))
}

/// Weighted complexity of a single column modification
///
/// # Examples
///
/// ```
/// use docsync_db::migrations::{FieldChange, FieldChanges, ValueChange};
/// use docsync_db::migrations::field_comparator::get_change_complexity;
///
/// let change = FieldChange {
///     fieldname: "email".to_string(),
///     changes: FieldChanges {
///         unique: Some(ValueChange::new(false, true)),
///         ..Default::default()
///     },
///     requires_data_migration: true,
///     destructive: false,
/// };
/// assert_eq!(get_change_complexity(&change), 10);
/// ```
pub fn get_change_complexity(change: &FieldChange) -> u32 {
	let changes = &change.changes;
	let mut score = 0;

	if let Some(ValueChange { from, to }) = &changes.column_type {
		score += 10;
		if !are_types_compatible(from, to) {
			score += 20;
		}
	}
	if changes.nullable.is_some() {
		score += 5;
		if changes.tightens_nullability() {
			score += 5;
		}
	}
	if changes.unique.is_some() {
		score += 7;
		if changes.adds_uniqueness() {
			score += 3;
		}
	}
	if changes.length.is_some() {
		score += 3;
		if changes.shrinks_length() {
			score += 5;
		}
	}
	if changes.precision.is_some() {
		score += 3;
		if changes.shrinks_precision() {
			score += 5;
		}
	}
	if changes.default.is_some() {
		score += 2;
	}

	score
}

/// Whether a modification swaps a column to a type it cannot hold
pub fn has_incompatible_type_change(change: &FieldChange) -> bool {
	change
		.changes
		.column_type
		.as_ref()
		.is_some_and(|t| !are_types_compatible(&t.from, &t.to))
}

/// Canonical definition of a declared field
pub fn field_to_column_definition(
	field: &DocField,
	custom_mappings: Option<&HashMap<String, String>>,
) -> ColumnDefinition {
	let column_type = map_field_type_to_sqlite_type(&field.fieldtype, Some(field), custom_mappings);
	ColumnDefinition {
		name: field.fieldname.clone(),
		length: parse_length(&column_type),
		precision: parse_precision(&column_type),
		nullable: !field.required,
		default_value: normalize_declared_default(field.default.as_ref()),
		unique: field.unique,
		column_type,
		primary_key: false,
		auto_increment: false,
		foreign_key: None,
		check: None,
		collation: None,
	}
}

/// Canonical definition of a discovered column
pub fn column_info_to_column_definition(column: &ColumnInfo) -> ColumnDefinition {
	ColumnDefinition {
		name: column.name.clone(),
		column_type: column.column_type.to_ascii_lowercase(),
		nullable: column.nullable,
		default_value: normalize_stored_default(column.default.as_deref()),
		primary_key: column.primary_key,
		auto_increment: column.auto_increment,
		unique: column.unique,
		length: parse_length(&column.column_type),
		precision: parse_precision(&column.column_type),
		foreign_key: None,
		check: None,
		collation: None,
	}
}
