//! DocType and table fixtures
//!
//! The `User` fixtures describe a declared schema and a table that are
//! exactly in sync, so tests can introduce one difference at a time.

use docsync_db::backends::{ColumnInfo, IndexInfo};
use docsync_db::migrations::{DocField, DocIndex, DocType, InMemoryRegistry};
use rstest::*;

use super::recording::RecordingDatabase;

/// `User` DocType: unique required email, full name, age and an index on full name
#[fixture]
pub fn user_doctype() -> DocType {
	DocType::new("User")
		.with_field(DocField::new("email", "Data").with_length(140).required().unique())
		.with_field(DocField::new("full_name", "Data").with_length(140))
		.with_field(DocField::new("age", "Int"))
		.with_index(DocIndex::new(vec!["full_name".to_string()]))
}

/// Columns of a `tabUser` table in sync with [`user_doctype`]
#[fixture]
pub fn user_columns() -> Vec<ColumnInfo> {
	vec![
		ColumnInfo::new("name", "varchar(140)").primary_key(),
		ColumnInfo::new("creation", "text"),
		ColumnInfo::new("modified", "text"),
		ColumnInfo::new("email", "varchar(140)").not_null().unique(),
		ColumnInfo::new("full_name", "varchar(140)"),
		ColumnInfo::new("age", "integer"),
	]
}

/// Indexes of a `tabUser` table in sync with [`user_doctype`]
#[fixture]
pub fn user_indexes() -> Vec<IndexInfo> {
	let mut autoindex = IndexInfo::new("sqlite_autoindex_tabUser_1", vec!["name".to_string()], true);
	autoindex.origin = Some("pk".to_string());

	let mut full_name = IndexInfo::new("idx_user_full_name", vec!["full_name".to_string()], false);
	full_name.origin = Some("c".to_string());

	vec![autoindex, full_name]
}

/// `Note` DocType with layout-only fields mixed in
#[fixture]
pub fn note_doctype() -> DocType {
	DocType::new("Note")
		.with_field(DocField::new("title", "Data").with_length(140).required())
		.with_field(DocField::new("details_section", "Section Break"))
		.with_field(DocField::new("content", "Text Editor"))
		.with_field(DocField::new("public", "Check").with_default(0))
}

/// Registry holding [`user_doctype`] and [`note_doctype`]
#[fixture]
pub fn registry(user_doctype: DocType, note_doctype: DocType) -> InMemoryRegistry {
	[user_doctype, note_doctype].into_iter().collect()
}

/// Recording database serving a `tabUser` table in sync with [`user_doctype`]
#[fixture]
pub fn synced_user_database(user_columns: Vec<ColumnInfo>, user_indexes: Vec<IndexInfo>) -> RecordingDatabase {
	RecordingDatabase::new().with_table("tabUser", user_columns, user_indexes)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[rstest]
	fn test_user_fixtures_line_up(user_doctype: DocType, user_columns: Vec<ColumnInfo>) {
		assert_eq!(user_doctype.table_name(), "tabUser");
		for field in &user_doctype.fields {
			assert!(user_columns.iter().any(|c| c.name == field.fieldname));
		}
	}

	#[rstest]
	fn test_registry_fixture(registry: InMemoryRegistry) {
		assert_eq!(registry.len(), 2);
	}
}
