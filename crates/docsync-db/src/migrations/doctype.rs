//! Declared schema read model
//!
//! A [`DocType`] is the declared set of fields and indexes of one
//! entity. The metadata registry that owns DocTypes is an external
//! collaborator; the engine only reads them through [`DocTypeRegistry`].

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared field of a DocType
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocField {
	pub fieldname: String,
	/// Declared field type (`Data`, `Int`, `Currency`, `Check`, ...)
	pub fieldtype: String,
	#[serde(default)]
	pub label: String,
	#[serde(default)]
	pub required: bool,
	#[serde(default)]
	pub unique: bool,
	#[serde(default)]
	pub length: Option<u32>,
	#[serde(default)]
	pub precision: Option<u32>,
	#[serde(default)]
	pub default: Option<Value>,
	/// Previous name of the field, used to match a renamed column
	#[serde(default)]
	pub old_fieldname: Option<String>,
}

impl DocField {
	/// Create an optional, non-unique field
	///
	/// # Examples
	///
	/// ```
	/// use docsync_db::migrations::DocField;
	///
	/// let field = DocField::new("email", "Data").required().unique();
	/// assert_eq!(field.label, "email");
	/// assert!(field.required);
	/// assert!(field.unique);
	/// ```
	pub fn new(fieldname: impl Into<String>, fieldtype: impl Into<String>) -> Self {
		let fieldname = fieldname.into();
		Self {
			label: fieldname.clone(),
			fieldname,
			fieldtype: fieldtype.into(),
			required: false,
			unique: false,
			length: None,
			precision: None,
			default: None,
			old_fieldname: None,
		}
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn unique(mut self) -> Self {
		self.unique = true;
		self
	}

	pub fn with_length(mut self, length: u32) -> Self {
		self.length = Some(length);
		self
	}

	pub fn with_precision(mut self, precision: u32) -> Self {
		self.precision = Some(precision);
		self
	}

	pub fn with_default(mut self, default: impl Into<Value>) -> Self {
		self.default = Some(default.into());
		self
	}

	/// Mark the field as renamed from `old_fieldname`
	pub fn renamed_from(mut self, old_fieldname: impl Into<String>) -> Self {
		self.old_fieldname = Some(old_fieldname.into());
		self
	}
}

/// Declared index of a DocType
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocIndex {
	/// Explicit name; generated from the columns when absent
	#[serde(default)]
	pub name: Option<String>,
	pub columns: Vec<String>,
	#[serde(default)]
	pub unique: bool,
}

impl DocIndex {
	pub fn new(columns: Vec<String>) -> Self {
		Self {
			name: None,
			columns,
			unique: false,
		}
	}

	pub fn unique(mut self) -> Self {
		self.unique = true;
		self
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}
}

/// Declared schema of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocType {
	pub name: String,
	#[serde(default)]
	pub fields: Vec<DocField>,
	#[serde(default)]
	pub indexes: Vec<DocIndex>,
	#[serde(default)]
	pub table_name: Option<String>,
}

impl DocType {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			fields: Vec::new(),
			indexes: Vec::new(),
			table_name: None,
		}
	}

	pub fn with_field(mut self, field: DocField) -> Self {
		self.fields.push(field);
		self
	}

	pub fn with_index(mut self, index: DocIndex) -> Self {
		self.indexes.push(index);
		self
	}

	pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
		self.table_name = Some(table_name.into());
		self
	}

	/// Storage table backing this DocType
	///
	/// # Examples
	///
	/// ```
	/// use docsync_db::migrations::DocType;
	///
	/// assert_eq!(DocType::new("User").table_name(), "tabUser");
	/// assert_eq!(DocType::new("User").with_table_name("users").table_name(), "users");
	/// ```
	pub fn table_name(&self) -> String {
		self.table_name
			.clone()
			.unwrap_or_else(|| table_name_for(&self.name))
	}

	pub fn field(&self, fieldname: &str) -> Option<&DocField> {
		self.fields.iter().find(|f| f.fieldname == fieldname)
	}
}

/// Conventional table name for a DocType without an explicit `table_name`
pub fn table_name_for(doctype: &str) -> String {
	format!("tab{}", doctype)
}

/// Read-only access to declared schemas
#[async_trait]
pub trait DocTypeRegistry: Send + Sync {
	async fn get_doctype(&self, name: &str) -> Option<DocType>;

	/// Names of every registered DocType, in registration order
	async fn list_doctypes(&self) -> Vec<String>;
}

/// Registry backed by an in-process map
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
	doctypes: RwLock<IndexMap<String, DocType>>,
}

impl InMemoryRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register (or replace) a DocType
	pub fn register(&self, doctype: DocType) {
		self.doctypes.write().insert(doctype.name.clone(), doctype);
	}

	pub fn remove(&self, name: &str) -> Option<DocType> {
		self.doctypes.write().shift_remove(name)
	}

	pub fn len(&self) -> usize {
		self.doctypes.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.doctypes.read().is_empty()
	}
}

impl FromIterator<DocType> for InMemoryRegistry {
	fn from_iter<I: IntoIterator<Item = DocType>>(iter: I) -> Self {
		let registry = Self::new();
		for doctype in iter {
			registry.register(doctype);
		}
		registry
	}
}

#[async_trait]
impl DocTypeRegistry for InMemoryRegistry {
	async fn get_doctype(&self, name: &str) -> Option<DocType> {
		self.doctypes.read().get(name).cloned()
	}

	async fn list_doctypes(&self) -> Vec<String> {
		self.doctypes.read().keys().cloned().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_registry_preserves_registration_order() {
		let registry: InMemoryRegistry = ["Zeta", "Alpha", "Mid"]
			.into_iter()
			.map(DocType::new)
			.collect();

		assert_eq!(
			registry.list_doctypes().await,
			vec!["Zeta".to_string(), "Alpha".to_string(), "Mid".to_string()]
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_registry_replace_and_remove() {
		let registry = InMemoryRegistry::new();
		registry.register(DocType::new("User"));
		registry.register(DocType::new("User").with_field(DocField::new("email", "Data")));

		assert_eq!(registry.len(), 1);
		let user = registry.get_doctype("User").await.unwrap();
		assert!(user.field("email").is_some());

		assert!(registry.remove("User").is_some());
		assert!(registry.get_doctype("User").await.is_none());
		assert!(registry.is_empty());
	}

	#[rstest]
	fn test_doctype_deserializes_with_defaults() {
		let doctype: DocType = serde_json::from_str(
			r#"{"name": "Note", "fields": [{"fieldname": "title", "fieldtype": "Data", "required": true}]}"#,
		)
		.unwrap();

		assert_eq!(doctype.table_name(), "tabNote");
		let title = doctype.field("title").unwrap();
		assert!(title.required);
		assert!(!title.unique);
		assert!(title.default.is_none());
	}
}
