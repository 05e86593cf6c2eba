//! Schema comparison engine
//!
//! Orchestrates the field and index comparators against introspected table
//! structure to build a [`SchemaDiff`] for one DocType, or for many.
//!
//! ## Stages
//!
//! Each `compare_schema` call walks through the [`ComparisonStage`]s in
//! order, reporting each one to an optional [`ProgressCallback`]:
//!
//! 1. Loading DocType (10%)
//! 2. Loading table schema (30%)
//! 3. Comparing schemas (50%)
//! 4. Analyzing differences (80%)
//! 5. Complete (100%)
//!
//! A table that does not exist yet is not an error: every declared column
//! and index is reported as an addition.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cache::{CacheStats, SchemaCache};
use super::config::ComparisonConfig;
use super::doctype::{DocField, DocType, DocTypeRegistry, table_name_for};
use super::field_comparator::{
	column_info_to_column_definition, compare_field_to_column, field_to_column_definition,
	find_matching_column, has_storage, is_system_field,
};
use super::index_comparator::{
	compare_index_to_index, doc_index_to_index_definition, find_matching_index,
	index_info_to_index_definition,
};
use super::schema_diff::{ColumnChange, ColumnRename, IndexChange, IndexDefinition, SchemaDiff};
use super::{Result, SchemaComparisonError};
use crate::backends::{ColumnInfo, Database, DatabaseError, IndexInfo};

/// Default number of schemas compared concurrently by [`SchemaComparisonEngine::batch_compare_schemas`]
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Default name similarity a removed/added pair must exceed to count as a rename
pub const DEFAULT_RENAME_THRESHOLD: f64 = 0.7;

/// Per-call comparison options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonOptions {
	/// Skip framework-managed fields on the declared side
	pub exclude_system_fields: bool,
	/// Require compatible types even for exact name matches
	pub strict_type_matching: bool,
	/// Declared field type to storage type overrides
	pub custom_type_mappings: HashMap<String, String>,
	/// Serve introspection from the engine's cache
	pub use_cache: bool,
}

impl Default for ComparisonOptions {
	fn default() -> Self {
		Self {
			exclude_system_fields: true,
			strict_type_matching: false,
			custom_type_mappings: HashMap::new(),
			use_cache: true,
		}
	}
}

impl From<&ComparisonConfig> for ComparisonOptions {
	fn from(config: &ComparisonConfig) -> Self {
		Self {
			exclude_system_fields: config.exclude_system_fields,
			strict_type_matching: config.strict_type_matching,
			custom_type_mappings: config.custom_type_mappings.clone(),
			use_cache: true,
		}
	}
}

/// Stage of a single comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStage {
	LoadingDocType,
	LoadingTableSchema,
	ComparingSchemas,
	AnalyzingDifferences,
	Complete,
}

impl ComparisonStage {
	pub fn percent(&self) -> u8 {
		match self {
			ComparisonStage::LoadingDocType => 10,
			ComparisonStage::LoadingTableSchema => 30,
			ComparisonStage::ComparingSchemas => 50,
			ComparisonStage::AnalyzingDifferences => 80,
			ComparisonStage::Complete => 100,
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			ComparisonStage::LoadingDocType => "Loading DocType",
			ComparisonStage::LoadingTableSchema => "Loading table schema",
			ComparisonStage::ComparingSchemas => "Comparing schemas",
			ComparisonStage::AnalyzingDifferences => "Analyzing differences",
			ComparisonStage::Complete => "Complete",
		}
	}
}

impl fmt::Display for ComparisonStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Progress event delivered to a [`ProgressCallback`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonProgress {
	pub doctype: String,
	pub stage: ComparisonStage,
	pub percent: u8,
	pub message: String,
}

/// Observer of comparison progress
pub type ProgressCallback = Arc<dyn Fn(&ComparisonProgress) + Send + Sync>;

/// A comparison that failed inside a batch
#[derive(Debug)]
pub struct BatchItemError {
	pub doctype: String,
	pub error: SchemaComparisonError,
}

/// Outcome of comparing many schemas
///
/// One entity's failure never aborts the batch.
#[derive(Debug, Default)]
pub struct BatchComparisonResult {
	/// Successful diffs keyed by DocType name, in request order
	pub results: IndexMap<String, SchemaDiff>,
	pub errors: Vec<BatchItemError>,
}

impl BatchComparisonResult {
	pub fn is_success(&self) -> bool {
		self.errors.is_empty()
	}

	/// DocTypes whose diff is non-empty
	pub fn changed(&self) -> impl Iterator<Item = (&String, &SchemaDiff)> {
		self.results.iter().filter(|(_, diff)| !diff.is_empty())
	}

	fn record(&mut self, doctype: &str, outcome: Result<SchemaDiff>) {
		match outcome {
			Ok(diff) => {
				self.results.insert(doctype.to_string(), diff);
			}
			Err(error) => {
				warn!(doctype = %doctype, error = %error, "schema comparison failed");
				self.errors.push(BatchItemError {
					doctype: doctype.to_string(),
					error,
				});
			}
		}
	}
}

/// Introspected structure of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStructure {
	pub columns: Vec<ColumnInfo>,
	pub indexes: Vec<IndexInfo>,
}

/// Compares declared DocTypes against live tables
pub struct SchemaComparisonEngine {
	registry: Arc<dyn DocTypeRegistry>,
	database: Arc<dyn Database>,
	cache: SchemaCache,
	/// DocType name to table name, recorded on introspection
	table_names: RwLock<HashMap<String, String>>,
	options: ComparisonOptions,
	batch_size: usize,
	rename_threshold: f64,
}

impl SchemaComparisonEngine {
	pub fn new(registry: Arc<dyn DocTypeRegistry>, database: Arc<dyn Database>) -> Self {
		Self {
			registry,
			database,
			cache: SchemaCache::default(),
			table_names: RwLock::new(HashMap::new()),
			options: ComparisonOptions::default(),
			batch_size: DEFAULT_BATCH_SIZE,
			rename_threshold: DEFAULT_RENAME_THRESHOLD,
		}
	}

	/// Build an engine from the `comparison` section of a configuration
	pub fn from_config(
		registry: Arc<dyn DocTypeRegistry>,
		database: Arc<dyn Database>,
		config: &ComparisonConfig,
	) -> Self {
		Self {
			registry,
			database,
			cache: SchemaCache::new(Duration::from_secs(config.cache_ttl_secs)),
			table_names: RwLock::new(HashMap::new()),
			options: ComparisonOptions::from(config),
			batch_size: config.batch_size.max(1),
			rename_threshold: config.rename_similarity_threshold,
		}
	}

	/// Default options used when a call passes none
	pub fn with_options(mut self, options: ComparisonOptions) -> Self {
		self.options = options;
		self
	}

	pub fn with_batch_size(mut self, batch_size: usize) -> Self {
		self.batch_size = batch_size.max(1);
		self
	}

	pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
		self.cache = SchemaCache::new(ttl);
		self
	}

	pub fn with_rename_threshold(mut self, threshold: f64) -> Self {
		self.rename_threshold = threshold;
		self
	}

	pub fn options(&self) -> &ComparisonOptions {
		&self.options
	}

	pub fn batch_size(&self) -> usize {
		self.batch_size
	}

	/// Compare one DocType against its table
	///
	/// # Errors
	///
	/// - [`SchemaComparisonError::DocTypeNotFound`] if the registry has no such DocType
	/// - [`SchemaComparisonError::SchemaValidation`], `FieldComparison` or
	///   `IndexComparison` if the declared schema is malformed
	/// - [`SchemaComparisonError::Database`] if introspection fails for any
	///   reason other than a missing table
	pub async fn compare_schema(
		&self,
		name: &str,
		options: Option<&ComparisonOptions>,
		progress: Option<&ProgressCallback>,
	) -> Result<SchemaDiff> {
		let options = options.unwrap_or(&self.options);

		report(progress, name, ComparisonStage::LoadingDocType);
		let doctype = self.registry.get_doctype(name).await.ok_or_else(|| {
			SchemaComparisonError::DocTypeNotFound {
				doctype: name.to_string(),
			}
		})?;
		validate_doctype(&doctype)?;

		report(progress, name, ComparisonStage::LoadingTableSchema);
		let structure = match self.introspect_table(&doctype, options).await {
			Ok(structure) => Some(structure),
			Err(SchemaComparisonError::TableNotFound { table, .. }) => {
				info!(doctype = %name, table = %table, "table does not exist yet, treating every field as new");
				None
			}
			Err(e) => return Err(e),
		};

		report(progress, name, ComparisonStage::ComparingSchemas);
		let mut diff = match structure {
			Some(structure) => build_diff(&doctype, &structure, options),
			None => bootstrap_diff(&doctype, options),
		};

		report(progress, name, ComparisonStage::AnalyzingDifferences);
		detect_column_renames(&mut diff, self.rename_threshold);

		report(progress, name, ComparisonStage::Complete);
		debug!(
			doctype = %name,
			added = diff.added_columns.len(),
			removed = diff.removed_columns.len(),
			modified = diff.modified_columns.len(),
			renamed = diff.renamed_columns.len(),
			"schema comparison finished"
		);
		Ok(diff)
	}

	/// Columns and indexes of the table backing `doctype`
	///
	/// A missing table is reported as [`SchemaComparisonError::TableNotFound`].
	pub async fn introspect_table(
		&self,
		doctype: &DocType,
		options: &ComparisonOptions,
	) -> Result<TableStructure> {
		let table = doctype.table_name();
		self.table_names
			.write()
			.insert(doctype.name.clone(), table.clone());

		if options.use_cache
			&& let Some(entry) = self.cache.get(&table)
		{
			debug!(table = %table, "table structure served from cache");
			return Ok(TableStructure {
				columns: entry.columns,
				indexes: entry.indexes,
			});
		}

		let map_err = |source: DatabaseError| match source {
			DatabaseError::TableNotFound(table) => SchemaComparisonError::TableNotFound {
				doctype: Some(doctype.name.clone()),
				table,
			},
			source => SchemaComparisonError::Database {
				doctype: doctype.name.clone(),
				source,
			},
		};

		let columns = self.database.get_columns(&table).await.map_err(map_err)?;
		let indexes = self.database.get_indexes(&table).await.map_err(map_err)?;

		if options.use_cache {
			self.cache.insert(table, columns.clone(), indexes.clone());
		}

		Ok(TableStructure { columns, indexes })
	}

	/// Compare every DocType the registry lists, one after another
	pub async fn compare_all_schemas(&self, options: Option<&ComparisonOptions>) -> BatchComparisonResult {
		let mut result = BatchComparisonResult::default();
		for name in self.registry.list_doctypes().await {
			let outcome = self.compare_schema(&name, options, None).await;
			result.record(&name, outcome);
		}
		result
	}

	/// Compare many DocTypes, running up to `batch_size` comparisons at a time
	pub async fn batch_compare_schemas<S: AsRef<str>>(
		&self,
		names: &[S],
		options: Option<&ComparisonOptions>,
	) -> BatchComparisonResult {
		let mut result = BatchComparisonResult::default();
		for chunk in names.chunks(self.batch_size) {
			let outcomes = join_all(
				chunk
					.iter()
					.map(|name| self.compare_schema(name.as_ref(), options, None)),
			)
			.await;
			for (name, outcome) in chunk.iter().zip(outcomes) {
				result.record(name.as_ref(), outcome);
			}
		}
		info!(
			compared = result.results.len(),
			failed = result.errors.len(),
			"batch schema comparison finished"
		);
		result
	}

	/// Invalidate the cached structure of one table, or of every table
	///
	/// `name` may be a table name or a DocType name. DocTypes with an explicit
	/// table name are resolved through the tables seen during introspection.
	pub fn clear_cache(&self, name: Option<&str>) {
		match name {
			Some(name) => {
				let mapped = self.table_names.read().get(name).cloned();
				let by_table = self.cache.invalidate(name);
				let by_convention = self.cache.invalidate(&table_name_for(name));
				let by_mapping = mapped.is_some_and(|table| self.cache.invalidate(&table));
				debug!(
					name = %name,
					invalidated = by_table || by_convention || by_mapping,
					"schema cache entry cleared"
				);
			}
			None => {
				self.cache.clear();
				debug!("schema cache cleared");
			}
		}
	}

	pub fn cache_stats(&self) -> CacheStats {
		self.cache.stats()
	}
}

fn report(progress: Option<&ProgressCallback>, doctype: &str, stage: ComparisonStage) {
	if let Some(callback) = progress {
		callback(&ComparisonProgress {
			doctype: doctype.to_string(),
			stage,
			percent: stage.percent(),
			message: format!("{}: {}", stage.label(), doctype),
		});
	}
}

/// Reject declared schemas the comparators cannot work with
fn validate_doctype(doctype: &DocType) -> Result<()> {
	let mut seen = HashSet::new();
	for field in &doctype.fields {
		if field.fieldname.trim().is_empty() {
			return Err(SchemaComparisonError::FieldComparison {
				doctype: Some(doctype.name.clone()),
				field: field.label.clone(),
				details: "field has an empty fieldname".to_string(),
			});
		}
		if !seen.insert(field.fieldname.as_str()) {
			return Err(SchemaComparisonError::SchemaValidation {
				doctype: Some(doctype.name.clone()),
				details: format!("duplicate fieldname '{}'", field.fieldname),
			});
		}
	}

	for index in &doctype.indexes {
		let label = index.name.clone().unwrap_or_else(|| index.columns.join(","));
		if index.columns.is_empty() {
			return Err(SchemaComparisonError::IndexComparison {
				doctype: Some(doctype.name.clone()),
				index: label,
				details: "index has no columns".to_string(),
			});
		}
		if let Some(unknown) = index
			.columns
			.iter()
			.find(|c| !seen.contains(c.as_str()) && !is_system_field(c))
		{
			return Err(SchemaComparisonError::IndexComparison {
				doctype: Some(doctype.name.clone()),
				index: label,
				details: format!("index references unknown column '{}'", unknown),
			});
		}
	}

	Ok(())
}

fn declared_fields<'a>(
	doctype: &'a DocType,
	options: &'a ComparisonOptions,
) -> impl Iterator<Item = &'a DocField> {
	doctype.fields.iter().filter(move |f| {
		has_storage(&f.fieldtype) && !(options.exclude_system_fields && is_system_field(&f.fieldname))
	})
}

fn declared_indexes(doctype: &DocType) -> Vec<IndexDefinition> {
	doctype
		.indexes
		.iter()
		.map(|index| doc_index_to_index_definition(&doctype.name, index))
		.collect()
}

/// Diff for a table that does not exist yet
fn bootstrap_diff(doctype: &DocType, options: &ComparisonOptions) -> SchemaDiff {
	let mappings = Some(&options.custom_type_mappings);
	SchemaDiff {
		added_columns: declared_fields(doctype, options)
			.map(|f| ColumnChange::added(field_to_column_definition(f, mappings)))
			.collect(),
		added_indexes: declared_indexes(doctype)
			.into_iter()
			.map(IndexChange::added)
			.collect(),
		..SchemaDiff::default()
	}
}

fn build_diff(doctype: &DocType, structure: &TableStructure, options: &ComparisonOptions) -> SchemaDiff {
	let mut diff = SchemaDiff::new();
	let mappings = Some(&options.custom_type_mappings);

	let mut available = structure.columns.clone();
	for field in declared_fields(doctype, options) {
		let Some(column) = find_matching_column(field, &available, options).cloned() else {
			diff.added_columns
				.push(ColumnChange::added(field_to_column_definition(field, mappings)));
			continue;
		};
		available.retain(|c| c.name != column.name);

		if column.name.eq_ignore_ascii_case(&field.fieldname) {
			if let Some(change) = compare_field_to_column(field, &column, options) {
				diff.modified_columns.push(change);
			}
		} else {
			debug!(from = %column.name, to = %field.fieldname, "column matched through old_fieldname");
			diff.renamed_columns.push(ColumnRename {
				from: column.name.clone(),
				to: field.fieldname.clone(),
				column: field_to_column_definition(field, mappings),
			});
		}
	}

	for column in available.iter().filter(|c| !is_system_field(&c.name)) {
		diff.removed_columns
			.push(ColumnChange::removed(column_info_to_column_definition(column)));
	}

	let mut discovered: Vec<IndexDefinition> = structure
		.indexes
		.iter()
		.filter(|i| !i.is_implicit())
		.map(index_info_to_index_definition)
		.collect();

	for declared in declared_indexes(doctype) {
		if let Some(found) = find_matching_index(&declared, &discovered) {
			let name = found.name.clone();
			discovered.retain(|i| i.name != name);
			continue;
		}

		let same_name = discovered.iter().position(|i| i.name == declared.name);
		match same_name.and_then(|pos| compare_index_to_index(&declared, &discovered[pos]).map(|r| (pos, r))) {
			Some((pos, replacement)) => {
				discovered.remove(pos);
				diff.removed_indexes.push(replacement.remove);
				diff.added_indexes.push(replacement.add);
			}
			None => diff.added_indexes.push(IndexChange::added(declared)),
		}
	}

	diff.removed_indexes
		.extend(discovered.into_iter().map(IndexChange::removed));

	diff
}

/// Ratio of shared characters to the longer name's length
///
/// Characters are compared case-insensitively as multisets.
///
/// # Examples
///
/// ```
/// use docsync_db::migrations::engine::name_similarity;
///
/// assert!(name_similarity("user_mail", "user_email") > 0.7);
/// assert!(name_similarity("age", "description") < 0.7);
/// assert_eq!(name_similarity("email", "email"), 1.0);
/// ```
pub fn name_similarity(a: &str, b: &str) -> f64 {
	let a = a.to_lowercase();
	let b = b.to_lowercase();
	let longest = a.chars().count().max(b.chars().count());
	if longest == 0 {
		return 1.0;
	}

	let mut counts: HashMap<char, usize> = HashMap::new();
	for c in a.chars() {
		*counts.entry(c).or_default() += 1;
	}
	let mut shared = 0;
	for c in b.chars() {
		if let Some(n) = counts.get_mut(&c)
			&& *n > 0
		{
			*n -= 1;
			shared += 1;
		}
	}

	shared as f64 / longest as f64
}

/// Pair removed columns with added columns of the same shape and a similar name
///
/// Greedy: each removed column, in order, takes the first remaining added
/// column whose definition matches (ignoring the name) and whose name
/// similarity exceeds `threshold`. Paired entries leave the added and
/// removed lists and become a [`ColumnRename`].
pub fn detect_column_renames(diff: &mut SchemaDiff, threshold: f64) {
	let mut added = std::mem::take(&mut diff.added_columns);
	let mut kept_removed = Vec::new();

	for removed in std::mem::take(&mut diff.removed_columns) {
		let candidate = added.iter().position(|a| {
			a.column.same_shape(&removed.column)
				&& name_similarity(&removed.fieldname, &a.fieldname) > threshold
		});

		match candidate {
			Some(pos) => {
				let target = added.remove(pos);
				debug!(from = %removed.fieldname, to = %target.fieldname, "detected column rename");
				diff.renamed_columns.push(ColumnRename {
					from: removed.fieldname,
					to: target.fieldname,
					column: target.column,
				});
			}
			None => kept_removed.push(removed),
		}
	}

	diff.added_columns = added;
	diff.removed_columns = kept_removed;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::migrations::schema_diff::ColumnDefinition;
	use rstest::rstest;

	#[rstest]
	#[case("user_mail", "user_email", 0.9)]
	#[case("abc", "abc", 1.0)]
	#[case("abc", "xyz", 0.0)]
	#[case("", "", 1.0)]
	fn test_name_similarity(#[case] a: &str, #[case] b: &str, #[case] expected: f64) {
		assert!((name_similarity(a, b) - expected).abs() < 1e-9);
	}

	#[rstest]
	fn test_rename_detection_moves_pair_out_of_add_and_remove() {
		let mut diff = SchemaDiff::new();
		diff.removed_columns
			.push(ColumnChange::removed(ColumnDefinition::new("user_mail", "text")));
		diff.added_columns
			.push(ColumnChange::added(ColumnDefinition::new("user_email", "text")));

		detect_column_renames(&mut diff, DEFAULT_RENAME_THRESHOLD);

		assert!(diff.added_columns.is_empty());
		assert!(diff.removed_columns.is_empty());
		assert_eq!(diff.renamed_columns.len(), 1);
		assert_eq!(diff.renamed_columns[0].from, "user_mail");
		assert_eq!(diff.renamed_columns[0].to, "user_email");
	}

	#[rstest]
	fn test_rename_detection_requires_same_shape() {
		let mut diff = SchemaDiff::new();
		diff.removed_columns
			.push(ColumnChange::removed(ColumnDefinition::new("user_mail", "integer")));
		diff.added_columns
			.push(ColumnChange::added(ColumnDefinition::new("user_email", "text")));

		detect_column_renames(&mut diff, DEFAULT_RENAME_THRESHOLD);

		assert!(diff.renamed_columns.is_empty());
		assert_eq!(diff.added_columns.len(), 1);
		assert_eq!(diff.removed_columns.len(), 1);
	}

	#[rstest]
	fn test_rename_detection_treats_zero_default_as_none() {
		let mut diff = SchemaDiff::new();
		diff.removed_columns
			.push(ColumnChange::removed(ColumnDefinition::new("is_enabled", "integer")));
		let mut declared = ColumnDefinition::new("is_enable", "integer");
		declared.default_value = Some("0".to_string());
		diff.added_columns.push(ColumnChange::added(declared));

		detect_column_renames(&mut diff, DEFAULT_RENAME_THRESHOLD);

		assert_eq!(diff.renamed_columns.len(), 1);
		assert_eq!(diff.renamed_columns[0].from, "is_enabled");
		assert!(diff.added_columns.is_empty());
		assert!(diff.removed_columns.is_empty());
	}

	#[rstest]
	fn test_rename_detection_is_greedy_first_match() {
		let mut diff = SchemaDiff::new();
		diff.removed_columns
			.push(ColumnChange::removed(ColumnDefinition::new("amount_a", "text")));
		diff.removed_columns
			.push(ColumnChange::removed(ColumnDefinition::new("amount_b", "text")));
		diff.added_columns
			.push(ColumnChange::added(ColumnDefinition::new("amount_x", "text")));

		detect_column_renames(&mut diff, DEFAULT_RENAME_THRESHOLD);

		assert_eq!(diff.renamed_columns.len(), 1);
		assert_eq!(diff.renamed_columns[0].from, "amount_a");
		assert_eq!(diff.removed_columns[0].fieldname, "amount_b");
	}

	#[rstest]
	fn test_stage_percentages_increase() {
		let stages = [
			ComparisonStage::LoadingDocType,
			ComparisonStage::LoadingTableSchema,
			ComparisonStage::ComparingSchemas,
			ComparisonStage::AnalyzingDifferences,
			ComparisonStage::Complete,
		];
		let percents: Vec<u8> = stages.iter().map(|s| s.percent()).collect();
		assert_eq!(percents, vec![10, 30, 50, 80, 100]);
		assert_eq!(ComparisonStage::LoadingTableSchema.to_string(), "Loading table schema");
	}

	#[rstest]
	fn test_validate_doctype_rejects_duplicates_and_bad_indexes() {
		use crate::migrations::doctype::{DocField, DocIndex};

		let duplicate = DocType::new("User")
			.with_field(DocField::new("email", "Data"))
			.with_field(DocField::new("email", "Data"));
		assert!(matches!(
			validate_doctype(&duplicate),
			Err(SchemaComparisonError::SchemaValidation { .. })
		));

		let unknown_column = DocType::new("User")
			.with_field(DocField::new("email", "Data"))
			.with_index(DocIndex::new(vec!["phone".to_string()]));
		assert!(matches!(
			validate_doctype(&unknown_column),
			Err(SchemaComparisonError::IndexComparison { .. })
		));

		let system_column_index = DocType::new("User")
			.with_field(DocField::new("email", "Data"))
			.with_index(DocIndex::new(vec!["email".to_string(), "modified".to_string()]));
		assert!(validate_doctype(&system_column_index).is_ok());
	}
}
