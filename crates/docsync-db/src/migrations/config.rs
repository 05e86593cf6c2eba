//! Configuration for schema comparison and migration execution.
//!
//! Loaded from TOML; every key is optional and falls back to its default.
//!
//! ```toml
//! [comparison]
//! cache_ttl_secs = 300
//! batch_size = 5
//! rename_similarity_threshold = 0.7
//!
//! [comparison.custom_type_mappings]
//! Currency = "decimal(21, 9)"
//!
//! [execution]
//! continue_on_error = false
//! statement_timeout_ms = 30000
//! isolation_level = "Serializable"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::engine::{DEFAULT_BATCH_SIZE, DEFAULT_RENAME_THRESHOLD};
use crate::backends::IsolationLevel;

/// Main configuration of the migration engine.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
	/// Schema comparison settings
	pub comparison: ComparisonConfig,

	/// Migration execution settings
	pub execution: ExecutionConfig,
}

impl MigrationConfig {
	pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
		self.comparison.cache_ttl_secs = secs;
		self
	}

	pub fn with_batch_size(mut self, batch_size: usize) -> Self {
		self.comparison.batch_size = batch_size;
		self
	}

	pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
		self.execution.continue_on_error = continue_on_error;
		self
	}

	pub fn with_statement_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.execution.statement_timeout_ms = Some(timeout_ms);
		self
	}

	/// Load configuration from a TOML file.
	///
	/// # Errors
	///
	/// Returns error if file cannot be read or parsed.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::IoError {
			path: path.as_ref().to_path_buf(),
			source: e,
		})?;

		Self::from_toml(&content)
	}

	/// Parse configuration from TOML string.
	pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
			message: e.to_string(),
		})?;
		config.validate()?;
		Ok(config)
	}

	/// Check value ranges that serde cannot express.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.comparison.batch_size == 0 {
			return Err(ConfigError::InvalidValue {
				key: "comparison.batch_size".to_string(),
				message: "must be at least 1".to_string(),
			});
		}

		let threshold = self.comparison.rename_similarity_threshold;
		if !(0.0..=1.0).contains(&threshold) {
			return Err(ConfigError::InvalidValue {
				key: "comparison.rename_similarity_threshold".to_string(),
				message: format!("{} is outside 0.0..=1.0", threshold),
			});
		}

		if self.execution.savepoint_prefix.is_empty()
			|| !self
				.execution
				.savepoint_prefix
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '_')
			|| self
				.execution
				.savepoint_prefix
				.starts_with(|c: char| c.is_ascii_digit())
		{
			return Err(ConfigError::InvalidValue {
				key: "execution.savepoint_prefix".to_string(),
				message: format!(
					"'{}' is not a valid identifier prefix",
					self.execution.savepoint_prefix
				),
			});
		}

		Ok(())
	}
}

/// Schema comparison configuration.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
	/// Lifetime of cached table structure, in seconds
	pub cache_ttl_secs: u64,

	/// Comparisons run concurrently by a batch comparison
	pub batch_size: usize,

	/// Name similarity a removed/added column pair must exceed to count as a rename
	pub rename_similarity_threshold: f64,

	/// Skip framework-managed fields when comparing
	pub exclude_system_fields: bool,

	/// Treat same-named columns of incompatible type as remove+add
	pub strict_type_matching: bool,

	/// Declared field type -> storage type overrides
	pub custom_type_mappings: HashMap<String, String>,
}

impl Default for ComparisonConfig {
	fn default() -> Self {
		Self {
			cache_ttl_secs: 300,
			batch_size: DEFAULT_BATCH_SIZE,
			rename_similarity_threshold: DEFAULT_RENAME_THRESHOLD,
			exclude_system_fields: true,
			strict_type_matching: false,
			custom_type_mappings: HashMap::new(),
		}
	}
}

/// Migration execution configuration.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
	/// Wrap each statement in a savepoint
	pub use_savepoints: bool,

	/// Keep executing after a failed statement
	pub continue_on_error: bool,

	/// Savepoint names are `{prefix}_{index}`
	pub savepoint_prefix: String,

	/// Per-statement timeout in milliseconds
	pub statement_timeout_ms: Option<u64>,

	/// Isolation level of the migration transaction
	pub isolation_level: Option<IsolationLevel>,
}

impl Default for ExecutionConfig {
	fn default() -> Self {
		Self {
			use_savepoints: true,
			continue_on_error: false,
			savepoint_prefix: "sp".to_string(),
			statement_timeout_ms: None,
			isolation_level: None,
		}
	}
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error reading {path}: {source}")]
	IoError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse configuration: {message}")]
	ParseError { message: String },

	#[error("Invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_default_config() {
		let config = MigrationConfig::default();

		assert_eq!(config.comparison.cache_ttl_secs, 300);
		assert_eq!(config.comparison.batch_size, 5);
		assert!(config.comparison.exclude_system_fields);
		assert!(config.execution.use_savepoints);
		assert!(!config.execution.continue_on_error);
		assert_eq!(config.execution.savepoint_prefix, "sp");
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_parse_toml_config() {
		let toml = r#"
[comparison]
cache_ttl_secs = 60
strict_type_matching = true

[comparison.custom_type_mappings]
Currency = "decimal(21, 9)"

[execution]
continue_on_error = true
statement_timeout_ms = 5000
isolation_level = "Serializable"
"#;

		let config = MigrationConfig::from_toml(toml).unwrap();

		assert_eq!(config.comparison.cache_ttl_secs, 60);
		assert_eq!(config.comparison.batch_size, 5);
		assert!(config.comparison.strict_type_matching);
		assert_eq!(
			config.comparison.custom_type_mappings.get("Currency").map(String::as_str),
			Some("decimal(21, 9)")
		);
		assert!(config.execution.continue_on_error);
		assert_eq!(config.execution.statement_timeout_ms, Some(5000));
		assert_eq!(
			config.execution.isolation_level,
			Some(IsolationLevel::Serializable)
		);
	}

	#[test]
	fn test_rejects_zero_batch_size() {
		let err = MigrationConfig::from_toml("[comparison]\nbatch_size = 0\n").unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "comparison.batch_size"));
	}

	#[test]
	fn test_rejects_out_of_range_threshold() {
		let mut config = MigrationConfig::default();
		config.comparison.rename_similarity_threshold = 1.5;
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_rejects_invalid_savepoint_prefix() {
		let err = MigrationConfig::from_toml("[execution]\nsavepoint_prefix = \"1sp\"\n").unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
	}

	#[test]
	fn test_parse_error_is_reported() {
		let err = MigrationConfig::from_toml("[comparison\n").unwrap_err();
		assert!(matches!(err, ConfigError::ParseError { .. }));
	}

	#[test]
	fn test_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[comparison]\nbatch_size = 2").unwrap();

		let config = MigrationConfig::from_file(file.path()).unwrap();
		assert_eq!(config.comparison.batch_size, 2);

		let missing = MigrationConfig::from_file("/nonexistent/docsync.toml").unwrap_err();
		assert!(matches!(missing, ConfigError::IoError { .. }));
	}

	#[test]
	fn test_builders() {
		let config = MigrationConfig::default()
			.with_batch_size(10)
			.with_cache_ttl_secs(30)
			.with_continue_on_error(true)
			.with_statement_timeout_ms(100);

		assert_eq!(config.comparison.batch_size, 10);
		assert_eq!(config.comparison.cache_ttl_secs, 30);
		assert!(config.execution.continue_on_error);
		assert_eq!(config.execution.statement_timeout_ms, Some(100));
	}
}
