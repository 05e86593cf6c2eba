//! Time-boxed cache of introspected table structure

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::backends::{ColumnInfo, IndexInfo};

/// Default lifetime of a cached table structure
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Columns and indexes of one table, as last introspected
#[derive(Debug, Clone)]
pub struct SchemaCacheEntry {
	pub columns: Vec<ColumnInfo>,
	pub indexes: Vec<IndexInfo>,
	pub cached_at: Instant,
}

impl SchemaCacheEntry {
	pub fn new(columns: Vec<ColumnInfo>, indexes: Vec<IndexInfo>) -> Self {
		Self {
			columns,
			indexes,
			cached_at: Instant::now(),
		}
	}

	pub fn is_expired(&self, ttl: Duration) -> bool {
		self.cached_at.elapsed() >= ttl
	}
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
	pub entries: usize,
	pub hits: u64,
	pub misses: u64,
}

/// Per-table introspection cache owned by one engine
#[derive(Debug)]
pub struct SchemaCache {
	entries: RwLock<HashMap<String, SchemaCacheEntry>>,
	ttl: Duration,
	hits: AtomicU64,
	misses: AtomicU64,
}

impl Default for SchemaCache {
	fn default() -> Self {
		Self::new(DEFAULT_CACHE_TTL)
	}
}

impl SchemaCache {
	pub fn new(ttl: Duration) -> Self {
		Self {
			entries: RwLock::new(HashMap::new()),
			ttl,
			hits: AtomicU64::new(0),
			misses: AtomicU64::new(0),
		}
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Fresh entry for `table`; an expired entry is evicted and reported as a miss
	pub fn get(&self, table: &str) -> Option<SchemaCacheEntry> {
		let fresh = {
			let entries = self.entries.read();
			entries.get(table).map(|e| (!e.is_expired(self.ttl), e.clone()))
		};

		match fresh {
			Some((true, entry)) => {
				self.hits.fetch_add(1, Ordering::Relaxed);
				Some(entry)
			}
			Some((false, _)) => {
				self.entries.write().remove(table);
				self.misses.fetch_add(1, Ordering::Relaxed);
				None
			}
			None => {
				self.misses.fetch_add(1, Ordering::Relaxed);
				None
			}
		}
	}

	pub fn insert(&self, table: impl Into<String>, columns: Vec<ColumnInfo>, indexes: Vec<IndexInfo>) {
		self.entries
			.write()
			.insert(table.into(), SchemaCacheEntry::new(columns, indexes));
	}

	/// Drop one entry, returning whether it existed
	pub fn invalidate(&self, table: &str) -> bool {
		self.entries.write().remove(table).is_some()
	}

	pub fn clear(&self) {
		self.entries.write().clear();
	}

	/// Evict every expired entry, returning how many were dropped
	pub fn purge_expired(&self) -> usize {
		let mut entries = self.entries.write();
		let before = entries.len();
		entries.retain(|_, e| !e.is_expired(self.ttl));
		before - entries.len()
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			entries: self.entries.read().len(),
			hits: self.hits.load(Ordering::Relaxed),
			misses: self.misses.load(Ordering::Relaxed),
		}
	}
}
