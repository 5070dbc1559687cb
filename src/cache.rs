//! Bounded cache of parsed expressions.

use std::rc::Rc;

use indexmap::IndexMap;

/// How an expression was parsed, which is part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseMode {
	/// A single expression that spans the whole source text.
	Single,

	/// A group of `|` separated alternatives that spans the whole source text.
	Multi,

	/// A group of alternatives inside delimiters, keyed by the expression text the parser consumed.
	///
	/// The grammar decides where the expression ends, so the entry records the consumed length.
	Prefix,
}

/// A cached parse result.
#[derive(Debug)]
pub struct Entry<N> {
	/// The parsed expression.
	pub node: Rc<N>,

	/// The number of bytes of the source text the parser consumed.
	pub len: usize,
}

impl<N> Clone for Entry<N> {
	fn clone(&self) -> Self {
		Self {
			node: self.node.clone(),
			len: self.len,
		}
	}
}

/// Counters describing how well the cache performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
	/// Number of lookups that found a parsed expression.
	pub hits: u64,

	/// Number of lookups that missed, which the caller followed up with a parse.
	pub misses: u64,

	/// Number of entries dropped to make room for new ones.
	pub evictions: u64,
}

/// A bounded map from expression source text to the parsed expression.
///
/// When the cache is full, the oldest entry is evicted.
/// The cache is not synchronized: every execution context should use its own.
#[derive(Debug)]
pub struct ExpressionCache<N> {
	entries: IndexMap<(ParseMode, String), Entry<N>>,
	capacity: usize,
	stats: CacheStats,
}

impl<N> ExpressionCache<N> {
	/// The default number of expressions kept in a cache.
	pub const DEFAULT_CAPACITY: usize = 500;

	/// Create a cache that holds at most `capacity` expressions.
	///
	/// A capacity of zero disables caching.
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: IndexMap::with_capacity(capacity.min(64)),
			capacity,
			stats: CacheStats::default(),
		}
	}

	/// Get the maximum number of cached expressions.
	#[inline]
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Get the number of cached expressions.
	#[inline]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Check if the cache is empty.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Get the hit, miss and eviction counters.
	#[inline]
	pub fn stats(&self) -> CacheStats {
		self.stats
	}

	/// Look up a parsed expression by its exact source text.
	pub fn get(&mut self, mode: ParseMode, source: &str) -> Option<Entry<N>> {
		match self.entries.get(&(mode, source.to_owned())) {
			Some(entry) => {
				self.stats.hits += 1;
				Some(entry.clone())
			},
			None => {
				self.stats.misses += 1;
				log::trace!("expression cache miss ({mode:?}): {source:?}");
				None
			},
		}
	}

	/// Add a parsed expression, evicting the oldest entry if the cache is full.
	///
	/// An expression that is already cached is replaced in place and keeps its age.
	pub fn insert(&mut self, mode: ParseMode, source: &str, entry: Entry<N>) {
		if self.capacity == 0 {
			return;
		}
		let key = (mode, source.to_owned());
		if let Some(existing) = self.entries.get_mut(&key) {
			*existing = entry;
			return;
		}
		while self.entries.len() >= self.capacity {
			if let Some(((_, evicted), _)) = self.entries.shift_remove_index(0) {
				self.stats.evictions += 1;
				log::trace!("expression cache evicted: {evicted:?}");
			}
		}
		self.entries.insert(key, entry);
	}
}

impl<N> Default for ExpressionCache<N> {
	fn default() -> Self {
		Self::new(Self::DEFAULT_CAPACITY)
	}
}
