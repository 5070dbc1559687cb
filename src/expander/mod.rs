//! The [`Expander`]: a variable store that expands and transforms text.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::cache::{CacheStats, Entry, ExpressionCache, ParseMode};
use crate::context::{BuiltinTypes, Context, Receiver, Subroutine, TypeResolver};
use crate::cursor::Cursor;
use crate::error::{Error, NoSuchSubroutine, NoSuchVariable};
use crate::grammar::{self, Grammar, Standard};
use crate::{Value, ValueKind, VariableStore};

mod scan;
mod transform;

pub use transform::{assert_good_transform, contains_expressions};

/// Options for creating an [`Expander`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpanderOptions {
	/// The maximum number of parsed expressions to keep.
	pub cache_capacity: usize,
}

impl Default for ExpanderOptions {
	fn default() -> Self {
		Self {
			cache_capacity: ExpressionCache::<()>::DEFAULT_CAPACITY,
		}
	}
}

/// Expands expressions embedded in text, and evaluates expressions against its variables.
///
/// The expander owns a [`VariableStore`], a cache of parsed expressions,
/// and the services that expressions can call into: a type resolver, subroutines and receivers.
///
/// An expander is meant to be used by a single execution context.
/// It is not thread-safe: give each script, loop iteration or call frame its own expander,
/// for example by cloning the variables of the parent with [`Expander::with_variables()`].
///
/// ```
/// # fn main() -> Result<(), exsubst::Error> {
/// use exsubst::{Expander, TransformRules, Value};
///
/// let mut expander = Expander::new();
/// expander.set("name", "World");
/// assert_eq!(expander.expand_to_string("Hello, ${name}!")?, "Hello, World!");
/// assert_eq!(expander.expand("${2 + 3}")?, Value::Int(5));
/// assert_eq!(expander.transform_to_string("  [name]  ", TransformRules::EXPAND_SQUARE | TransformRules::TRIM)?, "World");
/// # Ok(())
/// # }
/// ```
pub struct Expander<G: Grammar = Standard> {
	variables: VariableStore,
	grammar: G,
	cache: RefCell<ExpressionCache<G::Node>>,
	types: Box<dyn TypeResolver>,
	subroutines: IndexMap<String, Subroutine>,
	receivers: Vec<Box<dyn Receiver>>,
}

impl<G: Grammar> std::fmt::Debug for Expander<G> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Expander")
			.field("variables", &self.variables)
			.field("cached_expressions", &self.cache.borrow().len())
			.field("subroutines", &self.subroutines.keys().collect::<Vec<_>>())
			.field("receivers", &self.receivers.len())
			.finish_non_exhaustive()
	}
}

impl Expander<Standard> {
	/// Create an expander with an empty variable store and the standard grammar.
	pub fn new() -> Self {
		Self::with_grammar(Standard, ExpanderOptions::default())
	}

	/// Create an expander with the standard grammar and custom options.
	pub fn with_options(options: ExpanderOptions) -> Self {
		Self::with_grammar(Standard, options)
	}

	/// Create an expander that starts with the given variables and uses the standard grammar.
	pub fn with_variables(variables: VariableStore) -> Self {
		let mut expander = Self::new();
		expander.variables = variables;
		expander
	}
}

impl Default for Expander<Standard> {
	fn default() -> Self {
		Self::new()
	}
}

impl<G: Grammar> Expander<G> {
	/// Create an expander with an empty variable store and a custom grammar.
	pub fn with_grammar(grammar: G, options: ExpanderOptions) -> Self {
		Self {
			variables: VariableStore::new(),
			grammar,
			cache: RefCell::new(ExpressionCache::new(options.cache_capacity)),
			types: Box::new(BuiltinTypes),
			subroutines: IndexMap::new(),
			receivers: Vec::new(),
		}
	}

	/// Replace the type resolver, which defaults to [`BuiltinTypes`].
	pub fn with_type_resolver(mut self, types: impl TypeResolver + 'static) -> Self {
		self.types = Box::new(types);
		self
	}

	/// Get the variable store.
	#[inline]
	pub fn variables(&self) -> &VariableStore {
		&self.variables
	}

	/// Get the variable store for modification.
	#[inline]
	pub fn variables_mut(&mut self) -> &mut VariableStore {
		&mut self.variables
	}

	/// Consume the expander to get the variable store.
	#[inline]
	pub fn into_variables(self) -> VariableStore {
		self.variables
	}

	/// Set a variable.
	///
	/// Shorthand for [`VariableStore::set()`] on [`Self::variables_mut()`].
	#[inline]
	pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.variables.set(name, value)
	}

	/// Append the stringified value to a variable.
	///
	/// Shorthand for [`VariableStore::append()`] on [`Self::variables_mut()`].
	#[inline]
	pub fn append(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.variables.append(name, value)
	}

	/// Register a subroutine that expressions can call by name.
	///
	/// Names are case-insensitive.
	pub fn add_subroutine<F>(&mut self, name: &str, subroutine: F)
	where
		F: Fn(&[Value]) -> Result<Value, Error> + 'static,
	{
		self.subroutines.insert(name.to_lowercase(), Box::new(subroutine));
	}

	/// Register a receiver for unqualified method calls.
	///
	/// Receivers are tried in the order they were added.
	pub fn add_receiver(&mut self, receiver: impl Receiver + 'static) {
		self.receivers.push(Box::new(receiver));
	}

	/// Get the counters of the expression cache.
	pub fn cache_stats(&self) -> CacheStats {
		self.cache.borrow().stats()
	}

	/// Evaluate a single expression.
	///
	/// The whole text must be one expression. Empty text evaluates to null.
	pub fn eval(&self, text: &str) -> Result<Value, Error> {
		self.eval_whole(text, ParseMode::Single)
	}

	/// Evaluate a group of `|` separated alternatives.
	///
	/// The first alternative that produces a non-null value without referring to a missing variable wins.
	/// Empty text evaluates to null.
	pub fn eval_multi(&self, text: &str) -> Result<Value, Error> {
		self.eval_whole(text, ParseMode::Multi)
	}

	fn eval_whole(&self, text: &str, mode: ParseMode) -> Result<Value, Error> {
		if text.is_empty() {
			return Ok(Value::Null);
		}
		let node = self.parse_whole(text, mode)?;
		grammar::evaluate(&*node, self)
	}

	/// Get a parsed expression that must span all of `text`, from the cache if possible.
	fn parse_whole(&self, text: &str, mode: ParseMode) -> Result<Rc<G::Node>, Error> {
		if let Some(entry) = self.cache.borrow_mut().get(mode, text) {
			return Ok(entry.node);
		}

		let mut cursor = Cursor::new(text);
		let node = match mode {
			ParseMode::Single => self.grammar.parse(&mut cursor)?,
			ParseMode::Multi | ParseMode::Prefix => self.grammar.parse_multi(&mut cursor)?,
		};
		cursor.skip_whitespace();
		if !cursor.at_end() {
			return Err(cursor.syntax_error(format!("unexpected input after expression: {:?}", cursor.rest())));
		}

		let node = Rc::new(node);
		self.cache.borrow_mut().insert(mode, text, Entry {
			node: node.clone(),
			len: text.len(),
		});
		Ok(node)
	}

	/// Get the parsed expression at the cursor, ending before the closing delimiter `end`.
	///
	/// The cache is keyed by the expression text up to the first occurrence of `end`.
	/// A cached entry is only used if the parser consumed exactly that text before,
	/// so closing delimiters inside string literals still end up in a fresh parse.
	pub(crate) fn parse_region(&self, cursor: &mut Cursor<'_>, end: &str) -> Result<Rc<G::Node>, Error> {
		cursor.skip_whitespace();
		let rest = cursor.rest();
		let candidate = match memchr::memmem::find(rest.as_bytes(), end.as_bytes()) {
			Some(index) => &rest[..index],
			None => rest,
		};
		let candidate = candidate.trim_end();
		if let Some(entry) = self.cache.borrow_mut().get(ParseMode::Prefix, candidate) {
			cursor.advance(entry.len);
			return Ok(entry.node);
		}

		let start = cursor.position();
		let node = Rc::new(self.grammar.parse_multi(cursor)?);
		let consumed = &cursor.source()[start..cursor.position()];
		self.cache.borrow_mut().insert(ParseMode::Prefix, consumed, Entry {
			node: node.clone(),
			len: consumed.len(),
		});
		Ok(node)
	}

	/// Check if a name is an expression rather than the name of a variable.
	///
	/// Calculated names start with `=` or a digit, or contain a `|`.
	pub fn is_calculated(name: &str) -> bool {
		name.starts_with('=') || name.contains('|') || name.starts_with(|c: char| c.is_ascii_digit())
	}

	/// Get the value of a variable, or of a calculated name.
	///
	/// Calculated names (see [`Self::is_calculated()`]) are not looked up in the store.
	/// If they are a plain number, that number is returned.
	/// Otherwise, the name (without a leading `=`) is evaluated as a group of alternatives.
	///
	/// Returns `Ok(None)` if a plain variable is not set.
	pub fn try_get_value(&self, name: &str) -> Result<Option<Value>, Error> {
		if !Self::is_calculated(name) {
			return Ok(self.variables.try_get(name).cloned());
		}
		let text = name.strip_prefix('=').unwrap_or(name);
		if let Some(number) = parse_number(text) {
			return Ok(Some(number));
		}
		self.eval_multi(text).map(Some)
	}

	/// Get the value of a variable, or of a calculated name.
	///
	/// Like [`Self::try_get_value()`], but a missing variable is an error.
	pub fn get_value(&self, name: &str) -> Result<Value, Error> {
		self.try_get_value(name)?.ok_or_else(|| {
			NoSuchVariable {
				name: name.to_owned(),
			}
			.into()
		})
	}
}

/// Parse text that is nothing but a number.
fn parse_number(text: &str) -> Option<Value> {
	let text = text.trim();
	let numeric = !text.is_empty()
		&& text.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+')
		&& text.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
	if !numeric {
		return None;
	}
	match text.parse::<i64>() {
		Ok(x) => Some(Value::Int(x)),
		Err(_) => text.parse::<f64>().ok().map(Value::Float),
	}
}

impl<G: Grammar> Context for Expander<G> {
	fn lookup(&self, name: &str) -> Result<Option<Value>, Error> {
		self.try_get_value(name)
	}

	fn resolve_type(&self, name: &str) -> Option<ValueKind> {
		self.types.resolve_type(name)
	}

	fn call_subroutine(&self, name: &str, args: &[Value]) -> Result<Value, Error> {
		match self.subroutines.get(&name.to_lowercase()) {
			Some(subroutine) => subroutine(args),
			None => Err(NoSuchSubroutine { name: name.to_owned() }.into()),
		}
	}

	fn receivers(&self) -> &[Box<dyn Receiver>] {
		&self.receivers
	}
}
