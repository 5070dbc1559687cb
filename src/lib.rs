//! Expression expansion and text transformation for scripting engines.
//!
//! # Features
//!
//! * A case-insensitive, insertion-ordered [`VariableStore`] holding typed [`Value`]s.
//! * Expansion of expressions embedded in text with four delimiter styles:
//!   `${expr}`, `${{expr}}`, `[expr]` and `[[expr]]`.
//! * Whole-string expressions keep their type: `"${2 + 3}"` expands to the integer `5`, not the string `"5"`.
//! * Alternatives: `"${name | 'anonymous'}"` falls back when `name` is not set or is null.
//! * A [`TransformRules`] bitmask to trim, escape and rewrite text before or after expansion.
//! * Calculated variable names: `=a + b`, `first | second` and plain numbers evaluate instead of being looked up.
//! * A cache of parsed expressions, so repeated templates are parsed only once.
//! * A pluggable expression language through the [`Grammar`][grammar::Grammar] trait.
//! * Transformation of all string values in JSON, YAML or TOML data (optional, requires the `json`, `yaml` or `toml` feature).
//!
//! # Examples
//!
//! Create an [`Expander`], set some variables and expand text with [`Expander::expand()`]:
//!
//! ```
//! # fn main() -> Result<(), exsubst::Error> {
//! use exsubst::{Expander, Value};
//!
//! let mut expander = Expander::new();
//! expander.set("user", "Alice");
//! expander.set("count", 3);
//! assert_eq!(expander.expand_to_string("${user} has ${count * 2} apples")?, "Alice has 6 apples");
//! assert_eq!(expander.expand("${count > 2}")?, Value::Bool(true));
//! # Ok(())
//! # }
//! ```
//!
//! Rules control which delimiters are expanded and what happens to the text around them:
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use exsubst::{Expander, TransformRules};
//!
//! let mut expander = Expander::new();
//! expander.set("path", "C:\\Program Files\\App");
//! let rules: TransformRules = "ExpandSquare, Trim, QuoteArg".parse()?;
//! assert_eq!(expander.transform_to_string("  [path]  ", rules)?, "\"C:\\Program Files\\App\"");
//! # Ok(())
//! # }
//! ```
//!
//! Errors carry the byte position of the problem, which can be shown to the user:
//!
//! ```
//! let expander = exsubst::Expander::new();
//! let source = "Hello ${name";
//! let error = expander.expand(source).unwrap_err();
//! assert_eq!(error.to_string(), "Missing closing delimiter: '}'");
//! eprintln!("{}", error.source_highlighting(source));
//! ```
#![warn(missing_docs, missing_debug_implementations)]
#![cfg_attr(feature = "doc-cfg", feature(doc_cfg))]

pub mod cache;
pub mod context;
pub mod cursor;
pub mod dump;
pub mod error;
pub mod grammar;
pub mod rules;
pub mod text;

mod expander;
mod value;
mod variables;

mod features;
#[allow(unused_imports)]
pub use features::*;

pub use error::Error;
pub use expander::{assert_good_transform, contains_expressions, Expander, ExpanderOptions};
pub use rules::{Delimiters, TransformRules};
pub use value::{ObjectValue, Value, ValueKind};
pub use variables::{Variable, VariableStore};
