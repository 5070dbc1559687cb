//! Structural pretty-printing of values for diagnostic dumps.

use std::fmt::Write;

use crate::Value;

/// Limits for the structural pretty-printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOptions {
	/// Nested lists deeper than this are printed as `[...]`.
	pub max_depth: usize,

	/// Lists longer than this are cut off with a `... (N more)` marker.
	pub max_items: usize,
}

impl Default for DumpOptions {
	fn default() -> Self {
		Self {
			max_depth: 3,
			max_items: 16,
		}
	}
}

/// Render a value for humans.
///
/// Strings are quoted and escaped, null is shown as `(null)`,
/// and objects show their type name next to their display form.
pub fn pretty(value: &Value, options: &DumpOptions) -> String {
	let mut output = String::new();
	write_value(&mut output, value, options, 0);
	output
}

fn write_value(output: &mut String, value: &Value, options: &DumpOptions, depth: usize) {
	// Writing to a String can not fail.
	let _ = match value {
		Value::Null => write!(output, "(null)"),
		Value::String(x) => write!(output, "{x:?}"),
		Value::Object(x) => write!(output, "<{}> {}", short_type_name(x.type_name()), x),
		Value::List(items) => {
			if depth >= options.max_depth {
				output.push_str("[...]");
				return;
			}
			output.push('[');
			for (i, item) in items.iter().take(options.max_items).enumerate() {
				if i > 0 {
					output.push_str(", ");
				}
				write_value(output, item, options, depth + 1);
			}
			if items.len() > options.max_items {
				let _ = write!(output, ", ... ({} more)", items.len() - options.max_items);
			}
			output.push(']');
			Ok(())
		},
		Value::Decimal(x) => write!(output, "{x}m"),
		other => write!(output, "{other}"),
	};
}

/// Strip the module path from a type name.
fn short_type_name(name: &str) -> &str {
	let name = name.split('<').next().unwrap_or(name);
	name.rsplit("::").next().unwrap_or(name)
}
