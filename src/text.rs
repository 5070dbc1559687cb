//! The trim and replace passes of a transform.

use crate::TransformRules;

/// Apply the trim and replace flags of `rules` to `text`.
///
/// Expand flags are ignored.
/// The passes run in a fixed order, each one operating on the output of the previous one:
/// trim start/end, collapse internal whitespace, `~`, `` ` ``, square brackets, curly brackets,
/// line endings to LF, line endings to CRLF, single quotes, double quotes,
/// argument quoting, XML escaping, regex escaping and finally control characters.
pub fn apply(text: String, rules: TransformRules) -> String {
	let mut text = text;
	if rules.intersects(TransformRules::TRIM | TransformRules::TRIM_INTERNAL) {
		text = if rules.contains(TransformRules::MULTILINE) {
			map_lines(&text, |line| trim(line, rules))
		} else {
			trim(&text, rules)
		};
	}

	if rules.contains(TransformRules::TILDE_TO_SPACE) {
		text = text.replace('~', " ");
	}
	if rules.contains(TransformRules::BACKQUOTE_TO_DOUBLE_QUOTE) {
		text = text.replace('`', "\"");
	}
	if rules.contains(TransformRules::SQUARE_TO_ANGLE) {
		text = text.replace('[', "<").replace(']', ">");
	}
	if rules.contains(TransformRules::CURLY_TO_ANGLE) {
		text = text.replace('{', "<").replace('}', ">");
	}
	if rules.contains(TransformRules::NEWLINE_TO_LF) {
		text = normalize_newlines(&text, "\n");
	}
	if rules.contains(TransformRules::NEWLINE_TO_CRLF) {
		text = normalize_newlines(&text, "\r\n");
	}
	if rules.contains(TransformRules::DOUBLE_SINGLE_QUOTES) {
		text = text.replace('\'', "''");
	}
	if rules.contains(TransformRules::DOUBLE_DOUBLE_QUOTES) {
		text = text.replace('"', "\"\"");
	}
	if rules.contains(TransformRules::QUOTE_ARG) {
		text = quote_arg(&text);
	}
	if rules.contains(TransformRules::ESCAPE_XML) {
		text = escape_xml(&text);
	}
	if rules.contains(TransformRules::ESCAPE_REGEX) {
		text = regex::escape(&text);
	}
	if rules.contains(TransformRules::REMOVE_CONTROL) {
		text = text
			.chars()
			.map(|c| if c.is_control() && !matches!(c, '\t' | '\n' | '\r') { '.' } else { c })
			.collect();
	}
	text
}

/// Apply the trim flags to a single piece of text.
fn trim(text: &str, rules: TransformRules) -> String {
	let text = match (rules.contains(TransformRules::TRIM_START), rules.contains(TransformRules::TRIM_END)) {
		(true, true) => text.trim(),
		(true, false) => text.trim_start(),
		(false, true) => text.trim_end(),
		(false, false) => text,
	};
	if rules.contains(TransformRules::TRIM_INTERNAL) {
		collapse_whitespace(text)
	} else {
		text.to_owned()
	}
}

/// Replace every run of whitespace with a single space.
fn collapse_whitespace(text: &str) -> String {
	let mut output = String::with_capacity(text.len());
	let mut in_whitespace = false;
	for c in text.chars() {
		if c.is_whitespace() {
			if !in_whitespace {
				output.push(' ');
			}
			in_whitespace = true;
		} else {
			output.push(c);
			in_whitespace = false;
		}
	}
	output
}

/// Apply a function to every line, keeping the original line endings.
fn map_lines<F>(text: &str, fun: F) -> String
where
	F: Fn(&str) -> String,
{
	let mut output = String::with_capacity(text.len());
	for line in text.split_inclusive('\n') {
		let (content, ending) = match line.strip_suffix("\r\n") {
			Some(content) => (content, "\r\n"),
			None => match line.strip_suffix('\n') {
				Some(content) => (content, "\n"),
				None => (line, ""),
			},
		};
		output.push_str(&fun(content));
		output.push_str(ending);
	}
	output
}

/// Replace every line ending (`\r\n`, `\r` or `\n`) with `newline`.
fn normalize_newlines(text: &str, newline: &str) -> String {
	let mut output = String::with_capacity(text.len());
	let mut chars = text.chars().peekable();
	while let Some(c) = chars.next() {
		match c {
			'\r' => {
				chars.next_if_eq(&'\n');
				output.push_str(newline);
			},
			'\n' => output.push_str(newline),
			c => output.push(c),
		}
	}
	output
}

/// Quote text as a single command line argument, if it needs quoting.
///
/// Text needs quoting if it is empty or contains whitespace or double quotes.
/// Inside the quotes, double quotes are escaped with a backslash,
/// and backslashes that precede a double quote or the closing quote are doubled.
pub fn quote_arg(text: &str) -> String {
	let needs_quotes = text.is_empty() || text.chars().any(|c| c.is_whitespace() || c == '"');
	if !needs_quotes {
		return text.to_owned();
	}

	let mut output = String::with_capacity(text.len() + 2);
	output.push('"');
	let mut backslashes = 0;
	for c in text.chars() {
		match c {
			'\\' => backslashes += 1,
			'"' => {
				output.push_str(&"\\".repeat(backslashes * 2 + 1));
				output.push('"');
				backslashes = 0;
			},
			c => {
				output.push_str(&"\\".repeat(backslashes));
				output.push(c);
				backslashes = 0;
			},
		}
	}
	output.push_str(&"\\".repeat(backslashes * 2));
	output.push('"');
	output
}

/// Escape the XML special characters `&`, `<`, `>`, `"` and `'`.
pub fn escape_xml(text: &str) -> String {
	quick_xml::escape::escape(text).into_owned()
}
