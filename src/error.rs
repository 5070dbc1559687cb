//! Module containing error details.

/// An error that can occur during expansion, transformation or evaluation.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub enum Error {
	/// The input contains an opening delimiter without the matching closing delimiter.
	MissingClosingDelimiter(MissingClosingDelimiter),

	/// An expression body could not be parsed.
	Syntax(SyntaxError),

	/// A variable was requested that is not in the variable store.
	NoSuchVariable(NoSuchVariable),

	/// An expression called a subroutine that nobody provides.
	NoSuchSubroutine(NoSuchSubroutine),

	/// Evaluating a parsed expression failed.
	Evaluation(EvaluationError),
}

impl From<MissingClosingDelimiter> for Error {
	#[inline]
	fn from(other: MissingClosingDelimiter) -> Self {
		Self::MissingClosingDelimiter(other)
	}
}

impl From<SyntaxError> for Error {
	#[inline]
	fn from(other: SyntaxError) -> Self {
		Self::Syntax(other)
	}
}

impl From<NoSuchVariable> for Error {
	#[inline]
	fn from(other: NoSuchVariable) -> Self {
		Self::NoSuchVariable(other)
	}
}

impl From<NoSuchSubroutine> for Error {
	#[inline]
	fn from(other: NoSuchSubroutine) -> Self {
		Self::NoSuchSubroutine(other)
	}
}

impl From<EvaluationError> for Error {
	#[inline]
	fn from(other: EvaluationError) -> Self {
		Self::Evaluation(other)
	}
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::MissingClosingDelimiter(e) => e.fmt(f),
			Self::Syntax(e) => e.fmt(f),
			Self::NoSuchVariable(e) => e.fmt(f),
			Self::NoSuchSubroutine(e) => e.fmt(f),
			Self::Evaluation(e) => e.fmt(f),
		}
	}
}

/// The input contains an opening delimiter without the matching closing delimiter.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct MissingClosingDelimiter {
	/// The byte offset within the input where the error occurs.
	///
	/// When raised by [`assert_good_transform()`][crate::assert_good_transform],
	/// this points to the unclosed opening delimiter.
	/// When raised during expansion, this points to where the closing delimiter was expected.
	pub position: usize,

	/// The closing delimiter that is missing: `}`, `}}`, `]` or `]]`.
	pub delimiter: &'static str,
}

impl std::error::Error for MissingClosingDelimiter {}

impl std::fmt::Display for MissingClosingDelimiter {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Missing closing delimiter: '{}'", self.delimiter)
	}
}

/// An expression body could not be parsed.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct SyntaxError {
	/// The byte offset within the parsed text where the error occurs.
	pub position: usize,

	/// A human readable description of the problem.
	pub message: String,
}

impl std::error::Error for SyntaxError {}

impl std::fmt::Display for SyntaxError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Syntax error: {}", self.message)
	}
}

/// A variable was requested that is not in the variable store.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct NoSuchVariable {
	/// The name of the variable.
	pub name: String,
}

impl std::error::Error for NoSuchVariable {}

impl std::fmt::Display for NoSuchVariable {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "No such variable: {}", self.name)
	}
}

/// An expression called a subroutine that nobody provides.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct NoSuchSubroutine {
	/// The name of the subroutine.
	pub name: String,
}

impl std::error::Error for NoSuchSubroutine {}

impl std::fmt::Display for NoSuchSubroutine {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Subroutine not found: {}", self.name)
	}
}

/// Evaluating a parsed expression failed.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct EvaluationError {
	/// A human readable description of the problem.
	pub message: String,
}

impl EvaluationError {
	pub(crate) fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

impl std::error::Error for EvaluationError {}

impl std::fmt::Display for EvaluationError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Evaluation failed: {}", self.message)
	}
}

impl Error {
	/// Get the range in the source text that contains the error.
	///
	/// Returns [`None`] for errors that are not tied to a position in the source,
	/// like a missing variable looked up directly in a store.
	pub fn source_range(&self) -> Option<std::ops::Range<usize>> {
		let (start, len) = match &self {
			Self::MissingClosingDelimiter(e) => (e.position, 1),
			Self::Syntax(e) => (e.position, 1),
			Self::NoSuchVariable(_) | Self::NoSuchSubroutine(_) | Self::Evaluation(_) => return None,
		};
		Some(std::ops::Range {
			start,
			end: start + len,
		})
	}

	/// Get the line of source that contains the error.
	///
	/// # Panics
	/// May panic if the source text is not the original source that contains the error.
	pub fn source_line<'a>(&self, source: &'a str) -> Option<&'a str> {
		let position = self.source_range()?.start.min(source.len());
		let start = line_start(source, position);
		let end = line_end(source, position);
		Some(&source[start..end])
	}

	/// Write source highlighting for the error location.
	///
	/// The highlighting ends with a newline.
	///
	/// Note: this function doesn't print anything if the error has no source position,
	/// or if the source line exceeds 60 characters in width.
	/// For more control over this behaviour, consider using [`Self::source_range()`] and [`Self::source_line()`] instead.
	pub fn write_source_highlighting(&self, f: &mut impl std::fmt::Write, source: &str) -> std::fmt::Result {
		use unicode_width::UnicodeWidthStr;

		let (range, line) = match (self.source_range(), self.source_line(source)) {
			(Some(range), Some(line)) => (range, line),
			_ => return Ok(()),
		};
		if line.width() > 60 {
			return Ok(());
		}
		let start = line_start(source, range.start.min(source.len()));
		let range = (range.start - start)..(range.end - start);
		write!(f, "  {}\n  ", line)?;
		write_underline(f, line, range)?;
		writeln!(f)
	}

	/// Get source highlighting for the error location as a string.
	///
	/// The highlighting ends with a newline.
	pub fn source_highlighting(&self, source: &str) -> String {
		let mut output = String::new();
		// Writing to a String can not fail.
		let _ = self.write_source_highlighting(&mut output, source);
		output
	}
}

fn line_start(source: &str, position: usize) -> usize {
	match source.as_bytes()[..position].iter().rposition(|&c| c == b'\n' || c == b'\r') {
		Some(line_end) => line_end + 1,
		None => 0,
	}
}

fn line_end(source: &str, position: usize) -> usize {
	match source.as_bytes()[position..].iter().position(|&c| c == b'\n' || c == b'\r') {
		Some(line_end) => position + line_end,
		None => source.len(),
	}
}

/// Write carets below the given range of the line.
///
/// A range past the end of the line (an error at end-of-input) still gets one caret.
fn write_underline(f: &mut impl std::fmt::Write, line: &str, range: std::ops::Range<usize>) -> std::fmt::Result {
	use unicode_width::UnicodeWidthStr;
	let start = range.start.min(line.len());
	let end = range.end.min(line.len());
	let spaces = line.get(..start).map_or(start, |x| x.width());
	let carets = line.get(start..end).map_or(1, |x| x.width()).max(1);
	write!(f, "{}", " ".repeat(spaces))?;
	write!(f, "{}", "^".repeat(carets))?;
	Ok(())
}
