//! Transform rules: delimiter selection, trimming and text replacement flags.

bitflags::bitflags! {
	/// A set of flags that controls how a value is transformed.
	///
	/// The flags fall in four groups:
	/// * expand selectors pick the delimiter pair (see [`Delimiters`]),
	/// * expand modifiers scope trimming and replacing to the expanded regions, or trim before expanding,
	/// * trim flags remove or collapse whitespace,
	/// * replace flags perform fixed text substitutions.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct TransformRules: u32 {
		/// Expand `${...}`.
		const EXPAND = 1 << 0;
		/// Expand `${{...}}`.
		const EXPAND_DUAL = 1 << 1;
		/// Expand `[...]`.
		const EXPAND_SQUARE = 1 << 2;
		/// Expand `[[...]]`.
		const EXPAND_DUAL_SQUARE = 1 << 3;

		/// Apply replace flags only to the expanded regions.
		const EXPAND_REPLACE_ONLY = 1 << 4;
		/// Apply trim flags only to the expanded regions.
		const EXPAND_TRIM_ONLY = 1 << 5;
		/// Trim the whole value first, then expand it.
		const EXPAND_AFTER_TRIM = 1 << 6;
		/// Alias of [`Self::EXPAND_AFTER_TRIM`].
		const TRIM_BEFORE_EXPAND = Self::EXPAND_AFTER_TRIM.bits();

		/// Remove leading whitespace.
		const TRIM_START = 1 << 7;
		/// Remove trailing whitespace.
		const TRIM_END = 1 << 8;
		/// Collapse runs of whitespace into a single space.
		const TRIM_INTERNAL = 1 << 9;
		/// Apply the other trim flags to every line separately.
		const MULTILINE = 1 << 10;

		/// Replace `~` with a space.
		const TILDE_TO_SPACE = 1 << 11;
		/// Replace `` ` `` with `"`.
		const BACKQUOTE_TO_DOUBLE_QUOTE = 1 << 12;
		/// Replace `[` and `]` with `<` and `>`.
		const SQUARE_TO_ANGLE = 1 << 13;
		/// Replace `{` and `}` with `<` and `>`.
		const CURLY_TO_ANGLE = 1 << 14;
		/// Normalize all line endings to `\n`.
		const NEWLINE_TO_LF = 1 << 15;
		/// Normalize all line endings to `\r\n`.
		const NEWLINE_TO_CRLF = 1 << 16;
		/// Double every `'`.
		const DOUBLE_SINGLE_QUOTES = 1 << 17;
		/// Double every `"`.
		const DOUBLE_DOUBLE_QUOTES = 1 << 18;
		/// Quote the text as a single command line argument, if needed.
		const QUOTE_ARG = 1 << 19;
		/// Escape XML special characters.
		const ESCAPE_XML = 1 << 20;
		/// Escape regular expression meta characters.
		const ESCAPE_REGEX = 1 << 21;
		/// Replace control characters other than tabs and line breaks with `.`.
		const REMOVE_CONTROL = 1 << 22;

		/// Trim both ends.
		const TRIM = Self::TRIM_START.bits() | Self::TRIM_END.bits();

		/// All expand selectors.
		const EXPAND_SELECTORS = Self::EXPAND.bits()
			| Self::EXPAND_DUAL.bits()
			| Self::EXPAND_SQUARE.bits()
			| Self::EXPAND_DUAL_SQUARE.bits();

		/// All expand selectors and modifiers.
		const EXPAND_MASK = Self::EXPAND_SELECTORS.bits()
			| Self::EXPAND_REPLACE_ONLY.bits()
			| Self::EXPAND_TRIM_ONLY.bits()
			| Self::EXPAND_AFTER_TRIM.bits();

		/// All trim flags.
		const TRIM_MASK = Self::TRIM_START.bits()
			| Self::TRIM_END.bits()
			| Self::TRIM_INTERNAL.bits()
			| Self::MULTILINE.bits();

		/// All replace flags.
		const REPLACE_MASK = Self::TILDE_TO_SPACE.bits()
			| Self::BACKQUOTE_TO_DOUBLE_QUOTE.bits()
			| Self::SQUARE_TO_ANGLE.bits()
			| Self::CURLY_TO_ANGLE.bits()
			| Self::NEWLINE_TO_LF.bits()
			| Self::NEWLINE_TO_CRLF.bits()
			| Self::DOUBLE_SINGLE_QUOTES.bits()
			| Self::DOUBLE_DOUBLE_QUOTES.bits()
			| Self::QUOTE_ARG.bits()
			| Self::ESCAPE_XML.bits()
			| Self::ESCAPE_REGEX.bits()
			| Self::REMOVE_CONTROL.bits();
	}
}

/// A pair of opening and closing expression delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
	/// The opening delimiter.
	pub begin: &'static str,

	/// The closing delimiter.
	pub end: &'static str,
}

impl Delimiters {
	/// `${` and `}`
	pub const EXPAND: Self = Self { begin: "${", end: "}" };
	/// `${{` and `}}`
	pub const DUAL: Self = Self { begin: "${{", end: "}}" };
	/// `[` and `]`
	pub const SQUARE: Self = Self { begin: "[", end: "]" };
	/// `[[` and `]]`
	pub const DUAL_SQUARE: Self = Self { begin: "[[", end: "]]" };
}

/// Expand selectors in priority order with their delimiters.
const SELECTORS: [(TransformRules, Delimiters); 4] = [
	(TransformRules::EXPAND_DUAL, Delimiters::DUAL),
	(TransformRules::EXPAND_DUAL_SQUARE, Delimiters::DUAL_SQUARE),
	(TransformRules::EXPAND_SQUARE, Delimiters::SQUARE),
	(TransformRules::EXPAND, Delimiters::EXPAND),
];

/// Readable names of the flags, as accepted by [`TransformRules::from_str()`][std::str::FromStr].
///
/// Names used for formatting come first for every flag.
const NAMES: &[(&str, TransformRules)] = &[
	("None", TransformRules::empty()),
	("Expand", TransformRules::EXPAND),
	("ExpandDual", TransformRules::EXPAND_DUAL),
	("ExpandSquare", TransformRules::EXPAND_SQUARE),
	("ExpandDualSquare", TransformRules::EXPAND_DUAL_SQUARE),
	("ExpandReplaceOnly", TransformRules::EXPAND_REPLACE_ONLY),
	("ExpandTrimOnly", TransformRules::EXPAND_TRIM_ONLY),
	("ExpandAfterTrim", TransformRules::EXPAND_AFTER_TRIM),
	("TrimBeforeExpand", TransformRules::EXPAND_AFTER_TRIM),
	("Trim", TransformRules::TRIM),
	("TrimStart", TransformRules::TRIM_START),
	("TrimEnd", TransformRules::TRIM_END),
	("TrimInternal", TransformRules::TRIM_INTERNAL),
	("Multiline", TransformRules::MULTILINE),
	("TildeToSpace", TransformRules::TILDE_TO_SPACE),
	("BackquoteToDoubleQuote", TransformRules::BACKQUOTE_TO_DOUBLE_QUOTE),
	("SquareToAngle", TransformRules::SQUARE_TO_ANGLE),
	("CurlyToAngle", TransformRules::CURLY_TO_ANGLE),
	("NewLineToLF", TransformRules::NEWLINE_TO_LF),
	("NewLineToCRLF", TransformRules::NEWLINE_TO_CRLF),
	("DoubleSingleQuotes", TransformRules::DOUBLE_SINGLE_QUOTES),
	("DoubleDoubleQuotes", TransformRules::DOUBLE_DOUBLE_QUOTES),
	("QuoteArg", TransformRules::QUOTE_ARG),
	("EscapeXml", TransformRules::ESCAPE_XML),
	("EscapeRegex", TransformRules::ESCAPE_REGEX),
	("RemoveControl", TransformRules::REMOVE_CONTROL),
];

impl TransformRules {
	/// Get the active delimiter pair.
	///
	/// If multiple selectors are set, the priority is
	/// [`EXPAND_DUAL`][Self::EXPAND_DUAL] > [`EXPAND_DUAL_SQUARE`][Self::EXPAND_DUAL_SQUARE] > [`EXPAND_SQUARE`][Self::EXPAND_SQUARE] > [`EXPAND`][Self::EXPAND].
	///
	/// Returns [`None`] if no selector is set.
	pub fn delimiters(self) -> Option<Delimiters> {
		SELECTORS
			.iter()
			.find(|(flag, _)| self.contains(*flag))
			.map(|(_, delimiters)| *delimiters)
	}

	/// Iterate over the delimiter pairs of all selectors that are set, in priority order.
	pub fn all_delimiters(self) -> impl Iterator<Item = Delimiters> {
		SELECTORS
			.into_iter()
			.filter(move |(flag, _)| self.contains(*flag))
			.map(|(_, delimiters)| delimiters)
	}

	/// Check if any expand selector is set.
	#[inline]
	pub fn expands(self) -> bool {
		self.intersects(Self::EXPAND_SELECTORS)
	}
}

/// Error returned when parsing an unknown rule name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRule {
	/// The name that was not recognized.
	pub name: String,
}

impl std::error::Error for UnknownRule {}

impl std::fmt::Display for UnknownRule {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Unknown transform rule: {}", self.name)
	}
}

impl std::str::FromStr for TransformRules {
	type Err = UnknownRule;

	/// Parse rule names separated by commas, spaces or `|`.
	///
	/// Names are case-insensitive, and can optionally be written with underscores.
	fn from_str(source: &str) -> Result<Self, Self::Err> {
		let mut rules = Self::empty();
		for name in source.split(|c: char| c == ',' || c == '|' || c.is_whitespace()) {
			if name.is_empty() {
				continue;
			}
			let normalized = name.replace('_', "");
			let (_, flag) = NAMES
				.iter()
				.find(|(known, _)| known.eq_ignore_ascii_case(&normalized))
				.ok_or_else(|| UnknownRule { name: name.to_owned() })?;
			rules |= *flag;
		}
		Ok(rules)
	}
}

impl std::fmt::Display for TransformRules {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		if self.is_empty() {
			return f.write_str("None");
		}
		let mut first = true;
		for (name, flag) in self.iter_names() {
			let Some((readable, _)) = NAMES.iter().find(|(_, known)| *known == flag) else {
				debug_assert!(false, "missing readable name for {name}");
				continue;
			};
			if !first {
				f.write_str(", ")?;
			}
			f.write_str(readable)?;
			first = false;
		}
		Ok(())
	}
}
