//! Media type inference from file paths
//!
//! A [`MediaTypeTable`] is an ordered list of `(pattern, media type)` rules.
//! The first rule whose pattern matches a path decides its type, so order,
//! not specificity, is what counts.

use regex::Regex;
use std::sync::LazyLock;

/// `text/css`
pub const TEXT_CSS: &str = "text/css";
/// `text/javascript`
pub const TEXT_JAVASCRIPT: &str = "text/javascript";
/// `application/json`
pub const APPLICATION_JSON: &str = "application/json";
/// `text/html`
pub const TEXT_HTML: &str = "text/html";
/// `image/png`
pub const IMAGE_PNG: &str = "image/png";
/// `font/woff2`
pub const FONT_WOFF2: &str = "font/woff2";
/// `font/woff`
pub const FONT_WOFF: &str = "font/woff";
/// `image/jpeg`
pub const IMAGE_JPEG: &str = "image/jpeg";
/// `text/plain`
pub const TEXT_PLAIN: &str = "text/plain";
/// Fallback type for paths no rule matches
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

// Order is significant as first match wins
static DEFAULT_RULES: LazyLock<Vec<MediaTypeRule>> = LazyLock::new(|| {
	[
		(r"\.css$", TEXT_CSS),
		(r"\.js$", TEXT_JAVASCRIPT),
		(r"\.html$", TEXT_HTML),
		(r"\.json$", APPLICATION_JSON),
		(r"\.png$", IMAGE_PNG),
		(r"\.woff2$", FONT_WOFF2),
		(r"\.woff$", FONT_WOFF),
		(r"\.jpeg$", IMAGE_JPEG),
		(r"\.jpg$", IMAGE_JPEG),
		(r"\.txt$", TEXT_PLAIN),
	]
	.into_iter()
	.filter_map(|(pattern, media_type)| {
		Regex::new(pattern)
			.ok()
			.map(|pattern| MediaTypeRule::new(pattern, media_type))
	})
	.collect()
});

/// Where a newly registered rule is inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RulePosition {
	/// Checked before every existing rule
	Front,
	/// Checked after every existing rule
	#[default]
	Back,
}

/// A single path pattern and the media type it declares
#[derive(Debug, Clone)]
pub struct MediaTypeRule {
	pattern: Regex,
	media_type: String,
}

impl MediaTypeRule {
	/// Creates a rule
	pub fn new(pattern: Regex, media_type: impl Into<String>) -> Self {
		Self {
			pattern,
			media_type: media_type.into(),
		}
	}

	/// Pattern matched against the file path
	pub fn pattern(&self) -> &Regex {
		&self.pattern
	}

	/// Declared media type
	pub fn media_type(&self) -> &str {
		&self.media_type
	}

	/// Returns true if the rule applies to `path`
	pub fn matches(&self, path: &str) -> bool {
		self.pattern.is_match(path)
	}
}

/// Ordered, first-match-wins media type rules
///
/// Mutation takes `&mut self`; tables are configured before serving starts
/// and only read afterwards.
///
/// # Example
///
/// ```rust
/// use reinhardt_assets::media_type::{MediaTypeTable, RulePosition};
/// use regex::Regex;
///
/// let mut table = MediaTypeTable::default();
/// assert_eq!(table.infer("app.js"), "text/javascript");
///
/// let added = table.register(Regex::new(r"\.wasm$").unwrap(), "application/wasm", RulePosition::Front);
/// assert!(added);
/// assert_eq!(table.infer("module.wasm"), "application/wasm");
/// assert_eq!(table.infer("archive.tar"), "application/octet-stream");
/// ```
#[derive(Debug, Clone)]
pub struct MediaTypeTable {
	rules: Vec<MediaTypeRule>,
}

impl MediaTypeTable {
	/// Creates a table with no rules
	pub fn empty() -> Self {
		Self { rules: Vec::new() }
	}

	/// Creates a table from rules, in evaluation order
	pub fn from_rules(rules: impl IntoIterator<Item = MediaTypeRule>) -> Self {
		Self {
			rules: rules.into_iter().collect(),
		}
	}

	/// Adds a rule
	///
	/// Returns `false` and leaves the table untouched if a rule for
	/// `media_type` is already registered.
	pub fn register(
		&mut self,
		pattern: Regex,
		media_type: impl Into<String>,
		position: RulePosition,
	) -> bool {
		let media_type = media_type.into();
		if self.is_registered(&media_type) {
			return false;
		}

		let rule = MediaTypeRule::new(pattern, media_type);
		match position {
			RulePosition::Front => self.rules.insert(0, rule),
			RulePosition::Back => self.rules.push(rule),
		}
		true
	}

	/// Removes the rule for `media_type`
	///
	/// Returns `false` if no such rule was registered.
	pub fn remove(&mut self, media_type: &str) -> bool {
		match self.position_of(media_type) {
			Some(index) => {
				self.rules.remove(index);
				true
			}
			None => false,
		}
	}

	/// Returns true if a rule for `media_type` is registered
	pub fn is_registered(&self, media_type: &str) -> bool {
		self.position_of(media_type).is_some()
	}

	/// Media type of the first rule matching `path`, or
	/// [`APPLICATION_OCTET_STREAM`]
	pub fn infer(&self, path: &str) -> &str {
		self.rules
			.iter()
			.find(|rule| rule.matches(path))
			.map(MediaTypeRule::media_type)
			.unwrap_or(APPLICATION_OCTET_STREAM)
	}

	/// Rules in evaluation order
	pub fn iter(&self) -> impl Iterator<Item = &MediaTypeRule> {
		self.rules.iter()
	}

	/// Number of rules
	pub fn len(&self) -> usize {
		self.rules.len()
	}

	/// Returns true if the table has no rules
	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	fn position_of(&self, media_type: &str) -> Option<usize> {
		self.rules
			.iter()
			.position(|rule| rule.media_type == media_type)
	}
}

impl Default for MediaTypeTable {
	/// Built-in rules for css, js, html, json, png, woff2, woff, jpeg, jpg and
	/// txt, in that order
	fn default() -> Self {
		Self::from_rules(DEFAULT_RULES.iter().cloned())
	}
}
