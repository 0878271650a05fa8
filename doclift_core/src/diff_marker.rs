use std::sync::LazyLock;

use regex::Regex;

static DIFF_MARKER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\+\+|\+\+\}|\{--|--\}|\{==|==\}").unwrap());

/// A highlighted span of code as produced by the syntax highlighter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightToken {
	pub content: String,
}

impl HighlightToken {
	pub fn new(content: impl Into<String>) -> Self {
		Self {
			content: content.into(),
		}
	}
}

/// Remove `{++ ++}`, `{-- --}` and `{== ==}` markers from highlighted lines.
/// Markers are stripped per token, so a marker split across two tokens is
/// left alone.
pub fn strip_diff_markers(lines: &mut [Vec<HighlightToken>]) {
	for token in lines.iter_mut().flatten() {
		if DIFF_MARKER.is_match(&token.content) {
			token.content = DIFF_MARKER.replace_all(&token.content, "").into_owned();
		}
	}
}
