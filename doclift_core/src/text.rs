//! Small string utilities shared by the dialect transformers.

use std::borrow::Cow;

/// Placeholder used for newlines inside a double-quoted `code` attribute.
pub const NEWLINE_ENTITY: &str = "&#10;";

/// Escape text for use inside a double-quoted attribute. `&`, `<`, `>` and
/// `"` become entities and every newline becomes [`NEWLINE_ENTITY`].
pub fn escape_attribute(text: &str) -> String {
	html_escape::encode_double_quoted_attribute(text).replace('\n', NEWLINE_ENTITY)
}

/// Reverse [`escape_attribute`].
pub fn unescape_attribute(text: &str) -> String {
	html_escape::decode_html_entities(text).into_owned()
}

/// Length in bytes of the leading whitespace of `line`.
pub fn indent_width(line: &str) -> usize {
	line.len() - line.trim_start().len()
}

/// Leading whitespace of `line`.
pub fn leading_whitespace(line: &str) -> &str {
	&line[..indent_width(line)]
}

/// Smallest indentation across all non-blank lines, `0` if there are none.
pub fn min_indent<'a>(lines: impl IntoIterator<Item = &'a str>) -> usize {
	lines
		.into_iter()
		.filter(|line| !line.trim().is_empty())
		.map(indent_width)
		.min()
		.unwrap_or(0)
}

/// Remove the common indentation from every line. Blank lines become empty.
pub fn dedent(text: &str) -> String {
	let min = min_indent(text.split('\n'));
	text.split('\n')
		.map(|line| {
			if line.trim().is_empty() {
				""
			} else {
				line.get(min..).unwrap_or_else(|| line.trim_start())
			}
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// Prefix every non-blank line with `indent`.
pub fn reindent(text: &str, indent: &str) -> String {
	if indent.is_empty() {
		return text.to_string();
	}

	text.split('\n')
		.map(|line| {
			if line.trim().is_empty() {
				Cow::Borrowed(line)
			} else {
				Cow::Owned(format!("{indent}{line}"))
			}
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// Drop one run of blank lines at the start and one at the end of `text`.
///
/// Leading whitespace is removed up to (and including) its last newline, so
/// the indentation of the first real line is kept. Trailing whitespace is
/// removed from its first newline onwards.
pub fn trim_blank_edges(text: &str) -> &str {
	let mut result = text;

	let leading = &result[..indent_width(result)];
	if let Some(idx) = leading.rfind('\n') {
		result = &result[idx + 1..];
	}

	let trimmed_len = result.trim_end().len();
	if let Some(idx) = result[trimmed_len..].find('\n') {
		result = &result[..trimmed_len + idx];
	}

	result
}

/// Value of a double-quoted attribute `name="…"` inside a raw attribute
/// string.
pub fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
	let needle = format!("{name}=\"");
	let mut search_from = 0;

	while let Some(found) = attrs[search_from..].find(&needle) {
		let start = search_from + found;
		let preceded_by_boundary = start == 0
			|| attrs[..start]
				.chars()
				.next_back()
				.is_some_and(char::is_whitespace);

		let value_start = start + needle.len();
		if preceded_by_boundary {
			let value_len = attrs[value_start..].find('"')?;
			return Some(&attrs[value_start..value_start + value_len]);
		}

		search_from = value_start;
	}

	None
}

/// Remove the first `name="…"` attribute (with its leading whitespace) from a
/// raw attribute string.
pub fn remove_attribute(attrs: &str, name: &str) -> String {
	let Some(value) = attribute(attrs, name) else {
		return attrs.to_string();
	};

	let needle = format!("{name}=\"{value}\"");
	let Some(start) = attrs.find(&needle) else {
		return attrs.to_string();
	};

	let before = attrs[..start].trim_end_matches(char::is_whitespace);
	format!("{before}{}", &attrs[start + needle.len()..])
}
