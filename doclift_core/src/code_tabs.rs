//! MkDocs tabs that hold nothing but one fenced block each, grouped into a
//! `::: code-group`.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::indent_width;

static TAB_HEADER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"^(\s*)===\s*"([^"]+)"\s*$"#).unwrap());
static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\s*)```(\w*)").unwrap());

#[derive(Debug, PartialEq, Eq)]
struct CodeTab {
	title: String,
	lang: String,
	code: Vec<String>,
}

fn header_at<'a>(line: &'a str, indent: &str) -> Option<&'a str> {
	let caps = TAB_HEADER.captures(line)?;
	if caps.get(1).map_or("", |m| m.as_str()) != indent {
		return None;
	}
	caps.get(2).map(|m| m.as_str())
}

/// Parse the fenced block belonging to the header at `start`. Returns the
/// tab and the index of the line after its closing fence.
fn parse_tab(lines: &[&str], start: usize, indent: &str, title: &str) -> Option<(CodeTab, usize)> {
	let mut idx = start + 1;
	while idx < lines.len() && lines[idx].trim().is_empty() {
		idx += 1;
	}

	let caps = FENCE_OPEN.captures(lines.get(idx)?)?;
	let fence_indent = caps.get(1).map_or("", |m| m.as_str());
	if fence_indent.len() <= indent.len() {
		return None;
	}
	let lang = caps.get(2).map_or("", |m| m.as_str()).to_string();
	let closing = format!("{fence_indent}```");

	let mut code = Vec::new();
	idx += 1;
	while idx < lines.len() {
		let line = lines[idx];
		if line.starts_with(&closing) {
			let tab = CodeTab {
				title: title.to_string(),
				lang,
				code,
			};
			return Some((tab, idx + 1));
		}

		let stripped = line
			.strip_prefix(fence_indent)
			.unwrap_or_else(|| line.trim_start());
		code.push(stripped.to_string());
		idx += 1;
	}

	None
}

/// Collect the group starting at `start`. `None` means the tabs hold more
/// than a single fence each and must be left to the content tab rewriter.
fn parse_group(lines: &[&str], start: usize, indent: &str) -> Option<(Vec<CodeTab>, usize)> {
	let mut tabs = Vec::new();
	let mut idx = start;

	while let Some(title) = lines.get(idx).and_then(|line| header_at(line, indent)) {
		let (tab, after) = parse_tab(lines, idx, indent, title)?;
		tabs.push(tab);
		idx = after;

		let mut peek = idx;
		while peek < lines.len() && lines[peek].trim().is_empty() {
			peek += 1;
		}

		match lines.get(peek) {
			Some(line) if header_at(line, indent).is_some() => idx = peek,
			Some(line) if indent_width(line) > indent.len() => return None,
			_ => break,
		}
	}

	Some((tabs, idx))
}

/// End of the run of tab headers and their deeper-indented content that
/// starts at `start`.
fn region_end(lines: &[&str], start: usize, indent: &str) -> usize {
	let mut idx = start + 1;
	while let Some(line) = lines.get(idx) {
		let inside = line.trim().is_empty()
			|| indent_width(line) > indent.len()
			|| header_at(line, indent).is_some();
		if !inside {
			break;
		}
		idx += 1;
	}
	idx
}

/// Rewrite groups of code-only tabs into code groups. A group where any tab
/// is not exactly one fenced block keeps its own headers unchanged; code-only
/// groups nested inside its tabs are still rewritten.
pub fn rewrite_code_tab_groups(content: &str) -> String {
	let lines: Vec<&str> = content.split('\n').collect();
	let mut out: Vec<String> = Vec::with_capacity(lines.len());
	// Headers at this indent before this line belong to a mixed group.
	let mut mixed: Vec<(String, usize)> = Vec::new();
	let mut idx = 0;

	while idx < lines.len() {
		let line = lines[idx];
		let Some(caps) = TAB_HEADER.captures(line) else {
			out.push(line.to_string());
			idx += 1;
			continue;
		};
		let indent = caps.get(1).map_or("", |m| m.as_str());

		mixed.retain(|(_, end)| idx < *end);
		if mixed.iter().any(|(mixed_indent, _)| mixed_indent == indent) {
			out.push(line.to_string());
			idx += 1;
			continue;
		}

		let Some((tabs, next)) = parse_group(&lines, idx, indent) else {
			mixed.push((indent.to_string(), region_end(&lines, idx, indent)));
			out.push(line.to_string());
			idx += 1;
			continue;
		};

		out.push(format!("{indent}::: code-group"));
		for tab in tabs {
			out.push(format!("{indent}```{} [{}]", tab.lang, tab.title));
			out.extend(tab.code.into_iter().map(|line| {
				if line.trim().is_empty() {
					line
				} else {
					format!("{indent}{line}")
				}
			}));
			out.push(format!("{indent}```"));
		}
		out.push(format!("{indent}:::"));
		idx = next;
	}

	out.join("\n")
}
