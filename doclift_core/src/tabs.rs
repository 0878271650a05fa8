//! MkDocs content tabs (`=== "Title"`) to `<Tabs>` / `<TabItem>` containers.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::indent_width;

static TAB_HEADER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"^(\s*)===\s*"(.*)"\s*$"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKind {
	Group,
	Item,
}

/// One open container while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabStackEntry {
	/// Indentation of the `===` header in the source.
	pub indent: String,
	/// Indentation the container is emitted at.
	pub output_indent: String,
	pub kind: TabKind,
}

/// Open containers, innermost last. Indentation never decreases from the
/// bottom of the stack to the top.
#[derive(Debug, Default)]
pub struct TabStack {
	entries: Vec<TabStackEntry>,
}

impl TabStack {
	pub fn top(&self) -> Option<&TabStackEntry> {
		self.entries.last()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	fn push(&mut self, entry: TabStackEntry) {
		self.entries.push(entry);
	}

	/// Close every entry whose indentation is at least `width`, innermost
	/// first.
	fn close_from(&mut self, width: usize, out: &mut Vec<String>) {
		while let Some(top) = self.entries.last() {
			if top.indent.len() < width {
				break;
			}

			emit_closer(top, out);
			self.entries.pop();
		}
	}

	fn drain(&mut self, out: &mut Vec<String>) {
		self.close_from(0, out);
	}
}

fn emit_closer(entry: &TabStackEntry, out: &mut Vec<String>) {
	match entry.kind {
		TabKind::Group => {
			out.push(format!("\n{}</Tabs>", entry.output_indent));
			out.push(String::new());
		}
		TabKind::Item => out.push(format!("\n{}</TabItem>", entry.output_indent)),
	}
}

/// Rewrite every MkDocs content tab in `content`.
///
/// Content lines of a tab are indented one level deeper than its header;
/// that level is removed on output. A line that is not deeper than the open
/// tab closes every container at or above its indentation, and all open
/// containers are closed at the end of the document.
pub fn rewrite_content_tabs(content: &str) -> String {
	let mut out: Vec<String> = Vec::new();
	let mut stack = TabStack::default();

	for line in content.split('\n') {
		if let Some(caps) = TAB_HEADER.captures(line) {
			let indent = caps[1].to_string();
			let title = &caps[2];

			stack.close_from(indent.len() + 1, &mut out);

			let sibling_open = stack
				.top()
				.is_some_and(|top| top.kind == TabKind::Item && top.indent.len() == indent.len());
			if sibling_open {
				if let Some(top) = stack.entries.pop() {
					emit_closer(&top, &mut out);
				}
			}

			let output_indent = stack
				.top()
				.map_or_else(|| indent.clone(), |parent| parent.output_indent.clone());

			let in_group = stack
				.top()
				.is_some_and(|top| top.kind == TabKind::Group && top.indent.len() == indent.len());

			if !in_group {
				out.push(format!("{output_indent}<Tabs>\n"));
				stack.push(TabStackEntry {
					indent: indent.clone(),
					output_indent: output_indent.clone(),
					kind: TabKind::Group,
				});
			}

			out.push(format!("{output_indent}<TabItem title=\"{title}\">\n"));
			stack.push(TabStackEntry {
				indent,
				output_indent,
				kind: TabKind::Item,
			});
			continue;
		}

		if line.trim().is_empty() {
			out.push(line.to_string());
			continue;
		}

		let width = indent_width(line);
		match stack.top() {
			Some(top) if top.kind == TabKind::Item && width > top.indent.len() => {
				out.push(dedent_tab_content(line, top));
			}
			_ => {
				stack.close_from(width, &mut out);
				out.push(line.to_string());
			}
		}
	}

	stack.drain(&mut out);
	out.join("\n")
}

fn dedent_tab_content(line: &str, top: &TabStackEntry) -> String {
	let Some(rest) = line.strip_prefix(top.indent.as_str()) else {
		return line.to_string();
	};

	let rest = rest
		.strip_prefix("    ")
		.or_else(|| rest.strip_prefix('\t'))
		.unwrap_or(rest);

	format!("{}{rest}", top.output_indent)
}
