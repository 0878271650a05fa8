use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::DocliftError;
use crate::DocliftResult;
use crate::text::dedent;
use crate::text::reindent;

static INCLUDE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"([ \t]*)<include\s+from="([^"]+)"\s+element-id="([^"]+)"\s*/?>"#).unwrap()
});

/// An `<include from="…" element-id="…"/>` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRef {
	pub from_file: String,
	pub element_id: String,
}

impl fmt::Display for IncludeRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.from_file, self.element_id)
	}
}

/// Inline every include directive in `source`.
///
/// Each directive is replaced by the body of the element carrying the
/// matching `id` in the referenced file, with nested includes resolved
/// first. The body's own common indentation is removed and every non-blank
/// line is re-prefixed with the indentation of the directive. A missing
/// file or element removes the directive and logs a warning.
///
/// An element that transitively includes itself is reported as
/// [`DocliftError::IncludeCycle`].
pub fn resolve_includes(source: &str, docs_root: &Path) -> DocliftResult<String> {
	let mut stack = Vec::new();
	resolve_with_stack(source, docs_root, &mut stack)
}

pub fn has_includes(source: &str) -> bool {
	INCLUDE_DIRECTIVE.is_match(source)
}

fn resolve_with_stack(
	source: &str,
	docs_root: &Path,
	stack: &mut Vec<IncludeRef>,
) -> DocliftResult<String> {
	let mut output = String::with_capacity(source.len());
	let mut last = 0;

	for caps in INCLUDE_DIRECTIVE.captures_iter(source) {
		let Some(directive) = caps.get(0) else {
			continue;
		};
		output.push_str(&source[last..directive.start()]);
		last = directive.end();

		let indent = caps.get(1).map_or("", |m| m.as_str());
		let reference = IncludeRef {
			from_file: caps[2].to_string(),
			element_id: caps[3].to_string(),
		};

		if stack.contains(&reference) {
			let mut chain: Vec<String> = stack.iter().map(ToString::to_string).collect();
			chain.push(reference.to_string());
			return Err(DocliftError::IncludeCycle { chain });
		}

		let Some(body) = load_element(docs_root, &reference) else {
			continue;
		};

		stack.push(reference);
		let body = resolve_with_stack(&body, docs_root, stack)?;
		stack.pop();

		output.push_str(&reindent(&dedent(&body), indent));
	}

	output.push_str(&source[last..]);
	Ok(output)
}

fn load_element(docs_root: &Path, reference: &IncludeRef) -> Option<String> {
	let path = docs_root.join(&reference.from_file);
	let content = match std::fs::read_to_string(&path) {
		Ok(content) => content,
		Err(e) => {
			tracing::warn!(path = %path.display(), error = %e, "include source not readable");
			return None;
		}
	};

	let body = element_body(&content, &reference.element_id);
	if body.is_none() {
		tracing::warn!(
			path = %path.display(),
			element_id = %reference.element_id,
			"include element not found"
		);
	}

	body
}

/// Body of the first element whose start tag carries `id="{id}"` and ends its
/// line. The body runs to the first `</name>` that ends a line, so an element
/// containing a same-named child ends at that child's closing tag.
pub fn element_body(content: &str, id: &str) -> Option<String> {
	let pattern = format!(
		r#"<([^\s>/]+)(?:\s+[^>]*?)?\s+id="{}"(?:\s+[^>]*?)?>\r?\n"#,
		regex::escape(id)
	);
	let start_tag = Regex::new(&pattern).ok()?;
	let caps = start_tag.captures(content)?;
	let name = caps.get(1)?.as_str();
	let body_start = caps.get(0)?.end();

	let closing = format!("</{name}>");
	let rest = &content[body_start..];
	let mut search_from = 0;

	while let Some(found) = rest[search_from..].find(&closing) {
		let close_at = search_from + found;
		let after = &rest[close_at + closing.len()..];
		if after.is_empty() || after.starts_with('\n') || after.starts_with('\r') {
			return Some(rest[..close_at].trim_end().to_string());
		}
		search_from = close_at + closing.len();
	}

	None
}
