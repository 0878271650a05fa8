//! Rewrites for constructs that only exist in the Writerside flavour of
//! Markdown.

use std::path::Path;
use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

use crate::context::TransformContext;
use crate::lookup::chapter_title;
use crate::lookup::topic_title;
use crate::snippet::parse_line_ranges;
use crate::text::attribute;
use crate::text::dedent;
use crate::text::escape_attribute;
use crate::text::reindent;
use crate::text::trim_blank_edges;

static SOURCED_FENCE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"```([^\n`]*)\n([ \t]*)```[ \t]*(?:\r?\n)?[ \t]*\{([^}]*)\}").unwrap()
});
static TITLE_LINK_SHORTHAND: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\[\[\[([^|\]]+)\|([^\]]+)\]\]\]").unwrap());
static TABS_OPEN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)<\s*tabs\b([^>]*)>").unwrap());
static TABS_CLOSE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)<\s*/\s*tabs\s*>").unwrap());
static TAB_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<\s*tab\b([^>]*)>").unwrap());
static TAB_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<\s*/\s*tab\s*>").unwrap());
static INLINE_CODE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<code>([\s\S]*?)(?:</code>|</code-block>)").unwrap());
static EMPTY_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\]\(([^)]*)\)").unwrap());
static TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?:\n[ \t]*)?<tr>([\s\S]*?)</tr>(?:[ \t]*\n)?").unwrap()
});
static TABLE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<table>[\s\S]*?</table>").unwrap());
static TABLE_FENCE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\n```([^\n`]*)\n([\s\S]*?)```\n").unwrap());

/// Run every Markdown rewrite over `content`.
///
/// `file_path` locates the document on disk; empty links resolve their text
/// relative to its directory.
pub fn transform_markdown(ctx: &TransformContext, file_path: &Path, content: &str) -> String {
	tracing::debug!(path = %file_path.display(), "transforming markdown");

	let content = resolve_sourced_fences(ctx, content);
	let content = strip_title_links(&content);
	let content = normalize_tab_tags(&content);
	let content = escape_inline_code(&content);
	let content = resolve_empty_links(file_path, &content);
	let content = normalize_table_rows(&content);

	convert_table_fences(&content)
}

/// An empty fence followed by `{src="…"}` is filled with the referenced
/// snippet, re-indented to the fence. Attribute blocks without `src` are left
/// alone.
fn resolve_sourced_fences(ctx: &TransformContext, content: &str) -> String {
	SOURCED_FENCE
		.replace_all(content, |caps: &Captures| {
			let attrs = &caps[3];
			let Some(src) = attribute(attrs, "src") else {
				return caps[0].to_string();
			};

			let ranges = attribute(attrs, "include-lines")
				.map(parse_line_ranges)
				.unwrap_or_default();
			let code = ctx.snippets().resolve(src, &ranges);
			let language = &caps[1];
			let indent = &caps[2];
			let body = reindent(&dedent(&code), indent);

			format!("```{language}\n{body}\n{indent}```")
		})
		.into_owned()
}

/// `[[[Title|link]]]` keeps only its title.
pub fn strip_title_links(content: &str) -> String {
	TITLE_LINK_SHORTHAND.replace_all(content, "$1").into_owned()
}

/// Normalize tab element names regardless of how they were capitalized.
pub fn normalize_tab_tags(content: &str) -> String {
	let content = TABS_OPEN.replace_all(content, "<Tabs$1>");
	let content = TABS_CLOSE.replace_all(&content, "</Tabs>");
	let content = TAB_OPEN.replace_all(&content, "<TabItem$1>");
	TAB_CLOSE.replace_all(&content, "</TabItem>").into_owned()
}

/// Escape `<`, `>` and `*` inside `<code>` spans so they survive the next
/// Markdown pass literally.
pub fn escape_inline_code(content: &str) -> String {
	INLINE_CODE
		.replace_all(content, |caps: &Captures| {
			let escaped = caps[1]
				.replace('<', "&lt;")
				.replace('>', "&gt;")
				.replace('*', "&#42;");
			format!("<code>{escaped}</code>")
		})
		.into_owned()
}

fn resolve_empty_links(file_path: &Path, content: &str) -> String {
	let dir = file_path.parent().unwrap_or_else(|| Path::new(""));

	EMPTY_LINK
		.replace_all(content, |caps: &Captures| {
			let href = &caps[1];
			let title = match href.split_once('#') {
				Some(("", fragment)) => chapter_title(file_path, fragment),
				Some((file, fragment)) => chapter_title(&dir.join(file), fragment),
				None => topic_title(&dir.join(href)),
			};

			format!("[{}]({href})", title.unwrap_or_default())
		})
		.into_owned()
}

/// Put every table row's content on its own lines.
pub fn normalize_table_rows(content: &str) -> String {
	TABLE_ROW
		.replace_all(content, |caps: &Captures| {
			format!("\n<tr>\n{}\n</tr>\n", caps[1].trim())
		})
		.into_owned()
}

/// Fenced blocks inside `<table>` become self-closing `code-block` elements.
pub fn convert_table_fences(content: &str) -> String {
	TABLE
		.replace_all(content, |table: &Captures| {
			TABLE_FENCE
				.replace_all(&table[0], |caps: &Captures| {
					let code = escape_attribute(trim_blank_edges(&caps[2]));
					format!(r#"<code-block lang="{}" code="{code}"/>"#, &caps[1])
				})
				.into_owned()
		})
		.into_owned()
}
