//! Rewrites the XML flavoured topic dialect into canonical Markdown
//! components.
//!
//! [`transform_topic`] is an ordered list of whole-document rewrites. Each
//! one leaves unmatched text untouched and recognizes its own output, so the
//! transform can be run again over content it already produced.

use std::path::Path;
use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

use crate::DocliftResult;
use crate::context::TransformContext;
use crate::context::is_normalized;
use crate::include::resolve_includes;
use crate::lookup::card_summary;
use crate::lookup::chapter_title;
use crate::lookup::link_summary;
use crate::lookup::topic_title;
use crate::snippet::parse_line_ranges;
use crate::text::attribute;
use crate::text::escape_attribute;
use crate::text::remove_attribute;
use crate::text::trim_blank_edges;

static PATH_ELEMENT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<path>([\s\S]*?)</path>").unwrap());
static CARD_SELF_CLOSING: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<card(\s[^>]*?)?\s*/>").unwrap());
static CARD_PAIRED: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<card(\s[^>]*[^>/])?>([\s\S]*?)</card>").unwrap());
static ANCHOR_SELF_CLOSING: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<a(\s[^>]*?)?\s*/>").unwrap());
static ANCHOR_PAIRED: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<a(\s[^>]*[^>/])?>([\s\S]*?)</a>").unwrap());
static CODE_BLOCK_SELF_CLOSING: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?i)<code-block((?:\s[^>]*?)?)\s+src="([^"]+)"([^>]*)/>"#).unwrap()
});
static CODE_BLOCK_PAIRED: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)<code-block(\s[^>]*[^>/])?>([\s\S]*?)</code-block>").unwrap()
});
static CDATA_OPEN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\s*<!\[CDATA\[").unwrap());
static CDATA_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\]\]>\s*$").unwrap());
static CDATA_SECTION: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<!\[CDATA\[([\s\S]*?)\]\]>").unwrap());
static TOPIC_ELEMENT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<topic\s*[^>]*>[\s\S]*?</topic>").unwrap());

/// Run every topic rewrite over `content`.
///
/// `file_path` is the document being transformed; in-page anchors look up
/// their heading text there. Other references resolve against the context's
/// docs root.
pub fn transform_topic(
	ctx: &TransformContext,
	file_path: &Path,
	content: &str,
) -> DocliftResult<String> {
	tracing::debug!(path = %file_path.display(), "transforming topic");

	let content = wrap_paths(content);
	let content = resolve_includes(&content, ctx.docs_root())?;
	let content = rewrite_self_closing_cards(ctx, &content);
	let content = rewrite_paired_cards(ctx, &content);
	let content = rewrite_self_closing_anchors(file_path, &content);
	let content = rewrite_paired_anchors(ctx, &content);
	let content = rewrite_sourced_code_blocks(ctx, &content);
	let content = rewrite_paired_code_blocks(ctx, &content);

	Ok(unwrap_cdata(&content))
}

/// `<path>a\b</path>` becomes `<Path>a\\b</Path>`.
pub fn wrap_paths(content: &str) -> String {
	PATH_ELEMENT
		.replace_all(content, |caps: &Captures| {
			format!("<Path>{}</Path>", caps[1].replace('\\', "\\\\"))
		})
		.into_owned()
}

fn attrs_of<'a>(caps: &'a Captures, group: usize) -> &'a str {
	caps.get(group).map_or("", |m| m.as_str())
}

fn card(href: &str, summary: Option<&str>, inner: &str) -> String {
	match summary {
		Some(summary) => format!(r#"<card href="{href}" summary="{summary}">{inner}</card>"#),
		None => format!(r#"<card href="{href}">{inner}</card>"#),
	}
}

fn rewrite_self_closing_cards(ctx: &TransformContext, content: &str) -> String {
	CARD_SELF_CLOSING
		.replace_all(content, |caps: &Captures| {
			let attrs = attrs_of(caps, 1);
			let Some(href) = attribute(attrs, "href").filter(|href| !is_normalized(href)) else {
				return caps[0].to_string();
			};

			let target = ctx.target(href);
			let summary = card_summary(&target);
			let title = topic_title(&target).unwrap_or_default();

			card(&ctx.doc_href(href), summary.as_deref(), &title)
		})
		.into_owned()
}

fn rewrite_paired_cards(ctx: &TransformContext, content: &str) -> String {
	CARD_PAIRED
		.replace_all(content, |caps: &Captures| {
			let attrs = attrs_of(caps, 1);
			let Some(href) = attribute(attrs, "href").filter(|href| !is_normalized(href)) else {
				return caps[0].to_string();
			};

			let summary = match attribute(attrs, "summary") {
				Some(summary) => Some(summary.to_string()),
				None => card_summary(&ctx.target(href)),
			};

			card(&ctx.doc_href(href), summary.as_deref(), &caps[2])
		})
		.into_owned()
}

fn rewrite_self_closing_anchors(file_path: &Path, content: &str) -> String {
	ANCHOR_SELF_CLOSING
		.replace_all(content, |caps: &Captures| {
			let attrs = attrs_of(caps, 1);
			match (attribute(attrs, "anchor"), attribute(attrs, "href")) {
				(Some(anchor), Some(href)) => format!(r#"<a href="{href}#{anchor}"></a>"#),
				(None, Some(href)) => format!(r#"<a href="{href}"></a>"#),
				(Some(anchor), None) => {
					let title = chapter_title(file_path, anchor).unwrap_or_default();
					format!(r#"<a anchor="{anchor}">{title}</a>"#)
				}
				(None, None) => caps[0].to_string(),
			}
		})
		.into_owned()
}

fn rewrite_paired_anchors(ctx: &TransformContext, content: &str) -> String {
	ANCHOR_PAIRED
		.replace_all(content, |caps: &Captures| {
			let attrs = attrs_of(caps, 1);
			let inner = &caps[2];

			if let Some(anchor) = attribute(attrs, "anchor") {
				return format!(r##"<a href="#{anchor}">{inner}</a>"##);
			}

			let Some(href) = attribute(attrs, "href") else {
				return caps[0].to_string();
			};

			if let Some(summary) = attribute(attrs, "summary") {
				return card(&ctx.doc_href(href), Some(summary), inner);
			}

			if is_normalized(href) || href.starts_with('#') {
				return caps[0].to_string();
			}

			if let Some((file, fragment)) = href.split_once('#') {
				let title = chapter_title(&ctx.target(file), fragment)
					.unwrap_or_else(|| inner.to_string());
				return format!(r#"<a href="{href}">{title}</a>"#);
			}

			let target = ctx.target(href);
			let title = if inner.is_empty() {
				topic_title(&target).unwrap_or_default()
			} else {
				inner.to_string()
			};

			match link_summary(&target) {
				Some(summary) => {
					format!(
						r#"<Links href="{}" summary="{summary}">{title}</Links>"#,
						ctx.doc_href(href)
					)
				}
				None => format!(r#"<a href="{}">{title}</a>"#, ctx.doc_href(href)),
			}
		})
		.into_owned()
}

fn code_block(attrs: &str, code: &str) -> String {
	let attrs = attrs.trim();
	let space = if attrs.is_empty() { "" } else { " " };
	let code = escape_attribute(trim_blank_edges(code));
	format!(r#"<code-block{space}{attrs} code="{code}"/>"#)
}

fn resolve_snippet(ctx: &TransformContext, src: &str, attrs: &str) -> String {
	let ranges = attribute(attrs, "include-lines")
		.map(parse_line_ranges)
		.unwrap_or_default();
	ctx.snippets().resolve(src, &ranges)
}

fn rewrite_sourced_code_blocks(ctx: &TransformContext, content: &str) -> String {
	CODE_BLOCK_SELF_CLOSING
		.replace_all(content, |caps: &Captures| {
			let attrs = format!("{}{}", &caps[1], &caps[3]);
			let code = resolve_snippet(ctx, &caps[2], &attrs);
			code_block(&remove_attribute(&attrs, "include-lines"), &code)
		})
		.into_owned()
}

fn rewrite_paired_code_blocks(ctx: &TransformContext, content: &str) -> String {
	CODE_BLOCK_PAIRED
		.replace_all(content, |caps: &Captures| {
			let attrs = attrs_of(caps, 1);
			if attribute(attrs, "code").is_some() {
				return caps[0].to_string();
			}

			if let Some(src) = attribute(attrs, "src") {
				let code = resolve_snippet(ctx, src, attrs);
				let attrs = remove_attribute(&remove_attribute(attrs, "src"), "include-lines");
				return code_block(&attrs, &code);
			}

			let inner = CDATA_OPEN.replace(&caps[2], "");
			let inner = CDATA_CLOSE.replace(&inner, "");
			code_block(attrs, &inner)
		})
		.into_owned()
}

/// Replace every remaining CDATA section by its escaped body.
pub fn unwrap_cdata(content: &str) -> String {
	CDATA_SECTION
		.replace_all(content, |caps: &Captures| escape_attribute(&caps[1]))
		.into_owned()
}

/// Extract the `<topic>` element of a `.topic` file for publishing as
/// Markdown.
///
/// `transform` runs over the extracted element. Blank lines are removed
/// afterwards, and pages containing `<section-starting-page>` get a front
/// matter block that hides the aside. Returns `Ok(None)` when the file has no
/// `<topic>` element.
pub fn export_topic(
	content: &str,
	transform: impl FnOnce(&str) -> DocliftResult<String>,
) -> DocliftResult<Option<String>> {
	let Some(found) = TOPIC_ELEMENT.find(content) else {
		return Ok(None);
	};

	let topic = transform(found.as_str())?;

	let mut exported = topic
		.lines()
		.filter(|line| !line.trim().is_empty())
		.collect::<Vec<_>>()
		.join("\n");

	if exported.contains("<section-starting-page>") {
		exported.insert_str(0, "---\naside: false\n---\n");
	}

	Ok(Some(exported))
}
