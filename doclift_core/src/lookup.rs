//! Title and summary lookups against other documents.
//!
//! Every lookup reads the target file on demand and fails soft: an unreadable
//! file or a missing marker yields `None` after a warning.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static MD_TITLE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\[//\]:\s*#\s*\(title:\s*(.+?)\s*\)").unwrap());
static TOPIC_TITLE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"<topic\b[^>]*?\s+title="([^"]+)"[^>]*?>"#).unwrap());
static CARD_SUMMARY: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<card-summary>([\s\S]*?)</card-summary>").unwrap());
static LINK_SUMMARY: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<link-summary>([\s\S]*?)</link-summary>").unwrap());
static TLDR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<tldr>([\s\S]*?)</tldr>").unwrap());
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[\s\S]*?>").unwrap());

fn is_markdown(path: &Path) -> bool {
	path.extension().is_some_and(|ext| ext == "md")
}

fn read_target(path: &Path, lookup: &str) -> Option<String> {
	std::fs::read_to_string(path)
		.inspect_err(|e| tracing::warn!(path = %path.display(), error = %e, lookup, "lookup target not readable"))
		.ok()
}

/// Declared title of a document: `[//]: # (title: …)` on the first line of
/// Markdown, or the `title` attribute of `<topic>`.
pub fn topic_title(path: &Path) -> Option<String> {
	let content = read_target(path, "topic title")?;
	title_in(&content, is_markdown(path))
}

pub fn title_in(content: &str, markdown: bool) -> Option<String> {
	let re: &Regex = if markdown { &MD_TITLE } else { &TOPIC_TITLE };
	re.captures(content).map(|caps| caps[1].to_string())
}

/// Heading text of the chapter `id`: `## Text {id="id"}` in Markdown or
/// `<chapter title="Text" id="id">` in a topic.
pub fn chapter_title(path: &Path, id: &str) -> Option<String> {
	let content = read_target(path, "chapter title")?;
	chapter_title_in(&content, id, is_markdown(path))
}

pub fn chapter_title_in(content: &str, id: &str, markdown: bool) -> Option<String> {
	let id = regex::escape(id);
	let pattern = if markdown {
		format!(r#"#{{1,6}}\s*(.+?)\s*\{{id="{id}"\}}"#)
	} else {
		format!(r#"<chapter\s+title="([^"]+)"\s+id="{id}">"#)
	};

	Regex::new(&pattern)
		.ok()?
		.captures(content)
		.map(|caps| caps[1].to_string())
}

/// Trimmed body of the `<card-summary>` element.
pub fn card_summary(path: &Path) -> Option<String> {
	let content = read_target(path, "card summary")?;
	CARD_SUMMARY
		.captures(&content)
		.map(|caps| caps[1].trim().to_string())
}

/// Trimmed body of `<link-summary>`, or the `<tldr>` text with tags removed
/// and its lines joined by single spaces.
pub fn link_summary(path: &Path) -> Option<String> {
	let content = read_target(path, "link summary")?;
	link_summary_in(&content)
}

pub fn link_summary_in(content: &str) -> Option<String> {
	if let Some(caps) = LINK_SUMMARY.captures(content) {
		return Some(caps[1].trim().to_string());
	}

	let tldr = TLDR.captures(content)?;
	let stripped = ANY_TAG.replace_all(&tldr[1], "");
	let joined = stripped
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.collect::<Vec<_>>()
		.join(" ");

	Some(joined)
}
