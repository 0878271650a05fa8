//! Exercise sections with collapsible solutions.
//!
//! An exercise starts at a heading whose text begins with "Exercise" and runs
//! to the next heading of the same or a higher level. Its body holds the task
//! and a code sample; each following `|---|---|` separator starts a solution
//! carrying a `{… collapsed-title="…"}` attribute line:
//!
//! ````markdown
//! ### Exercise 1 {collapsible="true"}
//!
//! Write a program that prints the sum.
//!
//! ```kotlin
//! fun main() { }
//! ```
//!
//! |---|---|
//! ```kotlin
//! fun main() = println(1 + 2)
//! ```
//! {collapsible="true" collapsed-title="Example solution"}
//! ````
//!
//! Each part becomes a `::: details` container. The renderer cannot close
//! deeply nested details containers reliably, so only one closing marker is
//! emitted after the last solution.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::attribute;

static HEADING: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*(?:\{([^}]*)\})?\s*$").unwrap());
static SOLUTION_ATTRIBUTES: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"^\s*\{([^}]*collapsed-title="[^"]*"[^}]*)\}\s*$"#).unwrap());

const SEPARATOR: &str = "|---|---|";
const DEFAULT_SOLUTION_TITLE: &str = "Solution";

struct Heading<'a> {
	level: usize,
	text: &'a str,
	attrs: &'a str,
}

fn heading(line: &str) -> Option<Heading<'_>> {
	let caps = HEADING.captures(line)?;
	Some(Heading {
		level: caps.get(1)?.as_str().len(),
		text: caps.get(2).map_or("", |m| m.as_str()),
		attrs: caps.get(3).map_or("", |m| m.as_str()),
	})
}

fn is_exercise(heading: &Heading<'_>) -> bool {
	heading
		.text
		.get(..8)
		.is_some_and(|prefix| prefix.eq_ignore_ascii_case("exercise"))
}

fn is_fence(line: &str) -> bool {
	let trimmed = line.trim_start();
	trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Index one past the last line of the block opened by a heading of
/// `level` at `start`. Headings inside fenced code do not end the block.
fn block_end(lines: &[&str], start: usize, level: usize) -> usize {
	let mut in_fence = false;
	for (idx, line) in lines.iter().enumerate().skip(start + 1) {
		if is_fence(line) {
			in_fence = !in_fence;
			continue;
		}
		if !in_fence && heading(line).is_some_and(|h| h.level <= level) {
			return idx;
		}
	}
	lines.len()
}

fn rewrite_block(heading: &Heading<'_>, heading_line: &str, body: &[&str]) -> Option<Vec<String>> {
	let mut parts = body.split(|line| line.trim() == SEPARATOR);
	let exercise = parts.next()?;
	let solutions: Vec<&[&str]> = parts.collect();

	if solutions.is_empty() || !exercise.iter().any(|line| is_fence(line)) {
		return None;
	}

	let mut out = Vec::new();
	let heading_line = if heading.attrs.is_empty() {
		heading_line.trim_end().to_string()
	} else {
		format!("{} {}", "#".repeat(heading.level), heading.text)
	};
	out.push(heading_line);

	if attribute(heading.attrs, "collapsible") == Some("true") {
		out.push(String::new());
		out.push(format!("::: details {}", heading.text));
	}
	out.extend(exercise.iter().map(ToString::to_string));

	for solution in solutions {
		let title = solution
			.iter()
			.find_map(|line| SOLUTION_ATTRIBUTES.captures(line))
			.and_then(|caps| {
				attribute(caps.get(1)?.as_str(), "collapsed-title").map(ToString::to_string)
			})
			.unwrap_or_else(|| DEFAULT_SOLUTION_TITLE.to_string());

		out.push(String::new());
		out.push(format!("::: details {title}"));
		out.extend(
			solution
				.iter()
				.filter(|line| !SOLUTION_ATTRIBUTES.is_match(line))
				.map(ToString::to_string),
		);
	}

	while out.last().is_some_and(|line| line.trim().is_empty()) {
		out.pop();
	}
	out.push(":::".to_string());
	out.push(String::new());

	Some(out)
}

/// Rewrite every exercise section in `content`. Sections without a code
/// sample or without solutions are left unchanged.
pub fn rewrite_exercises(content: &str) -> String {
	let lines: Vec<&str> = content.split('\n').collect();
	let mut out: Vec<String> = Vec::with_capacity(lines.len());
	let mut idx = 0;
	let mut in_fence = false;

	while idx < lines.len() {
		let line = lines[idx];
		if is_fence(line) {
			in_fence = !in_fence;
		}

		let exercise = heading(line).filter(|h| !in_fence && is_exercise(h));
		let Some(exercise) = exercise else {
			out.push(line.to_string());
			idx += 1;
			continue;
		};

		let end = block_end(&lines, idx, exercise.level);
		match rewrite_block(&exercise, line, &lines[idx + 1..end]) {
			Some(block) => {
				out.extend(block);
				idx = end;
			}
			None => {
				out.push(line.to_string());
				idx += 1;
			}
		}
	}

	out.join("\n")
}
