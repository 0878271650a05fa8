//! MkDocs admonitions (`!!! note "Title"`) to `:::` callout containers.

use std::sync::LazyLock;

use regex::Regex;

static ADMONITION_HEADER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"^(\s*)!!!\s+(\S+)(?:\s+"([^"]*)")?\s*$"#).unwrap());

/// Callout kind and title for an admonition header.
fn callout(kind: &str, title: &str) -> (String, String) {
	if kind == "注意" {
		let title = if title.is_empty() { "注意" } else { title };
		return ("note".to_string(), title.to_string());
	}

	(kind.to_lowercase(), title.to_string())
}

/// The part of `line` after one indent unit past `base`, when `line` belongs
/// to the admonition body.
fn body_line<'a>(line: &'a str, base: &str) -> Option<&'a str> {
	let rest = line.strip_prefix(base)?;
	rest.strip_prefix("    ").or_else(|| rest.strip_prefix('\t'))
}

fn is_fence(line: &str) -> bool {
	let trimmed = line.trim();
	trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Rewrite every admonition in `content`.
///
/// A header without any body lines is left as it is. When a body carries an
/// odd number of fence lines and the last line is a fence, that dangling
/// fence is dropped.
pub fn rewrite_admonitions(content: &str) -> String {
	let lines: Vec<&str> = content.split('\n').collect();
	let mut out: Vec<String> = Vec::with_capacity(lines.len());
	let mut idx = 0;

	while idx < lines.len() {
		let line = lines[idx];
		let Some(caps) = ADMONITION_HEADER.captures(line) else {
			out.push(line.to_string());
			idx += 1;
			continue;
		};

		let base = caps.get(1).map_or("", |m| m.as_str());
		let (kind, title) = callout(&caps[2], caps.get(3).map_or("", |m| m.as_str()));

		let mut body: Vec<&str> = Vec::new();
		let mut next = idx + 1;
		while next < lines.len() {
			let candidate = lines[next];
			if let Some(rest) = body_line(candidate, base) {
				body.push(rest);
			} else if candidate.trim().is_empty()
				&& lines[next..]
					.iter()
					.find(|following| !following.trim().is_empty())
					.is_some_and(|following| body_line(following, base).is_some())
			{
				body.push("");
			} else {
				break;
			}
			next += 1;
		}

		if body.is_empty() {
			out.push(line.to_string());
			idx += 1;
			continue;
		}

		let fences = body.iter().filter(|line| is_fence(line)).count();
		if fences % 2 == 1 && body.last().is_some_and(|last| is_fence(last)) {
			tracing::debug!(kind = %kind, "dropping dangling fence in admonition");
			body.pop();
		}

		let title = title.trim();
		if title.is_empty() {
			out.push(format!("{base}::: {kind}"));
		} else {
			out.push(format!("{base}::: {kind} {title}"));
		}
		out.extend(body.into_iter().map(|line| {
			if line.trim().is_empty() {
				String::new()
			} else {
				format!("{base}{line}")
			}
		}));
		out.push(format!("{base}:::"));

		idx = next;
	}

	out.join("\n")
}
