//! Whole-document substitutions for constructs that never nest.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

static LIQUID_CONDITION: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{%\s*if\s+.*?%\}[\s\S]*?\{%\s*endif\s*%\}").unwrap());
static LIQUID_INCLUDE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"\{%\s*include\s+['"]([^'"]+)['"]\s*%\}"#).unwrap());
static CONTRIBUTE_URL: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<contribute-url>.*?</contribute-url>\s*").unwrap());
static TEST_NAME_COMMENT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<!---\s*TEST_NAME\s+.*?-->\s*").unwrap());
static CLASS_STYLE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{:\.[\w-]+(?:\.[\w-]+)*\}").unwrap());
static TITLE_COMMENT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\[//\]: # \(title:\s*(.*?)\)").unwrap());
static PRIMARY_LABEL: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"(?i)<primary-label\s+ref="([^"]+)"/>"#).unwrap());
static STYLED_BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r#"(?mR)^([ \t]*)((?:[ \t]*>[^\r\n]*\r?\n)*[ \t]*>[^\r\n]*)\r?\n[ \t]*\{(?:style|type)="([a-z0-9_-]+)"\}[ \t]*$"#,
	)
	.unwrap()
});
static QUOTE_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*>[ \t]?").unwrap());
static FENCE_ATTRIBUTES: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?m)^([ \t]*)```\r?\n[ \t]*\{[^}\n]*=[^}\n]*\}[ \t]*(?:\r?\n)?").unwrap()
});
static HL_LINES: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"```(\w+)\s+hl_lines="([^"]+)""#).unwrap());
static VERSION_PLACEHOLDER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\{\s*versions\.([A-Za-z0-9_]+)\s*\}\}").unwrap());
static VARIABLE_DECLARATION: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"(?i)<var\s+name="([^"]+)"\s+value="([^"]+)"[^>]*>"#).unwrap());
static VARIABLE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?i)<var\s+name="([^"]+)"\s+value="([^"]+)"[^>]*/?>|%([\w.-]+)%"#).unwrap()
});
static SCRIPT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap());
static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?ms)\A---\r?\n(.*?)^---[ \t]*\r?(?:\n|\z)(?:\r?\n)*").unwrap()
});
static VIDEO_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(/?)video\b").unwrap());
static MARKDOWN_IMAGE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(!\[[^\]]*\]\()([^)\s<][^)\s]*)").unwrap());
static HTML_IMAGE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"(?i)(<img\s(?:[^>]*?\s)?src=["'])([^"']+)"#).unwrap());
static DIFF_FENCE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^([ \t]*)(`{3,})diff[ \t]+(.*)$").unwrap());
static DIFF_TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\btitle="([^"]*)""#).unwrap());

/// Lines scanned for an existing level-one heading.
const AUTO_TITLE_SCAN_LINES: usize = 20;

/// Drop `{% if … %}…{% endif %}` blocks with their content.
pub fn remove_liquid_conditions(content: &str) -> String {
	LIQUID_CONDITION.replace_all(content, "").into_owned()
}

/// `{% include 'path' %}` becomes an `<!--@include: ../path-->` directive.
pub fn convert_liquid_includes(content: &str) -> String {
	LIQUID_INCLUDE
		.replace_all(content, "<!--@include: ../$1-->")
		.into_owned()
}

pub fn remove_contribute_urls(content: &str) -> String {
	let content = CONTRIBUTE_URL.replace_all(content, "");
	TEST_NAME_COMMENT.replace_all(&content, "").into_owned()
}

/// Drop Kramdown style class markers such as `{:.note.wide}`.
pub fn remove_class_styles(content: &str) -> String {
	CLASS_STYLE.replace_all(content, "").into_owned()
}

/// Prepend a title heading from a `[//]: # (title: …)` comment. A primary
/// label declared within the next four lines turns the heading into a
/// `<TopicTitle>` component.
pub fn prepend_frontmatter_title(content: &str) -> String {
	let lines: Vec<&str> = content.lines().collect();
	let Some((title_idx, title)) = lines.iter().enumerate().find_map(|(idx, line)| {
		TITLE_COMMENT
			.captures(line)
			.map(|caps| (idx, caps[1].trim().to_string()))
	}) else {
		return content.to_string();
	};

	let label = lines
		.iter()
		.skip(title_idx + 1)
		.take(4)
		.filter_map(|line| PRIMARY_LABEL.captures(line))
		.map(|caps| caps[1].trim().to_string())
		.find(|label| !label.eq_ignore_ascii_case("none"));

	match label {
		Some(label) => format!("<TopicTitle labelRef=\"{label}\" title=\"{title}\"/>\n\n{content}"),
		None => format!("# {title}\n\n{content}"),
	}
}

/// Prepend `# title` from the YAML front matter when none of the first
/// lines is a level-one heading. The front matter is dropped along with it.
/// Pages without a doc type and `kotlin` pages are left alone.
pub fn prepend_auto_title(content: &str, doc_type: Option<&str>) -> String {
	if matches!(doc_type, None | Some("kotlin")) {
		return content.to_string();
	}

	let has_heading = content
		.trim()
		.lines()
		.take(AUTO_TITLE_SCAN_LINES)
		.any(|line| line.trim().starts_with("# "));
	if has_heading {
		return content.to_string();
	}

	let Some(caps) = FRONT_MATTER.captures(content) else {
		return content.to_string();
	};
	let Some(title) = front_matter_title(&caps[1]) else {
		return content.to_string();
	};
	let body_start = caps.get(0).map_or(0, |whole| whole.end());

	format!("# {title}\n\n{}", &content[body_start..])
}

fn front_matter_title(source: &str) -> Option<String> {
	let data: serde_yaml_ng::Value = match serde_yaml_ng::from_str(source) {
		Ok(data) => data,
		Err(e) => {
			tracing::debug!(error = %e, "ignoring unreadable front matter");
			return None;
		}
	};

	data.get("title")
		.and_then(serde_yaml_ng::Value::as_str)
		.map(str::trim)
		.filter(|title| !title.is_empty())
		.map(str::to_string)
}

/// A blockquote followed by `{style="x"}` or `{type="x"}` becomes a `::: x`
/// container at the blockquote's indentation.
pub fn convert_styled_blockquotes(content: &str) -> String {
	STYLED_BLOCKQUOTE
		.replace_all(content, |caps: &Captures| {
			let indent = &caps[1];
			let body = QUOTE_MARKER.replace_all(&caps[2], "").replace('\r', "");
			let container = format!("::: {}\n{}\n:::", &caps[3], body.trim());

			container
				.split('\n')
				.map(|line| format!("{indent}{line}"))
				.collect::<Vec<_>>()
				.join("\n")
		})
		.into_owned()
}

/// Drop `{key="value"}` attribute lines that directly follow a bare fence.
pub fn remove_code_attributes(content: &str) -> String {
	FENCE_ATTRIBUTES.replace_all(content, "$1```\n").into_owned()
}

/// ```` ```lang hl_lines="1 3" ```` becomes ```` ```lang {1 3} ````.
pub fn convert_hl_lines(content: &str) -> String {
	HL_LINES.replace_all(content, "```$1 {$2}").into_owned()
}

/// Wrap ```` ```diff title="…" ```` fences in a titled code block. The
/// title moves out of the info string into the title bar. Unclosed fences
/// are left alone.
pub fn wrap_diff_titles(content: &str) -> String {
	let lines: Vec<&str> = content.split_inclusive('\n').collect();
	let mut out = String::with_capacity(content.len());
	let mut idx = 0;

	while idx < lines.len() {
		let line = lines[idx];
		idx += 1;

		let Some(caps) = DIFF_FENCE.captures(line.trim_end_matches(['\r', '\n'])) else {
			out.push_str(line);
			continue;
		};
		let (indent, fence, info) = (&caps[1], &caps[2], &caps[3]);
		let Some(title) = DIFF_TITLE.captures(info) else {
			out.push_str(line);
			continue;
		};
		let Some(close) = lines[idx..].iter().position(|candidate| {
			let candidate = candidate.trim();
			candidate.starts_with(fence) && candidate.trim_start_matches('`').is_empty()
		}) else {
			out.push_str(line);
			continue;
		};

		let rest = DIFF_TITLE.replace(info, "");
		let rest = rest.trim();
		let title = html_escape::encode_text(&title[1]);

		out.push_str(&format!("{indent}<div class=\"vp-code-block-title\">\n"));
		out.push_str(&format!("{indent}<div class=\"vp-code-block-title-bar\">{title}</div>\n\n"));
		if rest.is_empty() {
			out.push_str(&format!("{indent}{fence}diff\n"));
		} else {
			out.push_str(&format!("{indent}{fence}diff {rest}\n"));
		}

		let end = idx + close;
		for body in &lines[idx..end] {
			out.push_str(body);
		}
		let closing = lines[end];
		out.push_str(closing.trim_end_matches(['\r', '\n']));
		out.push('\n');
		out.push_str(&format!("{indent}</div>"));
		if closing.ends_with('\n') {
			out.push('\n');
		}
		idx = end + 1;
	}

	out
}

/// Relative image sources gain a leading `/` so they resolve from the site
/// root. Absolute URLs, rooted paths, anchors and data URIs are kept.
pub fn prefix_image_sources(content: &str) -> String {
	outside_fences(content, |prose| {
		let prose = MARKDOWN_IMAGE.replace_all(prose, |caps: &Captures| prefixed_source(caps));
		HTML_IMAGE
			.replace_all(&prose, |caps: &Captures| prefixed_source(caps))
			.into_owned()
	})
}

fn prefixed_source(caps: &Captures) -> String {
	let src = &caps[2];
	let keep = ["http://", "https://", "/", "#", "data:"]
		.iter()
		.any(|prefix| src.starts_with(prefix));

	if keep {
		caps[0].to_string()
	} else {
		format!("{}/{src}", &caps[1])
	}
}

/// Writerside `<video>` embeds become `<YouTubeVideo>` components.
pub fn rename_video_tags(content: &str) -> String {
	outside_fences(content, |prose| {
		VIDEO_TAG.replace_all(prose, "<${1}YouTubeVideo").into_owned()
	})
}

/// Apply `rewrite` to each run of lines outside fenced code blocks.
fn outside_fences(content: &str, rewrite: impl Fn(&str) -> String) -> String {
	let mut out = String::with_capacity(content.len());
	let mut prose = String::new();
	let mut in_fence = false;

	for line in content.split_inclusive('\n') {
		let trimmed = line.trim_start();
		let fence = trimmed.starts_with("```") || trimmed.starts_with("~~~");
		if !in_fence && !fence {
			prose.push_str(line);
			continue;
		}

		out.push_str(&rewrite(&prose));
		prose.clear();
		out.push_str(line);
		if fence {
			in_fence = !in_fence;
		}
	}

	out.push_str(&rewrite(&prose));
	out
}

/// Replace `{{ versions.name }}` with values from the `versions` object of
/// `data`. Unknown names are left in place.
pub fn substitute_versions(content: &str, data: &serde_json::Value) -> String {
	VERSION_PLACEHOLDER
		.replace_all(content, |caps: &Captures| {
			match data.get("versions").and_then(|versions| versions.get(&caps[1])) {
				Some(serde_json::Value::String(value)) => value.clone(),
				Some(serde_json::Value::Null) | None => caps[0].to_string(),
				Some(value) => value.to_string(),
			}
		})
		.into_owned()
}

/// Collect `<var name="…" value="…"/>` declarations from a variables file.
pub fn parse_variable_list(source: &str) -> BTreeMap<String, String> {
	VARIABLE_DECLARATION
		.captures_iter(source)
		.map(|caps| (caps[1].to_string(), caps[2].to_string()))
		.collect()
}

/// Apply `<var>` declarations and `%name%` placeholders in document order.
///
/// `globals` seeds the known variables. Inline declarations are removed and
/// take effect for the rest of the document. A declaration, or a placeholder
/// that expands to nothing, removes its whole line when nothing else is on
/// it. Placeholders of undeclared variables are kept literally.
pub fn substitute_topic_variables(content: &str, globals: &BTreeMap<String, String>) -> String {
	let mut variables = globals.clone();
	let mut out = String::with_capacity(content.len());
	let mut last = 0;

	for caps in VARIABLE_TOKEN.captures_iter(content) {
		let Some(token) = caps.get(0) else {
			continue;
		};
		let (start, end) = (token.start(), token.end());
		let line_start = content[..start].rfind('\n').map_or(0, |idx| idx + 1);
		let line_end = content[end..].find('\n').map_or(content.len(), |idx| end + idx);
		let alone_on_line =
			content[line_start..start].trim().is_empty() && content[end..line_end].trim().is_empty();
		let next_line = if line_end < content.len() {
			line_end + 1
		} else {
			line_end
		};

		if let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) {
			variables.insert(name.as_str().to_string(), value.as_str().to_string());
			if alone_on_line {
				out.push_str(&content[last..line_start]);
				last = next_line;
			} else {
				out.push_str(&content[last..start]);
				last = end;
			}
			continue;
		}

		let Some(name) = caps.get(3) else {
			continue;
		};

		match variables.get(name.as_str()) {
			Some(value) if value.is_empty() && alone_on_line => {
				out.push_str(&content[last..line_start]);
				last = next_line;
			}
			Some(value) => {
				out.push_str(&content[last..start]);
				out.push_str(value);
				last = end;
			}
			None => {
				out.push_str(&content[last..end]);
				last = end;
			}
		}
	}

	out.push_str(&content[last..]);
	out
}

pub fn remove_scripts(content: &str) -> String {
	SCRIPT.replace_all(content, "").into_owned()
}
