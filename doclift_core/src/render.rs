//! The ordered list of passes every document goes through at render time.
//!
//! Each [`Stage`] is a named pure function from document text to document
//! text. [`RenderPipeline::default`] holds the standard order; callers can
//! drop stages or splice their own in by name.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use crate::admonition::rewrite_admonitions;
use crate::code_tabs::rewrite_code_tab_groups;
use crate::document::Dialect;
use crate::document::Document;
use crate::exercise::rewrite_exercises;
use crate::stages;
use crate::tabs::rewrite_content_tabs;

/// Per-document inputs shared by all stages.
#[derive(Debug, Clone, Default)]
pub struct RenderEnv {
	/// Documentation namespace of the page, such as `ktor`.
	pub doc_type: Option<String>,
	/// Path of the page relative to the site source.
	pub relative_path: PathBuf,
	/// Global `<var>` declarations for the doc type.
	pub variables: BTreeMap<String, String>,
	/// Version data exposed as `{{ versions.name }}`.
	pub versions: serde_json::Value,
	/// The page comes from a Writerside repository.
	pub writerside: bool,
}

impl RenderEnv {
	pub fn new(doc_type: Option<String>, relative_path: impl Into<PathBuf>) -> Self {
		Self {
			doc_type,
			relative_path: relative_path.into(),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_writerside(mut self, writerside: bool) -> Self {
		self.writerside = writerside;
		self
	}

	/// Load `<doc_type>.v.list` and `<doc_type>Ver.json` from
	/// `variables_dir`. Missing or unreadable files leave the corresponding
	/// data empty.
	#[must_use]
	pub fn with_variables_from(mut self, variables_dir: &Path) -> Self {
		let Some(doc_type) = self.doc_type.as_deref() else {
			return self;
		};

		let list = variables_dir.join(format!("{doc_type}.v.list"));
		if let Ok(source) = std::fs::read_to_string(&list) {
			self.variables = stages::parse_variable_list(&source);
		}

		let versions = variables_dir.join(format!("{doc_type}Ver.json"));
		if let Ok(source) = std::fs::read_to_string(&versions) {
			match serde_json::from_str(&source) {
				Ok(value) => self.versions = value,
				Err(e) => {
					tracing::warn!(path = %versions.display(), error = %e, "ignoring invalid version data");
				}
			}
		}

		self
	}
}

pub type StageFn = fn(&str, &RenderEnv) -> String;

/// A named render pass.
#[derive(Clone, Copy)]
pub struct Stage {
	pub name: &'static str,
	pub run: StageFn,
}

impl Stage {
	pub const fn new(name: &'static str, run: StageFn) -> Self {
		Self { name, run }
	}
}

impl fmt::Debug for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Stage").field(&self.name).finish()
	}
}

/// Stages in their default order.
pub const DEFAULT_STAGES: [Stage; 19] = [
	Stage::new("liquid-conditions", |text: &str, _: &RenderEnv| {
		stages::remove_liquid_conditions(text)
	}),
	Stage::new("liquid-includes", |text: &str, _: &RenderEnv| {
		stages::convert_liquid_includes(text)
	}),
	Stage::new("contribute-url", |text: &str, _: &RenderEnv| stages::remove_contribute_urls(text)),
	Stage::new("class-styles", |text: &str, _: &RenderEnv| stages::remove_class_styles(text)),
	Stage::new("frontmatter-title", |text: &str, _: &RenderEnv| {
		stages::prepend_frontmatter_title(text)
	}),
	Stage::new("auto-title", |text: &str, env: &RenderEnv| {
		stages::prepend_auto_title(text, env.doc_type.as_deref())
	}),
	Stage::new("styled-blockquote", |text: &str, _: &RenderEnv| {
		stages::convert_styled_blockquotes(text)
	}),
	Stage::new("exercises", |text: &str, _: &RenderEnv| rewrite_exercises(text)),
	Stage::new("code-attributes", |text: &str, _: &RenderEnv| stages::remove_code_attributes(text)),
	Stage::new("admonitions", |text: &str, _: &RenderEnv| rewrite_admonitions(text)),
	Stage::new("code-tab-groups", |text: &str, _: &RenderEnv| rewrite_code_tab_groups(text)),
	Stage::new("content-tabs", |text: &str, _: &RenderEnv| rewrite_content_tabs(text)),
	Stage::new("diff-titles", |text: &str, _: &RenderEnv| stages::wrap_diff_titles(text)),
	Stage::new("hl-lines", |text: &str, _: &RenderEnv| stages::convert_hl_lines(text)),
	Stage::new("version-variables", |text: &str, env: &RenderEnv| {
		stages::substitute_versions(text, &env.versions)
	}),
	Stage::new("topic-variables", |text: &str, env: &RenderEnv| {
		stages::substitute_topic_variables(text, &env.variables)
	}),
	Stage::new("image-sources", |text: &str, _: &RenderEnv| stages::prefix_image_sources(text)),
	Stage::new("video-tags", |text: &str, env: &RenderEnv| {
		if env.writerside {
			stages::rename_video_tags(text)
		} else {
			text.to_string()
		}
	}),
	Stage::new("scripts", |text: &str, _: &RenderEnv| stages::remove_scripts(text)),
];

#[derive(Debug, Clone)]
pub struct RenderPipeline {
	stages: Vec<Stage>,
}

impl Default for RenderPipeline {
	fn default() -> Self {
		Self {
			stages: DEFAULT_STAGES.to_vec(),
		}
	}
}

impl RenderPipeline {
	pub fn empty() -> Self {
		Self { stages: Vec::new() }
	}

	pub fn stage_names(&self) -> Vec<&'static str> {
		self.stages.iter().map(|stage| stage.name).collect()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.stages.iter().any(|stage| stage.name == name)
	}

	/// Drop the stage called `name`, if present.
	#[must_use]
	pub fn without(mut self, name: &str) -> Self {
		self.stages.retain(|stage| stage.name != name);
		self
	}

	/// Insert `stage` directly before the stage called `name`, or at the end
	/// when there is no such stage.
	#[must_use]
	pub fn insert_before(mut self, name: &str, stage: Stage) -> Self {
		let position = self
			.stages
			.iter()
			.position(|existing| existing.name == name)
			.unwrap_or(self.stages.len());
		self.stages.insert(position, stage);
		self
	}

	#[must_use]
	pub fn push(mut self, stage: Stage) -> Self {
		self.stages.push(stage);
		self
	}

	/// Run every stage over `content` in order.
	pub fn run_text(&self, content: &str, env: &RenderEnv) -> String {
		self.stages.iter().fold(content.to_string(), |text, stage| {
			tracing::trace!(stage = stage.name, "running render stage");
			(stage.run)(&text, env)
		})
	}

	/// Run the pipeline over a document, producing a canonical document at
	/// the same path.
	pub fn run(&self, document: &Document, env: &RenderEnv) -> Document {
		tracing::debug!(
			path = %document.path.display(),
			dialect = %document.dialect,
			stages = self.stages.len(),
			"rendering document"
		);
		document.derive(Dialect::CanonicalMd, self.run_text(&document.content, env))
	}
}
