//! Entry point for preparing a single document before machine translation.
//!
//! The translation service only has the raw text of one file, so every
//! lookup that needs the rest of the repository is allowed to fail; the
//! document is then returned with that construct left as it was.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::DocliftError;
use crate::config::DEFAULT_SNIPPETS_DIR;
use crate::context::TransformContext;
use crate::markdown::transform_markdown;
use crate::snippet::DEFAULT_FETCH_TIMEOUT;
use crate::snippet::HttpFetcher;
use crate::snippet::RemoteFetcher;
use crate::snippet::SnippetResolver;
use crate::topic::export_topic;
use crate::topic::transform_topic;

/// Which transforms the pre-processor applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprocessMode {
	/// Export the `<topic>` element of `.topic` files.
	Topic,
	/// Run the Markdown transform over Markdown files.
	Markdown,
	/// Both of the above; Markdown files also get the topic transform first.
	#[default]
	Both,
	/// Return the content unchanged.
	None,
}

impl PreprocessMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Topic => "topic",
			Self::Markdown => "markdown",
			Self::Both => "both",
			Self::None => "none",
		}
	}

	fn topic(self) -> bool {
		matches!(self, Self::Topic | Self::Both)
	}

	fn markdown(self) -> bool {
		matches!(self, Self::Markdown | Self::Both)
	}
}

impl FromStr for PreprocessMode {
	type Err = DocliftError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.trim().to_ascii_lowercase().as_str() {
			"topic" => Ok(Self::Topic),
			"markdown" => Ok(Self::Markdown),
			"both" => Ok(Self::Both),
			"none" => Ok(Self::None),
			_ => Err(DocliftError::InvalidPreprocessMode(value.to_string())),
		}
	}
}

impl fmt::Display for PreprocessMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Pre-process `content` of the file `file_name` belonging to
/// `project_name`, resolving repository lookups against the current
/// directory.
pub fn preprocess(content: &str, file_name: &str, project_name: &str, mode: PreprocessMode) -> String {
	preprocess_in(Path::new("."), content, file_name, project_name, mode)
}

/// Like [`preprocess`], with the project's working tree expected at
/// `<site_root>/<project_name>-repo`.
pub fn preprocess_in(
	site_root: &Path,
	content: &str,
	file_name: &str,
	project_name: &str,
	mode: PreprocessMode,
) -> String {
	if content.is_empty() || mode == PreprocessMode::None {
		return content.to_string();
	}

	let ctx = preprocess_context(site_root, project_name);
	let file_path = ctx.docs_root().join(file_name);
	let is_topic = Path::new(file_name)
		.extension()
		.is_some_and(|ext| ext == "topic");

	if is_topic {
		if !mode.topic() {
			return content.to_string();
		}

		let exported = export_topic(content, |topic| {
			Ok(transform_topic(&ctx, &file_path, topic).unwrap_or_else(|e| {
				tracing::warn!(file = file_name, error = %e, "topic transform skipped");
				topic.to_string()
			}))
		});

		return match exported {
			Ok(Some(exported)) => exported,
			Ok(None) | Err(_) => content.to_string(),
		};
	}

	if !mode.markdown() {
		return content.to_string();
	}

	let content = if mode.topic() {
		transform_topic(&ctx, &file_path, content).unwrap_or_else(|e| {
			tracing::warn!(file = file_name, error = %e, "topic transform skipped");
			content.to_string()
		})
	} else {
		content.to_string()
	};

	transform_markdown(&ctx, &file_path, &content)
}

fn preprocess_context(site_root: &Path, project_name: &str) -> TransformContext {
	let repo_root: PathBuf = site_root.join(format!("{project_name}-repo"));
	let snippets_dir = repo_root.join(DEFAULT_SNIPPETS_DIR);
	let snippets = match HttpFetcher::new(DEFAULT_FETCH_TIMEOUT) {
		Ok(fetcher) => {
			let fetcher: Arc<dyn RemoteFetcher> = Arc::new(fetcher);
			SnippetResolver::with_fetcher(snippets_dir, fetcher)
		}
		Err(e) => {
			tracing::warn!(error = %e, "remote snippets disabled");
			SnippetResolver::offline(snippets_dir)
		}
	};

	TransformContext::new(repo_root.join("docs"), project_name, snippets)
}
