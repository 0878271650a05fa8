use std::path::Path;
use std::path::PathBuf;

use crate::snippet::SnippetResolver;

/// Everything a dialect transformer needs to know about the tree a document
/// lives in.
#[derive(Debug, Clone)]
pub struct TransformContext {
	docs_root: PathBuf,
	doc_type: String,
	snippets: SnippetResolver,
}

impl TransformContext {
	/// * `docs_root`: directory that include, card and link targets are
	///   relative to.
	/// * `doc_type`: namespace used for normalized hrefs (`/{doc_type}/…`).
	pub fn new(
		docs_root: impl Into<PathBuf>,
		doc_type: impl Into<String>,
		snippets: SnippetResolver,
	) -> Self {
		Self {
			docs_root: docs_root.into(),
			doc_type: doc_type.into(),
			snippets,
		}
	}

	/// Same context rooted at another directory.
	pub fn with_docs_root(&self, docs_root: impl Into<PathBuf>) -> Self {
		Self {
			docs_root: docs_root.into(),
			..self.clone()
		}
	}

	pub fn docs_root(&self) -> &Path {
		&self.docs_root
	}

	pub fn doc_type(&self) -> &str {
		&self.doc_type
	}

	pub fn snippets(&self) -> &SnippetResolver {
		&self.snippets
	}

	/// Location of a document referenced by a relative href.
	pub fn target(&self, href: &str) -> PathBuf {
		self.docs_root.join(href)
	}

	/// Site href for a document reference: `foo.topic` becomes
	/// `/{doc_type}/foo`. Hrefs that are already absolute are returned as is.
	pub fn doc_href(&self, href: &str) -> String {
		if is_normalized(href) {
			return href.to_string();
		}

		let stem = href.split('.').next().unwrap_or(href);
		format!("/{}/{stem}", self.doc_type)
	}
}

/// Hrefs the transformers never rewrite: external URLs and site-absolute
/// paths.
pub fn is_normalized(href: &str) -> bool {
	href.starts_with("http") || href.starts_with('/')
}
