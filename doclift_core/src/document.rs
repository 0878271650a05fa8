use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::DocliftResult;

/// Authoring dialect of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
	/// Writerside `.topic` XML.
	TopicXml,
	/// Material for MkDocs flavoured Markdown.
	#[serde(rename = "mkdocs-md")]
	MkDocsMd,
	/// Writerside flavoured Markdown.
	WritersideMd,
	/// The Markdown plus components dialect the site renderer consumes.
	CanonicalMd,
}

impl Dialect {
	/// Dialect of the file at `path`. Markdown files are reported as
	/// `markdown`, since the extension does not tell the flavours apart.
	pub fn from_path(path: &Path, markdown: Dialect) -> Self {
		match path.extension().and_then(|ext| ext.to_str()) {
			Some("topic") => Self::TopicXml,
			Some("md") => markdown,
			_ => Self::CanonicalMd,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::TopicXml => "topic-xml",
			Self::MkDocsMd => "mkdocs-md",
			Self::WritersideMd => "writerside-md",
			Self::CanonicalMd => "canonical-md",
		}
	}
}

impl fmt::Display for Dialect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A text buffer together with where it came from and how it is written.
///
/// Passes never mutate a document in place; each one returns a new document
/// built from its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
	pub path: PathBuf,
	pub dialect: Dialect,
	pub content: String,
}

impl Document {
	pub fn new(path: impl Into<PathBuf>, dialect: Dialect, content: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			dialect,
			content: content.into(),
		}
	}

	/// Read a document from disk, inferring its dialect from the extension.
	pub fn read(path: impl Into<PathBuf>, markdown: Dialect) -> DocliftResult<Self> {
		let path = path.into();
		let content = std::fs::read_to_string(&path)?;
		let dialect = Dialect::from_path(&path, markdown);

		Ok(Self {
			path,
			dialect,
			content,
		})
	}

	/// Same path with new content and dialect.
	#[must_use]
	pub fn derive(&self, dialect: Dialect, content: String) -> Self {
		Self {
			path: self.path.clone(),
			dialect,
			content,
		}
	}

	pub fn write(&self) -> DocliftResult<()> {
		if let Some(parent) = self.path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&self.path, &self.content)?;
		Ok(())
	}
}
