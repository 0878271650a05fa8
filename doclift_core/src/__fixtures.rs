use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;

use crate::DocliftError;
use crate::DocliftResult;
use crate::config::RepoConfig;
use crate::config::StrategyConfig;
use crate::context::TransformContext;
use crate::snippet::RemoteFetcher;
use crate::snippet::SnippetResolver;

pub const DOC_TYPE: &str = "ktor";

static TAB_MARKER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<(/?)(Tabs|TabItem)\b").unwrap());

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dir: {e}"));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write: {e}"));
	path
}

pub fn read_file(path: &Path) -> String {
	std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// Context rooted at `docs_root` with snippets in `docs_root/codeSnippets`
/// and no network access.
pub fn offline_context(docs_root: &Path) -> TransformContext {
	TransformContext::new(
		docs_root,
		DOC_TYPE,
		SnippetResolver::offline(docs_root.join("codeSnippets")),
	)
}

/// Serves canned bodies for known URLs and fails for everything else.
#[derive(Debug, Default)]
pub struct StubFetcher {
	bodies: BTreeMap<String, String>,
}

impl StubFetcher {
	pub fn with(mut self, url: &str, body: &str) -> Self {
		self.bodies.insert(url.to_string(), body.to_string());
		self
	}

	pub fn into_resolver(self, base: &Path) -> SnippetResolver {
		let fetcher: Arc<dyn RemoteFetcher> = Arc::new(self);
		SnippetResolver::with_fetcher(base, fetcher)
	}
}

impl RemoteFetcher for StubFetcher {
	fn fetch(&self, url: &str) -> DocliftResult<String> {
		self.bodies
			.get(url)
			.cloned()
			.ok_or_else(|| DocliftError::Fetch {
				url: url.to_string(),
				reason: "404 Not Found".to_string(),
			})
	}
}

pub fn repo_config(name: &str, path: &str, doc_path: &str, strategy: StrategyConfig) -> RepoConfig {
	RepoConfig {
		name: name.to_string(),
		path: PathBuf::from(path),
		doc_path: doc_path.to_string(),
		patterns: None,
		snippets_dir: PathBuf::from("codeSnippets"),
		assets: None,
		version_file: None,
		sidebar: None,
		strategy,
	}
}

/// Opening and closing tab markers in document order, e.g. `Tabs`,
/// `TabItem`, `/TabItem`, `/Tabs`.
pub fn tab_markers(content: &str) -> Vec<String> {
	TAB_MARKER
		.captures_iter(content)
		.map(|caps| format!("{}{}", &caps[1], &caps[2]))
		.collect()
}

/// Whether `markers` close in exactly the reverse order they were opened.
pub fn markers_well_formed(markers: &[String]) -> bool {
	let mut open: Vec<&str> = Vec::new();
	for marker in markers {
		match marker.strip_prefix('/') {
			Some(name) => {
				if open.pop() != Some(name) {
					return false;
				}
			}
			None => open.push(marker),
		}
	}
	open.is_empty()
}

pub const FOO_TOPIC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<topic xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" title="Foo Page" id="foo">
    <card-summary>
        Does foo things
    </card-summary>
    <chapter title="Setting up" id="setup">
        <p>Install it.</p>
    </chapter>
</topic>
"#;

pub const BAR_TOPIC: &str = r#"<topic title="Bar" id="bar">
    <link-summary>Everything about bar.</link-summary>
    <chapter title="Configuration" id="config">
    </chapter>
</topic>
"#;

pub const TOC_TREE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE instance-profile SYSTEM "https://resources.jetbrains.com/writerside/1.0/product-profile.dtd">
<instance-profile id="ktor" name="Ktor" start-page="welcome.topic">
    <toc-element topic="welcome.topic"/>
    <toc-element toc-title="Server">
        <toc-element topic="server-create.md"/>
        <toc-element topic="internal.md" hidden="true">
            <toc-element topic="internal-child.md"/>
        </toc-element>
        <toc-element toc-title="Plugins">
            <include origin="ktor-plugins" from="plugins.tree" element-id="plugins"/>
        </toc-element>
    </toc-element>
    <toc-element toc-title="API reference" href="https://api.ktor.io/"/>
</instance-profile>
"#;

pub const MKDOCS_YML: &str = r"site_name: Koog
site_url: https://docs.koog.ai/
nav:
  - Overview: index.md
  - Getting started:
      - Installation: getting-started/install.md
      - API: https://api.koog.ai/
  - Legacy: legacy/page.html
markdown_extensions:
  - pymdownx.emoji:
      emoji_index: !!python/name:material.extensions.emoji.twemoji
      emoji_generator: !!python/name:material.extensions.emoji.to_svg
extra:
  analytics: !ENV [GOOGLE_ANALYTICS_KEY]
";
