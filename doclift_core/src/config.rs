use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::DocliftError;
use crate::DocliftResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["doclift.toml", ".doclift.toml", ".config/doclift.toml"];

/// Default directory for code snippets, relative to a repository.
pub const DEFAULT_SNIPPETS_DIR: &str = "codeSnippets";

/// Configuration loaded from a `doclift.toml` file at the site root.
///
/// ```toml
/// [site]
/// source_locale = "en"
/// locales = ["en", "zh"]
///
/// [[repos]]
/// name = "ktor"
/// path = "ktor-repo"
/// doc_path = "topics"
/// assets = { src = "images", dest = "docs/public/ktor", flatten = true }
/// sidebar = { manifest = "ktor.tree" }
///
/// [repos.strategy]
/// kind = "writerside"
/// process_markdown = true
/// transform_topics = true
/// skip_topic_prefix = "lib"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[non_exhaustive]
pub struct DocliftConfig {
	#[serde(default)]
	pub site: SiteConfig,
	/// Upstream documentation repositories, in processing order.
	#[serde(default)]
	pub repos: Vec<RepoConfig>,
}

/// Locations inside the documentation site.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SiteConfig {
	/// Directory receiving `<doc_type>.sidebar.json` files.
	pub sidebar_dir: PathBuf,
	/// Directory holding `<lang>.json` locale dictionaries.
	pub locale_dir: PathBuf,
	/// Language the upstream documentation is written in.
	pub source_locale: String,
	/// Every language the site is published in.
	pub locales: Vec<String>,
	/// Directory receiving variable lists and version files.
	pub variables_dir: PathBuf,
	/// Timeout for remote snippet requests.
	pub fetch_timeout_secs: u64,
}

impl Default for SiteConfig {
	fn default() -> Self {
		Self {
			sidebar_dir: PathBuf::from("docs/.vitepress/sidebar"),
			locale_dir: PathBuf::from("docs/.vitepress/locales"),
			source_locale: "en".to_string(),
			locales: vec!["en".to_string()],
			variables_dir: PathBuf::from("docs/.vitepress/variables"),
			fetch_timeout_secs: 10,
		}
	}
}

impl SiteConfig {
	pub fn fetch_timeout(&self) -> Duration {
		Duration::from_secs(self.fetch_timeout_secs)
	}
}

/// One upstream documentation repository.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RepoConfig {
	/// Documentation namespace, used as the doc type in links and locale keys.
	pub name: String,
	/// Working tree, relative to the site root.
	pub path: PathBuf,
	/// Documentation directory inside the working tree.
	#[serde(default = "default_doc_path")]
	pub doc_path: String,
	/// Glob patterns replacing the strategy's defaults.
	#[serde(default)]
	pub patterns: Option<Vec<String>>,
	#[serde(default = "default_snippets_dir")]
	pub snippets_dir: PathBuf,
	#[serde(default)]
	pub assets: Option<AssetsConfig>,
	#[serde(default)]
	pub version_file: Option<VersionFileConfig>,
	#[serde(default)]
	pub sidebar: Option<SidebarConfig>,
	#[serde(default)]
	pub strategy: StrategyConfig,
}

impl RepoConfig {
	/// `doc_path` without a leading `./` or trailing `/`, or an empty string
	/// for the repository root.
	pub fn doc_dir(&self) -> &str {
		let dir = self.doc_path.trim_start_matches("./").trim_end_matches('/');
		if dir == "." { "" } else { dir }
	}

	pub fn is_writerside(&self) -> bool {
		matches!(self.strategy, StrategyConfig::Writerside(_))
	}

	/// `name` relative to `doc_dir`, joined with `/`.
	pub fn doc_relative(&self, name: &str) -> String {
		match self.doc_dir() {
			"" => name.to_string(),
			dir => format!("{dir}/{name}"),
		}
	}
}

fn default_doc_path() -> String {
	"docs".to_string()
}

fn default_snippets_dir() -> PathBuf {
	PathBuf::from(DEFAULT_SNIPPETS_DIR)
}

/// Images and other static files copied after translation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AssetsConfig {
	/// Source directory, relative to the repository.
	pub src: PathBuf,
	/// Destination directory, relative to the site root.
	pub dest: PathBuf,
	/// Copy every file directly into `dest`, dropping subdirectories.
	#[serde(default)]
	pub flatten: bool,
}

/// Variable list copied after translation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VersionFileConfig {
	/// Relative to the repository.
	pub src: PathBuf,
	/// Relative to the site root.
	pub dest: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SidebarConfig {
	/// Manifest relative to the repository. Without one, the first `*.tree`
	/// file of the documentation directory is used, then `mkdocs.yml`.
	#[serde(default)]
	pub manifest: Option<PathBuf>,
	/// Prefix for `.html` targets. Defaults to the manifest's `site_url`.
	#[serde(default)]
	pub base_url: String,
}

/// How a repository is turned into site documents.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
#[non_exhaustive]
pub enum StrategyConfig {
	/// MkDocs or plain Markdown repositories.
	Markdown(MarkdownStrategyConfig),
	/// Writerside repositories with `.topic` and Markdown sources.
	Writerside(WritersideStrategyConfig),
}

impl Default for StrategyConfig {
	fn default() -> Self {
		Self::Markdown(MarkdownStrategyConfig::default())
	}
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MarkdownStrategyConfig {
	/// Repository root file to documentation file, such as
	/// `"README.md" = "docs/overview.md"`.
	pub extra_files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WritersideStrategyConfig {
	/// Directory, relative to the repository, whose files are copied flat
	/// into the documentation directory.
	pub flatten_from: Option<PathBuf>,
	/// File names removed from the documentation directory after flattening.
	pub remove_files: Vec<String>,
	/// Run the topic and Markdown transforms over every `.md` file.
	pub process_markdown: bool,
	/// Run the topic transform while exporting `.topic` files.
	pub transform_topics: bool,
	/// Delete `.topic` sources once exported.
	pub remove_topic_sources: bool,
	/// `.topic` files whose name starts with this prefix are not exported.
	pub skip_topic_prefix: Option<String>,
}

impl DocliftConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> DocliftResult<Option<DocliftConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: DocliftConfig =
			toml::from_str(&content).map_err(|e| DocliftError::ConfigParse(e.to_string()))?;

		tracing::debug!(path = %config_path.display(), repos = config.repos.len(), "loaded config");
		Ok(Some(config))
	}

	/// Like [`DocliftConfig::load`] but a missing file is an error.
	pub fn load_required(root: &Path) -> DocliftResult<DocliftConfig> {
		Self::load(root)?.ok_or_else(|| DocliftError::MissingConfig(root.display().to_string()))
	}

	/// Every repository called `name`. Several working trees may share one
	/// documentation namespace.
	pub fn repos_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RepoConfig> + 'a {
		self.repos.iter().filter(move |repo| repo.name == name)
	}

	/// Repositories matching `name`, or all of them when `name` is `None`.
	pub fn select_repos(&self, name: Option<&str>) -> DocliftResult<Vec<&RepoConfig>> {
		let Some(name) = name else {
			return Ok(self.repos.iter().collect());
		};

		let repos: Vec<_> = self.repos.iter().filter(|repo| repo.name == name).collect();
		if repos.is_empty() {
			return Err(DocliftError::UnknownRepo(name.to_string()));
		}

		Ok(repos)
	}
}
