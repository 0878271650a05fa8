//! Per-repository lifecycle hooks.
//!
//! A [`Strategy`] says which files of an upstream repository are documents
//! and prepares the working tree around the shared transforms: after the
//! tree is synced, after changed documents are detected, and after their
//! translations are written.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::DocliftError;
use crate::DocliftResult;
use crate::config::MarkdownStrategyConfig;
use crate::config::RepoConfig;
use crate::config::SiteConfig;
use crate::config::StrategyConfig;
use crate::config::WritersideStrategyConfig;
use crate::context::TransformContext;
use crate::locale::JsonLocaleStore;
use crate::locale::merge_locales;
use crate::markdown::transform_markdown;
use crate::sidebar::build_sidebar;
use crate::sidebar::write_sidebar;
use crate::snippet::HttpFetcher;
use crate::snippet::RemoteFetcher;
use crate::snippet::SnippetResolver;
use crate::topic::export_topic;
use crate::topic::transform_topic;

/// Documents detected in one repository, as `/` separated paths relative
/// to the repository root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncTask {
	pub files: Vec<String>,
}

/// Collects what the translate step changed outside the repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslateContext {
	/// Paths, relative to the site root, to stage for commit.
	pub git_add_paths: BTreeSet<PathBuf>,
}

/// The documentation site the repositories are synced into.
#[derive(Debug, Clone)]
pub struct SiteContext {
	root: PathBuf,
	config: SiteConfig,
}

impl SiteContext {
	pub fn new(root: impl Into<PathBuf>, config: SiteConfig) -> Self {
		Self {
			root: root.into(),
			config,
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn config(&self) -> &SiteConfig {
		&self.config
	}

	pub fn repo_root(&self, repo: &RepoConfig) -> PathBuf {
		self.root.join(&repo.path)
	}

	pub fn docs_dir(&self, repo: &RepoConfig) -> PathBuf {
		self.repo_root(repo).join(repo.doc_dir())
	}

	/// Transform context for documents of `repo`. Remote snippets are
	/// fetched over HTTP unless the client cannot be built.
	pub fn transform_context(&self, repo: &RepoConfig) -> TransformContext {
		let snippets_dir = self.repo_root(repo).join(&repo.snippets_dir);
		let snippets = match HttpFetcher::new(self.config.fetch_timeout()) {
			Ok(fetcher) => {
				let fetcher: Arc<dyn RemoteFetcher> = Arc::new(fetcher);
				SnippetResolver::with_fetcher(snippets_dir, fetcher)
			}
			Err(e) => {
				tracing::warn!(error = %e, "remote snippets disabled");
				SnippetResolver::offline(snippets_dir)
			}
		};

		TransformContext::new(self.docs_dir(repo), repo.name.as_str(), snippets)
	}

	/// Manifest the sidebar of `repo` is built from: the configured one,
	/// else the first `*.tree` file of the docs directory, else `mkdocs.yml`
	/// at the repository root.
	pub fn sidebar_manifest(&self, repo: &RepoConfig) -> DocliftResult<Option<PathBuf>> {
		let repo_root = self.repo_root(repo);
		if let Some(manifest) = repo.sidebar.as_ref().and_then(|sidebar| sidebar.manifest.as_ref()) {
			let path = repo_root.join(manifest);
			return Ok(path.is_file().then_some(path));
		}

		let tree = list_files(&self.docs_dir(repo))?
			.into_iter()
			.find(|path| has_extension(path, "tree"));
		if tree.is_some() {
			return Ok(tree);
		}

		let mkdocs = repo_root.join("mkdocs.yml");
		Ok(mkdocs.is_file().then_some(mkdocs))
	}

	/// Build the sidebar for `repo` from `manifest`, write it and merge its
	/// titles into the locale dictionaries.
	pub fn generate_sidebar(&self, repo: &RepoConfig, manifest: &Path) -> DocliftResult<PathBuf> {
		let base_url = repo
			.sidebar
			.as_ref()
			.map(|sidebar| sidebar.base_url.as_str())
			.unwrap_or_default();
		let build = build_sidebar(manifest, &repo.name, base_url)?;
		let path = write_sidebar(&self.root.join(&self.config.sidebar_dir), &repo.name, &build.nodes)?;

		let mut store = JsonLocaleStore::new(self.root.join(&self.config.locale_dir));
		merge_locales(
			&mut store,
			&self.config.source_locale,
			&self.config.locales,
			build.translate_keys,
		)?;

		Ok(path)
	}
}

/// Hooks run around the shared transforms for one kind of repository.
pub trait Strategy {
	/// Glob patterns, relative to the repository root, matching documents.
	fn doc_patterns(&self, repo: &RepoConfig) -> Vec<String>;

	/// Runs once the working tree is up to date.
	fn post_sync(&self, _site: &SiteContext, _repo: &RepoConfig) -> DocliftResult<()> {
		Ok(())
	}

	/// Runs once changed documents are known. May rewrite the working tree
	/// and must leave `task.files` pointing at the documents to translate.
	fn post_detect(
		&self,
		site: &SiteContext,
		repo: &RepoConfig,
		task: &mut SyncTask,
	) -> DocliftResult<()>;

	/// Runs once translations are written.
	fn post_translate(
		&self,
		site: &SiteContext,
		repo: &RepoConfig,
		context: &mut TranslateContext,
	) -> DocliftResult<()> {
		copy_version_file(site, repo, context)?;
		copy_assets(site, repo, context)
	}
}

/// Strategy configured for `repo`.
pub fn strategy_for(repo: &RepoConfig) -> Box<dyn Strategy> {
	match &repo.strategy {
		StrategyConfig::Markdown(config) => Box::new(MarkdownStrategy::new(config.clone())),
		StrategyConfig::Writerside(config) => Box::new(WritersideStrategy::new(config.clone())),
	}
}

/// Patterns for `repo`, honouring a configured override.
pub fn patterns_for(strategy: &dyn Strategy, repo: &RepoConfig) -> Vec<String> {
	repo.patterns
		.clone()
		.unwrap_or_else(|| strategy.doc_patterns(repo))
}

/// MkDocs and plain Markdown repositories.
#[derive(Debug, Clone, Default)]
pub struct MarkdownStrategy {
	extra_files: BTreeMap<String, String>,
}

impl MarkdownStrategy {
	pub fn new(config: MarkdownStrategyConfig) -> Self {
		Self {
			extra_files: config.extra_files,
		}
	}
}

impl Strategy for MarkdownStrategy {
	fn doc_patterns(&self, repo: &RepoConfig) -> Vec<String> {
		std::iter::once(repo.doc_relative("**/*.md"))
			.chain(self.extra_files.keys().cloned())
			.collect()
	}

	fn post_detect(
		&self,
		site: &SiteContext,
		repo: &RepoConfig,
		task: &mut SyncTask,
	) -> DocliftResult<()> {
		let repo_root = site.repo_root(repo);

		for file in &mut task.files {
			let Some(target) = self.extra_files.get(file.as_str()) else {
				continue;
			};

			let dest = repo_root.join(target);
			if let Some(parent) = dest.parent() {
				std::fs::create_dir_all(parent)?;
			}
			std::fs::copy(repo_root.join(file.as_str()), &dest)?;
			tracing::debug!(from = %file, to = %target, "copied root document");
			*file = target.clone();
		}

		if let Some(manifest) = site.sidebar_manifest(repo)? {
			site.generate_sidebar(repo, &manifest)?;
		}

		Ok(())
	}
}

/// Writerside repositories mixing `.topic` and Markdown sources.
#[derive(Debug, Clone, Default)]
pub struct WritersideStrategy {
	config: WritersideStrategyConfig,
}

impl WritersideStrategy {
	pub fn new(config: WritersideStrategyConfig) -> Self {
		Self { config }
	}

	fn process_markdown(&self, ctx: &TransformContext, docs: &[PathBuf]) -> DocliftResult<()> {
		for path in docs.iter().filter(|path| has_extension(path, "md")) {
			let content = match std::fs::read_to_string(path) {
				Ok(content) => content,
				Err(e) => {
					tracing::warn!(path = %path.display(), error = %e, "skipping unreadable document");
					continue;
				}
			};

			let content = transform_topic(ctx, path, &content)?;
			let content = transform_markdown(ctx, path, &content);
			std::fs::write(path, content)?;
		}

		Ok(())
	}

	fn export_topics(&self, ctx: &TransformContext, docs: &[PathBuf]) -> DocliftResult<()> {
		for path in docs.iter().filter(|path| has_extension(path, "topic")) {
			let skipped = self.config.skip_topic_prefix.as_deref().is_some_and(|prefix| {
				path.file_name()
					.and_then(|name| name.to_str())
					.is_some_and(|name| name.starts_with(prefix))
			});
			if skipped {
				continue;
			}

			let content = match std::fs::read_to_string(path) {
				Ok(content) => content,
				Err(e) => {
					tracing::warn!(path = %path.display(), error = %e, "skipping unreadable topic");
					continue;
				}
			};

			let exported = if self.config.transform_topics {
				export_topic(&content, |topic| transform_topic(ctx, path, topic))?
			} else {
				export_topic(&content, |topic| Ok(topic.to_string()))?
			};

			match exported {
				Some(markdown) => {
					let output = path.with_extension("md");
					std::fs::write(&output, markdown)?;
					tracing::debug!(path = %output.display(), "exported topic");
				}
				None => tracing::warn!(path = %path.display(), "no <topic> element found"),
			}

			if self.config.remove_topic_sources {
				std::fs::remove_file(path)?;
			}
		}

		Ok(())
	}

}

impl Strategy for WritersideStrategy {
	fn doc_patterns(&self, repo: &RepoConfig) -> Vec<String> {
		vec![repo.doc_relative("**/*.md"), repo.doc_relative("**/*.topic")]
	}

	fn post_detect(
		&self,
		site: &SiteContext,
		repo: &RepoConfig,
		task: &mut SyncTask,
	) -> DocliftResult<()> {
		let docs_dir = site.docs_dir(repo);

		if let Some(flatten_from) = &self.config.flatten_from {
			let source = site.repo_root(repo).join(flatten_from);
			if source.is_dir() {
				let copied = copy_flatten(&source, &docs_dir)?;
				tracing::info!(repo = %repo.name, files = copied.len(), "flattened documents");
			}
		}

		for name in &self.config.remove_files {
			let path = docs_dir.join(name);
			if path.is_file() {
				std::fs::remove_file(&path)?;
				tracing::debug!(path = %path.display(), "removed redundant file");
			}
		}

		let ctx = site.transform_context(repo);
		if self.config.process_markdown {
			self.process_markdown(&ctx, &list_files(&docs_dir)?)?;
		}
		self.export_topics(&ctx, &list_files(&docs_dir)?)?;

		let flatten = self.config.flatten_from.is_some();
		for file in &mut task.files {
			*file = map_detected_path(repo, file, flatten);
		}

		if let Some(manifest) = site.sidebar_manifest(repo)? {
			site.generate_sidebar(repo, &manifest)?;
		}

		tracing::info!(repo = %repo.name, files = task.files.len(), "prepared documents");
		Ok(())
	}
}

/// Output path of a detected document: `.topic` sources become `.md`, and
/// flattened repositories keep only the file name under the docs directory.
pub fn map_detected_path(repo: &RepoConfig, file: &str, flatten: bool) -> String {
	let mapped = if flatten {
		let name = file.rsplit('/').next().unwrap_or(file);
		repo.doc_relative(name)
	} else {
		file.to_string()
	};

	match mapped.strip_suffix(".topic") {
		Some(stem) => format!("{stem}.md"),
		None => mapped,
	}
}

/// Files below `repo_root` matching any of `patterns`, skipping what the
/// repository's `.gitignore` ignores. Paths are relative to `repo_root`,
/// `/` separated and sorted.
pub fn detect_files(repo_root: &Path, patterns: &[String]) -> DocliftResult<Vec<String>> {
	let matcher = build_glob_set(patterns)?;
	let gitignore = build_gitignore(repo_root);
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();

	walk_dir(repo_root, repo_root, &matcher, &gitignore, &mut files, &mut visited_dirs)?;
	files.sort();

	Ok(files)
}

fn build_glob_set(patterns: &[String]) -> DocliftResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = Glob::new(pattern).map_err(|e| {
			DocliftError::ConfigParse(format!("invalid document pattern `{pattern}`: {e}"))
		})?;
		builder.add(glob);
	}
	builder
		.build()
		.map_err(|e| DocliftError::ConfigParse(format!("failed to build document patterns: {e}")))
}

/// `Gitignore` matcher from the repository's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		if let Some(e) = builder.add(gitignore_path) {
			tracing::warn!(error = %e, "ignoring unreadable .gitignore");
		}
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

fn walk_dir(
	root: &Path,
	dir: &Path,
	matcher: &GlobSet,
	gitignore: &Gitignore,
	files: &mut Vec<String>,
	visited_dirs: &mut HashSet<PathBuf>,
) -> DocliftResult<()> {
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return Ok(());
	}

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();
		if path.file_name().is_some_and(|name| name == ".git") {
			continue;
		}

		let is_dir = path.is_dir();
		if gitignore.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if is_dir {
			walk_dir(root, &path, matcher, gitignore, files, visited_dirs)?;
			continue;
		}

		let Ok(relative) = path.strip_prefix(root) else {
			continue;
		};
		let relative = relative
			.components()
			.map(|component| component.as_os_str().to_string_lossy())
			.collect::<Vec<_>>()
			.join("/");
		if matcher.is_match(&relative) {
			files.push(relative);
		}
	}

	Ok(())
}

/// Copy every file below `src` directly into `dest`, dropping the directory
/// structure. Later files overwrite earlier ones with the same name; a file
/// that is already at its destination is left alone. Returns the written
/// paths.
pub fn copy_flatten(src: &Path, dest: &Path) -> DocliftResult<Vec<PathBuf>> {
	std::fs::create_dir_all(dest)?;
	let mut copied = Vec::new();
	copy_flatten_into(src, dest, &mut copied)?;
	Ok(copied)
}

fn copy_flatten_into(src: &Path, dest: &Path, copied: &mut Vec<PathBuf>) -> DocliftResult<()> {
	let mut entries = std::fs::read_dir(src)?
		.map(|entry| entry.map(|entry| entry.path()))
		.collect::<Result<Vec<_>, _>>()?;
	entries.sort();

	for path in entries {
		if path.is_dir() {
			copy_flatten_into(&path, dest, copied)?;
			continue;
		}

		let Some(name) = path.file_name() else {
			continue;
		};
		let target = dest.join(name);
		if target == path {
			continue;
		}

		std::fs::copy(&path, &target)?;
		tracing::trace!(from = %path.display(), to = %target.display(), "copied");
		copied.push(target);
	}

	Ok(())
}

/// Recursively copy `src` into `dest`, keeping the directory structure.
pub fn copy_tree(src: &Path, dest: &Path) -> DocliftResult<()> {
	std::fs::create_dir_all(dest)?;
	for entry in std::fs::read_dir(src)? {
		let path = entry?.path();
		let Some(name) = path.file_name() else {
			continue;
		};
		let target = dest.join(name);
		if path.is_dir() {
			copy_tree(&path, &target)?;
		} else {
			std::fs::copy(&path, &target)?;
		}
	}
	Ok(())
}

fn copy_version_file(
	site: &SiteContext,
	repo: &RepoConfig,
	context: &mut TranslateContext,
) -> DocliftResult<()> {
	let Some(version_file) = &repo.version_file else {
		return Ok(());
	};

	let src = site.repo_root(repo).join(&version_file.src);
	if !src.is_file() {
		tracing::debug!(path = %src.display(), "no version file");
		return Ok(());
	}

	let dest = site.root().join(&version_file.dest);
	if let Some(parent) = dest.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::copy(&src, &dest)?;
	context.git_add_paths.insert(version_file.dest.clone());
	tracing::info!(repo = %repo.name, path = %version_file.dest.display(), "copied version file");

	Ok(())
}

fn copy_assets(
	site: &SiteContext,
	repo: &RepoConfig,
	context: &mut TranslateContext,
) -> DocliftResult<()> {
	let Some(assets) = &repo.assets else {
		return Ok(());
	};

	let src = site.repo_root(repo).join(&assets.src);
	if !src.is_dir() {
		tracing::warn!(path = %src.display(), "asset source directory not found");
		return Ok(());
	}

	let dest = site.root().join(&assets.dest);
	if assets.flatten {
		copy_flatten(&src, &dest)?;
	} else {
		copy_tree(&src, &dest)?;
	}
	context.git_add_paths.insert(assets.dest.clone());
	tracing::info!(repo = %repo.name, path = %assets.dest.display(), "copied assets");

	Ok(())
}

/// Files directly inside `dir`, sorted. A missing directory has none.
fn list_files(dir: &Path) -> DocliftResult<Vec<PathBuf>> {
	if !dir.is_dir() {
		return Ok(Vec::new());
	}

	let mut files = std::fs::read_dir(dir)?
		.map(|entry| entry.map(|entry| entry.path()))
		.collect::<Result<Vec<_>, _>>()?;
	files.retain(|path| path.is_file());
	files.sort();

	Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
	path.extension().is_some_and(|ext| ext == extension)
}
