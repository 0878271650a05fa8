use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum DocliftError {
	#[error(transparent)]
	#[diagnostic(code(doclift::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(doclift::config_parse),
		help("check that doclift.toml is valid TOML with a [site] table and [[repos]] entries")
	)]
	ConfigParse(String),

	#[error("no doclift.toml found in `{0}`")]
	#[diagnostic(
		code(doclift::missing_config),
		help("create doclift.toml at the site root or pass `--path` to point at it")
	)]
	MissingConfig(String),

	#[error("unknown repository `{0}`")]
	#[diagnostic(
		code(doclift::unknown_repo),
		help("repository names come from the `name` field of each [[repos]] entry")
	)]
	UnknownRepo(String),

	#[error("failed to parse sidebar manifest `{path}`: {reason}")]
	#[diagnostic(code(doclift::manifest_parse))]
	ManifestParse { path: String, reason: String },

	#[error("unsupported sidebar manifest `{0}`")]
	#[diagnostic(
		code(doclift::unsupported_manifest),
		help("sidebar manifests are Writerside `*.tree` files or MkDocs `*.yml` configurations")
	)]
	UnsupportedManifest(String),

	#[error("no <toc-element> found in `{0}`")]
	#[diagnostic(
		code(doclift::toc_not_found),
		help("a Writerside tree file needs at least one <toc-element> node")
	)]
	TocNotFound(String),

	#[error("include cycle detected: {}", chain.join(" -> "))]
	#[diagnostic(
		code(doclift::include_cycle),
		help("an element ends up including itself; break the cycle in the source topics")
	)]
	IncludeCycle { chain: Vec<String> },

	#[error("invalid preprocess mode: `{0}`")]
	#[diagnostic(
		code(doclift::preprocess_mode),
		help("supported modes: topic, markdown, both, none")
	)]
	InvalidPreprocessMode(String),

	#[error("failed to fetch `{url}`: {reason}")]
	#[diagnostic(code(doclift::fetch))]
	Fetch { url: String, reason: String },

	#[error("failed to encode or decode json `{path}`: {reason}")]
	#[diagnostic(code(doclift::json))]
	Json { path: String, reason: String },
}

pub type DocliftResult<T> = Result<T, DocliftError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
