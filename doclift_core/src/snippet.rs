use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::DocliftError;
use crate::DocliftResult;

/// Default timeout applied to remote snippet requests.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One token of an `include-lines="…"` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRange {
	/// `a-b`, inclusive and 1-based.
	Span { start: usize, end: usize },
	/// A single 1-based line.
	Line(usize),
}

impl FromStr for LineRange {
	type Err = String;

	fn from_str(token: &str) -> Result<Self, Self::Err> {
		let token = token.trim();
		let parse = |value: &str| {
			value
				.trim()
				.parse::<usize>()
				.map_err(|e| format!("invalid line number `{value}`: {e}"))
		};

		match token.split_once('-') {
			Some((start, end)) => {
				Ok(Self::Span {
					start: parse(start)?,
					end: parse(end)?,
				})
			}
			None => Ok(Self::Line(parse(token)?)),
		}
	}
}

impl fmt::Display for LineRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Span { start, end } => write!(f, "{start}-{end}"),
			Self::Line(line) => write!(f, "{line}"),
		}
	}
}

/// Parse a comma separated list of line ranges. Tokens that are not valid
/// ranges are dropped with a warning.
pub fn parse_line_ranges(list: &str) -> Vec<LineRange> {
	list.split(',')
		.filter(|token| !token.trim().is_empty())
		.filter_map(|token| {
			token
				.parse::<LineRange>()
				.inspect_err(|reason| tracing::warn!(token, %reason, "skipping line range"))
				.ok()
		})
		.collect()
}

/// Select lines from `text` in the order the ranges are given. Ranges may
/// overlap or run backwards through the file; nothing is deduplicated.
/// Out-of-bounds single lines are skipped and spans are clamped to the text.
pub fn select_lines(text: &str, ranges: &[LineRange]) -> String {
	let lines: Vec<&str> = text
		.split('\n')
		.map(|line| line.strip_suffix('\r').unwrap_or(line))
		.collect();
	let mut selected: Vec<&str> = Vec::new();

	for range in ranges {
		match *range {
			LineRange::Span { start, end } => {
				let from = start.saturating_sub(1);
				let to = end.min(lines.len());
				if from < to {
					selected.extend_from_slice(&lines[from..to]);
				}
			}
			LineRange::Line(line) => {
				if let Some(value) = line.checked_sub(1).and_then(|idx| lines.get(idx)) {
					selected.push(value);
				}
			}
		}
	}

	selected.join("\n")
}

/// A reference to an external code sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetRef {
	/// Relative path or `http(s)` URL of the source file.
	pub source: String,
	/// Empty means the whole file.
	pub line_ranges: Vec<LineRange>,
}

impl SnippetRef {
	pub fn new(source: impl Into<String>, include_lines: Option<&str>) -> Self {
		Self {
			source: source.into(),
			line_ranges: include_lines.map(parse_line_ranges).unwrap_or_default(),
		}
	}

	pub fn is_remote(&self) -> bool {
		self.source.starts_with("http")
	}
}

/// Fetches the body of a remote snippet.
pub trait RemoteFetcher: Send + Sync {
	fn fetch(&self, url: &str) -> DocliftResult<String>;
}

/// Blocking HTTP fetcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
	client: reqwest::blocking::Client,
}

impl HttpFetcher {
	pub fn new(timeout: Duration) -> DocliftResult<Self> {
		let client = reqwest::blocking::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| {
				DocliftError::Fetch {
					url: String::new(),
					reason: e.to_string(),
				}
			})?;

		Ok(Self { client })
	}
}

impl RemoteFetcher for HttpFetcher {
	fn fetch(&self, url: &str) -> DocliftResult<String> {
		self.client
			.get(url)
			.send()
			.and_then(reqwest::blocking::Response::error_for_status)
			.and_then(reqwest::blocking::Response::text)
			.map_err(|e| {
				DocliftError::Fetch {
					url: url.to_string(),
					reason: e.to_string(),
				}
			})
	}
}

/// Fetcher used when network access is disabled. Every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl RemoteFetcher for OfflineFetcher {
	fn fetch(&self, url: &str) -> DocliftResult<String> {
		Err(DocliftError::Fetch {
			url: url.to_string(),
			reason: "network access is disabled".to_string(),
		})
	}
}

/// Resolves snippet references against a local directory or remote URLs.
///
/// Resolution never fails: a missing file or a failed request yields an
/// empty string and a warning, so one broken sample does not abort the
/// document it is embedded in.
#[derive(Clone)]
pub struct SnippetResolver {
	base: PathBuf,
	remote: Arc<dyn RemoteFetcher>,
}

impl fmt::Debug for SnippetResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SnippetResolver")
			.field("base", &self.base)
			.finish_non_exhaustive()
	}
}

impl SnippetResolver {
	/// Resolver that reads local files only.
	pub fn offline(base: impl Into<PathBuf>) -> Self {
		Self::with_fetcher(base, Arc::new(OfflineFetcher))
	}

	pub fn with_fetcher(base: impl Into<PathBuf>, remote: Arc<dyn RemoteFetcher>) -> Self {
		Self {
			base: base.into(),
			remote,
		}
	}

	pub fn base(&self) -> &Path {
		&self.base
	}

	pub fn resolve_ref(&self, snippet: &SnippetRef) -> String {
		self.resolve(&snippet.source, &snippet.line_ranges)
	}

	pub fn resolve(&self, source: &str, line_ranges: &[LineRange]) -> String {
		let raw = if source.starts_with("http") {
			match self.remote.fetch(source) {
				Ok(body) => body,
				Err(e) => {
					tracing::warn!(url = source, error = %e, "unable to load snippet from url");
					return String::new();
				}
			}
		} else {
			let path = self.base.join(source);
			match std::fs::read_to_string(&path) {
				Ok(body) => body,
				Err(e) => {
					tracing::warn!(path = %path.display(), error = %e, "unable to load snippet from file");
					return String::new();
				}
			}
		};

		if line_ranges.is_empty() {
			raw
		} else {
			select_lines(&raw, line_ranges)
		}
	}
}
