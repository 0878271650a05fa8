//! Sidebar trees built from Writerside `*.tree` files or MkDocs `nav:`
//! sections.
//!
//! Node labels are locale keys of the form `{doc_type}.{slug}`; the source
//! texts are collected alongside so they can be merged into the locale
//! dictionaries.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use serde_yaml_ng::Value;
use unicode_normalization::UnicodeNormalization;

use crate::DocliftError;
use crate::DocliftResult;
use crate::locale::write_pretty_json;

static PYTHON_APPLY_TAG: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"!!python/object/apply:[\w.]+").unwrap());
static PYTHON_NAME_TAG: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"!!python/name:\S+").unwrap());
static ENV_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!ENV\s*\[([^\]]+)\]").unwrap());
static TOPIC_EXTENSION: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\.(md|topic)$").unwrap());
static SLUG_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"[\s~`!@#$%^&*()\-_+=\[\]{}|\\;:"'“”‘’<>,.?/]+"#).unwrap()
});
static REPEATED_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());

/// One sidebar entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarNode {
	/// Locale key, `{doc_type}.{slug}`.
	#[serde(rename = "text")]
	pub key: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub link: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub href: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub collapsed: Option<bool>,
	/// Origin of an `<include>` that pulls in nodes from another tree.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub include: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub items: Option<Vec<SidebarNode>>,
}

impl SidebarNode {
	fn new(key: String) -> Self {
		Self {
			key,
			..Self::default()
		}
	}

	fn set_items(&mut self, items: Vec<SidebarNode>) {
		if !items.is_empty() {
			self.collapsed = Some(true);
			self.items = Some(items);
		}
	}
}

/// Result of reading a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidebarBuild {
	pub nodes: Vec<SidebarNode>,
	/// Locale key to source text.
	pub translate_keys: BTreeMap<String, String>,
}

/// Slug compatible with the site generator's heading anchors. Text is NFKD
/// normalized and combining marks are dropped, so `Café` becomes `cafe`.
pub fn slugify(text: &str) -> String {
	let cleaned: String = text
		.nfkd()
		.filter(|c| !('\u{0300}'..='\u{036f}').contains(c) && !c.is_control())
		.collect();
	let dashed = SLUG_SEPARATORS.replace_all(&cleaned, "-");
	let collapsed = REPEATED_DASH.replace_all(&dashed, "-");
	let trimmed = collapsed.trim_matches('-');

	let slug = if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
		format!("_{trimmed}")
	} else {
		trimmed.to_string()
	};

	slug.to_lowercase()
}

/// Build the sidebar for the manifest at `manifest`. `*.tree` files are read
/// as Writerside tables of contents, `*.yml` / `*.yaml` as MkDocs
/// configuration.
pub fn build_sidebar(manifest: &Path, doc_type: &str, base_url: &str) -> DocliftResult<SidebarBuild> {
	let source = std::fs::read_to_string(manifest)?;
	let display = manifest.display().to_string();

	match manifest.extension().and_then(|ext| ext.to_str()) {
		Some("tree") => build_from_toc(&source, doc_type, &display),
		Some("yml" | "yaml") => build_from_nav(&source, doc_type, base_url, &display),
		_ => Err(DocliftError::UnsupportedManifest(display)),
	}
}

#[derive(Debug, Default)]
struct XmlElement {
	name: String,
	attrs: BTreeMap<String, String>,
	children: Vec<XmlElement>,
}

impl XmlElement {
	fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
		let mut attrs = BTreeMap::new();
		for attr in start.attributes() {
			let attr = attr.map_err(|e| e.to_string())?;
			let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
			let value = attr.unescape_value().map_err(|e| e.to_string())?;
			attrs.insert(key, value.into_owned());
		}

		Ok(Self {
			name: String::from_utf8_lossy(start.name().as_ref()).to_string(),
			attrs,
			children: Vec::new(),
		})
	}

	fn attr(&self, name: &str) -> Option<&str> {
		self.attrs.get(name).map(String::as_str)
	}

	fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
		self.children.iter().filter(move |child| child.name == name)
	}

	/// First element, depth first, that directly holds `<toc-element>`
	/// children.
	fn toc_container(&self) -> Option<&XmlElement> {
		if self.children_named("toc-element").next().is_some() {
			return Some(self);
		}
		self.children.iter().find_map(XmlElement::toc_container)
	}
}

fn parse_xml(source: &str) -> Result<XmlElement, String> {
	let mut reader = Reader::from_str(source);
	reader.config_mut().trim_text(true);

	let mut stack = vec![XmlElement::default()];
	let mut buf = Vec::new();

	loop {
		match reader.read_event_into(&mut buf) {
			Ok(Event::Start(start)) => stack.push(XmlElement::from_start(&start)?),
			Ok(Event::Empty(start)) => {
				let element = XmlElement::from_start(&start)?;
				if let Some(parent) = stack.last_mut() {
					parent.children.push(element);
				}
			}
			Ok(Event::End(_)) => {
				if stack.len() > 1 {
					if let Some(element) = stack.pop() {
						if let Some(parent) = stack.last_mut() {
							parent.children.push(element);
						}
					}
				}
			}
			Ok(Event::Eof) => break,
			Err(e) => return Err(e.to_string()),
			_ => {}
		}
		buf.clear();
	}

	while stack.len() > 1 {
		if let Some(element) = stack.pop() {
			if let Some(parent) = stack.last_mut() {
				parent.children.push(element);
			}
		}
	}

	stack.pop().ok_or_else(|| "empty document".to_string())
}

/// Sidebar from a Writerside `*.tree` table of contents.
///
/// `hidden="true"` elements are skipped together with their children.
pub fn build_from_toc(source: &str, doc_type: &str, origin: &str) -> DocliftResult<SidebarBuild> {
	let root = parse_xml(source).map_err(|reason| {
		DocliftError::ManifestParse {
			path: origin.to_string(),
			reason,
		}
	})?;
	let container = root
		.toc_container()
		.ok_or_else(|| DocliftError::TocNotFound(origin.to_string()))?;

	let mut translate_keys = BTreeMap::new();
	let nodes = container
		.children_named("toc-element")
		.filter_map(|element| toc_node(element, doc_type, &mut translate_keys))
		.collect();

	Ok(SidebarBuild {
		nodes,
		translate_keys,
	})
}

fn toc_node(
	element: &XmlElement,
	doc_type: &str,
	translate_keys: &mut BTreeMap<String, String>,
) -> Option<SidebarNode> {
	if element.attr("hidden") == Some("true") {
		return None;
	}

	let title = element.attr("toc-title");
	let slug = match element.attr("topic") {
		Some(topic) => TOPIC_EXTENSION.replace(topic, "").into_owned(),
		None => slugify(title.unwrap_or_default()),
	};
	let key = format!("{doc_type}.{slug}");

	if let Some(title) = title {
		translate_keys.insert(key.clone(), title.to_string());
	}

	let mut node = SidebarNode::new(key);
	if element.attr("topic").is_some() {
		node.link = Some(slug);
	}
	node.href = element.attr("href").map(ToString::to_string);

	if let Some(include) = element.children_named("include").next() {
		node.collapsed = Some(true);
		node.include = include.attr("origin").map(ToString::to_string);
	}

	let items = element
		.children_named("toc-element")
		.filter_map(|child| toc_node(child, doc_type, translate_keys))
		.collect();
	node.set_items(items);

	Some(node)
}

/// Neutralize YAML tags that only the Python loader understands.
fn neutralize_tags(source: &str) -> String {
	let source = PYTHON_APPLY_TAG.replace_all(source, "");
	let source = PYTHON_NAME_TAG.replace_all(&source, "null");
	ENV_TAG.replace_all(&source, "null").into_owned()
}

/// Sidebar from the `nav:` section of an MkDocs configuration.
///
/// Local `.html` targets are made absolute with `base_url`, falling back to
/// the configuration's `site_url`.
pub fn build_from_nav(
	source: &str,
	doc_type: &str,
	base_url: &str,
	origin: &str,
) -> DocliftResult<SidebarBuild> {
	let config: Value = serde_yaml_ng::from_str(&neutralize_tags(source)).map_err(|e| {
		DocliftError::ManifestParse {
			path: origin.to_string(),
			reason: e.to_string(),
		}
	})?;

	let site_url = if base_url.is_empty() {
		config
			.get("site_url")
			.and_then(Value::as_str)
			.unwrap_or_default()
			.to_string()
	} else {
		base_url.to_string()
	};

	let mut translate_keys = BTreeMap::new();
	let nodes = config
		.get("nav")
		.and_then(Value::as_sequence)
		.into_iter()
		.flatten()
		.flat_map(nav_entries)
		.map(|(title, value)| nav_node(&title, value, doc_type, &site_url, &mut translate_keys))
		.collect();

	Ok(SidebarBuild {
		nodes,
		translate_keys,
	})
}

/// Title and value pairs of one `nav` list item.
fn nav_entries(item: &Value) -> Vec<(String, &Value)> {
	match item {
		Value::Mapping(mapping) => {
			mapping
				.iter()
				.filter_map(|(title, value)| title.as_str().map(|title| (title.to_string(), value)))
				.collect()
		}
		_ => {
			tracing::debug!(?item, "skipping untitled nav entry");
			Vec::new()
		}
	}
}

fn nav_node(
	title: &str,
	value: &Value,
	doc_type: &str,
	site_url: &str,
	translate_keys: &mut BTreeMap<String, String>,
) -> SidebarNode {
	let key = format!("{doc_type}.{}", slugify(title));
	translate_keys.insert(key.clone(), title.to_string());
	let mut node = SidebarNode::new(key);

	match value {
		Value::String(target) if !target.trim().is_empty() => {
			let target = target.trim();
			if target.starts_with("http://") || target.starts_with("https://") {
				node.href = Some(target.to_string());
			} else if target.starts_with("index") {
				node.link = Some(target.to_string());
			} else if let Some(stem) = target.strip_suffix(".md") {
				node.link = Some(stem.to_string());
			} else if target.ends_with(".html") {
				node.href = Some(format!("{site_url}{target}"));
			}
		}
		Value::Sequence(children) => {
			let items = children
				.iter()
				.flat_map(nav_entries)
				.map(|(title, value)| nav_node(&title, value, doc_type, site_url, translate_keys))
				.collect();
			node.set_items(items);
		}
		Value::Mapping(mapping) => {
			let items = mapping
				.iter()
				.filter_map(|(title, value)| {
					title
						.as_str()
						.map(|title| nav_node(title, value, doc_type, site_url, translate_keys))
				})
				.collect();
			node.set_items(items);
		}
		_ => {}
	}

	node
}

/// Location of the sidebar file for `doc_type`.
pub fn sidebar_path(dir: &Path, doc_type: &str) -> PathBuf {
	dir.join(format!("{doc_type}.sidebar.json"))
}

/// Write `<dir>/<doc_type>.sidebar.json`.
pub fn write_sidebar(dir: &Path, doc_type: &str, nodes: &[SidebarNode]) -> DocliftResult<PathBuf> {
	let path = sidebar_path(dir, doc_type);
	write_pretty_json(&path, &nodes)?;
	tracing::info!(path = %path.display(), nodes = nodes.len(), "sidebar written");
	Ok(path)
}
