//! Per-language display text for sidebar keys.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Deserialize;
use serde::Serialize;

use crate::DocliftError;
use crate::DocliftResult;

/// Key to display text for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut, Deserialize, Serialize)]
#[serde(transparent)]
pub struct LocaleDict(BTreeMap<String, String>);

impl LocaleDict {
	pub fn new() -> Self {
		Self::default()
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LocaleDict {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self(
			iter.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.collect(),
		)
	}
}

/// Where locale dictionaries are read from and written to.
pub trait LocaleStore {
	/// Dictionary for `lang`. A missing dictionary is empty.
	fn load(&self, lang: &str) -> DocliftResult<LocaleDict>;
	/// Replace the dictionary for `lang`.
	fn save(&mut self, lang: &str, dict: &LocaleDict) -> DocliftResult<()>;
}

/// Dictionaries stored as `<dir>/<lang>.json`.
#[derive(Debug, Clone)]
pub struct JsonLocaleStore {
	dir: PathBuf,
}

impl JsonLocaleStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn path_for(&self, lang: &str) -> PathBuf {
		self.dir.join(format!("{lang}.json"))
	}
}

impl LocaleStore for JsonLocaleStore {
	fn load(&self, lang: &str) -> DocliftResult<LocaleDict> {
		let path = self.path_for(lang);
		let Ok(content) = std::fs::read_to_string(&path) else {
			return Ok(LocaleDict::new());
		};

		match serde_json::from_str(&content) {
			Ok(dict) => Ok(dict),
			Err(e) => {
				tracing::warn!(path = %path.display(), error = %e, "treating invalid locale file as empty");
				Ok(LocaleDict::new())
			}
		}
	}

	fn save(&mut self, lang: &str, dict: &LocaleDict) -> DocliftResult<()> {
		let path = self.path_for(lang);
		write_pretty_json(&path, dict)
	}
}

/// Store kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocaleStore {
	dicts: BTreeMap<String, LocaleDict>,
	saved: Vec<String>,
}

impl MemoryLocaleStore {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, lang: &str, dict: LocaleDict) -> Self {
		self.dicts.insert(lang.to_string(), dict);
		self
	}

	pub fn dict(&self, lang: &str) -> Option<&LocaleDict> {
		self.dicts.get(lang)
	}

	/// Languages in the order they were saved.
	pub fn saved(&self) -> &[String] {
		&self.saved
	}
}

impl LocaleStore for MemoryLocaleStore {
	fn load(&self, lang: &str) -> DocliftResult<LocaleDict> {
		Ok(self.dicts.get(lang).cloned().unwrap_or_default())
	}

	fn save(&mut self, lang: &str, dict: &LocaleDict) -> DocliftResult<()> {
		self.dicts.insert(lang.to_string(), dict.clone());
		self.saved.push(lang.to_string());
		Ok(())
	}
}

/// Merge freshly extracted source texts into the stored dictionaries.
///
/// For the source language each pending key is:
/// * removed from `pending` when the stored text is already the same,
/// * overwritten and kept pending when the stored text differs,
/// * inserted and kept pending when it is missing.
///
/// Every key still pending afterwards is written into each other locale with
/// the source text, ready for translation. The source dictionary is always
/// rewritten in full; other locales are only written when something is
/// pending. Returns the keys that stayed pending.
pub fn merge_locales<S: LocaleStore>(
	store: &mut S,
	source_locale: &str,
	locales: &[String],
	mut pending: BTreeMap<String, String>,
) -> DocliftResult<BTreeMap<String, String>> {
	let mut source = store.load(source_locale)?;

	pending.retain(|key, text| {
		match source.get(key) {
			Some(existing) if existing == text => false,
			_ => {
				source.insert(key.clone(), text.clone());
				true
			}
		}
	});
	store.save(source_locale, &source)?;

	if pending.is_empty() {
		return Ok(pending);
	}

	for lang in locales.iter().filter(|lang| lang.as_str() != source_locale) {
		let mut dict = store.load(lang)?;
		dict.extend(pending.iter().map(|(key, text)| (key.clone(), text.clone())));
		store.save(lang, &dict)?;
	}

	tracing::info!(pending = pending.len(), "locale keys updated");
	Ok(pending)
}

/// Write `value` as two-space indented JSON followed by a newline.
pub fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> DocliftResult<()> {
	let json = serde_json::to_string_pretty(value).map_err(|e| {
		DocliftError::Json {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})?;

	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, format!("{json}\n"))?;

	Ok(())
}
