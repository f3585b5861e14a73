// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! User-facing configuration and its key-value persistence.
//!
//! Every field is stored under its own key (`bingo-<field>`) as plain text, so
//! a store only needs get/set/remove. Missing or unreadable keys fall back to
//! the defaults below.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Serialize;

use crate::card::LayoutConfig;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::terms::parse_terms;

/// A key-value store that settings are persisted to.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Fallible<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Fallible<()>;
    fn remove(&self, key: &str) -> Fallible<()>;
}

/// In-memory store, optionally refusing values above a byte quota.
#[derive(Default)]
pub struct MemoryStore {
    inner: RefCell<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: RefCell::new(HashMap::new()),
            quota: Some(quota),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Fallible<Option<String>> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Fallible<()> {
        if let Some(quota) = self.quota {
            if value.len() > quota {
                return fail(format!("quota exceeded writing '{key}'"));
            }
        }
        self.inner
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Fallible<()> {
        self.inner.borrow_mut().remove(key);
        Ok(())
    }
}

pub const KEY_PREFIX: &str = "bingo-";

/// Field names, in the order they are shown and saved.
pub const FIELDS: [&str; 14] = [
    "terms",
    "title",
    "subtitle",
    "title-size",
    "title-weight",
    "title-italic",
    "title-uppercase",
    "font-family",
    "subtitle-size",
    "text-color",
    "background-opacity",
    "cell-opacity",
    "use-free-space",
    "background-image",
];

/// Keys written by earlier browser versions of the generator. Read when the
/// current key is absent; never written.
const LEGACY_KEYS: [(&str, &str); 12] = [
    ("terms", "bingo-rawText"),
    ("title-size", "bingo-titleSize"),
    ("title-weight", "bingo-titleWeight"),
    ("title-italic", "bingo-titleItalic"),
    ("title-uppercase", "bingo-titleUppercase"),
    ("font-family", "bingo-fontStyle"),
    ("subtitle-size", "bingo-subtitleSize"),
    ("text-color", "bingo-textColor"),
    ("background-opacity", "bingo-bgOpacity"),
    ("cell-opacity", "bingo-cellOpacity"),
    ("use-free-space", "bingo-useFreeSpace"),
    ("background-image", "bingo-bgImage"),
];

pub const TITLE_SIZE_RANGE: (u32, u32) = (16, 128);
pub const SUBTITLE_SIZE_RANGE: (u32, u32) = (12, 64);

const DEFAULT_TERMS: [&str; 25] = [
    "Synergy",
    "Circle Back",
    "Low Hanging Fruit",
    "Deep Dive",
    "Touch Base",
    "Bandwidth",
    "Paradigm Shift",
    "Leverage",
    "Holistic",
    "Deliverables",
    "Scalable",
    "Disruptive",
    "Think Outside the Box",
    "Moving the Needle",
    "Win-Win",
    "Best Practice",
    "Ecosystem",
    "On the Radar",
    "Hard Stop",
    "Ping Me",
    "Take Offline",
    "Value Add",
    "Core Competency",
    "Game Changer",
    "Blue Sky",
];

pub fn storage_key(field: &str) -> String {
    format!("{KEY_PREFIX}{field}")
}

/// The field named by `field` in any accepted spelling, if it exists.
pub fn canonical_field(field: &str) -> Option<&'static str> {
    let field = normalize_field(field);
    FIELDS.iter().copied().find(|f| *f == field)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
}

impl FontFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            FontFamily::Sans => "sans",
            FontFamily::Serif => "serif",
            FontFamily::Mono => "mono",
        }
    }

    /// The generic CSS/SVG font family.
    pub fn generic(self) -> &'static str {
        match self {
            FontFamily::Sans => "sans-serif",
            FontFamily::Serif => "serif",
            FontFamily::Mono => "monospace",
        }
    }
}

impl Display for FontFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FontFamily {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sans" | "font-sans" | "sans-serif" => Ok(FontFamily::Sans),
            "serif" | "font-serif" => Ok(FontFamily::Serif),
            "mono" | "font-mono" | "monospace" => Ok(FontFamily::Mono),
            _ => Err(ErrorReport::new(format!("Unknown font family: '{s}'."))),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(into = "u16")]
pub enum TitleWeight {
    Normal,
    Bold,
    #[default]
    Black,
}

impl TitleWeight {
    pub fn value(self) -> u16 {
        match self {
            TitleWeight::Normal => 400,
            TitleWeight::Bold => 700,
            TitleWeight::Black => 900,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TitleWeight::Normal => "Normal",
            TitleWeight::Bold => "Bold",
            TitleWeight::Black => "Black",
        }
    }
}

impl From<TitleWeight> for u16 {
    fn from(w: TitleWeight) -> u16 {
        w.value()
    }
}

impl FromStr for TitleWeight {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "400" | "normal" => Ok(TitleWeight::Normal),
            "700" | "bold" => Ok(TitleWeight::Bold),
            "900" | "black" => Ok(TitleWeight::Black),
            _ => Err(ErrorReport::new(format!("Unknown title weight: '{s}'."))),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Raw term text, one term per line.
    pub terms: String,
    pub title: String,
    pub subtitle: String,
    /// Title font size in CSS pixels.
    pub title_size: u32,
    pub title_weight: TitleWeight,
    pub title_italic: bool,
    pub title_uppercase: bool,
    pub font_family: FontFamily,
    /// Subtitle font size in CSS pixels.
    pub subtitle_size: u32,
    /// `#rrggbb`, lowercase.
    pub text_color: String,
    pub background_opacity: f64,
    pub cell_opacity: f64,
    pub use_free_space: bool,
    /// A `data:image/...;base64,` URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            terms: DEFAULT_TERMS.join("\n"),
            title: "Event Bingo".to_string(),
            subtitle: String::new(),
            title_size: 48,
            title_weight: TitleWeight::Black,
            title_italic: false,
            title_uppercase: false,
            font_family: FontFamily::Sans,
            subtitle_size: 24,
            text_color: "#1f2937".to_string(),
            background_opacity: 0.5,
            cell_opacity: 0.9,
            use_free_space: true,
            background_image: None,
        }
    }
}

impl Settings {
    /// Read every field from the store. Fields that are absent or fail to
    /// parse keep their default.
    pub fn load(store: &impl SettingsStore) -> Self {
        let mut settings = Settings::default();
        for field in FIELDS {
            let key = storage_key(field);
            let value = match read_field(store, field, &key) {
                Some(value) => value,
                None => continue,
            };
            if let Err(e) = settings.set_field(field, &value) {
                log::warn!("Ignoring stored value for '{key}': {e}");
            }
        }
        settings
    }

    /// Write every field to the store. A field the store refuses (e.g. a
    /// background image over quota) is skipped; the returned list names the
    /// skipped fields.
    pub fn save(&self, store: &impl SettingsStore) -> Vec<&'static str> {
        let mut skipped = Vec::new();
        for field in FIELDS {
            let key = storage_key(field);
            let result = match self.get_field(field) {
                Some(value) => store.set(&key, &value),
                None => remove_field(store, field),
            };
            if let Err(e) = result {
                log::warn!("Failed to persist setting '{key}': {e}");
                skipped.push(field);
            }
        }
        skipped
    }

    /// Remove every persisted field.
    pub fn clear(store: &impl SettingsStore) -> Fallible<()> {
        for field in FIELDS {
            remove_field(store, field)?;
        }
        Ok(())
    }

    /// The textual form of a field, as persisted. `None` for an unset
    /// background image or an unknown field.
    pub fn get_field(&self, field: &str) -> Option<String> {
        let field = normalize_field(field);
        let value = match field.as_str() {
            "terms" => self.terms.clone(),
            "title" => self.title.clone(),
            "subtitle" => self.subtitle.clone(),
            "title-size" => self.title_size.to_string(),
            "title-weight" => self.title_weight.value().to_string(),
            "title-italic" => self.title_italic.to_string(),
            "title-uppercase" => self.title_uppercase.to_string(),
            "font-family" => self.font_family.to_string(),
            "subtitle-size" => self.subtitle_size.to_string(),
            "text-color" => self.text_color.clone(),
            "background-opacity" => self.background_opacity.to_string(),
            "cell-opacity" => self.cell_opacity.to_string(),
            "use-free-space" => self.use_free_space.to_string(),
            "background-image" => return self.background_image.clone(),
            _ => return None,
        };
        Some(value)
    }

    /// Parse and assign one field from its textual form. Sizes and opacities
    /// are clamped into range. Accepts `title_size`, `title-size` and
    /// `bingo-title-size` alike.
    pub fn set_field(&mut self, field: &str, value: &str) -> Fallible<()> {
        let field = normalize_field(field);
        match field.as_str() {
            "terms" => self.terms = value.to_string(),
            "title" => self.title = value.to_string(),
            "subtitle" => self.subtitle = value.to_string(),
            "title-size" => {
                let (lo, hi) = TITLE_SIZE_RANGE;
                self.title_size = parse_u32(value)?.clamp(lo, hi);
            }
            "title-weight" => self.title_weight = value.trim().parse()?,
            "title-italic" => self.title_italic = parse_bool(value)?,
            "title-uppercase" => self.title_uppercase = parse_bool(value)?,
            "font-family" => self.font_family = value.trim().parse()?,
            "subtitle-size" => {
                let (lo, hi) = SUBTITLE_SIZE_RANGE;
                self.subtitle_size = parse_u32(value)?.clamp(lo, hi);
            }
            "text-color" => self.text_color = parse_color(value)?,
            "background-opacity" => self.background_opacity = parse_opacity(value)?,
            "cell-opacity" => self.cell_opacity = parse_opacity(value)?,
            "use-free-space" => self.use_free_space = parse_bool(value)?,
            "background-image" => {
                let value = value.trim();
                self.background_image = if value.is_empty() {
                    None
                } else {
                    Some(parse_data_uri(value)?)
                };
            }
            _ => return fail(format!("Unknown setting: '{field}'.")),
        }
        Ok(())
    }

    /// Overlay the fields present in a TOML profile onto these settings.
    pub fn apply_toml(&mut self, text: &str) -> Fallible<()> {
        let table: toml::Table = toml::from_str(text)?;
        for (key, value) in table {
            let value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            self.set_field(&key, &value)?;
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Fallible<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn layout(&self) -> LayoutConfig {
        LayoutConfig::new(self.use_free_space)
    }

    pub fn term_pool(&self) -> Vec<String> {
        parse_terms(&self.terms)
    }
}

/// Remove a field's key, and its legacy key if it has one.
pub fn remove_field(store: &impl SettingsStore, field: &str) -> Fallible<()> {
    store.remove(&storage_key(field))?;
    if let Some((_, legacy)) = LEGACY_KEYS.iter().find(|(f, _)| *f == field) {
        store.remove(legacy)?;
    }
    Ok(())
}

/// Stored value for `field`, falling back to its camelCase legacy key.
fn read_field(store: &impl SettingsStore, field: &str, key: &str) -> Option<String> {
    let legacy = LEGACY_KEYS
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, legacy)| *legacy);
    for key in std::iter::once(key).chain(legacy) {
        match store.get(key) {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(e) => log::warn!("Failed to read setting '{key}': {e}"),
        }
    }
    None
}

fn normalize_field(field: &str) -> String {
    let field = field.trim();
    let field = field.strip_prefix(KEY_PREFIX).unwrap_or(field);
    field.replace('_', "-")
}

fn parse_u32(value: &str) -> Fallible<u32> {
    // Range inputs sometimes come through as "48.0".
    let value = value.trim();
    if let Ok(n) = value.parse::<u32>() {
        return Ok(n);
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => Ok(f.round() as u32),
        _ => fail(format!("Not a size: '{value}'.")),
    }
}

fn parse_bool(value: &str) -> Fallible<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => fail(format!("Not a boolean: '{value}'.")),
    }
}

fn parse_opacity(value: &str) -> Fallible<f64> {
    match value.trim().parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(f.clamp(0.0, 1.0)),
        _ => fail(format!("Not an opacity: '{value}'.")),
    }
}

fn parse_color(value: &str) -> Fallible<String> {
    let value = value.trim();
    let hex = value.strip_prefix('#').unwrap_or("");
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(format!("#{}", hex.to_ascii_lowercase()))
    } else {
        fail(format!("Not a #rrggbb colour: '{value}'."))
    }
}

fn parse_data_uri(value: &str) -> Fallible<String> {
    if value.starts_with("data:image/") && value.contains(";base64,") {
        Ok(value.to_string())
    } else {
        fail("Background image must be a base64 data:image URI.")
    }
}
