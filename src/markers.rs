//! Parenthetical marker table.
//!
//! Markers are short tokens written in parentheses, such as `(ث)` for a
//! feminine noun or `(مثله)` for "same meaning as the previous entry". The
//! table is pure data loaded from `schema/markers.yaml`; supporting a new
//! marker means adding a row, not code.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

use crate::entry::Gender;
use crate::error::MarkerTableError;

const DEFAULT_SCHEMA: &str = include_str!("../schema/markers.yaml");

/// Parenthetical text longer than this is never a marker
pub const DEFAULT_MAX_MARKER_LEN: usize = 12;

pub(crate) const TATWEEL: char = '\u{0640}';

/// Boolean attributes a marker can assert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Flag {
    Agent,
    PhoneticChange,
    Cuneiform,
    Foreign,
}

/// What a recognized marker does to the entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerEffect {
    Gender(Gender),
    Flag(Flag),
    /// Appended to `attributes.domain`
    Domain(String),
    Tradition(String),
    /// `(مثله)`: copy senses from the previous entry or the parent
    InheritPrevious,
    /// `(ج)` in parentheses, distinct from a `ج <forms>` plural segment
    PluralIndicator,
}

// === Marker schema YAML structures ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum EffectKind {
    Gender,
    Flag,
    Domain,
    Tradition,
    InheritPrevious,
    PluralIndicator,
}

#[derive(Debug, Deserialize)]
struct MarkerRow {
    token: String,
    effect: EffectKind,
    #[serde(default)]
    value: Option<serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
struct MarkerSchema {
    #[serde(default = "default_max_marker_len")]
    max_marker_len: usize,
    markers: Vec<MarkerRow>,
    #[serde(default)]
    abbreviations: Vec<String>,
    #[serde(default)]
    parts_of_speech: Vec<String>,
}

fn default_max_marker_len() -> usize {
    DEFAULT_MAX_MARKER_LEN
}

impl MarkerRow {
    fn into_effect(self) -> Result<(String, MarkerEffect), MarkerTableError> {
        let token = self.token;
        let effect = match self.effect {
            EffectKind::Gender => MarkerEffect::Gender(row_value(&token, self.value)?),
            EffectKind::Flag => MarkerEffect::Flag(row_value(&token, self.value)?),
            EffectKind::Domain => MarkerEffect::Domain(row_value(&token, self.value)?),
            EffectKind::Tradition => MarkerEffect::Tradition(row_value(&token, self.value)?),
            EffectKind::InheritPrevious => MarkerEffect::InheritPrevious,
            EffectKind::PluralIndicator => MarkerEffect::PluralIndicator,
        };
        Ok((token, effect))
    }
}

fn row_value<T: serde::de::DeserializeOwned>(
    token: &str,
    value: Option<serde_yaml::Value>,
) -> Result<T, MarkerTableError> {
    let value = value.ok_or_else(|| MarkerTableError::InvalidRow {
        token: token.to_string(),
        reason: "missing value".to_string(),
    })?;
    serde_yaml::from_value(value).map_err(|e| MarkerTableError::InvalidRow {
        token: token.to_string(),
        reason: e.to_string(),
    })
}

/// Lookup key for a token: NFC, no tatweel, no whitespace
pub fn normalize_token(token: &str) -> String {
    token
        .nfc()
        .filter(|&c| c != TATWEEL && !c.is_whitespace())
        .collect()
}

/// Token → effect table plus the word lists the extractors consult
#[derive(Debug, Clone)]
pub struct MarkerTable {
    effects: HashMap<String, MarkerEffect>,
    max_marker_len: usize,
    // Longest first, so longer abbreviations take precedence
    abbreviations: Vec<String>,
    parts_of_speech: Vec<String>,
}

static BUILTIN: Lazy<MarkerTable> = Lazy::new(|| {
    MarkerTable::from_yaml_str(DEFAULT_SCHEMA).expect("embedded marker schema is valid")
});

impl MarkerTable {
    /// Table built from the schema embedded in the binary
    pub fn builtin() -> &'static MarkerTable {
        &BUILTIN
    }

    pub fn from_yaml_str(yaml: &str) -> Result<MarkerTable, MarkerTableError> {
        let schema: MarkerSchema = serde_yaml::from_str(yaml)?;

        let mut table = MarkerTable {
            effects: HashMap::new(),
            max_marker_len: schema.max_marker_len,
            abbreviations: Vec::new(),
            parts_of_speech: schema
                .parts_of_speech
                .iter()
                .map(|p| p.nfc().filter(|&c| c != TATWEEL).collect::<String>())
                .filter(|p| !p.trim().is_empty())
                .collect(),
        };

        for row in schema.markers {
            let (token, effect) = row.into_effect()?;
            if normalize_token(&token).is_empty() {
                return Err(MarkerTableError::InvalidRow {
                    token,
                    reason: "empty token".to_string(),
                });
            }
            table.insert(&token, effect);
        }

        for abbreviation in schema.abbreviations {
            table.add_abbreviation(&abbreviation);
        }

        Ok(table)
    }

    pub fn load(path: &Path) -> Result<MarkerTable, MarkerTableError> {
        let contents = fs::read_to_string(path).map_err(|source| MarkerTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        MarkerTable::from_yaml_str(&contents)
    }

    /// Add or replace a marker row
    pub fn insert(&mut self, token: &str, effect: MarkerEffect) {
        self.effects.insert(normalize_token(token), effect);
    }

    pub fn add_abbreviation(&mut self, abbreviation: &str) {
        let normalized: String = abbreviation
            .trim()
            .nfc()
            .filter(|&c| c != TATWEEL)
            .collect();
        if normalized.is_empty() || self.abbreviations.contains(&normalized) {
            return;
        }
        self.abbreviations.push(normalized);
        self.abbreviations
            .sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    }

    /// Effect for a parenthetical token, or `None` when it is note text
    pub fn classify(&self, token: &str) -> Option<&MarkerEffect> {
        let token = token.trim();
        if token.chars().count() > self.max_marker_len {
            return None;
        }
        self.effects.get(&normalize_token(token))
    }

    pub fn max_marker_len(&self) -> usize {
        self.max_marker_len
    }

    pub fn abbreviations(&self) -> &[String] {
        &self.abbreviations
    }

    pub fn is_part_of_speech(&self, token: &str) -> bool {
        self.parts_of_speech.iter().any(|p| p == token)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
