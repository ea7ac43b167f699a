//! Entry records produced by a parse session.
//!
//! Field order and presence rules are fixed so the JSON and XML encoders
//! can render an entry without inventing defaults: optional scalars are
//! omitted when absent, list fields are always present.

use serde::{Deserialize, Serialize};

use crate::markers::{Flag, MarkerEffect};

// Helper function for serde skip_serializing_if
fn is_false(b: &bool) -> bool {
    !*b
}

/// Grammatical gender asserted by a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "m")]
    Masculine,
    #[serde(rename = "f")]
    Feminine,
    #[serde(rename = "common", alias = "mf")]
    Common,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Masculine => "m",
            Gender::Feminine => "f",
            Gender::Common => "common",
        }
    }
}

/// One meaning unit: a main gloss plus near-synonymous glosses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sense {
    pub gloss: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl Sense {
    pub fn new(gloss: impl Into<String>) -> Self {
        Sense {
            gloss: gloss.into(),
            synonyms: Vec::new(),
        }
    }

    pub fn with_synonyms(gloss: impl Into<String>, synonyms: Vec<String>) -> Self {
        Sense {
            gloss: gloss.into(),
            synonyms,
        }
    }
}

/// Attributes asserted by parenthetical markers. An absent key means the
/// attribute was not asserted; nothing defaults to false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign: Option<bool>,
    /// Domain tags in insertion order, no duplicates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic_change: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuneiform: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_meaning_as_previous: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural_indicator: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tradition: Option<String>,
}

impl Attributes {
    /// Apply one marker effect
    pub fn apply(&mut self, effect: &MarkerEffect) {
        match effect {
            MarkerEffect::Gender(gender) => self.gender = Some(*gender),
            MarkerEffect::Flag(flag) => self.set_flag(*flag),
            MarkerEffect::Domain(tag) => self.add_domain(tag),
            MarkerEffect::Tradition(tag) => self.tradition = Some(tag.clone()),
            MarkerEffect::InheritPrevious => self.same_meaning_as_previous = Some(true),
            MarkerEffect::PluralIndicator => self.plural_indicator = Some(true),
        }
    }

    pub fn set_flag(&mut self, flag: Flag) {
        let slot = match flag {
            Flag::Agent => &mut self.agent,
            Flag::PhoneticChange => &mut self.phonetic_change,
            Flag::Cuneiform => &mut self.cuneiform,
            Flag::Foreign => &mut self.foreign,
        };
        *slot = Some(true);
    }

    pub fn add_domain(&mut self, tag: &str) {
        if !self.domain.iter().any(|d| d == tag) {
            self.domain.push(tag.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Attributes::default()
    }
}

/// Entry classification recorded in metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    /// Gloss text without a headword
    Phrase,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Phrase => "phrase",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Originating document
    #[serde(default)]
    pub source: String,
    /// 1-based top-level ordinal (the parent's ordinal for subentries)
    #[serde(default)]
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subindex: Option<usize>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub needs_review: bool,
}

/// A top-level entry or a subentry; both share the same shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// `<source>:<0001>` for top-level entries; subentries have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub lemma: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(default)]
    pub plurals: Vec<String>,
    #[serde(default)]
    pub(crate) senses: Vec<Sense>,
    // Flattened view of `senses`, kept in step by `set_senses`
    #[serde(default)]
    pub(crate) glosses: Vec<String>,
    /// Gloss text as it stood before sense splitting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_gloss: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub subentries: Vec<Entry>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Entry {
    pub fn senses(&self) -> &[Sense] {
        &self.senses
    }

    pub fn glosses(&self) -> &[String] {
        &self.glosses
    }

    /// Replace the senses and rebuild the flattened gloss list
    pub fn set_senses(&mut self, senses: Vec<Sense>) {
        self.glosses = flatten_glosses(&senses);
        self.senses = senses;
    }

    pub fn is_inherited(&self) -> bool {
        self.metadata.inherited_from.is_some()
    }
}

/// Every sense's gloss followed by its synonyms, in order
pub fn flatten_glosses(senses: &[Sense]) -> Vec<String> {
    senses
        .iter()
        .flat_map(|s| std::iter::once(&s.gloss).chain(s.synonyms.iter()))
        .cloned()
        .collect()
}
