//! Turns one paragraph into one entry.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::entry::{Entry, EntryKind, Sense};
use crate::extract::{
    build_senses, extract_ipa, extract_lemma, extract_plurals, extract_pos, normalize_paragraph,
    scan_parentheticals,
};
use crate::markers::{Flag, MarkerTable};
use crate::script::has_letter;

/// How a paragraph sits in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Bulleted paragraph starting a new entry
    TopLevel,
    /// Dash-prefixed line under the current top-level entry
    Subentry,
}

/// Extraction step that could not be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Lemma,
    Inheritance,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStep::Lemma => write!(f, "lemma"),
            BuildStep::Inheritance => write!(f, "inheritance"),
        }
    }
}

fn join_steps(steps: &[BuildStep]) -> String {
    steps
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A paragraph that could not be built completely.
///
/// `partial` holds everything that was extracted; the session keeps it as
/// a placeholder so the rest of the document is still parsed.
#[derive(Debug, Clone, Error)]
#[error("failed {} step for paragraph '{raw}'", join_steps(.steps))]
pub struct BuildError {
    pub raw: String,
    pub steps: Vec<BuildStep>,
    pub partial: Box<Entry>,
}

/// The entry `(مثله)` copies senses from
#[derive(Debug, Clone, Copy)]
pub struct InheritanceSource<'a> {
    pub id: &'a str,
    pub senses: &'a [Sense],
}

impl<'a> InheritanceSource<'a> {
    /// Source for an entry that already has an id
    pub fn from_entry(entry: &'a Entry) -> Option<InheritanceSource<'a>> {
        entry.id.as_deref().map(|id| InheritanceSource {
            id,
            senses: entry.senses(),
        })
    }
}

/// Runs the field extractors over one paragraph
#[derive(Debug, Clone, Copy)]
pub struct EntryBuilder<'t> {
    table: &'t MarkerTable,
}

impl<'t> EntryBuilder<'t> {
    pub fn new(table: &'t MarkerTable) -> Self {
        EntryBuilder { table }
    }

    /// Build an entry from raw paragraph text.
    ///
    /// `pos` is an upstream part of speech; when absent one is looked for
    /// in the text. The returned entry has no `id` or `metadata.index`.
    ///
    /// A top-level paragraph without lemma-script text fails the `Lemma`
    /// step; a subentry without one becomes a phrase. `(مثله)` with no
    /// gloss text fails the `Inheritance` step when `source` is `None` or
    /// has no senses.
    pub fn build(
        &self,
        raw: &str,
        role: Role,
        pos: Option<&str>,
        source: Option<InheritanceSource<'_>>,
    ) -> Result<Entry, BuildError> {
        let text = normalize_paragraph(raw);
        let (parentheticals, text) = scan_parentheticals(&text, self.table);
        let (lemma, text) = extract_lemma(&text);
        let (plurals, text) = extract_plurals(&text);
        let (ipa, text) = extract_ipa(&text);
        let (pos, text) = match pos.map(str::trim).filter(|p| !p.is_empty()) {
            Some(upstream) => (Some(upstream.to_string()), text),
            None => extract_pos(&text, self.table),
        };

        let senses = build_senses(&text, self.table.abbreviations());

        let mut entry = Entry {
            ipa,
            pos,
            plurals,
            notes: parentheticals.notes.clone(),
            original_gloss: has_letter(&text).then(|| text.clone()),
            ..Entry::default()
        };
        entry.set_senses(senses);

        for effect in &parentheticals.effects {
            entry.attributes.apply(effect);
        }

        let mut steps = Vec::new();
        match lemma {
            Some(lemma) => {
                if lemma.foreign {
                    entry.attributes.set_flag(Flag::Foreign);
                }
                entry.lemma = lemma.text;
            }
            None if role == Role::TopLevel => steps.push(BuildStep::Lemma),
            None => {}
        }

        if parentheticals.inherits() && entry.senses().is_empty() {
            match source.filter(|s| !s.senses.is_empty()) {
                Some(source) => {
                    entry.set_senses(source.senses.to_vec());
                    entry.metadata.inherited_from = Some(source.id.to_string());
                }
                None => steps.push(BuildStep::Inheritance),
            }
        }

        if entry.lemma.is_empty() && !entry.glosses().is_empty() {
            entry.metadata.kind = Some(EntryKind::Phrase);
        }
        entry.metadata.needs_review = entry.senses().is_empty();

        debug!(
            lemma = %entry.lemma,
            senses = entry.senses().len(),
            inherited = entry.is_inherited(),
            role = ?role,
            "built entry"
        );

        if steps.is_empty() {
            Ok(entry)
        } else {
            Err(BuildError {
                raw: raw.to_string(),
                steps,
                partial: Box::new(entry),
            })
        }
    }
}
