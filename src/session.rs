//! Document-level parsing: paragraph roles, numbering, subentries and
//! inheritance sources.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::builder::{BuildError, BuildStep, EntryBuilder, InheritanceSource, Role};
use crate::entry::Entry;
use crate::markers::MarkerTable;

/// One paragraph record as supplied by the document reader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub text: String,
    #[serde(default)]
    pub bulleted: bool,
    #[serde(default)]
    pub dash_prefixed: bool,
    /// Part of speech from the document's own markup, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
}

impl Paragraph {
    pub fn bulleted(text: impl Into<String>) -> Self {
        Paragraph {
            text: text.into(),
            bulleted: true,
            ..Paragraph::default()
        }
    }

    pub fn dashed(text: impl Into<String>) -> Self {
        Paragraph {
            text: text.into(),
            dash_prefixed: true,
            ..Paragraph::default()
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Paragraph {
            text: text.into(),
            ..Paragraph::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    LemmaNotFound,
    InheritanceUnavailable,
    /// Entry ended up with no senses and nothing to inherit
    NoSenses,
    /// Dash-prefixed line before any top-level entry
    OrphanSubentry,
}

impl IssueKind {
    pub const ALL: [IssueKind; 4] = [
        IssueKind::LemmaNotFound,
        IssueKind::InheritanceUnavailable,
        IssueKind::NoSenses,
        IssueKind::OrphanSubentry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::LemmaNotFound => "lemma not found",
            IssueKind::InheritanceUnavailable => "inheritance unavailable",
            IssueKind::NoSenses => "no senses",
            IssueKind::OrphanSubentry => "orphan subentry",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<BuildStep> for IssueKind {
    fn from(step: BuildStep) -> Self {
        match step {
            BuildStep::Lemma => IssueKind::LemmaNotFound,
            BuildStep::Inheritance => IssueKind::InheritanceUnavailable,
        }
    }
}

/// A non-fatal problem found while parsing one paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub kind: IssueKind,
    /// Top-level ordinal of the affected entry (the parent's for subentries)
    pub index: usize,
    pub raw: String,
}

/// Completed entries and the issues met on the way
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub entries: Vec<Entry>,
    pub issues: Vec<ParseIssue>,
}

impl ParseOutcome {
    pub fn subentry_count(&self) -> usize {
        self.entries.iter().map(|e| e.subentries.len()).sum()
    }

    /// Entries and subentries whose senses were inherited
    pub fn inherited_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| {
                usize::from(e.is_inherited())
                    + e.subentries.iter().filter(|s| s.is_inherited()).count()
            })
            .sum()
    }

    pub fn issue_count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No top-level entry seen yet
    Idle,
    InTopEntry,
}

// Paragraph text collected until the next entry-starting paragraph
#[derive(Debug)]
struct Pending {
    role: Role,
    text: String,
    pos: Option<String>,
    orphan: bool,
}

/// Parses the ordered paragraphs of one document.
///
/// Entries are built when the next entry-starting paragraph arrives (or at
/// [`finish`](ParseSession::finish)), so continuation lines are merged
/// into the text first. The last top-level entry stays open to receive
/// subentries until the next bulleted paragraph.
pub struct ParseSession<'t> {
    source_label: String,
    source_name: String,
    builder: EntryBuilder<'t>,
    state: SessionState,
    counter: usize,
    pending: Option<Pending>,
    open_parent: Option<Entry>,
    entries: Vec<Entry>,
    issues: Vec<ParseIssue>,
    paragraphs_seen: usize,
}

impl<'t> ParseSession<'t> {
    /// `source_label` prefixes every id; it is also the default
    /// `metadata.source`
    pub fn new(source_label: impl Into<String>, table: &'t MarkerTable) -> Self {
        let source_label = source_label.into();
        ParseSession {
            source_name: source_label.clone(),
            source_label,
            builder: EntryBuilder::new(table),
            state: SessionState::Idle,
            counter: 0,
            pending: None,
            open_parent: None,
            entries: Vec::new(),
            issues: Vec::new(),
            paragraphs_seen: 0,
        }
    }

    /// Override `metadata.source` (the document file name)
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    /// Parse a whole paragraph sequence
    pub fn parse<I>(source_label: &str, table: &'t MarkerTable, paragraphs: I) -> ParseOutcome
    where
        I: IntoIterator<Item = Paragraph>,
    {
        let mut session = ParseSession::new(source_label, table);
        for paragraph in paragraphs {
            session.push(paragraph);
        }
        session.finish()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn push(&mut self, paragraph: Paragraph) {
        self.paragraphs_seen += 1;

        // A dash line inside a list item is still a subentry
        if paragraph.dash_prefixed {
            self.flush();
            let orphan = self.open_parent.is_none();
            self.pending = Some(Pending {
                role: if orphan { Role::TopLevel } else { Role::Subentry },
                text: paragraph.text,
                pos: paragraph.pos,
                orphan,
            });
            self.state = SessionState::InTopEntry;
        } else if paragraph.bulleted {
            self.flush();
            self.close_parent();
            self.pending = Some(Pending {
                role: Role::TopLevel,
                text: paragraph.text,
                pos: paragraph.pos,
                orphan: false,
            });
            self.state = SessionState::InTopEntry;
        } else {
            match self.pending.as_mut() {
                Some(pending) => {
                    pending.text.push(' ');
                    pending.text.push_str(paragraph.text.trim());
                }
                None => debug!(
                    paragraph = self.paragraphs_seen,
                    "skipping text before the first entry"
                ),
            }
        }
    }

    /// Finalize the open entry and return everything parsed
    pub fn finish(mut self) -> ParseOutcome {
        self.flush();
        self.close_parent();

        info!(
            source = %self.source_label,
            entries = self.entries.len(),
            issues = self.issues.len(),
            "finished document"
        );

        ParseOutcome {
            entries: self.entries,
            issues: self.issues,
        }
    }

    fn record(&mut self, kind: IssueKind, index: usize, raw: &str) {
        warn!(source = %self.source_label, index, %kind, raw, "parse issue");
        self.issues.push(ParseIssue {
            kind,
            index,
            raw: raw.to_string(),
        });
    }

    // Append the open top-level entry to the output
    fn close_parent(&mut self) {
        if let Some(parent) = self.open_parent.take() {
            self.entries.push(parent);
        }
    }

    // Build the pending paragraph text into an entry or subentry
    fn flush(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        match pending.role {
            Role::TopLevel => {
                // The previous entry is closed before a new one is opened
                self.close_parent();
                self.counter += 1;
                let index = self.counter;

                let result = {
                    let source = self.entries.last().and_then(InheritanceSource::from_entry);
                    self.builder
                        .build(&pending.text, Role::TopLevel, pending.pos.as_deref(), source)
                };
                let mut entry = self.settle(result, index, &pending.text);

                if pending.orphan {
                    self.record(IssueKind::OrphanSubentry, index, &pending.text);
                }

                entry.id = Some(format!("{}:{:04}", self.source_label, index));
                entry.metadata.index = index;
                entry.metadata.source = self.source_name.clone();
                self.open_parent = Some(entry);
            }
            Role::Subentry => {
                let Some(mut parent) = self.open_parent.take() else {
                    return;
                };
                let index = parent.metadata.index;

                let result = self.builder.build(
                    &pending.text,
                    Role::Subentry,
                    pending.pos.as_deref(),
                    InheritanceSource::from_entry(&parent),
                );
                let mut entry = self.settle(result, index, &pending.text);

                entry.metadata.source = self.source_name.clone();
                entry.metadata.index = index;
                entry.metadata.parent = parent.id.clone();
                entry.metadata.subindex = Some(parent.subentries.len() + 1);

                parent.subentries.push(entry);
                self.open_parent = Some(parent);
            }
        }
    }

    // Turn a build result into an entry, recording any issues
    fn settle(&mut self, result: Result<Entry, BuildError>, index: usize, raw: &str) -> Entry {
        let (mut entry, steps) = match result {
            Ok(entry) => (entry, Vec::new()),
            Err(err) => {
                let mut entry = *err.partial;
                entry.notes.push(err.raw.trim().to_string());
                entry.metadata.needs_review = true;
                (entry, err.steps)
            }
        };

        for step in &steps {
            self.record(IssueKind::from(*step), index, raw);
        }
        if entry.senses().is_empty() && !steps.contains(&BuildStep::Inheritance) {
            self.record(IssueKind::NoSenses, index, raw);
        }

        entry.metadata.needs_review |= entry.senses().is_empty();
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{flatten_glosses, Gender, Sense};
    use pretty_assertions::assert_eq;

    fn parse(paragraphs: Vec<Paragraph>) -> ParseOutcome {
        ParseSession::parse("doc", MarkerTable::builtin(), paragraphs)
    }

    // ─────────────────────────────────────────────────────────────
    // Numbering
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn ids_are_sequential_and_padded() {
        let outcome = parse(vec![
            Paragraph::bulleted("• ܒܝܬܐ بيت"),
            Paragraph::bulleted("• ܟܣܐ كأس"),
            Paragraph::bulleted("• ܡܠܟܐ ملك"),
        ]);
        let ids: Vec<_> = outcome.entries.iter().map(|e| e.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["doc:0001", "doc:0002", "doc:0003"]);
        let indexes: Vec<_> = outcome.entries.iter().map(|e| e.metadata.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn source_name_goes_into_metadata() {
        let mut session =
            ParseSession::new("doc", MarkerTable::builtin()).with_source_name("doc.txt");
        session.push(Paragraph::bulleted("• ܒܝܬܐ بيت"));
        let outcome = session.finish();
        assert_eq!(outcome.entries[0].id.as_deref(), Some("doc:0001"));
        assert_eq!(outcome.entries[0].metadata.source, "doc.txt");
    }

    #[test]
    fn text_before_first_entry_is_skipped() {
        let mut session = ParseSession::new("doc", MarkerTable::builtin());
        session.push(Paragraph::plain("مقدمة الكتاب"));
        assert_eq!(session.state(), SessionState::Idle);
        session.push(Paragraph::bulleted("• ܒܝܬܐ بيت"));
        assert_eq!(session.state(), SessionState::InTopEntry);
        let outcome = session.finish();
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].senses(), &[Sense::new("بيت")]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(parse(Vec::new()), ParseOutcome::default());
    }

    // ─────────────────────────────────────────────────────────────
    // Subentries
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn dash_lines_attach_to_the_preceding_entry() {
        let outcome = parse(vec![
            Paragraph::bulleted("• ܒܝܬܐ (ث) بيت"),
            Paragraph::dashed("— ܒܝܬ ܡܠܟܐ قصر"),
            Paragraph::dashed("- ܒܝܬ ܐܠܗܐ معبد"),
            Paragraph::bulleted("• ܟܣܐ كأس"),
        ]);
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.subentry_count(), 2);

        let parent = &outcome.entries[0];
        let second = &parent.subentries[1];
        assert_eq!(second.lemma, "ܒܝܬ ܐܠܗܐ");
        assert_eq!(second.id, None);
        assert_eq!(second.metadata.parent.as_deref(), Some("doc:0001"));
        assert_eq!(second.metadata.subindex, Some(2));
        assert_eq!(second.metadata.index, 1);
        // Subentries do not advance the counter
        assert_eq!(outcome.entries[1].id.as_deref(), Some("doc:0002"));
    }

    #[test]
    fn subentry_inherits_parent_senses() {
        let outcome = parse(vec![
            Paragraph::bulleted("• ܐܒܐ أب"),
            Paragraph::dashed("— ܐ݇ ... (مثله)"),
        ]);
        let parent = &outcome.entries[0];
        let sub = &parent.subentries[0];
        assert_eq!(sub.senses(), parent.senses());
        assert_eq!(sub.glosses(), flatten_glosses(parent.senses()).as_slice());
        assert_eq!(sub.metadata.inherited_from.as_deref(), Some("doc:0001"));
        assert_eq!(outcome.inherited_count(), 1);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn top_level_inherits_previous_entry() {
        let outcome = parse(vec![
            Paragraph::bulleted("• ܒܝܬܐ بيت. منزل"),
            Paragraph::bulleted("• ܒܝܬܐ (مثله)"),
        ]);
        let inherited = &outcome.entries[1];
        assert_eq!(inherited.senses(), outcome.entries[0].senses());
        assert_eq!(inherited.metadata.inherited_from.as_deref(), Some("doc:0001"));
    }

    #[test]
    fn inheritance_is_a_snapshot() {
        // The parent's senses are copied before its next subentry gets built
        let outcome = parse(vec![
            Paragraph::bulleted("• ܐܒܐ أب"),
            Paragraph::dashed("— ܐ݇ (مثله)"),
            Paragraph::dashed("— ܐܒܘܢ أبونا"),
        ]);
        let parent = &outcome.entries[0];
        assert_eq!(parent.subentries[0].senses(), &[Sense::new("أب")]);
        assert_eq!(parent.subentries[1].senses(), &[Sense::new("أبونا")]);
        assert_eq!(parent.senses(), &[Sense::new("أب")]);
    }

    #[test]
    fn bulleted_dash_line_is_still_a_subentry() {
        let outcome = parse(vec![
            Paragraph::bulleted("• ܐܒܐ أب"),
            Paragraph {
                bulleted: true,
                ..Paragraph::dashed("— ܐ݇ (مثله)")
            },
        ]);
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.subentry_count(), 1);
        let sub = &outcome.entries[0].subentries[0];
        assert_eq!(sub.id, None);
        assert_eq!(sub.senses(), &[Sense::new("أب")]);
        assert_eq!(sub.metadata.inherited_from.as_deref(), Some("doc:0001"));
    }

    #[test]
    fn orphan_dash_line_becomes_top_level() {
        let outcome = parse(vec![
            Paragraph::dashed("— ܒܝܬܐ بيت"),
            Paragraph::bulleted("• ܟܣܐ كأس"),
        ]);
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.entries[0].id.as_deref(), Some("doc:0001"));
        assert_eq!(outcome.entries[0].lemma, "ܒܝܬܐ");
        assert_eq!(outcome.issue_count(IssueKind::OrphanSubentry), 1);
    }

    // ─────────────────────────────────────────────────────────────
    // Continuation lines
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn continuation_line_joins_the_open_entry() {
        let outcome = parse(vec![
            Paragraph::bulleted("• ܒܝܬܐ (ث) بيت."),
            Paragraph::plain("منزل / دار"),
        ]);
        let entry = &outcome.entries[0];
        assert_eq!(
            entry.senses(),
            &[
                Sense::with_synonyms("بيت", vec!["منزل".into()]),
                Sense::new("دار"),
            ]
        );
        assert_eq!(entry.attributes.gender, Some(Gender::Feminine));
    }

    #[test]
    fn continuation_line_joins_the_open_subentry() {
        let outcome = parse(vec![
            Paragraph::bulleted("• ܒܝܬܐ بيت"),
            Paragraph::dashed("— ܒܝܬ ܡܠܟܐ قصر"),
            Paragraph::plain("/ بلاط"),
        ]);
        let parent = &outcome.entries[0];
        assert_eq!(parent.senses(), &[Sense::new("بيت")]);
        assert_eq!(
            parent.subentries[0].senses(),
            &[Sense::new("قصر"), Sense::new("بلاط")]
        );
    }

    // ─────────────────────────────────────────────────────────────
    // Failures
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn missing_lemma_keeps_a_placeholder() {
        let outcome = parse(vec![
            Paragraph::bulleted("• بيت منزل"),
            Paragraph::bulleted("• ܟܣܐ كأس"),
        ]);
        assert_eq!(outcome.entries.len(), 2);

        let placeholder = &outcome.entries[0];
        assert_eq!(placeholder.lemma, "");
        assert_eq!(placeholder.id.as_deref(), Some("doc:0001"));
        assert_eq!(placeholder.notes, vec!["• بيت منزل"]);
        assert!(placeholder.metadata.needs_review);

        assert_eq!(
            outcome.issues,
            vec![ParseIssue {
                kind: IssueKind::LemmaNotFound,
                index: 1,
                raw: "• بيت منزل".into(),
            }]
        );
        assert_eq!(outcome.entries[1].id.as_deref(), Some("doc:0002"));
    }

    #[test]
    fn inheritance_on_first_entry_is_reported() {
        let outcome = parse(vec![Paragraph::bulleted("• ܒܝܬܐ (مثله)")]);
        let entry = &outcome.entries[0];
        assert!(entry.senses().is_empty());
        assert!(entry.notes.contains(&"• ܒܝܬܐ (مثله)".to_string()));
        assert_eq!(outcome.issue_count(IssueKind::InheritanceUnavailable), 1);
        assert_eq!(outcome.issue_count(IssueKind::NoSenses), 0);
    }

    #[test]
    fn entry_without_senses_is_flagged() {
        let outcome = parse(vec![Paragraph::bulleted("• ܒܝܬܐ")]);
        assert!(outcome.entries[0].metadata.needs_review);
        assert_eq!(outcome.issue_count(IssueKind::NoSenses), 1);
    }

    // ─────────────────────────────────────────────────────────────
    // Properties
    // ─────────────────────────────────────────────────────────────

    fn sample_document() -> Vec<Paragraph> {
        vec![
            Paragraph::plain("مقدمة"),
            Paragraph::bulleted("• ܒܝܬܐ (ث) ج ܒܬܐ بيت. منزل / دار"),
            Paragraph::dashed("— ܒܝܬ ܡܠܟܐ (مثله)"),
            Paragraph::bulleted("• ܟܣܐ (ذ) /kaːs/ كأس"),
            Paragraph::plain("؛ قدح"),
            Paragraph::bulleted("• (مثله)"),
            Paragraph::bulleted("• ܐܪܝܐ (ح) (نب) أسد"),
        ]
    }

    #[test]
    fn parsing_is_idempotent() {
        assert_eq!(parse(sample_document()), parse(sample_document()));
    }

    #[test]
    fn gloss_list_matches_senses_everywhere() {
        let outcome = parse(sample_document());
        for entry in &outcome.entries {
            for e in std::iter::once(entry).chain(entry.subentries.iter()) {
                let expected: usize = e.senses().iter().map(|s| 1 + s.synonyms.len()).sum();
                assert_eq!(e.glosses().len(), expected);
            }
        }
    }

    #[test]
    fn sample_document_counts() {
        let outcome = parse(sample_document());
        assert_eq!(outcome.entries.len(), 4);
        assert_eq!(outcome.subentry_count(), 1);
        assert_eq!(outcome.inherited_count(), 2);
        assert_eq!(outcome.issue_count(IssueKind::LemmaNotFound), 1);
    }
}
