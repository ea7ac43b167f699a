//! Parser for bilingual Syriac-Arabic dictionary documents.
//!
//! A document is an ordered sequence of paragraphs. Bulleted paragraphs
//! start entries, dash-prefixed lines add subentries to the entry before
//! them, and other lines continue the open entry. Each entry's fields
//! (lemma, plurals, pronunciation, senses, marker attributes) are pulled
//! out of the mixed-script text by [`extract`], driven by the marker table
//! in [`markers`].

pub mod builder;
pub mod entry;
pub mod error;
pub mod extract;
pub mod markers;
pub mod output;
pub mod parallel;
pub mod reader;
pub mod script;
pub mod session;

pub use builder::{BuildError, BuildStep, EntryBuilder, InheritanceSource, Role};
pub use entry::{Attributes, Entry, EntryKind, Gender, Metadata, Sense};
pub use error::{EncodeError, Error, MarkerTableError, ReadError};
pub use markers::{Flag, MarkerEffect, MarkerTable};
pub use session::{IssueKind, Paragraph, ParseIssue, ParseOutcome, ParseSession};
