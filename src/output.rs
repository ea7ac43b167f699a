//! Entry encoders: pretty JSON array, JSON lines, and XML.

use std::io::Write;

use clap::ValueEnum;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::entry::{Attributes, Entry, Metadata};
use crate::error::EncodeError;

const LEMMA_LANG: &str = "syc";
const GLOSS_LANG: &str = "ar";

/// Output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON array
    Json,
    /// One JSON object per line
    Jsonl,
    /// Nested XML elements
    Xml,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Xml => "xml",
        }
    }
}

pub fn write_json(writer: &mut impl Write, entries: &[Entry]) -> Result<(), EncodeError> {
    serde_json::to_writer_pretty(&mut *writer, entries)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_jsonl(writer: &mut impl Write, entries: &[Entry]) -> Result<(), EncodeError> {
    for entry in entries {
        serde_json::to_writer(&mut *writer, entry)?;
        writeln!(writer)?;
    }
    Ok(())
}

pub fn write_xml(writer: &mut impl Write, entries: &[Entry]) -> Result<(), EncodeError> {
    {
        let mut encoder = XmlEncoder {
            writer: Writer::new_with_indent(&mut *writer, b' ', 2),
        };
        encoder.document(entries)?;
    }
    writeln!(writer)?;
    Ok(())
}

pub fn to_xml_string(entries: &[Entry]) -> Result<String, EncodeError> {
    let mut buf = Vec::new();
    write_xml(&mut buf, entries)?;
    String::from_utf8(buf).map_err(|e| EncodeError::Xml(e.to_string()))
}

pub fn write_entries(
    writer: &mut impl Write,
    entries: &[Entry],
    format: OutputFormat,
) -> Result<(), EncodeError> {
    match format {
        OutputFormat::Json => write_json(writer, entries),
        OutputFormat::Jsonl => write_jsonl(writer, entries),
        OutputFormat::Xml => write_xml(writer, entries),
    }
}

fn xml_err(e: impl std::fmt::Display) -> EncodeError {
    EncodeError::Xml(e.to_string())
}

struct XmlEncoder<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlEncoder<W> {
    fn document(&mut self, entries: &[Entry]) -> Result<(), EncodeError> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.open("entries", &[])?;
        for entry in entries {
            self.entry(entry)?;
        }
        self.close("entries")
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), EncodeError> {
        self.writer.write_event(event).map_err(xml_err)
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<(), EncodeError> {
        let mut start = BytesStart::new(tag);
        for &attr in attrs {
            start.push_attribute(attr);
        }
        self.event(Event::Start(start))
    }

    fn close(&mut self, tag: &str) -> Result<(), EncodeError> {
        self.event(Event::End(BytesEnd::new(tag)))
    }

    // Element with text content; empty text writes nothing
    fn text(&mut self, tag: &str, text: &str, attrs: &[(&str, &str)]) -> Result<(), EncodeError> {
        if text.is_empty() {
            return Ok(());
        }
        self.open(tag, attrs)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.close(tag)
    }

    // Wrapper element with one child per item; empty lists write nothing
    fn list(
        &mut self,
        tag: &str,
        child: &str,
        items: &[String],
        attrs: &[(&str, &str)],
    ) -> Result<(), EncodeError> {
        if items.is_empty() {
            return Ok(());
        }
        self.open(tag, &[])?;
        for item in items {
            self.text(child, item, attrs)?;
        }
        self.close(tag)
    }

    fn entry(&mut self, entry: &Entry) -> Result<(), EncodeError> {
        match entry.id.as_deref() {
            Some(id) => self.open("entry", &[("id", id)])?,
            None => self.open("entry", &[])?,
        }

        self.text("lemma", &entry.lemma, &[("lang", LEMMA_LANG)])?;
        if let Some(ipa) = &entry.ipa {
            self.text("ipa", ipa, &[])?;
        }
        if let Some(pos) = &entry.pos {
            self.text("pos", pos, &[("lang", GLOSS_LANG)])?;
        }
        self.attributes(&entry.attributes)?;
        self.list("plurals", "form", &entry.plurals, &[("lang", LEMMA_LANG)])?;

        if !entry.senses().is_empty() {
            self.open("senses", &[])?;
            for sense in entry.senses() {
                self.open("sense", &[])?;
                self.text("gloss", &sense.gloss, &[("lang", GLOSS_LANG)])?;
                self.list("synonyms", "syn", &sense.synonyms, &[("lang", GLOSS_LANG)])?;
                self.close("sense")?;
            }
            self.close("senses")?;
        }

        self.list("glosses", "gloss", entry.glosses(), &[("lang", GLOSS_LANG)])?;
        if let Some(original) = &entry.original_gloss {
            self.text("originalGloss", original, &[("lang", GLOSS_LANG)])?;
        }
        self.list("notes", "note", &entry.notes, &[])?;

        if !entry.subentries.is_empty() {
            self.open("subentries", &[])?;
            for sub in &entry.subentries {
                self.entry(sub)?;
            }
            self.close("subentries")?;
        }

        self.metadata(&entry.metadata)?;
        self.close("entry")
    }

    fn attributes(&mut self, attrs: &Attributes) -> Result<(), EncodeError> {
        if attrs.is_empty() {
            return Ok(());
        }
        self.open("attributes", &[])?;

        if let Some(gender) = attrs.gender {
            self.text("gender", gender.as_str(), &[])?;
        }
        let flags = [
            ("foreign", attrs.foreign),
            ("agent", attrs.agent),
            ("phoneticChange", attrs.phonetic_change),
            ("cuneiform", attrs.cuneiform),
            ("sameMeaningAsPrevious", attrs.same_meaning_as_previous),
            ("pluralIndicator", attrs.plural_indicator),
        ];
        self.list("domain", "item", &attrs.domain, &[])?;
        for (tag, value) in flags {
            if let Some(value) = value {
                self.text(tag, if value { "true" } else { "false" }, &[])?;
            }
        }
        if let Some(tradition) = &attrs.tradition {
            self.text("tradition", tradition, &[])?;
        }

        self.close("attributes")
    }

    fn metadata(&mut self, metadata: &Metadata) -> Result<(), EncodeError> {
        self.open("metadata", &[])?;
        self.text("source", &metadata.source, &[])?;
        self.text("index", &metadata.index.to_string(), &[])?;
        if let Some(from) = &metadata.inherited_from {
            self.text("inheritedFrom", from, &[])?;
        }
        if let Some(parent) = &metadata.parent {
            self.text("parent", parent, &[])?;
        }
        if let Some(subindex) = metadata.subindex {
            self.text("subindex", &subindex.to_string(), &[])?;
        }
        if let Some(kind) = metadata.kind {
            self.text("type", kind.as_str(), &[])?;
        }
        if metadata.needs_review {
            self.text("needsReview", "true", &[])?;
        }
        self.close("metadata")
    }
}
