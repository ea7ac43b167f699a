//! Paragraph records from dictionary documents.
//!
//! Two layouts are accepted: plain text with one paragraph per line, and
//! JSONL with one [`Paragraph`] record per line. Either may be bzip2
//! compressed (`.bz2`).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bzip2::read::BzDecoder;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ReadError;
use crate::session::Paragraph;

const READ_BUFFER: usize = 256 * 1024;

lazy_static! {
    static ref BULLET_PREFIX: Regex = Regex::new(r"^\s*[•◦▪‣]").unwrap();
    static ref DASH_PREFIX: Regex =
        Regex::new(r"^\s*(?:[•◦▪‣]+\s*)?[-\x{2013}\x{2014}]\s").unwrap();
}

fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "bz2")
}

// Path with a trailing `.bz2` removed
fn uncompressed_name(path: &Path) -> &Path {
    if is_compressed(path) {
        Path::new(path.file_stem().unwrap_or(path.as_os_str()))
    } else {
        Path::new(path.file_name().unwrap_or(path.as_os_str()))
    }
}

/// Buffered reader over the file, decompressing `.bz2` input
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>, ReadError> {
    let file = File::open(path).map_err(|source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader: Box<dyn BufRead> = if is_compressed(path) {
        Box::new(BufReader::with_capacity(READ_BUFFER, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(READ_BUFFER, file))
    };
    Ok(reader)
}

/// Read every paragraph of a document
pub fn read_paragraphs(path: &Path) -> Result<Vec<Paragraph>, ReadError> {
    let reader = open_input(path)?;
    let is_jsonl = uncompressed_name(path)
        .extension()
        .is_some_and(|ext| ext == "jsonl");

    if is_jsonl {
        parse_jsonl_paragraphs(reader)
    } else {
        parse_text_paragraphs(reader)
    }
}

/// Classify one plain-text line
pub fn paragraph_from_line(line: &str) -> Paragraph {
    Paragraph {
        text: line.trim().to_string(),
        bulleted: BULLET_PREFIX.is_match(line),
        dash_prefixed: DASH_PREFIX.is_match(line),
        pos: None,
    }
}

/// One paragraph per non-blank line
pub fn parse_text_paragraphs(reader: impl BufRead) -> Result<Vec<Paragraph>, ReadError> {
    let mut paragraphs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        paragraphs.push(paragraph_from_line(&line));
    }
    Ok(paragraphs)
}

/// One JSON paragraph record per non-blank line
pub fn parse_jsonl_paragraphs(reader: impl BufRead) -> Result<Vec<Paragraph>, ReadError> {
    let mut paragraphs = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let paragraph: Paragraph = serde_json::from_str(&line)
            .map_err(|source| ReadError::Record { line: i + 1, source })?;
        paragraphs.push(paragraph);
    }
    Ok(paragraphs)
}

/// Label used in entry ids: the file name without compression and format
/// extensions (`dict.txt.bz2` → `dict`)
pub fn source_label(path: &Path) -> String {
    let name = uncompressed_name(path);
    name.file_stem()
        .unwrap_or(name.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// File name recorded as `metadata.source`
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}
