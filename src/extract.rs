//! Field extraction from one paragraph of dictionary text.
//!
//! Each extractor takes the working text and returns what it found plus
//! the remaining text for the next stage. The builder runs them in a fixed
//! order: parentheticals, lemma, plurals, IPA, part of speech, senses.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::entry::Sense;
use crate::markers::{MarkerEffect, MarkerTable, TATWEEL};
use crate::script::{self, contains_class, has_letter, longest_run_span, runs, ScriptClass};

/// Standalone Arabic letter introducing plural forms
pub const PLURAL_MARKER: char = 'ج';

const PLURAL_SEPARATORS: &[char] = &['،', ',', '/', '؛', ';'];
const SENSE_SEPARATORS: &[char] = &['/', '؛', ';'];
const SYNONYM_SEPARATOR: char = '.';

// Stripped from both ends of sense and synonym pieces
const EDGE_PUNCTUATION: &[char] = &['،', ',', ':', '-', '\u{2013}', '\u{2014}', '•'];

lazy_static! {
    static ref MULTISPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref PAREN_SPAN: Regex = Regex::new(r"\(([^()]*)\)").unwrap();
    static ref GUILLEMET_SPAN: Regex = Regex::new(r"«([^«»]*)»").unwrap();
    static ref LEADING_BULLET: Regex = Regex::new(r"^\s*[•◦▪‣]+\s*").unwrap();
    static ref LEADING_DASH: Regex = Regex::new(r"^\s*[-\x{2013}\x{2014}]\s*").unwrap();
    static ref TOKEN: Regex = Regex::new(r"\S+").unwrap();
}

/// Collapse whitespace runs to one space and trim
pub fn squeeze(text: &str) -> String {
    MULTISPACE.replace_all(text.trim(), " ").into_owned()
}

/// Remove `text[start..end]`, keeping the neighbours apart
fn cut(text: &str, start: usize, end: usize) -> String {
    squeeze(&format!("{} {}", &text[..start], &text[end..]))
}

/// NFC, drop tatweel, strip the leading bullet glyph and dash marker,
/// collapse whitespace
pub fn normalize_paragraph(raw: &str) -> String {
    let text: String = raw.nfc().filter(|&c| c != TATWEEL).collect();
    let text = LEADING_BULLET.replace(&text, "");
    let text = LEADING_DASH.replace(&text, "");
    squeeze(&text)
}

// ─────────────────────────────────────────────────────────────────────────────
// Parentheticals
// ─────────────────────────────────────────────────────────────────────────────

/// Markers and notes found in `(...)` and `«...»` spans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parentheticals {
    /// Recognized marker effects, in order of appearance
    pub effects: Vec<MarkerEffect>,
    /// Unrecognized or over-long span contents, in order of appearance
    pub notes: Vec<String>,
}

impl Parentheticals {
    pub fn inherits(&self) -> bool {
        self.effects.contains(&MarkerEffect::InheritPrevious)
    }
}

struct Span<'a> {
    start: usize,
    end: usize,
    inner: &'a str,
    // Only parentheses are looked up in the marker table
    parenthesized: bool,
}

/// Pull every `(...)` and `«...»` span out of the text.
///
/// Parenthesized tokens found in the marker table become effects; anything
/// else (including text over the table's length cap) becomes a note.
pub fn scan_parentheticals(text: &str, table: &MarkerTable) -> (Parentheticals, String) {
    let mut spans: Vec<Span> = Vec::new();
    for (pattern, parenthesized) in [(&*PAREN_SPAN, true), (&*GUILLEMET_SPAN, false)] {
        for cap in pattern.captures_iter(text) {
            if let (Some(whole), Some(inner)) = (cap.get(0), cap.get(1)) {
                spans.push(Span {
                    start: whole.start(),
                    end: whole.end(),
                    inner: inner.as_str(),
                    parenthesized,
                });
            }
        }
    }
    spans.sort_by_key(|s| s.start);

    let mut found = Parentheticals::default();
    let mut remaining = String::with_capacity(text.len());
    let mut cursor = 0;

    for span in spans {
        // Nested inside an earlier span
        if span.start < cursor {
            continue;
        }
        remaining.push_str(&text[cursor..span.start]);
        remaining.push(' ');
        cursor = span.end;

        let inner = span.inner.trim();
        if inner.is_empty() {
            continue;
        }

        let effect = if span.parenthesized {
            table.classify(inner)
        } else {
            None
        };
        match effect {
            Some(effect) => found.effects.push(effect.clone()),
            None => found.notes.push(squeeze(inner)),
        }
    }
    remaining.push_str(&text[cursor..]);

    (found, squeeze(&remaining))
}

// ─────────────────────────────────────────────────────────────────────────────
// Lemma
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lemma {
    pub text: String,
    /// Written with a leading `*`
    pub foreign: bool,
}

/// First lemma-script run, extended over following lemma-script words
pub fn extract_lemma(text: &str) -> (Option<Lemma>, String) {
    let all = runs(text);
    let first = match all.iter().position(|r| r.class == ScriptClass::Lemma) {
        Some(i) => i,
        None => return (None, text.to_string()),
    };

    let mut last = first;
    while last + 2 < all.len()
        && all[last + 1].class == ScriptClass::Whitespace
        && all[last + 2].class == ScriptClass::Lemma
    {
        last += 2;
    }

    let start = all[first].start;
    let end = all[last].end;
    let lemma = squeeze(&text[start..end]);

    let before = text[..start].trim_end();
    let (cut_start, foreign) = match before.strip_suffix('*') {
        Some(rest) => (rest.len(), true),
        None => (start, false),
    };

    (
        Some(Lemma {
            text: lemma,
            foreign,
        }),
        cut(text, cut_start, end),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Plurals
// ─────────────────────────────────────────────────────────────────────────────

/// Plural forms introduced by a standalone `ج`.
///
/// The segment runs over lemma-script forms and the separators between
/// them, and ends after the last lemma-script character. Pieces without
/// lemma-script text are dropped. A `ج` with no forms after it is left in
/// place.
pub fn extract_plurals(text: &str) -> (Vec<String>, String) {
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (k, &(pos, ch)) in chars.iter().enumerate() {
        if ch != PLURAL_MARKER {
            continue;
        }

        let standalone_before = k == 0 || !ScriptClass::of(chars[k - 1].1).is_letter();
        let standalone_after = chars.get(k + 1).map_or(true, |&(_, next)| {
            let class = ScriptClass::of(next);
            !class.is_letter() || class == ScriptClass::Lemma
        });
        if !standalone_before || !standalone_after {
            continue;
        }

        let seg_start = pos + ch.len_utf8();
        let mut seg_end = seg_start;
        for &(p, c) in &chars[k + 1..] {
            let class = ScriptClass::of(c);
            if class == ScriptClass::Lemma
                || (script::attaches_to_previous(c) && seg_end == p && seg_end > seg_start)
            {
                seg_end = p + c.len_utf8();
            } else if class == ScriptClass::Whitespace || PLURAL_SEPARATORS.contains(&c) {
                continue;
            } else {
                break;
            }
        }
        if seg_end == seg_start {
            continue;
        }

        let forms: Vec<String> = text[seg_start..seg_end]
            .split(PLURAL_SEPARATORS)
            .map(squeeze)
            .filter(|form| contains_class(form, ScriptClass::Lemma))
            .collect();
        if forms.is_empty() {
            continue;
        }

        return (forms, cut(text, pos, seg_end));
    }

    (Vec::new(), text.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// IPA
// ─────────────────────────────────────────────────────────────────────────────

fn looks_like_ipa(inner: &str) -> bool {
    contains_class(inner, ScriptClass::LatinOrIpa)
        && !contains_class(inner, ScriptClass::Gloss)
        && !contains_class(inner, ScriptClass::Lemma)
}

/// Pronunciation: the first `/.../` or `[...]` span holding Latin/IPA text,
/// otherwise the longest Latin/IPA run
pub fn extract_ipa(text: &str) -> (Option<String>, String) {
    for (start, open) in text.char_indices() {
        let close = match open {
            '/' => '/',
            '[' => ']',
            _ => continue,
        };
        let inner_start = start + open.len_utf8();
        let inner_end = match text[inner_start..].find(close) {
            Some(offset) => inner_start + offset,
            None => continue,
        };

        let inner = text[inner_start..inner_end].trim();
        if looks_like_ipa(inner) {
            return (
                Some(inner.to_string()),
                cut(text, start, inner_end + close.len_utf8()),
            );
        }
    }

    match longest_run_span(text, ScriptClass::LatinOrIpa) {
        Some(run) => (
            Some(run.as_str(text).to_string()),
            cut(text, run.start, run.end),
        ),
        None => (None, text.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Part of speech
// ─────────────────────────────────────────────────────────────────────────────

/// First standalone part-of-speech word from the table's list
pub fn extract_pos(text: &str, table: &MarkerTable) -> (Option<String>, String) {
    match TOKEN
        .find_iter(text)
        .find(|m| table.is_part_of_speech(m.as_str()))
    {
        Some(m) => (Some(m.as_str().to_string()), cut(text, m.start(), m.end())),
        None => (None, text.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Senses
// ─────────────────────────────────────────────────────────────────────────────

/// Byte ranges covered by abbreviations, including their closing period.
///
/// An abbreviation must start at a token boundary and be followed by a
/// period, or contain a period itself and end at a token boundary. The
/// list is ordered longest first, so the longest match wins.
fn protected_ranges(text: &str, abbreviations: &[String]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut prev: Option<char> = None;
    let mut skip_until = 0;

    for (i, ch) in text.char_indices() {
        let at_boundary = prev.map_or(true, |p| !ScriptClass::of(p).is_letter());
        prev = Some(ch);
        if i < skip_until || !at_boundary {
            continue;
        }

        let rest = &text[i..];
        for abbreviation in abbreviations {
            if !rest.starts_with(abbreviation.as_str()) {
                continue;
            }
            let after = &rest[abbreviation.len()..];
            let end = if after.starts_with(SYNONYM_SEPARATOR) {
                i + abbreviation.len() + SYNONYM_SEPARATOR.len_utf8()
            } else if abbreviation.contains(SYNONYM_SEPARATOR)
                && after
                    .chars()
                    .next()
                    .map_or(true, |c| !ScriptClass::of(c).is_letter())
            {
                i + abbreviation.len()
            } else {
                continue;
            };
            ranges.push((i, end));
            skip_until = end;
            break;
        }
    }

    ranges
}

fn is_protected(ranges: &[(usize, usize)], pos: usize) -> bool {
    ranges.iter().any(|&(start, end)| pos >= start && pos < end)
}

fn clean_piece(piece: &str) -> String {
    squeeze(piece.trim_matches(|c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c)))
}

/// Split gloss text on `/`, `؛` and `;` into sense strings.
/// Pieces without any letters are dropped.
pub fn split_primary_senses(text: &str, abbreviations: &[String]) -> Vec<String> {
    let ranges = protected_ranges(text, abbreviations);
    let mut pieces = Vec::new();
    let mut start = 0;

    for (i, ch) in text.char_indices() {
        if SENSE_SEPARATORS.contains(&ch) && !is_protected(&ranges, i) {
            pieces.push(&text[start..i]);
            start = i + ch.len_utf8();
        }
    }
    pieces.push(&text[start..]);

    pieces
        .into_iter()
        .map(clean_piece)
        .filter(|p| has_letter(p))
        .collect()
}

/// Split one sense string on `.` into a gloss and its synonyms.
///
/// Periods closing an abbreviation, or sitting between two digits, do not
/// split. Returns `None` when nothing with letters is left.
pub fn split_synonyms(sense: &str, abbreviations: &[String]) -> Option<Sense> {
    let ranges = protected_ranges(sense, abbreviations);
    let chars: Vec<(usize, char)> = sense.char_indices().collect();
    let mut pieces = Vec::new();
    let mut start = 0;

    for (k, &(i, ch)) in chars.iter().enumerate() {
        if ch != SYNONYM_SEPARATOR || is_protected(&ranges, i) {
            continue;
        }
        let between_digits = k > 0
            && k + 1 < chars.len()
            && ScriptClass::of(chars[k - 1].1) == ScriptClass::Digit
            && ScriptClass::of(chars[k + 1].1) == ScriptClass::Digit;
        if between_digits {
            continue;
        }
        pieces.push(&sense[start..i]);
        start = i + ch.len_utf8();
    }
    pieces.push(&sense[start..]);

    let mut cleaned = pieces
        .into_iter()
        .map(clean_piece)
        .filter(|p| has_letter(p));
    let gloss = cleaned.next()?;
    Some(Sense::with_synonyms(gloss, cleaned.collect()))
}

/// Senses for the remaining gloss text
pub fn build_senses(text: &str, abbreviations: &[String]) -> Vec<Sense> {
    split_primary_senses(text, abbreviations)
        .iter()
        .filter_map(|sense| split_synonyms(sense, abbreviations))
        .collect()
}
