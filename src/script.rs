//! Character classification for mixed-script dictionary text.
//!
//! Lemmas and plural forms are written in Syriac, glosses and markers in
//! Arabic, and pronunciations in Latin letters or IPA. Everything else is
//! treated as punctuation.

use unicode_normalization::char::is_combining_mark;

/// Script class of a single character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptClass {
    /// Syriac letters and marks (the headword script)
    Lemma,
    /// Arabic letters (the gloss script)
    Gloss,
    /// Latin letters, IPA extensions and phonetic modifiers
    LatinOrIpa,
    Digit,
    Punctuation,
    Whitespace,
}

impl ScriptClass {
    /// Classify one character. Unknown characters are punctuation.
    pub fn of(ch: char) -> ScriptClass {
        if ch.is_whitespace() {
            return ScriptClass::Whitespace;
        }
        if ch.is_ascii_digit() {
            return ScriptClass::Digit;
        }
        if ch.is_ascii_alphabetic() {
            return ScriptClass::LatinOrIpa;
        }

        let cp = ch as u32;
        match cp {
            // Syriac punctuation block and the rest of Syriac
            0x0700..=0x070D => ScriptClass::Punctuation,
            0x070E..=0x074F => ScriptClass::Lemma,

            // Arabic comma, semicolon, question mark, percent/decimal signs, full stop
            0x060C | 0x061B | 0x061F | 0x066A..=0x066D | 0x06D4 => ScriptClass::Punctuation,
            0x0660..=0x0669 | 0x06F0..=0x06F9 => ScriptClass::Digit,
            0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF => ScriptClass::Gloss,
            0xFB50..=0xFDFF | 0xFE70..=0xFEFF => ScriptClass::Gloss,

            // Latin-1 and Latin Extended letters (skips × and ÷)
            0x00C0..=0x024F if ch.is_alphabetic() => ScriptClass::LatinOrIpa,
            // IPA extensions, spacing modifiers (ː ˈ ˌ), combining diacritics, phonetic extensions
            0x0250..=0x036F | 0x1D00..=0x1DFF => ScriptClass::LatinOrIpa,

            _ => ScriptClass::Punctuation,
        }
    }

    /// True for classes that carry letters
    pub fn is_letter(self) -> bool {
        matches!(
            self,
            ScriptClass::Lemma | ScriptClass::Gloss | ScriptClass::LatinOrIpa
        )
    }
}

/// Combining marks and zero-width joiners extend the run they follow
pub(crate) fn attaches_to_previous(ch: char) -> bool {
    is_combining_mark(ch) || ch == '\u{200C}' || ch == '\u{200D}'
}

/// Maximal run of same-class characters, as byte offsets into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub class: ScriptClass,
    pub start: usize,
    pub end: usize,
}

impl Run {
    pub fn as_str<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    pub fn char_len(&self, text: &str) -> usize {
        self.as_str(text).chars().count()
    }
}

/// Split text into maximal same-class runs.
///
/// A combining mark that follows a non-whitespace run belongs to that run,
/// so a Syriac letter carrying a generic diacritic (seyame, tilde) stays a
/// single lemma-script run.
pub fn runs(text: &str) -> Vec<Run> {
    let mut out: Vec<Run> = Vec::new();

    for (i, ch) in text.char_indices() {
        let end = i + ch.len_utf8();
        let class = ScriptClass::of(ch);

        if let Some(last) = out.last_mut() {
            let joins = last.class == class
                || (attaches_to_previous(ch) && last.class != ScriptClass::Whitespace);
            if joins {
                last.end = end;
                continue;
            }
        }

        out.push(Run { class, start: i, end });
    }

    out
}

/// Longest maximal substring of the given class; ties go to the first occurrence
pub fn longest_run(text: &str, class: ScriptClass) -> Option<&str> {
    longest_run_span(text, class).map(|run| run.as_str(text))
}

/// Same as [`longest_run`], returning the run's position
pub fn longest_run_span(text: &str, class: ScriptClass) -> Option<Run> {
    let mut best: Option<(usize, Run)> = None;

    for run in runs(text).into_iter().filter(|r| r.class == class) {
        let len = run.char_len(text);
        match best {
            Some((best_len, _)) if best_len >= len => {}
            _ => best = Some((len, run)),
        }
    }

    best.map(|(_, run)| run)
}

/// True when any character of the text belongs to the class
pub fn contains_class(text: &str, class: ScriptClass) -> bool {
    text.chars().any(|ch| ScriptClass::of(ch) == class)
}

/// True when the text has at least one letter of any script
pub fn has_letter(text: &str) -> bool {
    text.chars().any(|ch| ScriptClass::of(ch).is_letter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // ─────────────────────────────────────────────────────────────
    // Single characters
    // ─────────────────────────────────────────────────────────────

    #[rstest]
    #[case('ܒ', ScriptClass::Lemma)]
    #[case('ܐ', ScriptClass::Lemma)]
    #[case('\u{0747}', ScriptClass::Lemma)]
    #[case('ب', ScriptClass::Gloss)]
    #[case('ج', ScriptClass::Gloss)]
    #[case('k', ScriptClass::LatinOrIpa)]
    #[case('ː', ScriptClass::LatinOrIpa)]
    #[case('ʃ', ScriptClass::LatinOrIpa)]
    #[case('é', ScriptClass::LatinOrIpa)]
    #[case('7', ScriptClass::Digit)]
    #[case('٣', ScriptClass::Digit)]
    #[case('،', ScriptClass::Punctuation)]
    #[case('؛', ScriptClass::Punctuation)]
    #[case('/', ScriptClass::Punctuation)]
    #[case('×', ScriptClass::Punctuation)]
    #[case('\u{0700}', ScriptClass::Punctuation)]
    #[case(' ', ScriptClass::Whitespace)]
    #[case('\u{00A0}', ScriptClass::Whitespace)]
    #[case('☃', ScriptClass::Punctuation)]
    fn classifies_character(#[case] ch: char, #[case] expected: ScriptClass) {
        assert_eq!(ScriptClass::of(ch), expected);
    }

    // ─────────────────────────────────────────────────────────────
    // Runs
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn runs_split_on_class_change() {
        let text = "ܒܝܬܐ بيت";
        let classes: Vec<ScriptClass> = runs(text).iter().map(|r| r.class).collect();
        assert_eq!(
            classes,
            vec![ScriptClass::Lemma, ScriptClass::Whitespace, ScriptClass::Gloss]
        );
    }

    #[test]
    fn combining_mark_stays_with_syriac_run() {
        // U+0308 (seyame) is a generic combining mark outside the Syriac block
        let text = "ܟ\u{0308}ܬܒܐ";
        let all = runs(text);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].class, ScriptClass::Lemma);
    }

    #[test]
    fn combining_mark_after_space_starts_its_own_run() {
        let text = " \u{0303}";
        let all = runs(text);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].class, ScriptClass::LatinOrIpa);
    }

    #[test]
    fn runs_empty_text() {
        assert!(runs("").is_empty());
    }

    // ─────────────────────────────────────────────────────────────
    // longest_run
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn longest_run_picks_longest() {
        assert_eq!(
            longest_run("ab بيت kaːsa", ScriptClass::LatinOrIpa),
            Some("kaːsa")
        );
    }

    #[test]
    fn longest_run_ties_go_to_first() {
        assert_eq!(longest_run("abc xyz", ScriptClass::LatinOrIpa), Some("abc"));
    }

    #[test]
    fn longest_run_none_when_class_absent() {
        assert_eq!(longest_run("بيت منزل", ScriptClass::LatinOrIpa), None);
    }

    #[test]
    fn longest_run_counts_characters_not_bytes() {
        // "ʃʃ" is 4 bytes but 2 chars; "abc" is 3 chars
        assert_eq!(longest_run("ʃʃ abc", ScriptClass::LatinOrIpa), Some("abc"));
    }

    #[test]
    fn letter_detection() {
        assert!(has_letter(" - بيت"));
        assert!(!has_letter(" - ، 12 "));
        assert!(contains_class("x ܒ", ScriptClass::Lemma));
    }
}
