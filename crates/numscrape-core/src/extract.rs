//! Phone-number-like candidate extraction.
//!
//! Finds standalone runs of 10-13 ASCII digits, keeps the trailing 10 digits
//! (dropping a country code or trunk prefix) and accepts them only when they
//! start with a mobile prefix digit. No carrier or region validation happens here.

use std::{fmt, ops::RangeInclusive};

use unicode_normalization::char::is_combining_mark;

/// Accepted length of a digit run, before normalization.
const RUN_LEN: RangeInclusive<usize> = 10..=13;

/// Length of a normalized candidate.
pub const CANDIDATE_LEN: usize = 10;

/// Leading digits accepted for a normalized candidate.
const MOBILE_PREFIXES: [char; 4] = ['6', '7', '8', '9'];

/// A normalized 10-digit mobile-number-shaped string.
///
/// Only constructible through extraction, so every value upholds the length and
/// prefix invariant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Candidate(String);

impl Candidate {
    fn from_run(run: &str) -> Option<Self> {
        // Runs are ASCII-only, so byte slicing is char slicing.
        let tail = &run[run.len().checked_sub(CANDIDATE_LEN)?..];
        if !tail.starts_with(MOBILE_PREFIXES) {
            return None;
        }
        Some(Self(tail.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract candidates from `text` in order of appearance, duplicates included.
pub fn extract_candidates(text: &str) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if !c.is_ascii_digit() {
            prev = Some(c);
            continue;
        }

        // Consume the whole run so a 14+ digit token never yields a partial match.
        let mut end = start + 1;
        let mut last = c;
        while let Some(&(i, d)) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            end = i + 1;
            last = d;
            chars.next();
        }
        let next = chars.peek().map(|&(_, ch)| ch);

        let run = &text[start..end];
        if RUN_LEN.contains(&run.len()) && is_boundary(prev) && is_boundary(next) {
            if let Some(candidate) = Candidate::from_run(run) {
                out.push(candidate);
            }
        }
        prev = Some(last);
    }

    out
}

fn is_boundary(neighbor: Option<char>) -> bool {
    !neighbor.is_some_and(is_word_char)
}

// Letters and digits of any script, plus `_`, glue a digit run into a larger token.
// Combining marks (vowel signs, accents) are alphabetic to std but not word
// characters: "की9876543210" still holds a standalone number.
fn is_word_char(c: char) -> bool {
    (c.is_alphanumeric() && !is_combining_mark(c)) || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(v: Vec<Candidate>) -> Vec<String> {
        v.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn strips_country_code_from_long_runs() {
        assert_eq!(strs(extract_candidates("9198765432109")), vec!["8765432109"]);
        assert_eq!(strs(extract_candidates("+919876543210")), vec!["9876543210"]);
        assert_eq!(strs(extract_candidates("09876543210")), vec!["9876543210"]);
    }

    #[test]
    fn ignores_short_runs() {
        assert!(extract_candidates("12345").is_empty());
        assert!(extract_candidates("987654321").is_empty());
        assert!(extract_candidates("").is_empty());
    }

    #[test]
    fn runs_longer_than_thirteen_digits_are_not_truncated() {
        assert!(extract_candidates("98765432109876").is_empty());
        assert!(extract_candidates("id 123456789012345678 done").is_empty());
    }

    #[test]
    fn drops_candidates_without_mobile_prefix() {
        assert!(extract_candidates("5876543210").is_empty());
        // 13 digits whose trailing ten start with 1.
        assert!(extract_candidates("9191234567890").is_empty());
        assert_eq!(strs(extract_candidates("6000000000")), vec!["6000000000"]);
    }

    #[test]
    fn requires_word_boundaries() {
        assert!(extract_candidates("ID9876543210").is_empty());
        assert!(extract_candidates("9876543210abc").is_empty());
        assert!(extract_candidates("_9876543210").is_empty());
        // Non-ASCII digits are word characters too.
        assert!(extract_candidates("٣9876543210").is_empty());

        assert_eq!(
            strs(extract_candidates("(9876543210), [8123456789].")),
            vec!["9876543210", "8123456789"]
        );
        assert_eq!(
            strs(extract_candidates("नंबर: 7012345678।")),
            vec!["7012345678"]
        );
    }

    #[test]
    fn combining_marks_do_not_glue_runs() {
        // U+0940 DEVANAGARI VOWEL SIGN II is a spacing mark (Mc).
        assert_eq!(strs(extract_candidates("की9876543210")), vec!["9876543210"]);
        assert_eq!(strs(extract_candidates("9876543210ी")), vec!["9876543210"]);
        // U+0301 COMBINING ACUTE ACCENT (Mn).
        assert_eq!(strs(extract_candidates("9876543210\u{301}")), vec!["9876543210"]);
        // The base letter before the mark still glues.
        assert!(extract_candidates("क9876543210").is_empty());
    }

    #[test]
    fn keeps_order_and_duplicates() {
        let text = "Jio: 9876543210\nAirtel: 918123456789\nAgain: 9876543210";
        assert_eq!(
            strs(extract_candidates(text)),
            vec!["9876543210", "8123456789", "9876543210"]
        );
    }

    #[test]
    fn separators_split_numbers() {
        // Formatted numbers are several short runs, none of which qualify.
        assert!(extract_candidates("98765 43210").is_empty());
        assert!(extract_candidates("987-654-3210").is_empty());
    }

    #[test]
    fn every_candidate_upholds_invariant_and_extraction_is_pure() {
        let text = "x 9876543210 y 919812345678 z 5123456789 0919912345678 \
                    +91-9876543210 12:30 2024-01-01 00919876543210 7777777777";
        let first = extract_candidates(text);
        assert!(!first.is_empty());
        for c in &first {
            assert_eq!(c.as_str().len(), CANDIDATE_LEN);
            assert!(c.as_str().chars().all(|ch| ch.is_ascii_digit()));
            assert!(c.as_str().starts_with(MOBILE_PREFIXES));
        }
        assert_eq!(first, extract_candidates(text));
    }
}
