//! Encoding repair
//!
//! Two concerns live here:
//! - [`RepairTable`]: undo UTF-8 text that was decoded as Windows-1252
//!   (`artÃ­culo` → `artículo`)
//! - [`decode_text`]: turn raw file bytes (UTF-8, UTF-8 with BOM, UTF-16 with
//!   BOM) into a `String`
//!
//! # Table ordering
//!
//! The canonical table is applied top to bottom, once. Three-character
//! sequences (`â€?`) run before two-character ones, and any entry whose output
//! completes another entry's pattern runs before that entry: `â€œ` produces
//! `“`, which is the tail of both `â€“` and `Ã“`; `Â¡` produces `¡`, the tail
//! of `Ã¡`. The one remaining self-feeding case is a run of `Â` prefixes
//! (`ÂÂ¿`, from text that was mis-decoded twice), so [`RepairTable::repair`]
//! repeats the pass until nothing matches. Every changing pass shortens the
//! text, so the loop terminates, and the result is a fixed point.

use crate::error::DecodeError;
use crate::rule::{Edit, RuleSet};
use std::borrow::Cow;

/// Canonical (corrupted, correct) pairs, in application order
pub const CANONICAL_REPAIRS: &[(&str, &str)] = &[
    // E2 80 xx punctuation read as â € x
    ("\u{e2}\u{20ac}\u{153}", "\u{201c}"),  // “
    ("\u{e2}\u{20ac}\u{2dc}", "\u{2018}"),  // ‘
    ("\u{e2}\u{20ac}\u{2122}", "\u{2019}"), // ’
    ("\u{e2}\u{20ac}\u{a6}", "\u{2026}"),   // …
    ("\u{e2}\u{20ac}\u{201d}", "\u{2014}"), // —
    ("\u{e2}\u{20ac}\u{201c}", "\u{2013}"), // –
    // C2 xx read as Â x
    ("\u{c2}\u{bf}", "\u{bf}"), // ¿
    ("\u{c2}\u{a1}", "\u{a1}"), // ¡
    ("\u{c2}\u{ba}", "\u{ba}"), // º
    ("\u{c2}\u{b0}", "\u{b0}"), // °
    // C3 xx read as Ã x
    ("\u{c3}\u{a1}", "\u{e1}"),   // á
    ("\u{c3}\u{a9}", "\u{e9}"),   // é
    ("\u{c3}\u{ad}", "\u{ed}"),   // í
    ("\u{c3}\u{b3}", "\u{f3}"),   // ó
    ("\u{c3}\u{ba}", "\u{fa}"),   // ú
    ("\u{c3}\u{b1}", "\u{f1}"),   // ñ
    ("\u{c3}\u{bc}", "\u{fc}"),   // ü
    ("\u{c3}\u{2030}", "\u{c9}"), // É
    ("\u{c3}\u{2018}", "\u{d1}"), // Ñ
    ("\u{c3}\u{201c}", "\u{d3}"), // Ó
    ("\u{c3}\u{161}", "\u{da}"),  // Ú
];

/// Ordered table of mis-decoding repairs
#[derive(Debug, Clone, Copy)]
pub struct RepairTable {
    pairs: &'static [(&'static str, &'static str)],
}

impl Default for RepairTable {
    fn default() -> Self {
        Self::canonical()
    }
}

impl RepairTable {
    /// The canonical table
    #[inline]
    #[must_use]
    pub fn canonical() -> Self {
        Self {
            pairs: CANONICAL_REPAIRS,
        }
    }

    /// Table entries in application order
    #[inline]
    #[must_use]
    pub fn pairs(&self) -> &'static [(&'static str, &'static str)] {
        self.pairs
    }

    /// Repair `text`, borrowing when it is already clean
    #[must_use]
    pub fn repair<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(text);
        loop {
            let mut changed = false;
            for (corrupted, correct) in self.pairs {
                if out.contains(corrupted) {
                    out = Cow::Owned(out.replace(corrupted, correct));
                    changed = true;
                }
            }
            if !changed {
                return out;
            }
        }
    }

    /// Whether any corrupted sequence occurs in `text`
    #[must_use]
    pub fn is_corrupted(&self, text: &str) -> bool {
        self.pairs.iter().any(|(corrupted, _)| text.contains(corrupted))
    }

    /// The table as a single edit, for mixing with other rule sets
    #[must_use]
    pub fn to_rule_set(&self) -> RuleSet {
        RuleSet::new().with(Edit::Repair(*self))
    }
}

/// Byte encoding detected by [`decode_text`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// Plain UTF-8
    Utf8,
    /// UTF-8 preceded by `EF BB BF`
    Utf8Bom,
    /// UTF-16 little endian (`FF FE`)
    Utf16Le,
    /// UTF-16 big endian (`FE FF`)
    Utf16Be,
}

/// Decoded file text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// Text without any byte order mark
    pub text: String,
    /// Encoding found on disk
    pub source: SourceEncoding,
}

impl DecodedText {
    /// Whether writing `text` back as UTF-8 would change the file
    #[inline]
    #[must_use]
    pub fn needs_rewrite(&self) -> bool {
        self.source != SourceEncoding::Utf8
    }
}

/// Decode raw bytes, detecting UTF-16 and UTF-8 byte order marks
///
/// # Errors
/// `DecodeError` when the payload is not valid in the detected encoding.
pub fn decode_text(bytes: &[u8]) -> Result<DecodedText, DecodeError> {
    let (text, source) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (decode_utf16(rest, u16::from_le_bytes, "LE")?, SourceEncoding::Utf16Le),
        [0xFE, 0xFF, rest @ ..] => (decode_utf16(rest, u16::from_be_bytes, "BE")?, SourceEncoding::Utf16Be),
        [0xEF, 0xBB, 0xBF, rest @ ..] => (decode_utf8(rest)?, SourceEncoding::Utf8Bom),
        _ => (decode_utf8(bytes)?, SourceEncoding::Utf8),
    };
    // A second BOM left behind by an earlier bad conversion
    let text = match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    };
    Ok(DecodedText { text, source })
}

fn decode_utf8(bytes: &[u8]) -> Result<String, DecodeError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| DecodeError::InvalidUtf8 {
        valid_up_to: e.utf8_error().valid_up_to(),
    })
}

fn decode_utf16(
    bytes: &[u8],
    unit: fn([u8; 2]) -> u16,
    endian: &'static str,
) -> Result<String, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddUtf16Length(bytes.len()));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| DecodeError::InvalidUtf16(endian))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_accented_words() {
        let table = RepairTable::canonical();
        assert_eq!(table.repair("art\u{c3}\u{ad}culo"), "artículo");
        assert_eq!(table.repair("optimizaci\u{c3}\u{b3}n"), "optimización");
        assert_eq!(table.repair("espa\u{c3}\u{b1}ol"), "español");
        assert_eq!(table.repair("tambi\u{c3}\u{a9}n"), "también");
        assert_eq!(table.repair("m\u{c3}\u{a1}s"), "más");
        assert_eq!(table.repair("\u{c3}\u{ba}nico"), "único");
    }

    #[test]
    fn repairs_em_dash_before_shorter_sequences() {
        let table = RepairTable::canonical();
        assert_eq!(table.repair("Quito \u{e2}\u{20ac}\u{201d} Cuenca"), "Quito — Cuenca");
    }

    #[test]
    fn clean_text_is_borrowed() {
        let table = RepairTable::canonical();
        assert!(matches!(table.repair("artículo"), Cow::Borrowed(_)));
        assert!(!table.is_corrupted("artículo"));
        assert!(table.is_corrupted("art\u{c3}\u{ad}culo"));
    }

    #[test]
    fn chained_outputs_resolve_in_one_pass() {
        let table = RepairTable::canonical();
        // Â¡ yields ¡, which completes Ã¡
        let once = table.repair("\u{c3}\u{c2}\u{a1}").into_owned();
        assert_eq!(once, "á");
        assert_eq!(table.repair(&once), once);
    }

    #[test]
    fn doubly_prefixed_sequences_reach_a_fixed_point() {
        let table = RepairTable::canonical();
        assert_eq!(table.repair("\u{c2}\u{c2}\u{bf}Qu\u{c3}\u{a9}?"), "¿Qué?");
    }

    #[test]
    fn rule_set_matches_table() {
        let table = RepairTable::canonical();
        let rules = table.to_rule_set();
        assert_eq!(rules.names(), vec!["encoding repair"]);
        let input = "gu\u{c3}\u{ad}a \u{c2}\u{bf}qu\u{c3}\u{a9}?";
        let outcome = rules.apply(input);
        assert_eq!(outcome.text, table.repair(input));
        assert_eq!(outcome.fired, vec!["encoding repair".to_string()]);
    }

    #[test]
    fn decodes_plain_utf8() {
        let decoded = decode_text("hola".as_bytes()).unwrap();
        assert_eq!(decoded.text, "hola");
        assert!(!decoded.needs_rewrite());
    }

    #[test]
    fn strips_utf8_bom() {
        let decoded = decode_text(&[0xEF, 0xBB, 0xBF, b'h', b'i']).unwrap();
        assert_eq!(decoded.text, "hi");
        assert_eq!(decoded.source, SourceEncoding::Utf8Bom);
        assert!(decoded.needs_rewrite());
    }

    #[test]
    fn decodes_utf16_both_endians() {
        let le = [0xFF, 0xFE, b'o', 0x00, b'k', 0x00];
        assert_eq!(decode_text(&le).unwrap().text, "ok");
        let be = [0xFE, 0xFF, 0x00, b'o', 0x00, b'k'];
        let decoded = decode_text(&be).unwrap();
        assert_eq!(decoded.text, "ok");
        assert_eq!(decoded.source, SourceEncoding::Utf16Be);
    }

    #[test]
    fn rejects_invalid_payloads() {
        assert_eq!(
            decode_text(&[b'a', 0xFF, b'b']).unwrap_err(),
            DecodeError::InvalidUtf8 { valid_up_to: 1 }
        );
        assert_eq!(
            decode_text(&[0xFF, 0xFE, b'a']).unwrap_err(),
            DecodeError::OddUtf16Length(1)
        );
        // lone high surrogate
        assert_eq!(
            decode_text(&[0xFF, 0xFE, 0x00, 0xD8]).unwrap_err(),
            DecodeError::InvalidUtf16("LE")
        );
    }
}
