// Identifier codec - turns origin-obfuscated locators into paths/URLs
//
// The origin hides provider locators behind a two-character substitution.
// Decoding walks the payload pair by pair; pairs outside the table are kept
// verbatim, and a trailing odd character is kept as-is. Decoding never fails.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

/// Substitution table: encoded pair -> plain character
const SUBSTITUTIONS: &[(&str, char)] = &[
    ("01", '9'),
    ("08", '0'),
    ("05", '='),
    ("0a", '2'),
    ("0b", '3'),
    ("0c", '4'),
    ("07", '?'),
    ("00", '8'),
    ("5c", 'd'),
    ("0f", '7'),
    ("5e", 'f'),
    ("17", '/'),
    ("54", 'l'),
    ("09", '1'),
    ("48", 'p'),
    ("4f", 'w'),
    ("0e", '6'),
    ("5b", 'c'),
    ("5d", 'e'),
    ("0d", '5'),
    ("53", 'k'),
    ("1e", '&'),
    ("5a", 'b'),
    ("59", 'a'),
    ("4a", 'r'),
    ("4c", 't'),
    ("4e", 'v'),
    ("57", 'o'),
    ("51", 'i'),
];

/// Relative API segment whose endpoint always answers JSON
const CLOCK_SEGMENT: &str = "/clock";
const JSON_SUFFIX: &str = ".json";

lazy_static! {
    static ref TABLE: HashMap<&'static str, char> = SUBSTITUTIONS.iter().copied().collect();
    static ref SCHEME_RE: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").unwrap();
}

/// All known `(pair, character)` substitutions
pub fn substitutions() -> impl Iterator<Item = (&'static str, char)> {
    SUBSTITUTIONS.iter().copied()
}

/// Decode an obfuscated payload (marker already stripped)
pub fn decode(encoded: &str) -> String {
    let chars: Vec<char> = encoded.chars().collect();
    let mut decoded = String::with_capacity(chars.len() / 2 + 1);

    for chunk in chars.chunks(2) {
        if chunk.len() < 2 {
            decoded.push(chunk[0]);
            continue;
        }
        let pair: String = chunk.iter().collect();
        match TABLE.get(pair.as_str()) {
            Some(plain) => decoded.push(*plain),
            None => decoded.push_str(&pair),
        }
    }

    normalize_clock(&decoded)
}

/// Whether the string starts with a URL scheme (`https://`, `http://`, ...)
pub fn has_scheme(value: &str) -> bool {
    SCHEME_RE.is_match(value)
}

/// `/clock` ends a path segment but lacks the `.json` extension the
/// endpoint actually serves; add it wherever the segment ends.
fn normalize_clock(decoded: &str) -> String {
    let mut out = String::with_capacity(decoded.len() + JSON_SUFFIX.len());
    let mut rest = decoded;

    while let Some(pos) = rest.find(CLOCK_SEGMENT) {
        let end = pos + CLOCK_SEGMENT.len();
        out.push_str(&rest[..end]);
        let tail = &rest[end..];
        let segment_ends = tail.is_empty() || tail.starts_with('?') || tail.starts_with('#');
        if segment_ends {
            out.push_str(JSON_SUFFIX);
        }
        rest = tail;
    }
    out.push_str(rest);
    out
}
