//! Text cleaning applied to extracted region strings.
//!
//! Word text is full of in-band control characters: cell marks, field
//! boundaries, picture anchors, line and page breaks. Cleaning maps the
//! printable ones to their plain-text equivalents, collapses field
//! instructions down to their cached result text, and drops what remains of
//! the low control range.

use once_cell::sync::Lazy;
use regex::Regex;

/// A field is \x13 instruction \x14 result \x15; keep only the result.
static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x13[^\x13\x14\x15]*\x14?([^\x13\x14\x15]*)\x15").expect("field regex")
});

/// Clean one extracted region string.
///
/// The order matters: breaks are normalized first so field results keep
/// their newlines, fields are collapsed innermost-first until none remain,
/// and only then is the residual control range dropped (NUL padding from
/// deleted runs and blanked header boundaries included).
pub(crate) fn clean_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2}' | '\u{5}' | '\u{8}' => {},
            '\u{7}' => result.push('\t'),
            '\u{A}' | '\u{B}' | '\u{C}' | '\u{D}' => result.push('\n'),
            '\u{1E}' => result.push('\u{2011}'),
            _ => result.push(c),
        }
    }

    // Nested fields collapse from the inside out, one level per pass
    while FIELD_RE.is_match(&result) {
        result = FIELD_RE.replace_all(&result, "$1").into_owned();
    }

    result.retain(|c| c > '\u{7}');
    result
}

/// Replace common Unicode punctuation with ASCII equivalents.
pub(crate) fn filter_unicode(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2002}' | '\u{2003}' => ' ',
            '\u{2012}' | '\u{2013}' | '\u{2014}' => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            _ => c,
        })
        .collect()
}
