//! Cell text normalisation

/// Entity text that survives when the registry double-encodes a non-breaking space.
const NBSP_ENTITY: &str = "&nbsp;";

/// Returns true for characters trimmed from the edges of cell text.
///
/// `char::is_whitespace` covers the Unicode `White_Space` property, which
/// already includes U+00A0 and the other fixed-width spaces. Zero-width space
/// and BOM are not `White_Space` but show up around registry values.
fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == '\u{200B}' || c == '\u{FEFF}'
}

/// Normalises a raw cell value into the string stored on a record.
///
/// Strips blank characters and literal `&nbsp;` entities from both ends.
/// Interior content is left untouched.
pub fn normalize_text(raw: &str) -> String {
    let mut s = raw.trim_matches(is_blank);

    loop {
        let before = s.len();
        if let Some(rest) = s.strip_prefix(NBSP_ENTITY) {
            s = rest.trim_start_matches(is_blank);
        }
        if let Some(rest) = s.strip_suffix(NBSP_ENTITY) {
            s = rest.trim_end_matches(is_blank);
        }
        if s.len() == before {
            break;
        }
    }

    s.to_string()
}
