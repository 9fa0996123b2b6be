/// Placeholder sent instead of an empty field; Telegram rejects empty titles.
pub const EMPTY_TEXT: &str = "No Text";

/// Cut `s` to at most `max_bytes` bytes without splitting a code point.
///
/// Strings strictly shorter than the budget pass through untouched, an empty
/// string becomes [`EMPTY_TEXT`].
pub fn truncate(s: &str, max_bytes: usize) -> &str {
    if s.is_empty() {
        return EMPTY_TEXT;
    }
    if s.len() < max_bytes {
        return s;
    }
    let mut cut = max_bytes;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    &s[..cut]
}

/// JSON-escape `s` (without the surrounding quotes) and cut the escaped form
/// to `max_bytes`.
///
/// The budget bounds the escaped text, so `"` costs two bytes. A cut never
/// leaves half of an escape sequence behind.
pub fn escape(s: &str, max_bytes: usize) -> String {
    let encoded = serde_json::to_string(s).unwrap_or_default();
    let inner = encoded
        .strip_prefix('"')
        .and_then(|e| e.strip_suffix('"'))
        .unwrap_or("");
    drop_partial_escape(truncate(inner, max_bytes)).to_owned()
}

fn drop_partial_escape(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let len = if bytes.get(i + 1) == Some(&b'u') { 6 } else { 2 };
            if i + len > bytes.len() {
                // escapes are ASCII, so `i` is a char boundary
                return &s[..i];
            }
            i += len;
        } else {
            i += 1;
        }
    }
    s
}
