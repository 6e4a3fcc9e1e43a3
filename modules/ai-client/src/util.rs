/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Route `target` through a proxy prefix.
///
/// Prefixes ending in `=` take the target as a query value and get it
/// percent-encoded; any other prefix has the raw URL appended.
pub fn proxied_url(prefix: &str, target: &str) -> String {
    if prefix.ends_with('=') {
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        format!("{prefix}{encoded}")
    } else {
        format!("{prefix}{target}")
    }
}
