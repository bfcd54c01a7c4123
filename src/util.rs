/// Upper bound for response bodies copied into log lines.
pub(crate) const MAX_LOGGED_BODY_BYTES: usize = 2048;

/// Cut `text` to at most `max_bytes`, never splitting a UTF-8 character.
pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated.push_str("...");
    truncated
}
