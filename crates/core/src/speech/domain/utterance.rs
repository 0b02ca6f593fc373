/// Lead-ins people put before their name, lowercase.
const NAME_PREFIXES: &[&str] = &["my name is", "call me", "i'm", "i am", "it's", "this is"];

/// Extracts a display name from a recognized utterance.
///
/// Strips one common lead-in and trailing punctuation. Returns `None` when
/// nothing usable is left.
pub fn name_from_utterance(utterance: &str) -> Option<String> {
    let mut text = utterance.trim();
    let lower = text.to_lowercase();
    for prefix in NAME_PREFIXES {
        if lower.starts_with(prefix) && text.is_char_boundary(prefix.len()) {
            let rest = &text[prefix.len()..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                text = rest;
                break;
            }
        }
    }
    let name = text
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
