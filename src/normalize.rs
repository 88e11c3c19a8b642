use once_cell::sync::Lazy;
use regex::Regex;

// Horizontal whitespace only; newlines are handled by BLANK_LINES_RE
static HORIZONTAL_WS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\S\n]{2,}").expect("Invalid horizontal whitespace regex pattern")
});

// A line break followed by two or more (possibly whitespace-only) empty lines
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n(?:[^\S\n]*\n){2,}").expect("Invalid blank line regex pattern")
});

/// Normalize extracted text.
///
/// Unifies line endings, collapses runs of horizontal whitespace to a single
/// space, collapses three or more consecutive line breaks to one blank line
/// and trims both ends. The result is a fixed point: normalizing it again
/// returns the same string.
pub fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = HORIZONTAL_WS_RE.replace_all(&unified, " ");
    let paragraphs = BLANK_LINES_RE.replace_all(&collapsed, "\n\n");
    paragraphs.trim().to_string()
}

/// Length in characters, which is what every content threshold is measured in
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Truncate text to max chars, breaking at a word boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    match truncated.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => format!("{}...", truncated[..pos].trim_end()),
        _ => format!("{}...", truncated),
    }
}
