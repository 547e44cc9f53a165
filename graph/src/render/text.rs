use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Abbreviated commit ids shown next to the graph
pub const SHORT_ID_LEN: usize = 8;

/// Terminal columns a string occupies
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// First `SHORT_ID_LEN` characters of an id
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Cut text to `max_width` columns on grapheme boundaries, ending in `…`
/// when anything was dropped
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut result = String::new();
    let mut width = 0;
    for grapheme in text.graphemes(true) {
        let grapheme_width = UnicodeWidthStr::width(grapheme);
        // Keep one column for the ellipsis
        if width + grapheme_width + 1 > max_width {
            break;
        }
        result.push_str(grapheme);
        width += grapheme_width;
    }
    result.push('…');
    result
}

/// Left-align text in exactly `width` columns
pub fn pad_to_width(text: &str, width: usize) -> String {
    let text = truncate_to_width(text, width);
    let padding = width.saturating_sub(display_width(&text));
    format!("{}{}", text, " ".repeat(padding))
}

/// `<short id> <summary>` fitted into `max_width` columns
pub fn commit_label(id: &str, summary: &str, max_width: usize) -> String {
    let id = short_id(id);
    if summary.is_empty() {
        return truncate_to_width(id, max_width);
    }
    let room = max_width.saturating_sub(display_width(id) + 1);
    format!("{} {}", id, truncate_to_width(summary, room))
}
