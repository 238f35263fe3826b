//! Shared rendering utilities.
//!
//! Everything here works in characters, not bytes: report names, locations
//! and labels are Spanish text with accents.

use crate::ui::theme::Theme;

/// Moves the cursor to a 1-indexed `row`/`col`.
pub fn position_cursor(row: usize, col: usize) {
    print!("\u{1b}[{row};{col}H");
}

/// Number of characters in `text`.
#[must_use]
pub fn display_len(text: &str) -> usize {
    text.chars().count()
}

/// Cuts `text` to at most `max` characters, marking the cut with `…`.
///
/// ```rust
/// use mascotas::ui::helpers::truncate;
///
/// assert_eq!(truncate("Ñuñoa", 10), "Ñuñoa");
/// assert_eq!(truncate("Macul Centro", 6), "Macul…");
/// assert_eq!(truncate("Macul", 0), "");
/// ```
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if display_len(text) <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(max - 1).collect();
    cut.push('…');
    cut
}

/// Prints `text` cut or padded to exactly `width` characters.
pub fn print_cell(text: &str, width: usize) {
    let cell = truncate(text, width);
    print!("{cell}{}", " ".repeat(width.saturating_sub(display_len(&cell))));
}

/// Prints `text` centred in `cols`, filling the rest of the line with spaces.
pub fn print_centered(text: &str, cols: usize) {
    let text = truncate(text, cols);
    let len = display_len(&text);
    let padding = cols.saturating_sub(len) / 2;
    print!("{}{text}{}", " ".repeat(padding), " ".repeat(cols.saturating_sub(padding + len)));
}

/// Prints `text` with the given character ranges highlighted.
///
/// Ranges are `(start, end)` character indices with an exclusive end and must
/// be sorted and non-overlapping. Selected rows skip highlighting so the
/// selection colours stay intact.
pub fn render_highlighted_text(text: &str, ranges: &[(usize, usize)], theme: &Theme, is_selected: bool) {
    if ranges.is_empty() || is_selected {
        print!("{text}");
        return;
    }

    let chars: Vec<char> = text.chars().collect();
    let mut current_pos = 0;

    for &(start, end) in ranges {
        let start = start.min(chars.len());
        let end = end.min(chars.len());
        if start < current_pos || start >= end {
            continue;
        }

        let normal_section: String = chars[current_pos..start].iter().collect();
        print!("{normal_section}");

        print!("{}", Theme::fg(&theme.colors.match_highlight_fg));
        print!("{}", Theme::bg(&theme.colors.match_highlight_bg));
        let highlighted_section: String = chars[start..end].iter().collect();
        print!("{highlighted_section}");
        print!("{}", Theme::reset());
        print!("{}", Theme::fg(&theme.colors.text_normal));

        current_pos = end;
    }

    if current_pos < chars.len() {
        let remaining: String = chars[current_pos..].iter().collect();
        print!("{remaining}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(display_len("Ubicación"), 9);
        assert_eq!(truncate("Ubicación", 9), "Ubicación");
        assert_eq!(truncate("Ubicación", 5), "Ubic…");
        assert_eq!(truncate("x", 1), "x");
        assert_eq!(truncate("xy", 1), "…");
    }
}
