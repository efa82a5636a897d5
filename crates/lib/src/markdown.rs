//! ANSI rendering of markdown replies through termimad.

use crate::theme::Theme;

/// `text` without leading blank lines and without trailing whitespace. The
/// first content line keeps its indentation.
pub fn trim_blank_lines(text: &str) -> &str {
    let Some(first) = text.find(|c: char| !c.is_whitespace()) else {
        return "";
    };
    let line_start = text[..first].rfind('\n').map_or(0, |i| i + 1);
    text[line_start..].trim_end()
}

/// Render `markdown` for a terminal. Unwrapped, and always ends with exactly one newline.
pub fn to_ansi(markdown: &str, theme: &Theme) -> String {
    let skin = theme.skin();
    let rendered = skin.text(trim_blank_lines(markdown), None).to_string();
    finish_lines(&rendered)
}

/// Unstyled counterpart of `to_ansi`.
pub fn to_plain(text: &str) -> String {
    finish_lines(trim_blank_lines(text))
}

fn finish_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches(' ')).collect();
    let mut out = lines.join("\n").trim_matches('\n').to_string();
    out.push('\n');
    out
}
