//! Reply rendering for the transcript: tui-markdown with a stylesheet built from the theme.

use lib::markdown::trim_blank_lines;
use lib::theme::{Base, Color as ThemeColor, Theme};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use tui_markdown::{from_str_with_options, Options, StyleSheet};

#[derive(Debug, Clone)]
pub struct ThemeSheet {
    theme: Theme,
}

impl ThemeSheet {
    fn fg(&self, color: Option<ThemeColor>) -> Style {
        match (self.theme.base, color) {
            (Base::NoTty, _) | (_, None) => Style::new(),
            (_, Some(c)) => Style::new().fg(widget_color(c)),
        }
    }
}

impl StyleSheet for ThemeSheet {
    fn heading(&self, level: u8) -> Style {
        let style = self.fg(self.theme.heading).add_modifier(Modifier::BOLD);
        if level == 1 {
            style.add_modifier(Modifier::UNDERLINED)
        } else {
            style
        }
    }

    fn code(&self) -> Style {
        self.fg(self.theme.code)
    }

    fn link(&self) -> Style {
        self.fg(self.theme.link).add_modifier(Modifier::UNDERLINED)
    }

    fn blockquote(&self) -> Style {
        self.fg(self.theme.quote).add_modifier(Modifier::ITALIC)
    }

    fn heading_meta(&self) -> Style {
        Style::new().add_modifier(Modifier::DIM)
    }

    fn metadata_block(&self) -> Style {
        self.fg(self.theme.code_block)
    }
}

/// Transcript lines for one reply. Without a theme the text is shown as-is.
pub fn render(text: &str, theme: Option<&Theme>) -> Vec<Line<'static>> {
    let text = trim_blank_lines(text);
    let Some(theme) = theme else {
        return text.lines().map(|l| Line::raw(l.to_string())).collect();
    };
    let options = Options::new(ThemeSheet { theme: theme.clone() });
    let rendered = from_str_with_options(text, &options);
    let mut lines: Vec<Line<'static>> = rendered
        .lines
        .into_iter()
        .map(|line| {
            Line::from(
                line.spans
                    .into_iter()
                    .map(|span| Span::styled(span.content.into_owned(), span.style))
                    .collect::<Vec<_>>(),
            )
            .style(line.style)
        })
        .collect();
    while lines.last().is_some_and(is_blank) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| is_blank(l)).count();
    lines.drain(..leading);
    lines
}

fn is_blank(line: &Line) -> bool {
    line.spans.iter().all(|s| s.content.trim().is_empty())
}

fn widget_color(color: ThemeColor) -> Color {
    match color {
        ThemeColor::Black => Color::Black,
        ThemeColor::Red => Color::Red,
        ThemeColor::Green => Color::Green,
        ThemeColor::Yellow => Color::Yellow,
        ThemeColor::Blue => Color::Blue,
        ThemeColor::Magenta => Color::Magenta,
        ThemeColor::Cyan => Color::Cyan,
        ThemeColor::White => Color::White,
        ThemeColor::Gray => Color::Gray,
        ThemeColor::DarkGray => Color::DarkGray,
        ThemeColor::Indexed(n) => Color::Indexed(n),
        ThemeColor::Rgb(r, g, b) => Color::Rgb(r, g, b),
    }
}
