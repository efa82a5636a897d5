use super::app::{App, Entry, Phase};
use lib::event::NoticeLevel;
use ratatui::layout::{Constraint, Direction, Layout, Position};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const WAITING: &str = "Waiting for Clyde...";
const MAX_INPUT_LINES: u16 = 8;
const HELP: &str =
    "Enter send · Ctrl+P multiline (Ctrl+D send) · Ctrl+X copy reply · Ctrl+S mouse · ↑↓ PgUp PgDn scroll · Esc quit";

pub(super) fn draw(f: &mut Frame, app: &mut App) {
    let input_lines = if app.phase == Phase::AwaitingReply {
        1
    } else {
        (app.input.split('\n').count() as u16).clamp(1, MAX_INPUT_LINES)
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(input_lines + 2),
            Constraint::Length(1),
        ])
        .split(f.area());

    let transcript = Paragraph::new(transcript_lines(app)).wrap(Wrap { trim: false });
    let area = chunks[0];
    let total = transcript_height(transcript.line_count(area.width));
    let max_scroll = total.saturating_sub(area.height);
    app.scroll = app.scroll.min(max_scroll);
    f.render_widget(transcript.scroll((max_scroll - app.scroll, 0)), area);

    let title = if app.multiline { " Prompt (multiline) " } else { " Prompt " };
    let block = Block::default().borders(Borders::ALL).title(title);
    let input_area = chunks[1];
    if app.phase == Phase::AwaitingReply {
        let frame = SPINNER[app.spinner_frame % SPINNER.len()];
        let waiting = Paragraph::new(Line::from(vec![
            Span::styled(frame, Style::default().fg(Color::Magenta)),
            Span::raw(" "),
            Span::styled(WAITING, Style::default().add_modifier(Modifier::ITALIC)),
        ]))
        .block(block);
        f.render_widget(waiting, input_area);
    } else {
        let lines: Vec<&str> = app.input.split('\n').collect();
        let skip = lines.len().saturating_sub(MAX_INPUT_LINES as usize);
        let visible: Vec<Line> = lines[skip..].iter().map(|l| Line::raw(l.to_string())).collect();
        let cursor_row = (visible.len() as u16).saturating_sub(1);
        let cursor_col = visible_width(lines.last().copied().unwrap_or(""));
        f.render_widget(Paragraph::new(Text::from(visible)).block(block), input_area);
        f.set_cursor_position(Position::new(
            (input_area.x + 1 + cursor_col).min(input_area.right().saturating_sub(2)),
            input_area.y + 1 + cursor_row,
        ));
    }

    let help = Paragraph::new(Line::styled(HELP, Style::default().fg(Color::DarkGray)));
    f.render_widget(help, chunks[2]);
}

/// Wrapped line count as a scroll extent, saturating at the widget's `u16` limit.
fn transcript_height(lines: usize) -> u16 {
    lines.min(u16::MAX as usize) as u16
}

fn visible_width(s: &str) -> u16 {
    UnicodeWidthStr::width(s).min(u16::MAX as usize) as u16
}

fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for entry in &app.transcript {
        match entry {
            Entry::Prompt(prompt) => {
                let style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
                for (i, l) in prompt.split('\n').enumerate() {
                    let lead = if i == 0 { "> " } else { "  " };
                    lines.push(Line::from(vec![
                        Span::styled(lead, style),
                        Span::styled(l.to_string(), style),
                    ]));
                }
            }
            Entry::Reply(rendered) => lines.extend(rendered.iter().cloned()),
            Entry::Notice(level, message) => {
                lines.push(Line::styled(message.clone(), notice_style(*level)));
            }
            Entry::Log(level, message) => {
                lines.push(Line::styled(
                    format!("[{}] {}", level, message),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
        lines.push(Line::default());
    }
    lines
}

fn notice_style(level: NoticeLevel) -> Style {
    match level {
        NoticeLevel::Info => Style::default().fg(Color::Gray),
        NoticeLevel::Warning => Style::default().fg(Color::Yellow),
        NoticeLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn waiting_replaces_input() {
        let mut app = App {
            ready: true,
            ..App::default()
        };
        app.begin_request("What is 2+2?");
        let s = screen(&mut app);
        assert!(s.contains("> What is 2+2?"));
        assert!(s.contains(WAITING));
    }

    #[test]
    fn idle_shows_typed_input() {
        let mut app = App::default();
        app.input = "draft question".to_string();
        let s = screen(&mut app);
        assert!(s.contains("draft question"));
        assert!(!s.contains(WAITING));
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let mut app = App::default();
        app.scroll = 500;
        let _ = screen(&mut app);
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn long_transcripts_saturate_scroll_extent() {
        assert_eq!(transcript_height(12), 12);
        assert_eq!(transcript_height(70_000), u16::MAX);
    }
}
