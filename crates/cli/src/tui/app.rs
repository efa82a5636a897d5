//! Interactive UI state. Pure: the run loop performs the side effects the
//! returned `Action`s ask for.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use lib::event::{InboundEvent, Notice, NoticeLevel};
use ratatui::text::Line;

const SCROLL_STEP: u16 = 1;
const PAGE_STEP: u16 = 10;
const WHEEL_STEP: u16 = 3;

/// Everything the UI inbox can receive.
#[derive(Debug)]
pub enum UiEvent {
    Reply(InboundEvent),
    Notice(Notice),
    Log(log::Level, String),
    Ready,
}

impl From<InboundEvent> for UiEvent {
    fn from(e: InboundEvent) -> Self {
        UiEvent::Reply(e)
    }
}

impl From<Notice> for UiEvent {
    fn from(n: Notice) -> Self {
        UiEvent::Notice(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingReply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Prompt(String),
    Reply(Vec<Line<'static>>),
    Notice(NoticeLevel, String),
    Log(log::Level, String),
}

/// What the run loop should do after a key or mouse event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Submit(String),
    CopyReply,
    SetMouseCapture(bool),
    Quit,
}

pub struct App {
    pub phase: Phase,
    pub ready: bool,
    pub transcript: Vec<Entry>,
    pub input: String,
    pub multiline: bool,
    pub mouse_capture: bool,
    /// Lines scrolled up from the bottom of the transcript.
    pub scroll: u16,
    pub last_reply: Option<String>,
    pub spinner_frame: usize,
}

impl Default for App {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            ready: false,
            transcript: Vec::new(),
            input: String::new(),
            multiline: false,
            mouse_capture: true,
            scroll: 0,
            last_reply: None,
            spinner_frame: 0,
        }
    }
}

impl App {
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind == KeyEventKind::Release {
            return Action::None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => Action::Quit,
            KeyCode::Char('c') if ctrl => Action::Quit,
            KeyCode::Char('x') if ctrl => Action::CopyReply,
            KeyCode::Char('s') if ctrl => {
                self.mouse_capture = !self.mouse_capture;
                let state = if self.mouse_capture { "enabled" } else { "disabled" };
                self.notice(Notice::info(format!("Mouse capture {}", state)));
                Action::SetMouseCapture(self.mouse_capture)
            }
            KeyCode::Char('p') if ctrl => {
                self.multiline = !self.multiline;
                Action::None
            }
            KeyCode::Char('d') if ctrl && self.multiline => self.submit(),
            KeyCode::Enter if self.multiline => {
                self.input.push('\n');
                Action::None
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
                Action::None
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.push(c);
                Action::None
            }
            KeyCode::Up => self.scroll_up(SCROLL_STEP),
            KeyCode::Down => self.scroll_down(SCROLL_STEP),
            KeyCode::PageUp => self.scroll_up(PAGE_STEP),
            KeyCode::PageDown => self.scroll_down(PAGE_STEP),
            _ => Action::None,
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Action {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_up(WHEEL_STEP),
            MouseEventKind::ScrollDown => self.scroll_down(WHEEL_STEP),
            _ => Action::None,
        }
    }

    /// Paste arrives as one event; newlines are kept only in multiline mode.
    pub fn handle_paste(&mut self, text: &str) {
        if self.multiline {
            self.input.push_str(text);
        } else {
            self.input.push_str(&text.replace(['\r', '\n'], " "));
        }
    }

    fn scroll_up(&mut self, by: u16) -> Action {
        self.scroll = self.scroll.saturating_add(by);
        Action::None
    }

    fn scroll_down(&mut self, by: u16) -> Action {
        self.scroll = self.scroll.saturating_sub(by);
        Action::None
    }

    /// Take the input as a prompt if one can be sent now. The text is sent as typed.
    fn submit(&mut self) -> Action {
        if self.input.trim().is_empty() {
            return Action::None;
        }
        if !self.ready {
            self.notice(Notice::warning("Not connected yet"));
            return Action::None;
        }
        if self.phase == Phase::AwaitingReply {
            self.notice(Notice::warning("Still waiting for Clyde's reply"));
            return Action::None;
        }
        Action::Submit(std::mem::take(&mut self.input))
    }

    /// Record a sent prompt and wait for the reply.
    pub fn begin_request(&mut self, prompt: &str) {
        self.transcript.push(Entry::Prompt(prompt.to_string()));
        self.phase = Phase::AwaitingReply;
        self.scroll = 0;
    }

    /// A reply from the agent. Replies arriving while idle are still shown.
    pub fn receive_reply(&mut self, plain: String, rendered: Vec<Line<'static>>) {
        self.transcript.push(Entry::Reply(rendered));
        self.last_reply = Some(plain);
        self.phase = Phase::Idle;
        self.scroll = 0;
    }

    /// The background send finished with an error: nothing is coming back.
    pub fn request_failed(&mut self) {
        self.phase = Phase::Idle;
    }

    pub fn notice(&mut self, notice: Notice) {
        self.transcript.push(Entry::Notice(notice.level, notice.message));
    }

    pub fn log(&mut self, level: log::Level, message: String) {
        self.transcript.push(Entry::Log(level, message));
    }

    pub fn tick(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn ready_app() -> App {
        App {
            ready: true,
            ..App::default()
        }
    }

    #[test]
    fn enter_submits_prompt_as_typed() {
        let mut app = ready_app();
        type_text(&mut app, "  hello @cb  ");
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Action::Submit("  hello @cb  ".to_string())
        );
        assert!(app.input.is_empty());
    }

    #[test]
    fn empty_prompt_is_ignored() {
        let mut app = ready_app();
        type_text(&mut app, "   ");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        assert!(app.transcript.is_empty());
    }

    #[test]
    fn prompt_before_ready_is_rejected() {
        let mut app = App::default();
        type_text(&mut app, "hi");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        assert_eq!(app.input, "hi");
        assert!(matches!(app.transcript.last(), Some(Entry::Notice(NoticeLevel::Warning, _))));
    }

    #[test]
    fn second_prompt_while_awaiting_is_rejected() {
        let mut app = ready_app();
        app.begin_request("first");
        type_text(&mut app, "second");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        assert_eq!(app.phase, Phase::AwaitingReply);
        assert_eq!(app.input, "second");
    }

    #[test]
    fn reply_returns_to_idle_and_is_remembered() {
        let mut app = ready_app();
        app.begin_request("What is 2+2?");
        app.receive_reply("4".to_string(), vec![Line::raw("4")]);
        assert_eq!(app.phase, Phase::Idle);
        assert_eq!(app.last_reply.as_deref(), Some("4"));
        assert_eq!(app.transcript.len(), 2);
    }

    #[test]
    fn multiline_enter_inserts_newline_and_ctrl_d_submits() {
        let mut app = ready_app();
        app.handle_key(ctrl('p'));
        type_text(&mut app, "a");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        type_text(&mut app, "b");
        assert_eq!(app.handle_key(ctrl('d')), Action::Submit("a\nb".to_string()));
    }

    #[test]
    fn control_keys() {
        let mut app = App::default();
        assert_eq!(app.handle_key(ctrl('c')), Action::Quit);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(app.handle_key(ctrl('x')), Action::CopyReply);
        assert_eq!(app.handle_key(ctrl('s')), Action::SetMouseCapture(false));
        assert_eq!(app.handle_key(ctrl('s')), Action::SetMouseCapture(true));
        assert!(app.input.is_empty());
    }

    #[test]
    fn scrolling_saturates_at_bottom() {
        let mut app = App::default();
        app.handle_key(key(KeyCode::PageUp));
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.scroll, PAGE_STEP + SCROLL_STEP);
        app.handle_key(key(KeyCode::PageDown));
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn paste_flattens_newlines_unless_multiline() {
        let mut app = App::default();
        app.handle_paste("a\nb");
        assert_eq!(app.input, "a b");
        app.input.clear();
        app.multiline = true;
        app.handle_paste("a\nb");
        assert_eq!(app.input, "a\nb");
    }
}
