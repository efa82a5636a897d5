//! Interactive terminal UI: one loop owning the UI state, fed by terminal
//! input, the session's inbox and a spinner tick.

mod app;
pub mod logger;
mod markdown;
mod ui;

pub use app::UiEvent;

use anyhow::Context;
use app::{Action, App, Phase};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event,
    EventStream,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures_util::StreamExt;
use lib::clipboard::{expand_marker, Clipboard, ClipboardError, SystemClipboard};
use lib::event::Notice;
use lib::format::ReplyFormatter;
use lib::gateway::SendError;
use lib::session::Session;
use lib::theme::Theme;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

const TICK: Duration = Duration::from_millis(100);

type Term = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(
    session: Arc<Session>,
    inbox: UnboundedReceiver<UiEvent>,
    theme: Option<String>,
) -> anyhow::Result<()> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, session, inbox, theme).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> anyhow::Result<Term> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)
        .context("enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("create terminal")
}

fn restore_terminal(terminal: &mut Term) -> anyhow::Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

/// Clipboard opened on first use; failure to open is reported each time it is needed.
struct LazyClipboard(Option<SystemClipboard>);

impl LazyClipboard {
    fn open(&mut self) -> Result<&mut SystemClipboard, ClipboardError> {
        if self.0.is_none() {
            self.0 = Some(SystemClipboard::new()?);
        }
        self.0
            .as_mut()
            .ok_or_else(|| ClipboardError("not initialised".to_string()))
    }
}

impl Clipboard for LazyClipboard {
    fn read(&mut self) -> Result<String, ClipboardError> {
        self.open()?.read()
    }

    fn write(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.open()?.write(text)
    }
}

type PendingSend = JoinHandle<Result<(), SendError>>;

/// Expand the clipboard marker and send. Nothing else in the prompt changes.
fn submit_prompt(
    app: &mut App,
    session: &Arc<Session>,
    prompt: &str,
    clipboard: &mut dyn Clipboard,
) -> Option<PendingSend> {
    match expand_marker(prompt, clipboard) {
        Ok(text) => {
            app.begin_request(&text);
            Some(session.dispatch(text))
        }
        Err(e) => {
            app.notice(Notice::error(e.to_string()));
            None
        }
    }
}

/// Theme for transcript replies; None renders them as plain text.
fn transcript_theme(app: &mut App, setting: Option<&str>) -> Option<Theme> {
    match Theme::load(setting) {
        Ok(theme) => Some(theme),
        Err(e) => {
            app.notice(Notice::warning(format!("{}; showing replies unstyled", e)));
            None
        }
    }
}

async fn event_loop(
    terminal: &mut Term,
    session: Arc<Session>,
    mut inbox: UnboundedReceiver<UiEvent>,
    theme: Option<String>,
) -> anyhow::Result<()> {
    let mut app = App::default();
    let reply_theme = transcript_theme(&mut app, theme.as_deref());
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK);
    let mut clipboard = LazyClipboard(None);
    let mut pending: Option<PendingSend> = None;

    loop {
        terminal.draw(|f| ui::draw(f, &mut app))?;

        tokio::select! {
            maybe_event = events.next() => {
                let Some(Ok(event)) = maybe_event else {
                    break;
                };
                let action = match event {
                    Event::Key(key) => app.handle_key(key),
                    Event::Mouse(mouse) => app.handle_mouse(mouse),
                    Event::Paste(text) => {
                        app.handle_paste(&text);
                        Action::None
                    }
                    _ => Action::None,
                };
                match action {
                    Action::None => {}
                    Action::Quit => break,
                    Action::Submit(prompt) => {
                        if let Some(handle) = submit_prompt(&mut app, &session, &prompt, &mut clipboard) {
                            pending = Some(handle);
                        }
                    }
                    Action::CopyReply => copy_last_reply(&mut app, &mut clipboard),
                    Action::SetMouseCapture(on) => {
                        let result = if on {
                            execute!(terminal.backend_mut(), EnableMouseCapture)
                        } else {
                            execute!(terminal.backend_mut(), DisableMouseCapture)
                        };
                        if let Err(e) = result {
                            log::warn!("toggling mouse capture: {}", e);
                        }
                    }
                }
            }
            Some(event) = inbox.recv() => match event {
                UiEvent::Ready => app.ready = true,
                UiEvent::Reply(reply) => {
                    let plain = ReplyFormatter::new(session.user_id(), None).plain(&reply.text);
                    let rendered = markdown::render(&plain, reply_theme.as_ref());
                    app.receive_reply(plain, rendered);
                }
                UiEvent::Notice(notice) => app.notice(notice),
                UiEvent::Log(level, message) => app.log(level, message),
            },
            _ = tick.tick() => {
                app.tick();
                if pending.as_ref().is_some_and(JoinHandle::is_finished) {
                    if let Some(handle) = pending.take() {
                        if !matches!(handle.await, Ok(Ok(()))) && app.phase == Phase::AwaitingReply {
                            app.request_failed();
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn copy_last_reply(app: &mut App, clipboard: &mut dyn Clipboard) {
    let Some(reply) = app.last_reply.clone() else {
        app.notice(Notice::warning("Nothing to copy yet"));
        return;
    };
    match clipboard.write(&reply) {
        Ok(()) => app.notice(Notice::info(format!("Copied {} characters!", reply.chars().count()))),
        Err(e) => app.notice(Notice::error(e.to_string())),
    }
}
