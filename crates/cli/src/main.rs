use clap::Parser;
use lib::clipboard::{expand_marker, SystemClipboard, CLIPBOARD_MARKER};
use lib::config::{OutputStyle, Settings};
use lib::gateway::DiscordGateway;
use lib::mode::Mode;
use lib::oneshot::{compose_prompt, run_query, QueryError};
use lib::routing::{reply_slot, EventSink, Router};
use lib::session::{readiness, Session};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

mod tui;

#[derive(Parser)]
#[command(name = "clyde", version)]
#[command(about = "Chat with Discord's Clyde from the terminal", long_about = None)]
struct Cli {
    /// Config file path (default: CLYDE_CONFIG_PATH or ~/.clyde/config.json)
    #[arg(long, short, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Ask a single question and print the answer. Without it, starts the interactive UI.
    #[arg(value_name = "PROMPT", trailing_var_arg = true, allow_hyphen_values = true)]
    prompt: Vec<String>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = match load_settings(cli.config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    match Mode::from_args(&cli.prompt) {
        Mode::Interactive => {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<tui::UiEvent>();
            tui::logger::install(tx.clone());
            if let Err(e) = run_interactive(settings, tx, rx).await {
                eprintln!("clyde: {:#}", e);
                std::process::exit(1);
            }
        }
        Mode::OneShot(prompt) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
            if let Err(e) = run_one_shot(settings, prompt).await {
                if !already_reported(&e) {
                    log::error!("{:#}", e);
                }
                std::process::exit(1);
            }
            std::process::exit(0);
        }
    }
}

fn load_settings(path: Option<std::path::PathBuf>) -> anyhow::Result<Settings> {
    let (config, _path) = lib::config::load_config(path)?;
    Ok(Settings::resolve(&config)?)
}

/// Build the session around the one sink chosen for this mode.
fn build_session(settings: &Settings, sink: Arc<dyn EventSink>) -> Arc<Session> {
    let gateway = Arc::new(DiscordGateway::new(settings));
    let router = Router::new(settings.agent_id, sink);
    Session::new(gateway, router, settings.channel_id.clone())
}

async fn run_interactive(
    settings: Settings,
    tx: tokio::sync::mpsc::UnboundedSender<tui::UiEvent>,
    rx: tokio::sync::mpsc::UnboundedReceiver<tui::UiEvent>,
) -> anyhow::Result<()> {
    let session = build_session(&settings, Arc::new(tx.clone()));
    let (notifier, ready) = readiness();
    tokio::spawn(Arc::clone(&session).run(notifier));
    tokio::spawn(async move {
        if ready.wait().await.is_ok() {
            let _ = tx.send(tui::UiEvent::Ready);
        }
    });

    tui::run(session, rx, settings.theme).await
}

async fn run_one_shot(settings: Settings, prompt: String) -> anyhow::Result<()> {
    let prompt = if prompt.contains(CLIPBOARD_MARKER) {
        let mut clipboard = SystemClipboard::new()?;
        expand_marker(&prompt, &mut clipboard)?
    } else {
        prompt
    };
    let prompt = compose_prompt(&prompt, settings.instructions.as_deref());

    let (slot, reply) = reply_slot();
    let session = build_session(&settings, Arc::new(slot));
    let (notifier, ready) = readiness();
    tokio::spawn(Arc::clone(&session).run(notifier));

    let spinner = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Processing");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = run_query(&session, ready, reply, prompt, settings.theme.clone()).await;
    spinner.finish_and_clear();
    let reply = result?;

    let mut stdout = std::io::stdout();
    match settings.output {
        OutputStyle::Plain => writeln!(stdout, "{}", reply.plain)?,
        OutputStyle::Styled => write!(stdout, "{}", reply.styled)?,
    }
    stdout.flush()?;
    Ok(())
}

/// Connection and send failures reach the log through the session's notices.
fn already_reported(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<QueryError>(),
        Some(QueryError::NotReady(_) | QueryError::Send(_))
    )
}
