//! Log sink for the interactive UI: records become transcript entries instead of
//! writing to a terminal that is in raw mode.

use super::UiEvent;
use log::LevelFilter;
use tokio::sync::mpsc::UnboundedSender;

struct UiLogger {
    tx: UnboundedSender<UiEvent>,
    level: LevelFilter,
}

impl log::Log for UiLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let _ = self.tx.send(UiEvent::Log(record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

/// Level from RUST_LOG when it is a plain level name, otherwise warn.
fn level_from_env(value: Option<String>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn)
}

pub fn install(tx: UnboundedSender<UiEvent>) {
    let level = level_from_env(std::env::var("RUST_LOG").ok());
    if log::set_boxed_logger(Box::new(UiLogger { tx, level })).is_ok() {
        log::set_max_level(level);
    }
}
