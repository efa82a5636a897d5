//! Reply formatting: plain text with self-mentions normalized, plus a styled rendering.

use crate::event::UserId;
use crate::markdown;
use crate::theme::Theme;

/// Replaces the agent's mentions of the local user so echoed output cannot address anyone.
pub const SELF_MENTION_MARKER: &str = "`@You`";

/// Both representations of one reply. `styled` is ANSI text ending with exactly one newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedReply {
    pub plain: String,
    pub styled: String,
}

pub struct ReplyFormatter {
    self_id: Option<UserId>,
    theme: Option<String>,
}

impl ReplyFormatter {
    /// `self_id` is the local user (no substitution when unknown); `theme` is the theme setting.
    pub fn new(self_id: Option<UserId>, theme: Option<String>) -> Self {
        Self { self_id, theme }
    }

    /// Raw text with every `<@ID>` / `<@!ID>` for the local user replaced by the marker.
    pub fn plain(&self, raw: &str) -> String {
        match self.self_id {
            Some(id) => raw
                .replace(&format!("<@!{}>", id), SELF_MENTION_MARKER)
                .replace(&format!("<@{}>", id), SELF_MENTION_MARKER),
            None => raw.to_string(),
        }
    }

    pub fn format(&self, raw: &str) -> FormattedReply {
        let plain = self.plain(raw);
        let styled = match Theme::load(self.theme.as_deref()) {
            Ok(theme) => markdown::to_ansi(&plain, &theme),
            Err(e) => {
                log::warn!("{}; showing reply unstyled", e);
                markdown::to_plain(&plain)
            }
        };
        FormattedReply { plain, styled }
    }
}
