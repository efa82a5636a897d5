//! Clipboard access and the `@cb` prompt marker.

/// Prompt marker replaced by the clipboard contents before sending.
pub const CLIPBOARD_MARKER: &str = "@cb";

#[derive(Debug, thiserror::Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

pub trait Clipboard {
    fn read(&mut self) -> Result<String, ClipboardError>;
    fn write(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The OS clipboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        arboard::Clipboard::new()
            .map(|inner| Self { inner })
            .map_err(|e| ClipboardError(e.to_string()))
    }
}

impl Clipboard for SystemClipboard {
    fn read(&mut self) -> Result<String, ClipboardError> {
        self.inner.get_text().map_err(|e| ClipboardError(e.to_string()))
    }

    fn write(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ClipboardError(e.to_string()))
    }
}

/// Replace every marker in `prompt` with the clipboard text. The clipboard is
/// only read when the marker is present.
pub fn expand_marker(prompt: &str, clipboard: &mut dyn Clipboard) -> Result<String, ClipboardError> {
    if !prompt.contains(CLIPBOARD_MARKER) {
        return Ok(prompt.to_string());
    }
    let text = clipboard.read()?;
    Ok(prompt.replace(CLIPBOARD_MARKER, &text))
}
