//! System clipboard access.
//!
//! The clipboard is the only side effect of the tool. `SystemClipboard` keeps
//! one `arboard::Clipboard` for the whole session so X11/Wayland selection
//! ownership is not dropped right after a copy. A process that exits right
//! after copying uses [`SystemClipboard::for_cli`] instead, which on Linux
//! serves the selection until another program takes it over.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write clipboard: {0}")]
    Write(String),
    #[error("no clipboard manager took the link within {}s; it is gone now that utmkit exits", .0.as_secs())]
    NotRetained(Duration),
}

pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Default)]
pub struct SystemClipboard {
    inner: Mutex<Option<arboard::Clipboard>>,
    hold: Option<Duration>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clipboard for a one-shot command. Each write blocks until another
    /// program owns the selection, for at most `hold`.
    pub fn for_cli(hold: Duration) -> Self {
        Self {
            inner: Mutex::new(None),
            hold: Some(hold),
        }
    }
}

/// A held write that ran into its deadline was never taken over.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn check_retained(elapsed: Duration, hold: Duration) -> Result<(), ClipboardError> {
    if elapsed >= hold {
        Err(ClipboardError::NotRetained(hold))
    } else {
        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn write_text(
    clipboard: &mut arboard::Clipboard,
    text: &str,
    hold: Option<Duration>,
) -> Result<(), ClipboardError> {
    use arboard::SetExtLinux;
    use std::time::Instant;

    let Some(hold) = hold else {
        return clipboard
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError::Write(e.to_string()));
    };

    let started = Instant::now();
    clipboard
        .set()
        .wait_until(started + hold)
        .text(text.to_owned())
        .map_err(|e| ClipboardError::Write(e.to_string()))?;
    check_retained(started.elapsed(), hold)
}

// Other platforms keep clipboard contents after the writer exits
#[cfg(not(target_os = "linux"))]
fn write_text(
    clipboard: &mut arboard::Clipboard,
    text: &str,
    _hold: Option<Duration>,
) -> Result<(), ClipboardError> {
    clipboard
        .set_text(text.to_owned())
        .map_err(|e| ClipboardError::Write(e.to_string()))
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| ClipboardError::Unavailable("clipboard lock poisoned".to_string()))?;

        if guard.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            *guard = Some(clipboard);
        }

        let clipboard = guard
            .as_mut()
            .ok_or_else(|| ClipboardError::Unavailable("clipboard not initialized".to_string()))?;

        let result = write_text(clipboard, text, self.hold);
        if let Err(ClipboardError::Write(_)) = result {
            // Drop the handle so the next copy reconnects
            *guard = None;
        }
        result
    }
}

/// Write `text` on the blocking pool; arboard can block on the display server.
pub async fn copy(sink: Arc<dyn ClipboardSink>, text: String) -> Result<(), ClipboardError> {
    let len = text.len();
    let result = tokio::task::spawn_blocking(move || sink.set_text(&text))
        .await
        .map_err(|e| ClipboardError::Write(format!("clipboard task failed: {}", e)))?;

    match &result {
        Ok(()) => tracing::debug!("Copied {} bytes to clipboard", len),
        Err(e) => tracing::warn!("Clipboard copy failed: {}", e),
    }
    result
}
