//! Where copied prompt text goes.

use std::io::Write;

use crate::config::ClipboardChoice;
use crate::error::{PromptshelfError, Result};

/// Receives the text produced by a copy.
pub trait Clipboard {
    fn write(&mut self, text: &str) -> Result<()>;

    /// Short label for user-facing messages ("clipboard", "stdout", ...)
    fn target(&self) -> &str;
}

/// The desktop clipboard.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write(&mut self, text: &str) -> Result<()> {
        arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(text.to_string()))
            .map_err(clipboard_error)?;
        tracing::debug!(bytes = text.len(), "copied to system clipboard");
        Ok(())
    }

    fn target(&self) -> &str {
        "clipboard"
    }
}

fn clipboard_error(err: arboard::Error) -> PromptshelfError {
    PromptshelfError::Clipboard(format!("{}. Use --stdout instead.", err))
}

/// Prints the text instead of copying it.
#[derive(Debug, Default)]
pub struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn write(&mut self, text: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }

    fn target(&self) -> &str {
        "stdout"
    }
}

/// Keeps everything written to it. Used by the MCP server and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last text written, if any.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn write(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }

    fn target(&self) -> &str {
        "memory"
    }
}

/// Build the clipboard a CLI copy should use.
pub fn for_choice(choice: ClipboardChoice) -> Box<dyn Clipboard> {
    match choice {
        ClipboardChoice::System => Box::new(SystemClipboard),
        ClipboardChoice::Stdout => Box::new(StdoutClipboard),
    }
}
