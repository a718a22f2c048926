use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard is not available")]
    Unavailable,
    #[error("clipboard write refused: {0}")]
    Refused(String),
}

/// Destination for exported text
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// In-process clipboard; can be told to refuse writes
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
    refuse: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        Self {
            contents: None,
            refuse: true,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.refuse {
            return Err(ClipboardError::Refused("permission denied".into()));
        }
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Transient "copied" confirmation per control. Entries expire on their own;
/// nothing needs to clear them.
#[derive(Debug, Clone)]
pub struct CopyFeedback {
    duration: Duration,
    armed: HashMap<String, Instant>,
}

impl Default for CopyFeedback {
    fn default() -> Self {
        Self::new(Duration::from_millis(900))
    }
}

impl CopyFeedback {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            armed: HashMap::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn arm(&mut self, control: &str, now: Instant) {
        self.armed.insert(control.to_string(), now);
    }

    /// True while the confirmation on `control` is showing
    pub fn is_confirming(&self, control: &str, now: Instant) -> bool {
        self.armed
            .get(control)
            .is_some_and(|at| now.saturating_duration_since(*at) < self.duration)
    }

    /// Controls still holding an entry, expired or not
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Drop expired entries
    pub fn sweep(&mut self, now: Instant) {
        let duration = self.duration;
        self.armed
            .retain(|_, at| now.saturating_duration_since(*at) < duration);
    }

    /// Write `text` and arm the confirmation on success. Failures are
    /// swallowed: the control simply shows no confirmation.
    pub fn copy(
        &mut self,
        clipboard: &mut dyn Clipboard,
        control: &str,
        text: &str,
        now: Instant,
    ) -> bool {
        match clipboard.write_text(text) {
            Ok(()) => {
                self.arm(control, now);
                true
            }
            Err(err) => {
                tracing::debug!(control, error = %err, "clipboard write failed");
                false
            }
        }
    }
}
