use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Panel configuration.
///
/// With the `serde` feature enabled, this type derives `Serialize`/`Deserialize`;
/// missing fields fall back to [`Default`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    /// Number of committed filter strings kept in history.
    pub filter_history_size: usize,
    /// Poll interval used while waiting for pending intention requests.
    pub pending_poll_interval: Duration,
    /// Upper bound on that wait; `None` waits indefinitely.
    pub pending_timeout: Option<Duration>,
    /// Draw guide lines between rows.
    pub draw_lines: bool,
    /// Use ASCII glyphs instead of box-drawing characters.
    pub ascii_glyphs: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            filter_history_size: 10,
            pending_poll_interval: Duration::from_millis(100),
            pending_timeout: None,
            draw_lines: true,
            ascii_glyphs: false,
        }
    }
}

impl PanelConfig {
    #[must_use]
    pub const fn filter_history_size(mut self, size: usize) -> Self {
        self.filter_history_size = size;
        self
    }

    #[must_use]
    pub const fn pending_poll_interval(mut self, interval: Duration) -> Self {
        self.pending_poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn pending_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pending_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn draw_lines(mut self, draw: bool) -> Self {
        self.draw_lines = draw;
        self
    }

    #[must_use]
    pub const fn ascii_glyphs(mut self, ascii: bool) -> Self {
        self.ascii_glyphs = ascii;
        self
    }
}
