use std::time::{Duration, Instant};

/// Coalesces keystrokes: a query is released only after `window` has passed
/// without another keystroke. Superseded text is dropped, never sent.
#[derive(Clone, Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record the latest text; restarts the quiescence window.
    pub fn push(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some((text.into(), now));
    }

    /// Release the pending text once the window has elapsed since the last push.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let ready = match &self.pending {
            Some((_, at)) => now.saturating_duration_since(*at) >= self.window,
            None => false,
        };
        if ready {
            self.pending.take().map(|(text, _)| text)
        } else {
            None
        }
    }

    /// Time left until the pending text would fire, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, at)| self.window.saturating_sub(now.saturating_duration_since(*at)))
    }
}

/// Trimmed, lowercased form of a search box value. Empty means "no filter".
pub fn normalize_keyword(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Case-insensitive substring match of an already-normalized needle
/// against any of the given haystacks.
pub fn matches_any<'a>(needle: &str, haystacks: impl IntoIterator<Item = &'a str>) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystacks
        .into_iter()
        .any(|h| h.to_lowercase().contains(needle))
}
