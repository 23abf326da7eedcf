use std::collections::VecDeque;
use std::ops::Range;

use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Text input backing the filter field, with a bounded history of committed
/// filters (most recent first).
///
/// With the `serde` feature enabled, this type derives `Serialize`/`Deserialize`
/// so the history can be kept between sessions.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct FilterInput {
    text: String,
    history: VecDeque<String>,
    history_limit: usize,
    // Position while browsing history; `None` means editing fresh text.
    #[cfg_attr(feature = "serde", serde(skip))]
    history_pos: Option<usize>,
}

impl Default for FilterInput {
    fn default() -> Self {
        Self::new(10)
    }
}

impl FilterInput {
    /// Creates an empty input keeping up to `history_limit` committed filters.
    pub fn new(history_limit: usize) -> Self {
        Self {
            text: String::new(),
            history: VecDeque::with_capacity(history_limit),
            history_limit,
            history_pos: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.history_pos = None;
    }

    pub fn push(&mut self, ch: char) {
        self.text.push(ch);
        self.history_pos = None;
    }

    /// Removes the last character; returns `false` if the text was empty.
    pub fn backspace(&mut self) -> bool {
        self.history_pos = None;
        self.text.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.history_pos = None;
    }

    /// Committed filters, most recent first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Replaces the history with `entries` (most recent first), dropping empty
    /// entries and repeats and keeping at most the history limit.
    pub fn set_history<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.history.clear();
        self.history_pos = None;
        for entry in entries {
            if self.history.len() >= self.history_limit {
                break;
            }
            let entry = entry.into();
            if !entry.is_empty() && !self.history.contains(&entry) {
                self.history.push_back(entry);
            }
        }
    }

    /// Records the current text in history (empty text and repeats are skipped).
    pub fn remember(&mut self) {
        self.history_pos = None;
        if self.text.is_empty() || self.history_limit == 0 {
            return;
        }
        self.history.retain(|entry| entry != &self.text);
        self.history.push_front(self.text.clone());
        self.history.truncate(self.history_limit);
    }

    /// Steps back in history, replacing the text. Returns `false` at the end.
    pub fn history_prev(&mut self) -> bool {
        let next = self.history_pos.map_or(0, |pos| pos + 1);
        let Some(entry) = self.history.get(next) else {
            return false;
        };
        self.text.clone_from(entry);
        self.history_pos = Some(next);
        true
    }

    /// Steps forward in history; leaving history clears the text.
    pub fn history_next(&mut self) -> bool {
        match self.history_pos {
            None => false,
            Some(0) => {
                self.history_pos = None;
                self.text.clear();
                true
            }
            Some(pos) => {
                self.history_pos = Some(pos - 1);
                self.text.clone_from(&self.history[pos - 1]);
                true
            }
        }
    }
}

/// Byte ranges of `text` matching any whitespace-separated word of `filter`,
/// ASCII case-insensitively. Ranges are sorted and do not overlap.
pub fn match_ranges(text: &str, filter: &str) -> SmallVec<[Range<usize>; 4]> {
    let mut ranges: SmallVec<[Range<usize>; 4]> = SmallVec::new();
    for word in filter.split_whitespace() {
        let len = word.len();
        let mut start = 0;
        while start + len <= text.len() {
            if text.is_char_boundary(start)
                && text.is_char_boundary(start + len)
                && text[start..start + len].eq_ignore_ascii_case(word)
            {
                ranges.push(start..start + len);
                start += len;
            } else {
                start += 1;
            }
        }
    }

    ranges.sort_by_key(|range| range.start);
    let mut merged: SmallVec<[Range<usize>; 4]> = SmallVec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// Returns `true` if every word of `filter` occurs in `text` (ASCII case-insensitive).
pub fn matches_all_words(text: &str, filter: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    filter
        .split_whitespace()
        .all(|word| lowered.contains(&word.to_ascii_lowercase()))
}
