//! The line reassembler: a single-pass state machine that rejoins tag
//! fragments split across physical lines and emits one logical tag group
//! per output line.
//!
//! Balance is approximated by counting token substrings, not by parsing
//! tags. The counts are crude on purpose; existing output relies on the
//! exact arithmetic below, quirks included.

use memchr::{memchr_iter, memmem};
use tracing::debug;

/// An unbalanced merge shorter than this is dropped instead of held.
const MIN_HOLD_CHARS: usize = 3;

/// Adjacent embed tags as they appear in the wild, and with the separator
/// inserted before splitting.
const EMBED_JOINED: &str = "/><emb";
const EMBED_SPACED: &str = "/> <emb";

/* ============================== Tag modes =============================== */

/// Which token pair a line is counted with. Re-detected for every physical
/// line; a held fragment never pins the mode of the line it merges into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagMode {
    Standard,
    Embed,
}

impl TagMode {
    /// Any mention of "embed" in the trimmed line selects embed mode.
    pub fn detect(line: &str) -> Self {
        if memmem::find(line.as_bytes(), b"embed").is_some() {
            TagMode::Embed
        } else {
            TagMode::Standard
        }
    }

    pub fn open_token(self) -> &'static str {
        match self {
            TagMode::Standard => "<",
            TagMode::Embed => "<emb",
        }
    }

    pub fn close_token(self) -> &'static str {
        match self {
            TagMode::Standard => "</",
            TagMode::Embed => EMBED_JOINED,
        }
    }
}

/// Non-overlapping occurrence count, left to right.
fn count_occurrences(haystack: &str, token: &str) -> usize {
    let needle = token.as_bytes();
    if needle.len() == 1 {
        memchr_iter(needle[0], haystack.as_bytes()).count()
    } else {
        memmem::find_iter(haystack.as_bytes(), needle).count()
    }
}

/* ============================ Trace events ============================== */

/// What happened to one physical line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Neither token occurs in the merged content; everything dropped.
    Untagged,
    /// Merged content written out verbatim as one line.
    Emitted,
    /// Embed group split into one line per tag.
    Split { fragments: usize },
    /// Merged content held for the next line.
    Held,
    /// Unbalanced but too short to hold; dropped silently.
    Dropped,
}

/// One record of the per-line diagnostic stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineEvent {
    /// Physical line number, 1-based.
    pub line: u64,
    pub mode: TagMode,
    pub opens: usize,
    pub closes: usize,
    pub action: Action,
}

/// Sink for the diagnostic stream. Purely observational: swapping or
/// silencing the sink never changes what gets emitted.
pub trait Trace {
    fn line(&mut self, event: &LineEvent);

    /// A fragment still held when the input ran out. It is discarded.
    fn leftover_dropped(&mut self, content: &str) {
        let _ = content;
    }
}

impl<T: Trace + ?Sized> Trace for &mut T {
    fn line(&mut self, event: &LineEvent) {
        (**self).line(event);
    }

    fn leftover_dropped(&mut self, content: &str) {
        (**self).leftover_dropped(content);
    }
}

/// Silent sink.
impl Trace for () {
    fn line(&mut self, _event: &LineEvent) {}
}

/// Default sink: forwards every record to the `tracing` debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTrace;

impl Trace for LogTrace {
    fn line(&mut self, event: &LineEvent) {
        debug!(
            line = event.line,
            mode = ?event.mode,
            opens = event.opens,
            closes = event.closes,
            action = ?event.action,
            "processed line"
        );
    }

    fn leftover_dropped(&mut self, content: &str) {
        debug!(len = content.len(), "input ended with an unresolved fragment, dropping it");
    }
}

/* ============================ Reassembler =============================== */

/// Rejoins tag fragments line by line.
///
/// Holds at most one pending fragment at a time. An unbalanced merge
/// overwrites the slot; it is never stacked next to an older fragment.
pub struct Reassembler<T: Trace = LogTrace> {
    pending: Option<String>,
    line_no: u64,
    lines: Vec<String>,
    trace: T,
}

impl Reassembler<LogTrace> {
    pub fn new() -> Self {
        Self::with_trace(LogTrace)
    }
}

impl Default for Reassembler<LogTrace> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Trace> Reassembler<T> {
    pub fn with_trace(trace: T) -> Self {
        Reassembler {
            pending: None,
            line_no: 0,
            lines: Vec::new(),
            trace,
        }
    }

    /// The fragment currently held over from an unbalanced line, if any.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Classify one physical line and emit, split, hold, or drop it.
    pub fn push_line(&mut self, raw: &str) {
        self.line_no += 1;
        let trimmed = raw.trim();
        let mode = TagMode::detect(trimmed);

        // A held fragment goes in front of the current line and the slot
        // is cleared; an unbalanced merge refills it below.
        let merged = match self.pending.take() {
            Some(mut held) => {
                held.push_str(trimmed);
                held
            }
            None => trimmed.to_owned(),
        };

        let opens = count_occurrences(&merged, mode.open_token());
        let closes = count_occurrences(&merged, mode.close_token());

        let action = if opens == 0 && closes == 0 {
            Action::Untagged
        } else if mode == TagMode::Standard && opens == 2 * closes {
            // Every balanced pair contributes one '<' opening and one in
            // the closing tag.
            self.lines.push(merged);
            Action::Emitted
        } else if mode == TagMode::Embed && opens == closes + 1 {
            let fragments = self.split_embed_group(&merged);
            Action::Split { fragments }
        } else if merged.chars().count() >= MIN_HOLD_CHARS {
            self.pending = Some(merged);
            Action::Held
        } else {
            Action::Dropped
        };

        self.trace.line(&LineEvent {
            line: self.line_no,
            mode,
            opens,
            closes,
            action,
        });
    }

    /// A complete embed group carries no separators between tags; give
    /// every tag its own output line. Returns the fragment count.
    fn split_embed_group(&mut self, merged: &str) -> usize {
        let spaced = merged.replace(EMBED_JOINED, EMBED_SPACED);
        let mut fragments = 0usize;
        for segment in spaced.split('>') {
            if segment.is_empty() {
                continue;
            }
            let mut line = String::with_capacity(segment.len() + 1);
            line.push_str(segment);
            line.push('>');
            self.lines.push(line);
            fragments += 1;
        }
        fragments
    }

    /// Consume the reassembler and hand off the output sequence. A still
    /// pending fragment is dropped, never emitted.
    pub fn finish(mut self) -> Vec<String> {
        if let Some(held) = self.pending.take() {
            self.trace.leftover_dropped(&held);
        }
        self.lines
    }
}

/* ================================ Tests ================================= */
