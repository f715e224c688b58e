use std::collections::VecDeque;

/// Ordered text lines, optionally capped.
///
/// Once a capped log is full, each new line evicts the oldest one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundedLog {
    lines: VecDeque<String>,
    capacity: Option<usize>,
    evicted: u64,
}

impl BoundedLog {
    /// A log holding at most `capacity` lines. A capacity of zero is treated as one.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: Some(capacity.max(1)),
            evicted: 0,
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Appends `text`, one entry per line, and returns how many lines were added.
    ///
    /// `\r\n` and bare `\r` count as line breaks. A single trailing break does
    /// not produce an extra empty line, and empty text adds nothing.
    pub fn push_text(&mut self, text: &str) -> usize {
        let normalized = normalize_newlines(text);
        if normalized.is_empty() {
            return 0;
        }
        let body = normalized.strip_suffix('\n').unwrap_or(&normalized);
        let mut added = 0;
        for line in body.split('\n') {
            self.push_line(line.to_owned());
            added += 1;
        }
        added
    }

    /// Drops every line and loads `text` in its place. The cap still applies.
    pub fn replace_with_text(&mut self, text: &str) {
        self.lines.clear();
        self.push_text(text);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total lines dropped to honour the cap since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    fn push_line(&mut self, line: String) {
        if let Some(cap) = self.capacity {
            while self.lines.len() >= cap {
                self.lines.pop_front();
                self.evicted += 1;
            }
        }
        self.lines.push_back(line);
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
