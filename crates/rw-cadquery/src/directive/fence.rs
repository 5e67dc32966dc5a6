//! Code fence tracking.
//!
//! `:::` lines inside fenced code blocks are code, not directive syntax.

/// Tracks whether line-by-line scanning is inside a fenced code block.
///
/// A closing fence uses the opening character and is at least as long.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    fence: Option<(char, usize)>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.fence.is_some()
    }

    /// Feed one line; returns `true` if it opened or closed a fence.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        match self.fence {
            Some((ch, len)) => {
                let closes = fence_run(trimmed)
                    .is_some_and(|(c, n)| c == ch && n >= len && trimmed[n..].trim().is_empty());
                if closes {
                    self.fence = None;
                }
                closes
            }
            None => {
                self.fence = fence_run(trimmed);
                self.fence.is_some()
            }
        }
    }
}

/// Leading run of three or more backticks or tildes.
fn fence_run(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next().filter(|&c| c == '`' || c == '~')?;
    let count = trimmed.chars().take_while(|&c| c == first).count();
    (count >= 3).then_some((first, count))
}
