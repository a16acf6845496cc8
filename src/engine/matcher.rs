//! Byte-wise scan loop over the keyword trie.
//!
//! # Algorithm
//! The scanner keeps a current node (starting at the root) and a cursor into
//! the buffer. A child hit descends; a miss at a non-root node attempts to
//! emit a candidate ending at the previous byte, then resets to the root.
//! Either way the cursor advances, so the byte that caused the miss is
//! consumed rather than re-examined from the root; a keyword beginning on
//! that byte is not reported. Changing this would alter which overlapping
//! keys adjacent to splitters are seen.
//!
//! The deadline is polled against the cached clock once per
//! [`DEADLINE_STRIDE`] input bytes. On expiry the scan returns whatever it
//! has emitted so far with `intercepted = true`; the caller still applies
//! those matches.

use super::trie::{Trie, ROOT};
use crate::api::KeyFilter;
use crate::clock::Clock;

/// Bytes examined between deadline polls.
const DEADLINE_STRIDE: usize = 128;

/// A keyword hit: inclusive byte range plus the completed rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Position {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) rule: u32,
}

impl Trie {
    /// Scans `buf`, returning filter-accepted hits and whether the budget ran
    /// out first. `pause` is a test hook invoked between strides.
    pub(crate) fn match_into(
        &self,
        buf: &[u8],
        filter: &KeyFilter,
        clock: &Clock,
        budget_micros: i64,
        pause: Option<fn()>,
    ) -> (Vec<Position>, bool) {
        let mut out = Vec::with_capacity(8);
        let start = clock.now_micros();
        let mut current = ROOT;
        let mut pos = 0;
        let len = buf.len();

        loop {
            let mut step = 0;
            while pos < len {
                step += 1;
                if step > DEADLINE_STRIDE {
                    break;
                }
                match self.next_node(current, buf[pos]) {
                    Some(next) => current = next,
                    None => {
                        if self.node(current).depth != 0 {
                            if let Some(hit) = self.test_match(buf, current, pos - 1, filter) {
                                out.push(hit);
                            }
                            current = ROOT;
                        }
                    }
                }
                pos += 1;
            }
            if pos >= len {
                return (out, false);
            }
            if let Some(pause) = pause {
                pause();
            }
            if clock.now_micros() - start > budget_micros {
                return (out, true);
            }
        }
    }

    /// Candidate emission for a scan that diverged at `current` after
    /// matching through `pos`.
    fn test_match(
        &self,
        buf: &[u8],
        current: u32,
        pos: usize,
        filter: &KeyFilter,
    ) -> Option<Position> {
        let node = self.node(current);
        let depth = node.depth as usize;
        if node.end {
            let hit = Position {
                start: pos + 1 - depth,
                end: pos,
                rule: node.rule,
            };
            return filter(buf, hit.start, hit.end, node.any_start, node.any_end).then_some(hit);
        }

        // Ran off the end of a longer registered stem: report the nearest
        // terminal ancestor instead, rewinding the end to where it finished.
        // Only valid when its trailing wildcard tolerates the extra bytes.
        let last = self.node(node.last_end?);
        if !last.any_end {
            return None;
        }
        let hit = Position {
            start: pos + 1 - depth,
            end: pos - (depth - last.depth as usize),
            rule: last.rule,
        };
        filter(buf, hit.start, hit.end, last.any_start, last.any_end).then_some(hit)
    }
}
