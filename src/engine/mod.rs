//! Masking engine: rule registry, trie publication, and the scan-and-redact
//! entry point.
//!
//! Purpose: own the mutable configuration (rules, boundary filter) and
//! publish an immutable compiled trie that scans walk lock-free.
//!
//! # Invariants
//! - `merge_rules` validates every key before touching any state; a rejected
//!   batch leaves the registry and the published trie untouched.
//! - The published trie is immutable. A merge builds a fresh trie and swaps
//!   the shared pointer; in-flight scans keep using the one they cloned.
//! - `mask` never panics into its caller: the scan and all redactor dispatch
//!   run inside an unwind barrier, and any failure surfaces as
//!   `intercepted = true` with the buffer in whatever state it reached.
//!
//! # Design Notes
//! - This engine sits on logging and request paths; the unwind barrier plus
//!   the microsecond budget are the contract that keeps it safe there.
//! - The deadline comes from the cached [`Clock`], started lazily on first
//!   mask and stopped when the `Masker` drops.

pub(crate) mod tables;
pub(crate) mod trie;

mod filter;
mod matcher;


pub use filter::default_key_filter;

use self::trie::Trie;
use crate::api::{KeyFilter, MaskOutcome, Redactor, RuleUpdate};
use crate::clock::Clock;
use crate::error::MergeError;
use ahash::AHashMap;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

/// A named rule as held in the registry: canonical lower-cased keys plus the
/// redaction plumbing.
pub(crate) struct RuleEntry {
    pub(crate) desc: String,
    pub(crate) redactor: Option<Redactor>,
    pub(crate) window: usize,
    pub(crate) keys: BTreeSet<String>,
}

/// Masking context: rule registry, compiled trie, boundary filter, and the
/// deadline clock.
///
/// Configuration (merging rules, installing a filter) is expected during
/// program initialisation; scans on other threads keep using the previously
/// published trie while a merge is in flight.
pub struct Masker {
    registry: Mutex<AHashMap<String, RuleEntry>>,
    trie: RwLock<Arc<Trie>>,
    filter: RwLock<Arc<KeyFilter>>,
    clock: OnceLock<Clock>,
}

impl Masker {
    /// Creates an empty masker. Nothing matches until rules are merged.
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(AHashMap::new()),
            trie: RwLock::new(Arc::new(Trie::empty())),
            filter: RwLock::new(Arc::new(default_key_filter)),
            clock: OnceLock::new(),
        }
    }

    /// Merges `rules` into the registry and republishes the trie.
    ///
    /// Rule names are processed in lexicographic order. For an existing rule,
    /// non-empty/non-zero/`Some` fields overwrite and keys are unioned; a new
    /// rule is inserted with lower-cased, deduplicated keys. Any invalid key
    /// fails the whole batch with no state change.
    pub fn merge_rules(&self, rules: BTreeMap<String, RuleUpdate>) -> Result<(), MergeError> {
        for rule in rules.values() {
            for key in &rule.keys {
                validate_key(key)?;
            }
        }

        let mut registry = self.registry.lock().unwrap();
        for (name, update) in rules {
            match registry.entry(name) {
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    if update.redactor.is_some() {
                        existing.redactor = update.redactor;
                    }
                    if !update.desc.is_empty() {
                        existing.desc = update.desc;
                    }
                    if update.window > 0 {
                        existing.window = update.window;
                    }
                    for key in update.keys {
                        existing.keys.insert(key.to_ascii_lowercase());
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(RuleEntry {
                        desc: update.desc,
                        redactor: update.redactor,
                        window: update.window,
                        keys: update
                            .keys
                            .iter()
                            .map(|key| key.to_ascii_lowercase())
                            .collect(),
                    });
                }
            }
        }

        let trie = Trie::build(&registry);
        tracing::debug!(
            rules = registry.len(),
            nodes = trie.node_count(),
            "rebuilt masking trie"
        );
        *self.trie.write().unwrap() = Arc::new(trie);
        Ok(())
    }

    /// Masks `buf` in place within `budget_micros` microseconds of wall
    /// time.
    ///
    /// Matches are applied in reverse order of occurrence so earlier
    /// positions stay valid whatever a redactor writes. The outcome's
    /// `intercepted` flag reports a budget overrun or a panicking
    /// filter/redactor; either way the buffer holds whatever redactions were
    /// already applied.
    pub fn mask(&self, buf: &mut [u8], budget_micros: i64) -> MaskOutcome {
        self.mask_inner(buf, budget_micros, None)
    }

    #[cfg(test)]
    pub(crate) fn mask_paused(
        &self,
        buf: &mut [u8],
        budget_micros: i64,
        pause: fn(),
    ) -> MaskOutcome {
        self.mask_inner(buf, budget_micros, Some(pause))
    }

    fn mask_inner(&self, buf: &mut [u8], budget_micros: i64, pause: Option<fn()>) -> MaskOutcome {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let trie = self.trie.read().unwrap().clone();
            let filter = self.filter.read().unwrap().clone();
            let (positions, intercepted) =
                trie.match_into(buf, &*filter, self.clock(), budget_micros, pause);

            for hit in positions.iter().rev() {
                let rule = trie.rule(hit.rule);
                let window_end = (hit.end + 1 + rule.window).min(buf.len());
                if let Some(redactor) = rule.redactor {
                    redactor(&mut buf[hit.end + 1..window_end]);
                }
            }
            intercepted
        }));
        MaskOutcome {
            intercepted: outcome.unwrap_or(true),
        }
    }

    /// Installs a custom boundary filter in place of
    /// [`default_key_filter`].
    pub fn set_key_filter<F>(&self, filter: F)
    where
        F: Fn(&[u8], usize, usize, bool, bool) -> bool + Send + Sync + 'static,
    {
        *self.filter.write().unwrap() = Arc::new(filter);
    }

    /// Returns every registered key in canonical lower-cased `[*]stem[*]`
    /// form, sorted.
    pub fn dump_keys(&self) -> Vec<String> {
        self.trie.read().unwrap().dump_keys()
    }

    fn clock(&self) -> &Clock {
        self.clock.get_or_init(Clock::start)
    }
}

impl Default for Masker {
    fn default() -> Self {
        Self::new()
    }
}

/// A key must reduce to a non-empty stem of key-legal ASCII after stripping
/// at most one leading and one trailing `*`.
fn validate_key(key: &str) -> Result<(), MergeError> {
    let mut stem = key.as_bytes();
    if let [b'*', rest @ ..] = stem {
        stem = rest;
    }
    if let [rest @ .., b'*'] = stem {
        stem = rest;
    }
    if stem.is_empty() || stem.iter().any(|&b| tables::char_index(b) < 0) {
        return Err(MergeError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}
