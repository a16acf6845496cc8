//! Keyword-triggered, in-place redaction of sensitive tokens in byte
//! payloads.
//!
//! The engine locates registered keywords (case-insensitive, with optional
//! leading/trailing `*` wildcards) in a caller-supplied buffer, validates
//! each hit against a word-boundary filter, and hands the bytes just after
//! the keyword to that rule's redactor, which overwrites the sensitive run
//! in place. Scans carry a microsecond budget and self-interrupt when it is
//! exceeded, and a panic barrier guarantees nothing ever unwinds into the
//! caller — the properties that make the engine safe on logging and
//! request-path code.
//!
//! High-level flow (single buffer):
//! 1) Rules are merged into a registry; keys are lower-cased, deduplicated,
//!    and compiled into an immutable trie published behind a shared pointer.
//! 2) `mask` walks the buffer through the trie byte by byte, emitting
//!    boundary-validated hits and polling a cached clock every 128 bytes.
//! 3) Hits are applied in reverse order of occurrence: each rule's redactor
//!    rewrites a bounded window after its keyword.
//!
//! A process-wide default [`Masker`] backs the free functions; embedders
//! that want isolated rulesets construct their own instances.
//!
//! ```
//! use masker_rs::{RuleUpdate, redactors};
//! use std::collections::BTreeMap;
//!
//! let masker = masker_rs::Masker::new();
//! let mut rules = BTreeMap::new();
//! rules.insert("phone".to_string(), RuleUpdate {
//!     desc: "mobile phone numbers".into(),
//!     redactor: Some(redactors::phone_redactor),
//!     window: 30,
//!     keys: vec!["cell".into(), "phone".into()],
//! });
//! masker.merge_rules(rules).unwrap();
//!
//! let mut line = b"cell:12345678900".to_vec();
//! masker.mask(&mut line, 2_000);
//! assert_eq!(&line, b"cell:123****8900");
//! ```

pub mod api;
pub mod engine;
pub mod redactors;

mod clock;
mod error;

pub use api::{KeyFilter, MaskOutcome, Redactor, RuleUpdate};
pub use engine::{default_key_filter, Masker};
pub use error::MergeError;

use std::collections::BTreeMap;
use std::sync::OnceLock;

static DEFAULT: OnceLock<Masker> = OnceLock::new();

/// Process-wide default [`Masker`] backing the free functions.
pub fn default_masker() -> &'static Masker {
    DEFAULT.get_or_init(Masker::new)
}

/// Merges `rules` into the default instance and rebuilds its trie.
pub fn merge_rules(rules: BTreeMap<String, RuleUpdate>) -> Result<(), MergeError> {
    default_masker().merge_rules(rules)
}

/// Masks `buf` in place against the default instance's ruleset.
pub fn mask(buf: &mut [u8], budget_micros: i64) -> MaskOutcome {
    default_masker().mask(buf, budget_micros)
}

/// Installs `filter` as the default instance's boundary filter.
pub fn set_key_filter<F>(filter: F)
where
    F: Fn(&[u8], usize, usize, bool, bool) -> bool + Send + Sync + 'static,
{
    default_masker().set_key_filter(filter)
}

/// Lists the default instance's canonical keys, sorted.
pub fn dump_keys() -> Vec<String> {
    default_masker().dump_keys()
}
