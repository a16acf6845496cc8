//! Public API data types for configuring the masker and reporting results.
//!
//! Purpose: provide the shared configuration and result types used by the
//! engine and its callers. These types are intentionally behavior-free; the
//! engine performs validation and canonicalisation when rules are merged.
//!
//! # Invariants
//! - Rule keys are ASCII: letters, digits, `-`, `_`, `@`, plus at most one
//!   leading and one trailing `*`. Anything else is rejected by
//!   [`Masker::merge_rules`](crate::Masker::merge_rules) before any state
//!   changes.
//! - A redactor only ever overwrites bytes inside the window it is handed;
//!   it cannot change the buffer length.

/// In-place byte rewriter invoked on the payload window after a keyword hit.
///
/// The window starts at the byte following the matched keyword and extends at
/// most the rule's `window` bytes (truncated at end of buffer). A redactor
/// scans the window for the token shape it recognises and overwrites part of
/// it with `*`; it must leave the window alone when nothing matches.
///
/// Kept as a plain function pointer: dispatch happens once per hit, and a
/// pointer keeps [`RuleUpdate`] cheap to clone and compare in tests. See
/// [`crate::redactors`] for the built-in implementations.
pub type Redactor = fn(&mut [u8]);

/// Boundary-validation callback consulted for every candidate keyword hit.
///
/// Receives the whole buffer, the inclusive match range, and the keyword's
/// `any_start`/`any_end` wildcard flags. Returning `false` drops the
/// candidate. The default is [`crate::default_key_filter`].
pub type KeyFilter = dyn Fn(&[u8], usize, usize, bool, bool) -> bool + Send + Sync;

/// Upsert payload for [`Masker::merge_rules`](crate::Masker::merge_rules).
///
/// Field semantics on update of an existing rule:
/// - `desc`: empty keeps the existing description.
/// - `redactor`: `None` keeps the existing redactor.
/// - `window`: `0` keeps the existing window length.
/// - `keys`: unioned (lower-cased) into the existing key set.
#[derive(Clone, Debug, Default)]
pub struct RuleUpdate {
    /// Human description of what the rule redacts.
    pub desc: String,
    /// The rule's in-place redactor.
    pub redactor: Option<Redactor>,
    /// Maximum number of bytes past the keyword the redactor may touch.
    pub window: usize,
    /// Keyword patterns; `*` allowed only as the first or last byte.
    pub keys: Vec<String>,
}

/// Result of a masking pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaskOutcome {
    /// The scan exceeded its time budget or a filter/redactor panicked.
    /// Matches emitted before the interruption have still been applied, so
    /// the buffer may be partially redacted.
    pub intercepted: bool,
}
