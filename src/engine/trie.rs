//! Keyword trie: node model, construction from the rule registry, and the
//! key dump traversal.
//!
//! Purpose: compile the registry's keyword stems into an immutable,
//! case-insensitive prefix tree that the scanner walks byte by byte.
//!
//! # Layout
//! Nodes live in an arena `Vec` and refer to each other by `u32` index, so
//! the `last_end` back-chain never forms an ownership cycle: it always points
//! at a shallower node constructed earlier. Each node keeps
//! [`SECTION_COUNT`] small child buckets plus a 64-bit presence bitmap over
//! the dense character index; most nodes have very few children, so the
//! bitmap gives O(1) negative lookups while the buckets stay cache-resident.
//!
//! # Invariants
//! - Buckets are sorted by raw byte value (binary-searchable).
//! - Letter edges are registered under both case variants pointing at the
//!   same child, so lookup needs no per-step folding.
//! - Every terminal node carries a valid rule id.
//! - Stems are inserted shortest-first, so a terminal prefix already exists
//!   when a longer stem extends it and can be recorded as `last_end`.

use super::tables::CHAR_INDEX;
use super::RuleEntry;
use crate::api::Redactor;
use ahash::AHashMap;
use std::collections::BTreeSet;

/// Number of child buckets per node. Letters of both cases share a dense
/// index, so they land in the same bucket by construction.
pub(crate) const SECTION_COUNT: usize = 7;

/// Arena index of the root node.
pub(crate) const ROOT: u32 = 0;

/// Child edge: a raw byte and the arena index it leads to.
#[derive(Clone, Copy, Debug)]
struct CharEdge {
    byte: u8,
    node: u32,
}

pub(crate) struct TrieNode {
    children: [Vec<CharEdge>; SECTION_COUNT],
    bitmap: u64,
    /// Distance from the root; 1 for the root's direct children.
    pub(crate) depth: u32,
    /// Some registered stem ends here.
    pub(crate) end: bool,
    pub(crate) any_start: bool,
    pub(crate) any_end: bool,
    /// Rule id completed at this node; meaningful only when `end` is set.
    pub(crate) rule: u32,
    /// Nearest terminal ancestor, recorded at construction time.
    pub(crate) last_end: Option<u32>,
}

impl TrieNode {
    fn new(depth: u32, last_end: Option<u32>) -> Self {
        Self {
            children: std::array::from_fn(|_| Vec::new()),
            bitmap: 0,
            depth,
            end: false,
            any_start: false,
            any_end: false,
            rule: 0,
            last_end,
        }
    }
}

/// Rule fields the scanner and masking dispatch need per hit.
pub(crate) struct CompiledRule {
    pub(crate) redactor: Option<Redactor>,
    pub(crate) window: usize,
}

/// Immutable keyword trie plus its compiled rule table.
///
/// Built once per merge and published behind an `Arc`; scans hold no locks
/// against it.
pub(crate) struct Trie {
    nodes: Vec<TrieNode>,
    rules: Vec<CompiledRule>,
}

impl Trie {
    /// A trie with only the root: matches nothing.
    pub(crate) fn empty() -> Self {
        Self {
            nodes: vec![TrieNode::new(0, None)],
            rules: Vec::new(),
        }
    }

    /// Compiles the full registry into a fresh trie.
    pub(crate) fn build(registry: &AHashMap<String, RuleEntry>) -> Self {
        let mut names: Vec<&str> = registry.keys().map(String::as_str).collect();
        names.sort_unstable();

        // Flat keyword -> rule-id table. On cross-rule duplicates the
        // lexicographically later rule wins, deterministically.
        let mut rules = Vec::with_capacity(names.len());
        let mut keyword_rule: AHashMap<&str, u32> = AHashMap::new();
        let mut keywords: Vec<&str> = Vec::new();
        for name in &names {
            let entry = &registry[*name];
            let rule_id = rules.len() as u32;
            rules.push(CompiledRule {
                redactor: entry.redactor,
                window: entry.window,
            });
            for key in &entry.keys {
                if keyword_rule.insert(key.as_str(), rule_id).is_none() {
                    keywords.push(key.as_str());
                }
            }
        }
        keywords.sort_unstable_by(|a, b| a.len().cmp(&b.len()).then(a.cmp(b)));

        // Stem canonicalisation: wildcard flags are unioned per stem, which
        // is why only "*abc*" survives when all four variants exist.
        struct Parsed<'a> {
            stem: &'a str,
            any_start: bool,
            any_end: bool,
            rule: u32,
        }
        let mut parsed: Vec<Parsed<'_>> = Vec::with_capacity(keywords.len());
        let mut stem_index: AHashMap<&str, usize> = AHashMap::new();
        for raw in keywords {
            let rule = keyword_rule[raw];
            let (stem, any_start, any_end) = split_wildcards(raw);
            debug_assert!(!stem.is_empty(), "validation rejects empty stems");
            match stem_index.get(stem) {
                Some(&at) => {
                    parsed[at].any_start |= any_start;
                    parsed[at].any_end |= any_end;
                }
                None => {
                    stem_index.insert(stem, parsed.len());
                    parsed.push(Parsed {
                        stem,
                        any_start,
                        any_end,
                        rule,
                    });
                }
            }
        }

        // Shorter stems first, then lexicographic: a prefix's terminal node
        // must exist before any stem that extends it is inserted.
        parsed.sort_unstable_by(|a, b| a.stem.len().cmp(&b.stem.len()).then(a.stem.cmp(b.stem)));

        let mut nodes = vec![TrieNode::new(0, None)];
        for p in &parsed {
            let stem = p.stem.as_bytes();
            let mut current = ROOT;
            let mut last_end = None;
            let mut i = 0;

            // Walk the existing prefix, remembering the deepest terminal.
            while i < stem.len() {
                match next_of(&nodes, current, stem[i]) {
                    Some(next) => {
                        current = next;
                        if nodes[next as usize].end {
                            last_end = Some(next);
                        }
                        i += 1;
                    }
                    None => break,
                }
            }

            // Append the remainder; every new node carries the nearest
            // terminal ancestor seen along the walk.
            while i < stem.len() {
                let id = nodes.len() as u32;
                nodes.push(TrieNode::new(i as u32 + 1, last_end));
                set_edge(&mut nodes[current as usize], stem[i], id);
                current = id;
                i += 1;
            }

            // The merged stem's rule is whichever rule registered the
            // reconstructed canonical form; fall back to the first variant
            // seen when the union produced a form nobody registered.
            let canonical = canonical_form(p.stem, p.any_start, p.any_end);
            let rule = keyword_rule
                .get(canonical.as_str())
                .copied()
                .unwrap_or(p.rule);

            let node = &mut nodes[current as usize];
            node.end = true;
            node.rule = rule;
            node.any_start = p.any_start;
            node.any_end = p.any_end;
        }

        Self { nodes, rules }
    }

    #[inline]
    pub(crate) fn next_node(&self, node: u32, c: u8) -> Option<u32> {
        next_of(&self.nodes, node, c)
    }

    #[inline]
    pub(crate) fn node(&self, id: u32) -> &TrieNode {
        &self.nodes[id as usize]
    }

    pub(crate) fn rule(&self, id: u32) -> &CompiledRule {
        &self.rules[id as usize]
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Reverse-parses every key in the trie into its canonical lower-cased
    /// `[*]stem[*]` form, sorted.
    pub(crate) fn dump_keys(&self) -> Vec<String> {
        let mut out = BTreeSet::new();
        let mut prefix = Vec::new();
        self.collect_keys(ROOT, &mut prefix, &mut out);
        out.into_iter().collect()
    }

    fn collect_keys(&self, id: u32, prefix: &mut Vec<u8>, out: &mut BTreeSet<String>) {
        let node = &self.nodes[id as usize];
        if node.end {
            let mut key = String::with_capacity(prefix.len() + 2);
            if node.any_start {
                key.push('*');
            }
            for &b in prefix.iter() {
                key.push(b.to_ascii_lowercase() as char);
            }
            if node.any_end {
                key.push('*');
            }
            out.insert(key);
        }
        // Case-variant edges revisit the same child; the set dedupes them.
        for bucket in &node.children {
            for edge in bucket {
                prefix.push(edge.byte);
                self.collect_keys(edge.node, prefix, out);
                prefix.pop();
            }
        }
    }
}

/// Strips at most one leading and one trailing `*` from a raw keyword.
fn split_wildcards(key: &str) -> (&str, bool, bool) {
    let mut stem = key;
    let any_start = stem.starts_with('*');
    if any_start {
        stem = &stem[1..];
    }
    let any_end = stem.ends_with('*');
    if any_end {
        stem = &stem[..stem.len() - 1];
    }
    (stem, any_start, any_end)
}

fn canonical_form(stem: &str, any_start: bool, any_end: bool) -> String {
    let mut key = String::with_capacity(stem.len() + 2);
    if any_start {
        key.push('*');
    }
    key.push_str(stem);
    if any_end {
        key.push('*');
    }
    key
}

/// Child lookup on byte `c`, shared by construction and the scanner.
#[inline]
fn next_of(nodes: &[TrieNode], node: u32, c: u8) -> Option<u32> {
    if c >= 128 {
        return None;
    }
    let m = CHAR_INDEX[c as usize];
    if m < 0 {
        return None;
    }
    let n = &nodes[node as usize];
    if n.bitmap & (1u64 << (m as u32)) == 0 {
        return None;
    }
    let bucket = &n.children[m as usize % SECTION_COUNT];
    match bucket.len() {
        1 => (bucket[0].byte == c).then_some(bucket[0].node),
        2 => {
            if bucket[0].byte == c {
                return Some(bucket[0].node);
            }
            (bucket[1].byte == c).then_some(bucket[1].node)
        }
        _ => bucket
            .binary_search_by_key(&c, |e| e.byte)
            .ok()
            .map(|at| bucket[at].node),
    }
}

/// Registers the edge `parent --c--> child`, under both case variants for
/// letters. Stems reach construction lower-cased.
fn set_edge(parent: &mut TrieNode, c: u8, child: u32) {
    let m = CHAR_INDEX[c as usize];
    debug_assert!(m >= 0, "edge byte must be key-legal");
    parent.bitmap |= 1u64 << (m as u32);
    let bucket = &mut parent.children[m as usize % SECTION_COUNT];
    bucket.push(CharEdge { byte: c, node: child });
    if c.is_ascii_lowercase() {
        bucket.push(CharEdge {
            byte: c.to_ascii_uppercase(),
            node: child,
        });
    }
    bucket.sort_unstable_by_key(|e| e.byte);
}
