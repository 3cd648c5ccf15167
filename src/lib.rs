//! # `searchable-map` - Radix Tree Map with Prefix Views and Fuzzy Lookup
//!
//! A string-keyed map stored as a compressed radix tree (Patricia trie). It
//! is the inverted-index building block of a full-text search engine: exact
//! lookups, cheap live views restricted to a key prefix, ordered lazy
//! iteration, and bounded Levenshtein search.
//!
//! ## Architecture
//!
//! 1. **Radix tree storage** ([`RadixTree`]):
//!    - Nodes in a `Vec` arena, linked by index, with a free list
//!    - Edges labelled by non-empty strings, siblings sorted by first character
//!    - Eager edge splitting on insert and chain merging on removal
//!    - Per-node subtree counts for O(1) size
//!
//! 2. **Map facade** ([`SearchableMap`]):
//!    - Map-like API: `set`, `get`, `has`, `delete`, `fetch`, `update`, ...
//!    - Views from [`SearchableMap::at_prefix`] share the tree by reference
//!    - `serde` support as a plain `{key: value}` map
//!
//! 3. **Search** ([`FuzzyResults`]):
//!    - Trie walk with one edit-distance row per character, pruned by the
//!      row minimum
//!
//! The map is single threaded (`!Send`, `!Sync`) and performs no I/O.
//!
//! ## Example
//!
//! ```rust
//! use searchable_map::SearchableMap;
//!
//! let mut map = SearchableMap::new();
//! map.set("hello", "world").set("hell", "yeah").set("ciao", "mondo");
//!
//! let results = map.fuzzy_get("hallo", 2);
//! assert_eq!(results.get("hello"), Some((&"world", 1)));
//! assert_eq!(results.get("hell"), Some((&"yeah", 2)));
//! assert!(!results.contains_key("ciao"));
//!
//! let hel = map.at_prefix("hel");
//! assert_eq!(hel.size(), 2);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

#[macro_use]
mod log;

pub mod error;
pub mod map;
pub mod trie;

pub use error::{Result, SearchError};
pub use map::SearchableMap;
pub use trie::{Entries, FuzzyResults, Iter, Keys, RadixTree, TreeIterator, Values};
