//! Compressed radix tree (Patricia trie) keyed by strings.
//!
//! Nodes live in a `Vec` arena and link to each other by index, which keeps
//! the tree compact and lets iterators hold plain indices instead of borrows.
//! The tree supports exact lookup, prefix descent, ordered iteration and
//! bounded Levenshtein search.

pub(crate) mod node;
pub mod fuzzy;
pub mod iter;
pub mod tree;

pub use fuzzy::FuzzyResults;
pub use iter::{Entries, Iter, Keys, TreeIterator, Values};
pub use tree::RadixTree;
