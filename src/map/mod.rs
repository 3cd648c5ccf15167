//! Map-like facade over a shared [`RadixTree`].
//!
//! A [`SearchableMap`] owns a handle to a radix tree plus a key prefix. The
//! root map has an empty prefix; [`SearchableMap::at_prefix`] produces views
//! that share the same tree and only see the keys under their prefix.
//! Mutations through any view are visible through every other view.
//!
//! # Keys on views
//!
//! Every key a view hands out (iteration, fuzzy results) is complete. Every
//! key it accepts is mapped to a complete key by one rule, the same for reads
//! and writes: a key that already starts with the view's prefix is complete,
//! any other key is relative and gets the prefix prepended. A relative key
//! that itself starts with the prefix can therefore only be reached through
//! its complete form.
//!
//! ```rust
//! use searchable_map::SearchableMap;
//!
//! let map: SearchableMap<u32> =
//!     [("unicorn", 1), ("universe", 2), ("unique", 4)].into_iter().collect();
//! let uni = map.at_prefix("uni");
//! assert_eq!(uni.get("que"), Some(4));
//! assert_eq!(uni.get("unique"), Some(4));
//! assert_eq!(uni.keys().collect::<Vec<_>>(), ["unicorn", "unique", "universe"]);
//!
//! // already starts with "uni", so this writes "uni" itself
//! let mut uni = uni;
//! uni.set("uni", 5);
//! assert_eq!(map.get("uni"), Some(5));
//! ```
//!
//! # Mutation during iteration
//!
//! Iterators borrow the tree only while producing each item. Mutating a map
//! while one of its iterators is alive is memory safe, but the remaining
//! items are unspecified.

mod serialize;

use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, SearchError};
use crate::trie::{Entries, FuzzyResults, Keys, RadixTree, TreeIterator, Values};

/// A string-keyed map backed by a radix tree, with prefix views and fuzzy
/// lookup.
///
/// Cloning a `SearchableMap` clones the handle: both clones share the tree.
/// Use [`deep_clone`](Self::deep_clone) for an independent copy.
pub struct SearchableMap<T> {
    tree: Rc<RefCell<RadixTree<T>>>,
    prefix: String,
}

impl<T> Default for SearchableMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SearchableMap<T> {
    fn clone(&self) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
            prefix: self.prefix.clone(),
        }
    }
}

impl<T> SearchableMap<T> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::from_tree(RadixTree::new())
    }

    /// Creates an empty map with room for `capacity` tree nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_tree(RadixTree::with_capacity(capacity))
    }

    /// Wraps an existing tree.
    pub fn from_tree(tree: RadixTree<T>) -> Self {
        Self {
            tree: Rc::new(RefCell::new(tree)),
            prefix: String::new(),
        }
    }

    /// Prefix of this view. Empty for a root map.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `other` reads and writes the same tree.
    pub fn shares_tree_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }

    /// Runs `f` with read access to the underlying tree.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this map or one of its views.
    pub fn inspect_tree<R>(&self, f: impl FnOnce(&RadixTree<T>) -> R) -> R {
        f(&self.tree.borrow())
    }

    fn join(&self, suffix: &str) -> String {
        let mut joined = String::with_capacity(self.prefix.len() + suffix.len());
        joined.push_str(&self.prefix);
        joined.push_str(suffix);
        joined
    }

    /// Complete key addressed by `key` on this map or view.
    fn full_key(&self, key: &str) -> String {
        if key.starts_with(self.prefix.as_str()) {
            key.to_owned()
        } else {
            self.join(key)
        }
    }

    /// Returns a live view of the keys starting with `prefix`.
    ///
    /// The view shares the tree with `self`. A prefix that matches no stored
    /// key gives a valid, empty view. On a view, prefixes concatenate.
    pub fn at_prefix(&self, prefix: &str) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
            prefix: self.join(prefix),
        }
    }

    /// Number of keys visible through this map or view.
    pub fn size(&self) -> usize {
        self.tree.borrow().count_prefix(&self.prefix)
    }

    /// Alias of [`size`](Self::size).
    pub fn len(&self) -> usize {
        self.size()
    }

    /// Returns true if no key is visible through this map or view.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns true if `key` is stored.
    pub fn has(&self, key: &str) -> bool {
        self.tree.borrow().contains_key(&self.full_key(key))
    }

    /// Runs `f` on the value stored at `key` without cloning it.
    pub fn with_value<R>(&self, key: &str, f: impl FnOnce(&T) -> R) -> Option<R> {
        let full = self.full_key(key);
        let tree = self.tree.borrow();
        tree.get(&full).map(f)
    }

    /// Stores `value` at `key`, replacing any previous value. Chainable.
    pub fn set(&mut self, key: &str, value: T) -> &mut Self {
        self.insert(key, value);
        self
    }

    /// Stores `value` at `key` and returns the previous value.
    pub fn insert(&mut self, key: &str, value: T) -> Option<T> {
        let full = self.full_key(key);
        self.tree.borrow_mut().insert(&full, value)
    }

    /// Removes `key`. Returns true if it was present; missing keys are a no-op.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove(key).is_some()
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: &str) -> Option<T> {
        let full = self.full_key(key);
        self.tree.borrow_mut().remove(&full)
    }

    /// Removes every key visible through this map or view. On a view only the
    /// subtree under the prefix is cleared.
    pub fn clear(&mut self) {
        let mut tree = self.tree.borrow_mut();
        if self.prefix.is_empty() {
            tree.clear();
        } else {
            tree.remove_prefix(&self.prefix);
        }
    }

    /// Lazy iterator over `(key, value)` pairs, in key order.
    pub fn entries(&self) -> Entries<T> {
        TreeIterator::new(Rc::clone(&self.tree), &self.prefix)
    }

    /// Lazy iterator over keys, in key order.
    pub fn keys(&self) -> Keys<T> {
        Keys(self.entries())
    }

    /// Lazy iterator over values, in key order.
    pub fn values(&self) -> Values<T> {
        Values(self.entries())
    }

    /// Builds a map from `(key, value)` pairs. Later pairs overwrite earlier
    /// ones with the same key.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, T)>,
    {
        entries.into_iter().collect()
    }

    /// Builds a map from a plain record such as a `HashMap` or `BTreeMap`.
    pub fn from_object<K, R>(object: R) -> Self
    where
        K: AsRef<str>,
        R: IntoIterator<Item = (K, T)>,
    {
        object.into_iter().collect()
    }

    /// Fallible variant of [`fetch`](Self::fetch).
    ///
    /// # Errors
    ///
    /// Returns the error of `initial` unchanged; the map is not modified.
    pub fn try_fetch<E>(&mut self, key: &str, initial: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        T: Clone,
    {
        if let Some(existing) = self.get(key) {
            return Ok(existing);
        }
        let value = initial()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Fallible variant of [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Returns the error of `f` unchanged; the map is not modified.
    pub fn try_update<E>(
        &mut self,
        key: &str,
        f: impl FnOnce(Option<&T>) -> Result<T, E>,
    ) -> Result<&mut Self, E>
    where
        T: Clone,
    {
        let full = self.full_key(key);
        let current = self.tree.borrow().get(&full).cloned();

        // `f` runs with the tree unborrowed so it may read the map.
        let next = f(current.as_ref())?;
        self.tree.borrow_mut().insert(&full, next);
        Ok(self)
    }
}

impl<T: Clone> SearchableMap<T> {
    /// Returns a clone of the value stored at `key`.
    pub fn get(&self, key: &str) -> Option<T> {
        self.with_value(key, T::clone)
    }

    /// Returns the value at `key`, first storing `initial()` there if the key
    /// is missing. `initial` is only called on a miss.
    pub fn fetch(&mut self, key: &str, initial: impl FnOnce() -> T) -> T {
        match self.try_fetch(key, || Ok::<T, Infallible>(initial())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Stores `f(current value)` at `key`. `f` is always called and the result
    /// is always stored. Chainable.
    pub fn update(&mut self, key: &str, f: impl FnOnce(Option<&T>) -> T) -> &mut Self {
        match self.try_update(key, |current| Ok::<T, Infallible>(f(current))) {
            Ok(map) => map,
            Err(never) => match never {},
        }
    }

    /// Calls `f(key, value, map)` for every entry, in key order.
    pub fn for_each(&self, mut f: impl FnMut(&str, &T, &Self)) {
        for (key, value) in self.entries() {
            f(&key, &value, self);
        }
    }

    /// Finds every key within `max_edit_distance` edits of `key`.
    ///
    /// On a view, `key` is matched against the part of each stored key that
    /// follows the prefix, and the reported keys are complete.
    pub fn fuzzy_get(&self, key: &str, max_edit_distance: usize) -> FuzzyResults<T> {
        self.tree
            .borrow()
            .fuzzy_search_prefix(&self.prefix, key, max_edit_distance)
            .cloned()
    }

    /// [`fuzzy_get`](Self::fuzzy_get) for callers holding a signed distance.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::NegativeEditDistance`] before searching if
    /// `max_edit_distance` is negative.
    pub fn try_fuzzy_get(&self, key: &str, max_edit_distance: i64) -> Result<FuzzyResults<T>> {
        if max_edit_distance < 0 {
            return Err(SearchError::NegativeEditDistance(max_edit_distance));
        }
        let max = usize::try_from(max_edit_distance).unwrap_or(usize::MAX);
        Ok(self.fuzzy_get(key, max))
    }

    /// Copies the visible entries into a new, independent map.
    pub fn deep_clone(&self) -> Self {
        self.entries().collect()
    }
}

impl<T: Clone> IntoIterator for &SearchableMap<T> {
    type Item = (String, T);
    type IntoIter = Entries<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

impl<K: AsRef<str>, T> FromIterator<(K, T)> for SearchableMap<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: AsRef<str>, T> Extend<(K, T)> for SearchableMap<T> {
    fn extend<I: IntoIterator<Item = (K, T)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key.as_ref(), value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SearchableMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.tree.borrow();
        f.debug_map().entries(tree.iter_prefix(&self.prefix)).finish()
    }
}

impl<T: PartialEq> PartialEq for SearchableMap<T> {
    fn eq(&self, other: &Self) -> bool {
        let ours = self.tree.borrow();
        let theirs = other.tree.borrow();
        ours.iter_prefix(&self.prefix)
            .eq(theirs.iter_prefix(&other.prefix))
    }
}
