//! Bounded Levenshtein search over the radix tree.
//!
//! The search walks the tree depth first while keeping one dynamic
//! programming row per consumed character. Row `m` holds the edit distances
//! between the first `m` characters of the current path and every prefix of
//! the query. A branch is abandoned as soon as the smallest entry of its
//! latest row exceeds the allowed distance, since descending can only make
//! distances grow.

use indexmap::IndexMap;

use super::tree::{Cursor, RadixTree};

/// Matches of a fuzzy search: key to `(value, edit distance)`.
///
/// Entries keep the order in which they were discovered, which for a search
/// over a [`RadixTree`] is key order. A key appears at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyResults<V> {
    matches: IndexMap<String, (V, usize)>,
}

impl<V> Default for FuzzyResults<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FuzzyResults<V> {
    /// Creates an empty result set.
    pub fn new() -> Self {
        Self {
            matches: IndexMap::new(),
        }
    }

    /// Records a match. If the key is already present, the smaller distance wins.
    pub fn record(&mut self, key: &str, value: V, distance: usize) {
        match self.matches.get_mut(key) {
            Some(existing) if existing.1 <= distance => {}
            Some(existing) => *existing = (value, distance),
            None => {
                self.matches.insert(key.to_owned(), (value, distance));
            }
        }
    }

    /// Value and distance recorded for `key`.
    pub fn get(&self, key: &str) -> Option<(&V, usize)> {
        self.matches.get(key).map(|(value, distance)| (value, *distance))
    }

    /// Distance recorded for `key`.
    pub fn distance(&self, key: &str) -> Option<usize> {
        self.matches.get(key).map(|&(_, distance)| distance)
    }

    /// Returns true if `key` matched.
    pub fn contains_key(&self, key: &str) -> bool {
        self.matches.contains_key(key)
    }

    /// Number of matched keys.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Iterates over `(key, value, distance)` in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V, usize)> {
        self.matches
            .iter()
            .map(|(key, (value, distance))| (key.as_str(), value, *distance))
    }

    /// Iterates over matched keys in discovery order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.matches.keys().map(String::as_str)
    }

    /// Consumes the results, ordered by ascending distance. Ties keep
    /// discovery order.
    pub fn into_sorted_by_distance(self) -> Vec<(String, V, usize)> {
        let mut sorted: Vec<(String, V, usize)> = self
            .matches
            .into_iter()
            .map(|(key, (value, distance))| (key, value, distance))
            .collect();
        sorted.sort_by_key(|&(_, _, distance)| distance);
        sorted
    }

    /// Transforms every recorded value.
    pub fn map_values<U>(self, mut f: impl FnMut(V) -> U) -> FuzzyResults<U> {
        FuzzyResults {
            matches: self
                .matches
                .into_iter()
                .map(|(key, (value, distance))| (key, (f(value), distance)))
                .collect(),
        }
    }
}

impl<V: Clone> FuzzyResults<&V> {
    /// Clones the borrowed values out of the tree.
    pub fn cloned(self) -> FuzzyResults<V> {
        self.map_values(Clone::clone)
    }
}

impl<V> IntoIterator for FuzzyResults<V> {
    type Item = (String, (V, usize));
    type IntoIter = indexmap::map::IntoIter<String, (V, usize)>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

impl<T> RadixTree<T> {
    /// Finds every key within `max_distance` edits of `query`.
    ///
    /// Insertions, deletions and substitutions each cost one. Exact matches
    /// are included with distance 0.
    pub fn fuzzy_search(&self, query: &str, max_distance: usize) -> FuzzyResults<&T> {
        self.fuzzy_search_prefix("", query, max_distance)
    }

    /// Fuzzy search restricted to the keys starting with `prefix`.
    ///
    /// Distances are measured between `query` and the part of each key that
    /// follows `prefix`; the reported keys are complete.
    pub fn fuzzy_search_prefix(
        &self,
        prefix: &str,
        query: &str,
        max_distance: usize,
    ) -> FuzzyResults<&T> {
        match self.locate(prefix) {
            Some(cursor) => search(self, &cursor, prefix, query, max_distance),
            None => FuzzyResults::new(),
        }
    }
}

struct Matrix<'q> {
    query: &'q [char],
    width: usize,
    rows: Vec<usize>,
    max_distance: usize,
    max_depth: usize,
}

impl Matrix<'_> {
    /// Feeds the characters of `label` after row `depth`.
    /// Returns the new depth, or `None` once the branch cannot match.
    fn extend(&mut self, key: &mut String, label: &str, mut depth: usize) -> Option<usize> {
        self.rows.truncate((depth + 1) * self.width);
        for c in label.chars() {
            if depth >= self.max_depth {
                return None;
            }
            let prev = depth * self.width;
            let curr = prev + self.width;
            depth += 1;

            self.rows.push(depth);
            let mut row_min = depth;
            for j in 1..self.width {
                let substitution = self.rows[prev + j - 1] + usize::from(self.query[j - 1] != c);
                let deletion = self.rows[prev + j] + 1;
                let insertion = self.rows[curr + j - 1] + 1;
                let cell = substitution.min(deletion).min(insertion);
                self.rows.push(cell);
                row_min = row_min.min(cell);
            }
            key.push(c);

            if row_min > self.max_distance {
                return None;
            }
        }
        Some(depth)
    }

    fn distance_at(&self, depth: usize) -> usize {
        self.rows[depth * self.width + self.width - 1]
    }
}

struct Search<'a, 'q, T> {
    tree: &'a RadixTree<T>,
    matrix: Matrix<'q>,
    key: String,
    // (node, depth of its parent's row, key length before its label)
    stack: Vec<(usize, usize, usize)>,
    results: FuzzyResults<&'a T>,
}

impl<'a, T> Search<'a, '_, T> {
    /// Records the node's value if it is close enough and schedules its children.
    fn visit(&mut self, idx: usize, depth: usize) {
        let tree = self.tree;
        let node = tree.node(idx);
        if let Some(value) = &node.value {
            let distance = self.matrix.distance_at(depth);
            if distance <= self.matrix.max_distance {
                self.results.record(&self.key, value, distance);
            }
        }
        // reversed so the smallest edge is popped first
        for &(_, child) in node.children.iter().rev() {
            self.stack.push((child, depth, self.key.len()));
        }
    }

    fn run(mut self, start: usize, overshoot: &str) -> FuzzyResults<&'a T> {
        let tree = self.tree;
        if let Some(depth) = self.matrix.extend(&mut self.key, overshoot, 0) {
            self.visit(start, depth);
        }
        while let Some((idx, parent_depth, key_len)) = self.stack.pop() {
            self.key.truncate(key_len);
            let label = &tree.node(idx).label;
            if let Some(depth) = self.matrix.extend(&mut self.key, label, parent_depth) {
                self.visit(idx, depth);
            }
        }
        self.results
    }
}

pub(crate) fn search<'a, T>(
    tree: &'a RadixTree<T>,
    cursor: &Cursor,
    prefix: &str,
    query: &str,
    max_distance: usize,
) -> FuzzyResults<&'a T> {
    let chars: Vec<char> = query.chars().collect();
    let width = chars.len() + 1;
    let search = Search {
        tree,
        matrix: Matrix {
            query: &chars,
            width,
            rows: (0..width).collect(),
            max_distance,
            max_depth: chars.len().saturating_add(max_distance),
        },
        key: String::from(prefix),
        stack: Vec::new(),
        results: FuzzyResults::new(),
    };
    let results = search.run(cursor.node, &cursor.overshoot);

    debug_event!(query, max_distance, matches = results.len(), "fuzzy search finished");
    results
}
