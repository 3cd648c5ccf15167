//! Arena storage and structural operations of the radix tree.

use std::collections::HashSet;

use super::node::{Node, NodeSlot};
use crate::error::{Result, SearchError};

/// Arena index of the root node. The root always exists and has an empty label.
pub(crate) const ROOT: usize = 0;

/// Position reached by descending along a prefix.
///
/// `node` is the highest node whose subtree holds exactly the keys starting
/// with the prefix. When the prefix ends inside an edge label, `overshoot` is
/// the part of that label lying beyond the prefix.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    pub(crate) node: usize,
    pub(crate) ancestors: Vec<usize>,
    pub(crate) overshoot: String,
}

/// A compressed radix tree (Patricia trie) keyed by strings.
///
/// Nodes are stored in a `Vec` arena and linked by index; freed slots are
/// recycled through a free list. Edges are labelled by non-empty strings and
/// siblings never share a first character. Chains of valueless single-child
/// nodes are merged eagerly on removal, so the tree is always fully
/// compressed.
///
/// Every node caches the number of values in its subtree, which makes
/// [`len`](Self::len) O(1) and prefix counts O(len(prefix)).
#[derive(Debug, Clone)]
pub struct RadixTree<T> {
    slots: Vec<NodeSlot<T>>,
    free: Option<usize>,
}

impl<T> Default for RadixTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RadixTree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    /// Creates an empty tree whose arena can hold `capacity` nodes without
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.push(NodeSlot::Occupied(Node::branch("")));
        Self { slots, free: None }
    }

    /// Number of nodes the arena can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of keys stored in the tree.
    pub fn len(&self) -> usize {
        self.node(ROOT).count
    }

    /// Returns true if the tree stores no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.slots.push(NodeSlot::Occupied(Node::branch("")));
        self.free = None;
    }

    pub(crate) fn try_node(&self, idx: usize) -> Option<&Node<T>> {
        match self.slots.get(idx) {
            Some(NodeSlot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    pub(crate) fn node(&self, idx: usize) -> &Node<T> {
        match self.slots.get(idx) {
            Some(NodeSlot::Occupied(node)) => node,
            _ => unreachable!("radix tree link {idx} does not point at a live node"),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<T> {
        match self.slots.get_mut(idx) {
            Some(NodeSlot::Occupied(node)) => node,
            _ => unreachable!("radix tree link {idx} does not point at a live node"),
        }
    }

    fn alloc(&mut self, node: Node<T>) -> usize {
        match self.free {
            Some(idx) => {
                let next = match self.slots[idx] {
                    NodeSlot::Free(next) => next,
                    NodeSlot::Occupied(_) => unreachable!("free list points at a live node"),
                };
                self.free = next;
                self.slots[idx] = NodeSlot::Occupied(node);
                idx
            }
            None => {
                self.slots.push(NodeSlot::Occupied(node));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) -> Node<T> {
        let slot = std::mem::replace(&mut self.slots[idx], NodeSlot::Free(self.free));
        self.free = Some(idx);
        match slot {
            NodeSlot::Occupied(node) => node,
            NodeSlot::Free(_) => unreachable!("released a free slot"),
        }
    }

    fn release_subtree(&mut self, idx: usize) {
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            let node = self.release(current);
            stack.extend(node.children.iter().map(|&(_, child)| child));
        }
    }

    fn grow_counts(&mut self, path: &[usize]) {
        for &idx in path {
            self.node_mut(idx).count += 1;
        }
    }

    fn shrink_counts(&mut self, path: &[usize], by: usize) {
        for &idx in path {
            self.node_mut(idx).count -= by;
        }
    }

    /// Inserts a key-value pair.
    /// Returns the previous value if the key was already present; the shape
    /// of the tree is left untouched in that case.
    pub fn insert(&mut self, key: &str, value: T) -> Option<T> {
        let mut path = Vec::new();
        let mut current = ROOT;
        let mut rest = key;

        loop {
            path.push(current);

            let Some(first) = rest.chars().next() else {
                let old = self.node_mut(current).value.replace(value);
                if old.is_none() {
                    self.grow_counts(&path);
                }
                return old;
            };

            let Some(child) = self.node(current).child(first) else {
                let leaf = self.alloc(Node::leaf(rest, value));
                self.node_mut(current).add_child(first, leaf);
                self.grow_counts(&path);
                return None;
            };

            let label = &self.node(child).label;
            let common = common_prefix_len(rest, label);
            // The first characters match, so `common` is never zero here. A
            // partial match means the key either ends inside the edge or
            // diverges from it; both are handled by splitting the edge and
            // continuing from the new intermediate node.
            current = if common < label.len() {
                self.split_edge(current, child, common)
            } else {
                child
            };
            rest = &rest[common..];
        }
    }

    /// Splits the edge `parent -> child` after `at` bytes of the child's label.
    /// Returns the new intermediate node.
    fn split_edge(&mut self, parent: usize, child: usize, at: usize) -> usize {
        let node = self.node_mut(child);
        let head = node.label[..at].to_owned();
        node.label = Box::from(&node.label[at..]);
        let tail_first = node.first_char();
        let count = node.count;

        let mut mid = Node::branch(&head);
        mid.count = count;
        if let Some(first) = tail_first {
            mid.add_child(first, child);
        }
        let head_first = mid.first_char();
        let mid_idx = self.alloc(mid);
        if let Some(first) = head_first {
            self.node_mut(parent).add_child(first, mid_idx);
        }

        trace_event!(label = %head, "split radix tree edge");
        mid_idx
    }

    fn find(&self, key: &str) -> Option<usize> {
        let mut current = ROOT;
        let mut rest = key;
        while let Some(first) = rest.chars().next() {
            let child = self.node(current).child(first)?;
            rest = rest.strip_prefix(&*self.node(child).label)?;
            current = child;
        }
        Some(current)
    }

    fn find_with_path(&self, key: &str) -> Option<(usize, Vec<usize>)> {
        let mut ancestors = Vec::new();
        let mut current = ROOT;
        let mut rest = key;
        while let Some(first) = rest.chars().next() {
            let child = self.node(current).child(first)?;
            rest = rest.strip_prefix(&*self.node(child).label)?;
            ancestors.push(current);
            current = child;
        }
        Some((current, ancestors))
    }

    /// Gets a reference to the value stored at `key`.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.find(key).and_then(|idx| self.node(idx).value.as_ref())
    }

    /// Gets a mutable reference to the value stored at `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        let idx = self.find(key)?;
        self.node_mut(idx).value.as_mut()
    }

    /// Returns true if `key` is stored in the tree.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key` and returns its value. Missing keys are a no-op.
    ///
    /// Nodes left without value and children are pruned, and valueless nodes
    /// left with a single child are merged into that child.
    pub fn remove(&mut self, key: &str) -> Option<T> {
        let (target, ancestors) = self.find_with_path(key)?;
        let old = self.node_mut(target).value.take()?;
        self.node_mut(target).count -= 1;
        self.shrink_counts(&ancestors, 1);
        self.compact(&ancestors, target);
        Some(old)
    }

    /// Restores compression at `idx` after it lost its value or a child.
    fn compact(&mut self, ancestors: &[usize], idx: usize) {
        let Some((&parent, rest)) = ancestors.split_last() else {
            return;
        };
        let node = self.node(idx);
        if node.value.is_some() {
            return;
        }
        match node.children.len() {
            0 => {
                if let Some(first) = node.first_char() {
                    self.node_mut(parent).remove_child(first);
                }
                self.release(idx);
                self.compact(rest, parent);
            }
            1 => self.merge_with_child(parent, idx),
            _ => {}
        }
    }

    /// Folds a valueless single-child node into its child.
    fn merge_with_child(&mut self, parent: usize, idx: usize) {
        let node = self.release(idx);
        let Some(&(_, child)) = node.children.first() else {
            return;
        };
        let child_node = self.node_mut(child);
        let mut label = String::with_capacity(node.label.len() + child_node.label.len());
        label.push_str(&node.label);
        label.push_str(&child_node.label);
        trace_event!(label = %label, "merged radix tree edge");
        child_node.label = label.into_boxed_str();
        if let Some(first) = node.first_char() {
            self.node_mut(parent).add_child(first, child);
        }
    }

    /// Descends along `prefix`. Returns `None` when no stored key starts with
    /// it, except that the root is always reachable through the empty prefix.
    pub(crate) fn locate(&self, prefix: &str) -> Option<Cursor> {
        let mut ancestors = Vec::new();
        let mut current = ROOT;
        let mut rest = prefix;
        while let Some(first) = rest.chars().next() {
            let child = self.node(current).child(first)?;
            let label = &self.node(child).label;
            ancestors.push(current);
            if let Some(tail) = rest.strip_prefix(&**label) {
                rest = tail;
                current = child;
            } else {
                let overshoot = label.strip_prefix(rest)?;
                return Some(Cursor {
                    node: child,
                    ancestors,
                    overshoot: overshoot.to_owned(),
                });
            }
        }
        Some(Cursor {
            node: current,
            ancestors,
            overshoot: String::new(),
        })
    }

    /// Number of stored keys starting with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.locate(prefix).map_or(0, |cursor| self.node(cursor.node).count)
    }

    /// Removes every key starting with `prefix`. Returns how many were removed.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        match self.locate(prefix) {
            Some(cursor) => self.clear_below(&cursor),
            None => 0,
        }
    }

    pub(crate) fn clear_below(&mut self, cursor: &Cursor) -> usize {
        let removed = self.node(cursor.node).count;
        let Some((&parent, rest)) = cursor.ancestors.split_last() else {
            self.clear();
            return removed;
        };
        if let Some(first) = self.node(cursor.node).first_char() {
            self.node_mut(parent).remove_child(first);
        }
        self.release_subtree(cursor.node);
        self.shrink_counts(&cursor.ancestors, removed);
        self.compact(rest, parent);
        trace_event!(removed, "cleared radix subtree");
        removed
    }

    /// Validates every structural invariant of the tree.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::CorruptTree`] describing the first violation.
    pub fn check_invariants(&self) -> Result<()> {
        let corrupt = |msg: String| Err(SearchError::CorruptTree(msg));

        let Some(root) = self.try_node(ROOT) else {
            return corrupt("missing root".into());
        };
        if !root.label.is_empty() {
            return corrupt(format!("root has label {:?}", root.label));
        }

        let mut seen = HashSet::new();
        let mut stack = vec![ROOT];
        while let Some(idx) = stack.pop() {
            if !seen.insert(idx) {
                return corrupt(format!("node {idx} is reachable twice"));
            }
            let Some(node) = self.try_node(idx) else {
                return corrupt(format!("link to free slot {idx}"));
            };

            if idx != ROOT {
                if node.label.is_empty() {
                    return corrupt(format!("node {idx} has an empty label"));
                }
                if node.is_vacant() {
                    return corrupt(format!("node {idx} is a dangling leaf"));
                }
                if node.value.is_none() && node.children.len() == 1 {
                    return corrupt(format!("node {idx} is an uncompressed chain"));
                }
            }

            let mut expected = usize::from(node.value.is_some());
            let mut previous: Option<char> = None;
            for &(first, child) in &node.children {
                if previous.is_some_and(|p| p >= first) {
                    return corrupt(format!("children of node {idx} are not strictly ordered"));
                }
                previous = Some(first);
                let Some(child_node) = self.try_node(child) else {
                    return corrupt(format!("node {idx} links to free slot {child}"));
                };
                if child_node.first_char() != Some(first) {
                    return corrupt(format!("edge {first:?} of node {idx} leads to label {:?}", child_node.label));
                }
                expected += child_node.count;
                stack.push(child);
            }
            if node.count != expected {
                return corrupt(format!("node {idx} counts {} values, subtree holds {expected}", node.count));
            }
        }

        let live = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, NodeSlot::Occupied(_)))
            .count();
        if live != seen.len() {
            return corrupt(format!("{} live nodes are unreachable", live - seen.len()));
        }
        Ok(())
    }

    /// Number of live nodes in the arena, root included.
    pub fn node_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, NodeSlot::Occupied(_)))
            .count()
    }
}

/// Length in bytes of the longest common prefix of `a` and `b`, always on a
/// character boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map_or(a.len().min(b.len()), |((i, _), _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_of(keys: &[&str]) -> RadixTree<usize> {
        let mut tree = RadixTree::new();
        for (i, key) in keys.iter().enumerate() {
            tree.insert(key, i);
        }
        tree
    }

    fn labels_under_root<T>(tree: &RadixTree<T>) -> Vec<String> {
        tree.node(ROOT)
            .children
            .iter()
            .map(|&(_, child)| tree.node(child).label.to_string())
            .collect()
    }

    #[test]
    fn test_common_prefix_len() {
        assert_eq!(common_prefix_len("hello", "help"), 3);
        assert_eq!(common_prefix_len("he", "hello"), 2);
        assert_eq!(common_prefix_len("hello", "he"), 2);
        assert_eq!(common_prefix_len("abc", "xyz"), 0);
        assert_eq!(common_prefix_len("ñandú", "ñame"), "ñ".len() + 1);
        assert_eq!(common_prefix_len("", "abc"), 0);
    }

    #[test]
    fn test_insert_and_get() {
        let mut tree = RadixTree::new();
        assert_eq!(tree.insert("hello", 1), None);
        assert_eq!(tree.insert("helium", 2), None);
        assert_eq!(tree.insert("world", 3), None);

        assert_eq!(tree.get("hello"), Some(&1));
        assert_eq!(tree.get("helium"), Some(&2));
        assert_eq!(tree.get("world"), Some(&3));
        assert_eq!(tree.get("hel"), None);
        assert_eq!(tree.get("hellos"), None);
        assert_eq!(tree.len(), 3);

        assert_eq!(tree.insert("hello", 100), Some(1));
        assert_eq!(tree.get("hello"), Some(&100));
        assert_eq!(tree.len(), 3);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_split_cases() {
        // key continues below a full edge
        let mut tree = tree_of(&["a", "ab", "abc"]);
        assert_eq!(labels_under_root(&tree), vec!["a"]);
        tree.check_invariants().unwrap();

        // key ends inside an edge
        let mut tree2 = tree_of(&["romane"]);
        tree2.insert("rom", 9);
        assert_eq!(labels_under_root(&tree2), vec!["rom"]);
        assert_eq!(tree2.get("rom"), Some(&9));
        assert_eq!(tree2.get("romane"), Some(&0));
        tree2.check_invariants().unwrap();

        // diverging suffixes
        tree.insert("abd", 4);
        tree.insert("axe", 5);
        assert_eq!(tree.get("abd"), Some(&4));
        assert_eq!(tree.get("abc"), Some(&2));
        assert_eq!(tree.get("axe"), Some(&5));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_empty_key() {
        let mut tree = tree_of(&["x"]);
        assert_eq!(tree.get(""), None);
        tree.insert("", 7);
        assert_eq!(tree.get(""), Some(&7));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.remove(""), Some(7));
        assert_eq!(tree.len(), 1);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_merges_chains() {
        let mut tree = tree_of(&["test", "team", "toast"]);
        let before = tree.node_count();
        assert_eq!(tree.remove("team"), Some(1));
        tree.check_invariants().unwrap();
        assert!(tree.node_count() < before);
        assert_eq!(tree.get("test"), Some(&0));
        assert_eq!(tree.get("toast"), Some(&2));
        assert_eq!(tree.get("team"), None);

        assert_eq!(tree.remove("toast"), Some(2));
        assert_eq!(labels_under_root(&tree), vec!["test"]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_intermediate_value() {
        let mut tree = tree_of(&["rom", "romane", "romulus"]);
        assert_eq!(tree.remove("rom"), Some(0));
        tree.check_invariants().unwrap();
        assert_eq!(tree.get("romane"), Some(&1));
        assert_eq!(tree.get("romulus"), Some(&2));

        assert_eq!(tree.remove("romane"), Some(1));
        assert_eq!(labels_under_root(&tree), vec!["romulus"]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut tree = tree_of(&["hello", "help"]);
        assert_eq!(tree.remove("hel"), None);
        assert_eq!(tree.remove("helpful"), None);
        assert_eq!(tree.remove("zzz"), None);
        assert_eq!(tree.len(), 2);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_slots_are_recycled() {
        let mut tree = RadixTree::new();
        for round in 0..3 {
            for i in 0..50 {
                tree.insert(&format!("key{i}"), round);
            }
            for i in 0..50 {
                assert_eq!(tree.remove(&format!("key{i}")), Some(round));
            }
            tree.check_invariants().unwrap();
        }
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert!(tree.slots.len() < 120);
    }

    #[test]
    fn test_locate() {
        let tree = tree_of(&["unicorn", "universe", "university", "unique", "hello"]);

        let cursor = tree.locate("uni").unwrap();
        assert_eq!(cursor.overshoot, "");
        assert_eq!(tree.node(cursor.node).count, 4);

        let cursor = tree.locate("univ").unwrap();
        assert_eq!(cursor.overshoot, "ers");
        assert_eq!(tree.node(cursor.node).count, 2);

        assert!(tree.locate("unix").is_none());
        assert!(tree.locate("hellos").is_none());
        assert_eq!(tree.locate("").unwrap().node, ROOT);

        assert_eq!(tree.count_prefix("u"), 4);
        assert_eq!(tree.count_prefix("universit"), 1);
        assert_eq!(tree.count_prefix("x"), 0);
    }

    #[test]
    fn test_remove_prefix() {
        let mut tree = tree_of(&["unicorn", "universe", "university", "unique", "hello"]);
        assert_eq!(tree.remove_prefix("univ"), 2);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get("universe"), None);
        assert_eq!(tree.get("unique"), Some(&3));
        tree.check_invariants().unwrap();

        assert_eq!(tree.remove_prefix("uniq"), 1);
        assert_eq!(labels_under_root(&tree), vec!["hello", "unicorn"]);
        tree.check_invariants().unwrap();

        assert_eq!(tree.remove_prefix("nope"), 0);
        assert_eq!(tree.remove_prefix(""), 2);
        assert!(tree.is_empty());
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_check_invariants_detects_corruption() {
        let mut tree = tree_of(&["abc", "abd"]);
        tree.node_mut(ROOT).count = 5;
        assert!(matches!(tree.check_invariants(), Err(SearchError::CorruptTree(_))));
    }

    #[test]
    fn test_unicode_keys() {
        let mut tree = tree_of(&["日本", "日本語", "日曜日", "über"]);
        assert_eq!(tree.get("日本語"), Some(&1));
        assert_eq!(tree.get("日"), None);
        assert_eq!(tree.count_prefix("日"), 3);
        assert_eq!(tree.remove("日本"), Some(0));
        assert_eq!(tree.get("日本語"), Some(&1));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_get_mut() {
        let mut tree = tree_of(&["counter"]);
        *tree.get_mut("counter").unwrap() += 10;
        assert_eq!(tree.get("counter"), Some(&10));
        assert!(tree.get_mut("count").is_none());
    }
}
