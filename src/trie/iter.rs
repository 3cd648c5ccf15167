//! Ordered depth-first iteration.
//!
//! [`Iter`] borrows the tree for its whole lifetime. [`TreeIterator`] holds a
//! shared handle instead and only borrows the tree inside `next()`.

use std::cell::RefCell;
use std::iter::FusedIterator;
use std::rc::Rc;

use super::tree::{Cursor, RadixTree};

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: usize,
    // 0: value not visited yet, n: next child is `children[n - 1]`
    action: usize,
    // key length before this node's label was appended
    base_len: usize,
}

/// Resumable depth-first walk over a subtree.
///
/// The walk keeps its own path stack of arena indices and the key built so
/// far, so it can be paused between nodes and resumed against the tree.
/// Siblings are visited in ascending order of their first character, which
/// yields keys in lexicographic order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Walk {
    stack: Vec<Frame>,
    key: String,
}

impl Walk {
    /// A walk that yields nothing.
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    /// Starts at the cursor's node. `prefix` is the key leading to the cursor.
    pub(crate) fn new(cursor: &Cursor, prefix: &str) -> Self {
        let mut key = String::with_capacity(prefix.len() + cursor.overshoot.len());
        key.push_str(prefix);
        key.push_str(&cursor.overshoot);
        let frame = Frame {
            node: cursor.node,
            action: 0,
            base_len: key.len(),
        };
        Self {
            stack: vec![frame],
            key,
        }
    }

    /// Starts at `prefix`, or yields nothing if no key starts with it.
    pub(crate) fn at_prefix<T>(tree: &RadixTree<T>, prefix: &str) -> Self {
        tree.locate(prefix)
            .map_or_else(Self::empty, |cursor| Self::new(&cursor, prefix))
    }

    /// Key of the node returned by the last call to [`advance`](Self::advance).
    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    /// Moves to the next node holding a value and returns its index.
    ///
    /// If the tree was restructured since the walk started, the walk stops
    /// as soon as it meets a link to a freed slot.
    pub(crate) fn advance<T>(&mut self, tree: &RadixTree<T>) -> Option<usize> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(node) = tree.try_node(frame.node) else {
                self.stack.clear();
                return None;
            };

            if frame.action == 0 {
                frame.action = 1;
                if node.value.is_some() {
                    return Some(frame.node);
                }
                continue;
            }

            if let Some(&(_, child)) = node.children.get(frame.action - 1) {
                frame.action += 1;
                let Some(child_node) = tree.try_node(child) else {
                    self.stack.clear();
                    return None;
                };
                let base_len = self.key.len();
                self.key.push_str(&child_node.label);
                self.stack.push(Frame {
                    node: child,
                    action: 0,
                    base_len,
                });
            } else {
                let base_len = frame.base_len;
                self.stack.pop();
                self.key.truncate(base_len);
            }
        }
    }
}

/// Borrowing iterator over the entries of a [`RadixTree`].
/// Yields `(String, &T)` in key order.
pub struct Iter<'a, T> {
    tree: &'a RadixTree<T>,
    walk: Walk,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (String, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.walk.advance(self.tree)?;
        let value = self.tree.node(idx).value.as_ref()?;
        Some((self.walk.key().to_owned(), value))
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> RadixTree<T> {
    /// Iterates over all entries in key order.
    pub fn iter(&self) -> Iter<'_, T> {
        self.iter_prefix("")
    }

    /// Iterates over the entries whose keys start with `prefix`, in key order.
    /// Yielded keys are complete, prefix included.
    pub fn iter_prefix(&self, prefix: &str) -> Iter<'_, T> {
        Iter {
            tree: self,
            walk: Walk::at_prefix(self, prefix),
        }
    }
}

impl<'a, T> IntoIterator for &'a RadixTree<T> {
    type Item = (String, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy, forward-only iterator over a tree shared by a
/// [`SearchableMap`](crate::SearchableMap) and its views.
///
/// The iterator owns its path stack and only borrows the shared tree for the
/// duration of each `next` call. Mutating the map while an iterator is alive
/// is memory safe, but what the iterator yields afterwards is unspecified.
pub struct TreeIterator<T> {
    tree: Rc<RefCell<RadixTree<T>>>,
    walk: Walk,
}

/// Iterator over `(key, value)` pairs. See [`SearchableMap::entries`](crate::SearchableMap::entries).
pub type Entries<T> = TreeIterator<T>;

impl<T> TreeIterator<T> {
    pub(crate) fn new(tree: Rc<RefCell<RadixTree<T>>>, prefix: &str) -> Self {
        let walk = Walk::at_prefix(&*tree.borrow(), prefix);
        Self { tree, walk }
    }

    fn next_with<R>(&mut self, f: impl FnOnce(&str, &T) -> R) -> Option<R> {
        let tree = self.tree.borrow();
        let idx = self.walk.advance(&*tree)?;
        let value = tree.node(idx).value.as_ref()?;
        Some(f(self.walk.key(), value))
    }
}

impl<T: Clone> Iterator for TreeIterator<T> {
    type Item = (String, T);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_with(|key, value| (key.to_owned(), value.clone()))
    }
}

impl<T: Clone> FusedIterator for TreeIterator<T> {}

/// Iterator over keys. See [`SearchableMap::keys`](crate::SearchableMap::keys).
pub struct Keys<T>(pub(crate) TreeIterator<T>);

impl<T> Iterator for Keys<T> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_with(|key, _| key.to_owned())
    }
}

impl<T> FusedIterator for Keys<T> {}

/// Iterator over values. See [`SearchableMap::values`](crate::SearchableMap::values).
pub struct Values<T>(pub(crate) TreeIterator<T>);

impl<T: Clone> Iterator for Values<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_with(|_, value| value.clone())
    }
}

impl<T: Clone> FusedIterator for Values<T> {}
