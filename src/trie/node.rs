/// A slot in the node arena.
/// Either an occupied node or a link to the next free slot.
#[derive(Debug, Clone)]
pub(crate) enum NodeSlot<T> {
    Occupied(Node<T>),
    Free(Option<usize>),
}

/// A node in the radix tree.
///
/// Each node contains:
/// - The edge label leading to it from its parent (empty only for the root).
/// - An optional value, present when a complete key ends at this node.
/// - Its children, sorted by the first character of their edge labels.
/// - The number of values stored in its subtree, itself included.
///
/// Links to other nodes are arena indices.
#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    pub(crate) label: Box<str>,
    pub(crate) value: Option<T>,
    pub(crate) children: Vec<(char, usize)>,
    pub(crate) count: usize,
}

impl<T> Node<T> {
    /// Creates a valueless node with the given edge label.
    pub(crate) fn branch(label: &str) -> Self {
        Self {
            label: Box::from(label),
            value: None,
            children: Vec::new(),
            count: 0,
        }
    }

    /// Creates a leaf holding `value` at the end of `label`.
    pub(crate) fn leaf(label: &str, value: T) -> Self {
        Self {
            label: Box::from(label),
            value: Some(value),
            children: Vec::new(),
            count: 1,
        }
    }

    /// First character of the edge label. `None` for the root.
    pub(crate) fn first_char(&self) -> Option<char> {
        self.label.chars().next()
    }

    /// Adds a child, keeping children sorted by first character.
    /// Replaces the existing link if one already starts with `first`.
    pub(crate) fn add_child(&mut self, first: char, child: usize) {
        match self.children.binary_search_by_key(&first, |&(c, _)| c) {
            Ok(pos) => self.children[pos] = (first, child),
            Err(pos) => self.children.insert(pos, (first, child)),
        }
    }

    /// Finds the child whose edge starts with `first`.
    pub(crate) fn child(&self, first: char) -> Option<usize> {
        self.children
            .binary_search_by_key(&first, |&(c, _)| c)
            .ok()
            .map(|pos| self.children[pos].1)
    }

    /// Removes the child whose edge starts with `first`.
    pub(crate) fn remove_child(&mut self, first: char) -> Option<usize> {
        self.children
            .binary_search_by_key(&first, |&(c, _)| c)
            .ok()
            .map(|pos| self.children.remove(pos).1)
    }

    /// True when the node neither holds a value nor leads anywhere.
    pub(crate) fn is_vacant(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }
}
