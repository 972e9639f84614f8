//! Binary search tree dictionary over window positions.
//!
//! Every node is a window position; its key is the [`LOOK_AHEAD_SIZE`]-byte
//! string starting there. Nodes live in a flat arena indexed by position, so
//! links are plain indices:
//!
//! - index `0` is the "unused" link. Position 0 is never indexed.
//! - index [`WINDOW_SIZE`] is a virtual root whose `larger` link holds the
//!   real root.
//!
//! The tree is not balanced. Runs of one byte degenerate it into a list, which
//! costs time but never correctness.

use crate::window::Window;
use crate::{LOOK_AHEAD_SIZE, WINDOW_SIZE};
use std::cmp::Ordering;

/// Link value meaning "no node".
pub const UNUSED: usize = 0;

/// Arena index of the virtual root.
pub const TREE_ROOT: usize = WINDOW_SIZE;

#[derive(Debug, Clone, Copy, Default)]
struct Node {
    parent: usize,
    smaller: usize,
    larger: usize,
}

/// Result of a dictionary search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Match {
    /// Length of the common prefix, 0 if nothing matched.
    pub length: usize,
    /// Window position of the matching string.
    pub position: usize,
}

/// Dictionary tree keyed by window strings.
#[derive(Debug, Clone)]
pub struct MatchTree {
    nodes: Vec<Node>,
}

impl MatchTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default(); WINDOW_SIZE + 1],
        }
    }

    /// Clear the tree and make `root` its only node.
    pub fn reset(&mut self, root: usize) {
        self.nodes.fill(Node::default());
        self.nodes[TREE_ROOT].larger = root;
        self.nodes[root].parent = TREE_ROOT;
    }

    /// Whether `position` is currently indexed.
    pub fn contains(&self, position: usize) -> bool {
        position != UNUSED && self.nodes[position].parent != UNUSED
    }

    /// Index `new_node` and return the longest match found on the way down.
    ///
    /// Every node on the search path is a candidate; a candidate at least as
    /// long as the best so far takes over, so among equal lengths the deepest
    /// one wins. A full-length match means the two positions are identical
    /// keys, and the old node is swapped out for the new one.
    pub fn insert(&mut self, window: &Window, new_node: usize) -> Match {
        if new_node == UNUSED {
            return Match::default();
        }

        let mut test_node = self.nodes[TREE_ROOT].larger;
        if test_node == UNUSED {
            self.attach(TREE_ROOT, Ordering::Greater, new_node);
            return Match::default();
        }

        let mut best = Match::default();
        loop {
            let (length, ord) = window.compare(new_node, test_node);
            if length >= best.length {
                best = Match {
                    length,
                    position: test_node,
                };
                if length >= LOOK_AHEAD_SIZE {
                    self.replace(test_node, new_node);
                    return best;
                }
            }

            let child = match ord {
                Ordering::Less => self.nodes[test_node].smaller,
                _ => self.nodes[test_node].larger,
            };
            if child == UNUSED {
                self.attach(test_node, ord, new_node);
                return best;
            }
            test_node = child;
        }
    }

    /// Remove `position` from the tree if it is indexed.
    pub fn remove(&mut self, position: usize) {
        if !self.contains(position) {
            return;
        }

        let node = self.nodes[position];
        if node.larger == UNUSED {
            self.contract(position, node.smaller);
        } else if node.smaller == UNUSED {
            self.contract(position, node.larger);
        } else {
            let replacement = self.predecessor(position);
            self.remove(replacement);
            self.replace(position, replacement);
        }
    }

    fn attach(&mut self, parent: usize, ord: Ordering, new_node: usize) {
        match ord {
            Ordering::Less => self.nodes[parent].smaller = new_node,
            _ => self.nodes[parent].larger = new_node,
        }
        self.nodes[new_node] = Node {
            parent,
            smaller: UNUSED,
            larger: UNUSED,
        };
    }

    /// Splice `new_node` (the only child of `old_node`, or UNUSED) into
    /// `old_node`'s place.
    fn contract(&mut self, old_node: usize, new_node: usize) {
        let parent = self.nodes[old_node].parent;
        if new_node != UNUSED {
            self.nodes[new_node].parent = parent;
        }
        self.relink_parent(parent, old_node, new_node);
        self.nodes[old_node].parent = UNUSED;
    }

    /// Put `new_node`, which is not in the tree, where `old_node` is.
    fn replace(&mut self, old_node: usize, new_node: usize) {
        let old = self.nodes[old_node];
        self.relink_parent(old.parent, old_node, new_node);
        self.nodes[new_node] = old;
        if old.smaller != UNUSED {
            self.nodes[old.smaller].parent = new_node;
        }
        if old.larger != UNUSED {
            self.nodes[old.larger].parent = new_node;
        }
        self.nodes[old_node].parent = UNUSED;
    }

    fn relink_parent(&mut self, parent: usize, old_node: usize, new_node: usize) {
        let links = &mut self.nodes[parent];
        if links.larger == old_node {
            links.larger = new_node;
        } else {
            links.smaller = new_node;
        }
    }

    /// Rightmost node of the smaller subtree. Requires a smaller child.
    fn predecessor(&self, node: usize) -> usize {
        let mut next = self.nodes[node].smaller;
        while self.nodes[next].larger != UNUSED {
            next = self.nodes[next].larger;
        }
        next
    }

    #[cfg(test)]
    fn check_links(&self, window: &Window) -> usize {
        let mut count = 0;
        let mut stack = vec![self.nodes[TREE_ROOT].larger];
        while let Some(node) = stack.pop() {
            if node == UNUSED {
                continue;
            }
            count += 1;
            let links = self.nodes[node];
            for (child, expected) in [(links.smaller, Ordering::Less), (links.larger, Ordering::Greater)] {
                if child != UNUSED {
                    assert_eq!(self.nodes[child].parent, node, "broken parent link");
                    assert_eq!(window.compare(child, node).1, expected, "BST order violated");
                    stack.push(child);
                }
            }
        }
        count
    }
}

impl Default for MatchTree {
    fn default() -> Self {
        Self::new()
    }
}
