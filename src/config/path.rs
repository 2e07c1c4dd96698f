//! Dotted-path access into a configuration [`Tree`].
//!
//! Paths are split on a separator (normally `.`). Reads stop at the first
//! missing component or leaf; writes create intermediate tables as needed.

use super::attr::{Node, Tree};

/// Default path separator.
pub const DEFAULT_SEP: &str = ".";

/// Split `path` into its parent components and the final component.
fn split_last<'p>(path: &'p str, sep: &str) -> (Vec<&'p str>, &'p str) {
    match path.rsplit_once(sep) {
        Some((parents, last)) => (parents.split(sep).collect(), last),
        None => (Vec::new(), path),
    }
}

/// Walk `tree` along `path`, returning the node at its end.
///
/// Returns `None` as soon as a component is missing or a leaf is reached
/// before the path is exhausted.
pub fn get_path<'a>(tree: &'a Tree, path: &str, sep: &str) -> Option<&'a Node> {
    let (parents, last) = split_last(path, sep);
    let mut current = tree;
    for part in parents {
        current = match current.get(part)? {
            Node::Table(table) => table,
            Node::Leaf(_) => return None,
        };
    }
    current.get(last)
}

/// Mutable variant of [`get_path`].
pub fn get_path_mut<'a>(tree: &'a mut Tree, path: &str, sep: &str) -> Option<&'a mut Node> {
    let (parents, last) = split_last(path, sep);
    let mut current = tree;
    for part in parents {
        current = match current.get_mut(part)? {
            Node::Table(table) => table,
            Node::Leaf(_) => return None,
        };
    }
    current.get_mut(last)
}

/// Store `node` at `path`, creating intermediate tables.
///
/// The final component is always overwritten. An intermediate leaf standing
/// in the way is replaced by an empty table.
pub fn set_path(tree: &mut Tree, path: &str, node: impl Into<Node>, sep: &str) {
    let (parents, last) = split_last(path, sep);
    let mut current = tree;
    for part in parents {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Node::Table(Tree::new()));
        if let Node::Leaf(_) = entry {
            *entry = Node::Table(Tree::new());
        }
        current = match entry {
            Node::Table(table) => table,
            Node::Leaf(_) => unreachable!("leaf replaced by a table above"),
        };
    }
    current.insert(last.to_string(), node.into());
}

/// Remove and return the node at `path`.
///
/// Tables left empty by the removal are pruned on the way back up, so popping
/// `a.b` from `{a: {b: 1}}` leaves an empty tree.
pub fn pop_path(tree: &mut Tree, path: &str, sep: &str) -> Option<Node> {
    let parts: Vec<&str> = path.split(sep).collect();
    pop_parts(tree, &parts)
}

fn pop_parts(tree: &mut Tree, parts: &[&str]) -> Option<Node> {
    let (first, rest) = parts.split_first()?;
    if rest.is_empty() {
        return tree.remove(*first);
    }

    let Some(Node::Table(child)) = tree.get_mut(*first) else {
        return None;
    };
    let popped = pop_parts(child, rest)?;
    if child.is_empty() {
        tree.remove(*first);
    }
    Some(popped)
}
