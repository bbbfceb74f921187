//! Arena holding the in-memory tree

use std::collections::{BTreeMap, HashMap};

use storage_core::{Error, Result};

pub(crate) const ROOT_ID: u64 = 0;
pub(crate) const ROOT_NAME: &str = "/";

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Directory {
        name: String,
        children: BTreeMap<String, u64>,
    },
    File {
        name: String,
        content: String,
    },
}

impl Node {
    fn name(&self) -> &str {
        match self {
            Node::Directory { name, .. } | Node::File { name, .. } => name,
        }
    }
}

/// Nodes keyed by id. Children are kept in a `BTreeMap`, so listings come
/// out sorted by name.
#[derive(Debug)]
pub(crate) struct Tree {
    nodes: HashMap<u64, Node>,
    next_id: u64,
}

impl Default for Tree {
    fn default() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT_ID,
            Node::Directory {
                name: ROOT_NAME.to_string(),
                children: BTreeMap::new(),
            },
        );
        Self { nodes, next_id: 1 }
    }
}

impl Tree {
    #[cfg(test)]
    pub(crate) fn get(&self, id: u64) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn stale(name: &str) -> Error {
        Error::Stale {
            name: name.to_string(),
        }
    }

    /// Children of a directory as `(name, id, is_dir)`.
    pub(crate) fn children(&self, dir: u64, dir_name: &str) -> Result<Vec<(String, u64, bool)>> {
        match self.nodes.get(&dir) {
            Some(Node::Directory { children, .. }) => Ok(children
                .iter()
                .map(|(name, id)| {
                    let is_dir = matches!(self.nodes.get(id), Some(Node::Directory { .. }));
                    (name.clone(), *id, is_dir)
                })
                .collect()),
            _ => Err(Self::stale(dir_name)),
        }
    }

    pub(crate) fn child(&self, dir: u64, dir_name: &str, name: &str) -> Result<Option<(u64, bool)>> {
        match self.nodes.get(&dir) {
            Some(Node::Directory { children, .. }) => Ok(children.get(name).map(|id| {
                let is_dir = matches!(self.nodes.get(id), Some(Node::Directory { .. }));
                (*id, is_dir)
            })),
            _ => Err(Self::stale(dir_name)),
        }
    }

    /// Insert a new child, failing if the name is taken.
    pub(crate) fn insert(&mut self, parent: u64, parent_name: &str, node: Node) -> Result<u64> {
        let id = self.next_id;
        let name = node.name().to_string();

        match self.nodes.get_mut(&parent) {
            Some(Node::Directory { children, .. }) => {
                if children.contains_key(&name) {
                    return Err(Error::AlreadyExists {
                        name,
                        parent: parent_name.to_string(),
                    });
                }
                children.insert(name, id);
            }
            _ => return Err(Self::stale(parent_name)),
        }

        self.nodes.insert(id, node);
        self.next_id += 1;
        Ok(id)
    }

    /// Detach `id` from `parent` and drop it with all descendants.
    pub(crate) fn remove(&mut self, parent: u64, id: u64, name: &str) -> Result<()> {
        match self.nodes.get_mut(&parent) {
            Some(Node::Directory { children, .. }) if children.get(name) == Some(&id) => {
                children.remove(name);
            }
            _ => return Err(Self::stale(name)),
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(Node::Directory { children, .. }) = self.nodes.remove(&next) {
                pending.extend(children.into_values());
            }
        }
        Ok(())
    }

    pub(crate) fn content(&self, id: u64, name: &str) -> Result<&str> {
        match self.nodes.get(&id) {
            Some(Node::File { content, .. }) => Ok(content),
            _ => Err(Self::stale(name)),
        }
    }

    pub(crate) fn set_content(&mut self, id: u64, name: &str, new_content: &str) -> Result<()> {
        match self.nodes.get_mut(&id) {
            Some(Node::File { content, .. }) => {
                *content = new_content.to_string();
                Ok(())
            }
            _ => Err(Self::stale(name)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}
