//! The site map: an arena written concurrently while crawling, and the owned tree
//! handed back once the crawl is over.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use url::Url;

/// Handle to a node inside a [`MapBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

#[derive(Debug)]
struct Slot {
    url: Url,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Arena {
    slots: Vec<Slot>,
    sealed: bool,
}

/// Shared, append-only view of the map used by workers. A single lock covers
/// "attach child" and nothing else.
#[derive(Debug)]
pub struct MapBuilder {
    arena: Mutex<Arena>,
}

impl MapBuilder {
    pub fn new(root: Url) -> Self {
        Self {
            arena: Mutex::new(Arena {
                slots: vec![Slot {
                    url: root,
                    children: Vec::new(),
                }],
                sealed: false,
            }),
        }
    }

    /// Creates a node for `url` under `parent`. Returns `None` once the map is sealed.
    pub fn attach(&self, parent: NodeId, url: Url) -> Option<NodeId> {
        let mut arena = self.arena.lock().unwrap_or_else(PoisonError::into_inner);
        if arena.sealed || parent.0 >= arena.slots.len() {
            return None;
        }
        let id = NodeId(arena.slots.len());
        arena.slots.push(Slot {
            url,
            children: Vec::new(),
        });
        arena.slots[parent.0].children.push(id);
        Some(id)
    }

    /// Rejects every later attach.
    pub fn seal(&self) {
        self.arena
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sealed = true;
    }

    pub fn len(&self) -> usize {
        self.arena
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seals the arena and copies it out as an owned tree.
    pub fn finish(&self) -> SiteMap {
        let mut arena = self.arena.lock().unwrap_or_else(PoisonError::into_inner);
        arena.sealed = true;
        let slots = &arena.slots;

        // Children always have a higher id than their parent, so walking the arena
        // backwards builds every subtree before the node that owns it.
        let mut built: Vec<Option<Node>> = Vec::with_capacity(slots.len());
        built.resize_with(slots.len(), || None);
        for idx in (1..slots.len()).rev() {
            built[idx] = Some(Node {
                url: slots[idx].url.clone(),
                children: take_children(&mut built, &slots[idx].children),
            });
        }

        let root = &slots[NodeId::ROOT.0];
        SiteMap {
            root: Node {
                url: root.url.clone(),
                children: take_children(&mut built, &root.children),
            },
        }
    }
}

fn take_children(built: &mut [Option<Node>], ids: &[NodeId]) -> Vec<Node> {
    ids.iter().filter_map(|id| built[id.0].take()).collect()
}

/// One page of the site and the pages first discovered on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub url: Url,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, this one included.
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Depth-first, pre-order walk over the subtree.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A finished crawl tree rooted at the seed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteMap {
    root: Node,
}

impl SiteMap {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.root.count()
    }

    /// Never true: a map always holds its seed.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> Iter<'_> {
        self.root.iter()
    }

    pub fn urls(&self) -> impl Iterator<Item = &Url> {
        self.iter().map(|node| &node.url)
    }
}
