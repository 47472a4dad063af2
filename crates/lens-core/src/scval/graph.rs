//! Arena of source values
//!
//! Every source node lives in an [`ScValGraph`] and is addressed by an
//! [`ScValId`]. The id is the node's identity: two structurally identical
//! nodes inserted separately get different ids, and the visited tracker keys
//! on ids rather than on content. Cycles are built by reserving a node first
//! and filling in its payload once its children exist.

use super::{Payload, ScVal, ScValType, Tag};

/// Stable handle of a source node within one [`ScValGraph`]
///
/// Handles are only meaningful for the graph that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScValId(usize);

impl ScValId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Owner of every source node reachable from a top-level value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScValGraph {
    nodes: Vec<ScVal>,
}

impl ScValGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: ScValId) -> Option<&ScVal> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: ScValId) -> Option<&mut ScVal> {
        self.nodes.get_mut(id.0)
    }

    /// Add a node and return its handle
    pub fn insert(&mut self, node: ScVal) -> ScValId {
        let id = ScValId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Add a known-variant node with a payload
    pub fn add(&mut self, ty: ScValType, value: impl Into<Payload>) -> ScValId {
        self.insert(ScVal::new(ty, Some(value.into())))
    }

    /// Add a node whose payload is absent
    pub fn add_bare(&mut self, tag: impl Into<Tag>) -> ScValId {
        self.insert(ScVal::new(tag, None))
    }

    /// Add a vector node over existing nodes
    pub fn add_vec<I>(&mut self, items: I) -> ScValId
    where
        I: IntoIterator<Item = ScValId>,
    {
        let items = items.into_iter().map(Payload::Node).collect::<Vec<_>>();
        self.add(ScValType::Vec, Payload::List(items))
    }

    /// Add a map node from `(key, val)` pairs, preserving their order
    pub fn add_map<I>(&mut self, entries: I) -> ScValId
    where
        I: IntoIterator<Item = (ScValId, ScValId)>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, val)| Payload::record([("key", Payload::Node(key)), ("val", Payload::Node(val))]))
            .collect::<Vec<_>>();
        self.add(ScValType::Map, Payload::List(entries))
    }

    /// Replace a node's payload. Returns `false` if `id` is not in this graph.
    pub fn set_value(&mut self, id: ScValId, value: Option<Payload>) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.value = value;
                true
            }
            None => false,
        }
    }

    /// Append `item` to a node's list payload, creating the list if the
    /// payload is absent or not a list. Returns `false` for a foreign id.
    pub fn push_item(&mut self, id: ScValId, item: impl Into<Payload>) -> bool {
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        if let Some(Payload::List(items)) = &mut node.value {
            items.push(item.into());
        } else {
            node.value = Some(Payload::List(vec![item.into()]));
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScValId, &ScVal)> {
        self.nodes.iter().enumerate().map(|(i, node)| (ScValId(i), node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_and_distinct() {
        let mut graph = ScValGraph::new();
        let a = graph.add(ScValType::I32, 1);
        let b = graph.add(ScValType::I32, 1);
        assert_ne!(a, b);
        assert_eq!(graph.get(a), graph.get(b));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_self_referencing_vec() {
        let mut graph = ScValGraph::new();
        let v = graph.add_vec(Vec::<ScValId>::new());
        assert!(graph.push_item(v, v));
        let items = graph.get(v).and_then(|n| n.value.as_ref()).and_then(Payload::as_list);
        assert_eq!(items, Some(&[Payload::Node(v)][..]));
    }

    #[test]
    fn test_push_item_creates_list() {
        let mut graph = ScValGraph::new();
        let v = graph.add_bare(ScValType::Vec);
        let x = graph.add(ScValType::U32, 5u32);
        graph.push_item(v, x);
        graph.push_item(v, x);
        let node = graph.get(v).unwrap();
        assert_eq!(node.value.as_ref().and_then(Payload::as_list).map(|l| l.len()), Some(2));
    }

    #[test]
    fn test_foreign_id_rejected() {
        let mut other = ScValGraph::new();
        other.add(ScValType::Void, Payload::Null);
        other.add(ScValType::Void, Payload::Null);
        let foreign = other.add(ScValType::Void, Payload::Null);

        let mut graph = ScValGraph::new();
        assert!(graph.get(foreign).is_none());
        assert!(!graph.set_value(foreign, None));
        assert!(!graph.push_item(foreign, Payload::Null));
    }

    #[test]
    fn test_map_entries_keep_order() {
        let mut graph = ScValGraph::new();
        let k1 = graph.add(ScValType::Symbol, "b");
        let v1 = graph.add(ScValType::U32, 1u32);
        let k2 = graph.add(ScValType::Symbol, "a");
        let v2 = graph.add(ScValType::U32, 2u32);
        let map = graph.add_map([(k1, v1), (k2, v2)]);
        let entries = graph
            .get(map)
            .and_then(|n| n.value.as_ref())
            .and_then(Payload::as_list)
            .unwrap();
        assert_eq!(entries[0].field("key"), Some(&Payload::Node(k1)));
        assert_eq!(entries[1].field("val"), Some(&Payload::Node(v2)));
    }
}
