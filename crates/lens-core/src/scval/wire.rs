//! JSON wire form of source values
//!
//! A source value travels as `{ "switch": <tag>, "value": <payload> }`.
//! Decoding streams a JSON document straight into a fresh [`ScValGraph`]:
//! every object that carries a `switch` key becomes a node, everything else
//! stays an opaque [`Payload`]. Nested source values are held by handle, so a
//! deeply nested document decodes into a flat arena. The parser runs without
//! serde_json's nesting limit and on a growable stack, leaving the depth
//! ceiling to the normalizer. A JSON document is a tree, so decoded graphs
//! never share nodes; sharing and cycles only come from building a graph
//! directly.
//!
//! Encoding goes the other way and is used for the raw data of fallback
//! variants. It must always terminate, so a node met a second time while
//! encoding one value is written as `null`, and so is anything nested below
//! the remaining depth budget.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::de::{DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};

use super::{Payload, ScVal, ScValGraph, ScValId, Tag};
use crate::{Error, Result};

pub const SWITCH_KEY: &str = "switch";
pub const VALUE_KEY: &str = "value";

/// Largest magnitude below which every integer is exactly representable as `f64`
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A decoded document: the graph plus the top-level slot
///
/// The root is a [`Payload`] rather than an id because the document itself
/// may not be a source value (`null`, a number, a plain object).
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub graph: ScValGraph,
    pub root: Payload,
}

impl Decoded {
    /// The root node, if the document is a source value
    pub fn root_id(&self) -> Option<ScValId> {
        self.root.as_node()
    }
}

// ── Decoding ──────────────────────────────────────────────

/// Decode JSON text into a source graph
///
/// Nesting depth is not limited here; bound the work with `max_depth` when
/// normalizing.
///
/// # Errors
/// Returns `Json` if the text is not valid JSON. Any valid JSON decodes.
pub fn from_str(text: &str) -> Result<Decoded> {
    let mut graph = ScValGraph::new();
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let root = PayloadSeed { graph: &mut graph }.deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(Decoded { graph, root })
}

/// Read a file and decode its contents
///
/// # Errors
/// Returns `Io` if the file cannot be read and `Json` if it is not JSON.
pub fn from_file(path: &Path) -> Result<Decoded> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    from_str(&text)
}

/// Decode a JSON value into a source graph
pub fn from_json(json: &Value) -> Decoded {
    let mut graph = ScValGraph::new();
    let root = decode_payload(&mut graph, json);
    Decoded { graph, root }
}

/// Decode one JSON value into `graph`, returning the slot that refers to it
pub fn decode_payload(graph: &mut ScValGraph, json: &Value) -> Payload {
    // Visiting an in-memory value accepts every shape, so this cannot fail
    PayloadSeed { graph }
        .deserialize(serde_stacker::Deserializer::new(json))
        .unwrap_or(Payload::Null)
}

/// Deserializes any JSON value into a payload, adding source nodes to the graph
struct PayloadSeed<'g> {
    graph: &'g mut ScValGraph,
}

impl<'de, 'g> DeserializeSeed<'de> for PayloadSeed<'g> {
    type Value = Payload;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Payload, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, 'g> Visitor<'de> for PayloadSeed<'g> {
    type Value = Payload;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E>(self) -> std::result::Result<Payload, E> {
        Ok(Payload::Null)
    }

    fn visit_none<E>(self) -> std::result::Result<Payload, E> {
        Ok(Payload::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Payload, D::Error>
    where
        D: Deserializer<'de>,
    {
        self.deserialize(deserializer)
    }

    fn visit_bool<E>(self, b: bool) -> std::result::Result<Payload, E> {
        Ok(Payload::Bool(b))
    }

    fn visit_i64<E>(self, n: i64) -> std::result::Result<Payload, E> {
        Ok(Payload::Number(n as f64))
    }

    fn visit_u64<E>(self, n: u64) -> std::result::Result<Payload, E> {
        Ok(Payload::Number(n as f64))
    }

    fn visit_f64<E>(self, n: f64) -> std::result::Result<Payload, E> {
        Ok(Payload::Number(n))
    }

    fn visit_str<E>(self, s: &str) -> std::result::Result<Payload, E> {
        Ok(Payload::String(s.to_string()))
    }

    fn visit_string<E>(self, s: String) -> std::result::Result<Payload, E> {
        Ok(Payload::String(s))
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Payload, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element_seed(PayloadSeed { graph: &mut *self.graph })? {
            items.push(item);
        }
        Ok(Payload::List(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Payload, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields: Vec<(String, Payload)> = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(PayloadSeed { graph: &mut *self.graph })?;
            // Last occurrence of a repeated key wins
            match fields.iter().position(|(k, _)| *k == key) {
                Some(at) => fields[at].1 = value,
                None => fields.push((key, value)),
            }
        }
        Ok(assemble(self.graph, fields))
    }
}

/// Turn a decoded object into a source node if it carries a switch
fn assemble(graph: &mut ScValGraph, fields: Vec<(String, Payload)>) -> Payload {
    if !fields.iter().any(|(k, _)| k == SWITCH_KEY) {
        return Payload::Record(fields);
    }
    let mut switch = Payload::Null;
    let mut value = None;
    for (key, field) in fields {
        if key == SWITCH_KEY {
            switch = field;
        } else if key == VALUE_KEY {
            value = Some(field);
        }
    }
    let tag = match switch {
        Payload::String(name) => Tag::from_switch(&name),
        other => Tag::Invalid(payload_to_json(graph, &other)),
    };
    Payload::Node(graph.insert(ScVal::new(tag, value)))
}

// ── Encoding ──────────────────────────────────────────────

/// Encode a node back to its wire form
pub fn node_to_json(graph: &ScValGraph, id: ScValId) -> Value {
    Encoder::default().node(graph, id)
}

/// Encode a payload back to JSON
pub fn payload_to_json(graph: &ScValGraph, payload: &Payload) -> Value {
    Encoder::default().payload(graph, payload)
}

/// Encode a node with at most `budget` levels of nesting
pub(crate) fn node_to_json_within(graph: &ScValGraph, id: ScValId, budget: Option<usize>) -> Value {
    Encoder::within(budget).node(graph, id)
}

/// Encode a payload with at most `budget` levels of nesting
pub(crate) fn payload_to_json_within(graph: &ScValGraph, payload: &Payload, budget: Option<usize>) -> Value {
    Encoder::within(budget).payload(graph, payload)
}

/// Encode the payload of `owner` for use as raw fallback data
///
/// `owner` counts as already written, so a payload that refers back to its
/// own node encodes that reference as `null`. Every array, object and node
/// uses one level of `budget`; once it is spent, deeper values are `null`.
pub(crate) fn raw_payload(
    graph: &ScValGraph,
    owner: ScValId,
    payload: Option<&Payload>,
    budget: Option<usize>,
) -> Value {
    let Some(payload) = payload else {
        return Value::Null;
    };
    let mut encoder = Encoder::within(budget);
    encoder.seen.insert(owner);
    encoder.payload(graph, payload)
}

/// Encode a number the way JSON producers write it: integral values without
/// a fraction, non-finite values as `null`
pub fn number_to_json(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct Encoder {
    seen: HashSet<ScValId>,
    /// Nesting levels left; `None` is unlimited
    budget: Option<usize>,
}

impl Encoder {
    fn within(budget: Option<usize>) -> Self {
        Encoder {
            seen: HashSet::new(),
            budget,
        }
    }

    fn descend(&mut self) -> bool {
        match &mut self.budget {
            Some(0) => false,
            Some(left) => {
                *left -= 1;
                true
            }
            None => true,
        }
    }

    fn ascend(&mut self) {
        if let Some(left) = &mut self.budget {
            *left += 1;
        }
    }

    fn node(&mut self, graph: &ScValGraph, id: ScValId) -> Value {
        if !self.descend() {
            return Value::Null;
        }
        let out = self.node_fields(graph, id);
        self.ascend();
        out
    }

    fn node_fields(&mut self, graph: &ScValGraph, id: ScValId) -> Value {
        if !self.seen.insert(id) {
            return Value::Null;
        }
        let Some(node) = graph.get(id) else {
            return Value::Null;
        };
        let mut out = Map::new();
        out.insert(SWITCH_KEY.to_string(), node.tag.to_json());
        if let Some(ref value) = node.value {
            out.insert(VALUE_KEY.to_string(), self.payload(graph, value));
        }
        Value::Object(out)
    }

    fn payload(&mut self, graph: &ScValGraph, payload: &Payload) -> Value {
        match payload {
            Payload::Null => Value::Null,
            Payload::Bool(b) => Value::Bool(*b),
            Payload::Number(n) => number_to_json(*n),
            Payload::String(s) => Value::String(s.clone()),
            Payload::Node(id) => self.node(graph, *id),
            Payload::List(_) | Payload::Record(_) => {
                if !self.descend() {
                    return Value::Null;
                }
                let out = self.composite(graph, payload);
                self.ascend();
                out
            }
        }
    }

    fn composite(&mut self, graph: &ScValGraph, payload: &Payload) -> Value {
        match payload {
            Payload::List(items) => Value::Array(items.iter().map(|p| self.payload(graph, p)).collect()),
            Payload::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), self.payload(graph, v)))
                    .collect(),
            ),
            _ => Value::Null,
        }
    }
}
