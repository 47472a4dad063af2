//! ScVal normalizer - converts source values to the normalized value union
//!
//! The normalizer walks a source graph depth-first and emits one
//! [`NormalizedValue`] tree whose shape is decided by the tag of each node.
//!
//! # Pipeline
//!
//! `JSON text → wire::from_str → ScValGraph → normalize_sc_val → NormalizedValue`
//!
//! # Guarantees
//!
//! - **Total**: never fails; malformed payloads degrade to typed fallbacks
//! - **Terminating**: each source node is entered at most once per call, and
//!   `max_depth` additionally bounds nesting on acyclic input
//! - **Deterministic**: same graph and options always produce the same tree
//! - **Serializable**: every output, fallbacks included, is plain JSON

use serde_json::Value;
use tracing::{debug, trace};

use crate::config::NormalizeOptions;
use crate::guards::VisitedTracker;
use crate::normalized::{MapEntry, NormalizedAddress, NormalizedValue};
use crate::scval::wire::{self, number_to_json};
use crate::scval::{Payload, ScVal, ScValGraph, ScValId, ScValType, Tag};
use crate::Result;

// ── Public API ─────────────────────────────────────────────

/// Normalize a source value with default options
///
/// `None` stands for a missing value and yields `Unsupported("Invalid", null)`.
pub fn normalize_sc_val(graph: &ScValGraph, value: Option<ScValId>) -> NormalizedValue {
    normalize_sc_val_with(graph, value, &NormalizeOptions::default())
}

/// Normalize a source value with explicit options
///
/// A fresh [`VisitedTracker`] is allocated for the call and dropped with it.
pub fn normalize_sc_val_with(
    graph: &ScValGraph,
    value: Option<ScValId>,
    options: &NormalizeOptions,
) -> NormalizedValue {
    let root = value.map(Payload::Node);
    normalize_root(graph, root.as_ref(), options)
}

/// Normalize the value held in an arbitrary slot
///
/// This is the entry point for decoded documents, whose root may not be a
/// source value at all.
pub fn normalize_root(
    graph: &ScValGraph,
    slot: Option<&Payload>,
    options: &NormalizeOptions,
) -> NormalizedValue {
    let mut tracker = VisitedTracker::new();
    let result = normalize_with_tracker(graph, slot, &mut tracker, options, 0);
    debug!(
        kind = result.kind(),
        nodes_entered = tracker.depth(),
        max_depth = ?options.max_depth,
        "normalized source value"
    );
    result
}

/// Decode a JSON document in wire form and normalize it
pub fn normalize_json(json: &Value, options: &NormalizeOptions) -> NormalizedValue {
    let decoded = wire::from_json(json);
    normalize_root(&decoded.graph, Some(&decoded.root), options)
}

/// Parse JSON text in wire form and normalize it
///
/// # Errors
/// Returns `Json` only if `text` is not valid JSON.
pub fn normalize_json_str(text: &str, options: &NormalizeOptions) -> Result<NormalizedValue> {
    let decoded = wire::from_str(text)?;
    Ok(normalize_root(&decoded.graph, Some(&decoded.root), options))
}

/// Recursive step, with the tracker and depth threaded through explicitly
///
/// Top-level callers should prefer [`normalize_sc_val_with`]; passing a
/// tracker that already saw other calls reports those nodes as cycles.
pub fn normalize_with_tracker(
    graph: &ScValGraph,
    slot: Option<&Payload>,
    tracker: &mut VisitedTracker,
    options: &NormalizeOptions,
    depth: usize,
) -> NormalizedValue {
    // The ceiling wins over everything, including the cycle check
    if options.truncates_at(depth) {
        trace!(depth, "depth ceiling reached");
        return NormalizedValue::truncated(depth);
    }
    // Nesting levels left for raw data written below this node
    let budget = options.max_depth.map(|max| max.saturating_sub(depth));

    let Some(slot) = slot else {
        return NormalizedValue::invalid(Value::Null);
    };

    if tracker.has_visited(slot) {
        trace!(depth, entered = tracker.depth(), "source node revisited");
        return VisitedTracker::create_cycle_marker(tracker.depth());
    }
    tracker.mark_visited(slot);

    let id = match slot {
        Payload::Node(id) => *id,
        other => return NormalizedValue::invalid(wire::payload_to_json_within(graph, other, budget)),
    };
    let Some(node) = graph.get(id) else {
        return NormalizedValue::invalid(Value::Null);
    };

    let ty = match &node.tag {
        Tag::Known(ty) => *ty,
        Tag::Other(name) => return unsupported(graph, id, name, node, budget),
        Tag::Invalid(_) => return NormalizedValue::invalid(wire::node_to_json_within(graph, id, budget)),
    };

    let payload = node.value.as_ref();
    match ty {
        ScValType::Bool => NormalizedValue::bool(payload.and_then(Payload::as_bool).unwrap_or(false)),

        ScValType::Void => NormalizedValue::void(),

        ScValType::U32 => match payload.and_then(as_u32) {
            Some(n) => NormalizedValue::u32(n),
            None => unsupported(graph, id, ty.as_str(), node, budget),
        },

        ScValType::I32 => match payload.and_then(as_i32) {
            Some(n) => NormalizedValue::i32(n),
            None => unsupported(graph, id, ty.as_str(), node, budget),
        },

        ScValType::String => NormalizedValue::string(payload.and_then(Payload::as_str).unwrap_or_default()),

        ScValType::Symbol => NormalizedValue::symbol(payload.and_then(Payload::as_str).unwrap_or_default()),

        ScValType::Error => normalize_error(graph, payload, budget),

        ScValType::Vec => {
            let items = payload
                .and_then(Payload::as_list)
                .unwrap_or_default()
                .iter()
                .map(|item| normalize_with_tracker(graph, Some(item), tracker, options, depth + 1))
                .collect();
            NormalizedValue::Vec { items }
        }

        ScValType::Map => {
            let entries = payload
                .and_then(Payload::as_list)
                .unwrap_or_default()
                .iter()
                .map(|entry| {
                    let key = normalize_with_tracker(graph, entry.field("key"), tracker, options, depth + 1);
                    let value = normalize_with_tracker(graph, entry.field("val"), tracker, options, depth + 1);
                    MapEntry { key, value }
                })
                .collect();
            NormalizedValue::Map { entries }
        }

        ScValType::Address if options.decode_addresses => match address_of(node) {
            Some(address) => NormalizedValue::Address(address),
            None => unsupported(graph, id, ty.as_str(), node, budget),
        },

        ScValType::Address
        | ScValType::U64
        | ScValType::I64
        | ScValType::Timepoint
        | ScValType::Duration
        | ScValType::U128
        | ScValType::I128
        | ScValType::U256
        | ScValType::I256
        | ScValType::Bytes
        | ScValType::ContractInstance
        | ScValType::LedgerKeyContractInstance
        | ScValType::LedgerKeyNonce => unsupported(graph, id, ty.as_str(), node, budget),
    }
}

// ── Address decoding ───────────────────────────────────────

/// Classify an address source value by the prefix of its strkey
///
/// Returns `None` for a missing value, a node not tagged `ScvAddress`, or a
/// payload that is not a string. Does not recurse and needs no tracker.
pub fn normalize_sc_address(graph: &ScValGraph, value: Option<ScValId>) -> Option<NormalizedAddress> {
    let node = graph.get(value?)?;
    if node.scval_type() != Some(ScValType::Address) {
        return None;
    }
    address_of(node)
}

fn address_of(node: &ScVal) -> Option<NormalizedAddress> {
    node.value
        .as_ref()
        .and_then(Payload::as_str)
        .map(NormalizedAddress::new)
}

// ── Fallbacks ──────────────────────────────────────────────

fn unsupported(
    graph: &ScValGraph,
    id: ScValId,
    variant: &str,
    node: &ScVal,
    budget: Option<usize>,
) -> NormalizedValue {
    NormalizedValue::unsupported(variant, wire::raw_payload(graph, id, node.value.as_ref(), budget))
}

// ── Integer checks ─────────────────────────────────────────

fn as_u32(payload: &Payload) -> Option<u32> {
    let n = payload.as_f64()?;
    (n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n)).then(|| n as u32)
}

fn as_i32(payload: &Payload) -> Option<i32> {
    let n = payload.as_f64()?;
    (n.fract() == 0.0 && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&n)).then(|| n as i32)
}

// ── Error payloads ─────────────────────────────────────────

fn normalize_error(graph: &ScValGraph, payload: Option<&Payload>, budget: Option<usize>) -> NormalizedValue {
    let fields = payload.and_then(|p| Some((p.field("type")?, p.field("code")?)));
    match fields {
        Some((error_type, code)) => {
            NormalizedValue::error(coerce_error_type(graph, error_type, budget), coerce_error_code(code))
        }
        None => NormalizedValue::unknown_error(),
    }
}

/// String form of an error class, whatever its payload type
fn coerce_error_type(graph: &ScValGraph, payload: &Payload, budget: Option<usize>) -> String {
    match payload {
        Payload::String(s) => s.clone(),
        Payload::Null => "null".to_string(),
        Payload::Bool(b) => b.to_string(),
        Payload::Number(n) => match number_to_json(*n) {
            Value::Null => n.to_string(),
            json => json.to_string(),
        },
        other => wire::payload_to_json_within(graph, other, budget).to_string(),
    }
}

/// Numeric error code; anything without a finite numeric reading is 0
///
/// Strings are read as decimal or with a `0x`, `0o` or `0b` radix prefix.
/// Fractional codes are truncated toward zero.
fn coerce_error_code(payload: &Payload) -> i64 {
    let n = match payload {
        Payload::Number(n) => *n,
        Payload::String(s) => parse_code(s.trim()),
        Payload::Bool(b) => f64::from(u8::from(*b)),
        Payload::List(items) if items.len() == 1 => return coerce_error_code(&items[0]),
        _ => 0.0,
    };
    if n.is_finite() {
        n.trunc() as i64
    } else {
        0
    }
}

fn parse_code(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    match radix {
        Some(radix) => u64::from_str_radix(&s[2..], radix).map(|n| n as f64).unwrap_or(0.0),
        None => s.parse::<f64>().unwrap_or(0.0),
    }
}
