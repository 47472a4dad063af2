//! Normalized value union - the single output contract of the normalizer
//!
//! Every shape the normalizer can emit is a variant of [`NormalizedValue`].
//! The serde form is the wire contract consumed by renderers and by callers
//! on the other side of a worker boundary, so it is internally tagged on
//! `kind` and carries only JSON-representable leaves.
//!
//! ```text
//! primitive   {"kind":"primitive","primitive":"u32","value":7}
//! vec         {"kind":"vec","items":[..]}
//! map         {"kind":"map","entries":[{"key":..,"value":..}]}
//! address     {"kind":"address","addressType":"account","value":"G.."}
//! truncated   {"kind":"truncated","depth":1}
//! cycle       {"kind":"cycle","depth":2}
//! error       {"kind":"error","type":"contract","code":1}
//! unsupported {"kind":"unsupported","variant":"ScvU64","rawData":..}
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Result;

/// Variant name used for values that are not source values at all
pub const INVALID_VARIANT: &str = "Invalid";

/// Error class reported when an error payload is malformed
pub const UNKNOWN_ERROR_TYPE: &str = "unknown";

/// Discriminant of the cycle marker on the wire
pub const CYCLE_KIND: &str = "cycle";

/// Discriminant of the truncated marker on the wire
pub const TRUNCATED_KIND: &str = "truncated";

// ── Union ─────────────────────────────────────────────────

/// The complete set of shapes the normalizer can emit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NormalizedValue {
    Primitive {
        primitive: PrimitiveKind,
        value: PrimitiveValue,
    },
    Vec {
        items: Vec<NormalizedValue>,
    },
    /// Entry list rather than a keyed object, so composite keys and source
    /// order both survive
    Map {
        entries: Vec<MapEntry>,
    },
    Address(NormalizedAddress),
    /// Stands in for a subtree cut off by the depth ceiling
    Truncated {
        depth: usize,
    },
    /// Stands in for a source node already entered during this call
    Cycle {
        depth: usize,
    },
    Error {
        #[serde(rename = "type")]
        error_type: String,
        /// Integral code; fractional source codes are truncated toward zero
        code: i64,
    },
    Unsupported {
        variant: String,
        #[serde(rename = "rawData")]
        raw_data: serde_json::Value,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Bool,
    U32,
    I32,
    String,
    Symbol,
    Void,
}

/// Scalar carried by a primitive: boolean, number, string or null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimitiveValue {
    Null,
    Bool(bool),
    Number(i64),
    String(String),
}

/// A single key/value pair of a normalized map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: NormalizedValue,
    pub value: NormalizedValue,
}

/// Address class, decided by the first character of the strkey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressType {
    Account,
    Contract,
    MuxedAccount,
    ClaimableBalance,
    LiquidityPool,
    Unknown,
}

impl AddressType {
    /// Classify a canonical address string by its prefix
    pub fn classify(address: &str) -> Self {
        match address.chars().next() {
            Some('G') => AddressType::Account,
            Some('C') => AddressType::Contract,
            Some('M') => AddressType::MuxedAccount,
            Some('B') => AddressType::ClaimableBalance,
            Some('P') => AddressType::LiquidityPool,
            _ => AddressType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AddressType::Account => "account",
            AddressType::Contract => "contract",
            AddressType::MuxedAccount => "muxedAccount",
            AddressType::ClaimableBalance => "claimableBalance",
            AddressType::LiquidityPool => "liquidityPool",
            AddressType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAddress {
    pub address_type: AddressType,
    pub value: String,
}

impl NormalizedAddress {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        NormalizedAddress {
            address_type: AddressType::classify(&value),
            value,
        }
    }
}

// ── Constructors ──────────────────────────────────────────

impl NormalizedValue {
    fn primitive(primitive: PrimitiveKind, value: PrimitiveValue) -> Self {
        NormalizedValue::Primitive { primitive, value }
    }

    pub fn bool(b: bool) -> Self {
        Self::primitive(PrimitiveKind::Bool, PrimitiveValue::Bool(b))
    }

    pub fn u32(n: u32) -> Self {
        Self::primitive(PrimitiveKind::U32, PrimitiveValue::Number(i64::from(n)))
    }

    pub fn i32(n: i32) -> Self {
        Self::primitive(PrimitiveKind::I32, PrimitiveValue::Number(i64::from(n)))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::primitive(PrimitiveKind::String, PrimitiveValue::String(s.into()))
    }

    pub fn symbol(s: impl Into<String>) -> Self {
        Self::primitive(PrimitiveKind::Symbol, PrimitiveValue::String(s.into()))
    }

    pub fn void() -> Self {
        Self::primitive(PrimitiveKind::Void, PrimitiveValue::Null)
    }

    pub fn truncated(depth: usize) -> Self {
        NormalizedValue::Truncated { depth }
    }

    pub fn cycle(depth: usize) -> Self {
        NormalizedValue::Cycle { depth }
    }

    pub fn error(error_type: impl Into<String>, code: i64) -> Self {
        NormalizedValue::Error {
            error_type: error_type.into(),
            code,
        }
    }

    /// Default reported for malformed error payloads
    pub fn unknown_error() -> Self {
        Self::error(UNKNOWN_ERROR_TYPE, 0)
    }

    pub fn unsupported(variant: impl Into<String>, raw_data: serde_json::Value) -> Self {
        NormalizedValue::Unsupported {
            variant: variant.into(),
            raw_data,
        }
    }

    /// Fallback for a value that is not a source value
    pub fn invalid(raw_data: serde_json::Value) -> Self {
        Self::unsupported(INVALID_VARIANT, raw_data)
    }
}

// ── Inspection ────────────────────────────────────────────

impl NormalizedValue {
    /// The wire discriminant
    pub fn kind(&self) -> &'static str {
        match self {
            NormalizedValue::Primitive { .. } => "primitive",
            NormalizedValue::Vec { .. } => "vec",
            NormalizedValue::Map { .. } => "map",
            NormalizedValue::Address(_) => "address",
            NormalizedValue::Truncated { .. } => TRUNCATED_KIND,
            NormalizedValue::Cycle { .. } => CYCLE_KIND,
            NormalizedValue::Error { .. } => "error",
            NormalizedValue::Unsupported { .. } => "unsupported",
        }
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, NormalizedValue::Cycle { .. })
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, NormalizedValue::Truncated { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, NormalizedValue::Unsupported { .. })
    }

    /// Scalar of a primitive, `None` for every other variant
    pub fn primitive_value(&self) -> Option<&PrimitiveValue> {
        match self {
            NormalizedValue::Primitive { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[NormalizedValue]> {
        match self {
            NormalizedValue::Vec { items } => Some(items),
            _ => None,
        }
    }

    pub fn entries(&self) -> Option<&[MapEntry]> {
        match self {
            NormalizedValue::Map { entries } => Some(entries),
            _ => None,
        }
    }

    /// Number of composite levels: 0 for leaves, 1 + deepest child otherwise
    pub fn nesting_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            match node {
                NormalizedValue::Vec { items } => {
                    stack.extend(items.iter().map(|item| (item, level + 1)));
                }
                NormalizedValue::Map { entries } => {
                    for entry in entries {
                        stack.push((&entry.key, level + 1));
                        stack.push((&entry.value, level + 1));
                    }
                }
                _ => {}
            }
        }
        deepest
    }

    /// Count every node of the tree by kind
    pub fn census(&self) -> Census {
        let mut census = Census::default();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            census.record(node);
            match node {
                NormalizedValue::Vec { items } => stack.extend(items.iter()),
                NormalizedValue::Map { entries } => {
                    for entry in entries {
                        stack.push(&entry.key);
                        stack.push(&entry.value);
                    }
                }
                _ => {}
            }
        }
        census
    }

    /// Compact JSON text of the value
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// SHA-256 over the compact JSON text, as lowercase hex
    ///
    /// Equal normalized values always hash equal, so this is a cheap way to
    /// compare normalizations across processes.
    pub fn content_hash(&self) -> Result<String> {
        let canonical = self.to_json_string()?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Per-kind node counts of a normalized tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    pub primitive: usize,
    pub vec: usize,
    pub map: usize,
    pub address: usize,
    pub error: usize,
    pub unsupported: usize,
    pub cycle: usize,
    pub truncated: usize,
}

impl Census {
    fn record(&mut self, value: &NormalizedValue) {
        let slot = match value {
            NormalizedValue::Primitive { .. } => &mut self.primitive,
            NormalizedValue::Vec { .. } => &mut self.vec,
            NormalizedValue::Map { .. } => &mut self.map,
            NormalizedValue::Address(_) => &mut self.address,
            NormalizedValue::Error { .. } => &mut self.error,
            NormalizedValue::Unsupported { .. } => &mut self.unsupported,
            NormalizedValue::Cycle { .. } => &mut self.cycle,
            NormalizedValue::Truncated { .. } => &mut self.truncated,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.primitive
            + self.vec
            + self.map
            + self.address
            + self.error
            + self.unsupported
            + self.cycle
            + self.truncated
    }

    /// Nodes that stand in for something the normalizer did not decode
    pub fn fallbacks(&self) -> usize {
        self.unsupported + self.cycle + self.truncated
    }
}
