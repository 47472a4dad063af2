//! Source value model - the tagged `ScVal` tree handed to the normalizer
//!
//! A source value is a discriminant (`switch`) plus an optional opaque
//! payload. Payload shape is never checked here; each tag's arm in the
//! normalizer decides what it accepts. Composite payloads point at other
//! source values through [`ScValId`] handles into an [`ScValGraph`], which is
//! how shared and cyclic structures are expressed.

pub mod graph;
pub mod wire;

use std::fmt;

pub use graph::{ScValGraph, ScValId};

// ── Tag vocabulary ────────────────────────────────────────

/// Soroban contract value variants, named as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScValType {
    Bool,
    Void,
    U32,
    I32,
    U64,
    I64,
    Timepoint,
    Duration,
    U128,
    I128,
    U256,
    I256,
    Bytes,
    String,
    Symbol,
    Error,
    Vec,
    Map,
    Address,
    ContractInstance,
    LedgerKeyContractInstance,
    LedgerKeyNonce,
}

impl ScValType {
    pub const ALL: [ScValType; 22] = [
        ScValType::Bool,
        ScValType::Void,
        ScValType::U32,
        ScValType::I32,
        ScValType::U64,
        ScValType::I64,
        ScValType::Timepoint,
        ScValType::Duration,
        ScValType::U128,
        ScValType::I128,
        ScValType::U256,
        ScValType::I256,
        ScValType::Bytes,
        ScValType::String,
        ScValType::Symbol,
        ScValType::Error,
        ScValType::Vec,
        ScValType::Map,
        ScValType::Address,
        ScValType::ContractInstance,
        ScValType::LedgerKeyContractInstance,
        ScValType::LedgerKeyNonce,
    ];

    /// Wire name of the variant, e.g. `"ScvU32"`
    pub fn as_str(&self) -> &'static str {
        match self {
            ScValType::Bool => "ScvBool",
            ScValType::Void => "ScvVoid",
            ScValType::U32 => "ScvU32",
            ScValType::I32 => "ScvI32",
            ScValType::U64 => "ScvU64",
            ScValType::I64 => "ScvI64",
            ScValType::Timepoint => "ScvTimepoint",
            ScValType::Duration => "ScvDuration",
            ScValType::U128 => "ScvU128",
            ScValType::I128 => "ScvI128",
            ScValType::U256 => "ScvU256",
            ScValType::I256 => "ScvI256",
            ScValType::Bytes => "ScvBytes",
            ScValType::String => "ScvString",
            ScValType::Symbol => "ScvSymbol",
            ScValType::Error => "ScvError",
            ScValType::Vec => "ScvVec",
            ScValType::Map => "ScvMap",
            ScValType::Address => "ScvAddress",
            ScValType::ContractInstance => "ScvContractInstance",
            ScValType::LedgerKeyContractInstance => "ScvLedgerKeyContractInstance",
            ScValType::LedgerKeyNonce => "ScvLedgerKeyNonce",
        }
    }

    /// Look up a variant by its wire name (case-sensitive)
    pub fn from_switch(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ty| ty.as_str() == name)
    }
}

impl fmt::Display for ScValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of a received source value
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// A variant from the Soroban vocabulary
    Known(ScValType),
    /// A string discriminant outside the vocabulary
    Other(String),
    /// Missing or non-string discriminant, kept verbatim
    Invalid(serde_json::Value),
}

impl Tag {
    /// Classify a string discriminant
    pub fn from_switch(name: &str) -> Self {
        match ScValType::from_switch(name) {
            Some(ty) => Tag::Known(ty),
            None => Tag::Other(name.to_string()),
        }
    }

    /// The discriminant as a string, if it is one
    pub fn name(&self) -> Option<&str> {
        match self {
            Tag::Known(ty) => Some(ty.as_str()),
            Tag::Other(name) => Some(name),
            Tag::Invalid(_) => None,
        }
    }

    /// The discriminant in its wire form
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Tag::Invalid(raw) => raw.clone(),
            other => serde_json::Value::String(other.name().unwrap_or_default().to_string()),
        }
    }
}

impl From<ScValType> for Tag {
    fn from(ty: ScValType) -> Self {
        Tag::Known(ty)
    }
}

// ── Payload ───────────────────────────────────────────────

/// Opaque payload of a source value
///
/// Numbers are carried as `f64`, the way they arrive from JSON, so that
/// range and integrality checks happen in the normalizer rather than at the
/// boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Payload>),
    /// Ordered record fields
    Record(Vec<(String, Payload)>),
    /// Reference to another source value in the same graph
    Node(ScValId),
}

impl Payload {
    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Payload::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Payload::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Payload]> {
        match self {
            Payload::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<ScValId> {
        match self {
            Payload::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Look up a record field; `None` for missing fields and non-records
    pub fn field(&self, name: &str) -> Option<&Payload> {
        match self {
            Payload::Record(fields) => fields.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Build a record from `(name, value)` pairs, preserving their order
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Payload)>,
    {
        Payload::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Bool(b)
    }
}

impl From<f64> for Payload {
    fn from(n: f64) -> Self {
        Payload::Number(n)
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Payload::Number(n as f64)
    }
}

impl From<i32> for Payload {
    fn from(n: i32) -> Self {
        Payload::Number(f64::from(n))
    }
}

impl From<u32> for Payload {
    fn from(n: u32) -> Self {
        Payload::Number(f64::from(n))
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::String(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::String(s)
    }
}

impl From<ScValId> for Payload {
    fn from(id: ScValId) -> Self {
        Payload::Node(id)
    }
}

impl From<Vec<Payload>> for Payload {
    fn from(items: Vec<Payload>) -> Self {
        Payload::List(items)
    }
}

// ── Source node ───────────────────────────────────────────

/// A single source value: discriminant plus optional payload
///
/// `value: None` is an absent payload, which several arms treat differently
/// from an explicit `Payload::Null` (only in the raw data they report).
#[derive(Debug, Clone, PartialEq)]
pub struct ScVal {
    pub tag: Tag,
    pub value: Option<Payload>,
}

impl ScVal {
    pub fn new(tag: impl Into<Tag>, value: Option<Payload>) -> Self {
        ScVal {
            tag: tag.into(),
            value,
        }
    }

    /// The known variant, if the discriminant is in the vocabulary
    pub fn scval_type(&self) -> Option<ScValType> {
        match self.tag {
            Tag::Known(ty) => Some(ty),
            _ => None,
        }
    }
}
