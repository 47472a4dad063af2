//! Lens Core - ScVal normalization engine for the State Lens tooling
//!
//! Turns Soroban contract values of arbitrary shape into one closed,
//! JSON-serializable union that renderers and diff views can consume without
//! re-validating the input.
//!
//! # Architecture
//!
//! ```text
//! JSON text → wire decoder → ScValGraph → Normalizer → NormalizedValue
//!                                            ↓
//!                                      VisitedTracker (cycle guard)
//! ```
//!
//! # Guarantees
//!
//! - **Total**: every input normalizes; bad shapes become typed fallbacks
//! - **Terminating**: cycles become markers, `max_depth` bounds deep input
//! - **Deterministic**: same input always produces identical output
//! - **Lossless on the wire**: every output round-trips through JSON

pub mod config;
pub mod error;
pub mod guards;
pub mod normalized;
pub mod normalizer;
pub mod scval;

pub use config::{LensConfig, NormalizeOptions};
pub use error::{Error, Result};
pub use guards::VisitedTracker;
pub use normalized::{AddressType, Census, MapEntry, NormalizedAddress, NormalizedValue, PrimitiveKind, PrimitiveValue};
pub use normalizer::{
    normalize_json, normalize_json_str, normalize_root, normalize_sc_address, normalize_sc_val,
    normalize_sc_val_with, normalize_with_tracker,
};
pub use scval::{Payload, ScVal, ScValGraph, ScValId, ScValType, Tag};
