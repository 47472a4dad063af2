//! JavaScript/TypeScript bindings for the State Lens normalizer
//!
//! Thin wrapper around `lens-core` compiled to WebAssembly, so a web worker
//! can normalize values off the main thread and post the JSON back.
//! No normalization logic lives here.

use lens_core::scval::wire;
use lens_core::{normalize_root, normalize_sc_address, NormalizeOptions};
use wasm_bindgen::prelude::*;

/// Normalize a source value given as JSON text.
///
/// Guarantees:
///   - Total: malformed values become `unsupported` markers, never errors
///   - Deterministic: same input → same output
///   - Terminating: pass `maxDepth` for untrusted deep input
///
/// @param json - `{"switch": ..., "value": ...}` source value as JSON text
/// @param maxDepth - optional depth ceiling; deeper nodes become `truncated`
/// @returns JSON string of the normalized value
/// @throws Error if `json` is not valid JSON
#[wasm_bindgen(js_name = "normalizeScVal")]
pub fn normalize_sc_val(json: &str, max_depth: Option<u32>) -> Result<String, JsError> {
    let mut options = NormalizeOptions::new();
    options.max_depth = max_depth.map(|d| d as usize);

    let decoded = wire::from_str(json).map_err(|e| JsError::new(&e.to_string()))?;
    let result = normalize_root(&decoded.graph, Some(&decoded.root), &options);

    serde_json::to_string(&result).map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Classify an `ScvAddress` value by its prefix.
///
/// @param json - source value as JSON text
/// @returns JSON string `{addressType, value}`, or `undefined` if the value
///   is not an `ScvAddress` with a string payload
/// @throws Error if `json` is not valid JSON
#[wasm_bindgen(js_name = "normalizeScAddress")]
pub fn normalize_sc_address_json(json: &str) -> Result<Option<String>, JsError> {
    let decoded = wire::from_str(json).map_err(|e| JsError::new(&e.to_string()))?;

    match normalize_sc_address(&decoded.graph, decoded.root_id()) {
        Some(address) => serde_json::to_string(&address)
            .map(Some)
            .map_err(|e| JsError::new(&format!("Serialization error: {}", e))),
        None => Ok(None),
    }
}
