//! Normalization options and the `lens.toml` configuration file
//!
//! The library defaults to no depth ceiling. Tools that normalize untrusted
//! input from the command line load a [`LensConfig`] instead, which applies
//! [`DEFAULT_MAX_DEPTH`] unless the file or a flag says otherwise.
//!
//! ```toml
//! [normalize]
//! max_depth = 32
//! decode_addresses = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Depth ceiling applied by [`LensConfig`] when none is configured
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// File name looked up by [`LensConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "lens.toml";

/// Per-call normalization limits and switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeOptions {
    /// Inclusive ceiling: a node entered at `depth >= max_depth` becomes a
    /// truncated marker. `None` disables the ceiling.
    pub max_depth: Option<usize>,
    /// Decode `ScvAddress` nodes with a string payload into address values
    /// instead of reporting them as unsupported.
    pub decode_addresses: bool,
}

impl NormalizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_decode_addresses(mut self, decode: bool) -> Self {
        self.decode_addresses = decode;
        self
    }

    /// Whether a node entered at `depth` must be replaced by a truncated marker
    pub fn truncates_at(&self, depth: usize) -> bool {
        self.max_depth.is_some_and(|max| depth >= max)
    }
}

// ── Config file ───────────────────────────────────────────

/// Contents of `lens.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LensConfig {
    pub normalize: NormalizeSection,
}

/// `[normalize]` table; unset keys fall back to tool defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeSection {
    pub max_depth: Option<usize>,
    /// Set to `true` to lift the default depth ceiling entirely
    pub unbounded: bool,
    pub decode_addresses: Option<bool>,
}

impl LensConfig {
    /// Parse a config from TOML text
    ///
    /// # Errors
    /// Returns `Config` for malformed TOML, unknown keys, or a table that
    /// sets both `max_depth` and `unbounded`.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: LensConfig = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&text).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Load `lens.toml` from `dir` if present, defaults otherwise
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading config");
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.normalize.unbounded && self.normalize.max_depth.is_some() {
            return Err(Error::Config(
                "[normalize] sets both max_depth and unbounded".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the file settings into options, applying tool defaults
    pub fn normalize_options(&self) -> NormalizeOptions {
        let max_depth = if self.normalize.unbounded {
            None
        } else {
            Some(self.normalize.max_depth.unwrap_or(DEFAULT_MAX_DEPTH))
        };
        NormalizeOptions {
            max_depth,
            decode_addresses: self.normalize.decode_addresses.unwrap_or(false),
        }
    }
}
