//! Generator configuration.

use std::path::Path;

use lodestar_kernel::carrier::state::StateEncodingV1;
use lodestar_kernel::proof::canon::canonical_json_bytes;
use lodestar_kernel::proof::hash::{canonical_hash, ContentHash, DOMAIN_GENERATOR_CONFIG};

/// Schema version written into (and accepted from) config JSON.
pub const CONFIG_SCHEMA_VERSION: &str = "generator_config.v1";

/// Largest accepted `max_facts`: every `u32` fact id addressable.
pub const MAX_FACTS_LIMIT: u64 = 1 << 32;

/// Which applicable-action generator to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorModeV1 {
    /// Precomputed action table filtered per state. Lifted tasks are
    /// grounded first.
    Grounded,
    /// Schemas matched against each state on demand.
    #[default]
    Lifted,
}

impl GeneratorModeV1 {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grounded => "grounded",
            Self::Lifted => "lifted",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "grounded" => Some(Self::Grounded),
            "lifted" => Some(Self::Lifted),
            _ => None,
        }
    }
}

/// Grounded precondition filtering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroundedMatchV1 {
    /// Fact → actions requiring it; per query, count satisfied
    /// preconditions for actions touched by the state's facts.
    #[default]
    InvertedIndex,
    /// Test every action against the state. O(actions × preconditions)
    /// per query; fine for small problems.
    NaiveScan,
}

impl GroundedMatchV1 {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvertedIndex => "inverted_index",
            Self::NaiveScan => "naive_scan",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inverted_index" => Some(Self::InvertedIndex),
            "naive_scan" => Some(Self::NaiveScan),
            _ => None,
        }
    }
}

/// Typed failure for configuration loading and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The bytes are not a JSON object.
    Parse { detail: String },
    UnknownKey { key: String },
    InvalidValue { key: String, detail: String },
    Io { path: String, detail: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse { detail } => write!(f, "config is not a JSON object: {detail}"),
            Self::UnknownKey { key } => write!(f, "unknown config key `{key}`"),
            Self::InvalidValue { key, detail } => {
                write!(f, "invalid value for config key `{key}`: {detail}")
            }
            Self::Io { path, detail } => write!(f, "cannot read config {path}: {detail}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Successor generator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfigV1 {
    pub mode: GeneratorModeV1,
    /// Encoding used by the repository the generator creates.
    pub encoding: StateEncodingV1,
    /// Upper bound on distinct fact ids a state may reference.
    pub max_facts: usize,
    pub grounded_match: GroundedMatchV1,
}

impl Default for GeneratorConfigV1 {
    fn default() -> Self {
        Self {
            mode: GeneratorModeV1::Lifted,
            encoding: StateEncodingV1::DenseBitset,
            max_facts: 65_536,
            grounded_match: GroundedMatchV1::InvertedIndex,
        }
    }
}

impl GeneratorConfigV1 {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `max_facts` is zero or above
    /// [`MAX_FACTS_LIMIT`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range = u64::try_from(self.max_facts).is_ok_and(|n| (1..=MAX_FACTS_LIMIT).contains(&n));
        if !in_range {
            return Err(ConfigError::InvalidValue {
                key: "max_facts".into(),
                detail: format!("{} is outside 1..={MAX_FACTS_LIMIT}", self.max_facts),
            });
        }
        Ok(())
    }

    /// Parse a JSON object. Missing keys take their defaults; unknown keys
    /// are rejected. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed JSON, unknown keys, bad values,
    /// or a failed [`validate`](Self::validate).
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::Parse {
                detail: e.to_string(),
            })?;
        let serde_json::Value::Object(map) = value else {
            return Err(ConfigError::Parse {
                detail: "top-level value is not an object".into(),
            });
        };

        let mut config = Self::default();
        for (key, value) in &map {
            let invalid = |detail: &str| ConfigError::InvalidValue {
                key: key.clone(),
                detail: detail.to_string(),
            };
            match key.as_str() {
                "schema_version" => {
                    if value.as_str() != Some(CONFIG_SCHEMA_VERSION) {
                        return Err(invalid("expected \"generator_config.v1\""));
                    }
                }
                "mode" => {
                    config.mode = value
                        .as_str()
                        .and_then(GeneratorModeV1::parse)
                        .ok_or_else(|| invalid("expected \"grounded\" or \"lifted\""))?;
                }
                "encoding" => {
                    config.encoding = value
                        .as_str()
                        .and_then(StateEncodingV1::parse)
                        .ok_or_else(|| invalid("expected \"dense_bitset\" or \"sparse_sorted\""))?;
                }
                "grounded_match" => {
                    config.grounded_match = value
                        .as_str()
                        .and_then(GroundedMatchV1::parse)
                        .ok_or_else(|| invalid("expected \"inverted_index\" or \"naive_scan\""))?;
                }
                "max_facts" => {
                    config.max_facts = value
                        .as_u64()
                        .and_then(|n| usize::try_from(n).ok())
                        .ok_or_else(|| invalid("expected a non-negative integer"))?;
                }
                _ => return Err(ConfigError::UnknownKey { key: key.clone() }),
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_json_bytes`](Self::from_json_bytes).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        Self::from_json_bytes(&bytes)
    }

    /// Canonical JSON bytes; [`from_json_bytes`](Self::from_json_bytes)
    /// accepts them back.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if canonicalization fails.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        let value = serde_json::json!({
            "encoding": self.encoding.as_str(),
            "grounded_match": self.grounded_match.as_str(),
            "max_facts": self.max_facts as u64,
            "mode": self.mode.as_str(),
            "schema_version": CONFIG_SCHEMA_VERSION,
        });
        canonical_json_bytes(&value).map_err(|e| ConfigError::Parse {
            detail: e.to_string(),
        })
    }

    /// Content hash of [`canonical_bytes`](Self::canonical_bytes).
    ///
    /// # Errors
    ///
    /// Same as [`canonical_bytes`](Self::canonical_bytes).
    pub fn digest(&self) -> Result<ContentHash, ConfigError> {
        Ok(canonical_hash(
            DOMAIN_GENERATOR_CONFIG,
            &self.canonical_bytes()?,
        ))
    }
}
