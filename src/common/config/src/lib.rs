//! Configuration management for unguard.
//!
//! Provides configuration for the guard rewrite and for the reference engine.

use common_error::UnguardResult;
use serde::{Deserialize, Serialize};

/// Global unguard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UnguardConfig {
    /// Guard rewrite configuration.
    #[serde(default)]
    pub rewrite: RewriteConfig,
    /// Engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl UnguardConfig {
    /// Parse a configuration from JSON; missing sections take their defaults.
    pub fn from_json(json: &str) -> UnguardResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> UnguardResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Which guard shapes to remove and how the rewrite pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Remove guards whose non-null branch unwraps a nullable wrapper (`x.Value`).
    pub member_unwrap: bool,
    /// Remove guards whose non-null branch calls a method on the guarded path.
    pub method_unwrap: bool,
    /// Maximum number of pipeline passes; 1 means a single pass.
    pub max_passes: usize,
    /// Record before/after text for every rule that changed the tree.
    pub enable_trace: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            member_unwrap: true,
            method_unwrap: true,
            max_passes: 1,
            enable_trace: false,
        }
    }
}

impl RewriteConfig {
    /// Only remove member-unwrap guards.
    pub fn member_only() -> Self {
        Self {
            method_unwrap: false,
            ..Default::default()
        }
    }

    /// Only remove method-call guards.
    pub fn method_only() -> Self {
        Self {
            member_unwrap: false,
            ..Default::default()
        }
    }

    /// Set the maximum number of passes.
    #[must_use]
    pub fn with_max_passes(mut self, max: usize) -> Self {
        self.max_passes = max;
        self
    }

    /// Enable or disable tracing.
    #[must_use]
    pub fn with_trace(mut self, enable: bool) -> Self {
        self.enable_trace = enable;
        self
    }

    /// Whether any guard shape is enabled.
    pub fn any_enabled(&self) -> bool {
        self.member_unwrap || self.method_unwrap
    }
}

/// Reference engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Refuse to translate conditional nodes, like a remote provider would.
    pub strict: bool,
    /// Number of rows per yielded chunk when enumerating.
    pub batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict: false,
            batch_size: 1024,
        }
    }
}

impl EngineConfig {
    /// A strict engine configuration.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Default::default()
        }
    }

    /// Set the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}
