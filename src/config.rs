// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Engine configuration
//!
//! Controls expression and accessor caching and input limits.

use serde::{Deserialize, Serialize};

/// Engine configuration
///
/// # Examples
///
/// ```rust
/// use fieldrule::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_expression_cache_size(5000)
///     .with_max_expression_length(1024);
/// assert!(config.validate().is_empty());
///
/// let config: EngineConfig =
///     serde_json::from_str(r#"{"enable_accessor_cache": false}"#).unwrap();
/// assert!(config.enable_expression_cache);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cache parsed expressions by tag text. Default: true
    pub enable_expression_cache: bool,

    /// Maximum number of cached expressions; the cache is cleared when full.
    /// Default: 1000
    pub max_expression_cache_size: usize,

    /// Cache compiled field accessors. When disabled every field reference
    /// is compiled on each resolution. Default: true
    pub enable_accessor_cache: bool,

    /// Longest accepted expression in bytes. Default: 4096
    pub max_expression_length: usize,
}

impl EngineConfig {
    /// Create new configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the expression cache
    pub fn with_expression_cache(mut self, enabled: bool) -> Self {
        self.enable_expression_cache = enabled;
        self
    }

    /// Set maximum expression cache size
    pub fn with_expression_cache_size(mut self, size: usize) -> Self {
        self.max_expression_cache_size = size;
        self
    }

    /// Enable or disable the accessor cache
    pub fn with_accessor_cache(mut self, enabled: bool) -> Self {
        self.enable_accessor_cache = enabled;
        self
    }

    /// Set maximum expression length
    pub fn with_max_expression_length(mut self, length: usize) -> Self {
        self.max_expression_length = length;
        self
    }

    /// Configuration with both caches disabled
    ///
    /// Every evaluation re-parses and re-compiles; useful for measuring cache
    /// effects and for tests that must not share state.
    pub fn uncached() -> Self {
        Self {
            enable_expression_cache: false,
            max_expression_cache_size: 0,
            enable_accessor_cache: false,
            ..Self::default()
        }
    }

    /// Check for settings that are likely mistakes
    ///
    /// Returns one warning per problem; an empty list means the configuration
    /// looks sane.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.enable_expression_cache && self.max_expression_cache_size == 0 {
            warnings.push(
                "expression cache is enabled but max_expression_cache_size is 0 - cache will not be effective"
                    .to_string(),
            );
        }

        if self.enable_expression_cache && self.max_expression_cache_size > 100_000 {
            warnings.push(
                "max_expression_cache_size is very high (>100000) - may consume excessive memory"
                    .to_string(),
            );
        }

        if self.max_expression_length == 0 {
            warnings.push("max_expression_length is 0 - every expression will be rejected".to_string());
        }

        warnings
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_expression_cache: true,
            max_expression_cache_size: 1000,
            enable_accessor_cache: true,
            max_expression_length: 4096,
        }
    }
}
