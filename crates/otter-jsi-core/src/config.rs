//! Runtime configuration

use otter_jsi_sys::DEFAULT_CAPACITY;

/// Configuration for creating a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Label used in logs
    pub name: String,
    /// Maximum number of live values in the default engine
    pub max_values: usize,
    /// Maximum object nesting followed by `to_json`
    pub max_json_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: "otter-jsi".to_string(),
            max_values: DEFAULT_CAPACITY,
            max_json_depth: 128,
        }
    }
}

impl RuntimeConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log label.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the value limit of the default engine.
    pub fn max_values(mut self, max_values: usize) -> Self {
        self.max_values = max_values;
        self
    }

    /// Set the JSON nesting limit.
    pub fn max_json_depth(mut self, depth: usize) -> Self {
        self.max_json_depth = depth;
        self
    }
}
