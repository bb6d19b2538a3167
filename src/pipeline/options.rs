//! Execution options shared by every component invocation.

use crate::core::types::ImageFormat;
use serde::{Deserialize, Serialize};

/// Options for executing a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Whether to process the images of a batch in parallel.
    pub parallel: bool,
    /// Maximum number of parallel threads (0 = use all available).
    pub max_threads: usize,
    /// Format used when the source format cannot be encoded.
    pub fallback_format: ImageFormat,
    /// Whether to record the caller's id in written metadata.
    pub annotate_user: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_threads: 0, // Use all available
            fallback_format: ImageFormat::Png,
            annotate_user: true,
        }
    }
}

impl ExecutionOptions {
    /// Create a new options builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// Enable/disable parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set maximum threads.
    pub fn with_max_threads(mut self, max: usize) -> Self {
        self.max_threads = max;
        self
    }

    /// Set the fallback encoding format.
    pub fn with_fallback_format(mut self, format: ImageFormat) -> Self {
        self.fallback_format = format;
        self
    }

    /// Enable/disable user annotation on written objects.
    pub fn with_annotate_user(mut self, annotate: bool) -> Self {
        self.annotate_user = annotate;
        self
    }
}
