// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser configuration.

/// Default size of the tokenizer read buffer in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Tunables shared by the tokenizer and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserConfig {
    /// Drop `#` comments inside the tokenizer instead of returning them.
    pub skip_comments: bool,
    /// Number of bytes pulled from the reader per refill.
    pub chunk_size: usize,
    /// Do not forward error diagnostics to the sink (lines are still skipped).
    pub ignore_errors: bool,
    /// Do not forward warning diagnostics to the sink.
    pub ignore_warnings: bool,
}

impl ParserConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            skip_comments: env_flag("OBJ_LITE_SKIP_COMMENTS").unwrap_or(defaults.skip_comments),
            chunk_size: std::env::var("OBJ_LITE_CHUNK_SIZE")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.chunk_size)
                .max(1),
            ignore_errors: env_flag("OBJ_LITE_IGNORE_ERRORS").unwrap_or(defaults.ignore_errors),
            ignore_warnings: env_flag("OBJ_LITE_IGNORE_WARNINGS")
                .unwrap_or(defaults.ignore_warnings),
        }
    }

    pub fn with_skip_comments(mut self, skip: bool) -> Self {
        self.skip_comments = skip;
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    pub fn with_ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    pub fn with_ignore_warnings(mut self, ignore: bool) -> Self {
        self.ignore_warnings = ignore;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            skip_comments: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            ignore_errors: false,
            ignore_warnings: false,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
