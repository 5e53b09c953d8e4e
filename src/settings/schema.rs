//! Settings schema for the interview runtime.
//!
//! All settings structs use `#[serde(default)]` to allow partial configuration files.
//! Missing fields are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Root settings structure.
///
/// Loaded from `~/.interview-room/settings.toml` with environment variable interpolation support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Platform API connection
    pub api: ApiSettings,

    /// Free-text autosave
    pub autosave: AutosaveSettings,

    /// Result polling cadence used by front-ends
    pub results: ResultSettings,

    /// Advanced/debug settings
    pub advanced: AdvancedSettings,
}

/// Platform API connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// API root, e.g. "http://localhost:8003"
    pub base_url: String,

    /// Bearer token (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Autosave settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveSettings {
    /// Quiet period after the last edit before an answer is saved
    pub debounce_ms: u64,
}

/// Result polling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultSettings {
    /// Delay between result fetches while grading is pending
    pub poll_interval_secs: u64,

    /// Give up after this many fetches
    pub max_polls: u32,
}

/// Advanced settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Log level: "error" | "warn" | "info" | "debug" | "trace"
    pub log_level: String,
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            version: 1,
            api: ApiSettings::default(),
            autosave: AutosaveSettings::default(),
            results: ResultSettings::default(),
            advanced: AdvancedSettings::default(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8003".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl Default for ResultSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 3,
            max_polls: 20,
        }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}
