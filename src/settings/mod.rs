//! User settings for the interview client.
//!
//! One TOML file, `~/.interview-room/settings.toml`. Every section has
//! defaults, so a partial or missing file is fine. String values written as
//! `$VAR` or `${VAR}` are read from the environment.
//!
//! ```rust,ignore
//! let manager = SettingsManager::new().await?;
//! let debounce = manager.get().await.autosave.debounce_ms;
//! manager.store_token(&auth.token).await?;
//! ```

pub mod loader;
pub mod schema;

pub use loader::{get_with_env_fallback, settings_path, SettingsManager};
pub use schema::InterviewSettings;
