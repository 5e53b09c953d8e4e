//! On-disk settings for the interview client.
//!
//! Two copies of the settings are kept: `raw` exactly as written in the file,
//! and `resolved` with `$VAR` / `${VAR}` references replaced from the
//! environment. Callers read the resolved copy; writes go through the raw copy
//! so an env reference in the file is never replaced by the secret it points to.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tokio::sync::RwLock;

use super::schema::InterviewSettings;

/// Commented file written on first run.
const TEMPLATE: &str = include_str!("template.toml");

/// `~/.interview-room/settings.toml`, or `./.interview-room/...` without a home dir.
pub fn settings_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".interview-room").join("settings.toml")
}

#[derive(Debug, Clone, Default)]
struct Loaded {
    raw: InterviewSettings,
    resolved: InterviewSettings,
}

impl Loaded {
    fn from_raw(raw: InterviewSettings) -> Self {
        let mut resolved = raw.clone();
        if let Some(token) = resolved.api.token.as_deref().and_then(resolve_env_ref) {
            resolved.api.token = Some(token);
        }
        if let Some(base_url) = resolve_env_ref(&resolved.api.base_url) {
            resolved.api.base_url = base_url;
        }
        Self { raw, resolved }
    }
}

pub struct SettingsManager {
    path: PathBuf,
    state: RwLock<Loaded>,
}

impl SettingsManager {
    /// Open the settings at the default location.
    pub async fn new() -> Result<Self> {
        Self::with_path(settings_path()).await
    }

    pub async fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let loaded = read_settings(&path).await?;
        Ok(Self {
            path,
            state: RwLock::new(loaded),
        })
    }

    /// Settings with environment references resolved.
    pub async fn get(&self) -> InterviewSettings {
        self.state.read().await.resolved.clone()
    }

    /// Replace the settings and write them to disk.
    ///
    /// `settings` is stored as given, so pass literal values or `$VAR`
    /// references, not values previously resolved by [`get`](Self::get).
    pub async fn update(&self, settings: InterviewSettings) -> Result<()> {
        let mut state = self.state.write().await;
        write_atomically(&self.path, &settings).await?;
        *state = Loaded::from_raw(settings);
        Ok(())
    }

    /// Read one value by dotted key, e.g. `"results.max_polls"`.
    pub async fn get_value(&self, key: &str) -> Result<toml::Value> {
        let state = self.state.read().await;
        let table = toml::Value::try_from(&state.resolved)?;

        key.split('.')
            .try_fold(&table, |node, segment| node.get(segment))
            .cloned()
            .ok_or_else(|| anyhow!("Unknown setting '{}'", key))
    }

    /// Set one value by dotted key and persist.
    ///
    /// The edit is type-checked against the schema before anything is written.
    pub async fn set_value(&self, key: &str, value: impl Into<toml::Value>) -> Result<()> {
        let mut state = self.state.write().await;

        let mut table = toml::Value::try_from(&state.raw)?;
        set_dotted(&mut table, key, value.into())?;
        let updated: InterviewSettings = table
            .try_into()
            .with_context(|| format!("Invalid value for setting '{}'", key))?;

        write_atomically(&self.path, &updated).await?;
        *state = Loaded::from_raw(updated);
        Ok(())
    }

    /// Persist a bearer token obtained from login.
    pub async fn store_token(&self, token: &str) -> Result<()> {
        self.set_value("api.token", token).await
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the commented template if no settings file exists yet.
    ///
    /// Returns whether a file was created.
    pub async fn ensure_settings_file(&self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        tokio::fs::write(&self.path, TEMPLATE)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        tracing::info!("[settings] wrote template to {}", self.path.display());
        Ok(true)
    }

    /// Pick up edits made to the file since it was opened.
    pub async fn reload(&self) -> Result<()> {
        let loaded = read_settings(&self.path).await?;
        *self.state.write().await = loaded;
        Ok(())
    }
}

async fn read_settings(path: &Path) -> Result<Loaded> {
    if !path.exists() {
        tracing::debug!("[settings] {} missing, using defaults", path.display());
        return Ok(Loaded::from_raw(InterviewSettings::default()));
    }

    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let raw: InterviewSettings =
        toml::from_str(&text).with_context(|| format!("Malformed settings in {}", path.display()))?;

    tracing::debug!("[settings] loaded {}", path.display());
    Ok(Loaded::from_raw(raw))
}

/// Write next to the target, then rename over it.
async fn write_atomically(path: &Path, settings: &InterviewSettings) -> Result<()> {
    let body = toml::to_string_pretty(settings).context("Failed to serialize settings")?;

    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    let staging = path.with_extension("toml.tmp");
    tokio::fs::write(&staging, body).await?;
    tokio::fs::rename(&staging, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    tracing::info!("[settings] saved {}", path.display());
    Ok(())
}

/// Assign `value` at a dotted key. Only the leaf may be absent.
fn set_dotted(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let segments: Vec<&str> = key.split('.').collect();
    let Some((leaf, sections)) = segments.split_last() else {
        bail!("Empty setting key");
    };
    if leaf.is_empty() {
        bail!("Empty setting key");
    }

    let mut node = root;
    for section in sections {
        node = node
            .get_mut(*section)
            .ok_or_else(|| anyhow!("Unknown settings section '{}' in '{}'", section, key))?;
    }

    match node {
        toml::Value::Table(table) => {
            table.insert((*leaf).to_string(), value);
            Ok(())
        }
        _ => bail!("'{}' does not name a settings table", sections.join(".")),
    }
}

/// Expand `$NAME` or `${NAME}`. `None` for plain values and unset variables.
fn resolve_env_ref(value: &str) -> Option<String> {
    let reference = value.trim().strip_prefix('$')?;
    let name = match reference.strip_prefix('{') {
        Some(braced) => braced.strip_suffix('}')?,
        None => reference,
    };
    std::env::var(name).ok()
}

/// First non-empty of: the explicit value, the listed env vars in order, the default.
pub fn get_with_env_fallback(
    explicit: &Option<String>,
    env_vars: &[&str],
    default: Option<String>,
) -> Option<String> {
    let non_empty = |v: &String| !v.is_empty();

    explicit
        .clone()
        .filter(non_empty)
        .or_else(|| {
            env_vars
                .iter()
                .filter_map(|name| std::env::var(name).ok())
                .find(non_empty)
        })
        .or(default)
}
