//! Application configuration stored in `menusys.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::dispatch::{DEFAULT_OUTPUT_LIMIT_BYTES, ScriptSettings};
use crate::io::display::RetryPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "menusys.toml";

/// Menu service configuration (TOML).
///
/// Relative paths are resolved against the directory holding the config file.
/// Missing fields take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MenuConfig {
    /// Menu nodes document (JSON).
    pub nodes_path: PathBuf,

    /// Executors document (JSON).
    pub executors_path: PathBuf,

    /// Directory scripts are resolved in and run from.
    pub scripts_dir: PathBuf,

    /// Kill scripts that run longer than this. Unset means no limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_timeout_secs: Option<u64>,

    /// Keep at most this many bytes of script stdout/stderr.
    pub script_output_limit_bytes: usize,

    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    #[default]
    Plain,
    Bounded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub kind: DisplayKind,
    /// Bounded display height in rows.
    pub rows: usize,
    /// Bounded display width in characters.
    pub columns: usize,
    pub retry: RetryConfig,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            kind: DisplayKind::Plain,
            rows: 4,
            columns: 20,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 100,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.backoff_ms))
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            nodes_path: PathBuf::from("menunodes.json"),
            executors_path: PathBuf::from("executors.json"),
            scripts_dir: PathBuf::from("scripts"),
            script_timeout_secs: None,
            script_output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
            display: DisplayConfig::default(),
        }
    }
}

/// Config paths resolved against the config file's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuPaths {
    pub nodes: PathBuf,
    pub executors: PathBuf,
    pub scripts_dir: PathBuf,
}

impl MenuConfig {
    pub fn validate(&self) -> Result<()> {
        if self.script_timeout_secs == Some(0) {
            return Err(anyhow!("script_timeout_secs must be > 0 when set"));
        }
        if self.script_output_limit_bytes == 0 {
            return Err(anyhow!("script_output_limit_bytes must be > 0"));
        }
        if self.display.rows == 0 {
            return Err(anyhow!("display.rows must be > 0"));
        }
        if self.display.columns == 0 {
            return Err(anyhow!("display.columns must be > 0"));
        }
        if self.display.retry.attempts == 0 {
            return Err(anyhow!("display.retry.attempts must be > 0"));
        }
        Ok(())
    }

    /// Resolve relative paths against `config_path`'s parent directory.
    pub fn paths(&self, config_path: &Path) -> MenuPaths {
        let base = config_path.parent().unwrap_or_else(|| Path::new(""));
        MenuPaths {
            nodes: base.join(&self.nodes_path),
            executors: base.join(&self.executors_path),
            scripts_dir: base.join(&self.scripts_dir),
        }
    }

    pub fn script_settings(&self, scripts_dir: PathBuf) -> ScriptSettings {
        ScriptSettings {
            scripts_dir,
            timeout: self.script_timeout_secs.map(Duration::from_secs),
            output_limit_bytes: self.script_output_limit_bytes,
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `MenuConfig::default()`.
pub fn load_config(path: &Path) -> Result<MenuConfig> {
    if !path.exists() {
        let cfg = MenuConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MenuConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &MenuConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
