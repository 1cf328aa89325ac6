//! Build configuration.
//!
//! Every path the pipeline touches lives in one [`GalleryConfig`], resolved
//! at startup and passed by reference into each stage. Values come from
//! three layers, lowest to highest precedence:
//!
//! 1. Stock defaults ([`GalleryConfig::default`])
//! 2. An optional `gallery.toml` next to the project
//! 3. Environment (`PORT`) and CLI flags ([`Overrides`])
//!
//! [`ConfigSource`] bundles the three so the dev server can re-read the file
//! before each rebuild.
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source = "images"                  # Directory scanned for images
//! template = "index.template.html"   # Page template with the placeholder
//! output = "dist"                    # Build output (index.html + images/)
//!
//! [serve]
//! host = "127.0.0.1"
//! port = 3000                        # Overridden by $PORT
//! debounce_ms = 500                  # Quiet window before a dev rebuild
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name of the generated page inside the output directory.
pub const INDEX_FILE: &str = "index.html";
/// Subdirectory of the output directory that receives copied images.
pub const IMAGES_SUBDIR: &str = "images";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery build configuration loaded from `gallery.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Directory scanned (flat) for images.
    pub source: PathBuf,
    /// HTML template containing the manifest placeholder.
    pub template: PathBuf,
    /// Build output directory. Owned by the build; wiped by `clean`.
    pub output: PathBuf,
    /// Development server settings.
    pub serve: ServeConfig,
    /// Where this config was loaded from, if a file existed.
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("images"),
            template: PathBuf::from("index.template.html"),
            output: PathBuf::from("dist"),
            serve: ServeConfig::default(),
            config_file: None,
        }
    }
}

impl GalleryConfig {
    /// A config rooted at `dir`: `dir/images`, `dir/index.template.html`, `dir/dist`.
    pub fn rooted_at(dir: &Path) -> Self {
        let defaults = Self::default();
        Self {
            source: dir.join(defaults.source),
            template: dir.join(defaults.template),
            output: dir.join(defaults.output),
            ..Self::default()
        }
    }

    /// Path of the generated page.
    pub fn index_path(&self) -> PathBuf {
        self.output.join(INDEX_FILE)
    }

    /// Directory images are copied into.
    pub fn images_output_dir(&self) -> PathBuf {
        self.output.join(IMAGES_SUBDIR)
    }

    /// Validate that the paths make sense together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, path) in [
            ("source", &self.source),
            ("template", &self.template),
            ("output", &self.output),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        let source = normalize(&std::path::absolute(&self.source)?);
        let output = normalize(&std::path::absolute(&self.output)?);
        if output.starts_with(&source) {
            return Err(ConfigError::Validation(
                "output must not be inside source (clean would delete your images)".into(),
            ));
        }
        if source.starts_with(&output) {
            return Err(ConfigError::Validation(
                "source must not be inside output (the build would overwrite your images)".into(),
            ));
        }
        Ok(())
    }

    /// Apply environment overrides. Only `PORT` is honoured.
    ///
    /// Takes a lookup function so callers (and tests) decide where variables
    /// come from.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("PORT") {
            let raw = raw.trim();
            if !raw.is_empty() {
                self.serve.port = raw.parse().map_err(|_| {
                    ConfigError::Validation(format!("PORT must be a port number, got {raw:?}"))
                })?;
            }
        }
        Ok(())
    }
}

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// Quiet window, in milliseconds, that coalesces change events into one rebuild.
    pub debounce_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            debounce_ms: 500,
        }
    }
}

impl ServeConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// The base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. `Ok(None)` when the file is absent.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load `path` on top of stock defaults, rejecting unknown keys, and validate.
///
/// A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    let found = overlay.is_some();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let mut config: GalleryConfig = merged.try_into()?;
    if found {
        config.config_file = Some(path.to_path_buf());
    }
    config.validate()?;
    Ok(config)
}

/// Lexically drop `.` and resolve `..` in an absolute path.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// CLI flag values that take precedence over `gallery.toml` and `PORT`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub source: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub port: Option<u16>,
}

impl Overrides {
    pub fn apply(&self, config: &mut GalleryConfig) {
        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(template) = &self.template {
            config.template = template.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(port) = self.port {
            config.serve.port = port;
        }
    }
}

/// Everything needed to produce a [`GalleryConfig`] again later: the config
/// file, the environment, and the CLI overrides.
///
/// The dev server keeps one of these so edits to `gallery.toml` reach the
/// next rebuild.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub file: PathBuf,
    pub overrides: Overrides,
    env: fn(&str) -> Option<String>,
}

impl ConfigSource {
    /// Reads `file` and the process environment.
    pub fn new(file: impl Into<PathBuf>, overrides: Overrides) -> Self {
        Self {
            file: file.into(),
            overrides,
            env: |key| std::env::var(key).ok(),
        }
    }

    /// Replace the environment lookup.
    pub fn with_env(mut self, env: fn(&str) -> Option<String>) -> Self {
        self.env = env;
        self
    }

    /// Defaults, then the file, then `PORT`, then the overrides; validated.
    pub fn resolve(&self) -> Result<GalleryConfig, ConfigError> {
        let mut config = load_config(&self.file)?;
        config.apply_env(self.env)?;
        self.overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

/// A fully-commented stock `gallery.toml`. Printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Brand Gallery Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# Relative paths are resolved against the working directory.

# Directory scanned for images (jpg, jpeg, png, gif, svg, webp).
# Only the top level is scanned; subdirectories are ignored.
source = "images"

# HTML template. Must contain /* IMAGE_FILES_PLACEHOLDER */ exactly once.
# When the file is missing a built-in template is used instead.
template = "index.template.html"

# Build output. Receives index.html and an images/ directory.
# `brand-gallery clean` deletes this directory entirely.
output = "dist"

# ---------------------------------------------------------------------------
# Development server (`brand-gallery serve`)
# ---------------------------------------------------------------------------
[serve]
host = "127.0.0.1"

# The PORT environment variable and --port flag take precedence.
port = 3000

# Change events arriving within this window trigger a single rebuild.
debounce_ms = 500
"##
}
