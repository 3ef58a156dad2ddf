//! CLI command implementations.

pub mod config;
pub mod extract;
pub mod scan;
pub mod template;

use std::path::{Path, PathBuf};

use tracing::debug;

use fieldbox_core::FieldboxConfig;

/// Default configuration location under the user's config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fieldbox")
        .join("config.json")
}

/// The config file in effect: `--config` if given, the default location otherwise.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load configuration, falling back to defaults when no file exists.
///
/// An explicit `--config` path must exist.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FieldboxConfig> {
    if let Some(path) = config_path {
        return Ok(FieldboxConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using configuration at {}", path.display());
        Ok(FieldboxConfig::from_file(&path)?)
    } else {
        Ok(FieldboxConfig::default())
    }
}

/// Resolve a template argument: as given if it exists, otherwise inside the
/// templates directory.
pub fn resolve_template(arg: &Path, templates_dir: &Path) -> PathBuf {
    if arg.exists() || arg.is_absolute() {
        return arg.to_path_buf();
    }
    let candidate = templates_dir.join(arg);
    if candidate.exists() {
        debug!("Found template in {}", templates_dir.display());
        candidate
    } else {
        arg.to_path_buf()
    }
}
