//! Load the user-level `$XDG_CONFIG_HOME/<app>/config.toml`.

use std::path::{Path, PathBuf};

use crate::{ConfigFile, LoadError};

/// `$XDG_CONFIG_HOME/<app>/config.toml`, falling back to the platform config dir.
pub(crate) fn xdg_config_path(app_name: &str) -> Result<PathBuf, LoadError> {
    let base = match std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::config_dir()
            .ok_or_else(|| LoadError::ConfigPath("no config directory for this platform".into()))?,
    };
    Ok(base.join(app_name).join("config.toml"))
}

/// Parses the file at `path`. A missing file yields `None`.
pub(crate) fn load_file(path: &Path) -> Result<Option<ConfigFile>, LoadError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file = toml::from_str(&content).map_err(|source| LoadError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(file))
}
