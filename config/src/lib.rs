//! Load Stencil settings and the recipe list from layered sources.
//!
//! Priority for scalar settings, highest first: **env > project file > XDG config.toml**.
//!
//! - `$XDG_CONFIG_HOME/<app>/config.toml` (or the platform config dir): user-wide recipes.
//! - `<workspace>/.stencil.toml`, or `<workspace>/.stencil.json` when the TOML file is absent.
//! - `STENCIL_USE_VCS`: overrides the `use_vcs` flag.
//!
//! Recipes stay raw JSON values here; the core validates them. Project recipes come first, and
//! a user recipe whose name is already taken is dropped.

mod project;
mod xdg_toml;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable overriding [`Settings::use_vcs`].
pub const USE_VCS_ENV: &str = "STENCIL_USE_VCS";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("config path: {0}")]
    ConfigPath(String),
    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse toml {}: {source}", .path.display())]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("parse json {}: {source}", .path.display())]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{key}: expected 1|true|yes or 0|false|no, got '{value}'")]
    InvalidFlag { key: String, value: String },
}

/// Shape shared by `config.toml`, `.stencil.toml` and `.stencil.json`.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ConfigFile {
    #[serde(default)]
    pub(crate) settings: FileSettings,
    #[serde(default)]
    pub(crate) recipes: Vec<serde_json::Value>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct FileSettings {
    #[serde(default, alias = "useVcs", alias = "useP4Features")]
    pub(crate) use_vcs: Option<bool>,
}

/// Effective configuration for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Gate file mutations behind the version-control collaborator.
    pub use_vcs: bool,
    pub workspace_root: Option<PathBuf>,
    /// Raw recipe definitions, project recipes first.
    pub recipes: Vec<serde_json::Value>,
}

/// Loads settings for `app_name` with `workspace` as the project directory (current directory
/// when `None`).
pub fn load(app_name: &str, workspace: Option<&Path>) -> Result<Settings, LoadError> {
    let user_path = xdg_toml::xdg_config_path(app_name)?;
    let workspace = match workspace {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|e| LoadError::ConfigPath(e.to_string()))?,
    };
    let env_flag = std::env::var(USE_VCS_ENV).ok();
    load_from(&user_path, &workspace, env_flag.as_deref())
}

fn load_from(
    user_path: &Path,
    workspace: &Path,
    env_flag: Option<&str>,
) -> Result<Settings, LoadError> {
    let user = xdg_toml::load_file(user_path)?.unwrap_or_default();
    let project = project::load_project_file(workspace)?.unwrap_or_default();

    let mut use_vcs = project
        .settings
        .use_vcs
        .or(user.settings.use_vcs)
        .unwrap_or(false);
    if let Some(value) = env_flag {
        use_vcs = parse_flag(USE_VCS_ENV, value)?;
    }

    Ok(Settings {
        use_vcs,
        workspace_root: Some(workspace.to_path_buf()),
        recipes: merge_recipes(project.recipes, user.recipes),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, LoadError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(LoadError::InvalidFlag {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Concatenates both lists, keeping the first recipe for each name.
fn merge_recipes(
    project: Vec<serde_json::Value>,
    user: Vec<serde_json::Value>,
) -> Vec<serde_json::Value> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(project.len() + user.len());
    for recipe in project.into_iter().chain(user) {
        if let Some(name) = recipe.get("name").and_then(|n| n.as_str()) {
            if !seen.insert(name.to_string()) {
                tracing::warn!(recipe = name, "duplicate recipe name; keeping the first definition");
                continue;
            }
        }
        merged.push(recipe);
    }
    merged
}
