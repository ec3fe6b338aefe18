//! Load the project file from the workspace root: `.stencil.toml`, else `.stencil.json`.

use std::path::Path;

use crate::{xdg_toml, ConfigFile, LoadError};

pub(crate) const PROJECT_TOML: &str = ".stencil.toml";
pub(crate) const PROJECT_JSON: &str = ".stencil.json";

pub(crate) fn load_project_file(dir: &Path) -> Result<Option<ConfigFile>, LoadError> {
    let toml_path = dir.join(PROJECT_TOML);
    if toml_path.is_file() {
        return xdg_toml::load_file(&toml_path);
    }
    let json_path = dir.join(PROJECT_JSON);
    if !json_path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&json_path).map_err(|source| LoadError::Read {
        path: json_path.clone(),
        source,
    })?;
    let file = serde_json::from_str(&content).map_err(|source| LoadError::JsonParse {
        path: json_path,
        source,
    })?;
    Ok(Some(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_wins_over_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_TOML), "[settings]\nuse_vcs = false\n").unwrap();
        std::fs::write(dir.path().join(PROJECT_JSON), r#"{"settings":{"useVcs":true}}"#).unwrap();
        let file = load_project_file(dir.path()).unwrap().unwrap();
        assert_eq!(file.settings.use_vcs, Some(false));
    }

    #[test]
    fn json_accepts_camel_case_flag() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_JSON),
            r#"{"settings":{"useP4Features":true},"recipes":[{"name":"a"}]}"#,
        )
        .unwrap();
        let file = load_project_file(dir.path()).unwrap().unwrap();
        assert_eq!(file.settings.use_vcs, Some(true));
        assert_eq!(file.recipes[0]["name"], "a");
    }

    #[test]
    fn no_project_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_project_file(dir.path()).unwrap().is_none());
    }

    #[test]
    fn broken_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_JSON), "{ nope").unwrap();
        assert!(matches!(
            load_project_file(dir.path()),
            Err(LoadError::JsonParse { .. })
        ));
    }
}
