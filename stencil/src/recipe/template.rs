//! Recipe templates: inline text or a file, rendered by symbol substitution.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::schema::{decode, entry_name, non_empty, parse_list, Reasons};
use super::LoadOptions;
use crate::error::{CompileError, SchemaError};
use crate::fs::FileSystem;
use crate::symbol::{resolve_workspace_root, substitute, SymbolMap};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTemplate {
    name: Option<String>,
    single_line: Option<String>,
    path: Option<String>,
    #[serde(alias = "symbolArguements")]
    symbol_arguments: Option<Vec<String>>,
    update_targets: Option<Vec<String>>,
    create_targets: Option<Vec<String>>,
}

/// Where a template's text comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateSource {
    SingleLine(String),
    /// Path to a text file; may still contain symbols until compiled.
    File(String),
}

#[derive(Clone, Debug)]
pub struct Template {
    pub name: String,
    pub source: TemplateSource,
    /// Symbols substituted into file content; empty means all of them.
    pub symbol_arguments: Vec<String>,
    /// Names of the update targets that consume the compiled text.
    pub update_targets: Vec<String>,
    /// Names of the create targets that consume the compiled text.
    pub create_targets: Vec<String>,
}

impl Template {
    pub fn from_value(value: &Value, options: &LoadOptions) -> Result<Template, SchemaError> {
        let raw: RawTemplate = decode("template", value)?;
        let mut reasons = Reasons::new();
        let name = reasons.require("name", raw.name);

        let root = options.workspace_root.as_deref();
        let source = match (non_empty(raw.single_line), non_empty(raw.path)) {
            (Some(line), None) => Some(TemplateSource::SingleLine(resolve_workspace_root(&line, root))),
            (None, Some(path)) => Some(TemplateSource::File(resolve_workspace_root(&path, root))),
            (Some(_), Some(_)) => {
                reasons.push("'singleLine' and 'path' are mutually exclusive");
                None
            }
            (None, None) => {
                reasons.push("one of 'singleLine' or 'path' is required");
                None
            }
        };

        if let (Some(update), Some(create)) = (&raw.update_targets, &raw.create_targets) {
            if update.is_empty() && create.is_empty() {
                reasons.push("'updateTargets' and 'createTargets' are both empty");
            }
        }
        let symbol_arguments = raw.symbol_arguments.unwrap_or_default();
        let update_targets = raw.update_targets.unwrap_or_default();
        let create_targets = raw.create_targets.unwrap_or_default();
        reasons.no_empty_entries("symbolArguements", &symbol_arguments);
        reasons.no_empty_entries("updateTargets", &update_targets);
        reasons.no_empty_entries("createTargets", &create_targets);

        reasons.into_result("template", entry_name(value), || Template {
            name,
            source: source.unwrap_or(TemplateSource::SingleLine(String::new())),
            symbol_arguments,
            update_targets,
            create_targets,
        })
    }

    pub fn parse(values: &[Value], options: &LoadOptions) -> Vec<Template> {
        parse_list(values, |v| Template::from_value(v, options))
    }

    pub fn feeds_create_target(&self, target: &str) -> bool {
        self.create_targets.iter().any(|name| name == target)
    }

    pub fn feeds_update_target(&self, target: &str) -> bool {
        self.update_targets.iter().any(|name| name == target)
    }

    /// Substitutes symbols into the source text/path and the consumer target names, in place.
    pub fn transform_symbols(&mut self, symbols: &SymbolMap) {
        for name in self.create_targets.iter_mut().chain(self.update_targets.iter_mut()) {
            *name = substitute(name, symbols, &[]);
        }
        match &mut self.source {
            TemplateSource::SingleLine(text) | TemplateSource::File(text) => {
                *text = substitute(text, symbols, &[]);
            }
        }
    }

    /// Renders the template.
    ///
    /// Inline text is returned after substitution. File content is substituted using only
    /// [`symbol_arguments`](Self::symbol_arguments) when that list is non-empty. An empty
    /// result is reported as [`CompileError::Empty`].
    pub async fn compile(
        &mut self,
        symbols: &SymbolMap,
        fs: &dyn FileSystem,
    ) -> Result<String, CompileError> {
        self.transform_symbols(symbols);
        let text = match &self.source {
            TemplateSource::SingleLine(text) => text.clone(),
            TemplateSource::File(path) => {
                let path = Path::new(path);
                let content = fs.read_to_string(path).await.map_err(|source| {
                    CompileError::Read {
                        template: self.name.clone(),
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                substitute(&content, symbols, &self.symbol_arguments)
            }
        };
        if text.is_empty() {
            return Err(CompileError::Empty {
                template: self.name.clone(),
            });
        }
        tracing::debug!(template = %self.name, bytes = text.len(), "template compiled");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFileSystem;
    use serde_json::json;
    use std::path::PathBuf;

    fn load(value: Value) -> Result<Template, SchemaError> {
        Template::from_value(&value, &LoadOptions::default())
    }

    fn symbols() -> SymbolMap {
        [("$NAME$", "Widget"), ("$MOD$", "widgets")].into_iter().collect()
    }

    #[test]
    fn exactly_one_source_is_required() {
        assert!(load(json!({ "name": "t", "singleLine": "x", "createTargets": ["c"] })).is_ok());
        assert!(load(json!({ "name": "t", "path": "f.txt", "createTargets": ["c"] })).is_ok());
        let both = load(json!({ "name": "t", "singleLine": "x", "path": "f.txt" })).unwrap_err();
        assert!(both.reasons[0].contains("mutually exclusive"));
        let neither = load(json!({ "name": "t" })).unwrap_err();
        assert!(neither.reasons[0].contains("required"));
    }

    #[test]
    fn list_fields_must_be_string_arrays() {
        assert!(load(json!({ "name": "t", "singleLine": "x", "createTargets": "c" })).is_err());
        assert!(load(json!({ "name": "t", "singleLine": "x", "updateTargets": [1] })).is_err());
        let err = load(json!({ "name": "t", "singleLine": "x", "updateTargets": ["a", ""] }))
            .unwrap_err();
        assert!(err.reasons[0].contains("updateTargets"));
    }

    #[test]
    fn both_target_lists_present_but_empty_is_rejected() {
        let err = load(json!({
            "name": "t", "singleLine": "x", "updateTargets": [], "createTargets": []
        }))
        .unwrap_err();
        assert!(err.reasons[0].contains("both empty"));
        assert!(load(json!({ "name": "t", "singleLine": "x", "updateTargets": [] })).is_ok());
    }

    #[test]
    fn misspelled_and_corrected_argument_keys_are_accepted() {
        let a = load(json!({ "name": "t", "path": "p", "symbolArguements": ["$NAME$"] })).unwrap();
        let b = load(json!({ "name": "t", "path": "p", "symbolArguments": ["$NAME$"] })).unwrap();
        assert_eq!(a.symbol_arguments, b.symbol_arguments);
    }

    #[test]
    fn workspace_root_resolves_at_load() {
        let options = LoadOptions {
            workspace_root: Some(PathBuf::from("/repo")),
        };
        let t = Template::from_value(
            &json!({ "name": "t", "path": "${workspace}/tpl/$NAME$.txt" }),
            &options,
        )
        .unwrap();
        assert_eq!(t.source, TemplateSource::File("/repo/tpl/$NAME$.txt".to_string()));
    }

    #[tokio::test]
    async fn single_line_compiles_with_all_symbols() {
        let mut t = load(json!({
            "name": "t",
            "singleLine": "mod $MOD$; // $NAME$",
            "symbolArguements": ["$NAME$"],
            "updateTargets": ["$MOD$-index"]
        }))
        .unwrap();
        let out = t.compile(&symbols(), &LocalFileSystem).await.unwrap();
        assert_eq!(out, "mod widgets; // Widget");
        assert_eq!(t.update_targets, vec!["widgets-index"]);
    }

    #[tokio::test]
    async fn file_template_respects_allow_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Widget.tpl"), "struct $NAME$; // in $MOD$").unwrap();
        let path = format!("{}/$NAME$.tpl", dir.path().display());
        let mut t = load(json!({
            "name": "t", "path": path, "symbolArguements": ["$NAME$"]
        }))
        .unwrap();
        let out = t.compile(&symbols(), &LocalFileSystem).await.unwrap();
        assert_eq!(out, "struct Widget; // in $MOD$");
    }

    #[tokio::test]
    async fn missing_file_and_empty_file_fail_differently() {
        let dir = tempfile::tempdir().unwrap();
        let mut missing = load(json!({
            "name": "missing", "path": dir.path().join("nope.tpl").to_string_lossy()
        }))
        .unwrap();
        let err = missing.compile(&symbols(), &LocalFileSystem).await.unwrap_err();
        assert!(matches!(err, CompileError::Read { .. }));

        std::fs::write(dir.path().join("empty.tpl"), "").unwrap();
        let mut empty = load(json!({
            "name": "empty", "path": dir.path().join("empty.tpl").to_string_lossy()
        }))
        .unwrap();
        let err = empty.compile(&symbols(), &LocalFileSystem).await.unwrap_err();
        assert!(matches!(err, CompileError::Empty { .. }));
        assert_eq!(err.template(), "empty");
    }
}
