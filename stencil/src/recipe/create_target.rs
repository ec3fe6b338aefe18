//! Create targets: write compiled template text to a new file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use super::schema::{decode, entry_name, parse_list, Reasons};
use super::{ApplyContext, LoadOptions};
use crate::error::{SchemaError, TargetError};
use crate::symbol::{resolve_workspace_root, substitute, SymbolMap};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCreateTarget {
    name: Option<String>,
    output_file_name: Option<String>,
    output_path: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateTarget {
    pub name: String,
    pub output_file_name: String,
    /// Directory the file is written to; created when missing.
    pub output_path: String,
}

impl CreateTarget {
    pub fn from_value(value: &Value, options: &LoadOptions) -> Result<CreateTarget, SchemaError> {
        let raw: RawCreateTarget = decode("create target", value)?;
        let mut reasons = Reasons::new();
        let name = reasons.require("name", raw.name);
        let output_file_name = reasons.require("outputFileName", raw.output_file_name);
        let output_path = reasons.require("outputPath", raw.output_path);
        let root = options.workspace_root.as_deref();
        reasons.into_result("create target", entry_name(value), || CreateTarget {
            name,
            output_file_name: resolve_workspace_root(&output_file_name, root),
            output_path: resolve_workspace_root(&output_path, root),
        })
    }

    pub fn parse(values: &[Value], options: &LoadOptions) -> Vec<CreateTarget> {
        parse_list(values, |v| CreateTarget::from_value(v, options))
    }

    pub fn transform_symbols(&mut self, symbols: &SymbolMap) {
        self.output_file_name = substitute(&self.output_file_name, symbols, &[]);
        self.output_path = substitute(&self.output_path, symbols, &[]);
    }

    /// `output_path/output_file_name`, without doubling a trailing separator.
    pub fn output_file(&self) -> PathBuf {
        Path::new(&self.output_path).join(&self.output_file_name)
    }

    /// Writes `content` to the output file, replacing any existing file, then opens it for add
    /// when a VCS collaborator is configured. Returns the written path.
    pub async fn generate(
        &mut self,
        content: &str,
        symbols: &SymbolMap,
        ctx: &ApplyContext<'_>,
    ) -> Result<PathBuf, TargetError> {
        self.transform_symbols(symbols);
        let dir = PathBuf::from(&self.output_path);
        let file = self.output_file();

        ctx.fs
            .create_dir_all(&dir)
            .await
            .map_err(|source| TargetError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        ctx.fs
            .write(&file, content)
            .await
            .map_err(|source| TargetError::Write {
                path: file.clone(),
                source,
            })?;

        if let Some(vcs) = ctx.vcs {
            vcs.prepare_for_add(&file, ctx.changelist)
                .await
                .map_err(|source| TargetError::Vcs {
                    operation: "open for add",
                    path: file.clone(),
                    source,
                })?;
        }
        tracing::info!(target_name = %self.name, path = %file.display(), "created file");
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFileSystem;
    use serde_json::json;

    fn target(path: &str, file: &str) -> CreateTarget {
        CreateTarget::from_value(
            &json!({ "name": "new", "outputFileName": file, "outputPath": path }),
            &LoadOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn all_fields_are_required() {
        let err = CreateTarget::from_value(&json!({ "name": "x" }), &LoadOptions::default())
            .unwrap_err();
        assert_eq!(err.reasons, vec!["missing 'outputFileName'", "missing 'outputPath'"]);
    }

    #[test]
    fn output_file_joins_with_single_separator() {
        assert_eq!(
            target("/out/dir", "a.rs").output_file(),
            PathBuf::from("/out/dir/a.rs")
        );
        let trailing = target("/out/dir/", "a.rs").output_file();
        assert_eq!(trailing, PathBuf::from("/out/dir/a.rs"));
        assert!(!trailing.to_string_lossy().contains("//"));
    }

    #[tokio::test]
    async fn generate_creates_directories_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let out = format!("{}/src/$MOD$", dir.path().display());
        let mut t = target(&out, "$NAME$.rs");
        let symbols: SymbolMap = [("$MOD$", "widgets"), ("$NAME$", "button")]
            .into_iter()
            .collect();
        let ctx = ApplyContext::new(&LocalFileSystem);

        let expected = dir.path().join("src/widgets/button.rs");
        std::fs::create_dir_all(expected.parent().unwrap()).unwrap();
        std::fs::write(&expected, "old content").unwrap();

        let written = t.generate("new content", &symbols, &ctx).await.unwrap();
        assert_eq!(written, expected);
        assert_eq!(std::fs::read_to_string(&expected).unwrap(), "new content");
        assert_eq!(t.output_file_name, "button.rs");
    }

    #[tokio::test]
    async fn generate_reports_directory_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a file, not a dir").unwrap();
        let mut t = target(&blocker.join("sub").to_string_lossy(), "a.rs");
        let err = t
            .generate("x", &SymbolMap::new(), &ApplyContext::new(&LocalFileSystem))
            .await
            .unwrap_err();
        assert!(matches!(err, TargetError::CreateDir { .. }));
    }
}
