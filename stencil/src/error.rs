//! Error types for recipe loading, template compilation, target application and VCS gating.

use std::path::PathBuf;

use thiserror::Error;

/// A configuration entry that failed schema validation.
///
/// Lists every problem found in the entry. The entry is dropped; its siblings are unaffected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {entity}{}: {}", .name.as_ref().map(|n| format!(" '{}'", n)).unwrap_or_default(), .reasons.join("; "))]
pub struct SchemaError {
    /// Kind of entry: `recipe`, `input`, `template`, `create target`, `update target`.
    pub entity: &'static str,
    /// The entry's `name` (or `title` for inputs) when it had one.
    pub name: Option<String>,
    pub reasons: Vec<String>,
}

impl SchemaError {
    pub(crate) fn new(entity: &'static str, name: Option<String>, reasons: Vec<String>) -> Self {
        Self {
            entity,
            name,
            reasons,
        }
    }
}

/// Template compilation failures.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("template '{template}': read {}: {source}", .path.display())]
    Read {
        template: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The template compiled to an empty string.
    #[error("template '{template}' compiled to empty content")]
    Empty { template: String },
}

impl CompileError {
    pub fn template(&self) -> &str {
        match self {
            CompileError::Read { template, .. } | CompileError::Empty { template } => template,
        }
    }
}

/// Errors from the version-control collaborator.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("no client workspace owns {}", .path.display())]
    NoWorkspace { path: PathBuf },
    #[error("{command} returned no output")]
    NoOutput { command: String },
}

/// Failure applying one compiled template to a create or update target.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("{operation} {}: {source}", .path.display())]
    Vcs {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: VcsError,
    },
    #[error("create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no line in {} matches '{pattern}'", .path.display())]
    NoInsertPoint { path: PathBuf, pattern: String },
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Terminal failure of a recipe run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no valid recipes are configured")]
    NoRecipes,
    #[error("no recipe named '{0}'")]
    UnknownRecipe(String),
    #[error("{} template(s) failed to compile: {}", .failures.len(), join_errors(.failures))]
    Compile { failures: Vec<CompileError> },
    #[error("target '{target}' failed: {source}")]
    Target {
        target: String,
        #[source]
        source: TargetError,
    },
    #[error("list pending changelists: {0}")]
    Vcs(#[from] VcsError),
}

fn join_errors(failures: &[CompileError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
