//! # Stencil
//!
//! Recipe-driven code generation. A recipe names the values to ask the operator for, the text
//! templates to render with those values, and the files to create or patch with the result.
//!
//! ## Design principles
//!
//! - **Configuration stays loose until load**: recipes arrive as raw JSON values and are
//!   validated entry by entry; one malformed template never invalidates its siblings.
//! - **Name-based linking**: templates name the create/update targets that consume their output.
//! - **Join before apply**: every template compiles before any file is touched.
//! - **Collaborators at the seams**: prompting ([`Prompter`]), file I/O ([`FileSystem`]) and
//!   source control ([`VersionControl`]) are traits, so a run is fully testable with fakes.
//!
//! ## Main modules
//!
//! - [`symbol`]: [`SymbolMap`], [`substitute`], the `${workspace}` placeholder.
//! - [`recipe`]: [`Recipe`], [`Input`], [`Template`], [`CreateTarget`], [`UpdateTarget`] and the
//!   line-insertion algorithm.
//! - [`run`]: [`RecipeRunner`], [`RunOutcome`].
//! - [`vcs`]: [`VersionControl`], [`PerforceClient`], [`choose_changelist`].
//! - [`prompt`]: [`Prompter`] and its option types.
//! - [`fs`]: [`FileSystem`], [`LocalFileSystem`].
//! - [`error`]: [`SchemaError`], [`CompileError`], [`TargetError`], [`VcsError`], [`RunError`].

pub mod error;
pub mod fs;
pub mod prompt;
pub mod recipe;
pub mod run;
pub mod symbol;
pub mod vcs;

pub use error::{CompileError, RunError, SchemaError, TargetError, VcsError};
pub use fs::{FileSystem, LocalFileSystem};
pub use prompt::{Prompter, SelectItem, SelectOptions, TextPrompt, Validation};
pub use recipe::{
    ApplyContext, CreateTarget, Input, InsertPosition, LoadOptions, MatchMode, Recipe, Template,
    UpdateTarget,
};
pub use run::{CancelledStage, RecipeRunner, RunOutcome};
pub use symbol::{substitute, SymbolMap, WORKSPACE_SYMBOL};
pub use vcs::{
    choose_changelist, ChangelistChoice, PendingChangelist, PerforceClient, VersionControl,
    WorkspaceCache,
};
