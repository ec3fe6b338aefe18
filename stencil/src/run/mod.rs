//! Recipe runner: pick, prompt, compile, then apply.
//!
//! One run walks these stages strictly in order:
//!
//! 1. Pick a recipe (skipped by [`RecipeRunner::run_named`]).
//! 2. Collect every input answer into a [`SymbolMap`]. A cancel stops the run before any I/O.
//! 3. When a VCS collaborator is set, choose the destination changelist.
//! 4. Compile all templates concurrently and check every result. One failure aborts the run
//!    before any target is touched.
//! 5. Apply create targets, then update targets, in declaration order. The first failure aborts
//!    the remaining targets; earlier writes stay on disk.

use std::path::PathBuf;

use futures::future::join_all;
use tracing::{info_span, Instrument};

use crate::error::{CompileError, RunError};
use crate::fs::FileSystem;
use crate::prompt::Prompter;
use crate::recipe::{ApplyContext, Recipe};
use crate::symbol::SymbolMap;
use crate::vcs::{choose_changelist, ChangelistChoice, VersionControl};

/// Where the operator cancelled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancelledStage {
    RecipeSelection,
    /// Title of the input being answered.
    Input(String),
    Changelist,
}

/// Result of a run that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed {
        recipe: String,
        /// Every file written, in application order.
        writes: Vec<PathBuf>,
    },
    Cancelled { stage: CancelledStage },
}

/// Drives one recipe invocation against its collaborators.
pub struct RecipeRunner<'a> {
    prompter: &'a dyn Prompter,
    fs: &'a dyn FileSystem,
    vcs: Option<&'a dyn VersionControl>,
}

impl<'a> RecipeRunner<'a> {
    pub fn new(prompter: &'a dyn Prompter, fs: &'a dyn FileSystem) -> Self {
        Self {
            prompter,
            fs,
            vcs: None,
        }
    }

    /// Gates every file mutation behind `vcs`.
    pub fn with_vcs(mut self, vcs: &'a dyn VersionControl) -> Self {
        self.vcs = Some(vcs);
        self
    }

    /// Lets the operator pick one of `recipes`, then runs it.
    pub async fn run(&self, recipes: &mut [Recipe]) -> Result<RunOutcome, RunError> {
        if recipes.is_empty() {
            return Err(RunError::NoRecipes);
        }
        let Some(index) = Recipe::prompt_for_selection(self.prompter, recipes).await else {
            tracing::debug!("recipe selection cancelled");
            return Ok(RunOutcome::Cancelled {
                stage: CancelledStage::RecipeSelection,
            });
        };
        self.execute(&mut recipes[index]).await
    }

    /// Runs the recipe called `name` without showing the picker.
    pub async fn run_named(
        &self,
        name: &str,
        recipes: &mut [Recipe],
    ) -> Result<RunOutcome, RunError> {
        if recipes.is_empty() {
            return Err(RunError::NoRecipes);
        }
        let recipe = recipes
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| RunError::UnknownRecipe(name.to_string()))?;
        self.execute(recipe).await
    }

    async fn execute(&self, recipe: &mut Recipe) -> Result<RunOutcome, RunError> {
        let span = info_span!("recipe_run", recipe = %recipe.name);
        self.execute_stages(recipe).instrument(span).await
    }

    async fn execute_stages(&self, recipe: &mut Recipe) -> Result<RunOutcome, RunError> {
        let mut symbols = SymbolMap::new();
        for input in &recipe.inputs {
            match input.prompt_for_input(self.prompter).await {
                Some(answer) => {
                    symbols.insert(answer.symbol, answer.value);
                }
                None => {
                    tracing::debug!(input = %input.title, "input cancelled");
                    return Ok(RunOutcome::Cancelled {
                        stage: CancelledStage::Input(input.title.clone()),
                    });
                }
            }
        }
        tracing::info!(symbols = symbols.len(), "inputs collected");

        let changelist = match self.vcs {
            Some(vcs) => {
                let pending = vcs.list_pending_changelists().await?;
                match choose_changelist(self.prompter, &pending).await {
                    ChangelistChoice::NoneAvailable => None,
                    ChangelistChoice::Selected(id) => Some(id),
                    ChangelistChoice::Cancelled => {
                        return Ok(RunOutcome::Cancelled {
                            stage: CancelledStage::Changelist,
                        })
                    }
                }
            }
            None => None,
        };

        let compiled = compile_all(recipe, &symbols, self.fs).await?;
        tracing::info!(templates = compiled.len(), "templates compiled");

        let mut ctx = ApplyContext::new(self.fs);
        if let Some(vcs) = self.vcs {
            ctx = ctx.with_vcs(vcs, changelist.as_deref());
        }

        let mut writes = Vec::new();
        for target in recipe.create_targets.iter_mut() {
            for (template, content) in recipe.templates.iter().zip(&compiled) {
                if !template.feeds_create_target(&target.name) {
                    continue;
                }
                let path = target
                    .generate(content, &symbols, &ctx)
                    .await
                    .map_err(|source| target_failed(&target.name, source))?;
                writes.push(path);
            }
        }
        for target in recipe.update_targets.iter_mut() {
            for (template, content) in recipe.templates.iter().zip(&compiled) {
                if !template.feeds_update_target(&target.name) {
                    continue;
                }
                let path = target
                    .generate(content, &symbols, &ctx)
                    .await
                    .map_err(|source| target_failed(&target.name, source))?;
                writes.push(path);
            }
        }

        tracing::info!(writes = writes.len(), "recipe applied");
        Ok(RunOutcome::Completed {
            recipe: recipe.name.clone(),
            writes,
        })
    }
}

/// Compiles every template; returns the texts in template order or every failure.
async fn compile_all(
    recipe: &mut Recipe,
    symbols: &SymbolMap,
    fs: &dyn FileSystem,
) -> Result<Vec<String>, RunError> {
    let results = join_all(
        recipe
            .templates
            .iter_mut()
            .map(|template| template.compile(symbols, fs)),
    )
    .await;

    let mut compiled = Vec::with_capacity(results.len());
    let mut failures: Vec<CompileError> = Vec::new();
    for result in results {
        match result {
            Ok(text) => compiled.push(text),
            Err(e) => {
                tracing::error!(template = e.template(), error = %e, "template failed to compile");
                failures.push(e);
            }
        }
    }
    if failures.is_empty() {
        Ok(compiled)
    } else {
        Err(RunError::Compile { failures })
    }
}

fn target_failed(name: &str, source: crate::error::TargetError) -> RunError {
    tracing::error!(target_name = name, error = %source, "target failed");
    RunError::Target {
        target: name.to_string(),
        source,
    }
}
