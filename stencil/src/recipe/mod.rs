//! Recipes: named bundles of inputs, templates and file targets, parsed from raw configuration.
//!
//! Each sub-list is parsed entry by entry and invalid entries are dropped on their own. A recipe
//! as a whole is rejected when it has no name, no templates or no targets.

mod schema;

pub mod create_target;
pub mod input;
pub mod template;
pub mod update_target;

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

pub use create_target::CreateTarget;
pub use input::{Answer, FixedChoice, Input, InputKind};
pub use template::{Template, TemplateSource};
pub use update_target::{InsertCriteria, InsertPosition, MatchMode, UpdateTarget};

use crate::error::SchemaError;
use crate::fs::FileSystem;
use crate::prompt::{Prompter, SelectItem, SelectOptions};
use crate::vcs::VersionControl;
use schema::{decode, entry_name, parse_list, Reasons};

/// Options applied while converting raw configuration into recipes.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Replaces the `${workspace}` placeholder in template and target paths.
    pub workspace_root: Option<PathBuf>,
}

/// Collaborators a target uses while applying compiled text.
#[derive(Clone, Copy)]
pub struct ApplyContext<'a> {
    pub fs: &'a dyn FileSystem,
    /// Gates every file mutation when set.
    pub vcs: Option<&'a dyn VersionControl>,
    /// Forwarded to the VCS gate; `None` means the client's default.
    pub changelist: Option<&'a str>,
}

impl<'a> ApplyContext<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self {
            fs,
            vcs: None,
            changelist: None,
        }
    }

    pub fn with_vcs(mut self, vcs: &'a dyn VersionControl, changelist: Option<&'a str>) -> Self {
        self.vcs = Some(vcs);
        self.changelist = changelist;
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecipe {
    name: Option<String>,
    inputs: Option<Vec<Value>>,
    templates: Option<Vec<Value>>,
    update_targets: Option<Vec<Value>>,
    create_targets: Option<Vec<Value>>,
}

#[derive(Clone, Debug)]
pub struct Recipe {
    pub name: String,
    pub inputs: Vec<Input>,
    pub templates: Vec<Template>,
    pub update_targets: Vec<UpdateTarget>,
    pub create_targets: Vec<CreateTarget>,
}

impl Recipe {
    pub fn from_value(value: &Value, options: &LoadOptions) -> Result<Recipe, SchemaError> {
        let raw: RawRecipe = decode("recipe", value)?;
        let mut reasons = Reasons::new();
        let name = reasons.require("name", raw.name);

        let inputs = Input::parse(raw.inputs.as_deref().unwrap_or_default());
        let templates = match raw.templates.as_deref() {
            None => {
                reasons.push("missing 'templates'");
                Vec::new()
            }
            Some(values) => {
                let templates = Template::parse(values, options);
                if templates.is_empty() {
                    reasons.push("needs at least one valid template");
                }
                templates
            }
        };

        let symbols: Vec<String> = inputs.iter().map(|input| input.symbol.clone()).collect();
        let update_targets = UpdateTarget::parse(
            raw.update_targets.as_deref().unwrap_or_default(),
            options,
            &symbols,
        );
        let create_targets =
            CreateTarget::parse(raw.create_targets.as_deref().unwrap_or_default(), options);
        if raw.update_targets.is_none() && raw.create_targets.is_none() {
            reasons.push("one of 'updateTargets' or 'createTargets' is required");
        } else if update_targets.is_empty() && create_targets.is_empty() {
            reasons.push("needs at least one valid update or create target");
        }

        let recipe = reasons.into_result("recipe", entry_name(value), || Recipe {
            name,
            inputs,
            templates,
            update_targets,
            create_targets,
        })?;
        recipe.warn_unresolved_targets();
        Ok(recipe)
    }

    /// Converts every valid recipe; invalid ones are logged and dropped.
    pub fn parse(values: &[Value], options: &LoadOptions) -> Vec<Recipe> {
        parse_list(values, |v| Recipe::from_value(v, options))
    }

    /// Target names referenced by templates that match no declared target.
    ///
    /// Names containing an input symbol only resolve after substitution, so they are skipped.
    pub fn unresolved_target_names(&self) -> Vec<&str> {
        let mut missing = Vec::new();
        for template in &self.templates {
            for name in &template.create_targets {
                if !self.uses_input_symbol(name)
                    && !self.create_targets.iter().any(|t| &t.name == name)
                {
                    missing.push(name.as_str());
                }
            }
            for name in &template.update_targets {
                if !self.uses_input_symbol(name)
                    && !self.update_targets.iter().any(|t| &t.name == name)
                {
                    missing.push(name.as_str());
                }
            }
        }
        missing
    }

    fn uses_input_symbol(&self, text: &str) -> bool {
        self.inputs
            .iter()
            .any(|input| text.contains(input.symbol.as_str()))
    }

    fn warn_unresolved_targets(&self) {
        for name in self.unresolved_target_names() {
            tracing::warn!(
                recipe = %self.name,
                target_name = name,
                "template output names a target the recipe does not declare; it will not be applied"
            );
        }
    }

    /// Picker entry: labelled by name, with the input count and a create/edit summary.
    pub fn summary(&self) -> SelectItem {
        let inputs = self.inputs.len();
        let creates = self.create_targets.len();
        let edits = self.update_targets.len();
        let mut parts = Vec::new();
        if creates > 0 {
            parts.push(format!("{} new", creates));
        }
        if edits > 0 {
            parts.push(format!("{} edit{}", edits, if edits == 1 { "" } else { "s" }));
        }
        SelectItem {
            label: self.name.clone(),
            detail: parts.join(", "),
            description: format!("({} input{})", inputs, if inputs == 1 { "" } else { "s" }),
        }
    }

    /// Asks the operator to pick one recipe. `None` on cancel.
    pub async fn prompt_for_selection(prompter: &dyn Prompter, recipes: &[Recipe]) -> Option<usize> {
        let items: Vec<SelectItem> = recipes.iter().map(Recipe::summary).collect();
        let options = SelectOptions {
            title: "Recipe Picker".to_string(),
            placeholder: "Which recipe do you want to generate?".to_string(),
        };
        prompter
            .select_one(&options, &items)
            .await
            .filter(|&index| index < recipes.len())
    }
}
