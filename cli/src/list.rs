//! `stencil list`: one line per valid recipe, or a JSON array with `--json`.

use serde_json::{json, Value};
use stencil::Recipe;

/// `name  (N inputs)  1 new, 2 edits` per recipe.
pub fn render_text(recipes: &[Recipe]) -> String {
    let mut out = String::new();
    for recipe in recipes {
        let item = recipe.summary();
        out.push_str(&format!("{}  {}", item.label, item.description));
        if !item.detail.is_empty() {
            out.push_str(&format!("  {}", item.detail));
        }
        out.push('\n');
    }
    out
}

pub fn render_json(recipes: &[Recipe]) -> Value {
    Value::Array(
        recipes
            .iter()
            .map(|recipe| {
                json!({
                    "name": recipe.name,
                    "inputs": recipe.inputs.iter().map(|i| i.symbol.as_str()).collect::<Vec<_>>(),
                    "templates": recipe.templates.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
                    "createTargets": recipe.create_targets.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
                    "updateTargets": recipe.update_targets.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
                })
            })
            .collect(),
    )
}
