//! Stencil CLI binary: pick a recipe, answer its prompts, create and patch files.
//!
//! Subcommands: `run` (default) and `list`.

mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cli::{render_json, render_text, TerminalPrompter};
use stencil::{LoadOptions, LocalFileSystem, PerforceClient, Recipe, RecipeRunner, RunOutcome};

const APP_NAME: &str = "stencil";

#[derive(Parser, Debug)]
#[command(name = "stencil")]
#[command(about = "Generate code from configured recipes")]
struct Args {
    #[command(subcommand)]
    cmd: Option<Command>,

    /// Workspace root: project config location and `${workspace}` value (default: current dir)
    #[arg(short, long, value_name = "DIR", global = true)]
    workspace: Option<PathBuf>,

    /// Run this recipe without showing the picker
    #[arg(short, long, value_name = "NAME", global = true)]
    recipe: Option<String>,

    /// Open files for add/edit in Perforce before writing (overrides config)
    #[arg(long, global = true, conflicts_with = "no_vcs")]
    use_vcs: bool,

    /// Never call Perforce (overrides config)
    #[arg(long, global = true)]
    no_vcs: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Run a recipe (default)
    Run,
    /// List valid recipes
    List {
        /// Print a JSON array instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = logging::init() {
        eprintln!("stencil: logging: {}", e);
    }
    if let Err(e) = run(args).await {
        eprintln!("stencil: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let workspace = match args.workspace {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let settings = config::load(APP_NAME, Some(&workspace))?;
    let use_vcs = if args.use_vcs {
        true
    } else if args.no_vcs {
        false
    } else {
        settings.use_vcs
    };

    let options = LoadOptions {
        workspace_root: settings.workspace_root.clone(),
    };
    let mut recipes = Recipe::parse(&settings.recipes, &options);
    tracing::debug!(
        configured = settings.recipes.len(),
        valid = recipes.len(),
        use_vcs,
        "recipes loaded"
    );

    match args.cmd.unwrap_or(Command::Run) {
        Command::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&render_json(&recipes))?);
            } else {
                print!("{}", render_text(&recipes));
            }
            Ok(())
        }
        Command::Run => {
            let prompter = TerminalPrompter::stdio();
            let fs = LocalFileSystem;
            let perforce = use_vcs.then(|| PerforceClient::new(&workspace));
            let mut runner = RecipeRunner::new(&prompter, &fs);
            if let Some(p4) = &perforce {
                runner = runner.with_vcs(p4);
            }

            let outcome = match &args.recipe {
                Some(name) => runner.run_named(name, &mut recipes).await?,
                None => runner.run(&mut recipes).await?,
            };
            match outcome {
                RunOutcome::Completed { recipe, writes } => {
                    for path in &writes {
                        tracing::info!(path = %path.display(), "written");
                    }
                    println!("Generated recipe '{}'", recipe);
                }
                RunOutcome::Cancelled { stage } => {
                    tracing::info!(?stage, "run cancelled");
                }
            }
            Ok(())
        }
    }
}
