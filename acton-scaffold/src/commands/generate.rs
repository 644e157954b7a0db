//! `generate` subcommands

use std::path::Path;

use acton_scaffold::config::ProjectContext;
use acton_scaffold::scaffold::{
    ArtifactKind, FileAction, GenerateRequest, GenerationPlan, GenerationReport, Generator,
    ResourceKind,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use console::{style, Emoji};
use similar::{ChangeTag, TextDiff};

static SUCCESS: Emoji = Emoji("✓ ", "");
static DRY_RUN: Emoji = Emoji("🔍 ", "");

/// Code generation commands
#[derive(Debug, Subcommand)]
pub enum GenerateCommand {
    /// Generate a model module
    ///
    /// Examples:
    ///   acton-scaffold generate model Post title:str body:str author:ref:User
    ///   acton-scaffold generate model User username^:str email_:str password_hashed:str
    Model {
        /// Resource name (e.g., `Post`, `BlogPost`)
        name: String,

        /// Field tokens: `name[^][_][_hashed|_encrypted]:type`
        #[arg(value_name = "FIELD")]
        fields: Vec<String>,

        #[command(flatten)]
        options: GenerateOptions,
    },

    /// Generate a controller module with CRUD handlers
    ///
    /// Examples:
    ///   acton-scaffold generate controller Post title:str --action get:search
    Controller {
        /// Resource name
        name: String,

        /// Field tokens accepted by the create and update handlers
        #[arg(value_name = "FIELD")]
        fields: Vec<String>,

        #[command(flatten)]
        actions: ActionOptions,

        #[command(flatten)]
        options: GenerateOptions,
    },

    /// Generate a model and its controller
    ///
    /// Examples:
    ///   acton-scaffold generate scaffold Post title:str body:str tags:list:str
    Scaffold {
        /// Resource name
        name: String,

        /// Field tokens
        #[arg(value_name = "FIELD")]
        fields: Vec<String>,

        #[command(flatten)]
        actions: ActionOptions,

        #[command(flatten)]
        options: GenerateOptions,
    },
}

/// Custom controller actions
#[derive(Debug, Clone, Args)]
pub struct ActionOptions {
    /// Extra handler, e.g. `get:search` (repeatable)
    #[arg(long = "action", value_name = "METHOD:NAME")]
    actions: Vec<String>,
}

/// Flags shared by every generate subcommand
#[derive(Debug, Clone, Copy, Args)]
pub struct GenerateOptions {
    /// Show what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing artifacts that differ from the generated code
    #[arg(long)]
    force: bool,
}

impl GenerateCommand {
    /// Execute the generate command
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A field token, action or the resource name is invalid
    /// - An artifact exists with different content and `--force` is not set
    /// - A template fails to render
    /// - A file cannot be read or written
    pub fn execute(&self, context: &ProjectContext) -> Result<()> {
        let (request, options) = self.request();

        println!(
            "\n{} {} {}",
            style("Generating").cyan().bold(),
            style(request.kind).cyan().bold(),
            style(&request.resource).green().bold()
        );

        let generator = Generator::for_project(context)?;

        if options.dry_run {
            let plan = generator.plan(&request)?;
            print_plan(&plan, &context.root);
            return Ok(());
        }

        let report = generator.generate(&request)?;
        print_report(&report, context);
        Ok(())
    }

    fn request(&self) -> (GenerateRequest, GenerateOptions) {
        let (kind, name, fields, actions, options) = match self {
            Self::Model {
                name,
                fields,
                options,
            } => (ResourceKind::Model, name, fields, &[][..], options),
            Self::Controller {
                name,
                fields,
                actions,
                options,
            } => (
                ResourceKind::Controller,
                name,
                fields,
                actions.actions.as_slice(),
                options,
            ),
            Self::Scaffold {
                name,
                fields,
                actions,
                options,
            } => (
                ResourceKind::Scaffold,
                name,
                fields,
                actions.actions.as_slice(),
                options,
            ),
        };

        let request = GenerateRequest::new(kind, name.as_str())
            .with_fields(fields.iter().cloned())
            .with_actions(actions.iter().cloned())
            .with_force(options.force);
        (request, *options)
    }
}

fn print_plan(plan: &GenerationPlan, root: &Path) {
    println!(
        "{}{}",
        DRY_RUN,
        style("Dry run: nothing will be written").yellow().bold()
    );
    println!();

    for write in &plan.writes {
        let action = write.action();
        println!("  {} {}", styled_action(action), relative(&write.path, root));
        if action == FileAction::Unchanged {
            continue;
        }

        let previous = write.previous.as_deref().unwrap_or("");
        let diff = TextDiff::from_lines(previous, &write.content);
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Delete => {
                    print!("    {}", style(format!("-{change}")).red());
                }
                ChangeTag::Insert => {
                    print!("    {}", style(format!("+{change}")).green());
                }
                ChangeTag::Equal => {
                    print!("     {change}");
                }
            }
        }
        println!();
    }

    if plan.is_noop() {
        println!("{}", style("Everything is up to date.").dim());
    }
}

fn print_report(report: &GenerationReport, context: &ProjectContext) {
    let root = context.root.as_path();
    println!();
    for file in &report.files {
        println!("  {} {}", styled_action(file.action), relative(&file.path, root));
    }
    println!();

    let changed = report.changed().count();
    if changed == 0 {
        println!("{}", style("Everything is up to date.").dim());
        return;
    }

    println!(
        "{}{} {}",
        SUCCESS,
        style(format!("{changed} file(s) written for")).green().bold(),
        style(&report.resource).green().bold()
    );

    if let Some(controller) = report
        .artifacts
        .iter()
        .find(|id| id.kind == ArtifactKind::Controller)
    {
        let module = context
            .config
            .layout
            .controller_module_path(&controller.module)
            .unwrap_or_else(|| controller.module.clone());
        println!();
        println!("{}", style("Next steps:").bold().underlined());
        println!("  1. Mount the routes in your router:");
        println!(
            "     {}",
            style(format!(".merge({module}::routes())")).cyan()
        );
    }
}

fn styled_action(action: FileAction) -> console::StyledObject<String> {
    let label = format!("{action:>9}");
    match action {
        FileAction::Created => style(label).green(),
        FileAction::Updated => style(label).yellow(),
        FileAction::Unchanged => style(label).dim(),
    }
}

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
