//! Argument parsing and dispatch

use crate::commands;
use crate::config::MendConfig;
use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use mend_batch::FileSet;
use mend_core::RunReport;
use mend_document::{NodeSelector, DEFAULT_CODE_FIELD};
use mend_remote::HttpWorkflowStore;
use std::path::PathBuf;

/// Command-line definition
#[must_use]
pub fn build_cli() -> Command {
    Command::new("mend")
        .version(mend_core::VERSION)
        .about("Idempotent patching of workflow exports and static sites")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default ./mend.toml)"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Read and transform, but write nothing and send no PUT"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .subcommand(
            Command::new("set-code")
                .about("Replace the code field of one node in a local export")
                .arg(path_arg("doc", "Workflow document"))
                .arg(
                    Arg::new("node")
                        .long("node")
                        .required(true)
                        .value_name("ID_OR_NAME")
                        .help("Node id or exact name"),
                )
                .arg(path_arg("code-file", "File holding the new code"))
                .arg(
                    Arg::new("field")
                        .long("field")
                        .default_value(DEFAULT_CODE_FIELD)
                        .help("Node parameter to replace"),
                ),
        )
        .subcommand(
            Command::new("repair-encoding")
                .about("Repair mis-decoded UTF-8 in workflow documents")
                .arg(paths_arg("Workflow documents"))
                .arg(
                    Arg::new("key")
                        .long("key")
                        .action(ArgAction::Append)
                        .help("Only repair strings under this key (repeatable)"),
                ),
        )
        .subcommand(
            Command::new("normalize-text")
                .about("Re-encode UTF-16 or BOM-prefixed files as plain UTF-8")
                .arg(paths_arg("Files to normalize")),
        )
        .subcommand(
            Command::new("edit-site")
                .about("Apply the [site] rules to a static site")
                .arg(
                    Arg::new("root")
                        .long("root")
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .help("Site root (overrides site.root)"),
                )
                .arg(
                    Arg::new("files")
                        .num_args(0..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Explicit files instead of the globbed root"),
                ),
        )
        .subcommand(
            Command::new("patch-remote")
                .about("Fetch, patch and store workflows through the API")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .action(ArgAction::Append)
                        .help("Workflow id (repeatable; default: remote.workflows)"),
                ),
        )
        .subcommand(
            Command::new("patch-local")
                .about("Apply the [[code_edits]] to local exports")
                .arg(paths_arg("Workflow documents")),
        )
        .subcommand(
            Command::new("push")
                .about("Upload a local export, dropping server-assigned fields")
                .arg(path_arg("file", "Workflow document"))
                .arg(Arg::new("id").long("id").required(true).help("Target workflow id")),
        )
        .subcommand(
            Command::new("extract")
                .about("Recover workflow JSON from a tool dump")
                .arg(path_arg("dump", "Text dump"))
                .arg(path_arg("out", "Output document")),
        )
}

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .value_name("PATH")
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

fn paths_arg(help: &'static str) -> Arg {
    Arg::new("paths")
        .num_args(1..)
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

fn path(args: &ArgMatches, name: &str) -> Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("--{name} is required"))
}

fn paths(args: &ArgMatches, name: &str) -> Vec<PathBuf> {
    args.get_many::<PathBuf>(name)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn strings(args: &ArgMatches, name: &str) -> Vec<String> {
    args.get_many::<String>(name)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// Install the tracing subscriber; `RUST_LOG` wins over `verbose`
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Load configuration and run the selected subcommand
///
/// # Errors
/// Configuration and setup failures; per-unit failures are in the report.
pub async fn run<F>(matches: &ArgMatches, env: F) -> Result<RunReport>
where
    F: Fn(&str) -> Option<String>,
{
    let dry_run = matches.get_flag("dry-run");
    let mut config = MendConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    config.apply_env(&env)?;

    let report = match matches.subcommand() {
        Some(("set-code", args)) => {
            let doc = path(args, "doc")?;
            let code_file = path(args, "code-file")?;
            let node = args.get_one::<String>("node").context("--node is required")?;
            let field = args
                .get_one::<String>("field")
                .map_or(DEFAULT_CODE_FIELD, String::as_str);
            let code = std::fs::read_to_string(&code_file)
                .with_context(|| format!("reading code file {}", code_file.display()))?;
            commands::set_code(&doc, &NodeSelector::IdOrName(node.clone()), field, &code, dry_run)
        }
        Some(("repair-encoding", args)) => {
            let filter = config.key_filter(strings(args, "key"));
            commands::repair_encoding(&FileSet::explicit(paths(args, "paths")), &filter, dry_run)?
        }
        Some(("normalize-text", args)) => {
            commands::normalize_text(&FileSet::explicit(paths(args, "paths")), dry_run)?
        }
        Some(("edit-site", args)) => {
            let rules = config.site.rule_set()?;
            let root = args.get_one::<PathBuf>("root").map(PathBuf::as_path);
            let files = config.site.file_set(root, paths(args, "files"))?;
            commands::edit_site(rules, &files, dry_run)?
        }
        Some(("patch-remote", args)) => {
            let plan = config.patch_plan()?;
            if plan.is_empty() {
                bail!("no [[code_edits]] configured");
            }
            let workflows = config.workflows(&strings(args, "id"));
            if workflows.is_empty() {
                bail!("no workflows given: pass --id or set remote.workflows");
            }
            let store = HttpWorkflowStore::new(&config.remote_config(&env)?)?;
            commands::patch_remote(store, plan, &workflows, dry_run).await
        }
        Some(("patch-local", args)) => {
            let plan = config.patch_plan()?;
            if plan.is_empty() {
                bail!("no [[code_edits]] configured");
            }
            commands::patch_local(&plan, &FileSet::explicit(paths(args, "paths")), dry_run)?
        }
        Some(("push", args)) => {
            let file = path(args, "file")?;
            let id = args.get_one::<String>("id").context("--id is required")?;
            let store = HttpWorkflowStore::new(&config.remote_config(&env)?)?;
            commands::push(&store, &file, id, dry_run).await
        }
        Some(("extract", args)) => commands::extract(&path(args, "dump")?, &path(args, "out")?, dry_run),
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => bail!("no command given"),
    };
    Ok(report)
}
