//! Orca Delegate - knowledge-aware task delegation for ClawCrew agents.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use orca_delegate::config::{ConfigLoader, DelegateConfig};
use orca_delegate::delegate::{self, DelegationPlan};
use orca_delegate::display;
use orca_delegate::knowledge::{audit, AuditOptions, FileSelector};
use orca_delegate::tags::TagResolver;

#[derive(Parser)]
#[command(
    name = "orca-delegate",
    about = "Delegate tasks to ClawCrew agents with knowledge base context",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ./.orca-delegate.toml, then ~/.config/orca-delegate/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TaskArgs {
    /// Role to delegate to (architect, implementer, tester, orchestrator, ...).
    role: String,
    /// The task description.
    #[arg(required = true, num_args = 1..)]
    task: Vec<String>,
}

impl TaskArgs {
    fn text(&self) -> String {
        self.task.join(" ").trim().to_string()
    }
}

#[derive(Args)]
struct KnowledgeArgs {
    /// Knowledge base directory.
    #[arg(long)]
    knowledge_dir: Option<PathBuf>,
    /// Maximum number of context files.
    #[arg(long)]
    max_files: Option<usize>,
    /// Files of this many bytes or more are never included.
    #[arg(long)]
    max_file_bytes: Option<u64>,
}

impl KnowledgeArgs {
    fn apply(&self, config: &mut DelegateConfig) {
        if let Some(dir) = &self.knowledge_dir {
            config.knowledge_dir.clone_from(dir);
        }
        if let Some(max) = self.max_files {
            config.max_files = max;
        }
        if let Some(max) = self.max_file_bytes {
            config.max_file_bytes = max;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Select context for a task and hand it to the agent runner.
    Delegate {
        #[command(flatten)]
        task: TaskArgs,
        #[command(flatten)]
        knowledge: KnowledgeArgs,
        /// Print the runner command instead of executing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the tags a task resolves to.
    Tags {
        #[command(flatten)]
        task: TaskArgs,
    },
    /// Show which knowledge files a task would receive.
    Select {
        #[command(flatten)]
        task: TaskArgs,
        #[command(flatten)]
        knowledge: KnowledgeArgs,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the knowledge index with on-disk status.
    Index {
        #[command(flatten)]
        knowledge: KnowledgeArgs,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Check the knowledge base for missing, oversized, stale or drifted entries.
    Check {
        #[command(flatten)]
        knowledge: KnowledgeArgs,
        /// Flag entries not updated for this many days (0 disables).
        #[arg(long, default_value_t = 90)]
        stale_days: i64,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List known roles and their base tags.
    Roles,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Option<DelegateConfig> {
    let loader = match path {
        Some(path) => {
            if !path.exists() {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            }
            ConfigLoader::with_path(path)
        }
        None => ConfigLoader::new(),
    };

    tracing::debug!(paths = ?loader.search_paths(), "Searching for config file");
    match loader.load() {
        Ok(config) => Some(config),
        Err(e) => {
            display::print_error(&e.to_string());
            None
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(e) => {
            display::print_error(&format!("Failed to serialize output: {e}"));
            1
        }
    }
}

fn validate_task(task: &TaskArgs) -> Option<String> {
    let text = task.text();
    if task.role.trim().is_empty() || text.is_empty() {
        display::print_error("Usage: orca-delegate delegate <ROLE> <TASK>...");
        None
    } else {
        Some(text)
    }
}

async fn run(command: Commands, mut config: DelegateConfig) -> i32 {
    match command {
        Commands::Delegate {
            task,
            knowledge,
            dry_run,
        } => {
            let Some(text) = validate_task(&task) else {
                return 1;
            };
            knowledge.apply(&mut config);

            let plan = DelegationPlan::build(&config, &task.role, &text);
            display::print_selection(&plan.selection, &config.index_path());

            if dry_run {
                display::print_dry_run(&plan.command);
                return 0;
            }

            match delegate::run(&plan.command).await {
                Ok(code) => code,
                Err(e) => {
                    display::print_error(&e.to_string());
                    e.exit_code()
                }
            }
        }
        Commands::Tags { task } => {
            let Some(text) = validate_task(&task) else {
                return 1;
            };
            let tags = TagResolver::from_config(&config.tags).resolve(&task.role, &text);
            display::print_tags(&task.role, &tags);
            0
        }
        Commands::Select {
            task,
            knowledge,
            json,
        } => {
            let Some(text) = validate_task(&task) else {
                return 1;
            };
            knowledge.apply(&mut config);

            let tags = TagResolver::from_config(&config.tags).resolve(&task.role, &text);
            let selection = FileSelector::new(&config).select(&tags);

            if json {
                return print_json(&serde_json::json!({
                    "role": task.role,
                    "tags": tags,
                    "selection": selection,
                }));
            }
            display::print_tags(&task.role, &tags);
            display::print_selection(&selection, &config.index_path());
            display::print_skipped(&selection);
            0
        }
        Commands::Index { knowledge, json } => {
            knowledge.apply(&mut config);
            let selector = FileSelector::new(&config);
            let Some(table) = selector.load_index() else {
                display::print_warning(&format!(
                    "No knowledge base at {}",
                    selector.index_path().display()
                ));
                return 1;
            };

            if json {
                return print_json(&table);
            }
            display::print_index(&table, &selector);
            0
        }
        Commands::Check {
            knowledge,
            stale_days,
            json,
        } => {
            knowledge.apply(&mut config);
            let selector = FileSelector::new(&config);
            let Some(table) = selector.load_index() else {
                display::print_warning(&format!(
                    "No knowledge base at {}",
                    selector.index_path().display()
                ));
                return 1;
            };

            let options = AuditOptions {
                stale_after_days: (stale_days > 0).then_some(stale_days),
                today: chrono::Local::now().date_naive(),
            };
            let findings = audit(&selector, &table, &options);

            if json {
                let code = print_json(&findings);
                return if findings.is_empty() { code } else { 1 };
            }
            display::print_findings(&findings);
            i32::from(!findings.is_empty())
        }
        Commands::Roles => {
            display::print_roles(&TagResolver::from_config(&config.tags));
            0
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        // Usage errors exit 1; help and version exit 0.
        let code = i32::from(e.use_stderr());
        if e.print().is_err() {
            eprintln!("{e}");
        }
        std::process::exit(code);
    });
    init_tracing(cli.verbose);

    let Some(config) = load_config(cli.config) else {
        std::process::exit(1);
    };
    tracing::debug!(
        knowledge_dir = %config.knowledge_dir.display(),
        max_files = config.max_files,
        max_file_bytes = config.max_file_bytes,
        runner = %config.runner.program,
        "Loaded configuration"
    );

    let code = run(cli.command, config).await;
    std::process::exit(code);
}
