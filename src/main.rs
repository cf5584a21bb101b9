//! comment-style CLI - Command-line interface for comment style checking
//!
//! Architecture: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to validator operations
//! - Handles external concerns like signals, process exit codes, and terminal output
//! - Fatal errors carry context through anyhow; style findings are never errors

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comment_style::config::DEFAULT_CONFIG_FILES;
use comment_style::rules::RuleSet;
use comment_style::{
    AnalysisOptions, CancellationFlag, CheckReport, CommentStyleConfig, CommentValidator,
    OutputFormat, ReportFormatter, ReportOptions, RuleId,
};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// comment-style - Opinionated comment style checking
#[derive(Parser)]
#[command(name = "comment-style")]
#[command(version)]
#[command(about = "Checks source comments for punctuation, capitalisation and layout")]
#[command(
    long_about = "comment-style scans line comments, groups them into blocks and sections, and reports \
                  style violations such as missing punctuation, lowercase section starts, trailing \
                  comments and malformed TODO/FIXME/NOTE tags."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files for comment style violations
    Check {
        /// Paths to check (files or directories)
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Maximum number of violations to report
        #[arg(long)]
        max_violations: Option<usize>,

        /// Maximum number of files to check
        #[arg(long)]
        max_files: Option<usize>,

        /// Additional exclude patterns
        #[arg(long, action = clap::ArgAction::Append)]
        exclude: Vec<String>,

        /// Ignore .commentstyleignore files
        #[arg(long)]
        no_ignore: bool,

        /// Do not print the offending source line
        #[arg(long)]
        no_context: bool,

        /// Disable parallel processing
        #[arg(long)]
        no_parallel: bool,

        /// Stop at the first file that cannot be checked
        #[arg(long)]
        fail_fast: bool,
    },

    /// Watch for file changes and run checks automatically
    Watch {
        /// Path to watch (defaults to current directory)
        path: Option<PathBuf>,

        /// Debounce delay in milliseconds
        #[arg(long, default_value = "500")]
        delay: u64,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },

    /// Explain what a specific rule checks
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },

    /// List rules and the targets they apply to
    Rules {
        /// Show only rules enabled for at least one target
        #[arg(long)]
        enabled_only: bool,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Github,
    Sarif,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Github => OutputFormat::GitHub,
            OutputFormatArg::Sarif => OutputFormat::Sarif,
        }
    }
}

struct CheckArgs {
    paths: Vec<PathBuf>,
    format: OutputFormatArg,
    max_violations: Option<usize>,
    max_files: Option<usize>,
    exclude: Vec<String>,
    no_ignore: bool,
    no_context: bool,
    no_parallel: bool,
    fail_fast: bool,
}

/// Exit status after Ctrl-C, as shells report SIGINT
const INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    }
}

async fn run_command(cli: Cli) -> Result<i32> {
    let use_colors = !cli.no_color;
    match cli.command {
        Commands::Check {
            paths,
            format,
            max_violations,
            max_files,
            exclude,
            no_ignore,
            no_context,
            no_parallel,
            fail_fast,
        } => {
            let args = CheckArgs {
                paths,
                format,
                max_violations,
                max_files,
                exclude,
                no_ignore,
                no_context,
                no_parallel,
                fail_fast,
            };
            run_check(cli.config.as_deref(), args, use_colors).await
        }
        Commands::Watch { path, delay } => {
            run_watch(cli.config.as_deref(), path, delay, use_colors).await
        }
        Commands::ValidateConfig { config_file } => run_validate_config(config_file.or(cli.config)),
        Commands::Explain { rule_id } => Ok(run_explain(&rule_id)),
        Commands::Rules { enabled_only } => run_list_rules(cli.config.as_deref(), enabled_only),
    }
}

/// Explicit config file, else the first default file in the working directory, else defaults
fn load_config(config_path: Option<&Path>) -> Result<CommentStyleConfig> {
    if let Some(path) = config_path {
        return CommentStyleConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration '{}'", path.display()));
    }

    let discovered = CommentStyleConfig::discover_in(".")
        .context("Failed to load configuration from the working directory")?;
    Ok(discovered.unwrap_or_default())
}

async fn run_check(config_path: Option<&Path>, args: CheckArgs, use_colors: bool) -> Result<i32> {
    let config = load_config(config_path)?;
    let validator = CommentValidator::new_with_config(config)
        .context("Invalid configuration")?
        .with_report_formatter(ReportFormatter::new(ReportOptions {
            use_colors,
            show_context: !args.no_context,
            max_violations: args.max_violations,
        }));

    let paths = if args.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.paths
    };

    let cancel = CancellationFlag::new();
    let options = AnalysisOptions {
        parallel: !args.no_parallel,
        max_files: args.max_files,
        fail_fast: args.fail_fast,
        exclude_patterns: args.exclude,
        ignore_ignore_files: args.no_ignore,
        cancel: Some(cancel.clone()),
    };

    let report = tokio::select! {
        result = validator.check_paths(paths, &options) => result.context("Check failed")?,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            tracing::warn!("Interrupted, stopping after the current file");
            return Ok(INTERRUPTED);
        }
    };

    print!("{}", validator.format_report(&report, args.format.into())?);
    Ok(report.exit_code())
}

async fn run_watch(
    config_path: Option<&Path>,
    path: Option<PathBuf>,
    delay_ms: u64,
    use_colors: bool,
) -> Result<i32> {
    use notify::{Event, RecursiveMode, Watcher};

    let watch_path = path.unwrap_or_else(|| PathBuf::from("."));
    let debounce = Duration::from_millis(delay_ms);
    let formatter = ReportFormatter::new(ReportOptions {
        use_colors,
        ..Default::default()
    });

    let mut validator = CommentValidator::new_with_config(load_config(config_path)?)
        .context("Invalid configuration")?
        .with_report_formatter(formatter.clone());

    println!("👀 Watching {} (debounce {}ms)", watch_path.display(), delay_ms);
    println!("Press Ctrl+C to stop watching\n");

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Event>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            // The receiver only goes away on shutdown.
            let _ = tx.send(event);
        }
        Err(e) => tracing::warn!("Watch error: {}", e),
    })
    .context("Failed to create file watcher")?;

    watcher
        .watch(&watch_path, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch '{}'", watch_path.display()))?;

    run_watch_check(&validator, &watch_path).await;

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    tracing::warn!("File watcher disconnected");
                    break;
                };
                if !is_modification(&event) {
                    continue;
                }

                let mut config_changed = is_config_change(&event);
                let mut relevant = config_changed || touches_checked_file(&event, &validator);

                // Let a burst of saves settle before re-checking.
                while let Ok(Some(next)) = tokio::time::timeout(debounce, rx.recv()).await {
                    if is_modification(&next) {
                        config_changed |= is_config_change(&next);
                        relevant |= touches_checked_file(&next, &validator);
                    }
                }

                if config_changed {
                    match load_config(config_path).and_then(|config| {
                        CommentValidator::new_with_config(config).map_err(anyhow::Error::from)
                    }) {
                        Ok(reloaded) => {
                            println!("🔄 Configuration reloaded");
                            validator = reloaded.with_report_formatter(formatter.clone());
                        }
                        Err(e) => eprintln!("⚠️  Keeping previous configuration: {e:#}"),
                    }
                }

                if relevant || config_changed {
                    // Clear the screen and home the cursor.
                    print!("\x1B[2J\x1B[H");
                    run_watch_check(&validator, &watch_path).await;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(0)
}

fn is_modification(event: &notify::Event) -> bool {
    use notify::EventKind;

    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

fn touches_checked_file(event: &notify::Event, validator: &CommentValidator) -> bool {
    event
        .paths
        .iter()
        .any(|path| validator.analyzer().target_name(path).is_some())
}

fn is_config_change(event: &notify::Event) -> bool {
    event.paths.iter().any(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| DEFAULT_CONFIG_FILES.contains(&name))
    })
}

async fn run_watch_check(validator: &CommentValidator, watch_path: &Path) {
    let options = AnalysisOptions::default();
    match validator.check_paths(vec![watch_path], &options).await {
        Ok(report) => print_watch_report(validator, &report),
        Err(e) => eprintln!("❌ Check failed: {e}"),
    }
    println!("⌚ Watching for changes... (Press Ctrl+C to stop)\n");
}

fn print_watch_report(validator: &CommentValidator, report: &CheckReport) {
    match validator.format_report(report, OutputFormat::Human) {
        Ok(formatted) => print!("{formatted}"),
        Err(e) => eprintln!("❌ Failed to format report: {e}"),
    }
}

fn run_validate_config(config_path: Option<PathBuf>) -> Result<i32> {
    let config_path = match config_path {
        Some(path) => path,
        None => DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0])),
    };

    println!("Validating configuration: {}", config_path.display());

    match CommentStyleConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("✅ Configuration is valid");
            println!("📊 Configuration summary:");
            println!("  Targets: {}", config.targets.len());
            for (index, target) in config.targets.iter().enumerate() {
                println!(
                    "    {}: {} path entries, line marker '{}', {} allowed rules",
                    target.display_name(index),
                    target.paths.len(),
                    target.comment_markers.line,
                    target.allow.len()
                );
            }
            println!("  Path patterns: {}", config.paths.patterns.len());
            println!("  Tags: {}", config.conventions.tags.join(", "));
            println!("  Fingerprint: {}", config.fingerprint());
            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {e}");
            Ok(1)
        }
    }
}

fn run_explain(rule_id: &str) -> i32 {
    match rule_id.parse::<RuleId>() {
        Ok(rule) => {
            println!("📖 Rule: {rule}");
            println!();
            println!("📝 Message:");
            println!("   {}", rule.message());
            println!();
            println!("🔎 Details:");
            println!("   {}", rule.explanation());
            0
        }
        Err(_) => {
            eprintln!("❌ Rule '{rule_id}' not found");
            println!();
            println!("Available rules:");
            for rule in RuleId::ALL {
                println!("  - {rule}");
            }
            1
        }
    }
}

fn run_list_rules(config_path: Option<&Path>, enabled_only: bool) -> Result<i32> {
    let config = load_config(config_path)?;
    let rules = RuleSet::default_rules(&config.conventions);

    println!("📋 Rules\n");

    for check in rules.iter() {
        let rule = check.id();
        let targets: Vec<String> = config
            .targets
            .iter()
            .enumerate()
            .filter(|(_, target)| !target.allow.contains(&rule))
            .map(|(index, target)| target.display_name(index))
            .collect();

        if enabled_only && targets.is_empty() {
            continue;
        }

        let status = if targets.is_empty() { "❌" } else { "✅" };
        println!(
            "  {status} {rule} [{}] - {}",
            check.scope().as_str(),
            rule.message()
        );
        if !targets.is_empty() {
            println!("      targets: {}", targets.join(", "));
        }
    }

    Ok(0)
}

/// `RUST_LOG` wins over the verbosity flag when it parses
fn log_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "warn" };
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

fn init_logging(verbose: bool) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, directives.as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
