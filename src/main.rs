//! QAReport: interactive test report CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use qareport::config::{load_config, starter_config, Config, CONFIG_FILENAME};
use qareport::logging::{init_logging, level_for};
use qareport::preferences::{JsonFileStore, PreferenceStore, ResolvedTheme, ThemePreference};
use qareport::reporter::{ConsoleReporter, JsonReporter};
use qareport::session::{Modal, ModalTarget, ModalView};
use qareport::sort::SortState;
use qareport::{Intent, Report, ReportEngine, ReportError, TestStatus};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// QAReport: filter, sort, search and export captured test reports
#[derive(Parser, Debug)]
#[command(name = "qareport")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Report document (JSON) to display (omit when using a subcommand)
    #[arg(required = true)]
    report: Option<PathBuf>,

    /// Only show these statuses (repeatable or comma-separated)
    #[arg(long, short, value_delimiter = ',')]
    status: Vec<String>,

    /// Case-insensitive search over name, id and summary
    #[arg(long, short = 'S')]
    search: Option<String>,

    /// Only show rows tagged with these components
    #[arg(long, short, value_delimiter = ',')]
    component: Vec<String>,

    /// Sort column: duration, name or status, optionally :asc or :desc
    #[arg(long, value_name = "COLUMN[:DIR]")]
    sort: Option<String>,

    /// Expand a row's detail panel (repeatable)
    #[arg(long, value_name = "ID")]
    open: Vec<String>,

    /// Keep several rows open instead of one at a time
    #[arg(long)]
    multi: bool,

    /// Output format as JSON
    #[arg(long, short)]
    json: bool,

    #[command(flatten)]
    common: Common,
}

#[derive(clap::Args, Debug, Clone, Default)]
struct Common {
    /// Quiet mode (minimal output)
    #[arg(long, short)]
    quiet: bool,

    /// Verbose output
    #[arg(long, short)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Path to config file (default: search .qareportrc.json in current dir and parents)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a test's detail panel as plain text
    Export {
        report: PathBuf,
        id: String,

        /// Maximum indentation depth for the Execution Log
        #[arg(long)]
        indent_cap: Option<usize>,

        #[command(flatten)]
        common: Common,
    },

    /// Show a test's reconstructed log records
    Logs {
        report: PathBuf,
        id: String,

        /// Only show records from these loggers
        #[arg(long, value_delimiter = ',')]
        logger: Vec<String>,

        /// Highlight and filter by text
        #[arg(long, short = 'S')]
        search: Option<String>,

        /// Output format as JSON
        #[arg(long, short)]
        json: bool,

        #[command(flatten)]
        common: Common,
    },

    /// Show a JSON attachment or the Execution Log as a collapsible tree
    Tree {
        report: PathBuf,
        id: String,
        /// Detail key or attachment label
        key: String,

        /// Start with every node collapsed
        #[arg(long)]
        collapse_all: bool,

        /// Search term
        #[arg(long)]
        find: Option<String>,

        /// Step through N matches, expanding their ancestors
        #[arg(long, value_name = "N", default_value_t = 0)]
        next: usize,

        /// Output format as JSON
        #[arg(long, short)]
        json: bool,

        #[command(flatten)]
        common: Common,
    },

    /// Show or change the stored color theme (light, dark, auto, toggle)
    Theme {
        value: Option<String>,

        #[command(flatten)]
        common: Common,
    },

    /// Create .qareportrc.json with sensible defaults
    Init {
        /// Export indentation cap (default 3)
        #[arg(long)]
        indent_cap: Option<usize>,

        /// Theme "auto" resolves to: light or dark
        #[arg(long)]
        system_theme: Option<String>,

        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::Export {
                report,
                id,
                indent_cap,
                common,
            } => run_export(&report, &id, indent_cap, &common),
            Commands::Logs {
                report,
                id,
                logger,
                search,
                json,
                common,
            } => run_logs(&report, &id, &logger, search.as_deref(), json, &common),
            Commands::Tree {
                report,
                id,
                key,
                collapse_all,
                find,
                next,
                json,
                common,
            } => run_tree(&report, &id, &key, collapse_all, find.as_deref(), next, json, &common),
            Commands::Theme { value, common } => run_theme(value.as_deref(), &common),
            Commands::Init {
                indent_cap,
                system_theme,
                dir,
            } => run_init(indent_cap, system_theme, dir.as_deref()),
        };
    }

    let path = args
        .report
        .clone()
        .context("a report path is required when not using a subcommand")?;
    let common = &args.common;
    let (mut engine, config) = open_engine(&path, common, None)?;

    for status in &args.status {
        let status: TestStatus = status.parse()?;
        engine.dispatch(Intent::ToggleStatus(status));
    }
    if let Some(search) = &args.search {
        engine.dispatch(Intent::SetSearch(search.clone()));
    }
    if !args.component.is_empty() {
        let known = engine.report().components();
        engine.dispatch(Intent::ToggleAllComponents);
        for component in &args.component {
            if !known.contains(component) && !common.quiet {
                eprintln!("{}: unknown component '{}'", "Warning".yellow(), component);
            }
            engine.dispatch(Intent::ToggleComponent(component.clone()));
        }
    }

    let sort = match &args.sort {
        Some(spec) => Some(spec.parse::<SortState>()?),
        None => config.default_sort()?,
    };
    if let Some(sort) = sort {
        engine.set_sort(sort);
    }

    let mut distinct: Vec<&String> = args.open.iter().collect();
    distinct.sort();
    distinct.dedup();
    if distinct.len() > 1 && !args.multi && !common.quiet {
        eprintln!(
            "{}: several --open rows without --multi; only the last stays open",
            "Warning".yellow()
        );
    }
    for id in &args.open {
        engine.report().require_row(id)?;
        engine.dispatch(Intent::OpenRow {
            id: id.clone(),
            multi: args.multi,
        });
    }

    let view = engine.view();
    if args.json {
        println!("{}", JsonReporter::new().pretty().report(&view));
    } else {
        let reporter = console_reporter(&engine, common);
        if common.quiet {
            print!("{}", reporter.render_quiet(&view));
        } else {
            reporter.report(&engine);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load config, report and preferences; start logging
fn open_engine(
    report_path: &Path,
    common: &Common,
    indent_cap: Option<usize>,
) -> Result<(ReportEngine, Config)> {
    // Logging may already be set when several commands share a process
    let _ = init_logging(level_for(common.verbose, common.quiet));
    if common.no_color {
        colored::control::set_override(false);
    }

    let work_dir = report_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let config = load_config(work_dir, common.config.as_deref())?.merge_with_cli(indent_cap, None, None);

    let report = Report::load(report_path)
        .with_context(|| format!("Failed to load report {}", report_path.display()))?;
    let prefs = open_preferences(&config, work_dir);
    let engine = ReportEngine::new(report, prefs)
        .with_formatter(config.export_formatter())
        .with_feedback(config.copy_feedback());
    Ok((engine, config))
}

fn open_preferences(config: &Config, work_dir: &Path) -> PreferenceStore {
    let store = JsonFileStore::open(config.preferences_path(work_dir));
    PreferenceStore::new(Box::new(store), config.system_theme())
}

fn console_reporter(engine: &ReportEngine, common: &Common) -> ConsoleReporter {
    let mut reporter = ConsoleReporter::new(engine.preferences().resolved());
    if common.no_color {
        reporter = reporter.without_colors();
    }
    if common.verbose {
        reporter = reporter.verbose();
    }
    reporter
}

fn run_export(report: &Path, id: &str, indent_cap: Option<usize>, common: &Common) -> Result<ExitCode> {
    let (engine, _) = open_engine(report, common, indent_cap)?;
    println!("{}", engine.export_detail(id)?);
    Ok(ExitCode::SUCCESS)
}

fn run_logs(
    report: &Path,
    id: &str,
    loggers: &[String],
    search: Option<&str>,
    json: bool,
    common: &Common,
) -> Result<ExitCode> {
    let (mut engine, _) = open_engine(report, common, None)?;
    engine.report().require_row(id)?;

    if engine.open_attachment(id, ModalTarget::Logs).is_none() {
        if !common.quiet {
            eprintln!("{}: test '{}' has no captured logs", "Info".blue(), id);
        }
        return Ok(ExitCode::SUCCESS);
    }
    if !loggers.is_empty() {
        engine.dispatch(Intent::ToggleAllLoggers);
        for logger in loggers {
            engine.dispatch(Intent::ToggleLogger(logger.clone()));
        }
    }
    if let Some(term) = search {
        engine.dispatch(Intent::ModalSearch(term.to_string()));
    }

    let Some(Modal {
        view: ModalView::Logs(view),
        ..
    }) = &engine.session().modal
    else {
        return Ok(ExitCode::SUCCESS);
    };
    if json {
        println!("{}", JsonReporter::new().pretty().report_logs(view));
    } else {
        print!("{}", console_reporter(&engine, common).render_logs(view));
    }
    Ok(ExitCode::SUCCESS)
}

#[allow(clippy::too_many_arguments)]
fn run_tree(
    report: &Path,
    id: &str,
    key: &str,
    collapse_all: bool,
    find: Option<&str>,
    next: usize,
    json: bool,
    common: &Common,
) -> Result<ExitCode> {
    let (mut engine, _) = open_engine(report, common, None)?;
    engine.report().require_row(id)?;

    let opened = engine
        .open_attachment(id, ModalTarget::Detail(key.to_string()))
        .is_some()
        || engine
            .open_attachment(id, ModalTarget::Attachment(key.to_string()))
            .is_some();
    if !opened {
        return Err(ReportError::UnknownDetail {
            test: id.to_string(),
            key: key.to_string(),
        }
        .into());
    }

    if collapse_all {
        engine.dispatch(Intent::ModalCollapseAll);
    }
    if let Some(term) = find {
        engine.dispatch(Intent::ModalSearch(term.to_string()));
    }
    for _ in 0..next {
        engine.dispatch(Intent::ModalNextMatch);
    }

    let Some(modal) = &engine.session().modal else {
        return Ok(ExitCode::SUCCESS);
    };
    let term = find.unwrap_or_default();
    let (lines, search) = match &modal.view {
        ModalView::Json(view) => (view.lines(), view.search().clone()),
        ModalView::Steps(view) => (view.lines(), view.search().clone()),
        other => {
            // Raw fallback (unparseable JSON, text, images)
            println!("{}", other.body());
            return Ok(ExitCode::SUCCESS);
        }
    };

    if json {
        println!(
            "{}",
            JsonReporter::new()
                .pretty()
                .report_tree(&lines, search.matches().len())
        );
        return Ok(ExitCode::SUCCESS);
    }

    print!("{}", console_reporter(&engine, common).render_tree(&lines, term));
    if find.is_some() && !common.quiet {
        match search.position() {
            Some((current, total)) => eprintln!("{}: match {} of {}", "Info".blue(), current, total),
            None => eprintln!("{}: {} matches", "Info".blue(), search.matches().len()),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_theme(value: Option<&str>, common: &Common) -> Result<ExitCode> {
    let _ = init_logging(level_for(common.verbose, common.quiet));
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = load_config(&cwd, common.config.as_deref())?;
    let mut prefs = open_preferences(&config, &cwd);

    match value {
        None => {}
        Some("toggle") => {
            prefs.toggle_theme()?;
        }
        Some(v) => {
            let theme: ThemePreference = v.parse()?;
            prefs.set_theme(theme)?;
        }
    }

    let resolved = match prefs.resolved() {
        ResolvedTheme::Light => "light",
        ResolvedTheme::Dark => "dark",
    };
    println!("{} (resolved: {})", prefs.theme(), resolved);
    Ok(ExitCode::SUCCESS)
}

fn run_init(indent_cap: Option<usize>, system_theme: Option<String>, dir: Option<&Path>) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let theme_value = match system_theme.as_deref().map(str::to_lowercase).as_deref() {
        Some("light") => "light",
        _ => "dark",
    };
    let cap = indent_cap.unwrap_or(qareport::export::DEFAULT_INDENT_CAP);

    std::fs::write(&config_path, starter_config(cap, theme_value))
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!(
        "{}: Created {} with exportIndentCap={}, systemTheme={}",
        "Done".green().bold(),
        config_path.display(),
        cap,
        theme_value
    );
    Ok(ExitCode::SUCCESS)
}
