use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use inflow_churn::{ChurnMetrics, ChurnReport, MiningOptions};
use inflow_core::{InflowConfig, MethodKind, OutputFormat};
use inflow_forecast::export::ForecastRow;
use inflow_forecast::{ForecastRequest, SummaryMetrics};

#[derive(Parser)]
#[command(
    name = "inflow",
    version,
    about = "Defect-inflow forecasting and code-churn measurement",
    long_about = "Forecast weekly defect inflow from historical counts, and measure code churn\n\
                   from git history.\n\n\
                   Examples:\n  \
                     inflow forecast --method ewma --window 3 --alpha 0.3\n  \
                     inflow summary --data defects.csv\n  \
                     inflow churn --repo . --out churn_results.json\n  \
                     inflow init                      Create a .inflow.toml template"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .inflow.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables (default)\n  \
                         json      Machine-readable JSON\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output (debug logging unless RUST_LOG is set)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Forecast weekly defect inflow
    #[command(long_about = "Forecast weekly defect inflow.\n\n\
        Reads a CSV with a week start column and a defect count column, forecasts\n\
        1 to 6 weeks ahead, prints the forecast with historical indicators, and\n\
        writes the forecast to CSV.\n\n\
        Methods:\n  \
          naive           repeat the last week\n  \
          moving_average  mean of the last --window weeks\n  \
          ewma            exponentially weighted average (needs --window and --alpha)\n  \
          linear          least-squares trend line\n\n\
        Examples:\n  inflow forecast\n  inflow forecast --method moving_average --window 4 --horizon 6")]
    Forecast {
        /// Weekly defect CSV (default: from config, else defect_inflow_data.csv)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Forecasting method
        #[arg(long)]
        method: Option<MethodKind>,

        /// Weeks ahead to forecast, 1 to 6
        #[arg(long)]
        horizon: Option<usize>,

        /// Window size for moving_average / ewma
        #[arg(long)]
        window: Option<usize>,

        /// EWMA smoothing factor in (0, 1]
        #[arg(long)]
        alpha: Option<f64>,

        /// Forecast CSV destination (default: from config, else forecast_output.csv)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the forecast without writing the CSV
        #[arg(long)]
        no_export: bool,
    },
    /// Print total, average, and peak weekly defects
    Summary {
        /// Weekly defect CSV (default: from config, else defect_inflow_data.csv)
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Measure code churn per file and module from git history
    #[command(long_about = "Measure code churn from git history.\n\n\
        Counts lines added and removed per file across non-merge commits, aggregates\n\
        them per module (parent directory), and writes a JSON report.\n\n\
        Examples:\n  inflow churn --repo . --out churn_results.json\n  inflow churn --repo ../svc --out svc.json --since 90 --top 20")]
    Churn {
        /// Path to a local git repository
        #[arg(long)]
        repo: PathBuf,

        /// Output JSON file path
        #[arg(long)]
        out: PathBuf,

        /// Files to list in the top-churn table (default: from config, else 10)
        #[arg(long)]
        top: Option<usize>,

        /// Only count commits from the last N days
        #[arg(long)]
        since: Option<u64>,

        /// Branch to walk instead of HEAD
        #[arg(long)]
        branch: Option<String>,
    },
    /// Create a default .inflow.toml configuration file
    #[command(long_about = "Create a default .inflow.toml configuration file.\n\n\
        Fails if .inflow.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

const DEFAULT_CONFIG: &str = r#"# inflow configuration

[data]
input = "defect_inflow_data.csv"
output = "forecast_output.csv"

[forecast]
# naive | moving_average | ewma | linear
method = "moving_average"
# weeks ahead, 1 to 6
horizon = 4
# required for moving_average and ewma
window_size = 3
# required for ewma, in (0, 1]
alpha = 0.3

[churn]
top_n = 10
# since_days = 180
# max_files_per_commit = 50
# branch = "main"
"#;

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1minflow\x1b[0m v{version}: defect-inflow forecasting and code churn\n");
        println!("Commands:");
        println!("  \x1b[32mforecast\x1b[0m  Forecast weekly defect inflow and export it to CSV");
        println!("  \x1b[32msummary\x1b[0m   Total, average, and peak weekly defects");
        println!("  \x1b[32mchurn\x1b[0m     Per-file and per-module churn from git history");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("inflow v{version}: defect-inflow forecasting and code churn\n");
        println!("Commands:");
        println!("  forecast  Forecast weekly defect inflow and export it to CSV");
        println!("  summary   Total, average, and peak weekly defects");
        println!("  churn     Per-file and per-module churn from git history");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'inflow <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "inflow=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> Result<InflowConfig> {
    let config = match path {
        Some(path) => InflowConfig::from_file(path)?,
        None => {
            let default_path = Path::new(".inflow.toml");
            if default_path.exists() {
                InflowConfig::from_file(default_path)?
            } else {
                InflowConfig::default()
            }
        }
    };
    Ok(config)
}

fn mining_spinner(repo: &Path) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let style = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})").ok()?;
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(format!("Mining git history at {}...", repo.display()));
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(pb)
}

fn print_forecast(
    format: OutputFormat,
    method: MethodKind,
    rows: &[ForecastRow],
    summary: &SummaryMetrics,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "method": method,
                "forecast": rows,
                "indicators": summary,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("# Defect Inflow Forecast\n");
            println!("**Method:** {method}\n");
            println!("| Week start | Predicted defects |");
            println!("|------------|-------------------|");
            for row in rows {
                println!("| {} | {} |", row.period_start_date, row.predicted_defects);
            }
            println!();
            print_indicators(format, summary);
        }
        OutputFormat::Text => {
            println!("Forecast ({method}, {} weeks):", rows.len());
            println!("{:-<40}", "");
            println!("  {:<14} {:>18}", "Week start", "Predicted defects");
            for row in rows {
                println!(
                    "  {:<14} {:>18}",
                    row.period_start_date.to_string(),
                    row.predicted_defects
                );
            }
            println!();
            print_indicators(format, summary);
        }
    }
    Ok(())
}

fn print_indicators(format: OutputFormat, summary: &SummaryMetrics) {
    match format {
        OutputFormat::Markdown => {
            println!("## Indicators\n");
            println!("- **Total defects:** {:.0}", summary.total);
            println!("- **Average weekly defects:** {:.1}", summary.average);
            println!("- **Peak weekly defects:** {:.0}", summary.peak);
        }
        _ => {
            println!("Indicators:");
            println!("{:-<40}", "");
            println!("  Total defects:          {:.0}", summary.total);
            println!("  Average weekly defects: {:.1}", summary.average);
            println!("  Peak weekly defects:    {:.0}", summary.peak);
        }
    }
}

fn ranked_json(items: &[(&str, &ChurnMetrics)]) -> Vec<serde_json::Value> {
    items
        .iter()
        .map(|(path, m)| {
            serde_json::json!({
                "path": path,
                "added": m.added,
                "removed": m.removed,
                "total_churn": m.total_churn,
            })
        })
        .collect()
}

fn print_churn(format: OutputFormat, report: &ChurnReport, top_n: usize) -> Result<()> {
    let top = report.top_files(top_n);
    let modules = report.modules_by_churn();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "files_measured": report.files.len(),
                "total": report.total(),
                "top_files": ranked_json(&top),
                "modules": ranked_json(&modules),
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("# Code Churn\n");
            println!("**Files measured:** {}\n", report.files.len());
            println!("## Top {top_n} Files\n");
            if top.is_empty() {
                println!("No churn recorded.\n");
            } else {
                println!("| Rank | File | Added | Removed | Churn |");
                println!("|------|------|-------|---------|-------|");
                for (i, (path, m)) in top.iter().enumerate() {
                    println!(
                        "| {} | `{path}` | {} | {} | {} |",
                        i + 1,
                        m.added,
                        m.removed,
                        m.total_churn
                    );
                }
                println!();
            }
            println!("## Modules\n");
            if !modules.is_empty() {
                println!("| Module | Added | Removed | Churn |");
                println!("|--------|-------|---------|-------|");
                for (module, m) in &modules {
                    println!(
                        "| `{module}` | {} | {} | {} |",
                        m.added, m.removed, m.total_churn
                    );
                }
            }
        }
        OutputFormat::Text => {
            println!("Top {top_n} files by churn:");
            println!("{:-<72}", "");
            if top.is_empty() {
                println!("  No churn recorded.");
            }
            for (i, (path, m)) in top.iter().enumerate() {
                println!(
                    "  {:>2}. {:<44} +{:<6} -{:<6} {:>6}",
                    i + 1,
                    path,
                    m.added,
                    m.removed,
                    m.total_churn
                );
            }
            println!();
            println!("Churn per module:");
            println!("{:-<72}", "");
            for (module, m) in &modules {
                println!(
                    "  {:<48} +{:<6} -{:<6} {:>6}",
                    module, m.added, m.removed, m.total_churn
                );
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // init, completions and the welcome screen never read the config
    let config = || load_config(cli.config.as_deref());

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    if cli.verbose {
        eprintln!("format: {}", cli.format);
    }

    match cli.command {
        None => {
            print_welcome(use_color);
        }
        Some(Command::Forecast {
            data,
            method,
            horizon,
            window,
            alpha,
            out,
            no_export,
        }) => {
            let config = config()?;
            if cli.verbose {
                eprintln!(
                    "forecast defaults: method={}, horizon={}, window_size={:?}, alpha={:?}",
                    config.forecast.method,
                    config.forecast.horizon,
                    config.forecast.window_size,
                    config.forecast.alpha,
                );
            }
            let mut settings = config.forecast.clone();
            if let Some(method) = method {
                settings.method = method;
            }
            if let Some(horizon) = horizon {
                settings.horizon = horizon;
            }
            if window.is_some() {
                settings.window_size = window;
            }
            if alpha.is_some() {
                settings.alpha = alpha;
            }
            let request = ForecastRequest::from_settings(&settings)?;
            tracing::debug!(?request, "resolved forecast request");

            let data = data.unwrap_or_else(|| config.data.input.clone());
            let weekly = inflow_forecast::loader::load_csv(&data)?;
            eprintln!("Loaded {} weeks from {}.", weekly.weeks.len(), data.display());

            let result = inflow_forecast::forecast(&weekly.series, &request)?;
            let summary = inflow_forecast::summarize(&weekly.series)?;
            let rows = inflow_forecast::export::forecast_rows(&weekly, &result)?;

            print_forecast(cli.format, result.method, &rows, &summary)?;

            if !no_export {
                let out = out.unwrap_or_else(|| config.data.output.clone());
                inflow_forecast::export::write_forecast_csv(&out, &rows)?;
                eprintln!("Forecast saved to {}", out.display());
            }
        }
        Some(Command::Summary { data }) => {
            let config = config()?;
            let data = data.unwrap_or_else(|| config.data.input.clone());
            let weekly = inflow_forecast::loader::load_csv(&data)?;
            let summary = inflow_forecast::summarize(&weekly.series)?;
            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&summary).into_diagnostic()?
                    );
                }
                format => print_indicators(format, &summary),
            }
        }
        Some(Command::Churn {
            repo,
            out,
            top,
            since,
            branch,
        }) => {
            if !repo.exists() {
                return Err(miette::miette!(
                    help = "pass --repo with the path to a local git checkout",
                    "repository path does not exist: {}",
                    repo.display()
                ));
            }

            let config = config()?;
            let options = MiningOptions {
                since_days: since.or(config.churn.since_days),
                max_files_per_commit: config.churn.max_files_per_commit,
                branch: branch.or_else(|| config.churn.branch.clone()),
            };
            let top_n = top.unwrap_or(config.churn.top_n);

            let spinner = mining_spinner(&repo);
            let mined = inflow_churn::mine_numstat(&repo, &options);
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            let entries = mined?;
            eprintln!("Found {} file entries with churn.", entries.len());

            let report = inflow_churn::aggregate(&entries);
            report.save_json(&out)?;
            eprintln!("Results saved to {}", out.display());

            print_churn(cli.format, &report, top_n)?;
        }
        Some(Command::Init) => {
            let path = Path::new(".inflow.toml");
            if path.exists() {
                miette::bail!(".inflow.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .inflow.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "inflow", &mut std::io::stdout());
        }
    }

    Ok(())
}
