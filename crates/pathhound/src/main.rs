//! Pathhound CLI - batch attack-path reporting from the command line.
//!
//! Connects to a Neo4j server holding a BloodHound-style graph, runs the
//! selected jobs and writes their reports.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use pathhound::config::DEFAULT_SERVER;
use pathhound::{BusiestMode, OutputFormat};

mod cli;

/// Pathhound: batch reports and remediation priorities for directory attack paths.
#[derive(Parser)]
#[command(name = "pathhound")]
#[command(version, about, long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .args(["easy", "task_file", "query", "busiest_path", "analyze_path"])
        .multiple(false)
))]
struct Cli {
    /// Graph server URL
    #[arg(short, long, default_value = DEFAULT_SERVER)]
    server: String,

    /// Database user
    #[arg(short, long, default_value = "neo4j")]
    username: String,

    /// Database password
    #[arg(short, long, default_value = "")]
    password: String,

    /// Database name
    #[arg(long, default_value = "neo4j")]
    database: String,

    /// Per-query timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// List domain users (connectivity smoke test)
    #[arg(long)]
    easy: bool,

    /// Task list to run, one task per line
    #[arg(short = 'x', long, value_name = "FILE")]
    task_file: Option<PathBuf>,

    /// Run a single query
    #[arg(short, long)]
    query: Option<String>,

    /// Rank start nodes by how many principals share their path
    #[arg(long, value_name = "short|all")]
    busiest_path: Option<BusiestMode>,

    /// Keep only the top N busiest paths
    #[arg(long, requires = "busiest_path")]
    limit: Option<usize>,

    /// Find load-bearing relationships from START (a node class or name) to END
    #[arg(long, num_args = 1..=2, value_names = ["START", "END"])]
    analyze_path: Option<Vec<String>>,

    /// Report title for single-job modes
    #[arg(short, long)]
    title: Option<String>,

    /// Output file for single-job modes
    #[arg(long, default_value = "pathhound-report")]
    out_file: PathBuf,

    /// Directory reports are written to
    #[arg(long, default_value = "reports")]
    out_path: PathBuf,

    /// Output format for single-job modes (STDOUT, CSV, HTML, HTMLCSV, JSON)
    #[arg(long, default_value = "STDOUT")]
    out_format: OutputFormat,

    /// HTML fragment placed before each report table
    #[arg(long, value_name = "FILE")]
    html_header: Option<PathBuf>,

    /// HTML fragment placed after each report table
    #[arg(long, value_name = "FILE")]
    html_footer: Option<PathBuf>,

    /// Stylesheet inlined into each HTML report
    #[arg(long, value_name = "FILE")]
    html_css: Option<PathBuf>,

    /// YAML file overriding the privileged-group and membership conventions
    #[arg(long, value_name = "FILE")]
    conventions: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let options = cli::RunOptions {
        session: pathhound::config::SessionConfig {
            server: cli.server,
            username: cli.username,
            password: cli.password,
            database: cli.database,
            timeout: Duration::from_secs(cli.timeout),
            ..pathhound::config::SessionConfig::default()
        },
        report: pathhound::config::ReportConfig {
            output_dir: cli.out_path,
            html_header: cli.html_header,
            html_footer: cli.html_footer,
            html_css: cli.html_css,
        },
        tasks: pathhound::config::TaskConfig {
            task_file: cli.task_file,
            query: cli
                .query
                .map(|query| pathhound::config::AdhocQuery { query }),
            busiest_path: cli
                .busiest_path
                .map(|mode| pathhound::config::BusiestRequest {
                    mode,
                    limit: cli.limit,
                }),
            analyze_path: cli.analyze_path.and_then(|mut selectors| {
                let end = (selectors.len() > 1).then(|| selectors.remove(1));
                let start = selectors.into_iter().next()?;
                Some(pathhound::config::AnalyzeRequest { start, end })
            }),
            easy: cli.easy,
            title: cli.title,
            format: cli.out_format,
            output_file: cli.out_file,
        },
        conventions: cli.conventions,
    };

    match cli::run::run(&options) {
        Ok(summary) => summary.exit_code(),
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            for cause in e.chain().skip(1) {
                eprintln!("  {}: {cause}", "caused by".dimmed());
            }
            ExitCode::from(cli::EXIT_FATAL)
        }
    }
}
