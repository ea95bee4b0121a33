use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use langbase_got::{
    config::{Config, LogFormat},
    langbase::LangbaseClient,
    search::{GotEngine, ReasoningOutcome, SearchConfig, Strategy},
    storage::{SqliteStorage, Storage, StoredRun, DEFAULT_LIST_LIMIT},
    AppError,
};

#[derive(Parser, Debug)]
#[command(name = "langbase-got", version)]
#[command(about = "Graph-of-Thoughts reasoning over Langbase Pipes")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a graph-of-thoughts search for a problem
    Reason(ReasonArgs),
    /// Inspect persisted runs
    Runs {
        #[command(subcommand)]
        cmd: RunsCommand,
    },
}

#[derive(Args, Debug)]
struct ReasonArgs {
    /// Problem statement to reason about
    problem: String,

    /// Search strategy: bfs, dfs or best_first
    #[arg(long, value_name = "NAME")]
    strategy: Option<String>,

    /// Deepest level that may be generated
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Children requested per expansion
    #[arg(long, value_name = "K")]
    branching_factor: Option<usize>,

    /// Score below which a thought is rejected
    #[arg(long, value_name = "SCORE")]
    prune_threshold: Option<f64>,

    /// Hard cap on the number of thoughts
    #[arg(long, value_name = "N")]
    max_thoughts: Option<usize>,

    /// Disable aggregation of sibling thoughts
    #[arg(long)]
    no_aggregation: bool,

    /// Save the finished run to the database
    #[arg(long)]
    persist: bool,

    /// Print the full outcome as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum RunsCommand {
    /// List the most recent runs
    List {
        /// Maximum number of runs to show
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u32,
    },
    /// Show one run with its best thoughts
    Show {
        /// Run identifier
        run_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(1);
        }
    };

    init_logging(&config);

    let result = match cli.cmd {
        Command::Reason(args) => reason(&config, args).await,
        Command::Runs { cmd } => runs(&config, cmd).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{}", e);
            ExitCode::from(1)
        }
    }
}

/// Apply command-line overrides on top of the configured search defaults
fn search_config(defaults: &SearchConfig, args: &ReasonArgs) -> Result<SearchConfig, AppError> {
    let strategy = match &args.strategy {
        Some(name) => name
            .parse::<Strategy>()
            .map_err(|message| AppError::Config { message })?,
        None => defaults.strategy,
    };

    Ok(SearchConfig {
        strategy,
        max_depth: args.max_depth.unwrap_or(defaults.max_depth),
        branching_factor: args.branching_factor.unwrap_or(defaults.branching_factor),
        prune_threshold: args.prune_threshold.unwrap_or(defaults.prune_threshold),
        max_thoughts: args.max_thoughts.unwrap_or(defaults.max_thoughts),
        enable_aggregation: defaults.enable_aggregation && !args.no_aggregation,
    })
}

async fn reason(config: &Config, args: ReasonArgs) -> anyhow::Result<()> {
    let search = search_config(&config.search, &args)?;
    search.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        strategy = %search.strategy,
        "langbase-got starting"
    );

    let langbase = LangbaseClient::new(&config.langbase, config.request.clone())?;
    info!(base_url = %langbase.base_url(), "Ensuring graph-of-thoughts pipes exist...");
    langbase.ensure_got_pipes(&config.pipes).await?;

    let engine = GotEngine::from_config(config)?;
    let outcome = engine.reason(&args.problem, &search).await?;

    if args.persist {
        let storage = SqliteStorage::new(&config.database).await?;
        storage.save_run(&outcome).await?;
        info!(
            run_id = %outcome.graph_state.run_id,
            path = %config.database.path.display(),
            "Run saved"
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

async fn runs(config: &Config, cmd: RunsCommand) -> anyhow::Result<()> {
    let storage = SqliteStorage::new(&config.database).await?;

    match cmd {
        RunsCommand::List { limit } => {
            let runs = storage.list_runs(limit).await?;
            if runs.is_empty() {
                println!("No runs saved yet.");
            }
            for run in runs {
                print_run_line(&run);
            }
        }
        RunsCommand::Show { run_id } => {
            let run = storage
                .get_run(&run_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Run not found: {}", run_id))?;
            let thoughts = storage.get_run_thoughts(&run_id).await?;
            let edges = storage.get_run_edges(&run_id).await?;

            print_run_line(&run);
            println!("Problem: {}", run.problem);
            println!("Answer:  {}", run.answer);
            println!("Graph:   {} thoughts, {} edges", thoughts.len(), edges.len());
            println!();
            println!("{}", run.reasoning_summary);
        }
    }
    Ok(())
}

fn print_outcome(outcome: &ReasoningOutcome) {
    println!("Answer: {}", outcome.answer);
    println!("Confidence: {:.2}", outcome.confidence);
    println!("Run: {}", outcome.graph_state.run_id);
    println!();
    println!("{}", outcome.reasoning_summary);
}

fn print_run_line(run: &StoredRun) {
    println!(
        "{}  {}  {:<10}  {:.2}  {} thoughts",
        run.run_id,
        run.created_at.format("%Y-%m-%d %H:%M:%S"),
        run.strategy.to_string(),
        run.confidence,
        run.stats.total_thoughts
    );
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
