use std::{
    fs,
    num::NonZeroU32,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use fedavg::{
    aggregation::{ClientReport, MetricAggregator, MissingMetricPolicy, WeightedAverage},
    configs::BaseConfig,
    coordinator::History,
    records::read_records_from_path,
    report::{RunSummary, SummaryRow, append_summary_row},
    schedule::{self, RoundConfigProvider},
    sweep::{CommandRunner, SearchSpace, Sweep},
};

#[derive(Parser)]
#[command(author, version, about = "FedAvg round scheduling, metric aggregation and sweeps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    Intersection,
    ZeroFill,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the config every round would hand to the clients, one JSON per line.
    Schedule {
        #[arg(short, long)]
        config: PathBuf,

        /// Space separated `key=value` overrides.
        #[arg(long, default_value = "")]
        run_config: String,

        /// Defaults to num-server-rounds.
        #[arg(long)]
        rounds: Option<NonZeroU32>,
    },

    /// Aggregates a JSON array of client reports.
    Aggregate {
        #[arg(short, long)]
        reports: PathBuf,

        #[arg(long, value_enum, default_value_t = Policy::Intersection)]
        policy: Policy,

        /// Metrics every report must carry; overrides --policy.
        #[arg(long)]
        require: Vec<String>,
    },

    /// Summarizes a run's records and appends the row to the summary CSV.
    Summarize {
        #[arg(long)]
        records: PathBuf,

        #[arg(short, long)]
        config: PathBuf,

        #[arg(long, default_value = "")]
        run_config: String,

        #[arg(long, default_value = "out-put/results_summary.csv")]
        csv: PathBuf,

        #[arg(long, default_value = "accuracy")]
        accuracy_metric: String,
    },

    /// Random hyperparameter search, one external training run per trial.
    Sweep {
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long, default_value_t = 10)]
        trials: usize,

        #[arg(short, long, default_value = "out-put")]
        out: PathBuf,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value = "accuracy")]
        accuracy_metric: String,

        /// The training command, e.g. `-- flwr run .`
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

fn load_config(path: &Path, run_config: &str) -> Result<BaseConfig> {
    let config = BaseConfig::from_path(path)
        .with_context(|| format!("loading config '{}'", path.display()))?;
    Ok(config.with_overrides(run_config)?)
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Commands::Schedule {
            config,
            run_config,
            rounds,
        } => {
            let config = load_config(&config, &run_config)?;
            let provider = schedule::from_config(&config);
            let rounds = rounds.unwrap_or(config.num_server_rounds);

            for round in (1..=rounds.get()).filter_map(NonZeroU32::new) {
                println!("{}", serde_json::to_string(&provider.configure(round))?);
            }
        }
        Commands::Aggregate {
            reports,
            policy,
            require,
        } => {
            let content = fs::read_to_string(&reports)
                .with_context(|| format!("reading '{}'", reports.display()))?;
            let reports: Vec<ClientReport> = serde_json::from_str(&content)?;

            let aggregator = if require.is_empty() {
                WeightedAverage::new(match policy {
                    Policy::Intersection => MissingMetricPolicy::Intersection,
                    Policy::ZeroFill => MissingMetricPolicy::ZeroFill,
                })
            } else {
                WeightedAverage::require(require)
            };

            let metrics = aggregator.aggregate(&reports)?;
            println!("{}", serde_json::to_string(&metrics)?);
        }
        Commands::Summarize {
            records,
            config,
            run_config,
            csv,
            accuracy_metric,
        } => {
            let config = load_config(&config, &run_config)?;
            let records = read_records_from_path(&records)
                .with_context(|| format!("reading records '{}'", records.display()))?;
            let history = History::from_records(&records);
            let summary = RunSummary::from_history(&history, &accuracy_metric)?;

            info!(
                "best loss {:.4} (round {}), best accuracy {:.4} (round {})",
                summary.best_loss, summary.best_loss_round, summary.best_acc, summary.best_acc_round
            );
            append_summary_row(&csv, &SummaryRow::from_config(&config, summary))?;
        }
        Commands::Sweep {
            config,
            trials,
            out,
            seed,
            accuracy_metric,
            command,
        } => {
            let config = load_config(&config, "")?;
            let runner = CommandRunner::from_command_line(command)?;
            let mut sweep = Sweep::new(runner, SearchSpace::default(), config, out, seed)
                .with_accuracy_metric(accuracy_metric);

            let results = sweep.run(trials)?;
            info!(
                "{} trial(s) done, summary at {}",
                results.len(),
                sweep.summary_path().display()
            );
        }
    }

    Ok(())
}
