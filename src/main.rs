use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use recast::{
    init_tracing, AccuracyEvaluator, ArEstimator, ArimaParams, Config, Dataset, ForecastModel,
    RecommenderEngine, Strategy,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Overrides `runtime.log_level`; `RUST_LOG` overrides both.
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank items for a user from a JSON dataset.
    Recommend {
        #[arg(short, long)]
        dataset: PathBuf,

        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        k: Option<usize>,

        #[arg(short, long, value_enum, default_value_t = StrategyArg::All)]
        strategy: StrategyArg,
    },
    /// Forecast a JSON array of numbers.
    Forecast {
        #[arg(short, long)]
        series: PathBuf,

        #[arg(long)]
        steps: Option<usize>,

        #[arg(long)]
        p: Option<usize>,

        #[arg(long)]
        d: Option<usize>,

        #[arg(long)]
        q: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        /// Fit AR coefficients by least squares instead of the fixed heuristic.
        #[arg(long)]
        least_squares: bool,

        /// Add a hold-out accuracy score to the output.
        #[arg(long)]
        evaluate: bool,
    },
    /// Top-rated items in a JSON dataset.
    Stats {
        #[arg(short, long)]
        dataset: PathBuf,

        #[arg(short, long)]
        k: Option<usize>,

        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    User,
    Item,
    Hybrid,
    All,
}

impl StrategyArg {
    fn strategy(self) -> Option<Strategy> {
        match self {
            StrategyArg::User => Some(Strategy::UserBased),
            StrategyArg::Item => Some(Strategy::ItemBased),
            StrategyArg::Hybrid => Some(Strategy::Hybrid),
            StrategyArg::All => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationView<'a> {
    item_id: &'a str,
    name: &'a str,
    category: &'a str,
    score: f64,
    reason: &'a str,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_found = Path::new(&args.config).exists();
    let mut config = if config_found {
        Config::from_file(&args.config)
            .with_context(|| format!("failed to load config from {}", args.config))?
    } else {
        Config::default()
    };

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.runtime.log_level.clone());
    init_tracing(&log_level);

    if !config_found {
        info!("Config file {} not found, using default configuration", args.config);
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.runtime.workers)
        .build_global()
        .context("failed to size the worker pool")?;

    match args.command {
        Command::Recommend {
            dataset,
            user,
            k,
            strategy,
        } => {
            let dataset: Dataset = read_json(&dataset)?;
            let engine =
                RecommenderEngine::from_dataset(dataset, config.recommendation.duplicate_policy)?;
            let k = k.unwrap_or(config.recommendation.top_k);

            match strategy.strategy() {
                Some(strategy) => {
                    let recommendations = engine.recommend(strategy, &user, k);
                    let store = engine.store();
                    let views: Vec<RecommendationView> = recommendations
                        .iter()
                        .map(|rec| {
                            let item = store.item(&rec.item_id);
                            RecommendationView {
                                item_id: &rec.item_id,
                                name: item.map_or("Unknown Item", |i| i.name.as_str()),
                                category: item.map_or("Unknown", |i| i.category.as_str()),
                                score: rec.score,
                                reason: &rec.reason,
                            }
                        })
                        .collect();
                    print_json(&views)?;
                }
                None => print_json(&engine.recommendation_set(&user, k))?,
            }
        }
        Command::Forecast {
            series,
            steps,
            p,
            d,
            q,
            seed,
            least_squares,
            evaluate,
        } => {
            let series: Vec<f64> = read_json(&series)?;
            let forecasting = &mut config.forecasting;
            forecasting.p = p.unwrap_or(forecasting.p);
            forecasting.d = d.unwrap_or(forecasting.d);
            forecasting.q = q.unwrap_or(forecasting.q);
            forecasting.seed = seed.or(forecasting.seed);
            let steps = steps.unwrap_or(forecasting.steps);

            let estimator = if least_squares {
                ArEstimator::LeastSquares
            } else {
                ArEstimator::Heuristic
            };
            let model = ForecastModel::from_config(Vec::new(), &config.forecasting)?
                .with_estimator(estimator);
            info!(
                "Forecasting {} steps with {}",
                steps,
                ArimaParams::new(config.forecasting.p, config.forecasting.d, config.forecasting.q)
            );

            if evaluate {
                let evaluator =
                    AccuracyEvaluator::with_model(model, config.evaluation.train_ratio)?;
                print_json(&evaluator.report(&series, steps))?;
            } else {
                print_json(&model.with_series(series).forecast(steps))?;
            }
        }
        Command::Stats {
            dataset,
            k,
            category,
        } => {
            let dataset: Dataset = read_json(&dataset)?;
            let engine =
                RecommenderEngine::from_dataset(dataset, config.recommendation.duplicate_policy)?;
            let k = k.unwrap_or(config.recommendation.top_k);
            print_json(&engine.store().top_rated_items(k, category.as_deref()))?;
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
