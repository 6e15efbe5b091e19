//! Onion or Not: classify headlines as satire or real news.

mod config;
mod dataset;
mod error;
mod lemmatizer;
mod logistic;
mod naive_bayes;
mod normalize;
mod pipeline;
mod shell;
mod stopwords;
mod tagger;
mod tfidf;
mod tokenize;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::dataset::Dataset;
use crate::pipeline::{FittedModel, NaiveBayesModel, Pipeline};

const INFORMATIVE_FEATURES: usize = 10;

#[derive(Parser)]
#[command(name = "onion-or-not")]
#[command(about = "Tell Onion headlines from real ones that only sound like the Onion")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// TOML config file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Dataset URL or CSV path (overrides the config).
    #[arg(long, short)]
    data: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the page UI.
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Fit both models and report test accuracy.
    Evaluate,

    /// Classify one headline.
    Predict {
        /// lr (logistic regression) or nb (naive bayes).
        #[arg(long, short, default_value = "lr")]
        model: String,

        headline: String,
    },

    /// Print the cleaned lemmas of a text.
    Normalize { text: String },

    /// Balance a raw dataset by downsampling the larger class.
    Resample {
        #[arg(long, short)]
        input: String,

        #[arg(long, short)]
        output: PathBuf,

        #[arg(long, short, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(data) = cli.data {
        config.data.source = data;
    }

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_serve(config)?;
        }
        Command::Evaluate => run_evaluate(&config)?,
        Command::Predict { model, headline } => run_predict(&config, &model, &headline)?,
        Command::Normalize { text } => {
            let normalizer = pipeline::shared_normalizer();
            let lemmas = pipeline::normalize_text(&normalizer, &text);
            println!("{}", lemmas.join(" "));
        }
        Command::Resample {
            input,
            output,
            seed,
        } => run_resample(&input, &output, seed)?,
    }
    Ok(())
}

fn load_dataset(config: &Config) -> anyhow::Result<Dataset> {
    Dataset::load(&config.data.source)
        .with_context(|| format!("failed to load dataset from {}", config.data.source))
}

fn run_evaluate(config: &Config) -> anyhow::Result<()> {
    let dataset = load_dataset(config)?;
    let normalizer = pipeline::shared_normalizer();
    for pipeline in Pipeline::ALL {
        let model = FittedModel::fit(pipeline, &dataset, config, &normalizer)?;
        println!(
            "{}: accuracy on test set {}%",
            model.pipeline().title(),
            model.accuracy_percent()
        );
        if let FittedModel::NaiveBayes(nb) = &model {
            print_informative_features(nb);
        }
    }
    Ok(())
}

fn print_informative_features(model: &NaiveBayesModel) {
    println!("Most informative features:");
    for feature in model.most_informative_features(INFORMATIVE_FEATURES) {
        println!(
            "  {:>20} = present   {:>9} : {:<9} = {:.1} : 1.0",
            feature.name,
            feature.label.as_u8(),
            1 - feature.label.as_u8(),
            feature.ratio
        );
    }
}

fn run_predict(config: &Config, model: &str, headline: &str) -> anyhow::Result<()> {
    let kind: Pipeline = model.parse()?;
    let dataset = load_dataset(config)?;
    let model = FittedModel::fit(kind, &dataset, config, &pipeline::shared_normalizer())?;
    let label = model.predict(headline)?;
    println!("{}", label.verdict());
    Ok(())
}

fn run_resample(input: &str, output: &Path, seed: u64) -> anyhow::Result<()> {
    let raw = Dataset::load(input).with_context(|| format!("failed to load {input}"))?;
    let balanced = raw.resample(seed)?;
    balanced
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Resampled {} rows to {} ({} per class), saved to {:?}",
        raw.len(),
        balanced.len(),
        balanced.len() / 2,
        output
    );
    Ok(())
}

fn run_serve(config: Config) -> anyhow::Result<()> {
    let dataset = load_dataset(&config)?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = shell::app_state(dataset, config);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(async {
        let app = axum::Router::new()
            .route("/", axum::routing::get(shell::index_page))
            .route("/end", axum::routing::get(shell::end_session))
            .route("/api/predict", axum::routing::get(shell::api_predict))
            .with_state(state);

        info!("Listening on http://{}", addr);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok::<(), anyhow::Error>(())
    })?;
    Ok(())
}
