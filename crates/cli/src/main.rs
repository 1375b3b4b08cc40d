//! Vehicle maintenance cost CLI
//!
//! Generates synthetic fleet data, trains the cost model, and talks to the
//! prediction server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{data, predict, settings, train};
use maintenance_lib::{
    generator::{GenerationConfig, DEFAULT_FLEET_SIZE, DEFAULT_NUM_SAMPLES, DEFAULT_SEED},
    models::{DrivingCondition, EngineType, Make, OilLevel, DEFAULT_CURRENT_YEAR},
    predictor::PredictionInput,
    training::{ForestParams, TrainingConfig, TrainingOutputs, DEFAULT_SAMPLE_ROWS},
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATA_PATH: &str = "vehicle_maintenance_data.csv";
const DEFAULT_MODEL_PATH: &str = "model/vehicle_maintenance_model.json";
const DEFAULT_SAMPLE_PATH: &str = "visualizations/sample_data.csv";

/// Vehicle maintenance cost CLI
#[derive(Parser)]
#[command(name = "vmms")]
#[command(author, version, about = "CLI for vehicle maintenance cost estimation", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via VMMS_API_URL env var or `vmms config set-api-url`)
    #[arg(long, env = "VMMS_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format (defaults to the configured format, else table)
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a synthetic maintenance dataset as CSV
    Generate {
        /// Number of observations
        #[arg(long, default_value_t = DEFAULT_NUM_SAMPLES)]
        samples: usize,

        /// Number of vehicles in the fleet
        #[arg(long, default_value_t = DEFAULT_FLEET_SIZE)]
        fleet_size: usize,

        /// Random seed
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Year from which vehicle age is derived
        #[arg(long, default_value_t = DEFAULT_CURRENT_YEAR)]
        current_year: i32,

        /// Replace random noise by its expected value
        #[arg(long)]
        noise_free: bool,

        /// Output CSV path
        #[arg(long, short, default_value = DEFAULT_DATA_PATH)]
        output: PathBuf,
    },

    /// Print summary statistics of a dataset CSV
    Stats {
        /// Dataset CSV path
        #[arg(default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,
    },

    /// Train the cost model on a dataset CSV
    Train {
        /// Dataset CSV path
        #[arg(long, default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,

        /// Where to write the model artifact
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model_out: PathBuf,

        /// Where to write the visualization sample
        #[arg(long, default_value = DEFAULT_SAMPLE_PATH)]
        sample_out: PathBuf,

        /// Rows in the visualization sample
        #[arg(long, default_value_t = DEFAULT_SAMPLE_ROWS)]
        sample_rows: usize,

        /// Number of trees
        #[arg(long, default_value_t = 100)]
        trees: usize,

        /// Maximum tree depth (0 for unlimited)
        #[arg(long, default_value_t = 20)]
        max_depth: usize,

        /// Minimum samples required to split a node
        #[arg(long, default_value_t = 5)]
        min_samples_split: usize,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,

        /// Random seed of the split, the bootstrap and the sample export
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },

    /// Request a cost estimate from the server
    Predict(PredictArgs),

    /// Show recent predictions stored by the server
    History {
        /// Number of predictions to show
        #[arg(long, short, default_value_t = 20)]
        limit: usize,
    },

    /// Inspect or change persisted CLI defaults
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(clap::Args)]
pub struct PredictArgs {
    /// Toyota, Honda, Ford, Chevrolet, BMW or Tesla
    #[arg(long)]
    pub make: Make,

    #[arg(long)]
    pub model_year: i32,

    /// gas, diesel or electric
    #[arg(long)]
    pub engine_type: EngineType,

    #[arg(long)]
    pub mileage: f64,

    /// city, highway or mixed
    #[arg(long)]
    pub driving_condition: DrivingCondition,

    /// Days between scheduled services
    #[arg(long)]
    pub service_interval: u32,

    #[arg(long)]
    pub days_since_service: u32,

    /// Low, Medium, High or N/A
    #[arg(long)]
    pub oil_level: OilLevel,

    /// PSI
    #[arg(long)]
    pub tire_pressure: f64,

    /// Percent
    #[arg(long)]
    pub brake_wear: f64,

    #[arg(long, default_value_t = 0)]
    pub fault_codes: u32,
}

impl From<PredictArgs> for PredictionInput {
    fn from(args: PredictArgs) -> Self {
        Self {
            make: args.make,
            model_year: args.model_year,
            engine_type: args.engine_type,
            mileage: args.mileage,
            driving_condition: args.driving_condition,
            service_interval: args.service_interval,
            days_since_service: args.days_since_service,
            oil_level: args.oil_level,
            tire_pressure: args.tire_pressure,
            brake_wear: args.brake_wear,
            fault_codes: args.fault_codes,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the stored configuration
    Show,

    /// Set the default API URL
    SetApiUrl {
        url: String,
    },

    /// Set the default output format
    SetFormat {
        #[arg(value_name = "FORMAT")]
        value: output::OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_writer(std::io::stderr)
            .init();
    }

    let config = config::Config::load()?;
    let format = config.resolve_format(cli.format);
    let api_url = config.resolve_api_url(cli.api_url.as_deref());

    match cli.command {
        Commands::Generate {
            samples,
            fleet_size,
            seed,
            current_year,
            noise_free,
            output,
        } => {
            let generation = GenerationConfig {
                fleet_size,
                num_samples: samples,
                seed,
                current_year,
                noise_free,
            };
            data::generate(&generation, &output, format)?;
        }
        Commands::Stats { data: path } => {
            data::stats(&path, format)?;
        }
        Commands::Train {
            data,
            model_out,
            sample_out,
            sample_rows,
            trees,
            max_depth,
            min_samples_split,
            test_size,
            seed,
        } => {
            let training = TrainingConfig {
                test_size,
                seed,
                forest: ForestParams {
                    n_estimators: trees,
                    max_depth: (max_depth > 0).then_some(max_depth),
                    min_samples_split,
                    seed,
                    ..Default::default()
                },
                sample_rows,
            };
            let outputs = TrainingOutputs {
                model_path: model_out,
                sample_path: sample_out,
            };
            train::train(data, outputs, training, format).await?;
        }
        Commands::Predict(args) => {
            let client = client::ApiClient::new(&api_url)?;
            predict::predict(&client, &args.into(), format).await?;
        }
        Commands::History { limit } => {
            let client = client::ApiClient::new(&api_url)?;
            predict::history(&client, limit, format).await?;
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show => settings::show(&config, format)?,
            ConfigCommands::SetApiUrl { url } => settings::set_api_url(config, &url)?,
            ConfigCommands::SetFormat { value } => settings::set_format(config, value)?,
        },
    }

    Ok(())
}
