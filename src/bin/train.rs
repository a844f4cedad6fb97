//! Fits a one hidden layer network to two columns of a CSV file.
//!
//! ```text
//! nnfit-train <data.csv> [config.json]
//! ```
//!
//! Every configuration field is optional. The trained model is written to
//! `model_path`, and `results_path` receives one `x,y,model` line per
//! training example in the data's original units. Set `RUST_LOG=info` to
//! follow the fit.

extern crate nnfit;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

use nnfit::activator::Activator;
use nnfit::feed_forward::Network;
use nnfit::table::DataTable;
use nnfit::trainer::{Fit, FitOutcome, Logging, Trainer, TrainingSet};
use nnfit::{Error, Result};

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FitConfig {
    header: bool,
    x_column: String,
    y_column: String,
    scale_factor: f64,
    hidden_units: usize,
    hidden_activator: Activator,
    hidden_slope: f64,
    hidden_amplify: f64,
    output_activator: Activator,
    output_slope: f64,
    output_amplify: f64,
    init_range: f64,
    learning_constant: f64,
    momentum: f64,
    max_epochs: usize,
    min_error: f64,
    seed: u64,
    log_every: usize,
    model_path: PathBuf,
    results_path: PathBuf,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            header: true,
            x_column: "x".to_string(),
            y_column: "y".to_string(),
            scale_factor: 1000.0,
            hidden_units: 4,
            hidden_activator: Activator::Tanh,
            hidden_slope: 1.0,
            hidden_amplify: 1.0,
            output_activator: Activator::Linear,
            output_slope: 1.0,
            output_amplify: 1.0,
            init_range: 2.0,
            learning_constant: 0.01,
            momentum: 0.0,
            max_epochs: 1000,
            min_error: 5.0,
            seed: nnfit::DEFAULT_SEED,
            log_every: 100,
            model_path: PathBuf::from("model.txt"),
            results_path: PathBuf::from("results.csv"),
        }
    }
}

impl FitConfig {
    fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path)?;
                Ok(serde_json::from_str::<FitConfig>(&text)?)
            }
            None => Ok(FitConfig::default()),
        }
    }
}

/// Finds a column by name, or by index when the table has no header.
fn column(table: &DataTable, name: &str) -> Result<usize> {
    if let Some(col) = table.column_index(name) {
        return Ok(col);
    }
    match name.parse::<usize>() {
        Ok(col) if col < table.num_cols() => Ok(col),
        _ => Err(Error::Table(format!("no column {:?}", name))),
    }
}

fn build_network(config: &FitConfig) -> Result<Network> {
    let mut network = Network::with_seed(config.seed);
    network.set_num_inputs(1);
    network.set_num_outputs(1);
    network.set_output_unit_type(config.output_activator);
    network.set_output_unit_slope(config.output_slope);
    network.set_output_unit_amplify(config.output_amplify);
    network.add_layer(config.hidden_units,
                      config.hidden_activator,
                      config.init_range,
                      config.hidden_slope,
                      config.hidden_amplify)?;
    Ok(network)
}

fn write_results(config: &FitConfig,
                 training_set: &TrainingSet,
                 network: &mut Network)
                 -> Result<()> {
    let mut out = BufWriter::new(File::create(&config.results_path)?);
    writeln!(out, "x,y,model")?;
    for (input, target) in training_set.iter() {
        let model = network.response(input).unwrap_or_default();
        writeln!(out,
                 "{},{},{}",
                 input[0] * config.scale_factor,
                 target[0] * config.scale_factor,
                 model.first().map_or(f64::NAN, |y| y * config.scale_factor))?;
    }
    out.flush()?;
    Ok(())
}

fn run(data: &str, config: Option<&str>) -> Result<()> {
    let config = FitConfig::load(config)?;
    debug!("{:?}", config);

    let mut table = DataTable::read_from_file(data, config.header)?;
    let x_col = column(&table, &config.x_column)?;
    let y_col = column(&table, &config.y_column)?;
    let x = table.numeric_column(x_col)?;
    let y = table.numeric_column(y_col)?;
    let training_set = TrainingSet::from_columns(&x, &y, config.scale_factor)
        .ok_or_else(|| {
            Error::Table(format!("invalid scale factor {}", config.scale_factor))
        })?;
    info!("training on {} examples from {}", training_set.len(), data);

    let mut network = build_network(&config)?;
    let mut trainer = Trainer::with_seed(config.seed);
    trainer.set_learning_constant(config.learning_constant);
    trainer.set_momentum(config.momentum);
    trainer.replace_training_set(training_set.clone());

    let report = Fit::new()
        .max_epochs(config.max_epochs)
        .min_error(config.min_error)
        .error_scale(config.scale_factor)
        .logging(Logging::Iterations(config.log_every))
        .run(&mut trainer, &mut network)?;
    match report.outcome {
        FitOutcome::Converged => {
            println!("converged after {} epochs, network error {}",
                     report.epochs,
                     report.error)
        }
        FitOutcome::Exhausted => {
            println!("stopped after {} epochs, minimum network error {}",
                     report.epochs,
                     report.error)
        }
    }

    network.write_to_file(&config.model_path)?;
    write_results(&config, &training_set, &mut network)?;
    info!("wrote {} and {}",
          config.model_path.display(),
          config.results_path.display());
    Ok(())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        let program = args.first().map_or("nnfit-train", |s| s.as_str());
        eprintln!("usage: {} <data.csv> [config.json]", program);
        process::exit(2);
    }
    if let Err(e) = run(&args[1], args.get(2).map(|s| s.as_str())) {
        error!("{}", e);
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
