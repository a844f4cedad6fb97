//! Utilities for training neural networks.
//!
//! A `Trainer` holds a training set of input vectors and the target vectors
//! the network should reproduce for them. Each call to `run_epoch` presents
//! every example once, in a freshly shuffled order, and adjusts the network's
//! weights by [backpropagation](https://en.wikipedia.org/wiki/Backpropagation)
//! after each one. The half squared error of every response is added to a
//! running total which the caller inspects, and resets, between epochs.
//!
//! # Example
//!
//! ```
//! # use nnfit::activator::Activator;
//! # use nnfit::feed_forward::Network;
//! # use nnfit::trainer::Trainer;
//! let mut network = Network::with_seed(5);
//! network.set_num_inputs(2);
//! network.set_num_outputs(1);
//! network.set_output_unit_type(Activator::Unipolar);
//! network.connect_output(2.0).unwrap();
//!
//! // The second input is a constant bias.
//! let mut trainer = Trainer::with_seed(5);
//! trainer.add_training_example(vec![0.0, 1.0], vec![0.0]);
//! trainer.add_training_example(vec![1.0, 1.0], vec![1.0]);
//!
//! for _ in 0..1000 {
//!     trainer.run_epoch(&mut network);
//!     if trainer.network_error() < 0.01 {
//!         break;
//!     }
//!     trainer.reset_network_error();
//! }
//! assert!(trainer.network_error() < 0.01);
//! ```

use crate::connection::WeightedConnection;
use crate::error::{Error, Result};
use crate::feed_forward::Network;
use crate::utils::half_square_error;
use crate::DEFAULT_SEED;

use itertools::izip;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

/// Labelled examples: input vectors paired with their target vectors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingSet {
    inputs: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
}

impl TrainingSet {
    pub fn new() -> Self {
        TrainingSet::default()
    }

    /// Pairs `inputs` with `targets`. Returns `None` if their lengths differ.
    pub fn from_pairs(inputs: Vec<Vec<f64>>,
                      targets: Vec<Vec<f64>>)
                      -> Option<Self> {
        if inputs.len() == targets.len() {
            Some(TrainingSet { inputs, targets })
        } else {
            None
        }
    }

    /// Builds single-valued examples from a predictor column `x` and a
    /// response column `y`, dividing every value by `scale_factor`.
    ///
    /// Returns `None` if the columns differ in length or the scale factor is
    /// not positive.
    pub fn from_columns(x: &[f64], y: &[f64], scale_factor: f64) -> Option<Self> {
        if x.len() != y.len() || !(scale_factor > 0.0) {
            return None;
        }
        let inputs = x.iter().map(|&v| vec![v / scale_factor]).collect();
        let targets = y.iter().map(|&v| vec![v / scale_factor]).collect();
        Some(TrainingSet { inputs, targets })
    }

    pub fn push(&mut self, input: Vec<f64>, target: Vec<f64>) {
        self.inputs.push(input);
        self.targets.push(target);
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    pub fn targets(&self) -> &[Vec<f64>] {
        &self.targets
    }

    /// Iterates over `(input, target)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], &[f64])> {
        self.inputs
            .iter()
            .zip(self.targets.iter())
            .map(|(i, t)| (i.as_slice(), t.as_slice()))
    }
}

/// Trains a `Network` by stochastic gradient descent with momentum.
#[derive(Clone, Debug)]
pub struct Trainer {
    learning_rate: f64,
    momentum: f64,
    /// Half squared error summed since the last reset.
    network_error: f64,
    training_set: TrainingSet,
    /// Previous weight adjustments into the output layer, in weight order.
    prev_output_deltas: Vec<f64>,
    /// Previous weight adjustments into the hidden layers, last layer first.
    prev_hidden_deltas: Vec<f64>,
    /// Generator used to shuffle the training set.
    rng: ChaCha8Rng,
}

impl Default for Trainer {
    fn default() -> Self {
        Trainer::new()
    }
}

impl Trainer {
    /// Creates a new Trainer instance.
    ///
    /// The trainer is initialized with some default values. These defaults are:
    ///
    /// * A learning constant of 0.5.
    /// * No momentum.
    /// * An empty training set.
    /// * A shuffle generator seeded with the default seed.
    pub fn new() -> Self {
        Trainer::with_seed(DEFAULT_SEED)
    }

    /// Creates a new Trainer whose training set shuffles are seeded by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Trainer {
            learning_rate: 0.5,
            momentum: 0.0,
            network_error: 0.0,
            training_set: TrainingSet::new(),
            prev_output_deltas: Vec::new(),
            prev_hidden_deltas: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Sets the learning constant, the size of each gradient descent step.
    /// Non-positive values are ignored.
    pub fn set_learning_constant(&mut self, rate: f64) {
        if rate > 0.0 {
            self.learning_rate = rate;
        }
    }

    pub fn learning_constant(&self) -> f64 {
        self.learning_rate
    }

    /// Sets the fraction of each weight's previous adjustment that is added to
    /// its next one. Non-positive values are ignored; momentum stays disabled
    /// until a positive value is set.
    pub fn set_momentum(&mut self, momentum: f64) {
        if momentum > 0.0 {
            self.momentum = momentum;
        }
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    /// Returns the half squared error summed over every example presented
    /// since the last reset.
    pub fn network_error(&self) -> f64 {
        self.network_error
    }

    pub fn reset_network_error(&mut self) {
        self.network_error = 0.0;
    }

    /// Forgets the previous weight adjustments used by the momentum term.
    pub fn clear_momentum(&mut self) {
        self.prev_output_deltas.clear();
        self.prev_hidden_deltas.clear();
    }

    /// Adds a single example to the training set.
    pub fn add_training_example(&mut self, input: Vec<f64>, target: Vec<f64>) {
        self.training_set.push(input, target);
    }

    /// Replaces the whole training set.
    pub fn replace_training_set(&mut self, training_set: TrainingSet) {
        self.training_set = training_set;
    }

    pub fn training_set(&self) -> &TrainingSet {
        &self.training_set
    }

    pub fn training_set_len(&self) -> usize {
        self.training_set.len()
    }

    /// Presents every training example to `network` once, in a random order,
    /// adjusting its weights after each one.
    ///
    /// Examples that do not fit the network (too few inputs, or a target of
    /// the wrong length) are skipped.
    pub fn run_epoch(&mut self, network: &mut Network) {
        let mut order: Vec<usize> = (0..self.training_set.len()).collect();
        order.shuffle(&mut self.rng);
        for index in order {
            if self.train_example(network, index).is_none() {
                warn!("skipped training example {}: it does not fit the network",
                      index);
            }
        }
    }

    /// Runs one forward and backward pass for example `index`.
    fn train_example(&mut self, network: &mut Network, index: usize) -> Option<()> {
        let input = &self.training_set.inputs[index];
        let target = &self.training_set.targets[index];
        let num_layers = network.num_layers();

        let response = network.response(input)?;
        if response.len() != target.len() {
            return None;
        }
        self.network_error += half_square_error(&response, target);

        // Error signal on each output unit.
        let output_unit = network.output_unit();
        let unit_inputs = network.pre_activation(num_layers)?;
        let output_errors: Vec<f64> = izip!(target, &response, unit_inputs)
            .map(|(t, y, &x)| (t - y) * output_unit.gradient(x))
            .collect();

        // Computed from the current weights before any are adjusted.
        let hidden_errors = hidden_error_signals(network, &output_errors)?;

        let rate = self.learning_rate;
        let momentum = self.momentum;
        let inputs = &input[..network.num_inputs()];

        let x = stage_input(network, inputs, num_layers)?;
        let mut cursor = 0;
        adjust_weights(network.connection_mut(num_layers)?,
                       &output_errors,
                       &x,
                       rate,
                       momentum,
                       &mut self.prev_output_deltas,
                       &mut cursor);

        let mut cursor = 0;
        for layer in (0..num_layers).rev() {
            let x = stage_input(network, inputs, layer)?;
            adjust_weights(network.connection_mut(layer)?,
                           &hidden_errors[layer],
                           &x,
                           rate,
                           momentum,
                           &mut self.prev_hidden_deltas,
                           &mut cursor);
        }
        Some(())
    }
}

/// Returns the values feeding stage `n`: the network inputs for the first
/// stage, otherwise the previous stage's activations.
fn stage_input(network: &Network, inputs: &[f64], n: usize) -> Option<Vec<f64>> {
    if n == 0 {
        Some(inputs.to_vec())
    } else {
        network.post_activation(n - 1).map(|a| a.to_vec())
    }
}

/// Back-propagates `output_errors` through the hidden layers, returning the
/// error signal of every hidden unit indexed by hidden layer.
fn hidden_error_signals(network: &Network,
                        output_errors: &[f64])
                        -> Option<Vec<Vec<f64>>> {
    let num_layers = network.num_layers();
    let mut errors = vec![Vec::new(); num_layers];
    for layer in (0..num_layers).rev() {
        let downstream: &[f64] = if layer + 1 == num_layers {
            output_errors
        } else {
            &errors[layer + 1]
        };
        let connection = network.connection(layer + 1)?;
        let unit = network.layer_details(layer)?;
        let unit_inputs = network.pre_activation(layer)?;

        let num_units = connection.input_len();
        let num_connect = connection.output_len();
        if unit_inputs.len() != num_units || downstream.len() != num_connect {
            return None;
        }
        let rows = (0..num_connect)
            .map(|k| connection.weight_row(k))
            .collect::<Option<Vec<_>>>()?;

        let mut layer_errors = Vec::with_capacity(num_units);
        for j in 0..num_units {
            let gradient = unit.gradient(unit_inputs[j]);
            let mut error = 0.0;
            for k in 0..num_connect {
                error += gradient * downstream[k] * rows[k][j];
            }
            layer_errors.push(error);
        }
        errors[layer] = layer_errors;
    }
    Some(errors)
}

/// Adds `rate * error * x` to every weight of `connection`, plus `momentum`
/// times that weight's previous adjustment when momentum is enabled.
///
/// `history` holds one previous adjustment per weight, addressed by the
/// running `cursor` in row-major order.
fn adjust_weights(connection: &mut WeightedConnection,
                  errors: &[f64],
                  x: &[f64],
                  rate: f64,
                  momentum: f64,
                  history: &mut Vec<f64>,
                  cursor: &mut usize) {
    for (node, &error) in errors.iter().enumerate() {
        let mut weights = match connection.weight_row(node) {
            Some(weights) => weights,
            None => continue,
        };
        for (w, &xj) in weights.iter_mut().zip(x) {
            let mut delta = rate * error * xj;
            if momentum > 0.0 {
                match history.get_mut(*cursor) {
                    Some(previous) => {
                        delta += momentum * *previous;
                        *previous = delta;
                    }
                    None => history.push(delta),
                }
            }
            *w += delta;
            *cursor += 1;
        }
        connection.set_weight_row(node, &weights);
    }
}

/// Logging frequency to use during a fit
#[derive(Copy, Clone, Debug)]
pub enum Logging {
    /// No logs will be emitted
    Silent,
    /// A summary will be logged at completion
    Completion,
    /// A summary will be logged after every `n` epochs
    Iterations(usize),
}

impl Logging {
    /// Performs logging after `epoch`.
    fn iteration(&self, epoch: usize, error: f64) {
        if let Logging::Iterations(freq) = *self {
            if freq > 0 && epoch % freq == 0 {
                info!("epoch {}:\tnetwork error={}", epoch, error);
            }
        }
    }

    /// Performs logging at the end of a fit.
    fn completion(&self, report: &FitReport, start_time: Instant) {
        if let Logging::Silent = *self {
            return;
        }
        info!("{:?} after {} epochs in {:.3} seconds, network error {}",
              report.outcome,
              report.epochs,
              start_time.elapsed().as_secs_f64(),
              report.error);
    }
}

/// How a fit finished.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FitOutcome {
    /// The network error dropped below the target.
    Converged,
    /// The epoch budget ran out; the network holds the weights that achieved
    /// the lowest error.
    Exhausted,
}

/// The result of a successful fit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FitReport {
    pub outcome: FitOutcome,
    /// Number of epochs run.
    pub epochs: usize,
    /// The final error when converged, otherwise the lowest error seen.
    pub error: f64,
}

/// Repeatedly trains a network until it fits the training set.
#[derive(Copy, Clone, Debug)]
pub struct Fit {
    max_epochs: usize,
    min_error: f64,
    error_scale: f64,
    logging: Logging,
}

impl Default for Fit {
    fn default() -> Self {
        Fit::new()
    }
}

impl Fit {
    /// Creates a new Fit instance.
    ///
    /// The defaults are:
    ///
    /// * At most 1000 epochs.
    /// * Converges below a network error of 0.001.
    /// * Network errors are not rescaled.
    /// * Logs on completion.
    pub fn new() -> Self {
        Fit {
            max_epochs: 1000,
            min_error: 0.001,
            error_scale: 1.0,
            logging: Logging::Completion,
        }
    }

    /// Sets the epoch budget. Zero is ignored.
    pub fn max_epochs(mut self, epochs: usize) -> Self {
        if epochs > 0 {
            self.max_epochs = epochs;
        }
        self
    }

    /// Sets the scaled network error below which the fit has converged.
    /// Non-positive values are ignored.
    pub fn min_error(mut self, error: f64) -> Self {
        if error > 0.0 {
            self.min_error = error;
        }
        self
    }

    /// Multiplies each epoch's network error by `scale` before comparing it,
    /// which undoes any scaling applied to the training set. Non-positive
    /// values are ignored.
    pub fn error_scale(mut self, scale: f64) -> Self {
        if scale > 0.0 {
            self.error_scale = scale;
        }
        self
    }

    /// Sets the type of logging to be emitted during the fit.
    pub fn logging(mut self, logging: Logging) -> Self {
        self.logging = logging;
        self
    }

    /// Trains `network` one epoch at a time until its scaled error drops
    /// below the minimum or the epoch budget runs out.
    ///
    /// In the second case `network` is replaced by a copy of itself taken
    /// after the epoch with the lowest error. A non-finite error aborts the fit
    /// with `Error::Diverged`, leaving `network` in its diverged state.
    pub fn run(&self, trainer: &mut Trainer, network: &mut Network) -> Result<FitReport> {
        let start_time = Instant::now();
        let mut best: Option<Network> = None;
        let mut min_error = f64::INFINITY;

        trainer.reset_network_error();
        for epoch in 1..=self.max_epochs {
            trainer.run_epoch(network);
            let error = trainer.network_error() * self.error_scale;
            if !error.is_finite() {
                error!("network error diverged to {} at epoch {}", error, epoch);
                return Err(Error::Diverged {
                    epochs: epoch,
                    error,
                });
            }
            self.logging.iteration(epoch, error);

            if error < self.min_error {
                let report = FitReport {
                    outcome: FitOutcome::Converged,
                    epochs: epoch,
                    error,
                };
                self.logging.completion(&report, start_time);
                return Ok(report);
            }
            if error < min_error {
                best = Some(network.clone());
                min_error = error;
            }
            trainer.reset_network_error();
        }

        if let Some(best) = best {
            *network = best;
        }
        let report = FitReport {
            outcome: FitOutcome::Exhausted,
            epochs: self.max_epochs,
            error: min_error,
        };
        self.logging.completion(&report, start_time);
        Ok(report)
    }
}
