//! A [Feedforward neural network]
//! (https://en.wikipedia.org/wiki/Feedforward_neural_network).
//!
//! A network has a fixed number of input and output units and any number of
//! hidden layers. Each hidden layer, and the output layer, uses its own
//! activation function shared by all of its units.
//!
//! # Example
//!
//! Let's build a network with 2 inputs, 3 unipolar outputs and two bipolar
//! hidden layers of 4 and 6 units:
//!
//! ```
//! # use nnfit::activator::Activator;
//! # use nnfit::feed_forward::Network;
//! let mut network = Network::with_seed(1);
//! network.set_num_inputs(2);
//! network.set_num_outputs(3);
//! network.set_output_unit_type(Activator::Unipolar);
//! network.add_layer(4, Activator::Bipolar, 2.0, 1.0, 1.0).unwrap();
//! network.add_layer(6, Activator::Bipolar, 2.0, 1.0, 1.0).unwrap();
//!
//! let outputs = network.response(&[0.5, 0.2]).unwrap();
//! assert_eq!(outputs.len(), 3);
//! assert!(outputs.iter().all(|&y| y > 0.0 && y < 1.0));
//! ```

use crate::activator::{Activator, Unit};
use crate::connection::WeightedConnection;
use crate::error::{Error, Result};
use crate::utils::Back;
use crate::DEFAULT_SEED;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A Feedforward neural network
///
/// The network holds one weighted connection per layer boundary: input to
/// first hidden layer, between consecutive hidden layers, and finally from the
/// last hidden layer (or the inputs, when there are none) to the outputs.
#[derive(Clone, Debug)]
pub struct Network {
    num_inputs: usize,
    num_outputs: usize,
    /// The output layer's activation function.
    output_unit: Unit,
    /// Each hidden layer's activation function, in layer order.
    hidden_units: Vec<Unit>,
    /// The weighted connections, always `hidden_units.len() + 1` long once
    /// any stage exists.
    connections: Vec<WeightedConnection>,
    /// Unit inputs of each stage from the last forward pass.
    pre_activations: Vec<Vec<f64>>,
    /// Unit activations of each stage from the last forward pass.
    post_activations: Vec<Vec<f64>>,
    /// Generator used to initialize new weighted connections.
    rng: ChaCha8Rng,
}

impl Default for Network {
    fn default() -> Self {
        Network::new()
    }
}

impl Network {
    /// Creates an empty network whose weights are initialized from the
    /// default seed.
    pub fn new() -> Self {
        Network::with_seed(DEFAULT_SEED)
    }

    /// Creates an empty network whose weights are initialized from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Network {
            num_inputs: 0,
            num_outputs: 0,
            output_unit: Unit::default(),
            hidden_units: Vec::new(),
            connections: Vec::new(),
            pre_activations: Vec::new(),
            post_activations: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Assembles a network from already-validated parts.
    pub(crate) fn from_parts(num_inputs: usize,
                             num_outputs: usize,
                             output_unit: Unit,
                             hidden_units: Vec<Unit>,
                             connections: Vec<WeightedConnection>)
                             -> Self {
        debug_assert_eq!(connections.len(), hidden_units.len() + 1);
        Network {
            num_inputs,
            num_outputs,
            output_unit,
            hidden_units,
            connections,
            ..Network::new()
        }
    }

    /// Resets the network to its freshly constructed state, ready for re-use.
    ///
    /// The weight initialization generator carries on from where it was.
    pub fn clear(&mut self) {
        self.num_inputs = 0;
        self.num_outputs = 0;
        self.output_unit = Unit::default();
        self.hidden_units.clear();
        self.connections.clear();
        self.pre_activations.clear();
        self.post_activations.clear();
    }

    /// Sets the number of input units. Zero is ignored.
    pub fn set_num_inputs(&mut self, num_inputs: usize) {
        if num_inputs > 0 {
            self.num_inputs = num_inputs;
        }
    }

    /// Sets the number of output units. Zero is ignored.
    pub fn set_num_outputs(&mut self, num_outputs: usize) {
        if num_outputs > 0 {
            self.num_outputs = num_outputs;
        }
    }

    pub fn set_output_unit_type(&mut self, activator: Activator) {
        self.output_unit.set_activator(activator);
    }

    /// Sets the output units' slope. Non-positive values are ignored.
    pub fn set_output_unit_slope(&mut self, slope: f64) {
        self.output_unit.set_slope(slope);
    }

    /// Sets the output units' amplification. Non-positive values are ignored.
    pub fn set_output_unit_amplify(&mut self, amplify: f64) {
        self.output_unit.set_amplify(amplify);
    }

    /// Returns the number of input units.
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Returns the number of output units.
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Returns the number of hidden layers.
    pub fn num_layers(&self) -> usize {
        self.hidden_units.len()
    }

    /// Returns the output layer's activation function.
    pub fn output_unit(&self) -> Unit {
        self.output_unit
    }

    /// Returns the activation function of hidden layer `n`.
    pub fn layer_details(&self, n: usize) -> Option<Unit> {
        self.hidden_units.get(n).cloned()
    }

    /// Returns the number of weighted connections, which is one more than the
    /// number of hidden layers once the network has been wired.
    pub fn num_connections(&self) -> usize {
        self.connections.len()
    }

    /// Returns the weighted connections feeding stage `n`, where stage
    /// `num_layers()` is the output layer.
    pub fn connection(&self, n: usize) -> Option<&WeightedConnection> {
        self.connections.get(n)
    }

    pub fn connection_mut(&mut self, n: usize) -> Option<&mut WeightedConnection> {
        self.connections.get_mut(n)
    }

    /// Replaces the weighted connections feeding stage `n`. Ignored if `n` is
    /// out of range or `connection` has a different shape from the one it
    /// replaces.
    pub fn set_connection(&mut self, n: usize, connection: WeightedConnection) {
        if let Some(slot) = self.connections.get_mut(n) {
            if slot.input_len() == connection.input_len() &&
               slot.output_len() == connection.output_len() {
                *slot = connection;
            }
        }
    }

    /// Wires the inputs straight to the outputs, for a network without any
    /// hidden layers.
    ///
    /// Fails if either width is unset, the network already has connections, or
    /// `init_range` is not positive.
    pub fn connect_output(&mut self, init_range: f64) -> Result<()> {
        if !self.connections.is_empty() {
            return Err(Error::Structure("the output layer is already connected"
                .to_string()));
        }
        if self.num_outputs == 0 {
            return Err(Error::Structure("the number of outputs is not set"
                .to_string()));
        }
        let output = WeightedConnection::new(self.num_inputs,
                                             self.num_outputs,
                                             init_range,
                                             &mut self.rng)
            .ok_or_else(|| {
                Error::Structure(format!("cannot connect {} inputs to the \
                                          outputs with range {}",
                                         self.num_inputs,
                                         init_range))
            })?;
        self.connections.push(output);
        debug!("connected {} inputs directly to {} outputs",
               self.num_inputs,
               self.num_outputs);
        Ok(())
    }

    /// Adds a new hidden layer after the existing ones.
    ///
    /// Arguments:
    ///  * `num_units` - the number of units in the layer.
    ///  * `activator` - the activation function of the layer's units.
    ///  * `init_range` - new weights are drawn from
    ///                   `[-init_range/2, init_range/2]`.
    ///  * `slope` - the activation function slope.
    ///  * `amplify` - the activation function amplification.
    ///
    /// The connection into the output layer is rebuilt to start from the new
    /// layer. Fails without changing the network if any numeric argument is
    /// not positive, or if this is the first layer and the number of inputs
    /// has not been set.
    pub fn add_layer(&mut self,
                     num_units: usize,
                     activator: Activator,
                     init_range: f64,
                     slope: f64,
                     amplify: f64)
                     -> Result<()> {
        if num_units == 0 {
            return Err(Error::Structure("a layer needs at least one unit"
                .to_string()));
        }
        if !(init_range > 0.0 && slope > 0.0 && amplify > 0.0) {
            return Err(Error::Structure(format!("layer parameters must be \
                                                 positive: init range {}, \
                                                 slope {}, amplify {}",
                                                init_range,
                                                slope,
                                                amplify)));
        }
        let fan_in = if self.hidden_units.is_empty() {
            if self.num_inputs == 0 {
                return Err(Error::Structure("the number of inputs must be set \
                                             before the first layer is added"
                    .to_string()));
            }
            self.num_inputs
        } else {
            // The output-facing connection starts at the last hidden layer.
            self.connections.back().input_len()
        };
        let connect = WeightedConnection::new(fan_in,
                                              num_units,
                                              init_range,
                                              &mut self.rng)
            .ok_or_else(|| Error::Structure("cannot build the layer's weights"
                .to_string()))?;
        let output = WeightedConnection::new(num_units,
                                             self.num_outputs,
                                             init_range,
                                             &mut self.rng)
            .ok_or_else(|| Error::Structure("the number of outputs must be \
                                             set before adding a layer"
                .to_string()))?;

        // The previous output-facing connection now feeds the new layer.
        match self.connections.last_mut() {
            Some(last) => *last = connect,
            None => self.connections.push(connect),
        }
        self.connections.push(output);
        self.hidden_units.push(Unit::new(activator, slope, amplify));
        debug!("added hidden layer {} with {} {} units",
               self.hidden_units.len(),
               num_units,
               activator);
        Ok(())
    }

    /// Returns the activation function used by stage `n`.
    fn stage_unit(&self, n: usize) -> Unit {
        match self.hidden_units.get(n) {
            Some(unit) => *unit,
            None => self.output_unit,
        }
    }

    /// Feeds `inputs` forward through the network, returning the output
    /// layer's activations.
    ///
    /// Only the first `num_inputs()` values are used. Returns `None`, leaving
    /// the cached activations untouched, if fewer values are provided or the
    /// network has no connections.
    pub fn response(&mut self, inputs: &[f64]) -> Option<Vec<f64>> {
        if inputs.len() < self.num_inputs || self.connections.is_empty() {
            return None;
        }
        self.pre_activations.clear();
        self.post_activations.clear();

        let mut signal = inputs[..self.num_inputs].to_vec();
        for n in 0..self.connections.len() {
            let unit = self.stage_unit(n);
            let connection = &mut self.connections[n];
            connection.set_inputs(&signal);
            let unit_inputs = connection.outputs();
            signal = unit_inputs.iter().map(|&x| unit.activation(x)).collect();
            self.pre_activations.push(unit_inputs);
            self.post_activations.push(signal.clone());
        }
        Some(signal)
    }

    /// Returns the unit inputs of stage `n` from the last call to `response`,
    /// where stage `num_layers()` is the output layer.
    pub fn pre_activation(&self, n: usize) -> Option<&[f64]> {
        self.pre_activations.get(n).map(|v| v.as_slice())
    }

    /// Returns the unit activations of stage `n` from the last call to
    /// `response`, where stage `num_layers()` is the output layer.
    pub fn post_activation(&self, n: usize) -> Option<&[f64]> {
        self.post_activations.get(n).map(|v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(hidden: &[usize]) -> Network {
        let mut network = Network::with_seed(3);
        network.set_num_inputs(2);
        network.set_num_outputs(1);
        network.set_output_unit_type(Activator::Unipolar);
        for &units in hidden {
            network.add_layer(units, Activator::Tanh, 2.0, 1.0, 1.0).unwrap();
        }
        network
    }

    #[test]
    fn layers_rewire_the_output_connection() {
        let network = network(&[4, 6]);
        assert_eq!(network.num_layers(), 2);
        assert_eq!(network.num_connections(), 3);
        let shapes: Vec<_> = (0..3)
            .map(|n| {
                let c = network.connection(n).unwrap();
                (c.input_len(), c.output_len())
            })
            .collect();
        assert_eq!(shapes, vec![(2, 4), (4, 6), (6, 1)]);
    }

    #[test]
    fn empty_layer_is_rejected() {
        let mut network = network(&[3]);
        let before = network.connection(1).unwrap().weight_row(0);
        assert!(network.add_layer(0, Activator::Tanh, 2.0, 1.0, 1.0).is_err());
        assert!(network.add_layer(2, Activator::Tanh, 0.0, 1.0, 1.0).is_err());
        assert!(network.add_layer(2, Activator::Tanh, 2.0, -1.0, 1.0).is_err());
        assert!(network.add_layer(2, Activator::Tanh, 2.0, 1.0, 0.0).is_err());
        assert_eq!(network.num_layers(), 1);
        assert_eq!(network.num_connections(), 2);
        assert_eq!(network.connection(1).unwrap().weight_row(0), before);
    }

    #[test]
    fn first_layer_needs_inputs() {
        let mut network = Network::new();
        network.set_num_outputs(1);
        assert!(network.add_layer(3, Activator::Tanh, 2.0, 1.0, 1.0).is_err());
        assert_eq!(network.num_connections(), 0);
    }

    #[test]
    fn response_caches_every_stage() {
        let mut network = network(&[3, 2]);
        let outputs = network.response(&[0.25, -0.5, 99.0]).unwrap();
        assert_eq!(outputs.len(), 1);
        for n in 0..3 {
            let unit = if n < 2 {
                network.layer_details(n).unwrap()
            } else {
                network.output_unit()
            };
            let pre = network.pre_activation(n).unwrap();
            let post = network.post_activation(n).unwrap();
            assert_eq!(pre.len(), post.len());
            for (&x, &y) in pre.iter().zip(post) {
                assert_eq!(unit.activation(x), y);
            }
        }
        assert_eq!(network.post_activation(2).unwrap(), &outputs[..]);
        assert!(network.pre_activation(3).is_none());
    }

    #[test]
    fn response_is_deterministic() {
        let mut network = network(&[5]);
        let first = network.response(&[0.1, 0.9]).unwrap();
        let second = network.response(&[0.1, 0.9]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn short_input_is_a_no_op() {
        let mut network = network(&[2]);
        let outputs = network.response(&[0.3, 0.3]).unwrap();
        assert!(network.response(&[0.3]).is_none());
        assert_eq!(network.post_activation(1).unwrap(), &outputs[..]);
        assert!(Network::new().response(&[1.0]).is_none());
    }

    #[test]
    fn direct_output_connection() {
        let mut network = network(&[]);
        network.connect_output(2.0).unwrap();
        assert!(network.connect_output(2.0).is_err());
        assert_eq!(network.num_connections(), 1);
        let outputs = network.response(&[1.0, 2.0]).unwrap();
        let pre = network.pre_activation(0).unwrap()[0];
        assert_eq!(outputs, vec![Activator::Unipolar.f(1.0, 1.0, pre)]);

        // Adding a layer re-points the direct connection at the new layer.
        network.add_layer(3, Activator::Sin, 2.0, 1.0, 1.0).unwrap();
        assert_eq!(network.num_connections(), 2);
        assert_eq!(network.connection(0).unwrap().output_len(), 3);
        assert_eq!(network.connection(1).unwrap().input_len(), 3);
    }

    #[test]
    fn set_connection_keeps_the_shape() {
        let mut network = network(&[3]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let before = network.connection(0).unwrap().weight_row(0);

        let wrong = WeightedConnection::new(2, 2, 2.0, &mut rng).unwrap();
        network.set_connection(0, wrong);
        assert_eq!(network.connection(0).unwrap().output_len(), 3);
        assert_eq!(network.connection(0).unwrap().weight_row(0), before);

        let right = WeightedConnection::from_rows(2, 3, vec![0.5; 6]).unwrap();
        network.set_connection(0, right);
        assert_eq!(network.connection(0).unwrap().weight_row(2), Some(vec![0.5, 0.5]));
        network.set_connection(7, WeightedConnection::from_rows(2, 3, vec![0.0; 6])
            .unwrap());
        assert_eq!(network.num_connections(), 2);
    }

    #[test]
    fn setters_ignore_invalid_values() {
        let mut network = network(&[]);
        network.set_num_inputs(0);
        network.set_num_outputs(0);
        network.set_output_unit_slope(-1.0);
        network.set_output_unit_amplify(0.0);
        assert_eq!(network.num_inputs(), 2);
        assert_eq!(network.num_outputs(), 1);
        assert_eq!(network.output_unit().slope(), 1.0);
        assert_eq!(network.output_unit().amplify(), 1.0);
        assert!(network.layer_details(0).is_none());
    }

    #[test]
    fn same_seed_same_weights() {
        let a = network(&[4]);
        let b = network(&[4]);
        for n in 0..2 {
            assert_eq!(a.connection(n).unwrap().weight_row(0),
                       b.connection(n).unwrap().weight_row(0));
        }
    }

    #[test]
    fn clear_resets_structure() {
        let mut network = network(&[4]);
        network.response(&[0.0, 0.0]).unwrap();
        network.clear();
        assert_eq!(network.num_inputs(), 0);
        assert_eq!(network.num_layers(), 0);
        assert_eq!(network.num_connections(), 0);
        assert!(network.pre_activation(0).is_none());
        assert_eq!(network.output_unit(), Unit::default());
    }
}
