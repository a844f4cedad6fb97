use ndarray::{Array1, Array2, ArrayView1};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// The weighted connections linking one layer of a network to the next.
///
/// Every input node is connected to every output node. The value of an output
/// node is the sum of the input node values, each multiplied by the weight of
/// its connection to that output node.
///
/// Weights are stored with one row per output node, so row `i` holds the
/// weights of every input node's connection to output node `i`.
#[derive(Clone, Debug, Default)]
pub struct WeightedConnection {
    /// The connection weights, shaped `(outputs, inputs)`.
    weights: Array2<f64>,
    /// The most recently set input node values.
    inputs: Array1<f64>,
}

impl WeightedConnection {
    /// Creates a connection between `inputs` input nodes and `outputs` output
    /// nodes, with weights drawn uniformly from `[-init_range/2, init_range/2]`.
    ///
    /// Returns `None` if any argument is not positive.
    pub fn new<R: Rng>(inputs: usize,
                       outputs: usize,
                       init_range: f64,
                       rng: &mut R)
                       -> Option<Self> {
        let mut connection = WeightedConnection::default();
        connection.set_node_counts(inputs, outputs, init_range, rng);
        if connection.output_len() == 0 {
            None
        } else {
            Some(connection)
        }
    }

    /// Builds a connection from row-major weights: all of output node 0's
    /// weights, then all of output node 1's, and so on.
    ///
    /// Returns `None` if `weights` does not hold `inputs * outputs` values or
    /// either count is zero.
    pub fn from_rows(inputs: usize,
                     outputs: usize,
                     weights: Vec<f64>)
                     -> Option<Self> {
        if inputs == 0 || outputs == 0 {
            return None;
        }
        let weights = Array2::from_shape_vec((outputs, inputs), weights).ok()?;
        Some(WeightedConnection {
            weights,
            inputs: Array1::zeros(inputs),
        })
    }

    /// Resizes the connection and randomly reinitializes every weight over
    /// `[-init_range/2, init_range/2]`.
    ///
    /// Ignored unless all of `inputs`, `outputs` and `init_range` are
    /// positive.
    pub fn set_node_counts<R: Rng>(&mut self,
                                   inputs: usize,
                                   outputs: usize,
                                   init_range: f64,
                                   rng: &mut R) {
        if inputs == 0 || outputs == 0 || !(init_range > 0.0) ||
           !init_range.is_finite() {
            return;
        }
        let half = init_range / 2.0;
        let range = Uniform::new_inclusive(-half, half);
        self.weights =
            Array2::from_shape_simple_fn((outputs, inputs), || range.sample(rng));
        self.inputs = Array1::zeros(inputs);
    }

    /// Returns the number of input nodes.
    pub fn input_len(&self) -> usize {
        self.weights.ncols()
    }

    /// Returns the number of output nodes.
    pub fn output_len(&self) -> usize {
        self.weights.nrows()
    }

    /// Sets the input node values. Ignored unless `inputs` holds exactly one
    /// value per input node.
    pub fn set_inputs(&mut self, inputs: &[f64]) {
        if inputs.len() == self.input_len() {
            self.inputs.assign(&ArrayView1::from(inputs));
        }
    }

    /// Returns the output node values for the most recently set inputs.
    pub fn outputs(&self) -> Vec<f64> {
        self.weights.dot(&self.inputs).to_vec()
    }

    /// Returns the weights connecting every input node to output `node`.
    pub fn weight_row(&self, node: usize) -> Option<Vec<f64>> {
        if node < self.output_len() {
            Some(self.weights.row(node).to_vec())
        } else {
            None
        }
    }

    /// Replaces the weights connecting every input node to output `node`.
    ///
    /// Ignored if `node` is out of range or `weights` has the wrong length.
    pub fn set_weight_row(&mut self, node: usize, weights: &[f64]) {
        if node < self.output_len() && weights.len() == self.input_len() {
            for (w, &v) in self.weights.row_mut(node).iter_mut().zip(weights) {
                *w = v;
            }
        }
    }
}
