//! The plain-text model format.
//!
//! A trained network is written as a single line of whitespace-separated
//! tokens:
//!
//! ```text
//! inputs outputs layers output_type output_slope output_amplify
//! L in out type slope amplify w(0,0) w(0,1) ... w(out-1,in-1)
//! ...
//! ```
//!
//! The header is followed by one `L` record per weighted connection, in
//! network order, so there are `layers + 1` records. Each record carries the
//! activation function of the hidden layer the connection feeds; the final,
//! output-facing record has no layer of its own and writes `0 0.0 0.0`. The
//! weights follow row by row: every weight into output node 0, then every
//! weight into output node 1, and so on. Activation types are written as their
//! integer codes and floats use the shortest representation that reads back
//! exactly.

use crate::activator::{Activator, Unit};
use crate::connection::WeightedConnection;
use crate::error::{Error, Result};
use crate::feed_forward::Network;

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

/// Marks the start of each weighted connection record.
const CONNECTION_MARKER: &str = "L";

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let output = self.output_unit();
        write!(f,
               "{} {} {} {} {:?} {:?} ",
               self.num_inputs(),
               self.num_outputs(),
               self.num_layers(),
               output.activator().index(),
               output.slope(),
               output.amplify())?;

        for n in 0..self.num_connections() {
            let connection = match self.connection(n) {
                Some(connection) => connection,
                None => break,
            };
            let (kind, slope, amplify) = match self.layer_details(n) {
                Some(unit) => (unit.activator().index(), unit.slope(), unit.amplify()),
                None => (0, 0.0, 0.0),
            };
            write!(f,
                   "{} {} {} {} {:?} {:?} ",
                   CONNECTION_MARKER,
                   connection.input_len(),
                   connection.output_len(),
                   kind,
                   slope,
                   amplify)?;
            for node in 0..connection.output_len() {
                for w in connection.weight_row(node).unwrap_or_default() {
                    write!(f, "{:?} ", w)?;
                }
            }
        }
        writeln!(f)
    }
}

/// A cursor over the tokens of a model, tracking the position for errors.
struct Tokens<'a> {
    iter: SplitWhitespace<'a>,
    position: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Tokens {
            iter: text.split_whitespace(),
            position: 0,
        }
    }

    fn error<T>(&self, reason: String) -> Result<T> {
        Err(Error::Model {
            token: self.position,
            reason,
        })
    }

    fn next(&mut self, what: &str) -> Result<&'a str> {
        self.position += 1;
        match self.iter.next() {
            Some(token) => Ok(token),
            None => self.error(format!("unexpected end of data, expected {}", what)),
        }
    }

    fn parse<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self.next(what)?;
        match token.parse() {
            Ok(value) => Ok(value),
            Err(_) => self.error(format!("expected {}, found {:?}", what, token)),
        }
    }

    fn count(&mut self, what: &str) -> Result<usize> {
        let count: usize = self.parse(what)?;
        if count == 0 {
            return self.error(format!("{} must be positive", what));
        }
        Ok(count)
    }

    fn unit(&mut self, what: &str) -> Result<Unit> {
        let code: usize = self.parse(what)?;
        let activator = match Activator::from_index(code) {
            Some(activator) => activator,
            None => return self.error(format!("unknown activation code {}", code)),
        };
        let slope: f64 = self.parse("a slope")?;
        if !(slope > 0.0) {
            return self.error(format!("slope must be positive, found {}", slope));
        }
        let amplify: f64 = self.parse("an amplify value")?;
        if !(amplify > 0.0) {
            return self.error(format!("amplify must be positive, found {}", amplify));
        }
        Ok(Unit::new(activator, slope, amplify))
    }

    fn marker(&mut self) -> Result<()> {
        let token = self.next("a connection marker")?;
        if token != CONNECTION_MARKER {
            return self.error(format!("expected {:?}, found {:?}",
                                      CONNECTION_MARKER,
                                      token));
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        match self.iter.next() {
            None => Ok(()),
            Some(token) => {
                self.position += 1;
                self.error(format!("unexpected trailing data {:?}", token))
            }
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(text: &str) -> Result<Network> {
        let mut tokens = Tokens::new(text);
        let num_inputs = tokens.count("the number of inputs")?;
        let num_outputs = tokens.count("the number of outputs")?;
        let num_layers: usize = tokens.parse("the number of hidden layers")?;
        let output_unit = tokens.unit("the output activation code")?;

        let mut hidden_units = Vec::new();
        let mut connections = Vec::new();
        let mut fan_in = num_inputs;
        for n in 0..=num_layers {
            tokens.marker()?;
            let inputs = tokens.count("the number of input nodes")?;
            let outputs = tokens.count("the number of output nodes")?;
            if inputs != fan_in {
                return tokens.error(format!("connection {} has {} input nodes \
                                             but the previous layer has {} units",
                                            n,
                                            inputs,
                                            fan_in));
            }
            if n < num_layers {
                hidden_units.push(tokens.unit("a layer activation code")?);
            } else {
                if outputs != num_outputs {
                    return tokens.error(format!("the output connection has {} \
                                                 nodes but the network has {} \
                                                 outputs",
                                                outputs,
                                                num_outputs));
                }
                // The output-facing record carries placeholder unit fields.
                tokens.parse::<usize>("a placeholder activation code")?;
                tokens.parse::<f64>("a placeholder slope")?;
                tokens.parse::<f64>("a placeholder amplify value")?;
            }

            let len = match inputs.checked_mul(outputs) {
                Some(len) => len,
                None => return tokens.error("connection is too large".to_string()),
            };
            let mut weights = Vec::new();
            for _ in 0..len {
                weights.push(tokens.parse::<f64>("a weight")?);
            }
            match WeightedConnection::from_rows(inputs, outputs, weights) {
                Some(connection) => connections.push(connection),
                None => return tokens.error("inconsistent connection shape".to_string()),
            }
            fan_in = outputs;
        }
        tokens.finish()?;

        Ok(Network::from_parts(num_inputs,
                               num_outputs,
                               output_unit,
                               hidden_units,
                               connections))
    }
}

impl Network {
    /// Returns the model text for this network.
    pub fn to_model_string(&self) -> String {
        self.to_string()
    }

    /// Rebuilds a network from model text.
    pub fn from_model_str(text: &str) -> Result<Network> {
        text.parse()
    }

    /// Writes the network's model text to `path`.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_model_string())?;
        Ok(())
    }

    /// Reads a network from the model text stored at `path`.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Network> {
        let text = fs::read_to_string(path)?;
        Network::from_model_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(hidden: &[(usize, Activator)]) -> Network {
        let mut network = Network::with_seed(11);
        network.set_num_inputs(3);
        network.set_num_outputs(2);
        network.set_output_unit_type(Activator::Elliot);
        network.set_output_unit_slope(0.75);
        network.set_output_unit_amplify(1.5);
        if hidden.is_empty() {
            network.connect_output(2.0).unwrap();
        }
        for (i, &(units, activator)) in hidden.iter().enumerate() {
            network.add_layer(units, activator, 3.0, 1.0 + i as f64 * 0.1, 0.9)
                .unwrap();
        }
        network
    }

    fn assert_same(a: &Network, b: &Network) {
        assert_eq!(a.num_inputs(), b.num_inputs());
        assert_eq!(a.num_outputs(), b.num_outputs());
        assert_eq!(a.num_layers(), b.num_layers());
        assert_eq!(a.output_unit(), b.output_unit());
        for n in 0..a.num_layers() {
            assert_eq!(a.layer_details(n), b.layer_details(n));
        }
        assert_eq!(a.num_connections(), b.num_connections());
        for n in 0..a.num_connections() {
            let (ca, cb) = (a.connection(n).unwrap(), b.connection(n).unwrap());
            assert_eq!(ca.input_len(), cb.input_len());
            assert_eq!(ca.output_len(), cb.output_len());
            for node in 0..ca.output_len() {
                assert_eq!(ca.weight_row(node), cb.weight_row(node));
            }
        }
    }

    #[test]
    fn round_trip_without_hidden_layers() {
        let network = build(&[]);
        let copy: Network = network.to_model_string().parse().unwrap();
        assert_same(&network, &copy);
    }

    #[test]
    fn round_trip_with_one_hidden_layer() {
        let network = build(&[(4, Activator::SoftPlus)]);
        let copy = Network::from_model_str(&network.to_model_string()).unwrap();
        assert_same(&network, &copy);
    }

    #[test]
    fn round_trip_with_three_hidden_layers() {
        let mut network = build(&[(4, Activator::Tanh),
                                  (5, Activator::Gauss),
                                  (2, Activator::ISRU)]);
        let copy = Network::from_model_str(&network.to_model_string()).unwrap();
        assert_same(&network, &copy);
        let mut copy = copy;
        assert_eq!(network.response(&[0.1, 0.2, 0.3]),
                   copy.response(&[0.1, 0.2, 0.3]));
    }

    #[test]
    fn header_and_records_are_laid_out_in_order() {
        let network = Network::from_model_str("1 1 1 1 1.0 2.0 \
                                               L 1 2 3 0.5 1.0 0.25 -0.25 \
                                               L 2 1 0 0.0 0.0 1.0 2.0")
            .unwrap();
        assert_eq!(network.num_layers(), 1);
        assert_eq!(network.output_unit(), Unit::new(Activator::Unipolar, 1.0, 2.0));
        assert_eq!(network.layer_details(0), Some(Unit::new(Activator::Tanh, 0.5, 1.0)));
        assert_eq!(network.connection(0).unwrap().weight_row(1), Some(vec![-0.25]));
        assert_eq!(network.to_model_string(),
                   "1 1 1 1 1.0 2.0 L 1 2 3 0.5 1.0 0.25 -0.25 \
                    L 2 1 0 0.0 0.0 1.0 2.0 \n");
    }

    #[test]
    fn malformed_models_are_reported() {
        let bad = ["",
                   "1 1 0 1 1.0 1.0",
                   "1 1 0 1 1.0 1.0 X 1 1 0 0.0 0.0 1.0",
                   "1 1 0 99 1.0 1.0 L 1 1 0 0.0 0.0 1.0",
                   "1 1 0 1 -1.0 1.0 L 1 1 0 0.0 0.0 1.0",
                   "1 1 0 1 1.0 1.0 L 2 1 0 0.0 0.0 1.0 1.0",
                   "1 1 0 1 1.0 1.0 L 1 2 0 0.0 0.0 1.0 1.0",
                   "1 1 0 1 1.0 1.0 L 1 1 0 0.0 0.0 one",
                   "1 1 0 1 1.0 1.0 L 1 1 0 0.0 0.0 1.0 extra",
                   "1 1 1 1 1.0 1.0 L 1 1 1 1.0 1.0 1.0"];
        for text in bad.iter() {
            match Network::from_model_str(text) {
                Err(Error::Model { .. }) => {}
                other => panic!("{:?} parsed as {:?}", text, other.map(|_| ())),
            }
        }
    }

    #[test]
    fn file_round_trip() {
        let network = build(&[(3, Activator::Sin)]);
        let path = std::env::temp_dir()
            .join(format!("nnfit-model-{}.txt", std::process::id()));
        network.write_to_file(&path).unwrap();
        let copy = Network::read_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_same(&network, &copy);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("nnfit-no-such-model.txt");
        match Network::read_from_file(&path) {
            Err(Error::Io(_)) => {}
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }
}
