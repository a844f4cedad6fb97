//! Activation function types and the neuron that evaluates them.
//!
//! Every activation function takes two tuning parameters:
//!
//! * `slope` scales the function's argument and so adjusts its sensitivity.
//!   For the sigmoidal shapes a larger slope steepens the curve at the origin
//!   (ISRU is the exception, where a larger slope flattens it and narrows the
//!   range to `±1/sqrt(slope)`). For the periodic shapes it shortens the
//!   period, and for the Gaussian it narrows the bell.
//! * `amplify` multiplies the result and so alters the range of the function.
//!
//! Both must be strictly positive.

use std::fmt;
use std::str::FromStr;

/// Inputs closer to zero than this are treated as the origin by `SinC`.
const SINC_ORIGIN: f64 = 0.00001;

/// [Activation function](https://en.wikipedia.org/wiki/Activation_function)
/// types.
///
/// The declaration order is significant: it defines the integer code used in
/// the model text format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activator {
    /// Step function returning `slope` for non-negative inputs, else zero.
    Threshold,
    /// Logistic sigmoid, range 0 to 1.
    Unipolar,
    /// Shifted logistic sigmoid, range -1 to 1.
    Bipolar,
    /// Hyperbolic tangent.
    Tanh,
    /// Gaussian bell curve, range 0 to 1.
    Gauss,
    /// Inverse tangent, range -pi/2 to pi/2.
    Arctan,
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// `sin(x) / x`, patched to 1 at the origin.
    SinC,
    /// Elliot sigmoid, range 0 to 1.
    Elliot,
    /// Identity scaled by the slope.
    Linear,
    /// Inverse square root unit.
    ISRU,
    /// `x / (1 + |x|)`, range -1 to 1.
    SoftSign,
    /// `ln(1 + e^x)`, range 0 to infinity.
    SoftPlus,
}

/// All activators, in model-code order.
pub const ACTIVATORS: [Activator; 14] = [
    Activator::Threshold,
    Activator::Unipolar,
    Activator::Bipolar,
    Activator::Tanh,
    Activator::Gauss,
    Activator::Arctan,
    Activator::Sin,
    Activator::Cos,
    Activator::SinC,
    Activator::Elliot,
    Activator::Linear,
    Activator::ISRU,
    Activator::SoftSign,
    Activator::SoftPlus,
];

/// The logistic sigmoid, finite for every finite input.
fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Activator {
    /// Returns the integer code of this activator.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Looks up an activator by its integer code.
    pub fn from_index(index: usize) -> Option<Activator> {
        ACTIVATORS.get(index).cloned()
    }

    /// Evaluates `amplify * f(x)` for the selected activation function.
    pub fn f(self, slope: f64, amplify: f64, x: f64) -> f64 {
        use self::Activator::*;
        let sx = slope * x;
        let activation = match self {
            Threshold => if x >= 0.0 { slope } else { 0.0 },
            Unipolar => logistic(sx),
            Bipolar => 2.0 * logistic(sx) - 1.0,
            Tanh => sx.tanh(),
            Gauss => (-slope * x * x).exp(),
            Arctan => sx.atan(),
            Sin => sx.sin(),
            Cos => sx.cos(),
            SinC => if x.abs() < SINC_ORIGIN { 1.0 } else { sx.sin() / sx },
            Elliot => (sx / 2.0) / (1.0 + sx.abs()) + 0.5,
            Linear => sx,
            ISRU => x / (1.0 + slope * x * x).sqrt(),
            SoftSign => sx / (1.0 + sx.abs()),
            SoftPlus => sx.max(0.0) + (-sx.abs()).exp().ln_1p(),
        };
        amplify * activation
    }

    /// Evaluates the derivative `amplify * f'(x)`.
    ///
    /// Unlike the usual output-based shortcut, this takes the *input* of the
    /// activation function, so every shape gets an exact closed form.
    /// `Threshold` is only differentiated at the origin, where it returns the
    /// slope; everywhere else its gradient is zero.
    pub fn fprime(self, slope: f64, amplify: f64, x: f64) -> f64 {
        use self::Activator::*;
        let sx = slope * x;
        let gradient = match self {
            Threshold => if x == 0.0 { slope } else { 0.0 },
            Unipolar => {
                let s = logistic(sx);
                slope * s * (1.0 - s)
            }
            Bipolar => {
                let s = logistic(sx);
                2.0 * slope * s * (1.0 - s)
            }
            Tanh => {
                let t = sx.tanh();
                slope * (1.0 - t * t)
            }
            Gauss => -2.0 * slope * x * (-slope * x * x).exp(),
            Arctan => slope / (1.0 + sx * sx),
            Sin => slope * sx.cos(),
            Cos => -slope * sx.sin(),
            SinC => {
                if x.abs() < SINC_ORIGIN {
                    0.0
                } else {
                    (sx * sx.cos() - sx.sin()) / (slope * x * x)
                }
            }
            Elliot => {
                let d = 1.0 + sx.abs();
                0.5 * slope / (d * d)
            }
            Linear => slope,
            ISRU => {
                let r = 1.0 / (1.0 + slope * x * x).sqrt();
                r * r * r
            }
            SoftSign => {
                let d = 1.0 + sx.abs();
                slope / (d * d)
            }
            SoftPlus => slope * logistic(sx),
        };
        amplify * gradient
    }
}

impl fmt::Display for Activator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Activator::*;
        let name = match *self {
            Threshold => "Threshold",
            Unipolar => "Unipolar",
            Bipolar => "Bipolar",
            Tanh => "Tanh",
            Gauss => "Gauss",
            Arctan => "Arctan",
            Sin => "Sin",
            Cos => "Cos",
            SinC => "SinC",
            Elliot => "Elliot",
            Linear => "Linear",
            ISRU => "ISRU",
            SoftSign => "SoftSign",
            SoftPlus => "SoftPlus",
        };
        f.write_str(name)
    }
}

impl FromStr for Activator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let alias = match lower.as_str() {
            "gaussian" => "gauss",
            "sine" => "sin",
            "cosine" => "cos",
            "sinc" | "sinclike" => "sinc",
            "inversesqrtunit" => "isru",
            other => other,
        };
        ACTIVATORS
            .iter()
            .find(|a| a.to_string().to_ascii_lowercase() == alias)
            .cloned()
            .ok_or_else(|| format!("unknown activation function {:?}", s))
    }
}

/// A single neuron: an activation function with its tuning parameters.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    activator: Activator,
    slope: f64,
    amplify: f64,
}

impl Default for Unit {
    fn default() -> Self {
        Unit {
            activator: Activator::Threshold,
            slope: 1.0,
            amplify: 1.0,
        }
    }
}

impl Unit {
    /// Creates a unit. Non-positive `slope` or `amplify` values are ignored
    /// and the default of 1.0 is kept instead.
    pub fn new(activator: Activator, slope: f64, amplify: f64) -> Self {
        let mut unit = Unit {
            activator,
            ..Unit::default()
        };
        unit.set_slope(slope);
        unit.set_amplify(amplify);
        unit
    }

    pub fn activator(&self) -> Activator {
        self.activator
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn amplify(&self) -> f64 {
        self.amplify
    }

    pub fn set_activator(&mut self, activator: Activator) {
        self.activator = activator;
    }

    /// Sets the slope, leaving it unchanged unless `slope > 0`.
    pub fn set_slope(&mut self, slope: f64) {
        if slope > 0.0 {
            self.slope = slope;
        }
    }

    /// Sets the amplification, leaving it unchanged unless `amplify > 0`.
    pub fn set_amplify(&mut self, amplify: f64) {
        if amplify > 0.0 {
            self.amplify = amplify;
        }
    }

    /// Returns the activation value for the unit input `x`.
    pub fn activation(&self, x: f64) -> f64 {
        self.activator.f(self.slope, self.amplify, x)
    }

    /// Returns the gradient of the activation function at `x`.
    pub fn gradient(&self, x: f64) -> f64 {
        self.activator.fprime(self.slope, self.amplify, x)
    }
}
