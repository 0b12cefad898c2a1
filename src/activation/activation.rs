use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::error::Error;

/// Amplitude of the scaled tanh, `1.7159 * tanh(2x / 3)` (LeCun et al.).
const SCALED_TANH_A: f64 = 1.7159;
const SCALED_TANH_B: f64 = 2.0 / 3.0;

/// Hidden-layer nonlinearity. The output layer is always linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    #[default]
    Sigmoid,
    Tanh,
    ScaledTanh,
    #[serde(rename = "relu")]
    ReLU,
    /// `x / (1 + |x|)`, a smooth absolute-value squashing.
    #[serde(rename = "softsign")]
    SoftSign,
    Identity,
}

impl ActivationFunction {
    pub const ALL: [ActivationFunction; 6] = [
        ActivationFunction::Sigmoid,
        ActivationFunction::Tanh,
        ActivationFunction::ScaledTanh,
        ActivationFunction::ReLU,
        ActivationFunction::SoftSign,
        ActivationFunction::Identity,
    ];

    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::ScaledTanh => SCALED_TANH_A * (SCALED_TANH_B * x).tanh(),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::SoftSign => x / (1.0 + x.abs()),
            ActivationFunction::Identity => x,
        }
    }

    /// Derivative of the activation, evaluated from its **output** `o = f(x)`
    /// rather than from the pre-activation `x`.
    ///
    /// Backprop only keeps hidden outputs around, so every variant is written
    /// in closed form over `o`.
    pub fn derivative(&self, output: f64) -> f64 {
        let o = output;
        match self {
            ActivationFunction::Sigmoid => (1.0 - o) * o,
            ActivationFunction::Tanh => 1.0 - o * o,
            ActivationFunction::ScaledTanh => {
                SCALED_TANH_B / SCALED_TANH_A * (SCALED_TANH_A - o) * (SCALED_TANH_A + o)
            }
            ActivationFunction::ReLU => if o > 0.0 { 1.0 } else { 0.0 },
            // f'(x) = 1 / (1 + |x|)^2 and 1 - |o| = 1 / (1 + |x|)
            ActivationFunction::SoftSign => {
                let s = 1.0 - o.abs();
                s * s
            }
            ActivationFunction::Identity => 1.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Sigmoid => "sigmoid",
            ActivationFunction::Tanh => "tanh",
            ActivationFunction::ScaledTanh => "scaled_tanh",
            ActivationFunction::ReLU => "relu",
            ActivationFunction::SoftSign => "softsign",
            ActivationFunction::Identity => "identity",
        }
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivationFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ActivationFunction::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .or(match wanted.as_str() {
                "abs" => Some(ActivationFunction::SoftSign),
                "linear" => Some(ActivationFunction::Identity),
                _ => None,
            })
            .ok_or_else(|| Error::invalid(format!("unknown activation function '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Central-difference slope of `f` at `x`.
    fn numeric_slope(act: ActivationFunction, x: f64) -> f64 {
        let h = 1e-6;
        (act.function(x + h) - act.function(x - h)) / (2.0 * h)
    }

    #[test]
    fn derivative_from_output_matches_numeric_slope() {
        for act in ActivationFunction::ALL {
            for &x in &[-2.5, -0.7, 0.3, 1.1, 3.0] {
                let o = act.function(x);
                assert_abs_diff_eq!(act.derivative(o), numeric_slope(act, x), epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn known_values() {
        assert_abs_diff_eq!(ActivationFunction::Sigmoid.function(0.0), 0.5);
        assert_abs_diff_eq!(ActivationFunction::Sigmoid.derivative(0.5), 0.25);
        assert_abs_diff_eq!(ActivationFunction::Tanh.derivative(0.5), 0.75);
        assert_abs_diff_eq!(ActivationFunction::SoftSign.function(1.0), 0.5);
        assert_eq!(ActivationFunction::ReLU.function(-3.0), 0.0);
        assert_eq!(ActivationFunction::ReLU.derivative(0.0), 0.0);
        assert_abs_diff_eq!(
            ActivationFunction::ScaledTanh.function(1.5),
            1.7159 * (1.0f64).tanh(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for act in ActivationFunction::ALL {
            assert_eq!(act.to_string().parse::<ActivationFunction>().unwrap(), act);
        }
        assert_eq!("Scaled-Tanh".parse::<ActivationFunction>().unwrap(), ActivationFunction::ScaledTanh);
        assert_eq!("abs".parse::<ActivationFunction>().unwrap(), ActivationFunction::SoftSign);
        assert!("swish".parse::<ActivationFunction>().is_err());
    }
}
