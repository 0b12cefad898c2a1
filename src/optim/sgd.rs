use crate::math::matrix::Matrix;

/// Plain stochastic gradient descent with a fixed learning rate.
#[derive(Debug, Clone, Copy)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// One update of a weight matrix whose rows are indexed by `activations`
    /// and whose columns are indexed by `deltas`:
    /// `w[i, j] -= lr * deltas[j] * activations[i]`.
    ///
    /// `deltas` may be longer than `weights.cols`; extra entries are ignored.
    pub fn step(&self, weights: &mut Matrix, activations: &[f64], deltas: &[f64]) {
        for (i, &a) in activations.iter().enumerate().take(weights.rows) {
            for (j, &d) in deltas.iter().enumerate().take(weights.cols) {
                *weights.get_mut(i, j) -= self.learning_rate * d * a;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_applies_outer_product() {
        let mut w = Matrix::from_vec(2, 2, vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        Sgd::new(0.5).step(&mut w, &[1.0, 2.0], &[0.2, -0.4, 99.0]);
        assert_eq!(w.as_slice(), &[0.9, 1.2, 0.8, 1.4]);
    }
}
