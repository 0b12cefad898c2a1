pub struct MseLoss;

impl MseLoss {
    /// Output-layer error against a one-hot target: `output[j] - [j == label]`.
    ///
    /// With a linear output layer this is also the gradient of the squared
    /// error with respect to each output.
    pub fn one_hot_error(output: &[f64], label: usize, error: &mut [f64]) {
        for (j, (e, o)) in error.iter_mut().zip(output).enumerate() {
            *e = if j == label { o - 1.0 } else { *o };
        }
    }

    /// Half squared error, `0.5 * Σ e²`.
    pub fn loss(error: &[f64]) -> f64 {
        error.iter().map(|e| 0.5 * e * e).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hot_error_subtracts_target() {
        let mut err = [0.0; 3];
        MseLoss::one_hot_error(&[0.2, 0.9, -0.1], 1, &mut err);
        assert_eq!(err, [0.2, 0.9 - 1.0, -0.1]);
    }

    #[test]
    fn loss_is_half_sum_of_squares() {
        assert_eq!(MseLoss::loss(&[1.0, -2.0, 0.0]), 2.5);
        assert_eq!(MseLoss::loss(&[]), 0.0);
    }
}
