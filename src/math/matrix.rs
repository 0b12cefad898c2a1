use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Dense row-major matrix backed by one flat buffer.
///
/// Element `(i, j)` lives at `data[i * cols + j]`, so iterating `data` in
/// order visits row 0 first, then row 1, and so on. Weight files rely on this
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wraps an existing row-major buffer; fails if its length is not `rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Matrix> {
        if data.len() != rows * cols {
            return Err(Error::invalid(format!(
                "a {}x{} matrix needs {} values, got {}",
                rows,
                cols,
                rows * cols,
                data.len()
            )));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Fills a new matrix with independent uniform draws from `[-range, range]`.
    pub fn uniform<R: Rng>(rows: usize, cols: usize, range: f64, rng: &mut R) -> Matrix {
        let data = (0..rows * cols)
            .map(|_| rng.gen_range(-range..=range))
            .collect();
        Matrix { rows, cols, data }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut f64 {
        &mut self.data[row * self.cols + col]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Weighted sum of column `col` against `activations` (one entry per row).
    ///
    /// This is the forward-pass dot product: `Σ_i self[i, col] * activations[i]`.
    pub fn column_dot(&self, col: usize, activations: &[f64]) -> f64 {
        debug_assert_eq!(activations.len(), self.rows);
        activations
            .iter()
            .enumerate()
            .map(|(i, a)| self.get(i, col) * a)
            .sum()
    }

    /// Weighted sum of row `row` against `deltas` (one entry per column).
    ///
    /// This is the backward-pass dot product: `Σ_l self[row, l] * deltas[l]`.
    pub fn row_dot(&self, row: usize, deltas: &[f64]) -> f64 {
        debug_assert_eq!(deltas.len(), self.cols);
        let start = row * self.cols;
        self.data[start..start + self.cols]
            .iter()
            .zip(deltas)
            .map(|(w, d)| w * d)
            .sum()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(Matrix::from_vec(2, 3, vec![0.0; 5]).is_err());
        assert!(Matrix::from_vec(2, 3, vec![0.0; 6]).is_ok());
    }

    #[test]
    fn layout_is_row_major() {
        let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.get(0, 2), 3.0);
        assert_eq!(m.get(1, 0), 4.0);
        assert_eq!(m.column_dot(1, &[1.0, 10.0]), 2.0 + 50.0);
        assert_eq!(m.row_dot(1, &[1.0, 0.0, 2.0]), 4.0 + 12.0);
    }

    #[test]
    fn uniform_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let m = Matrix::uniform(40, 25, 0.25, &mut rng);
        assert_eq!(m.len(), 1000);
        assert!(m.as_slice().iter().all(|w| (-0.25..=0.25).contains(w)));
    }
}
