use super::*;
use crate::algebra::*;

impl<'a, T> SparseMatrixView<'a, T>
where
    T: FloatT,
{
    /// Computes `y = A*x`
    pub fn mul_matrix_by_vector(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.neq());
        assert_eq!(y.len(), self.neq());

        match self.orientation() {
            Orientation::CompressedRows => self.mul_rows(x, y),
            Orientation::CompressedColumns => self.mul_cols(x, y),
            Orientation::Symmetric => self.mul_sym(x, y),
        }
    }

    fn mul_rows(&self, x: &[T], y: &mut [T]) {
        let values = self.values();
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = (self.adr(i)..self.adr(i + 1))
                .fold(T::zero(), |acc, k| acc + values[k] * x[self.ci(k)]);
        }
    }

    fn mul_cols(&self, x: &[T], y: &mut [T]) {
        let values = self.values();
        y.set(T::zero());
        for (j, &xj) in x.iter().enumerate() {
            for k in self.adr(j)..self.adr(j + 1) {
                y[self.ci(k)] += values[k] * xj;
            }
        }
    }

    // every stored off diagonal entry contributes to both
    // of its endpoints, the diagonal only once
    fn mul_sym(&self, x: &[T], y: &mut [T]) {
        let values = self.values();
        y.set(T::zero());
        for (j, &xj) in x.iter().enumerate() {
            for k in self.adr(j)..self.adr(j + 1) {
                let i = self.ci(k);
                let v = values[k];
                y[i] += v * xj;
                if i != j {
                    y[j] += v * x[i];
                }
            }
        }
    }
}
