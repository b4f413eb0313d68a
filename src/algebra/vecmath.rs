use super::FloatT;
use std::iter::zip;

/// Vector operations on slices of [FloatT](FloatT)
pub trait VectorMath {
    type T;

    /// Set all elements to `c`
    fn set(&mut self, c: Self::T) -> &mut Self;

    /// Elementwise scaling.
    fn scale(&mut self, c: Self::T) -> &mut Self;

    /// Dot product
    fn dot(&self, y: &Self) -> Self::T;

    /// Infinity norm
    fn norm_inf(&self) -> Self::T;

    /// Max absolute difference between `self` and `b`
    fn norm_inf_diff(&self, b: &Self) -> Self::T;
}

impl<T: FloatT> VectorMath for [T] {
    type T = T;

    fn set(&mut self, c: T) -> &mut Self {
        self.fill(c);
        self
    }

    fn scale(&mut self, c: T) -> &mut Self {
        self.iter_mut().for_each(|x| *x *= c);
        self
    }

    // plain ordered summation.  The factorization kernels rely
    // on this being deterministic for a given slice length
    fn dot(&self, y: &[T]) -> T {
        zip(self, y).fold(T::zero(), |acc, (&x, &y)| acc + x * y)
    }

    fn norm_inf(&self) -> T {
        let mut out = T::zero();
        for v in self.iter().map(|v| v.abs()) {
            if v.is_nan() {
                return T::nan();
            }
            out = if v > out { v } else { out };
        }
        out
    }

    fn norm_inf_diff(&self, b: &[T]) -> T {
        zip(self, b).fold(T::zero(), |acc, (x, y)| T::max(acc, T::abs(*x - *y)))
    }
}

#[test]
fn test_dot_product() {
    let x = vec![1., 2., 3., 4.];
    let y = vec![4., 5., 6., 7.];
    assert_eq!(x.dot(&y), 60.);
}

#[test]
fn test_norms() {
    let x = vec![1., -7., 3.];
    let y = vec![1., -5., 3.5];
    assert_eq!(x.norm_inf(), 7.);
    assert_eq!(x.norm_inf_diff(&y), 2.);
}
