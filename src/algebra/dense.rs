#![allow(non_snake_case)]

// Square dense block kernels.  All blocks are b x b and stored
// column major, so that entry (r,c) lives at r + c*b.  These are
// the inner loops of the block sparse grid factorization and are
// kept free of any allocation.

use super::FloatT;
use std::iter::zip;

/// C -= A * B
pub(crate) fn gemm_nn_sub<T: FloatT>(C: &mut [T], A: &[T], B: &[T], b: usize) {
    debug_assert!(C.len() == b * b && A.len() == b * b && B.len() == b * b);

    for (Ccol, Bcol) in zip(C.chunks_exact_mut(b), B.chunks_exact(b)) {
        for (Acol, &bkj) in zip(A.chunks_exact(b), Bcol) {
            if bkj == T::zero() {
                continue;
            }
            zip(&mut *Ccol, Acol).for_each(|(c, &a)| *c -= a * bkj);
        }
    }
}

/// C -= Aᵀ * B
pub(crate) fn gemm_tn_sub<T: FloatT>(C: &mut [T], A: &[T], B: &[T], b: usize) {
    debug_assert!(C.len() == b * b && A.len() == b * b && B.len() == b * b);

    for (Ccol, Bcol) in zip(C.chunks_exact_mut(b), B.chunks_exact(b)) {
        for (c, Acol) in zip(Ccol.iter_mut(), A.chunks_exact(b)) {
            *c -= zip(Acol, Bcol).fold(T::zero(), |acc, (&a, &x)| acc + a * x);
        }
    }
}

/// y -= A * x
pub(crate) fn gemv_n_sub<T: FloatT>(y: &mut [T], A: &[T], x: &[T], b: usize) {
    debug_assert!(y.len() == b && x.len() == b && A.len() == b * b);

    for (Acol, &xj) in zip(A.chunks_exact(b), x) {
        if xj == T::zero() {
            continue;
        }
        zip(&mut *y, Acol).for_each(|(y, &a)| *y -= a * xj);
    }
}

/// y -= Aᵀ * x
pub(crate) fn gemv_t_sub<T: FloatT>(y: &mut [T], A: &[T], x: &[T], b: usize) {
    debug_assert!(y.len() == b && x.len() == b && A.len() == b * b);

    for (y, Acol) in zip(y.iter_mut(), A.chunks_exact(b)) {
        *y -= zip(Acol, x).fold(T::zero(), |acc, (&a, &x)| acc + a * x);
    }
}
