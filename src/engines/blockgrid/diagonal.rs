// Factorization and solves with the dense b x b diagonal blocks, stored
// column major.  After factorization a block holds
//
//   SymLDL   strict lower: unit L, diagonal: D
//   SymLL    lower including the diagonal: C with D = C Cᵀ
//   UnsymLU  strict lower: unit L, upper including the diagonal: U
//
// Entries outside these triangles are left untouched and never read.

use crate::algebra::FloatT;
use crate::engines::DssType;
use crate::tracer::StabilityTracer;
use crate::DssError;

/// Right looking in place factorization of the diagonal block of block
/// row `block`, checking every pivot with the tracer
pub(super) fn factor_block<T: FloatT>(
    kind: DssType,
    a: &mut [T],
    b: usize,
    block: usize,
    tracer: &mut StabilityTracer<T>,
) -> Result<(), DssError> {
    debug_assert_eq!(a.len(), b * b);

    for c in 0..b {
        let cc = c + c * b;
        let pivot = tracer.check_pivot(block * b + c, a[cc], kind.is_positive_definite())?;

        match kind {
            DssType::SymLL => {
                let s = pivot.sqrt();
                a[cc] = s;
                for r in c + 1..b {
                    a[r + c * b] /= s;
                }
                for j in c + 1..b {
                    let ljc = a[j + c * b];
                    for r in j..b {
                        let t = a[r + c * b] * ljc;
                        a[r + j * b] -= t;
                    }
                }
            }
            DssType::SymLDL => {
                a[cc] = pivot;
                for r in c + 1..b {
                    a[r + c * b] /= pivot;
                }
                for j in c + 1..b {
                    let s = a[j + c * b] * pivot;
                    for r in j..b {
                        let t = a[r + c * b] * s;
                        a[r + j * b] -= t;
                    }
                }
            }
            DssType::UnsymLU => {
                a[cc] = pivot;
                for r in c + 1..b {
                    a[r + c * b] /= pivot;
                }
                for j in c + 1..b {
                    let ucj = a[c + j * b];
                    if ucj == T::zero() {
                        continue;
                    }
                    for r in c + 1..b {
                        let t = a[r + c * b] * ucj;
                        a[r + j * b] -= t;
                    }
                }
            }
        }
    }
    Ok(())
}

// y ← L⁻¹ y, unit lower triangle
fn unit_lower_solve<T: FloatT>(a: &[T], y: &mut [T], b: usize) {
    for c in 0..b {
        let yc = y[c];
        if yc == T::zero() {
            continue;
        }
        for r in c + 1..b {
            y[r] -= a[r + c * b] * yc;
        }
    }
}

/// y ← C⁻¹ y with the Cholesky factor
pub(super) fn lower_solve<T: FloatT>(a: &[T], y: &mut [T], b: usize) {
    for c in 0..b {
        y[c] /= a[c + c * b];
        let yc = y[c];
        for r in c + 1..b {
            y[r] -= a[r + c * b] * yc;
        }
    }
}

/// y ← C⁻ᵀ y with the Cholesky factor
pub(super) fn upper_solve<T: FloatT>(a: &[T], y: &mut [T], b: usize) {
    for c in (0..b).rev() {
        let mut s = y[c];
        for r in c + 1..b {
            s -= a[r + c * b] * y[r];
        }
        y[c] = s / a[c + c * b];
    }
}

/// y ← D⁻¹ y with a factorized diagonal block
pub(super) fn solve_block<T: FloatT>(kind: DssType, a: &[T], y: &mut [T], b: usize) {
    debug_assert!(a.len() == b * b && y.len() == b);

    match kind {
        DssType::SymLL => {
            lower_solve(a, y, b);
            upper_solve(a, y, b);
        }
        DssType::SymLDL => {
            unit_lower_solve(a, y, b);
            for c in 0..b {
                y[c] /= a[c + c * b];
            }
            for c in (0..b).rev() {
                let mut s = y[c];
                for r in c + 1..b {
                    s -= a[r + c * b] * y[r];
                }
                y[c] = s;
            }
        }
        DssType::UnsymLU => {
            unit_lower_solve(a, y, b);
            for c in (0..b).rev() {
                y[c] /= a[c + c * b];
                let yc = y[c];
                for r in 0..c {
                    y[r] -= a[r + c * b] * yc;
                }
            }
        }
    }
}

/// X ← D⁻¹ X for every column of the b x b block `x`
pub(super) fn solve_block_columns<T: FloatT>(kind: DssType, a: &[T], x: &mut [T], b: usize) {
    x.chunks_exact_mut(b).for_each(|y| solve_block(kind, a, y, b));
}

/// X ← X D⁻¹ with an LU factorized diagonal block
pub(super) fn right_solve_lu<T: FloatT>(a: &[T], x: &mut [T], b: usize) {
    debug_assert!(a.len() == b * b && x.len() == b * b);

    // X' U = X, columns ascending
    for c in 0..b {
        for r in 0..c {
            let u = a[r + c * b];
            if u == T::zero() {
                continue;
            }
            for i in 0..b {
                let t = x[i + r * b] * u;
                x[i + c * b] -= t;
            }
        }
        let d = a[c + c * b];
        for i in 0..b {
            x[i + c * b] /= d;
        }
    }

    // X L = X', columns descending
    for c in (0..b).rev() {
        for r in c + 1..b {
            let l = a[r + c * b];
            if l == T::zero() {
                continue;
            }
            for i in 0..b {
                let t = x[i + r * b] * l;
                x[i + c * b] -= t;
            }
        }
    }
}
