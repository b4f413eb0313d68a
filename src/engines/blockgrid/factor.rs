use super::diagonal::*;
use super::*;
use crate::engines::parallel::for_each_chunk_mut;
use itertools::{EitherOrBoth, Itertools};

// positions (ka, kb) of the block rows present in both sorted lists,
// restricted to rows below `limit`
fn common_rows<'a>(a: &'a [usize], b: &'a [usize], limit: usize) -> impl Iterator<Item = (usize, usize)> + 'a {
    a.iter()
        .enumerate()
        .merge_join_by(b.iter().enumerate(), |(_, x), (_, y)| x.cmp(y))
        .take_while(move |e| {
            let row = match e {
                EitherOrBoth::Both(x, _) | EitherOrBoth::Left(x) | EitherOrBoth::Right(x) => *x.1,
            };
            row < limit
        })
        .filter_map(|e| match e {
            EitherOrBoth::Both((ka, _), (kb, _)) => Some((ka, kb)),
            _ => None,
        })
}

impl<T> BlockSparseGridMatrix<T>
where
    T: FloatT,
{
    // Left looking block elimination of the leading p block rows.
    //
    // Block column J is first reduced against the processed columns,
    // then its blocks in rows K < p are normalized by the factorized
    // diagonal blocks, and the diagonal block is updated and, for J < p,
    // factorized.  Blocks in rows p..J and the diagonal blocks of the
    // columns >= p keep the raw Schur complement.
    pub(super) fn eliminate(&mut self, p: usize, tracer: &mut StabilityTracer<T>) -> Result<(), DssError> {
        let kind = self.kind;
        let b = self.bsize;
        let bb = b * b;
        let Self {
            columns,
            diag,
            multiplications,
            ..
        } = self;
        *multiplications = 0;

        for J in 0..columns.len() {
            tracer.set_progress(J, J * b);
            let (done, rest) = columns.split_at_mut(J);
            let SparseGridColumn { rows, upper, lower } = &mut rest[0];
            let (dhead, dtail) = diag.split_at_mut(J * bb);
            let dj = &mut dtail[..bb];

            for (ii, &I) in rows.iter().enumerate() {
                let colI = &done[I];
                let (gu_head, gu_tail) = upper.split_at_mut(ii * bb);
                let gu = &mut gu_tail[..bb];
                let mut gl = lower.as_mut().map(|l| {
                    let (h, t) = l.split_at_mut(ii * bb);
                    (&*h, &mut t[..bb])
                });

                for (kI, kJ) in common_rows(&colI.rows, &rows[..ii], usize::min(I, p)) {
                    let u_ki = &colI.upper[kI * bb..(kI + 1) * bb];
                    let g_kj = &gu_head[kJ * bb..(kJ + 1) * bb];
                    match (gl.as_mut(), colI.lower.as_ref()) {
                        (Some((gl_head, gl_i)), Some(l_i)) => {
                            gemm_nn_sub(gu, &l_i[kI * bb..(kI + 1) * bb], g_kj, b);
                            gemm_nn_sub(gl_i, &gl_head[kJ * bb..(kJ + 1) * bb], u_ki, b);
                            *multiplications += 2;
                        }
                        _ => {
                            gemm_tn_sub(gu, u_ki, g_kj, b);
                            *multiplications += 1;
                        }
                    }
                }

                if kind == DssType::SymLL && I < p {
                    let cii = &dhead[I * bb..(I + 1) * bb];
                    gu.chunks_exact_mut(b).for_each(|y| lower_solve(cii, y, b));
                    *multiplications += 1;
                }
            }

            // rows K < p lead the column
            let q = rows.partition_point(|&K| K < p);
            let dk: &[T] = dhead;

            if kind == DssType::SymLL {
                for k in 0..q {
                    let r = &upper[k * bb..(k + 1) * bb];
                    gemm_tn_sub(dj, r, r, b);
                }
                *multiplications += q;
            } else {
                let lead = &rows[..q];
                let mut wu = upper[..q * bb].to_vec();
                for_each_chunk_mut(&mut wu, bb, |k, blk| {
                    let K = lead[k];
                    solve_block_columns(kind, &dk[K * bb..(K + 1) * bb], blk, b);
                });

                match lower.as_mut() {
                    None => {
                        for k in 0..q {
                            gemm_tn_sub(dj, &wu[k * bb..(k + 1) * bb], &upper[k * bb..(k + 1) * bb], b);
                        }
                        *multiplications += 2 * q;
                    }
                    Some(l) => {
                        let mut wl = l[..q * bb].to_vec();
                        for_each_chunk_mut(&mut wl, bb, |k, blk| {
                            let K = lead[k];
                            right_solve_lu(&dk[K * bb..(K + 1) * bb], blk, b);
                        });
                        for k in 0..q {
                            gemm_nn_sub(dj, &l[k * bb..(k + 1) * bb], &wu[k * bb..(k + 1) * bb], b);
                        }
                        l[..q * bb].copy_from_slice(&wl);
                        *multiplications += 3 * q;
                    }
                }
                upper[..q * bb].copy_from_slice(&wu);
            }

            if J < p {
                factor_block(kind, dj, b, J, tracer)?;
            }
        }
        Ok(())
    }

    // y_J -= A(J,K) z_K with the normalized lower factor, k the
    // position of K in column J
    #[inline]
    pub(super) fn sub_lower_block(&self, col: &SparseGridColumn<T>, k: usize, y: &mut [T], z: &[T]) {
        let b = self.bsize;
        let range = k * b * b..(k + 1) * b * b;
        match col.lower.as_ref() {
            Some(lower) => gemv_n_sub(y, &lower[range], z, b),
            None => gemv_t_sub(y, &col.upper[range], z, b),
        }
    }

    // x ← L⁻¹ x on the leading p block rows.  Unit block lower factor,
    // except for the Cholesky kind which also applies C⁻¹ of the
    // diagonal blocks.
    pub(super) fn forward(&self, x: &mut [T], p: usize) {
        let b = self.bsize;
        let bb = b * b;

        for J in 0..p {
            let col = &self.columns[J];
            let (xh, xt) = x.split_at_mut(J * b);
            let xj = &mut xt[..b];
            for (k, &K) in col.rows.iter().enumerate() {
                self.sub_lower_block(col, k, xj, &xh[K * b..(K + 1) * b]);
            }
            if self.kind == DssType::SymLL {
                lower_solve(&self.diag[J * bb..(J + 1) * bb], xj, b);
            }
        }
    }

    // x ← D⁻¹ x on the leading p block rows
    pub(super) fn diag_scale(&self, x: &mut [T], p: usize) {
        if self.kind == DssType::SymLL {
            return;
        }
        let b = self.bsize;
        let bb = b * b;
        for (J, xj) in x[..p * b].chunks_exact_mut(b).enumerate() {
            solve_block(self.kind, &self.diag[J * bb..(J + 1) * bb], xj, b);
        }
    }

    // x ← U⁻¹ x on the leading p block rows, column oriented
    pub(super) fn backward(&self, x: &mut [T], p: usize) {
        let b = self.bsize;
        let bb = b * b;

        for J in (0..p).rev() {
            let col = &self.columns[J];
            let (xh, xt) = x.split_at_mut(J * b);
            let xj = &mut xt[..b];
            if self.kind == DssType::SymLL {
                upper_solve(&self.diag[J * bb..(J + 1) * bb], xj, b);
            }
            for (k, &K) in col.rows.iter().enumerate() {
                gemv_n_sub(&mut xh[K * b..(K + 1) * b], &col.upper[k * bb..(k + 1) * bb], xj, b);
            }
        }
    }
}
