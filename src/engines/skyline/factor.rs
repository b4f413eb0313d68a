use super::*;

impl<T> SkylineMatrix<T>
where
    T: FloatT,
{
    // Left looking column elimination of the leading p rows.
    //
    // Column j is reduced in place against the already processed
    // columns.  Entries in rows k < min(j,p) end up normalized by their
    // pivot (or by the Cholesky diagonal), entries in rows p..j and the
    // pivots of columns >= p keep the raw Schur complement values.
    // p = n gives the complete factorization.
    pub(super) fn eliminate(&mut self, p: usize, tracer: &mut StabilityTracer<T>) -> Result<(), DssError> {
        let kind = self.kind;
        let cholesky = kind == DssType::SymLL;
        let n = self.d.len();
        let Self {
            colstart,
            upper,
            lower,
            d,
            ..
        } = self;

        for j in 0..n {
            tracer.set_progress(j, j);
            let tj = top(colstart, j);
            let (cs, ce) = (colstart[j], colstart[j + 1]);

            let (ub, ua) = upper.split_at_mut(cs);
            let gu = &mut ua[..ce - cs];
            let mut gl = lower.as_mut().map(|l| {
                let (lb, la) = l.split_at_mut(cs);
                (&*lb, &mut la[..ce - cs])
            });

            for i in tj..j {
                let ti = top(colstart, i);
                let m = usize::max(ti, tj);
                let lim = usize::min(i, p);

                if m < lim {
                    let seg_i = colstart[i] + (m - ti)..colstart[i] + (lim - ti);
                    let seg_j = (m - tj)..(lim - tj);
                    match gl.as_mut() {
                        None => {
                            let s = ub[seg_i].dot(&gu[seg_j]);
                            gu[i - tj] -= s;
                        }
                        Some((lb, lrow)) => {
                            let su = lb[seg_i.clone()].dot(&gu[seg_j.clone()]);
                            let sl = ub[seg_i].dot(&lrow[seg_j]);
                            gu[i - tj] -= su;
                            lrow[i - tj] -= sl;
                        }
                    }
                }
                if cholesky && i < p {
                    gu[i - tj] /= d[i];
                }
            }

            // pivot
            let mut dj = d[j];
            for k in tj..usize::min(j, p) {
                let g = gu[k - tj];
                match gl.as_mut() {
                    None if cholesky => {
                        dj -= g * g;
                    }
                    None => {
                        let l = g / d[k];
                        dj -= l * g;
                        gu[k - tj] = l;
                    }
                    Some((_, lrow)) => {
                        let h = lrow[k - tj];
                        dj -= h * g / d[k];
                        gu[k - tj] = g / d[k];
                        lrow[k - tj] = h / d[k];
                    }
                }
            }

            d[j] = if j < p {
                let pivot = tracer.check_pivot(j, dj, cholesky)?;
                if cholesky {
                    pivot.sqrt()
                } else {
                    pivot
                }
            } else {
                dj
            };
        }
        Ok(())
    }

    // x ← L⁻¹ x on the leading p rows.  Unit lower factor, except
    // for the Cholesky kind which divides by the diagonal.
    pub(super) fn forward(&self, x: &mut [T], p: usize) {
        let cholesky = self.kind == DssType::SymLL;
        let lower = self.lower_values();

        for j in 0..p {
            let tj = top(&self.colstart, j);
            let s = lower[self.colstart[j]..self.colstart[j + 1]].dot(&x[tj..j]);
            x[j] -= s;
            if cholesky {
                x[j] /= self.d[j];
            }
        }
    }

    // x ← D⁻¹ x on the leading p rows
    pub(super) fn diag_scale(&self, x: &mut [T], p: usize) {
        if self.kind != DssType::SymLL {
            zip(&mut x[..p], &self.d[..p]).for_each(|(x, &d)| *x /= d);
        }
    }

    // x ← U⁻¹ x on the leading p rows, column oriented
    pub(super) fn backward(&self, x: &mut [T], p: usize) {
        let cholesky = self.kind == DssType::SymLL;

        for j in (0..p).rev() {
            if cholesky {
                x[j] /= self.d[j];
            }
            let xj = x[j];
            let tj = top(&self.colstart, j);
            let seg = &self.upper[self.colstart[j]..self.colstart[j + 1]];
            zip(&mut x[tj..j], seg).for_each(|(xk, &u)| *xk -= u * xj);
        }
    }
}
