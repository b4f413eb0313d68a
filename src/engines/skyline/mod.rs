#![allow(non_snake_case)]

use super::*;
use crate::ordering::Ordering;
use crate::sparse::ConnectivityProvider;
use crate::StructureError;
use std::iter::zip;

mod factor;

/// Variable band (profile) storage.
///
/// Column `j` of the strict upper triangle is stored as the contiguous
/// run of rows `top(j)..j`, packed one column after the other.  Pivots
/// live in a separate diagonal array.  The unsymmetric kind keeps a
/// second array with the same layout holding the rows of the strict
/// lower triangle, so the profile is always symmetric.  Column starts are
/// fixed once the structure is built.
#[derive(Debug)]
pub struct SkylineMatrix<T = f64> {
    kind: DssType,
    ordering: Ordering,
    fixed: usize,
    // segment of column j is colstart[j]..colstart[j+1]
    colstart: Vec<usize>,
    upper: Vec<T>,
    lower: Option<Vec<T>>,
    d: Vec<T>,
    state: FactorizationState,
}

#[inline]
pub(super) fn top(colstart: &[usize], j: usize) -> usize {
    j - (colstart[j + 1] - colstart[j])
}

impl<T> SkylineMatrix<T>
where
    T: FloatT,
{
    /// Creates the profile storage for the couplings of `provider` in
    /// the storage numbering given by `ordering`.  The original dofs
    /// `fixed` must occupy the leading range of the ordering.
    pub fn new(
        kind: DssType,
        provider: &dyn ConnectivityProvider,
        ordering: Ordering,
        fixed: &[usize],
    ) -> Result<Self, StructureError> {
        if ordering.len() != provider.neq() {
            return Err(StructureError::IncompatibleDimension);
        }
        ordering.check_leading(fixed)?;

        let mut skyline = Self {
            kind,
            ordering,
            fixed: fixed.len(),
            colstart: vec![0],
            upper: vec![],
            lower: None,
            d: vec![],
            state: FactorizationState::Unfactorized,
        };
        skyline.allocate_memory(provider)?;
        Ok(skyline)
    }

    // one pass over the couplings to find the top row of every column
    fn allocate_memory(&mut self, provider: &dyn ConnectivityProvider) -> Result<(), StructureError> {
        let n = self.ordering.len();
        let mut tops: Vec<usize> = (0..n).collect();
        let mut error = None;

        provider.for_each_coupling(&mut |i, j| {
            if i >= n || j >= n {
                error.get_or_insert(StructureError::IndexOutOfRange {
                    index: usize::max(i, j),
                    dim: n,
                });
                return;
            }
            grow_skyline(&mut tops, self.ordering.to_new(i), self.ordering.to_new(j));
        });
        if let Some(e) = error {
            return Err(e);
        }

        // seal
        let mut colstart = Vec::with_capacity(n + 1);
        colstart.push(0);
        for (j, &t) in tops.iter().enumerate() {
            colstart.push(colstart[j] + (j - t));
        }
        let len = colstart[n];

        self.colstart = colstart;
        self.upper = vec![T::zero(); len];
        self.lower = (!self.kind.is_symmetric()).then(|| vec![T::zero(); len]);
        self.d = vec![T::zero(); n];
        Ok(())
    }

    /// length of the packed column data
    pub fn profile_length(&self) -> usize {
        self.upper.len()
    }

    /// first stored row of storage column `j`
    pub fn column_top(&self, j: usize) -> usize {
        top(&self.colstart, j)
    }

    pub fn ordering(&self) -> &Ordering {
        &self.ordering
    }

    // lower triangle rows, which are the upper columns for symmetric kinds
    #[inline]
    fn lower_values(&self) -> &[T] {
        self.lower.as_deref().unwrap_or(&self.upper)
    }

    // packed position of storage entry (r,c), r < c
    #[inline]
    fn slot(&self, r: usize, c: usize) -> Option<usize> {
        let t = top(&self.colstart, c);
        (r >= t).then(|| self.colstart[c] + (r - t))
    }

    fn add_value(&mut self, sr: usize, sc: usize, v: T) -> Option<()> {
        if sr == sc {
            self.d[sr] += v;
            return Some(());
        }
        if self.kind.is_symmetric() || sr < sc {
            let pos = self.slot(usize::min(sr, sc), usize::max(sr, sc))?;
            self.upper[pos] += v;
        } else {
            let pos = self.slot(sc, sr)?;
            self.lower.as_mut()?[pos] += v;
        }
        Some(())
    }

    fn check_units(&self, fixed: usize) -> Result<(), DssError> {
        let n = self.d.len();
        if fixed > n {
            return Err(StructureError::IndexOutOfRange { index: fixed, dim: n }.into());
        }
        Ok(())
    }
}

impl<T> FactorizableMatrix<T> for SkylineMatrix<T>
where
    T: FloatT,
{
    fn neq(&self) -> usize {
        self.d.len()
    }

    fn storage_dim(&self) -> usize {
        self.d.len()
    }

    fn nonzeros(&self) -> usize {
        self.d.len() + self.upper.len() + self.lower.as_ref().map_or(0, |l| l.len())
    }

    fn kind(&self) -> DssType {
        self.kind
    }

    fn state(&self) -> FactorizationState {
        self.state
    }

    fn is_factorized(&self) -> bool {
        self.state == FactorizationState::Factorized
    }

    fn leading_fixed(&self) -> usize {
        self.fixed
    }

    fn leading_dofs(&self, units: usize) -> usize {
        units
    }

    fn storage_dof(&self, dof: usize) -> usize {
        self.ordering.to_new(dof)
    }

    fn to_storage(&self, b: &[T], xs: &mut [T]) {
        self.ordering.permute(xs, b);
    }

    fn from_storage(&self, xs: &[T], x: &mut [T]) {
        self.ordering.ipermute(x, xs);
    }

    fn load_matrix_numbers(&mut self, view: &SparseMatrixView<T>) -> Result<(), DssError> {
        check_length(view.neq(), self.neq())?;
        self.zero();

        let symmetric_view = view.is_symmetric();
        let symmetric_kind = self.kind.is_symmetric();
        let mut error = None;

        view.for_each_entry(|r, c, v| {
            // symmetric kinds read a single triangle of an unsymmetric view
            if symmetric_kind && !symmetric_view && r < c {
                return;
            }
            let (sr, sc) = (self.ordering.to_new(r), self.ordering.to_new(c));
            let mut ok = self.add_value(sr, sc, v).is_some();
            if !symmetric_kind && symmetric_view && r != c {
                ok &= self.add_value(sc, sr, v).is_some();
            }
            if !ok {
                error.get_or_insert(StructureError::EntryOutsidePattern { row: r, col: c });
            }
        });

        match error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn factorize(&mut self, tracer: &mut StabilityTracer<T>) -> Result<(), DssError> {
        check_unfactorized(self.state)?;
        tracer.begin_factorization();

        let n = self.d.len();
        self.state = match self.eliminate(n, tracer) {
            Ok(()) => FactorizationState::Factorized,
            Err(e) => {
                self.state = FactorizationState::Failed;
                return Err(e);
            }
        };
        Ok(())
    }

    fn solve(&self, b: &[T], x: &mut [T]) -> Result<(), DssError> {
        if !self.is_factorized() {
            return Err(DssError::NotFactorized);
        }
        let n = self.d.len();
        check_length(b.len(), n)?;
        check_length(x.len(), n)?;

        let mut xs = vec![T::zero(); n];
        self.to_storage(b, &mut xs);
        self.forward(&mut xs, n);
        self.diag_scale(&mut xs, n);
        self.backward(&mut xs, n);
        self.from_storage(&xs, x);
        Ok(())
    }

    fn multiply_by_vector(&self, x: &[T], y: &mut [T]) -> Result<(), DssError> {
        check_unfactorized(self.state)?;
        let n = self.d.len();
        check_length(x.len(), n)?;
        check_length(y.len(), n)?;

        let mut xs = vec![T::zero(); n];
        let mut ys = vec![T::zero(); n];
        self.to_storage(x, &mut xs);

        let lower = self.lower_values();
        for j in 0..n {
            ys[j] += self.d[j] * xs[j];
            let tj = top(&self.colstart, j);
            let seg = self.colstart[j]..self.colstart[j + 1];
            for (i, (&u, &l)) in zip(&self.upper[seg.clone()], &lower[seg]).enumerate() {
                let i = tj + i;
                ys[i] += u * xs[j];
                ys[j] += l * xs[i];
            }
        }
        self.from_storage(&ys, y);
        Ok(())
    }

    fn times(&mut self, c: T) {
        self.upper.scale(c);
        self.d.scale(c);
        if let Some(lower) = self.lower.as_mut() {
            lower.scale(c);
        }
    }

    fn zero(&mut self) {
        self.upper.set(T::zero());
        self.d.set(T::zero());
        if let Some(lower) = self.lower.as_mut() {
            lower.set(T::zero());
        }
        self.state = FactorizationState::Unfactorized;
    }

    fn schur_complement_factorization(
        &mut self,
        fixed: usize,
        tracer: &mut StabilityTracer<T>,
    ) -> Result<(), DssError> {
        self.check_units(fixed)?;
        check_unfactorized(self.state)?;
        tracer.begin_factorization();

        self.state = match self.eliminate(fixed, tracer) {
            Ok(()) => FactorizationState::Condensed(fixed),
            Err(e) => {
                self.state = FactorizationState::Failed;
                return Err(e);
            }
        };
        Ok(())
    }

    fn solve_a11(&self, x: &mut [T], fixed: usize) -> Result<(), DssError> {
        check_condensed(self.state, fixed)?;
        check_length(x.len(), self.d.len())?;
        self.forward(x, fixed);
        self.diag_scale(x, fixed);
        self.backward(x, fixed);
        Ok(())
    }

    fn sub_a21_a11inv(&self, x: &mut [T], fixed: usize) -> Result<(), DssError> {
        check_condensed(self.state, fixed)?;
        check_length(x.len(), self.d.len())?;
        let p = fixed;

        let mut z = x[..p].to_vec();
        self.forward(&mut z, p);

        let lower = self.lower_values();
        for j in p..self.d.len() {
            let tj = top(&self.colstart, j);
            if tj < p {
                let start = self.colstart[j];
                let s = lower[start..start + (p - tj)].dot(&z[tj..p]);
                x[j] -= s;
            }
        }
        Ok(())
    }

    fn sub_a11inv_a12(&self, x: &mut [T], fixed: usize) -> Result<(), DssError> {
        check_condensed(self.state, fixed)?;
        check_length(x.len(), self.d.len())?;
        let p = fixed;

        let mut w = vec![T::zero(); p];
        for j in p..self.d.len() {
            let tj = top(&self.colstart, j);
            if tj < p {
                let start = self.colstart[j];
                let xj = x[j];
                zip(&mut w[tj..p], &self.upper[start..start + (p - tj)])
                    .for_each(|(w, &u)| *w += u * xj);
            }
        }
        self.backward(&mut w, p);
        zip(&mut x[..p], &w).for_each(|(x, &w)| *x -= w);
        Ok(())
    }

    fn write_condensed_matrix_a22(&self, fixed: usize, a: &mut Vec<T>) -> Result<usize, DssError> {
        check_condensed(self.state, fixed)?;
        let n = self.d.len();
        let p = fixed;
        let k = n - p;

        a.clear();
        a.resize(k * k, T::zero());

        let lower = self.lower_values();
        for j in p..n {
            a[(j - p) + (j - p) * k] = self.d[j];
            let tj = top(&self.colstart, j);
            for i in usize::max(tj, p)..j {
                let pos = self.colstart[j] + (i - tj);
                a[(i - p) + (j - p) * k] = self.upper[pos];
                a[(j - p) + (i - p) * k] = lower[pos];
            }
        }
        Ok(k)
    }

    fn write_statistics(&self, tracer: &mut StabilityTracer<T>) {
        let n = self.d.len();
        let band = (0..n).map(|j| j - top(&self.colstart, j)).max().unwrap_or(0);
        tracer.log(format_args!(
            "skyline: neq = {}, profile = {}, max column height = {}, fixed = {}, kind = {:?}",
            n,
            self.upper.len(),
            band,
            self.fixed,
            self.kind
        ));
    }
}

// extends the column of the entry (i,j) so that it covers both rows
#[inline]
fn grow_skyline(tops: &mut [usize], i: usize, j: usize) {
    let (r, c) = (usize::min(i, j), usize::max(i, j));
    if r < tops[c] {
        tops[c] = r;
    }
}

#[cfg(test)]
#[path = "test.rs"]
mod test;
