#![allow(non_snake_case)]

use super::*;
use crate::ordering::{Ordering, OrderingMethod};
use crate::sparse::{ConnectivityPattern, ConnectivityProvider};
use crate::StructureError;

mod diagonal;
mod factor;

// storage dofs not carrying an equation
const PADDING: usize = usize::MAX;

// one block column of the strict upper triangle
#[derive(Debug, Clone)]
struct SparseGridColumn<T> {
    // sorted block rows, all above the diagonal
    rows: Vec<usize>,
    // blocks (rows[k], J), b x b column major each
    upper: Vec<T>,
    // blocks (J, rows[k]) of the unsymmetric kind
    lower: Option<Vec<T>>,
}

impl<T> SparseGridColumn<T> {
    #[inline]
    fn find(&self, I: usize) -> Option<usize> {
        self.rows.binary_search(&I).ok()
    }
}

/// Dense blocks on a sparse block grid.
///
/// The equations are grouped `B` at a time into blocks following a node
/// ordering, and the blocks are then numbered by a second ordering of the
/// block graph.  Every block row is padded to `B` storage dofs with dummy
/// dofs carrying a unit diagonal, and the fixed dofs fill the leading
/// blocks so that static condensation works on whole blocks.
///
/// Only nonempty blocks of the factor are stored: one `B×B` dense diagonal
/// block per block row, and per block column the sorted list of block rows
/// above the diagonal, including the fill predicted by the elimination
/// tree.  The unsymmetric kind stores the mirrored lower blocks as well.
#[derive(Debug)]
pub struct BlockSparseGridMatrix<T = f64> {
    kind: DssType,
    bsize: usize,
    n_blocks: usize,
    fixed_blocks: usize,
    node_ordering: Ordering,
    block_ordering: Ordering,
    dof_to_storage: Vec<usize>,
    storage_to_dof: Vec<usize>,
    columns: Vec<SparseGridColumn<T>>,
    diag: Vec<T>,
    init_blocks: usize,
    pattern_nnz: usize,
    multiplications: usize,
    state: FactorizationState,
}

impl<T> BlockSparseGridMatrix<T>
where
    T: FloatT,
{
    /// Creates the block structure for the couplings of `provider`.
    ///
    /// The dofs are ordered with `method`, the resulting blocks once more
    /// with `method` on the block graph.  The original dofs `fixed` are
    /// placed in the leading blocks.
    pub fn new(
        kind: DssType,
        provider: &dyn ConnectivityProvider,
        block_size: usize,
        method: OrderingMethod,
        amd_dense_scale: f64,
        fixed: &[usize],
    ) -> Result<Self, StructureError> {
        if block_size == 0 {
            return Err(StructureError::BadBlockSize);
        }
        let pattern = ConnectivityPattern::from_provider(provider)?;
        let node_ordering = Ordering::compute(method, &pattern, amd_dense_scale, fixed)?;

        let b = block_size;
        let n = pattern.neq();
        let nfixed = fixed.len();
        let fixed_blocks = (nfixed + b - 1) / b;
        let n_blocks = fixed_blocks + (n - nfixed + b - 1) / b;

        // node groups, fixed dofs padded separately from the rest
        let mut group = vec![0; n];
        let mut local = vec![0; n];
        for s in 0..n {
            let old = node_ordering.to_old(s);
            let (g, l) = if s < nfixed {
                (s / b, s % b)
            } else {
                (fixed_blocks + (s - nfixed) / b, (s - nfixed) % b)
            };
            group[old] = g;
            local[old] = l;
        }

        let block_pattern = pattern.coarsen(&group, n_blocks);
        let leading: Vec<usize> = (0..fixed_blocks).collect();
        let block_ordering = Ordering::compute(method, &block_pattern, amd_dense_scale, &leading)?;

        let mut dof_to_storage = vec![0; n];
        let mut storage_to_dof = vec![PADDING; n_blocks * b];
        for old in 0..n {
            let s = block_ordering.to_new(group[old]) * b + local[old];
            dof_to_storage[old] = s;
            storage_to_dof[s] = old;
        }

        let permuted = block_pattern.permute(block_ordering.perm(), block_ordering.iperm());
        let bb = b * b;
        let columns = symbolic_fill(&permuted)
            .into_iter()
            .map(|rows| {
                let len = rows.len() * bb;
                SparseGridColumn {
                    rows,
                    upper: vec![T::zero(); len],
                    lower: (!kind.is_symmetric()).then(|| vec![T::zero(); len]),
                }
            })
            .collect();

        Ok(Self {
            kind,
            bsize: b,
            n_blocks,
            fixed_blocks,
            node_ordering,
            block_ordering,
            dof_to_storage,
            storage_to_dof,
            columns,
            diag: vec![T::zero(); n_blocks * bb],
            init_blocks: (block_pattern.nnz() - n_blocks) / 2,
            pattern_nnz: pattern.nnz(),
            multiplications: 0,
            state: FactorizationState::Unfactorized,
        })
    }

    pub fn block_size(&self) -> usize {
        self.bsize
    }

    pub fn n_blocks(&self) -> usize {
        self.n_blocks
    }

    /// number of dummy dofs added to fill the blocks
    pub fn n_padding(&self) -> usize {
        self.storage_to_dof.len() - self.dof_to_storage.len()
    }

    /// number of stored off diagonal blocks of one triangle, fill included
    pub fn blocks(&self) -> usize {
        self.columns.iter().map(|c| c.rows.len()).sum()
    }

    /// number of off diagonal blocks of one triangle coupled by the
    /// connectivity, before fill
    pub fn init_blocks(&self) -> usize {
        self.init_blocks
    }

    /// block rows above the diagonal stored in block column `J`
    pub fn column_blocks(&self, J: usize) -> &[usize] {
        &self.columns[J].rows
    }

    /// Counts the stored blocks, diagonal blocks included, that hold at
    /// least one nonzero coefficient
    pub fn compute_blocks(&self) -> usize {
        let bb = self.bsize * self.bsize;
        let nonzero = |blk: &[T]| blk.iter().any(|&v| v != T::zero());

        let diagonal = self.diag.chunks_exact(bb).filter(|blk| nonzero(*blk)).count();
        let offdiagonal: usize = self
            .columns
            .iter()
            .map(|col| {
                let lower = col.lower.as_deref().unwrap_or(&[]);
                (0..col.rows.len())
                    .filter(|&k| {
                        let range = k * bb..(k + 1) * bb;
                        nonzero(&col.upper[range.clone()])
                            || lower.get(range).map_or(false, |blk| nonzero(blk))
                    })
                    .count()
            })
            .sum();
        diagonal + offdiagonal
    }

    /// Fraction of the initially stored coefficients that are structural
    /// zeros inside partially coupled blocks
    pub fn get_waste(&self) -> f64 {
        let bb = (self.bsize * self.bsize) as f64;
        let stored = (self.n_blocks + 2 * self.init_blocks) as f64 * bb;
        if stored == 0.0 {
            return 0.0;
        }
        1.0 - self.pattern_nnz as f64 / stored
    }

    /// block multiply accumulate operations of the last factorization
    pub fn no_multiplications(&self) -> usize {
        self.multiplications
    }

    pub fn node_ordering(&self) -> &Ordering {
        &self.node_ordering
    }

    pub fn block_ordering(&self) -> &Ordering {
        &self.block_ordering
    }

    /// original dof held by storage dof `s`, `None` for padding
    pub fn storage_to_dof(&self, s: usize) -> Option<usize> {
        match self.storage_to_dof[s] {
            PADDING => None,
            dof => Some(dof),
        }
    }

    // accumulates v into storage entry (sr,sc)
    fn add_value(&mut self, sr: usize, sc: usize, v: T) -> Option<()> {
        let b = self.bsize;
        let bb = b * b;
        let (I, i, J, j) = (sr / b, sr % b, sc / b, sc % b);

        if I == J {
            self.diag[J * bb + i + j * b] += v;
        } else if I < J {
            let col = &mut self.columns[J];
            let k = col.find(I)?;
            col.upper[k * bb + i + j * b] += v;
        } else {
            let col = &mut self.columns[I];
            let k = col.find(J)?;
            col.lower.as_mut()?[k * bb + i + j * b] += v;
        }
        Some(())
    }

    // symmetric kinds keep the full diagonal blocks and the upper
    // off diagonal blocks only
    fn add_symmetric(&mut self, sr: usize, sc: usize, v: T) -> Option<()> {
        let b = self.bsize;
        if sr / b == sc / b {
            self.add_value(sr, sc, v)?;
            if sr != sc {
                self.add_value(sc, sr, v)?;
            }
            Some(())
        } else if sr / b < sc / b {
            self.add_value(sr, sc, v)
        } else {
            self.add_value(sc, sr, v)
        }
    }

    fn check_units(&self, fixed: usize) -> Result<(), DssError> {
        if fixed > self.n_blocks {
            return Err(StructureError::IndexOutOfRange {
                index: fixed,
                dim: self.n_blocks,
            }
            .into());
        }
        Ok(())
    }
}

impl<T> FactorizableMatrix<T> for BlockSparseGridMatrix<T>
where
    T: FloatT,
{
    fn neq(&self) -> usize {
        self.dof_to_storage.len()
    }

    fn storage_dim(&self) -> usize {
        self.storage_to_dof.len()
    }

    fn nonzeros(&self) -> usize {
        let copies = if self.kind.is_symmetric() { 1 } else { 2 };
        (self.n_blocks + copies * self.blocks()) * self.bsize * self.bsize
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
        self.fixed_blocks
    }

    fn leading_dofs(&self, units: usize) -> usize {
        units * self.bsize
    }

    fn storage_dof(&self, dof: usize) -> usize {
        self.dof_to_storage[dof]
    }

    fn to_storage(&self, b: &[T], xs: &mut [T]) {
        xs.set(T::zero());
        for (&s, &v) in self.dof_to_storage.iter().zip(b) {
            xs[s] = v;
        }
    }

    fn from_storage(&self, xs: &[T], x: &mut [T]) {
        for (&s, x) in self.dof_to_storage.iter().zip(x) {
            *x = xs[s];
        }
    }

    fn load_matrix_numbers(&mut self, view: &SparseMatrixView<T>) -> Result<(), DssError> {
        check_length(view.neq(), self.neq())?;
        self.zero();

        let symmetric_view = view.is_symmetric();
        let symmetric_kind = self.kind.is_symmetric();
        let mut error = None;

        view.for_each_entry(|r, c, v| {
            if symmetric_kind && !symmetric_view && r < c {
                return;
            }
            let (sr, sc) = (self.dof_to_storage[r], self.dof_to_storage[c]);
            let ok = if symmetric_kind {
                self.add_symmetric(sr, sc, v).is_some()
            } else if symmetric_view && r != c {
                let upper = self.add_value(sr, sc, v).is_some();
                let lower = self.add_value(sc, sr, v).is_some();
                upper && lower
            } else {
                self.add_value(sr, sc, v).is_some()
            };
            if !ok {
                error.get_or_insert(StructureError::EntryOutsidePattern { row: r, col: c });
            }
        });
        if let Some(e) = error {
            return Err(e.into());
        }

        // unit diagonal on the dummy dofs
        let b = self.bsize;
        for s in 0..self.storage_to_dof.len() {
            if self.storage_to_dof[s] == PADDING {
                self.diag[(s / b) * b * b + (s % b) * (b + 1)] = T::one();
            }
        }
        Ok(())
    }

    fn factorize(&mut self, tracer: &mut StabilityTracer<T>) -> Result<(), DssError> {
        check_unfactorized(self.state)?;
        tracer.begin_factorization();

        self.state = match self.eliminate(self.n_blocks, tracer) {
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
        check_length(b.len(), self.neq())?;
        check_length(x.len(), self.neq())?;

        let p = self.n_blocks;
        let mut xs = vec![T::zero(); self.storage_dim()];
        self.to_storage(b, &mut xs);
        self.forward(&mut xs, p);
        self.diag_scale(&mut xs, p);
        self.backward(&mut xs, p);
        self.from_storage(&xs, x);
        Ok(())
    }

    fn multiply_by_vector(&self, x: &[T], y: &mut [T]) -> Result<(), DssError> {
        check_unfactorized(self.state)?;
        check_length(x.len(), self.neq())?;
        check_length(y.len(), self.neq())?;

        let b = self.bsize;
        let bb = b * b;
        let mut xs = vec![T::zero(); self.storage_dim()];
        let mut ys = vec![T::zero(); self.storage_dim()];
        self.to_storage(x, &mut xs);

        // the kernels subtract, so -y is accumulated
        for (J, col) in self.columns.iter().enumerate() {
            let xj = &xs[J * b..(J + 1) * b];
            gemv_n_sub(&mut ys[J * b..(J + 1) * b], &self.diag[J * bb..(J + 1) * bb], xj, b);

            for (k, &I) in col.rows.iter().enumerate() {
                let xi = &xs[I * b..(I + 1) * b];
                let blk = &col.upper[k * bb..(k + 1) * bb];
                gemv_n_sub(&mut ys[I * b..(I + 1) * b], blk, xj, b);
                match col.lower.as_ref() {
                    Some(lower) => gemv_n_sub(&mut ys[J * b..(J + 1) * b], &lower[k * bb..(k + 1) * bb], xi, b),
                    None => gemv_t_sub(&mut ys[J * b..(J + 1) * b], blk, xi, b),
                }
            }
        }
        ys.scale(-T::one());
        self.from_storage(&ys, y);
        Ok(())
    }

    fn times(&mut self, c: T) {
        self.diag.scale(c);
        for col in self.columns.iter_mut() {
            col.upper.scale(c);
            if let Some(lower) = col.lower.as_mut() {
                lower.scale(c);
            }
        }
    }

    fn zero(&mut self) {
        self.diag.set(T::zero());
        for col in self.columns.iter_mut() {
            col.upper.set(T::zero());
            if let Some(lower) = col.lower.as_mut() {
                lower.set(T::zero());
            }
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
        check_length(x.len(), self.storage_dim())?;
        self.forward(x, fixed);
        self.diag_scale(x, fixed);
        self.backward(x, fixed);
        Ok(())
    }

    fn sub_a21_a11inv(&self, x: &mut [T], fixed: usize) -> Result<(), DssError> {
        check_condensed(self.state, fixed)?;
        check_length(x.len(), self.storage_dim())?;
        let b = self.bsize;
        let p = fixed;

        let (x1, x2) = x.split_at_mut(p * b);
        let mut z = x1.to_vec();
        self.forward(&mut z, p);

        for J in p..self.n_blocks {
            let xj = &mut x2[(J - p) * b..(J - p + 1) * b];
            let col = &self.columns[J];
            for (k, &K) in col.rows.iter().take_while(|&&K| K < p).enumerate() {
                self.sub_lower_block(col, k, xj, &z[K * b..(K + 1) * b]);
            }
        }
        Ok(())
    }

    fn sub_a11inv_a12(&self, x: &mut [T], fixed: usize) -> Result<(), DssError> {
        check_condensed(self.state, fixed)?;
        check_length(x.len(), self.storage_dim())?;
        let b = self.bsize;
        let bb = b * b;
        let p = fixed;

        // w = -A₁₂ x₂ in the units of the upper factor
        let (x1, x2) = x.split_at_mut(p * b);
        let mut w = vec![T::zero(); p * b];
        for J in p..self.n_blocks {
            let xj = &x2[(J - p) * b..(J - p + 1) * b];
            let col = &self.columns[J];
            for (k, &K) in col.rows.iter().take_while(|&&K| K < p).enumerate() {
                gemv_n_sub(&mut w[K * b..(K + 1) * b], &col.upper[k * bb..(k + 1) * bb], xj, b);
            }
        }
        self.backward(&mut w, p);
        x1.iter_mut().zip(&w).for_each(|(x, &w)| *x += w);
        Ok(())
    }

    fn write_condensed_matrix_a22(&self, fixed: usize, a: &mut Vec<T>) -> Result<usize, DssError> {
        check_condensed(self.state, fixed)?;
        let b = self.bsize;
        let bb = b * b;
        let p = fixed;
        let k = (self.n_blocks - p) * b;

        a.clear();
        a.resize(k * k, T::zero());

        for J in p..self.n_blocks {
            let c0 = (J - p) * b;
            let dj = &self.diag[J * bb..(J + 1) * bb];
            for (c, dcol) in dj.chunks_exact(b).enumerate() {
                a[c0 + (c0 + c) * k..c0 + b + (c0 + c) * k].copy_from_slice(dcol);
            }

            let col = &self.columns[J];
            for (kk, &I) in col.rows.iter().enumerate().filter(|&(_, &I)| I >= p) {
                let r0 = (I - p) * b;
                let upper = &col.upper[kk * bb..(kk + 1) * bb];
                let lower = col.lower.as_ref().map(|l| &l[kk * bb..(kk + 1) * bb]);
                for c in 0..b {
                    for r in 0..b {
                        a[(r0 + r) + (c0 + c) * k] = upper[r + c * b];
                        // block (J,I) is the transpose unless stored
                        a[(c0 + c) + (r0 + r) * k] = match lower {
                            Some(l) => l[c + r * b],
                            None => upper[r + c * b],
                        };
                    }
                }
            }
        }
        Ok(k)
    }

    fn write_statistics(&self, tracer: &mut StabilityTracer<T>) {
        tracer.log(format_args!(
            "blockgrid: neq = {}, block size = {}, blocks = {}, padding = {}, fixed blocks = {}",
            self.neq(),
            self.bsize,
            self.n_blocks,
            self.n_padding(),
            self.fixed_blocks
        ));
        tracer.log(format_args!(
            "blockgrid: init blocks = {}, stored blocks = {}, nonzeros = {}, waste = {:.3}, multiplications = {}",
            self.init_blocks,
            self.blocks(),
            self.nonzeros(),
            self.get_waste(),
            self.multiplications
        ));
    }
}

// Block rows of every column of the factor of a symmetric pattern.
//
// The row subtree of column j is found by walking the elimination tree
// up from every entry above the diagonal until a node already visited
// for j is reached.  Visited nodes are exactly the nonzero rows of
// column j of the factor.
fn symbolic_fill(pattern: &ConnectivityPattern) -> Vec<Vec<usize>> {
    const UNKNOWN: usize = usize::MAX;
    let n = pattern.neq();
    let mut etree = vec![UNKNOWN; n];
    let mut flag = vec![UNKNOWN; n];
    let mut columns = Vec::with_capacity(n);

    for j in 0..n {
        flag[j] = j;
        let mut rows = Vec::new();
        for &i in pattern.column(j).iter().filter(|&&i| i < j) {
            let mut i = i;
            while flag[i] != j {
                if etree[i] == UNKNOWN {
                    etree[i] = j;
                }
                rows.push(i);
                flag[i] = j;
                i = etree[i];
            }
        }
        rows.sort_unstable();
        columns.push(rows);
    }
    columns
}
