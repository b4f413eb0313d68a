//! Direct sparse solver façade used by finite element codes.
//!
//! A [`DssMatrix`] owns the assembled coefficients in a
//! [`SparseMatrixView`] and a storage [`Engine`] holding the factorization.
//! The expected call order is
//!
//! ```text
//! build_internal_structure → assemble* → factorized → solve* → zero → assemble* ...
//! ```
//!
//! Violations of this order are reported as [`DssError`] values.

use crate::algebra::*;
use crate::engines::*;
use crate::io::ConfigurablePrintTarget;
use crate::ordering::{amd_order, Ordering};
use crate::sparse::{ConnectivityPattern, ConnectivityProvider, Orientation, SparseMatrixView};
use crate::timers::*;
use crate::tracer::StabilityTracer;
use crate::{DssError, StructureError};
use std::io::Write;

mod model;
mod settings;
mod sync;

pub use model::*;
pub use settings::*;
pub use sync::*;

/// Dense condensed matrix `A₂₂ - A₂₁ A₁₁⁻¹ A₁₂` over the retained dofs
#[derive(Debug, Clone, PartialEq)]
pub struct CondensedMatrix<T = f64> {
    /// retained dofs in original numbering, one per row and column
    pub dofs: Vec<usize>,
    /// column major values
    pub values: Vec<T>,
}

impl<T> CondensedMatrix<T>
where
    T: FloatT,
{
    pub fn dim(&self) -> usize {
        self.dofs.len()
    }

    pub fn get(&self, r: usize, c: usize) -> T {
        self.values[r + c * self.dofs.len()]
    }
}

/// Sparse matrix with direct factorization.
#[derive(Debug)]
pub struct DssMatrix<T = f64>
where
    T: FloatT,
{
    kind: DssType,
    settings: DssSettings<T>,
    neq: usize,
    fixed: Vec<usize>,
    view: Option<SparseMatrixView<'static, T>>,
    engine: Option<Engine<T>>,
    tracer: StabilityTracer<T>,
    timers: Timers,
    factorized: bool,
    condensed: bool,
    factorizations: usize,
}

impl<T> DssMatrix<T>
where
    T: FloatT,
{
    pub fn new(kind: DssType, settings: DssSettings<T>) -> Self {
        let mut tracer = StabilityTracer::new(settings.min_pivot, settings.stabil_pivot);
        tracer.verbose = settings.verbose;

        Self {
            kind,
            settings,
            neq: 0,
            fixed: Vec::new(),
            view: None,
            engine: None,
            tracer,
            timers: Timers::default(),
            factorized: false,
            condensed: false,
            factorizations: 0,
        }
    }

    /// Creates a matrix taking its structure and coefficients from
    /// `view`, for instance one read with
    /// [`load_matrix`](SparseMatrixView::load_matrix)
    pub fn from_view(kind: DssType, settings: DssSettings<T>, view: SparseMatrixView<'static, T>) -> Result<Self, DssError> {
        let mut dss = Self::new(kind, settings);
        dss.build_from_connectivity(&view)?;
        dss.view = Some(view);
        Ok(dss)
    }

    pub fn kind(&self) -> DssType {
        self.kind
    }

    pub fn settings(&self) -> &DssSettings<T> {
        &self.settings
    }

    pub fn neq(&self) -> usize {
        self.neq
    }

    pub fn fixed_dofs(&self) -> &[usize] {
        &self.fixed
    }

    pub fn engine(&self) -> Option<&Engine<T>> {
        self.engine.as_ref()
    }

    pub fn view(&self) -> Option<&SparseMatrixView<'static, T>> {
        self.view.as_ref()
    }

    pub fn tracer(&self) -> &StabilityTracer<T> {
        &self.tracer
    }

    /// Mutable tracer, for thresholds and the unstable pivot policy
    pub fn tracer_mut(&mut self) -> &mut StabilityTracer<T> {
        &mut self.tracer
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn is_factorized(&self) -> bool {
        self.factorized
    }

    pub fn is_condensed(&self) -> bool {
        self.condensed
    }

    /// number of numeric factorizations performed so far
    pub fn factorization_count(&self) -> usize {
        self.factorizations
    }

    /// Equations (zero based) eliminated by static condensation.  Takes
    /// effect at the next structure build.
    pub fn set_fixed_dofs(&mut self, dofs: &[usize]) {
        self.fixed = dofs.to_vec();
    }

    // ---------------------------------------------
    // structure build
    // ---------------------------------------------

    /// Builds the sparsity structure from the elements of `model`, with
    /// equation numbers given by `scheme`.  Constrained dofs are skipped.
    pub fn build_internal_structure(
        &mut self,
        model: &dyn FeModel,
        neq: usize,
        scheme: &dyn NumberingScheme,
    ) -> Result<(), DssError> {
        let provider = ModelConnectivity { model, scheme, neq };
        self.build_from_connectivity(&provider)
    }

    /// Builds the sparsity structure from the couplings of `provider`.
    /// Previously assembled coefficients are discarded.
    pub fn build_from_connectivity(&mut self, provider: &dyn ConnectivityProvider) -> Result<(), DssError> {
        self.view = None;
        self.engine = None;
        self.factorized = false;
        self.condensed = false;

        let result;
        timeit! {self.timers => "build"; {
            result = self.create_structure(provider);
        }}
        let (view, engine) = result?;

        self.neq = provider.neq();
        engine.write_statistics(&mut self.tracer);
        self.view = Some(view);
        self.engine = Some(engine);
        Ok(())
    }

    fn create_structure(
        &self,
        provider: &dyn ConnectivityProvider,
    ) -> Result<(SparseMatrixView<'static, T>, Engine<T>), DssError> {
        let settings = &self.settings;
        let pattern = ConnectivityPattern::from_provider(provider)?;

        let block = match settings.storage_method.as_str() {
            "skyline" => false,
            "blockgrid" => true,
            _ => {
                settings.block_size > 1
                    && amd_order(&pattern, settings.amd_dense_scale)?.1.flops_per_entry()
                        >= settings.auto_block_ratio
            }
        };

        let engine: Engine<T> = if block {
            BlockSparseGridMatrix::new(
                self.kind,
                &pattern,
                settings.block_size,
                settings.ordering_for(true),
                settings.amd_dense_scale,
                &self.fixed,
            )?
            .into()
        } else {
            let ordering = Ordering::compute(
                settings.ordering_for(false),
                &pattern,
                settings.amd_dense_scale,
                &self.fixed,
            )?;
            SkylineMatrix::new(self.kind, &pattern, ordering, &self.fixed)?.into()
        };

        let orientation = match self.kind.is_symmetric() {
            true => Orientation::Symmetric,
            false => Orientation::CompressedColumns,
        };
        let view = SparseMatrixView::from_pattern(&pattern, orientation);
        Ok((view, engine))
    }

    // ---------------------------------------------
    // assembly
    // ---------------------------------------------

    /// Adds the square element matrix `mat` (column major) at the
    /// equations `loc` (one based, values <= 0 skipped)
    pub fn assemble(&mut self, loc: &[i64], mat: &[T]) -> Result<(), DssError> {
        self.assemble_rect(loc, loc, mat)
    }

    /// Adds the `rloc.len() x cloc.len()` element matrix `mat` (column
    /// major) at rows `rloc` and columns `cloc`.  Symmetric storage only
    /// accumulates entries with row >= column.
    ///
    /// Nothing is added when any entry falls outside of the structure.
    pub fn assemble_rect(&mut self, rloc: &[i64], cloc: &[i64], mat: &[T]) -> Result<(), DssError> {
        if self.factorized || self.condensed {
            return Err(DssError::AlreadyFactorized);
        }
        let view = self.view.as_mut().ok_or(DssError::NoStructure)?;
        check_length(mat.len(), rloc.len() * cloc.len())?;
        let symmetric = view.is_symmetric();

        let mut updates = Vec::with_capacity(mat.len());
        for (c, &lc) in cloc.iter().enumerate() {
            if lc <= 0 {
                continue;
            }
            let j = lc as usize - 1;
            for (r, &lr) in rloc.iter().enumerate() {
                if lr <= 0 {
                    continue;
                }
                let i = lr as usize - 1;
                if symmetric && i < j {
                    continue;
                }
                let k = view
                    .position(i, j)
                    .ok_or(StructureError::EntryOutsidePattern { row: i, col: j })?;
                updates.push((k, mat[r + c * rloc.len()]));
            }
        }

        let values = view.values_mut();
        for (k, v) in updates {
            values[k] += v;
        }
        Ok(())
    }

    /// [`assemble`](Self::assemble) into a matrix shared between
    /// threads, holding `sync` for the duration of the element
    pub fn assemble_shared<S>(sync: &S, loc: &[i64], mat: &[T]) -> Result<(), DssError>
    where
        S: Synchronization<Self>,
    {
        sync.with_exclusive(|dss| dss.assemble(loc, mat))
    }

    // ---------------------------------------------
    // factorization and solution
    // ---------------------------------------------

    /// Factorizes the assembled matrix.  Does nothing when the matrix is
    /// already factorized.
    pub fn factorized(&mut self) -> Result<(), DssError> {
        if self.factorized {
            return Ok(());
        }
        let (Some(view), Some(engine)) = (self.view.as_ref(), self.engine.as_mut()) else {
            return Err(DssError::NoStructure);
        };
        self.condensed = false;

        let result;
        timeit! {self.timers => "factorize"; {
            result = match engine.load_matrix_numbers(view) {
                Ok(()) => engine.factorize(&mut self.tracer),
                Err(e) => Err(e),
            };
        }}
        result?;

        self.factorized = true;
        self.factorizations += 1;
        if self.tracer.regularized_count() > 0 {
            let count = self.tracer.regularized_count();
            self.tracer.log(format_args!("{} pivots regularized", count));
        }
        self.tracer.write_timing(&self.timers);
        Ok(())
    }

    /// Solves `A x = b` with the factorized matrix
    pub fn solve(&mut self, b: &[T], x: &mut [T]) -> Result<(), DssError> {
        if !self.factorized {
            return Err(DssError::NotFactorized);
        }
        let engine = self.engine.as_ref().ok_or(DssError::NoStructure)?;

        let result;
        timeit! {self.timers => "solve"; {
            result = engine.solve(b, x);
        }}
        result
    }

    /// Clears the coefficients and the factorization, keeping the
    /// structure for a new assembly
    pub fn zero(&mut self) {
        if let Some(view) = self.view.as_mut() {
            view.zero();
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.zero();
        }
        self.factorized = false;
        self.condensed = false;
    }

    /// `y = A x` with the assembled coefficients
    pub fn times(&self, x: &[T], y: &mut [T]) -> Result<(), DssError> {
        let view = self.view.as_ref().ok_or(DssError::NoStructure)?;
        check_length(x.len(), self.neq)?;
        check_length(y.len(), self.neq)?;
        view.mul_matrix_by_vector(x, y);
        Ok(())
    }

    /// `A ← c A`.  A factorization is invalidated.
    pub fn times_scalar(&mut self, c: T) {
        if let Some(view) = self.view.as_mut() {
            view.scale(c);
        }
        self.factorized = false;
        self.condensed = false;
    }

    /// Assembled coefficient at (i,j), zero based, zero outside of the
    /// sparsity structure
    pub fn at(&self, i: usize, j: usize) -> T {
        self.view.as_ref().map_or(T::zero(), |view| view.get(i, j))
    }

    /// Mutable reference to the stored coefficient at (i,j), zero based.
    /// `None` outside of the sparsity structure and while the matrix is
    /// factorized, since the factors would no longer match the values.
    pub fn at_mut(&mut self, i: usize, j: usize) -> Option<&mut T> {
        if self.factorized || self.condensed {
            return None;
        }
        let view = self.view.as_mut()?;
        let k = view.position(i, j)?;
        Some(&mut view.values_mut()[k])
    }

    // ---------------------------------------------
    // static condensation
    // ---------------------------------------------

    /// Eliminates the fixed dofs, leaving the condensed matrix over the
    /// retained dofs.  Does nothing when already condensed.
    pub fn schur_factorized(&mut self) -> Result<(), DssError> {
        if self.condensed {
            return Ok(());
        }
        let (Some(view), Some(engine)) = (self.view.as_ref(), self.engine.as_mut()) else {
            return Err(DssError::NoStructure);
        };
        self.factorized = false;
        let units = engine.leading_fixed();

        let result;
        timeit! {self.timers => "condense"; {
            result = match engine.load_matrix_numbers(view) {
                Ok(()) => engine.schur_complement_factorization(units, &mut self.tracer),
                Err(e) => Err(e),
            };
        }}
        result?;

        self.condensed = true;
        self.factorizations += 1;
        self.tracer.write_timing(&self.timers);
        Ok(())
    }

    fn condensed_engine(&self) -> Result<&Engine<T>, DssError> {
        match (self.condensed, self.engine.as_ref()) {
            (true, Some(engine)) => Ok(engine),
            (_, None) => Err(DssError::NoStructure),
            _ => Err(DssError::NotFactorized),
        }
    }

    // (storage position, dof) of every retained dof, in storage order,
    // and the number of eliminated storage dofs
    fn retained(&self, engine: &Engine<T>) -> (usize, Vec<(usize, usize)>) {
        let m = engine.leading_dofs(engine.leading_fixed());
        let mut retained: Vec<(usize, usize)> = (0..self.neq)
            .map(|dof| (engine.storage_dof(dof), dof))
            .filter(|&(s, _)| s >= m)
            .collect();
        retained.sort_unstable();
        (m, retained)
    }

    /// Condensed matrix over the retained dofs
    pub fn condensed_matrix(&self) -> Result<CondensedMatrix<T>, DssError> {
        let engine = self.condensed_engine()?;
        let mut a = Vec::new();
        let k = engine.write_condensed_matrix_a22(engine.leading_fixed(), &mut a)?;
        let (m, retained) = self.retained(engine);

        let n = retained.len();
        let mut values = vec![T::zero(); n * n];
        for (c, &(sc, _)) in retained.iter().enumerate() {
            for (r, &(sr, _)) in retained.iter().enumerate() {
                values[r + c * n] = a[(sr - m) + (sc - m) * k];
            }
        }
        Ok(CondensedMatrix {
            dofs: retained.iter().map(|&(_, dof)| dof).collect(),
            values,
        })
    }

    /// Condensed right hand side `b₂ - A₂₁ A₁₁⁻¹ b₁`, ordered as the
    /// dofs of [`condensed_matrix`](Self::condensed_matrix)
    pub fn condense_rhs(&self, b: &[T]) -> Result<Vec<T>, DssError> {
        let engine = self.condensed_engine()?;
        check_length(b.len(), self.neq)?;

        let mut xs = vec![T::zero(); engine.storage_dim()];
        engine.to_storage(b, &mut xs);
        engine.sub_a21_a11inv(&mut xs, engine.leading_fixed())?;

        let (_, retained) = self.retained(engine);
        Ok(retained.iter().map(|&(s, _)| xs[s]).collect())
    }

    /// Completes the solution `x` from the right hand side `b` and the
    /// solution of the condensed system `x_retained`
    pub fn recover_fixed(&self, b: &[T], x_retained: &[T], x: &mut [T]) -> Result<(), DssError> {
        let engine = self.condensed_engine()?;
        check_length(b.len(), self.neq)?;
        check_length(x.len(), self.neq)?;
        let (_, retained) = self.retained(engine);
        check_length(x_retained.len(), retained.len())?;

        let units = engine.leading_fixed();
        let mut xs = vec![T::zero(); engine.storage_dim()];
        engine.to_storage(b, &mut xs);
        for (&(s, _), &v) in retained.iter().zip(x_retained) {
            xs[s] = v;
        }
        engine.solve_a11(&mut xs, units)?;
        engine.sub_a11inv_a12(&mut xs, units)?;
        engine.from_storage(&xs, x);
        Ok(())
    }
}

impl<T> ConfigurablePrintTarget for DssMatrix<T>
where
    T: FloatT,
{
    fn print_to_stdout(&mut self) {
        self.tracer.print_to_stdout()
    }
    fn print_to_file(&mut self, file: std::fs::File) {
        self.tracer.print_to_file(file)
    }
    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>) {
        self.tracer.print_to_stream(stream)
    }
    fn print_to_buffer(&mut self) {
        self.tracer.print_to_buffer()
    }
    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.tracer.get_print_buffer()
    }
}
