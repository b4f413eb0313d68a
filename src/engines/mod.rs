//! Storage engines performing the numeric factorization.
//!
//! Both engines implement [`FactorizableMatrix`] and are collected in the
//! closed [`Engine`] variant.  Vectors passed to the static condensation
//! operations are in storage numbering, as produced by
//! [`to_storage`](FactorizableMatrix::to_storage).  The leading range
//! eliminated by a condensation is counted in dofs for the skyline engine
//! and in blocks for the block sparse grid engine.

use crate::algebra::*;
use crate::sparse::SparseMatrixView;
use crate::tracer::StabilityTracer;
use crate::DssError;
use enum_dispatch::*;

mod blockgrid;
mod parallel;
mod skyline;

pub use blockgrid::*;
pub use skyline::*;

/// Factorization kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DssType {
    /// symmetric `LDLᵀ`
    SymLDL,
    /// symmetric positive definite `LLᵀ`
    SymLL,
    /// unsymmetric `LDU` with symmetric structure, no pivoting
    UnsymLU,
}

impl DssType {
    pub fn is_symmetric(&self) -> bool {
        !matches!(self, DssType::UnsymLU)
    }

    pub(crate) fn is_positive_definite(&self) -> bool {
        matches!(self, DssType::SymLL)
    }
}

/// Numeric state of a storage engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorizationState {
    /// holds the assembled coefficients
    Unfactorized,
    /// holds the complete factorization
    Factorized,
    /// leading range of the given size eliminated, the trailing
    /// part holds the Schur complement
    Condensed(usize),
    /// a factorization was aborted, values are invalid
    Failed,
}

#[enum_dispatch]
pub trait FactorizableMatrix<T>
where
    T: FloatT,
{
    /// number of equations in the original numbering
    fn neq(&self) -> usize;
    /// number of storage dofs, including padding
    fn storage_dim(&self) -> usize;
    /// number of stored coefficients
    fn nonzeros(&self) -> usize;
    fn kind(&self) -> DssType;
    fn state(&self) -> FactorizationState;
    fn is_factorized(&self) -> bool;
    /// number of leading units (dofs or blocks) holding the fixed dofs
    fn leading_fixed(&self) -> usize;
    /// number of storage dofs covered by `units` leading units
    fn leading_dofs(&self, units: usize) -> usize;

    /// storage position of original dof `dof`
    fn storage_dof(&self, dof: usize) -> usize;
    /// scatters `b` (original numbering) into `xs` (storage numbering)
    fn to_storage(&self, b: &[T], xs: &mut [T]);
    /// gathers `x` (original numbering) from `xs` (storage numbering)
    fn from_storage(&self, xs: &[T], x: &mut [T]);

    /// Replaces the stored coefficients by the values of `view`
    fn load_matrix_numbers(&mut self, view: &SparseMatrixView<T>) -> Result<(), DssError>;
    /// Complete factorization of the loaded coefficients
    fn factorize(&mut self, tracer: &mut StabilityTracer<T>) -> Result<(), DssError>;
    /// Solves `A x = b` in the original numbering
    fn solve(&self, b: &[T], x: &mut [T]) -> Result<(), DssError>;
    /// `y = A x` in the original numbering, unfactorized values only
    fn multiply_by_vector(&self, x: &[T], y: &mut [T]) -> Result<(), DssError>;
    /// Multiplies the unfactorized coefficients by `c`
    fn times(&mut self, c: T);
    /// Clears the coefficients and the factorization state
    fn zero(&mut self);

    /// Eliminates the leading `fixed` units, leaving the Schur complement
    /// of the trailing part in place
    fn schur_complement_factorization(
        &mut self,
        fixed: usize,
        tracer: &mut StabilityTracer<T>,
    ) -> Result<(), DssError>;
    /// `x₁ ← A₁₁⁻¹ x₁`
    fn solve_a11(&self, x: &mut [T], fixed: usize) -> Result<(), DssError>;
    /// `x₂ ← x₂ - A₂₁ A₁₁⁻¹ x₁`
    fn sub_a21_a11inv(&self, x: &mut [T], fixed: usize) -> Result<(), DssError>;
    /// `x₁ ← x₁ - A₁₁⁻¹ A₁₂ x₂`
    fn sub_a11inv_a12(&self, x: &mut [T], fixed: usize) -> Result<(), DssError>;
    /// Writes the condensed trailing matrix `A₂₂ - A₂₁ A₁₁⁻¹ A₁₂` as a dense
    /// column major matrix over the trailing storage dofs, returning its
    /// dimension
    fn write_condensed_matrix_a22(&self, fixed: usize, a: &mut Vec<T>) -> Result<usize, DssError>;

    /// Writes structure statistics through the tracer
    fn write_statistics(&self, tracer: &mut StabilityTracer<T>);
}

/// Storage engine of a [`DssMatrix`](crate::dss::DssMatrix)
#[enum_dispatch(FactorizableMatrix<T>)]
#[derive(Debug)]
pub enum Engine<T>
where
    T: FloatT,
{
    Skyline(SkylineMatrix<T>),
    BlockGrid(BlockSparseGridMatrix<T>),
}

impl<T> Engine<T>
where
    T: FloatT,
{
    pub fn name(&self) -> &'static str {
        match self {
            Engine::Skyline(_) => "skyline",
            Engine::BlockGrid(_) => "blockgrid",
        }
    }
}

// shared argument checks for the condensation operations

pub(crate) fn check_condensed(state: FactorizationState, fixed: usize) -> Result<(), DssError> {
    match state {
        FactorizationState::Condensed(p) if p == fixed => Ok(()),
        _ => Err(DssError::NotFactorized),
    }
}

pub(crate) fn check_unfactorized(state: FactorizationState) -> Result<(), DssError> {
    match state {
        FactorizationState::Unfactorized => Ok(()),
        _ => Err(DssError::AlreadyFactorized),
    }
}

pub(crate) fn check_length(len: usize, expected: usize) -> Result<(), DssError> {
    if len != expected {
        return Err(crate::StructureError::IncompatibleDimension.into());
    }
    Ok(())
}
