use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error type returned when a sparsity structure, ordering or
/// condensation partition violates its contract.
pub enum StructureError {
    /// An index lies outside of the matrix dimension
    #[error("Index {index} exceeds the matrix dimension {dim}")]
    IndexOutOfRange { index: usize, dim: usize },
    /// Matrix dimension fields and/or array lengths are incompatible
    #[error("Matrix dimension fields and/or array lengths are incompatible")]
    IncompatibleDimension,
    /// Offset array is not monotonic or does not match the index array
    #[error("Bad offset array values")]
    BadOffsets,
    /// Indices are not strictly increasing within a row or column
    #[error("Indices are not strictly increasing within a row or column")]
    BadIndexOrdering,
    /// An ordering is not a bijection
    #[error("Ordering is not a permutation")]
    InvalidPermutation,
    /// Fixed entries do not form the leading range of an ordering
    #[error("Fixed entries do not occupy a contiguous leading range")]
    NonContiguousFixed,
    /// Write to an entry that is not part of the sparsity pattern
    #[error("Entry ({row},{col}) is not part of the sparsity pattern")]
    EntryOutsidePattern { row: usize, col: usize },
    /// Block size of zero
    #[error("Block size must be positive")]
    BadBlockSize,
    /// The fill reducing ordering could not be computed
    #[error("Ordering computation failed")]
    OrderingFailed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error type returned by settings validation
pub enum SettingsError {
    /// An error attributable to one of the fields
    #[error("Bad value for field {0}")]
    BadFieldValue(&'static str),
}

#[derive(Error, Debug)]
/// Error type returned by the direct sparse solver.
pub enum DssError {
    /// Structure build or ordering failure
    #[error(transparent)]
    Structure(#[from] StructureError),
    /// A pivot violated the stability threshold and the tracer declined
    /// to continue
    #[error("Unstable pivot {value:e} at row {row} (block {block})")]
    FactorizationFailure { row: usize, block: usize, value: f64 },
    /// Solve or condensation requested before a successful factorization
    #[error("Matrix is not factorized")]
    NotFactorized,
    /// Coefficients modified after factorization without an intervening zero()
    #[error("Matrix is factorized, call zero() before assembling")]
    AlreadyFactorized,
    /// Operation requested before the internal structure was built
    #[error("Internal structure has not been built")]
    NoStructure,
    /// File or stream error
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Matrix file contents are inconsistent
    #[error("Bad matrix file ({0})")]
    BadFile(&'static str),
    /// Invalid settings
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
