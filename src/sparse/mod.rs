//! Compressed sparse matrix views and sparsity patterns.
//!
//! A [`SparseMatrixView`] holds the assembled coefficients in compressed
//! row, compressed column or symmetric lower half layout.  Its structure
//! is derived from a [`ConnectivityProvider`], which reports the pairs of
//! equations coupled by at least one element.

mod connectivity;
mod fileio;
mod matvec;
mod storage;
mod view;

pub use connectivity::*;
pub use fileio::*;
pub use storage::*;
pub use view::*;

#[cfg(test)]
#[path = "test.rs"]
mod test;
