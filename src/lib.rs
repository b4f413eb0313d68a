//! __dss__ is a direct sparse solver for the linear systems of finite
//! element codes.
//!
//! The solver factorizes square sparse matrices with a symmetric sparsity
//! structure as
//!
//! $$
//! A = L D L^\top, \qquad A = L L^\top \qquad \text{or} \qquad A = L D U,
//! $$
//!
//! the last one without pivoting.  Two storage engines are available:
//!
//! * __skyline__: variable band (profile) storage, suited to banded
//!   systems of moderate bandwidth after a reverse Cuthill-McKee ordering.
//!
//! * __block sparse grid__: the matrix is split into dense `B×B` blocks
//!   along a fill reducing (AMD) ordering and only nonempty blocks are
//!   stored.  The elimination runs on dense block kernels.
//!
//! Both engines support static condensation: a leading set of fixed
//! equations is eliminated and the Schur complement over the remaining
//! equations is returned as a dense matrix.
//!
//! Unstable pivots are handled by a [`StabilityTracer`](tracer::StabilityTracer),
//! which either regularizes them or aborts the factorization.
//!
//! # Usage
//!
//! ```
//! use dss::dss::*;
//! use dss::engines::DssType;
//!
//! // two springs in a chain, fixed at the left end
//! let mut model = ElementList::new();
//! model.add_element(vec![0, 1]);
//! model.add_element(vec![1, 2]);
//! let numbering = EquationNumbers::with_constraints(3, &[0]);
//!
//! let mut stiffness = DssMatrix::new(DssType::SymLDL, DssSettings::default());
//! stiffness.build_internal_structure(&model, numbering.neq(), &numbering).unwrap();
//!
//! let k = [1., -1., -1., 1.];
//! for e in 0..model.number_of_elements() {
//!     let loc = location_array(&model, e, &numbering);
//!     stiffness.assemble(&loc, &k).unwrap();
//! }
//!
//! stiffness.factorized().unwrap();
//! let mut u = vec![0f64; 2];
//! stiffness.solve(&[0., 1.], &mut u).unwrap();
//! assert!((u[1] - 2.).abs() < 1e-12);
//! ```
//!
//! # License
//!
//! Licensed under Apache License, Version 2.0.

#![allow(non_snake_case)]

pub mod algebra;
pub mod dss;
pub mod engines;
pub mod io;
pub mod ordering;
pub mod sparse;
pub mod timers;
pub mod tracer;

mod error_types;
pub use error_types::*;
