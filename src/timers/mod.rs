//! Hierarchical wall clock timers for the build, factorization and
//! solve phases.

mod timers;
pub use timers::*;
