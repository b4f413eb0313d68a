//! Fill and profile reducing orderings.
//!
//! An [`Ordering`] maps the original equation numbering onto the internal
//! storage numbering, stored as `perm[new] = old` together with its
//! inverse.  Orderings used for static condensation keep the fixed
//! equations in a contiguous leading range.

mod amd;
mod rcm;

pub use self::amd::AmdAnalysis;
pub(crate) use self::amd::amd_order;
pub use self::rcm::reverse_cuthill_mckee;

use crate::sparse::ConnectivityPattern;
use crate::StructureError;
use std::iter::zip;

/// Ordering heuristics available to the storage engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingMethod {
    /// keep the original numbering
    Natural,
    /// approximate minimum degree, reduces fill
    Amd,
    /// reverse Cuthill-McKee, reduces profile and bandwidth
    ReverseCuthillMcKee,
}

impl OrderingMethod {
    /// Parses the names accepted in the solver settings
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "natural" => Some(OrderingMethod::Natural),
            "amd" => Some(OrderingMethod::Amd),
            "rcm" => Some(OrderingMethod::ReverseCuthillMcKee),
            _ => None,
        }
    }
}

/// Bijection between original and storage numbering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    perm: Vec<usize>,
    iperm: Vec<usize>,
}

impl Ordering {
    pub fn identity(n: usize) -> Self {
        Self {
            perm: (0..n).collect(),
            iperm: (0..n).collect(),
        }
    }

    /// Creates an ordering from `perm[new] = old`, rejecting
    /// anything that is not a permutation
    pub fn from_perm(perm: Vec<usize>) -> Result<Self, StructureError> {
        let iperm = invperm(&perm)?;
        Ok(Self { perm, iperm })
    }

    /// Computes an ordering of `pattern` with `method`, then moves the
    /// entries `fixed` to the leading range
    pub fn compute(
        method: OrderingMethod,
        pattern: &ConnectivityPattern,
        amd_dense_scale: f64,
        fixed: &[usize],
    ) -> Result<Self, StructureError> {
        let perm = match method {
            OrderingMethod::Natural => (0..pattern.neq()).collect(),
            OrderingMethod::Amd => amd_order(pattern, amd_dense_scale)?.0,
            OrderingMethod::ReverseCuthillMcKee => reverse_cuthill_mckee(pattern),
        };
        Self::from_perm(perm)?.with_leading(fixed)
    }

    pub fn len(&self) -> usize {
        self.perm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perm.is_empty()
    }

    /// `perm[new] = old`
    pub fn perm(&self) -> &[usize] {
        &self.perm
    }

    /// `iperm[old] = new`
    pub fn iperm(&self) -> &[usize] {
        &self.iperm
    }

    #[inline]
    pub fn to_old(&self, new: usize) -> usize {
        self.perm[new]
    }

    #[inline]
    pub fn to_new(&self, old: usize) -> usize {
        self.iperm[old]
    }

    /// `x[new] = b[old]`
    pub fn permute<T: Copy>(&self, x: &mut [T], b: &[T]) {
        zip(&self.perm, x).for_each(|(&p, x)| *x = b[p]);
    }

    /// `x[old] = b[new]`
    pub fn ipermute<T: Copy>(&self, x: &mut [T], b: &[T]) {
        zip(&self.perm, b).for_each(|(&p, &b)| x[p] = b);
    }

    /// Stable partition moving the original entries `fixed` to the
    /// front.  Relative order within both parts is preserved.
    pub fn with_leading(self, fixed: &[usize]) -> Result<Self, StructureError> {
        if fixed.is_empty() {
            return Ok(self);
        }
        let n = self.len();
        let mut is_fixed = vec![false; n];
        for &f in fixed {
            if f >= n {
                return Err(StructureError::IndexOutOfRange { index: f, dim: n });
            }
            if std::mem::replace(&mut is_fixed[f], true) {
                return Err(StructureError::InvalidPermutation);
            }
        }

        let (mut perm, rest): (Vec<usize>, Vec<usize>) =
            self.perm.iter().partition(|&&old| is_fixed[old]);
        perm.extend(rest);
        Self::from_perm(perm)
    }

    /// Checks that the original entries `fixed` occupy the leading range
    pub fn check_leading(&self, fixed: &[usize]) -> Result<(), StructureError> {
        let nfixed = fixed.len();
        let mut seen = vec![false; nfixed];
        for &f in fixed {
            let new = *self
                .iperm
                .get(f)
                .ok_or(StructureError::IndexOutOfRange { index: f, dim: self.len() })?;
            if new >= nfixed || std::mem::replace(&mut seen[new], true) {
                return Err(StructureError::NonContiguousFixed);
            }
        }
        Ok(())
    }
}

// inverse permutation, or error if p is not a bijection
pub(crate) fn invperm(p: &[usize]) -> Result<Vec<usize>, StructureError> {
    const UNSET: usize = usize::MAX;
    let mut b = vec![UNSET; p.len()];

    for (i, &j) in p.iter().enumerate() {
        if j < p.len() && b[j] == UNSET {
            b[j] = i;
        } else {
            return Err(StructureError::InvalidPermutation);
        }
    }
    Ok(b)
}

#[cfg(test)]
#[path = "test.rs"]
mod test;
