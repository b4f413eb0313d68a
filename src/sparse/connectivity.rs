use crate::StructureError;

/// Source of the sparsity structure of an assembled matrix.
///
/// Implementors report every pair of coupled equations at least once.
/// Duplicates and either orientation of a pair are allowed.
pub trait ConnectivityProvider {
    /// number of equations
    fn neq(&self) -> usize;

    /// Calls `f(i,j)` for every coupled pair of equations
    fn for_each_coupling(&self, f: &mut dyn FnMut(usize, usize));
}

/// Couplings generated by a list of elements, each given by the zero
/// based equation numbers of its unconstrained dofs.  All dofs of an
/// element are mutually coupled.
#[derive(Debug, Clone, Default)]
pub struct ElementConnectivity {
    pub neq: usize,
    pub elements: Vec<Vec<usize>>,
}

impl ElementConnectivity {
    pub fn new(neq: usize) -> Self {
        Self {
            neq,
            elements: Vec::new(),
        }
    }

    pub fn add_element(&mut self, dofs: Vec<usize>) {
        self.elements.push(dofs);
    }
}

impl ConnectivityProvider for ElementConnectivity {
    fn neq(&self) -> usize {
        self.neq
    }

    fn for_each_coupling(&self, f: &mut dyn FnMut(usize, usize)) {
        for dofs in self.elements.iter() {
            for (a, &i) in dofs.iter().enumerate() {
                for &j in dofs[a..].iter() {
                    f(i, j);
                }
            }
        }
    }
}

/// Structurally symmetric sparsity pattern in compressed column form.
///
/// Row indices are sorted and unique within each column, and every
/// diagonal entry is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityPattern {
    neq: usize,
    colptr: Vec<usize>,
    rowval: Vec<usize>,
}

impl ConnectivityPattern {
    /// Collects and symmetrises all couplings of `provider`
    pub fn from_provider(provider: &dyn ConnectivityProvider) -> Result<Self, StructureError> {
        let neq = provider.neq();
        let mut adjacency: Vec<Vec<usize>> = (0..neq).map(|i| vec![i]).collect();
        let mut error = None;

        provider.for_each_coupling(&mut |i, j| {
            if i >= neq || j >= neq {
                error.get_or_insert(StructureError::IndexOutOfRange {
                    index: usize::max(i, j),
                    dim: neq,
                });
                return;
            }
            if i != j {
                adjacency[j].push(i);
                adjacency[i].push(j);
            }
        });

        if let Some(e) = error {
            return Err(e);
        }
        Ok(Self::from_adjacency(adjacency))
    }

    /// Builds the pattern from per column row lists.  The lists are
    /// sorted and deduplicated here, symmetry is the caller's concern.
    pub(crate) fn from_adjacency(adjacency: Vec<Vec<usize>>) -> Self {
        let neq = adjacency.len();
        let mut colptr = Vec::with_capacity(neq + 1);
        let mut rowval: Vec<usize> = Vec::new();
        colptr.push(0);
        for mut rows in adjacency.into_iter() {
            rows.sort_unstable();
            rows.dedup();
            rowval.extend(rows);
            colptr.push(rowval.len());
        }
        Self {
            neq,
            colptr,
            rowval,
        }
    }

    pub fn neq(&self) -> usize {
        self.neq
    }

    /// total number of entries, both halves and diagonal
    pub fn nnz(&self) -> usize {
        self.rowval.len()
    }

    /// number of entries on and below the diagonal
    pub fn nnz_lower(&self) -> usize {
        (0..self.neq)
            .map(|j| self.column(j).iter().filter(|&&i| i >= j).count())
            .sum()
    }

    pub fn column(&self, j: usize) -> &[usize] {
        &self.rowval[self.colptr[j]..self.colptr[j + 1]]
    }

    pub fn colptr(&self) -> &[usize] {
        &self.colptr
    }

    pub fn rowval(&self) -> &[usize] {
        &self.rowval
    }

    /// Pattern of the matrix with entries grouped by `group[i]`, giving a
    /// pattern of dimension `ngroups`.  Used to build the block graph.
    pub fn coarsen(&self, group: &[usize], ngroups: usize) -> Self {
        assert_eq!(group.len(), self.neq);
        let mut adjacency: Vec<Vec<usize>> = (0..ngroups).map(|g| vec![g]).collect();
        for j in 0..self.neq {
            let gj = group[j];
            adjacency[gj].extend(self.column(j).iter().map(|&i| group[i]));
        }
        Self::from_adjacency(adjacency)
    }

    /// Pattern of `P A Pᵀ` for the ordering `perm[new] = old`
    pub fn permute(&self, perm: &[usize], iperm: &[usize]) -> Self {
        let adjacency = perm
            .iter()
            .map(|&old| self.column(old).iter().map(|&i| iperm[i]).collect())
            .collect();
        Self::from_adjacency(adjacency)
    }
}

impl ConnectivityProvider for ConnectivityPattern {
    fn neq(&self) -> usize {
        self.neq
    }

    fn for_each_coupling(&self, f: &mut dyn FnMut(usize, usize)) {
        for j in 0..self.neq {
            for &i in self.column(j) {
                f(i, j);
            }
        }
    }
}
