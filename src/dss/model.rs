use crate::sparse::ConnectivityProvider;

/// Finite element model seen by the structure build: a list of elements,
/// each touching a set of global dofs.
pub trait FeModel {
    fn number_of_elements(&self) -> usize;

    /// global dof ids of element `e`
    fn element_dofs(&self, e: usize) -> &[usize];
}

/// Equation numbering of the global dofs.
pub trait NumberingScheme {
    /// One based equation number of `dof`.  Zero or negative values mark
    /// a constrained dof that takes no part in the system.
    fn equation_number(&self, dof: usize) -> i64;
}

/// Location array of element `e`: the equation number of every element
/// dof, in element order
pub fn location_array(model: &dyn FeModel, e: usize, scheme: &dyn NumberingScheme) -> Vec<i64> {
    model
        .element_dofs(e)
        .iter()
        .map(|&dof| scheme.equation_number(dof))
        .collect()
}

/// Plain list of element dof sets
#[derive(Debug, Clone, Default)]
pub struct ElementList {
    pub elements: Vec<Vec<usize>>,
}

impl ElementList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_element(&mut self, dofs: Vec<usize>) {
        self.elements.push(dofs);
    }
}

impl FeModel for ElementList {
    fn number_of_elements(&self) -> usize {
        self.elements.len()
    }

    fn element_dofs(&self, e: usize) -> &[usize] {
        &self.elements[e]
    }
}

/// Table of equation numbers indexed by dof
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquationNumbers {
    pub numbers: Vec<i64>,
}

impl EquationNumbers {
    pub fn new(numbers: Vec<i64>) -> Self {
        Self { numbers }
    }

    /// Numbers the free dofs of `0..ndofs` consecutively from one,
    /// giving the dofs in `constrained` number zero
    pub fn with_constraints(ndofs: usize, constrained: &[usize]) -> Self {
        let mut numbers = vec![1; ndofs];
        constrained
            .iter()
            .filter(|&&d| d < ndofs)
            .for_each(|&d| numbers[d] = 0);

        let mut next = 0;
        for n in numbers.iter_mut().filter(|n| **n > 0) {
            next += 1;
            *n = next;
        }
        Self { numbers }
    }

    /// number of equations, the largest equation number
    pub fn neq(&self) -> usize {
        self.numbers.iter().copied().max().unwrap_or(0).max(0) as usize
    }
}

impl NumberingScheme for EquationNumbers {
    fn equation_number(&self, dof: usize) -> i64 {
        self.numbers.get(dof).copied().unwrap_or(0)
    }
}

// couplings of a model under a numbering, constrained dofs dropped
pub(crate) struct ModelConnectivity<'a> {
    pub model: &'a dyn FeModel,
    pub scheme: &'a dyn NumberingScheme,
    pub neq: usize,
}

impl ConnectivityProvider for ModelConnectivity<'_> {
    fn neq(&self) -> usize {
        self.neq
    }

    fn for_each_coupling(&self, f: &mut dyn FnMut(usize, usize)) {
        for e in 0..self.model.number_of_elements() {
            let eqs: Vec<usize> = location_array(self.model, e, self.scheme)
                .into_iter()
                .filter(|&l| l > 0)
                .map(|l| l as usize - 1)
                .collect();
            for (a, &i) in eqs.iter().enumerate() {
                for &j in eqs[a..].iter() {
                    f(i, j);
                }
            }
        }
    }
}
