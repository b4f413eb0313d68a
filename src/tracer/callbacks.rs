// ---------------------------------
// pivot decision callbacks
// ---------------------------------

/// Decision returned for an unstable pivot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotDecision {
    /// replace the pivot by `±stabil_pivot` and continue
    Continue,
    /// stop the factorization with an error
    Abort,
}

/// Description of an unstable pivot passed to the pivot callback
#[derive(Debug, Clone, Copy)]
pub struct PivotInfo<T> {
    /// storage row of the pivot
    pub row: usize,
    /// storage block of the pivot (equal to `row` for the skyline engine)
    pub block: usize,
    /// computed pivot value
    pub value: T,
    /// threshold that was violated
    pub min_pivot: T,
}

pub type PivotFn<T> = Box<dyn FnMut(&PivotInfo<T>) -> PivotDecision + Send>;

/// Policy applied to unstable pivots
pub enum PivotCallback<T> {
    /// always continue with a regularized pivot
    Regularize,
    /// ask a user supplied closure
    Rust(PivotFn<T>),
}

impl<T> PivotCallback<T> {
    pub(crate) fn call(&mut self, info: &PivotInfo<T>) -> PivotDecision {
        match self {
            PivotCallback::Regularize => PivotDecision::Continue,
            PivotCallback::Rust(f) => f(info),
        }
    }
}

impl<T> Default for PivotCallback<T> {
    fn default() -> Self {
        PivotCallback::Regularize
    }
}

impl<T> std::fmt::Debug for PivotCallback<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PivotCallback::Regularize => write!(f, "PivotCallback::Regularize"),
            PivotCallback::Rust(_) => write!(f, "PivotCallback::Rust"),
        }
    }
}
