//! Pivot stability policy and diagnostic output of the factorizations.

mod callbacks;
pub use callbacks::*;

use crate::algebra::*;
use crate::io::{ConfigurablePrintTarget, OutputSink};
use crate::timers::Timers;
use crate::DssError;
use std::fmt::Arguments;
use std::io::Write;

/// Side channel consulted by the storage engines during factorization.
///
/// The tracer never touches the matrix.  It decides what happens to
/// pivots that are too small, keeps track of the position of the
/// factorization and owns the print target used for statistics, pivot
/// warnings and timings.
#[derive(Debug)]
pub struct StabilityTracer<T = f64> {
    /// pivots with magnitude below this value are unstable
    pub min_pivot: T,
    /// magnitude of a regularized pivot
    pub stabil_pivot: T,
    /// print statistics, warnings and timings
    pub verbose: bool,
    act_block: usize,
    act_row: usize,
    regularized: usize,
    callback: PivotCallback<T>,
    stream: OutputSink,
}

impl<T> Default for StabilityTracer<T>
where
    T: FloatT,
{
    fn default() -> Self {
        Self::new((1e-30).as_T(), (1e-10).as_T())
    }
}

impl<T> StabilityTracer<T>
where
    T: FloatT,
{
    pub fn new(min_pivot: T, stabil_pivot: T) -> Self {
        Self {
            min_pivot,
            stabil_pivot,
            verbose: false,
            act_block: 0,
            act_row: 0,
            regularized: 0,
            callback: PivotCallback::default(),
            stream: OutputSink::default(),
        }
    }

    /// Installs the policy for unstable pivots
    pub fn set_pivot_callback(&mut self, callback: PivotCallback<T>) {
        self.callback = callback;
    }

    /// Convenience wrapper installing a closure as pivot policy
    pub fn on_unstable_pivot<F>(&mut self, f: F)
    where
        F: FnMut(&PivotInfo<T>) -> PivotDecision + Send + 'static,
    {
        self.callback = PivotCallback::Rust(Box::new(f));
    }

    /// block currently being eliminated
    pub fn act_block(&self) -> usize {
        self.act_block
    }

    /// row currently being eliminated
    pub fn act_row(&self) -> usize {
        self.act_row
    }

    /// number of pivots regularized in the last factorization
    pub fn regularized_count(&self) -> usize {
        self.regularized
    }

    pub(crate) fn begin_factorization(&mut self) {
        self.act_block = 0;
        self.act_row = 0;
        self.regularized = 0;
    }

    #[inline]
    pub(crate) fn set_progress(&mut self, block: usize, row: usize) {
        self.act_block = block;
        self.act_row = row;
    }

    /// Checks the pivot `value` at `row` of the active block.
    ///
    /// Returns the pivot to use, which is `value` itself when stable.
    /// Infinite and NaN pivots are always unstable.  An
    /// unstable pivot is either replaced by `±stabil_pivot` or turned into
    /// [`FactorizationFailure`](DssError::FactorizationFailure), depending
    /// on the pivot callback.  Positive definite factorizations also treat
    /// negative pivots as unstable and always regularize to a positive value.
    pub fn check_pivot(&mut self, row: usize, value: T, positive_definite: bool) -> Result<T, DssError> {
        self.act_row = row;

        let unstable = if !value.is_finite() {
            true
        } else if positive_definite {
            value < self.min_pivot || value <= T::zero()
        } else {
            value.abs() < self.min_pivot || value == T::zero()
        };
        if !unstable {
            return Ok(value);
        }

        let block = self.act_block;
        let info = PivotInfo {
            row,
            block,
            value,
            min_pivot: self.min_pivot,
        };

        match self.callback.call(&info) {
            PivotDecision::Continue => {
                self.regularized += 1;
                let pivot = if positive_definite || !(value < T::zero()) {
                    self.stabil_pivot
                } else {
                    -self.stabil_pivot
                };
                self.log(format_args!(
                    "warning: pivot {:e} at row {} (block {}) regularized to {:e}",
                    value, row, block, pivot
                ));
                Ok(pivot)
            }
            PivotDecision::Abort => {
                self.log(format_args!(
                    "error: pivot {:e} at row {} (block {}), factorization aborted",
                    value, row, block
                ));
                Err(DssError::FactorizationFailure {
                    row,
                    block,
                    value: value.to_f64().unwrap_or(f64::NAN),
                })
            }
        }
    }

    /// Writes one line to the print target when verbose.  Output
    /// failures are ignored.
    pub fn log(&mut self, args: Arguments) {
        if self.verbose {
            let _ = writeln!(self.stream, "{}", args);
        }
    }

    /// Writes the timer tree when verbose
    pub fn write_timing(&mut self, timers: &Timers) {
        if self.verbose {
            let _ = writeln!(self.stream, "timing:");
            let _ = timers.write(&mut self.stream);
            let _ = self.stream.flush();
        }
    }
}

impl<T> ConfigurablePrintTarget for StabilityTracer<T> {
    fn print_to_stdout(&mut self) {
        self.stream = OutputSink::Stdout(std::io::stdout());
    }
    fn print_to_file(&mut self, file: std::fs::File) {
        self.stream = OutputSink::File(file);
    }
    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>) {
        self.stream = OutputSink::Stream(stream);
    }
    fn print_to_buffer(&mut self) {
        self.stream = OutputSink::Buffer(Vec::new());
    }
    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.stream.contents()
    }
}
