use super::*;
use crate::algebra::*;
use crate::StructureError;

/// Layout of the compressed arrays of a [`SparseMatrixView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// range `i` holds row `i`, indices are columns
    CompressedRows,
    /// range `j` holds column `j`, indices are rows
    CompressedColumns,
    /// lower half only: range `j` holds column `j`, indices are rows `>= j`
    Symmetric,
}

impl Orientation {
    pub(crate) fn code(&self) -> u8 {
        match self {
            Orientation::CompressedRows => 0,
            Orientation::CompressedColumns => 1,
            Orientation::Symmetric => 2,
        }
    }

    pub(crate) fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Orientation::CompressedRows),
            1 => Some(Orientation::CompressedColumns),
            2 => Some(Orientation::Symmetric),
            _ => None,
        }
    }
}

/// Square sparse matrix in compressed row, compressed column or
/// symmetric lower half layout.
///
/// The backing arrays are either owned by the view or borrowed from the
/// caller.  Borrowed views are read only: the first mutable access to the
/// values makes a private zero based copy of all arrays, and
/// [`detach`](SparseMatrixView::detach) converts a borrowed view into one
/// with a `'static` lifetime.
#[derive(Debug, Clone)]
pub struct SparseMatrixView<'a, T = f64> {
    neq: usize,
    orientation: Orientation,
    storage: Storage<'a, T>,
}

impl<T> SparseMatrixView<'static, T>
where
    T: FloatT,
{
    /// Creates an owning view from zero based start pointer arrays.
    ///
    /// The arrays are checked for consistency.  Symmetric views must store
    /// only entries with row index at least equal to the column index.
    pub fn new(
        neq: usize,
        orientation: Orientation,
        offsets: Vec<usize>,
        indices: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, StructureError> {
        let arrays = OwnedArrays {
            offsets,
            indices,
            values,
        };
        arrays.check_format(neq, orientation == Orientation::Symmetric)?;
        Ok(Self {
            neq,
            orientation,
            storage: Storage::Owned(arrays),
        })
    }

    /// Creates a zero valued skeleton covering every coupling reported
    /// by `provider`, plus the full diagonal.
    pub fn from_connectivity(
        provider: &dyn ConnectivityProvider,
        orientation: Orientation,
    ) -> Result<Self, StructureError> {
        let pattern = ConnectivityPattern::from_provider(provider)?;
        Ok(Self::from_pattern(&pattern, orientation))
    }

    /// Creates a zero valued skeleton from a symmetric pattern.
    pub fn from_pattern(pattern: &ConnectivityPattern, orientation: Orientation) -> Self {
        let neq = pattern.neq();

        // the pattern is structurally symmetric, so row and
        // column compression give identical arrays
        let (offsets, indices) = match orientation {
            Orientation::Symmetric => {
                let mut offsets = Vec::with_capacity(neq + 1);
                let mut indices: Vec<usize> = Vec::new();
                offsets.push(0);
                for j in 0..neq {
                    indices.extend(pattern.column(j).iter().filter(|&&i| i >= j));
                    offsets.push(indices.len());
                }
                (offsets, indices)
            }
            _ => (pattern.colptr().to_vec(), pattern.rowval().to_vec()),
        };

        let values = vec![T::zero(); indices.len()];
        Self {
            neq,
            orientation,
            storage: Storage::Owned(OwnedArrays {
                offsets,
                indices,
                values,
            }),
        }
    }
}

impl<'a, T> SparseMatrixView<'a, T>
where
    T: FloatT,
{
    /// Creates a view over caller owned arrays without copying.
    ///
    /// Array consistency is a caller contract and is only checked in
    /// debug builds.
    pub fn borrowed(neq: usize, orientation: Orientation, arrays: BorrowedArrays<'a, T>) -> Self {
        let storage = Storage::Borrowed(arrays);
        debug_assert!(storage
            .to_owned_arrays(neq)
            .check_format(neq, orientation == Orientation::Symmetric)
            .is_ok());
        Self {
            neq,
            orientation,
            storage,
        }
    }

    /// Owning deep copy of this view
    pub fn create_local_copy(&self) -> SparseMatrixView<'static, T> {
        SparseMatrixView {
            neq: self.neq,
            orientation: self.orientation,
            storage: Storage::Owned(self.storage.to_owned_arrays(self.neq)),
        }
    }

    /// Converts into an owning view, copying only if the arrays are borrowed
    pub fn detach(self) -> SparseMatrixView<'static, T> {
        let storage = match self.storage {
            Storage::Owned(arrays) => arrays,
            borrowed => borrowed.to_owned_arrays(self.neq),
        };
        SparseMatrixView {
            neq: self.neq,
            orientation: self.orientation,
            storage: Storage::Owned(storage),
        }
    }

    pub fn neq(&self) -> usize {
        self.neq
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_symmetric(&self) -> bool {
        self.orientation == Orientation::Symmetric
    }

    pub fn is_owned(&self) -> bool {
        self.storage.is_owned()
    }

    /// zero based start of range `i`, for `i` in `0..=neq`
    #[inline]
    pub fn adr(&self, i: usize) -> usize {
        self.storage.adr(i)
    }

    /// zero based index stored at position `k`
    #[inline]
    pub fn ci(&self, k: usize) -> usize {
        self.storage.ci(k)
    }

    /// number of stored entries
    pub fn nonzeros(&self) -> usize {
        self.adr(self.neq)
    }

    pub fn values(&self) -> &[T] {
        &self.storage.values()[0..self.nonzeros()]
    }

    /// Mutable access to the values.  Borrowed arrays are copied first.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.make_owned().values
    }

    fn make_owned(&mut self) -> &mut OwnedArrays<T> {
        if let Storage::Borrowed(_) = self.storage {
            self.storage = Storage::Owned(self.storage.to_owned_arrays(self.neq));
        }
        match &mut self.storage {
            Storage::Owned(arrays) => arrays,
            Storage::Borrowed(_) => unreachable!(),
        }
    }

    // (range, index) of the entry (i,j) in compressed coordinates
    #[inline]
    fn compressed_coords(&self, i: usize, j: usize) -> (usize, usize) {
        match self.orientation {
            Orientation::CompressedRows => (i, j),
            Orientation::CompressedColumns => (j, i),
            Orientation::Symmetric => (usize::min(i, j), usize::max(i, j)),
        }
    }

    /// Position of entry (i,j) in the value array, if it is stored.
    /// Symmetric views map entries above the diagonal to their mirror.
    pub fn position(&self, i: usize, j: usize) -> Option<usize> {
        if i >= self.neq || j >= self.neq {
            return None;
        }
        let (r, c) = self.compressed_coords(i, j);
        let (start, stop) = (self.adr(r), self.adr(r + 1));

        match &self.storage {
            Storage::Owned(a) => a.indices[start..stop]
                .binary_search(&c)
                .ok()
                .map(|p| start + p),
            Storage::Borrowed(_) => (start..stop).find(|&k| self.ci(k) == c),
        }
    }

    /// Value of entry (i,j), zero outside of the pattern
    pub fn get(&self, i: usize, j: usize) -> T {
        self.position(i, j)
            .map_or(T::zero(), |k| self.storage.values()[k])
    }

    /// Accumulates `v` into entry (i,j)
    pub fn add_to(&mut self, i: usize, j: usize, v: T) -> Result<(), StructureError> {
        let k = self
            .position(i, j)
            .ok_or(StructureError::EntryOutsidePattern { row: i, col: j })?;
        self.values_mut()[k] += v;
        Ok(())
    }

    /// Calls `f(row, col, value)` for every stored entry
    pub fn for_each_entry(&self, mut f: impl FnMut(usize, usize, T)) {
        let values = self.storage.values();
        for r in 0..self.neq {
            for k in self.adr(r)..self.adr(r + 1) {
                let c = self.ci(k);
                match self.orientation {
                    Orientation::CompressedRows => f(r, c, values[k]),
                    _ => f(c, r, values[k]),
                }
            }
        }
    }

    /// Writes the diagonal of the matrix into `d`
    pub fn read_diagonal(&self, d: &mut [T]) {
        assert_eq!(d.len(), self.neq);
        for (i, d) in d.iter_mut().enumerate() {
            *d = self.get(i, i);
        }
    }

    /// Multiplies all values by `c`
    pub fn scale(&mut self, c: T) {
        self.values_mut().scale(c);
    }

    /// Clears all values, keeping the structure
    pub fn zero(&mut self) {
        self.values_mut().set(T::zero());
    }
}

impl<'a, T> ConnectivityProvider for SparseMatrixView<'a, T>
where
    T: FloatT,
{
    fn neq(&self) -> usize {
        self.neq
    }

    fn for_each_coupling(&self, f: &mut dyn FnMut(usize, usize)) {
        self.for_each_entry(|r, c, _| f(r, c));
    }
}
