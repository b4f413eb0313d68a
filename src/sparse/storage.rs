use crate::StructureError;

/// Offset convention of caller supplied compressed arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetConvention {
    /// `neq+1` offsets, range `i` is `offsets[i]..offsets[i+1]`
    StartPointers,
    /// `neq` offsets holding the exclusive end of each range, the
    /// first range starts at zero
    EndPointers,
}

/// Compressed arrays owned by a view.  Always zero based start
/// pointers of length `neq+1`, with sorted indices in each range.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedArrays<T> {
    pub offsets: Vec<usize>,
    pub indices: Vec<usize>,
    pub values: Vec<T>,
}

/// Compressed arrays borrowed from the caller.
///
/// `index_base` and `offset_base` are subtracted from every stored index
/// and offset, so that one based (Fortran style) arrays can be viewed
/// without copying.
#[derive(Debug, Clone)]
pub struct BorrowedArrays<'a, T> {
    pub offsets: &'a [usize],
    pub indices: &'a [usize],
    pub values: &'a [T],
    pub index_base: usize,
    pub offset_base: usize,
    pub convention: OffsetConvention,
}

/// Backing storage of a [`SparseMatrixView`](crate::sparse::SparseMatrixView).
#[derive(Debug, Clone)]
pub enum Storage<'a, T> {
    Owned(OwnedArrays<T>),
    Borrowed(BorrowedArrays<'a, T>),
}

impl<'a, T> Storage<'a, T>
where
    T: Copy,
{
    /// zero based start of range `i`, for `i` in `0..=neq`
    #[inline]
    pub fn adr(&self, i: usize) -> usize {
        match self {
            Storage::Owned(a) => a.offsets[i],
            Storage::Borrowed(b) => match b.convention {
                OffsetConvention::StartPointers => b.offsets[i] - b.offset_base,
                OffsetConvention::EndPointers => {
                    if i == 0 {
                        0
                    } else {
                        b.offsets[i - 1] - b.offset_base
                    }
                }
            },
        }
    }

    /// zero based index stored at position `k`
    #[inline]
    pub fn ci(&self, k: usize) -> usize {
        match self {
            Storage::Owned(a) => a.indices[k],
            Storage::Borrowed(b) => b.indices[k] - b.index_base,
        }
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        match self {
            Storage::Owned(a) => &a.values,
            Storage::Borrowed(b) => b.values,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Storage::Owned(_))
    }

    /// Deep copy into zero based owned arrays.
    pub fn to_owned_arrays(&self, neq: usize) -> OwnedArrays<T> {
        match self {
            Storage::Owned(a) => a.clone(),
            Storage::Borrowed(b) => {
                let offsets: Vec<usize> = (0..=neq).map(|i| self.adr(i)).collect();
                let nnz = offsets[neq];
                let indices = (0..nnz).map(|k| self.ci(k)).collect();
                let values = b.values[0..nnz].to_vec();
                OwnedArrays {
                    offsets,
                    indices,
                    values,
                }
            }
        }
    }
}

impl<T> OwnedArrays<T> {
    /// Checks compressed array consistency for a square matrix of
    /// dimension `neq`.  With `lower` set, every index in range `j` must
    /// be at least `j`.
    pub fn check_format(&self, neq: usize, lower: bool) -> Result<(), StructureError> {
        if self.indices.len() != self.values.len() {
            return Err(StructureError::IncompatibleDimension);
        }
        if neq.checked_add(1) != Some(self.offsets.len()) || self.offsets[neq] != self.indices.len() {
            return Err(StructureError::IncompatibleDimension);
        }
        if self.offsets[0] != 0 || self.offsets.windows(2).any(|c| c[0] > c[1]) {
            return Err(StructureError::BadOffsets);
        }

        for j in 0..neq {
            let rng = &self.indices[self.offsets[j]..self.offsets[j + 1]];
            if rng.windows(2).any(|c| c[0] >= c[1]) {
                return Err(StructureError::BadIndexOrdering);
            }
            if let Some(&last) = rng.last() {
                if last >= neq {
                    return Err(StructureError::IndexOutOfRange {
                        index: last,
                        dim: neq,
                    });
                }
            }
            if lower && rng.first().is_some_and(|&first| first < j) {
                return Err(StructureError::BadIndexOrdering);
            }
        }
        Ok(())
    }
}
