#![allow(non_snake_case)]

use super::*;
use crate::StructureError;

fn chain_matrix_sym() -> SparseMatrixView<'static, f64> {
    // A =
    //[ 2.0  -1.0    ⋅     ⋅ ]
    //[-1.0   2.0  -1.0    ⋅ ]
    //[  ⋅   -1.0   2.0  -1.0]
    //[  ⋅     ⋅   -1.0   1.0]
    let offsets = vec![0, 2, 4, 6, 7];
    let indices = vec![0, 1, 1, 2, 2, 3, 3];
    let values = vec![2., -1., 2., -1., 2., -1., 1.];
    SparseMatrixView::new(4, Orientation::Symmetric, offsets, indices, values).unwrap()
}

fn chain_matrix_full(orientation: Orientation) -> SparseMatrixView<'static, f64> {
    let offsets = vec![0, 2, 5, 8, 10];
    let indices = vec![0, 1, 0, 1, 2, 1, 2, 3, 2, 3];
    let values = vec![2., -1., -1., 2., -1., -1., 2., -1., -1., 1.];
    SparseMatrixView::new(4, orientation, offsets, indices, values).unwrap()
}

#[test]
fn test_format_checks() {
    // offsets too short
    let res = SparseMatrixView::new(2, Orientation::CompressedColumns, vec![0, 1], vec![0], vec![1.]);
    assert_eq!(res.unwrap_err(), StructureError::IncompatibleDimension);

    // unsorted indices
    let res = SparseMatrixView::new(
        2,
        Orientation::CompressedColumns,
        vec![0, 2, 2],
        vec![1, 0],
        vec![1., 1.],
    );
    assert_eq!(res.unwrap_err(), StructureError::BadIndexOrdering);

    // index out of range
    let res = SparseMatrixView::new(2, Orientation::CompressedRows, vec![0, 1, 2], vec![0, 2], vec![1., 1.]);
    assert_eq!(
        res.unwrap_err(),
        StructureError::IndexOutOfRange { index: 2, dim: 2 }
    );

    // upper triangle entry in symmetric storage
    let res = SparseMatrixView::new(2, Orientation::Symmetric, vec![0, 1, 2], vec![0, 0], vec![1., 1.]);
    assert_eq!(res.unwrap_err(), StructureError::BadIndexOrdering);

    // dimension with no representable offset array
    let res = SparseMatrixView::<f64>::new(usize::MAX, Orientation::CompressedRows, vec![0], vec![], vec![]);
    assert_eq!(res.unwrap_err(), StructureError::IncompatibleDimension);
}

#[test]
fn test_mul_matrix_by_vector() {
    let x = vec![1., 2., 3., 4.];
    let mut y = vec![0.; 4];

    chain_matrix_sym().mul_matrix_by_vector(&x, &mut y);
    assert_eq!(y, vec![0., 0., 0., 1.]);

    for orientation in [Orientation::CompressedRows, Orientation::CompressedColumns] {
        let mut y = vec![9.; 4];
        chain_matrix_full(orientation).mul_matrix_by_vector(&x, &mut y);
        assert_eq!(y, vec![0., 0., 0., 1.]);
    }
}

#[test]
fn test_unsymmetric_orientation() {
    // A = [1 2]
    //     [0 3]
    let rows = SparseMatrixView::new(2, Orientation::CompressedRows, vec![0, 2, 3], vec![0, 1, 1], vec![1., 2., 3.])
        .unwrap();
    let cols = SparseMatrixView::new(2, Orientation::CompressedColumns, vec![0, 1, 3], vec![0, 0, 1], vec![1., 2., 3.])
        .unwrap();

    let x = vec![1., 1.];
    let mut yr = vec![0.; 2];
    let mut yc = vec![0.; 2];
    rows.mul_matrix_by_vector(&x, &mut yr);
    cols.mul_matrix_by_vector(&x, &mut yc);
    assert_eq!(yr, vec![3., 3.]);
    assert_eq!(yr, yc);
    assert_eq!(rows.get(0, 1), 2.);
    assert_eq!(rows.get(1, 0), 0.);
    assert_eq!(cols.get(0, 1), 2.);
}

#[test]
fn test_symmetric_access() {
    let mut A = chain_matrix_sym();
    assert_eq!(A.nonzeros(), 7);
    assert_eq!(A.get(0, 1), -1.);
    assert_eq!(A.get(1, 0), -1.);
    assert_eq!(A.get(0, 3), 0.);
    assert_eq!(A.position(0, 1), A.position(1, 0));

    let mut d = vec![0.; 4];
    A.read_diagonal(&mut d);
    assert_eq!(d, vec![2., 2., 2., 1.]);

    A.add_to(3, 2, 0.5).unwrap();
    assert_eq!(A.get(2, 3), -0.5);
    assert_eq!(
        A.add_to(3, 0, 1.),
        Err(StructureError::EntryOutsidePattern { row: 3, col: 0 })
    );

    A.scale(2.);
    assert_eq!(A.get(3, 3), 2.);
    A.zero();
    assert!(A.values().iter().all(|&v| v == 0.));
}

#[test]
fn test_borrowed_end_pointers() {
    // same chain matrix, one based with end pointers
    let offsets = [3, 5, 7, 8];
    let indices = [1, 2, 2, 3, 3, 4, 4];
    let values = [2., -1., 2., -1., 2., -1., 1.];
    let arrays = BorrowedArrays {
        offsets: &offsets,
        indices: &indices,
        values: &values,
        index_base: 1,
        offset_base: 1,
        convention: OffsetConvention::EndPointers,
    };
    let mut A = SparseMatrixView::borrowed(4, Orientation::Symmetric, arrays);
    let B = chain_matrix_sym();

    assert!(!A.is_owned());
    assert_eq!(A.nonzeros(), B.nonzeros());
    for i in 0..=4 {
        assert_eq!(A.adr(i), B.adr(i));
    }
    for k in 0..A.nonzeros() {
        assert_eq!(A.ci(k), B.ci(k));
    }

    let copy = A.create_local_copy();
    assert!(copy.is_owned());

    // copy on write leaves the caller's arrays alone
    A.values_mut()[0] = 4.;
    assert!(A.is_owned());
    assert_eq!(A.get(0, 0), 4.);
    assert_eq!(values[0], 2.);
    assert_eq!(copy.get(0, 0), 2.);
}

#[test]
fn test_detach() {
    let values = vec![1., 2.];
    let detached = {
        let offsets = vec![0, 1, 2];
        let indices = vec![0, 1];
        let arrays = BorrowedArrays {
            offsets: &offsets,
            indices: &indices,
            values: &values,
            index_base: 0,
            offset_base: 0,
            convention: OffsetConvention::StartPointers,
        };
        SparseMatrixView::borrowed(2, Orientation::CompressedColumns, arrays).detach()
    };
    assert!(detached.is_owned());
    assert_eq!(detached.get(1, 1), 2.);
}

#[test]
fn test_from_connectivity() {
    let mut conn = ElementConnectivity::new(4);
    conn.add_element(vec![0, 1]);
    conn.add_element(vec![1, 2]);
    conn.add_element(vec![3, 2]);
    conn.add_element(vec![2, 1]); // duplicate

    let sym = SparseMatrixView::<f64>::from_connectivity(&conn, Orientation::Symmetric).unwrap();
    assert_eq!(sym.nonzeros(), 7);
    assert_eq!(sym.adr(4), 7);
    assert!(sym.values().iter().all(|&v| v == 0.));

    let full = SparseMatrixView::<f64>::from_connectivity(&conn, Orientation::CompressedRows).unwrap();
    assert_eq!(full.nonzeros(), 10);

    // a view reports its own structure
    let pattern = ConnectivityPattern::from_provider(&sym).unwrap();
    assert_eq!(pattern.nnz(), 10);
    assert_eq!(pattern.nnz_lower(), 7);
    assert_eq!(pattern.column(1), &[0, 1, 2]);
}

#[test]
fn test_connectivity_out_of_range() {
    let mut conn = ElementConnectivity::new(2);
    conn.add_element(vec![0, 2]);
    let res = ConnectivityPattern::from_provider(&conn);
    assert_eq!(
        res.unwrap_err(),
        StructureError::IndexOutOfRange { index: 2, dim: 2 }
    );
}

#[test]
fn test_pattern_coarsen_and_permute() {
    let mut conn = ElementConnectivity::new(4);
    conn.add_element(vec![0, 1]);
    conn.add_element(vec![2, 3]);
    let pattern = ConnectivityPattern::from_provider(&conn).unwrap();

    // two groups that are not coupled
    let blocks = pattern.coarsen(&[0, 0, 1, 1], 2);
    assert_eq!(blocks.column(0), &[0]);
    assert_eq!(blocks.column(1), &[1]);

    let perm = [0, 2, 1, 3];
    let iperm = [0, 2, 1, 3];
    let permuted = pattern.permute(&perm, &iperm);
    assert_eq!(permuted.column(0), &[0, 2]);
    assert_eq!(permuted.column(1), &[1, 3]);
}

#[test]
fn test_save_load_roundtrip() {
    let A = chain_matrix_sym();

    for format in [MatrixFileFormat::Binary, MatrixFileFormat::Text] {
        let mut buffer: Vec<u8> = Vec::new();
        A.save_matrix(&mut buffer, format).unwrap();
        let B = SparseMatrixView::<f64>::load_matrix(&mut buffer.as_slice(), format).unwrap();

        assert_eq!(B.neq(), 4);
        assert_eq!(B.orientation(), Orientation::Symmetric);
        assert_eq!(B.nonzeros(), A.nonzeros());
        assert_eq!(B.values(), A.values());
    }

    let bad = b"4 7 9\n";
    let res = SparseMatrixView::<f64>::load_matrix(&mut bad.as_slice(), MatrixFileFormat::Text);
    assert!(matches!(res, Err(crate::DssError::BadFile(_))));
}
