use super::*;
use crate::ordering::{reverse_cuthill_mckee, Ordering};
use crate::sparse::{ConnectivityPattern, ElementConnectivity, Orientation, SparseMatrixView};
use crate::tracer::{PivotDecision, StabilityTracer};

// 1-D chain of springs, fixed at the left end
//[ 2.0  -1.0    ⋅     ⋅ ]
//[-1.0   2.0  -1.0    ⋅ ]
//[  ⋅   -1.0   2.0  -1.0]
//[  ⋅     ⋅   -1.0   1.0]
fn chain() -> (ConnectivityPattern, SparseMatrixView<'static, f64>) {
    let mut conn = ElementConnectivity::new(4);
    for e in 0..3 {
        conn.add_element(vec![e, e + 1]);
    }
    let pattern = ConnectivityPattern::from_provider(&conn).unwrap();
    let mut A = SparseMatrixView::from_pattern(&pattern, Orientation::Symmetric);
    for i in 0..4 {
        A.add_to(i, i, if i < 3 { 2. } else { 1. }).unwrap();
    }
    for i in 0..3 {
        A.add_to(i + 1, i, -1.).unwrap();
    }
    (pattern, A)
}

fn assert_close(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len());
    let err = a.norm_inf_diff(b);
    assert!(err <= tol, "difference {:e} in {:?} vs {:?}", err, a, b);
}

#[test]
fn test_chain_solve_all_kinds() {
    let (pattern, A) = chain();
    let b = vec![1., 0., 0., 0.];

    for kind in [DssType::SymLDL, DssType::SymLL, DssType::UnsymLU] {
        for ordering in [
            Ordering::identity(4),
            Ordering::from_perm(reverse_cuthill_mckee(&pattern)).unwrap(),
        ] {
            let mut sky = SkylineMatrix::new(kind, &pattern, ordering, &[]).unwrap();
            let mut tracer = StabilityTracer::default();
            sky.load_matrix_numbers(&A).unwrap();
            sky.factorize(&mut tracer).unwrap();

            let mut x = vec![0.; 4];
            sky.solve(&b, &mut x).unwrap();
            assert_close(&x, &[1., 1., 1., 1.], 1e-12);

            // repeated solves reuse the factorization
            let mut x2 = vec![0.; 4];
            sky.solve(&[0., 0., 0., 1.], &mut x2).unwrap();
            assert_close(&x2, &[1., 2., 3., 4.], 1e-12);
            assert_eq!(tracer.regularized_count(), 0);
        }
    }
}

#[test]
fn test_profile() {
    let (pattern, _) = chain();
    let sky = SkylineMatrix::<f64>::new(DssType::SymLDL, &pattern, Ordering::identity(4), &[]).unwrap();
    assert_eq!(sky.profile_length(), 3);
    assert_eq!(sky.nonzeros(), 7);
    assert_eq!(sky.column_top(0), 0);
    assert_eq!(sky.column_top(3), 2);

    // reversing the chain keeps the band
    let ordering = Ordering::from_perm(vec![3, 2, 1, 0]).unwrap();
    let sky = SkylineMatrix::<f64>::new(DssType::UnsymLU, &pattern, ordering, &[]).unwrap();
    assert_eq!(sky.profile_length(), 3);
    assert_eq!(sky.nonzeros(), 10);
}

#[test]
fn test_unsymmetric() {
    // A = [4 1 0]
    //     [2 5 1]
    //     [0 3 6]
    let A = SparseMatrixView::new(
        3,
        Orientation::CompressedColumns,
        vec![0, 2, 5, 7],
        vec![0, 1, 0, 1, 2, 1, 2],
        vec![4., 2., 1., 5., 3., 1., 6.],
    )
    .unwrap();
    let pattern = ConnectivityPattern::from_provider(&A).unwrap();

    let mut sky = SkylineMatrix::new(DssType::UnsymLU, &pattern, Ordering::identity(3), &[]).unwrap();
    sky.load_matrix_numbers(&A).unwrap();

    let mut y = vec![0.; 3];
    sky.multiply_by_vector(&[1., 2., 3.], &mut y).unwrap();
    assert_eq!(y, vec![6., 15., 24.]);

    sky.factorize(&mut StabilityTracer::default()).unwrap();
    let mut x = vec![0.; 3];
    sky.solve(&[6., 15., 24.], &mut x).unwrap();
    assert_close(&x, &[1., 2., 3.], 1e-12);

    // no products with factorized values
    assert!(matches!(
        sky.multiply_by_vector(&x, &mut y),
        Err(DssError::AlreadyFactorized)
    ));
}

#[test]
fn test_unstable_pivots() {
    // A = [0 1]
    //     [1 0]
    let A = SparseMatrixView::new(2, Orientation::Symmetric, vec![0, 2, 3], vec![0, 1, 1], vec![0., 1., 0.]).unwrap();
    let pattern = ConnectivityPattern::from_provider(&A).unwrap();
    let mut sky = SkylineMatrix::new(DssType::SymLDL, &pattern, Ordering::identity(2), &[]).unwrap();

    // default policy regularizes
    let mut tracer = StabilityTracer::new(0.0, 1e-8);
    sky.load_matrix_numbers(&A).unwrap();
    sky.factorize(&mut tracer).unwrap();
    assert!(sky.is_factorized());
    assert_eq!(tracer.regularized_count(), 1);

    // aborting policy fails and leaves nothing to solve with
    tracer.on_unstable_pivot(|_| PivotDecision::Abort);
    sky.load_matrix_numbers(&A).unwrap();
    let err = sky.factorize(&mut tracer).unwrap_err();
    assert!(matches!(err, DssError::FactorizationFailure { row: 0, .. }));
    assert_eq!(sky.state(), FactorizationState::Failed);

    let mut x = vec![0.; 2];
    assert!(matches!(sky.solve(&[1., 1.], &mut x), Err(DssError::NotFactorized)));
}

#[test]
fn test_condensation() {
    let (pattern, A) = chain();
    let b = vec![1., 0., 0., 0.];

    // S = A22 - A21 A11⁻¹ A12 with dofs 0,1 eliminated
    let S = vec![4. / 3., -1., -1., 1.];

    for kind in [DssType::SymLDL, DssType::SymLL, DssType::UnsymLU] {
        let ordering = Ordering::identity(4).with_leading(&[0, 1]).unwrap();
        let mut sky = SkylineMatrix::new(kind, &pattern, ordering, &[0, 1]).unwrap();
        let mut tracer = StabilityTracer::default();
        sky.load_matrix_numbers(&A).unwrap();
        sky.schur_complement_factorization(2, &mut tracer).unwrap();

        let mut a = vec![];
        let k = sky.write_condensed_matrix_a22(2, &mut a).unwrap();
        assert_eq!(k, 2);
        assert_close(&a, &S, 1e-12);

        // condensed right hand side
        let mut xs = b.clone();
        sky.sub_a21_a11inv(&mut xs, 2).unwrap();
        assert_close(&xs, &[1., 0., 1. / 3., 0.], 1e-12);

        // recover the eliminated dofs from x₂ = [1,1]
        let mut xs = vec![1., 0., 1., 1.];
        sky.solve_a11(&mut xs, 2).unwrap();
        sky.sub_a11inv_a12(&mut xs, 2).unwrap();
        assert_close(&xs, &[1., 1., 1., 1.], 1e-12);

        // a different leading count is rejected
        assert!(matches!(
            sky.solve_a11(&mut xs, 1),
            Err(DssError::NotFactorized)
        ));
    }
}

#[test]
fn test_fixed_must_lead() {
    let (pattern, _) = chain();
    let res = SkylineMatrix::<f64>::new(DssType::SymLDL, &pattern, Ordering::identity(4), &[2]);
    assert_eq!(res.unwrap_err(), StructureError::NonContiguousFixed);
}
