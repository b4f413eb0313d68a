#![allow(non_snake_case)]

use dss::{dss::*, engines::*, io::ConfigurablePrintTarget, sparse::*, DssError, StructureError};
use std::cell::RefCell;
use std::sync::Mutex;

const SPRING: [f64; 4] = [1., -1., -1., 1.];

// chain of `n` springs fixed at dof 0, equations 1..=n
fn spring_chain(n: usize) -> (ElementList, EquationNumbers) {
    let mut model = ElementList::new();
    for i in 0..n {
        model.add_element(vec![i, i + 1]);
    }
    (model, EquationNumbers::with_constraints(n + 1, &[0]))
}

fn built(n: usize, storage: &str) -> (DssMatrix<f64>, ElementList, EquationNumbers) {
    let (model, numbering) = spring_chain(n);
    let settings = DssSettingsBuilder::default()
        .storage_method(storage.to_string())
        .block_size(2)
        .build()
        .unwrap();
    let mut A = DssMatrix::new(DssType::SymLDL, settings);
    A.build_internal_structure(&model, numbering.neq(), &numbering)
        .unwrap();
    (A, model, numbering)
}

fn assemble_all(A: &mut DssMatrix<f64>, model: &ElementList, numbering: &EquationNumbers) {
    for e in 0..model.number_of_elements() {
        A.assemble(&location_array(model, e, numbering), &SPRING)
            .unwrap();
    }
}

#[test]
fn test_call_order_violations() {
    let mut A = DssMatrix::<f64>::new(DssType::SymLDL, DssSettings::default());
    let mut x = vec![0f64; 2];
    assert!(matches!(A.assemble(&[1], &[1.]), Err(DssError::NoStructure)));
    assert!(matches!(A.factorized(), Err(DssError::NoStructure)));
    assert!(matches!(A.solve(&[1., 1.], &mut x), Err(DssError::NotFactorized)));

    for storage in ["skyline", "blockgrid"] {
        let (mut A, model, numbering) = built(3, storage);
        assemble_all(&mut A, &model, &numbering);

        let mut x = vec![0f64; 3];
        assert!(matches!(A.solve(&[0., 0., 1.], &mut x), Err(DssError::NotFactorized)));

        A.factorized().unwrap();
        assert!(matches!(
            A.assemble(&[1, 2], &SPRING),
            Err(DssError::AlreadyFactorized)
        ));

        // wrong vector lengths
        assert!(A.solve(&[1.], &mut x).is_err());
    }
}

#[test]
fn test_factorized_is_idempotent() {
    for storage in ["skyline", "blockgrid"] {
        let (mut A, model, numbering) = built(4, storage);
        assemble_all(&mut A, &model, &numbering);

        A.factorized().unwrap();
        A.factorized().unwrap();
        assert!(A.is_factorized());
        assert_eq!(A.factorization_count(), 1);
        assert_eq!(A.timers().calls(&["factorize"]), 1);

        let mut x = vec![0f64; 4];
        A.solve(&[0., 0., 0., 1.], &mut x).unwrap();
        assert!((x[3] - 4.).abs() < 1e-12);
        A.solve(&[0., 0., 0., 2.], &mut x).unwrap();
        assert!((x[3] - 8.).abs() < 1e-12);
        assert_eq!(A.timers().calls(&["solve"]), 2);
    }
}

#[test]
fn test_zero_and_reassemble() {
    let (mut A, model, numbering) = built(4, "skyline");
    assemble_all(&mut A, &model, &numbering);
    A.factorized().unwrap();

    // new load case with stiffer springs
    A.zero();
    assert!(!A.is_factorized());
    assert_eq!(A.at(0, 0), 0.);
    for e in 0..model.number_of_elements() {
        let k: Vec<f64> = SPRING.iter().map(|v| 2. * v).collect();
        A.assemble(&location_array(&model, e, &numbering), &k)
            .unwrap();
    }
    A.factorized().unwrap();
    assert_eq!(A.factorization_count(), 2);

    let mut x = vec![0f64; 4];
    A.solve(&[0., 0., 0., 1.], &mut x).unwrap();
    assert!((x[3] - 2.).abs() < 1e-12);
}

#[test]
fn test_assembly_accumulates_and_skips_constrained() {
    let (mut A, _, _) = built(2, "skyline");

    // first element touches the constrained dof 0
    A.assemble(&[0, 1], &SPRING).unwrap();
    A.assemble(&[0, 1], &SPRING).unwrap();
    assert_eq!(A.at(0, 0), 2.);

    A.assemble(&[1, 2], &SPRING).unwrap();
    assert_eq!(A.at(0, 0), 3.);
    assert_eq!(A.at(1, 0), -1.);
    assert_eq!(A.at(0, 1), -1.);

    // rectangular block acting on a single coupling
    A.assemble_rect(&[2], &[1], &[-0.5]).unwrap();
    assert_eq!(A.at(1, 0), -1.5);

    // dofs 1 and 3 are not coupled
    let (mut B, _, _) = built(3, "skyline");
    let err = B.assemble(&[1, 3], &SPRING).unwrap_err();
    assert!(matches!(
        err,
        DssError::Structure(StructureError::EntryOutsidePattern { .. })
    ));

    // element matrix size must match the location arrays
    assert!(B.assemble(&[1, 2], &[1.]).is_err());
}

#[test]
fn test_unsymmetric_assembly() {
    let (model, numbering) = spring_chain(2);
    let mut A = DssMatrix::<f64>::new(DssType::UnsymLU, DssSettings::default());
    A.build_internal_structure(&model, 2, &numbering).unwrap();

    A.assemble(&[1, 2], &[3., 1., 2., 4.]).unwrap();
    assert_eq!(A.at(0, 1), 2.);
    assert_eq!(A.at(1, 0), 1.);

    A.factorized().unwrap();
    let mut x = vec![0f64; 2];
    A.solve(&[5., 5.], &mut x).unwrap();
    assert!((x[0] - 1.).abs() < 1e-12 && (x[1] - 1.).abs() < 1e-12);
}

#[test]
fn test_empty_system() {
    for storage in ["skyline", "blockgrid", "auto"] {
        let model = ElementList::new();
        let numbering = EquationNumbers::default();
        let settings = DssSettingsBuilder::default()
            .storage_method(storage.to_string())
            .build()
            .unwrap();
        let mut A = DssMatrix::<f64>::new(DssType::SymLL, settings);
        A.build_internal_structure(&model, 0, &numbering).unwrap();
        assert_eq!(A.neq(), 0);

        A.factorized().unwrap();
        let mut x: Vec<f64> = vec![];
        A.solve(&[], &mut x).unwrap();
        A.times(&[], &mut x).unwrap();
        A.zero();
    }
}

#[test]
fn test_build_from_connectivity() {
    let mut conn = ElementConnectivity::new(3);
    conn.add_element(vec![0, 1]);
    conn.add_element(vec![1, 2]);

    let mut A = DssMatrix::<f64>::new(DssType::SymLDL, DssSettings::default());
    A.build_from_connectivity(&conn).unwrap();
    assert_eq!(A.view().unwrap().nonzeros(), 5);

    let mut bad = ElementConnectivity::new(2);
    bad.add_element(vec![0, 2]);
    let err = A.build_from_connectivity(&bad).unwrap_err();
    assert!(matches!(
        err,
        DssError::Structure(StructureError::IndexOutOfRange { index: 2, dim: 2 })
    ));
    assert!(A.view().is_none());
}

#[test]
fn test_shared_assembly() {
    let n = 8;
    let (mut A, model, numbering) = built(n, "blockgrid");
    A.print_to_buffer();

    let shared = Mutex::new(A);
    std::thread::scope(|s| {
        for part in 0..2 {
            let (shared, model, numbering) = (&shared, &model, &numbering);
            s.spawn(move || {
                for e in (part..n).step_by(2) {
                    let loc = location_array(model, e, numbering);
                    DssMatrix::<f64>::assemble_shared(shared, &loc, &SPRING).unwrap();
                }
            });
        }
    });

    let mut A = shared.into_inner().unwrap();
    A.factorized().unwrap();
    let mut x = vec![0f64; n];
    let mut b = vec![0f64; n];
    b[n - 1] = 1.;
    A.solve(&b, &mut x).unwrap();
    for (i, xi) in x.iter().enumerate() {
        assert!((xi - (i + 1) as f64).abs() < 1e-10);
    }

    // single threaded sharing
    let (A, model, numbering) = built(2, "skyline");
    let shared = RefCell::new(A);
    for e in 0..2 {
        let loc = location_array(&model, e, &numbering);
        DssMatrix::<f64>::assemble_shared(&shared, &loc, &SPRING).unwrap();
    }
    assert_eq!(shared.borrow().at(0, 0), 2.);
}

#[test]
fn test_failed_assembly_leaves_no_partial_values() {
    for storage in ["skyline", "blockgrid"] {
        let (mut A, model, numbering) = built(3, storage);
        assemble_all(&mut A, &model, &numbering);

        // equations 1 and 3 are not coupled, but (1,1) and (3,3) are stored
        let err = A.assemble(&[1, 3], &[10., 20., 20., 10.]).unwrap_err();
        assert!(matches!(
            err,
            DssError::Structure(StructureError::EntryOutsidePattern { row: 2, col: 0 })
        ));
        assert_eq!(A.at(0, 0), 2.);
        assert_eq!(A.at(2, 2), 1.);
    }
}

#[test]
fn test_element_access() {
    let (mut A, model, numbering) = built(3, "skyline");
    assemble_all(&mut A, &model, &numbering);

    // the symmetric view stores (1,0) for (0,1)
    *A.at_mut(0, 1).unwrap() -= 1.;
    assert_eq!(A.at(1, 0), -2.);
    assert!(A.at_mut(0, 2).is_none());
    assert!(A.at_mut(3, 3).is_none());

    A.factorized().unwrap();
    assert!(A.at_mut(0, 0).is_none());
    A.zero();
    assert_eq!(*A.at_mut(0, 0).unwrap(), 0.);
}
