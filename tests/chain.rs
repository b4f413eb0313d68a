#![allow(non_snake_case)]

use dss::{dss::*, engines::*};

// springs 4-0, 0-1, 1-2 and 2-3 with dof 4 fixed give
//
// A =
//[ 2.0  -1.0    ⋅     ⋅ ]
//[-1.0   2.0  -1.0    ⋅ ]
//[  ⋅   -1.0   2.0  -1.0]
//[  ⋅     ⋅   -1.0   1.0]
fn chain_matrix(kind: DssType, storage: &str, block_size: usize) -> DssMatrix<f64> {
    let mut model = ElementList::new();
    for (a, b) in [(4, 0), (0, 1), (1, 2), (2, 3)] {
        model.add_element(vec![a, b]);
    }
    let numbering = EquationNumbers::with_constraints(5, &[4]);

    let settings = DssSettingsBuilder::default()
        .storage_method(storage.to_string())
        .block_size(block_size)
        .build()
        .unwrap();

    let mut A = DssMatrix::new(kind, settings);
    A.build_internal_structure(&model, numbering.neq(), &numbering)
        .unwrap();

    let k = [1., -1., -1., 1.];
    for e in 0..model.number_of_elements() {
        let loc = location_array(&model, e, &numbering);
        A.assemble(&loc, &k).unwrap();
    }
    A
}

#[test]
fn test_chain_skyline() {
    for kind in [DssType::SymLDL, DssType::SymLL, DssType::UnsymLU] {
        let mut A = chain_matrix(kind, "skyline", 1);
        assert_eq!(A.engine().unwrap().name(), "skyline");
        assert_eq!(A.at(3, 3), 1.);
        assert_eq!(A.at(1, 0), -1.);
        assert_eq!(A.at(0, 1), -1.);
        assert_eq!(A.at(3, 0), 0.);

        A.factorized().unwrap();
        let mut x = vec![0f64; 4];
        A.solve(&[1., 0., 0., 0.], &mut x).unwrap();
        for xi in x {
            assert!((xi - 1.).abs() < 1e-9);
        }
    }
}

#[test]
fn test_chain_blockgrid() {
    for kind in [DssType::SymLDL, DssType::SymLL, DssType::UnsymLU] {
        let mut A = chain_matrix(kind, "blockgrid", 2);
        match A.engine().unwrap() {
            Engine::BlockGrid(grid) => {
                assert_eq!(grid.block_size(), 2);
                assert_eq!(grid.n_blocks(), 2);
            }
            _ => panic!("expected block storage"),
        }

        A.factorized().unwrap();
        let mut x = vec![0f64; 4];
        A.solve(&[1., 0., 0., 0.], &mut x).unwrap();
        for xi in x {
            assert!((xi - 1.).abs() < 1e-9);
        }
    }
}

#[test]
fn test_chain_auto_storage() {
    // a chain has far too little work per factor entry for blocks
    let mut A = chain_matrix(DssType::SymLDL, "auto", 3);
    assert_eq!(A.engine().unwrap().name(), "skyline");

    A.factorized().unwrap();
    let mut x = vec![0f64; 4];
    A.solve(&[0., 0., 0., 1.], &mut x).unwrap();
    let expected = [1., 2., 3., 4.];
    for (xi, ei) in x.iter().zip(expected) {
        assert!((xi - ei).abs() < 1e-9);
    }
}

#[test]
fn test_chain_times() {
    let A = chain_matrix(DssType::SymLDL, "skyline", 1);
    let mut y = vec![0f64; 4];
    A.times(&[1., 1., 1., 1.], &mut y).unwrap();
    assert_eq!(y, vec![1., 0., 0., 0.]);
}
