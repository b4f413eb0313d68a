use super::*;
use crate::sparse::{ConnectivityPattern, ElementConnectivity};

fn chain_pattern(order: &[usize]) -> ConnectivityPattern {
    let mut conn = ElementConnectivity::new(order.len());
    for w in order.windows(2) {
        conn.add_element(vec![w[0], w[1]]);
    }
    ConnectivityPattern::from_provider(&conn).unwrap()
}

fn bandwidth(pattern: &ConnectivityPattern, ordering: &Ordering) -> usize {
    let mut bw = 0;
    for j in 0..pattern.neq() {
        for &i in pattern.column(j) {
            bw = bw.max(ordering.to_new(i).abs_diff(ordering.to_new(j)));
        }
    }
    bw
}

#[test]
fn test_invperm() {
    assert_eq!(invperm(&[3, 0, 2, 1]).unwrap(), vec![1, 3, 2, 0]);
    // repeated index
    assert!(invperm(&[3, 0, 2, 0]).is_err());
    // index too big
    assert!(invperm(&[4, 0, 2, 1]).is_err());
    // a repeated zero must also be caught
    assert!(invperm(&[0, 0]).is_err());
}

#[test]
fn test_permute() {
    let ordering = Ordering::from_perm(vec![3, 0, 2, 1]).unwrap();
    let b = vec![1., 2., 3., 4.];
    let mut x = vec![0.; 4];
    let mut y = vec![0.; 4];

    ordering.permute(&mut x, &b);
    assert_eq!(x, vec![4., 1., 3., 2.]);
    ordering.ipermute(&mut y, &x);
    assert_eq!(y, b);
}

#[test]
fn test_with_leading() {
    let ordering = Ordering::from_perm(vec![3, 0, 2, 1]).unwrap();
    let ordering = ordering.with_leading(&[1, 2]).unwrap();

    // fixed entries keep their relative order, as do the others
    assert_eq!(ordering.perm(), &[2, 1, 3, 0]);
    assert!(ordering.check_leading(&[1, 2]).is_ok());
    assert!(ordering.check_leading(&[2, 1]).is_ok());
    assert_eq!(
        ordering.check_leading(&[3]),
        Err(StructureError::NonContiguousFixed)
    );

    let ordering = Ordering::identity(3);
    assert_eq!(
        ordering.clone().with_leading(&[5]),
        Err(StructureError::IndexOutOfRange { index: 5, dim: 3 })
    );
    assert_eq!(
        ordering.with_leading(&[1, 1]),
        Err(StructureError::InvalidPermutation)
    );
}

#[test]
fn test_rcm_chain() {
    // a chain numbered out of sequence
    let pattern = chain_pattern(&[0, 2, 4, 1, 3]);
    let natural = Ordering::identity(5);
    assert_eq!(bandwidth(&pattern, &natural), 3);

    let rcm = Ordering::from_perm(reverse_cuthill_mckee(&pattern)).unwrap();
    assert_eq!(bandwidth(&pattern, &rcm), 1);

    // deterministic for identical input
    assert_eq!(reverse_cuthill_mckee(&pattern), reverse_cuthill_mckee(&pattern));
}

#[test]
fn test_rcm_disconnected() {
    let mut conn = ElementConnectivity::new(5);
    conn.add_element(vec![0, 3]);
    conn.add_element(vec![1, 4]);
    let pattern = ConnectivityPattern::from_provider(&conn).unwrap();

    let perm = reverse_cuthill_mckee(&pattern);
    assert!(Ordering::from_perm(perm).is_ok());
}

#[test]
fn test_compute() {
    let pattern = chain_pattern(&[0, 1, 2, 3, 4, 5]);

    for method in [
        OrderingMethod::Natural,
        OrderingMethod::Amd,
        OrderingMethod::ReverseCuthillMcKee,
    ] {
        let ordering = Ordering::compute(method, &pattern, 1.5, &[4, 1]).unwrap();
        assert_eq!(ordering.len(), 6);
        assert!(ordering.check_leading(&[1, 4]).is_ok());
    }

    let empty = chain_pattern(&[]);
    let ordering = Ordering::compute(OrderingMethod::Amd, &empty, 1.5, &[]).unwrap();
    assert!(ordering.is_empty());
}

#[test]
fn test_amd_analysis() {
    let pattern = chain_pattern(&[0, 1, 2, 3]);
    let (perm, analysis) = amd_order(&pattern, 1.0).unwrap();
    assert!(Ordering::from_perm(perm).is_ok());
    // a tridiagonal matrix factors without fill
    assert_eq!(analysis.lnz, 3.0);
    assert!(analysis.flops_per_entry() > 0.0);
}

#[test]
fn test_method_names() {
    assert_eq!(OrderingMethod::from_name("amd"), Some(OrderingMethod::Amd));
    assert_eq!(
        OrderingMethod::from_name("rcm"),
        Some(OrderingMethod::ReverseCuthillMcKee)
    );
    assert_eq!(OrderingMethod::from_name("metis"), None);
}
