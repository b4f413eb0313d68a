use crate::sparse::ConnectivityPattern;
use std::collections::VecDeque;

/// Reverse Cuthill-McKee ordering, returned as `perm[new] = old`.
///
/// Each connected component is started from its unvisited node of
/// smallest degree.  Neighbours are queued by increasing degree, with
/// ties broken by index so the result is deterministic.
pub fn reverse_cuthill_mckee(pattern: &ConnectivityPattern) -> Vec<usize> {
    let n = pattern.neq();

    // degrees without the diagonal
    let degree: Vec<usize> = (0..n)
        .map(|i| pattern.column(i).iter().filter(|&&j| j != i).count())
        .collect();

    let mut by_degree: Vec<usize> = (0..n).collect();
    by_degree.sort_by_key(|&i| (degree[i], i));

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut queue = VecDeque::new();
    let mut neighbours: Vec<usize> = Vec::new();

    for &start in by_degree.iter() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            order.push(node);

            neighbours.clear();
            neighbours.extend(pattern.column(node).iter().filter(|&&j| !visited[j]));
            neighbours.sort_by_key(|&j| (degree[j], j));
            for &j in neighbours.iter() {
                visited[j] = true;
                queue.push_back(j);
            }
        }
    }

    order.reverse();
    order
}
