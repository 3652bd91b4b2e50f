use ahash::AHashSet;
use log::trace;

use super::{greedy::greedy_removal, RelatednessGraph};

enum Frame {
    Enter(Vec<usize>),
    Combine(usize),
}

/// Ramsey recursion over the subgraph induced by `vertices` (sorted): returns a (clique, independent set) pair.
///
/// The pivot is the lowest vertex. Its neighbors and non-neighbors are explored separately, and
/// the larger clique and independent set are kept on the way up. Ties favor the neighbor branch.
/// Runs on an explicit stack.
fn ramsey(graph: &RelatednessGraph, vertices: Vec<usize>) -> (Vec<usize>, Vec<usize>) {
    let mut frames  = vec![Frame::Enter(vertices)];
    let mut results: Vec<(Vec<usize>, Vec<usize>)> = Vec::new();

    while let Some(frame) = frames.pop() {
        match frame {
            Frame::Enter(vertices) => {
                let Some((&pivot, rest)) = vertices.split_first() else {
                    results.push((Vec::new(), Vec::new()));
                    continue
                };
                let (neighbors, strangers): (Vec<usize>, Vec<usize>) = rest.iter().partition(|&&v| graph.is_related(pivot, v));
                frames.push(Frame::Combine(pivot));
                frames.push(Frame::Enter(strangers));
                frames.push(Frame::Enter(neighbors));
            },
            Frame::Combine(pivot) => {
                debug_assert!(results.len() >= 2, "Combine frame of {pivot} found {} branch result(s)", results.len());
                let (c2, mut i2) = results.pop().unwrap_or_default(); // strangers
                let (mut c1, i1) = results.pop().unwrap_or_default(); // neighbors
                c1.push(pivot);
                i2.push(pivot);
                let clique = if c1.len() >= c2.len() { c1 } else { c2 };
                let indset = if i1.len() >= i2.len() { i1 } else { i2 };
                results.push((clique, indset));
            },
        }
    }
    debug_assert_eq!(results.len(), 1, "Ramsey recursion should leave exactly one result");
    results.pop().unwrap_or_default()
}

/// Clique removal: run the Ramsey recursion, remove the clique it found, and repeat until the
/// subgraph is exhausted. Keeps the first largest independent set found.
fn clique_removal(graph: &RelatednessGraph, vertices: &[usize]) -> Vec<usize> {
    let mut remaining = vertices.to_vec();
    let mut best: Vec<usize> = Vec::new();
    let mut rounds = 0usize;
    while !remaining.is_empty() {
        let (clique, indset) = ramsey(graph, remaining.clone());
        if indset.len() > best.len() {
            best = indset;
        }
        let clique: AHashSet<usize> = clique.into_iter().collect();
        remaining.retain(|v| !clique.contains(v));
        rounds += 1;
    }
    trace!("Clique removal converged after {rounds} round(s) on a component of {} vertices", vertices.len());
    best.sort_unstable();
    best
}

/// Extend an independent set to a maximal one, scanning `vertices` (sorted) in ascending order.
fn extend_to_maximal(graph: &RelatednessGraph, vertices: &[usize], indset: Vec<usize>) -> Vec<usize> {
    let mut kept: AHashSet<usize> = indset.into_iter().collect();
    for &v in vertices {
        if !kept.contains(&v) && graph.neighbors(v).iter().all(|u| !kept.contains(u)) {
            kept.insert(v);
        }
    }
    let mut kept: Vec<usize> = kept.into_iter().collect();
    kept.sort_unstable();
    kept
}

/// Large independent set of a connected component (sorted vertices).
///
/// Returns the larger of the extended clique-removal set and the greedy-removal set. Ties favor clique removal.
pub(super) fn near_maximum(graph: &RelatednessGraph, component: &[usize]) -> Vec<usize> {
    if component.len() == 1 {
        return component.to_vec()
    }
    let clique_set  = extend_to_maximal(graph, component, clique_removal(graph, component));
    let greedy_set  = greedy_removal(graph, component);
    trace!("Component of {} vertices: clique removal kept {}, greedy removal kept {}", component.len(), clique_set.len(), greedy_set.len());
    if greedy_set.len() > clique_set.len() { greedy_set } else { clique_set }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KinshipMatrix;

    /// Graph with an edge between every listed pair.
    fn graph(n: usize, edges: &[(usize, usize)]) -> RelatednessGraph {
        let ids = (0..n).map(|i| format!("I{i}")).collect();
        let mut rows = vec![vec![0.0; n]; n];
        for (i, row) in rows.iter_mut().enumerate() {
            row[i] = 0.5;
        }
        for &(a, b) in edges {
            rows[a][b] = 0.25;
            rows[b][a] = 0.25;
        }
        let matrix = KinshipMatrix::from_dense(ids, &rows).expect("valid matrix");
        RelatednessGraph::new(&matrix, 0.1).expect("valid threshold")
    }

    #[test]
    fn ramsey_on_a_triangle_with_tail() {
        // ---- 0-1-2 triangle, 2-3 tail.
        let g = graph(4, &[(0, 1), (0, 2), (1, 2), (2, 3)]);
        let (mut clique, mut indset) = ramsey(&g, vec![0, 1, 2, 3]);
        clique.sort_unstable();
        indset.sort_unstable();
        assert_eq!(clique, [0, 1, 2]);
        assert_eq!(indset.len(), 2);
        assert!(indset.iter().all(|&a| indset.iter().all(|&b| !g.is_related(a, b))));
    }

    #[test]
    fn ramsey_covers_every_subgraph_shape() {
        // ---- Empty, single, edgeless, complete, and mixed subgraphs all fold back into one result.
        let complete: Vec<(usize, usize)> = (0..5).flat_map(|a| (a+1..5).map(move |b| (a, b))).collect();
        let g = graph(5, &complete);
        assert_eq!(ramsey(&g, Vec::new()), (Vec::new(), Vec::new()));
        assert_eq!(ramsey(&g, vec![3]), (vec![3], vec![3]));
        let (clique, indset) = ramsey(&g, vec![0, 1, 2, 3, 4]);
        assert_eq!((clique.len(), indset.len()), (5, 1));

        let g = graph(5, &[]);
        let (clique, mut indset) = ramsey(&g, vec![0, 1, 2, 3, 4]);
        indset.sort_unstable();
        assert_eq!((clique.len(), indset), (1, vec![0, 1, 2, 3, 4]));

        let g = graph(6, &[(0, 3), (1, 4), (2, 5), (0, 1)]);
        let (clique, indset) = ramsey(&g, vec![0, 1, 2, 3, 4, 5]);
        assert!(clique.iter().all(|&a| clique.iter().all(|&b| a == b || g.is_related(a, b))));
        assert!(indset.iter().all(|&a| indset.iter().all(|&b| !g.is_related(a, b))));
        assert!(!clique.is_empty() && !indset.is_empty());
    }

    #[test]
    fn star_keeps_leaves() {
        let g = graph(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]);
        assert_eq!(near_maximum(&g, &[0, 1, 2, 3, 4]), [1, 2, 3, 4]);
        assert_eq!(greedy_removal(&g, &[0, 1, 2, 3, 4]), [1, 2, 3, 4]);
    }

    #[test]
    fn path_keeps_both_ends() {
        let g = graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        assert_eq!(near_maximum(&g, &[0, 1, 2, 3, 4]), [0, 2, 4]);
    }

    #[test]
    fn extension_adds_free_vertices() {
        let g = graph(4, &[(0, 1), (2, 3)]);
        assert_eq!(extend_to_maximal(&g, &[0, 1, 2, 3], vec![1]), [1, 2]);
    }
}
