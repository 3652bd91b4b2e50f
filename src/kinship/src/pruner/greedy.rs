use ahash::AHashMap;

use super::RelatednessGraph;

/// Repeatedly remove the vertex with the most remaining neighbors, until no edge is left.
///
/// Degrees are maintained incrementally. Ties are resolved in favor of the lowest matrix index.
/// `vertices` must be sorted in ascending order. Returns the kept vertices, in ascending order.
pub(super) fn greedy_removal(graph: &RelatednessGraph, vertices: &[usize]) -> Vec<usize> {
    let local: AHashMap<usize, usize> = vertices.iter().enumerate().map(|(k, &v)| (v, k)).collect();
    let mut degree: Vec<usize> = vertices.iter()
        .map(|&v| graph.neighbors(v).iter().filter(|u| local.contains_key(u)).count())
        .collect();
    let mut active = vec![true; vertices.len()];

    loop {
        let mut best: Option<(usize, usize)> = None;
        for (k, &d) in degree.iter().enumerate() {
            if active[k] && d > 0 && best.map_or(true, |(_, max)| d > max) {
                best = Some((k, d));
            }
        }
        let Some((removed, _)) = best else { break };

        active[removed] = false;
        for neighbor in graph.neighbors(vertices[removed]) {
            if let Some(&k) = local.get(neighbor) {
                if active[k] {
                    degree[k] -= 1;
                }
            }
        }
    }

    vertices.iter().zip(active).filter_map(|(&v, keep)| keep.then_some(v)).collect()
}
