use std::collections::VecDeque;

use rayon::prelude::*;

use crate::{KinshipMatrix, PruneError};
use super::exceeds;

/// Undirected graph over the rows of a kinship matrix: `i` and `j` are adjacent iff `k(i, j)` exceeds the threshold.
///
/// # Fields:
/// - `threshold`: kinship threshold this graph was built for.
/// - `adjacency`: sorted neighbor indices of each vertex.
#[derive(Debug, Clone)]
pub struct RelatednessGraph {
    threshold: f64,
    adjacency: Vec<Vec<usize>>,
}

impl RelatednessGraph {
    /// # Errors
    /// - `InvalidThreshold` if `threshold` is NaN or infinite.
    pub fn new(matrix: &KinshipMatrix, threshold: f64) -> Result<Self, PruneError> {
        if !threshold.is_finite() {
            return Err(PruneError::InvalidThreshold(threshold))
        }
        let n = matrix.len();
        let adjacency = (0..n).into_par_iter()
            .map(|i| (0..n).filter(|&j| j != i && exceeds(matrix.get_by_index(i, j), threshold)).collect())
            .collect();
        Ok(Self { threshold, adjacency })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn neighbors(&self, vertex: usize) -> &[usize] {
        &self.adjacency[vertex]
    }

    #[must_use]
    pub fn degree(&self, vertex: usize) -> usize {
        self.adjacency[vertex].len()
    }

    #[must_use]
    pub fn is_related(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].binary_search(&b).is_ok()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Connected components, each sorted in ascending index order. Components are ordered by their lowest index.
    #[must_use]
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.len()];
        let mut components = Vec::new();
        for start in 0..self.len() {
            if visited[start] {
                continue
            }
            visited[start] = true;
            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(vertex) = queue.pop_front() {
                for &neighbor in self.neighbors(vertex) {
                    if !visited[neighbor] {
                        visited[neighbor] = true;
                        component.push(neighbor);
                        queue.push_back(neighbor);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components
    }
}
