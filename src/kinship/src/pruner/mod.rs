//! Relatedness pruning: select a large subset of a cohort, where no pair exceeds a kinship threshold.

use std::{fmt::{self, Display, Formatter}, str::FromStr};

use log::{debug, info};

use logger::Logger;

use crate::{KinshipMatrix, PruneError, KINSHIP_EPSILON};

mod graph;
pub use graph::RelatednessGraph;

mod greedy;
mod near_max;

/// Whether a kinship coefficient strictly exceeds a threshold. Values within `KINSHIP_EPSILON` of the threshold do not.
#[must_use]
#[inline]
pub fn exceeds(kinship: f64, threshold: f64) -> bool {
    kinship - threshold > KINSHIP_EPSILON
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PruneStrategy {
    /// Best of clique removal and greedy removal, per connected component.
    #[default]
    NearMaximum,
    /// Remove the most related individual until no related pair remains.
    Greedy,
}

impl FromStr for PruneStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "near-maximum" | "near-max" => Ok(Self::NearMaximum),
            "greedy"                    => Ok(Self::Greedy),
            other => Err(format!("Invalid pruning strategy: '{other}'. Expected 'near-maximum' or 'greedy'")),
        }
    }
}

impl Display for PruneStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            Self::NearMaximum => "near-maximum",
            Self::Greedy      => "greedy",
        })
    }
}

/// Outcome of a pruning pass.
/// # Fields:
/// - `kept`     : mutually unrelated individuals, in matrix order.
/// - `removed`  : every other individual of the matrix, in matrix order.
/// - `strategy` : pruning strategy that was applied.
/// - `threshold`: kinship threshold that was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PruneReport {
    pub kept     : Vec<String>,
    pub removed  : Vec<String>,
    pub strategy : PruneStrategy,
    pub threshold: f64,
}

/// Select a subset of `matrix` where no pair of individuals has a kinship coefficient exceeding `threshold`.
///
/// Both strategies are deterministic for a given matrix order. The result is validated before being returned.
///
/// # Errors
/// - `InvalidThreshold` if `threshold` is not finite.
/// - `ThresholdViolated` if the selected subset fails post-hoc validation.
pub fn prune(matrix: &KinshipMatrix, threshold: f64, strategy: PruneStrategy) -> Result<PruneReport, PruneError> {
    let graph = RelatednessGraph::new(matrix, threshold)?;
    info!("Relatedness graph: {} individual(s), {} pair(s) above a kinship of {threshold}", graph.len(), graph.edge_count());

    let mut kept: Vec<usize> = match strategy {
        PruneStrategy::Greedy => {
            let all: Vec<usize> = (0..graph.len()).collect();
            greedy::greedy_removal(&graph, &all)
        },
        PruneStrategy::NearMaximum => {
            let components = graph.components();
            debug!("Relatedness graph spans {} connected component(s)", components.len());
            let progress = Logger::progress_bar(components.len() as u64, "Pruning components");
            let mut kept = Vec::with_capacity(graph.len());
            for component in &components {
                kept.extend(near_max::near_maximum(&graph, component));
                progress.inc(1);
            }
            progress.finish_and_clear();
            kept
        },
    };
    kept.sort_unstable();

    let mut is_kept = vec![false; matrix.len()];
    for &i in &kept {
        is_kept[i] = true;
    }
    let (kept, removed): (Vec<String>, Vec<String>) = matrix.ids()
        .zip(is_kept)
        .fold((Vec::new(), Vec::new()), |(mut kept, mut removed), (id, keep)| {
            match keep {
                true  => kept.push(id.to_string()),
                false => removed.push(id.to_string()),
            }
            (kept, removed)
        });

    validate_pruned(matrix, &kept, threshold)?;
    info!("Pruning ({strategy}) kept {} out of {} individual(s)", kept.len(), matrix.len());
    Ok(PruneReport { kept, removed, strategy, threshold })
}

/// Check that no pair of `ids` has a kinship coefficient exceeding `threshold`.
///
/// # Errors
/// - `ThresholdViolated`, naming the most related pair, on failure.
/// - `Matrix` if any identifier is absent from the matrix, or listed twice.
pub fn validate_pruned<S: AsRef<str>>(matrix: &KinshipMatrix, ids: &[S], threshold: f64) -> Result<(), PruneError> {
    let subset = matrix.subset(ids)?;
    match subset.max_off_diagonal() {
        Some((i, j, kinship)) if exceeds(kinship, threshold) => Err(PruneError::ThresholdViolated {
            a: subset.id(i).unwrap_or_default().to_string(),
            b: subset.id(j).unwrap_or_default().to_string(),
            kinship,
            threshold,
        }),
        _ => Ok(())
    }
}
