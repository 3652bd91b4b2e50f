use std::{collections::{BTreeMap, BTreeSet}, fmt::{self, Display, Formatter}};

use ahash::AHashSet;
use log::{debug, info, warn};

use crate::{Quotas, Region, RegionAssignment, SamplerError};

/// A region lacking eligible individuals to fill its quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub region   : Region,
    pub needed   : usize,
    pub available: usize,
}

impl Display for Shortfall {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "region {} ({} needed, {} available)", self.region, self.needed, self.available)
    }
}

/// Outcome of a stratified draw.
/// # Fields:
/// - `selected`  : drawn individuals and their region, in ascending region order, then draw order.
/// - `unassigned`: pruned individuals without a known region. These are never eligible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StratifiedSample {
    pub selected  : Vec<(String, Region)>,
    pub unassigned: Vec<String>,
}

impl StratifiedSample {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(|(id, _)| id.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    #[must_use]
    pub fn counts(&self) -> BTreeMap<Region, usize> {
        let mut counts = BTreeMap::new();
        for (_, region) in &self.selected {
            *counts.entry(*region).or_insert(0) += 1;
        }
        counts
    }
}

/// Draw `quotas` individuals per region among `pruned`, uniformly without replacement.
///
/// A single generator seeded with `seed` is consumed region by region, in ascending region order,
/// so the whole selection is reproducible. Within each region, candidates are considered in `pruned`
/// order and drawn through a partial Fisher-Yates shuffle.
///
/// # Errors
/// - `DuplicateId` if `pruned` lists an identifier more than once.
/// - `Shortfall`, listing every region with fewer eligible individuals than its quota.
pub fn sample<S: AsRef<str>>(pruned: &[S], assignment: &RegionAssignment, quotas: &Quotas, seed: u64) -> Result<StratifiedSample, SamplerError> {
    let mut seen = AHashSet::with_capacity(pruned.len());
    let duplicates: BTreeSet<String> = pruned.iter()
        .map(AsRef::as_ref)
        .filter(|id| !seen.insert(*id))
        .map(str::to_string)
        .collect();
    if !duplicates.is_empty() {
        return Err(SamplerError::DuplicateId(duplicates.into_iter().collect()))
    }

    // ---- Split eligible individuals per region.
    let mut pools: BTreeMap<Region, Vec<&str>> = BTreeMap::new();
    let mut unassigned = Vec::new();
    for id in pruned.iter().map(AsRef::as_ref) {
        match assignment.region_of(id) {
            Some(region) => pools.entry(region).or_default().push(id),
            None         => {
                warn!("Individual {id} has no known region. Excluding it from every stratum.");
                unassigned.push(id.to_string());
            }
        }
    }
    if !unassigned.is_empty() {
        info!("{} pruned individual(s) were excluded for lack of a region", unassigned.len());
    }
    for (region, pool) in &pools {
        if quotas.get(*region).is_none() {
            debug!("Region {region} has no quota. Ignoring its {} eligible individual(s)", pool.len());
        }
    }

    // ---- Check every quota before drawing.
    let shortfalls: Vec<Shortfall> = quotas.iter()
        .filter_map(|(region, needed)| {
            let available = pools.get(&region).map_or(0, Vec::len);
            (available < needed).then_some(Shortfall { region, needed, available })
        })
        .collect();
    if !shortfalls.is_empty() {
        return Err(SamplerError::Shortfall(shortfalls))
    }

    let mut rng = fastrand::Rng::with_seed(seed);
    let mut selected = Vec::with_capacity(quotas.total());
    for (region, quota) in quotas.iter() {
        let mut pool = pools.remove(&region).unwrap_or_default();
        for k in 0..quota {
            let j = rng.usize(k..pool.len());
            pool.swap(k, j);
        }
        debug!("Region {region}: drew {quota} out of {} eligible individual(s)", pool.len());
        selected.extend(pool.into_iter().take(quota).map(|id| (id.to_string(), region)));
    }

    info!("Selected {} individual(s) across {} region(s)", selected.len(), quotas.iter().count());
    Ok(StratifiedSample { selected, unassigned })
}
