use std::{collections::BTreeMap, fmt::{self, Display, Formatter}, str::FromStr};

use ahash::AHashMap;

use crate::SamplerError;

/// A geographic (dialect) region code. Always within `[1, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Region(u8);

impl Region {
    /// # Errors
    /// - `InvalidRegion` if `code` is 0.
    pub fn new(code: u8) -> Result<Self, SamplerError> {
        match code {
            0 => Err(SamplerError::InvalidRegion(code.to_string())),
            _ => Ok(Self(code)),
        }
    }

    #[must_use]
    pub fn code(&self) -> u8 {
        self.0
    }

    /// Parse an optional region field: `NA`, `.` and empty fields are missing values.
    ///
    /// # Errors
    /// - `InvalidRegion` if the field is neither missing nor a valid region code.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, SamplerError> {
        match s.trim() {
            "" | "." | "NA" | "na" => Ok(None),
            other                  => other.parse().map(Some),
        }
    }
}

impl FromStr for Region {
    type Err = SamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().parse::<u8>().map_err(|_| SamplerError::InvalidRegion(s.to_string()))?;
        Self::new(code)
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mapping from individual identifiers to their region. Individuals without a known region are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionAssignment {
    regions: AHashMap<String, Region>,
}

impl RegionAssignment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `id` to `region`. A missing region clears any previous assignment.
    pub fn insert(&mut self, id: &str, region: Option<Region>) {
        match region {
            Some(region) => { self.regions.insert(id.to_string(), region); },
            None         => { self.regions.remove(id); },
        }
    }

    /// Overwrite assignments with those of `other`, including its known regions only.
    pub fn merge(&mut self, other: RegionAssignment) {
        self.regions.extend(other.regions);
    }

    #[must_use]
    pub fn region_of(&self, id: &str) -> Option<Region> {
        self.regions.get(id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of assigned individuals per region, in ascending region order.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<Region, usize> {
        let mut counts = BTreeMap::new();
        for region in self.regions.values() {
            *counts.entry(*region).or_insert(0) += 1;
        }
        counts
    }

    /// Population share of each region, as a weight suitable for [`Quotas::proportional`](crate::Quotas::proportional).
    #[must_use]
    pub fn population_weights(&self) -> BTreeMap<Region, f64> {
        self.counts().into_iter().map(|(region, count)| (region, count as f64)).collect()
    }
}

impl<S: AsRef<str>> FromIterator<(S, Option<Region>)> for RegionAssignment {
    fn from_iter<I: IntoIterator<Item = (S, Option<Region>)>>(iter: I) -> Self {
        let mut assignment = Self::new();
        for (id, region) in iter {
            assignment.insert(id.as_ref(), region);
        }
        assignment
    }
}
