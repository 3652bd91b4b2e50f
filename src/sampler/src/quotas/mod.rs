use std::{collections::BTreeMap, fmt::{self, Display, Formatter}};

use crate::{QuotaError, Region};

/// Number of individuals to draw from each region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quotas {
    quotas: BTreeMap<Region, usize>,
}

impl Quotas {
    /// Split `total` evenly across `regions`. The remainder goes to the lowest region codes, one each.
    ///
    /// # Errors
    /// - `NoRegions` if `regions` is empty.
    pub fn equal<I: IntoIterator<Item = Region>>(regions: I, total: usize) -> Result<Self, QuotaError> {
        let weights: BTreeMap<Region, f64> = regions.into_iter().map(|region| (region, 1.0)).collect();
        Self::proportional(&weights, total)
    }

    /// Allocate `total` proportionally to `weights`, using the largest-remainder method:
    /// every region first gets the floor of its exact share, and the leftover units go to the regions
    /// with the largest fractional parts. Ties go to the lowest region code.
    ///
    /// Resulting quotas always sum to `total`.
    ///
    /// # Errors
    /// - `NoRegions` if `weights` is empty.
    /// - `InvalidWeight` if any weight is negative or not finite.
    /// - `ZeroWeights` if all weights are zero.
    pub fn proportional(weights: &BTreeMap<Region, f64>, total: usize) -> Result<Self, QuotaError> {
        if weights.is_empty() {
            return Err(QuotaError::NoRegions)
        }
        if let Some((region, weight)) = weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
            return Err(QuotaError::InvalidWeight{region: *region, weight: *weight})
        }
        let sum: f64 = weights.values().sum();
        if sum <= 0.0 {
            return Err(QuotaError::ZeroWeights)
        }

        let mut quotas = BTreeMap::new();
        let mut remainders = Vec::with_capacity(weights.len());
        for (region, weight) in weights {
            let exact = total as f64 * weight / sum;
            let floor = exact.floor();
            quotas.insert(*region, floor as usize);
            remainders.push((*region, exact - floor));
        }

        // ---- Stable sort: equal remainders keep ascending region order.
        remainders.sort_by(|a, b| b.1.total_cmp(&a.1));
        let allocated: usize = quotas.values().sum();
        for (region, _) in remainders.iter().take(total.saturating_sub(allocated)) {
            if let Some(quota) = quotas.get_mut(region) {
                *quota += 1;
            }
        }

        let quotas = Self { quotas };
        quotas.check_total(total)?;
        Ok(quotas)
    }

    #[must_use]
    pub fn explicit(quotas: BTreeMap<Region, usize>) -> Self {
        Self { quotas }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.quotas.values().sum()
    }

    #[must_use]
    pub fn get(&self, region: Region) -> Option<usize> {
        self.quotas.get(&region).copied()
    }

    /// Regional quotas, in ascending region order.
    pub fn iter(&self) -> impl Iterator<Item = (Region, usize)> + '_ {
        self.quotas.iter().map(|(region, quota)| (*region, *quota))
    }

    /// # Errors
    /// - `TotalMismatch` if quotas do not sum to `expected`.
    pub fn check_total(&self, expected: usize) -> Result<(), QuotaError> {
        match self.total() {
            got if got == expected => Ok(()),
            got                    => Err(QuotaError::TotalMismatch{expected, got}),
        }
    }
}

impl Display for Quotas {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self.iter().map(|(region, quota)| format!("{region}:{quota}")).collect();
        write!(f, "{}", fields.join(" "))
    }
}
