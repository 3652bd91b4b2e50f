use ahash::{AHashMap, AHashSet};
use log::trace;
use slotmap::{SecondaryMap, SlotMap};

use crate::{Individual, IndividualId, IndividualRecord, Origin, PedigreeError, Sex};

mod repair;
pub use repair::RepairStats;


/// An extended-family pedigree: arena of individuals linked by weak parent keys.
///
/// # Fields:
/// - `individuals`: arena of all members of the pedigree (recorded, referenced and placeholder individuals)
/// - `index`      : registry identifier -> arena key.
/// - `insertion`  : arena keys, in insertion order (input record order, then synthesized parents).
/// - `topological`: arena keys sorted such that every individual appears after both of its parents.
///                  Founders come first; ties within a generation keep insertion order.
/// - `generations`: generation depth of each individual (founders = 0, offspring = 1 + deepest parent)
///
/// A `Pedigree` can only be obtained through `Pedigree::from_records()`, which repairs the
/// input records, and is immutable afterwards.
#[derive(Debug, Clone)]
pub struct Pedigree {
    individuals: SlotMap<IndividualId, Individual>,
    index      : AHashMap<String, IndividualId>,
    insertion  : Vec<IndividualId>,
    topological: Vec<IndividualId>,
    generations: SecondaryMap<IndividualId, u32>,
}

impl Pedigree {
    /// Build a repaired pedigree from raw input records.
    ///
    /// See [`RepairStats`] for the list of corrections that may be applied.
    ///
    /// # Errors
    /// - `DuplicateId`, `SelfParent`, `IdenticalParents` on malformed records.
    /// - `SexConflict` if an identifier is used both as a father and as a mother.
    /// - `PlaceholderCollision` if a synthesized placeholder label is already in use.
    /// - `Cycle` if any individual is its own ancestor.
    pub fn from_records(records: &[IndividualRecord]) -> Result<(Self, RepairStats), PedigreeError> {
        repair::repair(records)
    }

    fn with_capacity(n: usize) -> Self {
        Self {
            individuals: SlotMap::with_capacity_and_key(n),
            index      : AHashMap::with_capacity(n),
            insertion  : Vec::with_capacity(n),
            topological: Vec::new(),
            generations: SecondaryMap::new(),
        }
    }

    fn insert_with(&mut self, label: &str, make: impl FnOnce(IndividualId) -> Individual) -> IndividualId {
        let id = self.individuals.insert_with_key(make);
        self.index.insert(label.to_string(), id);
        self.insertion.push(id);
        id
    }

    fn insert(&mut self, label: &str, sex: Sex, origin: Origin) -> IndividualId {
        self.insert_with(label, |id| Individual::new(id, label, sex, origin))
    }

    fn insert_record(&mut self, record: &IndividualRecord) -> IndividualId {
        self.insert_with(&record.id, |id| Individual::from_record(id, record))
    }

    /// Peel generations: an individual is placed once both of its parents are placed.
    ///
    /// # Errors
    /// - `Cycle`, listing every individual that could not be placed.
    fn build_order(&mut self) -> Result<(), PedigreeError> {
        let mut rank     : SecondaryMap<IndividualId, usize>     = SecondaryMap::with_capacity(self.len());
        let mut pending  : AHashMap<IndividualId, u8>            = AHashMap::with_capacity(self.len());
        let mut children : AHashMap<IndividualId, Vec<IndividualId>> = AHashMap::new();

        for (i, &id) in self.insertion.iter().enumerate() {
            rank.insert(id, i);
            match self.individuals[id].parents() {
                None          => { pending.insert(id, 0); },
                Some(parents) => {
                    pending.insert(id, 2);
                    parents.iter().for_each(|parent| children.entry(parent).or_default().push(id));
                }
            }
        }

        let mut order: Vec<IndividualId> = Vec::with_capacity(self.len());
        let mut generation: Vec<IndividualId> = self.insertion.iter()
            .copied()
            .filter(|id| pending.get(id) == Some(&0))
            .collect();

        let mut depth = 0;
        while !generation.is_empty() {
            let mut next = Vec::new();
            for &id in &generation {
                self.generations.insert(id, depth);
                for &child in children.get(&id).into_iter().flatten() {
                    if let Some(count) = pending.get_mut(&child) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(child);
                        }
                    }
                }
            }
            order.append(&mut generation);
            next.sort_unstable_by_key(|id| rank[*id]);
            generation = next;
            depth += 1;
        }
        trace!("Pedigree spans {depth} generation(s)");

        if order.len() != self.len() {
            let unplaced = self.insertion.iter()
                .filter(|id| !self.generations.contains_key(**id))
                .map(|id| self.individuals[*id].label.clone())
                .collect();
            return Err(PedigreeError::Cycle(unplaced))
        }
        self.topological = order;
        Ok(())
    }

    /// Number of individuals within the pedigree, synthesized ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Retrieve the arena key of an individual, using its registry identifier.
    #[must_use]
    pub fn id_of(&self, label: &str) -> Option<IndividualId> {
        self.index.get(label).copied()
    }

    /// Retrieve an individual using its registry identifier.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&Individual> {
        self.id_of(label).and_then(|id| self.individuals.get(id))
    }

    /// Retrieve an individual using its registry identifier, or raise an `UnknownIndividual` error.
    pub fn try_get(&self, label: &str) -> Result<&Individual, PedigreeError> {
        self.get(label).ok_or_else(|| PedigreeError::UnknownIndividual(label.to_string()))
    }

    /// Retrieve an individual using its arena key.
    #[must_use]
    pub fn individual(&self, id: IndividualId) -> Option<&Individual> {
        self.individuals.get(id)
    }

    /// Iterate over all individuals, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Individual> {
        self.insertion.iter().map(|id| &self.individuals[*id])
    }

    pub fn founders(&self) -> impl Iterator<Item = &Individual> {
        self.iter().filter(|ind| ind.is_founder())
    }

    pub fn offsprings(&self) -> impl Iterator<Item = &Individual> {
        self.iter().filter(|ind| !ind.is_founder())
    }

    /// Registry identifiers of the father and mother of `individual`, if any.
    #[must_use]
    pub fn parent_labels(&self, individual: &Individual) -> Option<(&str, &str)> {
        individual.parents().map(|parents| (
            self.individuals[parents.father].label.as_str(),
            self.individuals[parents.mother].label.as_str(),
        ))
    }

    /// Whole pedigree, sorted such that every individual appears after both of its parents.
    #[must_use]
    pub fn topological_order(&self) -> &[IndividualId] {
        &self.topological
    }

    /// Restrict the topological order to a subset of individuals.
    /// The relative order of the retained individuals is preserved, thus remains topological.
    #[must_use]
    pub fn topological_subset(&self, subset: &AHashSet<IndividualId>) -> Vec<IndividualId> {
        self.topological.iter().copied().filter(|id| subset.contains(id)).collect()
    }

    /// Generation depth of an individual. Founders are at depth 0.
    #[must_use]
    pub fn generation(&self, id: IndividualId) -> Option<u32> {
        self.generations.get(id).copied()
    }

    /// Collect the provided individuals along with all of their ancestors.
    #[must_use]
    pub fn ancestor_closure(&self, seeds: &[IndividualId]) -> AHashSet<IndividualId> {
        let mut closure = AHashSet::with_capacity(seeds.len());
        let mut stack: Vec<IndividualId> = seeds.to_vec();
        while let Some(id) = stack.pop() {
            if !closure.insert(id) {
                continue
            }
            if let Some(parents) = self.individuals.get(id).and_then(Individual::parents) {
                stack.extend(parents.iter().filter(|parent| !closure.contains(parent)));
            }
        }
        closure
    }

    /// Check the post-repair invariants: fathers are male, mothers are female.
    /// Zero-or-two parents is guaranteed by construction.
    pub fn validate(&self) -> Result<(), PedigreeError> {
        for child in self.offsprings() {
            let Some(parents) = child.parents() else { continue };
            for (role, parent, expected) in [("father", parents.father, Sex::Male), ("mother", parents.mother, Sex::Female)] {
                let parent = &self.individuals[parent];
                if parent.sex != expected {
                    return Err(PedigreeError::InvalidParentSex{
                        child : child.label.clone(),
                        parent: parent.label.clone(),
                        role,
                        sex   : parent.sex,
                    })
                }
            }
        }
        Ok(())
    }
}
