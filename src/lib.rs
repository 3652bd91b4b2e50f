use std::{collections::BTreeMap, path::{Path, PathBuf}};

use ahash::AHashMap;

use parser::{Cli, CohortArgs, Commands::*, Common, PruneArgs, PruneMode, QuotaMode, SampleArgs};
use pedigree::{lineage, Origin, Pedigree, RepairStats};
use kinship::{CohortKinship, KinshipMatrix, PruneReport, PruneStrategy};
use sampler::{Quotas, Region, RegionAssignment, SamplerError, StratifiedSample};
use pedselect_io::{parse::get_output_files, read, write};
use located_error::LocatedError;

#[macro_use]
extern crate log;

use anyhow::Result;

mod error;
pub use error::PipelineError;

const PEDIGREE  : &str = "pedigree.tsv";
const REPAIR    : &str = "repair.tsv";
const KINSHIP   : &str = "kinship.tsv";
const PRUNED    : &str = "pruned.txt";
const CANDIDATES: &str = "candidates.tsv";
const MISSING   : &str = "missing.tsv";

/// Identifiers dropped along the pipeline, along with the reason why.
#[derive(Debug, Default)]
struct DroppedIds(Vec<(String, String)>);

impl DroppedIds {
    fn push(&mut self, id: String, reason: String) {
        self.0.push((id, reason));
    }

    fn extend(&mut self, ids: impl IntoIterator<Item = String>, reason: &str) {
        self.0.extend(ids.into_iter().map(|id| (id, reason.to_string())));
    }

    fn write(&self, path: &Path) -> Result<()> {
        if !self.0.is_empty() {
            warn!("{} identifier(s) were dropped along the way. See {}", self.0.len(), path.display());
        }
        write::write_missing_report(path, &self.0)
    }
}

fn output_files(common: &Common, suffixes: &[&str]) -> Result<AHashMap<String, PathBuf>> {
    get_output_files(&common.file_prefix(), common.overwrite, suffixes)
        .loc("While preparing output files")
}

/// Read raw records, and repair them into a well-formed pedigree.
fn load_pedigree(records: &Path) -> Result<(Pedigree, RepairStats)> {
    let records = read::read_records(records)?;
    let (pedigree, stats) = Pedigree::from_records(&records).loc("While repairing the pedigree")?;
    pedigree.validate().loc("While validating the repaired pedigree")?;
    info!("Pedigree repaired: {} individual(s), {stats}", pedigree.len());
    Ok((pedigree, stats))
}

/// Read the cohort (defaults to every recorded individual), then apply the lineage-depth filter if requested.
fn select_cohort(pedigree: &Pedigree, args: &CohortArgs, dropped: &mut DroppedIds) -> Result<Vec<String>> {
    let cohort: Vec<String> = match &args.cohort {
        Some(path) => read::read_id_list(path)?,
        None => pedigree.iter()
            .filter(|ind| ind.origin == Origin::Recorded)
            .map(|ind| ind.label.clone())
            .collect(),
    };

    let Some(generations) = args.depth_filter else {
        return Ok(cohort)
    };
    let report = lineage::depth_filter(pedigree, &cohort, generations).loc("While applying the lineage-depth filter")?;
    let expected = lineage::full_depth_count(generations).loc("While applying the lineage-depth filter")?;
    info!("Lineage-depth filter ({generations} generation(s)): kept {} out of {} individual(s)", report.kept.len(), cohort.len());
    dropped.extend(report.missing, "not-in-pedigree");
    for (id, count) in report.excluded {
        dropped.push(id, format!("incomplete-lineage:{count}/{expected}"));
    }
    Ok(report.kept)
}

fn kinship_stage(pedigree: &Pedigree, cohort: &[String], dropped: &mut DroppedIds) -> Result<KinshipMatrix> {
    if cohort.is_empty() {
        warn!("Cohort is empty. Kinship matrix will be empty as well");
    }
    let CohortKinship{matrix, missing} = kinship::compute_kinship(pedigree, cohort)
        .loc("While computing kinship coefficients")?;
    dropped.extend(missing, "not-in-pedigree");
    Ok(matrix)
}

fn prune_stage(matrix: &KinshipMatrix, args: &PruneArgs) -> Result<PruneReport> {
    let strategy = match args.strategy {
        PruneMode::NearMaximum => PruneStrategy::NearMaximum,
        PruneMode::Greedy      => PruneStrategy::Greedy,
    };
    info!("Pruning individuals above a kinship of {} using {}", args.threshold, args.strategy);
    let report = kinship::prune(matrix, args.threshold, strategy).loc("While pruning related individuals")?;
    debug!("Pruned out: {:?}", report.removed);
    Ok(report)
}

/// Region of each individual: seeded from the pedigree's records if provided, then overwritten by the lookup table.
fn region_assignment(pedigree: Option<&Pedigree>, lookup: Option<&Path>) -> Result<RegionAssignment> {
    let mut assignment = RegionAssignment::new();
    for ind in pedigree.into_iter().flat_map(Pedigree::iter) {
        let region = ind.region.map(Region::new).transpose()
            .with_loc(|| format!("While reading the region of {}", ind.label))?;
        assignment.insert(&ind.label, region);
    }
    if let Some(path) = lookup {
        assignment.merge(read::read_region_lookup(path)?);
    }
    if assignment.is_empty() {
        return Err(PipelineError::NoRegionAssignment).loc("While assigning individuals to regions")
    }
    Ok(assignment)
}

fn allocate_quotas(assignment: &RegionAssignment, args: &SampleArgs) -> Result<Quotas> {
    let weights: BTreeMap<Region, f64> = match &args.region_weights {
        Some(weights) => weights.iter()
            .map(|w| Region::new(w.region).map(|region| (region, w.weight)))
            .collect::<Result<BTreeMap<Region, f64>, SamplerError>>()
            .loc("While parsing regional weights")?,
        None => assignment.population_weights(),
    };

    let quotas = match args.quota_mode {
        QuotaMode::Equal        => Quotas::equal(weights.keys().copied(), args.total),
        QuotaMode::Proportional => Quotas::proportional(&weights, args.total),
    }.loc("While allocating regional quotas")?;
    info!("Regional quotas (region:count): {quotas}");
    Ok(quotas)
}

fn sample_stage(pruned: &[String], assignment: &RegionAssignment, args: &SampleArgs, dropped: &mut DroppedIds) -> Result<StratifiedSample> {
    let quotas = allocate_quotas(assignment, args)?;
    info!("Drawing {} candidate(s) using seed {}", quotas.total(), args.seed);
    let sample = sampler::sample(pruned, assignment, &quotas, args.seed)
        .loc("While drawing a region-stratified sample")?;
    dropped.extend(sample.unassigned.iter().cloned(), "no-region");
    Ok(sample)
}

fn write_candidates(path: &Path, sample: &StratifiedSample, args: &SampleArgs) -> Result<()> {
    let names = match &args.sample_names {
        Some(path) => read::read_sample_names(path)?,
        None       => Default::default(),
    };
    write::write_candidates(path, sample, &names)
}

/// Run the requested pipeline stage(s).
///
/// # Errors
/// - if any input file is invalid, or any output file cannot be written.
/// - if any stage fails on a data-integrity or invariant error (cyclic pedigree, duplicate
///   identifiers, pruning post-condition, regional shortfall, etc.)
pub fn run(cli: Cli) -> Result<()> {
    match cli.commands {
        Repair {common, pedigree} => {
            let outputs = output_files(&common, &[PEDIGREE, REPAIR])?;
            let (pedigree, stats) = load_pedigree(&pedigree.records)?;
            write::write_repaired_pedigree(&outputs[PEDIGREE], &pedigree)?;
            write::write_repair_stats(&outputs[REPAIR], &stats)?;
        },

        Kinship {common, pedigree, cohort} => {
            let outputs = output_files(&common, &[KINSHIP, MISSING])?;
            let (pedigree, _) = load_pedigree(&pedigree.records)?;
            let mut dropped = DroppedIds::default();
            let cohort = select_cohort(&pedigree, &cohort, &mut dropped)?;
            let matrix = kinship_stage(&pedigree, &cohort, &mut dropped)?;
            write::write_kinship_matrix(&outputs[KINSHIP], &matrix)?;
            dropped.write(&outputs[MISSING])?;
        },

        Prune {common, matrix, prune} => {
            let outputs = output_files(&common, &[PRUNED])?;
            let matrix = read::read_kinship_matrix(&matrix)?;
            let report = prune_stage(&matrix, &prune)?;
            write::write_id_list(&outputs[PRUNED], &report.kept)?;
        },

        Sample {common, pruned, sample} => {
            let outputs = output_files(&common, &[CANDIDATES, MISSING])?;
            let pruned = read::read_id_list(&pruned)?;
            let assignment = region_assignment(None, sample.regions.as_deref())?;
            let mut dropped = DroppedIds::default();
            let candidates = sample_stage(&pruned, &assignment, &sample, &mut dropped)?;
            write_candidates(&outputs[CANDIDATES], &candidates, &sample)?;
            dropped.write(&outputs[MISSING])?;
        },

        Run {common, pedigree, cohort, prune, sample} => {
            let outputs = output_files(&common, &[PEDIGREE, REPAIR, KINSHIP, PRUNED, CANDIDATES, MISSING])?;
            // ----------------------------- Repair
            let (pedigree, stats) = load_pedigree(&pedigree.records)?;
            write::write_repaired_pedigree(&outputs[PEDIGREE], &pedigree)?;
            write::write_repair_stats(&outputs[REPAIR], &stats)?;

            // ----------------------------- Kinship
            let mut dropped = DroppedIds::default();
            let cohort = select_cohort(&pedigree, &cohort, &mut dropped)?;
            let matrix = kinship_stage(&pedigree, &cohort, &mut dropped)?;
            write::write_kinship_matrix(&outputs[KINSHIP], &matrix)?;

            // ----------------------------- Prune
            let report = prune_stage(&matrix, &prune)?;
            write::write_id_list(&outputs[PRUNED], &report.kept)?;

            // ----------------------------- Sample
            let assignment = region_assignment(Some(&pedigree), sample.regions.as_deref())?;
            let candidates = sample_stage(&report.kept, &assignment, &sample, &mut dropped)?;
            write_candidates(&outputs[CANDIDATES], &candidates, &sample)?;
            dropped.write(&outputs[MISSING])?;
        },

        FromYaml {yaml} => {
            let cli = Cli::deserialize(&yaml)?;
            cli.serialize()?;
            self::run(cli)?;
        },
    };
    Ok(())
}
