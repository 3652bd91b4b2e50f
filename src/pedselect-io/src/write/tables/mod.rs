use std::{fmt::{self, Display, Formatter}, path::Path};

use ahash::AHashMap;
use anyhow::Result;
use log::info;

use kinship::KinshipMatrix;
use located_error::LocatedError;
use pedigree::{Individual, Pedigree, RepairStats};
use sampler::StratifiedSample;

use super::GenericWriter;

/// Separator of every output table.
pub const SEP: &str = "\t";

/// Missing value token of every output table.
const NA: &str = "NA";

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| NA.to_string(), |v| v.to_string())
}

/// One line of a repaired pedigree table.
struct PedigreeRow<'a> {
    pedigree  : &'a Pedigree,
    individual: &'a Individual,
}

impl Display for PedigreeRow<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ind = self.individual;
        let (father, mother) = self.pedigree.parent_labels(ind).unwrap_or((NA, NA));
        write!(f, "{}{SEP}{father}{SEP}{mother}{SEP}{}{SEP}{}{SEP}{}{SEP}{}{SEP}{}",
            ind.label,
            ind.sex,
            or_na(ind.birth_place.as_deref()),
            or_na(ind.birth_year),
            or_na(ind.region),
            ind.origin,
        )
    }
}

/// Write a repaired pedigree, in insertion order: input records first, then synthesized parents.
pub fn write_repaired_pedigree(path: &Path, pedigree: &Pedigree) -> Result<()> {
    let loc_msg = || format!("While writing repaired pedigree into {}", path.display());
    let mut writer = GenericWriter::new(Some(path)).with_loc(loc_msg)?;
    let header = ["id", "father_id", "mother_id", "sex", "birth_place", "birth_year", "region", "origin"].join(SEP);
    writer.write_iter(std::iter::once(header)).with_loc(loc_msg)?;
    writer.write_iter(pedigree.iter().map(|individual| PedigreeRow { pedigree, individual })).with_loc(loc_msg)?;
    info!("Repaired pedigree written into {}", path.display());
    Ok(())
}

pub fn write_repair_stats(path: &Path, stats: &RepairStats) -> Result<()> {
    let loc_msg = || format!("While writing repair statistics into {}", path.display());
    let lines = [
        format!("statistic{SEP}count"),
        format!("referenced_added{SEP}{}", stats.referenced_added),
        format!("placeholders_added{SEP}{}", stats.placeholders_added),
        format!("sex_corrections{SEP}{}", stats.sex_corrections),
    ];
    GenericWriter::new(Some(path)).and_then(|mut writer| writer.write_iter(lines)).with_loc(loc_msg)
}

/// Write a square kinship matrix, with a header row and an identifier column.
/// Coefficients are printed with 10 decimals.
pub fn write_kinship_matrix(path: &Path, matrix: &KinshipMatrix) -> Result<()> {
    let loc_msg = || format!("While writing kinship matrix into {}", path.display());
    let mut writer = GenericWriter::new(Some(path)).with_loc(loc_msg)?;
    let header = std::iter::once("id").chain(matrix.ids()).collect::<Vec<_>>().join(SEP);
    writer.write_iter(std::iter::once(header)).with_loc(loc_msg)?;

    let rows = matrix.ids().enumerate().map(|(i, id)| {
        let values = matrix.row(i).map(|k| format!("{k:.10}")).collect::<Vec<_>>().join(SEP);
        format!("{id}{SEP}{values}")
    });
    writer.write_iter(rows).with_loc(loc_msg)?;
    info!("Kinship matrix written into {}", path.display());
    Ok(())
}

/// Write a list of identifiers, one per line, without header.
pub fn write_id_list<S: AsRef<str>>(path: &Path, ids: &[S]) -> Result<()> {
    let loc_msg = || format!("While writing identifier list into {}", path.display());
    GenericWriter::new(Some(path))
        .and_then(|mut writer| writer.write_iter(ids.iter().map(AsRef::as_ref)))
        .with_loc(loc_msg)
}

/// Write the final candidate list: `id  external_sample_name  region`. Unknown sample names are written as `NA`.
pub fn write_candidates(path: &Path, sample: &StratifiedSample, names: &AHashMap<String, String>) -> Result<()> {
    let loc_msg = || format!("While writing candidate list into {}", path.display());
    let mut writer = GenericWriter::new(Some(path)).with_loc(loc_msg)?;
    writer.write_iter(std::iter::once(["id", "external_sample_name", "region"].join(SEP))).with_loc(loc_msg)?;
    let lines = sample.selected.iter().map(|(id, region)| {
        format!("{id}{SEP}{}{SEP}{region}", or_na(names.get(id)))
    });
    writer.write_iter(lines).with_loc(loc_msg)?;
    info!("{} candidate(s) written into {}", sample.len(), path.display());
    Ok(())
}

/// Write every identifier dropped along the pipeline: `id  reason`.
pub fn write_missing_report(path: &Path, entries: &[(String, String)]) -> Result<()> {
    let loc_msg = || format!("While writing missing identifier report into {}", path.display());
    let mut writer = GenericWriter::new(Some(path)).with_loc(loc_msg)?;
    writer.write_iter(std::iter::once(format!("id{SEP}reason"))).with_loc(loc_msg)?;
    writer.write_iter(entries.iter().map(|(id, reason)| format!("{id}{SEP}{reason}"))).with_loc(loc_msg)
}
