use std::fs;

#[cfg(test)]
mod common;
use common::{assert_same_content, run_pedselect, Fixture};

use anyhow::Result;
#[cfg(test)] use pretty_assertions::assert_eq;

fn read_lines(path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Failed to open {}", path.display()))
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn repair() -> Result<()> {
    let records    = Fixture::copy("records.tsv");
    let output_dir = Fixture::blank("pedselect-output");

    run_pedselect(&format!("pedselect-rs repair
        --records    {records}
        --output-dir {output_dir}
        --prefix     cohort
    "))?;

    assert_same_content("cohort.repair.tsv", &output_dir.join("cohort.repair.tsv"));

    let lines = read_lines(&output_dir.join("cohort.pedigree.tsv"));
    assert_eq!(lines.len(), 16);
    assert_eq!(lines[5], "M1\tNA\tNA\tfemale\tAlma\t1876\t2\trecorded");
    assert_eq!(lines[11], "U1\tX1\t~mother-of:U1\tmale\tRoberval\t1900\t3\trecorded");
    assert_eq!(lines[14], "X1\tNA\tNA\tmale\tNA\tNA\tNA\treferenced");
    assert_eq!(lines[15], "~mother-of:U1\tNA\tNA\tfemale\tNA\tNA\tNA\tplaceholder");
    Ok(())
}

#[test]
fn existing_outputs_require_overwrite() -> Result<()> {
    let records    = Fixture::copy("records.tsv");
    let output_dir = Fixture::blank("pedselect-output");
    let args = format!("pedselect-rs repair --records {records} --output-dir {output_dir} --prefix cohort");

    run_pedselect(&args)?;
    assert!(run_pedselect(&args).is_err());
    run_pedselect(&format!("{args} --overwrite"))?;
    Ok(())
}

#[test]
fn kinship_matrix_and_missing_report() -> Result<()> {
    let records    = Fixture::copy("records.tsv");
    let cohort     = Fixture::copy("cohort.txt");
    let output_dir = Fixture::blank("pedselect-output");

    run_pedselect(&format!("pedselect-rs kinship
        --records    {records}
        --cohort     {cohort}
        --output-dir {output_dir}
        --prefix     cohort
    "))?;

    assert_same_content("cohort.kinship.tsv", &output_dir.join("cohort.kinship.tsv"));
    assert_eq!(read_lines(&output_dir.join("cohort.missing.tsv")), ["id\treason", "GHOST\tnot-in-pedigree"]);
    Ok(())
}

#[test]
fn lineage_depth_filter() -> Result<()> {
    let records    = Fixture::copy("records.tsv");
    let cohort     = Fixture::copy("cohort.txt");
    let output_dir = Fixture::blank("pedselect-output");

    run_pedselect(&format!("pedselect-rs kinship
        --records      {records}
        --cohort       {cohort}
        --output-dir   {output_dir}
        --prefix       cohort
        --depth-filter 1
    "))?;

    let matrix = read_lines(&output_dir.join("cohort.kinship.tsv"));
    assert_eq!(matrix[0], "id\tC1\tC2\tC3\tC4");
    assert_eq!(matrix.len(), 5);

    // ---- U1 only has a single registered parent: its mother is a placeholder.
    assert_eq!(read_lines(&output_dir.join("cohort.missing.tsv")), [
        "id\treason",
        "GHOST\tnot-in-pedigree",
        "U1\tincomplete-lineage:1/2",
        "U2\tincomplete-lineage:0/2",
        "U3\tincomplete-lineage:0/2",
    ]);
    Ok(())
}

#[test]
fn repaired_pedigree_as_input() -> Result<()> {
    let records    = Fixture::copy("records.tsv");
    let cohort     = Fixture::copy("cohort.txt");
    let output_dir = Fixture::blank("pedselect-output");

    run_pedselect(&format!("pedselect-rs repair --records {records} --output-dir {output_dir} --prefix raw"))?;
    let repaired = output_dir.join("raw.pedigree.tsv");

    for (prefix, input) in [("original", records.to_path_buf()), ("repaired", repaired)] {
        run_pedselect(&format!("pedselect-rs kinship
            --records      {}
            --cohort       {cohort}
            --output-dir   {output_dir}
            --prefix       {prefix}-filtered
            --depth-filter 1
        ", input.display()))?;
        run_pedselect(&format!("pedselect-rs kinship --records {} --output-dir {output_dir} --prefix {prefix}-all", input.display()))?;
    }

    // ---- Synthesized parents neither count as registered ancestors, nor join the default cohort.
    for suffix in ["filtered.kinship.tsv", "filtered.missing.tsv", "all.kinship.tsv"] {
        assert_eq!(
            read_lines(&output_dir.join(&format!("repaired-{suffix}"))),
            read_lines(&output_dir.join(&format!("original-{suffix}"))),
        );
    }
    assert_eq!(read_lines(&output_dir.join("repaired-filtered.missing.tsv"))[2], "U1\tincomplete-lineage:1/2");
    Ok(())
}

#[test]
fn prune_strategies() -> Result<()> {
    let matrix = Fixture::copy("expect/cohort.kinship.tsv");

    for strategy in ["near-maximum", "greedy"] {
        let output_dir = Fixture::blank("pedselect-output");
        run_pedselect(&format!("pedselect-rs prune
            --matrix     {matrix}
            --output-dir {output_dir}
            --prefix     cohort
            --strategy   {strategy}
        "))?;
        assert_same_content("cohort.pruned.txt", &output_dir.join("cohort.pruned.txt"));

        // ---- First cousins lie exactly at the default threshold. A null threshold leaves a single cousin.
        run_pedselect(&format!("pedselect-rs prune
            --matrix     {matrix}
            --output-dir {output_dir}
            --prefix     strict
            --strategy   {strategy}
            --threshold  0
        "))?;
        let kept = read_lines(&output_dir.join("strict.pruned.txt"));
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[1..], ["U1", "U2", "U3"]);
    }
    Ok(())
}

#[test]
fn sample() -> Result<()> {
    let pruned     = Fixture::copy("expect/cohort.pruned.txt");
    let regions    = Fixture::copy("regions.tsv");
    let output_dir = Fixture::blank("pedselect-output");

    // ---- Only C2 and U3 are assigned to a region.
    run_pedselect(&format!("pedselect-rs sample
        --pruned     {pruned}
        --regions    {regions}
        --output-dir {output_dir}
        --prefix     cohort
        --total      2
        --quota-mode equal
        --seed       11
    "))?;

    assert_eq!(read_lines(&output_dir.join("cohort.candidates.tsv")), [
        "id\texternal_sample_name\tregion",
        "C2\tNA\t2",
        "U3\tNA\t3",
    ]);
    assert_eq!(read_lines(&output_dir.join("cohort.missing.tsv")), [
        "id\treason",
        "C4\tno-region",
        "U1\tno-region",
        "U2\tno-region",
    ]);
    Ok(())
}

#[test]
fn sample_shortfall() -> Result<()> {
    let pruned     = Fixture::copy("expect/cohort.pruned.txt");
    let regions    = Fixture::copy("regions.tsv");
    let output_dir = Fixture::blank("pedselect-output");

    let err = run_pedselect(&format!("pedselect-rs sample
        --pruned     {pruned}
        --regions    {regions}
        --output-dir {output_dir}
        --total      4
        --quota-mode equal
    ")).unwrap_err();

    let Some(sampler::SamplerError::Shortfall(shortfalls)) = err.downcast_ref::<sampler::SamplerError>() else {
        panic!("Expected a regional shortfall. Got {err:?}");
    };
    let regions: Vec<u8> = shortfalls.iter().map(|s| s.region.code()).collect();
    assert_eq!(regions, [2, 3]);
    Ok(())
}

#[test]
fn full_pipeline() -> Result<()> {
    let records      = Fixture::copy("records.tsv");
    let cohort       = Fixture::copy("cohort.txt");
    let regions      = Fixture::copy("regions.tsv");
    let sample_names = Fixture::copy("sample-names.tsv");
    let output_dir   = Fixture::blank("pedselect-output");

    let args = format!("pedselect-rs run
        --records      {records}
        --cohort       {cohort}
        --regions      {regions}
        --sample-names {sample_names}
        --output-dir   {output_dir}
        --prefix       cohort
        --total        3
        --seed         7
    ");
    run_pedselect(&args)?;

    assert_same_content("cohort.repair.tsv",  &output_dir.join("cohort.repair.tsv"));
    assert_same_content("cohort.kinship.tsv", &output_dir.join("cohort.kinship.tsv"));
    assert_same_content("cohort.pruned.txt",  &output_dir.join("cohort.pruned.txt"));
    assert_eq!(read_lines(&output_dir.join("cohort.missing.tsv")), ["id\treason", "GHOST\tnot-in-pedigree"]);

    // ---- Population shares: region 1 -> 6, region 2 -> 4, region 3 -> 3 (U3 through the lookup table)
    //      Three candidates thus means one per region.
    let candidates = read_lines(&output_dir.join("cohort.candidates.tsv"));
    assert_eq!(candidates.len(), 4);
    assert_eq!(candidates[1], "C4\tWGS-0004\t1");
    assert_eq!(candidates[2], "C2\tWGS-0002\t2");
    assert!(["U1\tNA\t3", "U2\tNA\t3", "U3\tNA\t3"].contains(&candidates[3].as_str()), "{}", candidates[3]);

    // ---- Same seed, same selection.
    run_pedselect(&format!("{args} --overwrite"))?;
    assert_eq!(read_lines(&output_dir.join("cohort.candidates.tsv")), candidates);
    Ok(())
}

#[test]
fn replay_from_yaml() -> Result<()> {
    use clap::Parser;

    let matrix     = Fixture::copy("expect/cohort.kinship.tsv");
    let output_dir = Fixture::blank("pedselect-output");

    let args = format!("pedselect-rs prune --matrix {matrix} --output-dir {output_dir} --prefix cohort");
    let cli  = parser::Cli::try_parse_from(args.split_whitespace())?;
    let yaml = cli.serialize()?.expect("prune arguments should be serialized");

    run_pedselect(&format!("pedselect-rs from-yaml {}", yaml.display()))?;
    assert_same_content("cohort.pruned.txt", &output_dir.join("cohort.pruned.txt"));
    Ok(())
}
