use std::{
    ffi::OsStr,
    fmt::{self, Display, Formatter},
    fs::File,
    path::{Path, PathBuf},
};

use located_error::LocatedError;

use anyhow::Result;
use clap::{ArgEnum, Args, Parser, Subcommand};
use log::debug;
use serde::{Deserialize, Serialize};

mod error;
pub use error::ParserError;

#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name="pedselect-rs", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// PEDSELECT-rs: Pedigree-based selection of minimally related sequencing candidates
pub struct Cli {
    ///Set the verbosity level (-v -vv -vvv)
    ///
    /// Set the verbosity level of this program. Multiple levels allowed {n}
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace {n}
    ///
    /// Note that the program will still output warnings by default, even when this flag is off.
    /// Use The --quiet/-q to disable them
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings.
    ///
    /// By default, warnings are emmited and redirected to the console, even when verbose mode is off.
    /// Use this argument to disable this. Only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

impl Cli {
    /// Serialize command line arguments within a `.yaml` file.
    ///
    /// # Behavior
    /// - File naming follows the convention '{current time}-{subcommand}.yaml'. current time follows the format
    ///   `YYYY`-`MM`-`DD`T`hhmmss`
    /// - File is written at the root of the user-provided `--output-dir` folder.
    /// - `from-yaml` invocations are not serialized: the replayed run serializes itself.
    ///
    /// # Errors
    /// - if `serde_yaml` fails to parse `Self` to a string.
    /// - if the output file cannot be written.
    pub fn serialize(&self) -> Result<Option<PathBuf>> {
        let Some(common) = self.commands.common() else {
            return Ok(None)
        };

        let serialized = serde_yaml::to_string(&self)
            .map_err(|e| ParserError::Serialize(e.to_string()))
            .loc("While serializing command line arguments")?;
        debug!("\n---- Command line args ----\n{}\n---", serialized);

        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S").to_string();
        let output_file = common.output_dir.join(format!("{current_time}-{}.yaml", self.commands.name()));

        std::fs::write(&output_file, serialized)
            .map_err(|_| ParserError::WriteArguments(output_file.display().to_string()))
            .with_loc(|| format!("While serializing command line arguments: [{}]", output_file.display()))?;
        Ok(Some(output_file))
    }

    /// Deserialize a `.yaml` file into Command line arguments.
    ///
    /// # Errors
    /// - if the provided `.yaml` file does not exist, or does not carry read permissions
    /// - if `serde_yaml` fails to parse the provided file to `Self`.
    pub fn deserialize(yaml: &Path) -> Result<Self> {
        let loc_msg = || format!("While deserializing command line arguments from {}", yaml.display());
        let file = File::open(yaml)
            .map_err(|_| ParserError::ReadArguments(yaml.display().to_string()))
            .with_loc(loc_msg)?;
        serde_yaml::from_reader(file).with_loc(loc_msg)
    }
}

#[derive(Subcommand, Debug, Serialize, Deserialize)]
pub enum Commands {
    /// Repair an incomplete pedigree.
    ///
    /// Synthesize every referenced-but-unrecorded parent, complete single-parent records with a
    /// placeholder founder, and correct the sex of individuals acting as a father or a mother.
    /// Outputs the repaired pedigree ('<prefix>.pedigree.tsv') and repair statistics ('<prefix>.repair.tsv').
    Repair {
        #[clap(flatten)]
        common: Common,
        #[clap(flatten)]
        pedigree: PedigreeInput,
    },

    /// Compute the pairwise kinship matrix of a cohort.
    ///
    /// Kinship coefficients are computed over the whole (repaired) pedigree, and restricted to the
    /// requested cohort. Outputs '<prefix>.kinship.tsv' and '<prefix>.missing.tsv'.
    Kinship {
        #[clap(flatten)]
        common: Common,
        #[clap(flatten)]
        pedigree: PedigreeInput,
        #[clap(flatten)]
        cohort: CohortArgs,
    },

    /// Prune a kinship matrix down to a large set of mutually unrelated individuals.
    ///
    /// Outputs the list of kept individuals ('<prefix>.pruned.txt').
    Prune {
        #[clap(flatten)]
        common: Common,
        /// Path to a kinship matrix, as written by the 'kinship' subcommand.
        #[clap(short='m', long, parse(try_from_os_str=valid_input_file))]
        matrix: PathBuf,
        #[clap(flatten)]
        prune: PruneArgs,
    },

    /// Draw a region-stratified random sample out of a pruned list of individuals.
    ///
    /// Outputs the final candidate list ('<prefix>.candidates.tsv') and '<prefix>.missing.tsv'.
    Sample {
        #[clap(flatten)]
        common: Common,
        /// Path to a list of pruned individuals, one identifier per line.
        #[clap(short='p', long, parse(try_from_os_str=valid_input_file))]
        pruned: PathBuf,
        #[clap(flatten)]
        sample: SampleArgs,
    },

    /// Run the whole pipeline: repair, kinship, prune and sample in one go.
    Run {
        #[clap(flatten)]
        common: Common,
        #[clap(flatten)]
        pedigree: PedigreeInput,
        #[clap(flatten)]
        cohort: CohortArgs,
        #[clap(flatten)]
        prune: PruneArgs,
        #[clap(flatten)]
        sample: SampleArgs,
    },

    /// Run pedselect-rs using a previously generated .yaml configuration file.
    ///
    /// This allows users to easily re-apply a pedselect-rs command using the exact same parameters,
    /// arguments and random seed.
    FromYaml {
        yaml: PathBuf,
    },
}

impl Commands {
    /// Subcommand name, as typed on the command line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Repair{..}   => "repair",
            Self::Kinship{..}  => "kinship",
            Self::Prune{..}    => "prune",
            Self::Sample{..}   => "sample",
            Self::Run{..}      => "run",
            Self::FromYaml{..} => "from-yaml",
        }
    }

    /// Output arguments of the subcommand. `None` for `from-yaml`.
    #[must_use]
    pub fn common(&self) -> Option<&Common> {
        match self {
            Self::Repair{common, ..}
            | Self::Kinship{common, ..}
            | Self::Prune{common, ..}
            | Self::Sample{common, ..}
            | Self::Run{common, ..} => Some(common),
            Self::FromYaml{..} => None,
        }
    }
}

#[derive(Args, Debug, Default, Serialize, Deserialize)]
pub struct Common {
    /// Output directory where results will be written.
    ///
    /// Note that pedselect-rs will create the specified leaf directory if it is not present, but does not
    /// allow itself from creating parent directories.
    #[clap(short, long, default_value("pedselect-output"), parse(try_from_os_str=valid_output_dir))]
    pub output_dir: PathBuf,

    /// Prefix of every output file.
    ///
    /// Output files are named '<output-dir>/<prefix>.<suffix>', e.g. 'pedselect-output/cohort.kinship.tsv'
    #[clap(long, default_value("pedselect"))]
    pub prefix: String,

    /// Overwrite existing output files.
    ///
    /// By default, pedselect-rs does not allow itself from overwriting existing results files. Use this flag
    /// to force this behaviour.
    #[clap(short='w', long)]
    pub overwrite: bool,
}

impl Common {
    /// Path prefix of every output file of this run: `<output-dir>/<prefix>`
    #[must_use]
    pub fn file_prefix(&self) -> PathBuf {
        self.output_dir.join(&self.prefix)
    }
}

#[derive(Args, Debug, Default, Serialize, Deserialize)]
pub struct PedigreeInput {
    /// Path to a tab-separated table of individual records.
    ///
    /// Expected columns: 'id  father_id  mother_id  sex', optionally followed by 'birth_place',
    /// 'birth_year' and 'region'. Missing parents may be written as an empty field, '0', 'NA' or '.'
    #[clap(short='r', long, parse(try_from_os_str=valid_input_file))]
    pub records: PathBuf,
}

#[derive(Args, Debug, Default, Serialize, Deserialize)]
pub struct CohortArgs {
    /// Path to the list of cohort individuals (one identifier per line).
    ///
    /// When unspecified, every individual carrying its own record is part of the cohort.
    #[clap(short='c', long, parse(try_from_os_str=valid_input_file))]
    pub cohort: Option<PathBuf>,

    /// Only keep cohort individuals whose ancestors are all recorded over <DEPTH_FILTER> generations.
    ///
    /// Example: '--depth-filter 2' requires 2 parents and 4 grandparents to be registered.
    #[clap(short='g', long, parse(try_from_str=parse_depth_filter))]
    pub depth_filter: Option<u32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ArgEnum, Serialize, Deserialize)]
pub enum PruneMode {
    NearMaximum,
    Greedy,
}

impl Default for PruneMode {
    fn default() -> Self {Self::NearMaximum}
}

impl Display for PruneMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NearMaximum => write!(f, "near-maximum independent set"),
            Self::Greedy      => write!(f, "greedy max-degree removal"),
        }
    }
}

#[derive(Args, Debug, Serialize, Deserialize)]
pub struct PruneArgs {
    /// Kinship threshold above which two individuals are considered related.
    ///
    /// Pairs lying exactly at the threshold are not considered related. The default value of 0.0625
    /// thus keeps first cousins, but removes half-siblings.
    #[clap(short='t', long, default_value("0.0625"), parse(try_from_str=parse_threshold))]
    pub threshold: f64,

    /// Pruning strategy.
    ///
    /// near-maximum: approximate a maximum independent set of the relatedness graph, component by component.{n}
    /// greedy: repeatedly remove the individual with the most related partners. Faster, but never keeps more individuals.
    #[clap(short='S', long, arg_enum, default_value("near-maximum"))]
    pub strategy: PruneMode,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ArgEnum, Serialize, Deserialize)]
pub enum QuotaMode {
    Equal,
    Proportional,
}

impl Default for QuotaMode {
    fn default() -> Self {Self::Proportional}
}

/// A user-defined regional weight, parsed from '<REGION>:<WEIGHT>'
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionWeight {
    pub region: u8,
    pub weight: f64,
}

#[derive(Args, Debug, Serialize, Deserialize)]
pub struct SampleArgs {
    /// Path to a region lookup table ('id  region').
    ///
    /// When running the whole pipeline, regions found in the 'region' column of the records are used as well.
    /// Entries of the lookup table take precedence.
    #[clap(short='R', long, parse(try_from_os_str=valid_input_file))]
    pub regions: Option<PathBuf>,

    /// Total number of candidates to select.
    #[clap(short='n', long)]
    pub total: usize,

    /// How the total is split among regions.
    ///
    /// equal: same count for every region.{n}
    /// proportional: counts proportional to the population share of each region (see --region-weights).
    ///
    /// In both cases, leftover units are handed out by largest remainder, so quotas sum exactly to --total.
    #[clap(long, arg_enum, default_value("proportional"))]
    pub quota_mode: QuotaMode,

    /// Override the population share of each region, when using '--quota-mode proportional'.
    ///
    /// By default, population shares are the head-count of each region within the region lookup.
    /// Example: '--region-weights 1:0.2 2:0.3 3:0.5'
    #[clap(long, multiple_values(true), parse(try_from_str=parse_region_weight))]
    pub region_weights: Option<Vec<RegionWeight>>,

    /// Provide the RNG with a set seed.
    #[clap(long, required(false), default_value_t=fastrand::u64(u64::MIN..=u64::MAX))]
    pub seed: u64,

    /// Path to an external sample name table ('id  name'), used to annotate the candidate list.
    #[clap(long, parse(try_from_os_str=valid_input_file))]
    pub sample_names: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
pub enum FileEntity {File, Directory}

impl Display for FileEntity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::File      => write!(f, "File"),
            Self::Directory => write!(f, "Directory"),
        }
    }
}

impl FileEntity {
    fn validate(&self, path: &Path) -> Result<(), ParserError> {
        use ParserError::InvalidFileEntity;
        let valid = match self {
            Self::File      => path.is_file(),
            Self::Directory => path.is_dir()
        };

        if valid {
            Ok(())
        } else {
            Err(InvalidFileEntity(*self, path.display().to_string()))
        }
    }
}

fn assert_filesystem_entity_is_valid(s: &OsStr, entity: &FileEntity) -> Result<()> {
    use ParserError::MissingFileEntity;
    let path = Path::new(s);
    if ! path.exists() {
        return Err(MissingFileEntity(*entity, path.display().to_string()))
            .loc("While parsing arguments.")
    }

    entity.validate(path).loc("While parsing arguments.")
}

fn valid_input_file(s: &OsStr) -> Result<PathBuf> {
    assert_filesystem_entity_is_valid(s, &FileEntity::File)
        .loc("While checking for file validity")?;
    Ok(PathBuf::from(s))
}

fn valid_output_dir(s: &OsStr) -> Result<PathBuf> {
    if ! Path::new(s).exists() {
        std::fs::create_dir(s)?;
    }
    assert_filesystem_entity_is_valid(s, &FileEntity::Directory)
        .loc("While checking for directory validity")?;
    Ok(PathBuf::from(s))
}

fn parse_threshold(s: &str) -> Result<f64> {
    let err = || ParserError::ParseThreshold(s.to_string());
    let threshold = s.parse::<f64>().map_err(|_| err()).loc("While parsing --threshold")?;
    match (0.0..=1.0).contains(&threshold) {
        true  => Ok(threshold),
        false => Err(err()).loc("While parsing --threshold"),
    }
}

/// Deepest lineage a full ancestor count can be computed for.
const MAX_DEPTH_FILTER: u32 = usize::BITS - 2;

fn parse_depth_filter(s: &str) -> Result<u32> {
    let err = || ParserError::ParseDepthFilter{value: s.to_string(), max: MAX_DEPTH_FILTER};
    match s.trim().parse::<u32>() {
        Ok(depth) if depth <= MAX_DEPTH_FILTER => Ok(depth),
        _ => Err(err()).loc("While parsing --depth-filter"),
    }
}

fn parse_region_weight(s: &str) -> Result<RegionWeight> {
    let err = |reason: &str| ParserError::ParseRegionWeight{value: s.to_string(), reason: reason.to_string()};
    let loc_msg = || format!("While parsing the provided string: {s}");

    let (region, weight) = s.split_once(':').ok_or_else(|| err("missing ':' separator")).with_loc(loc_msg)?;
    let region = match region.trim().parse::<u8>() {
        Ok(code) if code > 0 => code,
        _ => return Err(err("region codes are integers within [1, 255]")).with_loc(loc_msg),
    };
    let weight = match weight.trim().parse::<f64>() {
        Ok(weight) if weight.is_finite() && weight >= 0.0 => weight,
        _ => return Err(err("weights are finite, positive numbers")).with_loc(loc_msg),
    };
    Ok(RegionWeight{region, weight})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).expect("Failed to create test file");
        path
    }

    #[test]
    fn region_weights() {
        assert_eq!(parse_region_weight("3:0.25").unwrap(), RegionWeight{region: 3, weight: 0.25});
        assert_eq!(parse_region_weight(" 12 : 4 ").unwrap(), RegionWeight{region: 12, weight: 4.0});
        for invalid in ["3", "0:0.5", "256:1", "x:1", "1:-0.5", "1:inf", "1:"] {
            let err = parse_region_weight(invalid).unwrap_err();
            assert!(matches!(err.downcast_ref::<ParserError>(), Some(ParserError::ParseRegionWeight{..})), "{invalid}");
        }
    }

    #[test]
    fn thresholds() {
        assert_eq!(parse_threshold("0.125").unwrap(), 0.125);
        assert_eq!(parse_threshold("0").unwrap(), 0.0);
        assert!(parse_threshold("1.5").is_err());
        assert!(parse_threshold("-0.1").is_err());
        assert!(parse_threshold("NaN").is_err());
    }

    #[test]
    fn depth_filter_bounds() {
        assert_eq!(parse_depth_filter("0").unwrap(), 0);
        assert_eq!(parse_depth_filter("2").unwrap(), 2);
        assert_eq!(parse_depth_filter(&MAX_DEPTH_FILTER.to_string()).unwrap(), MAX_DEPTH_FILTER);
        for invalid in [(MAX_DEPTH_FILTER + 1).to_string(), "64".to_string(), u32::MAX.to_string(), "-1".to_string(), "two".to_string()] {
            let err = parse_depth_filter(&invalid).unwrap_err();
            assert!(matches!(err.downcast_ref::<ParserError>(), Some(ParserError::ParseDepthFilter{..})), "{invalid}");
        }
    }

    #[test]
    fn missing_input_file() {
        let err = valid_input_file(OsStr::new("/this/file/does/not/exist.tsv")).unwrap_err();
        assert!(matches!(err.downcast_ref::<ParserError>(), Some(ParserError::MissingFileEntity(FileEntity::File, _))));
    }

    #[test]
    fn run_arguments() -> Result<()> {
        let tmpdir  = tempfile::tempdir()?;
        let records = touch(tmpdir.path(), "records.tsv");
        let regions = touch(tmpdir.path(), "regions.tsv");
        let output  = tmpdir.path().join("out");

        let cli = Cli::try_parse_from([
            "pedselect-rs", "run", "-vv",
            "--records", records.to_str().unwrap(),
            "--regions", regions.to_str().unwrap(),
            "--output-dir", output.to_str().unwrap(),
            "--prefix", "cohort",
            "--total", "10",
            "--strategy", "greedy",
            "--region-weights", "1:0.2", "2:0.8",
            "--seed", "42",
            "--depth-filter", "2",
        ])?;

        assert_eq!(cli.verbose, 2);
        assert!(output.is_dir());
        let Commands::Run{common, pedigree, cohort, prune, sample} = &cli.commands else {
            panic!("Expected the run subcommand");
        };
        assert_eq!(common.file_prefix(), output.join("cohort"));
        assert_eq!(pedigree.records, records);
        assert_eq!(cohort.cohort, None);
        assert_eq!(cohort.depth_filter, Some(2));
        assert_eq!(prune.threshold, 0.0625);
        assert_eq!(prune.strategy, PruneMode::Greedy);
        assert_eq!(sample.quota_mode, QuotaMode::Proportional);
        assert_eq!(sample.seed, 42);
        assert_eq!(sample.region_weights, Some(vec![RegionWeight{region: 1, weight: 0.2}, RegionWeight{region: 2, weight: 0.8}]));
        Ok(())
    }

    #[test]
    fn serialized_arguments_can_be_replayed() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let matrix = touch(tmpdir.path(), "cohort.kinship.tsv");
        let cli = Cli::try_parse_from([
            "pedselect-rs", "prune",
            "--matrix", matrix.to_str().unwrap(),
            "--output-dir", tmpdir.path().to_str().unwrap(),
            "--threshold", "0.125",
        ])?;

        let yaml = cli.serialize()?.expect("prune arguments should be serialized");
        assert!(yaml.file_name().unwrap().to_str().unwrap().ends_with("-prune.yaml"));

        let replay = Cli::deserialize(&yaml)?;
        let Commands::Prune{matrix: replayed, prune, ..} = replay.commands else {
            panic!("Expected the prune subcommand");
        };
        assert_eq!(replayed, matrix);
        assert_eq!(prune.threshold, 0.125);
        assert_eq!(prune.strategy, PruneMode::NearMaximum);
        Ok(())
    }

    #[test]
    fn from_yaml_is_not_serialized() -> Result<()> {
        let cli = Cli::try_parse_from(["pedselect-rs", "from-yaml", "previous-run.yaml"])?;
        assert_eq!(cli.serialize()?, None);
        assert_eq!(cli.commands.name(), "from-yaml");
        Ok(())
    }
}
