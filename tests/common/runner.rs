use std::{env, fs, path::{Path, PathBuf}};

use clap::Parser;
use pretty_assertions::assert_eq;

use super::fixture::TEST_DATA_DIR;

/// Parse a whitespace separated command line, and run it through the whole `pedselect_rs::run()` dispatcher.
pub fn run_pedselect(args: &str) -> anyhow::Result<()> {
    eprintln!("{args}");
    let cli = parser::Cli::try_parse_from(args.split_whitespace())?;
    pedselect_rs::run(cli)
}

/// Path of an expected output file, within `tests/test-data/expect`
pub fn expected_file(filename: &str) -> PathBuf {
    let root_dir = env::var("CARGO_MANIFEST_DIR").expect("$CARGO_MANIFEST_DIR");
    [root_dir.as_str(), TEST_DATA_DIR, "expect", filename].iter().collect()
}

/// Compare an obtained output file against its expected counterpart.
pub fn assert_same_content(expected: &str, obtained: &Path) {
    let want = fs::read_to_string(expected_file(expected))
        .unwrap_or_else(|_| panic!("Failed to open expected file {expected}"));
    let got = fs::read_to_string(obtained)
        .unwrap_or_else(|_| panic!("Failed to open {}", obtained.display()));
    assert_eq!(want, got);
}
