use std::{fs, path::{Path, PathBuf}};

use ahash::AHashMap;
use anyhow::Result;
use log::trace;

use located_error::LocatedError;

mod error;
pub use error::ParseError;

/// Attempt to create the parent directories of a path (if needed) and return an error if it failed.
pub fn create_parent_directory(path: &Path) -> Result<()> {
    use ParseError::CreateParentDirectory;
    let parent_dir = path.parent().unwrap_or(path);
    let loc_msg = || format!("While attempting to create output directory '{}'", path.display());
    fs::create_dir_all(parent_dir).map_err(CreateParentDirectory).with_loc(loc_msg)?;
    Ok(())
}

/// Attempt to convert a path to string, and return an error if it failed.
fn maybe_to_str(path: &Path) -> Result<&str> {
    use ParseError::InvalidFilename;
    path.to_str().ok_or(InvalidFilename).loc("While converting path to string")
}

/// Obtain the output files of a pipeline stage, named `{file_prefix}.{suffix}`.
/// Returns a map with K: `suffix`, V: path of the output file.
///
/// # Errors
/// - If creating the parent directory of `file_prefix` fails.
/// - `OverwriteDisallowed` if any output file already exists, and `allow_overwrite` is false.
pub fn get_output_files(file_prefix: &Path, allow_overwrite: bool, suffixes: &[&str]) -> Result<AHashMap<String, PathBuf>> {
    let err_context = "While attempting to format the name of the output files";
    create_parent_directory(file_prefix)?;

    let prefix = maybe_to_str(file_prefix).loc(err_context)?;
    let mut outfiles = AHashMap::with_capacity(suffixes.len());
    for suffix in suffixes {
        let file = PathBuf::from(format!("{prefix}.{suffix}"));
        can_write_file(allow_overwrite, &file)?;
        outfiles.insert((*suffix).to_string(), file);
    }
    trace!("Output File(s): {:#?}", outfiles.values());
    Ok(outfiles)
}

/// Check if a given file already exists ; raise an error if such is the case, and the user did not explicitly
/// allow file overwriting.
///
/// # Errors
/// - If the provided `path` already exists and the user did not specifically allow for file
///   overwrite using the `--overwrite` argument
pub fn can_write_file(overwrite: bool, path: &Path) -> Result<bool> {
    let loc_msg = "While ensuring that file permissions were appropriate";
    if !overwrite && path.exists() {
        return Err(ParseError::OverwriteDisallowed{path: path.to_path_buf()}).loc(loc_msg)
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn output_files_are_suffixed() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let prefix = tmpdir.path().join("nested").join("cohort");
        let files  = get_output_files(&prefix, false, &["kinship.tsv", "missing.tsv"])?;
        assert_eq!(files.len(), 2);
        assert_eq!(files.get("kinship.tsv"), Some(&tmpdir.path().join("nested").join("cohort.kinship.tsv")));
        assert!(tmpdir.path().join("nested").is_dir());
        Ok(())
    }

    #[test]
    fn existing_output_files() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let prefix = tmpdir.path().join("cohort");
        let _ = File::create(tmpdir.path().join("cohort.pruned.txt"))?;

        let err = get_output_files(&prefix, false, &["pruned.txt"]).unwrap_err();
        assert!(matches!(err.downcast_ref::<ParseError>(), Some(ParseError::OverwriteDisallowed{..})));
        assert!(get_output_files(&prefix, true, &["pruned.txt"]).is_ok());
        Ok(())
    }

    #[test]
    fn test_can_write_file() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;

        let path   = tmpdir.path().join("cohort.txt");
        assert!(can_write_file(false, &path).is_ok_and(|x| x));
        assert!(can_write_file(true, &path).is_ok_and(|x| x));

        let _   = File::create(&path)?;
        assert!(can_write_file(true, &path).is_ok_and(|x| x));
        assert!(can_write_file(false, &path).is_err_and(|e| {
            matches!(e.downcast_ref::<ParseError>(), Some(ParseError::OverwriteDisallowed{path: _}))
        }));
        Ok(())
    }
}
