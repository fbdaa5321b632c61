//! Filesystem assertions shared by the integration tests

use std::path::Path;

/// Sorted names of the files directly inside `dir`
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|e| {
            e.expect("Failed to read directory entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

/// Assert no file in `dir` ends with `suffix`, ignoring case
pub fn assert_no_suffix(dir: &Path, suffix: &str) {
    let suffix = suffix.to_lowercase();
    let leftovers: Vec<String> = file_names(dir)
        .into_iter()
        .filter(|n| n.to_lowercase().ends_with(&suffix))
        .collect();
    assert!(
        leftovers.is_empty(),
        "{} still holds {:?}",
        dir.display(),
        leftovers
    );
}

/// Assert `dir` holds exactly the sample members
pub fn assert_sample_members(dir: &Path) {
    assert_eq!(file_names(dir), super::fixtures::SAMPLE_MEMBERS.to_vec());
}
