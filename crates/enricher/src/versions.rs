use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DATASET_PREFIX: &str = "instrumentation-list-";
pub const DATASET_SUFFIX: &str = ".yaml";

/// A dataset file found on disk and the version it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedVersion {
    pub version: String,
    pub path: PathBuf,
}

/// `instrumentation-list-2.20.yaml` -> `2.20`. The identifier is kept verbatim.
pub fn version_from_file_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(DATASET_PREFIX)?
        .strip_suffix(DATASET_SUFFIX)
        .filter(|version| !version.is_empty())
}

/// Pads a dotted version to three components: `2.20` -> `2.20.0`.
pub fn normalize_version(version: &str) -> String {
    let mut parts: Vec<&str> = version.split('.').collect();
    while parts.len() < 3 {
        parts.push("0");
    }
    parts.join(".")
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Component<'a> {
    Numeric(u64),
    Text(&'a str),
}

fn components(version: &str) -> Vec<Component<'_>> {
    version
        .split('.')
        .map(|part| match part.parse::<u64>() {
            Ok(n) => Component::Numeric(n),
            Err(_) => Component::Text(part),
        })
        .collect()
}

/// Numeric dotted order (`2.9` < `2.10`), non-numeric parts after numeric
/// ones, raw text as the tie breaker.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    components(a).cmp(&components(b)).then_with(|| a.cmp(b))
}

/// Finds every dataset in `dir`, ordered by version.
pub fn detect_versions(dir: &Path) -> io::Result<Vec<DetectedVersion>> {
    let mut versions: Vec<DetectedVersion> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let file_name = entry.file_name().into_string().ok()?;
            let version = version_from_file_name(&file_name)?.to_string();
            Some(DetectedVersion {
                version,
                path: entry.path(),
            })
        })
        .collect();

    versions.sort_by(|a, b| compare_versions(&a.version, &b.version));
    Ok(versions)
}
