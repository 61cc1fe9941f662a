use semconv::source::{ConventionSource, DirectorySource};
use semconv::{
    build_mappings, canonicalize, enrich_instrumentation, InstrumentationEntry,
    InstrumentationList, MappingTable, Record,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, info_span, warn};

use crate::configuration::{Configuration, PipelineMode};
use crate::versions::{detect_versions, normalize_version, DetectedVersion};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("error loading dataset `{}`: {source}", path.display())]
    Load {
        path: PathBuf,
        source: semconv::SemconvError,
    },
    #[error("error scanning `{}` for datasets: {source}", path.display())]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no instrumentation dataset could be loaded from `{}`", .0.display())]
    NoDatasets(PathBuf),
    #[error("error serializing enriched data: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("error writing `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output_file: PathBuf,
    pub versions: Vec<String>,
    pub entries: usize,
}

pub fn load_dataset(path: &Path) -> Result<InstrumentationList, PipelineError> {
    let to_load_error = |source| PipelineError::Load {
        path: path.to_path_buf(),
        source,
    };
    let contents = fs::read_to_string(path)
        .map_err(|e| to_load_error(semconv::SemconvError::io(path, e)))?;
    InstrumentationList::from_yaml(&contents).map_err(to_load_error)
}

fn enrich_dataset(
    version: &str,
    list: InstrumentationList,
    mappings: &MappingTable,
) -> Vec<Record<InstrumentationEntry>> {
    let libraries = list.libraries.len();
    let entries = enrich_instrumentation(list, mappings);
    let matched = entries
        .iter()
        .filter_map(Record::typed)
        .filter(|entry| !entry.semconv.is_empty())
        .count();
    info!(
        libraries,
        entries = entries.len(),
        matched,
        "enriched {} dataset",
        normalize_version(version)
    );
    entries
}

/// Enriches one dataset into a canonically ordered flat list of entries.
pub fn enrich_single_version(
    list: InstrumentationList,
    mappings: &MappingTable,
) -> Result<Value, PipelineError> {
    let entries = enrich_instrumentation(list, mappings);
    Ok(canonicalize(&serde_json::to_value(entries)?))
}

/// Enriches each dataset independently and aggregates them as
/// `{version: [entries]}`. Datasets that fail to load are skipped.
pub fn enrich_versions(
    datasets: &[DetectedVersion],
    mappings: &MappingTable,
) -> BTreeMap<String, Vec<Record<InstrumentationEntry>>> {
    let mut enriched = BTreeMap::new();

    for dataset in datasets {
        let span = info_span!("dataset", version = %dataset.version);
        let _enter = span.enter();

        let list = match load_dataset(&dataset.path) {
            Ok(list) => list,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        enriched.insert(
            dataset.version.clone(),
            enrich_dataset(&dataset.version, list, mappings),
        );
    }

    enriched
}

/// Pretty-printed with two space indentation; parent directories are created.
pub fn write_artifact(path: &Path, value: &Value) -> Result<(), PipelineError> {
    let to_write_error = |source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(to_write_error)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(to_write_error)
}

pub fn convention_source(config: &Configuration) -> Box<dyn ConventionSource> {
    #[cfg(feature = "github")]
    if !config.offline {
        info!(base_url = %config.semconv_base_url, "fetching conventions from GitHub");
        return Box::new(semconv::GitHubSource::new(
            config.semconv_base_url.clone(),
            config.cache_dir.clone(),
            config.github_token.clone(),
        ));
    }

    info!(cache_dir = %config.cache_dir.display(), "reading conventions from local cache");
    Box::new(DirectorySource::new(config.cache_dir.clone()))
}

/// Builds the mapping table once and runs the pipeline selected by
/// `config.mode` against it.
pub fn run(config: &Configuration) -> Result<RunSummary, PipelineError> {
    let source = convention_source(config);
    run_with_source(config, source.as_ref())
}

pub fn run_with_source(
    config: &Configuration,
    source: &dyn ConventionSource,
) -> Result<RunSummary, PipelineError> {
    let mappings = build_mappings(source);
    if mappings.is_empty() {
        warn!("no convention mappings available, nothing will be marked as semconv");
    }

    let (artifact, versions, entries) = match config.mode {
        PipelineMode::Single => {
            let list = load_dataset(&config.input_file)?;
            let entries = list.entry_count();
            (enrich_single_version(list, &mappings)?, Vec::new(), entries)
        }
        PipelineMode::Multi => {
            let datasets = detect_versions(&config.input_dir).map_err(|source| PipelineError::Scan {
                path: config.input_dir.clone(),
                source,
            })?;
            let enriched = enrich_versions(&datasets, &mappings);
            if enriched.is_empty() {
                return Err(PipelineError::NoDatasets(config.input_dir.clone()));
            }
            let versions = enriched.keys().cloned().collect();
            let entries = enriched.values().map(Vec::len).sum();
            (canonicalize(&serde_json::to_value(&enriched)?), versions, entries)
        }
    };

    write_artifact(&config.output_file, &artifact)?;
    info!(path = %config.output_file.display(), entries, "wrote enriched data");

    Ok(RunSummary {
        output_file: config.output_file.clone(),
        versions,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use semconv::ConventionFile;
    use serde_json::json;

    struct EmptySource;

    impl ConventionSource for EmptySource {
        fn fetch_convention_documents(&self, _category: &str) -> Vec<ConventionFile> {
            Vec::new()
        }
    }

    #[test]
    fn test_single_version_output_is_sorted_by_name() {
        let list = InstrumentationList::from_yaml(
            "libraries:\n  b-lib:\n    - name: a-entry\n  a-lib:\n    - name: z-entry\n",
        )
        .unwrap();

        let value = enrich_single_version(list, &MappingTable::default()).unwrap();
        assert_eq!(
            value,
            json!([
                {"name": "a-entry", "semconv": []},
                {"name": "z-entry", "semconv": []}
            ])
        );
    }

    #[test]
    fn test_enrich_versions_skips_unloadable_datasets() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("instrumentation-list-2.20.yaml");
        fs::write(&good, "libraries:\n  jdbc:\n    - name: jdbc\n").unwrap();

        let datasets = vec![
            DetectedVersion {
                version: "2.19".to_string(),
                path: tmp.path().join("instrumentation-list-2.19.yaml"),
            },
            DetectedVersion {
                version: "2.20".to_string(),
                path: good,
            },
        ];

        let enriched = enrich_versions(&datasets, &MappingTable::default());
        assert_eq!(enriched.keys().collect::<Vec<_>>(), vec!["2.20"]);
        assert_eq!(enriched["2.20"].len(), 1);
    }

    #[test]
    fn test_bad_record_does_not_drop_version() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("instrumentation-list-2.20.yaml");
        fs::write(
            &path,
            r#"
libraries:
  a:
    - name: a-1.0
      semconv: yes
      telemetry:
        - metrics:
            - {name: 7, semconv: maybe}
  b:
    - name: b-1.0
"#,
        )
        .unwrap();
        let datasets = vec![DetectedVersion {
            version: "2.20".to_string(),
            path,
        }];

        let enriched = enrich_versions(&datasets, &MappingTable::default());
        assert_eq!(
            canonicalize(&serde_json::to_value(&enriched).unwrap()),
            json!({"2.20": [
                {
                    "name": "a-1.0",
                    "semconv": [],
                    "telemetry": [{"metrics": [{"name": 7, "semconv": "maybe"}]}]
                },
                {"name": "b-1.0", "semconv": []}
            ]})
        );
    }

    #[test]
    fn test_load_dataset_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.yaml");
        assert!(matches!(
            load_dataset(&missing),
            Err(PipelineError::Load { .. })
        ));

        let invalid = tmp.path().join("invalid.yaml");
        fs::write(&invalid, "libraries: [not, a, map]\n").unwrap();
        assert!(matches!(
            load_dataset(&invalid),
            Err(PipelineError::Load { .. })
        ));
    }

    #[test]
    fn test_write_artifact_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("public").join("enriched.json");

        write_artifact(&path, &json!({"a": [1, 2]})).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n  \"a\": [\n    1,\n    2\n  ]\n}"
        );
    }

    #[test]
    fn test_write_failure_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        // the output path is an existing directory
        let result = write_artifact(tmp.path(), &json!([]));
        assert!(matches!(result, Err(PipelineError::Write { .. })));
    }

    #[test]
    fn test_multi_version_without_datasets_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Configuration {
            input_dir: tmp.path().to_path_buf(),
            output_file: tmp.path().join("out.json"),
            ..Default::default()
        };

        let result = run_with_source(&config, &EmptySource);
        assert!(matches!(result, Err(PipelineError::NoDatasets(_))));
        assert!(!tmp.path().join("out.json").exists());
    }

    #[test]
    fn test_single_mode_missing_input_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Configuration {
            mode: PipelineMode::Single,
            input_file: tmp.path().join("instrumentation-list.yaml"),
            output_file: tmp.path().join("out.json"),
            ..Default::default()
        };

        assert!(matches!(
            run_with_source(&config, &EmptySource),
            Err(PipelineError::Load { .. })
        ));
    }
}
