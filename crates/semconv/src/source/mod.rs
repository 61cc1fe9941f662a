//! Where convention documents come from. The mapping builder only sees the
//! parsed documents; fetching and caching live behind [`ConventionSource`].

use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::conventions::category::ALLOWED_CATEGORIES;
use crate::conventions::document::{ConventionDocument, ConventionFile};
use crate::conventions::mapping::{MappingBuilder, MappingTable};
use crate::errors::SemconvError;

#[cfg(feature = "github")]
pub mod github;

pub const CONVENTION_FILE_EXTENSION: &str = ".yaml";
pub const DEFAULT_SEMCONV_URL: &str =
    "https://api.github.com/repos/open-telemetry/semantic-conventions/contents/model";

/// Supplies the convention documents of one category. Failures are reported
/// per file as `document: None`, never as an error.
pub trait ConventionSource {
    fn fetch_convention_documents(&self, category: &str) -> Vec<ConventionFile>;
}

/// Builds the mapping table from every allowed category, in allow-list order.
pub fn build_mappings(source: &dyn ConventionSource) -> MappingTable {
    let mut builder = MappingBuilder::new();
    for category in ALLOWED_CATEGORIES {
        let files = source.fetch_convention_documents(category);
        debug!("category {}: {} convention files", category, files.len());
        builder.add_category(category, files);
    }
    builder.build()
}

/// Reads documents from `<root>/<category>/*.yaml`, e.g. a previously
/// populated cache directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectorySource { root: root.into() }
    }

    fn list_documents(&self, category: &str) -> Result<Vec<String>, SemconvError> {
        let dir = self.root.join(category);
        let mut names: Vec<String> = fs::read_dir(&dir)
            .map_err(|e| SemconvError::io(&dir, e))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(CONVENTION_FILE_EXTENSION))
            .collect();
        names.sort();
        Ok(names)
    }
}

impl ConventionSource for DirectorySource {
    fn fetch_convention_documents(&self, category: &str) -> Vec<ConventionFile> {
        let names = match self.list_documents(category) {
            Ok(names) => names,
            Err(e) => {
                debug!("no local conventions for {}: {}", category, e);
                return Vec::new();
            }
        };

        names
            .into_iter()
            .map(|name| {
                let path = self.root.join(category).join(&name);
                let document = match read_document(&path) {
                    Ok(document) => Some(document),
                    Err(e) => {
                        warn!("error loading convention file {}: {}", path.display(), e);
                        None
                    }
                };
                ConventionFile::new(name, document)
            })
            .collect()
    }
}

pub(crate) fn read_document(path: &Path) -> Result<ConventionDocument, SemconvError> {
    let contents = fs::read_to_string(path).map_err(|e| SemconvError::io(path, e))?;
    ConventionDocument::from_yaml(&contents)
}
