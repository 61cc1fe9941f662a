//! Fetches convention documents from the semantic-conventions repository
//! through the GitHub contents API, caching both directory listings and raw
//! documents on disk. A cached file is never re-downloaded.

use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{read_document, ConventionSource, CONVENTION_FILE_EXTENSION};
use crate::conventions::document::{ConventionDocument, ConventionFile};
use crate::errors::SemconvError;

const USER_AGENT: &str = "instrumentation-explorer";
const DIRECTORY_LISTING_FILE: &str = "_directory_listing.json";

#[derive(Debug, Deserialize)]
struct GitHubFile {
    name: String,
    download_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GitHubSource {
    base_url: String,
    cache_dir: PathBuf,
    token: Option<String>,
}

impl GitHubSource {
    pub fn new(
        base_url: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
        token: Option<String>,
    ) -> Self {
        GitHubSource {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache_dir: cache_dir.into(),
            token,
        }
    }

    fn get(&self, url: &str) -> Result<String, SemconvError> {
        let mut request = ureq::get(url).header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header("Authorization", &format!("token {}", token));
        }

        let to_fetch_error = |e: ureq::Error| SemconvError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        request
            .call()
            .map_err(to_fetch_error)?
            .body_mut()
            .read_to_string()
            .map_err(to_fetch_error)
    }

    fn directory_listing(
        &self,
        category: &str,
        category_dir: &Path,
    ) -> Result<Vec<GitHubFile>, SemconvError> {
        let listing_path = category_dir.join(DIRECTORY_LISTING_FILE);

        let listing = if listing_path.exists() {
            info!("loading directory listing for {} from cache", category);
            fs::read_to_string(&listing_path).map_err(|e| SemconvError::io(&listing_path, e))?
        } else {
            info!("fetching directory listing for {}", category);
            let listing = self.get(&format!("{}/{}", self.base_url, category))?;
            // validate before caching so a bad response is not kept
            serde_json::from_str::<serde_json::Value>(&listing)?;
            if let Err(e) = fs::write(&listing_path, &listing) {
                warn!("could not cache directory listing {}: {}", listing_path.display(), e);
            }
            listing
        };

        let entries: Vec<serde_json::Value> = serde_json::from_str(&listing)?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect())
    }

    fn load_document(
        &self,
        file: &GitHubFile,
        category_dir: &Path,
    ) -> Result<ConventionDocument, SemconvError> {
        let cache_path = category_dir.join(&file.name);
        if cache_path.exists() {
            info!("loading {} from cache", file.name);
            return read_document(&cache_path);
        }

        let download_url = file.download_url.as_deref().ok_or_else(|| SemconvError::Fetch {
            url: file.name.clone(),
            reason: "missing download_url".to_string(),
        })?;

        info!("downloading {}", file.name);
        let contents = self.get(download_url)?;
        let document = ConventionDocument::from_yaml(&contents)?;
        if let Err(e) = fs::write(&cache_path, &contents) {
            warn!("could not cache {}: {}", cache_path.display(), e);
        }
        Ok(document)
    }
}

impl ConventionSource for GitHubSource {
    fn fetch_convention_documents(&self, category: &str) -> Vec<ConventionFile> {
        let category_dir = self.cache_dir.join(category);
        if let Err(e) = fs::create_dir_all(&category_dir) {
            warn!("could not create cache directory {}: {}", category_dir.display(), e);
        }

        let listing = match self.directory_listing(category, &category_dir) {
            Ok(listing) => listing,
            Err(e) => {
                warn!("error fetching convention files for {}: {}", category, e);
                return Vec::new();
            }
        };

        listing
            .into_iter()
            .filter(|file| file.name.ends_with(CONVENTION_FILE_EXTENSION))
            .map(|file| {
                let document = match self.load_document(&file, &category_dir) {
                    Ok(document) => Some(document),
                    Err(e) => {
                        warn!("error fetching or parsing file {}: {}", file.name, e);
                        None
                    }
                };
                ConventionFile::new(file.name, document)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const CLIENT_YAML: &str =
        "groups:\n  - id: m\n    type: metric\n    metric_name: http.client.request.duration\n";

    #[test]
    fn test_fetches_and_caches_documents() {
        let mut server = mockito::Server::new();
        let entry = |name: &str| {
            json!({
                "name": name,
                "type": "file",
                "download_url": format!("{}/raw/http/{}", server.url(), name)
            })
        };
        let listing = json!([
            entry("client.yaml"),
            entry("broken.yaml"),
            entry("README.md"),
            "not-an-object"
        ]);

        let listing_mock = server
            .mock("GET", "/http")
            .match_header("authorization", "token secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(listing.to_string())
            .expect(1)
            .create();
        let client_mock = server
            .mock("GET", "/raw/http/client.yaml")
            .with_status(200)
            .with_body(CLIENT_YAML)
            .expect(1)
            .create();
        let broken_mock = server
            .mock("GET", "/raw/http/broken.yaml")
            .with_status(404)
            .expect(2)
            .create();

        let cache = tempfile::tempdir().unwrap();
        let source = GitHubSource::new(server.url(), cache.path(), Some("secret".to_string()));

        let files = source.fetch_convention_documents("http");
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["client.yaml", "broken.yaml"]);
        assert!(files[0].document.is_some());
        assert!(files[1].document.is_none());

        assert!(cache.path().join("http").join(DIRECTORY_LISTING_FILE).exists());
        assert_eq!(
            fs::read_to_string(cache.path().join("http").join("client.yaml")).unwrap(),
            CLIENT_YAML
        );

        // second run is served from cache, only the failed download is retried
        let files = source.fetch_convention_documents("http");
        assert!(files[0].document.is_some());
        assert!(files[1].document.is_none());

        listing_mock.assert();
        client_mock.assert();
        broken_mock.assert();
    }

    #[test]
    fn test_listing_failure_yields_no_documents() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/dns").with_status(500).create();

        let cache = tempfile::tempdir().unwrap();
        let source = GitHubSource::new(server.url(), cache.path(), None);

        assert!(source.fetch_convention_documents("dns").is_empty());
        assert!(!cache.path().join("dns").join(DIRECTORY_LISTING_FILE).exists());
    }
}
