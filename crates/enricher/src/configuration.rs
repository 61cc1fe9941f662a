use semconv::source::DEFAULT_SEMCONV_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "SEMCONV_CONFIG_PATH";
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const OUTPUT_ENV: &str = "SEMCONV_OUTPUT";

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("error reading configuration `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error parsing configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PipelineMode {
    /// One dataset in, a flat list of entries out.
    #[serde(rename = "single")]
    Single,
    /// Every `instrumentation-list-<version>.yaml` in `input_dir`, keyed by version.
    #[default]
    #[serde(rename = "multi")]
    Multi,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Configuration {
    pub mode: PipelineMode,
    pub input_dir: PathBuf,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub cache_dir: PathBuf,
    /// Only read conventions already present in `cache_dir`.
    pub offline: bool,
    pub semconv_base_url: String,
    // credentials never come from the config file
    #[serde(skip)]
    pub github_token: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            mode: PipelineMode::default(),
            input_dir: PathBuf::from("."),
            input_file: PathBuf::from("instrumentation-list.yaml"),
            output_file: PathBuf::from("instrumentation-list-enriched.json"),
            cache_dir: PathBuf::from("./.semconv_cache"),
            offline: false,
            semconv_base_url: DEFAULT_SEMCONV_URL.to_string(),
            github_token: None,
        }
    }
}

impl Configuration {
    /// Reads the file named by `SEMCONV_CONFIG_PATH` if set, otherwise starts
    /// from defaults, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigurationError> {
        let config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Configuration::default(),
        };
        Ok(config.with_env_overrides(|key| env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigurationError> {
        let config: Option<Configuration> = serde_yaml::from_str(contents)?;
        Ok(config.unwrap_or_default())
    }

    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(token) = lookup(GITHUB_TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.github_token = Some(token);
        }
        if let Some(output) = lookup(OUTPUT_ENV).filter(|o| !o.is_empty()) {
            self.output_file = PathBuf::from(output);
        }
        self
    }

    pub fn with_output_file(mut self, output_file: impl Into<PathBuf>) -> Self {
        self.output_file = output_file.into();
        self
    }
}
