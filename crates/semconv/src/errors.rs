use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SemconvError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("i/o error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error fetching `{url}`: {reason}")]
    Fetch { url: String, reason: String },
}

impl SemconvError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SemconvError::Io {
            path: path.into(),
            source,
        }
    }
}
