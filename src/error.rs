use std::io;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not valid UTF-8: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("no segmented documents (*_seg.txt) found in {0}; run the segment stage first")]
    EmptyCorpus(PathBuf),

    #[error("TF-IDF vocabulary is empty: the documents contain no terms")]
    EmptyVocabulary,

    #[error("stage `{stage}` requires {path}, which is missing or empty")]
    MissingStageInput { stage: &'static str, path: PathBuf },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV output failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("rendering failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    /// Builds a closure for `map_err` that tags an I/O failure with its path.
    pub fn io(path: &Path) -> impl FnOnce(io::Error) -> AnalysisError + '_ {
        move |source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for AnalysisError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        AnalysisError::Render(e.to_string())
    }
}
