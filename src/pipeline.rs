use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

use crate::cleaner;
use crate::config::PipelineConfig;
use crate::corpus::{self, RAW_EXTENSION, SEGMENTED_SUFFIX};
use crate::error::{AnalysisError, Result};
use crate::frequency;
use crate::segmenter::{self, Segmenter};
use crate::sentiment;
use crate::topic_modeling;

#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: &'static str,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub items: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub root: PathBuf,
    pub stages: Vec<StageRecord>,
}

impl RunReport {
    fn record<F>(&mut self, stage: &'static str, run: F) -> Result<()>
    where
        F: FnOnce() -> Result<usize>,
    {
        info!("Starting stage `{}`", stage);
        let started_at = Local::now();
        let items = run()?;
        let finished_at = Local::now();
        info!(
            "Stage `{}` finished: {} items in {} ms",
            stage,
            items,
            (finished_at - started_at).num_milliseconds()
        );
        self.stages.push(StageRecord {
            stage,
            started_at,
            finished_at,
            items,
        });
        Ok(())
    }
}

fn require_dir(stage: &'static str, dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(AnalysisError::MissingStageInput {
            stage,
            path: dir.to_path_buf(),
        })
    }
}

fn require_files(stage: &'static str, dir: &Path, suffix: &str) -> Result<()> {
    require_dir(stage, dir)?;
    if corpus::list_files(dir, suffix)?.is_empty() {
        return Err(AnalysisError::MissingStageInput {
            stage,
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Runs every stage in order, checking each stage's inputs exist first, and
/// writes `output/run_report.json`.
pub fn run_all(config: &PipelineConfig) -> Result<RunReport> {
    let layout = &config.layout;
    let mut report = RunReport {
        root: layout.root().to_path_buf(),
        stages: Vec::new(),
    };

    require_dir("clean", &layout.raw_dir())?;
    report.record("clean", || cleaner::clean_directory(&layout.raw_dir(), &layout.cleaned_dir()))?;

    require_files("segment", &layout.cleaned_dir(), RAW_EXTENSION)?;
    report.record("segment", || {
        let segmenter = Segmenter::from_stopwords_file(&layout.stopwords_path())?;
        let count = segmenter::segment_directory(&segmenter, &layout.cleaned_dir(), &layout.output_dir())?;
        let summary = segmenter::frequency_summary(&layout.output_dir(), config.frequency.summary_top_n)?;
        segmenter::write_frequency_summary(&layout.output_dir().join("word_freq.json"), &summary)?;
        Ok(count)
    })?;

    require_files("sentiment", &layout.output_dir(), SEGMENTED_SUFFIX)?;
    report.record("sentiment", || {
        sentiment::run_sentiment(config).map(|r| r.windows.len())
    })?;

    report.record("topics", || {
        topic_modeling::run_topics(config).map(|m| m.documents.len())
    })?;

    report.record("words", || {
        frequency::run_word_frequency(config).map(|r| r.distinct_terms)
    })?;

    let report_path = layout.output_dir().join("run_report.json");
    corpus::write_text(&report_path, &serde_json::to_string_pretty(&report)?)?;
    info!("Run report saved to {}", report_path.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_raw_dir_stops_before_any_stage() {
        let root = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(root.path());
        match run_all(&config) {
            Err(AnalysisError::MissingStageInput { stage, .. }) => assert_eq!(stage, "clean"),
            other => panic!("unexpected result: {:?}", other.map(|r| r.stages.len())),
        }
    }

    #[test]
    fn test_empty_raw_dir_fails_segment_check() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("data/raw")).unwrap();
        let config = PipelineConfig::new(root.path());
        match run_all(&config) {
            Err(AnalysisError::MissingStageInput { stage, .. }) => assert_eq!(stage, "segment"),
            other => panic!("unexpected result: {:?}", other.map(|r| r.stages.len())),
        }
        // the clean stage already ran and left its directory behind
        assert!(root.path().join("data/cleaned").is_dir());
    }
}
