use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::charts;
use crate::config::PipelineConfig;
use crate::corpus::{self, SegmentedDocument};
use crate::error::{AnalysisError, Result};

/// Positive and negative NTUSD terms, immutable for the run.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl Lexicon {
    pub fn new(positive: HashSet<String>, negative: HashSet<String>) -> Self {
        let overlap = positive.intersection(&negative).count();
        if overlap > 0 {
            debug!("{} terms appear in both polarity lists", overlap);
        }
        Lexicon { positive, negative }
    }

    pub fn from_words(positive: &[&str], negative: &[&str]) -> Self {
        Lexicon::new(
            positive.iter().map(|w| w.to_string()).collect(),
            negative.iter().map(|w| w.to_string()).collect(),
        )
    }

    pub fn load(positive_path: &Path, negative_path: &Path) -> Result<Self> {
        let lexicon = Lexicon::new(
            corpus::load_word_list(positive_path)?,
            corpus::load_word_list(negative_path)?,
        );
        info!(
            "Lexicon loaded: {} positive, {} negative terms",
            lexicon.positive.len(),
            lexicon.negative.len()
        );
        Ok(lexicon)
    }

    pub fn is_positive(&self, token: &str) -> bool {
        self.positive.contains(token)
    }

    pub fn is_negative(&self, token: &str) -> bool {
        self.negative.contains(token)
    }
}

/// How token streams are cut into windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowScope {
    /// All documents concatenated in filename order; windows may straddle
    /// document boundaries.
    #[default]
    Corpus,
    /// Each document windowed on its own.
    Document,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowScore {
    pub index: usize,
    pub len: usize,
    pub positive: usize,
    pub negative: usize,
    pub score: i64,
    pub document: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SentimentReport {
    pub total_tokens: usize,
    pub windows: Vec<WindowScore>,
    pub total_positive: usize,
    pub total_negative: usize,
}

impl SentimentReport {
    pub fn scores(&self) -> Vec<i64> {
        self.windows.iter().map(|w| w.score).collect()
    }

    fn push(&mut self, window: &[String], lexicon: &Lexicon, document: Option<&str>) {
        let positive = window.iter().filter(|t| lexicon.is_positive(t)).count();
        let negative = window.iter().filter(|t| lexicon.is_negative(t)).count();

        self.windows.push(WindowScore {
            index: self.windows.len(),
            len: window.len(),
            positive,
            negative,
            score: positive as i64 - negative as i64,
            document: document.map(str::to_string),
        });
        self.total_tokens += window.len();
        self.total_positive += positive;
        self.total_negative += negative;
    }
}

/// Scores consecutive windows of `window_size` tokens; the last window may
/// be shorter. Score is the raw positive minus negative match count.
pub fn score_windows(tokens: &[String], window_size: usize, lexicon: &Lexicon) -> Result<SentimentReport> {
    check_window_size(window_size)?;
    let mut report = SentimentReport::default();
    for window in tokens.chunks(window_size) {
        report.push(window, lexicon, None);
    }
    Ok(report)
}

pub fn score_documents(
    documents: &[SegmentedDocument],
    window_size: usize,
    scope: WindowScope,
    lexicon: &Lexicon,
) -> Result<SentimentReport> {
    match scope {
        WindowScope::Corpus => {
            let stream: Vec<String> = documents.iter().flat_map(|d| d.tokens.iter().cloned()).collect();
            score_windows(&stream, window_size, lexicon)
        }
        WindowScope::Document => {
            check_window_size(window_size)?;
            let mut report = SentimentReport::default();
            for doc in documents {
                for window in doc.tokens.chunks(window_size) {
                    report.push(window, lexicon, Some(&doc.name));
                }
            }
            Ok(report)
        }
    }
}

fn check_window_size(window_size: usize) -> Result<()> {
    if window_size == 0 {
        return Err(AnalysisError::InvalidParameter("window size must be positive".into()));
    }
    Ok(())
}

pub fn run_sentiment(config: &PipelineConfig) -> Result<SentimentReport> {
    let layout = &config.layout;
    let visual_dir = layout.visual_dir();
    corpus::ensure_dir(&visual_dir)?;

    let lexicon = Lexicon::load(&layout.positive_lexicon_path(), &layout.negative_lexicon_path())?;
    let documents = corpus::load_segmented_documents(&layout.output_dir())?;

    let report = score_documents(
        &documents,
        config.sentiment.window_size,
        config.sentiment.scope,
        &lexicon,
    )?;
    info!(
        "Scored {} tokens in {} windows ({} positive, {} negative matches)",
        report.total_tokens,
        report.windows.len(),
        report.total_positive,
        report.total_negative
    );

    if report.windows.is_empty() {
        warn!("No tokens to score; skipping emotion curve");
    } else {
        let curve_path = visual_dir.join("ntusd_emotion_curve.png");
        charts::draw_emotion_curve(&curve_path, &report.scores(), &config.font_family)?;
        info!("Emotion curve saved to {}", curve_path.display());
    }

    if report.total_positive + report.total_negative == 0 {
        warn!("No lexicon matches; skipping emotion pie chart");
    } else {
        let pie_path = visual_dir.join("ntusd_emotion_pie.png");
        charts::draw_emotion_pie(
            &pie_path,
            report.total_positive,
            report.total_negative,
            &config.font_family,
        )?;
        info!("Emotion pie chart saved to {}", pie_path.display());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn doc(name: &str, words: &[&str]) -> SegmentedDocument {
        SegmentedDocument {
            name: name.to_string(),
            tokens: tokens(words),
        }
    }

    #[test]
    fn test_single_window_score() {
        let lexicon = Lexicon::from_words(&["好"], &["差"]);
        let report = score_windows(&tokens(&["好", "好", "差"]), 100, &lexicon).unwrap();
        assert_eq!(report.scores(), vec![1]);
        assert_eq!(report.total_positive, 2);
        assert_eq!(report.total_negative, 1);
    }

    #[test]
    fn test_250_tokens_make_three_windows() {
        let lexicon = Lexicon::default();
        let stream: Vec<String> = (0..250).map(|i| format!("t{}", i)).collect();
        let report = score_windows(&stream, 100, &lexicon).unwrap();
        let lens: Vec<usize> = report.windows.iter().map(|w| w.len).collect();
        assert_eq!(lens, vec![100, 100, 50]);
    }

    #[test]
    fn test_window_count_is_ceiling() {
        let lexicon = Lexicon::default();
        for n in [0usize, 1, 99, 100, 101, 200, 345] {
            let stream: Vec<String> = vec!["词".to_string(); n];
            let report = score_windows(&stream, 100, &lexicon).unwrap();
            assert_eq!(report.windows.len(), (n + 99) / 100);
            if let Some(last) = report.windows.last() {
                let expected = if n % 100 == 0 { 100 } else { n % 100 };
                assert_eq!(last.len, expected);
            }
        }
    }

    #[test]
    fn test_totals_equal_window_sums() {
        let lexicon = Lexicon::from_words(&["喜欢", "优秀", "快乐"], &["讨厌", "失败"]);
        let pattern = ["喜欢", "中性", "失败", "优秀", "讨厌", "快乐", "天气"];
        let stream: Vec<String> = pattern.iter().cycle().take(731).map(|w| w.to_string()).collect();
        let report = score_windows(&stream, 100, &lexicon).unwrap();

        let pos: usize = report.windows.iter().map(|w| w.positive).sum();
        let neg: usize = report.windows.iter().map(|w| w.negative).sum();
        assert_eq!(pos, report.total_positive);
        assert_eq!(neg, report.total_negative);
        assert_eq!(report.total_tokens, 731);
    }

    #[test]
    fn test_corpus_scope_spans_documents() {
        let lexicon = Lexicon::from_words(&["好"], &["差"]);
        let docs = vec![doc("a_seg.txt", &["好", "好", "好"]), doc("b_seg.txt", &["差", "差"])];

        let report = score_documents(&docs, 4, WindowScope::Corpus, &lexicon).unwrap();
        assert_eq!(report.scores(), vec![2, -1]);
        assert!(report.windows.iter().all(|w| w.document.is_none()));
    }

    #[test]
    fn test_document_scope_respects_boundaries() {
        let lexicon = Lexicon::from_words(&["好"], &["差"]);
        let docs = vec![doc("a_seg.txt", &["好", "好", "好"]), doc("b_seg.txt", &["差", "差"])];

        let report = score_documents(&docs, 4, WindowScope::Document, &lexicon).unwrap();
        assert_eq!(report.scores(), vec![3, -2]);
        assert_eq!(report.windows[1].index, 1);
        assert_eq!(report.windows[1].document.as_deref(), Some("b_seg.txt"));
    }

    #[test]
    fn test_zero_window_size_is_rejected() {
        let lexicon = Lexicon::default();
        assert!(matches!(
            score_windows(&tokens(&["好"]), 0, &lexicon),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_overlapping_term_counts_both_ways() {
        let lexicon = Lexicon::from_words(&["一般"], &["一般"]);
        let report = score_windows(&tokens(&["一般"]), 100, &lexicon).unwrap();
        assert_eq!(report.windows[0].score, 0);
        assert_eq!(report.total_positive, 1);
        assert_eq!(report.total_negative, 1);
    }
}
