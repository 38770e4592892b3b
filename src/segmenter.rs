use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use jieba_rs::Jieba;
use tracing::info;

use crate::corpus::{self, RAW_EXTENSION, SEGMENTED_SUFFIX};
use crate::error::Result;
use crate::frequency::FrequencyTable;

/// filename -> top (term, count) pairs, the shape of `word_freq.json`.
pub type FrequencySummary = BTreeMap<String, Vec<(String, usize)>>;

pub struct Segmenter {
    jieba: Jieba,
    stopwords: HashSet<String>,
}

impl Segmenter {
    pub fn new(stopwords: HashSet<String>) -> Self {
        Segmenter {
            jieba: Jieba::new(),
            stopwords,
        }
    }

    pub fn from_stopwords_file(path: &Path) -> Result<Self> {
        let stopwords = corpus::load_word_list(path)?;
        info!("Loaded {} stopwords", stopwords.len());
        Ok(Segmenter::new(stopwords))
    }

    pub fn segment(&self, text: &str) -> Vec<String> {
        filter_tokens(self.jieba.cut(text, true), &self.stopwords)
    }
}

/// Drops stopwords and tokens whose trimmed length is at most one character.
pub fn filter_tokens<'a, I>(tokens: I, stopwords: &HashSet<String>) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens
        .into_iter()
        .filter(|token| !stopwords.contains(*token) && token.trim().chars().count() > 1)
        .map(str::to_string)
        .collect()
}

pub fn segmented_name(cleaned_name: &str) -> String {
    let stem = cleaned_name.strip_suffix(RAW_EXTENSION).unwrap_or(cleaned_name);
    format!("{}{}", stem, SEGMENTED_SUFFIX)
}

/// Writes `<stem>_seg.txt` for every cleaned `*.txt` document.
pub fn segment_directory(segmenter: &Segmenter, cleaned_dir: &Path, output_dir: &Path) -> Result<usize> {
    corpus::ensure_dir(output_dir)?;
    let files = corpus::list_files(cleaned_dir, RAW_EXTENSION)?;

    for path in &files {
        let text = corpus::read_utf8(path)?;
        let tokens = segmenter.segment(&text);
        let target = output_dir.join(segmented_name(&corpus::file_name(path)));
        corpus::write_text(&target, &tokens.join(" "))?;
    }

    info!("Segmented {} documents into {}", files.len(), output_dir.display());
    Ok(files.len())
}

/// Top `top_n` terms of every `*_seg.txt` already present in `output_dir`.
pub fn frequency_summary(output_dir: &Path, top_n: usize) -> Result<FrequencySummary> {
    let mut summary = FrequencySummary::new();
    for doc in corpus::load_segmented_documents(output_dir)? {
        let table = FrequencyTable::from_tokens(&doc.tokens);
        summary.insert(doc.name, table.most_common(top_n));
    }
    Ok(summary)
}

pub fn write_frequency_summary(path: &Path, summary: &FrequencySummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    corpus::write_text(path, &json)?;
    info!("Word frequency summary saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn stopwords(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_filter_drops_stopwords_and_short_tokens() {
        let stop = stopwords(&["我们", "的"]);
        let tokens = vec!["我们", "的", "经济", " ", "好", "发展", " x", "AI"];
        assert_eq!(filter_tokens(tokens, &stop), vec!["经济", "发展", "AI"]);
    }

    #[test]
    fn test_segment_output_respects_filters() {
        let stop = stopwords(&["我们", "一个"]);
        let segmenter = Segmenter::new(stop.clone());
        let tokens = segmenter.segment("我们中出了一个叛徒，这是一个重要的发现。");
        assert!(!tokens.is_empty());
        for token in &tokens {
            assert!(!stop.contains(token));
            assert!(token.trim().chars().count() > 1);
        }
    }

    #[test]
    fn test_segmented_name() {
        assert_eq!(segmented_name("001.txt"), "001_seg.txt");
        assert_eq!(segmented_name("notes"), "notes_seg.txt");
    }

    #[test]
    fn test_frequency_summary_keys_by_filename() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_seg.txt"), "经济 发展 经济").unwrap();
        fs::write(dir.path().join("b_seg.txt"), "科技").unwrap();
        fs::write(dir.path().join("a.txt"), "经济 经济").unwrap();

        let summary = frequency_summary(dir.path(), 50).unwrap();

        assert_eq!(summary.len(), 2);
        assert_eq!(
            summary["a_seg.txt"],
            vec![("经济".to_string(), 2), ("发展".to_string(), 1)]
        );

        let path = dir.path().join("word_freq.json");
        write_frequency_summary(&path, &summary).unwrap();
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["b_seg.txt"][0][0], "科技");
        assert_eq!(json["b_seg.txt"][0][1], 1);
    }

    #[test]
    fn test_summary_truncates_to_top_n() {
        let dir = tempfile::tempdir().unwrap();
        let tokens: Vec<String> = (0..80).map(|i| format!("词{}", i)).collect();
        fs::write(dir.path().join("long_seg.txt"), tokens.join(" ")).unwrap();
        let summary = frequency_summary(dir.path(), 50).unwrap();
        assert_eq!(summary["long_seg.txt"].len(), 50);
    }
}
