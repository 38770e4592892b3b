use counter::Counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::charts;
use crate::config::PipelineConfig;
use crate::corpus;
use crate::error::Result;
use crate::wordcloud;

/// Token occurrence counts, per document or corpus-wide.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    counts: Counter<String>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        FrequencyTable::default()
    }

    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = FrequencyTable::new();
        table.add_tokens(tokens);
        table
    }

    pub fn add_tokens<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            *self.counts.entry(token.as_ref().to_owned()).or_insert(0) += 1;
        }
    }

    pub fn merge(&mut self, other: &FrequencyTable) {
        for (term, count) in other.counts.iter() {
            self.counts[term] += *count;
        }
    }

    pub fn get(&self, term: &str) -> usize {
        self.counts.get(term).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Descending by count; equal counts are ordered by term.
    pub fn most_common(&self, n: usize) -> Vec<(String, usize)> {
        let mut ranked = self.counts.most_common_ordered();
        ranked.truncate(n);
        ranked
    }

    pub fn all_ranked(&self) -> Vec<(String, usize)> {
        self.counts.most_common_ordered()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrequencyReport {
    pub documents: usize,
    pub total_tokens: usize,
    pub distinct_terms: usize,
    pub top_terms: Vec<(String, usize)>,
    pub rendered: bool,
}

/// Corpus-wide counts over every `*_seg.txt`, rendered as a bar chart of the
/// top terms and a word cloud.
pub fn run_word_frequency(config: &PipelineConfig) -> Result<FrequencyReport> {
    let layout = &config.layout;
    let visual_dir = layout.visual_dir();
    corpus::ensure_dir(&visual_dir)?;

    let documents = corpus::load_segmented_documents(&layout.output_dir())?;
    let mut table = FrequencyTable::new();
    for doc in &documents {
        table.add_tokens(&doc.tokens);
    }
    info!("Loaded {} tokens from {} documents", table.total(), documents.len());

    let top_terms = table.most_common(config.frequency.bar_top_n);
    println!("高频词前10: {:?}", &top_terms[..top_terms.len().min(10)]);

    let rendered = if table.is_empty() {
        warn!("Frequency table is empty; skipping bar chart and word cloud");
        false
    } else {
        let bar_path = visual_dir.join("top_words_bar.png");
        charts::draw_top_words_bar(&bar_path, &top_terms, &config.font_family)?;
        info!("Top-words bar chart saved to {}", bar_path.display());

        let text = documents.iter().map(|doc| doc.text()).collect::<Vec<_>>().join(" ");
        let cloud_path = visual_dir.join("wordcloud.png");
        wordcloud::render_word_cloud(&cloud_path, &text, &config.wordcloud, &config.wordcloud_font_path())?;
        info!("Word cloud saved to {}", cloud_path.display());
        true
    };

    Ok(FrequencyReport {
        documents: documents.len(),
        total_tokens: table.total(),
        distinct_terms: table.len(),
        top_terms,
        rendered,
    })
}
