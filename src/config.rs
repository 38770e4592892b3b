use std::path::{Path, PathBuf};

use crate::sentiment::WindowScope;
use crate::topic_modeling::LDAConfig;
use crate::wordcloud::WordCloudConfig;

/// Fixed directory layout beneath a project root.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProjectLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("data").join("raw")
    }

    pub fn cleaned_dir(&self) -> PathBuf {
        self.root.join("data").join("cleaned")
    }

    /// Token sequences, the frequency summary and the run report live here.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn visual_dir(&self) -> PathBuf {
        self.output_dir().join("visual")
    }

    pub fn stopwords_path(&self) -> PathBuf {
        self.root.join("stopwords").join("stopwords.txt")
    }

    pub fn positive_lexicon_path(&self) -> PathBuf {
        self.root
            .join("sentiment_dict")
            .join("NTUSD_positive_simplified.txt")
    }

    pub fn negative_lexicon_path(&self) -> PathBuf {
        self.root
            .join("sentiment_dict")
            .join("NTUSD_negative_simplified.txt")
    }

    /// TrueType font handed to the word-cloud renderer.
    pub fn wordcloud_font_path(&self) -> PathBuf {
        self.root.join("fonts").join("simhei.ttf")
    }
}

impl Default for ProjectLayout {
    fn default() -> Self {
        ProjectLayout::new(".")
    }
}

pub struct SentimentConfig {
    pub window_size: usize,
    pub scope: WindowScope,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        SentimentConfig {
            window_size: 100,
            scope: WindowScope::Corpus,
        }
    }
}

pub struct FrequencyConfig {
    pub summary_top_n: usize, // per-file entries in word_freq.json
    pub bar_top_n: usize,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        FrequencyConfig {
            summary_top_n: 50,
            bar_top_n: 30,
        }
    }
}

/// Everything a stage needs for one run. Built once in `main` and passed
/// down by reference.
pub struct PipelineConfig {
    pub layout: ProjectLayout,
    pub font_family: String,
    pub sentiment: SentimentConfig,
    pub frequency: FrequencyConfig,
    pub lda: LDAConfig,
    pub wordcloud: WordCloudConfig,
}

impl PipelineConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            layout: ProjectLayout::new(root),
            ..Default::default()
        }
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn with_window_scope(mut self, scope: WindowScope) -> Self {
        self.sentiment.scope = scope;
        self
    }

    pub fn with_wordcloud_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.wordcloud.font_path = Some(path.into());
        self
    }

    pub fn wordcloud_font_path(&self) -> PathBuf {
        self.wordcloud
            .font_path
            .clone()
            .unwrap_or_else(|| self.layout.wordcloud_font_path())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            layout: ProjectLayout::default(),
            font_family: "sans-serif".to_string(),
            sentiment: SentimentConfig::default(),
            frequency: FrequencyConfig::default(),
            lda: LDAConfig::default(),
            wordcloud: WordCloudConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths_hang_off_root() {
        let layout = ProjectLayout::new("/tmp/project");
        assert_eq!(layout.raw_dir(), PathBuf::from("/tmp/project/data/raw"));
        assert_eq!(layout.cleaned_dir(), PathBuf::from("/tmp/project/data/cleaned"));
        assert_eq!(layout.visual_dir(), PathBuf::from("/tmp/project/output/visual"));
        assert_eq!(
            layout.negative_lexicon_path(),
            PathBuf::from("/tmp/project/sentiment_dict/NTUSD_negative_simplified.txt")
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::new("corpus")
            .with_font_family("Noto Sans CJK SC")
            .with_window_scope(WindowScope::Document);
        assert_eq!(config.font_family, "Noto Sans CJK SC");
        assert_eq!(config.sentiment.scope, WindowScope::Document);
        assert_eq!(config.sentiment.window_size, 100);
        assert_eq!(config.layout.root(), Path::new("corpus"));
    }

    #[test]
    fn test_wordcloud_font_defaults_under_root() {
        let config = PipelineConfig::new("/tmp/project");
        assert_eq!(config.wordcloud_font_path(), PathBuf::from("/tmp/project/fonts/simhei.ttf"));

        let config = config.with_wordcloud_font("/usr/share/fonts/wqy.ttf");
        assert_eq!(config.wordcloud_font_path(), PathBuf::from("/usr/share/fonts/wqy.ttf"));
    }
}
