//! Word-cloud rendering through `wcloud`.
//!
//! The crate tokenizes the space-joined segmented text, sizes every word by
//! its relative frequency and packs the words onto the canvas. This module
//! only configures it and checks the font file up front, since `wcloud`
//! panics on a font it cannot read.

use std::fs;
use std::path::{Path, PathBuf};

use image::Rgba;
use tracing::debug;
use wcloud::{Tokenizer, WordCloud, WordCloudSize};

use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone)]
pub struct WordCloudConfig {
    pub width: u32,
    pub height: u32,
    pub max_words: u32,
    pub min_font_size: f32,
    pub max_font_size: f32,
    pub word_margin: u32,
    pub rng_seed: u64,
    /// Overrides the layout's `fonts/simhei.ttf`.
    pub font_path: Option<PathBuf>,
}

impl Default for WordCloudConfig {
    fn default() -> Self {
        WordCloudConfig {
            width: 1200,
            height: 800,
            max_words: 200,
            min_font_size: 10.0,
            max_font_size: 140.0,
            word_margin: 2,
            rng_seed: 42,
            font_path: None,
        }
    }
}

/// Renders `text` (tokens joined by spaces) to `path` on a white canvas.
pub fn render_word_cloud(path: &Path, text: &str, config: &WordCloudConfig, font_path: &Path) -> Result<()> {
    fs::metadata(font_path).map_err(AnalysisError::io(font_path))?;
    let font = font_path
        .to_str()
        .ok_or_else(|| AnalysisError::InvalidParameter(format!("font path is not UTF-8: {}", font_path.display())))?;

    let tokenizer = Tokenizer::default().with_max_words(config.max_words);
    let wordcloud = WordCloud::default()
        .with_tokenizer(tokenizer)
        .with_font_from_path(PathBuf::from(font))
        .with_background_color(Rgba([255, 255, 255, 255]))
        .with_min_font_size(config.min_font_size)
        .with_max_font_size(Some(config.max_font_size))
        .with_relative_font_scaling(1.0)
        .with_word_margin(config.word_margin)
        .with_rng_seed(config.rng_seed);

    let size = WordCloudSize::FromDimensions {
        width: config.width,
        height: config.height,
    };
    debug!("Generating {}x{} word cloud with {}", config.width, config.height, font);
    let image = wordcloud.generate_from_text(text, size, 1.0);

    image
        .save(path)
        .map_err(|e| AnalysisError::Render(format!("{}: {}", path.display(), e)))
}
