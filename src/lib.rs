//! Exploratory analysis of Chinese text corpora: cleaning, jieba
//! segmentation, lexicon sentiment windows, TF-IDF/LDA topics with k-means
//! clustering, and frequency charts.

pub mod charts;
pub mod cleaner;
pub mod clustering;
pub mod config;
pub mod corpus;
pub mod error;
pub mod frequency;
pub mod pipeline;
pub mod segmenter;
pub mod sentiment;
pub mod topic_modeling;
pub mod vectorizer;
pub mod wordcloud;

pub use config::{PipelineConfig, ProjectLayout};
pub use error::{AnalysisError, Result};
