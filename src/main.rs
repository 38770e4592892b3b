use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cn_text_analyze::config::PipelineConfig;
use cn_text_analyze::sentiment::WindowScope;
use cn_text_analyze::segmenter::{self, Segmenter};
use cn_text_analyze::{cleaner, frequency, pipeline, sentiment, topic_modeling};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[clap(short, long, default_value = ".", help = "Project root holding data/, output/, stopwords/ and sentiment_dict/")]
    root: PathBuf,
    #[clap(short, long, default_value = "sans-serif", help = "Font family for chart text; pick one with CJK glyphs (e.g. 'SimHei')")]
    font: String,
    #[clap(long, help = "TrueType font for the word cloud [default: <root>/fonts/simhei.ttf]")]
    cloud_font: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Strip disallowed characters from data/raw into data/cleaned
    Clean,
    /// Segment cleaned text and write output/word_freq.json
    Segment,
    /// Score lexicon sentiment in 100-token windows
    Sentiment {
        #[clap(long, help = "Window each document separately instead of the concatenated corpus")]
        per_document: bool,
    },
    /// TF-IDF + LDA topics and document clustering
    Topics,
    /// Top-word bar chart and word cloud
    Words,
    /// Every stage in order
    Run {
        #[clap(long, help = "Window each document separately instead of the concatenated corpus")]
        per_document: bool,
    },
}

fn scope(per_document: bool) -> WindowScope {
    if per_document {
        WindowScope::Document
    } else {
        WindowScope::Corpus
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    println!("Root: {}", args.root.display());

    let mut config = PipelineConfig::new(&args.root).with_font_family(args.font);
    if let Some(path) = args.cloud_font {
        config = config.with_wordcloud_font(path);
    }
    let layout = &config.layout;

    match args.command {
        Command::Clean => {
            let count = cleaner::clean_directory(&layout.raw_dir(), &layout.cleaned_dir())
                .context("cleaning raw documents")?;
            println!("文本清洗完成: {} files -> {}", count, layout.cleaned_dir().display());
        }
        Command::Segment => {
            let segmenter = Segmenter::from_stopwords_file(&layout.stopwords_path())
                .context("loading stopwords")?;
            let count = segmenter::segment_directory(&segmenter, &layout.cleaned_dir(), &layout.output_dir())
                .context("segmenting cleaned documents")?;
            println!("分词+停用词处理完成: {} files -> {}", count, layout.output_dir().display());

            let summary = segmenter::frequency_summary(&layout.output_dir(), config.frequency.summary_top_n)?;
            let path = layout.output_dir().join("word_freq.json");
            segmenter::write_frequency_summary(&path, &summary)?;
            println!("高频词统计完成: {}", path.display());
        }
        Command::Sentiment { per_document } => {
            let config = config.with_window_scope(scope(per_document));
            let report = sentiment::run_sentiment(&config).context("sentiment scoring")?;
            println!(
                "共加载词语数量: {}, 段数: {}, 正向: {}, 负向: {}",
                report.total_tokens,
                report.windows.len(),
                report.total_positive,
                report.total_negative
            );
        }
        Command::Topics => {
            let model = topic_modeling::run_topics(&config).context("topic modeling")?;
            println!("共加载文档数: {}, 主题数: {}", model.documents.len(), model.num_topics());
        }
        Command::Words => {
            let report = frequency::run_word_frequency(&config).context("word frequency")?;
            println!("共加载词语数量: {}, 不同词语: {}", report.total_tokens, report.distinct_terms);
        }
        Command::Run { per_document } => {
            let config = config.with_window_scope(scope(per_document));
            let report = pipeline::run_all(&config).context("running the pipeline")?;
            for stage in &report.stages {
                println!("{:<10} {:>6} items", stage.stage, stage.items);
            }
        }
    }

    Ok(())
}
