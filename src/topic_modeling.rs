use std::fs::File;
use std::io::Write;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Gamma};
use serde::Serialize;
use statrs::function::gamma::digamma;
use tracing::{debug, info};

use crate::charts;
use crate::clustering::KMeans;
use crate::config::PipelineConfig;
use crate::corpus::{self, SegmentedDocument};
use crate::error::{AnalysisError, Result};
use crate::vectorizer::TfIdfVectorizer;

#[derive(Debug, Clone, Serialize)]
pub struct ModeledTopic {
    pub id: usize,
    pub words: Vec<(String, f64)>,  // Term and its weight in this topic
    pub documents: Vec<usize>,      // Documents whose strongest topic is this one
}

impl ModeledTopic {
    pub fn terms(&self) -> Vec<&str> {
        self.words.iter().map(|(word, _)| word.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: usize,
    pub name: String,
    pub label: String,
    pub topic_distribution: Vec<f64>,  // Sums to 1 over topics
    pub primary_topic: usize,
    pub cluster: Option<usize>,
}

#[derive(Debug)]
pub struct TopicModel {
    pub topics: Vec<ModeledTopic>,
    pub documents: Vec<Document>,
    pub vocabulary: Vec<String>,
    pub topic_word_matrix: Array2<f64>,  // Topics x Terms
    pub doc_topic_matrix: Array2<f64>,   // Documents x Topics
}

impl TopicModel {
    pub fn num_topics(&self) -> usize {
        self.topics.len()
    }

    pub fn is_clustered(&self) -> bool {
        self.documents.iter().any(|doc| doc.cluster.is_some())
    }
}

#[derive(Debug, Clone)]
pub struct LDAConfig {
    pub max_topics: usize,           // Topic count is min(max_topics, documents)
    pub max_clusters: usize,         // Cluster count is min(max_clusters, documents)
    pub max_iterations: usize,       // EM passes over the corpus
    pub max_doc_update_iter: usize,  // Inner E-step iterations per document
    pub mean_change_tol: f64,
    pub doc_topic_prior: Option<f64>,   // Defaults to 1 / topics
    pub topic_word_prior: Option<f64>,  // Defaults to 1 / topics
    pub max_vocab_size: usize,
    pub top_words: usize,
    pub random_seed: u64,
}

impl Default for LDAConfig {
    fn default() -> Self {
        LDAConfig {
            max_topics: 3,
            max_clusters: 3,
            max_iterations: 10,
            max_doc_update_iter: 100,
            mean_change_tol: 1e-3,
            doc_topic_prior: None,
            topic_word_prior: None,
            max_vocab_size: 5000,
            top_words: 10,
            random_seed: 42,
        }
    }
}

/// Batch variational Bayes LDA over a weighted documents x terms matrix.
pub struct SimpleLDA {
    config: LDAConfig,
    num_topics: usize,
}

pub struct LdaFit {
    pub components: Array2<f64>,  // Topics x Terms, unnormalized
    pub doc_topic: Array2<f64>,   // Documents x Topics, rows sum to 1
}

impl SimpleLDA {
    pub fn new(config: LDAConfig, num_topics: usize) -> Result<Self> {
        if num_topics == 0 {
            return Err(AnalysisError::InvalidParameter("number of topics must be positive".into()));
        }
        Ok(SimpleLDA { config, num_topics })
    }

    /// Topic count capped by the number of documents.
    pub fn for_documents(config: LDAConfig, doc_count: usize) -> Result<Self> {
        let num_topics = topic_count(config.max_topics, doc_count);
        SimpleLDA::new(config, num_topics)
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn fit(&self, matrix: &Array2<f64>) -> Result<LdaFit> {
        let (_, n_terms) = matrix.dim();
        let k = self.num_topics;
        let doc_prior = self.config.doc_topic_prior.unwrap_or(1.0 / k as f64);
        let word_prior = self.config.topic_word_prior.unwrap_or(1.0 / k as f64);

        let mut rng = StdRng::seed_from_u64(self.config.random_seed);
        let init = Gamma::<f64>::new(100.0, 0.01).map_err(|e| AnalysisError::InvalidParameter(e.to_string()))?;

        // Step 1: Keep only the non-zero cells of each document
        let rows = sparse_rows(matrix);

        // Step 2: Random topic-term parameters
        let mut components = Array2::from_shape_fn((k, n_terms), |_| init.sample(&mut rng));

        // Step 3: EM passes
        for iteration in 0..self.config.max_iterations {
            let exp_topic_word = exp_dirichlet_expectation(&components);
            let start = Array2::from_shape_fn((rows.len(), k), |_| init.sample(&mut rng));
            let (_, suff_stats) = self.e_step(&rows, &exp_topic_word, start, doc_prior);
            components = &suff_stats * &exp_topic_word + word_prior;
            debug!("LDA EM iteration {} done", iteration + 1);
        }

        // Step 4: Infer document-topic weights from the fitted topics
        let exp_topic_word = exp_dirichlet_expectation(&components);
        let start = Array2::ones((rows.len(), k));
        let (doc_topic, _) = self.e_step(&rows, &exp_topic_word, start, doc_prior);

        Ok(LdaFit {
            components,
            doc_topic: self.normalize_doc_topic_matrix(doc_topic),
        })
    }

    fn e_step(
        &self,
        rows: &[Vec<(usize, f64)>],
        exp_topic_word: &Array2<f64>,
        mut doc_topic: Array2<f64>,
        doc_prior: f64,
    ) -> (Array2<f64>, Array2<f64>) {
        let k = self.num_topics;
        let mut suff_stats = Array2::<f64>::zeros(exp_topic_word.dim());

        for (doc_id, row) in rows.iter().enumerate() {
            let mut gamma = doc_topic.row(doc_id).to_owned();
            let mut exp_doc = exp_dirichlet_expectation_1d(gamma.view());

            for _ in 0..self.config.max_doc_update_iter {
                let last = gamma.clone();
                let norm_phi = normalizer(&exp_doc, exp_topic_word, row);

                gamma = Array1::from_shape_fn(k, |topic| {
                    let weighted: f64 = row
                        .iter()
                        .zip(&norm_phi)
                        .map(|(&(term, weight), phi)| weight / phi * exp_topic_word[[topic, term]])
                        .sum();
                    exp_doc[topic] * weighted + doc_prior
                });
                exp_doc = exp_dirichlet_expectation_1d(gamma.view());

                let mean_change = (&last - &gamma).mapv(f64::abs).mean().unwrap_or(0.0);
                if mean_change < self.config.mean_change_tol {
                    break;
                }
            }

            doc_topic.row_mut(doc_id).assign(&gamma);

            let norm_phi = normalizer(&exp_doc, exp_topic_word, row);
            for (&(term, weight), phi) in row.iter().zip(&norm_phi) {
                for topic in 0..k {
                    suff_stats[[topic, term]] += exp_doc[topic] * weight / phi;
                }
            }
        }

        (doc_topic, suff_stats)
    }

    fn normalize_doc_topic_matrix(&self, mut doc_topic: Array2<f64>) -> Array2<f64> {
        for mut row in doc_topic.rows_mut() {
            let total = row.sum();
            if total > 0.0 {
                row.mapv_inplace(|v| v / total);
            } else {
                row.fill(1.0 / self.num_topics as f64);
            }
        }
        doc_topic
    }
}

pub fn topic_count(max_topics: usize, doc_count: usize) -> usize {
    max_topics.min(doc_count)
}

fn sparse_rows(matrix: &Array2<f64>) -> Vec<Vec<(usize, f64)>> {
    matrix
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .filter(|(_, weight)| **weight != 0.0)
                .map(|(term, weight)| (term, *weight))
                .collect()
        })
        .collect()
}

/// Per-term normalizer `sum_k exp(E[log theta_k]) * exp(E[log beta_kw])`.
fn normalizer(exp_doc: &Array1<f64>, exp_topic_word: &Array2<f64>, row: &[(usize, f64)]) -> Vec<f64> {
    row.iter()
        .map(|&(term, _)| {
            exp_doc
                .iter()
                .enumerate()
                .map(|(topic, e)| e * exp_topic_word[[topic, term]])
                .sum::<f64>()
                + f64::EPSILON
        })
        .collect()
}

fn exp_dirichlet_expectation_1d(alpha: ArrayView1<f64>) -> Array1<f64> {
    let total = digamma(alpha.sum());
    alpha.mapv(|a| (digamma(a) - total).exp())
}

fn exp_dirichlet_expectation(alpha: &Array2<f64>) -> Array2<f64> {
    let mut out = alpha.clone();
    for mut row in out.rows_mut() {
        let total = digamma(row.sum());
        row.mapv_inplace(|a| (digamma(a) - total).exp());
    }
    out
}

fn top_words(weights: ArrayView1<f64>, vocabulary: &[String], n: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(usize, f64)> = weights.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(n);
    ranked
        .into_iter()
        .map(|(term, weight)| (vocabulary[term].clone(), weight))
        .collect()
}

fn primary_topic(distribution: &[f64]) -> usize {
    distribution
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Vectorizes, fits the topic model, and clusters documents in topic space
/// when there are at least two of them.
pub fn analyze_documents(documents: &[SegmentedDocument], config: &LDAConfig) -> Result<TopicModel> {
    // Step 1: TF-IDF features
    let texts: Vec<String> = documents.iter().map(|doc| doc.text()).collect();
    let mut vectorizer = TfIdfVectorizer::new(config.max_vocab_size);
    let tfidf = vectorizer.fit_transform(&texts)?;
    info!("TF-IDF matrix shape: {} x {}", tfidf.nrows(), tfidf.ncols());

    // Step 2: Topic model
    let lda = SimpleLDA::for_documents(config.clone(), documents.len())?;
    info!("Fitting LDA with {} topics", lda.num_topics());
    let fit = lda.fit(&tfidf)?;
    let vocabulary = vectorizer.vocabulary().to_vec();

    // Step 3: Cluster in topic space
    let clusters = if documents.len() >= 2 {
        let k = config.max_clusters.min(documents.len());
        let clustering = KMeans::new(k).with_seed(config.random_seed).fit(&fit.doc_topic)?;
        info!("Clustered {} documents into {} groups (inertia {:.4})", documents.len(), k, clustering.inertia);
        Some(clustering.assignments)
    } else {
        info!("Single document; skipping clustering");
        None
    };

    // Step 4: Per-document results
    let final_documents: Vec<Document> = documents
        .iter()
        .enumerate()
        .map(|(id, doc)| {
            let topic_distribution = fit.doc_topic.row(id).to_vec();
            Document {
                id,
                name: doc.name.clone(),
                label: doc.label().to_string(),
                primary_topic: primary_topic(&topic_distribution),
                topic_distribution,
                cluster: clusters.as_ref().map(|c| c[id]),
            }
        })
        .collect();

    // Step 5: Topics with their top terms
    let topics = fit
        .components
        .rows()
        .into_iter()
        .enumerate()
        .map(|(id, weights)| ModeledTopic {
            id,
            words: top_words(weights, &vocabulary, config.top_words),
            documents: final_documents
                .iter()
                .filter(|doc| doc.primary_topic == id)
                .map(|doc| doc.id)
                .collect(),
        })
        .collect();

    Ok(TopicModel {
        topics,
        documents: final_documents,
        vocabulary,
        topic_word_matrix: fit.components,
        doc_topic_matrix: fit.doc_topic,
    })
}

fn bom_csv_writer(path: &Path) -> Result<csv::Writer<File>> {
    let mut file = File::create(path).map_err(AnalysisError::io(path))?;
    file.write_all("\u{feff}".as_bytes()).map_err(AnalysisError::io(path))?;
    Ok(csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file))
}

/// `主题编号,0,...,width-1` then one row of ranked terms per topic. Topics
/// with fewer than `width` terms leave the trailing cells empty.
pub fn write_topic_keywords(path: &Path, topics: &[ModeledTopic], width: usize) -> Result<()> {
    let mut writer = bom_csv_writer(path)?;

    let mut header = vec!["主题编号".to_string()];
    header.extend((0..width).map(|i| i.to_string()));
    writer.write_record(&header)?;

    for topic in topics {
        let mut record = vec![topic.id.to_string()];
        record.extend((0..width).map(|i| {
            topic.words.get(i).map(|(word, _)| word.clone()).unwrap_or_default()
        }));
        writer.write_record(&record)?;
    }
    writer.flush().map_err(AnalysisError::io(path))
}

/// `文档名,主题1,...` then one row of topic weights per document.
pub fn write_document_topics(path: &Path, documents: &[Document], num_topics: usize) -> Result<()> {
    let mut writer = bom_csv_writer(path)?;

    let mut header = vec!["文档名".to_string()];
    header.extend((1..=num_topics).map(|i| format!("主题{}", i)));
    writer.write_record(&header)?;

    for doc in documents {
        let mut record = vec![doc.name.clone()];
        record.extend(doc.topic_distribution.iter().map(|w| w.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush().map_err(AnalysisError::io(path))
}

pub fn run_topics(config: &PipelineConfig) -> Result<TopicModel> {
    let layout = &config.layout;
    let visual_dir = layout.visual_dir();
    corpus::ensure_dir(&visual_dir)?;

    let output_dir = layout.output_dir();
    let documents = corpus::load_segmented_documents(&output_dir)?;
    info!("Loaded {} documents", documents.len());
    if documents.is_empty() {
        return Err(AnalysisError::EmptyCorpus(output_dir));
    }

    let model = analyze_documents(&documents, &config.lda)?;

    for topic in &model.topics {
        println!("主题 {}: {}", topic.id + 1, topic.terms().join(" "));
    }

    let keywords_path = visual_dir.join("topic_keywords.csv");
    write_topic_keywords(&keywords_path, &model.topics, config.lda.top_words)?;
    let distribution_path = visual_dir.join("document_topic_distribution.csv");
    write_document_topics(&distribution_path, &model.documents, model.num_topics())?;
    info!("Document topic distribution saved to {}", distribution_path.display());

    if !model.is_clustered() {
        return Ok(model);
    }

    let points: Vec<charts::ClusterPoint> = model
        .documents
        .iter()
        .map(|doc| charts::ClusterPoint {
            x: doc.topic_distribution[0],
            y: doc.topic_distribution[1],
            cluster: doc.cluster.unwrap_or(0),
            label: doc.label.clone(),
        })
        .collect();
    let scatter_path = visual_dir.join("topic_clusters.png");
    charts::draw_topic_clusters(&scatter_path, &points, &config.font_family)?;
    info!("Topic cluster scatter saved to {}", scatter_path.display());

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn doc(name: &str, text: &str) -> SegmentedDocument {
        SegmentedDocument {
            name: name.to_string(),
            tokens: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    fn sample_corpus() -> Vec<SegmentedDocument> {
        vec![
            doc("sport_seg.txt", "比赛 球队 进球 比赛 球员 冠军 比赛"),
            doc("finance_seg.txt", "股票 市场 投资 股票 银行 利率 市场"),
            doc("tech_seg.txt", "芯片 算法 软件 芯片 数据 算法 网络"),
            doc("mixed_seg.txt", "市场 芯片 投资 软件 股票 算法"),
        ]
    }

    #[test]
    fn test_topic_count_never_exceeds_documents() {
        for doc_count in 1..10 {
            assert_eq!(topic_count(3, doc_count), doc_count.min(3));
        }
    }

    #[test]
    fn test_doc_topic_rows_sum_to_one() {
        let model = analyze_documents(&sample_corpus(), &LDAConfig::default()).unwrap();
        assert_eq!(model.doc_topic_matrix.dim(), (4, 3));
        for row in model.doc_topic_matrix.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-9);
            assert!(row.iter().all(|w| *w > 0.0));
        }
    }

    #[test]
    fn test_topics_have_ranked_top_terms() {
        let model = analyze_documents(&sample_corpus(), &LDAConfig::default()).unwrap();
        assert_eq!(model.num_topics(), 3);
        for topic in &model.topics {
            assert_eq!(topic.words.len(), 10);
            assert!(topic.words.windows(2).all(|pair| pair[0].1 >= pair[1].1));
            assert!(topic.words.iter().all(|(w, _)| model.vocabulary.contains(w)));
        }
        let assigned: usize = model.topics.iter().map(|t| t.documents.len()).sum();
        assert_eq!(assigned, 4);
    }

    #[test]
    fn test_clusters_assigned_for_multiple_documents() {
        let model = analyze_documents(&sample_corpus(), &LDAConfig::default()).unwrap();
        assert!(model.is_clustered());
        assert!(model.documents.iter().all(|d| d.cluster.map_or(false, |c| c < 3)));
    }

    #[test]
    fn test_single_document_has_one_topic_and_no_clusters() {
        let corpus = vec![doc("only_seg.txt", "春天 花开 春天 鸟鸣")];
        let model = analyze_documents(&corpus, &LDAConfig::default()).unwrap();
        assert_eq!(model.num_topics(), 1);
        assert!(!model.is_clustered());
        assert_relative_eq!(model.documents[0].topic_distribution[0], 1.0, epsilon = 1e-12);
        assert_eq!(model.documents[0].label, "only");
    }

    #[test]
    fn test_fit_is_deterministic() {
        let first = analyze_documents(&sample_corpus(), &LDAConfig::default()).unwrap();
        let second = analyze_documents(&sample_corpus(), &LDAConfig::default()).unwrap();
        assert_eq!(first.doc_topic_matrix, second.doc_topic_matrix);
    }

    #[test]
    fn test_keyword_csv_pads_short_topics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topic_keywords.csv");
        let topics = vec![ModeledTopic {
            id: 0,
            words: vec![("春天".to_string(), 0.9), ("花开".to_string(), 0.5)],
            documents: vec![0],
        }];
        write_topic_keywords(&path, &topics, 4).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let content = content.trim_start_matches('\u{feff}');
        assert_eq!(content, "主题编号,0,1,2,3\n0,春天,花开,,\n");
    }

    #[test]
    fn test_zero_topics_rejected() {
        assert!(SimpleLDA::new(LDAConfig::default(), 0).is_err());
    }
}
