//! Latent Dirichlet Allocation
//!
//! Batch variational Bayes: each pass runs a per-document E-step with the
//! current topic-word parameters, then replaces them with the expected
//! sufficient statistics plus the topic-word prior.

use analysis_core::{AnalysisError, AnalysisResult};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Gamma};
use statrs::function::gamma::digamma;

use crate::vectorizer::SparseDoc;

const EPS: f64 = f64::EPSILON;

/// LDA model configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LdaConfig {
    /// Number of topics
    pub n_topics: usize,
    /// Document-topic prior; `1 / n_topics` when unset
    pub doc_topic_prior: Option<f64>,
    /// Topic-word prior; `1 / n_topics` when unset
    pub topic_word_prior: Option<f64>,
    /// Passes over the corpus
    pub max_iter: usize,
    /// Cap on E-step iterations per document
    pub max_doc_update_iter: usize,
    /// E-step stops once the mean absolute change falls below this
    pub mean_change_tol: f64,
    pub random_seed: u64,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            n_topics: 5,
            doc_topic_prior: None,
            topic_word_prior: None,
            max_iter: 10,
            max_doc_update_iter: 100,
            mean_change_tol: 1e-3,
            random_seed: 42,
        }
    }
}

impl LdaConfig {
    pub fn new(n_topics: usize) -> Self {
        Self {
            n_topics,
            ..Default::default()
        }
    }

    pub fn max_iter(mut self, n: usize) -> Self {
        self.max_iter = n;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn doc_topic_prior(mut self, alpha: f64) -> Self {
        self.doc_topic_prior = Some(alpha);
        self
    }

    pub fn topic_word_prior(mut self, eta: f64) -> Self {
        self.topic_word_prior = Some(eta);
        self
    }

    pub(crate) fn validate(&self) -> AnalysisResult<()> {
        if self.n_topics == 0 {
            return Err(AnalysisError::InvalidParameter(
                "number of topics must be at least 1".to_string(),
            ));
        }
        for (name, prior) in [
            ("doc_topic_prior", self.doc_topic_prior),
            ("topic_word_prior", self.topic_word_prior),
        ] {
            if let Some(value) = prior {
                if value.is_nan() || value <= 0.0 {
                    return Err(AnalysisError::InvalidParameter(format!(
                        "{} must be positive, got {}",
                        name, value
                    )));
                }
            }
        }
        Ok(())
    }

    fn alpha(&self) -> f64 {
        self.doc_topic_prior.unwrap_or(1.0 / self.n_topics as f64)
    }

    fn eta(&self) -> f64 {
        self.topic_word_prior.unwrap_or(1.0 / self.n_topics as f64)
    }
}

/// Fitted topic-word parameters (topics x terms) for sparse documents over
/// a vocabulary of `n_terms`.
pub fn fit(config: &LdaConfig, docs: &[SparseDoc], n_terms: usize) -> AnalysisResult<Array2<f64>> {
    config.validate()?;
    let n_docs = docs.len();
    let k = config.n_topics;
    if n_docs == 0 || n_terms == 0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "cannot fit topics on {} documents over {} terms",
            n_docs, n_terms
        )));
    }
    if let Some(&(w, _)) = docs.iter().flatten().find(|(w, _)| *w >= n_terms) {
        return Err(AnalysisError::InvalidParameter(format!(
            "term index {} outside vocabulary of {}",
            w, n_terms
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.random_seed);
    let init = init_distribution()?;
    let mut components = Array2::from_shape_fn((k, n_terms), |_| init.sample(&mut rng));

    for pass in 0..config.max_iter {
        let exp_topic_word = dirichlet_expectation_2d(&components).mapv(f64::exp);
        let mut suff_stats = Array2::<f64>::zeros((k, n_terms));

        for doc in docs {
            let inferred = infer_document(config, doc, &exp_topic_word, &init, &mut rng);
            for (j, &(w, count)) in doc.iter().enumerate() {
                let ratio = count / inferred.norm_phi[j];
                for t in 0..k {
                    suff_stats[[t, w]] += inferred.exp_doc_topic[t] * ratio;
                }
            }
        }

        components = suff_stats * &exp_topic_word + config.eta();
        tracing::debug!("lda pass {}/{} over {} documents", pass + 1, config.max_iter, n_docs);
    }

    Ok(components)
}

/// Topic proportions of one document under fitted `components`; sums to 1.
pub fn transform(
    config: &LdaConfig,
    components: &Array2<f64>,
    doc: &[(usize, f64)],
) -> AnalysisResult<Array1<f64>> {
    config.validate()?;
    if components.nrows() != config.n_topics {
        return Err(AnalysisError::InvalidParameter(format!(
            "components have {} topics, config expects {}",
            components.nrows(),
            config.n_topics
        )));
    }
    if let Some(&(w, _)) = doc.iter().find(|(w, _)| *w >= components.ncols()) {
        return Err(AnalysisError::InvalidParameter(format!(
            "term index {} outside vocabulary of {}",
            w,
            components.ncols()
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.random_seed);
    let init = init_distribution()?;
    let exp_topic_word = dirichlet_expectation_2d(components).mapv(f64::exp);
    let inferred = infer_document(config, doc, &exp_topic_word, &init, &mut rng);

    let total = inferred.gamma.sum();
    Ok(inferred.gamma / total)
}

fn init_distribution() -> AnalysisResult<Gamma<f64>> {
    Gamma::new(100.0, 0.01)
        .map_err(|e| AnalysisError::CalculationError(format!("gamma initialiser: {}", e)))
}

struct InferredDoc {
    gamma: Array1<f64>,
    exp_doc_topic: Array1<f64>,
    norm_phi: Array1<f64>,
}

/// Variational E-step for a single document.
fn infer_document(
    config: &LdaConfig,
    doc: &[(usize, f64)],
    exp_topic_word: &Array2<f64>,
    init: &Gamma<f64>,
    rng: &mut StdRng,
) -> InferredDoc {
    let alpha = config.alpha();
    let ids: Vec<usize> = doc.iter().map(|&(w, _)| w).collect();
    let cnts: Array1<f64> = doc.iter().map(|&(_, c)| c).collect();
    let exp_topic_word_d = exp_topic_word.select(Axis(1), &ids);

    let mut gamma = Array1::from_shape_fn(config.n_topics, |_| init.sample(&mut *rng));
    let mut exp_doc_topic = dirichlet_expectation_1d(gamma.view()).mapv(f64::exp);
    let mut norm_phi = exp_doc_topic.dot(&exp_topic_word_d) + EPS;

    for _ in 0..config.max_doc_update_iter {
        let last = gamma.clone();
        gamma = &exp_doc_topic * &exp_topic_word_d.dot(&(&cnts / &norm_phi)) + alpha;
        exp_doc_topic = dirichlet_expectation_1d(gamma.view()).mapv(f64::exp);
        norm_phi = exp_doc_topic.dot(&exp_topic_word_d) + EPS;

        let change = (&last - &gamma).mapv(f64::abs).mean().unwrap_or(0.0);
        if change < config.mean_change_tol {
            break;
        }
    }

    InferredDoc {
        gamma,
        exp_doc_topic,
        norm_phi,
    }
}

/// E[log x] for x ~ Dirichlet(alpha)
fn dirichlet_expectation_1d(alpha: ArrayView1<f64>) -> Array1<f64> {
    let total = digamma(alpha.sum());
    alpha.mapv(|a| digamma(a) - total)
}

/// Row-wise [`dirichlet_expectation_1d`]
fn dirichlet_expectation_2d(alpha: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(alpha.raw_dim());
    for (row, mut target) in alpha.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
        target.assign(&dirichlet_expectation_1d(row));
    }
    out
}
