use std::cmp::Ordering;

use analysis_core::AnalysisResult;
use ndarray::Array2;
use serde::Serialize;

use crate::lda::{self, LdaConfig};
use crate::normalize::normalize;
use crate::stopwords::Stopwords;
use crate::vectorizer::{CountVectorizer, DocFrequency, Vocabulary};

/// Highest-weighted terms of one topic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicTerms {
    pub topic: usize,
    pub terms: Vec<String>,
}

/// Fits topic models over raw headline text.
#[derive(Debug, Clone)]
pub struct TopicModeler<'a> {
    stopwords: &'a Stopwords,
    min_df: DocFrequency,
    max_df: DocFrequency,
    lda: LdaConfig,
}

impl<'a> TopicModeler<'a> {
    /// Five topics over terms found in at least 2 and at most 95 documents.
    pub fn new(stopwords: &'a Stopwords) -> Self {
        Self {
            stopwords,
            min_df: DocFrequency::Count(2),
            max_df: DocFrequency::Count(95),
            lda: LdaConfig::default(),
        }
    }

    pub fn min_df(mut self, min_df: DocFrequency) -> Self {
        self.min_df = min_df;
        self
    }

    pub fn max_df(mut self, max_df: DocFrequency) -> Self {
        self.max_df = max_df;
        self
    }

    pub fn num_topics(mut self, n: usize) -> Self {
        self.lda.n_topics = n;
        self
    }

    pub fn lda_config(mut self, config: LdaConfig) -> Self {
        self.lda = config;
        self
    }

    pub fn normalize(&self, text: &str) -> String {
        normalize(text, self.stopwords)
    }

    /// Normalize every headline, vectorize, and fit LDA.
    pub fn fit<S: AsRef<str>>(&self, corpus: &[S]) -> AnalysisResult<TopicModel> {
        self.lda.validate()?;
        let documents: Vec<String> = corpus.iter().map(|text| self.normalize(text.as_ref())).collect();

        let vectorizer = CountVectorizer::new(self.min_df, self.max_df)?;
        let (vocabulary, counts) = vectorizer.fit_transform(&documents)?;
        tracing::info!(
            "fitting {} topics on {} headlines, vocabulary of {} terms",
            self.lda.n_topics,
            documents.len(),
            vocabulary.len()
        );

        let components = lda::fit(&self.lda, &counts, vocabulary.len())?;
        Ok(TopicModel {
            vectorizer,
            vocabulary,
            components,
            lda: self.lda.clone(),
        })
    }
}

/// A fitted topic model.
#[derive(Debug, Clone)]
pub struct TopicModel {
    vectorizer: CountVectorizer,
    vocabulary: Vocabulary,
    components: Array2<f64>,
    lda: LdaConfig,
}

impl TopicModel {
    pub fn num_topics(&self) -> usize {
        self.components.nrows()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Topic-word weights (topics x vocabulary)
    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    /// Up to `n` terms per topic, by descending weight. Equal weights keep
    /// vocabulary order. Topics are produced on demand.
    pub fn top_terms(&self, n: usize) -> impl Iterator<Item = TopicTerms> + '_ {
        self.components
            .outer_iter()
            .enumerate()
            .map(move |(topic, weights)| {
                let mut order: Vec<usize> = (0..weights.len()).collect();
                order.sort_by(|&a, &b| {
                    weights[b].partial_cmp(&weights[a]).unwrap_or(Ordering::Equal)
                });
                let terms = order
                    .into_iter()
                    .take(n)
                    .filter_map(|i| self.vocabulary.term(i).map(str::to_string))
                    .collect();
                TopicTerms { topic, terms }
            })
    }

    /// Topic mixture of a new headline, normalized the same way as the
    /// training corpus. Sums to 1.
    pub fn document_topics(&self, text: &str, stopwords: &Stopwords) -> AnalysisResult<Vec<f64>> {
        let normalized = normalize(text, stopwords);
        let doc = self.vectorizer.count_terms(&normalized, &self.vocabulary);
        Ok(lda::transform(&self.lda, &self.components, &doc)?.to_vec())
    }

    #[cfg(test)]
    pub(crate) fn from_parts(vocabulary: &[&str], components: Array2<f64>) -> Self {
        let mut terms: Vec<String> = vocabulary.iter().map(|t| t.to_string()).collect();
        terms.sort();
        let vectorizer = CountVectorizer::new(DocFrequency::Count(1), DocFrequency::Proportion(1.0))
            .unwrap();
        let (vocabulary, _) = vectorizer.fit_transform(&terms).unwrap();
        let lda = LdaConfig::new(components.nrows());
        Self {
            vectorizer,
            vocabulary,
            components,
            lda,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::AnalysisError;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    const HEADLINES: [&str; 5] = [
        "Apple releases new iPhone and updates software",
        "Google announces new AI model",
        "Microsoft stock rises after earnings",
        "Apple and Google partner on AI",
        "Tesla faces supply chain issues",
    ];

    #[test]
    fn test_fit_yields_requested_topics() {
        let words = Stopwords::english();
        let model = TopicModeler::new(&words).fit(&HEADLINES).unwrap();

        // apple, google, ai and new each appear in two headlines
        assert_eq!(model.vocabulary().terms(), &["ai", "apple", "google", "new"]);
        assert_eq!(model.num_topics(), 5);

        let topics: Vec<TopicTerms> = model.top_terms(10).collect();
        assert_eq!(topics.len(), 5);
        for (k, topic) in topics.iter().enumerate() {
            assert_eq!(topic.topic, k);
            assert_eq!(topic.terms.len(), 4);
        }
    }

    #[test]
    fn test_single_term_vocabulary() {
        let words = Stopwords::english();
        let corpus = [
            "Apple releases new iPhone",
            "Google announces new model",
            "Microsoft stock rises",
            "Tesla faces supply issues",
            "Amazon expands cloud",
        ];
        let model = TopicModeler::new(&words).fit(&corpus).unwrap();

        assert_eq!(model.vocabulary().terms(), &["new"]);
        assert_eq!(model.num_topics(), 5);
        for topic in model.top_terms(3) {
            assert_eq!(topic.terms, vec!["new"]);
        }
    }

    #[test]
    fn test_min_df_above_corpus_is_empty_vocabulary() {
        let words = Stopwords::english();
        let err = TopicModeler::new(&words)
            .min_df(DocFrequency::Count(10))
            .fit(&HEADLINES)
            .unwrap_err();

        assert!(matches!(err, AnalysisError::EmptyVocabulary { documents: 5, .. }));
    }

    #[test]
    fn test_fit_is_reproducible() {
        let words = Stopwords::english();
        let modeler = TopicModeler::new(&words).num_topics(2);
        let a = modeler.fit(&HEADLINES).unwrap();
        let b = modeler.fit(&HEADLINES).unwrap();

        assert_eq!(a.components(), b.components());
        assert_eq!(
            a.top_terms(2).collect::<Vec<_>>(),
            b.top_terms(2).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_top_terms_order_and_ties() {
        let model = TopicModel::from_parts(
            &["bond", "chip", "rate", "yield"],
            array![[0.5, 2.0, 2.0, 0.1], [1.0, 1.0, 1.0, 1.0]],
        );

        let topics: Vec<TopicTerms> = model.top_terms(3).collect();
        assert_eq!(topics[0].terms, vec!["chip", "rate", "bond"]);
        assert_eq!(topics[1].terms, vec!["bond", "chip", "rate"]);
    }

    #[test]
    fn test_top_terms_caps_at_vocabulary() {
        let model = TopicModel::from_parts(&["bond", "chip"], array![[0.2, 0.8]]);
        let topic = model.top_terms(10).next().unwrap();
        assert_eq!(topic.terms, vec!["chip", "bond"]);
    }

    #[test]
    fn test_document_topics_sum_to_one() {
        let words = Stopwords::english();
        let model = TopicModeler::new(&words).num_topics(3).fit(&HEADLINES).unwrap();
        let mixture = model
            .document_topics("Google and Apple bet on AI", &words)
            .unwrap();

        assert_eq!(mixture.len(), 3);
        assert_abs_diff_eq!(mixture.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }
}
