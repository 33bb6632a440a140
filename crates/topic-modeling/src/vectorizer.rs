//! Bag-of-words vectorization with document-frequency pruning.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use analysis_core::{AnalysisError, AnalysisResult};
use regex::Regex;

/// Sparse document: `(term index, count)` pairs sorted by term index
pub type SparseDoc = Vec<(usize, f64)>;

/// Words of two or more word characters
const TOKEN_PATTERN: &str = r"\b\w\w+\b";

/// Document-frequency bound: an absolute document count or a share of the
/// corpus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DocFrequency {
    Count(usize),
    Proportion(f64),
}

impl DocFrequency {
    /// Bound expressed in documents for a corpus of `n_documents`
    pub fn resolve(&self, n_documents: usize) -> f64 {
        match *self {
            DocFrequency::Count(count) => count as f64,
            DocFrequency::Proportion(share) => share * n_documents as f64,
        }
    }

    fn validate(&self, name: &str) -> AnalysisResult<()> {
        match *self {
            DocFrequency::Proportion(share) if !(0.0..=1.0).contains(&share) => {
                Err(AnalysisError::InvalidParameter(format!(
                    "{} proportion must lie in [0, 1], got {}",
                    name, share
                )))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for DocFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocFrequency::Count(count) => write!(f, "{}", count),
            DocFrequency::Proportion(share) => write!(f, "{}", share),
        }
    }
}

/// Retained terms, sorted lexicographically; a term's position is its
/// column in the document-term matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    fn from_sorted(terms: Vec<String>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
        Self { terms, index }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Lower-cases, tokenizes and counts terms, keeping those whose document
/// frequency lies within `[min_df, max_df]`.
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    min_df: DocFrequency,
    max_df: DocFrequency,
    token_pattern: Regex,
}

impl CountVectorizer {
    pub fn new(min_df: DocFrequency, max_df: DocFrequency) -> AnalysisResult<Self> {
        min_df.validate("min_df")?;
        max_df.validate("max_df")?;
        let token_pattern = Regex::new(TOKEN_PATTERN)
            .map_err(|e| AnalysisError::InvalidParameter(format!("token pattern: {}", e)))?;
        Ok(Self {
            min_df,
            max_df,
            token_pattern,
        })
    }

    pub fn min_df(&self) -> DocFrequency {
        self.min_df
    }

    pub fn max_df(&self) -> DocFrequency {
        self.max_df
    }

    /// Terms of one document, in order of appearance
    pub fn analyze(&self, document: &str) -> Vec<String> {
        let lowered = document.to_lowercase();
        self.token_pattern
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Learn the vocabulary and return it with one sparse row of term
    /// counts per document.
    pub fn fit_transform<S: AsRef<str>>(
        &self,
        documents: &[S],
    ) -> AnalysisResult<(Vocabulary, Vec<SparseDoc>)> {
        let n_documents = documents.len();
        let analyzed: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| self.analyze(doc.as_ref()))
            .collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for terms in &analyzed {
            let unique: HashSet<&str> = terms.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }
        if doc_freq.is_empty() {
            return Err(self.empty_vocabulary(n_documents));
        }

        let min_docs = self.min_df.resolve(n_documents);
        let max_docs = self.max_df.resolve(n_documents);
        if max_docs < min_docs {
            return Err(AnalysisError::InvalidParameter(format!(
                "max_df ({}) corresponds to fewer documents than min_df ({})",
                self.max_df, self.min_df
            )));
        }

        // BTreeMap iteration keeps the retained terms sorted
        let retained: Vec<String> = doc_freq
            .iter()
            .filter(|&(_, &df)| df as f64 >= min_docs && df as f64 <= max_docs)
            .map(|(term, _)| term.to_string())
            .collect();
        tracing::debug!(
            "vocabulary: {} of {} terms kept (df in [{}, {}]) over {} documents",
            retained.len(),
            doc_freq.len(),
            min_docs,
            max_docs,
            n_documents
        );
        if retained.is_empty() {
            return Err(self.empty_vocabulary(n_documents));
        }

        let vocabulary = Vocabulary::from_sorted(retained);
        let counts = analyzed
            .iter()
            .map(|terms| sparse_counts(terms, &vocabulary))
            .collect();
        Ok((vocabulary, counts))
    }

    /// Term counts of one document against a fitted vocabulary; unknown
    /// terms are ignored.
    pub fn count_terms(&self, document: &str, vocabulary: &Vocabulary) -> SparseDoc {
        sparse_counts(&self.analyze(document), vocabulary)
    }

    fn empty_vocabulary(&self, documents: usize) -> AnalysisError {
        AnalysisError::EmptyVocabulary {
            documents,
            min_df: self.min_df.to_string(),
            max_df: self.max_df.to_string(),
        }
    }
}

fn sparse_counts<S: AsRef<str>>(terms: &[S], vocabulary: &Vocabulary) -> SparseDoc {
    let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
    for term in terms {
        if let Some(col) = vocabulary.index_of(term.as_ref()) {
            *counts.entry(col).or_insert(0.0) += 1.0;
        }
    }
    counts.into_iter().collect()
}
