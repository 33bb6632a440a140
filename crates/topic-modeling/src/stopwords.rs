//! Stopword resources.
//!
//! The set is loaded once into process-wide state by [`init_stopwords`];
//! nothing happens as a side effect of linking the crate.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use analysis_core::{AnalysisError, AnalysisResult};

/// NLTK's English stopword corpus as shipped in current nltk_data (198 words)
const ENGLISH: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
    "you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
    "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
    "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
    "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing",
    "a", "an", "the", "and", "but", "if", "or", "because", "as", "until",
    "while", "of", "at", "by", "for", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "to", "from", "up", "down",
    "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each",
    "few", "more", "most", "other", "some", "such", "no", "nor", "not", "only",
    "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o",
    "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't",
    "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't",
    "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't", "shouldn",
    "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
    "he'd", "he'll", "he's", "i'd", "i'll", "i'm", "i've", "it'd", "it'll", "she'd",
    "she'll", "they'd", "they'll", "they're", "they've", "we'd", "we'll", "we're", "we've",
];

/// Immutable stopword set. Membership is case-sensitive, as loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    /// Built-in English list
    pub fn english() -> Self {
        Self::from_words(ENGLISH.iter().copied())
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// One word per line; blank lines ignored.
    pub fn parse(text: &str) -> Self {
        Self::from_words(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Where to load stopwords from
#[derive(Debug, Clone, PartialEq)]
pub enum StopwordSource {
    English,
    File(PathBuf),
}

impl StopwordSource {
    pub fn load(&self) -> AnalysisResult<Stopwords> {
        match self {
            StopwordSource::English => Ok(Stopwords::english()),
            StopwordSource::File(path) => {
                let text = fs::read_to_string(path).map_err(|e| {
                    AnalysisError::ResourceUnavailable(format!(
                        "stopword list {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let words = Stopwords::parse(&text);
                if words.is_empty() {
                    return Err(AnalysisError::ResourceUnavailable(format!(
                        "stopword list {} is empty",
                        path.display()
                    )));
                }
                Ok(words)
            }
        }
    }
}

static STOPWORDS: OnceLock<Stopwords> = OnceLock::new();

fn init_in<'a>(cell: &'a OnceLock<Stopwords>, source: &StopwordSource) -> AnalysisResult<&'a Stopwords> {
    if let Some(existing) = cell.get() {
        tracing::debug!("stopwords already initialised, ignoring {:?}", source);
        return Ok(existing);
    }
    let loaded = source.load()?;
    tracing::info!("loaded {} stopwords from {:?}", loaded.len(), source);
    Ok(cell.get_or_init(|| loaded))
}

fn get_in(cell: &OnceLock<Stopwords>) -> AnalysisResult<&Stopwords> {
    cell.get().ok_or_else(|| {
        AnalysisError::ResourceUnavailable(
            "stopwords not initialised; call init_stopwords first".to_string(),
        )
    })
}

/// Load the process-wide stopword set. The first successful call wins;
/// later calls return the set already in place.
pub fn init_stopwords(source: &StopwordSource) -> AnalysisResult<&'static Stopwords> {
    init_in(&STOPWORDS, source)
}

/// The process-wide stopword set, if [`init_stopwords`] has run.
pub fn stopwords() -> AnalysisResult<&'static Stopwords> {
    get_in(&STOPWORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_list() {
        let words = Stopwords::english();
        assert_eq!(words.len(), 198);
        assert!(words.contains("and"));
        assert!(words.contains("don't"));
        assert!(words.contains("he'd"));
        assert!(words.contains("i'll"));
        assert!(words.contains("they're"));
        // Case-sensitive membership
        assert!(!words.contains("The"));
    }

    #[test]
    fn test_parse_lines() {
        let words = Stopwords::parse("foo\n\n  bar \nBaz\n");
        assert_eq!(words.len(), 3);
        assert!(words.contains("bar"));
        assert!(words.contains("Baz"));
        assert!(!words.contains("baz"));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let source = StopwordSource::File(PathBuf::from("/nonexistent/stopwords/english"));
        let err = source.load().unwrap_err();
        assert!(matches!(err, AnalysisError::ResourceUnavailable(_)));
    }

    #[test]
    fn test_use_before_init_fails() {
        let cell = OnceLock::new();
        assert!(matches!(get_in(&cell), Err(AnalysisError::ResourceUnavailable(_))));

        let words = init_in(&cell, &StopwordSource::English).unwrap();
        assert!(words.contains("the"));
        assert!(get_in(&cell).is_ok());
    }

    #[test]
    fn test_failed_init_leaves_cell_empty() {
        let cell = OnceLock::new();
        let source = StopwordSource::File(PathBuf::from("/nonexistent/stopwords/english"));

        assert!(init_in(&cell, &source).is_err());
        assert!(get_in(&cell).is_err());
    }

    #[test]
    fn test_first_init_wins() {
        let cell = OnceLock::new();
        init_in(&cell, &StopwordSource::English).unwrap();
        let again = init_in(&cell, &StopwordSource::File(PathBuf::from("/nonexistent"))).unwrap();
        assert_eq!(again.len(), 198);
    }
}
