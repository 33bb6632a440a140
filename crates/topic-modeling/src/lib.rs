//! Topic modeling over headline text.
//!
//! text -> normalized tokens -> document-term counts -> LDA topics

pub mod lda;
pub mod model;
pub mod normalize;
pub mod stopwords;
pub mod vectorizer;

pub use lda::LdaConfig;
pub use model::{TopicModel, TopicModeler, TopicTerms};
pub use normalize::{normalize, tokenize};
pub use stopwords::{init_stopwords, stopwords, StopwordSource, Stopwords};
pub use vectorizer::{CountVectorizer, DocFrequency, SparseDoc, Vocabulary};
