//! Headline normalization ahead of vectorization.

use unicode_segmentation::UnicodeSegmentation;

use crate::stopwords::Stopwords;

const CLITICS: &[&str] = &["s", "re", "ve", "ll", "d", "m"];

/// Split a headline into word and punctuation tokens.
///
/// Words follow Unicode word boundaries, except that words joined by `-`
/// or `/` stay one token (`52-Week`, `buy/sell`). Whitespace is dropped
/// and English contractions are split off their stem (`don't` -> `do`,
/// `n't`; `Apple's` -> `Apple`, `'s`).
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for word in compound_words(text) {
        match split_contraction(word) {
            Some((stem, clitic)) => {
                if !stem.is_empty() {
                    tokens.push(stem);
                }
                tokens.push(clitic);
            }
            None => tokens.push(word),
        }
    }
    tokens
}

/// Non-whitespace word-bound segments, with `word (-|/) word` runs merged
fn compound_words(text: &str) -> Vec<&str> {
    let segments: Vec<(usize, &str)> = text.split_word_bound_indices().collect();
    let mut words = Vec::new();
    let mut i = 0;
    while i < segments.len() {
        let (start, segment) = segments[i];
        if segment.trim().is_empty() {
            i += 1;
            continue;
        }
        let mut end = start + segment.len();
        if is_word(segment) {
            while let (Some(&(_, joiner)), Some(&(next_start, next))) =
                (segments.get(i + 1), segments.get(i + 2))
            {
                if !is_joiner(joiner) || !is_word(next) {
                    break;
                }
                end = next_start + next.len();
                i += 2;
            }
        }
        words.push(&text[start..end]);
        i += 1;
    }
    words
}

fn is_word(segment: &str) -> bool {
    segment.chars().any(char::is_alphanumeric)
}

fn is_joiner(segment: &str) -> bool {
    segment == "-" || segment == "/"
}

fn split_contraction(word: &str) -> Option<(&str, &str)> {
    let apostrophe = word.find(['\'', '\u{2019}'])?;
    let (stem, clitic) = word.split_at(apostrophe);
    let suffix = clitic.chars().skip(1).collect::<String>().to_lowercase();
    if suffix == "t" && stem.len() > 1 && stem.ends_with(['n', 'N']) {
        return Some(word.split_at(apostrophe - 1));
    }
    CLITICS.contains(&suffix.as_str()).then_some((stem, clitic))
}

/// Keep only alphabetic tokens that are not stopwords, joined by spaces.
///
/// Case is preserved; stopword membership is case-sensitive, so `The`
/// survives an English list that contains `the`.
pub fn normalize(text: &str, stopwords: &Stopwords) -> String {
    tokenize(text)
        .into_iter()
        .filter(|token| token.chars().all(char::is_alphabetic))
        .filter(|token| !stopwords.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_stopwords_keeps_case() {
        let words = Stopwords::english();
        assert_eq!(
            normalize("Apple releases new iPhone and updates software", &words),
            "Apple releases new iPhone updates software"
        );
    }

    #[test]
    fn test_capitalized_stopword_survives() {
        let words = Stopwords::english();
        assert_eq!(normalize("The market rallies", &words), "The market rallies");
    }

    #[test]
    fn test_drops_numbers_and_punctuation() {
        let words = Stopwords::english();
        assert_eq!(
            normalize("Stocks rise 3.5% after Q2 earnings, analysts say!", &words),
            "Stocks rise earnings analysts say"
        );
    }

    #[test]
    fn test_contractions_split() {
        assert_eq!(tokenize("Apple's rally"), vec!["Apple", "'s", "rally"]);
        assert_eq!(tokenize("don't sell"), vec!["do", "n't", "sell"]);
        assert_eq!(tokenize("Traders can't wait"), vec!["Traders", "ca", "n't", "wait"]);

        let words = Stopwords::english();
        assert_eq!(normalize("Apple's shares don't fall", &words), "Apple shares fall");
    }

    #[test]
    fn test_hyphen_and_slash_compounds_stay_whole() {
        assert_eq!(
            tokenize("Stocks That Hit 52-Week Highs"),
            vec!["Stocks", "That", "Hit", "52-Week", "Highs"]
        );
        assert_eq!(tokenize("buy/sell e-commerce"), vec!["buy/sell", "e-commerce"]);
        assert_eq!(tokenize("Apple - Google"), vec!["Apple", "-", "Google"]);
    }

    #[test]
    fn test_compounds_are_not_alphabetic() {
        let words = Stopwords::english();
        let out = normalize("Stocks That Hit 52-Week Highs On Friday", &words);
        assert_eq!(out, "Stocks That Hit Highs On Friday");
        assert!(!out.contains("Week"));

        assert_eq!(normalize("Apple e-commerce buy/sell update", &words), "Apple update");
    }

    #[test]
    fn test_empty_and_stopword_only() {
        let words = Stopwords::english();
        assert_eq!(normalize("", &words), "");
        assert_eq!(normalize("and the of", &words), "");
    }
}
