//! Title tokenization and TF-IDF weighting.
//!
//! ## Algorithm
//! 1. Lowercase, split into runs of alphanumeric characters (or `_`), keep
//!    runs of at least two characters
//! 2. Drop English stop words
//! 3. Vocabulary = every remaining term, sorted alphabetically
//! 4. Weight = raw count × smoothed idf, idf = ln((1 + n) / (1 + df)) + 1
//! 5. L2-normalize each document vector

use crate::similarity::{normalize, SparseVector};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

/// Common English words that carry no signal in a title
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone",
    "anything", "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became",
    "because", "become", "becomes", "becoming", "been", "before", "beforehand", "behind",
    "being", "below", "beside", "besides", "between", "beyond", "bill", "both", "bottom",
    "but", "by", "call", "can", "cannot", "cant", "co", "con", "could", "couldnt", "cry",
    "de", "describe", "detail", "do", "done", "down", "due", "during", "each", "eg",
    "eight", "either", "eleven", "else", "elsewhere", "empty", "enough", "etc", "even",
    "ever", "every", "everyone", "everything", "everywhere", "except", "few", "fifteen",
    "fifty", "fill", "find", "fire", "first", "five", "for", "former", "formerly", "forty",
    "found", "four", "from", "front", "full", "further", "get", "give", "go", "had", "has",
    "hasnt", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein",
    "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "hundred",
    "i", "ie", "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its", "itself",
    "keep", "last", "latter", "latterly", "least", "less", "ltd", "made", "many", "may",
    "me", "meanwhile", "might", "mill", "mine", "more", "moreover", "most", "mostly",
    "move", "much", "must", "my", "myself", "name", "namely", "neither", "never",
    "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem",
    "seemed", "seeming", "seems", "serious", "several", "she", "should", "show", "side",
    "since", "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something",
    "sometime", "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than",
    "that", "the", "their", "them", "themselves", "then", "thence", "there", "thereafter",
    "thereby", "therefore", "therein", "thereupon", "these", "they", "thick", "thin",
    "third", "this", "those", "though", "three", "through", "throughout", "thru", "thus",
    "to", "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un",
    "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were",
    "what", "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas",
    "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while", "whither",
    "who", "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without",
    "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

static STOP_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

pub fn is_stop_word(term: &str) -> bool {
    STOP_WORDS.contains(term)
}

/// Lowercased tokens of at least two word characters, stop words removed
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_with(text, true)
}

pub fn tokenize_with(text: &str, drop_stop_words: bool) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !(drop_stop_words && is_stop_word(token)))
        .map(|token| token.to_string())
        .collect()
}

/// Fitted TF-IDF weights over a fixed document collection
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    drop_stop_words: bool,
}

impl TfidfVectorizer {
    /// Learn the vocabulary and idf from `documents` and return one unit
    /// vector per document (empty for documents without usable terms)
    pub fn fit_transform<S: AsRef<str>>(documents: &[S]) -> (Self, Vec<SparseVector>) {
        Self::fit_transform_with(documents, true)
    }

    /// `fit_transform` with stop-word removal switched on or off
    pub fn fit_transform_with<S: AsRef<str>>(
        documents: &[S],
        drop_stop_words: bool,
    ) -> (Self, Vec<SparseVector>) {
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| tokenize_with(doc.as_ref(), drop_stop_words))
            .collect();

        let terms: BTreeSet<&str> = tokenized.iter().flatten().map(|t| t.as_str()).collect();
        let vocabulary: HashMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect();

        let mut df = vec![0usize; vocabulary.len()];
        for tokens in &tokenized {
            let distinct: HashSet<usize> = tokens.iter().map(|t| vocabulary[t.as_str()]).collect();
            for term in distinct {
                df[term] += 1;
            }
        }

        let n = documents.len() as f32;
        let idf: Vec<f32> = df
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let vectorizer = Self {
            vocabulary,
            idf,
            drop_stop_words,
        };
        let vectors = tokenized.iter().map(|tokens| vectorizer.weigh(tokens)).collect();
        (vectorizer, vectors)
    }

    /// Vectorize a new text against the fitted vocabulary; unseen terms are ignored
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&tokenize_with(text, self.drop_stop_words))
    }

    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in tokens {
            if let Some(&term) = self.vocabulary.get(token) {
                *counts.entry(term).or_insert(0.0) += 1.0;
            }
        }
        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(term, count)| (term, count * self.idf[term]))
            .collect();
        vector.sort_unstable_by_key(|&(term, _)| term);
        normalize(&mut vector);
        vector
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Column of a term in the fitted vocabulary
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.term_index(term).map(|idx| self.idf[idx])
    }
}
