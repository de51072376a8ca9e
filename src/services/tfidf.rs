//! Term-frequency / inverse-document-frequency vectorization of one text field.

use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use super::sparse::SparseVector;

/// English stop words removed before counting terms
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together", "too",
    "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("valid token pattern"))
}

fn stop_words() -> &'static HashSet<&'static str> {
    static WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    WORDS.get_or_init(|| ENGLISH_STOP_WORDS.iter().copied().collect())
}

/// Lowercases and splits text into terms of two or more word characters,
/// dropping stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !stop_words().contains(t))
        .map(str::to_string)
        .collect()
}

/// Vectorizer settings
#[derive(Debug, Clone, Copy, Default)]
pub struct TfidfVectorizer {
    /// Keep only the N terms with the highest corpus frequency
    pub max_features: Option<usize>,
}

/// Fitted vocabulary plus one L2-normalized row per document
#[derive(Debug, Clone, Default)]
pub struct TfidfMatrix {
    pub vocabulary: BTreeMap<String, u32>,
    pub idf: Vec<f64>,
    pub rows: Vec<SparseVector>,
}

impl TfidfMatrix {
    /// Width of the vector space
    pub fn dim(&self) -> u32 {
        self.vocabulary.len() as u32
    }
}

impl TfidfVectorizer {
    pub fn new(max_features: Option<usize>) -> Self {
        Self { max_features }
    }

    /// Learns the vocabulary over `docs` and returns their vectors.
    ///
    /// Uses smoothed idf `ln((1 + n) / (1 + df)) + 1` and raw term counts.
    /// When `max_features` applies, corpus-frequency ties keep the
    /// alphabetically earlier term. Vocabulary indices are alphabetical.
    /// Documents with no surviving terms get an empty vector.
    pub fn fit_transform<S: AsRef<str>>(&self, docs: &[S]) -> TfidfMatrix {
        let counts: Vec<HashMap<String, u32>> = docs
            .iter()
            .map(|doc| {
                let mut tf: HashMap<String, u32> = HashMap::new();
                for term in tokenize(doc.as_ref()) {
                    *tf.entry(term).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        // term -> (document frequency, corpus frequency)
        let mut stats: BTreeMap<&str, (u32, u64)> = BTreeMap::new();
        for tf in &counts {
            for (term, &count) in tf {
                let entry = stats.entry(term.as_str()).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += count as u64;
            }
        }

        let mut kept: Vec<(&str, u32)> = stats.iter().map(|(t, &(df, _))| (*t, df)).collect();
        if let Some(limit) = self.max_features {
            if kept.len() > limit {
                let mut by_freq: Vec<(&str, u32, u64)> =
                    stats.iter().map(|(t, &(df, cf))| (*t, df, cf)).collect();
                // stable: equal frequencies stay alphabetical
                by_freq.sort_by(|a, b| b.2.cmp(&a.2));
                by_freq.truncate(limit);
                kept = by_freq.into_iter().map(|(t, df, _)| (t, df)).collect();
                kept.sort_by(|a, b| a.0.cmp(b.0));
            }
        }

        let n_docs = docs.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(kept.len());
        for (index, (term, df)) in kept.iter().enumerate() {
            vocabulary.insert(term.to_string(), index as u32);
            idf.push(((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0);
        }

        let rows = counts
            .iter()
            .map(|tf| {
                let pairs = tf
                    .iter()
                    .filter_map(|(term, &count)| {
                        vocabulary
                            .get(term)
                            .map(|&i| (i, (count as f64 * idf[i as usize]) as f32))
                    })
                    .collect();
                SparseVector::from_pairs(pairs).l2_normalized()
            })
            .collect();

        TfidfMatrix {
            vocabulary,
            idf,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        assert_eq!(
            tokenize("Slice of Life, a Comedy"),
            vec!["slice", "life", "comedy"]
        );
    }

    #[test]
    fn test_rows_are_unit_norm() {
        let matrix = TfidfVectorizer::default().fit_transform(&["action adventure", "action drama"]);
        for row in &matrix.rows {
            assert!((row.magnitude() - 1.0).abs() < 1e-6);
        }
        assert_eq!(matrix.dim(), 3);
    }

    #[test]
    fn test_empty_document_is_zero_vector() {
        let matrix = TfidfVectorizer::default().fit_transform(&["", "action", "the of"]);
        assert!(matrix.rows[0].is_empty());
        assert!(matrix.rows[2].is_empty());
        assert!(!matrix.rows[1].is_empty());
    }

    #[test]
    fn test_idf_weights_rare_terms_higher() {
        let matrix = TfidfVectorizer::default().fit_transform(&["action", "action", "action mecha"]);
        let action = matrix.vocabulary["action"] as usize;
        let mecha = matrix.vocabulary["mecha"] as usize;
        assert!((matrix.idf[action] - 1.0).abs() < 1e-9);
        assert!(matrix.idf[mecha] > matrix.idf[action]);
    }

    #[test]
    fn test_max_features_keeps_most_frequent_terms() {
        let docs = ["pirate pirate ninja", "pirate ninja samurai", "robot"];
        let matrix = TfidfVectorizer::new(Some(2)).fit_transform(&docs);
        let terms: Vec<&str> = matrix.vocabulary.keys().map(String::as_str).collect();
        assert_eq!(terms, vec!["ninja", "pirate"]);
        assert!(matrix.rows[2].is_empty());
    }

    #[test]
    fn test_is_deterministic() {
        let docs = ["school comedy romance", "space opera", "school romance"];
        let a = TfidfVectorizer::default().fit_transform(&docs);
        let b = TfidfVectorizer::default().fit_transform(&docs);
        assert_eq!(a.rows, b.rows);
        assert_eq!(a.vocabulary, b.vocabulary);
    }
}
