use std::collections::HashMap;

use rand::Rng;

use crate::corpus::TaggedDocument;

/// Exponent applied to unigram counts for the negative-sampling
/// distribution. Flattens the distribution so frequent words are not
/// drawn overwhelmingly often.
const SAMPLING_EXPONENT: f64 = 0.75;

/// One vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabWord {
    pub word: String,
    pub count: u64,
}

/// Word frequency table over a document collection.
///
/// Words are ordered by descending count (ties keep first-seen order), so
/// index 0 is always the most frequent surviving word. Also carries the
/// cumulative noise distribution used to draw negative samples.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    words: Vec<VocabWord>,
    index: HashMap<String, usize>,
    total_tokens: u64,
    cumulative: Vec<f64>,
}

impl Vocabulary {
    /// Count words across `docs`, dropping any below `min_count`.
    pub fn build(docs: &[TaggedDocument], min_count: u64) -> Self {
        let mut counts: HashMap<&str, (u64, usize)> = HashMap::new();
        let mut total_tokens = 0u64;

        for doc in docs {
            for word in &doc.words {
                total_tokens += 1;
                let next_rank = counts.len();
                let entry =
                    counts.entry(word.as_str()).or_insert((0, next_rank));
                entry.0 += 1;
            }
        }

        let mut surviving: Vec<(&str, u64, usize)> = counts
            .into_iter()
            .filter(|(_, (count, _))| *count >= min_count)
            .map(|(word, (count, first_seen))| (word, count, first_seen))
            .collect();
        surviving.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let words = surviving
            .into_iter()
            .map(|(word, count, _)| VocabWord {
                word: word.to_string(),
                count,
            })
            .collect();

        Self::assemble(words, total_tokens)
    }

    /// Rebuild a vocabulary from persisted (word, count) pairs, preserving
    /// their stored order.
    pub fn from_counts(pairs: Vec<(String, u64)>) -> Self {
        let total_tokens = pairs.iter().map(|(_, c)| c).sum();
        let words = pairs
            .into_iter()
            .map(|(word, count)| VocabWord { word, count })
            .collect();
        Self::assemble(words, total_tokens)
    }

    fn assemble(words: Vec<VocabWord>, total_tokens: u64) -> Self {
        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.word.clone(), i))
            .collect();

        let mut cumulative = Vec::with_capacity(words.len());
        let mut running = 0.0;
        for w in &words {
            running += (w.count as f64).powf(SAMPLING_EXPONENT);
            cumulative.push(running);
        }

        Self {
            words,
            index,
            total_tokens,
            cumulative,
        }
    }

    /// Number of distinct surviving words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Total token count observed during the build, including words later
    /// dropped by `min_count`.
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    /// Index of `word`, if it survived.
    pub fn get(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// Entry at `idx`.
    pub fn word(&self, idx: usize) -> &VocabWord {
        &self.words[idx]
    }

    /// All entries in vocabulary order.
    pub fn words(&self) -> &[VocabWord] {
        &self.words
    }

    /// (word, count) pairs in vocabulary order, for persistence.
    pub fn to_counts(&self) -> Vec<(String, u64)> {
        self.words
            .iter()
            .map(|w| (w.word.clone(), w.count))
            .collect()
    }

    /// Draw one word index from the unigram^0.75 noise distribution.
    ///
    /// Panics if the vocabulary is empty; callers guard via
    /// [`is_empty`](Self::is_empty) at build time.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let total = *self.cumulative.last().expect("non-empty vocabulary");
        let point = rng.random_range(0.0..total);
        self.cumulative.partition_point(|&c| c <= point)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn doc(tag: &str, words: &[&str]) -> TaggedDocument {
        TaggedDocument {
            words: words.iter().map(|w| w.to_string()).collect(),
            tag: tag.to_string(),
        }
    }

    #[test]
    fn counts_are_exact() {
        let docs = vec![
            doc("A_0", &["good", "movie"]),
            doc("A_1", &["bad", "movie"]),
        ];
        let vocab = Vocabulary::build(&docs, 1);

        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.total_tokens(), 4);
        let movie = vocab.get("movie").unwrap();
        assert_eq!(vocab.word(movie).count, 2);
    }

    #[test]
    fn min_count_filters() {
        let docs = vec![
            doc("A_0", &["good", "movie"]),
            doc("A_1", &["bad", "movie"]),
        ];
        let vocab = Vocabulary::build(&docs, 2);

        assert_eq!(vocab.len(), 1);
        assert_eq!(vocab.get("movie"), Some(0));
        assert_eq!(vocab.get("good"), None);
        // Dropped words still count toward the token total.
        assert_eq!(vocab.total_tokens(), 4);
    }

    #[test]
    fn ordered_by_descending_count() {
        let docs = vec![doc("A_0", &["a", "b", "b", "c", "c", "c"])];
        let vocab = Vocabulary::build(&docs, 1);

        assert_eq!(vocab.word(0).word, "c");
        assert_eq!(vocab.word(1).word, "b");
        assert_eq!(vocab.word(2).word, "a");
    }

    #[test]
    fn count_ties_keep_first_seen_order() {
        let docs = vec![doc("A_0", &["zeta", "alpha", "mid"])];
        let vocab = Vocabulary::build(&docs, 1);

        assert_eq!(vocab.word(0).word, "zeta");
        assert_eq!(vocab.word(1).word, "alpha");
        assert_eq!(vocab.word(2).word, "mid");
    }

    #[test]
    fn sample_stays_in_range() {
        let docs = vec![doc("A_0", &["a", "b", "b", "c", "c", "c"])];
        let vocab = Vocabulary::build(&docs, 1);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..1000 {
            assert!(vocab.sample(&mut rng) < vocab.len());
        }
    }

    #[test]
    fn sample_covers_all_words() {
        let docs = vec![doc("A_0", &["a", "b", "b", "c", "c", "c"])];
        let vocab = Vocabulary::build(&docs, 1);
        let mut rng = StdRng::seed_from_u64(7);

        let mut seen = vec![false; vocab.len()];
        for _ in 0..1000 {
            seen[vocab.sample(&mut rng)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn counts_round_trip() {
        let docs = vec![
            doc("A_0", &["good", "movie"]),
            doc("A_1", &["bad", "movie"]),
        ];
        let vocab = Vocabulary::build(&docs, 1);
        let rebuilt = Vocabulary::from_counts(vocab.to_counts());

        assert_eq!(rebuilt.len(), vocab.len());
        for (i, w) in vocab.words().iter().enumerate() {
            assert_eq!(rebuilt.word(i), w);
            assert_eq!(rebuilt.get(&w.word), Some(i));
        }
    }

    #[test]
    fn empty_corpus_empty_vocab() {
        let vocab = Vocabulary::build(&[], 1);
        assert!(vocab.is_empty());
        assert_eq!(vocab.total_tokens(), 0);
    }
}
