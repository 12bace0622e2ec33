use std::{
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::PathBuf,
};

use rand::{Rng, seq::SliceRandom};

use crate::{
    error::{Error, Result},
    tokenize::{TokenizerFn, default_tokenizer},
};

/// One tagged, tokenized line of input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedDocument {
    /// Word tokens of the line, in order.
    pub words: Vec<String>,
    /// Synthetic identifier `<prefix>_<line_index>`, zero-based per source.
    pub tag: String,
}

/// Reads a fixed, ordered set of line-delimited text files into tagged
/// document records.
///
/// Each line of each source becomes one [`TaggedDocument`] whose tag is
/// `<prefix>_<line_index>`. Sources are read in the order given at
/// construction, so the materialized collection is all documents of the
/// first source in line order, then the second, and so on.
///
/// Construction performs no file I/O; it only validates that prefixes are
/// pairwise distinct so generated tags can never collide across sources.
pub struct TaggedCorpus {
    sources: Vec<(PathBuf, String)>,
    tokenizer: TokenizerFn,
    documents: Option<Vec<TaggedDocument>>,
}

impl TaggedCorpus {
    /// Create a loader over an ordered (path, prefix) source mapping.
    ///
    /// Fails with [`Error::Config`] if two sources share a prefix.
    pub fn new(sources: Vec<(PathBuf, String)>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for (path, prefix) in &sources {
            if !seen.insert(prefix.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate source prefix '{prefix}' (for {})",
                    path.display()
                )));
            }
        }

        Ok(Self {
            sources,
            tokenizer: default_tokenizer,
            documents: None,
        })
    }

    /// Replace the default tokenizer with a custom policy.
    pub fn with_tokenizer(mut self, tokenizer: TokenizerFn) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// The configured (path, prefix) source mapping, in iteration order.
    pub fn sources(&self) -> &[(PathBuf, String)] {
        &self.sources
    }

    /// Lazy, forward-only pass over all sources in mapping order.
    ///
    /// Each call reopens and rereads every source from the start. Only one
    /// file is open at any moment; its handle is released when the source
    /// is exhausted or errors. An I/O failure yields `Err` and ends the
    /// pass — there are no partial-success semantics.
    pub fn iter(&self) -> CorpusIter<'_> {
        CorpusIter {
            sources: &self.sources,
            tokenizer: self.tokenizer,
            source_idx: 0,
            lines: None,
            line_idx: 0,
        }
    }

    /// Eagerly read all sources into the loader's working collection.
    ///
    /// Aborts on the first unreadable source with [`Error::Io`], leaving
    /// any previous working collection untouched.
    pub fn materialize(&mut self) -> Result<&[TaggedDocument]> {
        let docs = self.iter().collect::<Result<Vec<_>>>()?;
        self.documents = Some(docs);
        Ok(self.documents.as_deref().unwrap())
    }

    /// Randomly permute the working collection in place.
    ///
    /// Uses an unbiased Fisher–Yates shuffle driven by the supplied
    /// generator; pass a seeded [`rand::rngs::StdRng`] for deterministic
    /// tests. Fails with [`Error::State`] before the first
    /// [`materialize`](Self::materialize).
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let docs = self.documents.as_mut().ok_or_else(|| {
            Error::State(
                "shuffle called before the corpus was materialized".into(),
            )
        })?;
        docs.shuffle(rng);
        Ok(())
    }

    /// The working collection, if materialized.
    pub fn documents(&self) -> Option<&[TaggedDocument]> {
        self.documents.as_deref()
    }
}

impl std::fmt::Debug for TaggedCorpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaggedCorpus")
            .field("sources", &self.sources)
            .field(
                "materialized",
                &self.documents.as_ref().map(Vec::len),
            )
            .finish_non_exhaustive()
    }
}

/// Iterator state for one lazy pass; see [`TaggedCorpus::iter`].
pub struct CorpusIter<'a> {
    sources: &'a [(PathBuf, String)],
    tokenizer: TokenizerFn,
    source_idx: usize,
    lines: Option<Lines<BufReader<File>>>,
    line_idx: usize,
}

impl CorpusIter<'_> {
    // An error ends the pass; fuse so the next call returns None.
    fn abort(&mut self) {
        self.lines = None;
        self.source_idx = self.sources.len();
    }
}

impl Iterator for CorpusIter<'_> {
    type Item = Result<TaggedDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.lines.is_none() {
                let (path, _) = self.sources.get(self.source_idx)?;
                match File::open(path) {
                    Ok(file) => {
                        self.lines = Some(BufReader::new(file).lines());
                        self.line_idx = 0;
                    }
                    Err(e) => {
                        self.abort();
                        return Some(Err(e.into()));
                    }
                }
            }

            match self.lines.as_mut().unwrap().next() {
                Some(Ok(line)) => {
                    let prefix = &self.sources[self.source_idx].1;
                    let tag = format!("{prefix}_{}", self.line_idx);
                    self.line_idx += 1;
                    return Some(Ok(TaggedDocument {
                        words: (self.tokenizer)(&line),
                        tag,
                    }));
                }
                Some(Err(e)) => {
                    self.abort();
                    return Some(Err(e.into()));
                }
                None => {
                    // Source exhausted: drop the handle, move on.
                    self.lines = None;
                    self.source_idx += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn write_corpus(dir: &std::path::Path) -> Vec<(PathBuf, String)> {
        let a = dir.join("a.txt");
        let b = dir.join("b.txt");
        std::fs::write(&a, "good movie\nbad movie\n").unwrap();
        std::fs::write(&b, "ok film\n").unwrap();
        vec![(a, "A".to_string()), (b, "B".to_string())]
    }

    #[test]
    fn duplicate_prefix_is_config_error() {
        let sources = vec![
            (PathBuf::from("a.txt"), "X".to_string()),
            (PathBuf::from("b.txt"), "X".to_string()),
        ];
        assert!(matches!(
            TaggedCorpus::new(sources),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn construction_does_no_io() {
        // Paths do not exist; construction must still succeed.
        let sources = vec![
            (PathBuf::from("/nonexistent/a.txt"), "A".to_string()),
            (PathBuf::from("/nonexistent/b.txt"), "B".to_string()),
        ];
        let corpus = TaggedCorpus::new(sources).unwrap();
        assert!(corpus.documents().is_none());
    }

    #[test]
    fn materialize_tags_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let mut corpus = TaggedCorpus::new(write_corpus(tmp.path())).unwrap();

        let docs = corpus.materialize().unwrap().to_vec();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].words, vec!["good", "movie"]);
        assert_eq!(docs[0].tag, "A_0");
        assert_eq!(docs[1].words, vec!["bad", "movie"]);
        assert_eq!(docs[1].tag, "A_1");
        assert_eq!(docs[2].words, vec!["ok", "film"]);
        assert_eq!(docs[2].tag, "B_0");
    }

    #[test]
    fn materialize_is_deterministic() {
        let tmp = tempfile::tempdir().unwrap();
        let mut corpus = TaggedCorpus::new(write_corpus(tmp.path())).unwrap();

        let first = corpus.materialize().unwrap().to_vec();
        let second = corpus.materialize().unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn lazy_iter_is_restartable() {
        let tmp = tempfile::tempdir().unwrap();
        let corpus = TaggedCorpus::new(write_corpus(tmp.path())).unwrap();

        let pass1: Vec<_> = corpus.iter().map(|d| d.unwrap().tag).collect();
        let pass2: Vec<_> = corpus.iter().map(|d| d.unwrap().tag).collect();
        assert_eq!(pass1, vec!["A_0", "A_1", "B_0"]);
        assert_eq!(pass1, pass2);
    }

    #[test]
    fn line_index_restarts_per_source() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.txt");
        let b = tmp.path().join("b.txt");
        std::fs::write(&a, "one\ntwo\nthree\n").unwrap();
        std::fs::write(&b, "uno\ndos\n").unwrap();

        let corpus = TaggedCorpus::new(vec![
            (a, "A".to_string()),
            (b, "B".to_string()),
        ])
        .unwrap();
        let tags: Vec<_> = corpus.iter().map(|d| d.unwrap().tag).collect();
        assert_eq!(tags, vec!["A_0", "A_1", "A_2", "B_0", "B_1"]);
    }

    #[test]
    fn missing_source_aborts_pass() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.txt");
        std::fs::write(&a, "good movie\n").unwrap();

        let mut corpus = TaggedCorpus::new(vec![
            (a, "A".to_string()),
            (tmp.path().join("missing.txt"), "B".to_string()),
        ])
        .unwrap();

        assert!(matches!(corpus.materialize(), Err(Error::Io(_))));
        assert!(corpus.documents().is_none());

        let mut iter = corpus.iter();
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none()); // fused after the error
    }

    #[test]
    fn shuffle_before_materialize_is_state_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut corpus = TaggedCorpus::new(write_corpus(tmp.path())).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        assert!(matches!(
            corpus.shuffle(&mut rng),
            Err(Error::State(_))
        ));
    }

    #[test]
    fn shuffle_preserves_contents_and_reorders() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("lines.txt");
        let text: String =
            (0..20).map(|i| format!("word{i} filler\n")).collect();
        std::fs::write(&path, text).unwrap();

        let mut corpus =
            TaggedCorpus::new(vec![(path, "L".to_string())]).unwrap();
        let before = corpus.materialize().unwrap().to_vec();

        let mut rng = StdRng::seed_from_u64(42);
        corpus.shuffle(&mut rng).unwrap();
        let after = corpus.documents().unwrap().to_vec();

        assert_ne!(before, after);
        let mut sorted_before = before;
        let mut sorted_after = after;
        sorted_before.sort_by(|a, b| a.tag.cmp(&b.tag));
        sorted_after.sort_by(|a, b| a.tag.cmp(&b.tag));
        assert_eq!(sorted_before, sorted_after);
    }

    #[test]
    fn custom_tokenizer_is_used() {
        fn upper(line: &str) -> Vec<String> {
            line.split_whitespace().map(|w| w.to_uppercase()).collect()
        }

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.txt");
        std::fs::write(&path, "good movie\n").unwrap();

        let mut corpus = TaggedCorpus::new(vec![(path, "A".to_string())])
            .unwrap()
            .with_tokenizer(upper);
        let docs = corpus.materialize().unwrap();
        assert_eq!(docs[0].words, vec!["GOOD", "MOVIE"]);
    }

    #[test]
    fn blank_lines_become_empty_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.txt");
        std::fs::write(&path, "good\n\nbad\n").unwrap();

        let mut corpus =
            TaggedCorpus::new(vec![(path, "A".to_string())]).unwrap();
        let docs = corpus.materialize().unwrap();
        assert_eq!(docs.len(), 3);
        assert!(docs[1].words.is_empty());
        assert_eq!(docs[1].tag, "A_1");
    }
}
