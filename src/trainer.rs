use std::{collections::HashMap, path::Path};

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    corpus::TaggedDocument,
    error::{Error, Result},
    model_db::ModelDb,
    vocab::Vocabulary,
};

/// Hyperparameters for paragraph-vector training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Length of document and word vectors.
    pub dimension: usize,
    /// Noise words drawn per positive example.
    pub negative: usize,
    /// Initial learning rate.
    pub alpha: f32,
    /// Floor the learning rate decays toward.
    pub min_alpha: f32,
    /// Words observed fewer times than this are dropped from the
    /// vocabulary.
    pub min_count: u64,
    /// Epoch horizon for the linear learning-rate decay. Training past
    /// this many epochs continues at `min_alpha`.
    pub epochs: usize,
    /// Seed for vector initialization and negative sampling.
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            dimension: 100,
            negative: 5,
            alpha: 0.025,
            min_alpha: 1e-4,
            min_count: 2,
            epochs: 20,
            seed: 1,
        }
    }
}

/// PV-DBOW paragraph-vector trainer.
///
/// The document vector for each tag is trained to predict the words of its
/// document via negative sampling. The caller drives the epoch loop and
/// controls document order between epochs (typically reshuffling the
/// materialized corpus), matching how the loader hands over its working
/// collection.
pub struct ParagraphVectors {
    config: TrainerConfig,
    vocab: Option<Vocabulary>,
    tags: Vec<String>,
    tag_index: HashMap<String, usize>,
    doc_vectors: Vec<f32>,
    word_output: Vec<f32>,
    epochs_trained: usize,
    rng: StdRng,
}

impl ParagraphVectors {
    /// Create an untrained model. Fails with [`Error::Config`] on
    /// nonsensical hyperparameters.
    pub fn new(config: TrainerConfig) -> Result<Self> {
        if config.dimension == 0 {
            return Err(Error::Config("dimension must be positive".into()));
        }
        if config.negative == 0 {
            return Err(Error::Config(
                "at least one negative sample is required".into(),
            ));
        }
        if config.alpha <= 0.0 || config.min_alpha <= 0.0 {
            return Err(Error::Config(
                "learning rates must be positive".into(),
            ));
        }
        if config.min_alpha > config.alpha {
            return Err(Error::Config(
                "min_alpha must not exceed alpha".into(),
            ));
        }
        if config.epochs == 0 {
            return Err(Error::Config("epochs must be positive".into()));
        }

        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            vocab: None,
            tags: Vec::new(),
            tag_index: HashMap::new(),
            doc_vectors: Vec::new(),
            word_output: Vec::new(),
            epochs_trained: 0,
            rng,
        })
    }

    /// Build the vocabulary over `docs` and allocate vectors.
    ///
    /// Document vectors are initialized uniformly in ±0.5/dimension from
    /// the seeded generator; word output weights start at zero. Resets any
    /// prior training progress.
    pub fn build_vocab(&mut self, docs: &[TaggedDocument]) -> Result<()> {
        let vocab = Vocabulary::build(docs, self.config.min_count);
        if vocab.is_empty() {
            return Err(Error::Config(format!(
                "no words with count >= {} across {} documents",
                self.config.min_count,
                docs.len()
            )));
        }

        let mut tags = Vec::with_capacity(docs.len());
        let mut tag_index = HashMap::with_capacity(docs.len());
        for doc in docs {
            if tag_index.insert(doc.tag.clone(), tags.len()).is_some() {
                return Err(Error::Config(format!(
                    "duplicate document tag '{}'",
                    doc.tag
                )));
            }
            tags.push(doc.tag.clone());
        }

        let dim = self.config.dimension;
        let mut doc_vectors = vec![0.0f32; tags.len() * dim];
        for v in &mut doc_vectors {
            *v = (self.rng.random::<f32>() - 0.5) / dim as f32;
        }

        self.word_output = vec![0.0f32; vocab.len() * dim];
        self.doc_vectors = doc_vectors;
        self.tags = tags;
        self.tag_index = tag_index;
        self.vocab = Some(vocab);
        self.epochs_trained = 0;
        Ok(())
    }

    /// Run one training pass over `docs` in the given order.
    ///
    /// Returns the mean loss over all (document, word) targets of the
    /// epoch. Fails with [`Error::State`] before
    /// [`build_vocab`](Self::build_vocab), or if `docs` contains a tag the
    /// vocabulary build never saw (the collection changed underneath).
    pub fn train_epoch(&mut self, docs: &[TaggedDocument]) -> Result<f32> {
        let vocab = self.vocab.as_ref().ok_or_else(|| {
            Error::State(
                "train_epoch called before build_vocab".into(),
            )
        })?;

        let dim = self.config.dimension;
        let negative = self.config.negative;
        let alpha = self.current_alpha();

        let doc_vectors = &mut self.doc_vectors;
        let word_output = &mut self.word_output;
        let rng = &mut self.rng;

        let mut err = vec![0.0f32; dim];
        let mut loss_sum = 0.0f64;
        let mut targets = 0u64;

        for doc in docs {
            let Some(&d) = self.tag_index.get(&doc.tag) else {
                return Err(Error::State(format!(
                    "unknown tag '{}': collection changed since \
                     build_vocab",
                    doc.tag
                )));
            };
            let doc_vec = &mut doc_vectors[d * dim..(d + 1) * dim];

            for word in &doc.words {
                let Some(target) = vocab.get(word) else {
                    continue;
                };
                err.fill(0.0);

                for k in 0..=negative {
                    let (w, label) = if k == 0 {
                        (target, 1.0f32)
                    } else {
                        let noise = vocab.sample(rng);
                        if noise == target {
                            continue;
                        }
                        (noise, 0.0f32)
                    };

                    let out = &mut word_output[w * dim..(w + 1) * dim];
                    let mut f = 0.0f32;
                    for i in 0..dim {
                        f += doc_vec[i] * out[i];
                    }
                    let p = sigmoid(f);
                    let g = (label - p) * alpha;
                    for i in 0..dim {
                        err[i] += g * out[i];
                        out[i] += g * doc_vec[i];
                    }

                    let prob = if label == 1.0 { p } else { 1.0 - p };
                    loss_sum += -f64::from(prob.max(1e-7)).ln();
                    targets += 1;
                }

                for i in 0..dim {
                    doc_vec[i] += err[i];
                }
            }
        }

        self.epochs_trained += 1;
        let loss = if targets == 0 {
            0.0
        } else {
            (loss_sum / targets as f64) as f32
        };
        tracing::debug!(
            epoch = self.epochs_trained,
            alpha,
            loss,
            "trained epoch"
        );
        Ok(loss)
    }

    // Linear decay from alpha to min_alpha across the configured horizon.
    fn current_alpha(&self) -> f32 {
        let progress =
            (self.epochs_trained as f32 / self.config.epochs as f32).min(1.0);
        let alpha = self.config.alpha
            - (self.config.alpha - self.config.min_alpha) * progress;
        alpha.max(self.config.min_alpha)
    }

    /// The learned vector for `tag`, or `None` if unknown.
    pub fn docvec(&self, tag: &str) -> Option<&[f32]> {
        let dim = self.config.dimension;
        self.tag_index
            .get(tag)
            .map(|&i| &self.doc_vectors[i * dim..(i + 1) * dim])
    }

    /// All known tags, in collection order at vocabulary-build time.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Number of documents with a trained vector.
    pub fn doc_count(&self) -> usize {
        self.tags.len()
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// The built vocabulary, if any.
    pub fn vocab(&self) -> Option<&Vocabulary> {
        self.vocab.as_ref()
    }

    pub fn epochs_trained(&self) -> usize {
        self.epochs_trained
    }

    /// Persist the model to a redb file at `path`.
    ///
    /// Fails with [`Error::State`] before
    /// [`build_vocab`](Self::build_vocab).
    pub fn save(&self, path: &Path) -> Result<()> {
        let vocab = self.vocab.as_ref().ok_or_else(|| {
            Error::State("save called before build_vocab".into())
        })?;

        let db = ModelDb::open(path)?;
        db.set_meta(
            "trainer_config",
            &serde_json::to_string(&self.config)?,
        )?;
        db.set_meta("epochs_trained", &self.epochs_trained.to_string())?;
        db.set_meta("vocab", &serde_json::to_string(&vocab.to_counts())?)?;

        let dim = self.config.dimension;
        let doc_entries: Vec<(&str, &[f32])> = self
            .tags
            .iter()
            .enumerate()
            .map(|(i, tag)| {
                (tag.as_str(), &self.doc_vectors[i * dim..(i + 1) * dim])
            })
            .collect();
        db.store_doc_vectors(&doc_entries)?;

        let word_entries: Vec<(&str, &[f32])> = vocab
            .words()
            .iter()
            .enumerate()
            .map(|(i, w)| {
                (
                    w.word.as_str(),
                    &self.word_output[i * dim..(i + 1) * dim],
                )
            })
            .collect();
        db.store_word_vectors(&word_entries)?;

        Ok(())
    }

    /// Load a previously saved model from `path`.
    ///
    /// Restores vectors, vocabulary, hyperparameters, and training
    /// progress, so further [`train_epoch`](Self::train_epoch) calls
    /// continue the learning-rate schedule where it left off.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound {
                kind: "model",
                name: path.display().to_string(),
            });
        }
        let db = ModelDb::open(path)?;

        let config_json =
            db.get_meta("trainer_config")?.ok_or_else(|| {
                Error::Config(format!(
                    "{} is not a parvec model (missing trainer_config)",
                    path.display()
                ))
            })?;
        let config: TrainerConfig = serde_json::from_str(&config_json)?;
        let epochs_trained: usize = db
            .get_meta("epochs_trained")?
            .unwrap_or_else(|| "0".to_string())
            .parse()
            .map_err(|_| {
                Error::Config("invalid epochs_trained metadata".into())
            })?;
        let vocab_json = db.get_meta("vocab")?.ok_or_else(|| {
            Error::Config("missing vocabulary metadata".into())
        })?;
        let vocab =
            Vocabulary::from_counts(serde_json::from_str(&vocab_json)?);

        let dim = config.dimension;
        let mut tags = Vec::new();
        let mut tag_index = HashMap::new();
        let mut doc_vectors = Vec::new();
        for (tag, vector) in db.all_doc_vectors(dim)? {
            tag_index.insert(tag.clone(), tags.len());
            tags.push(tag);
            doc_vectors.extend_from_slice(&vector);
        }

        let mut word_output = vec![0.0f32; vocab.len() * dim];
        for (word, vector) in db.all_word_vectors(dim)? {
            let idx = vocab.get(&word).ok_or_else(|| {
                Error::Config(format!(
                    "stored word '{word}' missing from vocabulary metadata"
                ))
            })?;
            word_output[idx * dim..(idx + 1) * dim]
                .copy_from_slice(&vector);
        }

        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            vocab: Some(vocab),
            tags,
            tag_index,
            doc_vectors,
            word_output,
            epochs_trained,
            rng,
        })
    }
}

impl std::fmt::Debug for ParagraphVectors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParagraphVectors")
            .field("dimension", &self.config.dimension)
            .field("documents", &self.tags.len())
            .field(
                "vocabulary",
                &self.vocab.as_ref().map(Vocabulary::len),
            )
            .field("epochs_trained", &self.epochs_trained)
            .finish_non_exhaustive()
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
