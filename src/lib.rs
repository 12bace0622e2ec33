//! parvec - paragraph-vector sentiment classification for line-delimited
//! corpora.
//!
//! parvec reads labeled text corpora (one document per line), tags every
//! line with a stable synthetic identifier, trains PV-DBOW paragraph
//! vectors over the collection, and fits a logistic-regression classifier
//! on the learned vectors. Trained models persist to a single
//! [redb](https://github.com/cberner/redb) file.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use parvec::{ParagraphVectors, TaggedCorpus, TrainerConfig};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let sources = vec![
//!     (PathBuf::from("train-pos.txt"), "TRAIN_POS".to_string()),
//!     (PathBuf::from("train-neg.txt"), "TRAIN_NEG".to_string()),
//! ];
//! let mut corpus = TaggedCorpus::new(sources).unwrap();
//! corpus.materialize().unwrap();
//!
//! let mut model = ParagraphVectors::new(TrainerConfig::default()).unwrap();
//! model.build_vocab(corpus.documents().unwrap()).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! for epoch in 0..20 {
//!     if epoch > 0 {
//!         corpus.shuffle(&mut rng).unwrap();
//!     }
//!     model.train_epoch(corpus.documents().unwrap()).unwrap();
//! }
//!
//! let vector = model.docvec("TRAIN_POS_0").unwrap();
//! assert_eq!(vector.len(), 100);
//! ```

pub mod classifier;
pub mod corpus;
pub mod data_dir;
pub mod error;
pub mod features;
pub mod model_db;
pub mod tokenize;
pub mod trainer;
pub mod vocab;

pub use classifier::{ClassifierConfig, LogisticRegression};
pub use corpus::{TaggedCorpus, TaggedDocument};
pub use data_dir::DataDir;
pub use error::{Error, Result};
pub use model_db::ModelDb;
pub use trainer::{ParagraphVectors, TrainerConfig};
pub use vocab::Vocabulary;
