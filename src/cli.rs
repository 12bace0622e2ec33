use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "parvec",
    about = "Paragraph-vector sentiment classification for line-delimited corpora"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Path to the model database (defaults to <data-dir>/model.redb)
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train paragraph vectors over tagged line corpora
    Train(TrainArgs),
    /// Look up the trained vector for a document tag
    Vector(VectorArgs),
    /// Fit a logistic-regression classifier and score held-out documents
    Evaluate(EvaluateArgs),
    /// Show model statistics
    Info(InfoArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Train --

#[derive(Debug, Parser)]
pub struct TrainArgs {
    /// Corpus sources as <path>=<prefix> pairs, in presentation order
    #[arg(required = true, value_name = "PATH=PREFIX")]
    pub sources: Vec<String>,

    /// Embedding dimensionality
    #[arg(long, default_value = "100")]
    pub dimension: usize,

    /// Training epochs (the corpus is reshuffled between epochs)
    #[arg(long, default_value = "20")]
    pub epochs: usize,

    /// Negative samples per positive example
    #[arg(long, default_value = "5")]
    pub negative: usize,

    /// Drop words seen fewer times than this
    #[arg(long, default_value = "2")]
    pub min_count: u64,

    /// Initial learning rate
    #[arg(long, default_value = "0.025")]
    pub alpha: f32,

    /// Seed for initialization, sampling, and the epoch shuffle
    #[arg(long, default_value = "1")]
    pub seed: u64,
}

// -- Vector --

#[derive(Debug, Parser)]
pub struct VectorArgs {
    /// Document tag, e.g. TRAIN_POS_42
    pub tag: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Evaluate --

#[derive(Debug, Parser)]
pub struct EvaluateArgs {
    /// Tag prefix of positive training documents
    #[arg(long)]
    pub train_pos: String,

    /// Tag prefix of negative training documents
    #[arg(long)]
    pub train_neg: String,

    /// Tag prefix of positive held-out documents
    #[arg(long)]
    pub test_pos: String,

    /// Tag prefix of negative held-out documents
    #[arg(long)]
    pub test_neg: String,

    /// Classifier learning rate
    #[arg(long, default_value = "0.1")]
    pub learning_rate: f32,

    /// Classifier gradient-descent iterations
    #[arg(long, default_value = "200")]
    pub iterations: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Info --

#[derive(Debug, Parser)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
