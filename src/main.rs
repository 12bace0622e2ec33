use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use kdam::{BarExt, tqdm};
use rand::{SeedableRng, rngs::StdRng};
use tracing_subscriber::EnvFilter;

use parvec::{
    ClassifierConfig, DataDir, LogisticRegression, ParagraphVectors,
    TaggedCorpus, TrainerConfig,
    error::{self, Error},
    features,
};

mod cli;

use cli::{Cli, Command, EvaluateArgs, InfoArgs, TrainArgs, VectorArgs};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("PARVEC_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let model_path = match &cli.model {
        Some(path) => path.clone(),
        None => DataDir::resolve(cli.data_dir.as_deref())?.model_db(),
    };

    match &cli.command {
        Command::Train(args) => cmd_train(&model_path, args, cli.quiet)?,
        Command::Vector(args) => cmd_vector(&model_path, args)?,
        Command::Evaluate(args) => cmd_evaluate(&model_path, args)?,
        Command::Info(args) => cmd_info(&model_path, args)?,
        Command::Completions(args) => {
            clap_complete::generate(
                args.shell,
                &mut Cli::command(),
                "parvec",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Parse `<path>=<prefix>` source arguments in presentation order.
fn parse_sources(args: &[String]) -> error::Result<Vec<(PathBuf, String)>> {
    args.iter()
        .map(|arg| {
            let (path, prefix) = arg.split_once('=').ok_or_else(|| {
                Error::Config(format!(
                    "invalid source '{arg}': expected <path>=<prefix>"
                ))
            })?;
            if path.is_empty() || prefix.is_empty() {
                return Err(Error::Config(format!(
                    "invalid source '{arg}': empty path or prefix"
                )));
            }
            Ok((PathBuf::from(path), prefix.to_string()))
        })
        .collect()
}

fn cmd_train(
    model_path: &Path,
    args: &TrainArgs,
    quiet: bool,
) -> error::Result<()> {
    let sources = parse_sources(&args.sources)?;
    let mut corpus = TaggedCorpus::new(sources)?;
    corpus.materialize()?;

    let config = TrainerConfig {
        dimension: args.dimension,
        negative: args.negative,
        alpha: args.alpha,
        min_count: args.min_count,
        epochs: args.epochs,
        seed: args.seed,
        ..TrainerConfig::default()
    };
    let mut model = ParagraphVectors::new(config)?;
    model.build_vocab(corpus.documents().unwrap())?;

    if !quiet {
        eprintln!(
            "Training {} documents, vocabulary of {} words",
            model.doc_count(),
            model.vocab().unwrap().len()
        );
    }

    let mut shuffle_rng = StdRng::seed_from_u64(args.seed);
    let mut bar =
        (!quiet).then(|| tqdm!(total = args.epochs, desc = "epochs"));
    for epoch in 0..args.epochs {
        if epoch > 0 {
            corpus.shuffle(&mut shuffle_rng)?;
        }
        let loss = model.train_epoch(corpus.documents().unwrap())?;
        tracing::debug!(epoch, loss, "epoch complete");
        if let Some(bar) = bar.as_mut() {
            bar.update(1).ok();
        }
    }
    if bar.is_some() {
        eprintln!();
    }

    model.save(model_path)?;
    if !quiet {
        eprintln!("Saved model to {}", model_path.display());
    }
    Ok(())
}

fn cmd_vector(model_path: &Path, args: &VectorArgs) -> error::Result<()> {
    let model = ParagraphVectors::load(model_path)?;
    let vector =
        model.docvec(&args.tag).ok_or_else(|| Error::NotFound {
            kind: "document tag",
            name: args.tag.clone(),
        })?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "tag": args.tag,
                "dimension": vector.len(),
                "vector": vector,
            })
        );
    } else {
        let rendered: Vec<String> =
            vector.iter().map(|v| format!("{v:.6}")).collect();
        println!("{}", rendered.join(" "));
    }
    Ok(())
}

fn cmd_evaluate(
    model_path: &Path,
    args: &EvaluateArgs,
) -> error::Result<()> {
    let model = ParagraphVectors::load(model_path)?;

    let group = |prefix: &str| -> error::Result<Vec<String>> {
        let tags = features::tags_with_prefix(&model, prefix);
        if tags.is_empty() {
            return Err(Error::NotFound {
                kind: "tag prefix",
                name: prefix.to_string(),
            });
        }
        Ok(tags)
    };

    let (train_x, train_y) = features::labeled_features(
        &model,
        &[
            (group(&args.train_pos)?, 1.0),
            (group(&args.train_neg)?, 0.0),
        ],
    )?;
    let (test_x, test_y) = features::labeled_features(
        &model,
        &[
            (group(&args.test_pos)?, 1.0),
            (group(&args.test_neg)?, 0.0),
        ],
    )?;

    let mut classifier = LogisticRegression::new(ClassifierConfig {
        learning_rate: args.learning_rate,
        iterations: args.iterations,
        ..ClassifierConfig::default()
    });
    classifier.fit(&train_x, &train_y)?;
    let accuracy = classifier.score(&test_x, &test_y)?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "train_documents": train_y.len(),
                "test_documents": test_y.len(),
                "accuracy": accuracy,
            })
        );
    } else {
        println!("Train documents: {}", train_y.len());
        println!("Test documents: {}", test_y.len());
        println!("Accuracy: {accuracy:.4}");
    }
    Ok(())
}

fn cmd_info(model_path: &Path, args: &InfoArgs) -> error::Result<()> {
    let model = ParagraphVectors::load(model_path)?;
    let vocab_size = model.vocab().map_or(0, |v| v.len());

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "model": model_path.display().to_string(),
                "dimension": model.dimension(),
                "documents": model.doc_count(),
                "vocabulary": vocab_size,
                "epochs_trained": model.epochs_trained(),
            })
        );
    } else {
        println!("Model: {}", model_path.display());
        println!("Dimension: {}", model.dimension());
        println!("Documents: {}", model.doc_count());
        println!("Vocabulary: {vocab_size}");
        println!("Epochs trained: {}", model.epochs_trained());
    }
    Ok(())
}
