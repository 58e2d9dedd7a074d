use anyhow::Result;

use sentiment_rnn::{CellKind, Dataset, RnnConfig, SentimentRnn, Vocab};

/// Tiny built-in corpus: (review, label), label 1 = positive.
const CORPUS: &[(&str, u8)] = &[
    ("a wonderful little film with a heartfelt story", 1),
    ("i loved every minute of this movie", 1),
    ("brilliant acting and a gorgeous script", 1),
    ("an absolute delight from start to finish", 1),
    ("the best film i have seen this year", 1),
    ("funny warm and thoroughly enjoyable", 1),
    ("a gorgeous film i loved the story", 1),
    ("wonderful characters and brilliant direction", 1),
    ("this movie was a delight truly the best", 1),
    ("heartfelt funny and beautifully made", 1),
    ("i enjoyed this movie it was wonderful", 1),
    ("a brilliant and enjoyable story", 1),
    ("a terrible film with a boring story", 0),
    ("i hated every minute of this movie", 0),
    ("awful acting and a dreadful script", 0),
    ("an absolute disaster from start to finish", 0),
    ("the worst film i have seen this year", 0),
    ("dull slow and thoroughly painful", 0),
    ("a dreadful film i hated the story", 0),
    ("terrible characters and awful direction", 0),
    ("this movie was a disaster truly the worst", 0),
    ("boring dull and badly made", 0),
    ("i despised this movie it was awful", 0),
    ("a terrible and painful story", 0),
];

const PROBES: &[&str] = &[
    "i loved this wonderful film",
    "a boring dreadful movie",
    "brilliant and enjoyable from start to finish",
    "the worst script i have seen",
];

fn main() -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    // === Build vocabulary from the corpus ===
    let texts: Vec<&str> = CORPUS.iter().map(|(text, _)| *text).collect();
    let vocab = Vocab::from_corpus(&texts);

    // === Encode the corpus into a labeled dataset ===
    let pairs: Vec<(Vec<usize>, u8)> = CORPUS
        .iter()
        .map(|(text, label)| (vocab.encode(text), *label))
        .collect();
    let dataset = Dataset::from_pairs(pairs, vocab.len())?;

    let config = RnnConfig {
        vocab_size: vocab.len(),
        max_seq_len: 12,
        embedding_dim: 16,
        hidden_units: 32,
        num_layers: 1,
        cell: CellKind::Lstm,
        learning_rate: 0.01,
        batch_size: 4,
        epochs: 15,
        validation_split: 0.25,
        seed: 42,
    };
    let mut model = SentimentRnn::new(config)?;

    // === Print model information ===
    println!("\n=== MODEL INFORMATION ===");
    println!("Network architecture: {}", model.network_description());
    println!(
        "Model configuration -> vocab_size: {}, max_seq_len: {}, embedding_dim: {}, hidden_units: {}",
        model.config().vocab_size,
        model.config().max_seq_len,
        model.config().embedding_dim,
        model.config().hidden_units
    );
    println!("Total parameters: {}", model.total_parameters());

    // === Test before any training ===
    println!("\n=== BEFORE TRAINING ===");
    for probe in PROBES {
        let p = model.predict(&vocab.encode(probe));
        println!("P(positive) = {:.3} | {}", p, probe);
    }

    // === Training phase ===
    println!("\n=== TRAINING MODEL ===");
    println!(
        "Training on {} examples for {} epochs with learning rate {}",
        dataset.len(),
        model.config().epochs,
        model.config().learning_rate
    );

    let history = model.train(&dataset)?;

    for metrics in &history.epochs {
        match (metrics.val_loss, metrics.val_accuracy) {
            (Some(val_loss), Some(val_accuracy)) => println!(
                "epoch {:>2}: loss {:.4}, accuracy {:.3}, val_loss {:.4}, val_accuracy {:.3}",
                metrics.epoch, metrics.loss, metrics.accuracy, val_loss, val_accuracy
            ),
            _ => println!(
                "epoch {:>2}: loss {:.4}, accuracy {:.3}",
                metrics.epoch, metrics.loss, metrics.accuracy
            ),
        }
    }

    // === Test after training ===
    println!("\n=== AFTER TRAINING ===");
    for probe in PROBES {
        let p = model.predict(&vocab.encode(probe));
        let verdict = if p >= 0.5 { "positive" } else { "negative" };
        println!("P(positive) = {:.3} ({}) | {}", p, verdict, probe);
    }

    // === Full metrics record, for plotting elsewhere ===
    println!("\n=== TRAINING HISTORY (JSON) ===");
    println!("{}", history.to_json_pretty()?);

    Ok(())
}
