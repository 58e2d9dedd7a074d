use sentiment_rnn::{
    CellKind, Dataset, ModelError, RnnConfig, SentimentRnn, TrainingHistory, Vocab, PAD_ID, UNK_ID,
};

fn toy_config(vocab_size: usize) -> RnnConfig {
    RnnConfig {
        vocab_size,
        max_seq_len: 6,
        embedding_dim: 8,
        hidden_units: 8,
        num_layers: 1,
        cell: CellKind::Lstm,
        learning_rate: 0.05,
        batch_size: 8,
        epochs: 30,
        validation_split: 0.0,
        seed: 42,
    }
}

/// Label 1 iff token 2 appears; token 3 marks the negatives.
fn synthetic_pairs() -> Vec<(Vec<usize>, u8)> {
    vec![
        (vec![1, 2, 4], 1),
        (vec![2, 5], 1),
        (vec![4, 2, 1, 2], 1),
        (vec![2], 1),
        (vec![1, 3, 4], 0),
        (vec![3, 5], 0),
        (vec![4, 3, 1, 3], 0),
        (vec![3], 0),
    ]
}

#[test]
fn bad_configs_are_rejected_at_construction() {
    let mut config = toy_config(10);
    config.hidden_units = 0;
    assert!(matches!(
        SentimentRnn::new(config),
        Err(ModelError::InvalidConfig(_))
    ));

    let mut config = toy_config(10);
    config.vocab_size = 1;
    assert!(matches!(
        SentimentRnn::new(config),
        Err(ModelError::InvalidConfig(_))
    ));

    let mut config = toy_config(10);
    config.learning_rate = f32::NAN;
    assert!(matches!(
        SentimentRnn::new(config),
        Err(ModelError::InvalidConfig(_))
    ));

    let mut config = toy_config(10);
    config.validation_split = 1.0;
    assert!(matches!(
        SentimentRnn::new(config),
        Err(ModelError::InvalidConfig(_))
    ));

    let mut config = toy_config(10);
    config.epochs = 0;
    assert!(matches!(
        SentimentRnn::new(config),
        Err(ModelError::InvalidConfig(_))
    ));
}

#[test]
fn strict_ingestion_aborts_on_the_first_bad_sample() {
    let pairs = vec![(vec![1, 2], 1), (vec![9, 1], 0)];
    let err = Dataset::from_pairs(pairs, 5).unwrap_err();

    assert_eq!(
        err,
        ModelError::InvalidSample {
            index: 1,
            reason: "token id 9 out of range for vocabulary of 5".to_string(),
        }
    );

    let pairs = vec![(vec![1], 2)];
    assert!(matches!(
        Dataset::from_pairs(pairs, 5),
        Err(ModelError::InvalidSample { index: 0, .. })
    ));
}

#[test]
fn lossy_ingestion_skips_bad_samples_and_keeps_the_rest() {
    let pairs = vec![(vec![1, 2], 1), (vec![9, 1], 0), (vec![3], 0), (vec![0], 7)];
    let dataset = Dataset::from_pairs_lossy(pairs, 5);

    assert_eq!(dataset.len(), 2);
}

#[test]
fn empty_sequences_are_valid_samples() {
    let dataset = Dataset::from_pairs(vec![(vec![], 0), (vec![1], 1)], 5).unwrap();
    assert_eq!(dataset.len(), 2);
}

#[test]
fn loss_decreases_over_epochs_for_both_cells() {
    for cell in [CellKind::Simple, CellKind::Lstm] {
        let mut config = toy_config(6);
        config.cell = cell;
        config.max_seq_len = 5;

        let dataset = Dataset::from_pairs(synthetic_pairs(), 6).unwrap();
        let mut model = SentimentRnn::new(config).unwrap();
        let history = model.train(&dataset).unwrap();

        let losses: Vec<f32> = history.epochs.iter().map(|m| m.loss).collect();
        assert_eq!(losses.len(), 30);

        for pair in losses.windows(2) {
            assert!(
                pair[1] <= pair[0] + 5e-3,
                "loss rose from {} to {}",
                pair[0],
                pair[1]
            );
        }
        assert!(
            losses[losses.len() - 1] + 0.1 < losses[0],
            "loss failed to decrease: first {}, last {}",
            losses[0],
            losses[losses.len() - 1]
        );
    }
}

#[test]
fn fixed_seed_reproduces_the_run_exactly() {
    let run = || -> TrainingHistory {
        let dataset = Dataset::from_pairs(synthetic_pairs(), 6).unwrap();
        let mut model = SentimentRnn::new(toy_config(6)).unwrap();
        model.train(&dataset).unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn two_review_dataset_trains_end_to_end() {
    // pad=0, the=1, cat=2, sat=3, on=4, mat=5, dog=6, ate=7, my=8, homework=9
    let pairs = vec![
        (vec![1, 2, 3, 4, 1, 5], 1), // "the cat sat on the mat"
        (vec![1, 6, 7, 8, 9], 0),    // "the dog ate my homework"
    ];
    let dataset = Dataset::from_pairs(pairs, 10).unwrap();

    let mut model = SentimentRnn::new(toy_config(10)).unwrap();
    let history = model.train(&dataset).unwrap();

    assert_eq!(history.len(), 30);
    assert!(model.predict(&[1, 2, 3, 4, 1, 5]) > 0.5);
    assert!(model.predict(&[1, 6, 7, 8, 9]) < 0.5);
}

#[test]
fn predict_handles_any_input_length() {
    let mut model = SentimentRnn::new(toy_config(10)).unwrap();

    let long: Vec<usize> = (0..40).map(|i| i % 10).collect();
    for ids in [&[][..], &[1][..], &long[..]] {
        let p = model.predict(ids);
        assert!((0.0..=1.0).contains(&p), "probability {} out of range", p);
    }
}

#[test]
fn validation_split_produces_val_metrics() {
    let mut config = toy_config(6);
    config.validation_split = 0.25;
    config.epochs = 2;

    let dataset = Dataset::from_pairs(synthetic_pairs(), 6).unwrap();
    let mut model = SentimentRnn::new(config).unwrap();
    let history = model.train(&dataset).unwrap();

    let last = history.last().unwrap();
    assert!(last.val_loss.is_some());
    assert!(last.val_accuracy.is_some());
    assert!(last.val_loss.unwrap().is_finite());
    assert!(last.val_accuracy.unwrap().is_finite());

    // Without a split the validation fields stay empty
    let mut config = toy_config(6);
    config.epochs = 2;
    let mut model = SentimentRnn::new(config).unwrap();
    let history = model.train(&dataset).unwrap();
    assert!(history.last().unwrap().val_loss.is_none());
}

#[test]
fn split_leaving_no_training_data_is_an_error() {
    let dataset = Dataset::from_pairs(vec![(vec![1], 1)], 6).unwrap();

    let mut config = toy_config(6);
    config.validation_split = 0.9;
    let mut model = SentimentRnn::new(config).unwrap();

    assert!(matches!(
        model.train(&dataset),
        Err(ModelError::InvalidConfig(_))
    ));
}

#[test]
fn poisoned_weights_surface_numeric_instability() {
    let pairs = vec![(vec![1, 2, 3], 1), (vec![3, 2, 1], 0)];
    let dataset = Dataset::from_pairs(pairs, 10).unwrap();

    let mut model = SentimentRnn::new(toy_config(10)).unwrap();
    model.embeddings.weight[[1, 0]] = f32::NAN;

    let err = model.train(&dataset).unwrap_err();
    assert!(matches!(err, ModelError::NumericInstability { epoch: 1, .. }));
}

#[test]
fn evaluation_surfaces_numeric_instability() {
    let pairs = vec![(vec![1, 2, 3], 1), (vec![3, 2, 1], 0)];
    let dataset = Dataset::from_pairs(pairs, 10).unwrap();

    let mut model = SentimentRnn::new(toy_config(10)).unwrap();
    model.embeddings.weight[[1, 0]] = f32::NAN;

    let err = model.evaluate(&dataset).unwrap_err();
    assert_eq!(err, ModelError::NumericInstability { epoch: 0, batch: 0 });
}

#[test]
fn evaluate_scores_a_dataset_without_training() {
    let dataset = Dataset::from_pairs(synthetic_pairs(), 6).unwrap();
    let mut model = SentimentRnn::new(toy_config(6)).unwrap();

    let (loss, accuracy) = model.evaluate(&dataset).unwrap();
    assert!(loss.is_finite());
    assert!((0.0..=1.0).contains(&accuracy));
}

#[test]
fn stacked_model_describes_itself_and_trains() {
    let mut config = toy_config(6);
    config.num_layers = 2;
    config.epochs = 3;

    let dataset = Dataset::from_pairs(synthetic_pairs(), 6).unwrap();
    let mut model = SentimentRnn::new(config).unwrap();

    assert_eq!(
        model.network_description(),
        "Embeddings(6x8) -> LSTM(8) -> LSTM(8) -> Dense(8 -> 1, sigmoid)"
    );
    // embeddings + two gated layers + head
    let expected = 6 * 8 + 2 * 4 * (8 * 8 + 8 * 8 + 8) + (8 + 1);
    assert_eq!(model.total_parameters(), expected);

    let history = model.train(&dataset).unwrap();
    assert_eq!(history.len(), 3);
}

#[test]
fn history_serializes_for_external_plotting() {
    let mut config = toy_config(6);
    config.epochs = 2;
    config.validation_split = 0.25;

    let dataset = Dataset::from_pairs(synthetic_pairs(), 6).unwrap();
    let mut model = SentimentRnn::new(config).unwrap();
    let history = model.train(&dataset).unwrap();

    let json = history.to_json_pretty().unwrap();
    assert!(json.contains("\"val_loss\""));

    let parsed: TrainingHistory = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, history);
}

#[test]
fn vocab_reserves_pad_and_unk() {
    let vocab = Vocab::from_corpus(&["The cat SAT.", "the mat"]);

    assert_eq!(vocab.id("<pad>"), Some(PAD_ID));
    assert_eq!(vocab.id("<unk>"), Some(UNK_ID));
    assert_eq!(vocab.word(PAD_ID), Some("<pad>"));

    let encoded = vocab.encode("the zebra");
    assert_eq!(encoded, vec![vocab.id("the").unwrap(), UNK_ID]);
}
