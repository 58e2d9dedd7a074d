use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::{BATCH_SIZE, EMBEDDING_DIM, HIDDEN_DIM, MAX_SEQ_LEN, VOCAB_SIZE};

/// Which recurrent cell the stack is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    /// Plain tanh recurrence.
    Simple,
    /// Gated memory cell with forget/input/output gates.
    Lstm,
}

/// Every knob of the model and training loop, with no hidden defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnnConfig {
    /// Number of distinct token ids, including the reserved pad id 0.
    pub vocab_size: usize,
    /// Fixed sequence length after padding/truncation.
    pub max_seq_len: usize,
    /// Width of one embedding row.
    pub embedding_dim: usize,
    /// Hidden-state width of every recurrent layer.
    pub hidden_units: usize,
    /// How many recurrent layers are stacked.
    pub num_layers: usize,
    /// Cell variant used for every layer of the stack.
    pub cell: CellKind,
    /// Adam learning rate.
    pub learning_rate: f32,
    /// Samples per parameter update.
    pub batch_size: usize,
    /// Full passes over the training split.
    pub epochs: usize,
    /// Fraction of the dataset held out for validation, in [0, 1).
    pub validation_split: f32,
    /// Seed driving initialization, the split and epoch shuffling.
    pub seed: u64,
}

impl Default for RnnConfig {
    fn default() -> Self {
        RnnConfig {
            vocab_size: VOCAB_SIZE,
            max_seq_len: MAX_SEQ_LEN,
            embedding_dim: EMBEDDING_DIM,
            hidden_units: HIDDEN_DIM,
            num_layers: 1,
            cell: CellKind::Lstm,
            learning_rate: 0.001,
            batch_size: BATCH_SIZE,
            epochs: 10,
            validation_split: 0.2,
            seed: 42,
        }
    }
}

impl RnnConfig {
    /// Every check is fatal: a model is never built from a bad config.
    pub fn validate(&self) -> Result<()> {
        if self.vocab_size < 2 {
            return Err(ModelError::InvalidConfig(format!(
                "vocab_size must cover the pad id and at least one real token, got {}",
                self.vocab_size
            )));
        }
        if self.max_seq_len == 0 {
            return Err(ModelError::InvalidConfig(
                "max_seq_len must be at least 1".to_string(),
            ));
        }
        if self.embedding_dim == 0 {
            return Err(ModelError::InvalidConfig(
                "embedding_dim must be at least 1".to_string(),
            ));
        }
        if self.hidden_units == 0 {
            return Err(ModelError::InvalidConfig(
                "hidden_units must be at least 1".to_string(),
            ));
        }
        if self.num_layers == 0 {
            return Err(ModelError::InvalidConfig(
                "num_layers must be at least 1".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ModelError::InvalidConfig(format!(
                "learning_rate must be a finite positive number, got {}",
                self.learning_rate
            )));
        }
        if self.batch_size == 0 {
            return Err(ModelError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.epochs == 0 {
            return Err(ModelError::InvalidConfig(
                "epochs must be at least 1".to_string(),
            ));
        }
        if !self.validation_split.is_finite()
            || !(0.0..1.0).contains(&self.validation_split)
        {
            return Err(ModelError::InvalidConfig(format!(
                "validation_split must lie in [0, 1), got {}",
                self.validation_split
            )));
        }
        Ok(())
    }
}
