use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::warn;

use crate::error::{ModelError, Result};

/// One labeled sequence: pre-tokenized ids plus a binary label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub ids: Vec<usize>,
    pub label: u8,
}

/// In-memory labeled dataset with a declared vocabulary cap.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    /// Strict ingestion: the first malformed sample aborts the whole load.
    ///
    /// A sample is malformed when any id falls outside `[0, vocab_size)` or
    /// the label is not 0 or 1. Empty id sequences are valid; they vectorize
    /// to all pad ids.
    pub fn from_pairs(pairs: Vec<(Vec<usize>, u8)>, vocab_size: usize) -> Result<Self> {
        let mut samples = Vec::with_capacity(pairs.len());
        for (index, (ids, label)) in pairs.into_iter().enumerate() {
            check_sample(index, &ids, label, vocab_size)?;
            samples.push(Sample { ids, label });
        }
        Ok(Dataset { samples })
    }

    /// Skip policy: malformed samples are dropped with a warning naming the
    /// sample and the reason, and the rest of the load continues.
    pub fn from_pairs_lossy(pairs: Vec<(Vec<usize>, u8)>, vocab_size: usize) -> Self {
        let mut samples = Vec::with_capacity(pairs.len());
        for (index, (ids, label)) in pairs.into_iter().enumerate() {
            match check_sample(index, &ids, label, vocab_size) {
                Ok(()) => samples.push(Sample { ids, label }),
                Err(err) => warn!(%err, "skipping malformed sample"),
            }
        }
        Dataset { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Shuffles with the given rng, then splits off the trailing `fraction`
    /// as the validation set. Returns `(train, validation)`.
    pub fn split(&self, fraction: f32, rng: &mut StdRng) -> (Dataset, Dataset) {
        let mut shuffled = self.samples.clone();
        shuffled.shuffle(rng);

        let val_len = ((shuffled.len() as f32 * fraction).round() as usize).min(shuffled.len());
        let train_len = shuffled.len() - val_len;
        let validation = shuffled.split_off(train_len);

        (
            Dataset { samples: shuffled },
            Dataset { samples: validation },
        )
    }
}

fn check_sample(index: usize, ids: &[usize], label: u8, vocab_size: usize) -> Result<()> {
    if label > 1 {
        return Err(ModelError::InvalidSample {
            index,
            reason: format!("label {} not in {{0, 1}}", label),
        });
    }
    if let Some(&id) = ids.iter().find(|&&id| id >= vocab_size) {
        return Err(ModelError::InvalidSample {
            index,
            reason: format!("token id {} out of range for vocabulary of {}", id, vocab_size),
        });
    }
    Ok(())
}
