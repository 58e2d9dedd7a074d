use serde::{Deserialize, Serialize};

/// One epoch's scores. Training numbers are running means over the epoch's
/// batches; validation numbers come from a forward-only pass and are absent
/// when no validation split was configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
    pub val_loss: Option<f32>,
    pub val_accuracy: Option<f32>,
}

/// The full per-epoch record of one training run, in epoch order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        TrainingHistory { epochs: Vec::new() }
    }

    pub fn record(&mut self, metrics: EpochMetrics) {
        self.epochs.push(metrics);
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Renders the record for external plotting/reporting tools.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
