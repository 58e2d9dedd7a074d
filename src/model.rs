use ndarray::{Array1, Array2, Array3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::config::{CellKind, RnnConfig};
use crate::dataset::{Dataset, Sample};
use crate::dense::Dense;
use crate::embeddings::Embeddings;
use crate::error::{ModelError, Result};
use crate::loss;
use crate::lstm::Lstm;
use crate::metrics::{EpochMetrics, TrainingHistory};
use crate::simple_rnn::SimpleRnn;
use crate::vectorizer::Vectorizer;

/// Contract shared by the recurrent layers: forward caches whatever the
/// backward pass needs, backward consumes the cache, steps the layer's
/// optimizers and hands the gradient to the previous stage.
pub trait Layer {
    fn layer_type(&self) -> &str;

    fn forward(&mut self, input: &Array3<f32>) -> Array3<f32>;

    fn backward(&mut self, grads: &Array3<f32>, lr: f32) -> Array3<f32>;

    fn parameters(&self) -> usize;
}

/// One stage of the recurrent stack. The stack is a plain ordered pipeline
/// over this enum, not a list of boxed trait objects.
pub enum RecurrentLayer {
    Simple(SimpleRnn),
    Gated(Lstm),
}

impl Layer for RecurrentLayer {
    fn layer_type(&self) -> &str {
        match self {
            RecurrentLayer::Simple(layer) => layer.layer_type(),
            RecurrentLayer::Gated(layer) => layer.layer_type(),
        }
    }

    fn forward(&mut self, input: &Array3<f32>) -> Array3<f32> {
        match self {
            RecurrentLayer::Simple(layer) => layer.forward(input),
            RecurrentLayer::Gated(layer) => layer.forward(input),
        }
    }

    fn backward(&mut self, grads: &Array3<f32>, lr: f32) -> Array3<f32> {
        match self {
            RecurrentLayer::Simple(layer) => layer.backward(grads, lr),
            RecurrentLayer::Gated(layer) => layer.backward(grads, lr),
        }
    }

    fn parameters(&self) -> usize {
        match self {
            RecurrentLayer::Simple(layer) => layer.parameters(),
            RecurrentLayer::Gated(layer) => layer.parameters(),
        }
    }
}

/// The full pipeline: vectorize -> embed -> recurrent stack -> sigmoid head.
///
/// All parameters live in this value; training mutates them in place and
/// nothing is shared across instances.
pub struct SentimentRnn {
    config: RnnConfig,
    vectorizer: Vectorizer,
    pub embeddings: Embeddings,
    pub stack: Vec<RecurrentLayer>,
    pub head: Dense,
    rng: StdRng,
}

impl SentimentRnn {
    /// Validates the config and builds the pipeline with seeded weights.
    pub fn new(config: RnnConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let embeddings = Embeddings::new(config.vocab_size, config.embedding_dim, &mut rng);

        let mut stack = Vec::with_capacity(config.num_layers);
        for index in 0..config.num_layers {
            let input_dim = if index == 0 {
                config.embedding_dim
            } else {
                config.hidden_units
            };
            // Inner layers feed their full sequence onward; only the last
            // layer hands a single final state to the head
            let return_sequences = index + 1 < config.num_layers;
            stack.push(match config.cell {
                CellKind::Simple => RecurrentLayer::Simple(SimpleRnn::new(
                    input_dim,
                    config.hidden_units,
                    return_sequences,
                    &mut rng,
                )),
                CellKind::Lstm => RecurrentLayer::Gated(Lstm::new(
                    input_dim,
                    config.hidden_units,
                    return_sequences,
                    &mut rng,
                )),
            });
        }

        let head = Dense::new(config.hidden_units, &mut rng);

        Ok(SentimentRnn {
            vectorizer: Vectorizer::new(config.max_seq_len),
            embeddings,
            stack,
            head,
            rng,
            config,
        })
    }

    pub fn config(&self) -> &RnnConfig {
        &self.config
    }

    pub fn network_description(&self) -> String {
        let mut parts = vec![format!(
            "Embeddings({}x{})",
            self.config.vocab_size, self.config.embedding_dim
        )];
        for layer in &self.stack {
            parts.push(format!("{}({})", layer.layer_type(), self.config.hidden_units));
        }
        parts.push(format!(
            "{}({} -> 1, sigmoid)",
            self.head.layer_type(),
            self.config.hidden_units
        ));
        parts.join(" -> ")
    }

    pub fn total_parameters(&self) -> usize {
        self.embeddings.parameters()
            + self.stack.iter().map(|layer| layer.parameters()).sum::<usize>()
            + self.head.parameters()
    }

    /// Forward pass over an already vectorized `[batch, max_seq_len]` id
    /// matrix. Returns one probability per row.
    pub fn forward_batch(&mut self, ids: &Array2<usize>) -> Array1<f32> {
        let mut activations = self.embeddings.forward(ids);
        for layer in self.stack.iter_mut() {
            activations = layer.forward(&activations);
        }
        self.head.forward(&activations)
    }

    fn backward_batch(&mut self, grad_logits: &Array1<f32>) {
        let lr = self.config.learning_rate;
        let mut grads = self.head.backward(grad_logits, lr);
        for layer in self.stack.iter_mut().rev() {
            grads = layer.backward(&grads, lr);
        }
        self.embeddings.backward(&grads, lr);
    }

    /// Classifies one raw id sequence of any length.
    pub fn predict(&mut self, ids: &[usize]) -> f32 {
        let batch = self.vectorizer.vectorize_batch(&[ids]);
        self.forward_batch(&batch)[0]
    }

    /// Runs the configured number of epochs over the dataset.
    ///
    /// The dataset is shuffled and split once up front (seeded, so a fixed
    /// seed reproduces the run); each epoch reshuffles the training indices,
    /// walks fixed-size batches, and updates every parameter in place after
    /// each batch. A non-finite loss or probability, on a training batch or
    /// during the validation pass, aborts with
    /// [`ModelError::NumericInstability`].
    pub fn train(&mut self, dataset: &Dataset) -> Result<TrainingHistory> {
        let mut split_rng = StdRng::seed_from_u64(self.config.seed);
        let (train_set, val_set) = dataset.split(self.config.validation_split, &mut split_rng);

        if train_set.is_empty() {
            return Err(ModelError::InvalidConfig(
                "validation split leaves no training samples".to_string(),
            ));
        }

        let mut history = TrainingHistory::new();
        let mut indices: Vec<usize> = (0..train_set.len()).collect();

        for epoch in 1..=self.config.epochs {
            indices.shuffle(&mut self.rng);

            let mut loss_sum = 0.0;
            let mut correct = 0.0;

            for (batch_index, batch) in indices.chunks(self.config.batch_size).enumerate() {
                let (ids, labels) = self.assemble(train_set.samples(), batch);
                let probs = self.forward_batch(&ids);

                let batch_loss = loss::batch_loss(&probs, &labels);
                Self::check_finite(batch_loss, &probs, epoch, batch_index)?;

                loss_sum += batch_loss * batch.len() as f32;
                correct += loss::binary_accuracy(&probs, &labels) * batch.len() as f32;

                let grad_logits = loss::logit_grad(&probs, &labels);
                self.backward_batch(&grad_logits);
            }

            let train_loss = loss_sum / train_set.len() as f32;
            let train_accuracy = correct / train_set.len() as f32;

            let (val_loss, val_accuracy) = if val_set.is_empty() {
                (None, None)
            } else {
                let (loss, accuracy) = self.evaluate_at(&val_set, epoch)?;
                (Some(loss), Some(accuracy))
            };

            info!(
                epoch,
                loss = train_loss,
                accuracy = train_accuracy,
                val_loss,
                val_accuracy,
                "epoch complete"
            );

            history.record(EpochMetrics {
                epoch,
                loss: train_loss,
                accuracy: train_accuracy,
                val_loss,
                val_accuracy,
            });
        }

        Ok(history)
    }

    /// Forward-only pass over a dataset. Returns `(mean loss, accuracy)`.
    ///
    /// A non-finite loss or probability fails with
    /// [`ModelError::NumericInstability`], reported at epoch 0 when no epoch
    /// is running.
    pub fn evaluate(&mut self, dataset: &Dataset) -> Result<(f32, f32)> {
        self.evaluate_at(dataset, 0)
    }

    fn evaluate_at(&mut self, dataset: &Dataset, epoch: usize) -> Result<(f32, f32)> {
        if dataset.is_empty() {
            return Ok((0.0, 0.0));
        }

        let indices: Vec<usize> = (0..dataset.len()).collect();
        let mut loss_sum = 0.0;
        let mut correct = 0.0;

        for (batch_index, batch) in indices.chunks(self.config.batch_size).enumerate() {
            let (ids, labels) = self.assemble(dataset.samples(), batch);
            let probs = self.forward_batch(&ids);

            let batch_loss = loss::batch_loss(&probs, &labels);
            Self::check_finite(batch_loss, &probs, epoch, batch_index)?;

            loss_sum += batch_loss * batch.len() as f32;
            correct += loss::binary_accuracy(&probs, &labels) * batch.len() as f32;
        }

        Ok((
            loss_sum / dataset.len() as f32,
            correct / dataset.len() as f32,
        ))
    }

    fn check_finite(batch_loss: f32, probs: &Array1<f32>, epoch: usize, batch: usize) -> Result<()> {
        if !batch_loss.is_finite() || probs.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::NumericInstability { epoch, batch });
        }
        Ok(())
    }

    fn assemble(&self, samples: &[Sample], indices: &[usize]) -> (Array2<usize>, Array1<f32>) {
        let sequences: Vec<&[usize]> = indices
            .iter()
            .map(|&index| samples[index].ids.as_slice())
            .collect();
        let ids = self.vectorizer.vectorize_batch(&sequences);
        let labels = Array1::from_iter(indices.iter().map(|&index| samples[index].label as f32));
        (ids, labels)
    }
}
