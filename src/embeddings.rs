use std::collections::BTreeSet;

use ndarray::{s, Array2, Array3, ArrayView1};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::adam::Adam;

/// Embedding table: one dense row per token id.
///
/// The table is mutated only by gradient updates; `lookup` and `forward`
/// are pure reads. An id outside the table is a programmer error, not a
/// recoverable fault, and panics.
pub struct Embeddings {
    pub weight: Array2<f32>,

    cached_ids: Option<Array2<usize>>,

    optimizer: Adam,
}

impl Embeddings {
    /// Initialize the table with random rows, std = sqrt(1 / embedding_dim).
    pub fn new(vocab_size: usize, embedding_dim: usize, rng: &mut StdRng) -> Self {
        let std = (1.0 / embedding_dim as f32).sqrt();
        let normal = Normal::new(0.0, std).unwrap();

        Embeddings {
            weight: Array2::from_shape_fn((vocab_size, embedding_dim), |_| normal.sample(rng)),
            cached_ids: None,
            optimizer: Adam::new((vocab_size, embedding_dim)),
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.weight.shape()[0]
    }

    pub fn embedding_dim(&self) -> usize {
        self.weight.shape()[1]
    }

    /// Row read for one id. Same id, same vector, for a fixed snapshot.
    pub fn lookup(&self, id: usize) -> ArrayView1<f32> {
        assert!(
            id < self.vocab_size(),
            "token id {} out of range for vocabulary of {}",
            id,
            self.vocab_size()
        );
        self.weight.row(id)
    }

    /// Maps a `[batch, seq]` id matrix to `[batch, seq, embedding_dim]`,
    /// caching the ids for the backward pass.
    pub fn forward(&mut self, ids: &Array2<usize>) -> Array3<f32> {
        let (batch_size, seq_len) = ids.dim();
        let mut output = Array3::zeros((batch_size, seq_len, self.embedding_dim()));

        for b in 0..batch_size {
            for t in 0..seq_len {
                output.slice_mut(s![b, t, ..]).assign(&self.lookup(ids[[b, t]]));
            }
        }

        self.cached_ids = Some(ids.clone());
        output
    }

    /// Sparse update: gradient rows accumulate for exactly the ids referenced
    /// in the cached batch, and the Adam step touches only those rows.
    pub fn backward(&mut self, grads: &Array3<f32>, lr: f32) {
        let ids = self.cached_ids.as_ref().expect("forward must be run first");
        let (batch_size, seq_len) = ids.dim();

        let mut grad_rows = Array2::<f32>::zeros(self.weight.raw_dim());
        let mut touched = BTreeSet::new();

        for b in 0..batch_size {
            for t in 0..seq_len {
                let id = ids[[b, t]];
                let mut row = grad_rows.row_mut(id);
                row += &grads.slice(s![b, t, ..]);
                touched.insert(id);
            }
        }

        let rows: Vec<usize> = touched.into_iter().collect();
        self.optimizer.step_rows(&mut self.weight, &grad_rows, &rows, lr);
    }

    pub fn parameters(&self) -> usize {
        self.weight.len()
    }
}
