use ndarray::Array2;

use crate::PAD_ID;

/// Maps variable-length id sequences onto a fixed window of `maxlen` ids.
///
/// Longer sequences keep only their last `maxlen` ids; shorter ones are
/// left-padded with the reserved pad id, so the real tokens always sit
/// right-aligned next to the classifier's final timestep.
pub struct Vectorizer {
    maxlen: usize,
}

impl Vectorizer {
    pub fn new(maxlen: usize) -> Self {
        assert!(maxlen > 0, "maxlen must be at least 1");
        Vectorizer { maxlen }
    }

    pub fn maxlen(&self) -> usize {
        self.maxlen
    }

    /// Deterministic; never fails. An empty input yields all pad ids.
    pub fn vectorize(&self, ids: &[usize]) -> Vec<usize> {
        if ids.len() >= self.maxlen {
            ids[ids.len() - self.maxlen..].to_vec()
        } else {
            let mut out = vec![PAD_ID; self.maxlen - ids.len()];
            out.extend_from_slice(ids);
            out
        }
    }

    /// Stacks a batch of raw sequences into a `[batch, maxlen]` id matrix.
    pub fn vectorize_batch(&self, sequences: &[&[usize]]) -> Array2<usize> {
        let mut out = Array2::zeros((sequences.len(), self.maxlen));
        for (row, ids) in sequences.iter().enumerate() {
            for (col, &id) in self.vectorize(ids).iter().enumerate() {
                out[[row, col]] = id;
            }
        }
        out
    }
}
