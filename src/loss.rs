use ndarray::Array1;

/// Probabilities are clamped this far away from 0 and 1 before taking logs.
pub const PROB_EPSILON: f32 = 1e-7;

/// Binary cross-entropy for one sample: `-[y*ln(p) + (1-y)*ln(1-p)]`.
pub fn binary_cross_entropy(p: f32, y: f32) -> f32 {
    let p = p.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
    -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
}

/// Mean binary cross-entropy over a batch.
pub fn batch_loss(probs: &Array1<f32>, labels: &Array1<f32>) -> f32 {
    let n = probs.len().max(1) as f32;
    probs
        .iter()
        .zip(labels.iter())
        .map(|(&p, &y)| binary_cross_entropy(p, y))
        .sum::<f32>()
        / n
}

/// Gradient of the mean BCE w.r.t. the pre-sigmoid logit.
///
/// Differentiating BCE through the sigmoid collapses to `p - y`, so the head
/// is fed this directly instead of a `dL/dp` that would divide by `p(1-p)`.
/// The `1/batch` factor of the mean is applied here and nowhere else.
pub fn logit_grad(probs: &Array1<f32>, labels: &Array1<f32>) -> Array1<f32> {
    let n = probs.len().max(1) as f32;
    (probs - labels) / n
}

/// Fraction of samples on the correct side of the 0.5 threshold.
pub fn binary_accuracy(probs: &Array1<f32>, labels: &Array1<f32>) -> f32 {
    if probs.is_empty() {
        return 0.0;
    }
    let correct = probs
        .iter()
        .zip(labels.iter())
        .filter(|(&p, &y)| (p >= 0.5) == (y >= 0.5))
        .count();
    correct as f32 / probs.len() as f32
}
