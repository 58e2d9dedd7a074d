use ndarray::{Array1, Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::adam::Adam;

/// Sigmoid readout from the final hidden state:
/// `p = sigmoid(h · w_out + b_out)`, one probability per sample.
pub struct Dense {
    pub w_out: Array2<f32>, // [hidden_units, 1]
    pub b_out: Array2<f32>, // [1, 1]

    cached_input: Option<Array3<f32>>,

    optimizer: Adam,
}

impl Dense {
    /// Initialize the readout with random weights and zero bias.
    pub fn new(hidden_units: usize, rng: &mut StdRng) -> Self {
        // Xavier/He initialization: std = sqrt(2 / fan_in)
        let std = (2.0 / hidden_units as f32).sqrt();
        let normal = Normal::new(0.0, std).unwrap();

        Dense {
            w_out: Array2::from_shape_fn((hidden_units, 1), |_| normal.sample(rng)),
            b_out: Array2::zeros((1, 1)),
            cached_input: None,
            optimizer: Adam::new((hidden_units, 1)),
        }
    }

    pub fn layer_type(&self) -> &str {
        "Dense"
    }

    /// Forward pass over the stack's final states `[batch, 1, hidden_units]`.
    /// Returns one probability in (0, 1) per sample.
    pub fn forward(&mut self, input: &Array3<f32>) -> Array1<f32> {
        self.cached_input = Some(input.clone());

        let flat = input.index_axis(Axis(1), 0);
        let logits = flat.dot(&self.w_out) + &self.b_out;

        logits.column(0).mapv(sigmoid)
    }

    /// Backward pass from the fused loss gradient w.r.t. the logit
    /// (`loss::logit_grad`). Returns grad w.r.t. the input states.
    pub fn backward(&mut self, grad_logits: &Array1<f32>, lr: f32) -> Array3<f32> {
        let input = self.cached_input.as_ref().expect("forward must be run first");
        let flat = input.index_axis(Axis(1), 0);

        let grad_col = grad_logits.view().insert_axis(Axis(1));
        let grad_w_out = flat.t().dot(&grad_col);
        let grad_b_out = Array2::from_elem((1, 1), grad_logits.sum());

        let grad_input = grad_col.dot(&self.w_out.t()).insert_axis(Axis(1));

        self.optimizer.step(&mut self.w_out, &grad_w_out, lr);
        self.b_out -= &(lr * &grad_b_out);

        grad_input
    }

    pub fn parameters(&self) -> usize {
        self.w_out.len() + self.b_out.len()
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}
