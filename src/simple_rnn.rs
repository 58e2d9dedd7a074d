use itertools::izip;
use ndarray::{s, Array1, Array2, Array3, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::adam::Adam;
use crate::model::Layer;

/// Plain tanh recurrence: `h_t = tanh(x_t·W_xh + h_{t-1}·W_hh + b)`.
///
/// `W_hh` is neither clipped nor normalized, so the hidden state (and the
/// gradient flowing back through it) shrinks or grows geometrically with
/// sequence length. That behavior is part of this cell's contract.
pub struct SimpleRnn {
    pub w_xh: Array2<f32>,
    pub w_hh: Array2<f32>,
    pub b: Array2<f32>,

    hidden_units: usize,
    return_sequences: bool,

    // Cached values for backward pass
    cached_input: Option<Array3<f32>>,
    cached_hidden: Option<Array3<f32>>,

    optimizer_w_xh: Adam,
    optimizer_w_hh: Adam,
    optimizer_b: Adam,
}

impl SimpleRnn {
    /// Initialize with random weights. When `return_sequences` is false the
    /// layer emits only the final hidden state.
    pub fn new(
        input_dim: usize,
        hidden_units: usize,
        return_sequences: bool,
        rng: &mut StdRng,
    ) -> Self {
        // Xavier/He initialization: std = sqrt(2 / fan_in)
        let std_xh = (2.0 / input_dim as f32).sqrt();
        let normal_xh = Normal::new(0.0, std_xh).unwrap();
        let std_hh = (2.0 / hidden_units as f32).sqrt();
        let normal_hh = Normal::new(0.0, std_hh).unwrap();

        SimpleRnn {
            w_xh: Array2::from_shape_fn((input_dim, hidden_units), |_| normal_xh.sample(rng)),
            w_hh: Array2::from_shape_fn((hidden_units, hidden_units), |_| normal_hh.sample(rng)),
            b: Array2::zeros((1, hidden_units)),
            hidden_units,
            return_sequences,
            cached_input: None,
            cached_hidden: None,
            optimizer_w_xh: Adam::new((input_dim, hidden_units)),
            optimizer_w_hh: Adam::new((hidden_units, hidden_units)),
            optimizer_b: Adam::new((1, hidden_units)),
        }
    }

    pub fn return_sequences(&self) -> bool {
        self.return_sequences
    }

    /// One timestep of the recurrence.
    pub fn step(&self, x: ArrayView1<f32>, h_prev: ArrayView1<f32>) -> Array1<f32> {
        let mut pre = x.dot(&self.w_xh);
        pre += &h_prev.dot(&self.w_hh);
        pre += &self.b.row(0);
        pre.mapv_into(f32::tanh)
    }
}

impl Layer for SimpleRnn {
    fn layer_type(&self) -> &str {
        "SimpleRNN"
    }

    /// Forward pass over `[batch, seq_len, input_dim]`. Hidden states start
    /// at zero for every sample; the full state sequence is cached.
    fn forward(&mut self, input: &Array3<f32>) -> Array3<f32> {
        let (batch_size, seq_len, _) = input.dim();

        // hidden[:, 0, :] stays zero: that is h_0
        let mut hidden = Array3::<f32>::zeros((batch_size, seq_len + 1, self.hidden_units));

        for (b, sample) in input.outer_iter().enumerate() {
            for t in 0..seq_len {
                let h_prev = hidden.slice(s![b, t, ..]).to_owned();
                let h_t = self.step(sample.row(t), h_prev.view());
                hidden.slice_mut(s![b, t + 1, ..]).assign(&h_t);
            }
        }

        let output = if self.return_sequences {
            hidden.slice(s![.., 1.., ..]).to_owned()
        } else {
            hidden.slice(s![.., seq_len..seq_len + 1, ..]).to_owned()
        };

        self.cached_input = Some(input.clone());
        self.cached_hidden = Some(hidden);

        output
    }

    /// Backpropagation through time. Walks t = T..1 carrying `dh`, and sums
    /// every timestep's contribution into the shared weight gradients before
    /// the optimizers step once per matrix.
    fn backward(&mut self, grads: &Array3<f32>, lr: f32) -> Array3<f32> {
        let input = self.cached_input.as_ref().expect("forward must be run first");
        let hidden = self.cached_hidden.as_ref().unwrap();
        let (_, seq_len, _) = input.dim();

        let mut grad_input = Array3::<f32>::zeros(input.raw_dim());
        let mut grad_w_xh = Array2::<f32>::zeros(self.w_xh.raw_dim());
        let mut grad_w_hh = Array2::<f32>::zeros(self.w_hh.raw_dim());
        let mut grad_b = Array2::<f32>::zeros(self.b.raw_dim());

        for (i, (sample, grad_sample)) in
            izip!(input.outer_iter(), grads.outer_iter()).enumerate()
        {
            // Pre-activation gradients per timestep, filled in reverse
            let mut d_pre_all = Array2::<f32>::zeros((seq_len, self.hidden_units));
            let mut dh_next = Array1::<f32>::zeros(self.hidden_units);

            for t in (0..seq_len).rev() {
                let mut dh = dh_next;
                if self.return_sequences {
                    dh += &grad_sample.row(t);
                } else if t == seq_len - 1 {
                    dh += &grad_sample.row(0);
                }

                // d/dpre of tanh is 1 - h^2
                let h_t = hidden.slice(s![i, t + 1, ..]);
                let d_pre = &dh * &h_t.mapv(|h| 1.0 - h * h);

                dh_next = d_pre.dot(&self.w_hh.t());
                d_pre_all.row_mut(t).assign(&d_pre);
            }

            // Rows h_0..h_{T-1}: the state each timestep recurred from
            let h_prev_all = hidden.slice(s![i, ..seq_len, ..]);

            grad_w_xh += &sample.t().dot(&d_pre_all);
            grad_w_hh += &h_prev_all.t().dot(&d_pre_all);
            grad_b += &d_pre_all.sum_axis(Axis(0)).insert_axis(Axis(0));
            grad_input
                .slice_mut(s![i, .., ..])
                .assign(&d_pre_all.dot(&self.w_xh.t()));
        }

        self.optimizer_w_xh.step(&mut self.w_xh, &grad_w_xh, lr);
        self.optimizer_w_hh.step(&mut self.w_hh, &grad_w_hh, lr);
        self.optimizer_b.step(&mut self.b, &grad_b, lr);

        grad_input
    }

    fn parameters(&self) -> usize {
        self.w_xh.len() + self.w_hh.len() + self.b.len()
    }
}
