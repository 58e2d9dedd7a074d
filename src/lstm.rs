use itertools::izip;
use ndarray::{s, Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::adam::Adam;
use crate::model::Layer;

/// Parameter triple of one gate: input weights, recurrent weights, bias.
pub struct Gate {
    pub w_x: Array2<f32>,
    pub w_h: Array2<f32>,
    pub b: Array2<f32>,

    optimizer_w_x: Adam,
    optimizer_w_h: Adam,
    optimizer_b: Adam,
}

impl Gate {
    fn new(input_dim: usize, hidden_units: usize, bias_init: f32, rng: &mut StdRng) -> Self {
        // Xavier/He initialization: std = sqrt(2 / fan_in)
        let std_x = (2.0 / input_dim as f32).sqrt();
        let normal_x = Normal::new(0.0, std_x).unwrap();
        let std_h = (2.0 / hidden_units as f32).sqrt();
        let normal_h = Normal::new(0.0, std_h).unwrap();

        Gate {
            w_x: Array2::from_shape_fn((input_dim, hidden_units), |_| normal_x.sample(rng)),
            w_h: Array2::from_shape_fn((hidden_units, hidden_units), |_| normal_h.sample(rng)),
            b: Array2::from_elem((1, hidden_units), bias_init),
            optimizer_w_x: Adam::new((input_dim, hidden_units)),
            optimizer_w_h: Adam::new((hidden_units, hidden_units)),
            optimizer_b: Adam::new((1, hidden_units)),
        }
    }

    fn pre_activation(&self, x: ArrayView1<f32>, h_prev: ArrayView1<f32>) -> Array1<f32> {
        let mut pre = x.dot(&self.w_x);
        pre += &h_prev.dot(&self.w_h);
        pre += &self.b.row(0);
        pre
    }

    fn apply(&mut self, grads: &GateGrads, lr: f32) {
        self.optimizer_w_x.step(&mut self.w_x, &grads.w_x, lr);
        self.optimizer_w_h.step(&mut self.w_h, &grads.w_h, lr);
        self.optimizer_b.step(&mut self.b, &grads.b, lr);
    }

    fn parameters(&self) -> usize {
        self.w_x.len() + self.w_h.len() + self.b.len()
    }
}

/// Gradient accumulator matching a gate's parameter triple.
struct GateGrads {
    w_x: Array2<f32>,
    w_h: Array2<f32>,
    b: Array2<f32>,
}

impl GateGrads {
    fn like(gate: &Gate) -> Self {
        GateGrads {
            w_x: Array2::zeros(gate.w_x.raw_dim()),
            w_h: Array2::zeros(gate.w_h.raw_dim()),
            b: Array2::zeros(gate.b.raw_dim()),
        }
    }

    /// Adds one sample's contribution, summed over its timesteps.
    fn accumulate(&mut self, x: ArrayView2<f32>, h_prev: ArrayView2<f32>, d_pre: &Array2<f32>) {
        self.w_x += &x.t().dot(d_pre);
        self.w_h += &h_prev.t().dot(d_pre);
        self.b += &d_pre.sum_axis(Axis(0)).insert_axis(Axis(0));
    }
}

/// All activations of one timestep, returned by [`Lstm::step`].
pub struct LstmStep {
    pub forget: Array1<f32>,
    pub input: Array1<f32>,
    pub output: Array1<f32>,
    pub candidate: Array1<f32>,
    pub cell: Array1<f32>,
    pub hidden: Array1<f32>,
}

/// Gated memory cell.
///
/// Per timestep, from `x_t` and `h_{t-1}`: sigmoid gates f, i, o and a tanh
/// candidate, then `c_t = f ⊙ c_{t-1} + i ⊙ c~_t` and `h_t = o ⊙ tanh(c_t)`.
/// The cell state is carried additively, so a wide-open forget gate moves
/// memory (and, backwards, gradient) across many timesteps nearly unchanged.
pub struct Lstm {
    pub forget_gate: Gate,
    pub input_gate: Gate,
    pub output_gate: Gate,
    pub candidate: Gate,

    hidden_units: usize,
    return_sequences: bool,

    // Cached values for backward pass
    cached_input: Option<Array3<f32>>,
    cached_forget: Option<Array3<f32>>,
    cached_input_gate: Option<Array3<f32>>,
    cached_output_gate: Option<Array3<f32>>,
    cached_candidate: Option<Array3<f32>>,
    cached_cell: Option<Array3<f32>>,
    cached_hidden: Option<Array3<f32>>,
}

impl Lstm {
    pub fn new(
        input_dim: usize,
        hidden_units: usize,
        return_sequences: bool,
        rng: &mut StdRng,
    ) -> Self {
        Lstm {
            // Forget gate bias starts at 1.0 (unit forget bias); the carry
            // path is open from the first update.
            forget_gate: Gate::new(input_dim, hidden_units, 1.0, rng),
            input_gate: Gate::new(input_dim, hidden_units, 0.0, rng),
            output_gate: Gate::new(input_dim, hidden_units, 0.0, rng),
            candidate: Gate::new(input_dim, hidden_units, 0.0, rng),
            hidden_units,
            return_sequences,
            cached_input: None,
            cached_forget: None,
            cached_input_gate: None,
            cached_output_gate: None,
            cached_candidate: None,
            cached_cell: None,
            cached_hidden: None,
        }
    }

    pub fn return_sequences(&self) -> bool {
        self.return_sequences
    }

    /// One timestep from explicit previous states.
    pub fn step(
        &self,
        x: ArrayView1<f32>,
        h_prev: ArrayView1<f32>,
        c_prev: ArrayView1<f32>,
    ) -> LstmStep {
        let f = self.forget_gate.pre_activation(x, h_prev).mapv_into(sigmoid);
        let i = self.input_gate.pre_activation(x, h_prev).mapv_into(sigmoid);
        let o = self.output_gate.pre_activation(x, h_prev).mapv_into(sigmoid);
        let g = self.candidate.pre_activation(x, h_prev).mapv_into(f32::tanh);

        let cell = &f * &c_prev + &i * &g;
        let hidden = &o * &cell.mapv(f32::tanh);

        LstmStep {
            forget: f,
            input: i,
            output: o,
            candidate: g,
            cell,
            hidden,
        }
    }
}

impl Layer for Lstm {
    fn layer_type(&self) -> &str {
        "LSTM"
    }

    /// Forward pass over `[batch, seq_len, input_dim]`; h_0 = c_0 = 0 for
    /// every sample. All gate activations are cached for the backward pass.
    fn forward(&mut self, input: &Array3<f32>) -> Array3<f32> {
        let (batch_size, seq_len, _) = input.dim();
        let units = self.hidden_units;

        let mut forget = Array3::<f32>::zeros((batch_size, seq_len, units));
        let mut input_gate = Array3::<f32>::zeros((batch_size, seq_len, units));
        let mut output_gate = Array3::<f32>::zeros((batch_size, seq_len, units));
        let mut candidate = Array3::<f32>::zeros((batch_size, seq_len, units));
        // Index 0 along the time axis holds c_0 / h_0
        let mut cell = Array3::<f32>::zeros((batch_size, seq_len + 1, units));
        let mut hidden = Array3::<f32>::zeros((batch_size, seq_len + 1, units));

        for (b, sample) in input.outer_iter().enumerate() {
            for t in 0..seq_len {
                let h_prev = hidden.slice(s![b, t, ..]).to_owned();
                let c_prev = cell.slice(s![b, t, ..]).to_owned();
                let step = self.step(sample.row(t), h_prev.view(), c_prev.view());

                forget.slice_mut(s![b, t, ..]).assign(&step.forget);
                input_gate.slice_mut(s![b, t, ..]).assign(&step.input);
                output_gate.slice_mut(s![b, t, ..]).assign(&step.output);
                candidate.slice_mut(s![b, t, ..]).assign(&step.candidate);
                cell.slice_mut(s![b, t + 1, ..]).assign(&step.cell);
                hidden.slice_mut(s![b, t + 1, ..]).assign(&step.hidden);
            }
        }

        let output = if self.return_sequences {
            hidden.slice(s![.., 1.., ..]).to_owned()
        } else {
            hidden.slice(s![.., seq_len..seq_len + 1, ..]).to_owned()
        };

        self.cached_input = Some(input.clone());
        self.cached_forget = Some(forget);
        self.cached_input_gate = Some(input_gate);
        self.cached_output_gate = Some(output_gate);
        self.cached_candidate = Some(candidate);
        self.cached_cell = Some(cell);
        self.cached_hidden = Some(hidden);

        output
    }

    /// Backpropagation through time with two carries, `dh` and `dc`. Each
    /// gate's pre-activation gradients are summed over all timesteps into its
    /// shared parameter triple before one Adam step per matrix.
    fn backward(&mut self, grads: &Array3<f32>, lr: f32) -> Array3<f32> {
        let input = self.cached_input.as_ref().expect("forward must be run first");
        let forget = self.cached_forget.as_ref().unwrap();
        let input_gate = self.cached_input_gate.as_ref().unwrap();
        let output_gate = self.cached_output_gate.as_ref().unwrap();
        let candidate = self.cached_candidate.as_ref().unwrap();
        let cell = self.cached_cell.as_ref().unwrap();
        let hidden = self.cached_hidden.as_ref().unwrap();
        let (_, seq_len, _) = input.dim();
        let units = self.hidden_units;

        let mut grad_input = Array3::<f32>::zeros(input.raw_dim());
        let mut grads_f = GateGrads::like(&self.forget_gate);
        let mut grads_i = GateGrads::like(&self.input_gate);
        let mut grads_o = GateGrads::like(&self.output_gate);
        let mut grads_g = GateGrads::like(&self.candidate);

        for (b, (sample, grad_sample)) in
            izip!(input.outer_iter(), grads.outer_iter()).enumerate()
        {
            let mut d_pre_f_all = Array2::<f32>::zeros((seq_len, units));
            let mut d_pre_i_all = Array2::<f32>::zeros((seq_len, units));
            let mut d_pre_o_all = Array2::<f32>::zeros((seq_len, units));
            let mut d_pre_g_all = Array2::<f32>::zeros((seq_len, units));

            let mut dh_next = Array1::<f32>::zeros(units);
            let mut dc_next = Array1::<f32>::zeros(units);

            for t in (0..seq_len).rev() {
                let mut dh = dh_next;
                if self.return_sequences {
                    dh += &grad_sample.row(t);
                } else if t == seq_len - 1 {
                    dh += &grad_sample.row(0);
                }

                let f_t = forget.slice(s![b, t, ..]);
                let i_t = input_gate.slice(s![b, t, ..]);
                let o_t = output_gate.slice(s![b, t, ..]);
                let g_t = candidate.slice(s![b, t, ..]);
                let c_t = cell.slice(s![b, t + 1, ..]);
                let c_prev = cell.slice(s![b, t, ..]);

                let tanh_c = c_t.mapv(f32::tanh);

                // h_t = o ⊙ tanh(c_t): dc gets dh routed through the output
                // side, plus the additive carry arriving from t+1
                let mut dc = dc_next;
                dc += &(&(&dh * &o_t) * &tanh_c.mapv(|v| 1.0 - v * v));

                let d_o = &dh * &tanh_c;
                let d_pre_o = &d_o * &o_t.mapv(|o| o * (1.0 - o));

                // c_t = f ⊙ c_{t-1} + i ⊙ c~_t
                let d_f = &dc * &c_prev;
                let d_pre_f = &d_f * &f_t.mapv(|f| f * (1.0 - f));

                let d_i = &dc * &g_t;
                let d_pre_i = &d_i * &i_t.mapv(|i| i * (1.0 - i));

                let d_g = &dc * &i_t;
                let d_pre_g = &d_g * &g_t.mapv(|g| 1.0 - g * g);

                dc_next = &dc * &f_t;
                dh_next = d_pre_f.dot(&self.forget_gate.w_h.t())
                    + d_pre_i.dot(&self.input_gate.w_h.t())
                    + d_pre_o.dot(&self.output_gate.w_h.t())
                    + d_pre_g.dot(&self.candidate.w_h.t());

                d_pre_f_all.row_mut(t).assign(&d_pre_f);
                d_pre_i_all.row_mut(t).assign(&d_pre_i);
                d_pre_o_all.row_mut(t).assign(&d_pre_o);
                d_pre_g_all.row_mut(t).assign(&d_pre_g);
            }

            let h_prev_all = hidden.slice(s![b, ..seq_len, ..]);
            grads_f.accumulate(sample, h_prev_all, &d_pre_f_all);
            grads_i.accumulate(sample, h_prev_all, &d_pre_i_all);
            grads_o.accumulate(sample, h_prev_all, &d_pre_o_all);
            grads_g.accumulate(sample, h_prev_all, &d_pre_g_all);

            let grad_x = d_pre_f_all.dot(&self.forget_gate.w_x.t())
                + d_pre_i_all.dot(&self.input_gate.w_x.t())
                + d_pre_o_all.dot(&self.output_gate.w_x.t())
                + d_pre_g_all.dot(&self.candidate.w_x.t());
            grad_input.slice_mut(s![b, .., ..]).assign(&grad_x);
        }

        self.forget_gate.apply(&grads_f, lr);
        self.input_gate.apply(&grads_i, lr);
        self.output_gate.apply(&grads_o, lr);
        self.candidate.apply(&grads_g, lr);

        grad_input
    }

    fn parameters(&self) -> usize {
        self.forget_gate.parameters()
            + self.input_gate.parameters()
            + self.output_gate.parameters()
            + self.candidate.parameters()
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}
