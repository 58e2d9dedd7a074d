use ndarray::Array2;

/// Adam optimizer state for one weight matrix.
///
/// Each trainable matrix owns its own instance; `step` applies one
/// bias-corrected update in place.
pub struct Adam {
    m: Array2<f32>,
    v: Array2<f32>,
    timestep: i32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
}

impl Adam {
    pub fn new(shape: (usize, usize)) -> Self {
        Adam {
            m: Array2::zeros(shape),
            v: Array2::zeros(shape),
            timestep: 0,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }

    /// One dense update: refresh both moment estimates, correct their bias,
    /// and move `weights` against the gradient.
    pub fn step(&mut self, weights: &mut Array2<f32>, grads: &Array2<f32>, lr: f32) {
        self.timestep += 1;

        self.m = &self.m * self.beta1 + grads * (1.0 - self.beta1);
        self.v = &self.v * self.beta2 + grads.mapv(|g| g * g) * (1.0 - self.beta2);

        let m_hat = &self.m / (1.0 - self.beta1.powi(self.timestep));
        let v_hat = &self.v / (1.0 - self.beta2.powi(self.timestep));

        *weights -= &(m_hat * lr / (v_hat.mapv(f32::sqrt) + self.epsilon));
    }

    /// Sparse variant for row-addressed tables: only the listed rows have
    /// their moments and weights touched. The timestep counter is shared, so
    /// bias correction matches the dense path.
    pub fn step_rows(
        &mut self,
        weights: &mut Array2<f32>,
        grads: &Array2<f32>,
        rows: &[usize],
        lr: f32,
    ) {
        self.timestep += 1;

        let bias1 = 1.0 - self.beta1.powi(self.timestep);
        let bias2 = 1.0 - self.beta2.powi(self.timestep);
        let cols = weights.shape()[1];

        for &row in rows {
            for col in 0..cols {
                let g = grads[[row, col]];
                self.m[[row, col]] = self.beta1 * self.m[[row, col]] + (1.0 - self.beta1) * g;
                self.v[[row, col]] = self.beta2 * self.v[[row, col]] + (1.0 - self.beta2) * g * g;

                let m_hat = self.m[[row, col]] / bias1;
                let v_hat = self.v[[row, col]] / bias2;
                weights[[row, col]] -= lr * m_hat / (v_hat.sqrt() + self.epsilon);
            }
        }
    }
}
