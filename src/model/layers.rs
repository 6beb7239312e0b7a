//! Hand-rolled dense layers and activations over plain `Vec<f32>`. No
//! autograd: every layer exposes its own `forward`/`backward` and the model
//! wires gradients through by hand.

use rand::Rng;
use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
    pub in_dim: usize,
    pub out_dim: usize,
}

impl Dense {
    pub fn init(in_dim: usize, out_dim: usize, rng: &mut impl RngCore) -> Self {
        let scale = 1.0 / (in_dim.max(1) as f32).sqrt();
        let weights = (0..in_dim * out_dim).map(|_| rng.random_range(-scale..scale)).collect();
        let biases = vec![0.0f32; out_dim];
        Self { weights, biases, in_dim, out_dim }
    }

    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        debug_assert_eq!(input.len(), self.in_dim);
        (0..self.out_dim)
            .map(|o| {
                let row = &self.weights[o * self.in_dim..(o + 1) * self.in_dim];
                let dot: f32 = row.iter().zip(input).map(|(w, x)| w * x).sum();
                dot + self.biases[o]
            })
            .collect()
    }

    /// Returns `(grad_input, grad_weights, grad_biases)`.
    pub fn backward(&self, input: &[f32], grad_out: &[f32]) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        debug_assert_eq!(grad_out.len(), self.out_dim);
        let mut grad_weights = vec![0.0f32; self.weights.len()];
        let mut grad_input = vec![0.0f32; self.in_dim];
        for o in 0..self.out_dim {
            let g = grad_out[o];
            for i in 0..self.in_dim {
                grad_weights[o * self.in_dim + i] = g * input[i];
                grad_input[i] += g * self.weights[o * self.in_dim + i];
            }
        }
        (grad_input, grad_weights, grad_out.to_vec())
    }

    pub fn apply_gradients(&mut self, grad_weights: &[f32], grad_biases: &[f32], lr: f32) {
        for (w, g) in self.weights.iter_mut().zip(grad_weights) {
            *w -= lr * g;
        }
        for (b, g) in self.biases.iter_mut().zip(grad_biases) {
            *b -= lr * g;
        }
    }
}

pub fn relu(z: &[f32]) -> Vec<f32> {
    z.iter().map(|&v| v.max(0.0)).collect()
}

/// Inverted-dropout mask: `1/(1-p)` to keep, `0.0` to drop. Used only while
/// training; inference passes `None` wherever a mask argument is expected,
/// which behaves as an all-ones (no-op) mask.
pub fn dropout_mask(len: usize, p: f64, rng: &mut impl RngCore) -> Vec<f32> {
    if p <= 0.0 {
        return vec![1.0; len];
    }
    let keep_scale = 1.0 / (1.0 - p) as f32;
    (0..len).map(|_| if rng.random_bool(p) { 0.0 } else { keep_scale }).collect()
}

pub fn ones(len: usize) -> Vec<f32> {
    vec![1.0; len]
}

pub fn elementwise_mul(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x * y).collect()
}

pub fn add_vec(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn dense_forward_matches_manual_dot_product() {
        let dense = Dense { weights: vec![1.0, 2.0, 3.0, 4.0], biases: vec![0.5, -0.5], in_dim: 2, out_dim: 2 };
        let out = dense.forward(&[1.0, 1.0]);
        assert_eq!(out, vec![1.0 + 2.0 + 0.5, 3.0 + 4.0 - 0.5]);
    }

    #[test]
    fn dropout_mask_is_all_ones_at_zero_probability() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(4);
        let mask = dropout_mask(5, 0.0, &mut rng);
        assert_eq!(mask, vec![1.0; 5]);
    }
}
