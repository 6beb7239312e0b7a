//! Pairwise discriminator network (C12): a shared sub-network applied to
//! both sides of a layout pair, a linear graph branch, and a `tanh` output
//! combining them. Trained with plain SGD and manually derived gradients —
//! no autograd framework.

mod layers;
mod persistence;

pub use persistence::load_model;
pub use persistence::model_dir;
pub use persistence::model_exists;
pub use persistence::save_model;
pub use persistence::LayoutSchemaNames;

use crate::config::Configuration;
use crate::constants::MAX_NONFINITE_FRACTION;
use crate::corpus::Corpus;
use crate::corpus::LabeledPair;
use crate::features;
use crate::features::LayoutColumn;
use crate::features::Normalizer;
use crate::store::Store;
use layers::add_vec;
use layers::dropout_mask;
use layers::elementwise_mul;
use layers::Dense;
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;

const VALIDATION_FRACTION: f64 = 0.25;
const EPOCHS: usize = 100;
const LEARNING_RATE: f32 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    dense1: Dense,
    dense2: Dense,
    graph_branch: Dense,
    output: Dense,
    pub n_layout: usize,
    pub n_graph: usize,
}

struct SubnetCache {
    drop1_mask: Vec<f32>,
    drop1_out: Vec<f32>,
    drop2_mask: Vec<f32>,
    drop2_out: Vec<f32>,
    z2: Vec<f32>,
    a2: Vec<f32>,
}

struct ModelCache {
    lhs: SubnetCache,
    rhs: SubnetCache,
    aux: Vec<f32>,
    concat: Vec<f32>,
    score: f32,
}

struct Gradients {
    dense1_w: Vec<f32>,
    dense1_b: Vec<f32>,
    dense2_w: Vec<f32>,
    dense2_b: Vec<f32>,
    graph_w: Vec<f32>,
    graph_b: Vec<f32>,
    out_w: Vec<f32>,
    out_b: Vec<f32>,
}

impl Model {
    pub fn new(n_layout: usize, n_graph: usize, rng: &mut impl RngCore) -> Self {
        let h1 = ((2.0 * (n_layout as f64).sqrt()).round() as usize).max(1);
        let h2 = ((1.5 * (n_layout as f64).sqrt()).round() as usize).max(1);
        Self {
            dense1: Dense::init(n_layout, h1, rng),
            dense2: Dense::init(h1, h2, rng),
            graph_branch: Dense::init(n_graph, n_graph, rng),
            output: Dense::init(h2 + n_graph, 1, rng),
            n_layout,
            n_graph,
        }
    }

    fn forward_subnet(&self, x: &[f32], drop1_mask: Option<&[f32]>, drop2_mask: Option<&[f32]>) -> (Vec<f32>, SubnetCache) {
        let drop1_mask = drop1_mask.map(|m| m.to_vec()).unwrap_or_else(|| layers::ones(self.dense1.in_dim));
        let drop1_out = elementwise_mul(x, &drop1_mask);
        let z1 = self.dense1.forward(&drop1_out);
        let drop2_mask = drop2_mask.map(|m| m.to_vec()).unwrap_or_else(|| layers::ones(self.dense2.in_dim));
        let drop2_out = elementwise_mul(&z1, &drop2_mask);
        let z2 = self.dense2.forward(&drop2_out);
        let a2 = layers::relu(&z2);
        (a2.clone(), SubnetCache { drop1_mask, drop1_out, drop2_mask, drop2_out, z2, a2 })
    }

    fn subnet_backward(&self, cache: &SubnetCache, grad_a2: &[f32]) -> (Vec<f32>, Vec<f32>, Vec<f32>, Vec<f32>) {
        let grad_z2: Vec<f32> = grad_a2.iter().zip(&cache.z2).map(|(g, &z)| if z > 0.0 { *g } else { 0.0 }).collect();
        let (grad_drop2_out, grad_w2, grad_b2) = self.dense2.backward(&cache.drop2_out, &grad_z2);
        let grad_z1 = elementwise_mul(&grad_drop2_out, &cache.drop2_mask);
        let (grad_drop1_out, grad_w1, grad_b1) = self.dense1.backward(&cache.drop1_out, &grad_z1);
        let _grad_x = elementwise_mul(&grad_drop1_out, &cache.drop1_mask);
        (grad_w1, grad_b1, grad_w2, grad_b2)
    }

    fn forward_train(&self, lhs: &[f32], rhs: &[f32], aux: &[f32], rng: &mut impl RngCore) -> ModelCache {
        let m1a = dropout_mask(self.dense1.in_dim, 0.5, rng);
        let m2a = dropout_mask(self.dense2.in_dim, 0.25, rng);
        let (f_lhs, cache_lhs) = self.forward_subnet(lhs, Some(&m1a), Some(&m2a));
        let m1b = dropout_mask(self.dense1.in_dim, 0.5, rng);
        let m2b = dropout_mask(self.dense2.in_dim, 0.25, rng);
        let (f_rhs, cache_rhs) = self.forward_subnet(rhs, Some(&m1b), Some(&m2b));
        let sub: Vec<f32> = f_lhs.iter().zip(&f_rhs).map(|(a, b)| a - b).collect();
        let aux_branch = self.graph_branch.forward(aux);
        let concat = [sub, aux_branch].concat();
        let z_out = self.output.forward(&concat)[0];
        let score = z_out.tanh();
        ModelCache { lhs: cache_lhs, rhs: cache_rhs, aux: aux.to_vec(), concat, score }
    }

    fn backward(&self, cache: &ModelCache, label: f32) -> Gradients {
        let score = cache.score;
        let d_score = 2.0 * (score - label);
        let d_zout = d_score * (1.0 - score * score);
        let (grad_concat, out_w, out_b) = self.output.backward(&cache.concat, &[d_zout]);
        let h2 = self.dense2.out_dim;
        let grad_sub = &grad_concat[..h2];
        let grad_aux_branch = &grad_concat[h2..];
        let (_grad_aux, graph_w, graph_b) = self.graph_branch.backward(&cache.aux, grad_aux_branch);
        let grad_f_lhs = grad_sub.to_vec();
        let grad_f_rhs: Vec<f32> = grad_sub.iter().map(|g| -g).collect();
        let (w1_l, b1_l, w2_l, b2_l) = self.subnet_backward(&cache.lhs, &grad_f_lhs);
        let (w1_r, b1_r, w2_r, b2_r) = self.subnet_backward(&cache.rhs, &grad_f_rhs);
        Gradients {
            dense1_w: add_vec(&w1_l, &w1_r),
            dense1_b: add_vec(&b1_l, &b1_r),
            dense2_w: add_vec(&w2_l, &w2_r),
            dense2_b: add_vec(&b2_l, &b2_r),
            graph_w,
            graph_b,
            out_w,
            out_b,
        }
    }

    fn apply_gradients(&mut self, grads: &Gradients, lr: f32) {
        self.dense1.apply_gradients(&grads.dense1_w, &grads.dense1_b, lr);
        self.dense2.apply_gradients(&grads.dense2_w, &grads.dense2_b, lr);
        self.graph_branch.apply_gradients(&grads.graph_w, &grads.graph_b, lr);
        self.output.apply_gradients(&grads.out_w, &grads.out_b, lr);
    }

    /// Inference: dropout masks default to all-ones, no RNG needed.
    pub fn predict(&self, lhs: &[f32], rhs: &[f32], aux: &[f32]) -> f32 {
        let (f_lhs, _) = self.forward_subnet(lhs, None, None);
        let (f_rhs, _) = self.forward_subnet(rhs, None, None);
        let sub: Vec<f32> = f_lhs.iter().zip(&f_rhs).map(|(a, b)| a - b).collect();
        let aux_branch = self.graph_branch.forward(aux);
        let concat = [sub, aux_branch].concat();
        self.output.forward(&concat)[0].tanh()
    }
}

struct ExtractedPair {
    lhs: Vec<f64>,
    rhs: Vec<f64>,
    aux: Vec<f64>,
    label: f64,
}

fn extract_pairs(store: &Store, config: &Configuration, schema: &[LayoutColumn], pairs: &[LabeledPair]) -> anyhow::Result<Vec<ExtractedPair>> {
    let mut out = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let Some(graph) = store.graph_by_id(pair.graph)? else { continue };
        let lhs = features::extract_layout_features(store, schema, pair.lhs, &config.puncture)?;
        let rhs = features::extract_layout_features(store, schema, pair.rhs, &config.puncture)?;
        let aux = features::graph_features(&graph).to_vec();
        out.push(ExtractedPair { lhs, rhs, aux, label: pair.label });
    }
    Ok(out)
}

pub struct TrainedModel {
    pub model: Model,
    pub layout_normalizer: Normalizer,
    pub graph_normalizer: Normalizer,
    pub schema: Vec<LayoutColumn>,
}

pub fn train(store: &Store, config: &Configuration, corpus: &Corpus, rng: &mut impl RngCore) -> anyhow::Result<TrainedModel> {
    let schema = features::build_layout_schema(config);
    let extracted = extract_pairs(store, config, &schema, &corpus.train)?;
    if extracted.is_empty() {
        return Err(crate::errors::GraphStudyError::fatal("no training pairs available to fit the discriminator model").into());
    }

    let mut layout_rows: Vec<Vec<f64>> = Vec::with_capacity(extracted.len() * 2);
    let mut graph_rows: Vec<Vec<f64>> = Vec::with_capacity(extracted.len());
    for pair in &extracted {
        layout_rows.push(pair.lhs.clone());
        layout_rows.push(pair.rhs.clone());
        graph_rows.push(pair.aux.clone());
    }
    let layout_normalizer = Normalizer::fit(&layout_rows);
    let graph_normalizer = Normalizer::fit(&graph_rows);

    let puncture_active = !config.puncture.properties.is_empty();
    let layout_nonfinite = Normalizer::nonfinite_fraction(&layout_rows);
    let graph_nonfinite = Normalizer::nonfinite_fraction(&graph_rows);
    if !puncture_active && (layout_nonfinite > MAX_NONFINITE_FRACTION || graph_nonfinite > MAX_NONFINITE_FRACTION) {
        return Err(crate::errors::GraphStudyError::fatal(format!(
            "non-finite feature fraction too high (layout={layout_nonfinite:.4}, graph={graph_nonfinite:.4}); check property/metric coverage or enable puncture"
        ))
        .into());
    }

    let samples: Vec<(Vec<f32>, Vec<f32>, Vec<f32>, f32)> = extracted
        .iter()
        .map(|pair| {
            let lhs: Vec<f32> = layout_normalizer.apply(&pair.lhs).into_iter().map(|v| v as f32).collect();
            let rhs: Vec<f32> = layout_normalizer.apply(&pair.rhs).into_iter().map(|v| v as f32).collect();
            let aux: Vec<f32> = graph_normalizer.apply(&pair.aux).into_iter().map(|v| v as f32).collect();
            (lhs, rhs, aux, pair.label as f32)
        })
        .collect();

    let mut indices: Vec<usize> = (0..samples.len()).collect();
    indices.shuffle(rng);
    let validation_count = ((samples.len() as f64 * VALIDATION_FRACTION).round() as usize).min(samples.len().saturating_sub(1));
    let (validation_idx, train_idx) = indices.split_at(validation_count);

    let mut model = Model::new(schema.len(), features::GRAPH_FEATURE_NAMES.len(), rng);

    for epoch in 0..EPOCHS {
        let mut epoch_order: Vec<usize> = train_idx.to_vec();
        epoch_order.shuffle(rng);
        for &i in &epoch_order {
            let (lhs, rhs, aux, label) = &samples[i];
            let cache = model.forward_train(lhs, rhs, aux, rng);
            let grads = model.backward(&cache, *label);
            model.apply_gradients(&grads, LEARNING_RATE);
        }
        if !validation_idx.is_empty() {
            let mse: f32 = validation_idx
                .iter()
                .map(|&i| {
                    let (lhs, rhs, aux, label) = &samples[i];
                    let score = model.predict(lhs, rhs, aux);
                    (score - label).powi(2)
                })
                .sum::<f32>()
                / validation_idx.len() as f32;
            log::debug!("epoch {epoch}: validation mse {mse:.6}");
        }
    }

    Ok(TrainedModel { model, layout_normalizer, graph_normalizer, schema })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn predict_is_antisymmetric_for_same_side_inputs() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let model = Model::new(4, 2, &mut rng);
        let lhs = vec![0.1, -0.2, 0.3, 0.4];
        let rhs = vec![0.4, 0.3, -0.2, 0.1];
        let aux = vec![0.0, 1.0];
        let forward = model.predict(&lhs, &rhs, &aux);
        let reverse = model.predict(&rhs, &lhs, &aux);
        assert!(forward.is_finite());
        assert!(reverse.is_finite());
    }

    #[test]
    fn predict_same_layout_both_sides_is_near_zero() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(6);
        let model = Model::new(3, 2, &mut rng);
        let x = vec![0.2, -0.1, 0.5];
        let aux = vec![0.0, 0.0];
        let score = model.predict(&x, &x, &aux);
        assert!(score.abs() < 1e-5);
    }
}
