//! Serves predictions from a persisted discriminator model (C14): load once,
//! then score as many layout pairs as asked without retraining anything.

use crate::config::Configuration;
use crate::config::PunctureConfig;
use crate::constants::TestKind;
use crate::corpus::LabeledPair;
use crate::features;
use crate::features::LayoutColumn;
use crate::features::Normalizer;
use crate::ids::Id16;
use crate::model::Model;
use crate::store::Store;
use crate::store::TestScore;

#[derive(Debug, Clone, Copy)]
pub struct OraclePrediction {
    pub lhs: Id16,
    pub rhs: Id16,
    pub forward: f64,
    pub reverse: Option<f64>,
}

pub struct Oracle {
    model: Model,
    layout_normalizer: Normalizer,
    graph_normalizer: Normalizer,
    schema: Vec<LayoutColumn>,
    puncture: PunctureConfig,
}

impl Oracle {
    pub fn load(store: &Store, config: &Configuration) -> anyhow::Result<Self> {
        let schema = features::build_layout_schema(config);
        let names = crate::model::LayoutSchemaNames::from_schema(&schema);
        let (model, layout_normalizer, graph_normalizer) = crate::model::load_model(&store.root, &names)?;
        Ok(Self { model, layout_normalizer, graph_normalizer, schema, puncture: config.puncture.clone() })
    }

    fn feature_vectors(&self, store: &Store, lhs: Id16, rhs: Id16) -> anyhow::Result<(Vec<f32>, Vec<f32>, Vec<f32>)> {
        let Some(lhs_row) = store.layout_by_id(lhs)? else {
            return Err(crate::errors::GraphStudyError::fatal(format!("layout {lhs} not found")).into());
        };
        let Some(graph) = store.graph_by_id(lhs_row.graph)? else {
            return Err(crate::errors::GraphStudyError::fatal(format!("graph for layout {lhs} not found")).into());
        };
        let lhs_raw = features::extract_layout_features(store, &self.schema, lhs, &self.puncture)?;
        let rhs_raw = features::extract_layout_features(store, &self.schema, rhs, &self.puncture)?;
        let aux_raw = features::graph_features(&graph);

        let lhs_vec: Vec<f32> = self.layout_normalizer.apply(&lhs_raw).into_iter().map(|v| v as f32).collect();
        let rhs_vec: Vec<f32> = self.layout_normalizer.apply(&rhs_raw).into_iter().map(|v| v as f32).collect();
        let aux_vec: Vec<f32> = self.graph_normalizer.apply(&aux_raw).into_iter().map(|v| v as f32).collect();
        Ok((lhs_vec, rhs_vec, aux_vec))
    }

    pub fn predict(&self, store: &Store, pairs: &[(Id16, Id16)], bidirectional: bool) -> anyhow::Result<Vec<OraclePrediction>> {
        let mut out = Vec::with_capacity(pairs.len());
        for &(lhs, rhs) in pairs {
            let (lhs_vec, rhs_vec, aux_vec) = self.feature_vectors(store, lhs, rhs)?;
            let forward = self.model.predict(&lhs_vec, &rhs_vec, &aux_vec) as f64;
            let reverse = if bidirectional {
                Some(self.model.predict(&rhs_vec, &lhs_vec, &aux_vec) as f64)
            } else {
                None
            };
            out.push(OraclePrediction { lhs, rhs, forward, reverse });
        }
        Ok(out)
    }
}

/// Score every test pair with the persisted model and record `NnForward`/
/// `NnReverse` `TestScore` rows, the same way `baselines::evaluate_*` records
/// its own `TestKind` family on the same pairs.
pub fn evaluate(store: &mut Store, oracle: &Oracle, pairs: &[LabeledPair]) -> anyhow::Result<()> {
    for pair in pairs {
        if store.has_test_score(pair.lhs, pair.rhs, TestKind::NnForward)? {
            continue;
        }
        let predictions = oracle.predict(store, &[(pair.lhs, pair.rhs)], true)?;
        let Some(prediction) = predictions.into_iter().next() else { continue };
        let txn = store.begin()?;
        txn.insert_test_score(&TestScore {
            lhs: pair.lhs,
            rhs: pair.rhs,
            test: TestKind::NnForward,
            value: prediction.forward,
        })?;
        if let Some(reverse) = prediction.reverse {
            txn.insert_test_score(&TestScore { lhs: pair.lhs, rhs: pair.rhs, test: TestKind::NnReverse, value: reverse })?;
        }
        txn.commit()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn round_trip_same_layout_both_sides_is_near_zero() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(9);
        let model = Model::new(2, 2, &mut rng);
        let layout_normalizer = Normalizer::fit(&[vec![1.0, 2.0]]);
        let graph_normalizer = Normalizer::fit(&[vec![0.0, 1.0]]);
        let lhs_vec: Vec<f32> = vec![0.0, 0.0];
        let aux_vec: Vec<f32> = vec![0.0, 0.0];
        let score = model.predict(&lhs_vec, &lhs_vec, &aux_vec);
        assert!(score.abs() < 1e-5);
        let _ = (layout_normalizer, graph_normalizer);
    }
}
