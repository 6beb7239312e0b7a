//! Non-learned and lightly-learned comparators (C13), evaluated on the same
//! test pairs as the discriminator model: three stress-metric baselines and
//! a weighted composite of Huang's four crossing/edge-length metrics.

mod nelder_mead;

use crate::constants::MetricKind;
use crate::constants::TestKind;
use crate::corpus::LabeledPair;
use crate::errors::GraphStudyError;
use crate::ids::Id16;
use crate::store::Store;
use crate::store::TestScore;
use std::collections::BTreeMap;
use std::path::Path;

const HUANG_MAX_ITERATIONS: usize = 500;
const HUANG_INITIAL_WEIGHTS: [f64; 4] = [0.25, -0.25, -0.25, 0.25];

fn metric_value(store: &Store, layout: Id16, metric: MetricKind) -> anyhow::Result<Option<f64>> {
    Ok(store.metrics_for(layout)?.into_iter().find(|m| m.metric == metric).map(|m| m.value))
}

/// `tanh((L - R) / (|L + R| / 2))` for the chosen metric; `None` if either
/// side is missing the metric.
pub fn stress_score(store: &Store, metric: MetricKind, lhs: Id16, rhs: Id16) -> anyhow::Result<Option<f64>> {
    let Some(l) = metric_value(store, lhs, metric)? else { return Ok(None) };
    let Some(r) = metric_value(store, rhs, metric)? else { return Ok(None) };
    let denom = (l + r).abs() / 2.0;
    if denom < 1e-12 {
        return Ok(Some(0.0));
    }
    Ok(Some(((l - r) / denom).tanh()))
}

fn stress_test_kind(metric: MetricKind) -> Option<TestKind> {
    match metric {
        MetricKind::StressKk => Some(TestKind::StressKk),
        MetricKind::StressFitNodesep => Some(TestKind::StressFitNodesep),
        MetricKind::StressFitScale => Some(TestKind::StressFitScale),
        _ => None,
    }
}

/// Write `Expected` and the three stress-baseline `TestScore` rows for every
/// pair in `pairs`.
pub fn evaluate_stress_baselines(store: &mut Store, pairs: &[LabeledPair]) -> anyhow::Result<()> {
    for metric in [MetricKind::StressKk, MetricKind::StressFitNodesep, MetricKind::StressFitScale] {
        let test = stress_test_kind(metric).expect("all three metrics map to a TestKind");
        for pair in pairs {
            if store.has_test_score(pair.lhs, pair.rhs, test)? {
                continue;
            }
            let Some(score) = stress_score(store, metric, pair.lhs, pair.rhs)? else { continue };
            let txn = store.begin()?;
            txn.insert_test_score(&TestScore { lhs: pair.lhs, rhs: pair.rhs, test, value: score })?;
            txn.commit()?;
        }
    }
    Ok(())
}

/// Per-graph mean/stdev for one Huang metric across every layout of that
/// graph, so a single layout's value can be expressed as a z-score.
fn graph_metric_zscores(store: &Store, graph: Id16, metric: MetricKind) -> anyhow::Result<BTreeMap<Id16, f64>> {
    let layouts = store.layouts_of_graph(graph)?;
    let mut raw = BTreeMap::new();
    for layout in &layouts {
        if let Some(value) = metric_value(store, layout.id, metric)? {
            raw.insert(layout.id, value);
        }
    }
    if raw.is_empty() {
        return Ok(raw);
    }
    let mean = raw.values().sum::<f64>() / raw.len() as f64;
    let variance = raw.values().map(|v| (v - mean).powi(2)).sum::<f64>() / raw.len() as f64;
    let stdev = variance.sqrt();
    let stdev = if stdev < 1e-12 { 1.0 } else { stdev };
    Ok(raw.into_iter().map(|(id, v)| (id, (v - mean) / stdev)).collect())
}

/// Normalized z-scores for all four Huang metrics, keyed by layout id, for
/// every layout of `graph`.
fn huang_zscores(store: &Store, graph: Id16) -> anyhow::Result<BTreeMap<Id16, [f64; 4]>> {
    let mut per_metric = Vec::with_capacity(4);
    for metric in MetricKind::huang() {
        per_metric.push(graph_metric_zscores(store, graph, *metric)?);
    }
    let mut out: BTreeMap<Id16, [f64; 4]> = BTreeMap::new();
    for (i, table) in per_metric.iter().enumerate() {
        for (&layout, &z) in table {
            out.entry(layout).or_insert([0.0; 4])[i] = z;
        }
    }
    Ok(out)
}

fn composite(weights: &[f64; 4], zscores: &[f64; 4]) -> f64 {
    weights.iter().zip(zscores).map(|(w, z)| w * z).sum()
}

fn normalize_weights(weights: &[f64]) -> [f64; 4] {
    let sum_abs: f64 = weights.iter().map(|w| w.abs()).sum();
    let mut out = [0.0; 4];
    if sum_abs < 1e-12 {
        out.copy_from_slice(&HUANG_INITIAL_WEIGHTS);
        return out;
    }
    for (o, w) in out.iter_mut().zip(weights) {
        *o = w / sum_abs;
    }
    out
}

type HuangCache = BTreeMap<Id16, BTreeMap<Id16, [f64; 4]>>;

fn build_huang_cache(store: &Store, pairs: &[LabeledPair]) -> anyhow::Result<HuangCache> {
    let mut cache = HuangCache::new();
    for pair in pairs {
        if !cache.contains_key(&pair.graph) {
            cache.insert(pair.graph, huang_zscores(store, pair.graph)?);
        }
    }
    Ok(cache)
}

fn huang_diff_cached(weights: &[f64; 4], pair: &LabeledPair, cache: &HuangCache) -> f64 {
    let zero = [0.0; 4];
    let table = cache.get(&pair.graph);
    let lhs = table.and_then(|t| t.get(&pair.lhs)).unwrap_or(&zero);
    let rhs = table.and_then(|t| t.get(&pair.rhs)).unwrap_or(&zero);
    let diff = composite(weights, lhs) - composite(weights, rhs);
    if diff.is_finite() {
        diff
    } else {
        0.0
    }
}

/// Optimize the four Huang weights to minimize the sign-disagreement rate
/// against the training labels, via Nelder-Mead.
pub fn train_huang_weights(store: &Store, training_pairs: &[LabeledPair]) -> anyhow::Result<[f64; 4]> {
    if training_pairs.is_empty() {
        return Ok(HUANG_INITIAL_WEIGHTS);
    }
    let cache = build_huang_cache(store, training_pairs)?;
    let objective = |w: &[f64]| -> f64 {
        let weights = normalize_weights(w);
        let failures = training_pairs
            .iter()
            .filter(|pair| {
                let diff = huang_diff_cached(&weights, pair, &cache);
                diff != 0.0 && pair.label != 0.0 && diff.signum() != pair.label.signum()
            })
            .count();
        failures as f64 / training_pairs.len() as f64
    };
    let optimized = nelder_mead::minimize(&HUANG_INITIAL_WEIGHTS, HUANG_MAX_ITERATIONS, objective);
    Ok(normalize_weights(&optimized))
}

pub fn evaluate_huang_baseline(store: &mut Store, weights: &[f64; 4], pairs: &[LabeledPair]) -> anyhow::Result<()> {
    let cache = build_huang_cache(store, pairs)?;
    for pair in pairs {
        if store.has_test_score(pair.lhs, pair.rhs, TestKind::Huang)? {
            continue;
        }
        let diff = huang_diff_cached(weights, pair, &cache);
        let txn = store.begin()?;
        txn.insert_test_score(&TestScore { lhs: pair.lhs, rhs: pair.rhs, test: TestKind::Huang, value: diff.tanh() })?;
        txn.commit()?;
    }
    Ok(())
}

pub fn evaluate_expected(store: &mut Store, pairs: &[LabeledPair]) -> anyhow::Result<()> {
    for pair in pairs {
        if store.has_test_score(pair.lhs, pair.rhs, TestKind::Expected)? {
            continue;
        }
        let txn = store.begin()?;
        txn.insert_test_score(&TestScore { lhs: pair.lhs, rhs: pair.rhs, test: TestKind::Expected, value: pair.label })?;
        txn.commit()?;
    }
    Ok(())
}

fn huang_path(root: &Path) -> std::path::PathBuf {
    crate::model::model_dir(root).join("huang.json")
}

pub fn save_huang_weights(root: &Path, weights: &[f64; 4]) -> anyhow::Result<()> {
    let dir = crate::model::model_dir(root);
    std::fs::create_dir_all(&dir)?;
    let payload = serde_json::json!({
        "timestamp": std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0),
        "weights": weights,
    });
    std::fs::write(huang_path(root), serde_json::to_vec_pretty(&payload)?)?;
    Ok(())
}

/// Whether Huang weights have already been fit and persisted at this root.
pub fn huang_weights_exist(root: &Path) -> bool {
    huang_path(root).exists()
}

pub fn load_huang_weights(root: &Path) -> anyhow::Result<[f64; 4]> {
    let bytes = std::fs::read(huang_path(root))
        .map_err(|e| GraphStudyError::fatal(format!("cannot read huang weights at {}: {e}", huang_path(root).display())))?;
    let payload: serde_json::Value = serde_json::from_slice(&bytes)?;
    let values = payload["weights"]
        .as_array()
        .ok_or_else(|| GraphStudyError::fatal("huang.json missing a \"weights\" array"))?;
    if values.len() != 4 {
        return Err(GraphStudyError::fatal("huang.json \"weights\" must have exactly 4 entries").into());
    }
    let mut weights = [0.0; 4];
    for (i, v) in values.iter().enumerate() {
        weights[i] = v.as_f64().ok_or_else(|| GraphStudyError::fatal("huang.json weight entry is not a number"))?;
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_weights_preserves_sign_and_sums_to_one_in_absolute_value() {
        let normalized = normalize_weights(&[1.0, -1.0, -2.0, 2.0]);
        let sum_abs: f64 = normalized.iter().map(|w| w.abs()).sum();
        assert!((sum_abs - 1.0).abs() < 1e-9);
        assert!(normalized[0] > 0.0);
        assert!(normalized[1] < 0.0);
    }

    #[test]
    fn falls_back_to_initial_weights_when_all_zero() {
        let normalized = normalize_weights(&[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(normalized, HUANG_INITIAL_WEIGHTS);
    }
}
