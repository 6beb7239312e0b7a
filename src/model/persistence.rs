//! On-disk layout for the trained model: an `architecture.txt` schema
//! manifest (timestamp plus column names, compared on load), a `weights.bin`
//! blob, and a `normalizers.bin` blob. Written into `<data-root>/model/`,
//! alongside `huang.json` (owned by `crate::baselines`).

use super::Model;
use crate::errors::GraphStudyError;
use crate::features::LayoutColumn;
use crate::features::Normalizer;
use crate::features::GRAPH_FEATURE_NAMES;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

pub fn model_dir(root: &Path) -> PathBuf {
    root.join("model")
}

/// Whether a model has already been trained and persisted at this root, so
/// the model stage can skip re-training on a re-run.
pub fn model_exists(root: &Path) -> bool {
    weights_path(root).exists() && architecture_path(root).exists() && normalizers_path(root).exists()
}

fn architecture_path(root: &Path) -> PathBuf {
    model_dir(root).join("architecture.txt")
}

fn weights_path(root: &Path) -> PathBuf {
    model_dir(root).join("weights.bin")
}

fn normalizers_path(root: &Path) -> PathBuf {
    model_dir(root).join("normalizers.bin")
}

/// The column names a persisted model was trained against. Kept separate
/// from `LayoutColumn` itself so a schema mismatch can be reported without
/// needing to reconstruct the configuration that produced it.
pub struct LayoutSchemaNames {
    pub layout_columns: Vec<String>,
    pub graph_columns: Vec<String>,
}

impl LayoutSchemaNames {
    pub fn from_schema(schema: &[LayoutColumn]) -> Self {
        Self {
            layout_columns: schema.iter().map(|c| c.name()).collect(),
            graph_columns: GRAPH_FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct NormalizerBlob {
    trained_at: u64,
    layout: Normalizer,
    graph: Normalizer,
}

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

pub fn save_model(root: &Path, model: &Model, layout_normalizer: &Normalizer, graph_normalizer: &Normalizer, names: &LayoutSchemaNames) -> anyhow::Result<()> {
    let dir = model_dir(root);
    std::fs::create_dir_all(&dir)?;

    let mut manifest = format!("timestamp {}\n", now_unix());
    manifest.push_str(&format!("n-layout-columns {}\n", names.layout_columns.len()));
    for name in &names.layout_columns {
        manifest.push_str(&format!("layout-column {name}\n"));
    }
    manifest.push_str(&format!("n-graph-columns {}\n", names.graph_columns.len()));
    for name in &names.graph_columns {
        manifest.push_str(&format!("graph-column {name}\n"));
    }
    let mut file = std::fs::File::create(architecture_path(root))?;
    file.write_all(manifest.as_bytes())?;

    let weights_bytes = bincode::serialize(model).map_err(|e| GraphStudyError::fatal(format!("cannot serialize model weights: {e}")))?;
    std::fs::write(weights_path(root), weights_bytes)?;

    let blob = NormalizerBlob { trained_at: now_unix(), layout: layout_normalizer.clone(), graph: graph_normalizer.clone() };
    let normalizer_bytes = bincode::serialize(&blob).map_err(|e| GraphStudyError::fatal(format!("cannot serialize feature normalizers: {e}")))?;
    std::fs::write(normalizers_path(root), normalizer_bytes)?;

    Ok(())
}

fn parse_manifest(text: &str) -> anyhow::Result<LayoutSchemaNames> {
    let mut layout_columns = Vec::new();
    let mut graph_columns = Vec::new();
    for line in text.lines() {
        if let Some(name) = line.strip_prefix("layout-column ") {
            layout_columns.push(name.to_string());
        } else if let Some(name) = line.strip_prefix("graph-column ") {
            graph_columns.push(name.to_string());
        }
    }
    Ok(LayoutSchemaNames { layout_columns, graph_columns })
}

pub fn load_model(root: &Path, expected: &LayoutSchemaNames) -> anyhow::Result<(Model, Normalizer, Normalizer)> {
    let manifest_text = std::fs::read_to_string(architecture_path(root))
        .map_err(|e| GraphStudyError::fatal(format!("cannot read model architecture at {}: {e}", architecture_path(root).display())))?;
    let stored = parse_manifest(&manifest_text)?;
    if stored.layout_columns != expected.layout_columns {
        return Err(GraphStudyError::fatal(format!(
            "persisted model's layout feature schema does not match the current configuration ({} stored columns vs {} expected)",
            stored.layout_columns.len(),
            expected.layout_columns.len()
        ))
        .into());
    }
    if stored.graph_columns != expected.graph_columns {
        return Err(GraphStudyError::fatal("persisted model's graph feature schema does not match the current configuration").into());
    }

    let weights_bytes = std::fs::read(weights_path(root))
        .map_err(|e| GraphStudyError::fatal(format!("cannot read model weights at {}: {e}", weights_path(root).display())))?;
    let model: Model = bincode::deserialize(&weights_bytes).map_err(|e| GraphStudyError::fatal(format!("corrupt model weights: {e}")))?;

    let normalizer_bytes = std::fs::read(normalizers_path(root))
        .map_err(|e| GraphStudyError::fatal(format!("cannot read feature normalizers at {}: {e}", normalizers_path(root).display())))?;
    let blob: NormalizerBlob = bincode::deserialize(&normalizer_bytes).map_err(|e| GraphStudyError::fatal(format!("corrupt feature normalizers: {e}")))?;

    Ok((model, blob.layout, blob.graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn round_trips_weights_and_normalizers() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let model = Model::new(3, 2, &mut rng);
        let layout_normalizer = Normalizer::fit(&[vec![1.0, 2.0, 3.0]]);
        let graph_normalizer = Normalizer::fit(&[vec![0.0, 1.0]]);
        let names = LayoutSchemaNames {
            layout_columns: vec!["a".into(), "b".into(), "c".into()],
            graph_columns: vec!["log-nodes".into(), "log-edges".into()],
        };
        save_model(dir.path(), &model, &layout_normalizer, &graph_normalizer, &names).unwrap();
        let (loaded, loaded_layout_norm, _loaded_graph_norm) = load_model(dir.path(), &names).unwrap();
        assert_eq!(loaded.n_layout, model.n_layout);
        assert_eq!(loaded_layout_norm.means, layout_normalizer.means);
    }

    #[test]
    fn rejects_a_mismatched_schema() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(8);
        let model = Model::new(2, 2, &mut rng);
        let layout_normalizer = Normalizer::fit(&[vec![1.0, 2.0]]);
        let graph_normalizer = Normalizer::fit(&[vec![0.0, 1.0]]);
        let names = LayoutSchemaNames {
            layout_columns: vec!["a".into(), "b".into()],
            graph_columns: vec!["log-nodes".into(), "log-edges".into()],
        };
        save_model(dir.path(), &model, &layout_normalizer, &graph_normalizer, &names).unwrap();
        let different = LayoutSchemaNames {
            layout_columns: vec!["a".into(), "b".into(), "c".into()],
            graph_columns: vec!["log-nodes".into(), "log-edges".into()],
        };
        assert!(load_model(dir.path(), &different).is_err());
    }
}
