//! Feature extraction: fixed-length real vectors per Graph and per Layout.
//! Column order is a pure function of the desired-properties configuration
//! (`schema::build_layout_schema`); values are read back from the store and
//! missing entries are emitted as NaN, which `normalize::Normalizer` turns
//! into zero after mean-centering and stdev-scaling.

mod normalize;
mod schema;

pub use normalize::Normalizer;
pub use schema::build_layout_schema;
pub use schema::LayoutColumn;
pub use schema::GRAPH_FEATURE_NAMES;

use crate::config::PunctureConfig;
use crate::constants::Kernel;
use crate::ids::Id16;
use crate::store::Graph;
use crate::store::Store;

/// `log(max(1/e, nodes))`, `log(max(1/e, edges))`.
pub fn graph_features(graph: &Graph) -> [f64; 2] {
    let floor = 1.0 / std::f64::consts::E;
    [
        (graph.nodes as f64).max(floor).ln(),
        (graph.edges as f64).max(floor).ln(),
    ]
}

/// Extract the layout feature vector for `layout_id` according to `schema`,
/// forcing punctured properties to NaN.
pub fn extract_layout_features(
    store: &Store,
    schema: &[LayoutColumn],
    layout_id: Id16,
    puncture: &PunctureConfig,
) -> anyhow::Result<Vec<f64>> {
    let mut out = Vec::with_capacity(schema.len());
    let mut i = 0;
    while i < schema.len() {
        if let LayoutColumn::InnerEntropyDisc { property, vicinity, .. } = &schema[i] {
            let (property, vicinity) = (*property, *vicinity);
            let start = i;
            while i < schema.len() {
                match &schema[i] {
                    LayoutColumn::InnerEntropyDisc { property: p, vicinity: v, .. } if *p == property && *v == vicinity => {
                        i += 1;
                    }
                    _ => break,
                }
            }
            let group = &schema[start..i];
            if puncture.is_punctured(property) {
                out.extend(std::iter::repeat(f64::NAN).take(group.len()));
                continue;
            }
            let outer = store.property_disc_row(layout_id, property, vicinity)?;
            let entropies: std::collections::BTreeMap<u64, f64> = match &outer {
                Some(row) => store
                    .histograms_for_outer(row.id)?
                    .into_iter()
                    .filter_map(|h| h.entropy.map(|e| (h.bincount, e)))
                    .collect(),
                None => Default::default(),
            };
            let mut last = f64::NAN;
            for col in group {
                let LayoutColumn::InnerEntropyDisc { bincount, .. } = col else {
                    unreachable!("group only contains InnerEntropyDisc columns")
                };
                if let Some(&entropy) = entropies.get(bincount) {
                    last = entropy;
                }
                out.push(last);
            }
            continue;
        }
        out.push(compute_single_column(store, layout_id, &schema[i], puncture)?);
        i += 1;
    }
    Ok(out)
}

fn compute_single_column(
    store: &Store,
    layout_id: Id16,
    column: &LayoutColumn,
    puncture: &PunctureConfig,
) -> anyhow::Result<f64> {
    if let Some(property) = column.property() {
        if puncture.is_punctured(property) {
            return Ok(f64::NAN);
        }
    }
    let value = match column {
        LayoutColumn::AxisMajorX => store.major_axis_for(layout_id)?.map(|a| a.x),
        LayoutColumn::AxisMajorY => store.major_axis_for(layout_id)?.map(|a| a.y),
        LayoutColumn::AxisMinorX => store.minor_axis_for(layout_id)?.map(|a| a.x),
        LayoutColumn::AxisMinorY => store.minor_axis_for(layout_id)?.map(|a| a.y),
        LayoutColumn::OuterMean { property, kernel, vicinity } => {
            outer_field(store, layout_id, *property, *kernel, *vicinity, Field::Mean)?
        }
        LayoutColumn::OuterRms { property, kernel, vicinity } => {
            outer_field(store, layout_id, *property, *kernel, *vicinity, Field::Rms)?
        }
        LayoutColumn::EntropyIntercept { property, vicinity } => store
            .property_disc_row(layout_id, *property, *vicinity)?
            .map(|row| row.entropy_intercept),
        LayoutColumn::EntropySlope { property, vicinity } => store
            .property_disc_row(layout_id, *property, *vicinity)?
            .map(|row| row.entropy_slope),
        LayoutColumn::InnerEntropyCont { property, vicinity } => {
            let Some(outer) = store.property_cont_row(layout_id, *property, *vicinity)? else {
                return Ok(f64::NAN);
            };
            store
                .sliding_averages_for_outer(outer.id)?
                .into_iter()
                .find_map(|s| s.entropy)
        }
        LayoutColumn::InnerEntropyDisc { .. } => unreachable!("handled by the grouped branch above"),
    };
    Ok(value.unwrap_or(f64::NAN))
}

enum Field {
    Mean,
    Rms,
}

fn outer_field(
    store: &Store,
    layout_id: Id16,
    property: crate::constants::Prop,
    kernel: Kernel,
    vicinity: Option<u64>,
    field: Field,
) -> anyhow::Result<Option<f64>> {
    if kernel == Kernel::disc() {
        let Some(row) = store.property_disc_row(layout_id, property, vicinity)? else {
            return Ok(None);
        };
        Ok(match field {
            Field::Mean => row.mean,
            Field::Rms => Some(row.rms),
        })
    } else {
        let Some(row) = store.property_cont_row(layout_id, property, vicinity)? else {
            return Ok(None);
        };
        Ok(match field {
            Field::Mean => row.mean,
            Field::Rms => Some(row.rms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Generator;

    #[test]
    fn graph_features_are_log_scaled_and_floored() {
        let graph = Graph {
            id: Id16::NONE,
            generator: Generator::Rome,
            file: String::new(),
            nodes: 0,
            edges: 0,
            native: false,
            seed: None,
            fingerprint: None,
            poisoned: false,
        };
        let features = graph_features(&graph);
        assert_eq!(features[0], (1.0 / std::f64::consts::E).ln());
        assert_eq!(features[1], (1.0 / std::f64::consts::E).ln());
    }

    #[test]
    fn missing_layout_rows_extract_as_nan() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let puncture = PunctureConfig { properties: Default::default() };
        let schema = vec![LayoutColumn::OuterRms {
            property: crate::constants::Prop::Angular,
            kernel: Kernel::disc(),
            vicinity: None,
        }];
        let values = extract_layout_features(&store, &schema, Id16::random(&mut rand::rng()), &puncture).unwrap();
        assert!(values[0].is_nan());
    }
}
