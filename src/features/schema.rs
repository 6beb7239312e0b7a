//! The feature schema: a pure function of the properties/puncture
//! configuration, independent of anything in the store. Changing the
//! configuration changes the schema, which is why a persisted model checks
//! it column-by-column on load.

use crate::config::Configuration;
use crate::constants::Kernel;
use crate::constants::Prop;
use crate::constants::FIXED_COUNT_BINS;
use crate::constants::VICINITIES;

pub const GRAPH_FEATURE_NAMES: [&str; 2] = ["log-nodes", "log-edges"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutColumn {
    AxisMajorX,
    AxisMajorY,
    AxisMinorX,
    AxisMinorY,
    OuterMean { property: Prop, kernel: Kernel, vicinity: Option<u64> },
    OuterRms { property: Prop, kernel: Kernel, vicinity: Option<u64> },
    EntropyIntercept { property: Prop, vicinity: Option<u64> },
    EntropySlope { property: Prop, vicinity: Option<u64> },
    InnerEntropyDisc { property: Prop, vicinity: Option<u64>, bincount: u64 },
    InnerEntropyCont { property: Prop, vicinity: Option<u64> },
}

impl LayoutColumn {
    /// The property a punctured-properties check applies to, if any.
    pub fn property(&self) -> Option<Prop> {
        use LayoutColumn::*;
        match self {
            AxisMajorX | AxisMajorY | AxisMinorX | AxisMinorY => None,
            OuterMean { property, .. }
            | OuterRms { property, .. }
            | EntropyIntercept { property, .. }
            | EntropySlope { property, .. }
            | InnerEntropyDisc { property, .. }
            | InnerEntropyCont { property, .. } => Some(*property),
        }
    }

    /// Stable text name, used for schema persistence and mismatch detection.
    pub fn name(&self) -> String {
        use LayoutColumn::*;
        match self {
            AxisMajorX => "axis-major/x".to_string(),
            AxisMajorY => "axis-major/y".to_string(),
            AxisMinorX => "axis-minor/x".to_string(),
            AxisMinorY => "axis-minor/y".to_string(),
            OuterMean { property, kernel, vicinity } => {
                format!("{}/{}/{}/mean", property.name(), kernel_name(*kernel), vicinity_name(*vicinity))
            }
            OuterRms { property, kernel, vicinity } => {
                format!("{}/{}/{}/rms", property.name(), kernel_name(*kernel), vicinity_name(*vicinity))
            }
            EntropyIntercept { property, vicinity } => {
                format!("{}/disc/{}/entropy-intercept", property.name(), vicinity_name(*vicinity))
            }
            EntropySlope { property, vicinity } => {
                format!("{}/disc/{}/entropy-slope", property.name(), vicinity_name(*vicinity))
            }
            InnerEntropyDisc { property, vicinity, bincount } => {
                format!("{}/disc/{}/entropy-{bincount}", property.name(), vicinity_name(*vicinity))
            }
            InnerEntropyCont { property, vicinity } => {
                format!("{}/cont/{}/entropy", property.name(), vicinity_name(*vicinity))
            }
        }
    }
}

fn kernel_name(kernel: Kernel) -> &'static str {
    if kernel == Kernel::disc() {
        "disc"
    } else {
        "cont"
    }
}

fn vicinity_name(vicinity: Option<u64>) -> String {
    match vicinity {
        Some(v) => format!("v{v}"),
        None => "v0".to_string(),
    }
}

/// Build the ordered layout-feature schema from the desired-properties
/// configuration. Property order is `Prop::all()`; kernel order is disc then
/// cont; vicinity order follows `VICINITIES` for localized properties and is
/// a single pass otherwise.
pub fn build_layout_schema(config: &Configuration) -> Vec<LayoutColumn> {
    let mut columns = Vec::new();

    let wants_major = config.desired_properties_disc.desired.contains(&Prop::Princomp1st)
        || config.desired_properties_cont.desired.contains(&Prop::Princomp1st);
    if wants_major {
        columns.push(LayoutColumn::AxisMajorX);
        columns.push(LayoutColumn::AxisMajorY);
    }
    let wants_minor = config.desired_properties_disc.desired.contains(&Prop::Princomp2nd)
        || config.desired_properties_cont.desired.contains(&Prop::Princomp2nd);
    if wants_minor {
        columns.push(LayoutColumn::AxisMinorX);
        columns.push(LayoutColumn::AxisMinorY);
    }

    for &property in Prop::all() {
        for (kernel, desired) in [
            (Kernel::disc(), &config.desired_properties_disc),
            (Kernel::cont(), &config.desired_properties_cont),
        ] {
            if !desired.desired.contains(&property) {
                continue;
            }
            let vicinities: Vec<Option<u64>> = if property.localized() {
                VICINITIES.iter().map(|v| Some(*v as u64)).collect()
            } else {
                vec![None]
            };
            for vicinity in vicinities {
                if property != Prop::EdgeLength {
                    columns.push(LayoutColumn::OuterMean { property, kernel, vicinity });
                }
                columns.push(LayoutColumn::OuterRms { property, kernel, vicinity });
                if kernel == Kernel::disc() {
                    columns.push(LayoutColumn::EntropyIntercept { property, vicinity });
                    columns.push(LayoutColumn::EntropySlope { property, vicinity });
                    for bincount in FIXED_COUNT_BINS {
                        columns.push(LayoutColumn::InnerEntropyDisc { property, vicinity, bincount: bincount as u64 });
                    }
                } else {
                    columns.push(LayoutColumn::InnerEntropyCont { property, vicinity });
                }
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(text_disc: &str, text_cont: &str) -> Configuration {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("properties-disc.cfg"), text_disc).unwrap();
        std::fs::write(dir.path().join("properties-cont.cfg"), text_cont).unwrap();
        Configuration::load(dir.path()).unwrap()
    }

    #[test]
    fn schema_is_a_pure_function_of_configuration() {
        let config = config_from("angular\ntension\n", "angular\n");
        let a = build_layout_schema(&config);
        let b = build_layout_schema(&config);
        assert_eq!(a.iter().map(|c| c.name()).collect::<Vec<_>>(), b.iter().map(|c| c.name()).collect::<Vec<_>>());
    }

    #[test]
    fn edge_length_omits_mean() {
        let config = config_from("edge-length\n", "");
        let schema = build_layout_schema(&config);
        assert!(schema.iter().all(|c| !matches!(c, LayoutColumn::OuterMean { property, .. } if *property == Prop::EdgeLength)));
        assert!(schema.iter().any(|c| matches!(c, LayoutColumn::OuterRms { property, .. } if *property == Prop::EdgeLength)));
    }

    #[test]
    fn localized_property_expands_across_vicinities() {
        let config = config_from("rdf-local\n", "");
        let schema = build_layout_schema(&config);
        let count = schema
            .iter()
            .filter(|c| matches!(c, LayoutColumn::OuterRms { property: Prop::RdfLocal, .. }))
            .count();
        assert_eq!(count, VICINITIES.len());
    }
}
