//! Property measurement: for each (Layout, Property, Kernel) in the desired
//! set, invoke the property tool and record summary statistics plus the
//! inner histogram/sliding-average descriptors it emits. Localized
//! properties are swept across increasing vicinity radii until the tool
//! reports no more data.

use crate::badlog::BadLog;
use crate::config::Configuration;
use crate::constants::Action;
use crate::constants::Kernel;
use crate::constants::Prop;
use crate::constants::VICINITIES;
use crate::errors::GraphStudyError;
use crate::store::Axis;
use crate::store::Histogram;
use crate::store::PropertyCont;
use crate::store::PropertyDisc;
use crate::store::SlidingAverage;
use crate::store::Store;
use crate::tools::call_graphstudy_tool;
use crate::tools::ScopedWorkdir;
use crate::tools::ToolInvocation;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
struct PropertyInner {
    bincount: Option<u64>,
    binwidth: Option<f64>,
    binning: Option<String>,
    sigma: Option<f64>,
    points: Option<u64>,
    entropy: Option<f64>,
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PropertyOuterMeta {
    minimum: f64,
    maximum: f64,
    mean: Option<f64>,
    rms: f64,
    entropy_intercept: Option<f64>,
    entropy_slope: Option<f64>,
    axis_major: Option<(f64, f64)>,
    axis_minor: Option<(f64, f64)>,
    #[serde(default)]
    data: Vec<PropertyInner>,
}

pub async fn run_properties_stage(store: &mut Store, config: &Configuration, bad_log: &mut BadLog) -> anyhow::Result<()> {
    for layout in store.all_layouts()? {
        if crate::errors::interrupted() {
            log::warn!("interrupted before finishing the properties stage");
            return Ok(());
        }
        for prop in &config.desired_properties_disc.desired {
            if store.has_property_disc(layout.id, *prop)? {
                continue;
            }
            measure_property(store, bad_log, layout.id, &layout.file, *prop, Kernel::disc()).await?;
        }
        for prop in &config.desired_properties_cont.desired {
            if store.has_property_cont(layout.id, *prop)? {
                continue;
            }
            measure_property(store, bad_log, layout.id, &layout.file, *prop, Kernel::cont()).await?;
        }
    }
    Ok(())
}

async fn measure_property(
    store: &mut Store,
    bad_log: &mut BadLog,
    layout_id: crate::ids::Id16,
    layout_file: &str,
    prop: Prop,
    kernel: Kernel,
) -> anyhow::Result<()> {
    let input = store.root.join(layout_file);
    let vicinities: &[usize] = if prop.localized() { &VICINITIES } else { &[0] };
    for &vicinity in vicinities {
        if crate::errors::interrupted() {
            return Ok(());
        }
        let key = format!("{layout_id}-{}-{kernel:?}-{vicinity}", prop.name());
        if bad_log.get(Action::Properties, key.as_bytes()).is_some() {
            continue;
        }
        let workdir = ScopedWorkdir::new(&store.root, "property")?;
        let mut invocation = ToolInvocation::new(format!("graphstudy-property-{}", prop.name()))
            .arg(format!("--input={}", input.display()))
            .arg(format!("--kernel={kernel:?}").to_ascii_lowercase())
            .output(&workdir.path().join("data-%.xml.gz"));
        if prop.localized() {
            invocation = invocation.arg(format!("--vicinity={vicinity}"));
        }
        let outcome = match call_graphstudy_tool(invocation).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("property {} failed for layout {layout_id}: {e}", prop.name());
                bad_log.set(Action::Properties, key.as_bytes().to_vec(), e.to_string())?;
                continue;
            }
        };
        let meta: PropertyOuterMeta = serde_json::from_value(outcome.meta)
            .map_err(|e| GraphStudyError::recoverable(format!("malformed property meta: {e}")))?;
        if meta.data.is_empty() {
            if prop.localized() {
                break;
            }
            return Err(GraphStudyError::sanity(format!(
                "property {} returned no data for layout {layout_id}",
                prop.name()
            ))
            .into());
        }
        let vicinity_col = if prop.localized() { Some(vicinity as u64) } else { None };
        let outer_id = {
            let txn = store.begin()?;
            let id = match kernel {
                Kernel::Boxed => txn.insert_property_disc(&PropertyDisc {
                    id: 0,
                    layout: layout_id,
                    property: prop,
                    vicinity: vicinity_col,
                    size: meta.data.len() as u64,
                    minimum: meta.minimum,
                    maximum: meta.maximum,
                    mean: meta.mean,
                    rms: meta.rms,
                    entropy_intercept: meta.entropy_intercept.unwrap_or(0.0),
                    entropy_slope: meta.entropy_slope.unwrap_or(0.0),
                })?,
                _ => txn.insert_property_cont(&PropertyCont {
                    id: 0,
                    layout: layout_id,
                    property: prop,
                    vicinity: vicinity_col,
                    size: meta.data.len() as u64,
                    minimum: meta.minimum,
                    maximum: meta.maximum,
                    mean: meta.mean,
                    rms: meta.rms,
                })?,
            };
            if prop.is_principal_component() {
                if let Some((x, y)) = meta.axis_major {
                    txn.insert_major_axis(&Axis { layout: layout_id, x, y })?;
                }
                if let Some((x, y)) = meta.axis_minor {
                    txn.insert_minor_axis(&Axis { layout: layout_id, x, y })?;
                }
            }
            txn.commit()?;
            id
        };
        for inner in &meta.data {
            let Some(filename) = &inner.filename else {
                continue;
            };
            let tmp_path = workdir.path().join(filename);
            match kernel {
                Kernel::Boxed => {
                    let bincount = inner.bincount.unwrap_or(0);
                    let dest = crate::store::histogram_path(&store.root, layout_id, prop, bincount);
                    let rel_file = dest.strip_prefix(&store.root).unwrap_or(&dest).display().to_string();
                    {
                        let txn = store.begin()?;
                        txn.insert_histogram(&Histogram {
                            outer: outer_id,
                            bincount,
                            binwidth: inner.binwidth.unwrap_or(0.0),
                            binning: inner.binning.clone().unwrap_or_default(),
                            entropy: inner.entropy,
                            file: Some(rel_file),
                        })?;
                        txn.commit()?;
                    }
                    crate::store::commit(&tmp_path, &dest)?;
                }
                _ => {
                    let sigma = inner.sigma.unwrap_or(0.0);
                    let dest = crate::store::sliding_average_path(&store.root, layout_id, prop, sigma);
                    let rel_file = dest.strip_prefix(&store.root).unwrap_or(&dest).display().to_string();
                    {
                        let txn = store.begin()?;
                        txn.insert_sliding_average(&SlidingAverage {
                            outer: outer_id,
                            sigma,
                            points: inner.points.unwrap_or(0),
                            entropy: inner.entropy,
                            file: Some(rel_file),
                        })?;
                        txn.commit()?;
                    }
                    crate::store::commit(&tmp_path, &dest)?;
                }
            }
        }
    }
    Ok(())
}
