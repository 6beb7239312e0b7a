//! Metric measurement: scalar-per-row quality metrics. Huang's tool reports
//! four related metrics from one invocation and they are inserted together;
//! every other metric gets its own tool.

use crate::badlog::BadLog;
use crate::config::Configuration;
use crate::constants::Action;
use crate::constants::GraphSize;
use crate::constants::MetricKind;
use crate::errors::GraphStudyError;
use crate::store::Metric;
use crate::store::Store;
use crate::tools::call_graphstudy_tool;
use crate::tools::ScopedWorkdir;
use crate::tools::ToolInvocation;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct HuangMeta {
    #[serde(rename = "cross-count")]
    cross_count: f64,
    #[serde(rename = "cross-resolution")]
    cross_resolution: f64,
    #[serde(rename = "angular-resolution")]
    angular_resolution: f64,
    #[serde(rename = "edge-length-stdev")]
    edge_length_stdev: f64,
}

#[derive(Debug, Deserialize)]
struct SingleMetricMeta {
    value: f64,
}

pub async fn run_metrics_stage(store: &mut Store, config: &Configuration, bad_log: &mut BadLog) -> anyhow::Result<()> {
    for layout in store.all_layouts()? {
        if crate::errors::interrupted() {
            log::warn!("interrupted before finishing the metrics stage");
            return Ok(());
        }
        let Some(graph) = store.graph_by_id(layout.graph)? else {
            continue;
        };
        let size = GraphSize::classify(graph.nodes);
        let wants = |metric: MetricKind| -> bool {
            config
                .desired_metrics
                .desired
                .get(&metric)
                .is_some_and(|sizes| sizes.contains(&size))
        };

        let huang_wanted: Vec<MetricKind> = MetricKind::huang().iter().copied().filter(|m| wants(*m)).collect();
        let mut huang_missing = Vec::new();
        for metric in &huang_wanted {
            if !store.has_metric(layout.id, *metric)? {
                huang_missing.push(*metric);
            }
        }
        if !huang_missing.is_empty() {
            measure_huang(store, bad_log, layout.id, &layout.file, &huang_missing).await?;
        }

        for metric in MetricKind::all() {
            if MetricKind::huang().contains(metric) {
                continue;
            }
            if !wants(*metric) || store.has_metric(layout.id, *metric)? {
                continue;
            }
            measure_single(store, bad_log, layout.id, &layout.file, *metric).await?;
        }
    }
    Ok(())
}

async fn measure_huang(
    store: &mut Store,
    bad_log: &mut BadLog,
    layout_id: crate::ids::Id16,
    layout_file: &str,
    missing: &[MetricKind],
) -> anyhow::Result<()> {
    let key = format!("{layout_id}-huang");
    if bad_log.get(Action::Metrics, key.as_bytes()).is_some() {
        return Ok(());
    }
    let input = store.root.join(layout_file);
    let workdir = ScopedWorkdir::new(&store.root, "metric")?;
    let invocation = ToolInvocation::new("graphstudy-metric-huang")
        .arg(format!("--input={}", input.display()))
        .output(&workdir.path().join("unused.xml.gz"));
    let outcome = match call_graphstudy_tool(invocation).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("huang metrics failed for layout {layout_id}: {e}");
            bad_log.set(Action::Metrics, key.as_bytes().to_vec(), e.to_string())?;
            return Ok(());
        }
    };
    let meta: HuangMeta = serde_json::from_value(outcome.meta)
        .map_err(|e| GraphStudyError::recoverable(format!("malformed huang meta: {e}")))?;
    let values = [
        (MetricKind::CrossCount, meta.cross_count),
        (MetricKind::CrossResolution, meta.cross_resolution),
        (MetricKind::AngularResolution, meta.angular_resolution),
        (MetricKind::EdgeLengthStdev, meta.edge_length_stdev),
    ];
    let txn = store.begin()?;
    for (metric, value) in values {
        if missing.contains(&metric) {
            txn.insert_metric(&Metric {
                layout: layout_id,
                metric,
                value,
            })?;
        }
    }
    txn.commit()
}

async fn measure_single(
    store: &mut Store,
    bad_log: &mut BadLog,
    layout_id: crate::ids::Id16,
    layout_file: &str,
    metric: MetricKind,
) -> anyhow::Result<()> {
    let key = format!("{layout_id}-{}", metric.name());
    if bad_log.get(Action::Metrics, key.as_bytes()).is_some() {
        return Ok(());
    }
    let input = store.root.join(layout_file);
    let workdir = ScopedWorkdir::new(&store.root, "metric")?;
    let invocation = ToolInvocation::new(format!("graphstudy-metric-{}", metric.name()))
        .arg(format!("--input={}", input.display()))
        .output(&workdir.path().join("unused.xml.gz"));
    let outcome = match call_graphstudy_tool(invocation).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("metric {} failed for layout {layout_id}: {e}", metric.name());
            bad_log.set(Action::Metrics, key.as_bytes().to_vec(), e.to_string())?;
            return Ok(());
        }
    };
    let meta: SingleMetricMeta = serde_json::from_value(outcome.meta)
        .map_err(|e| GraphStudyError::recoverable(format!("malformed metric meta: {e}")))?;
    let txn = store.begin()?;
    txn.insert_metric(&Metric {
        layout: layout_id,
        metric,
        value: meta.value,
    })?;
    txn.commit()
}
