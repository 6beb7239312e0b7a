//! Derived-layout generation: proper layouts from named algorithms,
//! interpolated blends of two non-derived layouts, and deliberately
//! worsened variants of a single non-derived layout.

use crate::badlog::BadLog;
use crate::config::Configuration;
use crate::constants::Action;
use crate::constants::GraphSize;
use crate::constants::InterKind;
use crate::constants::LayoutKind;
use crate::constants::WorseKind;
use crate::errors::GraphStudyError;
use crate::fingerprint::Fingerprint;
use crate::store::InterLayout;
use crate::store::Layout;
use crate::store::Store;
use crate::store::WorseLayout;
use crate::tools::call_graphstudy_tool;
use crate::tools::ScopedWorkdir;
use crate::tools::ToolInvocation;
use rand::RngCore;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct LayoutMeta {
    width: Option<f64>,
    height: Option<f64>,
    seed: Option<String>,
}

pub async fn run_layouts_stage(
    store: &mut Store,
    config: &Configuration,
    bad_log: &mut BadLog,
    rng: &mut impl RngCore,
) -> anyhow::Result<()> {
    for graph in store.all_graphs()? {
        if crate::errors::interrupted() {
            log::warn!("interrupted before finishing the layouts stage");
            return Ok(());
        }
        let size = GraphSize::classify(graph.nodes);
        for kind in LayoutKind::all() {
            let Some(sizes) = config.desired_layouts.desired.get(kind) else {
                continue;
            };
            if !sizes.contains(&size) {
                continue;
            }
            if store.has_layout_kind(graph.id, *kind)? {
                continue;
            }
            let key = format!("{}-{}", graph.id, kind.name());
            if bad_log.get(Action::Layouts, key.as_bytes()).is_some() {
                continue;
            }
            let input = crate::store::graph_path(&store.root, graph.id, graph.generator);
            let workdir = ScopedWorkdir::new(&store.root, "layout")?;
            let tmp_output = workdir.path().join("layout.xml.gz");
            let invocation = ToolInvocation::new(format!("graphstudy-layout-{}", kind.name()))
                .arg(format!("--input={}", input.display()))
                .output(&tmp_output);
            let outcome = match call_graphstudy_tool(invocation).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::warn!("layout {} failed for graph {}: {e}", kind.name(), graph.id);
                    bad_log.set(Action::Layouts, key.as_bytes().to_vec(), e.to_string())?;
                    continue;
                }
            };
            let meta: LayoutMeta = serde_json::from_value(outcome.meta)
                .map_err(|e| GraphStudyError::recoverable(format!("malformed layout meta: {e}")))?;
            let layout_id = store.allocate_unique_layout_id(rng)?;
            let dest = crate::store::layout_path(&store.root, graph.id, layout_id, None);
            let row = Layout {
                id: layout_id,
                graph: graph.id,
                layout: Some(*kind),
                file: dest.strip_prefix(&store.root).unwrap_or(&dest).display().to_string(),
                width: meta.width,
                height: meta.height,
                seed: meta.seed.and_then(|s| hex::decode(s).ok()),
                fingerprint: None,
            };
            {
                let txn = store.begin()?;
                txn.insert_layout(&row)?;
                txn.commit()?;
            }
            crate::store::commit(&tmp_output, &dest)?;
        }
    }
    backfill_fingerprints(store)
}

pub async fn run_interpolations_stage(
    store: &mut Store,
    config: &Configuration,
    bad_log: &mut BadLog,
    rng: &mut impl RngCore,
) -> anyhow::Result<()> {
    for graph in store.all_graphs()? {
        if crate::errors::interrupted() {
            log::warn!("interrupted before finishing the interpolations stage");
            return Ok(());
        }
        let layouts = store.non_derived_layouts_of_graph(graph.id)?;
        for i in 0..layouts.len() {
            for j in (i + 1)..layouts.len() {
                let lhs = &layouts[i];
                let rhs = &layouts[j];
                for method in InterKind::all() {
                    let have = store.inter_layout_rates(lhs.id, rhs.id, *method)?;
                    let missing = config.desired_lay_inter.missing(method, &have);
                    for rate in missing {
                        if crate::errors::interrupted() {
                            return Ok(());
                        }
                        let key = format!("{}-{}-{}-{rate:.3}", lhs.id, rhs.id, method.name());
                        if bad_log.get(Action::LayInter, key.as_bytes()).is_some() {
                            continue;
                        }
                        let lhs_path = store.root.join(&lhs.file);
                        let rhs_path = store.root.join(&rhs.file);
                        let workdir = ScopedWorkdir::new(&store.root, "interpolate")?;
                        let tmp_output = workdir.path().join("layout.xml.gz");
                        let invocation = ToolInvocation::new(format!("graphstudy-interpolate-{}", method.name()))
                            .arg(format!("--input1={}", lhs_path.display()))
                            .arg(format!("--input2={}", rhs_path.display()))
                            .arg(format!("--rate={rate}"))
                            .output(&tmp_output);
                        let outcome = match call_graphstudy_tool(invocation).await {
                            Ok(outcome) => outcome,
                            Err(e) => {
                                log::warn!(
                                    "interpolation {} at rate {rate} failed for {}/{}: {e}",
                                    method.name(),
                                    lhs.id,
                                    rhs.id
                                );
                                bad_log.set(Action::LayInter, key.as_bytes().to_vec(), e.to_string())?;
                                continue;
                            }
                        };
                        let meta: LayoutMeta = serde_json::from_value(outcome.meta)
                            .map_err(|e| GraphStudyError::recoverable(format!("malformed interpolation meta: {e}")))?;
                        let layout_id = store.allocate_unique_layout_id(rng)?;
                        let dest = crate::store::layout_path(&store.root, graph.id, layout_id, None);
                        let row = Layout {
                            id: layout_id,
                            graph: graph.id,
                            layout: None,
                            file: dest.strip_prefix(&store.root).unwrap_or(&dest).display().to_string(),
                            width: meta.width,
                            height: meta.height,
                            seed: meta.seed.and_then(|s| hex::decode(s).ok()),
                            fingerprint: None,
                        };
                        let inter = InterLayout {
                            id: layout_id,
                            parent_1st: lhs.id,
                            parent_2nd: rhs.id,
                            method: *method,
                            rate,
                        };
                        {
                            let txn = store.begin()?;
                            txn.insert_layout(&row)?;
                            txn.insert_inter_layout(&inter)?;
                            txn.commit()?;
                        }
                        crate::store::commit(&tmp_output, &dest)?;
                    }
                }
            }
        }
    }
    backfill_fingerprints(store)
}

pub async fn run_worsenings_stage(
    store: &mut Store,
    config: &Configuration,
    bad_log: &mut BadLog,
    rng: &mut impl RngCore,
) -> anyhow::Result<()> {
    for graph in store.all_graphs()? {
        if crate::errors::interrupted() {
            log::warn!("interrupted before finishing the worsenings stage");
            return Ok(());
        }
        for parent in store.non_derived_layouts_of_graph(graph.id)? {
            for method in WorseKind::all() {
                let have = store.worse_layout_rates(parent.id, *method)?;
                let missing = config.desired_lay_worse.missing(method, &have);
                for rate in missing {
                    if crate::errors::interrupted() {
                        return Ok(());
                    }
                    let key = format!("{}-{}-{rate:.3}", parent.id, method.name());
                    if bad_log.get(Action::LayWorse, key.as_bytes()).is_some() {
                        continue;
                    }
                    let parent_path = store.root.join(&parent.file);
                    let workdir = ScopedWorkdir::new(&store.root, "worsen")?;
                    let tmp_output = workdir.path().join("layout.xml.gz");
                    let invocation = ToolInvocation::new(format!("graphstudy-worsen-{}", method.name()))
                        .arg(format!("--input={}", parent_path.display()))
                        .arg(format!("--rate={rate}"))
                        .output(&tmp_output);
                    let outcome = match call_graphstudy_tool(invocation).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            log::warn!("worsening {} at rate {rate} failed for {}: {e}", method.name(), parent.id);
                            bad_log.set(Action::LayWorse, key.as_bytes().to_vec(), e.to_string())?;
                            continue;
                        }
                    };
                    let meta: LayoutMeta = serde_json::from_value(outcome.meta)
                        .map_err(|e| GraphStudyError::recoverable(format!("malformed worsening meta: {e}")))?;
                    let layout_id = store.allocate_unique_layout_id(rng)?;
                    let dest = crate::store::layout_path(&store.root, graph.id, layout_id, None);
                    let row = Layout {
                        id: layout_id,
                        graph: graph.id,
                        layout: None,
                        file: dest.strip_prefix(&store.root).unwrap_or(&dest).display().to_string(),
                        width: meta.width,
                        height: meta.height,
                        seed: meta.seed.and_then(|s| hex::decode(s).ok()),
                        fingerprint: None,
                    };
                    let worse = WorseLayout {
                        id: layout_id,
                        parent: parent.id,
                        method: *method,
                        rate,
                    };
                    {
                        let txn = store.begin()?;
                        txn.insert_layout(&row)?;
                        txn.insert_worse_layout(&worse)?;
                        txn.commit()?;
                    }
                    crate::store::commit(&tmp_output, &dest)?;
                }
            }
        }
    }
    backfill_fingerprints(store)
}

fn backfill_fingerprints(store: &mut Store) -> anyhow::Result<()> {
    for id in store.layouts_missing_fingerprint()? {
        let Some(layout) = store.layout_by_id(id)? else {
            continue;
        };
        let path = store.root.join(&layout.file);
        let fingerprint = Fingerprint::of_file(&path)?;
        let txn = store.begin()?;
        txn.set_layout_fingerprint(id, fingerprint.as_bytes())?;
        txn.commit()?;
    }
    Ok(())
}
