//! Graph generation and import: a per-generator bucket list tracks the
//! remaining count per size category, filled from the configured
//! desired-set and drained by invoking generator tools or draining an
//! import source.

use crate::badlog::BadLog;
use crate::config::Configuration;
use crate::constants::Action;
use crate::constants::Generator;
use crate::constants::GraphSize;
use crate::errors::GraphStudyError;
use crate::fingerprint::Fingerprint;
use crate::ids::Id16;
use crate::store::Graph;
use crate::store::Store;
use crate::tools::call_graphstudy_tool;
use crate::tools::ScopedWorkdir;
use crate::tools::ToolInvocation;
use rand::RngCore;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct GraphMeta {
    nodes: u64,
    edges: u64,
    #[serde(default)]
    native: bool,
    seed: Option<String>,
    filename: String,
}

/// Remaining-to-produce counts per size for one generator; `None` means "no
/// quota configured" and the bucket is skipped entirely.
struct BucketList(BTreeMap<GraphSize, i64>);

impl BucketList {
    fn largest_deficit(&self) -> Option<GraphSize> {
        self.0
            .iter()
            .filter(|(_, remaining)| **remaining > 0)
            .max_by_key(|(_, remaining)| **remaining)
            .map(|(size, _)| *size)
    }

    fn accepts(&self, size: GraphSize) -> bool {
        self.0.get(&size).copied().unwrap_or(0) > 0
    }

    fn decrement(&mut self, size: GraphSize) {
        if let Some(remaining) = self.0.get_mut(&size) {
            *remaining -= 1;
        }
    }

    fn exhausted(&self) -> bool {
        self.0.values().all(|r| *r <= 0)
    }
}

pub async fn run_graphs_stage(
    store: &mut Store,
    config: &Configuration,
    bad_log: &mut BadLog,
    rng: &mut impl RngCore,
) -> anyhow::Result<()> {
    for generator in Generator::all() {
        if crate::errors::interrupted() {
            log::warn!("interrupted before finishing the graphs stage");
            return Ok(());
        }
        let mut bucket = BTreeMap::new();
        for size in GraphSize::all() {
            let Some(desired) = config.desired_graphs.desired.get(&(*generator, *size)) else {
                continue;
            };
            let existing = store.count_graphs(*generator, *size)?;
            let remaining = match desired {
                Some(n) => (*n as i64) - (existing as i64),
                None => i64::MAX,
            };
            bucket.insert(*size, remaining);
        }
        if bucket.is_empty() {
            continue;
        }
        let mut bucket = BucketList(bucket);
        if generator.imported() {
            run_import_generator(store, config, bad_log, rng, *generator, &mut bucket).await?;
        } else {
            run_synthetic_generator(store, bad_log, rng, *generator, &mut bucket).await?;
        }
    }
    Ok(())
}

async fn run_synthetic_generator(
    store: &mut Store,
    bad_log: &mut BadLog,
    rng: &mut impl RngCore,
    generator: Generator,
    bucket: &mut BucketList,
) -> anyhow::Result<()> {
    while let Some(size) = bucket.largest_deficit() {
        if crate::errors::interrupted() {
            return Ok(());
        }
        let key = format!("{}-{:?}", generator.name(), size).to_ascii_lowercase();
        if bad_log.get(Action::Graphs, key.as_bytes()).is_some() {
            bucket.decrement(size);
            continue;
        }
        let workdir = ScopedWorkdir::new(&store.root, "graph")?;
        let tmp_output = workdir.path().join("graph.xml.gz");
        let invocation = ToolInvocation::new(format!("graphstudy-gen-{}", generator.name()))
            .arg(format!("--nodes={}", size.target()))
            .output(&tmp_output);
        let outcome = match call_graphstudy_tool(invocation).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("graph generation failed for {generator:?}/{size:?}: {e}");
                bad_log.set(Action::Graphs, key.as_bytes().to_vec(), e.to_string())?;
                bucket.decrement(size);
                continue;
            }
        };
        let meta: GraphMeta = serde_json::from_value(outcome.meta)
            .map_err(|e| GraphStudyError::recoverable(format!("malformed graph meta: {e}")))?;
        let actual_size = GraphSize::classify(meta.nodes);
        if !bucket.accepts(actual_size) {
            log::info!("discarding {generator:?} graph with {} nodes: bucket {actual_size:?} is full", meta.nodes);
            continue;
        }
        let id = Id16::random(rng);
        let fingerprint = Fingerprint::of_file(&tmp_output).ok();
        let dest = crate::store::graph_path(&store.root, id, generator);
        let row = Graph {
            id,
            generator,
            file: dest.strip_prefix(&store.root).unwrap_or(&dest).display().to_string(),
            nodes: meta.nodes,
            edges: meta.edges,
            native: meta.native,
            seed: meta.seed.and_then(|s| hex::decode(s).ok()),
            fingerprint: fingerprint.map(|f| f.as_bytes().to_vec()),
            poisoned: false,
        };
        {
            let txn = store.begin()?;
            txn.insert_graph(&row)?;
            txn.commit()?;
        }
        crate::store::commit(&tmp_output, &dest)?;
        bucket.decrement(actual_size);
    }
    Ok(())
}

async fn run_import_generator(
    store: &mut Store,
    config: &Configuration,
    bad_log: &mut BadLog,
    rng: &mut impl RngCore,
    generator: Generator,
    bucket: &mut BucketList,
) -> anyhow::Result<()> {
    let Some(spec) = config.import_sources.sources.get(&generator) else {
        log::warn!("no import source configured for {generator:?}; skipping");
        return Ok(());
    };
    let cache_dir = store.root.join("cache");
    let mut source = crate::imports::open(spec, &cache_dir).await?;
    while !bucket.exhausted() {
        if crate::errors::interrupted() {
            return Ok(());
        }
        let Some(blob) = source.next().await? else {
            break;
        };
        let key = format!("{}-{}", generator.name(), blob.name);
        if bad_log.get(Action::Graphs, key.as_bytes()).is_some() {
            continue;
        }
        let fingerprint = Fingerprint::of_bytes(&blob.bytes);
        let workdir = ScopedWorkdir::new(&store.root, "import")?;
        let tmp_input = workdir.path().join(&blob.name);
        if let Err(e) = tokio::fs::write(&tmp_input, &blob.bytes).await {
            bad_log.set(Action::Graphs, key.as_bytes().to_vec(), e.to_string())?;
            continue;
        }
        let classified_output = workdir.path().join("graph.xml.gz");
        let invocation = ToolInvocation::new("graphstudy-classify-graph")
            .arg(format!("--input={}", tmp_input.display()))
            .output(&classified_output);
        let outcome = match call_graphstudy_tool(invocation).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("cannot classify import {}: {e}", blob.name);
                bad_log.set(Action::Graphs, key.as_bytes().to_vec(), e.to_string())?;
                continue;
            }
        };
        let meta: GraphMeta = serde_json::from_value(outcome.meta)
            .map_err(|e| GraphStudyError::recoverable(format!("malformed import meta: {e}")))?;
        let size = GraphSize::classify(meta.nodes);
        if !bucket.accepts(size) {
            continue;
        }
        let id = Id16::random(rng);
        let dest = crate::store::graph_path(&store.root, id, generator);
        let row = Graph {
            id,
            generator,
            file: dest.strip_prefix(&store.root).unwrap_or(&dest).display().to_string(),
            nodes: meta.nodes,
            edges: meta.edges,
            native: meta.native,
            seed: meta.seed.and_then(|s| hex::decode(s).ok()),
            fingerprint: Some(fingerprint.as_bytes().to_vec()),
            poisoned: false,
        };
        {
            let txn = store.begin()?;
            txn.insert_graph(&row)?;
            txn.commit()?;
        }
        crate::store::commit(&classified_output, &dest)?;
        bucket.decrement(size);
    }
    Ok(())
}
