//! Sequential pipeline runner: import/generate graphs, layouts,
//! interpolations, worsenings, properties, metrics, model, evaluation.
//! Mirrors `autotrain::Mode::run`'s shape (one top-level entry point that
//! dispatches a fixed sequence of units of work, checking an interrupt flag
//! between them) but always runs the full sequence rather than selecting a
//! single mode from argv, since a `run` invocation always means "catch
//! everything up."

use crate::badlog::BadLog;
use crate::baselines;
use crate::config::Configuration;
use crate::corpus;
use crate::corpus::Corpus;
use crate::model;
use crate::oracle;
use crate::oracle::Oracle;
use crate::stages;
use crate::store::Store;
use rand::RngCore;

/// One named step of the pipeline, in the order `run_all` executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Graphs,
    Layouts,
    LayInter,
    LayWorse,
    Properties,
    Metrics,
    Model,
    Eval,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        use Stage::*;
        &[Graphs, Layouts, LayInter, LayWorse, Properties, Metrics, Model, Eval]
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Graphs => "graphs",
            Stage::Layouts => "layouts",
            Stage::LayInter => "lay-inter",
            Stage::LayWorse => "lay-worse",
            Stage::Properties => "properties",
            Stage::Metrics => "metrics",
            Stage::Model => "model",
            Stage::Eval => "eval",
        }
    }
}

/// Run every stage in dependency order, stopping cleanly at the next
/// checkpoint if interrupted. Each stage is itself idempotent, so a prior
/// partial run simply resumes. `corpus_seed` seeds the dedicated RNG the
/// model/eval stages hand to `corpus::assemble`, independent of however many
/// draws `rng` makes generating graphs and layouts along the way.
pub async fn run_all(store: &mut Store, config: &Configuration, bad_log: &mut BadLog, rng: &mut impl RngCore, corpus_seed: u64) -> anyhow::Result<()> {
    for stage in Stage::all() {
        if crate::errors::interrupted() {
            log::warn!("interrupted before stage {}", stage.name());
            return Ok(());
        }
        run_one(*stage, store, config, bad_log, rng, corpus_seed).await?;
    }
    Ok(())
}

/// Run a single named stage. Used both by `run_all` and by the CLI's
/// per-stage subcommands, so `graphstudy graphs` and the `graphs` leg of
/// `graphstudy run` do exactly the same work.
pub async fn run_one(
    stage: Stage,
    store: &mut Store,
    config: &Configuration,
    bad_log: &mut BadLog,
    rng: &mut impl RngCore,
    corpus_seed: u64,
) -> anyhow::Result<()> {
    match stage {
        Stage::Graphs => stages::run_graphs_stage(store, config, bad_log, rng).await,
        Stage::Layouts => stages::run_layouts_stage(store, config, bad_log, rng).await,
        Stage::LayInter => stages::run_interpolations_stage(store, config, bad_log, rng).await,
        Stage::LayWorse => stages::run_worsenings_stage(store, config, bad_log, rng).await,
        Stage::Properties => stages::run_properties_stage(store, config, bad_log).await,
        Stage::Metrics => stages::run_metrics_stage(store, config, bad_log).await,
        Stage::Model => run_model_stage(store, config, rng, corpus_seed).await,
        Stage::Eval => run_eval_stage(store, config, corpus_seed).await,
    }
}

/// Train the discriminator network and fit the Huang baseline weights, then
/// persist both. Skips work already on disk, the same idempotence posture
/// `stages/*.rs` workers take against the store.
async fn run_model_stage(store: &mut Store, config: &Configuration, rng: &mut impl RngCore, corpus_seed: u64) -> anyhow::Result<()> {
    if crate::errors::interrupted() {
        log::warn!("interrupted before the model stage");
        return Ok(());
    }
    let corpus = corpus::assemble(store, config, corpus_seed)?;

    if !model::model_exists(&store.root) {
        log::info!("training discriminator model on {} pairs", corpus.train.len());
        let trained = model::train(store, config, &corpus, rng)?;
        let names = model::LayoutSchemaNames::from_schema(&trained.schema);
        model::save_model(&store.root, &trained.model, &trained.layout_normalizer, &trained.graph_normalizer, &names)?;
    } else {
        log::info!("discriminator model already persisted, skipping training");
    }

    if !baselines::huang_weights_exist(&store.root) {
        log::info!("fitting Huang baseline weights on {} pairs", corpus.train.len());
        let weights = baselines::train_huang_weights(store, &corpus.train)?;
        baselines::save_huang_weights(&store.root, &weights)?;
    } else {
        log::info!("Huang baseline weights already persisted, skipping fit");
    }
    Ok(())
}

/// Score the test corpus against every baseline and the persisted model,
/// recording one `TestScore` row family per `TestKind`. Reassembling the
/// corpus here (rather than threading it through from the model stage) keeps
/// `eval` runnable on its own against an already-trained model.
async fn run_eval_stage(store: &mut Store, config: &Configuration, corpus_seed: u64) -> anyhow::Result<()> {
    if crate::errors::interrupted() {
        log::warn!("interrupted before the eval stage");
        return Ok(());
    }
    let corpus: Corpus = corpus::assemble(store, config, corpus_seed)?;
    if corpus.test.is_empty() {
        log::warn!("eval stage has no test pairs to score");
        return Ok(());
    }

    baselines::evaluate_expected(store, &corpus.test)?;
    baselines::evaluate_stress_baselines(store, &corpus.test)?;

    let weights = baselines::load_huang_weights(&store.root)?;
    baselines::evaluate_huang_baseline(store, &weights, &corpus.test)?;

    let loaded: Oracle = Oracle::load(store, config)?;
    oracle::evaluate(store, &loaded, &corpus.test)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_run_in_dependency_order() {
        let names: Vec<&str> = Stage::all().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            ["graphs", "layouts", "lay-inter", "lay-worse", "properties", "metrics", "model", "eval"]
        );
    }
}
