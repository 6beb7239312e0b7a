//! The per-stage workers that extend the artifact store: graph
//! generation/import, layout generation, interpolation, worsening, and
//! property/metric measurement. Each stage is idempotent — it queries what
//! already exists, computes only the deficit, and is safe to re-run.

mod graphs;
mod layouts;
mod metrics;
mod properties;

pub use graphs::run_graphs_stage;
pub use layouts::run_interpolations_stage;
pub use layouts::run_layouts_stage;
pub use layouts::run_worsenings_stage;
pub use metrics::run_metrics_stage;
pub use properties::run_properties_stage;
