//! Corpus-driven study of graph layout quality: build a corpus of graphs,
//! generate proper/worsened/interpolated layouts, measure their numeric
//! properties and quality metrics, and train a pairwise discriminator that
//! predicts which of two layouts of the same graph looks better.

pub mod badlog;
pub mod baselines;
pub mod cli;
pub mod config;
pub mod constants;
pub mod corpus;
pub mod errors;
pub mod features;
pub mod fingerprint;
pub mod ids;
pub mod imports;
pub mod integrity;
pub mod logging;
pub mod model;
pub mod oracle;
pub mod orchestrator;
pub mod stages;
pub mod store;
pub mod tools;
