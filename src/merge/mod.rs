//! Merge of mortality and law data into the state-year analytic table.
//!
//! The stages run in order: load and normalize both sources, score each law
//! event, expand the scores over the state-year grid, aggregate per cell and
//! per law class, then left-join with mortality and add year-over-year
//! changes. Each stage takes and returns plain values.

pub mod aggregate;
pub mod join;
pub mod laws;
pub mod mortality;
pub mod pipeline;
pub mod quality;
pub mod score;
pub mod states;
pub mod types;
pub mod utility;

pub use pipeline::{MergeSummary, build_panel, run_merge};
