//! Network-free building blocks of the salvage analysis pipeline: the result
//! data model, recommendation parsing and heuristics, category inference, model
//! selection, and run logging.

pub mod analysis;
pub mod events;
pub mod models;
pub mod recommendations;
pub mod runs;
