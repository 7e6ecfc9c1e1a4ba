//! ABOUTME: Model router and budget tracker crate (§4.8)
//! ABOUTME: Selects the cheapest model under the remaining cost/latency budget for each agent invocation

pub mod model_profile;
pub mod tracker;

pub use model_profile::ModelProfile;
pub use tracker::{ModelRouter, ModelSelection};
