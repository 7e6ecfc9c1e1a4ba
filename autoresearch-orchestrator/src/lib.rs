//! ABOUTME: Orchestration core — cycle scheduler, scout pass, gate policy, task coordinator, and auditor
//! ABOUTME: Ties the agent runtime, retrieval, storage, and router crates into `Orchestrator::run_query` (§4.1)

pub mod audit;
pub mod planner;
pub mod scheduler;
pub mod scout;

pub use audit::{apply_hedging, ClaimAuditor};
pub use planner::{build_task_graph_from_plan, ready_tasks};
pub use scheduler::Orchestrator;
pub use scout::run_scout_pass;
