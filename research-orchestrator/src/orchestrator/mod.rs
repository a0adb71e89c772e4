//! Orchestration state machine.
//!
//! Turns a single research question into a bounded, dependency-respecting,
//! resumable execution plan and drives it to completion: decomposition
//! gateway → human feedback gate → dispatcher → sufficiency judge loop →
//! aggregator handoff.

pub mod cli;
pub mod config;
pub mod decompose;
pub mod dispatch;
pub mod feedback;
pub mod judge;
pub mod types;
pub mod workflow;

// Re-export commonly used types
pub use config::OrchestratorConfig;
pub use dispatch::CapabilitySet;
pub use feedback::FeedbackCommand;
pub use types::{FeedbackState, Plan, Task, TaskKind, TaskStatus};
pub use workflow::{
    resume_research_workflow, run_research_workflow, OrchestratorBoundaries, WorkflowOutcome,
};
