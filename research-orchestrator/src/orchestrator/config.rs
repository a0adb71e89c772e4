//! Orchestrator configuration.
//!
//! All process-wide limits are passed explicitly into the workflow entry
//! points through this struct; nothing is read from ambient global state, so
//! the state machine stays unit-testable.

use std::path::PathBuf;

/// Configuration for one orchestration run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Hard cap on the number of sub-tasks a decomposition may produce
    pub max_tasks: usize,

    /// Hard cap on judge-triggered re-planning rounds
    pub max_rounds: u32,

    /// Concurrent task executions per dispatcher generation
    pub batch_size: usize,

    /// Per-task execution timeout in seconds; an elapsed timeout fails the
    /// task, never the pipeline
    pub task_timeout_secs: u64,

    /// Locale for all generated text (e.g. "en-US")
    pub locale: String,

    /// Skip the human feedback gate and approve the plan directly
    pub auto_approve: bool,

    /// Enable web search for research executors and background investigation
    pub enable_web_search: bool,

    /// Run a web search on the main question before decomposition and feed
    /// the results to the generator as context
    pub enable_background_investigation: bool,

    /// Search results requested per query
    pub max_search_results: usize,

    /// Directory for plan state files and reports
    pub state_dir: PathBuf,

    /// Output path override for the final report
    pub output: Option<PathBuf>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tasks: 5,
            max_rounds: 3,
            batch_size: 2,
            task_timeout_secs: 300,
            locale: "en-US".to_string(),
            auto_approve: false,
            enable_web_search: true,
            enable_background_investigation: true,
            max_search_results: 3,
            state_dir: PathBuf::from("./OUTPUT"),
            output: None,
        }
    }
}
