//! Boundary contracts for research-orchestrator pipelines.
//!
//! The orchestration core treats every generative component as an external
//! collaborator behind a trait: question decomposition, sufficiency judging,
//! capability execution, web search, and report aggregation. This crate holds
//! those traits, the payload types that cross them, the error taxonomy for
//! contract violations, and the structured log events the orchestrator emits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export async trait for boundary implementations
pub use async_trait::async_trait;

/// Upper bound on new questions a judge verdict may propose per round.
pub const MAX_JUDGE_PROPOSALS: usize = 3;

// ============================================================================
// Boundary Payload Types
// ============================================================================

/// A single source reference backing an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceReference {
    /// Source URL (dedup key)
    pub url: String,

    /// Source title
    pub title: String,

    /// Short content snippet, when the provider returns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Raw task proposal as returned by the decomposition generator.
///
/// `kind` is kept as free text at this boundary; the gateway is responsible
/// for parsing it into the closed capability set and rejecting anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftTask {
    /// Sub-question text
    pub question: String,

    /// Guidance for the executor: what the answer should cover
    #[serde(default)]
    pub description: String,

    /// Capability label (`research`, `analysis`, `processing`)
    pub kind: String,

    /// Whether the generator expects web/RAG retrieval for this task
    #[serde(default)]
    pub requires_retrieval: bool,
}

/// Input to the decomposition generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionRequest {
    /// The main research question being decomposed
    pub main_question: String,

    /// Locale for generated text (e.g. "en-US")
    pub locale: String,

    /// Hard cap on the number of sub-tasks the generator may return
    pub max_tasks: usize,

    /// Human revision instructions from the feedback gate, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_hint: Option<String>,

    /// Background investigation findings, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_context: Option<String>,

    /// True on the retry after a contract violation; generators should
    /// tighten their output format when set
    #[serde(default)]
    pub strict: bool,
}

/// One finished task as seen by the judge and the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFinding {
    /// Sub-question text
    pub question: String,

    /// Capability label the task was routed by
    pub kind: String,

    /// Answer text (empty for failed tasks)
    pub answer: String,

    /// Sources backing the answer
    #[serde(default)]
    pub evidence: Vec<SourceReference>,
}

/// Input to the sufficiency judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeRequest {
    /// The main research question
    pub main_question: String,

    /// Every task's question/answer/evidence so far, in plan order
    pub findings: Vec<TaskFinding>,

    /// Re-planning rounds still available
    pub rounds_remaining: u32,
}

/// Judge verdict: whether more evidence is needed, and which questions
/// would gather it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JudgeVerdict {
    /// True when the current evidence does not answer the main question
    pub need_more: bool,

    /// 0..=3 proposed follow-up questions (more is a contract violation)
    #[serde(default)]
    pub new_questions: Vec<String>,
}

/// Immutable snapshot handed to a capability executor.
///
/// Workers never see the plan itself; they receive this snapshot and return
/// an [`ExecutionOutcome`], keeping plan mutation on the orchestration thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInput {
    /// Id of the task being executed
    pub task_id: Uuid,

    /// The main research question (topic context)
    pub main_question: String,

    /// Sub-question to answer
    pub question: String,

    /// Executor guidance
    pub description: String,

    /// Locale for the answer text
    pub locale: String,

    /// Findings of tasks already completed in this plan, in plan order
    #[serde(default)]
    pub completed: Vec<CompletedStep>,
}

/// A previously completed step, included in executor context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedStep {
    pub question: String,
    pub answer: String,
}

/// Result message returned by a capability executor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Answer text
    pub answer: String,

    /// Sources consulted while producing the answer
    #[serde(default)]
    pub evidence: Vec<SourceReference>,
}

/// Outbound handoff to the aggregation stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    /// The main research question
    pub main_question: String,

    /// Locale for the report prose
    pub locale: String,

    /// Every task's finding, in plan order (failed tasks included, with
    /// empty answers, so the aggregator can report partial results)
    pub findings: Vec<TaskFinding>,

    /// Plan-wide deduplicated citation list, in first-seen order
    #[serde(default)]
    pub citations: Vec<SourceReference>,
}

/// The externally visible artifact produced by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Rendered report content (markdown)
    pub content: String,
}

// ============================================================================
// Error Taxonomy
// ============================================================================

/// Malformed or out-of-bound decomposition generator output.
///
/// Fatal to the run after one strict retry: the pipeline cannot proceed
/// without a valid plan.
#[derive(Debug, thiserror::Error)]
pub enum DecompositionError {
    #[error("generator returned an empty plan")]
    EmptyPlan,

    #[error("generator returned {returned} tasks, limit is {max_tasks}")]
    TooManyTasks { returned: usize, max_tasks: usize },

    #[error("generator returned unrecognized task kind '{0}'")]
    InvalidKind(String),

    #[error("generator invocation failed: {0}")]
    Generator(String),
}

/// An individual executor failure. Never fatal to the plan: the task is
/// marked failed and execution continues.
#[derive(Debug, thiserror::Error)]
pub enum TaskExecutionError {
    #[error("task execution timed out after {0}s")]
    Timeout(u64),

    #[error("executor failed: {0}")]
    Executor(String),
}

/// Malformed judge output. Treated as "sufficient" by the loop so the
/// pipeline always makes forward progress.
#[derive(Debug, thiserror::Error)]
pub enum JudgeContractError {
    #[error("judge proposed {returned} new questions, limit is {limit}")]
    TooManyProposals { returned: usize, limit: usize },

    #[error("judge invocation failed: {0}")]
    Judge(String),
}

/// Unrecognized human feedback input. The gate stays suspended and the
/// command can be retried.
#[derive(Debug, thiserror::Error)]
pub enum FeedbackProtocolError {
    #[error("unrecognized feedback command '{0}' (expected: approve, edit <revision>, abort)")]
    InvalidCommand(String),
}

// ============================================================================
// Boundary Traits
// ============================================================================

/// Turns a research question into an ordered list of draft sub-tasks.
#[async_trait]
pub trait QuestionDecomposer: Send + Sync {
    async fn decompose(&self, request: &DecompositionRequest) -> anyhow::Result<Vec<DraftTask>>;
}

/// Decides whether gathered evidence answers the main question.
#[async_trait]
pub trait SufficiencyJudge: Send + Sync {
    async fn evaluate(&self, request: &JudgeRequest) -> anyhow::Result<JudgeVerdict>;
}

/// Executes a single task of one capability (research, analysis or
/// processing). Routing to an executor is the dispatcher's job and is a pure
/// function of the task kind, never of task content.
#[async_trait]
pub trait CapabilityExecutor: Send + Sync {
    /// Capability label, for logging
    fn capability(&self) -> &'static str;

    async fn execute(&self, input: &TaskInput) -> anyhow::Result<ExecutionOutcome>;
}

/// Web search used by research executors and background investigation.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize)
        -> anyhow::Result<Vec<SourceReference>>;
}

/// Produces the externally visible artifact from the finalized task set.
#[async_trait]
pub trait ReportAggregator: Send + Sync {
    async fn aggregate(&self, request: &ReportRequest) -> anyhow::Result<Report>;
}

// ============================================================================
// Structured Log Events
// ============================================================================

/// Structured events emitted by the orchestrator for machine consumers
/// (emitted as prefixed JSON lines on stderr).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorLog {
    /// Pipeline stage started (decompose, review, dispatch, judge, report)
    StageStarted { stage: String },

    /// Pipeline stage completed
    StageCompleted { stage: String },

    /// Task execution started
    TaskStarted {
        task_id: String,
        kind: String,
        question: String,
    },

    /// Task reached `done`
    TaskCompleted { task_id: String },

    /// Task reached `failed`
    TaskFailed { task_id: String, error: String },

    /// One judge round finished
    RoundCompleted {
        generation: u32,
        rounds_remaining: u32,
        added_tasks: usize,
    },

    /// Plan serialized and pipeline suspended for human review
    PlanSuspended { state_file: String },

    /// Plan deserialized and pipeline resumed
    PlanResumed { state_file: String },

    /// Intermediate state file written
    StateFileCreated { file_path: String, description: String },
}

impl OrchestratorLog {
    /// Emit this event to stderr for machine parsing
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            use std::io::Write;
            eprintln!("__ORCH_EVENT__:{}", json);
            // Force flush stderr in async/concurrent contexts
            let _ = std::io::stderr().flush();
        }
    }
}

/// Helper macros for orchestrator logging
#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr) => {
        $crate::OrchestratorLog::StageStarted {
            stage: $stage.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr) => {
        $crate::OrchestratorLog::StageCompleted {
            stage: $stage.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_start {
    ($task_id:expr, $kind:expr, $question:expr) => {
        $crate::OrchestratorLog::TaskStarted {
            task_id: $task_id.to_string(),
            kind: $kind.to_string(),
            question: $question.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_complete {
    ($task_id:expr) => {
        $crate::OrchestratorLog::TaskCompleted {
            task_id: $task_id.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_failed {
    ($task_id:expr, $error:expr) => {
        $crate::OrchestratorLog::TaskFailed {
            task_id: $task_id.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_round_complete {
    ($generation:expr, $rounds_remaining:expr, $added:expr) => {
        $crate::OrchestratorLog::RoundCompleted {
            generation: $generation,
            rounds_remaining: $rounds_remaining,
            added_tasks: $added,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_plan_suspended {
    ($path:expr) => {
        $crate::OrchestratorLog::PlanSuspended {
            state_file: $path.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_plan_resumed {
    ($path:expr) => {
        $crate::OrchestratorLog::PlanResumed {
            state_file: $path.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_state_file {
    ($path:expr, $desc:expr) => {
        $crate::OrchestratorLog::StateFileCreated {
            file_path: $path.to_string(),
            description: $desc.to_string(),
        }
        .emit();
    };
}

// ============================================================================
// Console Logging Macros
// ============================================================================
// Colored console output for human-readable logs, complementing the
// structured OrchestratorLog events.
// ============================================================================

/// Logs an informational message.
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs that a file has been saved.
#[macro_export]
macro_rules! log_file_saved {
    ($path:expr) => {
        println!("\x1b[32m✓ Saved: {}\x1b[0m", $path);
    };
}
