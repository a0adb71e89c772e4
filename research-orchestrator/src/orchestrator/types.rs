//! Data types for the orchestration state machine.
//!
//! A [`Plan`] is the full mutable record of one research question: its
//! decomposed [`Task`] list, the generation counter, the re-planning round
//! budget, and the human-review state. The plan is owned and mutated only by
//! the orchestration thread; everything here is serializable so a suspended
//! plan can be written to a state file and resumed by a later process.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use research_orchestrator_sdk::{CompletedStep, SourceReference, TaskFinding};

// ============================================================================
// Task Model
// ============================================================================

/// Capability category of a task. Closed set: routing is a total function
/// over these three variants, so an unrecognized label can only be rejected
/// at construction time, never dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Retrieval-and-synthesis: gathers external evidence
    Research,

    /// Pure reasoning over already-gathered evidence
    Analysis,

    /// Computation over already-gathered evidence
    Processing,
}

impl TaskKind {
    /// Parse a generator-supplied label. Returns `None` for anything outside
    /// the closed set.
    pub fn parse(label: &str) -> Option<TaskKind> {
        match label.trim().to_ascii_lowercase().as_str() {
            "research" => Some(TaskKind::Research),
            "analysis" => Some(TaskKind::Analysis),
            "processing" => Some(TaskKind::Processing),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Research => "research",
            TaskKind::Analysis => "analysis",
            TaskKind::Processing => "processing",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
    Failed,
}

/// A single sub-task of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Stable id, assigned on creation, unique within a plan, never reused
    pub id: Uuid,

    /// Sub-question text
    pub question: String,

    /// Guidance for the executor
    #[serde(default)]
    pub description: String,

    /// Capability category, fixed at creation
    pub kind: TaskKind,

    /// True only for research tasks that need web/RAG retrieval
    #[serde(default)]
    pub requires_retrieval: bool,

    /// Execution state
    pub status: TaskStatus,

    /// Answer text. `Some` once terminal: the real answer for `done`, the
    /// empty sentinel for `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    /// Sources backing the answer, in the order they were consulted
    #[serde(default)]
    pub evidence: Vec<SourceReference>,

    /// The generation this task was created in (0 = initial decomposition)
    #[serde(default)]
    pub generation: u32,
}

impl Task {
    pub fn new(
        question: impl Into<String>,
        description: impl Into<String>,
        kind: TaskKind,
        requires_retrieval: bool,
        generation: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            description: description.into(),
            kind,
            // Retrieval only ever applies to research tasks
            requires_retrieval: requires_retrieval && kind == TaskKind::Research,
            status: TaskStatus::Pending,
            answer: None,
            evidence: Vec::new(),
            generation,
        }
    }

    /// True if this task logically depends on the research tasks that
    /// precede it in the same generation.
    pub fn is_data_dependent(&self) -> bool {
        self.kind != TaskKind::Research
    }

    /// True once the task has settled (`done` or `failed`).
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Done | TaskStatus::Failed)
    }

    pub fn mark_running(&mut self) {
        self.status = TaskStatus::Running;
    }

    pub fn mark_done(&mut self, answer: String, evidence: Vec<SourceReference>) {
        self.status = TaskStatus::Done;
        self.answer = Some(answer);
        self.evidence = evidence;
    }

    /// Failed tasks carry the empty answer sentinel and no evidence.
    pub fn mark_failed(&mut self) {
        self.status = TaskStatus::Failed;
        self.answer = Some(String::new());
        self.evidence.clear();
    }

    /// Question text in its deduplication form.
    pub fn normalized_question(&self) -> String {
        normalize_question(&self.question)
    }
}

/// Normalization used for duplicate detection: case-insensitive with
/// collapsed whitespace.
pub fn normalize_question(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ============================================================================
// Plan
// ============================================================================

/// Human-review state of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackState {
    AwaitingReview,
    Approved,
}

/// The full mutable record of a question's decomposition, execution state,
/// and round budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Original question, immutable for the plan's lifetime
    pub main_question: String,

    /// Locale for all generated text
    pub locale: String,

    /// Ordered task list; insertion order is execution and dependency order
    #[serde(default)]
    pub tasks: Vec<Task>,

    /// Incremented each time the judge loop injects new tasks
    #[serde(default)]
    pub generation: u32,

    /// Re-planning rounds left; the loop terminates when this reaches 0
    pub rounds_remaining: u32,

    /// Human-review state
    pub feedback_state: FeedbackState,
}

impl Plan {
    pub fn new(
        main_question: impl Into<String>,
        locale: impl Into<String>,
        rounds_remaining: u32,
    ) -> Self {
        Self {
            main_question: main_question.into(),
            locale: locale.into(),
            tasks: Vec::new(),
            generation: 0,
            rounds_remaining,
            feedback_state: FeedbackState::AwaitingReview,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.feedback_state == FeedbackState::Approved
    }

    /// Approving an already-approved plan is a no-op.
    pub fn approve(&mut self) {
        self.feedback_state = FeedbackState::Approved;
    }

    /// True if any task in the plan matches the given normalized question.
    pub fn contains_question(&self, normalized: &str) -> bool {
        self.tasks
            .iter()
            .any(|task| task.normalized_question() == normalized)
    }

    /// True once every task in the plan has settled.
    pub fn all_terminal(&self) -> bool {
        self.tasks.iter().all(Task::is_terminal)
    }

    /// Findings for every terminal task, in plan order. Failed tasks appear
    /// with empty answers so downstream stages can report partial results.
    pub fn findings(&self) -> Vec<TaskFinding> {
        self.tasks
            .iter()
            .filter(|task| task.is_terminal())
            .map(|task| TaskFinding {
                question: task.question.clone(),
                kind: task.kind.as_str().to_string(),
                answer: task.answer.clone().unwrap_or_default(),
                evidence: task.evidence.clone(),
            })
            .collect()
    }

    /// Question/answer pairs of successfully completed tasks, in plan order.
    /// Handed to executors as context for later steps.
    pub fn completed_steps(&self) -> Vec<CompletedStep> {
        self.tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Done)
            .map(|task| CompletedStep {
                question: task.question.clone(),
                answer: task.answer.clone().unwrap_or_default(),
            })
            .collect()
    }
}
