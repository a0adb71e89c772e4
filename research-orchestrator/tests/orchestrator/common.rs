//! Common utilities and scripted boundaries for orchestrator tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use research_orchestrator::orchestrator::{
    CapabilitySet, OrchestratorBoundaries, OrchestratorConfig, Plan, Task, TaskKind,
};
use research_orchestrator_sdk::{
    async_trait, CapabilityExecutor, DecompositionRequest, DraftTask, ExecutionOutcome,
    JudgeRequest, JudgeVerdict, QuestionDecomposer, Report, ReportAggregator, ReportRequest,
    SearchProvider, SourceReference, SufficiencyJudge, TaskInput,
};

/// Create a temporary test directory
pub fn create_temp_dir(name: &str) -> PathBuf {
    let temp_dir = env::temp_dir().join(format!("research_orchestrator_test_{}", name));
    std::fs::create_dir_all(&temp_dir).unwrap();
    temp_dir
}

/// Clean up a temporary directory
pub fn cleanup_temp_dir(path: &PathBuf) {
    if path.exists() {
        let _ = std::fs::remove_dir_all(path);
    }
}

pub fn draft(question: &str, kind: &str, retrieval: bool) -> DraftTask {
    DraftTask {
        question: question.to_string(),
        description: format!("answer {}", question),
        kind: kind.to_string(),
        requires_retrieval: retrieval,
    }
}

/// A plan with the given tasks, all in generation 0, awaiting review.
pub fn plan_with_tasks(tasks: Vec<(&str, TaskKind)>) -> Plan {
    let mut plan = Plan::new("main question", "en-US", 3);
    for (question, kind) in tasks {
        plan.tasks
            .push(Task::new(question, "", kind, kind == TaskKind::Research, 0));
    }
    plan
}

pub fn test_config(state_dir: &PathBuf) -> OrchestratorConfig {
    OrchestratorConfig {
        max_tasks: 5,
        max_rounds: 3,
        batch_size: 2,
        task_timeout_secs: 30,
        auto_approve: true,
        enable_background_investigation: false,
        state_dir: state_dir.clone(),
        ..Default::default()
    }
}

// ============================================================================
// Scripted Decomposer
// ============================================================================

/// Returns one scripted draft batch per invocation and records every request.
pub struct ScriptedDecomposer {
    batches: Mutex<VecDeque<Vec<DraftTask>>>,
    pub requests: Mutex<Vec<DecompositionRequest>>,
}

impl ScriptedDecomposer {
    pub fn new(batches: Vec<Vec<DraftTask>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> DecompositionRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl QuestionDecomposer for ScriptedDecomposer {
    async fn decompose(&self, request: &DecompositionRequest) -> anyhow::Result<Vec<DraftTask>> {
        self.requests.lock().unwrap().push(request.clone());
        self.batches
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted decomposition left"))
    }
}

// ============================================================================
// Scripted Judge
// ============================================================================

/// Returns scripted verdicts in order; sufficient once the script runs out.
/// An `Err` entry simulates a transport failure.
pub struct ScriptedJudge {
    verdicts: Mutex<VecDeque<Result<JudgeVerdict, String>>>,
    pub requests: Mutex<Vec<JudgeRequest>>,
}

impl ScriptedJudge {
    pub fn new(verdicts: Vec<Result<JudgeVerdict, String>>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn sufficient() -> Self {
        Self::new(Vec::new())
    }

    pub fn need_more(questions: Vec<&str>) -> Result<JudgeVerdict, String> {
        Ok(JudgeVerdict {
            need_more: true,
            new_questions: questions.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SufficiencyJudge for ScriptedJudge {
    async fn evaluate(&self, request: &JudgeRequest) -> anyhow::Result<JudgeVerdict> {
        self.requests.lock().unwrap().push(request.clone());
        match self.verdicts.lock().unwrap().pop_front() {
            Some(Ok(verdict)) => Ok(verdict),
            Some(Err(error)) => Err(anyhow::anyhow!(error)),
            None => Ok(JudgeVerdict::default()),
        }
    }
}

// ============================================================================
// Recording Executors
// ============================================================================

/// Start/finish records for ordering assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Started {
        kind: String,
        question: String,
        completed_steps: usize,
    },
    Finished {
        kind: String,
        question: String,
    },
}

pub type EventLog = Arc<Mutex<Vec<ExecEvent>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Executor that records events and reacts to markers in the question text:
/// `[fail]` returns an error, `[slow]` sleeps past any reasonable timeout.
pub struct RecordingExecutor {
    kind: &'static str,
    events: EventLog,
}

impl RecordingExecutor {
    pub fn new(kind: &'static str, events: EventLog) -> Self {
        Self { kind, events }
    }
}

#[async_trait]
impl CapabilityExecutor for RecordingExecutor {
    fn capability(&self) -> &'static str {
        self.kind
    }

    async fn execute(&self, input: &TaskInput) -> anyhow::Result<ExecutionOutcome> {
        self.events.lock().unwrap().push(ExecEvent::Started {
            kind: self.kind.to_string(),
            question: input.question.clone(),
            completed_steps: input.completed.len(),
        });

        if input.question.contains("[slow]") {
            tokio::time::sleep(Duration::from_secs(600)).await;
        }
        if input.question.contains("[fail]") {
            anyhow::bail!("scripted executor failure");
        }

        self.events.lock().unwrap().push(ExecEvent::Finished {
            kind: self.kind.to_string(),
            question: input.question.clone(),
        });

        let evidence = if self.kind == "research" {
            vec![
                SourceReference {
                    url: format!("https://evidence.example/{}", input.task_id),
                    title: format!("Evidence for {}", input.question),
                    snippet: None,
                },
                SourceReference {
                    url: "https://shared.example/source".to_string(),
                    title: "Shared source".to_string(),
                    snippet: None,
                },
            ]
        } else {
            Vec::new()
        };

        Ok(ExecutionOutcome {
            answer: format!("answer to {}", input.question),
            evidence,
        })
    }
}

pub fn recording_capabilities(events: &EventLog) -> CapabilitySet {
    CapabilitySet {
        research: Arc::new(RecordingExecutor::new("research", Arc::clone(events))),
        analysis: Arc::new(RecordingExecutor::new("analysis", Arc::clone(events))),
        processing: Arc::new(RecordingExecutor::new("processing", Arc::clone(events))),
    }
}

// ============================================================================
// Capturing Aggregator / Scripted Search
// ============================================================================

/// Captures the handoff request and returns fixed report content.
pub struct CapturingAggregator {
    pub last_request: Mutex<Option<ReportRequest>>,
}

impl CapturingAggregator {
    pub fn new() -> Self {
        Self {
            last_request: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ReportAggregator for CapturingAggregator {
    async fn aggregate(&self, request: &ReportRequest) -> anyhow::Result<Report> {
        *self.last_request.lock().unwrap() = Some(request.clone());
        Ok(Report {
            content: format!("# Report\n\n{}", request.main_question),
        })
    }
}

/// Search provider returning fixed results.
pub struct ScriptedSearch {
    pub results: Vec<SourceReference>,
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> anyhow::Result<Vec<SourceReference>> {
        Ok(self.results.clone())
    }
}

/// Search provider that always fails.
pub struct FailingSearch;

#[async_trait]
impl SearchProvider for FailingSearch {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> anyhow::Result<Vec<SourceReference>> {
        anyhow::bail!("search backend unavailable")
    }
}

// ============================================================================
// Boundary wiring
// ============================================================================

/// Everything a workflow test needs, with handles kept for inspection.
pub struct TestBoundaries {
    pub boundaries: OrchestratorBoundaries,
    pub decomposer: Arc<ScriptedDecomposer>,
    pub judge: Arc<ScriptedJudge>,
    pub aggregator: Arc<CapturingAggregator>,
    pub events: EventLog,
}

pub fn test_boundaries(
    decomposer: ScriptedDecomposer,
    judge: ScriptedJudge,
) -> TestBoundaries {
    let decomposer = Arc::new(decomposer);
    let judge = Arc::new(judge);
    let aggregator = Arc::new(CapturingAggregator::new());
    let events = event_log();

    let boundaries = OrchestratorBoundaries {
        decomposer: Arc::clone(&decomposer) as Arc<dyn QuestionDecomposer>,
        judge: Arc::clone(&judge) as Arc<dyn SufficiencyJudge>,
        capabilities: recording_capabilities(&events),
        aggregator: Arc::clone(&aggregator) as Arc<dyn ReportAggregator>,
        search: None,
    };

    TestBoundaries {
        boundaries,
        decomposer,
        judge,
        aggregator,
        events,
    }
}
