//! Dispatcher: capability-routed, dependency-respecting task execution.
//!
//! One call to [`run_generation`] drives every pending task of the plan's
//! current generation to a terminal status. Research tasks run first and
//! settle completely before any analysis/processing task starts; within a
//! partition, tasks run concurrently on a semaphore-bounded pool, each under
//! a per-task timeout.
//!
//! Workers receive an immutable [`TaskInput`] snapshot and return an outcome
//! message; the plan itself is mutated only here, on the orchestration
//! thread, as outcomes arrive.

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use uuid::Uuid;

use research_orchestrator_sdk::{
    log_task_complete, log_task_failed, log_task_start, log_warning, CapabilityExecutor,
    TaskExecutionError, TaskInput,
};

use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::types::{Plan, TaskKind, TaskStatus};

/// The closed set of capability executors tasks are routed to.
#[derive(Clone)]
pub struct CapabilitySet {
    pub research: Arc<dyn CapabilityExecutor>,
    pub analysis: Arc<dyn CapabilityExecutor>,
    pub processing: Arc<dyn CapabilityExecutor>,
}

impl CapabilitySet {
    /// Routing is a pure function of the task kind, never of task content.
    pub fn executor_for(&self, kind: TaskKind) -> Arc<dyn CapabilityExecutor> {
        match kind {
            TaskKind::Research => Arc::clone(&self.research),
            TaskKind::Analysis => Arc::clone(&self.analysis),
            TaskKind::Processing => Arc::clone(&self.processing),
        }
    }
}

/// Run every pending task of the current generation to a terminal status.
///
/// A failed research task does not block its siblings; dependent tasks
/// proceed with whatever evidence is available. Executor failures and
/// timeouts mark the task `failed` and are never fatal to the plan.
pub async fn run_generation(
    plan: &mut Plan,
    capabilities: &CapabilitySet,
    config: &OrchestratorConfig,
) -> Result<()> {
    let generation = plan.generation;

    let research_ids = pending_ids(plan, generation, false);
    let dependent_ids = pending_ids(plan, generation, true);

    println!("\n{}", "=".repeat(80));
    println!(
        "DISPATCHING GENERATION {} ({} research, {} dependent, concurrency: {})",
        generation,
        research_ids.len(),
        dependent_ids.len(),
        config.batch_size
    );
    println!("{}", "=".repeat(80));

    // Research settles completely before any dependent task starts
    run_partition(plan, &research_ids, capabilities, config).await;
    run_partition(plan, &dependent_ids, capabilities, config).await;

    Ok(())
}

/// Ids of pending tasks in the given generation, in plan order.
fn pending_ids(plan: &Plan, generation: u32, data_dependent: bool) -> Vec<Uuid> {
    plan.tasks
        .iter()
        .filter(|task| {
            task.generation == generation
                && task.status == TaskStatus::Pending
                && task.is_data_dependent() == data_dependent
        })
        .map(|task| task.id)
        .collect()
}

/// Execute one partition concurrently and apply outcomes to the plan.
async fn run_partition(
    plan: &mut Plan,
    ids: &[Uuid],
    capabilities: &CapabilitySet,
    config: &OrchestratorConfig,
) {
    if ids.is_empty() {
        return;
    }

    // Snapshot inputs before spawning; workers never see the plan
    let completed = plan.completed_steps();
    let main_question = plan.main_question.clone();
    let locale = plan.locale.clone();

    let mut inputs = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(task) = plan.tasks.iter_mut().find(|task| task.id == *id) {
            task.mark_running();
            inputs.push((
                task.id,
                task.kind,
                TaskInput {
                    task_id: task.id,
                    main_question: main_question.clone(),
                    question: task.question.clone(),
                    description: task.description.clone(),
                    locale: locale.clone(),
                    completed: completed.clone(),
                },
            ));
        }
    }

    let sem = Arc::new(Semaphore::new(config.batch_size.max(1)));
    let timeout_secs = config.task_timeout_secs;

    let mut executions = FuturesUnordered::new();
    for (task_id, kind, input) in inputs {
        let executor = capabilities.executor_for(kind);
        let sem = Arc::clone(&sem);

        executions.push(async move {
            let _permit = match sem.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    return (
                        task_id,
                        Err(TaskExecutionError::Executor("semaphore closed".to_string())),
                    )
                }
            };

            log_task_start!(task_id, kind, &input.question);

            let result = match timeout(
                Duration::from_secs(timeout_secs),
                executor.execute(&input),
            )
            .await
            {
                Ok(Ok(outcome)) => Ok(outcome),
                Ok(Err(error)) => Err(TaskExecutionError::Executor(error.to_string())),
                Err(_) => Err(TaskExecutionError::Timeout(timeout_secs)),
            };

            (task_id, result)
        });
    }

    // Apply outcome messages as they arrive; this is the only place a
    // task's status leaves `running`
    while let Some((task_id, result)) = executions.next().await {
        let Some(task) = plan.tasks.iter_mut().find(|task| task.id == task_id) else {
            continue;
        };
        match result {
            Ok(outcome) => {
                task.mark_done(outcome.answer, outcome.evidence);
                log_task_complete!(task_id);
            }
            Err(error) => {
                log_warning!("Task '{}' failed: {}", task.question, error);
                task.mark_failed();
                log_task_failed!(task_id, error);
            }
        }
    }
}
