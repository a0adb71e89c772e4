//! CLI argument parsing for the research orchestrator

use clap::Parser;
use std::path::PathBuf;

use research_orchestrator_sdk::FeedbackProtocolError;

use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::feedback::FeedbackCommand;

/// Research Orchestrator CLI Arguments
#[derive(Parser, Debug, Clone)]
#[command(
    name = "research-orchestrator",
    about = "Decompose a research question into typed sub-tasks, execute them with bounded re-planning, and aggregate a report"
)]
pub struct Args {
    /// Research question to decompose and execute
    #[arg(short, long)]
    pub input: Option<String>,

    /// Locale for generated text (e.g. en-US, zh-CN)
    #[arg(long, default_value = "en-US")]
    pub locale: String,

    /// Maximum sub-tasks per decomposition
    #[arg(long, default_value = "5")]
    pub max_tasks: usize,

    /// Maximum judge-triggered re-planning rounds
    #[arg(long, default_value = "3")]
    pub max_rounds: u32,

    /// Number of concurrent task executions per generation
    #[arg(long, default_value = "2")]
    pub batch_size: usize,

    /// Per-task execution timeout in seconds
    #[arg(long, default_value = "300")]
    pub task_timeout: u64,

    /// Approve the plan without human review
    #[arg(long)]
    pub auto_approve: bool,

    /// Disable web search (research runs in pure reasoning mode)
    #[arg(long)]
    pub no_web_search: bool,

    /// Skip the background investigation before decomposition
    #[arg(long)]
    pub no_background: bool,

    /// Search results requested per query
    #[arg(long, default_value = "3")]
    pub max_search_results: usize,

    /// Directory for plan state files and reports
    #[arg(long, default_value = "./OUTPUT")]
    pub state_dir: PathBuf,

    /// Output file path for the final report
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Resume from a saved plan state file
    #[arg(long)]
    pub plan_file: Option<PathBuf>,

    /// Resume command: approve the suspended plan
    #[arg(long)]
    pub approve: bool,

    /// Resume command: revise the suspended plan with these instructions
    #[arg(long)]
    pub edit: Option<String>,

    /// Resume command: discard the suspended plan
    #[arg(long)]
    pub abort: bool,
}

impl Args {
    /// Build the feedback command encoded by the resume flags.
    ///
    /// `--abort` wins over the other flags; `--edit` may be combined with
    /// `--approve` to signal final approval alongside the revision. Resume
    /// without any command flag is rejected, mirroring the gate's
    /// fixed-vocabulary contract.
    pub fn feedback_command(&self) -> Result<FeedbackCommand, FeedbackProtocolError> {
        if self.abort {
            return Ok(FeedbackCommand::Abort);
        }
        if let Some(revision) = &self.edit {
            return Ok(FeedbackCommand::Edit {
                revision: revision.clone(),
                approve: self.approve,
            });
        }
        if self.approve {
            return Ok(FeedbackCommand::Approve);
        }
        Err(FeedbackProtocolError::InvalidCommand(
            "<no resume flag>".to_string(),
        ))
    }
}

impl From<Args> for OrchestratorConfig {
    fn from(args: Args) -> Self {
        OrchestratorConfig {
            max_tasks: args.max_tasks,
            max_rounds: args.max_rounds,
            batch_size: args.batch_size,
            task_timeout_secs: args.task_timeout,
            locale: args.locale,
            auto_approve: args.auto_approve,
            enable_web_search: !args.no_web_search,
            enable_background_investigation: !args.no_background,
            max_search_results: args.max_search_results,
            state_dir: args.state_dir,
            output: args.output,
        }
    }
}
