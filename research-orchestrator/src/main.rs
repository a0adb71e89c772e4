use clap::Parser;

use research_orchestrator::agents;
use research_orchestrator::orchestrator::{
    cli::Args, resume_research_workflow, run_research_workflow, OrchestratorConfig,
    WorkflowOutcome,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    let config = OrchestratorConfig::from(args.clone());
    let boundaries = agents::boundaries_from_env(&config)?;

    let outcome = if let Some(plan_file) = &args.plan_file {
        let command = args
            .feedback_command()
            .map_err(|error| anyhow::anyhow!("{}", error))?;
        resume_research_workflow(plan_file, command, &config, &boundaries).await?
    } else {
        let question = args.input.clone().ok_or_else(|| {
            anyhow::anyhow!("--input is required unless resuming with --plan-file")
        })?;
        run_research_workflow(&question, &config, &boundaries).await?
    };

    if let WorkflowOutcome::Suspended { state_file } = &outcome {
        println!("Suspended for review: {}", state_file.display());
    }

    Ok(())
}
