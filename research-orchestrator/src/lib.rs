// Orchestration state machine
pub mod orchestrator;

// LLM/search-backed implementations of the boundary traits
pub mod agents;

// Plan-wide citation collection
pub mod citations;
