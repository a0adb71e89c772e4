//! Plan-wide citation collection.
//!
//! Research executors return per-task evidence; the aggregator wants one
//! ordered list of unique sources for the whole plan. Deduplication is by
//! URL, first occurrence wins, insertion order preserved.

use std::collections::HashSet;

use research_orchestrator_sdk::SourceReference;

use crate::orchestrator::types::Plan;

/// Merge new references into an existing list, skipping URLs already seen.
pub fn merge_references(
    existing: &mut Vec<SourceReference>,
    new: impl IntoIterator<Item = SourceReference>,
) {
    let mut seen: HashSet<String> = existing.iter().map(|r| r.url.clone()).collect();
    for reference in new {
        if reference.url.is_empty() || !seen.insert(reference.url.clone()) {
            continue;
        }
        existing.push(reference);
    }
}

/// Collect every task's evidence into one deduplicated list, in plan order.
pub fn collect_citations(plan: &Plan) -> Vec<SourceReference> {
    let mut citations = Vec::new();
    for task in &plan.tasks {
        merge_references(&mut citations, task.evidence.iter().cloned());
    }
    citations
}
