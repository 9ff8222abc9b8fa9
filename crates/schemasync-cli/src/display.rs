//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - per-schema synchronization outcomes
//! - planned changes of a dry run

use console::style;
use schemasync_core::ResourceType;
use schemasync_engine::BranchOutcome;
use schemasync_kube::{ChangePlan, ChangeType, ResourceChange};
use std::collections::BTreeMap;

/// Truncate a hash to at most `max_len` characters
///
/// Live hashes come from cluster annotations and may hold arbitrary text.
#[must_use]
pub fn truncate_hash(hash: &str, max_len: usize) -> &str {
    hash.char_indices()
        .nth(max_len)
        .map_or(hash, |(end, _)| &hash[..end])
}

/// One line describing a planned change, without styling
pub fn format_change(change: &ResourceChange) -> String {
    let hash = |h: &Option<String>| {
        h.as_deref()
            .map(|h| truncate_hash(h, 12).to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    match change.change_type {
        ChangeType::Create => format!("{} (hash {})", change.display_name(), hash(&change.desired_hash)),
        ChangeType::Replace => format!(
            "{} ({} -> {})",
            change.display_name(),
            hash(&change.live_hash),
            hash(&change.desired_hash)
        ),
        ChangeType::Delete => change.display_name(),
    }
}

/// Print the outcome of each synchronized schema
pub fn print_outcomes(outcomes: &BTreeMap<String, BranchOutcome>) {
    if outcomes.is_empty() {
        println!("No schemas to synchronize");
        return;
    }

    for (schema, outcome) in outcomes {
        match outcome {
            BranchOutcome::Synced(summary) if summary.is_success() => {
                println!("{} {}: {}", style("✓").green(), style(schema).bold(), summary.summary());
            }
            BranchOutcome::Synced(summary) => {
                println!("{} {}: {}", style("⚠").yellow(), style(schema).bold(), summary.summary());
                for (name, error) in &summary.failed {
                    println!("    {} {}: {}", style("✗").red(), name, error);
                }
            }
            BranchOutcome::Disabled => {
                println!(
                    "{} {}: {}",
                    style("-").dim(),
                    style(schema).bold(),
                    style("propagation disabled").dim()
                );
            }
            BranchOutcome::Failed(message) => {
                println!("{} {}: {}", style("✗").red(), style(schema).bold(), message);
            }
        }
    }
}

/// Print planned changes of one schema
pub fn print_plans(schema: &str, plans: &BTreeMap<ResourceType, ChangePlan>) {
    let changes: Vec<&ResourceChange> = plans.values().flat_map(|p| &p.changes).collect();
    let unchanged: usize = plans.values().map(|p| p.unchanged).sum();

    println!("{}", style(format!("Schema {}", schema)).cyan().bold());
    if changes.is_empty() {
        println!("  No changes ({} unchanged)", unchanged);
        return;
    }

    for change in &changes {
        let symbol = match change.change_type {
            ChangeType::Create => style("+").green(),
            ChangeType::Replace => style("~").yellow(),
            ChangeType::Delete => style("-").red(),
        };
        println!("  {} {}", symbol, format_change(change));
    }

    let count = |t: ChangeType| plans.values().map(|p| p.count(t)).sum::<usize>();
    println!();
    println!(
        "  {} to create, {} to replace, {} to delete, {} unchanged",
        count(ChangeType::Create),
        count(ChangeType::Replace),
        count(ChangeType::Delete),
        unchanged
    );
}
