use crate::model::{Decision, DecisionStatus, ReconSummary};

/// Compute per-status counts from the decisions of one run.
pub fn compute_summary(decisions: &[Decision]) -> ReconSummary {
    let mut summary = ReconSummary {
        total: decisions.len(),
        ..ReconSummary::default()
    };

    for d in decisions {
        match d.status {
            DecisionStatus::DuplicateName => summary.duplicate_name += 1,
            DecisionStatus::NoDeviceFound => summary.no_device_found += 1,
            DecisionStatus::AlreadyNamed => summary.already_named += 1,
            DecisionStatus::NoChange => summary.no_change += 1,
            DecisionStatus::Updated => summary.updated += 1,
            DecisionStatus::Simulated => summary.simulated += 1,
            DecisionStatus::Failed => summary.failed += 1,
        }
    }

    summary
}
