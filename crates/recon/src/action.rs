use crate::model::UpdateOutcome;

/// The boundary through which the engine issues remote name updates.
///
/// Implementations must not panic on transport failure; errors come back as
/// [`UpdateOutcome::Failed`] so the remaining directives still run.
pub trait UpdateAction {
    fn apply_name(&mut self, device_id: &str, desired_name: &str) -> UpdateOutcome;
}

impl<F> UpdateAction for F
where
    F: FnMut(&str, &str) -> UpdateOutcome,
{
    fn apply_name(&mut self, device_id: &str, desired_name: &str) -> UpdateOutcome {
        self(device_id, desired_name)
    }
}

/// Executor for simulate-only runs: every update is computed, none is sent.
#[derive(Debug, Default)]
pub struct SimulateOnly {
    /// `(device_id, desired_name)` pairs that would have been sent.
    pub would_apply: Vec<(String, String)>,
}

impl UpdateAction for SimulateOnly {
    fn apply_name(&mut self, device_id: &str, desired_name: &str) -> UpdateOutcome {
        self.would_apply
            .push((device_id.to_string(), desired_name.to_string()));
        UpdateOutcome::NotApplied
    }
}
