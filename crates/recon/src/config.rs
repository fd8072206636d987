// ---------------------------------------------------------------------------
// Policy flags
// ---------------------------------------------------------------------------

/// Per-run policy for the engine.
///
/// Simulate-only mode is not a policy flag: it lives in the
/// [`UpdateAction`](crate::action::UpdateAction) handed to [`run`](crate::engine::run),
/// so classification is identical whether or not updates are sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconPolicy {
    /// Overwrite devices that already carry a (different) name.
    pub force_update: bool,
}

impl ReconPolicy {
    pub fn forced() -> Self {
        Self { force_update: true }
    }
}
