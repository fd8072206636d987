use crate::config::ReconPolicy;
use crate::duplicates::DuplicateReport;
use crate::model::{Decision, DecisionStatus, Directive, RemoteDevice, UpdateOutcome};
use crate::normalize::{is_unnamed, names_match};

pub const REASON_DUPLICATE: &str = "desired name duplicated in input; resolve duplicates and re-run";
pub const REASON_NO_DEVICE: &str = "serial not present in remote directory";
pub const REASON_NO_CHANGE: &str = "current name already matches desired name";
pub const REASON_UPDATED: &str = "display name updated";
pub const REASON_SIMULATED: &str = "update not applied (simulate-only or not confirmed)";
pub const REASON_FAILED: &str = "update request failed";

/// Outcome of the pure classification pass for one directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan<'a> {
    /// Rules 1–4 settled the directive; no remote call.
    Settled(Decision),
    /// Rules 5–7: an update must be attempted against this device.
    Update {
        directive: &'a Directive,
        device: &'a RemoteDevice,
    },
}

impl Plan<'_> {
    pub fn is_update(&self) -> bool {
        matches!(self, Plan::Update { .. })
    }
}

/// Classify one directive. First matching rule wins:
///
/// 1. desired name in a duplicate group → `DuplicateName`
/// 2. no remote device for the serial → `NoDeviceFound`
/// 3. device already named differently, force off → `AlreadyNamed`
/// 4. device name equals desired name → `NoChange`
/// 5. otherwise an update is required
///
/// Rule 3 only fires when the existing name differs from the desired one, so
/// re-running a completed batch settles on `NoChange` rather than
/// `AlreadyNamed`.
pub fn classify<'a>(
    directive: &'a Directive,
    device: Option<&'a RemoteDevice>,
    duplicates: &DuplicateReport,
    policy: &ReconPolicy,
) -> Plan<'a> {
    if duplicates.contains(&directive.desired_name) {
        return Plan::Settled(settled(
            directive,
            None,
            DecisionStatus::DuplicateName,
            REASON_DUPLICATE.into(),
        ));
    }

    let Some(device) = device else {
        return Plan::Settled(settled(
            directive,
            None,
            DecisionStatus::NoDeviceFound,
            REASON_NO_DEVICE.into(),
        ));
    };

    let same_name = names_match(&device.current_name, &directive.desired_name);

    if !policy.force_update && !is_unnamed(&device.current_name) && !same_name {
        return Plan::Settled(settled(
            directive,
            Some(device),
            DecisionStatus::AlreadyNamed,
            already_named_reason(&device.current_name),
        ));
    }

    if same_name {
        return Plan::Settled(settled(
            directive,
            Some(device),
            DecisionStatus::NoChange,
            REASON_NO_CHANGE.into(),
        ));
    }

    Plan::Update { directive, device }
}

/// Turn an executor outcome into the final decision for a planned update.
pub fn resolve_update(
    directive: &Directive,
    device: &RemoteDevice,
    outcome: UpdateOutcome,
) -> Decision {
    let (status, reason, error) = match outcome {
        UpdateOutcome::Applied => (DecisionStatus::Updated, REASON_UPDATED, None),
        UpdateOutcome::NotApplied => (DecisionStatus::Simulated, REASON_SIMULATED, None),
        UpdateOutcome::Failed(msg) => (DecisionStatus::Failed, REASON_FAILED, Some(msg)),
    };
    Decision {
        error,
        ..settled(directive, Some(device), status, reason.into())
    }
}

pub fn already_named_reason(current_name: &str) -> String {
    format!(
        "device already named '{}'; force update required to overwrite",
        current_name.trim()
    )
}

fn settled(
    directive: &Directive,
    device: Option<&RemoteDevice>,
    status: DecisionStatus,
    reason: String,
) -> Decision {
    Decision {
        serial_number: directive.serial_number.clone(),
        desired_name: directive.desired_name.clone(),
        status,
        reason,
        error: None,
        device_id: device.map(|d| d.id.clone()),
        current_name: device.map(|d| d.current_name.clone()),
    }
}
